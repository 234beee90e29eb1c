//! Plain text rendering for the CLI commands.

use std::fmt::Write;

use w3g::{format_duration_ms, ActionValue, Header, Player, Replay};

fn status_tags(player: &Player) -> String {
  let mut tags = vec![];
  if player.is_host {
    tags.push("Host".to_string());
  }
  if player.is_computer {
    tags.push("Computer".to_string());
  }
  if player.is_observer {
    tags.push("Observer".to_string());
  }
  if let Some(result) = player.leave_result {
    tags.push(result.name().to_string());
  }
  tags.join(", ")
}

pub fn format_replay(replay: &Replay) -> String {
  let mut out = String::new();
  let w = &mut out;

  let _ = writeln!(w, "{}", "=".repeat(60));
  let _ = writeln!(w, "WARCRAFT III REPLAY");
  let _ = writeln!(w, "{}", "=".repeat(60));
  let _ = writeln!(w);

  let _ = writeln!(w, "GAME INFO");
  let _ = writeln!(w, "{}", "-".repeat(40));
  let _ = writeln!(w, "  Game Name: {}", replay.game_name);
  let _ = writeln!(w, "  Map: {}", replay.map_name);
  let _ = writeln!(w, "  Map Path: {}", replay.map_path);
  let _ = writeln!(w, "  Host: {}", replay.host_name);
  let _ = writeln!(w, "  Duration: {}", format_duration_ms(replay.header.duration_ms));
  let _ = writeln!(w, "  Version: {}", replay.header.version_string());
  let _ = writeln!(w, "  Build: {}", replay.header.build_number);
  let _ = writeln!(w);

  let _ = writeln!(w, "SETTINGS");
  let _ = writeln!(w, "{}", "-".repeat(40));
  let _ = writeln!(w, "  Speed: {}", replay.settings.speed_name());
  let _ = writeln!(w, "  Lock Teams: {}", yes_no(replay.settings.lock_teams));
  let _ = writeln!(w, "  Random Races: {}", yes_no(replay.settings.random_races));
  let _ = writeln!(w, "  Random Hero: {}", yes_no(replay.settings.random_hero));
  let _ = writeln!(w);

  let _ = writeln!(w, "PLAYERS");
  let _ = writeln!(w, "{}", "-".repeat(40));
  for player in &replay.players {
    let tags = status_tags(player);
    if tags.is_empty() {
      let _ = writeln!(w, "  {}", player.name);
    } else {
      let _ = writeln!(w, "  {} ({})", player.name, tags);
    }
    let _ = writeln!(
      w,
      "    Race: {}, Team: {}, Color: {}, APM: {:.1}",
      player.race.name(),
      player.team,
      player.color,
      player.apm
    );
  }
  let _ = writeln!(w);

  if let Some(winner) = replay.winner() {
    let _ = writeln!(w, "RESULT");
    let _ = writeln!(w, "{}", "-".repeat(40));
    let _ = writeln!(w, "  Winner: {}", winner.name);
    let _ = writeln!(w);
  }

  if !replay.chat_messages.is_empty() {
    let _ = writeln!(w, "CHAT");
    let _ = writeln!(w, "{}", "-".repeat(40));
    for msg in replay.chat_messages.iter().take(10) {
      let _ = writeln!(
        w,
        "  [{}] {}: {}",
        format_duration_ms(msg.timestamp_ms),
        msg.player_name,
        msg.message
      );
    }
    if replay.chat_messages.len() > 10 {
      let _ = writeln!(
        w,
        "  ... and {} more messages",
        replay.chat_messages.len() - 10
      );
    }
    let _ = writeln!(w);
  }

  let _ = writeln!(w, "ACTIONS");
  let _ = writeln!(w, "{}", "-".repeat(40));
  let _ = writeln!(w, "  Total Actions: {}", replay.actions.len());

  out
}

pub fn format_players(replay: &Replay) -> String {
  let mut out = String::new();
  let w = &mut out;

  let _ = writeln!(w, "Players ({}):", replay.players.len());
  let _ = writeln!(w, "{}", "-".repeat(60));
  for player in &replay.players {
    let tags = status_tags(player);
    let suffix = if tags.is_empty() {
      String::new()
    } else {
      format!(" [{}]", tags)
    };
    let _ = writeln!(
      w,
      "  {} - {} (Team {}, Color {}) - APM: {:.1}{}",
      player.name,
      player.race.name(),
      player.team,
      player.color,
      player.apm,
      suffix
    );
  }

  out
}

pub fn format_chat(replay: &Replay) -> String {
  if replay.chat_messages.is_empty() {
    return "No chat messages in this replay.\n".to_string();
  }

  let mut out = String::new();
  let w = &mut out;
  let _ = writeln!(w, "Chat Messages ({}):", replay.chat_messages.len());
  let _ = writeln!(w, "{}", "-".repeat(60));
  for msg in &replay.chat_messages {
    let mode = if msg.mode != 0 {
      format!(" [{}]", msg.mode_name())
    } else {
      String::new()
    };
    let _ = writeln!(
      w,
      "[{}]{} {}: {}",
      format_duration_ms(msg.timestamp_ms),
      mode,
      msg.player_name,
      msg.message
    );
  }

  out
}

pub fn format_info(header: &Header) -> String {
  let mut out = String::new();
  let w = &mut out;

  let _ = writeln!(w, "Replay Information:");
  let _ = writeln!(w, "{}", "-".repeat(40));
  let _ = writeln!(w, "  Version: {}", header.version_string());
  let _ = writeln!(w, "  Build: {}", header.build_number);
  let _ = writeln!(w, "  Duration: {}", format_duration_ms(header.duration_ms));
  let _ = writeln!(w, "  Game ID: {}", header.game_id.to_string());
  let _ = writeln!(w, "  Multiplayer: {}", yes_no(header.is_multiplayer()));
  let _ = writeln!(w, "  Expansion: {}", yes_no(header.is_expansion()));
  let _ = writeln!(w, "  Reforged: {}", yes_no(header.is_reforged()));
  let _ = writeln!(w, "  Compressed Size: {} bytes", header.size_file);
  let _ = writeln!(w, "  Decompressed Size: {} bytes", header.size_decompressed);
  let _ = writeln!(w, "  Blocks: {}", header.num_blocks);

  out
}

pub fn format_actions(replay: &Replay, limit: usize, detail: bool, filter: Option<&str>) -> String {
  let filter_lower = filter.map(|f| f.to_ascii_lowercase());
  let filtered: Vec<_> = replay
    .actions
    .iter()
    .filter(|a| match &filter_lower {
      Some(f) => a.name().to_ascii_lowercase().contains(f.as_str()),
      None => true,
    })
    .collect();

  let total = filtered.len();
  let shown = limit.min(total);
  let filter_note = match filter {
    Some(f) => format!(" matching '{}'", f),
    None => String::new(),
  };

  let mut out = String::new();
  let w = &mut out;
  let _ = writeln!(w, "Game Actions (showing {} of {}{}):", shown, total, filter_note);
  let _ = writeln!(w, "{}", "-".repeat(70));

  for action in filtered.iter().take(limit) {
    let ts = format_duration_ms(action.timestamp_ms);
    let player_name = replay.player_name(action.player_id);
    if detail {
      let details = action_details(action);
      if details.is_empty() {
        let _ = writeln!(w, "[{}] {}: {}", ts, player_name, action.name());
      } else {
        let _ = writeln!(w, "[{}] {}: {} - {}", ts, player_name, action.name(), details);
      }
    } else {
      let _ = writeln!(w, "[{}] {}: {}", ts, player_name, action.name());
    }
  }

  if total > limit {
    let _ = writeln!(w);
    let _ = writeln!(w, "... and {} more actions", total - limit);
  }

  out
}

fn action_details(action: &w3g::Action) -> String {
  let mut parts = vec![];

  if let Some(ActionValue::Str(item)) = action.data.get("item_id") {
    parts.push(item.clone());
  }

  if let (Some(ActionValue::Float(x)), Some(ActionValue::Float(y))) =
    (action.data.get("target_x"), action.data.get("target_y"))
  {
    if !x.is_nan() && !y.is_nan() {
      parts.push(format!("at ({:.0}, {:.0})", x, y));
    }
  }

  if let Some(ActionValue::Uint(count)) = action.data.get("unit_count") {
    let mode = match action.data.get("select_mode") {
      Some(ActionValue::Uint(1)) => "+",
      Some(ActionValue::Uint(2)) => "-",
      _ => "",
    };
    match action.data.get("object_ids") {
      Some(ActionValue::List(ids)) if !ids.is_empty() => {
        let mut ids_str: String = ids
          .iter()
          .take(5)
          .map(|id| format!("{:x}", id))
          .collect::<Vec<_>>()
          .join(",");
        if ids.len() > 5 {
          ids_str.push_str(&format!("...+{}", ids.len() - 5));
        }
        parts.push(format!("{}{} unit(s) [{}]", mode, count, ids_str));
      }
      _ => parts.push(format!("{}{} unit(s)", mode, count)),
    }
  }

  if let Some(ActionValue::Uint(group)) = action.data.get("group") {
    parts.push(format!("group {}", group));
  }

  if let (Some(ActionValue::Uint(gold)), Some(ActionValue::Uint(lumber))) =
    (action.data.get("gold"), action.data.get("lumber"))
  {
    parts.push(format!("gold={}, lumber={}", gold, lumber));
  }

  if let Some(ActionValue::Str(command)) = action.data.get("command") {
    parts.push(format!("'{}'", command));
  }

  parts.join(" ")
}

fn yes_no(value: bool) -> &'static str {
  if value {
    "Yes"
  } else {
    "No"
  }
}
