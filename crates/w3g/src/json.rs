//! Stable JSON rendering of a parsed replay. Raw bytes and per-action
//! payloads are excluded; derived presentation fields (`version_string`,
//! formatted durations, `mode_name`, one-decimal APM) are included so the
//! output is directly consumable.

use serde_json::{json, Map, Value};

use crate::replay::Replay;

/// `H:MM:SS` above an hour, `M:SS` below.
pub fn format_duration_ms(ms: u32) -> String {
  let total_seconds = ms / 1000;
  let hours = total_seconds / 3600;
  let minutes = (total_seconds % 3600) / 60;
  let seconds = total_seconds % 60;
  if hours > 0 {
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
  } else {
    format!("{}:{:02}", minutes, seconds)
  }
}

impl Replay {
  pub fn to_json_value(&self) -> Value {
    let header = &self.header;
    let settings = &self.settings;

    let players: Vec<Value> = self
      .players
      .iter()
      .map(|p| {
        let mut entry = Map::new();
        entry.insert("id".into(), json!(p.id));
        entry.insert("name".into(), json!(p.name));
        entry.insert("race".into(), json!(p.race.name()));
        entry.insert("team".into(), json!(p.team));
        entry.insert("color".into(), json!(p.color));
        entry.insert("handicap".into(), json!(p.handicap));
        entry.insert("is_host".into(), json!(p.is_host));
        entry.insert("is_computer".into(), json!(p.is_computer));
        entry.insert("is_observer".into(), json!(p.is_observer));
        entry.insert("action_count".into(), json!(p.action_count));
        entry.insert("apm".into(), json!(format!("{:.1}", p.apm)));
        if let Some(result) = p.leave_result {
          entry.insert("leave_result".into(), json!(result.name()));
        }
        Value::Object(entry)
      })
      .collect();

    let chat_messages: Vec<Value> = self
      .chat_messages
      .iter()
      .map(|c| {
        json!({
          "timestamp_ms": c.timestamp_ms,
          "timestamp": format_duration_ms(c.timestamp_ms),
          "player_id": c.player_id,
          "player_name": c.player_name,
          "message": c.message,
          "mode": c.mode,
          "mode_name": c.mode_name(),
        })
      })
      .collect();

    json!({
      "header": {
        "header_size": header.size_header,
        "compressed_size": header.size_file,
        "header_version": header.header_version,
        "decompressed_size": header.size_decompressed,
        "num_compressed_blocks": header.num_blocks,
        "game_identifier": header.game_id.to_string(),
        "version": header.version,
        "version_string": header.version_string(),
        "build_number": header.build_number,
        "is_multiplayer": header.is_multiplayer(),
        "is_reforged": header.is_reforged(),
        "is_expansion": header.is_expansion(),
        "duration_ms": header.duration_ms,
        "duration": format_duration_ms(header.duration_ms),
      },
      "game_name": self.game_name,
      "map_name": self.map_name,
      "map_path": self.map_path,
      "host_name": self.host_name,
      "settings": {
        "speed": settings.speed,
        "speed_name": settings.speed_name(),
        "visibility": settings.visibility,
        "observers": settings.observers,
        "teams_together": settings.teams_together,
        "lock_teams": settings.lock_teams,
        "full_shared_control": settings.full_shared_control,
        "random_hero": settings.random_hero,
        "random_races": settings.random_races,
      },
      "players": players,
      "chat_messages": chat_messages,
      "action_count": self.actions.len(),
    })
  }

  pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
    let value = self.to_json_value();
    if pretty {
      serde_json::to_string_pretty(&value)
    } else {
      serde_json::to_string(&value)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_format_duration() {
    assert_eq!(format_duration_ms(0), "0:00");
    assert_eq!(format_duration_ms(59_000), "0:59");
    assert_eq!(format_duration_ms(61_000), "1:01");
    assert_eq!(format_duration_ms(3_600_000), "1:00:00");
    assert_eq!(format_duration_ms(3_661_000), "1:01:01");
  }
}
