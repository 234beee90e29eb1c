use w3g_util::binary::*;

use crate::constants::{BlockTypeId, OBSERVER_TEAM_CLASSIC, OBSERVER_TEAM_REFORGED, REFORGED_VERSION};
use crate::player::{Player, Race};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
  Empty,
  Closed,
  Used,
  UnknownValue(u8),
}

impl SlotStatus {
  pub fn from_u8(value: u8) -> Self {
    match value {
      0x00 => SlotStatus::Empty,
      0x01 => SlotStatus::Closed,
      0x02 => SlotStatus::Used,
      other => SlotStatus::UnknownValue(other),
    }
  }

  pub fn name(&self) -> &'static str {
    match *self {
      SlotStatus::Empty => "Empty",
      SlotStatus::Closed => "Closed",
      SlotStatus::Used => "Used",
      SlotStatus::UnknownValue(_) => "Unknown",
    }
  }
}

/// One row of the game start record's slot table.
///
/// 7 bytes before game version 3, 8 before version 7 (adds the AI
/// strength), 9 from version 7 on (adds the handicap).
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRecord {
  pub player_id: u8,
  pub download_percent: u8,
  pub status: SlotStatus,
  pub is_computer: bool,
  pub team: u8,
  pub color: u8,
  pub race_flags: u8,
  pub ai_strength: u8,
  pub handicap: u8,
}

impl SlotRecord {
  pub fn size_for(version: u32) -> usize {
    if version < 3 {
      7
    } else if version < 7 {
      8
    } else {
      9
    }
  }

  pub fn decode<T: Buf>(buf: &mut T, version: u32) -> Result<Self, BinDecodeError> {
    let size = Self::size_for(version);
    buf.check_size(size)?;

    let player_id = buf.get_u8();
    let download_percent = buf.get_u8();
    let status = SlotStatus::from_u8(buf.get_u8());
    let is_computer = buf.get_u8() == 0x01;
    let team = buf.get_u8();
    let color = buf.get_u8();
    let race_flags = buf.get_u8();
    let ai_strength = if size >= 8 { buf.get_u8() } else { 0 };
    let handicap = if size >= 9 { buf.get_u8() } else { 100 };

    Ok(SlotRecord {
      player_id,
      download_percent,
      status,
      is_computer,
      team,
      color,
      race_flags,
      ai_strength,
      handicap,
    })
  }
}

/// The 0x19 record separating the lobby prologue from the event stream.
#[derive(Debug, Clone, PartialEq)]
pub struct GameStartRecord {
  pub slots: Vec<SlotRecord>,
  pub random_seed: u32,
  pub select_mode: u8,
  pub start_spot_count: u8,
}

impl GameStartRecord {
  /// Decodes the record. The 0x19 tag must already have been validated by
  /// [`probe`]; the leading tag byte is consumed here.
  pub fn decode<T: Buf>(buf: &mut T, version: u32) -> Result<Self, BinDecodeError> {
    buf.get_tag([BlockTypeId::GameStart.value()])?;
    buf.check_size(3)?;
    let _record_len = buf.get_u16_le();
    let num_slots = buf.get_u8();

    let mut slots = Vec::with_capacity(num_slots as usize);
    for _ in 0..num_slots {
      slots.push(SlotRecord::decode(buf, version)?);
    }

    buf.check_size(6)?;
    let random_seed = buf.get_u32_le();
    let select_mode = buf.get_u8();
    let start_spot_count = buf.get_u8();

    Ok(GameStartRecord {
      slots,
      random_seed,
      select_mode,
      start_spot_count,
    })
  }

  /// Validity probe for a candidate game start offset: the tag byte, a
  /// plausible record length and a plausible slot count. Reforged replays
  /// carry extra metadata between the player records and the game start
  /// record, so the caller scans forward until this holds.
  pub fn probe(data: &[u8], offset: usize) -> bool {
    if offset + 4 > data.len() || data[offset] != BlockTypeId::GameStart.value() {
      return false;
    }
    let record_len = u16::from_le_bytes([data[offset + 1], data[offset + 2]]);
    if !(10..=500).contains(&record_len) {
      return false;
    }
    let num_slots = data[offset + 3];
    (2..=24).contains(&num_slots)
  }
}

/// Stamps the slot table onto the player list: existing players pick up
/// team, colour, handicap and (when the ladder data left it open) race;
/// computer slots synthesise players. Team 12 (24 on Reforged) marks
/// observers.
pub fn apply_slots(players: &mut Vec<Player>, slots: &[SlotRecord], version: u32) {
  let observer_team = if version >= REFORGED_VERSION {
    OBSERVER_TEAM_REFORGED
  } else {
    OBSERVER_TEAM_CLASSIC
  };

  for slot in slots {
    if slot.status != SlotStatus::Used {
      continue;
    }

    if slot.is_computer {
      players.push(Player::computer(slot));
    } else if let Some(player) = players.iter_mut().find(|p| p.id == slot.player_id) {
      player.team = slot.team;
      player.color = slot.color;
      player.handicap = slot.handicap;
      player.slot_status = slot.status;
      if player.race == Race::Unknown {
        player.race = Race::from_flags(slot.race_flags);
      }
      if player.team == observer_team {
        player.is_observer = true;
      }
    }
  }
}
