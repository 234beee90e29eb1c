use bitflags::bitflags;

use w3g_util::binary::*;

use crate::constants::{RECORD_ADDITIONAL_PLAYER, RECORD_HOST};
use crate::slot::{SlotRecord, SlotStatus};

bitflags! {
  /// Race preference byte as stored in player and slot records.
  pub struct RacePref: u8 {
    const HUMAN = 0x01;
    const ORC = 0x02;
    const NIGHTELF = 0x04;
    const UNDEAD = 0x08;
    const DEMON = 0x10;
    const RANDOM = 0x20;
    const SELECTABLE = 0x40;
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Race {
  Human,
  Orc,
  NightElf,
  Undead,
  Random,
  Selectable,
  Unknown,
}

impl Race {
  /// Lowest set preference bit wins; `DEMON` never occurs in replays.
  pub fn from_flags(flags: u8) -> Race {
    if flags & RacePref::HUMAN.bits() != 0 {
      Race::Human
    } else if flags & RacePref::ORC.bits() != 0 {
      Race::Orc
    } else if flags & RacePref::NIGHTELF.bits() != 0 {
      Race::NightElf
    } else if flags & RacePref::UNDEAD.bits() != 0 {
      Race::Undead
    } else if flags & RacePref::RANDOM.bits() != 0 {
      Race::Random
    } else if flags & RacePref::SELECTABLE.bits() != 0 {
      Race::Selectable
    } else {
      Race::Unknown
    }
  }

  pub fn name(&self) -> &'static str {
    match *self {
      Race::Human => "Human",
      Race::Orc => "Orc",
      Race::NightElf => "NightElf",
      Race::Undead => "Undead",
      Race::Random => "Random",
      Race::Selectable => "Selectable",
      Race::Unknown => "Unknown",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveResult {
  Left,
  Lost,
  Won,
  Draw,
  ObserverLeft,
  Unknown(u32),
}

impl LeaveResult {
  pub fn from_u32(value: u32) -> Self {
    match value {
      0x01 | 0x07 => LeaveResult::Left,
      0x08 => LeaveResult::Lost,
      0x09 => LeaveResult::Won,
      0x0A => LeaveResult::Draw,
      0x0B => LeaveResult::ObserverLeft,
      other => LeaveResult::Unknown(other),
    }
  }

  pub fn name(&self) -> &'static str {
    match *self {
      LeaveResult::Left => "Left",
      LeaveResult::Lost => "Lost",
      LeaveResult::Won => "Won",
      LeaveResult::Draw => "Draw",
      LeaveResult::ObserverLeft => "ObserverLeft",
      LeaveResult::Unknown(_) => "Unknown",
    }
  }
}

/// A player record from the replay prologue: record id (0x00 for the host,
/// 0x16 for everyone else), player id, null terminated name, then an
/// extra-data tag. Tag 0x01 (custom game) is followed by a single byte;
/// tag 0x08 (ladder game) by the ladder runtime and race preference dwords.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
  pub id: u8,
  pub name: String,
  pub is_host: bool,
  pub race: Race,
  pub runtime_ms: u32,
}

impl PlayerRecord {
  /// Peeks the record id byte. When it does not match the expected kind the
  /// buffer is left untouched and `None` is returned.
  pub fn decode<T: Buf>(buf: &mut T, host: bool) -> Result<Option<Self>, BinDecodeError> {
    let expected = if host {
      RECORD_HOST
    } else {
      RECORD_ADDITIONAL_PLAYER
    };
    match buf.peek_u8() {
      Some(id) if id == expected => {}
      _ => return Ok(None),
    }
    buf.advance(1);

    let id = u8::decode(buf)?;
    // Names are UTF-8 in modern replays but not guaranteed in old ones.
    let (name_bytes, _) = buf.get_delimited_bytes(0_u8)?;
    let name = String::from_utf8_lossy(&name_bytes).into_owned();
    let tag = u8::decode(buf)?;

    let mut race = Race::Unknown;
    let mut runtime_ms = 0;
    match tag {
      0x01 => {
        buf.check_size(1)?;
        buf.advance(1);
      }
      0x08 => {
        buf.check_size(8)?;
        runtime_ms = buf.get_u32_le();
        race = Race::from_flags(buf.get_u32_le() as u8);
      }
      other => {
        buf.check_size(other as usize)?;
        buf.advance(other as usize);
      }
    }

    Ok(Some(PlayerRecord {
      id,
      name,
      is_host: host,
      race,
      runtime_ms,
    }))
  }
}

/// Fully assembled player, immutable once the parse finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
  pub id: u8,
  pub name: String,
  pub race: Race,
  pub team: u8,
  pub color: u8,
  pub handicap: u8,
  pub is_host: bool,
  pub is_computer: bool,
  pub is_observer: bool,
  pub slot_status: SlotStatus,
  pub runtime_ms: u32,
  pub action_count: u32,
  pub apm: f64,
  pub leave_result: Option<LeaveResult>,
  pub leave_time_ms: Option<u32>,
}

impl Player {
  pub(crate) fn from_record(record: PlayerRecord) -> Self {
    Player {
      id: record.id,
      name: record.name,
      race: record.race,
      team: 0,
      color: 0,
      handicap: 100,
      is_host: record.is_host,
      is_computer: false,
      is_observer: false,
      slot_status: SlotStatus::Empty,
      runtime_ms: record.runtime_ms,
      action_count: 0,
      apm: 0.0,
      leave_result: None,
      leave_time_ms: None,
    }
  }

  pub(crate) fn computer(slot: &SlotRecord) -> Self {
    Player {
      id: slot.player_id,
      name: format!("Computer {}", slot.player_id),
      race: Race::from_flags(slot.race_flags),
      team: slot.team,
      color: slot.color,
      handicap: slot.handicap,
      is_host: false,
      is_computer: true,
      is_observer: false,
      slot_status: SlotStatus::Used,
      runtime_ms: 0,
      action_count: 0,
      apm: 0.0,
      leave_result: None,
      leave_time_ms: None,
    }
  }
}
