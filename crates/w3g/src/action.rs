//! Player command decoding.
//!
//! A time slot's command data is a run of per-player frames:
//! `u8 player · u16 block-length · block-length bytes` of back-to-back
//! actions. Every action starts with a one-byte opcode; the rest of the
//! layout is opcode-keyed and, for the ability opcodes, depends on the
//! game version (the ability-flags field grew from one byte to two in
//! version 13). An opcode with no known layout ends the current frame,
//! since its length cannot be determined safely.

use std::borrow::Cow;
use std::collections::BTreeMap;

use w3g_util::binary::*;
use w3g_util::dword_string::DwordString;

use crate::constants::{ActionTypeId, ITEM_ID_NAMES};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum ActionValue {
  Uint(u32),
  Float(f32),
  Str(String),
  List(Vec<u32>),
}

/// Decoded per-opcode attributes, keyed by field name.
pub type ActionData = BTreeMap<&'static str, ActionValue>;

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
  pub timestamp_ms: u32,
  pub player_id: u8,
  pub kind: ActionTypeId,
  /// Raw action bytes, opcode included.
  pub payload: Bytes,
  pub data: ActionData,
}

impl Action {
  pub fn name(&self) -> Cow<'static, str> {
    self.kind.name()
  }
}

/// Renders a 4-byte item/ability id.
///
/// `XX XX 0D 00` is a numeric ability command, rendered `ability_<n>` or
/// via the name table. Printable ids are 4-character codes stored in
/// reverse order (`tlah` → `halt` → "Altar of Kings"). Anything else is
/// rendered as hex.
pub fn decode_item_id(bytes: [u8; 4]) -> String {
  if bytes[2] == 0x0D && bytes[3] == 0x00 {
    let num = u16::from_le_bytes([bytes[0], bytes[1]]);
    let key = format!("ability_{}", num);
    return match ITEM_ID_NAMES.get(key.as_str()) {
      Some(name) => (*name).to_string(),
      None => key,
    };
  }

  let dword = DwordString::from_bytes(bytes);
  if dword.is_printable() {
    let code = dword.to_string();
    if !code.is_empty() {
      return match ITEM_ID_NAMES.get(code.as_str()) {
        Some(name) => (*name).to_string(),
        None => code,
      };
    }
  }

  bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

enum Decoded {
  Action(Action),
  /// Opcode with no known layout; nothing was consumed.
  UnknownOpcode(u8),
}

/// Decodes every command frame in `frame`, stamping the frame's player id
/// into each action. `base_offset` is the absolute payload offset of the
/// frame start, used for strict-mode error reporting.
pub(crate) fn decode_command_data(
  frame: &mut Bytes,
  version: u32,
  strict: bool,
  base_offset: usize,
) -> Result<Vec<Action>> {
  let total = frame.len();
  let mut actions = vec![];

  while frame.remaining() >= 3 {
    let player_id = frame.get_u8();
    let declared = frame.get_u16_le() as usize;
    let take = declared.min(frame.remaining());
    let mut block = frame.copy_to_bytes(take);

    while block.has_remaining() {
      match decode_one(&mut block, version) {
        Decoded::Action(mut action) => {
          action.player_id = player_id;
          actions.push(action);
        }
        Decoded::UnknownOpcode(id) => {
          let offset = base_offset + (total - frame.remaining()) - block.remaining();
          if strict {
            return Err(Error::UnknownAction { id, offset });
          }
          tracing::debug!(id, offset, "skipping rest of command frame after unknown action");
          break;
        }
      }
    }

    if take < declared {
      break;
    }
  }

  Ok(actions)
}

fn decode_one(block: &mut Bytes, version: u32) -> Decoded {
  use ActionTypeId::*;

  let start = block.clone();
  let kind = match block.peek_u8() {
    Some(id) => match ActionTypeId::from_u8(id) {
      UnknownValue(id) => return Decoded::UnknownOpcode(id),
      kind => kind,
    },
    None => return Decoded::UnknownOpcode(0),
  };
  block.advance(1);

  let flags_width = if version >= 13 { 2 } else { 1 };
  let mut data = ActionData::new();

  match kind {
    Pause | Resume | IncSpeed | DecSpeed | EscPressed | HeroSkillMenu | BuildingMenu
    | PreSubselection => {}

    SetSpeed => {
      if block.has_remaining() {
        data.insert("speed", ActionValue::Uint(block.get_u8() as u32));
      }
    }

    SaveGame => {
      data.insert("filename", ActionValue::Str(take_cstring(block)));
    }

    SaveFinished => skip(block, 4),

    AbilityNoParams => {
      if block.remaining() >= flags_width + 12 {
        decode_ability_head(block, flags_width, &mut data);
        skip(block, 8);
      } else {
        skip_all(block);
      }
    }

    AbilityTargetPos => {
      if block.remaining() >= flags_width + 20 {
        decode_ability_head(block, flags_width, &mut data);
        skip(block, 8);
        data.insert("target_x", ActionValue::Float(block.get_f32_le()));
        data.insert("target_y", ActionValue::Float(block.get_f32_le()));
      } else {
        skip_all(block);
      }
    }

    AbilityPosObject => {
      if block.remaining() >= flags_width + 28 {
        decode_ability_head(block, flags_width, &mut data);
        skip(block, 8);
        data.insert("target_x", ActionValue::Float(block.get_f32_le()));
        data.insert("target_y", ActionValue::Float(block.get_f32_le()));
        data.insert("object_id_1", ActionValue::Uint(block.get_u32_le()));
        data.insert("object_id_2", ActionValue::Uint(block.get_u32_le()));
      } else {
        skip_all(block);
      }
    }

    // Opaque beyond their total length.
    AbilityDropItem => skip(block, flags_width + 35),
    AbilityTwoPos => skip(block, flags_width + 40),

    ChangeSelection | AssignGroup => {
      if block.remaining() >= 3 {
        let key = if kind == ChangeSelection {
          "select_mode"
        } else {
          "group"
        };
        data.insert(key, ActionValue::Uint(block.get_u8() as u32));
        let unit_count = block.get_u16_le();
        data.insert("unit_count", ActionValue::Uint(unit_count as u32));
        let mut object_ids = Vec::with_capacity(unit_count as usize);
        for _ in 0..unit_count {
          if block.remaining() < 8 {
            break;
          }
          // Pairs of dwords per unit; the second repeats the first.
          object_ids.push(block.get_u32_le());
          block.advance(4);
        }
        data.insert("object_ids", ActionValue::List(object_ids));
      } else {
        skip_all(block);
      }
    }

    SelectGroup => {
      if block.remaining() >= 2 {
        data.insert("group", ActionValue::Uint(block.get_u8() as u32));
        block.advance(1);
      } else {
        skip_all(block);
      }
    }

    SelectSubgroup => {
      if version >= 14 {
        skip(block, 12);
      } else {
        skip(block, 1);
      }
    }

    SyncSelection => {
      if block.remaining() >= 9 {
        data.insert("flag", ActionValue::Uint(block.get_u8() as u32));
        data.insert("object_id_1", ActionValue::Uint(block.get_u32_le()));
        data.insert("object_id_2", ActionValue::Uint(block.get_u32_le()));
      } else {
        skip_all(block);
      }
    }

    SelectGroundItem => skip(block, 9),
    CancelHeroRevival => skip(block, 8),

    RemoveFromQueue => {
      if block.remaining() >= 5 {
        data.insert("slot", ActionValue::Uint(block.get_u8() as u32));
        data.insert("item_id", ActionValue::Str(item_id_field(block)));
      } else {
        skip_all(block);
      }
    }

    AllyOptions => {
      if block.remaining() >= 5 {
        data.insert("player_slot", ActionValue::Uint(block.get_u8() as u32));
        data.insert("flags", ActionValue::Uint(block.get_u32_le()));
      } else {
        skip_all(block);
      }
    }

    TransferResources => {
      if block.remaining() >= 9 {
        data.insert("player_slot", ActionValue::Uint(block.get_u8() as u32));
        data.insert("gold", ActionValue::Uint(block.get_u32_le()));
        data.insert("lumber", ActionValue::Uint(block.get_u32_le()));
      } else {
        skip_all(block);
      }
    }

    TriggerCommand => {
      skip(block, 8);
      data.insert("command", ActionValue::Str(take_cstring(block)));
    }

    ScenarioTrigger => skip(block, 12),

    MinimapSignal => {
      if block.remaining() >= 12 {
        data.insert("x", ActionValue::Float(block.get_f32_le()));
        data.insert("y", ActionValue::Float(block.get_f32_le()));
        block.advance(4);
      } else {
        skip_all(block);
      }
    }

    ContinueGameB | ContinueGameA => skip(block, 16),
    Unknown75 => skip(block, 1),
    Cheat(_) => skip(block, 5),

    UnknownValue(_) => unreachable!("filtered above"),
  }

  let consumed = start.len() - block.len();
  Decoded::Action(Action {
    timestamp_ms: 0,
    player_id: 0,
    kind,
    payload: start.slice(0..consumed),
    data,
  })
}

fn decode_ability_head(block: &mut Bytes, flags_width: usize, data: &mut ActionData) {
  let flags = if flags_width == 2 {
    block.get_u16_le() as u32
  } else {
    block.get_u8() as u32
  };
  data.insert("ability_flags", ActionValue::Uint(flags));
  data.insert("item_id", ActionValue::Str(item_id_field(block)));
}

fn item_id_field(block: &mut Bytes) -> String {
  let mut bytes = [0_u8; 4];
  block.copy_to_slice(&mut bytes);
  decode_item_id(bytes)
}

fn take_cstring(block: &mut Bytes) -> String {
  match block.iter().position(|&b| b == 0) {
    Some(pos) => {
      let s = String::from_utf8_lossy(&block[..pos]).into_owned();
      block.advance(pos + 1);
      s
    }
    None => {
      let s = String::from_utf8_lossy(&block[..]).into_owned();
      skip_all(block);
      s
    }
  }
}

#[inline]
fn skip(block: &mut Bytes, n: usize) {
  let n = n.min(block.remaining());
  block.advance(n);
}

#[inline]
fn skip_all(block: &mut Bytes) {
  let n = block.remaining();
  block.advance(n);
}

#[cfg(test)]
mod tests {
  use super::*;
  use bytes::{BufMut, BytesMut};

  fn frame(player_id: u8, action_bytes: &[u8]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u8(player_id);
    buf.put_u16_le(action_bytes.len() as u16);
    buf.put_slice(action_bytes);
    buf.freeze()
  }

  #[test]
  fn test_decode_item_id_numeric() {
    assert_eq!(decode_item_id([0x06, 0x00, 0x0D, 0x00]), "Move");
    assert_eq!(decode_item_id([0xF0, 0x00, 0x0D, 0x00]), "ability_240");
  }

  #[test]
  fn test_decode_item_id_fourcc() {
    assert_eq!(decode_item_id(*b"tlah"), "Altar of Kings");
    assert_eq!(decode_item_id(*b"wxyz"), "zyxw");
    assert_eq!(decode_item_id([0x01, 0x02, 0x03, 0x04]), "01020304");
  }

  #[test]
  fn test_pause_counts_one_byte() {
    let mut buf = frame(1, &[0x01, 0x02]);
    let actions = decode_command_data(&mut buf, 26, false, 0).unwrap();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].kind, ActionTypeId::Pause);
    assert_eq!(actions[1].kind, ActionTypeId::Resume);
    assert_eq!(actions[0].player_id, 1);
    assert_eq!(&actions[0].payload[..], &[0x01]);
  }

  #[test]
  fn test_ability_position() {
    let mut action = BytesMut::new();
    action.put_u8(0x11);
    action.put_u16_le(0x0040);
    action.put_slice(b"tlah");
    action.put_slice(&[0_u8; 8]);
    action.put_f32_le(512.0);
    action.put_f32_le(1024.0);

    let mut buf = frame(3, &action);
    let actions = decode_command_data(&mut buf, 6114, false, 0).unwrap();
    assert_eq!(actions.len(), 1);
    let a = &actions[0];
    assert_eq!(a.name(), "ability_position");
    assert_eq!(
      a.data.get("item_id"),
      Some(&ActionValue::Str("Altar of Kings".to_string()))
    );
    assert_eq!(a.data.get("target_x"), Some(&ActionValue::Float(512.0)));
    assert_eq!(a.data.get("target_y"), Some(&ActionValue::Float(1024.0)));
    assert_eq!(a.data.get("ability_flags"), Some(&ActionValue::Uint(0x40)));
    assert_eq!(a.payload.len(), 23);
  }

  #[test]
  fn test_ability_flags_width_pre_13() {
    // Version 12: one-byte flags, 21-byte total
    let mut action = BytesMut::new();
    action.put_u8(0x11);
    action.put_u8(0x40);
    action.put_slice(b"tlah");
    action.put_slice(&[0_u8; 8]);
    action.put_f32_le(1.0);
    action.put_f32_le(2.0);

    let mut buf = frame(1, &action);
    let actions = decode_command_data(&mut buf, 12, false, 0).unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(
      actions[0].data.get("target_y"),
      Some(&ActionValue::Float(2.0))
    );
    assert_eq!(actions[0].payload.len(), 22);
  }

  #[test]
  fn test_change_selection_retains_first_dword() {
    let mut action = BytesMut::new();
    action.put_u8(0x16);
    action.put_u8(1); // add
    action.put_u16_le(2);
    action.put_u32_le(0x1111);
    action.put_u32_le(0x1111);
    action.put_u32_le(0x2222);
    action.put_u32_le(0x2222);

    let mut buf = frame(1, &action);
    let actions = decode_command_data(&mut buf, 26, false, 0).unwrap();
    assert_eq!(
      actions[0].data.get("object_ids"),
      Some(&ActionValue::List(vec![0x1111, 0x2222]))
    );
    assert_eq!(actions[0].data.get("unit_count"), Some(&ActionValue::Uint(2)));
  }

  #[test]
  fn test_transfer_resources_distinct_fields() {
    let mut action = BytesMut::new();
    action.put_u8(0x51);
    action.put_u8(4);
    action.put_u32_le(500);
    action.put_u32_le(250);

    let mut buf = frame(1, &action);
    let actions = decode_command_data(&mut buf, 26, false, 0).unwrap();
    assert_eq!(actions[0].data.get("gold"), Some(&ActionValue::Uint(500)));
    assert_eq!(actions[0].data.get("lumber"), Some(&ActionValue::Uint(250)));
  }

  #[test]
  fn test_trigger_command_string() {
    let mut action = BytesMut::new();
    action.put_u8(0x60);
    action.put_slice(&[0_u8; 8]);
    action.put_slice(b"-ma\0");

    let mut buf = frame(1, &action);
    let actions = decode_command_data(&mut buf, 26, false, 0).unwrap();
    assert_eq!(
      actions[0].data.get("command"),
      Some(&ActionValue::Str("-ma".to_string()))
    );
  }

  #[test]
  fn test_select_subgroup_version_split() {
    let bytes = [0x19, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x01];
    let mut buf = frame(1, &bytes);
    let actions = decode_command_data(&mut buf, 14, false, 0).unwrap();
    // 13 bytes for the subgroup action, then a pause
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[1].kind, ActionTypeId::Pause);

    let mut buf = frame(1, &bytes[..2]);
    let actions = decode_command_data(&mut buf, 13, false, 0).unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].kind, ActionTypeId::SelectSubgroup);
    assert_eq!(actions[0].payload.len(), 2);
  }

  #[test]
  fn test_unknown_opcode_stops_frame() {
    let mut buf = frame(1, &[0x01, 0xAB, 0x01]);
    let actions = decode_command_data(&mut buf, 26, false, 0).unwrap();
    assert_eq!(actions.len(), 1);

    let mut buf = frame(1, &[0x01, 0xAB, 0x01]);
    match decode_command_data(&mut buf, 26, true, 0x100) {
      Err(Error::UnknownAction { id: 0xAB, offset }) => assert_eq!(offset, 0x104),
      other => panic!("expected UnknownAction, got {:?}", other),
    }
  }

  #[test]
  fn test_unknown_opcode_does_not_stop_next_frame() {
    let mut buf = BytesMut::new();
    buf.put_slice(&frame(1, &[0xAB]));
    buf.put_slice(&frame(2, &[0x02]));
    let mut buf = buf.freeze();
    let actions = decode_command_data(&mut buf, 26, false, 0).unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].player_id, 2);
  }

  #[test]
  fn test_cheat_opcodes() {
    let mut buf = frame(1, &[0x20, 0, 0, 0, 0, 0]);
    let actions = decode_command_data(&mut buf, 26, false, 0).unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].name(), "cheat");
    assert_eq!(actions[0].payload.len(), 6);
  }

  #[test]
  fn test_truncated_ability_keeps_action() {
    let mut buf = frame(1, &[0x11, 0x40, 0x00, b't']);
    let actions = decode_command_data(&mut buf, 26, false, 0).unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].kind, ActionTypeId::AbilityTargetPos);
    assert!(actions[0].data.is_empty());
  }
}
