use w3g_util::binary::*;

use crate::constants::{CHAT_FLAG_SCOPED, CHAT_FLAG_STARTUP};

/// An in-game chat line (0x20 block, patch 1.07+):
/// `u8 sender · u16 length · u8 flags · [u32 mode] · body\0`.
/// Flag 0x10 marks pre-game (startup) chat, which carries no mode dword.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
  pub timestamp_ms: u32,
  pub player_id: u8,
  pub player_name: String,
  pub message: String,
  pub mode: u32,
  pub is_startup: bool,
}

impl ChatMessage {
  pub(crate) fn decode<T: Buf>(buf: &mut T) -> Result<Self, BinDecodeError> {
    buf.check_size(4)?;
    let player_id = buf.get_u8();
    let _length = buf.get_u16_le();
    let flags = buf.get_u8();

    let mut mode = 0;
    let mut is_startup = false;
    if flags == CHAT_FLAG_STARTUP {
      is_startup = true;
    } else if flags == CHAT_FLAG_SCOPED {
      mode = u32::decode(buf)?;
    }
    // Other flag values have been seen in the wild; the body still follows.

    let (message_bytes, _) = buf.get_delimited_bytes(0_u8)?;
    let message = String::from_utf8_lossy(&message_bytes).into_owned();

    Ok(ChatMessage {
      timestamp_ms: 0,
      player_id,
      player_name: String::new(),
      message,
      mode,
      is_startup,
    })
  }

  pub fn mode_name(&self) -> String {
    match self.mode {
      0 => "All".to_string(),
      1 => "Allies".to_string(),
      2 => "Observers".to_string(),
      n => format!("Player {}", n - 2),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use bytes::{BufMut, BytesMut};

  #[test]
  fn test_decode_scoped() {
    let mut buf = BytesMut::new();
    buf.put_u8(2);
    buf.put_u16_le(11);
    buf.put_u8(0x20);
    buf.put_u32_le(1);
    buf.put_slice(b"to allies\0");

    let msg = ChatMessage::decode(&mut buf).unwrap();
    assert_eq!(msg.player_id, 2);
    assert_eq!(msg.mode, 1);
    assert_eq!(msg.mode_name(), "Allies");
    assert_eq!(msg.message, "to allies");
    assert!(!msg.is_startup);
    assert!(!buf.has_remaining());
  }

  #[test]
  fn test_decode_startup() {
    let mut buf = BytesMut::new();
    buf.put_u8(1);
    buf.put_u16_le(3);
    buf.put_u8(0x10);
    buf.put_slice(b"gl\0");

    let msg = ChatMessage::decode(&mut buf).unwrap();
    assert!(msg.is_startup);
    assert_eq!(msg.mode, 0);
    assert_eq!(msg.message, "gl");
  }

  #[test]
  fn test_mode_name_to_player() {
    let mut msg = ChatMessage {
      timestamp_ms: 0,
      player_id: 1,
      player_name: String::new(),
      message: String::new(),
      mode: 5,
      is_startup: false,
    };
    assert_eq!(msg.mode_name(), "Player 3");
    msg.mode = 0;
    assert_eq!(msg.mode_name(), "All");
  }
}
