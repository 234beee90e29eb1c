use crate::binary::{BinDecode, BinDecodeError, BinEncode, Buf, BufMut};
use std::fmt;

/// A 4-character code stored as a little-endian dword, e.g. the `W3XP`
/// product identifier or an ability/item id like `halt`. The in-file byte
/// order is the reverse of the display order.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DwordString {
  bytes: [u8; 4],
}

impl DwordString {
  pub fn new(bstr: &[u8; 4]) -> Self {
    DwordString {
      bytes: [bstr[3], bstr[2], bstr[1], bstr[0]],
    }
  }

  /// Wraps raw in-file bytes (reversed order).
  pub fn from_bytes(bytes: [u8; 4]) -> Self {
    DwordString { bytes }
  }

  pub fn as_bytes(&self) -> &[u8; 4] {
    &self.bytes
  }

  /// True when every byte is zero or printable ASCII, i.e. the value can be
  /// rendered as a character code rather than a number.
  pub fn is_printable(&self) -> bool {
    self
      .bytes
      .iter()
      .all(|&b| b == 0 || (0x20..=0x7E).contains(&b))
  }

  pub fn to_string(&self) -> String {
    self
      .bytes
      .iter()
      .rev()
      .cloned()
      .filter(|&byte| byte != 0)
      .map(char::from)
      .collect()
  }
}

impl BinEncode for DwordString {
  fn encode<T: BufMut>(&self, buf: &mut T) {
    buf.put_slice(&self.bytes);
  }
}

impl BinDecode for DwordString {
  const MIN_SIZE: usize = 4;
  const FIXED_SIZE: bool = true;
  fn decode<T: Buf>(buf: &mut T) -> Result<Self, BinDecodeError> {
    Ok(DwordString {
      bytes: <[u8; 4]>::decode(buf)?,
    })
  }
}

impl fmt::Display for DwordString {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "'{}'", self.to_string())
  }
}

impl fmt::Debug for DwordString {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "'{}'", self.to_string())
  }
}

impl<'a> PartialEq<&'a [u8; 4]> for DwordString {
  fn eq(&self, other: &&'a [u8; 4]) -> bool {
    self.bytes[0] == other[3]
      && self.bytes[1] == other[2]
      && self.bytes[2] == other[1]
      && self.bytes[3] == other[0]
  }
}

#[test]
fn test_dword_string() {
  assert_eq!(DwordString::new(b"W3XP").as_bytes(), &[80_u8, 88, 51, 87]);
  assert_eq!(
    DwordString::from_bytes([80_u8, 88, 51, 87]).to_string(),
    "W3XP"
  );
  assert_eq!(DwordString::new(b"W3XP"), b"W3XP");
}

#[test]
fn test_printable() {
  assert!(DwordString::from_bytes(*b"tlah").is_printable());
  assert!(DwordString::from_bytes([0, 0x68, 0x69, 0]).is_printable());
  assert!(!DwordString::from_bytes([0x06, 0x00, 0x0D, 0x00]).is_printable());
}
