pub use crate::error::BinDecodeError;
pub use bytes::{Buf, BufMut, Bytes, BytesMut};
pub use std::ffi::CString;
pub use std::mem::size_of;

mod ext;

pub use self::ext::*;

/// Encodes a value into a buffer. Only used by tests to fabricate replay
/// bytes; the library itself never re-encodes replays.
pub trait BinEncode {
  fn encode<T: BufMut>(&self, buf: &mut T);
  fn encode_to_bytes(&self) -> BytesMut {
    let mut bytes = BytesMut::new();
    self.encode(&mut bytes);
    bytes
  }
}

pub trait BinDecode
where
  Self: Sized,
{
  /// Lower bound of the encoded size. Callers may `check_size` this before
  /// decoding to turn a guaranteed failure into `Incomplete` up front.
  const MIN_SIZE: usize = 0;
  const FIXED_SIZE: bool = false;
  fn decode<T: Buf>(buf: &mut T) -> Result<Self, BinDecodeError>;
}

macro_rules! impl_fixed {
  ($ty:ty, $put:ident, $get:ident) => {
    impl BinEncode for $ty {
      #[inline]
      fn encode<T: BufMut>(&self, buf: &mut T) {
        buf.$put(*self);
      }
    }
    impl BinDecode for $ty {
      const MIN_SIZE: usize = std::mem::size_of::<Self>();
      const FIXED_SIZE: bool = true;
      #[inline]
      fn decode<T: Buf>(buf: &mut T) -> Result<Self, BinDecodeError> {
        if buf.remaining() < std::mem::size_of::<Self>() {
          return Err(BinDecodeError::incomplete());
        }
        Ok(buf.$get())
      }
    }
  };
}

impl_fixed!(u8, put_u8, get_u8);
impl_fixed!(u16, put_u16_le, get_u16_le);
impl_fixed!(i32, put_i32_le, get_i32_le);
impl_fixed!(u32, put_u32_le, get_u32_le);
impl_fixed!(f32, put_f32_le, get_f32_le);
impl_fixed!(f64, put_f64_le, get_f64_le);

impl BinEncode for bool {
  #[inline]
  fn encode<T: BufMut>(&self, buf: &mut T) {
    buf.put_u8(if *self { 1 } else { 0 });
  }
}
impl BinDecode for bool {
  const MIN_SIZE: usize = 1;
  const FIXED_SIZE: bool = true;
  #[inline]
  fn decode<T: Buf>(buf: &mut T) -> Result<Self, BinDecodeError> {
    if !buf.has_remaining() {
      return Err(BinDecodeError::incomplete());
    }
    Ok(buf.get_u8() == 1)
  }
}

impl<const N: usize> BinEncode for [u8; N] {
  #[inline]
  fn encode<T: BufMut>(&self, buf: &mut T) {
    buf.put_slice(self.as_slice());
  }
}
impl<const N: usize> BinDecode for [u8; N] {
  const MIN_SIZE: usize = N;
  const FIXED_SIZE: bool = true;
  fn decode<T: Buf>(buf: &mut T) -> Result<Self, BinDecodeError> {
    if buf.remaining() < N {
      return Err(BinDecodeError::incomplete());
    }
    let mut out = [0_u8; N];
    buf.copy_to_slice(&mut out);
    Ok(out)
  }
}

impl BinEncode for CString {
  fn encode<T: BufMut>(&self, buf: &mut T) {
    buf.put_slice(self.as_bytes_with_nul());
  }
}
impl BinDecode for CString {
  const MIN_SIZE: usize = 1;
  const FIXED_SIZE: bool = false;
  fn decode<T: Buf>(buf: &mut T) -> Result<Self, BinDecodeError> {
    // The current chunk may end before the terminator when the buffer is
    // non-contiguous; accumulate chunk by chunk in that case.
    let mut out: Option<Vec<u8>> = None;
    loop {
      if !buf.has_remaining() {
        return Err(BinDecodeError::incomplete());
      }
      let chunk = buf.chunk();
      match chunk.iter().position(|b| *b == 0) {
        Some(pos) => {
          let done = match out.take() {
            Some(mut acc) => {
              acc.extend_from_slice(&chunk[..pos]);
              acc
            }
            None => chunk[..pos].to_vec(),
          };
          buf.advance(pos + 1);
          return CString::new(done).map_err(BinDecodeError::failure);
        }
        None => {
          let acc = out.get_or_insert_with(Vec::new);
          acc.extend_from_slice(chunk);
          let len = chunk.len();
          buf.advance(len);
        }
      }
    }
  }
}

impl<'a, T: BinEncode> BinEncode for &'a [T] {
  #[inline]
  fn encode<TBuf: BufMut>(&self, buf: &mut TBuf) {
    for v in self.iter() {
      v.encode(buf);
    }
  }
}

impl<T: BinEncode> BinEncode for Vec<T> {
  #[inline]
  fn encode<TBuf: BufMut>(&self, buf: &mut TBuf) {
    for v in self {
      v.encode(buf);
    }
  }
}

impl BinEncode for Bytes {
  #[inline]
  fn encode<T: BufMut>(&self, buf: &mut T) {
    buf.put(self.clone())
  }
}

#[test]
fn test_decode_cstring() {
  let cstr = "1234567890".as_bytes();
  // continuous buffer
  let mut buf = "1234567890\0z".as_bytes();
  assert_eq!(CString::decode(&mut buf).unwrap().as_bytes(), cstr);
  assert_eq!(buf.remaining(), 1);

  // non-continuous buffer
  let mut buf = (&b"12"[..])
    .chain(&b"34"[..])
    .chain(&b"56"[..])
    .chain(&b"78"[..])
    .chain(&b"90"[..])
    .chain(&b"\0z"[..]);

  assert_eq!(CString::decode(&mut buf).unwrap().as_bytes(), cstr);
  assert_eq!(buf.remaining(), 1);
}

#[test]
fn test_decode_cstring_unterminated() {
  let mut buf = &b"no terminator"[..];
  assert!(CString::decode(&mut buf).unwrap_err().is_incomplete());
}

#[test]
fn test_encode_round_trip() {
  let mut buf = BytesMut::new();
  0xAABB_u16.encode(&mut buf);
  1.5_f32.encode(&mut buf);
  true.encode(&mut buf);
  CString::new("x").unwrap().encode(&mut buf);
  [7_u8; 3].encode(&mut buf);

  assert_eq!(u16::decode(&mut buf).unwrap(), 0xAABB);
  assert_eq!(f32::decode(&mut buf).unwrap(), 1.5);
  assert_eq!(bool::decode(&mut buf).unwrap(), true);
  assert_eq!(
    CString::decode(&mut buf).unwrap(),
    CString::new("x").unwrap()
  );
  assert_eq!(<[u8; 3]>::decode(&mut buf).unwrap(), [7, 7, 7]);
  assert!(!buf.has_remaining());
}

#[test]
fn test_decode_fixed() {
  let mut buf = BytesMut::new();
  buf.put_u32_le(1);
  buf.put_u16_le(2);
  buf.put_u8(3);

  assert_eq!(u32::decode(&mut buf).unwrap(), 1);
  assert_eq!(u16::decode(&mut buf).unwrap(), 2);
  assert_eq!(u8::decode(&mut buf).unwrap(), 3);
  assert!(!buf.has_remaining());
  assert!(u8::decode(&mut buf).unwrap_err().is_incomplete());
}
