use super::{BinDecodeError, Buf};
use std::fmt::Debug;

pub trait BinBufExt {
  fn check_size(&mut self, size: usize) -> Result<(), BinDecodeError>;

  /// Next byte without advancing.
  fn peek_u8(&mut self) -> Option<u8>;

  fn get_tag<T: AsRef<[u8]> + Debug>(&mut self, tag: T) -> Result<T, BinDecodeError>;

  /// Bytes up to (not including) the first byte the matcher accepts; the
  /// matched byte is consumed and returned alongside.
  fn get_delimited_bytes<D: BinDelimiterMatcher>(
    &mut self,
    delim: D,
  ) -> Result<(Vec<u8>, u8), BinDecodeError>;
}

impl<T> BinBufExt for T
where
  T: Buf,
{
  #[inline]
  fn check_size(&mut self, size: usize) -> Result<(), BinDecodeError> {
    if self.remaining() < size {
      return Err(BinDecodeError::incomplete());
    }
    Ok(())
  }

  #[inline]
  fn peek_u8(&mut self) -> Option<u8> {
    let chunk = self.chunk();
    assert!(!chunk.is_empty() || !self.has_remaining());
    chunk.get(0).cloned()
  }

  fn get_tag<TTag: AsRef<[u8]> + Debug>(&mut self, tag: TTag) -> Result<TTag, BinDecodeError> {
    let tag_slice = tag.as_ref();
    if self.remaining() < tag_slice.len() {
      return Err(BinDecodeError::incomplete());
    }

    for i in 0..(tag_slice.len()) {
      if self.get_u8() != tag_slice[i] {
        return Err(BinDecodeError::failure(format!(
          "bytes does not match tag `{:?}`",
          tag
        )));
      }
    }

    Ok(tag)
  }

  fn get_delimited_bytes<D: BinDelimiterMatcher>(
    &mut self,
    mut delim: D,
  ) -> Result<(Vec<u8>, u8), BinDecodeError> {
    let mut bytes = vec![];
    for _ in 0..(self.remaining()) {
      let b = self.get_u8();
      if delim.match_byte(b) {
        return Ok((bytes, b));
      }
      bytes.push(b);
    }
    Err(BinDecodeError::incomplete())
  }
}

pub trait BinDelimiterMatcher {
  fn match_byte(&mut self, b: u8) -> bool;
}

impl BinDelimiterMatcher for u8 {
  fn match_byte(&mut self, b: u8) -> bool {
    *self == b
  }
}

impl<F> BinDelimiterMatcher for F
where
  F: FnMut(u8) -> bool,
{
  fn match_byte(&mut self, b: u8) -> bool {
    (*self)(b)
  }
}

pub trait BinDecodeErrorExt {
  fn context<T: std::fmt::Display>(self, ctx: T) -> Self;
}

impl<T> BinDecodeErrorExt for Result<T, BinDecodeError> {
  fn context<TContext: std::fmt::Display>(self, ctx: TContext) -> Self {
    self.map_err(|e| e.context(ctx))
  }
}
