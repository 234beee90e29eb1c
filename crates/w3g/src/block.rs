//! Compressed data blocks
//!
//! [Section 3.0](http://w3g.deepnode.de/files/w3g_format.txt)
//!
//! Each compressed data block consists of a framing header followed by
//! compressed data. The decompressed blocks append to a single continuous
//! data stream; the stream content is completely independent of the
//! original block boundaries.
//!
//! Classic framing (8 bytes):
//!
//! offset | size/type | Description
//! -------+-----------+------------------------------------------
//! 0x0000 |  1  word  | size n of compressed data (excluding header)
//! 0x0002 |  1  word  | size of decompressed data block
//! 0x0004 |  1 dword  | checksum
//! 0x0008 |  n bytes  | compressed data (raw deflate, no framing)
//!
//! Reforged framing (12 bytes):
//!
//! offset | size/type | Description
//! -------+-----------+------------------------------------------
//! 0x0000 |  1  word  | size n of compressed data (excluding header)
//! 0x0002 |  1  word  | unknown
//! 0x0004 |  1 dword  | size of decompressed data block
//! 0x0008 |  1 dword  | checksum
//! 0x000c |  n bytes  | compressed data (zlib, two-byte stream header)
//!
//! Checksums are carried but not verified. The last block of a replay is
//! frequently cut short of its zlib trailer; whatever bytes inflate
//! produced before the end-of-stream condition are kept.

use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::io::Read;

use w3g_util::binary::*;

use crate::error::{Error, Result};
use crate::header::Header;

#[derive(Debug, Clone)]
pub struct BlockHeader {
  pub compressed_size: u16,
  pub decompressed_size: u32,
  pub checksum: u32,
}

impl BlockHeader {
  pub const CLASSIC_SIZE: usize = 8;
  pub const REFORGED_SIZE: usize = 12;
}

#[derive(Debug)]
pub struct Block {
  pub header: BlockHeader,
  /// Decompressed content.
  pub data: Bytes,
}

/// Iterator over the compressed block sequence, yielding decompressed
/// blocks. In lenient mode a truncated trailing block ends iteration with
/// whatever bytes inflate produced; in strict mode it surfaces
/// [`Error::Truncated`].
#[derive(Debug)]
pub struct Blocks {
  buf: Bytes,
  reforged: bool,
  lenient: bool,
  num_blocks: usize,
  finished: usize,
  /// File offset of the next unread byte, for error reporting.
  pos: usize,
}

impl Blocks {
  pub fn new(buf: Bytes, header: &Header, lenient: bool) -> Self {
    Blocks {
      buf,
      reforged: header.is_reforged(),
      lenient,
      num_blocks: header.num_blocks as usize,
      finished: 0,
      pos: header.size_header as usize,
    }
  }

  fn frame_size(&self) -> usize {
    if self.reforged {
      BlockHeader::REFORGED_SIZE
    } else {
      BlockHeader::CLASSIC_SIZE
    }
  }

  fn next_block(&mut self) -> Option<Result<Block>> {
    if self.buf.remaining() < self.frame_size() {
      if self.lenient {
        return None;
      }
      return Some(Err(Error::Truncated {
        offset: self.pos + self.buf.remaining(),
      }));
    }

    let header = if self.reforged {
      let compressed_size = self.buf.get_u16_le();
      let _unknown = self.buf.get_u16_le();
      let decompressed_size = self.buf.get_u32_le();
      let checksum = self.buf.get_u32_le();
      BlockHeader {
        compressed_size,
        decompressed_size,
        checksum,
      }
    } else {
      let compressed_size = self.buf.get_u16_le();
      let decompressed_size = self.buf.get_u16_le() as u32;
      let checksum = self.buf.get_u32_le();
      BlockHeader {
        compressed_size,
        decompressed_size,
        checksum,
      }
    };
    self.pos += self.frame_size();

    let declared = header.compressed_size as usize;
    let truncated = self.buf.remaining() < declared;
    if truncated && !self.lenient {
      return Some(Err(Error::Truncated {
        offset: self.pos + self.buf.remaining(),
      }));
    }
    let taken = declared.min(self.buf.remaining());
    let compressed = self.buf.copy_to_bytes(taken);
    let block_offset = self.pos;
    self.pos += taken;

    let inflated = if self.reforged {
      inflate_keep_partial(ZlibDecoder::new(compressed.as_ref()))
    } else {
      // Edge replays carry zlib-framed data in classic files; retry before
      // giving up.
      inflate_keep_partial(DeflateDecoder::new(compressed.as_ref()))
        .or_else(|_| inflate_keep_partial(ZlibDecoder::new(compressed.as_ref())))
    };

    match inflated {
      Ok(data) => {
        if truncated {
          // Consume the rest of the sequence; the partial bytes are the
          // final payload contribution.
          self.finished = self.num_blocks;
        }
        Some(Ok(Block {
          header,
          data: Bytes::from(data),
        }))
      }
      Err(_) if truncated => None,
      Err(_) => Some(Err(Error::Decompression {
        offset: block_offset,
      })),
    }
  }
}

impl Iterator for Blocks {
  type Item = Result<Block>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.finished >= self.num_blocks {
      return None;
    }
    let item = self.next_block();
    match item {
      Some(Ok(_)) => {
        self.finished += 1;
      }
      _ => {
        self.finished = self.num_blocks;
      }
    }
    item
  }
}

/// Concatenates every block into the single logical payload.
pub fn decompress_payload(buf: Bytes, header: &Header, lenient: bool) -> Result<Bytes> {
  let mut out = BytesMut::with_capacity(header.size_decompressed as usize);
  for block in Blocks::new(buf, header, lenient) {
    out.extend_from_slice(&block?.data);
  }
  Ok(out.freeze())
}

/// Inflates to end of stream, keeping bytes already produced when the
/// stream ends inside a checksum or length trailer. Errors only when no
/// output was produced at all.
fn inflate_keep_partial<R: Read>(mut r: R) -> std::io::Result<Vec<u8>> {
  let mut out = Vec::new();
  let mut chunk = [0_u8; 8192];
  loop {
    match r.read(&mut chunk) {
      Ok(0) => break,
      Ok(n) => out.extend_from_slice(&chunk[..n]),
      Err(e) => {
        if out.is_empty() {
          return Err(e);
        }
        break;
      }
    }
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use flate2::write::{DeflateEncoder, ZlibEncoder};
  use flate2::Compression;
  use std::io::Write;

  fn deflate(data: &[u8]) -> Vec<u8> {
    let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
  }

  fn zlib(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
  }

  fn classic_block(payload: &[u8]) -> BytesMut {
    let compressed = deflate(payload);
    let mut buf = BytesMut::new();
    buf.put_u16_le(compressed.len() as u16);
    buf.put_u16_le(payload.len() as u16);
    buf.put_u32_le(0);
    buf.put_slice(&compressed);
    buf
  }

  fn classic_header(num_blocks: u32) -> Header {
    Header {
      size_header: 0x40,
      size_file: 0,
      header_version: 0,
      size_decompressed: 0,
      num_blocks,
      game_id: w3g_util::dword_string::DwordString::new(b"WAR3"),
      version: 6,
      build_number: 0,
      flags: 0,
      duration_ms: 0,
      crc32: 0,
    }
  }

  #[test]
  fn test_classic_blocks_concatenate() {
    let mut buf = classic_block(b"hello ");
    buf.extend_from_slice(&classic_block(b"world"));
    let payload =
      decompress_payload(buf.freeze(), &classic_header(2), false).unwrap();
    assert_eq!(&payload[..], b"hello world");
  }

  #[test]
  fn test_classic_zlib_fallback() {
    let compressed = zlib(b"fallback");
    let mut buf = BytesMut::new();
    buf.put_u16_le(compressed.len() as u16);
    buf.put_u16_le(8);
    buf.put_u32_le(0);
    buf.put_slice(&compressed);

    let payload = decompress_payload(buf.freeze(), &classic_header(1), false).unwrap();
    assert_eq!(&payload[..], b"fallback");
  }

  #[test]
  fn test_reforged_block() {
    let compressed = zlib(b"reforged payload");
    let mut buf = BytesMut::new();
    buf.put_u16_le(compressed.len() as u16);
    buf.put_u16_le(0);
    buf.put_u32_le(16);
    buf.put_u32_le(0);
    buf.put_slice(&compressed);

    let mut header = classic_header(1);
    header.version = 10032;
    let payload = decompress_payload(buf.freeze(), &header, false).unwrap();
    assert_eq!(&payload[..], b"reforged payload");
  }

  #[test]
  fn test_missing_trailer_keeps_output() {
    // Drop the adler32 trailer entirely; the inflated bytes must survive.
    let mut compressed = zlib(b"missing trailer");
    compressed.truncate(compressed.len() - 4);
    let mut buf = BytesMut::new();
    buf.put_u16_le(compressed.len() as u16);
    buf.put_u16_le(0);
    buf.put_u32_le(15);
    buf.put_u32_le(0);
    buf.put_slice(&compressed);

    let mut header = classic_header(1);
    header.version = 10032;
    let payload = decompress_payload(buf.freeze(), &header, false).unwrap();
    assert_eq!(&payload[..], b"missing trailer");
  }

  #[test]
  fn test_garbage_is_decompression_error() {
    let mut buf = BytesMut::new();
    buf.put_u16_le(4);
    buf.put_u16_le(100);
    buf.put_u32_le(0);
    buf.put_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);

    match decompress_payload(buf.freeze(), &classic_header(1), false) {
      Err(Error::Decompression { .. }) => {}
      other => panic!("expected Decompression, got {:?}", other),
    }
  }

  #[test]
  fn test_lenient_truncation() {
    let block = classic_block(b"only the first block survives");
    let full_len = block.len();
    for cut in 0..full_len {
      let payload = decompress_payload(
        block.clone().freeze().slice(0..cut),
        &classic_header(2),
        true,
      )
      .unwrap();
      assert!(payload.len() <= b"only the first block survives".len());
    }
    // Untouched first block, missing second block.
    let payload = decompress_payload(block.freeze(), &classic_header(2), true).unwrap();
    assert_eq!(&payload[..], b"only the first block survives");
  }

  #[test]
  fn test_strict_truncation() {
    let block = classic_block(b"data");
    let cut = block.freeze().slice(0..4);
    match decompress_payload(cut, &classic_header(1), false) {
      Err(Error::Truncated { .. }) => {}
      other => panic!("expected Truncated, got {:?}", other),
    }
  }
}
