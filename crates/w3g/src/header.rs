//! Replay header
//!
//! [Section 2.0](http://w3g.deepnode.de/files/w3g_format.txt)
//!
//! offset | size/type | Description
//! -------+-----------+-----------------------------------------------------------
//! 0x0000 | 28 chars  | zero terminated string "Warcraft III recorded game\0x1A\0"
//! 0x001c |  1 dword  | fileoffset of first compressed data block (header size)
//!        |           |  0x40 for WarCraft III with patch <= v1.06
//!        |           |  0x44 for WarCraft III patch >= 1.07 and TFT replays
//! 0x0020 |  1 dword  | overall size of compressed file
//! 0x0024 |  1 dword  | replay header version: 0x00 (<= 1.06) or 0x01 (>= 1.07)
//! 0x0028 |  1 dword  | overall size of decompressed data (excluding header)
//! 0x002c |  1 dword  | number of compressed data blocks in file
//! 0x0030 |  n bytes  | SubHeader (see below)
//!
//! SubHeader for header version 0 (16 bytes): unknown word, version word,
//! build word, flags word, duration dword, checksum dword. The version dword
//! identifier is absent; these replays are always `WAR3`.
//!
//! SubHeader for header version 1 (20 bytes): version identifier dword
//! (`WAR3`, `W3XP`, or `PX3W` on Reforged), version dword, build word,
//! flags word, duration dword, checksum dword.

use std::time::Duration;

use w3g_util::binary::*;
use w3g_util::dword_string::DwordString;

use crate::constants::{
  FLAG_MULTIPLAYER, REFORGED_BUILD_VERSIONS, REFORGED_VERSION, SIGNATURE, SUB_HEADER_V0_SIZE,
  SUB_HEADER_V1_SIZE,
};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Header {
  /// File offset of the first compressed block.
  pub size_header: u32,
  pub size_file: u32,
  pub header_version: u32,
  pub size_decompressed: u32,
  pub num_blocks: u32,
  /// `WAR3`, `W3XP` or `PX3W`.
  pub game_id: DwordString,
  pub version: u32,
  pub build_number: u16,
  pub flags: u16,
  pub duration_ms: u32,
  pub crc32: u32,
}

impl Header {
  pub const MIN_SIZE: usize = crate::constants::BASE_HEADER_SIZE + SUB_HEADER_V0_SIZE;
  pub const MAX_SIZE: usize = crate::constants::BASE_HEADER_SIZE + SUB_HEADER_V1_SIZE;

  pub fn decode<T: Buf>(buf: &mut T) -> Result<Self> {
    // On truncation the reported offset is the end of the available data.
    let available = buf.remaining();

    if buf.remaining() < crate::constants::BASE_HEADER_SIZE {
      return Err(Error::Truncated {
        offset: buf.remaining(),
      });
    }

    let sig = <[u8; 28]>::decode(buf).map_err(|_| Error::Truncated { offset: 0 })?;
    if sig != SIGNATURE {
      return Err(Error::InvalidHeader(format!(
        "magic mismatch: {:02x?}",
        &sig[..]
      )));
    }

    let size_header = buf.get_u32_le();
    let size_file = buf.get_u32_le();
    let header_version = buf.get_u32_le();
    let size_decompressed = buf.get_u32_le();
    let num_blocks = buf.get_u32_le();

    match header_version {
      0 => {
        if buf.remaining() < SUB_HEADER_V0_SIZE {
          return Err(Error::Truncated { offset: available });
        }
        let _unknown = buf.get_u16_le();
        let version = buf.get_u16_le() as u32;
        let build_number = buf.get_u16_le();
        let flags = buf.get_u16_le();
        let duration_ms = buf.get_u32_le();
        let crc32 = buf.get_u32_le();
        Ok(Header {
          size_header,
          size_file,
          header_version,
          size_decompressed,
          num_blocks,
          game_id: DwordString::new(b"WAR3"),
          version,
          build_number,
          flags,
          duration_ms,
          crc32,
        })
      }
      1 => {
        if buf.remaining() < SUB_HEADER_V1_SIZE {
          return Err(Error::Truncated { offset: available });
        }
        // The identifier is matched and displayed in file order: `WAR3`,
        // `W3XP`, or (byte-swapped by the Reforged writer) `PX3W`.
        let raw = <[u8; 4]>::decode(buf).map_err(Error::from)?;
        let game_id = DwordString::new(&raw);
        let version = buf.get_u32_le();
        let build_number = buf.get_u16_le();
        let flags = buf.get_u16_le();
        let duration_ms = buf.get_u32_le();
        let crc32 = buf.get_u32_le();
        Ok(Header {
          size_header,
          size_file,
          header_version,
          size_decompressed,
          num_blocks,
          game_id,
          version,
          build_number,
          flags,
          duration_ms,
          crc32,
        })
      }
      other => Err(Error::InvalidHeader(format!(
        "unknown header version: {}",
        other
      ))),
    }
  }

  pub fn is_multiplayer(&self) -> bool {
    self.flags & FLAG_MULTIPLAYER != 0
  }

  pub fn is_reforged(&self) -> bool {
    self.version >= REFORGED_VERSION || self.game_id == b"PX3W"
  }

  pub fn is_expansion(&self) -> bool {
    self.game_id == b"W3XP" || self.game_id == b"PX3W"
  }

  pub fn duration(&self) -> Duration {
    Duration::from_millis(self.duration_ms as u64)
  }

  /// Patch-level version, e.g. `1.26` or `1.32.7`. For Reforged replays the
  /// build number is authoritative; pre-Reforged versions decompose from the
  /// version dword.
  pub fn version_string(&self) -> String {
    if self.is_reforged() {
      return REFORGED_BUILD_VERSIONS
        .iter()
        .find(|(build, _)| *build == self.build_number)
        .map(|(_, v)| v.to_string())
        .unwrap_or_else(|| format!("1.3x (build {})", self.build_number));
    }

    if self.version >= 10000 {
      let major = self.version / 10000;
      let minor = (self.version % 10000) / 100;
      let patch = self.version % 100;
      if patch > 0 {
        format!("{}.{}.{}", major, minor, patch)
      } else {
        format!("{}.{}", major, minor)
      }
    } else {
      format!("1.{}", self.version)
    }
  }
}
