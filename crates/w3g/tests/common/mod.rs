//! Fabricates minimal but well formed replay files for the end to end
//! tests, mirroring the on-disk layout the parser expects: header,
//! compressed block run, and a prologue + event stream payload.
#![allow(dead_code)]

use bytes::{BufMut, BytesMut};
use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::Compression;
use std::io::Write;

use w3g_util::stat_string;

pub const SIGNATURE: &[u8; 28] = b"Warcraft III recorded game\x1A\0";

/// Decompressed payload under construction.
#[derive(Default)]
pub struct PayloadBuilder {
  buf: BytesMut,
}

#[allow(dead_code)]
impl PayloadBuilder {
  pub fn new() -> Self {
    let mut buf = BytesMut::new();
    buf.put_u32_le(0x0110); // leading unknown dword
    PayloadBuilder { buf }
  }

  pub fn host_player(mut self, id: u8, name: &str) -> Self {
    self.buf.put_u8(0x00);
    self.buf.put_u8(id);
    self.buf.put_slice(name.as_bytes());
    self.buf.put_u8(0);
    self.buf.put_u8(0x01); // custom game tag
    self.buf.put_u8(0x00);
    self
  }

  pub fn additional_player(mut self, id: u8, name: &str) -> Self {
    self.buf.put_u8(0x16);
    self.buf.put_u8(id);
    self.buf.put_slice(name.as_bytes());
    self.buf.put_u8(0);
    self.buf.put_u8(0x01);
    self.buf.put_u8(0x00);
    self
  }

  /// Game name, separator and the stat-string encoded settings with the
  /// count/type/language triple that follows it.
  pub fn lobby(mut self, game_name: &str, speed: u8, map_path: &str) -> Self {
    self.buf.put_slice(game_name.as_bytes());
    self.buf.put_u8(0);
    self.buf.put_u8(0); // separator

    let mut blob = vec![0_u8; 13];
    blob[0] = speed & 0x03;
    blob.push(0);
    blob.extend_from_slice(map_path.as_bytes());
    blob.push(0);
    blob.extend_from_slice(b"creator");
    blob.push(0);
    self.buf.put_slice(&stat_string::encode(&blob));
    self.buf.put_u8(0); // stat string terminator

    self.buf.put_slice(&[0_u8; 12]); // player count, game type, language id
    self
  }

  /// Game start record with 9-byte slot rows:
  /// `(player_id, team, color, is_computer)`.
  pub fn game_start(mut self, slots: &[(u8, u8, u8, bool)]) -> Self {
    let mut body = BytesMut::new();
    body.put_u8(slots.len() as u8);
    for &(id, team, color, computer) in slots {
      body.put_u8(id);
      body.put_u8(100); // download percent
      body.put_u8(0x02); // used
      body.put_u8(if computer { 1 } else { 0 });
      body.put_u8(team);
      body.put_u8(color);
      body.put_u8(0x01); // human
      body.put_u8(1); // ai strength
      body.put_u8(100); // handicap
    }
    body.put_u32_le(0x42);
    body.put_u8(1); // select mode
    body.put_u8(slots.len() as u8); // start spots

    self.buf.put_u8(0x19);
    self.buf.put_u16_le(body.len() as u16);
    self.buf.put_slice(&body);
    self
  }

  /// Time slot advancing the clock, carrying zero or more
  /// `(player_id, action bytes)` command frames.
  pub fn time_slot(mut self, increment_ms: u16, frames: &[(u8, &[u8])]) -> Self {
    let mut cmd = BytesMut::new();
    for &(player_id, actions) in frames {
      cmd.put_u8(player_id);
      cmd.put_u16_le(actions.len() as u16);
      cmd.put_slice(actions);
    }
    self.buf.put_u8(0x1F);
    self.buf.put_u16_le((cmd.len() + 2) as u16);
    self.buf.put_u16_le(increment_ms);
    self.buf.put_slice(&cmd);
    self
  }

  pub fn chat(mut self, sender: u8, mode: u32, body: &str) -> Self {
    self.buf.put_u8(0x20);
    self.buf.put_u8(sender);
    self.buf.put_u16_le((body.len() + 1) as u16);
    self.buf.put_u8(0x20); // scoped flag
    self.buf.put_u32_le(mode);
    self.buf.put_slice(body.as_bytes());
    self.buf.put_u8(0);
    self
  }

  pub fn leave(mut self, player_id: u8, result: u32) -> Self {
    self.buf.put_u8(0x17);
    self.buf.put_u32_le(0x01); // reason
    self.buf.put_u8(player_id);
    self.buf.put_u32_le(result);
    self.buf.put_u32_le(0);
    self
  }

  pub fn raw(mut self, bytes: &[u8]) -> Self {
    self.buf.put_slice(bytes);
    self
  }

  pub fn build(self) -> Vec<u8> {
    self.buf.to_vec()
  }
}

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

/// Header variant 0 file (Classic, <= 1.06). An empty payload produces a
/// zero-block file.
pub fn file_v0(version: u16, flags: u16, duration_ms: u32, payload: &[u8]) -> Vec<u8> {
  let blocks = classic_blocks(payload);

  let mut buf = BytesMut::new();
  buf.put_slice(SIGNATURE);
  buf.put_u32_le(0x40);
  buf.put_u32_le((0x40 + blocks.len()) as u32);
  buf.put_u32_le(0); // header version
  buf.put_u32_le(payload.len() as u32);
  buf.put_u32_le(if payload.is_empty() { 0 } else { 1 });
  buf.put_u16_le(0); // reserved
  buf.put_u16_le(version);
  buf.put_u16_le(4000); // build
  buf.put_u16_le(flags);
  buf.put_u32_le(duration_ms);
  buf.put_u32_le(0); // crc
  buf.put_slice(&blocks);
  buf.to_vec()
}

/// Header variant 1 file. Block framing follows the game id / version the
/// same way the parser does: `PX3W` or version >= 29 gets the Reforged
/// 12-byte framing with zlib payloads.
pub fn file_v1(
  game_id: &[u8; 4],
  version: u32,
  build: u16,
  duration_ms: u32,
  payload: &[u8],
) -> Vec<u8> {
  let reforged = version >= 29 || game_id == b"PX3W";
  let blocks = if reforged {
    reforged_blocks(payload)
  } else {
    classic_blocks(payload)
  };

  let mut buf = BytesMut::new();
  buf.put_slice(SIGNATURE);
  buf.put_u32_le(0x44);
  buf.put_u32_le((0x44 + blocks.len()) as u32);
  buf.put_u32_le(1);
  buf.put_u32_le(payload.len() as u32);
  buf.put_u32_le(if payload.is_empty() { 0 } else { 1 });
  buf.put_slice(game_id);
  buf.put_u32_le(version);
  buf.put_u16_le(build);
  buf.put_u16_le(0x8000);
  buf.put_u32_le(duration_ms);
  buf.put_u32_le(0);
  buf.put_slice(&blocks);
  buf.to_vec()
}

fn classic_blocks(payload: &[u8]) -> Vec<u8> {
  if payload.is_empty() {
    return vec![];
  }
  let compressed = deflate(payload);
  let mut buf = BytesMut::new();
  buf.put_u16_le(compressed.len() as u16);
  buf.put_u16_le(payload.len() as u16);
  buf.put_u32_le(0);
  buf.put_slice(&compressed);
  buf.to_vec()
}

fn reforged_blocks(payload: &[u8]) -> Vec<u8> {
  if payload.is_empty() {
    return vec![];
  }
  let compressed = zlib(payload);
  let mut buf = BytesMut::new();
  buf.put_u16_le(compressed.len() as u16);
  buf.put_u16_le(0);
  buf.put_u32_le(payload.len() as u32);
  buf.put_u32_le(0);
  buf.put_slice(&compressed);
  buf.to_vec()
}

/// The two-player TFT lobby most scenarios build on.
#[allow(dead_code)]
pub fn two_player_payload() -> PayloadBuilder {
  PayloadBuilder::new()
    .host_player(1, "alice")
    .lobby("friendly game", 2, "")
    .additional_player(2, "bob")
    .game_start(&[(1, 0, 0, false), (2, 1, 1, false)])
}
