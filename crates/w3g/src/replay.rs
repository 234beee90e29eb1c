//! The replay assembler: walks the decompressed payload once and composes
//! the final immutable [`Replay`] value.
//!
//! Payload layout (section 4 of the w3g format notes): four unknown bytes,
//! the host player record, the game name, the encoded settings string, a
//! count/type/language triple, additional player records, the game start
//! record with its slot table, then the event stream of time slots, chat,
//! leave and checksum blocks.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use w3g_util::binary::*;
use w3g_util::stat_string;

use crate::action::{decode_command_data, Action};
use crate::block::decompress_payload;
use crate::chat::ChatMessage;
use crate::constants::BlockTypeId;
use crate::error::{Error, Result};
use crate::game::{GameSettings, SettingsBlob};
use crate::header::Header;
use crate::player::{LeaveResult, Player, PlayerRecord};
use crate::slot::{apply_slots, GameStartRecord};

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
  /// Surface unknown opcodes and truncation instead of recovering locally.
  pub strict: bool,
}

#[derive(Debug)]
pub struct Replay {
  pub header: Header,
  pub game_name: String,
  pub map_name: String,
  pub map_path: String,
  pub host_name: String,
  pub settings: GameSettings,
  pub players: Vec<Player>,
  pub chat_messages: Vec<ChatMessage>,
  pub actions: Vec<Action>,
}

impl Replay {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Replay> {
    Self::open_with(path, ParseOptions::default())
  }

  pub fn open_with<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Replay> {
    let bytes = std::fs::read(path)?;
    Self::parse_with(bytes, options)
  }

  pub fn parse<T: Into<Bytes>>(bytes: T) -> Result<Replay> {
    Self::parse_with(bytes, ParseOptions::default())
  }

  pub fn parse_with<T: Into<Bytes>>(bytes: T, options: ParseOptions) -> Result<Replay> {
    let bytes = bytes.into();
    let mut buf = bytes.clone();
    let header = Header::decode(&mut buf)?;

    let blocks_start = (header.size_header as usize).min(bytes.len());
    let payload = decompress_payload(bytes.slice(blocks_start..), &header, !options.strict)?;

    GameData::new(header, payload, options).run()
  }

  /// Reads just the header, without touching the compressed payload.
  pub fn parse_header<P: AsRef<Path>>(path: P) -> Result<Header> {
    let mut bytes = Vec::with_capacity(Header::MAX_SIZE);
    File::open(path)?
      .take(Header::MAX_SIZE as u64)
      .read_to_end(&mut bytes)?;
    Header::decode(&mut bytes.as_slice())
  }

  pub fn player(&self, id: u8) -> Option<&Player> {
    self.players.iter().find(|p| p.id == id)
  }

  pub fn player_by_name(&self, name: &str) -> Option<&Player> {
    self
      .players
      .iter()
      .find(|p| p.name.eq_ignore_ascii_case(name))
  }

  /// First player recorded as having won, if any.
  pub fn winner(&self) -> Option<&Player> {
    self
      .players
      .iter()
      .find(|p| p.leave_result == Some(LeaveResult::Won))
  }

  /// Resolves a chat or action sender against the player list.
  pub fn player_name(&self, id: u8) -> String {
    match self.player(id) {
      Some(p) => p.name.clone(),
      None => format!("Player {}", id),
    }
  }
}

/// Single pass over the decompressed payload.
struct GameData {
  header: Header,
  payload: Bytes,
  buf: Bytes,
  strict: bool,
  game_name: String,
  host_name: String,
  blob: SettingsBlob,
  players: Vec<Player>,
  chat_messages: Vec<ChatMessage>,
  actions: Vec<Action>,
  clock_ms: u32,
}

impl GameData {
  fn new(header: Header, payload: Bytes, options: ParseOptions) -> Self {
    GameData {
      header,
      buf: payload.clone(),
      payload,
      strict: options.strict,
      game_name: String::new(),
      host_name: String::new(),
      blob: SettingsBlob::default(),
      players: vec![],
      chat_messages: vec![],
      actions: vec![],
      clock_ms: 0,
    }
  }

  /// Offset of the cursor within the decompressed payload.
  fn offset(&self) -> usize {
    self.payload.len() - self.buf.remaining()
  }

  fn run(mut self) -> Result<Replay> {
    match self.prologue() {
      Ok(()) => {}
      Err(e) if e.is_incomplete() && !self.strict => {
        tracing::debug!(offset = self.offset(), "prologue ends early: {}", e);
      }
      Err(e) if e.is_incomplete() => {
        return Err(Error::Truncated {
          offset: self.offset(),
        });
      }
      Err(e) => return Err(e.into()),
    }

    self.events()?;
    self.finish()
  }

  fn prologue(&mut self) -> Result<(), BinDecodeError> {
    self.buf.check_size(4)?;
    self.buf.advance(4);

    if let Some(host) = PlayerRecord::decode(&mut self.buf, true).context("host record")? {
      self.host_name = host.name.clone();
      self.players.push(Player::from_record(host));
    }

    let (game_name, _) = self.buf.get_delimited_bytes(0_u8)?;
    self.game_name = String::from_utf8_lossy(&game_name).into_owned();
    if self.buf.peek_u8() == Some(0) {
      self.buf.advance(1);
    }

    let (blob, consumed) = stat_string::decode(self.buf.chunk());
    self.buf.advance(consumed);
    self.blob = SettingsBlob::extract(&blob);

    // Player count, game type and language id; none are needed.
    self.buf.check_size(12)?;
    self.buf.advance(12);

    while let Some(record) = PlayerRecord::decode(&mut self.buf, false).context("player record")? {
      self.players.push(Player::from_record(record));
    }

    self.seek_game_start();
    if self.buf.peek_u8() == Some(BlockTypeId::GameStart.value()) {
      let record =
        GameStartRecord::decode(&mut self.buf, self.header.version).context("game start record")?;
      apply_slots(&mut self.players, &record.slots, self.header.version);
    }

    Ok(())
  }

  /// Reforged replays interleave extra metadata between the player records
  /// and the game start record; scan forward to the first offset that
  /// passes the validity probe.
  fn seek_game_start(&mut self) {
    let found = {
      let data = self.buf.chunk();
      if data.is_empty() || GameStartRecord::probe(data, 0) {
        return;
      }
      (0..data.len().saturating_sub(4))
        .find(|&i| data[i] == BlockTypeId::GameStart.value() && GameStartRecord::probe(data, i))
    };
    if let Some(skip) = found {
      self.buf.advance(skip);
    }
  }

  fn events(&mut self) -> Result<()> {
    loop {
      let id = match self.buf.peek_u8() {
        Some(id) => id,
        None => break,
      };
      let block_offset = self.offset();
      self.buf.advance(1);

      match BlockTypeId::from_u8(id) {
        BlockTypeId::LeaveGame => {
          if !self.ensure(13)? {
            break;
          }
          let _reason = self.buf.get_u32_le();
          let player_id = self.buf.get_u8();
          let result = self.buf.get_u32_le();
          self.buf.advance(4);

          let clock_ms = self.clock_ms;
          if let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) {
            player.leave_result = Some(LeaveResult::from_u32(result));
            player.leave_time_ms = Some(clock_ms);
          }
        }

        BlockTypeId::FirstStart | BlockTypeId::SecondStart | BlockTypeId::ThirdStart => {
          if !self.ensure(4)? {
            break;
          }
          self.buf.advance(4);
        }

        BlockTypeId::TimeSlot | BlockTypeId::TimeSlotOld => {
          if !self.ensure(4)? {
            break;
          }
          let num_bytes = self.buf.get_u16_le();
          let increment = self.buf.get_u16_le();
          self.clock_ms += increment as u32;

          if num_bytes > 2 {
            let cmd_len = (num_bytes - 2) as usize;
            let truncated = self.buf.remaining() < cmd_len;
            if truncated && self.strict {
              return Err(Error::Truncated {
                offset: self.payload.len(),
              });
            }
            let take = cmd_len.min(self.buf.remaining());
            let frame_offset = self.offset();
            let mut frame = self.buf.copy_to_bytes(take);
            let decoded =
              decode_command_data(&mut frame, self.header.version, self.strict, frame_offset)?;
            for mut action in decoded {
              action.timestamp_ms = self.clock_ms;
              if action.kind.counts_for_apm() {
                if let Some(player) = self.players.iter_mut().find(|p| p.id == action.player_id) {
                  player.action_count += 1;
                }
              }
              self.actions.push(action);
            }
            if truncated {
              break;
            }
          }
        }

        BlockTypeId::ChatMessage => match ChatMessage::decode(&mut self.buf) {
          Ok(mut msg) => {
            msg.timestamp_ms = self.clock_ms;
            msg.player_name = self.resolve_name(msg.player_id);
            self.chat_messages.push(msg);
          }
          Err(e) if e.is_incomplete() && !self.strict => break,
          Err(e) if e.is_incomplete() => {
            return Err(Error::Truncated {
              offset: self.payload.len(),
            });
          }
          Err(e) => return Err(e.into()),
        },

        BlockTypeId::Checksum | BlockTypeId::Unknown23 => {
          if !self.ensure(1)? {
            break;
          }
          let length = self.buf.get_u8() as usize;
          if !self.ensure(length)? {
            break;
          }
          self.buf.advance(length);
        }

        BlockTypeId::ForcedEnd => {
          if !self.ensure(8)? {
            break;
          }
          self.buf.advance(8);
        }

        // A second 0x19 in the event stream is as undocumented as any
        // unmapped id.
        BlockTypeId::GameStart | BlockTypeId::UnknownValue(_) => {
          if self.strict {
            return Err(Error::UnknownBlock {
              id,
              offset: block_offset,
            });
          }
          tracing::debug!(id, offset = block_offset, "skipping unknown event block");
        }
      }
    }

    Ok(())
  }

  /// Length guard for a declared-size structure. Strict mode turns a short
  /// read into [`Error::Truncated`]; otherwise the walk just ends.
  fn ensure(&mut self, size: usize) -> Result<bool> {
    if self.buf.remaining() >= size {
      return Ok(true);
    }
    if self.strict {
      return Err(Error::Truncated {
        offset: self.payload.len(),
      });
    }
    let remaining = self.buf.remaining();
    self.buf.advance(remaining);
    Ok(false)
  }

  fn resolve_name(&self, id: u8) -> String {
    self
      .players
      .iter()
      .find(|p| p.id == id)
      .map(|p| p.name.clone())
      .unwrap_or_else(|| format!("Player {}", id))
  }

  fn finish(mut self) -> Result<Replay> {
    let minutes = self.header.duration_ms as f64 / 60_000.0;
    for player in self.players.iter_mut() {
      if minutes > 0.0 {
        player.apm = player.action_count as f64 / minutes;
      }
    }

    Ok(Replay {
      header: self.header,
      game_name: self.game_name,
      map_name: std::mem::take(&mut self.blob.map_name),
      map_path: std::mem::take(&mut self.blob.map_path),
      host_name: self.host_name,
      settings: std::mem::take(&mut self.blob).settings,
      players: self.players,
      chat_messages: self.chat_messages,
      actions: self.actions,
    })
  }
}
