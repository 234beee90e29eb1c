//! Parser for Warcraft III replay (`.w3g`) files, Classic and Reforged.
//!
//! The format was never documented by Blizzard; this follows the layout
//! reverse engineered by the community (w3g.deepnode.de) plus the framing
//! changes Reforged introduced.
//!
//! ```no_run
//! let replay = w3g::Replay::open("LastReplay.w3g").unwrap();
//! println!("{} on {}", replay.game_name, replay.map_name);
//! for player in &replay.players {
//!   println!("  {} ({}) APM {:.1}", player.name, player.race.name(), player.apm);
//! }
//! ```

pub mod action;
pub mod block;
pub mod chat;
pub mod constants;
pub mod error;
pub mod game;
pub mod header;
mod json;
pub mod player;
pub mod replay;
pub mod slot;
pub mod stream;

pub use action::{decode_item_id, Action, ActionData, ActionValue};
pub use chat::ChatMessage;
pub use constants::{ActionTypeId, BlockTypeId};
pub use error::{Error, Result};
pub use game::GameSettings;
pub use header::Header;
pub use json::format_duration_ms;
pub use player::{LeaveResult, Player, Race};
pub use replay::{ParseOptions, Replay};
pub use slot::{GameStartRecord, SlotRecord, SlotStatus};
pub use stream::{stream_actions, ActionStream};
