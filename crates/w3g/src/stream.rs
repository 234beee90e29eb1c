//! Streaming view over a replay's actions.
//!
//! The parser itself stays eager and sequential; this runs it to
//! completion on a blocking worker and publishes the actions one by one
//! over a bounded channel. Dropping the [`ActionStream`] cancels the
//! worker at its next publish.

use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};

use crate::action::Action;
use crate::error::Error;
use crate::replay::{ParseOptions, Replay};

#[derive(Debug)]
pub struct ActionStream {
  rx: mpsc::Receiver<Action>,
  err_rx: oneshot::Receiver<Error>,
}

impl ActionStream {
  /// Next action, or `None` once the worker is done publishing.
  pub async fn recv(&mut self) -> Option<Action> {
    self.rx.recv().await
  }

  /// Terminal status. `Err` carries the parse failure when the worker
  /// never got to publish; call after [`recv`](Self::recv) returns `None`.
  pub async fn finish(self) -> Result<(), Error> {
    drop(self.rx);
    match self.err_rx.await {
      Ok(err) => Err(err),
      // Worker dropped the sender without reporting: clean completion.
      Err(_) => Ok(()),
    }
  }
}

/// Parses `path` on a `spawn_blocking` worker and streams the decoded
/// actions. Must be called within a tokio runtime.
pub fn stream_actions<P: Into<PathBuf>>(
  path: P,
  capacity: usize,
  options: ParseOptions,
) -> ActionStream {
  let path = path.into();
  let (tx, rx) = mpsc::channel(capacity.max(1));
  let (err_tx, err_rx) = oneshot::channel();

  tokio::task::spawn_blocking(move || match Replay::open_with(&path, options) {
    Ok(replay) => {
      for action in replay.actions {
        if tx.blocking_send(action).is_err() {
          // Receiver side hung up.
          return;
        }
      }
    }
    Err(e) => {
      let _ = err_tx.send(e);
    }
  });

  ActionStream { rx, err_rx }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_missing_file_surfaces_error() {
    let mut stream = stream_actions("/definitely/not/a/replay.w3g", 8, ParseOptions::default());
    assert!(stream.recv().await.is_none());
    match stream.finish().await {
      Err(Error::Io(_)) => {}
      other => panic!("expected io error, got {:?}", other),
    }
  }
}
