mod common;

use common::*;
use w3g::{stream_actions, ActionTypeId, ParseOptions};

fn write_temp(name: &str, bytes: &[u8]) -> std::path::PathBuf {
  let dir = std::env::temp_dir().join("w3g-stream-test");
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join(name);
  std::fs::write(&path, bytes).unwrap();
  path
}

#[tokio::test]
async fn test_streams_all_actions_in_order() {
  let payload = two_player_payload()
    .time_slot(100, &[(1, &[0x01])])
    .time_slot(100, &[(2, &[0x02])])
    .time_slot(100, &[(1, &[0x01])])
    .build();
  let file = file_v1(b"W3XP", 26, 6059, 60_000, &payload);
  let path = write_temp("in_order.w3g", &file);

  let mut stream = stream_actions(&path, 2, ParseOptions::default());
  let mut actions = vec![];
  while let Some(action) = stream.recv().await {
    actions.push(action);
  }
  stream.finish().await.unwrap();

  assert_eq!(actions.len(), 3);
  assert_eq!(actions[0].kind, ActionTypeId::Pause);
  assert_eq!(actions[1].kind, ActionTypeId::Resume);
  assert_eq!(actions[0].timestamp_ms, 100);
  assert_eq!(actions[2].timestamp_ms, 300);
}

#[tokio::test]
async fn test_dropping_receiver_cancels_worker() {
  let mut builder = two_player_payload();
  for _ in 0..64 {
    builder = builder.time_slot(10, &[(1, &[0x01])]);
  }
  let file = file_v1(b"W3XP", 26, 6059, 60_000, &builder.build());
  let path = write_temp("cancel.w3g", &file);

  // Capacity 1 so the worker parks on its second publish; dropping the
  // stream must unblock it rather than leak the task.
  let mut stream = stream_actions(&path, 1, ParseOptions::default());
  let first = stream.recv().await;
  assert!(first.is_some());
  drop(stream);
}

#[tokio::test]
async fn test_parse_error_reaches_consumer() {
  let path = write_temp("broken.w3g", b"not a replay at all");
  let mut stream = stream_actions(&path, 4, ParseOptions::default());
  assert!(stream.recv().await.is_none());
  assert!(stream.finish().await.is_err());
}
