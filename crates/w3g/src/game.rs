//! Game settings, recovered from the encoded string in the replay
//! prologue. The decoded blob holds 13 option bytes, then the map path and
//! the creator name as null terminated strings.

/// Lobby options.
///
/// Byte layout of the decoded blob:
///   byte 0 bits 0-1   game speed
///   byte 1 bits 0-3   visibility, bits 4-5 observer mode, bit 6 teams together
///   byte 2 bits 1-2   locked teams
///   byte 3 bit 0      full shared control, bit 1 random hero,
///          bit 2      random races, bit 6 referees
///   bytes 9-12        map checksum
#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
  pub speed: u8,
  pub visibility: u8,
  pub observers: u8,
  pub teams_together: bool,
  pub lock_teams: bool,
  pub full_shared_control: bool,
  pub random_hero: bool,
  pub random_races: bool,
  pub referees: bool,
  pub map_checksum: [u8; 4],
}

impl Default for GameSettings {
  fn default() -> Self {
    GameSettings {
      speed: 2,
      visibility: 0,
      observers: 0,
      teams_together: false,
      lock_teams: false,
      full_shared_control: false,
      random_hero: false,
      random_races: false,
      referees: false,
      map_checksum: [0; 4],
    }
  }
}

impl GameSettings {
  pub fn speed_name(&self) -> &'static str {
    match self.speed {
      0 => "Slow",
      1 => "Normal",
      2 => "Fast",
      _ => "Unknown",
    }
  }
}

/// Result of walking a decoded settings blob.
#[derive(Debug, Default)]
pub struct SettingsBlob {
  pub settings: GameSettings,
  pub map_path: String,
  pub map_name: String,
}

impl SettingsBlob {
  /// Extracts options and map info from the decoded (un-stuffed) blob.
  /// A blob shorter than the 13 option bytes yields defaults.
  pub fn extract(blob: &[u8]) -> Self {
    let mut out = SettingsBlob::default();
    if blob.len() < 13 {
      return out;
    }

    out.settings.speed = blob[0] & 0x03;
    out.settings.visibility = blob[1] & 0x0F;
    out.settings.observers = (blob[1] >> 4) & 0x03;
    out.settings.teams_together = blob[1] & 0x40 != 0;
    out.settings.lock_teams = blob[2] & 0x06 != 0;
    out.settings.full_shared_control = blob[3] & 0x01 != 0;
    out.settings.random_hero = blob[3] & 0x02 != 0;
    out.settings.random_races = blob[3] & 0x04 != 0;
    out.settings.referees = blob[3] & 0x40 != 0;
    out.settings.map_checksum.copy_from_slice(&blob[9..13]);

    let mut pos = 13;
    if blob.get(pos) == Some(&0) {
      pos += 1;
    }

    let path_end = blob[pos..]
      .iter()
      .position(|&b| b == 0)
      .map(|i| pos + i)
      .unwrap_or(blob.len());
    if path_end > pos {
      out.map_path = String::from_utf8_lossy(&blob[pos..path_end]).into_owned();
      out.map_name = map_name_of(&out.map_path);
    }
    // The creator name follows the map path; nothing downstream uses it.

    out
  }
}

/// Final path component with the `.w3m`/`.w3x` suffix removed.
fn map_name_of(map_path: &str) -> String {
  let name = map_path
    .rsplit(|c| c == '/' || c == '\\')
    .next()
    .unwrap_or(map_path);

  let lower = name.to_ascii_lowercase();
  if lower.ends_with(".w3x") || lower.ends_with(".w3m") {
    name[..name.len() - 4].to_string()
  } else {
    name.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn blob_with_path(path: &[u8]) -> Vec<u8> {
    let mut blob = vec![0_u8; 13];
    blob[0] = 0x02; // fast
    blob[1] = 0x48; // visibility 8, teams together
    blob[2] = 0x06; // locked teams
    blob[3] = 0x42; // random hero + referees
    blob[9..13].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    blob.push(0);
    blob.extend_from_slice(path);
    blob.push(0);
    blob.extend_from_slice(b"creator");
    blob.push(0);
    blob
  }

  #[test]
  fn test_extract() {
    let blob = blob_with_path(b"Maps\\FrozenThrone\\(4)TwistedMeadows.w3x");
    let out = SettingsBlob::extract(&blob);
    assert_eq!(out.settings.speed, 2);
    assert_eq!(out.settings.speed_name(), "Fast");
    assert_eq!(out.settings.visibility, 8);
    assert!(out.settings.teams_together);
    assert!(out.settings.lock_teams);
    assert!(out.settings.random_hero);
    assert!(out.settings.referees);
    assert!(!out.settings.random_races);
    assert!(!out.settings.full_shared_control);
    assert_eq!(out.settings.map_checksum, [0xDE, 0xAD, 0xBE, 0xEF]);
    assert_eq!(out.map_path, "Maps\\FrozenThrone\\(4)TwistedMeadows.w3x");
    assert_eq!(out.map_name, "(4)TwistedMeadows");
  }

  #[test]
  fn test_map_name_forward_slash_and_case() {
    assert_eq!(map_name_of("maps/test/Legion.W3X"), "Legion");
    assert_eq!(map_name_of("Legion"), "Legion");
    assert_eq!(map_name_of("maps/frozen.w3m"), "frozen");
  }

  #[test]
  fn test_short_blob_defaults() {
    let out = SettingsBlob::extract(&[1, 2, 3]);
    assert_eq!(out.settings, GameSettings::default());
    assert_eq!(out.map_path, "");
    assert_eq!(out.map_name, "");
  }
}
