use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::HashMap;

pub const SIGNATURE: [u8; 28] = *b"Warcraft III recorded game\x1A\0";

pub const BASE_HEADER_SIZE: usize = 0x30;
pub const SUB_HEADER_V0_SIZE: usize = 0x10;
pub const SUB_HEADER_V1_SIZE: usize = 0x14;

/// Game version at which the Reforged client (and its 12-byte block
/// framing, zlib payloads and 24-slot lobbies) appeared.
pub const REFORGED_VERSION: u32 = 29;

pub const OBSERVER_TEAM_CLASSIC: u8 = 12;
pub const OBSERVER_TEAM_REFORGED: u8 = 24;

/// Multiplayer bit of the sub-header flags word.
pub const FLAG_MULTIPLAYER: u16 = 0x8000;

/// Record ids of the player records in the replay prologue.
pub const RECORD_HOST: u8 = 0x00;
pub const RECORD_ADDITIONAL_PLAYER: u8 = 0x16;

macro_rules! byte_enum {
  (
    $(#[$meta:meta])*
    pub enum $name:ident {
      $($variant:ident = $value:literal),* $(,)?
    }
  ) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum $name {
      $($variant,)*
      UnknownValue(u8),
    }

    impl $name {
      pub fn from_u8(value: u8) -> Self {
        match value {
          $($value => $name::$variant,)*
          other => $name::UnknownValue(other),
        }
      }

      pub fn value(&self) -> u8 {
        match *self {
          $($name::$variant => $value,)*
          $name::UnknownValue(v) => v,
        }
      }
    }
  };
}

byte_enum! {
  /// One-byte ids of the event blocks that follow the game start record.
  pub enum BlockTypeId {
    LeaveGame = 0x17,
    GameStart = 0x19,
    FirstStart = 0x1A,
    SecondStart = 0x1B,
    ThirdStart = 0x1C,
    TimeSlotOld = 0x1E,
    TimeSlot = 0x1F,
    ChatMessage = 0x20,
    Checksum = 0x22,
    Unknown23 = 0x23,
    ForcedEnd = 0x2F,
  }
}

/// Per-command opcode inside a time slot's command frames. The cheat codes
/// 0x20..=0x32 only occur in single player replays and are folded into one
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTypeId {
  Pause,
  Resume,
  SetSpeed,
  IncSpeed,
  DecSpeed,
  SaveGame,
  SaveFinished,
  AbilityNoParams,
  AbilityTargetPos,
  AbilityPosObject,
  AbilityDropItem,
  AbilityTwoPos,
  ChangeSelection,
  AssignGroup,
  SelectGroup,
  SelectSubgroup,
  PreSubselection,
  SyncSelection,
  SelectGroundItem,
  CancelHeroRevival,
  RemoveFromQueue,
  AllyOptions,
  TransferResources,
  TriggerCommand,
  EscPressed,
  ScenarioTrigger,
  HeroSkillMenu,
  BuildingMenu,
  MinimapSignal,
  ContinueGameB,
  ContinueGameA,
  Unknown75,
  Cheat(u8),
  UnknownValue(u8),
}

impl ActionTypeId {
  pub fn from_u8(value: u8) -> Self {
    use ActionTypeId::*;
    match value {
      0x01 => Pause,
      0x02 => Resume,
      0x03 => SetSpeed,
      0x04 => IncSpeed,
      0x05 => DecSpeed,
      0x06 => SaveGame,
      0x07 => SaveFinished,
      0x10 => AbilityNoParams,
      0x11 => AbilityTargetPos,
      0x12 => AbilityPosObject,
      0x13 => AbilityDropItem,
      0x14 => AbilityTwoPos,
      0x16 => ChangeSelection,
      0x17 => AssignGroup,
      0x18 => SelectGroup,
      0x19 => SelectSubgroup,
      0x1A => PreSubselection,
      0x1B => SyncSelection,
      0x1C => SelectGroundItem,
      0x1D => CancelHeroRevival,
      0x1E => RemoveFromQueue,
      0x50 => AllyOptions,
      0x51 => TransferResources,
      0x60 => TriggerCommand,
      0x61 => EscPressed,
      0x62 => ScenarioTrigger,
      0x66 => HeroSkillMenu,
      0x67 => BuildingMenu,
      0x68 => MinimapSignal,
      0x69 => ContinueGameB,
      0x6A => ContinueGameA,
      0x75 => Unknown75,
      0x20..=0x32 => Cheat(value),
      other => UnknownValue(other),
    }
  }

  pub fn value(&self) -> u8 {
    use ActionTypeId::*;
    match *self {
      Pause => 0x01,
      Resume => 0x02,
      SetSpeed => 0x03,
      IncSpeed => 0x04,
      DecSpeed => 0x05,
      SaveGame => 0x06,
      SaveFinished => 0x07,
      AbilityNoParams => 0x10,
      AbilityTargetPos => 0x11,
      AbilityPosObject => 0x12,
      AbilityDropItem => 0x13,
      AbilityTwoPos => 0x14,
      ChangeSelection => 0x16,
      AssignGroup => 0x17,
      SelectGroup => 0x18,
      SelectSubgroup => 0x19,
      PreSubselection => 0x1A,
      SyncSelection => 0x1B,
      SelectGroundItem => 0x1C,
      CancelHeroRevival => 0x1D,
      RemoveFromQueue => 0x1E,
      AllyOptions => 0x50,
      TransferResources => 0x51,
      TriggerCommand => 0x60,
      EscPressed => 0x61,
      ScenarioTrigger => 0x62,
      HeroSkillMenu => 0x66,
      BuildingMenu => 0x67,
      MinimapSignal => 0x68,
      ContinueGameB => 0x69,
      ContinueGameA => 0x6A,
      Unknown75 => 0x75,
      Cheat(v) | UnknownValue(v) => v,
    }
  }

  pub fn name(&self) -> Cow<'static, str> {
    use ActionTypeId::*;
    Cow::Borrowed(match *self {
      Pause => "pause",
      Resume => "resume",
      SetSpeed => "set_speed",
      IncSpeed => "increase_speed",
      DecSpeed => "decrease_speed",
      SaveGame => "save_game",
      SaveFinished => "save_finished",
      AbilityNoParams => "ability",
      AbilityTargetPos => "ability_position",
      AbilityPosObject => "ability_object",
      AbilityDropItem => "drop_item",
      AbilityTwoPos => "ability_two_positions",
      ChangeSelection => "select_units",
      AssignGroup => "assign_group",
      SelectGroup => "select_group",
      SelectSubgroup => "select_subgroup",
      PreSubselection => "pre_subselection",
      SyncSelection => "sync_selection",
      SelectGroundItem => "select_item",
      CancelHeroRevival => "cancel_revival",
      RemoveFromQueue => "remove_from_queue",
      AllyOptions => "ally_options",
      TransferResources => "transfer_resources",
      TriggerCommand => "trigger_command",
      EscPressed => "escape",
      ScenarioTrigger => "scenario_trigger",
      HeroSkillMenu => "hero_skill_menu",
      BuildingMenu => "building_menu",
      MinimapSignal => "minimap_ping",
      ContinueGameB => "continue_game_b",
      ContinueGameA => "continue_game_a",
      Unknown75 => "unknown_75",
      Cheat(_) => "cheat",
      UnknownValue(v) => return Cow::Owned(format!("unknown_{:02x}", v)),
    })
  }

  /// Commands excluded from the APM count: selection bookkeeping the client
  /// emits on its own, not deliberate player input.
  pub fn counts_for_apm(&self) -> bool {
    use ActionTypeId::*;
    !matches!(*self, SyncSelection | SelectSubgroup | PreSubselection)
  }
}

/// Chat block flag values.
pub const CHAT_FLAG_STARTUP: u8 = 0x10;
pub const CHAT_FLAG_SCOPED: u8 = 0x20;

/// Reforged builds carry a meaningless version dword; the build number
/// identifies the patch.
pub(crate) static REFORGED_BUILD_VERSIONS: &[(u16, &str)] = &[
  (6105, "1.32.0"),
  (6106, "1.32.1"),
  (6108, "1.32.2"),
  (6110, "1.32.3"),
  (6111, "1.32.4"),
  (6112, "1.32.5"),
  (6113, "1.32.6"),
  (6114, "1.32.7"),
  (6115, "1.32.8"),
  (6116, "1.32.9"),
  (6117, "1.32.10"),
  (6118, "1.33.0"),
  (6119, "1.34.0"),
  (6120, "1.35.0"),
  (6121, "1.36.0"),
  (6122, "1.36.1"),
  (6123, "1.36.2"),
];

/// English names for the common ability command codes and the 1.31 roster
/// of unit/building/hero codes. Keyed by the decoded form: `ability_<n>`
/// for numeric ids, the reversed 4-character code otherwise. Coverage is
/// extended by adding rows here; the decoder never needs to change.
pub static ITEM_ID_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
  let mut m = HashMap::new();

  // Move/attack command ids
  m.insert("ability_3", "Right-click / Smart");
  m.insert("ability_6", "Move");
  m.insert("ability_7", "Attack");
  m.insert("ability_12", "Hold Position");
  m.insert("ability_13", "Patrol");
  m.insert("ability_19", "Stop");
  m.insert("ability_89", "Rally Point");

  // Human buildings
  m.insert("halt", "Altar of Kings");
  m.insert("hbar", "Barracks");
  m.insert("hbla", "Blacksmith");
  m.insert("hhou", "Farm");
  m.insert("hgra", "Gryphon Aviary");
  m.insert("hars", "Arcane Sanctum");
  m.insert("hlum", "Lumber Mill");
  m.insert("htow", "Town Hall");
  m.insert("hkee", "Keep");
  m.insert("hcas", "Castle");
  m.insert("harm", "Workshop");
  m.insert("hwtw", "Scout Tower");
  m.insert("hgtw", "Guard Tower");
  m.insert("hctw", "Cannon Tower");
  m.insert("hatw", "Arcane Tower");

  // Human units
  m.insert("hpea", "Peasant");
  m.insert("hfoo", "Footman");
  m.insert("hrif", "Rifleman");
  m.insert("hkni", "Knight");
  m.insert("hmpr", "Priest");
  m.insert("hsor", "Sorceress");
  m.insert("hspt", "Spell Breaker");
  m.insert("hmtm", "Mortar Team");
  m.insert("hgyr", "Flying Machine");
  m.insert("hgry", "Gryphon Rider");
  m.insert("hmtt", "Siege Engine");

  // Human heroes
  m.insert("Hamg", "Archmage");
  m.insert("Hblm", "Blood Mage");
  m.insert("Hmkg", "Mountain King");
  m.insert("Hpal", "Paladin");

  // Orc buildings
  m.insert("oalt", "Altar of Storms");
  m.insert("obar", "Barracks");
  m.insert("ofor", "War Mill");
  m.insert("ogre", "Great Hall");
  m.insert("ostr", "Stronghold");
  m.insert("ofrt", "Fortress");
  m.insert("obea", "Beastiary");
  m.insert("osld", "Spirit Lodge");
  m.insert("otrb", "Orc Burrow");
  m.insert("ovln", "Voodoo Lounge");
  m.insert("otau", "Tauren Totem");
  m.insert("owtw", "Watch Tower");

  // Orc units
  m.insert("opeo", "Peon");
  m.insert("ogru", "Grunt");
  m.insert("ohun", "Headhunter");
  m.insert("orai", "Raider");
  m.insert("okod", "Kodo Beast");
  m.insert("oshm", "Shaman");
  m.insert("odoc", "Witch Doctor");
  m.insert("ospw", "Spirit Walker");
  m.insert("owyv", "Wind Rider");
  m.insert("otbr", "Troll Batrider");

  // Orc heroes
  m.insert("Obla", "Blademaster");
  m.insert("Ofar", "Far Seer");
  m.insert("Otch", "Tauren Chieftain");
  m.insert("Oshd", "Shadow Hunter");

  // Night Elf buildings
  m.insert("eate", "Altar of Elders");
  m.insert("eaom", "Ancient of War");
  m.insert("eaow", "Ancient of Wonders");
  m.insert("eaoe", "Ancient of Lore");
  m.insert("edob", "Hunter's Hall");
  m.insert("etol", "Tree of Life");
  m.insert("etoa", "Tree of Ages");
  m.insert("etoe", "Tree of Eternity");
  m.insert("emow", "Moon Well");
  m.insert("eden", "Ancient of Wind");
  m.insert("edos", "Chimaera Roost");

  // Night Elf units
  m.insert("ewsp", "Wisp");
  m.insert("earc", "Archer");
  m.insert("esen", "Huntress");
  m.insert("ebal", "Glaive Thrower");
  m.insert("edry", "Dryad");
  m.insert("edot", "Druid of the Talon");
  m.insert("edoc", "Druid of the Claw");
  m.insert("emtg", "Mountain Giant");
  m.insert("efdr", "Faerie Dragon");
  m.insert("ehip", "Hippogryph");
  m.insert("echm", "Chimaera");

  // Night Elf heroes
  m.insert("Edem", "Demon Hunter");
  m.insert("Ekee", "Keeper of the Grove");
  m.insert("Emoo", "Priestess of the Moon");
  m.insert("Ewar", "Warden");

  // Undead buildings
  m.insert("uaod", "Altar of Darkness");
  m.insert("unpl", "Necropolis");
  m.insert("unp1", "Halls of the Dead");
  m.insert("unp2", "Black Citadel");
  m.insert("usep", "Crypt");
  m.insert("ugrv", "Graveyard");
  m.insert("uzig", "Ziggurat");
  m.insert("uzg1", "Spirit Tower");
  m.insert("uzg2", "Nerubian Tower");
  m.insert("uslh", "Slaughterhouse");
  m.insert("utod", "Temple of the Damned");
  m.insert("usap", "Sacrificial Pit");
  m.insert("ubon", "Boneyard");
  m.insert("utom", "Tomb of Relics");

  // Undead units
  m.insert("uaco", "Acolyte");
  m.insert("ugho", "Ghoul");
  m.insert("ucry", "Crypt Fiend");
  m.insert("ugar", "Gargoyle");
  m.insert("uabo", "Abomination");
  m.insert("umtw", "Meat Wagon");
  m.insert("unec", "Necromancer");
  m.insert("uban", "Banshee");
  m.insert("uobs", "Obsidian Statue");
  m.insert("ubsp", "Destroyer");
  m.insert("ufro", "Frost Wyrm");
  m.insert("ushd", "Shade");

  // Undead heroes
  m.insert("Udea", "Death Knight");
  m.insert("Udre", "Dread Lord");
  m.insert("Ulic", "Lich");
  m.insert("Ucrl", "Crypt Lord");

  m
});

#[test]
fn test_block_type_round_trip() {
  for id in [0x17_u8, 0x19, 0x1A, 0x1B, 0x1C, 0x1E, 0x1F, 0x20, 0x22, 0x23, 0x2F] {
    assert_eq!(BlockTypeId::from_u8(id).value(), id);
  }
  assert_eq!(BlockTypeId::from_u8(0xAB), BlockTypeId::UnknownValue(0xAB));
}

#[test]
fn test_action_type_cheat_range() {
  for id in 0x20_u8..=0x32 {
    assert_eq!(ActionTypeId::from_u8(id), ActionTypeId::Cheat(id));
    assert_eq!(ActionTypeId::from_u8(id).name(), "cheat");
  }
  assert_eq!(ActionTypeId::from_u8(0x33), ActionTypeId::UnknownValue(0x33));
  assert_eq!(ActionTypeId::from_u8(0x33).name(), "unknown_33");
}
