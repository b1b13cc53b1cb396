//! Owner types for the game database.
//!
//! Characters and guilds both act as owners of buildings and placeables.
//! [`Owner`] wraps either kind behind an explicit discriminant.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::player::{ModelError, SteamId};

/// Identifier of a character or guild.
pub type OwnerId = i64;

/// Identifier of a positioned object (`actor_position.id`).
pub type ObjectId = i64;

/// Guild id the game assigns to abandoned structures.
pub const RUINS_CLAN_ID: OwnerId = 11;

/// Display name of the ruins owner.
pub const RUINS_NAME: &str = "Ruins";

/// Whether an owner name marks the server's ruins placeholder.
pub fn is_ruins_name(name: &str) -> bool {
    name == RUINS_NAME
}

/// Returns true if `last_login` lies before `reference - threshold`.
///
/// Owners that never logged in are always inactive.
pub fn login_is_inactive(
    last_login: Option<DateTime<Utc>>,
    threshold: Duration,
    reference: DateTime<Utc>,
) -> bool {
    match last_login {
        Some(login) => login < reference - threshold,
        None => true,
    }
}

// ── Rank ────────────────────────────────────────────────────────────────────

/// A character's rank inside its guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rank {
    Recruit,
    Member,
    Officer,
    Guildmaster,
}

impl Rank {
    /// Decode the integer `rank` column.
    ///
    /// Some saves carry values outside 0-3; those are treated as guildmasters.
    pub fn from_db(value: Option<i64>) -> Option<Self> {
        Some(match value? {
            0 => Self::Recruit,
            1 => Self::Member,
            2 => Self::Officer,
            _ => Self::Guildmaster,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recruit => "Recruit",
            Self::Member => "Member",
            Self::Officer => "Officer",
            Self::Guildmaster => "Guildmaster",
        }
    }
}

// ── Character ───────────────────────────────────────────────────────────────

/// Which of a player's character slots a character occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The 17-digit id without suffix.
    Active,
    /// The id followed by one slot character.
    Alternate(char),
}

/// A row of the `characters` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub id: OwnerId,
    /// Raw `playerId`: a SteamID64, optionally followed by a slot digit.
    pub player_id: String,
    pub name: String,
    pub guild_id: Option<OwnerId>,
    pub rank: Option<i64>,
    pub level: i64,
    pub last_login: Option<DateTime<Utc>>,
}

impl Character {
    pub fn has_guild(&self) -> bool {
        self.guild_id.is_some()
    }

    pub fn rank_name(&self) -> Option<Rank> {
        Rank::from_db(self.rank)
    }

    pub fn slot(&self) -> Slot {
        match self.player_id.chars().nth(17) {
            Some(c) => Slot::Alternate(c),
            None => Slot::Active,
        }
    }

    /// The owning player's SteamID64 with any slot suffix removed.
    pub fn steam_id(&self) -> Result<SteamId, ModelError> {
        let base = match self.player_id.get(..17) {
            Some(prefix) if self.player_id.len() == 18 => prefix,
            _ => self.player_id.as_str(),
        };
        SteamId::parse(base)
    }

    pub fn is_inactive(&self, threshold: Duration, reference: DateTime<Utc>) -> bool {
        login_is_inactive(self.last_login, threshold, reference)
    }
}

/// An ordered list of characters with login helpers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharList(Vec<Character>);

impl CharList {
    pub fn new(chars: Vec<Character>) -> Self {
        Self(chars)
    }

    /// The character with the most recent login, if anyone ever logged in.
    pub fn last_to_login(&self) -> Option<&Character> {
        self.0
            .iter()
            .filter(|c| c.last_login.is_some())
            .max_by_key(|c| c.last_login)
    }

    pub fn active(&self, threshold: Duration, reference: DateTime<Utc>) -> CharList {
        self.0
            .iter()
            .filter(|c| !c.is_inactive(threshold, reference))
            .cloned()
            .collect()
    }

    pub fn inactive(&self, threshold: Duration, reference: DateTime<Utc>) -> CharList {
        self.0
            .iter()
            .filter(|c| c.is_inactive(threshold, reference))
            .cloned()
            .collect()
    }

}

impl std::ops::Deref for CharList {
    type Target = [Character];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Character> for CharList {
    fn from_iter<I: IntoIterator<Item = Character>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ── Guild ───────────────────────────────────────────────────────────────────

/// A row of the `guilds` table together with its member characters.
#[derive(Debug, Clone, PartialEq)]
pub struct Guild {
    pub id: OwnerId,
    pub name: String,
    /// Character id of the guild's owner.
    pub owner_id: Option<OwnerId>,
    pub message_of_the_day: String,
    pub members: CharList,
}

impl Guild {
    /// Most recent login of any member.
    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        self.members.last_to_login().and_then(|c| c.last_login)
    }

    pub fn active_members(&self, threshold: Duration, reference: DateTime<Utc>) -> CharList {
        self.members.active(threshold, reference)
    }

    pub fn inactive_members(&self, threshold: Duration, reference: DateTime<Utc>) -> CharList {
        self.members.inactive(threshold, reference)
    }

    pub fn is_inactive(&self, threshold: Duration, reference: DateTime<Utc>) -> bool {
        login_is_inactive(self.last_login(), threshold, reference)
    }
}

// ── Owner ───────────────────────────────────────────────────────────────────

/// Discriminant for [`Owner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Character,
    Guild,
}

/// Anything that can own buildings: a character or a guild.
#[derive(Debug, Clone, PartialEq)]
pub enum Owner {
    Character(Character),
    Guild(Guild),
}

impl Owner {
    pub fn id(&self) -> OwnerId {
        match self {
            Self::Character(c) => c.id,
            Self::Guild(g) => g.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Character(c) => &c.name,
            Self::Guild(g) => &g.name,
        }
    }

    pub fn kind(&self) -> OwnerKind {
        match self {
            Self::Character(_) => OwnerKind::Character,
            Self::Guild(_) => OwnerKind::Guild,
        }
    }

    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Character(c) => c.last_login,
            Self::Guild(g) => g.last_login(),
        }
    }

    pub fn is_inactive(&self, threshold: Duration, reference: DateTime<Utc>) -> bool {
        login_is_inactive(self.last_login(), threshold, reference)
    }

    pub fn is_ruins(&self) -> bool {
        is_ruins_name(self.name())
    }
}
