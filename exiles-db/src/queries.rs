//! Read queries against the game database.
//!
//! These are the bulk reads the aggregation engine consumes: root buildings,
//! positioned objects, owners and login times.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use exiles_model::*;
use rusqlite::{Connection, params};

use crate::operations::OperationError;

// ── Tile Rows ───────────────────────────────────────────────────────────────

/// A root building object with the number of pieces in its instance index.
#[derive(Debug, Clone, PartialEq)]
pub struct RootBuildingRow {
    pub object_id: ObjectId,
    pub owner_id: OwnerId,
    pub piece_count: i64,
}

/// A building row that has a position record.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedObjectRow {
    pub object_id: ObjectId,
    pub owner_id: OwnerId,
}

/// A positioned object with coordinates and class, used for consolidation.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedObjectRow {
    pub object_id: ObjectId,
    pub owner_id: OwnerId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub class: String,
    /// Piece count for root buildings, `None` for plain positioned objects.
    pub piece_count: Option<i64>,
}

/// Root building objects grouped by object id, optionally for one owner.
pub fn root_buildings(
    conn: &Connection,
    owner_id: Option<OwnerId>,
) -> Result<Vec<RootBuildingRow>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT b.object_id, b.owner_id, COUNT(bi.object_id)
         FROM buildings b
         JOIN building_instances bi ON bi.object_id = b.object_id
         WHERE (?1 IS NULL OR b.owner_id = ?1)
         GROUP BY b.object_id
         ORDER BY b.object_id",
    )?;
    let rows = stmt.query_map(params![owner_id], |row| {
        Ok(RootBuildingRow {
            object_id: row.get(0)?,
            owner_id: row.get(1)?,
            piece_count: row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Every building row with a position record, optionally for one owner.
///
/// Includes root buildings; callers separate placeables themselves.
pub fn positioned_buildings(
    conn: &Connection,
    owner_id: Option<OwnerId>,
) -> Result<Vec<OwnedObjectRow>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT b.object_id, b.owner_id
         FROM buildings b
         JOIN actor_position ap ON ap.id = b.object_id
         WHERE (?1 IS NULL OR b.owner_id = ?1)
         ORDER BY b.object_id",
    )?;
    let rows = stmt.query_map(params![owner_id], |row| {
        Ok(OwnedObjectRow {
            object_id: row.get(0)?,
            owner_id: row.get(1)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Root buildings with their position, class and piece count.
pub fn root_building_positions(
    conn: &Connection,
) -> Result<Vec<PositionedObjectRow>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT b.object_id, b.owner_id, ap.x, ap.y, ap.z, ap.class, COUNT(bi.object_id)
         FROM buildings b
         JOIN building_instances bi ON bi.object_id = b.object_id
         JOIN actor_position ap ON ap.id = b.object_id
         GROUP BY b.object_id
         ORDER BY b.object_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(PositionedObjectRow {
            object_id: row.get(0)?,
            owner_id: row.get(1)?,
            x: row.get(2)?,
            y: row.get(3)?,
            z: row.get(4)?,
            class: row.get(5)?,
            piece_count: Some(row.get(6)?),
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Every positioned building row with coordinates and class.
pub fn positioned_building_details(
    conn: &Connection,
) -> Result<Vec<PositionedObjectRow>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT b.object_id, b.owner_id, ap.x, ap.y, ap.z, ap.class
         FROM buildings b
         JOIN actor_position ap ON ap.id = b.object_id
         ORDER BY b.object_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(PositionedObjectRow {
            object_id: row.get(0)?,
            owner_id: row.get(1)?,
            x: row.get(2)?,
            y: row.get(3)?,
            z: row.get(4)?,
            class: row.get(5)?,
            piece_count: None,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Number of object ids in the instance index without a `buildings` row.
pub fn orphan_instance_count(conn: &Connection) -> Result<i64, OperationError> {
    let count = conn.query_row(
        "SELECT COUNT(DISTINCT bi.object_id)
         FROM building_instances bi
         LEFT JOIN buildings b ON b.object_id = bi.object_id
         WHERE b.object_id IS NULL",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Owner ids holding at least one building row.
pub fn building_owner_ids(conn: &Connection) -> Result<BTreeSet<OwnerId>, OperationError> {
    let mut stmt = conn.prepare("SELECT DISTINCT owner_id FROM buildings")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect::<Result<BTreeSet<_>, _>>().map_err(Into::into)
}

/// Whether an owner holds at least one building row.
pub fn owner_has_buildings(conn: &Connection, owner_id: OwnerId) -> Result<bool, OperationError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM buildings WHERE owner_id = ?1)",
        params![owner_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Map of every building object to its owner.
pub fn building_owners(conn: &Connection) -> Result<HashMap<ObjectId, OwnerId>, OperationError> {
    let mut stmt = conn.prepare("SELECT object_id, owner_id FROM buildings")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect::<Result<HashMap<_, _>, _>>().map_err(Into::into)
}

/// Building objects whose owner is neither a character, a guild nor the game
/// itself (id 0), plus everything owned by the ruins clan.
pub fn unknown_owner_objects(
    conn: &Connection,
    ruins_clan_id: OwnerId,
) -> Result<Vec<ObjectId>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT object_id FROM buildings
         WHERE (owner_id NOT IN (SELECT id FROM characters)
                AND owner_id NOT IN (SELECT guildId FROM guilds)
                AND owner_id != 0)
            OR owner_id = ?1
         ORDER BY object_id",
    )?;
    let rows = stmt.query_map(params![ruins_clan_id], |row| row.get(0))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// ── Owner Lookups ───────────────────────────────────────────────────────────

/// How a name is matched against character and guild names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NameMatch {
    /// Whole-name match instead of substring.
    pub strict: bool,
    /// ASCII case folding.
    pub case_insensitive: bool,
}

impl NameMatch {
    fn clause(&self, column: &str) -> String {
        match (self.strict, self.case_insensitive) {
            (true, false) => format!("{column} = ?1"),
            (true, true) => format!("LOWER({column}) = LOWER(?1)"),
            (false, false) => format!("instr({column}, ?1) > 0"),
            (false, true) => format!("instr(LOWER({column}), LOWER(?1)) > 0"),
        }
    }
}

const CHARACTER_COLUMNS: &str = "id, playerId, char_name, guild, rank, level, lastTimeOnline";

/// Whether the id belongs to a character or a guild.
pub fn owner_exists(conn: &Connection, id: OwnerId) -> Result<bool, OperationError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM characters WHERE id = ?1)
             OR EXISTS(SELECT 1 FROM guilds WHERE guildId = ?1)",
        params![id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Find a character by id.
pub fn find_character(conn: &Connection, id: OwnerId) -> Result<Option<Character>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CHARACTER_COLUMNS} FROM characters WHERE id = ?1"
    ))?;
    let result = stmt.query_row(params![id], row_to_character);
    match result {
        Ok(c) => Ok(Some(c)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Characters whose name matches.
pub fn find_characters_by_name(
    conn: &Connection,
    name: &str,
    matching: NameMatch,
) -> Result<Vec<Character>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CHARACTER_COLUMNS} FROM characters WHERE {} ORDER BY id",
        matching.clause("char_name")
    ))?;
    let rows = stmt.query_map(params![name], row_to_character)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// All character slots of one player.
pub fn characters_for_player(
    conn: &Connection,
    steam_id: &SteamId,
) -> Result<Vec<Character>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CHARACTER_COLUMNS} FROM characters WHERE substr(playerId, 1, 17) = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![steam_id.as_str()], row_to_character)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Find a guild by id, including its members.
pub fn find_guild(conn: &Connection, id: OwnerId) -> Result<Option<Guild>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT guildId, name, owner, messageOfTheDay FROM guilds WHERE guildId = ?1",
    )?;
    let result = stmt.query_row(params![id], row_to_guild);
    let mut guild = match result {
        Ok(g) => g,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    guild.members = guild_members(conn, id)?;
    Ok(Some(guild))
}

/// List all guilds with their members, ordered by id.
pub fn list_guilds(conn: &Connection) -> Result<Vec<Guild>, OperationError> {
    let mut stmt =
        conn.prepare("SELECT guildId, name, owner, messageOfTheDay FROM guilds ORDER BY guildId")?;
    let guilds = stmt
        .query_map([], row_to_guild)?
        .collect::<Result<Vec<_>, _>>()?;
    attach_members(conn, guilds)
}

/// Guilds whose name matches, with their members.
pub fn find_guilds_by_name(
    conn: &Connection,
    name: &str,
    matching: NameMatch,
) -> Result<Vec<Guild>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT guildId, name, owner, messageOfTheDay FROM guilds WHERE {} ORDER BY guildId",
        matching.clause("name")
    ))?;
    let guilds = stmt
        .query_map(params![name], row_to_guild)?
        .collect::<Result<Vec<_>, _>>()?;
    attach_members(conn, guilds)
}

fn guild_members(conn: &Connection, guild_id: OwnerId) -> Result<CharList, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CHARACTER_COLUMNS} FROM characters WHERE guild = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![guild_id], row_to_character)?;
    rows.collect::<Result<CharList, _>>().map_err(Into::into)
}

fn attach_members(conn: &Connection, mut guilds: Vec<Guild>) -> Result<Vec<Guild>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CHARACTER_COLUMNS} FROM characters WHERE guild IS NOT NULL ORDER BY id"
    ))?;
    let mut by_guild: HashMap<OwnerId, Vec<Character>> = HashMap::new();
    for character in stmt.query_map([], row_to_character)? {
        let character = character?;
        if let Some(guild_id) = character.guild_id {
            by_guild.entry(guild_id).or_default().push(character);
        }
    }
    for guild in &mut guilds {
        guild.members = CharList::new(by_guild.remove(&guild.id).unwrap_or_default());
    }
    Ok(guilds)
}

// ── Membership ──────────────────────────────────────────────────────────────

/// Member count of one guild. Guilds without members report zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildMemberCount {
    pub guild_id: OwnerId,
    pub name: String,
    pub members: i64,
}

/// Membership facts about one character.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterMembershipRow {
    pub id: OwnerId,
    pub name: String,
    pub guild_id: Option<OwnerId>,
    /// Whether `guild_id` refers to an existing guild row.
    pub guild_exists: bool,
    pub last_login: Option<i64>,
}

/// Member counts for every guild, including empty ones.
pub fn guild_member_counts(conn: &Connection) -> Result<Vec<GuildMemberCount>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT g.guildId, g.name, COUNT(c.id)
         FROM guilds g
         LEFT JOIN characters c ON c.guild = g.guildId
         GROUP BY g.guildId
         ORDER BY g.guildId",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(GuildMemberCount {
            guild_id: row.get(0)?,
            name: row.get(1)?,
            members: row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Members who logged in at or after `since` (unix seconds), per guild.
///
/// Guilds without any such member are absent from the result.
pub fn guild_active_member_counts(
    conn: &Connection,
    since: i64,
) -> Result<Vec<(OwnerId, i64)>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT g.guildId, COUNT(c.id)
         FROM guilds g
         JOIN characters c ON c.guild = g.guildId
         WHERE c.lastTimeOnline >= ?1
         GROUP BY g.guildId
         ORDER BY g.guildId",
    )?;
    let rows = stmt.query_map(params![since], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Membership facts for every character, ordered by id.
pub fn character_memberships(
    conn: &Connection,
) -> Result<Vec<CharacterMembershipRow>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.char_name, c.guild, g.guildId IS NOT NULL, c.lastTimeOnline
         FROM characters c
         LEFT JOIN guilds g ON g.guildId = c.guild
         ORDER BY c.id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(CharacterMembershipRow {
            id: row.get(0)?,
            name: row.get(1)?,
            guild_id: row.get(2)?,
            guild_exists: row.get(3)?,
            last_login: row.get(4)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// ── Time ────────────────────────────────────────────────────────────────────

/// The latest character login strictly before `before` (unix seconds).
pub fn latest_login_before(conn: &Connection, before: i64) -> Result<Option<i64>, OperationError> {
    let latest = conn.query_row(
        "SELECT MAX(lastTimeOnline) FROM characters WHERE lastTimeOnline < ?1",
        params![before],
        |row| row.get(0),
    )?;
    Ok(latest)
}

/// Number of characters whose last login lies in `(after, until]`.
pub fn count_logins_between(
    conn: &Connection,
    after: i64,
    until: i64,
) -> Result<i64, OperationError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM characters WHERE lastTimeOnline > ?1 AND lastTimeOnline <= ?2",
        params![after, until],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ── Row Mapping Helpers ─────────────────────────────────────────────────────

fn row_to_character(row: &rusqlite::Row<'_>) -> rusqlite::Result<Character> {
    let last_login: Option<i64> = row.get(6)?;
    Ok(Character {
        id: row.get(0)?,
        player_id: row.get(1)?,
        name: row.get(2)?,
        guild_id: row.get(3)?,
        rank: row.get(4)?,
        level: row.get(5)?,
        last_login: last_login.and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)),
    })
}

fn row_to_guild(row: &rusqlite::Row<'_>) -> rusqlite::Result<Guild> {
    Ok(Guild {
        id: row.get(0)?,
        name: row.get(1)?,
        owner_id: row.get(2)?,
        message_of_the_day: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        members: CharList::default(),
    })
}
