//! Write operations for game fixtures and the supplemental caches.

use exiles_model::{Character, ObjectId, OwnerId};
use rusqlite::{Connection, params};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Entity not found: {entity_type} with id '{id}'")]
    NotFound { entity_type: String, id: String },
}

// ── Game Rows ───────────────────────────────────────────────────────────────

/// Insert or replace a character row.
pub fn upsert_character(conn: &Connection, character: &Character) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO characters (id, playerId, char_name, guild, rank, level, lastTimeOnline)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
             playerId = excluded.playerId,
             char_name = excluded.char_name,
             guild = excluded.guild,
             rank = excluded.rank,
             level = excluded.level,
             lastTimeOnline = excluded.lastTimeOnline",
        params![
            character.id,
            character.player_id,
            character.name,
            character.guild_id,
            character.rank,
            character.level,
            character.last_login.map(|t| t.timestamp()),
        ],
    )?;
    Ok(())
}

/// Insert or replace a guild row. Members are linked through `characters.guild`.
pub fn upsert_guild(
    conn: &Connection,
    id: OwnerId,
    name: &str,
    owner_id: Option<OwnerId>,
) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO guilds (guildId, name, owner) VALUES (?1, ?2, ?3)
         ON CONFLICT(guildId) DO UPDATE SET
             name = excluded.name,
             owner = excluded.owner",
        params![id, name, owner_id],
    )?;
    Ok(())
}

/// Record an object's position and class.
pub fn insert_actor_position(
    conn: &Connection,
    id: ObjectId,
    class: &str,
    (x, y, z): (f64, f64, f64),
) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO actor_position (class, id, x, y, z) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![class, id, x, y, z],
    )?;
    Ok(())
}

/// Record which owner a building object belongs to.
pub fn insert_building(
    conn: &Connection,
    object_id: ObjectId,
    owner_id: OwnerId,
) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO buildings (object_id, owner_id) VALUES (?1, ?2)",
        params![object_id, owner_id],
    )?;
    Ok(())
}

/// Add one piece to a root building's instance index.
pub fn insert_building_instance(
    conn: &Connection,
    object_id: ObjectId,
    instance_id: i64,
    class: &str,
) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO building_instances (object_id, instance_id, class) VALUES (?1, ?2, ?3)",
        params![object_id, instance_id, class],
    )?;
    Ok(())
}

// ── Owner Name Cache ────────────────────────────────────────────────────────

/// Outcome of writing one cached owner name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheWrite {
    Inserted,
    Updated,
    Unchanged,
}

/// Insert or update a cached owner name.
pub fn upsert_owner_name(
    conn: &Connection,
    id: OwnerId,
    name: &str,
) -> Result<CacheWrite, OperationError> {
    let existing = find_owner_name(conn, id)?;
    match existing {
        Some(ref current) if current == name => Ok(CacheWrite::Unchanged),
        Some(_) => {
            conn.execute(
                "UPDATE owners_cache SET name = ?2 WHERE id = ?1",
                params![id, name],
            )?;
            Ok(CacheWrite::Updated)
        }
        None => {
            conn.execute(
                "INSERT INTO owners_cache (id, name) VALUES (?1, ?2)",
                params![id, name],
            )?;
            Ok(CacheWrite::Inserted)
        }
    }
}

/// Look up a cached owner name.
pub fn find_owner_name(conn: &Connection, id: OwnerId) -> Result<Option<String>, OperationError> {
    let mut stmt = conn.prepare("SELECT name FROM owners_cache WHERE id = ?1")?;
    let result = stmt.query_row(params![id], |row| row.get::<_, String>(0));
    match result {
        Ok(name) => Ok(Some(name)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All cached owner names ordered by id.
pub fn list_owner_names(conn: &Connection) -> Result<Vec<(OwnerId, String)>, OperationError> {
    let mut stmt = conn.prepare("SELECT id, name FROM owners_cache ORDER BY id")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// ── Unknown-Owner Object Cache ──────────────────────────────────────────────

/// Remember that an object's owner has been unknown since `since` (unix seconds).
pub fn insert_unknown_object(
    conn: &Connection,
    id: ObjectId,
    since: i64,
) -> Result<(), OperationError> {
    conn.execute(
        "INSERT OR IGNORE INTO objects_cache (id, timestamp) VALUES (?1, ?2)",
        params![id, since],
    )?;
    Ok(())
}

/// Forget an object in the unknown-owner cache.
pub fn delete_unknown_object(conn: &Connection, id: ObjectId) -> Result<(), OperationError> {
    let changed = conn.execute("DELETE FROM objects_cache WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(OperationError::NotFound {
            entity_type: "objects_cache".to_string(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// All cached unknown-owner objects with their first-seen timestamps.
pub fn list_unknown_objects(conn: &Connection) -> Result<Vec<(ObjectId, i64)>, OperationError> {
    let mut stmt = conn.prepare("SELECT id, timestamp FROM objects_cache ORDER BY id")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}
