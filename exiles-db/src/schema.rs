//! SQLite schema creation and migration.
//!
//! The game database belongs to the game server and is opened read-only.
//! The supplemental database is owned by this crate and versioned.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: expected version {expected}, found {found}")]
    VersionMismatch { expected: i32, found: i32 },
    #[error("Game database not found: {0}")]
    GameDbMissing(String),
}

/// Current supplemental schema version. Increment when adding migrations.
pub const CURRENT_VERSION: i32 = 2;

/// Create all supplemental tables if they don't exist.
///
/// Idempotent on an existing database.
pub fn create_schema(conn: &Connection) -> Result<(), SchemaError> {
    conn.execute_batch(SUPPLEMENTAL_SCHEMA_SQL)?;
    set_schema_version(conn, CURRENT_VERSION)?;
    Ok(())
}

/// Create the subset of game tables the engine reads.
///
/// The game server owns the real schema; this exists for fixtures and tests.
pub fn create_game_schema(conn: &Connection) -> Result<(), SchemaError> {
    conn.execute_batch(GAME_SCHEMA_SQL)?;
    Ok(())
}

/// Open an existing game database read-only.
pub fn open_game_database(path: &Path) -> Result<Connection, SchemaError> {
    if !path.exists() {
        return Err(SchemaError::GameDbMissing(path.display().to_string()));
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
    )?;
    Ok(conn)
}

/// Open or create the supplemental database at the given path.
pub fn open_supplemental_database(path: &Path) -> Result<Connection, SchemaError> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    let version = get_schema_version(&conn)?;
    if version == 0 {
        create_schema(&conn)?;
    } else if version < CURRENT_VERSION {
        migrate(&conn, version)?;
    } else if version > CURRENT_VERSION {
        return Err(SchemaError::VersionMismatch {
            expected: CURRENT_VERSION,
            found: version,
        });
    }

    Ok(conn)
}

/// Open an in-memory game database with the table subset. Useful for testing.
pub fn open_memory_game() -> Result<Connection, SchemaError> {
    let conn = Connection::open_in_memory()?;
    create_game_schema(&conn)?;
    Ok(conn)
}

/// Open an in-memory supplemental database with the full schema.
pub fn open_memory_supplemental() -> Result<Connection, SchemaError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Get the current schema version, or 0 if no schema exists.
pub fn get_schema_version(conn: &Connection) -> Result<i32, SchemaError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Record a schema version.
fn set_schema_version(conn: &Connection, version: i32) -> Result<(), SchemaError> {
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Run migrations from `from_version` up to `CURRENT_VERSION`.
fn migrate(conn: &Connection, from_version: i32) -> Result<(), SchemaError> {
    let mut version = from_version;
    while version < CURRENT_VERSION {
        if version == 1 {
            // v1 only tracked owner names
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS objects_cache (
                     id INTEGER PRIMARY KEY,
                     timestamp INTEGER NOT NULL
                 );",
            )?;
        }
        version += 1;
        set_schema_version(conn, version)?;
    }

    Ok(())
}

const SUPPLEMENTAL_SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Display names of every known owner, kept after the owner is gone
CREATE TABLE IF NOT EXISTS owners_cache (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

-- Objects whose owner could not be resolved, and since when
CREATE TABLE IF NOT EXISTS objects_cache (
    id INTEGER PRIMARY KEY,
    timestamp INTEGER NOT NULL
);
"#;

const GAME_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS characters (
    id INTEGER PRIMARY KEY,
    playerId TEXT NOT NULL,
    char_name TEXT NOT NULL,
    guild INTEGER,
    rank INTEGER,
    level INTEGER NOT NULL DEFAULT 0,
    lastTimeOnline INTEGER
);
CREATE INDEX IF NOT EXISTS idx_characters_guild ON characters(guild);

CREATE TABLE IF NOT EXISTS guilds (
    guildId INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    owner INTEGER,
    messageOfTheDay TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS actor_position (
    class TEXT NOT NULL,
    id INTEGER PRIMARY KEY,
    x REAL NOT NULL,
    y REAL NOT NULL,
    z REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS buildings (
    object_id INTEGER PRIMARY KEY,
    owner_id INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_buildings_owner ON buildings(owner_id);

CREATE TABLE IF NOT EXISTS building_instances (
    object_id INTEGER NOT NULL,
    instance_id INTEGER NOT NULL,
    class TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (object_id, instance_id)
);
"#;
