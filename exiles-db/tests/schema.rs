use exiles_db::schema::{CURRENT_VERSION, create_schema, get_schema_version};
use exiles_db::{open_memory_game, open_memory_supplemental, open_supplemental_database};

#[test]
fn create_schema_in_memory() {
    let conn = open_memory_supplemental().unwrap();
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(version, CURRENT_VERSION);
}

#[test]
fn schema_is_idempotent() {
    let conn = open_memory_supplemental().unwrap();
    // Creating again should not error
    create_schema(&conn).unwrap();
}

#[test]
fn supplemental_tables_exist() {
    let conn = open_memory_supplemental().unwrap();
    for table in ["schema_version", "owners_cache", "objects_cache"] {
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1)",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        assert!(exists, "table '{}' should exist", table);
    }
}

#[test]
fn game_tables_exist() {
    let conn = open_memory_game().unwrap();
    let tables = [
        "characters",
        "guilds",
        "actor_position",
        "buildings",
        "building_instances",
    ];
    for table in tables {
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1)",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        assert!(exists, "table '{}' should exist", table);
    }
}

#[test]
fn migrates_version_one_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("supplemental.db");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_version (
                 version INTEGER NOT NULL,
                 applied_at TEXT NOT NULL DEFAULT (datetime('now'))
             );
             INSERT INTO schema_version (version) VALUES (1);
             CREATE TABLE owners_cache (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
        )
        .unwrap();
    }

    let conn = open_supplemental_database(&path).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
    let exists: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='objects_cache')",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(exists);
}

#[test]
fn missing_game_database_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = exiles_db::open_game_database(&dir.path().join("game.db"));
    assert!(matches!(result, Err(exiles_db::SchemaError::GameDbMissing(_))));
}
