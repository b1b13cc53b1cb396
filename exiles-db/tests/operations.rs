use chrono::{DateTime, Utc};
use exiles_db::*;
use exiles_model::Character;

fn character(id: i64, name: &str, guild: Option<i64>, login: Option<i64>) -> Character {
    Character {
        id,
        player_id: format!("7656119800000{:04}", id),
        name: name.to_string(),
        guild_id: guild,
        rank: guild.map(|_| 1),
        level: 60,
        last_login: login.and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)),
    }
}

#[test]
fn upsert_character_updates_existing_row() {
    let conn = open_memory_game().unwrap();
    upsert_character(&conn, &character(1, "Conan", None, Some(100))).unwrap();
    upsert_character(&conn, &character(1, "Conan the Barbarian", None, Some(200))).unwrap();

    let found = find_character(&conn, 1).unwrap().unwrap();
    assert_eq!(found.name, "Conan the Barbarian");
    assert_eq!(found.last_login.map(|t| t.timestamp()), Some(200));
}

#[test]
fn upsert_guild_updates_name() {
    let conn = open_memory_game().unwrap();
    upsert_guild(&conn, 100, "Wolves", None).unwrap();
    upsert_guild(&conn, 100, "Dire Wolves", Some(1)).unwrap();

    let guild = find_guild(&conn, 100).unwrap().unwrap();
    assert_eq!(guild.name, "Dire Wolves");
    assert_eq!(guild.owner_id, Some(1));
    assert!(guild.members.is_empty());
}

#[test]
fn owner_name_cache_reports_writes() {
    let conn = open_memory_supplemental().unwrap();
    assert_eq!(upsert_owner_name(&conn, 1, "Conan").unwrap(), CacheWrite::Inserted);
    assert_eq!(upsert_owner_name(&conn, 1, "Conan").unwrap(), CacheWrite::Unchanged);
    assert_eq!(upsert_owner_name(&conn, 1, "Valeria").unwrap(), CacheWrite::Updated);

    assert_eq!(find_owner_name(&conn, 1).unwrap().as_deref(), Some("Valeria"));
    assert_eq!(find_owner_name(&conn, 2).unwrap(), None);
    assert_eq!(list_owner_names(&conn).unwrap(), vec![(1, "Valeria".to_string())]);
}

#[test]
fn unknown_object_cache_keeps_first_timestamp() {
    let conn = open_memory_supplemental().unwrap();
    insert_unknown_object(&conn, 500, 1000).unwrap();
    insert_unknown_object(&conn, 500, 2000).unwrap();
    assert_eq!(list_unknown_objects(&conn).unwrap(), vec![(500, 1000)]);

    delete_unknown_object(&conn, 500).unwrap();
    assert!(list_unknown_objects(&conn).unwrap().is_empty());
}

#[test]
fn deleting_missing_unknown_object_fails() {
    let conn = open_memory_supplemental().unwrap();
    let result = delete_unknown_object(&conn, 42);
    assert!(matches!(result, Err(OperationError::NotFound { .. })));
}
