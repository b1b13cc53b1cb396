use chrono::{DateTime, Utc};
use exiles_db::*;
use exiles_model::{Character, SteamId};

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

fn setup_db() -> rusqlite::Connection {
    let conn = open_memory_game().unwrap();

    upsert_guild(&conn, 100, "Wolves", Some(1)).unwrap();
    upsert_guild(&conn, 200, "Empty Hall", None).unwrap();
    upsert_character(&conn, &character(1, "Conan", Some(100), Some(1_000))).unwrap();
    upsert_character(&conn, &character(2, "Valeria", Some(100), Some(5_000))).unwrap();
    upsert_character(&conn, &character(3, "Subotai", None, Some(9_000))).unwrap();
    upsert_character(&conn, &character(4, "Lost Soul", Some(999), None)).unwrap();

    // Root building of guild 100 with three pieces
    insert_actor_position(&conn, 10, "/Game/Building/BP_Foundation.BP_Foundation_C", (0.0, 0.0, 0.0)).unwrap();
    insert_building(&conn, 10, 100).unwrap();
    for instance in 0..3 {
        insert_building_instance(&conn, 10, instance, "Foundation").unwrap();
    }
    // Placeable of character 3
    insert_actor_position(&conn, 11, "/Game/Placeables/BP_Chest.BP_Chest_C", (5.0, 5.0, 0.0)).unwrap();
    insert_building(&conn, 11, 3).unwrap();
    // Building row without position is not a placeable
    insert_building(&conn, 12, 3).unwrap();
    // Object of an owner that does not exist
    insert_actor_position(&conn, 13, "BP_Wall", (100.0, 0.0, 0.0)).unwrap();
    insert_building(&conn, 13, 777).unwrap();

    conn
}

#[test]
fn root_buildings_count_pieces() {
    let conn = setup_db();
    let roots = root_buildings(&conn, None).unwrap();
    assert_eq!(
        roots,
        vec![RootBuildingRow {
            object_id: 10,
            owner_id: 100,
            piece_count: 3
        }]
    );
    assert!(root_buildings(&conn, Some(3)).unwrap().is_empty());
}

#[test]
fn positioned_buildings_require_position() {
    let conn = setup_db();
    let ids: Vec<_> = positioned_buildings(&conn, None)
        .unwrap()
        .into_iter()
        .map(|r| r.object_id)
        .collect();
    assert_eq!(ids, vec![10, 11, 13]);

    let for_owner = positioned_buildings(&conn, Some(3)).unwrap();
    assert_eq!(
        for_owner,
        vec![OwnedObjectRow {
            object_id: 11,
            owner_id: 3
        }]
    );
}

#[test]
fn root_positions_carry_class_and_count() {
    let conn = setup_db();
    let rows = root_building_positions(&conn).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].piece_count, Some(3));
    assert_eq!(rows[0].class, "/Game/Building/BP_Foundation.BP_Foundation_C");

    let details = positioned_building_details(&conn).unwrap();
    assert_eq!(details.len(), 3);
    assert!(details.iter().all(|r| r.piece_count.is_none()));
}

#[test]
fn orphan_instances_are_counted() {
    let conn = setup_db();
    assert_eq!(orphan_instance_count(&conn).unwrap(), 0);
    insert_building_instance(&conn, 50, 0, "Orphan").unwrap();
    insert_building_instance(&conn, 50, 1, "Orphan").unwrap();
    assert_eq!(orphan_instance_count(&conn).unwrap(), 1);
}

#[test]
fn building_owner_queries() {
    let conn = setup_db();
    let owners: Vec<_> = building_owner_ids(&conn).unwrap().into_iter().collect();
    assert_eq!(owners, vec![3, 100, 777]);
    assert!(owner_has_buildings(&conn, 100).unwrap());
    assert!(!owner_has_buildings(&conn, 1).unwrap());
    assert_eq!(building_owners(&conn).unwrap().get(&12), Some(&3));
}

#[test]
fn unknown_owner_objects_include_ruins() {
    let conn = setup_db();
    insert_building(&conn, 20, 11).unwrap();
    insert_building(&conn, 21, 0).unwrap();
    assert_eq!(unknown_owner_objects(&conn, 11).unwrap(), vec![13, 20]);
}

#[test]
fn owner_exists_checks_both_tables() {
    let conn = setup_db();
    assert!(owner_exists(&conn, 1).unwrap());
    assert!(owner_exists(&conn, 200).unwrap());
    assert!(!owner_exists(&conn, 777).unwrap());
}

#[test]
fn find_guild_includes_members() {
    let conn = setup_db();
    let guild = find_guild(&conn, 100).unwrap().unwrap();
    let names: Vec<_> = guild.members.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Conan", "Valeria"]);
    assert!(find_guild(&conn, 999).unwrap().is_none());
}

#[test]
fn list_guilds_attaches_members() {
    let conn = setup_db();
    let guilds = list_guilds(&conn).unwrap();
    assert_eq!(guilds.len(), 2);
    assert_eq!(guilds[0].members.len(), 2);
    assert!(guilds[1].members.is_empty());
}

#[test]
fn name_matching_modes() {
    let conn = setup_db();
    let substring = NameMatch {
        strict: false,
        case_insensitive: false,
    };
    let found = find_characters_by_name(&conn, "ona", substring).unwrap();
    assert_eq!(found.len(), 1);
    assert!(find_characters_by_name(&conn, "ONA", substring).unwrap().is_empty());

    let folded = NameMatch {
        strict: false,
        case_insensitive: true,
    };
    assert_eq!(find_characters_by_name(&conn, "ONA", folded).unwrap().len(), 1);

    let strict = NameMatch {
        strict: true,
        case_insensitive: true,
    };
    assert!(find_characters_by_name(&conn, "con", strict).unwrap().is_empty());
    assert_eq!(find_guilds_by_name(&conn, "wolves", strict).unwrap().len(), 1);
}

#[test]
fn characters_for_player_matches_all_slots() {
    let conn = setup_db();
    let mut alt = character(5, "Alt", None, None);
    alt.player_id = "765611980000000012".to_string();
    upsert_character(&conn, &alt).unwrap();

    let steam_id = SteamId::parse("76561198000000001").unwrap();
    let found = characters_for_player(&conn, &steam_id).unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].id, 1);
    assert_eq!(found[1].id, 5);
}

#[test]
fn guild_member_counts_include_empty_guilds() {
    let conn = setup_db();
    let counts = guild_member_counts(&conn).unwrap();
    assert_eq!(
        counts,
        vec![
            GuildMemberCount {
                guild_id: 100,
                name: "Wolves".to_string(),
                members: 2
            },
            GuildMemberCount {
                guild_id: 200,
                name: "Empty Hall".to_string(),
                members: 0
            },
        ]
    );
}

#[test]
fn active_member_counts_skip_inactive_guilds() {
    let conn = setup_db();
    assert_eq!(guild_active_member_counts(&conn, 2_000).unwrap(), vec![(100, 1)]);
    assert!(guild_active_member_counts(&conn, 6_000).unwrap().is_empty());
}

#[test]
fn character_memberships_flag_dangling_guilds() {
    let conn = setup_db();
    let rows = character_memberships(&conn).unwrap();
    assert_eq!(rows.len(), 4);
    let lost = rows.iter().find(|r| r.id == 4).unwrap();
    assert_eq!(lost.guild_id, Some(999));
    assert!(!lost.guild_exists);
    assert_eq!(lost.last_login, None);
    assert!(rows.iter().find(|r| r.id == 1).unwrap().guild_exists);
}

#[test]
fn latest_login_before_is_strict() {
    let conn = setup_db();
    assert_eq!(latest_login_before(&conn, 10_000).unwrap(), Some(9_000));
    assert_eq!(latest_login_before(&conn, 9_000).unwrap(), Some(5_000));
    assert_eq!(latest_login_before(&conn, 1_000).unwrap(), None);
}

#[test]
fn logins_between_is_half_open() {
    let conn = setup_db();
    assert_eq!(count_logins_between(&conn, 1_000, 9_000).unwrap(), 2);
    assert_eq!(count_logins_between(&conn, 0, 1_000).unwrap(), 1);
}
