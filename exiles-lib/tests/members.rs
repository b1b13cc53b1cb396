use chrono::{DateTime, Duration, Utc};
use exiles_db::*;
use exiles_lib::*;
use exiles_model::{Character, OwnerKind};

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

fn at(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
}

fn setup_ctx() -> Context {
    let conn = open_memory_game().unwrap();

    upsert_guild(&conn, 100, "Wolves", Some(1)).unwrap();
    upsert_guild(&conn, 200, "Empty Hall", None).unwrap();
    upsert_guild(&conn, 300, "Quiet Ones", Some(5)).unwrap();
    upsert_character(&conn, &character(1, "Conan", Some(100), Some(1_000))).unwrap();
    upsert_character(&conn, &character(2, "Valeria", Some(100), Some(5_000))).unwrap();
    upsert_character(&conn, &character(3, "Subotai", None, Some(9_000))).unwrap();
    upsert_character(&conn, &character(4, "Lost Soul", Some(999), None)).unwrap();
    upsert_character(&conn, &character(5, "Bêlit", Some(300), Some(2_000))).unwrap();

    insert_building(&conn, 10, 100).unwrap();
    insert_building(&conn, 11, 3).unwrap();
    insert_building(&conn, 12, 300).unwrap();

    Context::new(conn, Settings::default())
}

fn all_owners() -> MemberOptions {
    MemberOptions {
        only_with_buildings: false,
        characters: CharacterScope::Deduplicated,
        ..MemberOptions::default()
    }
}

#[test]
fn raw_counts_cover_every_character_once() {
    let ctx = setup_ctx();
    let cohorts = MembersManager::new(&ctx).members(&all_owners()).unwrap();

    let ids: Vec<_> = cohorts.keys().copied().collect();
    assert_eq!(ids, vec![3, 4, 100, 200, 300]);
    let total: u32 = cohorts.values().map(|c| c.num_members).sum();
    assert_eq!(total, 5);
    assert!(cohorts.values().all(|c| c.num_active_members.is_none()));

    assert_eq!(cohorts[&200].num_members, 0);
    assert_eq!(cohorts[&200].kind, OwnerKind::Guild);
    assert_eq!(cohorts[&4].kind, OwnerKind::Character);
    assert_eq!(cohorts[&100].name, "Wolves");
}

#[test]
fn ungrouped_scope_skips_dangling_guild_members() {
    let ctx = setup_ctx();
    let options = MemberOptions {
        only_with_buildings: false,
        ..MemberOptions::default()
    };
    let cohorts = MembersManager::new(&ctx).members(&options).unwrap();
    assert!(cohorts.contains_key(&3));
    assert!(!cohorts.contains_key(&4));
}

#[test]
fn default_options_keep_only_builders() {
    let ctx = setup_ctx();
    let cohorts = MembersManager::new(&ctx)
        .members(&MemberOptions::default())
        .unwrap();
    let ids: Vec<_> = cohorts.keys().copied().collect();
    assert_eq!(ids, vec![3, 100, 300]);
}

#[test]
fn huge_threshold_makes_everyone_active() {
    let ctx = setup_ctx();
    let options = MemberOptions {
        threshold: Some(Duration::days(365 * 100)),
        ..all_owners()
    };
    let cohorts = MembersManager::new(&ctx).members(&options).unwrap();
    assert_eq!(cohorts[&100].num_active_members, Some(2));
    assert_eq!(cohorts[&300].num_active_members, Some(1));
    assert_eq!(cohorts[&3].num_active_members, Some(1));
    // Never logged in
    assert_eq!(cohorts[&4].num_active_members, Some(0));
    assert_eq!(cohorts[&200].num_active_members, Some(0));
}

#[test]
fn threshold_beyond_date_range_makes_everyone_active() {
    let ctx = setup_ctx();
    let options = MemberOptions {
        threshold: Some(Duration::days(100_000_000)),
        ..all_owners()
    };
    let cohorts = MembersManager::new(&ctx).members(&options).unwrap();
    assert_eq!(cohorts[&100].num_active_members, Some(2));
    assert_eq!(cohorts[&300].num_active_members, Some(1));
    assert_eq!(cohorts[&3].num_active_members, Some(1));
    assert_eq!(cohorts[&4].num_active_members, Some(0));
}

#[test]
fn zero_threshold_after_all_logins_makes_nobody_active() {
    let ctx = setup_ctx();
    let options = MemberOptions {
        threshold: Some(Duration::zero()),
        reference_time: at(10_000),
        ..all_owners()
    };
    let cohorts = MembersManager::new(&ctx).members(&options).unwrap();
    assert!(cohorts.values().all(|c| c.num_active_members == Some(0)));
    assert!(cohorts.values().all(|c| !c.is_active()));
}

#[test]
fn threshold_is_measured_from_dataset_now() {
    let ctx = setup_ctx();
    // Dataset now is the latest login (9000), so the window starts at 4000.
    let options = MemberOptions {
        threshold: Some(Duration::seconds(5_000)),
        ..all_owners()
    };
    let cohorts = MembersManager::new(&ctx).members(&options).unwrap();
    assert_eq!(cohorts[&100].num_active_members, Some(1));
    assert_eq!(cohorts[&300].num_active_members, Some(0));
    assert_eq!(cohorts[&3].num_active_members, Some(1));
    assert_eq!(cohorts[&100].num_members, 2);
}

#[test]
fn login_exactly_at_window_start_is_active() {
    let ctx = setup_ctx();
    let options = MemberOptions {
        threshold: Some(Duration::seconds(1_000)),
        reference_time: at(3_000),
        ..all_owners()
    };
    let cohorts = MembersManager::new(&ctx).members(&options).unwrap();
    assert_eq!(cohorts[&300].num_active_members, Some(1));

    let options = MemberOptions {
        reference_time: at(3_001),
        ..options
    };
    let cohorts = MembersManager::new(&ctx).members(&options).unwrap();
    assert_eq!(cohorts[&300].num_active_members, Some(0));
}

#[test]
fn guild_without_buildings_scenario() {
    let conn = open_memory_game().unwrap();
    upsert_guild(&conn, 100, "Nomads", None).unwrap();
    upsert_character(&conn, &character(1, "Active", Some(100), Some(10_000))).unwrap();
    upsert_character(&conn, &character(2, "Idle", Some(100), Some(100))).unwrap();
    let ctx = Context::new(conn, Settings::default());
    let manager = MembersManager::new(&ctx);

    let options = MemberOptions {
        threshold: Some(Duration::seconds(1_000)),
        reference_time: at(10_500),
        ..MemberOptions::default()
    };
    assert!(manager.members(&options).unwrap().is_empty());

    let options = MemberOptions {
        only_with_buildings: false,
        ..options
    };
    let cohorts = manager.members(&options).unwrap();
    assert_eq!(cohorts.len(), 1);
    assert_eq!(cohorts[&100].num_members, 2);
    assert_eq!(cohorts[&100].num_active_members, Some(1));
}

#[test]
fn negative_threshold_is_rejected() {
    let ctx = setup_ctx();
    let options = MemberOptions {
        threshold: Some(Duration::seconds(-1)),
        ..MemberOptions::default()
    };
    let result = MembersManager::new(&ctx).members(&options);
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));
}
