use chrono::{DateTime, Utc};
use exiles_db::*;
use exiles_lib::*;
use exiles_model::Character;

fn character(id: i64, name: &str, guild: Option<i64>) -> Character {
    Character {
        id,
        player_id: format!("7656119800000{:04}", id),
        name: name.to_string(),
        guild_id: guild,
        rank: None,
        level: 60,
        last_login: None,
    }
}

fn setup_ctx() -> Context {
    let game = open_memory_game().unwrap();
    upsert_guild(&game, 100, "Wolves", None).unwrap();
    upsert_guild(&game, 11, "Ruins", None).unwrap();
    upsert_character(&game, &character(1, "Conan", Some(100))).unwrap();
    upsert_character(&game, &character(3, "Subotai", None)).unwrap();

    insert_building(&game, 10, 100).unwrap();
    insert_building(&game, 20, 11).unwrap();
    insert_building(&game, 30, 777).unwrap();
    insert_building(&game, 40, 0).unwrap();

    let supplemental = open_memory_supplemental().unwrap();
    Context::new(game, Settings::default()).with_supplemental(supplemental)
}

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
}

#[test]
fn owners_cache_stores_names() {
    let ctx = setup_ctx();
    let stats = OwnersCache::refresh(&ctx).unwrap();
    assert_eq!(stats.inserted, 5);
    assert_eq!(stats.updated, 0);

    let names = list_owner_names(ctx.supplemental().unwrap()).unwrap();
    assert_eq!(
        names,
        vec![
            (0, "Game Assets".to_string()),
            (1, "Conan".to_string()),
            (3, "Subotai".to_string()),
            (11, "Ruins".to_string()),
            (100, "Wolves".to_string()),
        ]
    );
}

#[test]
fn owners_cache_updates_renamed_owners() {
    let ctx = setup_ctx();
    OwnersCache::refresh(&ctx).unwrap();

    upsert_guild(ctx.game(), 100, "Dire Wolves", None).unwrap();
    let stats = OwnersCache::refresh(&ctx).unwrap();
    assert_eq!(stats.inserted, 0);
    assert_eq!(stats.updated, 1);
    assert_eq!(stats.unchanged, 2);
    assert_eq!(
        find_owner_name(ctx.supplemental().unwrap(), 100).unwrap(),
        Some("Dire Wolves".to_string())
    );
}

#[test]
fn owners_cache_keeps_deleted_owners() {
    let ctx = setup_ctx();
    OwnersCache::refresh(&ctx).unwrap();
    ctx.game()
        .execute("DELETE FROM characters WHERE id = 3", [])
        .unwrap();
    OwnersCache::refresh(&ctx).unwrap();
    assert_eq!(
        find_owner_name(ctx.supplemental().unwrap(), 3).unwrap(),
        Some("Subotai".to_string())
    );
}

#[test]
fn objects_cache_tracks_unknown_owners() {
    let ctx = setup_ctx();
    let stats = ObjectsCache::refresh(&ctx, at(1_000)).unwrap();
    assert_eq!(stats.inserted, 2);
    assert_eq!(
        list_unknown_objects(ctx.supplemental().unwrap()).unwrap(),
        vec![(20, 1_000), (30, 1_000)]
    );

    // Owner 777 shows up, a new object loses its owner
    upsert_character(ctx.game(), &character(777, "Returned", None)).unwrap();
    insert_building(ctx.game(), 50, 888).unwrap();
    let stats = ObjectsCache::refresh(&ctx, at(2_000)).unwrap();
    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.removed, 1);
    assert_eq!(stats.kept, 1);
    assert_eq!(
        list_unknown_objects(ctx.supplemental().unwrap()).unwrap(),
        vec![(20, 1_000), (50, 2_000)]
    );
}

#[test]
fn caches_need_the_supplemental_database() {
    let ctx = Context::new(open_memory_game().unwrap(), Settings::default());
    assert!(matches!(
        OwnersCache::refresh(&ctx),
        Err(EngineError::NoSupplemental)
    ));
}
