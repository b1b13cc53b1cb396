//! SQLite persistence layer for the game and supplemental databases.
//!
//! Provides schema creation for the supplemental database, row operations,
//! and the bulk read queries used by the aggregation engine, backed by
//! SQLite (via rusqlite with bundled feature).

pub mod operations;
pub mod queries;
pub mod schema;

pub use operations::{
    CacheWrite, OperationError, delete_unknown_object, find_owner_name, insert_actor_position,
    insert_building, insert_building_instance, insert_unknown_object, list_owner_names,
    list_unknown_objects, upsert_character, upsert_guild, upsert_owner_name,
};
pub use queries::{
    CharacterMembershipRow, GuildMemberCount, NameMatch, OwnedObjectRow, PositionedObjectRow,
    RootBuildingRow, building_owner_ids, building_owners, character_memberships,
    characters_for_player, count_logins_between, find_character, find_characters_by_name,
    find_guild, find_guilds_by_name, guild_active_member_counts, guild_member_counts,
    latest_login_before, list_guilds, orphan_instance_count, owner_exists, owner_has_buildings,
    positioned_building_details, positioned_buildings, root_building_positions, root_buildings,
    unknown_owner_objects,
};
pub use schema::{
    SchemaError, open_game_database, open_memory_game, open_memory_supplemental,
    open_supplemental_database,
};
