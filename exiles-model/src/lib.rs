//! Data model for the game and supplemental databases.
//!
//! This crate defines owners (characters and guilds), tile records, clusters
//! and membership cohorts without any database dependencies. `exiles-db`
//! fills these types from SQLite rows and `exiles-lib` aggregates them.

pub mod player;
pub mod tiles;
pub mod types;

pub use player::{ModelError, SteamId};
pub use tiles::{
    ConsolidatedCluster, MembershipCohort, RoundingMode, TileKind, TileRecord, TileSplit,
    simplify_class_name,
};
pub use types::*;
