//! Aggregation engine over the game and supplemental databases.
//!
//! Everything starts from a [`Context`]: tile tallies ([`TilesManager`]),
//! membership cohorts ([`MembersManager`]), the server census ([`Stats`]),
//! owner lookups ([`OwnerLookup`]) and the supplemental caches.

pub mod cache;
pub mod context;
pub mod error;
pub mod members;
pub mod owner;
pub mod settings;
pub mod stats;
pub mod tiles;
pub mod wealth;

pub use cache::{ObjectsCache, ObjectsCacheStats, OwnersCache, OwnersCacheStats};
pub use context::Context;
pub use error::EngineError;
pub use members::{CharacterScope, MemberOptions, MembersManager};
pub use owner::{NameQuery, OwnerLookup};
pub use settings::{ConsistencyCheck, Settings, SettingsError};
pub use stats::{Stats, TileStatistics};
pub use tiles::{TileOptions, TilesManager};
pub use wealth::{Holding, HoldingLocation, NoWealth, WealthSource, WealthTally, tally_wealth};
