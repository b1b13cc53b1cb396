//! Supplemental caches kept alongside the game database.
//!
//! The owner-name cache keeps display names around after characters and
//! guilds are deleted from the game. The object cache records since when a
//! building's owner has been unknown.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use exiles_db::{CacheWrite, operations, queries};
use exiles_model::{OwnerId, RUINS_NAME, is_ruins_name};

use crate::context::Context;
use crate::error::EngineError;

/// Owner id the game uses for its own structures.
pub const GAME_ASSETS_ID: OwnerId = 0;
pub const GAME_ASSETS_NAME: &str = "Game Assets";

/// Counts from an owner-name cache refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnersCacheStats {
    pub inserted: u64,
    pub updated: u64,
    pub unchanged: u64,
}

impl OwnersCacheStats {
    fn record(&mut self, write: CacheWrite) {
        match write {
            CacheWrite::Inserted => self.inserted += 1,
            CacheWrite::Updated => self.updated += 1,
            CacheWrite::Unchanged => self.unchanged += 1,
        }
    }
}

/// Counts from an unknown-object cache refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectsCacheStats {
    pub inserted: u64,
    pub removed: u64,
    pub kept: u64,
}

pub struct OwnersCache;

impl OwnersCache {
    /// Store the current name of every guild and character.
    ///
    /// Owners named `Ruins` are skipped. The game-assets and ruins entries
    /// are only added when missing, never renamed.
    pub fn refresh(ctx: &Context) -> Result<OwnersCacheStats, EngineError> {
        let game = ctx.game();
        let supplemental = ctx.supplemental()?;
        let mut stats = OwnersCacheStats::default();

        let tx = supplemental.unchecked_transaction()?;

        let guilds = queries::guild_member_counts(game)?
            .into_iter()
            .map(|g| (g.guild_id, g.name));
        let characters = queries::character_memberships(game)?
            .into_iter()
            .map(|c| (c.id, c.name));
        for (id, name) in guilds.chain(characters) {
            if is_ruins_name(&name) {
                continue;
            }
            stats.record(operations::upsert_owner_name(&tx, id, &name)?);
        }

        for (id, name) in [
            (GAME_ASSETS_ID, GAME_ASSETS_NAME),
            (ctx.settings().ruins_clan_id, RUINS_NAME),
        ] {
            if operations::find_owner_name(&tx, id)?.is_none() {
                stats.record(operations::upsert_owner_name(&tx, id, name)?);
            }
        }

        tx.commit()?;
        log::info!(
            "Owner cache: {} inserted, {} updated, {} unchanged",
            stats.inserted,
            stats.updated,
            stats.unchanged
        );
        Ok(stats)
    }
}

pub struct ObjectsCache;

impl ObjectsCache {
    /// Sync the cache with the set of buildings whose owner is unknown.
    ///
    /// Newly unknown objects are stamped with `now`; existing entries keep
    /// their original timestamp.
    pub fn refresh(ctx: &Context, now: DateTime<Utc>) -> Result<ObjectsCacheStats, EngineError> {
        let current: BTreeSet<_> =
            queries::unknown_owner_objects(ctx.game(), ctx.settings().ruins_clan_id)?
                .into_iter()
                .collect();
        let supplemental = ctx.supplemental()?;
        let mut stats = ObjectsCacheStats::default();

        let tx = supplemental.unchecked_transaction()?;

        let cached: BTreeSet<_> = operations::list_unknown_objects(&tx)?
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        for id in cached.difference(&current) {
            operations::delete_unknown_object(&tx, *id)?;
            stats.removed += 1;
        }
        for id in current.difference(&cached) {
            operations::insert_unknown_object(&tx, *id, now.timestamp())?;
            stats.inserted += 1;
        }
        stats.kept = cached.intersection(&current).count() as u64;

        tx.commit()?;
        log::info!(
            "Object cache: {} inserted, {} removed, {} kept",
            stats.inserted,
            stats.removed,
            stats.kept
        );
        Ok(stats)
    }
}
