//! Server census: tiles, activity cohorts, logins and wealth.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use exiles_db::queries;
use exiles_model::{MembershipCohort, OwnerId, OwnerKind};
use serde::Serialize;

use crate::context::Context;
use crate::error::EngineError;
use crate::members::{CharacterScope, MemberOptions, MembersManager};
use crate::tiles::{TileOptions, TilesManager};
use crate::wealth::{NoWealth, WealthSource, tally_wealth};

/// Per-owner tile counts keyed by owner id.
pub type OwnerTiles = BTreeMap<OwnerId, f64>;

/// Flat census record. Serializes with camelCase keys.
///
/// Guild cohorts hold guilds with more than one member. Character cohorts
/// hold every single owner: characters, and guilds with at most one member.
/// An owner is active when at least one of its members logged in within the
/// threshold. Owners named `Ruins` are kept out of the activity cohorts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileStatistics {
    pub db_date: Option<DateTime<Utc>>,
    pub num_tiles: f64,
    pub num_building_tiles: f64,
    pub num_placeables: f64,

    pub num_active_guilds: usize,
    pub num_active_guild_members: u32,
    pub tiles_active_guilds: f64,
    pub mean_tiles_active_guilds: Option<f64>,
    pub median_tiles_active_guilds: Option<f64>,

    pub num_inactive_guilds: usize,
    pub num_inactive_guild_members: u32,
    pub tiles_inactive_guilds: f64,
    pub mean_tiles_inactive_guilds: Option<f64>,
    pub median_tiles_inactive_guilds: Option<f64>,

    pub num_active_chars: usize,
    pub tiles_active_chars: f64,
    pub mean_tiles_active_chars: Option<f64>,
    pub median_tiles_active_chars: Option<f64>,

    pub num_inactive_chars: usize,
    pub tiles_inactive_chars: f64,
    pub mean_tiles_inactive_chars: Option<f64>,
    pub median_tiles_inactive_chars: Option<f64>,

    pub num_ruins_chars: usize,
    pub tiles_ruins_chars: f64,
    pub num_ruins_guilds: usize,
    pub tiles_ruins_guilds: f64,
    pub num_ruins: usize,
    pub tiles_ruins: f64,

    pub num_no_owners: usize,
    pub tiles_no_owner: f64,

    pub num_empty_guilds: usize,
    pub num_logins_24h: i64,

    pub total_wealth: f64,
    pub character_wealth: f64,
    pub guild_wealth: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_guilds: Option<OwnerTiles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive_guilds: Option<OwnerTiles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_chars: Option<OwnerTiles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive_chars: Option<OwnerTiles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ruins_chars: Option<OwnerTiles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ruins_guilds: Option<OwnerTiles>,
    /// Union of `ruins_chars` and `ruins_guilds`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ruins: Option<OwnerTiles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_owners: Option<OwnerTiles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_wealths: Option<BTreeMap<OwnerId, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_wealths: Option<BTreeMap<OwnerId, f64>>,
}

/// Owners of one cohort with their tile counts.
#[derive(Debug, Default)]
struct Cohort {
    tiles: OwnerTiles,
    members: u32,
}

impl Cohort {
    fn add(&mut self, id: OwnerId, tiles: f64, members: u32) {
        self.tiles.insert(id, tiles);
        self.members += members;
    }

    fn sum(&self) -> f64 {
        self.tiles.values().sum()
    }

    /// Tile counts of owners that hold any tiles.
    fn holdings(&self) -> Vec<f64> {
        self.tiles.values().copied().filter(|t| *t > 0.0).collect()
    }
}

/// Arithmetic mean, `None` for no values.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median, averaging the two middle values for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

pub struct Stats<'a> {
    ctx: &'a Context,
    wealth: &'a dyn WealthSource,
}

impl<'a> Stats<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self {
            ctx,
            wealth: &NoWealth,
        }
    }

    pub fn with_wealth(mut self, source: &'a dyn WealthSource) -> Self {
        self.wealth = source;
        self
    }

    /// Compute the census as of `reference_date`, defaulting to the dataset
    /// "now". `full` adds the per-owner mappings.
    pub fn tile_statistics(
        &self,
        threshold: Duration,
        reference_date: Option<DateTime<Utc>>,
        full: bool,
    ) -> Result<TileStatistics, EngineError> {
        let db_date = match reference_date {
            Some(date) => Some(date),
            None => self.ctx.dataset_now()?,
        };
        let reference = db_date.unwrap_or_else(Utc::now);
        log::debug!("Computing tile statistics as of {}", reference);

        let split = TilesManager::new(self.ctx).tiles_by_owner_split(&TileOptions::unrounded())?;
        let totals: OwnerTiles = split.iter().map(|(id, s)| (*id, s.total())).collect();

        let members = MembersManager::new(self.ctx).members(&MemberOptions {
            threshold: Some(threshold),
            reference_time: Some(reference),
            only_with_buildings: false,
            characters: CharacterScope::Deduplicated,
        })?;

        let mut stats = TileStatistics {
            db_date,
            num_building_tiles: split.values().map(|s| s.buildings).sum(),
            num_placeables: split.values().map(|s| s.placeables).sum(),
            num_tiles: totals.values().sum(),
            ..Default::default()
        };

        let mut active_guilds = Cohort::default();
        let mut inactive_guilds = Cohort::default();
        let mut active_chars = Cohort::default();
        let mut inactive_chars = Cohort::default();
        let mut ruins_chars = Cohort::default();
        let mut ruins_guilds = Cohort::default();
        let mut no_owner = Cohort::default();

        for (&id, cohort) in &members {
            let tiles = totals.get(&id).copied().unwrap_or(0.0);
            if cohort.kind == OwnerKind::Guild && cohort.num_members == 0 {
                stats.num_empty_guilds += 1;
            }
            let bucket = classify(
                cohort,
                [
                    &mut active_guilds,
                    &mut inactive_guilds,
                    &mut active_chars,
                    &mut inactive_chars,
                    &mut ruins_chars,
                    &mut ruins_guilds,
                ],
            );
            bucket.add(id, tiles, cohort.num_members);
        }
        for (&id, &tiles) in &totals {
            if !members.contains_key(&id) {
                no_owner.add(id, tiles, 0);
            }
        }

        stats.num_active_guilds = active_guilds.tiles.len();
        stats.num_active_guild_members = active_guilds.members;
        stats.tiles_active_guilds = active_guilds.sum();
        stats.mean_tiles_active_guilds = mean(&active_guilds.holdings());
        stats.median_tiles_active_guilds = median(&active_guilds.holdings());

        stats.num_inactive_guilds = inactive_guilds.tiles.len();
        stats.num_inactive_guild_members = inactive_guilds.members;
        stats.tiles_inactive_guilds = inactive_guilds.sum();
        stats.mean_tiles_inactive_guilds = mean(&inactive_guilds.holdings());
        stats.median_tiles_inactive_guilds = median(&inactive_guilds.holdings());

        stats.num_active_chars = active_chars.tiles.len();
        stats.tiles_active_chars = active_chars.sum();
        stats.mean_tiles_active_chars = mean(&active_chars.holdings());
        stats.median_tiles_active_chars = median(&active_chars.holdings());

        stats.num_inactive_chars = inactive_chars.tiles.len();
        stats.tiles_inactive_chars = inactive_chars.sum();
        stats.mean_tiles_inactive_chars = mean(&inactive_chars.holdings());
        stats.median_tiles_inactive_chars = median(&inactive_chars.holdings());

        stats.num_ruins_chars = ruins_chars.tiles.len();
        stats.tiles_ruins_chars = ruins_chars.sum();
        stats.num_ruins_guilds = ruins_guilds.tiles.len();
        stats.tiles_ruins_guilds = ruins_guilds.sum();
        stats.num_ruins = stats.num_ruins_chars + stats.num_ruins_guilds;
        stats.tiles_ruins = stats.tiles_ruins_chars + stats.tiles_ruins_guilds;

        stats.num_no_owners = no_owner.tiles.len();
        stats.tiles_no_owner = no_owner.sum();

        let since = reference
            .checked_sub_signed(Duration::hours(24))
            .map_or(i64::MIN, |t| t.timestamp());
        stats.num_logins_24h =
            queries::count_logins_between(self.ctx.game(), since, reference.timestamp())?;

        let wealth = tally_wealth(self.ctx, self.wealth)?;
        stats.character_wealth = wealth.character_total();
        stats.guild_wealth = wealth.guild_total();
        stats.total_wealth = wealth.total();

        if full {
            stats.active_guilds = Some(active_guilds.tiles);
            stats.inactive_guilds = Some(inactive_guilds.tiles);
            stats.active_chars = Some(active_chars.tiles);
            stats.inactive_chars = Some(inactive_chars.tiles);
            let mut ruins = ruins_chars.tiles.clone();
            ruins.extend(ruins_guilds.tiles.iter().map(|(id, t)| (*id, *t)));
            stats.ruins = Some(ruins);
            stats.ruins_chars = Some(ruins_chars.tiles);
            stats.ruins_guilds = Some(ruins_guilds.tiles);
            stats.no_owners = Some(no_owner.tiles);
            stats.character_wealths = Some(wealth.characters);
            stats.guild_wealths = Some(wealth.guilds);
        }

        Ok(stats)
    }
}

/// Pick the cohort an owner belongs to.
///
/// Buckets are, in order: active guilds, inactive guilds, active chars,
/// inactive chars, ruins chars, ruins guilds.
fn classify<'c>(cohort: &MembershipCohort, buckets: [&'c mut Cohort; 6]) -> &'c mut Cohort {
    let [active_guilds, inactive_guilds, active_chars, inactive_chars, ruins_chars, ruins_guilds] =
        buckets;
    if cohort.is_ruins() {
        return match cohort.kind {
            OwnerKind::Character => ruins_chars,
            OwnerKind::Guild => ruins_guilds,
        };
    }
    let grouped = cohort.kind == OwnerKind::Guild && cohort.num_members > 1;
    match (grouped, cohort.is_active()) {
        (true, true) => active_guilds,
        (true, false) => inactive_guilds,
        (false, true) => active_chars,
        (false, false) => inactive_chars,
    }
}
