//! Tile aggregation and spatial consolidation.
//!
//! Building tiles are counted per root object (one row per structure carrying
//! its piece count). Every other positioned building row is a placeable and
//! counts as one unit. The two are tallied separately because callers weight
//! them with different multipliers.

use std::collections::{BTreeMap, HashSet};

use exiles_db::{PositionedObjectRow, queries};
use exiles_model::{
    ConsolidatedCluster, ObjectId, OwnerId, RoundingMode, TileKind, TileRecord, TileSplit,
    simplify_class_name,
};

use crate::context::Context;
use crate::error::EngineError;
use crate::settings::ConsistencyCheck;

/// Multipliers and rounding for a tile tally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileOptions {
    /// Weight of one building piece.
    pub building_mult: f64,
    /// Weight of one placeable.
    pub placeable_mult: f64,
    /// Round totals to whole numbers; `None` keeps fractional values.
    pub rounding: Option<RoundingMode>,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            building_mult: 1.0,
            placeable_mult: 1.0,
            rounding: Some(RoundingMode::default()),
        }
    }
}

impl TileOptions {
    /// Unit multipliers without rounding.
    pub fn unrounded() -> Self {
        Self {
            rounding: None,
            ..Self::default()
        }
    }

    pub fn with_multipliers(mut self, building_mult: f64, placeable_mult: f64) -> Self {
        self.building_mult = building_mult;
        self.placeable_mult = placeable_mult;
        self
    }

    pub fn with_rounding(mut self, rounding: Option<RoundingMode>) -> Self {
        self.rounding = rounding;
        self
    }

    fn validate(&self) -> Result<(), EngineError> {
        for (name, value) in [
            ("building multiplier", self.building_mult),
            ("placeable multiplier", self.placeable_mult),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::invalid_input(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn round(&self, value: f64) -> f64 {
        match self.rounding {
            Some(mode) => mode.round(value),
            None => value,
        }
    }
}

/// Aggregates building and placeable rows into per-owner tallies.
pub struct TilesManager<'a> {
    ctx: &'a Context,
}

impl<'a> TilesManager<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// One record per root building and per placeable, optionally for a
    /// single owner. Amounts are weighted but never rounded.
    pub fn tile_records(
        &self,
        owner_id: Option<OwnerId>,
        options: &TileOptions,
    ) -> Result<Vec<TileRecord>, EngineError> {
        options.validate()?;
        self.check_consistency()?;

        let conn = self.ctx.game();
        let mut records = Vec::new();
        let mut root = HashSet::new();

        for row in queries::root_buildings(conn, owner_id)? {
            records.push(TileRecord {
                owner_id: row.owner_id,
                object_id: row.object_id,
                amount: row.piece_count as f64 * options.building_mult,
                kind: TileKind::Building,
            });
            root.insert(row.object_id);
        }
        let num_roots = records.len();

        for row in queries::positioned_buildings(conn, owner_id)? {
            if root.contains(&row.object_id) {
                continue;
            }
            records.push(TileRecord {
                owner_id: row.owner_id,
                object_id: row.object_id,
                amount: options.placeable_mult,
                kind: TileKind::Placeable,
            });
        }

        log::debug!(
            "Collected {} root buildings and {} placeables",
            num_roots,
            records.len() - num_roots,
        );
        Ok(records)
    }

    /// Building and placeable sub-totals per owner.
    ///
    /// With rounding enabled each sub-total is rounded on its own.
    pub fn tiles_by_owner_split(
        &self,
        options: &TileOptions,
    ) -> Result<BTreeMap<OwnerId, TileSplit>, EngineError> {
        let mut tally = split_records(&self.tile_records(None, options)?);
        for split in tally.values_mut() {
            split.buildings = options.round(split.buildings);
            split.placeables = options.round(split.placeables);
        }
        Ok(tally)
    }

    /// Combined tile total per owner.
    pub fn tiles_by_owner(
        &self,
        options: &TileOptions,
    ) -> Result<BTreeMap<OwnerId, f64>, EngineError> {
        let tally = split_records(&self.tile_records(None, options)?);
        Ok(tally
            .into_iter()
            .map(|(owner, split)| (owner, options.round(split.total())))
            .collect())
    }

    /// Merge nearby objects of the same owner into settlements.
    ///
    /// See [`consolidate`] for the merge policy.
    pub fn tiles_consolidated(
        &self,
        options: &TileOptions,
        min_dist: f64,
    ) -> Result<BTreeMap<ObjectId, ConsolidatedCluster>, EngineError> {
        options.validate()?;
        if !min_dist.is_finite() || min_dist < 0.0 {
            return Err(EngineError::invalid_input(format!(
                "min_dist must be a non-negative number, got {min_dist}"
            )));
        }
        self.check_consistency()?;

        let conn = self.ctx.game();
        let mut objects = Vec::new();
        let mut root = HashSet::new();

        for row in queries::root_building_positions(conn)? {
            let tiles = row.piece_count.unwrap_or(0) as f64 * options.building_mult;
            root.insert(row.object_id);
            objects.push(cluster_from_row(row, tiles));
        }
        for row in queries::positioned_building_details(conn)? {
            if root.contains(&row.object_id) {
                continue;
            }
            objects.push(cluster_from_row(row, options.placeable_mult));
        }

        let num_objects = objects.len();
        let clusters = consolidate(objects, min_dist);
        log::debug!(
            "Consolidated {} objects into {} clusters (min_dist {})",
            num_objects,
            clusters.len(),
            min_dist,
        );

        Ok(clusters
            .into_iter()
            .map(|mut cluster| {
                cluster.tiles = options.round(cluster.tiles);
                cluster.sum_tiles = options.round(cluster.sum_tiles);
                (cluster.object_id, cluster)
            })
            .collect())
    }

    fn check_consistency(&self) -> Result<(), EngineError> {
        let mode = self.ctx.settings().consistency;
        if mode == ConsistencyCheck::Ignore {
            return Ok(());
        }
        let count = queries::orphan_instance_count(self.ctx.game())?;
        if count == 0 {
            return Ok(());
        }
        match mode {
            ConsistencyCheck::Strict => Err(EngineError::Inconsistent { count }),
            _ => {
                log::warn!(
                    "{} building instance object(s) have no building row and are not counted",
                    count
                );
                Ok(())
            }
        }
    }
}

fn split_records(records: &[TileRecord]) -> BTreeMap<OwnerId, TileSplit> {
    let mut tally: BTreeMap<OwnerId, TileSplit> = BTreeMap::new();
    for record in records {
        let split = tally.entry(record.owner_id).or_default();
        match record.kind {
            TileKind::Building => split.buildings += record.amount,
            TileKind::Placeable => split.placeables += record.amount,
        }
    }
    tally
}

fn cluster_from_row(row: PositionedObjectRow, tiles: f64) -> ConsolidatedCluster {
    ConsolidatedCluster {
        object_id: row.object_id,
        x: row.x,
        y: row.y,
        z: row.z,
        class_name: simplify_class_name(&row.class).to_string(),
        owner_id: row.owner_id,
        tiles,
        sum_tiles: 0.0,
    }
}

fn distance(a: &ConsolidatedCluster, b: &ConsolidatedCluster) -> f64 {
    let (dx, dy, dz) = (a.x - b.x, a.y - b.y, a.z - b.z);
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Greedy, order-dependent settlement merge.
///
/// Per owner, objects are visited in input order. Each object not yet merged
/// becomes a representative and absorbs every later, unmerged object of the
/// same owner within `min_dist` (inclusive) of the representative's own
/// position. Representatives are never compared with each other, so two
/// clusters may end up closer than `min_dist`. This is not connected
/// components; reported settlement counts depend on exactly this policy.
///
/// Every returned cluster carries its owner's total in `sum_tiles`.
pub fn consolidate(objects: Vec<ConsolidatedCluster>, min_dist: f64) -> Vec<ConsolidatedCluster> {
    let mut by_owner: BTreeMap<OwnerId, Vec<ConsolidatedCluster>> = BTreeMap::new();
    for object in objects {
        by_owner.entry(object.owner_id).or_default().push(object);
    }

    let mut result = Vec::new();
    for (_, list) in by_owner {
        let mut merged = vec![false; list.len()];
        let mut clusters = Vec::new();

        for i in 0..list.len() {
            if merged[i] {
                continue;
            }
            let mut representative = list[i].clone();
            for j in (i + 1)..list.len() {
                if !merged[j] && distance(&list[i], &list[j]) <= min_dist {
                    representative.tiles += list[j].tiles;
                    merged[j] = true;
                }
            }
            clusters.push(representative);
        }

        let sum_tiles: f64 = clusters.iter().map(|c| c.tiles).sum();
        for cluster in &mut clusters {
            cluster.sum_tiles = sum_tiles;
        }
        result.extend(clusters);
    }
    result
}
