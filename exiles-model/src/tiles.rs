//! Tile records, clusters and membership cohorts.
//!
//! These are the value types produced by the aggregation engine. None of
//! them are persisted; they are rebuilt from the database on every query.

use serde::{Deserialize, Serialize};

use crate::player::ModelError;
use crate::types::{ObjectId, OwnerId, OwnerKind, is_ruins_name};

// ── Tiles ───────────────────────────────────────────────────────────────────

/// Whether a tile record is an aggregated building or a single placeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    Building,
    Placeable,
}

/// One aggregated pile of building pieces or one freestanding placeable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileRecord {
    pub owner_id: OwnerId,
    pub object_id: ObjectId,
    /// Weighted tile count (piece count times the building multiplier, or the
    /// placeable multiplier).
    pub amount: f64,
    pub kind: TileKind,
}

/// Building and placeable sub-totals for one owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TileSplit {
    pub buildings: f64,
    pub placeables: f64,
}

impl TileSplit {
    pub fn total(&self) -> f64 {
        self.buildings + self.placeables
    }
}

/// A consolidated settlement: a representative object and everything merged
/// into it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidatedCluster {
    pub object_id: ObjectId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Class name with the namespace prefix removed.
    pub class_name: String,
    pub owner_id: OwnerId,
    /// Tiles of the representative plus all merged objects.
    pub tiles: f64,
    /// Sum of `tiles` over every cluster of the same owner.
    pub sum_tiles: f64,
}

/// Strip the asset namespace from a class path.
///
/// `/Game/Mods/Pack/BP_Wall.BP_Wall_C` becomes `BP_Wall_C`. Names without a
/// `.` are returned unchanged.
pub fn simplify_class_name(class: &str) -> &str {
    match class.split_once('.') {
        Some((_, rest)) => rest,
        None => class,
    }
}

// ── Rounding ────────────────────────────────────────────────────────────────

/// How fractional tile totals are rounded to whole numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingMode {
    /// Ties go to the even neighbour: 0.5 → 0, 1.5 → 2, 2.5 → 2.
    #[default]
    HalfEven,
    /// Ties go away from zero: 0.5 → 1, 1.5 → 2, 2.5 → 3.
    HalfAwayFromZero,
}

impl RoundingMode {
    pub fn round(&self, value: f64) -> f64 {
        match self {
            Self::HalfEven => value.round_ties_even(),
            Self::HalfAwayFromZero => value.round(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HalfEven => "half-even",
            Self::HalfAwayFromZero => "half-away-from-zero",
        }
    }
}

impl std::str::FromStr for RoundingMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "half-even" | "even" | "bankers" => Ok(Self::HalfEven),
            "half-away-from-zero" | "away" | "half-up" => Ok(Self::HalfAwayFromZero),
            other => Err(ModelError::UnknownRoundingMode(other.to_string())),
        }
    }
}

// ── Membership ──────────────────────────────────────────────────────────────

/// Member counts for one owner.
///
/// Characters without a guild form one-member cohorts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipCohort {
    pub name: String,
    pub kind: OwnerKind,
    pub num_members: u32,
    /// `None` when no activity threshold was requested.
    pub num_active_members: Option<u32>,
}

impl MembershipCohort {
    pub fn is_active(&self) -> bool {
        self.num_active_members.unwrap_or(0) > 0
    }

    pub fn is_ruins(&self) -> bool {
        is_ruins_name(&self.name)
    }
}
