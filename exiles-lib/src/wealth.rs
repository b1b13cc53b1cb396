//! Wealth aggregation.
//!
//! Item values are decoded from property blobs elsewhere. This module only
//! needs a [`WealthSource`] that reports where each holding sits and folds
//! them into character and guild totals.

use std::collections::{BTreeMap, BTreeSet};

use exiles_db::queries;
use exiles_model::{ObjectId, OwnerId, OwnerKind};

use crate::context::Context;
use crate::error::EngineError;

/// Where a holding is stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldingLocation {
    /// A character's personal inventory.
    Character(OwnerId),
    /// A structure or thrall. `owner_id` is the decoded owner, if known;
    /// otherwise the owner comes from the `buildings` table.
    Object {
        object_id: ObjectId,
        owner_id: Option<OwnerId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Holding {
    pub location: HoldingLocation,
    pub amount: f64,
}

/// Supplier of holdings.
pub trait WealthSource {
    fn holdings(&self) -> Result<Vec<Holding>, EngineError>;
}

/// A source without holdings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWealth;

impl WealthSource for NoWealth {
    fn holdings(&self) -> Result<Vec<Holding>, EngineError> {
        Ok(Vec::new())
    }
}

impl WealthSource for Vec<Holding> {
    fn holdings(&self) -> Result<Vec<Holding>, EngineError> {
        Ok(self.clone())
    }
}

/// Wealth per character and per guild.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WealthTally {
    pub characters: BTreeMap<OwnerId, f64>,
    pub guilds: BTreeMap<OwnerId, f64>,
}

impl WealthTally {
    pub fn character_total(&self) -> f64 {
        self.characters.values().sum()
    }

    pub fn guild_total(&self) -> f64 {
        self.guilds.values().sum()
    }

    pub fn total(&self) -> f64 {
        self.character_total() + self.guild_total()
    }
}

/// Fold holdings into owner totals.
///
/// A character's wealth is its inventory plus everything in objects it owns.
/// A guild's wealth covers only objects the guild owns; members' personal
/// wealth stays with the members. Holdings of unknown owners are dropped.
pub fn tally_wealth(ctx: &Context, source: &dyn WealthSource) -> Result<WealthTally, EngineError> {
    let holdings = source.holdings()?;
    if holdings.is_empty() {
        return Ok(WealthTally::default());
    }

    let conn = ctx.game();
    let characters: BTreeSet<OwnerId> = queries::character_memberships(conn)?
        .into_iter()
        .map(|row| row.id)
        .collect();
    let guilds: BTreeSet<OwnerId> = queries::guild_member_counts(conn)?
        .into_iter()
        .map(|row| row.guild_id)
        .collect();
    let object_owners = queries::building_owners(conn)?;

    let mut tally = WealthTally::default();
    let mut dropped = 0usize;
    for holding in holdings {
        let target = match holding.location {
            HoldingLocation::Character(id) => {
                characters.contains(&id).then_some((OwnerKind::Character, id))
            }
            HoldingLocation::Object { object_id, owner_id } => owner_id
                .or_else(|| object_owners.get(&object_id).copied())
                .and_then(|id| {
                    if guilds.contains(&id) {
                        Some((OwnerKind::Guild, id))
                    } else if characters.contains(&id) {
                        Some((OwnerKind::Character, id))
                    } else {
                        None
                    }
                }),
        };
        match target {
            Some((OwnerKind::Character, id)) => {
                *tally.characters.entry(id).or_default() += holding.amount
            }
            Some((OwnerKind::Guild, id)) => *tally.guilds.entry(id).or_default() += holding.amount,
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        log::debug!("Dropped {} holdings without a known owner", dropped);
    }
    Ok(tally)
}
