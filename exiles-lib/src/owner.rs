//! Owner lookups and per-owner tile counts.

use exiles_db::{NameMatch, queries};
use exiles_model::{CharList, Owner, OwnerId, OwnerKind, SteamId, TileRecord};

use crate::context::Context;
use crate::error::EngineError;
use crate::tiles::{TileOptions, TilesManager};

/// Filters for [`OwnerLookup::get_by_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameQuery {
    pub matching: NameMatch,
    pub include_chars: bool,
    pub include_guilds: bool,
}

impl Default for NameQuery {
    fn default() -> Self {
        Self {
            matching: NameMatch {
                strict: false,
                case_insensitive: true,
            },
            include_chars: true,
            include_guilds: true,
        }
    }
}

/// Resolves owner ids and names against the game database.
pub struct OwnerLookup<'a> {
    ctx: &'a Context,
}

impl<'a> OwnerLookup<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    pub fn exists(&self, id: OwnerId) -> Result<bool, EngineError> {
        Ok(queries::owner_exists(self.ctx.game(), id)?)
    }

    /// Resolve an id, preferring a guild over a character with the same id.
    pub fn get(&self, id: OwnerId) -> Result<Option<Owner>, EngineError> {
        let conn = self.ctx.game();
        let guild = queries::find_guild(conn, id)?;
        let character = queries::find_character(conn, id)?;
        Ok(match (guild, character) {
            (Some(guild), Some(character)) => {
                log::warn!(
                    "Owner id {} matches guild '{}' and character '{}', using the guild",
                    id,
                    guild.name,
                    character.name
                );
                Some(Owner::Guild(guild))
            }
            (Some(guild), None) => Some(Owner::Guild(guild)),
            (None, Some(character)) => Some(Owner::Character(character)),
            (None, None) => None,
        })
    }

    /// Resolve an id as a specific kind of owner.
    pub fn get_as(&self, id: OwnerId, kind: OwnerKind) -> Result<Option<Owner>, EngineError> {
        let conn = self.ctx.game();
        Ok(match kind {
            OwnerKind::Guild => queries::find_guild(conn, id)?.map(Owner::Guild),
            OwnerKind::Character => queries::find_character(conn, id)?.map(Owner::Character),
        })
    }

    /// Owners whose name matches. Characters come before guilds.
    pub fn get_by_name(&self, name: &str, query: &NameQuery) -> Result<Vec<Owner>, EngineError> {
        let conn = self.ctx.game();
        let mut owners = Vec::new();
        if query.include_chars {
            owners.extend(
                queries::find_characters_by_name(conn, name, query.matching)?
                    .into_iter()
                    .map(Owner::Character),
            );
        }
        if query.include_guilds {
            owners.extend(
                queries::find_guilds_by_name(conn, name, query.matching)?
                    .into_iter()
                    .map(Owner::Guild),
            );
        }
        Ok(owners)
    }

    /// Every character slot of one player.
    pub fn player_characters(&self, steam_id: &SteamId) -> Result<CharList, EngineError> {
        let chars = queries::characters_for_player(self.ctx.game(), steam_id)?;
        Ok(CharList::new(chars))
    }

    /// Tile records of one owner, identical to its share of the global tally.
    pub fn tiles(&self, id: OwnerId, options: &TileOptions) -> Result<Vec<TileRecord>, EngineError> {
        TilesManager::new(self.ctx).tile_records(Some(id), options)
    }

    pub fn num_tiles(&self, id: OwnerId, options: &TileOptions) -> Result<f64, EngineError> {
        let sum: f64 = self.tiles(id, options)?.iter().map(|r| r.amount).sum();
        Ok(options.round(sum))
    }

    /// Whether the owner holds at least one building row, placed or not.
    pub fn has_tiles(&self, id: OwnerId) -> Result<bool, EngineError> {
        Ok(queries::owner_has_buildings(self.ctx.game(), id)?)
    }
}
