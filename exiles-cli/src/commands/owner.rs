use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use exiles_lib::{NameQuery, OwnerLookup, TileOptions};
use exiles_model::{Owner, OwnerKind, Slot};

use super::{format_tiles, or_dash};
use crate::CliError;

pub(crate) fn run_owner(
    saved_dir: Option<PathBuf>,
    id: Option<i64>,
    name: Option<String>,
    strict: bool,
) -> Result<(), CliError> {
    let ctx = crate::open_context(saved_dir)?;
    let lookup = OwnerLookup::new(&ctx);

    let owners = match (id, name) {
        (Some(id), _) => match lookup.get(id)? {
            Some(owner) => vec![owner],
            None => return Err(CliError::not_found(format!("no owner with id {}", id))),
        },
        (None, Some(name)) => {
            let mut query = NameQuery::default();
            query.matching.strict = strict;
            lookup.get_by_name(&name, &query)?
        }
        (None, None) => return Err(CliError::invalid_args("pass an owner id or --name")),
    };

    if owners.is_empty() {
        log::warn!("No matching owners.");
        return Ok(());
    }

    let options = TileOptions::default().with_rounding(Some(ctx.settings().rounding));
    for (i, owner) in owners.iter().enumerate() {
        if i > 0 {
            crate::log_blank();
        }
        let tiles = lookup.num_tiles(owner.id(), &options)?;
        print_owner(owner, tiles);
    }
    Ok(())
}

fn print_owner(owner: &Owner, tiles: f64) {
    let kind = match owner.kind() {
        OwnerKind::Character => "character",
        OwnerKind::Guild => "guild",
    };
    log::info!(
        "{} {}",
        owner.name().if_supports_color(Stdout, |t| t.bold()),
        format!("({} {})", kind, owner.id()).if_supports_color(Stdout, |t| t.dimmed()),
    );
    log::info!(
        "  Last login: {}",
        or_dash(owner.last_login().map(|d| d.format("%Y-%m-%d %H:%M UTC")))
    );
    log::info!("  Tiles:      {}", format_tiles(tiles));
    if owner.is_ruins() {
        log::info!(
            "  {}",
            "Ruins placeholder, excluded from activity cohorts"
                .if_supports_color(Stdout, |t| t.yellow()),
        );
    }

    match owner {
        Owner::Character(c) => {
            log::info!("  Player:     {}", c.player_id);
            if let Slot::Alternate(slot) = c.slot() {
                log::info!("  Slot:       {}", slot);
            }
            log::info!("  Level:      {}", c.level);
            log::info!("  Guild:      {}", or_dash(c.guild_id));
            if let Some(rank) = c.rank_name() {
                log::info!("  Rank:       {}", rank.as_str());
            }
        }
        Owner::Guild(g) => {
            log::info!("  Members:    {}", g.members.len());
            for member in g.members.iter() {
                log::info!(
                    "    {:<32} {}",
                    member.name,
                    or_dash(member.rank_name().map(|r| r.as_str())),
                );
            }
        }
    }
}
