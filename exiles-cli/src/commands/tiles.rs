use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use exiles_lib::{TileOptions, TilesManager};

use super::format_tiles;
use crate::CliError;

pub(crate) struct TilesArgs {
    pub consolidate: bool,
    pub min_dist: Option<f64>,
    pub building_mult: f64,
    pub placeable_mult: f64,
    pub no_round: bool,
}

pub(crate) fn run_tiles(saved_dir: Option<PathBuf>, args: TilesArgs) -> Result<(), CliError> {
    if args.min_dist.is_some() && !args.consolidate {
        return Err(CliError::invalid_args("--min-dist requires --consolidate"));
    }

    let ctx = crate::open_context(saved_dir)?;
    let rounding = (!args.no_round).then_some(ctx.settings().rounding);
    let options = TileOptions::default()
        .with_multipliers(args.building_mult, args.placeable_mult)
        .with_rounding(rounding);
    let manager = TilesManager::new(&ctx);

    if args.consolidate {
        let min_dist = args.min_dist.unwrap_or(ctx.settings().min_dist);
        let clusters = manager.tiles_consolidated(&options, min_dist)?;

        log::info!(
            "{}",
            format!("Settlements (min distance {})", min_dist)
                .if_supports_color(Stdout, |t| t.bold()),
        );
        log::info!(
            "  {:>12} {:>10} {:>8} {:>8}  {:<32} {:>12} {:>12} {:>12}",
            "Object",
            "Owner",
            "Tiles",
            "Sum",
            "Class",
            "X",
            "Y",
            "Z",
        );
        for cluster in clusters.values() {
            log::info!(
                "  {:>12} {:>10} {:>8} {:>8}  {:<32} {:>12.0} {:>12.0} {:>12.0}",
                cluster.object_id,
                cluster.owner_id,
                format_tiles(cluster.tiles),
                format_tiles(cluster.sum_tiles),
                cluster.class_name,
                cluster.x,
                cluster.y,
                cluster.z,
            );
        }
        crate::log_blank();
        log::info!("Total: {} settlements", clusters.len());
        return Ok(());
    }

    let split = manager.tiles_by_owner_split(&options)?;
    let totals = manager.tiles_by_owner(&options)?;

    log::info!(
        "{}",
        "Tiles by owner".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!(
        "  {:>10} {:>10} {:>10} {:>10}",
        "Owner",
        "Buildings",
        "Placeables",
        "Total"
    );
    for (owner_id, total) in &totals {
        let (buildings, placeables) = split
            .get(owner_id)
            .map(|s| (s.buildings, s.placeables))
            .unwrap_or_default();
        log::info!(
            "  {:>10} {:>10} {:>10} {:>10}",
            owner_id,
            format_tiles(buildings),
            format_tiles(placeables),
            format_tiles(*total),
        );
    }
    crate::log_blank();
    log::info!(
        "Total: {} owners, {} tiles",
        totals.len(),
        format_tiles(totals.values().sum())
    );
    Ok(())
}
