use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use exiles_lib::{Stats, TileStatistics};

use super::{format_tiles, or_dash, threshold_from_days};
use crate::CliError;

pub(crate) fn run_stats(
    saved_dir: Option<PathBuf>,
    threshold_days: i64,
    full: bool,
    json: bool,
) -> Result<(), CliError> {
    let threshold = threshold_from_days(threshold_days)?;
    let ctx = crate::open_context(saved_dir)?;
    let stats = Stats::new(&ctx).tile_statistics(threshold, None, full)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    print_stats(&stats, threshold_days);
    Ok(())
}

fn print_stats(stats: &TileStatistics, threshold_days: i64) {
    log::info!(
        "{}",
        "Server Census".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!(
        "  Database date: {}",
        or_dash(stats.db_date.map(|d| d.format("%Y-%m-%d %H:%M UTC")))
    );
    log::info!("  Inactive after: {} days", threshold_days);
    crate::log_blank();

    log::info!("  Tiles:            {:>8}", format_tiles(stats.num_tiles));
    log::info!("    Building:       {:>8}", format_tiles(stats.num_building_tiles));
    log::info!("    Placeables:     {:>8}", format_tiles(stats.num_placeables));
    log::info!("  Logins (24h):     {:>8}", stats.num_logins_24h);
    log::info!("  Empty guilds:     {:>8}", stats.num_empty_guilds);
    crate::log_blank();

    log::info!(
        "  {:<18} {:>7} {:>8} {:>9} {:>8} {:>8}",
        "Cohort".if_supports_color(Stdout, |t| t.bold()),
        "Owners",
        "Members",
        "Tiles",
        "Mean",
        "Median",
    );
    cohort_row(
        "Active guilds",
        stats.num_active_guilds,
        Some(stats.num_active_guild_members),
        stats.tiles_active_guilds,
        stats.mean_tiles_active_guilds,
        stats.median_tiles_active_guilds,
    );
    cohort_row(
        "Inactive guilds",
        stats.num_inactive_guilds,
        Some(stats.num_inactive_guild_members),
        stats.tiles_inactive_guilds,
        stats.mean_tiles_inactive_guilds,
        stats.median_tiles_inactive_guilds,
    );
    cohort_row(
        "Active chars",
        stats.num_active_chars,
        None,
        stats.tiles_active_chars,
        stats.mean_tiles_active_chars,
        stats.median_tiles_active_chars,
    );
    cohort_row(
        "Inactive chars",
        stats.num_inactive_chars,
        None,
        stats.tiles_inactive_chars,
        stats.mean_tiles_inactive_chars,
        stats.median_tiles_inactive_chars,
    );
    cohort_row("Ruins", stats.num_ruins, None, stats.tiles_ruins, None, None);
    cohort_row(
        "No owner",
        stats.num_no_owners,
        None,
        stats.tiles_no_owner,
        None,
        None,
    );

    if stats.total_wealth > 0.0 {
        crate::log_blank();
        log::info!("  Wealth:           {:>10.0}", stats.total_wealth);
        log::info!("    Characters:     {:>10.0}", stats.character_wealth);
        log::info!("    Guilds:         {:>10.0}", stats.guild_wealth);
    }
}

fn cohort_row(
    label: &str,
    owners: usize,
    members: Option<u32>,
    tiles: f64,
    mean: Option<f64>,
    median: Option<f64>,
) {
    log::info!(
        "  {:<18} {:>7} {:>8} {:>9} {:>8} {:>8}",
        label,
        owners,
        or_dash(members),
        format_tiles(tiles),
        or_dash(mean.map(|m| format!("{:.1}", m))),
        or_dash(median.map(|m| format!("{:.1}", m))),
    );
}
