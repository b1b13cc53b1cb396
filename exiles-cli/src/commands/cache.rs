use std::path::PathBuf;

use chrono::Utc;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use exiles_lib::{ObjectsCache, OwnersCache};

use crate::CliError;

/// Refresh the owner-name cache.
pub(crate) fn run_cache_owners(saved_dir: Option<PathBuf>) -> Result<(), CliError> {
    let ctx = crate::open_context(saved_dir)?;
    let stats = OwnersCache::refresh(&ctx)?;
    log::info!(
        "{} Owner names cached: {} new, {} renamed, {} unchanged",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        stats.inserted,
        stats.updated,
        stats.unchanged,
    );
    Ok(())
}

/// Refresh the unknown-owner object cache.
pub(crate) fn run_cache_objects(saved_dir: Option<PathBuf>) -> Result<(), CliError> {
    let ctx = crate::open_context(saved_dir)?;
    let stats = ObjectsCache::refresh(&ctx, Utc::now())?;
    log::info!(
        "{} Unknown-owner objects: {} new, {} resolved, {} still unknown",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        stats.inserted,
        stats.removed,
        stats.kept,
    );
    Ok(())
}
