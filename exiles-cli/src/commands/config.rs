use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use exiles_lib::Settings;
use exiles_lib::settings::{save_saved_dir, settings_path};

use super::or_dash;
use crate::CliError;

/// Show the resolved settings.
pub(crate) fn run_config_show(saved_dir: Option<PathBuf>) -> Result<(), CliError> {
    let path = settings_path();
    let settings = Settings::load(saved_dir)?;

    log::info!(
        "{}",
        "Settings".if_supports_color(Stdout, |t| t.bold()),
    );
    let status = if path.exists() { "(exists)" } else { "(not found)" };
    log::info!(
        "  Settings file: {} {}",
        path.display().if_supports_color(Stdout, |t| t.cyan()),
        status.if_supports_color(Stdout, |t| t.dimmed()),
    );
    crate::log_blank();
    log::info!(
        "  saved_dir:     {}",
        or_dash(settings.saved_dir.as_ref().map(|p| p.display()))
    );
    log::info!("  rounding:      {}", settings.rounding.as_str());
    log::info!("  consistency:   {:?}", settings.consistency);
    log::info!("  min_dist:      {}", settings.min_dist);
    log::info!("  ruins_clan_id: {}", settings.ruins_clan_id);
    Ok(())
}

/// Store or clear the saved directory in the settings file.
pub(crate) fn run_config_saved_dir(dir: Option<PathBuf>) -> Result<(), CliError> {
    save_saved_dir(dir.as_deref())?;
    match dir {
        Some(dir) => log::info!(
            "{} saved_dir set to {}",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            dir.display(),
        ),
        None => log::info!(
            "{} saved_dir cleared",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        ),
    }
    Ok(())
}

/// Print the settings file path.
pub(crate) fn run_config_path() {
    println!("{}", settings_path().display());
}
