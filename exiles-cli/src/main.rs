//! exiles CLI
//!
//! Command-line census and maintenance tool for a game server's save
//! databases.

mod commands;
mod error;

use std::io::Write;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use exiles_lib::{Context, Settings};

pub(crate) use error::CliError;

#[derive(Parser)]
#[command(name = "exiles")]
#[command(about = "Census and cache tool for game server save databases", long_about = None)]
struct Cli {
    /// Directory holding game.db and supplemental.db (overrides SAVED_DIR_PATH)
    #[arg(short, long, global = true)]
    saved_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the server census: tiles, activity cohorts, logins and wealth
    Stats {
        /// Days without login after which an owner counts as inactive
        #[arg(short, long, default_value_t = 30)]
        threshold_days: i64,

        /// Include per-owner tile mappings
        #[arg(long)]
        full: bool,

        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print tile counts per owner
    Tiles {
        /// Merge nearby objects of the same owner into settlements
        #[arg(short, long)]
        consolidate: bool,

        /// Merge distance for --consolidate (default from settings)
        #[arg(long)]
        min_dist: Option<f64>,

        /// Weight of one building piece
        #[arg(long, default_value_t = 1.0)]
        building_mult: f64,

        /// Weight of one placeable
        #[arg(long, default_value_t = 1.0)]
        placeable_mult: f64,

        /// Keep fractional tile counts
        #[arg(long)]
        no_round: bool,
    },

    /// Print member and active-member counts per owner
    Members {
        /// Count members who logged in within this many days as active
        #[arg(short, long)]
        threshold_days: Option<i64>,

        /// Include owners without buildings
        #[arg(short, long)]
        all: bool,
    },

    /// Look up an owner by id or name
    Owner {
        /// Character or guild id
        id: Option<i64>,

        /// Search by name instead of id
        #[arg(short, long, conflicts_with = "id")]
        name: Option<String>,

        /// Match the whole name instead of a substring
        #[arg(long)]
        strict: bool,
    },

    /// Refresh the supplemental caches
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show or change the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Store the current name of every character and guild
    Owners,

    /// Record buildings whose owner is unknown
    Objects,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the resolved settings
    Show,

    /// Store the saved directory in the settings file
    SetSavedDir {
        /// Directory holding game.db
        path: PathBuf,
    },

    /// Remove the saved directory from the settings file
    ClearSavedDir,

    /// Print the settings file path
    Path,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Stats {
            threshold_days,
            full,
            json,
        } => commands::stats::run_stats(cli.saved_dir, threshold_days, full, json),
        Commands::Tiles {
            consolidate,
            min_dist,
            building_mult,
            placeable_mult,
            no_round,
        } => commands::tiles::run_tiles(
            cli.saved_dir,
            commands::tiles::TilesArgs {
                consolidate,
                min_dist,
                building_mult,
                placeable_mult,
                no_round,
            },
        ),
        Commands::Members {
            threshold_days,
            all,
        } => commands::members::run_members(cli.saved_dir, threshold_days, all),
        Commands::Owner { id, name, strict } => {
            commands::owner::run_owner(cli.saved_dir, id, name, strict)
        }
        Commands::Cache { action } => match action {
            CacheAction::Owners => commands::cache::run_cache_owners(cli.saved_dir),
            CacheAction::Objects => commands::cache::run_cache_objects(cli.saved_dir),
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::run_config_show(cli.saved_dir),
            ConfigAction::SetSavedDir { path } => commands::config::run_config_saved_dir(Some(path)),
            ConfigAction::ClearSavedDir => commands::config::run_config_saved_dir(None),
            ConfigAction::Path => {
                commands::config::run_config_path();
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

/// Route log records to stderr. Info records print bare, as command output.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| match record.level() {
            log::Level::Info => writeln!(buf, "{}", record.args()),
            level => writeln!(buf, "[{}] {}", level, record.args()),
        })
        .init();
}

/// Print an empty line through the logger.
pub(crate) fn log_blank() {
    log::info!("");
}

/// Resolve settings and open both databases.
pub(crate) fn open_context(saved_dir: Option<PathBuf>) -> Result<Context, CliError> {
    let settings = Settings::load(saved_dir)?;
    Ok(Context::open(settings)?)
}
