//! Engine context: database handles and settings for one aggregation run.

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::error::EngineError;
use crate::settings::Settings;

/// Read handles and settings passed into every aggregation call.
///
/// This is the main entry point for using the library. Open a context from
/// [`Settings`], then hand it to [`TilesManager`](crate::TilesManager),
/// [`MembersManager`](crate::MembersManager) or [`Stats`](crate::Stats).
pub struct Context {
    game: Connection,
    supplemental: Option<Connection>,
    settings: Settings,
}

impl Context {
    /// Wrap an already open game database.
    pub fn new(game: Connection, settings: Settings) -> Self {
        Self {
            game,
            supplemental: None,
            settings,
        }
    }

    /// Attach the supplemental database.
    pub fn with_supplemental(mut self, supplemental: Connection) -> Self {
        self.supplemental = Some(supplemental);
        self
    }

    /// Open `game.db` read-only and `supplemental.db` from the saved directory.
    pub fn open(settings: Settings) -> Result<Self, EngineError> {
        let game_path = settings.game_db_path()?;
        let supplemental_path = settings.supplemental_db_path()?;
        log::debug!("Opening game database at {}", game_path.display());
        let game = exiles_db::open_game_database(&game_path)?;
        let supplemental = exiles_db::open_supplemental_database(&supplemental_path)?;
        Ok(Self::new(game, settings).with_supplemental(supplemental))
    }

    pub fn game(&self) -> &Connection {
        &self.game
    }

    pub fn supplemental(&self) -> Result<&Connection, EngineError> {
        self.supplemental.as_ref().ok_or(EngineError::NoSupplemental)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The dataset's notion of "now": the latest character login strictly
    /// before the wall clock.
    pub fn dataset_now(&self) -> Result<Option<DateTime<Utc>>, EngineError> {
        let latest = exiles_db::latest_login_before(&self.game, Utc::now().timestamp())?;
        Ok(latest.and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)))
    }

    /// Resolve an optional reference time, defaulting to the dataset "now"
    /// and, for a dataset without logins, to the wall clock.
    pub fn reference_time(
        &self,
        given: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>, EngineError> {
        if let Some(reference) = given {
            return Ok(reference);
        }
        Ok(self.dataset_now()?.unwrap_or_else(Utc::now))
    }
}
