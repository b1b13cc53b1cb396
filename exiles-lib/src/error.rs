use exiles_db::{OperationError, SchemaError};
use exiles_model::ModelError;
use thiserror::Error;

use crate::settings::SettingsError;

/// Errors that can occur while aggregating tiles, members or statistics.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A query against the game or supplemental database failed
    #[error("Database error: {0}")]
    Db(#[from] OperationError),

    /// A database could not be opened or migrated
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Settings could not be resolved
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Raw SQLite error outside the query layer
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A caller-supplied argument was rejected before any query ran
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The instance index references objects that have no building row
    #[error("{count} building instance object(s) have no matching building row")]
    Inconsistent { count: i64 },

    /// The operation needs the supplemental database, which is not open
    #[error("Supplemental database is not open")]
    NoSupplemental,

    /// Invalid model value
    #[error("{0}")]
    Model(#[from] ModelError),

    /// Wealth source failure
    #[error("Wealth source error: {0}")]
    Wealth(String),
}

impl EngineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn wealth(msg: impl Into<String>) -> Self {
        Self::Wealth(msg.into())
    }
}
