//! Shared settings: where the databases live and how the engine behaves.
//!
//! The settings file is `~/.config/exiles/settings.toml`. Values resolve in
//! priority order: CLI override > environment variable > settings file >
//! built-in default.

use std::io;
use std::path::{Path, PathBuf};

use exiles_model::{ModelError, OwnerId, RUINS_CLAN_ID, RoundingMode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default consolidation distance in world units.
pub const DEFAULT_MIN_DIST: f64 = 50_000.0;

const GAME_DB_FILE: &str = "game.db";
const SUPPLEMENTAL_DB_FILE: &str = "supplemental.db";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error reading {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("TOML parse error in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid value for {var}: {source}")]
    Env { var: &'static str, source: ModelError },
    #[error("Invalid value for {var}: '{value}'")]
    EnvValue { var: &'static str, value: String },
    #[error("No saved directory configured. Set SAVED_DIR_PATH or pass --saved-dir")]
    MissingSavedDir,
}

/// What to do when the instance index references objects without a
/// building row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyCheck {
    /// Skip the check.
    Ignore,
    /// Log a warning and continue.
    #[default]
    Warn,
    /// Fail the aggregation.
    Strict,
}

impl std::str::FromStr for ConsistencyCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ignore" | "off" => Ok(Self::Ignore),
            "warn" => Ok(Self::Warn),
            "strict" | "error" => Ok(Self::Strict),
            other => Err(other.to_string()),
        }
    }
}

/// Resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Directory holding `game.db` and `supplemental.db`.
    pub saved_dir: Option<PathBuf>,
    pub rounding: RoundingMode,
    pub consistency: ConsistencyCheck,
    pub min_dist: f64,
    pub ruins_clan_id: OwnerId,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            saved_dir: None,
            rounding: RoundingMode::default(),
            consistency: ConsistencyCheck::default(),
            min_dist: DEFAULT_MIN_DIST,
            ruins_clan_id: RUINS_CLAN_ID,
        }
    }
}

/// TOML settings file format.
#[derive(Debug, Default, Deserialize, Serialize)]
struct SettingsFile {
    database: Option<DatabaseSection>,
    engine: Option<EngineSection>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct DatabaseSection {
    saved_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct EngineSection {
    rounding: Option<RoundingMode>,
    consistency: Option<ConsistencyCheck>,
    min_dist: Option<f64>,
    ruins_clan_id: Option<OwnerId>,
}

/// Canonical path to the settings file: `~/.config/exiles/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("exiles").join("settings.toml")
}

impl Settings {
    /// Load settings from the environment and the default settings file.
    pub fn load(saved_dir_override: Option<PathBuf>) -> Result<Self, SettingsError> {
        Self::load_from(&settings_path(), saved_dir_override)
    }

    /// Load settings from the environment and a specific settings file.
    ///
    /// A missing file is not an error.
    pub fn load_from(
        path: &Path,
        saved_dir_override: Option<PathBuf>,
    ) -> Result<Self, SettingsError> {
        let file = read_settings_file(path)?;
        resolve(saved_dir_override, |var| std::env::var(var).ok(), file)
    }

    /// Parse settings from TOML text without consulting the environment.
    pub fn from_toml_str(contents: &str) -> Result<Self, SettingsError> {
        let file: SettingsFile = toml::from_str(contents).map_err(|e| SettingsError::Parse {
            path: "<string>".to_string(),
            source: e,
        })?;
        resolve(None, |_| None, file)
    }

    pub fn saved_dir(&self) -> Result<&Path, SettingsError> {
        self.saved_dir
            .as_deref()
            .ok_or(SettingsError::MissingSavedDir)
    }

    pub fn game_db_path(&self) -> Result<PathBuf, SettingsError> {
        Ok(self.saved_dir()?.join(GAME_DB_FILE))
    }

    pub fn supplemental_db_path(&self) -> Result<PathBuf, SettingsError> {
        Ok(self.saved_dir()?.join(SUPPLEMENTAL_DB_FILE))
    }
}

fn read_settings_file(path: &Path) -> Result<SettingsFile, SettingsError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SettingsFile::default()),
        Err(e) => {
            return Err(SettingsError::Io {
                path: path.display().to_string(),
                source: e,
            });
        }
    };
    toml::from_str(&contents).map_err(|e| SettingsError::Parse {
        path: path.display().to_string(),
        source: e,
    })
}

fn resolve(
    saved_dir_override: Option<PathBuf>,
    env: impl Fn(&'static str) -> Option<String>,
    file: SettingsFile,
) -> Result<Settings, SettingsError> {
    let defaults = Settings::default();
    let database = file.database.unwrap_or_default();
    let engine = file.engine.unwrap_or_default();

    let saved_dir = saved_dir_override
        .or_else(|| env("SAVED_DIR_PATH").map(PathBuf::from))
        .or(database.saved_dir);

    let rounding = match env("EXILES_ROUNDING") {
        Some(value) => value.parse().map_err(|e| SettingsError::Env {
            var: "EXILES_ROUNDING",
            source: e,
        })?,
        None => engine.rounding.unwrap_or(defaults.rounding),
    };

    let consistency = match env("EXILES_CONSISTENCY") {
        Some(value) => value
            .parse()
            .map_err(|value| SettingsError::EnvValue {
                var: "EXILES_CONSISTENCY",
                value,
            })?,
        None => engine.consistency.unwrap_or(defaults.consistency),
    };

    Ok(Settings {
        saved_dir,
        rounding,
        consistency,
        min_dist: engine.min_dist.unwrap_or(defaults.min_dist),
        ruins_clan_id: engine.ruins_clan_id.unwrap_or(defaults.ruins_clan_id),
    })
}

/// Save (or clear) the saved directory in the default settings file.
pub fn save_saved_dir(dir: Option<&Path>) -> io::Result<()> {
    save_saved_dir_to(&settings_path(), dir)
}

/// Save (or clear) the saved directory in a specific settings file.
///
/// Uses `toml::Value` for a surgical update so the `[engine]` table is
/// preserved.
pub fn save_saved_dir_to(settings: &Path, dir: Option<&Path>) -> io::Result<()> {
    let mut doc: toml::Value = if let Ok(contents) = std::fs::read_to_string(settings) {
        contents
            .parse()
            .unwrap_or_else(|_| toml::Value::Table(Default::default()))
    } else {
        toml::Value::Table(Default::default())
    };

    let table = doc
        .as_table_mut()
        .ok_or_else(|| io::Error::other("settings.toml root is not a table"))?;
    let database = table
        .entry("database")
        .or_insert_with(|| toml::Value::Table(Default::default()));
    let db_table = database
        .as_table_mut()
        .ok_or_else(|| io::Error::other("[database] is not a table"))?;

    match dir {
        Some(p) => {
            db_table.insert(
                "saved_dir".to_string(),
                toml::Value::String(p.to_string_lossy().into_owned()),
            );
        }
        None => {
            db_table.remove("saved_dir");
        }
    }

    // Write atomically
    if let Some(parent) = settings.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(&doc).map_err(io::Error::other)?;
    let tmp = settings.with_extension("toml.tmp");
    std::fs::write(&tmp, &serialized)?;
    std::fs::rename(&tmp, settings)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let settings = resolve(None, |_| None, SettingsFile::default()).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(matches!(
            settings.game_db_path(),
            Err(SettingsError::MissingSavedDir)
        ));
    }

    #[test]
    fn file_values_are_used() {
        let settings = Settings::from_toml_str(
            r#"
            [database]
            saved_dir = "/srv/conan/Saved"

            [engine]
            rounding = "half-away-from-zero"
            consistency = "strict"
            min_dist = 1000.0
            ruins_clan_id = 12
            "#,
        )
        .unwrap();
        assert_eq!(
            settings.game_db_path().unwrap(),
            PathBuf::from("/srv/conan/Saved/game.db")
        );
        assert_eq!(
            settings.supplemental_db_path().unwrap(),
            PathBuf::from("/srv/conan/Saved/supplemental.db")
        );
        assert_eq!(settings.rounding, RoundingMode::HalfAwayFromZero);
        assert_eq!(settings.consistency, ConsistencyCheck::Strict);
        assert_eq!(settings.min_dist, 1000.0);
        assert_eq!(settings.ruins_clan_id, 12);
    }

    #[test]
    fn env_overrides_file_and_cli_overrides_env() {
        let file = SettingsFile {
            database: Some(DatabaseSection {
                saved_dir: Some(PathBuf::from("/from/file")),
            }),
            engine: None,
        };
        let env = |var: &'static str| match var {
            "SAVED_DIR_PATH" => Some("/from/env".to_string()),
            "EXILES_ROUNDING" => Some("away".to_string()),
            _ => None,
        };
        let settings = resolve(None, env, file).unwrap();
        assert_eq!(settings.saved_dir, Some(PathBuf::from("/from/env")));
        assert_eq!(settings.rounding, RoundingMode::HalfAwayFromZero);

        let settings = resolve(Some(PathBuf::from("/from/cli")), env, SettingsFile::default())
            .unwrap();
        assert_eq!(settings.saved_dir, Some(PathBuf::from("/from/cli")));
    }

    #[test]
    fn bad_env_value_is_rejected() {
        let env = |var: &'static str| (var == "EXILES_CONSISTENCY").then(|| "loud".to_string());
        let result = resolve(None, env, SettingsFile::default());
        assert!(matches!(result, Err(SettingsError::EnvValue { .. })));
    }

    #[test]
    fn save_preserves_engine_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exiles").join("settings.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[engine]\nmin_dist = 10.0\n").unwrap();

        save_saved_dir_to(&path, Some(Path::new("/srv/Saved"))).unwrap();
        let settings = Settings::load_from(&path, None).unwrap();
        assert_eq!(settings.min_dist, 10.0);

        save_saved_dir_to(&path, None).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("saved_dir"));
    }
}
