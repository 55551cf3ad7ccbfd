//! Settings for the application.
//!
//! Values come from an optional `settings.toml` (or the file passed with
//! `--config`), then from `BUDGETTRACKER_*` environment variables, using `__`
//! between nested keys: `BUDGETTRACKER_APP__LEVEL=debug`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("budgettracker.db".to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Session {
    pub path: String,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            path: "budgettracker_session.json".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub session: Session,
}

impl Settings {
    /// Load settings; an explicit `path` must exist, the default file may not.
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(
                File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(path.is_some()),
            )
            .add_source(
                Environment::with_prefix("BUDGETTRACKER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn database_url(&self) -> String {
        match &self.database {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}
