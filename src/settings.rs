use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use config::{Config, Environment, File};
use serde::Deserialize;
use crate::conductor::Conductor;
use crate::connection::{IsolationLevel, SqliteSource, DEFAULT_BUSY_TIMEOUT_MS};
use crate::core::Result;
use crate::resource::DirectoryLoader;

pub const DEFAULT_CONFIG_FILE: &str = "./sqlgrain.toml";
pub const ENV_PREFIX: &str = "SQLGRAIN";

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// SQLite database path, or `:memory:`
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Root for resource names (fixtures, SQL scripts)
    #[serde(default = "default_fixtures_dir")]
    pub fixtures_dir: PathBuf,
    #[serde(default)]
    pub isolation: Option<IsolationLevel>,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_database() -> PathBuf { PathBuf::from("sqlgrain.db") }
fn default_fixtures_dir() -> PathBuf { PathBuf::from("fixtures") }
fn default_busy_timeout_ms() -> u64 { DEFAULT_BUSY_TIMEOUT_MS }

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: default_database(),
            fixtures_dir: default_fixtures_dir(),
            isolation: None,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Settings {
    /// Loads settings with priority: ENV > config file > defaults.
    ///
    /// `file` must exist when given; otherwise `./sqlgrain.toml` is read
    /// if present.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        match file {
            Some(path) => builder = builder.add_source(File::from(path)),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE));
            }
            None => {}
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let settings: Self = builder.build()?.try_deserialize()?;
        log::debug!("settings: {settings:?}");
        Ok(settings)
    }

    pub fn source(&self) -> SqliteSource {
        SqliteSource::new(&self.database)
            .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }

    pub fn loader(&self) -> DirectoryLoader {
        DirectoryLoader::new(&self.fixtures_dir)
    }

    pub fn conductor(&self) -> Conductor {
        Conductor::from_shared(Arc::new(self.source())).with_isolation(self.isolation)
    }
}
