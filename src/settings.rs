// config lets you read a separate config file
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::store::PersistenceMode;

pub const DEFAULT_CONFIG_NAME: &str = "hbnb";
pub const DEFAULT_DATABASE: &str = "hbnb.db";
pub const DEFAULT_LOG_FILTER: &str = "warn";
/// Database path that selects a non-durable store.
pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// SQLite file holding the objects, or `:memory:`.
    pub database: String,
    /// `tracing` filter directive, e.g. `info` or `hbnb=debug`.
    pub log_filter: String,
}

impl Settings {
    /// Loads `hbnb.*` from the working directory (if present) overlaid with
    /// `HBNB_*` environment variables.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_NAME)
    }

    pub fn load_from(name: &str) -> Result<Self> {
        let config = Config::builder()
            .set_default("database", DEFAULT_DATABASE)?
            .set_default("log_filter", DEFAULT_LOG_FILTER)?
            .add_source(File::with_name(name).required(false))
            .add_source(Environment::with_prefix("HBNB"))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn persistence_mode(&self) -> PersistenceMode {
        if self.database == IN_MEMORY {
            PersistenceMode::InMemory
        } else {
            PersistenceMode::File(self.database.clone())
        }
    }
}
