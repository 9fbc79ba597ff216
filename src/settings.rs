// config lets you read a separate config file, overridden by the environment
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

pub const DEFAULT_SETTINGS_FILE: &str = "arbor.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// `tracing_subscriber::EnvFilter` directive, `RUST_LOG` wins when set.
    pub log_filter: String,
    /// One ground sentence per line, inserted on startup.
    pub facts_file: Option<String>,
    /// Queries separated by blank lines, one clause per line.
    pub query_file: Option<String>,
    pub pretty: bool,
}

impl Settings {
    /// Defaults, then the (optional) settings file, then `ARBOR_*` variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .set_default("log_filter", "info")?
            .set_default("pretty", true)?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("ARBOR"))
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }
}
