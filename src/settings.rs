// config lets us layer a settings file and the environment over defaults
use config::{Config, Environment, File};
use serde::Deserialize;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

pub const DEFAULT_SETTINGS_FILE: &str = "csplab.toml";
pub const ENVIRONMENT_PREFIX: &str = "CSPLAB";

fn default_log_filter() -> String {
    "info".to_string()
}
fn default_frame_interval_ms() -> u64 {
    16
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Script to run instead of the built-in calculator script.
    #[serde(default)]
    pub script: Option<PathBuf>,
    /// Journal dump, replayed on start-up when present and written on exit.
    #[serde(default)]
    pub journal: Option<PathBuf>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            script: None,
            journal: None,
            log_filter: default_log_filter(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

impl Settings {
    /// Defaults, overridden by the file at `path` if it exists, overridden in
    /// turn by `CSPLAB_*` environment variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix(ENVIRONMENT_PREFIX).try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
    /// Contents of the configured script, if one is configured.
    pub fn script_source(&self) -> Result<Option<String>> {
        match &self.script {
            Some(path) => Ok(Some(fs::read_to_string(path)?)),
            None => Ok(None),
        }
    }
}
