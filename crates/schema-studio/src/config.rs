//! Optional TOML settings for the studio.
//!
//! ```toml
//! [store]
//! history_capacity = 50
//! storage_key = "my_designer"
//! ```

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use form_schema::StoreConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudioConfig {
    pub store: StoreConfig,
}

impl StudioConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid studio config")
    }
}

/// Reads the config at `path`. No path, or a path that does not exist,
/// yields the defaults.
pub fn load(path: Option<&Path>) -> Result<StudioConfig> {
    let Some(path) = path else {
        return Ok(StudioConfig::default());
    };
    match fs::read_to_string(path) {
        Ok(text) => StudioConfig::from_toml(&text)
            .with_context(|| format!("failed to load {}", path.display())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Ok(StudioConfig::default())
        }
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}
