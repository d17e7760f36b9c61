//! Viewer configuration: layout constants plus navigation tuning.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::nav::NavigationConfig;
use crate::views::LayoutConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a frontend can tune. Missing fields fall back to defaults, so
/// `{"navigation": {"clamp_to_trace": true}}` is a valid file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub layout: LayoutConfig,
    pub navigation: NavigationConfig,
}

impl ViewerConfig {
    pub fn from_json_slice(data: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_slice(&data)?;
        tracing::debug!(path = %path.display(), "loaded viewer config");
        Ok(config)
    }
}
