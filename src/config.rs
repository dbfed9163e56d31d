//! Settings for the extractor and the dev panel.
//!
//! The CLI reads them from TOML (`--config <path>` or `mqm.toml` in the
//! working directory); the language server accepts the same structure as
//! JSON `initializationOptions`.
//!
//! ```toml
//! [extractor]
//! strip_prefixes = ["@media only screen and", "@media screen and"]
//! annotate_lines = true
//!
//! [serve]
//! port = 3434
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MqmError, Result};

/// Name of the config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "mqm.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub extractor: ExtractorOptions,
    pub serve: ServeSettings,
}

/// How labels are derived from a matched `@media` header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorOptions {
    /// Boilerplate removed from the header text, first occurrence each.
    pub strip_prefixes: Vec<String>,
    /// Append ` (Line N)` to every label.
    pub annotate_lines: bool,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            strip_prefixes: vec![
                "@media screen and".to_string(),
                "@media only screen and".to_string(),
            ],
            annotate_lines: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeSettings {
    pub port: u16,
}

impl Default for ServeSettings {
    fn default() -> Self {
        Self { port: 3434 }
    }
}

impl Settings {
    /// Parse settings from TOML text. `origin` is only used in errors.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|e| MqmError::config(origin, e.message()))
    }

    /// Load settings from an explicit file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| MqmError::io(path, e))?;
        Self::from_toml(&text, path)
    }

    /// Load `explicit` if given, else `mqm.toml` in `dir` when it exists,
    /// else defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "loading config");
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Settings from LSP `initializationOptions`. Anything unusable falls
    /// back to defaults.
    pub fn from_json(value: Option<serde_json::Value>) -> Self {
        match value {
            Some(v) => serde_json::from_value(v).unwrap_or_else(|e| {
                tracing::warn!("ignoring invalid initializationOptions: {e}");
                Self::default()
            }),
            None => Self::default(),
        }
    }
}
