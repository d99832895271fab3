//! Configuration for conio sessions.
//!
//! This module provides:
//! - TOML configuration loading (`Config::load`, `Config::from_toml_str`)
//! - Session defaults (cursor visibility, code page, color pair cap)
//! - Logging settings consumed by the demo binary
//!
//! The library never looks for a configuration file on its own. Callers
//! hand a [`Config`] to [`Console::with_config`](crate::Console::with_config)
//! or to a backend constructor.
//!
//! # Configuration File
//!
//! ```toml
//! # Backend: auto, console, terminal
//! backend = "auto"
//!
//! cursor_visible = true
//! codepage = 65001
//! max_color_pairs = 256
//! format_buffer_size = 4096
//!
//! [log]
//! level = "info"
//! file = "conio.log"
//! ```

use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::error::{ConioError, Result};

/// UTF-8 console code page.
pub const CP_UTF8: u32 = 65001;

/// Formatting buffer size used when none is configured.
pub const DEFAULT_FORMAT_BUFFER_SIZE: usize = 4096;

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which backend to drive (runtime selection, see [`BackendChoice`])
    pub backend: BackendChoice,
    /// Cursor visibility applied when a session starts
    pub cursor_visible: bool,
    /// Console code page negotiated at session start (Windows console only)
    pub codepage: Option<u32>,
    /// Maximum number of color pairs the pair registry may hand out
    pub max_color_pairs: u16,
    /// Formatting buffer capacity in bytes, terminator slot included
    pub format_buffer_size: usize,
    /// Logging settings
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendChoice::Auto,
            cursor_visible: true,
            codepage: Some(CP_UTF8),
            max_color_pairs: 256,
            format_buffer_size: DEFAULT_FORMAT_BUFFER_SIZE,
            log: LogConfig::default(),
        }
    }
}

/// Backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    /// Platform default: console on Windows, terminal elsewhere
    #[default]
    Auto,
    /// Packed-attribute Win32 console
    Console,
    /// Color-pair model over VT sequences
    Terminal,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Maximum level: error, warn, info, debug, trace
    pub level: String,
    /// Log file path
    pub file: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: "conio.log".to_string(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(ConioError::ConfigIo)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a file, falling back to defaults if it is
    /// missing or malformed
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.exists() {
            match Self::load(path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Ignoring config {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> String {
        // Every field is a plain scalar or table, serialization cannot fail.
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Number of formatted bytes a single formatted write may produce.
    ///
    /// One slot of the buffer is reserved for the terminator, matching the
    /// classic `vsnprintf` contract.
    pub fn format_limit(&self) -> usize {
        self.format_buffer_size.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend, BackendChoice::Auto);
        assert!(config.cursor_visible);
        assert_eq!(config.codepage, Some(CP_UTF8));
        assert_eq!(config.max_color_pairs, 256);
        assert_eq!(config.format_limit(), 4095);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml_str(
            "backend = \"terminal\"\ncursor_visible = false\n\n[log]\nlevel = \"debug\"\n",
        )
        .unwrap();
        assert_eq!(config.backend, BackendChoice::Terminal);
        assert!(!config.cursor_visible);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.file, "conio.log");
        assert_eq!(config.max_color_pairs, 256);
    }

    #[test]
    fn test_invalid_backend_rejected() {
        let err = Config::from_toml_str("backend = \"curses\"").unwrap_err();
        assert!(matches!(err, ConioError::Config(_)));
    }

    #[test]
    fn test_serialized_form_parses_back() {
        let mut config = Config::default();
        config.max_color_pairs = 80;
        config.codepage = Some(932);
        let parsed = Config::from_toml_str(&config.to_toml_string()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load("/nonexistent/conio/config.toml").unwrap_err();
        assert!(matches!(err, ConioError::ConfigIo(_)));
        assert_eq!(
            Config::load_or_default("/nonexistent/conio/config.toml"),
            Config::default()
        );
    }

    #[test]
    fn test_tiny_format_buffer() {
        let config = Config {
            format_buffer_size: 0,
            ..Config::default()
        };
        assert_eq!(config.format_limit(), 0);
    }
}
