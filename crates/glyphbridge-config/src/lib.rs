//! glyphbridge configuration
//!
//! Settings are read from `glyphbridge.toml` and then overridden by
//! environment variables, so an embedding runtime can flip behavior without
//! touching the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE: &str = "glyphbridge.toml";

/// Errors raised while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Shaping dispatcher settings
    pub shaping: ShapingConfig,
    /// Font selection for the command line tool
    pub text: TextConfig,
    /// Log filter settings
    pub logging: LoggingConfig,
}

/// Shaping dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapingConfig {
    /// Derive the device scale from the request's transform instead of the
    /// font handle (x-axis length of the matrix divided by the point size).
    pub derive_scale_from_matrix: bool,
    /// Enable kerning when the caller does not pass explicit flags
    pub kerning: bool,
    /// Enable standard ligatures when the caller does not pass explicit flags
    pub ligatures: bool,
}

/// Font configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Path to a font file (.ttf/.otf); system fonts are used when unset
    pub font: Option<PathBuf>,
    /// Point size used when shaping
    pub point_size: f32,
    /// Device scale factor (e.g. 2.0 for Retina)
    pub device_scale: f32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` filter string, e.g. "glyphbridge_text=debug"
    pub filter: Option<String>,
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self {
            derive_scale_from_matrix: false,
            kerning: true,
            ligatures: true,
        }
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font: None,
            point_size: 12.0,
            device_scale: 1.0,
        }
    }
}

fn parse_bool(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `glyphbridge.toml` from the current directory, falling back to
    /// defaults when it is missing or malformed.
    pub fn load_or_default() -> Self {
        Self::load_from_file(CONFIG_FILE).unwrap_or_default()
    }

    /// Apply overrides from the process environment.
    pub fn merge_with_env(&mut self) {
        self.merge_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Variables take precedence over file values. `HB_NODEVTX` is honored for
    /// compatibility: its mere presence turns on matrix-derived scaling.
    pub fn merge_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Shaping settings
        if lookup("HB_NODEVTX").is_some() {
            self.shaping.derive_scale_from_matrix = true;
        }
        if let Some(val) = lookup("GLYPHBRIDGE_DEVICE_TRANSFORM") {
            self.shaping.derive_scale_from_matrix = parse_bool(&val);
        }
        if let Some(val) = lookup("GLYPHBRIDGE_KERNING") {
            self.shaping.kerning = parse_bool(&val);
        }
        if let Some(val) = lookup("GLYPHBRIDGE_LIGATURES") {
            self.shaping.ligatures = parse_bool(&val);
        }

        // Text settings
        if let Some(font) = lookup("GLYPHBRIDGE_FONT") {
            self.text.font = Some(PathBuf::from(font));
        }
        if let Some(val) = lookup("GLYPHBRIDGE_POINT_SIZE") {
            if let Ok(size) = val.parse::<f32>() {
                self.text.point_size = size;
            }
        }
        if let Some(val) = lookup("GLYPHBRIDGE_DEVICE_SCALE") {
            if let Ok(scale) = val.parse::<f32>() {
                self.text.device_scale = scale;
            }
        }

        if let Some(filter) = lookup("GLYPHBRIDGE_LOG") {
            self.logging.filter = Some(filter);
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from glyphbridge.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert!(!config.shaping.derive_scale_from_matrix);
        assert!(config.shaping.kerning);
        assert!(config.shaping.ligatures);
        assert_eq!(config.text.point_size, 12.0);
        assert_eq!(config.text.device_scale, 1.0);
        assert!(config.logging.filter.is_none());
    }

    #[test]
    fn test_toml_serialization() {
        let config = BridgeConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: BridgeConfig = toml::from_str(&toml_str).unwrap();
        assert!(parsed.shaping.kerning);
        assert_eq!(parsed.text.point_size, 12.0);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[text]\npoint_size = 18.5\n").unwrap();

        let config = BridgeConfig::load_from_file(&path).unwrap();
        assert_eq!(config.text.point_size, 18.5);
        assert_eq!(config.text.device_scale, 1.0);
        assert!(config.shaping.ligatures);
    }

    #[test]
    fn test_malformed_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[text\npoint_size = ").unwrap();

        let err = BridgeConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_reports_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BridgeConfig::load_from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_merge_overrides() {
        let mut config = BridgeConfig::default();
        config.merge_with(lookup_from(&[
            ("GLYPHBRIDGE_FONT", "/tmp/face.ttf"),
            ("GLYPHBRIDGE_POINT_SIZE", "24"),
            ("GLYPHBRIDGE_DEVICE_SCALE", "not-a-number"),
            ("GLYPHBRIDGE_LIGATURES", "false"),
            ("GLYPHBRIDGE_LOG", "debug"),
        ]));

        assert_eq!(config.text.font.as_deref(), Some(Path::new("/tmp/face.ttf")));
        assert_eq!(config.text.point_size, 24.0);
        assert_eq!(config.text.device_scale, 1.0);
        assert!(!config.shaping.ligatures);
        assert!(config.shaping.kerning);
        assert_eq!(config.logging.filter.as_deref(), Some("debug"));
    }

    #[test]
    fn test_legacy_device_transform_switch() {
        let mut config = BridgeConfig::default();
        config.merge_with(lookup_from(&[("HB_NODEVTX", "")]));
        assert!(config.shaping.derive_scale_from_matrix);

        // The explicit variable wins over the legacy switch.
        config.merge_with(lookup_from(&[
            ("HB_NODEVTX", "1"),
            ("GLYPHBRIDGE_DEVICE_TRANSFORM", "0"),
        ]));
        assert!(!config.shaping.derive_scale_from_matrix);
    }
}
