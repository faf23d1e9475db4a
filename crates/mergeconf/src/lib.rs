//! Configuration loading for reamerge.
//!
//! # Usage
//!
//! ```rust,no_run
//! use mergeconf::MergeConfig;
//!
//! let config = MergeConfig::load().expect("Failed to load config");
//! println!("gap: {} measures", config.merge.gap_measures);
//! for (pattern, destination) in &config.aliases {
//!     println!("{pattern} -> {destination}");
//! }
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/reamerge/config.toml` (system)
//! 2. `~/.config/reamerge/config.toml` (user)
//! 3. `./reamerge.toml` (local override), or the file given with `--config`
//! 4. Environment variables (`REAMERGE_*`)
//!
//! # Example Config
//!
//! ```toml
//! [merge]
//! gap_measures = 4
//! align_lanes = true
//! cleanup_unused = false
//! template = "~/templates/band.rpp"
//!
//! [matching]
//! threshold = 0.6
//!
//! [aliases]
//! "*OH*" = "Overheads"
//! "Kick*" = "Kick"
//!
//! [logging]
//! level = "info"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, expand_path, ConfigSources};
pub use sections::{AliasTable, LoggingSection, MatchingSection, MergeSection};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key} in {origin}: {message}")]
    Invalid {
        key: String,
        origin: String,
        message: String,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Complete reamerge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MergeConfig {
    #[serde(default)]
    pub merge: MergeSection,

    #[serde(default)]
    pub matching: MatchingSection,

    /// `pattern = "destination"` pairs, wildcards allowed in the pattern.
    #[serde(default)]
    pub aliases: AliasTable,

    #[serde(default)]
    pub logging: LoggingSection,
}

impl MergeConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/reamerge/config.toml`
    /// 3. `~/.config/reamerge/config.toml`
    /// 4. `./reamerge.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load with `config_path` in place of `./reamerge.toml`.
    pub fn load_from(config_path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report where values came from.
    pub fn load_with_sources_from(
        config_path: Option<&std::path::Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = MergeConfig::default();

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::FileRead {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                });
            }
        }

        for path in loader::discover_config_files_with_override(config_path) {
            loader::load_file_into(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources, |key| std::env::var(key).ok())?;

        Ok((config, sources))
    }

    /// The effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MergeConfig::default();
        assert_eq!(config.merge.gap_measures, 2);
        assert!(config.merge.align_lanes);
        assert!(!config.merge.cleanup_unused);
        assert_eq!(config.matching.threshold, 0.60);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_to_toml_parses_back() {
        let mut config = MergeConfig::default();
        config.merge.gap_measures = 3;
        config.merge.template = Some(PathBuf::from("/srv/templates/band \"live\".rpp"));
        config.aliases.insert("Snare*".into(), "Snare".into());
        config.aliases.insert("*OH*".into(), "Over\u{7f}heads".into());

        let text = config.to_toml().unwrap();
        assert!(text.contains("[merge]"));

        let parsed: MergeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
        let patterns: Vec<&str> = parsed.aliases.keys().map(String::as_str).collect();
        assert_eq!(patterns, vec!["Snare*", "*OH*"]);
    }

    #[test]
    fn test_to_toml_omits_unset_template() {
        let text = MergeConfig::default().to_toml().unwrap();
        assert!(!text.contains("template"));
        assert_eq!(toml::from_str::<MergeConfig>(&text).unwrap(), MergeConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = MergeConfig::load_from(Some(std::path::Path::new("/nonexistent/reamerge.toml")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }
}
