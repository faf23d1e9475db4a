//! Config file discovery, loading, and environment variable overlay.

use crate::{AliasTable, ConfigError, MergeConfig};
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/reamerge/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("reamerge/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("reamerge.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load config from a TOML file, on top of the defaults.
pub fn load_from_file(path: &Path) -> Result<MergeConfig, ConfigError> {
    let mut config = MergeConfig::default();
    load_file_into(&mut config, path)?;
    Ok(config)
}

/// Layer a TOML file over `config`; every key the file sets wins.
pub fn load_file_into(config: &mut MergeConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

/// Overlay the keys present in `contents` onto `config`.
///
/// Aliases from the file go first, in file order, ahead of the ones already
/// loaded; a pattern the file repeats moves to the file's position.
fn apply_toml(config: &mut MergeConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let invalid = |key: &str, message: &str| ConfigError::Invalid {
        key: key.to_string(),
        origin: path.display().to_string(),
        message: message.to_string(),
    };
    let boolean = |section: &toml::Table, key: &str, full: &str| -> Result<Option<bool>, ConfigError> {
        section
            .get(key)
            .map(|v| v.as_bool().ok_or_else(|| invalid(full, "expected true or false")))
            .transpose()
    };

    if let Some(merge) = table.get("merge").and_then(|v| v.as_table()) {
        if let Some(v) = merge.get("gap_measures") {
            let gap = v
                .as_integer()
                .and_then(|g| u32::try_from(g).ok())
                .ok_or_else(|| invalid("merge.gap_measures", "expected a non-negative integer"))?;
            config.merge.gap_measures = gap;
        }
        if let Some(v) = boolean(merge, "align_lanes", "merge.align_lanes")? {
            config.merge.align_lanes = v;
        }
        if let Some(v) = boolean(merge, "cleanup_unused", "merge.cleanup_unused")? {
            config.merge.cleanup_unused = v;
        }
        if let Some(v) = boolean(merge, "prefix_markers", "merge.prefix_markers")? {
            config.merge.prefix_markers = v;
        }
        if let Some(v) = merge.get("template") {
            let template = v
                .as_str()
                .ok_or_else(|| invalid("merge.template", "expected a path string"))?;
            config.merge.template = Some(expand_path(template));
        }
    }

    if let Some(matching) = table.get("matching").and_then(|v| v.as_table()) {
        if let Some(v) = matching.get("threshold") {
            let threshold = v
                .as_float()
                .or_else(|| v.as_integer().map(|i| i as f64))
                .filter(|t| (0.0..=1.0).contains(t))
                .ok_or_else(|| invalid("matching.threshold", "expected a number between 0 and 1"))?;
            config.matching.threshold = threshold;
        }
    }

    if let Some(aliases) = table.get("aliases").and_then(|v| v.as_table()) {
        let mut layered = AliasTable::new();
        for (pattern, destination) in aliases {
            let dest = destination
                .as_str()
                .ok_or_else(|| invalid(&format!("aliases.{pattern}"), "expected a track name"))?;
            layered.insert(pattern.clone(), dest.to_string());
        }
        for (pattern, destination) in config.aliases.drain(..) {
            layered.entry(pattern).or_insert(destination);
        }
        config.aliases = layered;
    }

    if let Some(logging) = table.get("logging").and_then(|v| v.as_table()) {
        if let Some(v) = logging.get("level") {
            let level = v
                .as_str()
                .ok_or_else(|| invalid("logging.level", "expected a filter directive"))?;
            config.logging.level = level.to_string();
        }
    }

    Ok(())
}

/// Apply `REAMERGE_*` overrides read through `lookup`.
pub fn apply_env_overrides(
    config: &mut MergeConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let invalid = |key: &str, value: &str| ConfigError::Invalid {
        key: key.to_string(),
        origin: "environment".to_string(),
        message: format!("cannot use {value:?}"),
    };

    if let Some(v) = lookup("REAMERGE_GAP") {
        config.merge.gap_measures = v.trim().parse().map_err(|_| invalid("REAMERGE_GAP", &v))?;
        sources.env_overrides.push("REAMERGE_GAP".to_string());
    }
    if let Some(v) = lookup("REAMERGE_THRESHOLD") {
        config.matching.threshold = v
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|t| (0.0..=1.0).contains(t))
            .ok_or_else(|| invalid("REAMERGE_THRESHOLD", &v))?;
        sources.env_overrides.push("REAMERGE_THRESHOLD".to_string());
    }
    if let Some(v) = lookup("REAMERGE_ALIGN_LANES") {
        config.merge.align_lanes = parse_bool(&v).ok_or_else(|| invalid("REAMERGE_ALIGN_LANES", &v))?;
        sources.env_overrides.push("REAMERGE_ALIGN_LANES".to_string());
    }
    if let Some(v) = lookup("REAMERGE_TEMPLATE") {
        config.merge.template = Some(expand_path(&v));
        sources.env_overrides.push("REAMERGE_TEMPLATE".to_string());
    }
    if let Some(v) = lookup("REAMERGE_LOG_LEVEL") {
        config.logging.level = v;
        sources.env_overrides.push("REAMERGE_LOG_LEVEL".to_string());
    }
    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}
