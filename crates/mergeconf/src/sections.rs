//! Configuration sections.

use serde::{Deserialize, Serialize};
use indexmap::IndexMap;
use std::path::PathBuf;

/// How sessions are laid out and merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeSection {
    /// Empty measures between consecutive sessions.
    /// Default: 2
    #[serde(default = "MergeSection::default_gap_measures")]
    pub gap_measures: u32,

    /// Copy playing items onto the highest active lane before merging.
    /// Default: true
    #[serde(default = "MergeSection::default_align_lanes")]
    pub align_lanes: bool,

    /// Remove unlocked template tracks that received nothing.
    /// Default: false
    #[serde(default)]
    pub cleanup_unused: bool,

    /// Template used when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,

    /// Prefix merged marker names with their session's file name.
    /// Default: false
    #[serde(default)]
    pub prefix_markers: bool,
}

impl MergeSection {
    fn default_gap_measures() -> u32 {
        2
    }

    fn default_align_lanes() -> bool {
        true
    }
}

impl Default for MergeSection {
    fn default() -> Self {
        Self {
            gap_measures: Self::default_gap_measures(),
            align_lanes: Self::default_align_lanes(),
            cleanup_unused: false,
            template: None,
            prefix_markers: false,
        }
    }
}

/// Track name matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingSection {
    /// Lowest score an automatic match may have.
    /// Default: 0.60
    #[serde(default = "MatchingSection::default_threshold")]
    pub threshold: f64,
}

impl MatchingSection {
    fn default_threshold() -> f64 {
        0.60
    }
}

impl Default for MatchingSection {
    fn default() -> Self {
        Self {
            threshold: Self::default_threshold(),
        }
    }
}

/// Logging for the command-line tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Default filter directive when `RUST_LOG` is unset.
    /// Default: "info"
    #[serde(default = "LoggingSection::default_level")]
    pub level: String,
}

impl LoggingSection {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// Source name pattern → destination track name, in file order.
///
/// Order matters: the matcher tries patterns first to last.
pub type AliasTable = IndexMap<String, String>;
