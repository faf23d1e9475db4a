//! User alias overrides: `source pattern → destination name`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wildmatch::WildMatch;

use crate::normalize::{normalize, strip_extension};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AliasError {
    #[error("alias '{0}' must look like PATTERN=DESTINATION")]
    MissingSeparator(String),

    #[error("alias '{0}' has an empty pattern or destination")]
    Empty(String),
}

/// One alias. The pattern is a case-insensitive wildcard (`*`, `?`) matched
/// against the source name with its extension removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub pattern: String,
    pub destination: String,
}

impl Alias {
    pub fn new(pattern: impl Into<String>, destination: impl Into<String>) -> Self {
        Alias {
            pattern: pattern.into(),
            destination: destination.into(),
        }
    }

    fn compile(&self) -> CompiledAlias {
        CompiledAlias {
            matcher: WildMatch::new(&self.pattern.trim().to_lowercase()),
            target: normalize(&self.destination),
        }
    }
}

impl FromStr for Alias {
    type Err = AliasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (pattern, destination) = s
            .split_once('=')
            .ok_or_else(|| AliasError::MissingSeparator(s.to_string()))?;
        let (pattern, destination) = (pattern.trim(), destination.trim());
        if pattern.is_empty() || destination.is_empty() {
            return Err(AliasError::Empty(s.to_string()));
        }
        Ok(Alias::new(pattern, destination))
    }
}

#[derive(Debug, Clone)]
struct CompiledAlias {
    matcher: WildMatch,
    target: String,
}

/// An ordered alias list; earlier entries win.
#[derive(Debug, Clone, Default)]
pub struct AliasSet {
    aliases: Vec<CompiledAlias>,
}

impl AliasSet {
    pub fn new(aliases: &[Alias]) -> Self {
        AliasSet {
            aliases: aliases.iter().map(Alias::compile).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Normalized destination names the source is aliased to, in list order.
    pub fn targets_for<'a>(&'a self, source_name: &str) -> impl Iterator<Item = &'a str> + 'a {
        let stem = strip_extension(source_name.trim()).to_lowercase();
        self.aliases
            .iter()
            .filter(move |a| a.matcher.matches(&stem))
            .map(|a| a.target.as_str())
    }
}
