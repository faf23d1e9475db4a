use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A media file could not be found; the original reference was kept.
    MediaUnresolved,
    /// The host refused the merged track; the destination was skipped.
    ChunkApplyRejected,
    /// A track references a pooled envelope its session does not carry.
    PoolMissing,
    /// None of the assigned sources could be found; the destination was
    /// skipped and left as it is.
    NoSources,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Destination track index the issue belongs to.
    pub destination: usize,
    pub message: String,
}

/// Outcome of one consolidation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationReport {
    pub processed: usize,
    pub skipped: usize,
    /// Tracks removed by cleanup.
    pub removed: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl ConsolidationReport {
    pub fn push(&mut self, kind: DiagnosticKind, destination: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            kind,
            destination,
            message: message.into(),
        });
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    /// `"N destinations processed, M skipped"`
    pub fn summary(&self) -> String {
        format!(
            "{} destinations processed, {} skipped",
            self.processed, self.skipped
        )
    }
}

impl fmt::Display for ConsolidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}
