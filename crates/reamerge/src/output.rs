//! Printable views of sessions, offsets and assignments.
//!
//! Every view serializes to JSON for `--json` and renders as a plain text
//! table otherwise.

use std::fmt::{self, Write as _};

use rpp::{Feedback, FeedbackLevel, Session};
use serde::Serialize;
use trackmatch::{Assignment, CellOrigin, Destinations};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub name: String,
    pub path: String,
    pub bpm: f64,
    pub time_signature: String,
    pub tracks: usize,
    pub media_tracks: usize,
    pub tempo_points: usize,
    pub markers: usize,
    pub regions: usize,
    pub duration: f64,
    pub measures: u64,
    pub warnings: Vec<String>,
}

impl SessionSummary {
    /// Summary of a planned session and the feedback its parse produced.
    pub fn new(session: &Session, feedback: &[Feedback]) -> Self {
        let regions = session.markers.iter().filter(|m| m.is_region).count();
        Self {
            name: session.display_name(),
            path: session.path.display().to_string(),
            bpm: session.base_tempo.bpm,
            time_signature: format!("{}/{}", session.base_tempo.num, session.base_tempo.denom),
            tracks: session.tracks.len(),
            media_tracks: session.media_tracks().count(),
            tempo_points: session.tempo_map.len(),
            markers: session.markers.len() - regions,
            regions,
            duration: session.duration,
            measures: session.offsets.measure_length,
            warnings: feedback
                .iter()
                .filter(|f| f.level != FeedbackLevel::Info)
                .map(|f| format!("line {}: {}", f.line, f.message))
                .collect(),
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.path)?;
        writeln!(f, "  tempo     {} BPM {}", self.bpm, self.time_signature)?;
        writeln!(f, "  tracks    {} ({} with media)", self.tracks, self.media_tracks)?;
        writeln!(f, "  tempo map {} points", self.tempo_points)?;
        writeln!(f, "  markers   {} markers, {} regions", self.markers, self.regions)?;
        writeln!(f, "  length    {:.3}s, {} measures", self.duration, self.measures)?;
        for warning in &self.warnings {
            writeln!(f, "  warning   {warning}")?;
        }
        Ok(())
    }
}

/// One row of the offsets table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffsetRow {
    pub session: String,
    pub measure: u64,
    pub time: f64,
    pub qn: f64,
    pub measures: u64,
}

pub fn offset_rows(sessions: &[Session]) -> Vec<OffsetRow> {
    sessions
        .iter()
        .map(|s| OffsetRow {
            session: s.display_name(),
            measure: s.offsets.measure,
            time: s.offsets.time,
            qn: s.offsets.qn,
            measures: s.offsets.measure_length,
        })
        .collect()
}

pub fn offsets_table(rows: &[OffsetRow]) -> String {
    let width = rows.iter().map(|r| r.session.len()).max().unwrap_or(0).max(7);
    let mut out = format!("{:<width$}  {:>7}  {:>10}  {:>9}  {:>8}\n", "session", "measure", "time", "qn", "measures");
    for r in rows {
        let _ = writeln!(
            out,
            "{:<width$}  {:>7}  {:>10.3}  {:>9.3}  {:>8}",
            r.session, r.measure, r.time, r.qn, r.measures
        );
    }
    out
}

/// One assigned source in the matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixCell {
    pub source: String,
    pub manual: bool,
}

/// One template track with what each session feeds it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixRow {
    pub index: usize,
    pub destination: String,
    pub depth: usize,
    pub locked: bool,
    pub sessions: Vec<Option<MatrixCell>>,
}

pub fn assignment_matrix(destinations: &Destinations, sessions: &[Session], assignment: &Assignment) -> Vec<MatrixRow> {
    destinations
        .iter()
        .map(|d| MatrixRow {
            index: d.index,
            destination: d.name.clone(),
            depth: d.depth,
            locked: d.locked,
            sessions: (0..sessions.len())
                .map(|s| {
                    let cell = assignment.cell(d.index, s)?;
                    let source = sessions[s].tracks.get(cell.source)?;
                    Some(MatrixCell {
                        source: source.name.clone(),
                        manual: cell.origin == CellOrigin::Manual,
                    })
                })
                .collect(),
        })
        .collect()
}

pub fn matrix_table(rows: &[MatrixRow], sessions: &[Session]) -> String {
    let label = |r: &MatrixRow| {
        let lock = if r.locked { " [locked]" } else { "" };
        format!("{}{}{}", "  ".repeat(r.depth), r.destination, lock)
    };
    let width = rows.iter().map(|r| label(r).len()).max().unwrap_or(0).max(11);

    let mut out = format!("{:<width$}", "destination");
    for s in sessions {
        let _ = write!(out, " | {}", s.display_name());
    }
    out.push('\n');

    for r in rows {
        let _ = write!(out, "{:<width$}", label(r));
        for cell in &r.sessions {
            match cell {
                Some(c) if c.manual => {
                    let _ = write!(out, " | {} *", c.source);
                }
                Some(c) => {
                    let _ = write!(out, " | {}", c.source);
                }
                None => out.push_str(" | -"),
            }
        }
        out.push('\n');
    }
    out
}
