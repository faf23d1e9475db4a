//! The consolidation pass: every assigned destination, in track order.

use std::collections::BTreeSet;

use rpp::{ApplyError, Chunk, ProjectDocument, Session};
use timeline::{merged_markers, merged_tempo_map, MarkerNaming};
use tracing::{debug, info, warn};
use trackmatch::{Assignment, Destinations};

use crate::host::TrackHost;
use crate::lanes::align_lanes;
use crate::media::{relink_media, MediaResolver};
use crate::merge::merge_imports;
use crate::pools::{PoolLedger, PoolPlan};
use crate::report::{ConsolidationReport, DiagnosticKind};
use crate::shift::shift_track;
use crate::snapshot::TrackSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsolidateOptions {
    /// Copy playing items onto the highest active lane before merging.
    pub align_lanes: bool,
    /// Remove unlocked destinations that received nothing.
    pub cleanup_unused: bool,
}

impl Default for ConsolidateOptions {
    fn default() -> Self {
        Self {
            align_lanes: true,
            cleanup_unused: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConsolidationEngine {
    options: ConsolidateOptions,
}

impl ConsolidationEngine {
    pub fn new(options: ConsolidateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ConsolidateOptions {
        self.options
    }

    /// Import, shift and merge every assigned source onto its destination.
    ///
    /// Sessions are read, never changed. A destination the host refuses is
    /// skipped and reported; the others still go through.
    pub fn run<H: TrackHost>(
        &self,
        host: &mut H,
        sessions: &[Session],
        assignment: &Assignment,
        destinations: &Destinations,
    ) -> ConsolidationReport {
        let resolver = MediaResolver::new(host.project_dir());
        let mut ledger = PoolLedger::default();
        let mut report = ConsolidationReport::default();

        for dest in assignment.destinations() {
            match self.consolidate_one(host, sessions, assignment, dest, &resolver, &mut ledger, &mut report) {
                Ok(Some(imports)) => {
                    report.processed += 1;
                    debug!(destination = dest, imports, "destination consolidated");
                }
                Ok(None) => {
                    report.skipped += 1;
                    warn!(destination = dest, "no assigned source found, destination skipped");
                    report.push(DiagnosticKind::NoSources, dest, "no assigned source could be imported");
                }
                Err(err) => {
                    report.skipped += 1;
                    warn!(destination = dest, error = %err, "destination skipped");
                    report.push(DiagnosticKind::ChunkApplyRejected, dest, err.to_string());
                }
            }
        }

        if self.options.cleanup_unused {
            let unused = unused_destinations(destinations, assignment);
            if !unused.is_empty() {
                report.removed = host.remove_tracks(&unused);
            }
        }

        info!(
            processed = report.processed,
            skipped = report.skipped,
            removed = report.removed,
            diagnostics = report.diagnostics.len(),
            "consolidation finished"
        );
        report
    }

    #[allow(clippy::too_many_arguments)]
    fn consolidate_one<H: TrackHost>(
        &self,
        host: &mut H,
        sessions: &[Session],
        assignment: &Assignment,
        dest: usize,
        resolver: &MediaResolver,
        ledger: &mut PoolLedger,
        report: &mut ConsolidationReport,
    ) -> Result<Option<usize>, ApplyError> {
        let destination = host.track_chunk(dest).ok_or(ApplyError::NoSuchTrack(dest))?;
        let snapshot = TrackSnapshot::capture(&destination);

        let mut plan = PoolPlan::default();
        let mut imports: Vec<Chunk> = Vec::new();

        for (session_index, source_index) in assignment.sources_for(dest) {
            let Some(session) = sessions.get(session_index) else {
                warn!(session = session_index, "assignment names a session that is not loaded");
                continue;
            };
            let Some(source) = session.tracks.get(source_index) else {
                warn!(session = session_index, source = source_index, "assignment names a missing track");
                continue;
            };

            let mut chunk = source.chunk.clone();
            for reference in relink_media(&mut chunk, session.dir(), resolver) {
                report.push(
                    DiagnosticKind::MediaUnresolved,
                    dest,
                    format!("{}: {}", session.display_name(), reference),
                );
            }

            shift_track(&mut chunk, session.offsets.time);

            let missing = ledger.attach(
                &mut plan,
                &*host,
                session_index,
                session,
                &mut chunk,
                source.uses_pools.iter().copied(),
            );
            for id in missing {
                warn!(session = session_index, pool = id, "pooled envelope not found in session");
                report.push(
                    DiagnosticKind::PoolMissing,
                    dest,
                    format!("{}: pooled envelope {}", session.display_name(), id),
                );
            }

            imports.push(chunk);
        }

        if imports.len() > 1 && self.options.align_lanes {
            align_lanes(&mut imports);
        }

        let count = imports.len();
        let Some(master) = merge_imports(imports) else {
            return Ok(None);
        };

        host.replace_track(dest, snapshot.apply(master))?;
        ledger.commit(plan, host);
        Ok(Some(count))
    }
}

/// Destinations cleanup may remove: unlocked, nothing assigned, and no kept
/// track below them.
fn unused_destinations(destinations: &Destinations, assignment: &Assignment) -> BTreeSet<usize> {
    let empty = |d: &trackmatch::DestinationTrack| !d.locked && assignment.is_empty_for(d.index);

    let kept: Vec<usize> = destinations
        .iter()
        .filter(|d| !empty(d))
        .map(|d| d.index)
        .collect();
    let holds_kept: BTreeSet<usize> = kept
        .iter()
        .flat_map(|&i| destinations.ancestors(i))
        .collect();

    destinations
        .iter()
        .filter(|d| empty(d) && !holds_kept.contains(&d.index))
        .map(|d| d.index)
        .collect()
}

/// Write the merged tempo map and markers of planned sessions.
///
/// The template's base tempo becomes the first session's. Markers are
/// appended after the template's own.
pub fn write_timeline(doc: &mut ProjectDocument, sessions: &[Session], naming: MarkerNaming) {
    let Some(first) = sessions.first() else {
        return;
    };
    doc.set_base_tempo(&first.base_tempo);

    let tempo_map = merged_tempo_map(sessions);
    doc.set_tempo_map(&tempo_map);

    let markers = merged_markers(sessions, naming);
    doc.append_markers(&markers);

    info!(
        sessions = sessions.len(),
        tempo_points = tempo_map.len(),
        markers = markers.len(),
        "wrote merged timeline"
    );
}
