//! Project text → typed blocks → `Session`.
//!
//! The splitter in `chunk` builds the block tree; this module only looks at
//! the block kinds a session import needs and ignores the rest.

mod marker;
mod tempo;
mod track;

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;

use crate::chunk::{self, Node};
use crate::feedback::{FeedbackCode, FeedbackCollector, ParseResult};
use crate::model::{BaseTempo, Block, Session, SessionOffsets};
use crate::token;

pub use marker::{pair_markers, parse_marker_line};
pub use tempo::{normalize_tempo_map, parse_tempo_envelope, parse_tempo_line};
pub use track::{item_end, read_pooled_envelope, read_track, track_name};

/// Parse project text into its typed top-level blocks.
///
/// When the text is wrapped in `<REAPER_PROJECT ...>`, the blocks are that
/// root's children; a bare fragment is read as-is.
pub fn parse_blocks(input: &str) -> ParseResult<Vec<Block>> {
    let mut collector = FeedbackCollector::new();
    let (nodes, split_feedback) = chunk::split(input);
    collector.extend(split_feedback);

    let mut blocks = Vec::new();
    for node in project_body(nodes) {
        match node {
            Node::Line(line) => match token::field_name(&line) {
                Some("TEMPO") => {
                    if let Some(tempo) = parse_tempo_line(&line, &mut collector) {
                        blocks.push(Block::Tempo(tempo));
                    }
                }
                Some("MARKER") => {
                    if let Some(marker) = parse_marker_line(&line, &mut collector) {
                        blocks.push(Block::Marker(marker));
                    }
                }
                _ => {}
            },
            Node::Block(chunk) => match chunk.kind() {
                "TRACK" => blocks.push(Block::Track(read_track(chunk))),
                "TEMPOENVEX" => {
                    let points = parse_tempo_envelope(&chunk, &mut collector);
                    blocks.push(Block::TempoEnvelope(points));
                }
                "POOLEDENV" => {
                    if let Some(env) = read_pooled_envelope(chunk, &mut collector) {
                        blocks.push(Block::PooledEnvelope(env));
                    }
                }
                _ => {}
            },
        }
    }

    ParseResult::new(blocks, collector.into_feedback())
}

fn project_body(nodes: Vec<Node>) -> Vec<Node> {
    let has_root = nodes
        .iter()
        .any(|n| matches!(n, Node::Block(b) if b.is("REAPER_PROJECT")));
    if !has_root {
        return nodes;
    }
    nodes
        .into_iter()
        .filter_map(|n| match n {
            Node::Block(b) if b.is("REAPER_PROJECT") => Some(b.children),
            _ => None,
        })
        .flatten()
        .collect()
}

/// Parse project text into a `Session`.
pub fn parse_session(input: &str, path: impl Into<PathBuf>) -> ParseResult<Session> {
    let path = path.into();
    let ParseResult { value: blocks, feedback } = parse_blocks(input);
    let mut collector = FeedbackCollector::new();
    collector.extend(feedback);

    let mut base_tempo = None;
    let mut envelope = None;
    let mut marker_lines = Vec::new();
    let mut tracks = Vec::new();
    let mut pools = BTreeMap::new();

    for block in blocks {
        match block {
            Block::Tempo(t) => {
                base_tempo.get_or_insert(t);
            }
            Block::TempoEnvelope(points) => {
                envelope.get_or_insert(points);
            }
            Block::Marker(m) => marker_lines.push(m),
            Block::Track(t) => tracks.push(t),
            Block::PooledEnvelope(env) => {
                pools.insert(env.pool_id, env);
            }
        }
    }

    let base_tempo = base_tempo.unwrap_or_else(|| {
        collector.warning(
            FeedbackCode::MissingTempo,
            "no TEMPO line, assuming 120 BPM 4/4",
        );
        BaseTempo::default()
    });
    let tempo_map = normalize_tempo_map(envelope.unwrap_or_default(), &base_tempo);
    let markers = pair_markers(marker_lines, &mut collector);
    let duration = tracks
        .iter()
        .map(|t| t.content_end)
        .fold(0.0, f64::max);

    if !tracks.iter().any(|t| t.has_media) {
        collector.info(
            FeedbackCode::NoContentFound,
            format!("{} has no tracks with media", path.display()),
        );
    }

    debug!(
        path = %path.display(),
        tracks = tracks.len(),
        tempo_points = tempo_map.len(),
        markers = markers.len(),
        duration,
        "parsed session"
    );

    let session = Session {
        path,
        base_tempo,
        tempo_map,
        markers,
        tracks,
        pools,
        duration,
        offsets: SessionOffsets::default(),
    };
    ParseResult::new(session, collector.into_feedback())
}
