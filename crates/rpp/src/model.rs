//! Session model types.
//!
//! A `Session` is everything read from one source project: its tracks, the
//! tempo map, markers and pooled envelopes. Offsets on the merged timeline
//! are computed later by the planner in the `timeline` crate.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;

/// Placeholder used for tracks without a `NAME` field.
pub const UNNAMED_TRACK: &str = "(unnamed)";

/// Scalar project tempo from the `TEMPO bpm num denom` line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseTempo {
    pub bpm: f64,
    pub num: u32,
    pub denom: u32,
}

impl Default for BaseTempo {
    fn default() -> Self {
        BaseTempo {
            bpm: 120.0,
            num: 4,
            denom: 4,
        }
    }
}

impl BaseTempo {
    pub fn time_sig(&self) -> TimeSignature {
        TimeSignature {
            num: self.num,
            denom: self.denom,
        }
    }

    pub fn qn_per_measure(&self) -> f64 {
        self.time_sig().qn_per_measure()
    }

    pub fn seconds_per_measure(&self) -> f64 {
        self.qn_per_measure() * 60.0 / self.bpm
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub num: u32,
    pub denom: u32,
}

impl TimeSignature {
    /// Unpack `denom * 65536 + num`. Zero means "no signature change".
    pub fn unpack(packed: i64) -> Option<Self> {
        if packed <= 0 {
            return None;
        }
        let num = (packed & 0xFFFF) as u32;
        let denom = (packed >> 16) as u32;
        if num == 0 || denom == 0 {
            return None;
        }
        Some(TimeSignature { num, denom })
    }

    pub fn pack(&self) -> i64 {
        self.denom as i64 * 65536 + self.num as i64
    }

    pub fn qn_per_measure(&self) -> f64 {
        self.num as f64 * 4.0 / self.denom as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempoShape {
    Square,
    Linear,
}

impl TempoShape {
    /// Envelope shape code: 0 is linear, everything else steps.
    pub fn from_code(code: i64) -> Self {
        if code == 0 {
            TempoShape::Linear
        } else {
            TempoShape::Square
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            TempoShape::Linear => 0,
            TempoShape::Square => 1,
        }
    }
}

/// One tempo breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoPoint {
    pub time: f64,
    pub bpm: f64,
    pub shape: TempoShape,
    pub time_sig: Option<TimeSignature>,
}

/// A marker, or a region with both endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub index: u32,
    pub pos: f64,
    pub is_region: bool,
    /// End of the region; equals `pos` for plain markers.
    pub region_end: f64,
    pub name: String,
    pub color: i64,
}

/// Reusable automation payload, referenced from tracks by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PooledEnvelope {
    pub pool_id: u32,
    pub chunk: Chunk,
}

/// A track read from a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTrack {
    pub name: String,
    pub chunk: Chunk,
    pub has_media: bool,
    pub is_folder: bool,
    pub item_count: usize,
    /// Latest item end on this track, seconds.
    pub content_end: f64,
    pub uses_pools: BTreeSet<u32>,
}

/// Offsets of a session on the merged timeline.
///
/// Written as a whole by the planner so no field is ever stale relative to
/// the others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionOffsets {
    pub measure: u64,
    pub time: f64,
    pub qn: f64,
    /// Whole measures the session occupies (tempo changes included).
    pub measure_length: u64,
    /// Exact quarter notes up to the content end.
    pub qn_length: f64,
}

/// One loaded source project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub path: PathBuf,
    pub base_tempo: BaseTempo,
    pub tempo_map: Vec<TempoPoint>,
    pub markers: Vec<Marker>,
    pub tracks: Vec<SourceTrack>,
    pub pools: BTreeMap<u32, PooledEnvelope>,
    /// End of the latest item, seconds.
    pub duration: f64,
    pub offsets: SessionOffsets,
}

impl Session {
    /// Directory media paths of this session are resolved against.
    pub fn dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// File name for display.
    pub fn display_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Tracks that can be imported (they carry items).
    pub fn media_tracks(&self) -> impl Iterator<Item = (usize, &SourceTrack)> {
        self.tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.has_media)
    }

    pub fn pool(&self, id: u32) -> Option<&PooledEnvelope> {
        self.pools.get(&id)
    }
}

/// Raw `MARKER` line before regions are paired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerLine {
    pub index: u32,
    pub pos: f64,
    pub name: String,
    pub flags: i64,
    pub color: i64,
}

impl MarkerLine {
    pub fn is_region(&self) -> bool {
        self.flags & 1 != 0
    }
}

/// A typed top-level block of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Track(SourceTrack),
    Tempo(BaseTempo),
    TempoEnvelope(Vec<TempoPoint>),
    Marker(MarkerLine),
    PooledEnvelope(PooledEnvelope),
}
