//! Tempo-map algebra and the merged session timeline.
//!
//! Converts session content lengths from seconds into quarter notes and whole
//! measures, lays queued sessions back to back, and builds the tempo map and
//! markers of the merged project.

pub mod merge;
pub mod planner;
pub mod tempo;

pub use merge::{merged_markers, merged_tempo_map, MarkerNaming};
pub use planner::{plan_offsets, Cursor, DEFAULT_GAP_MEASURES};
pub use tempo::{ceil_measures, qn_at, session_length, time_sig_at, SessionLength};
