//! Multi-session consolidation onto template tracks.
//!
//! For each destination with assigned sources, every source track is copied,
//! its media relinked, moved to its session's place on the merged timeline,
//! given its pooled envelopes, aligned to a common lane and folded into one
//! track. The destination's own settings are then laid over the result, which
//! replaces the destination in a single host operation.
//!
//! ```rust,no_run
//! use consolidate::{ConsolidationEngine, ConsolidateOptions};
//! # fn demo(doc: &mut rpp::ProjectDocument, sessions: &[rpp::Session],
//! #         assignment: &trackmatch::Assignment, dests: &trackmatch::Destinations) {
//! let engine = ConsolidationEngine::new(ConsolidateOptions::default());
//! let report = engine.run(doc, sessions, assignment, dests);
//! println!("{report}");
//! # }
//! ```

pub mod engine;
pub mod host;
pub mod lanes;
pub mod media;
pub mod merge;
pub mod pools;
pub mod report;
pub mod shift;
pub mod snapshot;

pub use engine::{write_timeline, ConsolidateOptions, ConsolidationEngine};
pub use host::TrackHost;
pub use media::MediaResolver;
pub use report::{ConsolidationReport, Diagnostic, DiagnosticKind};
pub use snapshot::TrackSnapshot;
