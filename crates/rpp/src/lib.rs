//! REAPER project parser and template document model.
//!
//! This crate reads the nested, line-oriented `.rpp` project format into a
//! chunk tree, extracts the parts a session import needs (tracks, tempo map,
//! markers and pooled envelopes) and can render a modified project back.
//!
//! # Example
//!
//! ```
//! use rpp::parse_session;
//!
//! let text = r#"<REAPER_PROJECT 0.1
//!   TEMPO 120 4 4
//!   <TRACK
//!     NAME "Kick In"
//!     <ITEM
//!       POSITION 0
//!       LENGTH 16
//!     >
//!   >
//! >
//! "#;
//!
//! let result = parse_session(text, "take1.rpp");
//! assert!(!result.has_errors());
//! assert_eq!(result.value.tracks[0].name, "Kick In");
//! assert_eq!(result.value.duration, 16.0);
//! ```

pub mod chunk;
pub mod document;
pub mod error;
pub mod feedback;
pub mod model;
pub mod parser;
pub mod token;

use std::path::Path;

pub use chunk::{fresh_guid, Chunk, Node};
pub use document::{ProjectDocument, TemplateTrack};
pub use error::{ApplyError, LoadError, SaveError};
pub use feedback::{Feedback, FeedbackCode, FeedbackLevel, ParseResult};
pub use model::*;
pub use parser::{parse_blocks, parse_session};

/// Read and parse a session file.
///
/// An unreadable file aborts the load. Bytes that are not valid UTF-8 are
/// replaced rather than rejected.
pub fn load_session(path: impl AsRef<Path>) -> Result<ParseResult<Session>, LoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| LoadError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_session(&String::from_utf8_lossy(&bytes), path))
}
