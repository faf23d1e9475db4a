//! Track name matching for session imports.
//!
//! Source tracks of each session are scored against the template's
//! destination tracks with a tiered heuristic (alias, exact, prefix, first
//! token, whole word, subsequence similarity) and assigned greedily, best
//! pairs first. Manual assignments always win over automatic ones.

pub mod alias;
pub mod assignment;
pub mod destination;
pub mod matcher;
pub mod normalize;
pub mod score;

pub use alias::{Alias, AliasError, AliasSet};
pub use assignment::{Assignment, Cell, CellOrigin};
pub use destination::{DestinationTrack, Destinations, LockOrigin};
pub use matcher::{MatchResult, SourceName, TrackMatcher, DEFAULT_THRESHOLD};
pub use normalize::normalize;
pub use score::{score, MatchTier, Score};
