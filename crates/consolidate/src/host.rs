//! TrackHost: the project the engine writes merged tracks into.

use std::collections::BTreeSet;
use std::path::PathBuf;

use rpp::{ApplyError, Chunk, ProjectDocument};

/// Trait for projects that accept consolidated tracks.
///
/// The engine only ever talks to the project through this trait, so a live
/// host and an in-memory document look the same to it.
pub trait TrackHost {
    /// Number of tracks in the project.
    fn track_count(&self) -> usize;

    /// Copy of the track block at `index`.
    fn track_chunk(&self, index: usize) -> Option<Chunk>;

    /// Replace the track at `index` in one operation.
    ///
    /// Hosts reject chunks they cannot apply; the caller skips that
    /// destination and carries on with the others.
    fn replace_track(&mut self, index: usize, chunk: Chunk) -> Result<(), ApplyError>;

    /// Remove tracks, keeping folder structure and receives consistent.
    fn remove_tracks(&mut self, indices: &BTreeSet<usize>) -> usize;

    /// Ids of pooled envelopes already in the project.
    fn pool_ids(&self) -> BTreeSet<u32>;

    /// Pooled envelope payload by id.
    fn pool(&self, id: u32) -> Option<Chunk>;

    /// Add a pooled envelope payload.
    fn add_pool(&mut self, chunk: Chunk);

    /// Directory of the project file, used for media lookups.
    fn project_dir(&self) -> Option<PathBuf>;
}

impl TrackHost for ProjectDocument {
    fn track_count(&self) -> usize {
        ProjectDocument::track_count(self)
    }

    fn track_chunk(&self, index: usize) -> Option<Chunk> {
        self.track(index).cloned()
    }

    fn replace_track(&mut self, index: usize, chunk: Chunk) -> Result<(), ApplyError> {
        ProjectDocument::replace_track(self, index, chunk)
    }

    fn remove_tracks(&mut self, indices: &BTreeSet<usize>) -> usize {
        ProjectDocument::remove_tracks(self, indices)
    }

    fn pool_ids(&self) -> BTreeSet<u32> {
        ProjectDocument::pool_ids(self)
    }

    fn pool(&self, id: u32) -> Option<Chunk> {
        ProjectDocument::pool(self, id).cloned()
    }

    fn add_pool(&mut self, chunk: Chunk) {
        ProjectDocument::add_pool(self, chunk)
    }

    fn project_dir(&self) -> Option<PathBuf> {
        self.dir().map(|p| p.to_path_buf())
    }
}
