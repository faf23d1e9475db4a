//! The session queue, template and assignment a merge is built from.

use std::path::Path;

use consolidate::{write_timeline, ConsolidateOptions, ConsolidationEngine, ConsolidationReport};
use rpp::{Feedback, LoadError, ProjectDocument, Session};
use thiserror::Error;
use timeline::{plan_offsets, Cursor, MarkerNaming, DEFAULT_GAP_MEASURES};
use tracing::{debug, info};
use trackmatch::{Assignment, CellOrigin, Destinations, LockOrigin, MatchResult, SourceName, TrackMatcher};

#[derive(Debug, Error)]
pub enum WorkbenchError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("no template loaded")]
    NoTemplate,

    #[error("no sessions queued")]
    NoSessions,

    #[error("session {0} is not in the queue")]
    NoSuchSession(usize),

    #[error("session {session} has no track {track}")]
    NoSuchSource { session: usize, track: usize },

    #[error("template has no track {0}")]
    NoSuchDestination(usize),

    #[error("template track {0} is locked or a folder")]
    DestinationLocked(usize),
}

/// Owns everything a merge needs. Every change to the queue replans all
/// session offsets.
#[derive(Debug)]
pub struct Workbench {
    sessions: Vec<Session>,
    gap: u32,
    end: Cursor,
    template: Option<ProjectDocument>,
    destinations: Destinations,
    assignment: Assignment,
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new(DEFAULT_GAP_MEASURES)
    }
}

impl Workbench {
    pub fn new(gap: u32) -> Self {
        Self {
            sessions: Vec::new(),
            gap,
            end: Cursor::default(),
            template: None,
            destinations: Destinations::default(),
            assignment: Assignment::default(),
        }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn gap(&self) -> u32 {
        self.gap
    }

    /// Merged timeline position after the last session.
    pub fn end(&self) -> Cursor {
        self.end
    }

    pub fn template(&self) -> Option<&ProjectDocument> {
        self.template.as_ref()
    }

    pub fn destinations(&self) -> &Destinations {
        &self.destinations
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Use `doc` as the merge target. Any previous assignment is dropped.
    pub fn set_template(&mut self, doc: ProjectDocument) {
        self.destinations = Destinations::from_template(&doc.template_tracks());
        self.assignment = Assignment::default();
        info!(tracks = self.destinations.len(), "template loaded");
        self.template = Some(doc);
    }

    pub fn load_template(&mut self, path: impl AsRef<Path>) -> Result<Vec<Feedback>, WorkbenchError> {
        let parsed = ProjectDocument::load(path)?;
        self.set_template(parsed.value);
        Ok(parsed.feedback)
    }

    /// Read a session file and append it to the queue.
    pub fn load_session(&mut self, path: impl AsRef<Path>) -> Result<Vec<Feedback>, WorkbenchError> {
        let parsed = rpp::load_session(path)?;
        self.push_session(parsed.value);
        Ok(parsed.feedback)
    }

    pub fn push_session(&mut self, session: Session) {
        self.sessions.push(session);
        self.replan();
    }

    /// Insert a session at `index`; later sessions move back one place.
    pub fn insert_session(&mut self, index: usize, session: Session) -> Result<(), WorkbenchError> {
        if index > self.sessions.len() {
            return Err(WorkbenchError::NoSuchSession(index));
        }
        self.assignment
            .remap_sessions(|s| Some(if s >= index { s + 1 } else { s }));
        self.sessions.insert(index, session);
        self.replan();
        Ok(())
    }

    pub fn remove_session(&mut self, index: usize) -> Result<Session, WorkbenchError> {
        if index >= self.sessions.len() {
            return Err(WorkbenchError::NoSuchSession(index));
        }
        let removed = self.sessions.remove(index);
        self.assignment.remove_session(index);
        self.destinations.sync_folder_locks(&self.assignment);
        self.replan();
        Ok(removed)
    }

    /// Move a session to another queue position.
    pub fn move_session(&mut self, from: usize, to: usize) -> Result<(), WorkbenchError> {
        let len = self.sessions.len();
        if from >= len {
            return Err(WorkbenchError::NoSuchSession(from));
        }
        if to >= len {
            return Err(WorkbenchError::NoSuchSession(to));
        }
        let session = self.sessions.remove(from);
        self.sessions.insert(to, session);
        self.assignment.move_session(from, to);
        self.replan();
        Ok(())
    }

    pub fn set_gap(&mut self, gap: u32) {
        self.gap = gap;
        self.replan();
    }

    fn replan(&mut self) {
        self.end = plan_offsets(&mut self.sessions, self.gap);
        debug!(sessions = self.sessions.len(), end_measure = self.end.measure, "replanned queue");
    }

    /// Place a source on a destination by hand.
    pub fn assign(&mut self, dest: usize, session: usize, source: usize) -> Result<(), WorkbenchError> {
        let track = self
            .sessions
            .get(session)
            .ok_or(WorkbenchError::NoSuchSession(session))?;
        if source >= track.tracks.len() {
            return Err(WorkbenchError::NoSuchSource { session, track: source });
        }
        let target = self
            .destinations
            .get(dest)
            .ok_or(WorkbenchError::NoSuchDestination(dest))?;
        if !target.is_eligible() {
            return Err(WorkbenchError::DestinationLocked(dest));
        }
        self.assignment.set(dest, session, source, CellOrigin::Manual);
        self.destinations.sync_folder_locks(&self.assignment);
        Ok(())
    }

    pub fn unassign(&mut self, dest: usize, session: usize) {
        self.assignment.clear(dest, session);
        self.destinations.sync_folder_locks(&self.assignment);
    }

    /// Keep a destination out of matching.
    pub fn lock(&mut self, dest: usize) -> Result<(), WorkbenchError> {
        self.destinations
            .get(dest)
            .ok_or(WorkbenchError::NoSuchDestination(dest))?;
        self.destinations.lock(dest, LockOrigin::User);
        Ok(())
    }

    pub fn unlock(&mut self, dest: usize) {
        self.destinations.unlock(dest);
    }

    /// Re-run automatic matching for every session.
    ///
    /// Previous automatic cells are dropped first; manual ones stay.
    pub fn auto_match(&mut self, matcher: &TrackMatcher) -> Vec<MatchResult> {
        let mut results = Vec::new();
        for (index, session) in self.sessions.iter().enumerate() {
            self.assignment.clear_auto(index);
            let sources: Vec<SourceName<'_>> = session
                .media_tracks()
                .map(|(i, t)| SourceName {
                    index: i,
                    name: t.name.as_str(),
                })
                .collect();
            results.extend(matcher.auto_match_session(
                &mut self.assignment,
                &mut self.destinations,
                index,
                &sources,
            ));
        }
        results
    }

    /// Consolidate everything into the template and return it.
    ///
    /// Consumes the workbench: the assignment is used exactly once.
    pub fn commit(
        self,
        options: ConsolidateOptions,
        naming: MarkerNaming,
    ) -> Result<(ProjectDocument, ConsolidationReport), WorkbenchError> {
        let mut doc = self.template.ok_or(WorkbenchError::NoTemplate)?;
        if self.sessions.is_empty() {
            return Err(WorkbenchError::NoSessions);
        }

        let engine = ConsolidationEngine::new(options);
        let report = engine.run(&mut doc, &self.sessions, &self.assignment, &self.destinations);
        write_timeline(&mut doc, &self.sessions, naming);
        Ok((doc, report))
    }
}
