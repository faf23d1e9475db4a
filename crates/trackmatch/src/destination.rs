//! Template tracks as match destinations, with their lock state.

use serde::{Deserialize, Serialize};
use tracing::debug;

use rpp::TemplateTrack;

use crate::assignment::Assignment;

/// Who locked a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockOrigin {
    /// `LOCK` set in the template file.
    Template,
    /// Locked explicitly by the user.
    User,
    /// Folder locked because content was assigned below it.
    Auto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationTrack {
    pub index: usize,
    pub name: String,
    pub locked: bool,
    pub lock_origin: Option<LockOrigin>,
    pub is_folder: bool,
    pub depth: usize,
    pub parent: Option<usize>,
}

impl DestinationTrack {
    /// Can receive auto-matched sources.
    pub fn is_eligible(&self) -> bool {
        !self.locked && !self.is_folder
    }
}

impl From<&TemplateTrack> for DestinationTrack {
    fn from(t: &TemplateTrack) -> Self {
        DestinationTrack {
            index: t.index,
            name: t.name.clone(),
            locked: t.locked,
            lock_origin: t.locked.then_some(LockOrigin::Template),
            is_folder: t.is_folder,
            depth: t.depth,
            parent: t.parent,
        }
    }
}

/// All destinations of a template, indexed by track index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Destinations {
    tracks: Vec<DestinationTrack>,
}

impl Destinations {
    pub fn from_template(tracks: &[TemplateTrack]) -> Self {
        Destinations {
            tracks: tracks.iter().map(DestinationTrack::from).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DestinationTrack> {
        self.tracks.iter()
    }

    pub fn get(&self, index: usize) -> Option<&DestinationTrack> {
        self.tracks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn eligible(&self) -> impl Iterator<Item = &DestinationTrack> {
        self.tracks.iter().filter(|t| t.is_eligible())
    }

    pub fn lock(&mut self, index: usize, origin: LockOrigin) {
        if let Some(t) = self.tracks.get_mut(index) {
            t.locked = true;
            t.lock_origin = Some(origin);
        }
    }

    pub fn unlock(&mut self, index: usize) {
        if let Some(t) = self.tracks.get_mut(index) {
            t.locked = false;
            t.lock_origin = None;
        }
    }

    /// Enclosing folders of `index`, innermost first.
    pub fn ancestors(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut parent = self.tracks.get(index).and_then(|t| t.parent);
        while let Some(p) = parent {
            out.push(p);
            parent = self.tracks.get(p).and_then(|t| t.parent);
        }
        out
    }

    /// Some destination below folder `index` has assigned content.
    pub fn has_content_below(&self, index: usize, assignment: &Assignment) -> bool {
        self.tracks
            .iter()
            .filter(|t| !assignment.is_empty_for(t.index))
            .any(|t| self.ancestors(t.index).contains(&index))
    }

    /// Bring folder locks in line with the assignment.
    ///
    /// Every folder above an assigned destination is locked (`Auto`) unless
    /// already locked. Folders whose `Auto` lock no longer covers any
    /// content are unlocked again; template and user locks are left alone.
    pub fn sync_folder_locks(&mut self, assignment: &Assignment) {
        let filled: Vec<usize> = self
            .tracks
            .iter()
            .filter(|t| !assignment.is_empty_for(t.index))
            .map(|t| t.index)
            .collect();
        for index in filled {
            for folder in self.ancestors(index) {
                if !self.tracks[folder].locked {
                    debug!(folder, destination = index, "auto-locking folder");
                    self.lock(folder, LockOrigin::Auto);
                }
            }
        }

        let stale: Vec<usize> = self
            .tracks
            .iter()
            .filter(|t| t.is_folder && t.lock_origin == Some(LockOrigin::Auto))
            .filter(|t| !self.has_content_below(t.index, assignment))
            .map(|t| t.index)
            .collect();
        for folder in stale {
            debug!(folder, "clearing auto lock on empty folder");
            self.unlock(folder);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::CellOrigin;
    use pretty_assertions::assert_eq;

    fn template() -> Vec<TemplateTrack> {
        let t = |index, name: &str, is_folder, depth, parent, locked| TemplateTrack {
            index,
            name: name.into(),
            is_folder,
            depth,
            parent,
            locked,
        };
        vec![
            t(0, "Drums", true, 0, None, false),
            t(1, "Shells", true, 1, Some(0), false),
            t(2, "Kick", false, 2, Some(1), false),
            t(3, "Snare", false, 1, Some(0), true),
            t(4, "Keys", true, 0, None, true),
            t(5, "Piano", false, 1, Some(4), false),
        ]
    }

    #[test]
    fn test_eligibility() {
        let dests = Destinations::from_template(&template());
        let eligible: Vec<_> = dests.eligible().map(|d| d.name.as_str()).collect();
        assert_eq!(eligible, vec!["Kick", "Piano"]);
        assert_eq!(dests.get(3).unwrap().lock_origin, Some(LockOrigin::Template));
    }

    #[test]
    fn test_ancestors() {
        let dests = Destinations::from_template(&template());
        assert_eq!(dests.ancestors(2), vec![1, 0]);
        assert!(dests.ancestors(0).is_empty());
    }

    #[test]
    fn test_assignment_locks_ancestor_folders() {
        let mut dests = Destinations::from_template(&template());
        let mut assignment = Assignment::default();
        assignment.set(2, 0, 0, CellOrigin::Auto);
        dests.sync_folder_locks(&assignment);

        assert_eq!(dests.get(0).unwrap().lock_origin, Some(LockOrigin::Auto));
        assert_eq!(dests.get(1).unwrap().lock_origin, Some(LockOrigin::Auto));
        // Template lock on Keys untouched
        assert_eq!(dests.get(4).unwrap().lock_origin, Some(LockOrigin::Template));
    }

    #[test]
    fn test_auto_lock_cleared_when_content_goes() {
        let mut dests = Destinations::from_template(&template());
        let mut assignment = Assignment::default();
        assignment.set(2, 0, 0, CellOrigin::Auto);
        dests.sync_folder_locks(&assignment);

        assignment.clear(2, 0);
        dests.sync_folder_locks(&assignment);
        assert!(!dests.get(0).unwrap().locked);
        assert!(!dests.get(1).unwrap().locked);
        assert!(dests.get(4).unwrap().locked);
    }
}
