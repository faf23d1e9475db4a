//! Sparse `destination → (session → source)` mapping.
//!
//! Within one session the mapping is a partial bijection: a source feeds at
//! most one destination and a destination takes at most one source.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellOrigin {
    Manual,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub source: usize,
    pub origin: CellOrigin,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    cells: BTreeMap<usize, BTreeMap<usize, Cell>>,
}

impl Assignment {
    /// Map `source` of `session` onto `dest`.
    ///
    /// Last writer wins, except that an `Auto` write never replaces a
    /// `Manual` cell or moves a manually placed source. Returns whether the
    /// cell was written.
    pub fn set(&mut self, dest: usize, session: usize, source: usize, origin: CellOrigin) -> bool {
        if origin == CellOrigin::Auto {
            let manual_here = self
                .cell(dest, session)
                .is_some_and(|c| c.origin == CellOrigin::Manual);
            let manual_elsewhere = self
                .destination_of(session, source)
                .and_then(|d| self.cell(d, session))
                .is_some_and(|c| c.origin == CellOrigin::Manual);
            if manual_here || manual_elsewhere {
                return false;
            }
        }

        if let Some(previous) = self.destination_of(session, source) {
            self.clear(previous, session);
        }
        self.cells
            .entry(dest)
            .or_default()
            .insert(session, Cell { source, origin });
        true
    }

    pub fn set_manual(&mut self, dest: usize, session: usize, source: usize) {
        self.set(dest, session, source, CellOrigin::Manual);
    }

    pub fn clear(&mut self, dest: usize, session: usize) -> Option<Cell> {
        let row = self.cells.get_mut(&dest)?;
        let cell = row.remove(&session);
        if row.is_empty() {
            self.cells.remove(&dest);
        }
        cell
    }

    /// Drop every `Auto` cell of one session.
    pub fn clear_auto(&mut self, session: usize) {
        for row in self.cells.values_mut() {
            if row.get(&session).is_some_and(|c| c.origin == CellOrigin::Auto) {
                row.remove(&session);
            }
        }
        self.cells.retain(|_, row| !row.is_empty());
    }

    pub fn cell(&self, dest: usize, session: usize) -> Option<Cell> {
        self.cells.get(&dest)?.get(&session).copied()
    }

    /// `(session, source)` pairs feeding `dest`, by session order.
    pub fn sources_for(&self, dest: usize) -> Vec<(usize, usize)> {
        self.cells
            .get(&dest)
            .map(|row| row.iter().map(|(s, c)| (*s, c.source)).collect())
            .unwrap_or_default()
    }

    pub fn destination_of(&self, session: usize, source: usize) -> Option<usize> {
        self.cells
            .iter()
            .find(|(_, row)| row.get(&session).is_some_and(|c| c.source == source))
            .map(|(dest, _)| *dest)
    }

    pub fn is_empty_for(&self, dest: usize) -> bool {
        !self.cells.contains_key(&dest)
    }

    /// Destinations with at least one source, in track order.
    pub fn destinations(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.values().map(BTreeMap::len).sum()
    }

    /// Renumber sessions through `f`; sessions mapped to `None` are dropped.
    pub fn remap_sessions(&mut self, f: impl Fn(usize) -> Option<usize>) {
        for row in self.cells.values_mut() {
            *row = std::mem::take(row)
                .into_iter()
                .filter_map(|(s, c)| f(s).map(|s| (s, c)))
                .collect();
        }
        self.cells.retain(|_, row| !row.is_empty());
    }

    /// Forget a removed session and close the gap in session numbering.
    pub fn remove_session(&mut self, session: usize) {
        self.remap_sessions(|s| match s {
            s if s == session => None,
            s if s > session => Some(s - 1),
            s => Some(s),
        });
    }

    /// Follow a queue move of one session from `from` to `to`.
    pub fn move_session(&mut self, from: usize, to: usize) {
        self.remap_sessions(|s| {
            Some(if s == from {
                to
            } else if from < to && s > from && s <= to {
                s - 1
            } else if to < from && s >= to && s < from {
                s + 1
            } else {
                s
            })
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_bijection_per_session() {
        let mut a = Assignment::default();
        a.set(0, 0, 3, CellOrigin::Auto);
        a.set(1, 0, 3, CellOrigin::Auto);
        // Source 3 moved, destination 0 empty again
        assert!(a.is_empty_for(0));
        assert_eq!(a.destination_of(0, 3), Some(1));

        // Same source index in another session is independent
        a.set(0, 1, 3, CellOrigin::Auto);
        assert_eq!(a.sources_for(0), vec![(1, 3)]);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_auto_never_overwrites_manual() {
        let mut a = Assignment::default();
        a.set_manual(0, 0, 1);
        assert!(!a.set(0, 0, 2, CellOrigin::Auto));
        assert!(!a.set(5, 0, 1, CellOrigin::Auto));
        assert_eq!(a.cell(0, 0), Some(Cell { source: 1, origin: CellOrigin::Manual }));

        // Manual writes replace anything
        a.set_manual(0, 0, 2);
        assert_eq!(a.cell(0, 0).map(|c| c.source), Some(2));
    }

    #[test]
    fn test_clear_auto_keeps_manual() {
        let mut a = Assignment::default();
        a.set_manual(0, 0, 0);
        a.set(1, 0, 1, CellOrigin::Auto);
        a.set(1, 1, 1, CellOrigin::Auto);
        a.clear_auto(0);
        assert_eq!(a.sources_for(0), vec![(0, 0)]);
        assert_eq!(a.sources_for(1), vec![(1, 1)]);
    }

    #[test]
    fn test_remove_and_move_sessions() {
        let mut a = Assignment::default();
        a.set_manual(0, 0, 0);
        a.set_manual(0, 1, 1);
        a.set_manual(0, 2, 2);

        a.move_session(0, 2);
        assert_eq!(a.sources_for(0), vec![(0, 1), (1, 2), (2, 0)]);

        a.remove_session(1);
        assert_eq!(a.sources_for(0), vec![(0, 1), (1, 0)]);
    }
}
