use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::alias::AliasSet;
use crate::assignment::{Assignment, CellOrigin};
use crate::destination::Destinations;
use crate::normalize::{normalize, numeric_suffix};
use crate::score::{score, MatchTier};

/// Minimum score for an automatic track match.
pub const DEFAULT_THRESHOLD: f64 = 0.60;

/// A source track offered for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceName<'a> {
    pub index: usize,
    pub name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub destination: usize,
    pub session: usize,
    pub source: usize,
    pub score: f64,
    pub tier: MatchTier,
}

/// One scored `(destination, source)` pair above the threshold.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    destination: usize,
    source: usize,
    score: f64,
    tier: MatchTier,
    /// Number suffix when the destination has numbered siblings.
    sibling_number: Option<u32>,
    destination_len: usize,
}

impl Candidate {
    /// Total order: best score, then lowest-numbered sibling, then shorter
    /// destination name, then track and source position.
    fn priority(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| match (self.sibling_number, other.sibling_number) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| self.destination_len.cmp(&other.destination_len))
            .then_with(|| self.destination.cmp(&other.destination))
            .then_with(|| self.source.cmp(&other.source))
    }
}

pub struct TrackMatcher {
    threshold: f64,
    aliases: AliasSet,
}

impl Default for TrackMatcher {
    fn default() -> Self {
        TrackMatcher::new(DEFAULT_THRESHOLD, AliasSet::default())
    }
}

impl TrackMatcher {
    pub fn new(threshold: f64, aliases: AliasSet) -> Self {
        Self { threshold, aliases }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Auto-match one session's sources onto free eligible destinations.
    ///
    /// Existing cells of the session are kept; only destinations with no
    /// source from this session and sources not yet placed are considered.
    /// Folder locks are synced afterwards.
    pub fn auto_match_session(
        &self,
        assignment: &mut Assignment,
        destinations: &mut Destinations,
        session: usize,
        sources: &[SourceName<'_>],
    ) -> Vec<MatchResult> {
        let mut free_dests: BTreeMap<usize, String> = destinations
            .eligible()
            .filter(|d| assignment.cell(d.index, session).is_none())
            .map(|d| (d.index, normalize(&d.name)))
            .collect();
        let mut free_sources: BTreeSet<usize> = sources
            .iter()
            .filter(|s| assignment.destination_of(session, s.index).is_none())
            .map(|s| s.index)
            .collect();

        let mut results = Vec::new();

        // Aliases run before any scoring
        for source in sources {
            if !free_sources.contains(&source.index) {
                continue;
            }
            let hit = self.aliases.targets_for(source.name).find_map(|target| {
                free_dests
                    .iter()
                    .find(|(_, name)| name.as_str() == target)
                    .map(|(index, _)| *index)
            });
            if let Some(dest) = hit {
                if assignment.set(dest, session, source.index, CellOrigin::Auto) {
                    debug!(session, source = source.name, dest, "alias match");
                    free_dests.remove(&dest);
                    free_sources.remove(&source.index);
                    results.push(MatchResult {
                        destination: dest,
                        session,
                        source: source.index,
                        score: 1.0,
                        tier: MatchTier::Alias,
                    });
                }
            }
        }

        let candidates = self.candidates(&free_dests, sources, &free_sources);

        // Group by source in order of each source's best pair
        let mut order: Vec<usize> = Vec::new();
        let mut by_source: BTreeMap<usize, Vec<&Candidate>> = BTreeMap::new();
        for c in &candidates {
            if !by_source.contains_key(&c.source) {
                order.push(c.source);
            }
            by_source.entry(c.source).or_default().push(c);
        }

        for source in order {
            let Some(pick) = by_source[&source]
                .iter()
                .find(|c| free_dests.contains_key(&c.destination))
            else {
                continue;
            };
            if assignment.set(pick.destination, session, source, CellOrigin::Auto) {
                free_dests.remove(&pick.destination);
                results.push(MatchResult {
                    destination: pick.destination,
                    session,
                    source,
                    score: pick.score,
                    tier: pick.tier,
                });
            }
        }

        destinations.sync_folder_locks(assignment);
        info!(
            session,
            matched = results.len(),
            unmatched = sources.len().saturating_sub(results.len()),
            "auto-matched session"
        );
        results
    }

    /// Auto-match every session independently.
    pub fn auto_match_all<'a>(
        &self,
        assignment: &mut Assignment,
        destinations: &mut Destinations,
        sessions: impl IntoIterator<Item = Vec<SourceName<'a>>>,
    ) -> Vec<MatchResult> {
        sessions
            .into_iter()
            .enumerate()
            .flat_map(|(session, sources)| {
                self.auto_match_session(assignment, destinations, session, &sources)
            })
            .collect()
    }

    fn candidates(
        &self,
        free_dests: &BTreeMap<usize, String>,
        sources: &[SourceName<'_>],
        free_sources: &BTreeSet<usize>,
    ) -> Vec<Candidate> {
        // Base names that occur with a number on more than one destination
        let mut bases: BTreeMap<&str, usize> = BTreeMap::new();
        for name in free_dests.values() {
            if let Some((base, _)) = numeric_suffix(name) {
                *bases.entry(base).or_default() += 1;
            }
        }
        let sibling_number = |name: &str| {
            numeric_suffix(name)
                .filter(|(base, _)| bases.get(base).copied().unwrap_or(0) > 1)
                .map(|(_, n)| n)
        };

        let mut candidates = Vec::new();
        for source in sources.iter().filter(|s| free_sources.contains(&s.index)) {
            let source_norm = normalize(source.name);
            for (&dest, dest_norm) in free_dests {
                let s = score(&source_norm, dest_norm);
                if s.value < self.threshold {
                    continue;
                }
                candidates.push(Candidate {
                    destination: dest,
                    source: source.index,
                    score: s.value,
                    tier: s.tier,
                    sibling_number: sibling_number(dest_norm),
                    destination_len: dest_norm.chars().count(),
                });
            }
        }
        candidates.sort_by(|a, b| a.priority(b));
        candidates
    }
}
