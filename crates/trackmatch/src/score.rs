//! Tiered similarity of two normalized names.

use serde::{Deserialize, Serialize};

/// Which rule produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Alias,
    Exact,
    Prefix,
    FirstToken,
    Word,
    Fuzzy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub value: f64,
    pub tier: MatchTier,
}

/// Prefix followed by a word, as in "kick" for "kick in".
const PREFIX_WORD: f64 = 0.95;
/// Prefix followed only by a take number, as in "kick" for "kick 02". Ranks
/// below [`PREFIX_WORD`] and above the first-token tier (0.85).
const PREFIX_NUMBERED: f64 = 0.90;

impl Score {
    fn new(value: f64, tier: MatchTier) -> Self {
        Score { value, tier }
    }
}

/// Score two normalized names; the first tier that applies wins.
pub fn score(a: &str, b: &str) -> Score {
    if a.is_empty() || b.is_empty() {
        return Score::new(0.0, MatchTier::Fuzzy);
    }
    if a == b {
        return Score::new(1.0, MatchTier::Exact);
    }

    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if let Some(rest) = long.strip_prefix(short) {
        if rest.starts_with(|c: char| c == ' ' || c.is_ascii_digit()) {
            let numbered = rest.trim().chars().all(|c| c.is_ascii_digit());
            let value = if numbered { PREFIX_NUMBERED } else { PREFIX_WORD };
            return Score::new(value, MatchTier::Prefix);
        }
    }

    let first_a = a.split(' ').next().unwrap_or("");
    let first_b = b.split(' ').next().unwrap_or("");
    if first_a == first_b && first_a.chars().count() > 1 {
        return Score::new(0.85, MatchTier::FirstToken);
    }

    if short.chars().count() >= 3
        && long.chars().count() >= short.chars().count() + 3
        && contains_word(long, short)
    {
        return Score::new(0.75, MatchTier::Word);
    }

    Score::new(fuzzy(a, b), MatchTier::Fuzzy)
}

/// `needle` occurs in `haystack` bounded by start, end or a space.
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(at, _)| {
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + needle.len()..].chars().next();
        before.map_or(true, |c| c == ' ') && after.map_or(true, |c| c == ' ')
    })
}

fn fuzzy(a: &str, b: &str) -> f64 {
    let brass_pair = |x: &str, y: &str| x.contains("bass") && y.contains("brass");
    if brass_pair(a, b) || brass_pair(b, a) {
        return 0.05;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > 10 {
        return 0.1;
    }
    2.0 * lcs(&a, &b) as f64 / (a.len() + b.len()) as f64
}

/// Longest common subsequence length.
fn lcs(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn s(a: &str, b: &str) -> Score {
        score(&normalize(a), &normalize(b))
    }

    #[test]
    fn test_exact() {
        assert_eq!(s("Kick", "kick").value, 1.0);
        assert_eq!(s("01_Kik", "Kick").tier, MatchTier::Exact);
    }

    #[test]
    fn test_prefix_prefers_words_over_take_numbers() {
        let kick_in = s("Kick", "Kick In");
        let kick_02 = s("Kick", "kick_02");
        assert_eq!(kick_in.tier, MatchTier::Prefix);
        assert_eq!(kick_02.tier, MatchTier::Prefix);
        assert!(kick_in.value > kick_02.value);
        assert_eq!(s("Tom", "Tom2").value, PREFIX_NUMBERED);
        assert!(kick_02.value > s("Snare Top", "Snare Bottom").value);
    }

    #[test]
    fn test_prefix_needs_boundary() {
        // "snare" is a prefix of "snares" but not at a boundary
        assert_ne!(s("Snare", "Snares").tier, MatchTier::Prefix);
    }

    #[test]
    fn test_first_token() {
        let score = s("Snare Top", "Snare Bottom");
        assert_eq!(score.tier, MatchTier::FirstToken);
        assert_eq!(score.value, 0.85);
        // Single-letter first tokens do not count
        assert_ne!(s("L Room", "L Overhead").tier, MatchTier::FirstToken);
    }

    #[test]
    fn test_whole_word_containment() {
        let score = s("Bass", "Synth Bass DI");
        assert_eq!(score.tier, MatchTier::Word);
        assert_eq!(score.value, 0.75);
        // Inside another word is not a whole word
        assert_ne!(s("oom", "Big Room Mic").tier, MatchTier::Word);
    }

    #[test]
    fn test_bass_brass_penalty() {
        assert_eq!(s("Bass Gtr", "Brass Sec").value, 0.05);
    }

    #[test]
    fn test_length_early_out() {
        assert_eq!(s("Pno", "Piano Left Microphone Close").value, 0.1);
    }

    #[test]
    fn test_lcs_similarity() {
        let score = s("Snare", "Snr");
        assert_eq!(score.tier, MatchTier::Fuzzy);
        // LCS "snr" = 3, lengths 5 + 3
        assert!((score.value - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_empty_names() {
        assert_eq!(score("", "kick").value, 0.0);
    }
}
