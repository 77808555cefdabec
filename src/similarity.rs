//! Weighted string similarity between a query and a catalog candidate.
//!
//! Two base metrics feed every measure: a token-set ratio that ignores word
//! order and surplus tokens, and a normalized Levenshtein ratio that rewards
//! close character alignment.  Either alone misleads (token comparison
//! loses exact substring runs, edit distance punishes reordering) so each
//! measure takes the better of the two.  The full-string, title and artist
//! measures then combine under configurable weights into one score.

use std::collections::BTreeSet;

use strsim::normalized_levenshtein;

use crate::matcher::{Candidate, ScoredCandidate};
use crate::query::NormalizedQuery;

/// Weights for combining the three component measures.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub full: f64,
    pub title: f64,
    pub artist: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        // Title and full-string agreement count for more than the artist
        // field; artist names repeat across half a label's catalog.
        ScoreWeights {
            full: 0.4,
            title: 0.4,
            artist: 0.2,
        }
    }
}

/// Similarity of two strings in [0.0, 1.0].
///
/// 0.0 when either side is empty after trimming, 1.0 for identical
/// non-empty strings (ignoring case).
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    token_set_ratio(&a, &b).max(normalized_levenshtein(&a, &b))
}

/// Score one candidate against the normalized query.
///
/// Pure and deterministic; no I/O.  When the query has no artist part the
/// artist measure reports 1.0 and drops out of the weighted combination
/// (the remaining weights are renormalized).
pub fn score_candidate(
    query: &NormalizedQuery,
    candidate: &Candidate,
    weights: &ScoreWeights,
) -> ScoredCandidate {
    let candidate_full = format!("{} - {}", candidate.artist, candidate.title);
    let full_score = similarity(&query.full_text, &candidate_full);
    let title_score = similarity(&query.title, &candidate.title);

    let (artist_score, weighted_score) = match &query.artist {
        Some(artist) => {
            let artist_score = similarity(artist, &candidate.artist);
            let sum = weights.full + weights.title + weights.artist;
            let weighted = (weights.full * full_score
                + weights.title * title_score
                + weights.artist * artist_score)
                / sum;
            (artist_score, weighted)
        }
        None => {
            let sum = weights.full + weights.title;
            let weighted = (weights.full * full_score + weights.title * title_score) / sum;
            (1.0, weighted)
        }
    };

    ScoredCandidate {
        candidate: candidate.clone(),
        full_score,
        title_score,
        artist_score,
        weighted_score,
    }
}

/// Token-set ratio: compares the sorted token intersection against each
/// side's sorted token string, so "Song" vs "Song Extended Mix" still
/// scores 1.0: the shorter side is fully contained in the longer.
fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a = tokens(a);
    let tokens_b = tokens(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let common: Vec<&str> = tokens_a.intersection(&tokens_b).map(String::as_str).collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).map(String::as_str).collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).map(String::as_str).collect();

    let base = common.join(" ");
    let with_a = join_parts(&base, &only_a);
    let with_b = join_parts(&base, &only_b);

    let mut best = normalized_levenshtein(&with_a, &with_b);
    if !base.is_empty() {
        best = best
            .max(normalized_levenshtein(&base, &with_a))
            .max(normalized_levenshtein(&base, &with_b));
    }
    best
}

/// Sorted unique word tokens; punctuation splits, case already folded.
fn tokens(s: &str) -> BTreeSet<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_parts(base: &str, rest: &[&str]) -> String {
    if rest.is_empty() {
        base.to_string()
    } else if base.is_empty() {
        rest.join(" ")
    } else {
        format!("{} {}", base, rest.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(artist: &str, title: &str) -> Candidate {
        Candidate {
            id: 1,
            artist: artist.to_string(),
            title: title.to_string(),
            album: None,
            year: None,
        }
    }

    #[test]
    fn test_similarity_bounds() {
        let pairs = [
            ("", ""),
            ("a", ""),
            ("", "b"),
            ("abc", "abc"),
            ("abc", "xyz"),
            ("Welcome To The Underworld", "Underworld welcome to the"),
            ("Skedo", "Along Came Polly"),
        ];
        for (a, b) in pairs {
            let s = similarity(a, b);
            assert!((0.0..=1.0).contains(&s), "similarity({:?}, {:?}) = {}", a, b, s);
        }
    }

    #[test]
    fn test_similarity_empty_and_identical() {
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("something", ""), 0.0);
        assert_eq!(similarity("Bohemian Rhapsody", "Bohemian Rhapsody"), 1.0);
        assert_eq!(similarity("Bohemian Rhapsody", "bohemian rhapsody"), 1.0);
    }

    #[test]
    fn test_similarity_ignores_word_order() {
        let s = similarity("Bohemian Rhapsody Queen", "Queen Bohemian Rhapsody");
        assert_eq!(s, 1.0);
    }

    #[test]
    fn test_similarity_contained_annotation() {
        // The candidate title is a token subset of the queried one.
        let s = similarity("Song (Extended Mix)", "Song");
        assert!(s >= 0.95, "got {}", s);
    }

    #[test]
    fn test_similarity_survives_small_typo() {
        let s = similarity("Bohemian Rapsody", "Bohemian Rhapsody");
        assert!(s > 0.9, "got {}", s);
        assert!(s < 1.0);
    }

    #[test]
    fn test_score_exact_match() {
        let query = NormalizedQuery::parse("Queen - Bohemian Rhapsody");
        let scored = score_candidate(
            &query,
            &candidate("Queen", "Bohemian Rhapsody"),
            &ScoreWeights::default(),
        );
        assert!(scored.weighted_score >= 0.95, "got {}", scored.weighted_score);
        assert_eq!(scored.artist_score, 1.0);
        assert_eq!(scored.title_score, 1.0);
    }

    #[test]
    fn test_score_without_artist_component() {
        let query = NormalizedQuery::parse("Bohemian Rhapsody");
        let scored = score_candidate(
            &query,
            &candidate("Queen", "Bohemian Rhapsody"),
            &ScoreWeights::default(),
        );
        // Artist measure reports 1.0 but carries no weight.
        assert_eq!(scored.artist_score, 1.0);
        assert_eq!(scored.title_score, 1.0);
        assert!(scored.weighted_score > 0.9, "got {}", scored.weighted_score);
    }

    #[test]
    fn test_score_mismatched_candidate_ranks_low() {
        let query = NormalizedQuery::parse("Massano - Welcome To The Underworld");
        let good = score_candidate(
            &query,
            &candidate("Massano", "Welcome To The Underworld"),
            &ScoreWeights::default(),
        );
        let bad = score_candidate(
            &query,
            &candidate("Somebody Else", "A Different Song Entirely"),
            &ScoreWeights::default(),
        );
        assert!(good.weighted_score > bad.weighted_score);
        assert!(bad.weighted_score < 0.5, "got {}", bad.weighted_score);
    }

    #[test]
    fn test_score_range_holds_for_junk_input() {
        let query = NormalizedQuery::parse(" - ");
        let scored = score_candidate(
            &query,
            &candidate("Queen", "Bohemian Rhapsody"),
            &ScoreWeights::default(),
        );
        assert!((0.0..=1.0).contains(&scored.weighted_score));
    }
}
