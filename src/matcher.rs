//! Track matching pipeline: variant dispatch, dedup, scoring, ranking and
//! per-query result caching.
//!
//! [`TrackMatcher::resolve`] runs one raw query through the whole pipeline
//! (normalize, generate variants, search the catalog once per variant,
//! collapse duplicate hits, score, rank) and memoizes the outcome, so a
//! song list with repeated entries costs one provider round-trip set per
//! unique raw string.

use std::collections::{HashMap, HashSet};
use std::error::Error;

use crate::query::{generate_variants, NormalizedQuery, QueryVariant, DEFAULT_SUFFIXES};
use crate::rate_limiter::RateLimiter;
use crate::similarity::{score_candidate, ScoreWeights};

// ── Provider seam ────────────────────────────────────────────────────────────

/// A catalog that can be searched for tracks.  Implemented by the Tidal
/// client; tests drive the pipeline with scripted stand-ins.
pub trait CatalogSearch {
    /// Short display name for log messages, e.g. "Tidal".
    fn name(&self) -> &str;

    /// Free-text track search returning up to `limit` raw hits.
    fn search(&self, query: &str, limit: u32) -> Result<Vec<Candidate>, Box<dyn Error>>;
}

// ── Pipeline types ───────────────────────────────────────────────────────────

/// One catalog track as returned by the search provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Provider track id; the uniqueness key for deduplication.
    pub id: u64,
    pub artist: String,
    pub title: String,
    pub album: Option<String>,
    pub year: Option<u32>,
}

/// A candidate with its component and combined similarity scores,
/// all in [0.0, 1.0].
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub full_score: f64,
    pub title_score: f64,
    pub artist_score: f64,
    pub weighted_score: f64,
}

/// Outcome of resolving one raw query.  Immutable once created; cache
/// entries are handed back as-is on repeat lookups.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// The raw query exactly as supplied.
    pub query: String,
    /// Highest-scoring candidate, absent when every search came up empty.
    pub best: Option<ScoredCandidate>,
    /// Ranked head of the candidate list, kept for diagnostics.
    pub top_candidates: Vec<ScoredCandidate>,
    /// True when `best` is absent or scored below the threshold.
    pub low_confidence: bool,
}

/// Matcher tunables, extracted from the configuration at startup.
#[derive(Debug, Clone)]
pub struct MatcherSettings {
    /// Per-variant result cap passed to the provider.
    pub search_limit: u32,
    /// How many ranked candidates a result retains.
    pub top_candidates: usize,
    /// Weighted score below which a match counts as low-confidence.
    pub similarity_threshold: f64,
    pub weights: ScoreWeights,
    /// Suffix list for the no-suffix variant rule.
    pub suffixes: Vec<String>,
    /// Minimum gap between provider calls, milliseconds.
    pub search_interval_ms: u64,
    /// Per-variant hit counts on stdout.
    pub debug: bool,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        MatcherSettings {
            search_limit: 5,
            top_candidates: 3,
            similarity_threshold: 0.75,
            weights: ScoreWeights::default(),
            suffixes: DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            search_interval_ms: 400,
            debug: false,
        }
    }
}

// ── Matcher ──────────────────────────────────────────────────────────────────

/// Drives queries through the pipeline against one search provider,
/// caching each raw query's result for the lifetime of the run.
pub struct TrackMatcher<'a> {
    provider: &'a dyn CatalogSearch,
    settings: MatcherSettings,
    limiter: RateLimiter,
    cache: HashMap<String, MatchResult>,
}

impl<'a> TrackMatcher<'a> {
    pub fn new(provider: &'a dyn CatalogSearch, settings: MatcherSettings) -> Self {
        let limiter = RateLimiter::new("search", settings.search_interval_ms);
        TrackMatcher {
            provider,
            settings,
            limiter,
            cache: HashMap::new(),
        }
    }

    /// Resolve a raw query to its best catalog match.
    ///
    /// The cache key is the exact raw string: differently cased or padded
    /// queries resolve independently.  A hit returns the stored result
    /// without touching the provider.
    pub fn resolve(&mut self, raw: &str) -> &MatchResult {
        if !self.cache.contains_key(raw) {
            let result = self.run_pipeline(raw);
            self.cache.insert(raw.to_string(), result);
        }
        &self.cache[raw]
    }

    fn run_pipeline(&mut self, raw: &str) -> MatchResult {
        let normalized = NormalizedQuery::parse(raw);
        let variants = generate_variants(&normalized, &self.settings.suffixes);

        let hits = self.dispatch(&variants);
        let unique = dedup_candidates(hits);

        let mut scored: Vec<ScoredCandidate> = unique
            .iter()
            .map(|c| score_candidate(&normalized, c, &self.settings.weights))
            .collect();

        // Stable sort: ties keep first-appearance order.
        scored.sort_by(|a, b| {
            b.weighted_score
                .partial_cmp(&a.weighted_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let best = scored.first().cloned();
        scored.truncate(self.settings.top_candidates);

        let low_confidence = match &best {
            Some(s) => s.weighted_score < self.settings.similarity_threshold,
            None => true,
        };

        MatchResult {
            query: raw.to_string(),
            best,
            top_candidates: scored,
            low_confidence,
        }
    }

    /// Query the provider once per variant, collecting every raw hit.
    /// A failed call contributes nothing and is logged; the remaining
    /// variants still run.  When every call fails the aggregate is empty
    /// and the caller produces a no-match result.
    fn dispatch(&mut self, variants: &[QueryVariant]) -> Vec<Candidate> {
        let mut hits = Vec::new();
        for variant in variants {
            self.limiter.pause();
            match self.provider.search(&variant.text, self.settings.search_limit) {
                Ok(found) => {
                    if self.settings.debug {
                        println!("  [{}] \"{}\": {} hit(s)", variant.tag, variant.text, found.len());
                    }
                    self.limiter.note_success();
                    hits.extend(found);
                }
                Err(e) => {
                    eprintln!(
                        "  {} search failed for \"{}\": {}",
                        self.provider.name(),
                        variant.text,
                        e
                    );
                    self.limiter.note_failure();
                }
            }
        }
        hits
    }
}

/// Collapse raw hits to one candidate per track id, keeping the first
/// occurrence's data and the order of first appearance.
pub fn dedup_candidates(hits: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    hits.into_iter().filter(|c| seen.insert(c.id)).collect()
}
