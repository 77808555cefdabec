//! Query normalization and search-variant generation.
//!
//! A raw song entry like "Artist - Title (Extended Mix)" rarely matches the
//! catalog's naming as-is.  [`NormalizedQuery::parse`] splits the entry into
//! artist and title, and [`generate_variants`] derives the alternate
//! phrasings that are each sent to the search API: separator removed,
//! artist/title order swapped, parenthetical annotations dropped, trailing
//! mix/edit suffixes dropped, featuring clauses dropped.

use std::collections::HashSet;

/// Artist/title separator convention used by song lists.
const SEPARATOR: &str = " - ";

/// Default trailing annotations removed by the no-suffix rule.
pub const DEFAULT_SUFFIXES: &[&str] = &[
    "Extended Mix",
    "Original Mix",
    "Radio Edit",
    "Club Mix",
    "Remix",
    "Edit",
];

/// Words that introduce a featuring-artist clause.
const FEAT_MARKERS: &[&str] = &["feat.", "featuring", "ft."];

// ── Normalization ────────────────────────────────────────────────────────────

/// A raw query split into its artist/title components.
#[derive(Debug, Clone)]
pub struct NormalizedQuery {
    /// Artist part; absent when the query carries no " - " separator.
    pub artist: Option<String>,
    /// Title part; the whole query when no separator is present.
    pub title: String,
    /// The trimmed query as supplied.
    pub full_text: String,
}

impl NormalizedQuery {
    /// Split a raw query on the first " - " occurrence.  Never fails: any
    /// input, including the empty string, produces a normalized form (the
    /// title is then empty and downstream scoring stays near zero).
    pub fn parse(raw: &str) -> Self {
        let full_text = raw.trim().to_string();
        if let Some((artist, title)) = full_text.split_once(SEPARATOR) {
            let artist = artist.trim().to_string();
            let title = title.trim().to_string();
            return NormalizedQuery {
                artist: Some(artist),
                title,
                full_text,
            };
        }
        NormalizedQuery {
            artist: None,
            title: full_text.clone(),
            full_text,
        }
    }
}

// ── Variant generation ───────────────────────────────────────────────────────

/// One generated search string plus the rule that produced it.
#[derive(Debug, Clone)]
pub struct QueryVariant {
    pub tag: &'static str,
    pub text: String,
}

/// Generate the ordered, deduplicated variant list for one query.
///
/// Each rule derives at most one variant from the base normalized form;
/// rules are never chained, so the output is bounded by the rule count.
/// Variants equal to an earlier one (case- and whitespace-insensitively)
/// are dropped, keeping first-seen order.
pub fn generate_variants(query: &NormalizedQuery, suffixes: &[String]) -> Vec<QueryVariant> {
    let mut variants = Vec::new();
    let mut seen = HashSet::new();

    push(&mut variants, &mut seen, "original", query.full_text.clone());

    if let Some(artist) = &query.artist {
        push(
            &mut variants,
            &mut seen,
            "no-separator",
            format!("{} {}", artist, query.title),
        );
        push(
            &mut variants,
            &mut seen,
            "inverted",
            format!("{} {}", query.title, artist),
        );
    }

    if query.title.contains('(') {
        let stripped = strip_parens(&query.title);
        if !stripped.is_empty() {
            push(
                &mut variants,
                &mut seen,
                "no-parens",
                compose(query.artist.as_deref(), &stripped),
            );
        }
    }

    if let Some(stripped) = strip_suffix_tokens(&query.title, suffixes) {
        push(
            &mut variants,
            &mut seen,
            "no-suffix",
            compose(query.artist.as_deref(), &stripped),
        );
    }

    // A featuring clause can live in either field.
    let artist_stripped = query.artist.as_deref().and_then(strip_feat);
    let title_stripped = strip_feat(&query.title);
    if artist_stripped.is_some() || title_stripped.is_some() {
        let artist = artist_stripped.or_else(|| query.artist.clone());
        let title = title_stripped.unwrap_or_else(|| query.title.clone());
        push(
            &mut variants,
            &mut seen,
            "no-feat",
            compose(artist.as_deref(), &title),
        );
    }

    variants
}

fn push(
    variants: &mut Vec<QueryVariant>,
    seen: &mut HashSet<String>,
    tag: &'static str,
    text: String,
) {
    let key = dedup_key(&text);
    if seen.contains(&key) {
        return;
    }
    // Derived rules never contribute an empty string; the original variant
    // may be empty (an empty raw query legitimately searches for nothing).
    if text.trim().is_empty() && !variants.is_empty() {
        return;
    }
    seen.insert(key);
    variants.push(QueryVariant { tag, text });
}

/// Case- and whitespace-insensitive comparison key.
fn dedup_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Rebuild a query string from its parts.
fn compose(artist: Option<&str>, title: &str) -> String {
    match artist {
        Some(a) if !a.is_empty() => format!("{}{}{}", a, SEPARATOR, title),
        _ => title.to_string(),
    }
}

/// Remove every `(...)` span, collapsing the whitespace left behind.
fn strip_parens(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0u32;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop a trailing suffix from the configured list, matched word-wise and
/// case-insensitively, with or without surrounding parentheses.
/// Returns `None` when no suffix matches or stripping would empty the title.
fn strip_suffix_tokens(title: &str, suffixes: &[String]) -> Option<String> {
    let words: Vec<&str> = title.split_whitespace().collect();
    for suffix in suffixes {
        let suffix_words: Vec<String> = suffix
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        if suffix_words.is_empty() || words.len() <= suffix_words.len() {
            continue;
        }
        let tail = &words[words.len() - suffix_words.len()..];
        let matches = tail.iter().zip(&suffix_words).all(|(word, expect)| {
            word.trim_matches(|c| c == '(' || c == ')').to_lowercase() == *expect
        });
        if matches {
            let head = words[..words.len() - suffix_words.len()].join(" ");
            let head = head
                .trim_end_matches('(')
                .trim_end()
                .trim_end_matches('-')
                .trim_end();
            if !head.is_empty() {
                return Some(head.to_string());
            }
        }
    }
    None
}

/// Cut a featuring clause ("feat." / "featuring" / "ft." and everything
/// after it) out of a field.  Returns `None` when the field has no clause
/// or the clause starts the field.
fn strip_feat(field: &str) -> Option<String> {
    let words: Vec<&str> = field.split_whitespace().collect();
    let at = words.iter().position(|w| {
        let w = w.trim_start_matches('(').to_lowercase();
        FEAT_MARKERS
            .iter()
            .any(|m| w == *m || w == m.trim_end_matches('.'))
    })?;
    if at == 0 {
        return None;
    }
    Some(words[..at].join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suffixes() -> Vec<String> {
        DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect()
    }

    fn texts(variants: &[QueryVariant]) -> Vec<&str> {
        variants.iter().map(|v| v.text.as_str()).collect()
    }

    #[test]
    fn test_parse_splits_on_first_separator() {
        let q = NormalizedQuery::parse("Depeche Mode - Ghosts Again (Massano Remix)");
        assert_eq!(q.artist.as_deref(), Some("Depeche Mode"));
        assert_eq!(q.title, "Ghosts Again (Massano Remix)");
        assert_eq!(q.full_text, "Depeche Mode - Ghosts Again (Massano Remix)");

        // Only the first separator splits; the rest stays in the title.
        let q = NormalizedQuery::parse("A - B - C");
        assert_eq!(q.artist.as_deref(), Some("A"));
        assert_eq!(q.title, "B - C");
    }

    #[test]
    fn test_parse_without_separator() {
        let q = NormalizedQuery::parse("  Bohemian Rhapsody  ");
        assert!(q.artist.is_none());
        assert_eq!(q.title, "Bohemian Rhapsody");
        assert_eq!(q.full_text, "Bohemian Rhapsody");
    }

    #[test]
    fn test_parse_empty_never_fails() {
        let q = NormalizedQuery::parse("");
        assert!(q.artist.is_none());
        assert_eq!(q.title, "");
        assert_eq!(q.full_text, "");
    }

    #[test]
    fn test_variants_plain_query() {
        let q = NormalizedQuery::parse("EdOne - Don't You Know");
        let v = generate_variants(&q, &suffixes());
        assert_eq!(
            texts(&v),
            vec![
                "EdOne - Don't You Know",
                "EdOne Don't You Know",
                "Don't You Know EdOne",
            ]
        );
        assert_eq!(v[0].tag, "original");
        assert_eq!(v[1].tag, "no-separator");
        assert_eq!(v[2].tag, "inverted");
    }

    #[test]
    fn test_variants_strip_parens_and_suffix() {
        let q = NormalizedQuery::parse("Artist - Song (Extended Mix)");
        let v = generate_variants(&q, &suffixes());
        // no-parens and no-suffix both reduce to "Artist - Song"; the
        // duplicate is dropped and only the first-seen rule survives.
        let stripped: Vec<&QueryVariant> =
            v.iter().filter(|x| x.text == "Artist - Song").collect();
        assert_eq!(stripped.len(), 1);
        assert_eq!(stripped[0].tag, "no-parens");
    }

    #[test]
    fn test_variants_strip_bare_suffix() {
        let q = NormalizedQuery::parse("Artist - Song Radio Edit");
        let v = generate_variants(&q, &suffixes());
        assert!(v.iter().any(|x| x.tag == "no-suffix" && x.text == "Artist - Song"));
    }

    #[test]
    fn test_variants_strip_feat_from_artist() {
        let q = NormalizedQuery::parse("Adriatique ft. Delhia De France - The Future Is Unknown");
        let v = generate_variants(&q, &suffixes());
        assert!(v
            .iter()
            .any(|x| x.tag == "no-feat" && x.text == "Adriatique - The Future Is Unknown"));
    }

    #[test]
    fn test_variants_strip_feat_from_title() {
        let q = NormalizedQuery::parse("Artist - Song (feat. Somebody)");
        let v = generate_variants(&q, &suffixes());
        assert!(v.iter().any(|x| x.text == "Artist - Song"));
    }

    #[test]
    fn test_variants_no_artist_rules_without_separator() {
        let q = NormalizedQuery::parse("Bohemian Rhapsody");
        let v = generate_variants(&q, &suffixes());
        assert_eq!(texts(&v), vec!["Bohemian Rhapsody"]);
    }

    #[test]
    fn test_variants_deduplicated_case_insensitively() {
        // no-separator and inverted collapse to the same string here.
        let q = NormalizedQuery::parse("Cherry - cherry");
        let v = generate_variants(&q, &suffixes());
        assert_eq!(v.len(), 2);
        assert_eq!(v[1].tag, "no-separator");
    }

    #[test]
    fn test_variants_at_most_one_per_rule() {
        let q = NormalizedQuery::parse("A ft. B - Song (Live) (Extended Mix) Remix");
        let v = generate_variants(&q, &suffixes());
        let mut tags: Vec<&str> = v.iter().map(|x| x.tag).collect();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), v.len(), "one variant per rule: {:?}", v);
    }

    #[test]
    fn test_strip_feat_never_empties_field() {
        assert_eq!(strip_feat("feat. Somebody"), None);
        assert_eq!(strip_feat("Massano ft. braev").as_deref(), Some("Massano"));
        assert_eq!(strip_feat("Plain Artist"), None);
    }

    #[test]
    fn test_strip_suffix_requires_remaining_words() {
        assert_eq!(strip_suffix_tokens("Remix", &suffixes()), None);
        assert_eq!(
            strip_suffix_tokens("Song Remix", &suffixes()).as_deref(),
            Some("Song")
        );
    }
}
