//! Song-list processing: resolve each entry and keep the playlist in sync.
//!
//! One entry never aborts the run: provider failures, low-confidence
//! matches and add errors are tallied and the loop moves on to the next
//! song.  Every entry classifies as exactly one of: added, already
//! present, low confidence, not found, or error.

use std::collections::HashSet;

use crate::matcher::TrackMatcher;
use crate::progress::{print_match_report, ProgressBar};
use crate::tidal::{Playlist, TidalClient};

/// End-of-run tally.
#[derive(Debug, Default, Clone)]
pub struct SyncStats {
    pub added: u32,
    pub duplicates: u32,
    pub low_confidence: u32,
    pub not_found: u32,
    pub errors: u32,
}

impl SyncStats {
    pub fn print(&self) {
        println!();
        println!("Summary:");
        println!("  Added:           {}", self.added);
        println!("  Already present: {}", self.duplicates);
        println!("  Low confidence:  {}", self.low_confidence);
        println!("  Not found:       {}", self.not_found);
        println!("  Errors:          {}", self.errors);
    }
}

/// Resolve every song in order and add confident matches to the playlist.
///
/// `existing` carries the playlist's current track ids and is updated as
/// tracks are added, so repeated list entries count as duplicates.
pub fn process_songs(
    client: &TidalClient,
    matcher: &mut TrackMatcher,
    playlist: &Playlist,
    existing: &mut HashSet<u64>,
    songs: &[String],
    debug: bool,
    debug_candidates: usize,
) -> SyncStats {
    let mut stats = SyncStats::default();
    let mut bar = ProgressBar::new(songs.len());

    for raw in songs {
        let query = raw.trim();
        if query.is_empty() {
            bar.advance();
            continue;
        }
        let _ = bar.draw(&format!("searching: {}", query));

        let result = matcher.resolve(query).clone();

        if debug {
            let _ = bar.finish();
            print_match_report(&result, debug_candidates);
        }

        match &result.best {
            None => {
                let _ = bar.log(&format!("NOT FOUND: \"{}\"", query));
                stats.not_found += 1;
            }
            Some(best) if result.low_confidence => {
                let c = &best.candidate;
                let _ = bar.log(&format!(
                    "LOW CONFIDENCE: \"{}\" -> {} - {} (score {:.2}), skipped",
                    query, c.artist, c.title, best.weighted_score
                ));
                stats.low_confidence += 1;
            }
            Some(best) => {
                let c = &best.candidate;
                if existing.contains(&c.id) {
                    let _ = bar.log(&format!("ALREADY PRESENT: {} - {}", c.artist, c.title));
                    stats.duplicates += 1;
                } else {
                    match client.add_track(&playlist.uuid, c.id) {
                        Ok(()) => {
                            existing.insert(c.id);
                            let _ = bar.log(&format!("ADDED: {} - {}", c.artist, c.title));
                            stats.added += 1;
                        }
                        Err(e) => {
                            let _ = bar.log(&format!(
                                "ADD FAILED: {} - {}: {}",
                                c.artist, c.title, e
                            ));
                            stats.errors += 1;
                        }
                    }
                }
            }
        }

        bar.advance();
    }

    let _ = bar.finish();
    stats
}
