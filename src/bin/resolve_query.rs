//! Resolve song queries against the live search API without touching any
//! playlist.  Debugging aid for the variant and scoring pipeline.
//!
//! Usage:
//!   resolve_query [--config FILE] "Artist - Title" ["Artist - Title" ...]

use std::process;

use tidalbot::config::Config;
use tidalbot::matcher::{MatcherSettings, TrackMatcher};
use tidalbot::progress::print_match_report;
use tidalbot::session::{establish_session, OauthClient};
use tidalbot::tidal::TidalClient;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut settings = MatcherSettings::default();
    let mut oauth = OauthClient::default();
    let mut queries: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        if args[i] == "--config" {
            let path = args.get(i + 1).unwrap_or_else(|| {
                eprintln!("--config requires a file path");
                process::exit(2);
            });
            match Config::load(path) {
                Ok(config) => {
                    settings = config.matcher_settings();
                    oauth = config.oauth_client();
                }
                Err(e) => {
                    eprintln!("Failed to load {}: {}", path, e);
                    process::exit(1);
                }
            }
            i += 2;
        } else {
            queries.push(args[i].clone());
            i += 1;
        }
    }

    if queries.is_empty() {
        eprintln!("Usage: resolve_query [--config FILE] \"Artist - Title\" ...");
        process::exit(2);
    }
    settings.debug = true;
    let debug_candidates = settings.top_candidates;

    let session = match establish_session(&oauth) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Tidal login failed: {}", e);
            process::exit(1);
        }
    };
    let client = TidalClient::new(session);
    let mut matcher = TrackMatcher::new(&client, settings);

    for query in &queries {
        println!();
        println!("=== {} ===", query);
        let result = matcher.resolve(query).clone();
        print_match_report(&result, debug_candidates);
        match &result.best {
            Some(best) => {
                let c = &best.candidate;
                println!(
                    "Best: {} - {} (id {}, score {:.3}{})",
                    c.artist,
                    c.title,
                    c.id,
                    best.weighted_score,
                    if result.low_confidence {
                        ", LOW CONFIDENCE"
                    } else {
                        ""
                    }
                );
            }
            None => println!("No match found"),
        }
    }
}
