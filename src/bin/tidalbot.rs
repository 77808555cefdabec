//! Build a Tidal playlist from a configured song list.
//!
//! Usage:
//!   tidalbot [CONFIG_FILE]
//!
//! CONFIG_FILE defaults to `tidalbot.toml` in the working directory.  On
//! first run the tool walks the OAuth device flow and saves the session;
//! later runs reuse it.

use std::process;

use tidalbot::config::Config;
use tidalbot::matcher::TrackMatcher;
use tidalbot::session::establish_session;
use tidalbot::sync::process_songs;
use tidalbot::tidal::TidalClient;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let config_path = args.get(1).map(|s| s.as_str()).unwrap_or("tidalbot.toml");

    let config = match Config::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {}: {}", config_path, e);
            process::exit(1);
        }
    };
    if config.debug {
        config.print();
    }
    if config.songs.is_empty() {
        eprintln!("The song list in {} is empty, nothing to do", config_path);
        process::exit(1);
    }

    let session = match establish_session(&config.oauth_client()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Tidal login failed: {}", e);
            process::exit(1);
        }
    };
    let client = TidalClient::new(session);

    println!("{}", "-".repeat(40));

    let playlist = match client.find_or_create_playlist(&config.playlist_name) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Could not find or create the playlist: {}", e);
            process::exit(1);
        }
    };

    let mut existing = match client.playlist_track_ids(&playlist.uuid) {
        Ok(ids) => ids,
        Err(e) => {
            eprintln!("Could not read the playlist's tracks: {}", e);
            process::exit(1);
        }
    };
    println!("The playlist already holds {} track(s)", existing.len());
    println!("{}", "-".repeat(40));

    let mut matcher = TrackMatcher::new(&client, config.matcher_settings());
    let stats = process_songs(
        &client,
        &mut matcher,
        &playlist,
        &mut existing,
        &config.songs,
        config.debug,
        config.debug_candidates(),
    );

    stats.print();
    println!("Done.");
}
