//! Run configuration, loaded from a TOML file.
//!
//! Every tunable is optional in the file and falls back to a documented
//! default; [`Config::validate`] rejects out-of-range values at load time
//! so the pipeline never has to re-check them.
//!
//! ```toml
//! playlist_name = "Warehouse Set 2023"
//! similarity_threshold = 0.75
//! songs = [
//!     "Massano - Welcome To The Underworld",
//!     "Angelov - Skedo",
//! ]
//! ```

use serde::Deserialize;
use std::error::Error;
use std::fs;

use crate::matcher::MatcherSettings;
use crate::query::DEFAULT_SUFFIXES;
use crate::session::OauthClient;
use crate::similarity::ScoreWeights;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Playlist to create or extend.
    pub playlist_name: String,

    /// Raw "Artist - Title" queries, resolved in list order.
    #[serde(default)]
    pub songs: Vec<String>,

    /// Verbose per-query candidate diagnostics.
    #[serde(default)]
    pub debug: bool,

    /// Per-variant result cap passed to the search endpoint.
    pub search_limit: Option<u32>,

    /// How many ranked candidates the debug report shows.
    pub debug_candidates: Option<usize>,

    /// Weighted score below which a match is flagged low-confidence.
    pub similarity_threshold: Option<f64>,

    /// Trailing annotations removed by the no-suffix variant rule.
    pub suffixes: Option<Vec<String>>,

    /// Scoring weights; title and full-string match outweigh artist match.
    pub weight_full: Option<f64>,
    pub weight_title: Option<f64>,
    pub weight_artist: Option<f64>,

    /// Minimum gap between search calls, milliseconds.
    pub search_interval_ms: Option<u64>,

    /// OAuth client overrides.
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &str) -> Result<Self, Box<dyn Error>> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range values up front.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.playlist_name.trim().is_empty() {
            return Err("playlist_name must not be empty".into());
        }
        let threshold = self.similarity_threshold();
        if !(0.0..=1.0).contains(&threshold) {
            return Err(format!(
                "similarity_threshold must be within 0..=1, got {}",
                threshold
            )
            .into());
        }
        if self.search_limit() == 0 {
            return Err("search_limit must be at least 1".into());
        }
        if self.debug_candidates() == 0 {
            return Err("debug_candidates must be at least 1".into());
        }
        let w = self.weights();
        if w.full < 0.0 || w.title < 0.0 || w.artist < 0.0 || w.full + w.title <= 0.0 {
            return Err("scoring weights must be non-negative with full + title > 0".into());
        }
        Ok(())
    }

    pub fn search_limit(&self) -> u32 {
        self.search_limit.unwrap_or(5)
    }

    pub fn debug_candidates(&self) -> usize {
        self.debug_candidates.unwrap_or(3)
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold.unwrap_or(0.75)
    }

    pub fn weights(&self) -> ScoreWeights {
        let default = ScoreWeights::default();
        ScoreWeights {
            full: self.weight_full.unwrap_or(default.full),
            title: self.weight_title.unwrap_or(default.title),
            artist: self.weight_artist.unwrap_or(default.artist),
        }
    }

    pub fn suffixes(&self) -> Vec<String> {
        self.suffixes
            .clone()
            .unwrap_or_else(|| DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect())
    }

    /// The matcher's view of this configuration.
    pub fn matcher_settings(&self) -> MatcherSettings {
        MatcherSettings {
            search_limit: self.search_limit(),
            top_candidates: self.debug_candidates(),
            similarity_threshold: self.similarity_threshold(),
            weights: self.weights(),
            suffixes: self.suffixes(),
            search_interval_ms: self.search_interval_ms.unwrap_or(400),
            debug: self.debug,
        }
    }

    pub fn oauth_client(&self) -> OauthClient {
        let default = OauthClient::default();
        OauthClient {
            id: self.client_id.clone().unwrap_or(default.id),
            secret: self.client_secret.clone().unwrap_or(default.secret),
        }
    }

    /// Echo the effective settings, for startup diagnostics.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  Playlist:             {}", self.playlist_name);
        println!("  Songs:                {}", self.songs.len());
        println!("  Search limit:         {}", self.search_limit());
        println!("  Similarity threshold: {}", self.similarity_threshold());
        println!("  Debug candidates:     {}", self.debug_candidates());
        let w = self.weights();
        println!(
            "  Weights:              full {} / title {} / artist {}",
            w.full, w.title, w.artist
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(r#"playlist_name = "Set""#);
        assert!(config.validate().is_ok());
        assert_eq!(config.search_limit(), 5);
        assert_eq!(config.debug_candidates(), 3);
        assert_eq!(config.similarity_threshold(), 0.75);
        assert!(!config.debug);
        assert!(config.songs.is_empty());
        let w = config.weights();
        assert_eq!((w.full, w.title, w.artist), (0.4, 0.4, 0.2));
    }

    #[test]
    fn test_full_config_parses() {
        let config = parse(
            r#"
            playlist_name = "Warehouse Set"
            debug = true
            search_limit = 10
            debug_candidates = 5
            similarity_threshold = 0.6
            suffixes = ["Dub", "Rework"]
            weight_full = 0.5
            weight_title = 0.3
            weight_artist = 0.2
            songs = ["Massano - ANA", "Dyzen - Laser Game"]
            "#,
        );
        assert!(config.validate().is_ok());
        assert_eq!(config.songs.len(), 2);
        assert_eq!(config.suffixes(), vec!["Dub", "Rework"]);
        assert_eq!(config.search_limit(), 10);
        assert!(config.debug);
    }

    #[test]
    fn test_validation_rejects_out_of_range_values() {
        let bad_threshold = parse(
            r#"
            playlist_name = "Set"
            similarity_threshold = 1.5
            "#,
        );
        assert!(bad_threshold.validate().is_err());

        let zero_limit = parse(
            r#"
            playlist_name = "Set"
            search_limit = 0
            "#,
        );
        assert!(zero_limit.validate().is_err());

        let empty_name = parse(r#"playlist_name = "  ""#);
        assert!(empty_name.validate().is_err());
    }
}
