pub mod config;
pub mod matcher;
pub mod progress;
pub mod query;
pub mod rate_limiter;
pub mod session;
pub mod similarity;
pub mod sync;
pub mod tidal;

pub use config::Config;
pub use matcher::{
    Candidate, CatalogSearch, MatchResult, MatcherSettings, ScoredCandidate, TrackMatcher,
};
pub use query::{generate_variants, NormalizedQuery, QueryVariant};
pub use session::{establish_session, OauthClient, TidalSession};
pub use similarity::{score_candidate, similarity, ScoreWeights};
pub use sync::{process_songs, SyncStats};
pub use tidal::{Playlist, TidalClient};
