//! Application-wide constants and configuration values
//!
//! This module centralizes all magic numbers and configuration constants
//! to improve maintainability and make the codebase more configurable.

#![allow(dead_code)]

/// Default timeout for HTTP requests in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Maximum number of connections per host in the HTTP client pool
pub const HTTP_POOL_MAX_IDLE_PER_HOST: usize = 100;

/// Synthetic team id used for players who changed team mid-season ("TOT").
/// It never participates in standings or conference computations.
pub const SENTINEL_TEAM_ID: i64 = 0;

/// Number of overtime period columns carried by the line score table
pub const OVERTIME_PERIODS: usize = 10;

/// Upstream request pacing and retry policy.
///
/// The stats provider throttles aggressively, so a fixed minimum delay is
/// kept between sequential calls to the same endpoint family. This is a
/// deliberate flat pacing policy rather than adaptive backoff: the provider
/// responds to bursts, not to sustained slow traffic.
pub mod pacing {
    /// Minimum delay between requests to per-entity endpoints
    /// (box scores, team game logs, player career splits)
    pub const PER_ENTITY_DELAY_MS: u64 = 500;

    /// Minimum delay between requests to league-wide endpoints
    /// (team list, player index, standings, league game logs)
    pub const LEAGUE_DELAY_MS: u64 = 1000;

    /// Bounded retry attempts for a single fetch before the whole
    /// table-kind batch is marked failed
    pub const MAX_RETRY_ATTEMPTS: u32 = 3;
}

/// Environment variable names
pub mod env_vars {
    /// Environment variable for API domain override
    pub const API_DOMAIN: &str = "HOOPSNAP_API_DOMAIN";

    /// Environment variable for log file path override
    pub const LOG_FILE: &str = "HOOPSNAP_LOG_FILE";

    /// Environment variable for HTTP timeout override in seconds
    pub const HTTP_TIMEOUT: &str = "HOOPSNAP_HTTP_TIMEOUT";

    /// Environment variable for database path override
    pub const DATABASE_PATH: &str = "HOOPSNAP_DATABASE_PATH";
}

/// Display formatting values used at the read boundary
pub mod display {
    /// Game dates render as e.g. "Oct 16, 2018"
    pub const GAME_DATE_FORMAT: &str = "%b %d, %Y";

    /// Zero playing time for did-not-play box score rows
    pub const ZERO_MINUTES: &str = "00:00";

    /// Placeholder for players without a listed school
    pub const UNKNOWN_SCHOOL: &str = "N/A";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pacing_hierarchy() {
        // League-wide endpoints return larger payloads and are throttled harder
        assert!(pacing::LEAGUE_DELAY_MS >= pacing::PER_ENTITY_DELAY_MS);
        assert!(pacing::MAX_RETRY_ATTEMPTS >= 1);
    }

    #[test]
    fn test_sentinel_team_id_is_reserved() {
        // Upstream franchise ids are ten-digit numbers; zero can never collide
        assert_eq!(SENTINEL_TEAM_ID, 0);
    }
}
