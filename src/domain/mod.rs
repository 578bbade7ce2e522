//! Persisted domain model
//!
//! Entity shapes for one season snapshot. All identifiers are externally
//! assigned by the upstream provider; nothing here generates keys.

pub mod models;

pub use models::{
    Conference, CountingStats, Game, GameResult, Player, PlayerCareerStats, PlayerGameLog,
    PlayerSeasonStats, SeasonSnapshot, SeasonType, Standing, Team, TeamGameLog, TeamSeasonStats,
    derived_age, overtime_periods,
};
