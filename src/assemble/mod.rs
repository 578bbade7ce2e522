//! Entity assembly
//!
//! Joins normalized tables across table kinds into the persisted entity
//! shapes: the roster (teams, players), games with their line scores and
//! box-score ordering, standings, and aggregate stat rows. All inputs are
//! storage-mode normalized rows; nothing here touches raw upstream tables.

pub mod games;
pub mod roster;
pub mod stats;

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::info;

use crate::domain::{SeasonSnapshot, SeasonType};
use crate::error::AppError;
use crate::normalize::Row;

/// The normalized tables of one game's box score fetches.
#[derive(Debug, Clone, Default)]
pub struct GameTables {
    /// Game summary rows (one per game)
    pub summary: Vec<Row>,
    /// Line score rows (two per game)
    pub line_score: Vec<Row>,
    /// Inactive player rows
    pub inactive: Vec<Row>,
    /// Traditional box score rows in upstream display order
    pub player_stats: Vec<Row>,
}

/// Accumulated normalized tables for one season, partitioned by table kind.
///
/// Buffers are append-only; box-score tables are additionally keyed per
/// game so concurrent fetches never interleave rows of different games.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub season: String,
    pub team_list: Vec<Row>,
    pub player_list: Vec<Row>,
    pub standings: Vec<Row>,
    pub team_game_logs: Vec<Row>,
    pub player_game_logs: Vec<Row>,
    pub box_scores: BTreeMap<String, GameTables>,
    pub team_season_stats: Vec<(SeasonType, Row)>,
    pub player_season_stats: Vec<(SeasonType, Row)>,
    pub player_career_stats: Vec<(SeasonType, Row)>,
}

impl NormalizedBatch {
    pub fn new(season: impl Into<String>) -> Self {
        NormalizedBatch {
            season: season.into(),
            ..Default::default()
        }
    }
}

/// Assembles a complete season snapshot from the normalized batch.
///
/// Entity order is deterministic: input table order everywhere, games by
/// their upstream id. Referential gaps (a game log or roster entry naming a
/// player the snapshot does not know) are dropped with a warning; integrity
/// contradictions (tied scores, mismatched results) abort assembly.
pub fn assemble(batch: &NormalizedBatch) -> Result<SeasonSnapshot, AppError> {
    roster::require_teams(batch)?;
    let teams = roster::assemble_teams(batch)?;
    let players = roster::assemble_players(batch, &teams)?;
    let games = games::assemble_games(batch, &players)?;
    let team_game_logs = games::assemble_team_game_logs(batch)?;
    games::validate_game_outcomes(&games, &team_game_logs)?;
    let player_game_logs = games::assemble_player_game_logs(batch, &players, &team_game_logs)?;
    let standings = stats::assemble_standings(batch)?;
    let team_season_stats = stats::assemble_team_season_stats(batch)?;
    let player_season_stats = stats::assemble_player_season_stats(batch)?;
    let player_career_stats = stats::assemble_player_career_stats(batch)?;

    info!(
        "Assembled snapshot for {}: {} teams, {} players, {} games, {} team logs, {} player logs",
        batch.season,
        teams.len(),
        players.len(),
        games.len(),
        team_game_logs.len(),
        player_game_logs.len()
    );

    Ok(SeasonSnapshot {
        season: batch.season.clone(),
        teams,
        players,
        games,
        team_game_logs,
        player_game_logs,
        standings,
        team_season_stats,
        player_season_stats,
        player_career_stats,
    })
}

/// Deserializes one normalized row into an entity whose field names match
/// the storage-mode rename map.
pub(crate) fn from_row<T: serde::de::DeserializeOwned>(
    row: &Row,
    table_kind: &str,
) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(row.clone())).map_err(|e| {
        AppError::schema_violation(table_kind, format!("normalized row rejected: {e}"))
    })
}

pub(crate) fn row_i64(row: &Row, key: &str) -> Option<i64> {
    row.get(key).and_then(Value::as_i64)
}

pub(crate) fn row_str<'a>(row: &'a Row, key: &str) -> Option<&'a str> {
    row.get(key).and_then(Value::as_str)
}
