use std::collections::HashMap;

use serde::Deserialize;
use tracing::warn;

use super::{NormalizedBatch, from_row};
use crate::domain::{
    Conference, CountingStats, PlayerCareerStats, PlayerSeasonStats, Standing, Team,
    TeamSeasonStats,
};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct StandingRow {
    team: i64,
    wins: i64,
    losses: i64,
    home_record: String,
    away_record: String,
    win_percent: f64,
}

#[derive(Debug, Deserialize)]
struct TeamSeasonStatsRow {
    team: i64,
    wins: i64,
    losses: i64,
    win_percent: f64,
    #[serde(flatten)]
    stats: CountingStats,
}

#[derive(Debug, Deserialize)]
struct PlayerSeasonStatsRow {
    player: i64,
    curr_team: i64,
    season: String,
    games_played: i64,
    games_started: i64,
    #[serde(flatten)]
    stats: CountingStats,
}

#[derive(Debug, Deserialize)]
struct PlayerCareerStatsRow {
    player: i64,
    games_played: i64,
    games_started: i64,
    #[serde(flatten)]
    stats: CountingStats,
}

/// Builds Standing entities from the standings table. The sentinel team has
/// no standing semantics and is dropped if upstream ever serves it.
pub fn assemble_standings(batch: &NormalizedBatch) -> Result<Vec<Standing>, AppError> {
    let mut standings = Vec::with_capacity(batch.standings.len());
    for row in &batch.standings {
        let standing: StandingRow = from_row(row, "standings")?;
        if standing.team == crate::constants::SENTINEL_TEAM_ID {
            warn!("Standings table lists the sentinel team; dropping");
            continue;
        }
        standings.push(Standing {
            team: standing.team,
            wins: standing.wins,
            losses: standing.losses,
            home_record: standing.home_record,
            away_record: standing.away_record,
            win_percent: standing.win_percent,
        });
    }
    Ok(standings)
}

pub fn assemble_team_season_stats(
    batch: &NormalizedBatch,
) -> Result<Vec<TeamSeasonStats>, AppError> {
    let mut rows = Vec::with_capacity(batch.team_season_stats.len());
    for (season_type, row) in &batch.team_season_stats {
        let parsed: TeamSeasonStatsRow = from_row(row, "season_stats")?;
        rows.push(TeamSeasonStats {
            team: parsed.team,
            season: batch.season.clone(),
            season_type: *season_type,
            wins: parsed.wins,
            losses: parsed.losses,
            win_percent: parsed.win_percent,
            stats: parsed.stats,
        });
    }
    Ok(rows)
}

pub fn assemble_player_season_stats(
    batch: &NormalizedBatch,
) -> Result<Vec<PlayerSeasonStats>, AppError> {
    let mut rows = Vec::with_capacity(batch.player_season_stats.len());
    for (season_type, row) in &batch.player_season_stats {
        let parsed: PlayerSeasonStatsRow = from_row(row, "season_stats")?;
        rows.push(PlayerSeasonStats {
            player: parsed.player,
            curr_team: parsed.curr_team,
            season: parsed.season,
            season_type: *season_type,
            games_played: parsed.games_played,
            games_started: parsed.games_started,
            stats: parsed.stats,
        });
    }
    Ok(rows)
}

pub fn assemble_player_career_stats(
    batch: &NormalizedBatch,
) -> Result<Vec<PlayerCareerStats>, AppError> {
    let mut rows = Vec::with_capacity(batch.player_career_stats.len());
    for (season_type, row) in &batch.player_career_stats {
        let parsed: PlayerCareerStatsRow = from_row(row, "career_stats")?;
        rows.push(PlayerCareerStats {
            player: parsed.player,
            season_type: *season_type,
            games_played: parsed.games_played,
            games_started: parsed.games_started,
            stats: parsed.stats,
        });
    }
    Ok(rows)
}

/// Rank value of a "W-L" record string: more wins first, then fewer losses.
fn record_rank(record: &str) -> (i64, i64) {
    let mut parts = record.splitn(2, '-');
    let wins = parts
        .next()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(0);
    let losses = parts
        .next()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(0);
    (wins, -losses)
}

/// Standings of one conference, seeded.
///
/// Seed is rank by (win percentage, wins, home record, road record), all
/// descending, ties broken in that order. Teams without a conference (the
/// sentinel) never participate.
pub fn conference_seeds(
    teams: &[Team],
    standings: &[Standing],
    conference: Conference,
) -> Vec<Standing> {
    let conference_of: HashMap<i64, Conference> = teams
        .iter()
        .filter_map(|t| t.team_conf.map(|c| (t.team_id, c)))
        .collect();

    let mut seeded: Vec<Standing> = standings
        .iter()
        .filter(|s| conference_of.get(&s.team) == Some(&conference))
        .cloned()
        .collect();

    seeded.sort_by(|a, b| {
        b.win_percent
            .total_cmp(&a.win_percent)
            .then_with(|| b.wins.cmp(&a.wins))
            .then_with(|| record_rank(&b.home_record).cmp(&record_rank(&a.home_record)))
            .then_with(|| record_rank(&b.away_record).cmp(&record_rank(&a.away_record)))
    });
    seeded
}
