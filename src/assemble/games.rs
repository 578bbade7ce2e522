use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Deserialize;
use tracing::warn;

use super::{NormalizedBatch, from_row, row_i64, row_str};
use crate::domain::{CountingStats, Game, GameResult, Player, PlayerGameLog, TeamGameLog};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct GameSummaryRow {
    game_id: String,
    game_date: String,
    home_team: i64,
    away_team: i64,
    broadcaster: String,
}

#[derive(Debug, Deserialize)]
struct TeamLogRow {
    game: String,
    team: i64,
    matchup: String,
    result: String,
    curr_wins: i64,
    curr_losses: i64,
    #[serde(flatten)]
    stats: CountingStats,
}

#[derive(Debug, Deserialize)]
struct LineScoreRow {
    game: String,
    team: i64,
    pts_q1: i64,
    pts_q2: i64,
    pts_q3: i64,
    pts_q4: i64,
    pts_ot1: i64,
    pts_ot2: i64,
    pts_ot3: i64,
    pts_ot4: i64,
    pts_ot5: i64,
    pts_ot6: i64,
    pts_ot7: i64,
    pts_ot8: i64,
    pts_ot9: i64,
    pts_ot10: i64,
}

#[derive(Debug, Deserialize)]
struct PlayerLogRow {
    game: String,
    player: i64,
    curr_team: i64,
    matchup: String,
    result: String,
    plus_minus: i64,
    #[serde(flatten)]
    stats: CountingStats,
}

fn parse_result(value: &str, table_kind: &str) -> Result<GameResult, AppError> {
    GameResult::parse(value).ok_or_else(|| {
        AppError::schema_violation(table_kind, format!("unexpected game result '{value}'"))
    })
}

/// Builds Game entities from the per-game box score tables.
///
/// The DNP map and inactive list only keep player ids present in the
/// already-assembled Player set; an unknown id is dropped with a warning
/// because roster data may lag, never a hard failure.
pub fn assemble_games(batch: &NormalizedBatch, players: &[Player]) -> Result<Vec<Game>, AppError> {
    let known_players: HashSet<i64> = players.iter().map(|p| p.player_id).collect();

    let mut games = Vec::with_capacity(batch.box_scores.len());
    for (game_id, tables) in &batch.box_scores {
        let summary_row = tables.summary.first().ok_or_else(|| {
            AppError::data_integrity(format!("game {game_id} has no game summary row"))
        })?;
        let summary: GameSummaryRow = from_row(summary_row, "box_score_summary")?;

        if summary.home_team == summary.away_team {
            return Err(AppError::data_integrity(format!(
                "game {game_id} lists team {} on both sides",
                summary.home_team
            )));
        }

        let mut inactive_players = Vec::new();
        for row in &tables.inactive {
            let Some(player_id) = row_i64(row, "player_id") else {
                continue;
            };
            if known_players.contains(&player_id) {
                inactive_players.push(player_id);
            } else {
                warn!(
                    "Game {game_id} lists unknown inactive player {player_id}; dropping"
                );
            }
        }

        let mut dnp_players = BTreeMap::new();
        for row in &tables.player_stats {
            let comment = row_str(row, "comment").unwrap_or("").trim();
            if comment.is_empty() {
                continue;
            }
            let Some(player_id) = row_i64(row, "player_id") else {
                continue;
            };
            if known_players.contains(&player_id) {
                dnp_players.insert(player_id, comment.to_string());
            } else {
                warn!("Game {game_id} lists unknown DNP player {player_id}; dropping");
            }
        }

        games.push(Game {
            game_id: summary.game_id,
            season: batch.season.clone(),
            game_date: summary.game_date,
            home_team: summary.home_team,
            away_team: summary.away_team,
            broadcaster: if summary.broadcaster.is_empty() {
                None
            } else {
                Some(summary.broadcaster)
            },
            inactive_players,
            dnp_players,
        });
    }
    Ok(games)
}

/// Builds TeamGameLog entities by joining each team's game log row with its
/// line score from the game's box score summary.
pub fn assemble_team_game_logs(batch: &NormalizedBatch) -> Result<Vec<TeamGameLog>, AppError> {
    let mut line_scores: HashMap<(String, i64), LineScoreRow> = HashMap::new();
    for tables in batch.box_scores.values() {
        for row in &tables.line_score {
            let line: LineScoreRow = from_row(row, "box_score_summary")?;
            line_scores.insert((line.game.clone(), line.team), line);
        }
    }

    let mut logs = Vec::with_capacity(batch.team_game_logs.len());
    for row in &batch.team_game_logs {
        let log: TeamLogRow = from_row(row, "team_game_log")?;
        let line = line_scores.get(&(log.game.clone(), log.team)).ok_or_else(|| {
            AppError::data_integrity(format!(
                "no line score for game {} team {}",
                log.game, log.team
            ))
        })?;

        logs.push(TeamGameLog {
            game: log.game,
            team: log.team,
            matchup: log.matchup,
            result: parse_result(&log.result, "team_game_log")?,
            curr_wins: log.curr_wins,
            curr_losses: log.curr_losses,
            stats: log.stats,
            pts_q1: line.pts_q1,
            pts_q2: line.pts_q2,
            pts_q3: line.pts_q3,
            pts_q4: line.pts_q4,
            pts_ot1: line.pts_ot1,
            pts_ot2: line.pts_ot2,
            pts_ot3: line.pts_ot3,
            pts_ot4: line.pts_ot4,
            pts_ot5: line.pts_ot5,
            pts_ot6: line.pts_ot6,
            pts_ot7: line.pts_ot7,
            pts_ot8: line.pts_ot8,
            pts_ot9: line.pts_ot9,
            pts_ot10: line.pts_ot10,
        });
    }
    Ok(logs)
}

/// Checks the pairing invariants between games and their team logs:
/// exactly two logs per game, opposite results, unequal point totals, and
/// the higher total on the side recorded as the winner. Upstream games are
/// always decisive; a tie is a contradiction to report, not to resolve.
pub fn validate_game_outcomes(games: &[Game], logs: &[TeamGameLog]) -> Result<(), AppError> {
    let known_games: HashSet<&str> = games.iter().map(|g| g.game_id.as_str()).collect();
    let mut by_game: HashMap<&str, Vec<&TeamGameLog>> = HashMap::new();
    for log in logs {
        if !known_games.contains(log.game.as_str()) {
            return Err(AppError::data_integrity(format!(
                "team game log references unknown game {}",
                log.game
            )));
        }
        by_game.entry(log.game.as_str()).or_default().push(log);
    }

    for game in games {
        let pair = by_game.get(game.game_id.as_str()).ok_or_else(|| {
            AppError::data_integrity(format!("game {} has no team game logs", game.game_id))
        })?;
        if pair.len() != 2 {
            return Err(AppError::data_integrity(format!(
                "game {} has {} team game logs, expected 2",
                game.game_id,
                pair.len()
            )));
        }

        let (a, b) = (pair[0], pair[1]);
        if a.stats.points == b.stats.points {
            return Err(AppError::data_integrity(format!(
                "game {} has tied point totals ({})",
                game.game_id, a.stats.points
            )));
        }
        if a.result == b.result {
            return Err(AppError::data_integrity(format!(
                "game {} has two '{}' results",
                game.game_id,
                a.result.as_str()
            )));
        }
        let winner = if a.stats.points > b.stats.points { a } else { b };
        if winner.result != GameResult::W {
            return Err(AppError::data_integrity(format!(
                "game {} records team {} as winner but it scored fewer points",
                game.game_id, winner.team
            )));
        }
    }
    Ok(())
}

/// Computes each player's display order within a game's box score table.
///
/// Walks the table in its original row order and records the zero-based
/// position; a player on the team not listed first has the opposing team's
/// row count subtracted, so both teams number from 0 independently. Purely
/// a function of upstream row order; never re-sorted.
pub fn box_score_orders(player_stats: &[crate::normalize::Row]) -> HashMap<i64, i64> {
    let rows: Vec<(i64, i64)> = player_stats
        .iter()
        .filter_map(|row| Some((row_i64(row, "player_id")?, row_i64(row, "team")?)))
        .collect();

    let first_team = rows.first().map(|(_, team)| *team);
    let mut orders = HashMap::with_capacity(rows.len());
    for (index, (player_id, team)) in rows.iter().enumerate() {
        let opp_count = rows.iter().filter(|(_, t)| t != team).count() as i64;
        let mut order = index as i64;
        if order >= opp_count && first_team != Some(*team) {
            order -= opp_count;
        }
        orders.insert(*player_id, order);
    }
    orders
}

/// Builds PlayerGameLog entities from the league game log, ordered by each
/// game's box score table.
///
/// Rows referencing a player or team log the snapshot does not know are
/// dropped with a warning; a game log for a game with no box score is a
/// contradiction and aborts assembly.
pub fn assemble_player_game_logs(
    batch: &NormalizedBatch,
    players: &[Player],
    team_logs: &[TeamGameLog],
) -> Result<Vec<PlayerGameLog>, AppError> {
    let known_players: HashSet<i64> = players.iter().map(|p| p.player_id).collect();
    let known_team_logs: HashSet<(&str, i64)> = team_logs
        .iter()
        .map(|log| (log.game.as_str(), log.team))
        .collect();

    let mut order_cache: HashMap<&str, HashMap<i64, i64>> = HashMap::new();
    for (game_id, tables) in &batch.box_scores {
        order_cache.insert(game_id.as_str(), box_score_orders(&tables.player_stats));
    }

    let mut logs = Vec::with_capacity(batch.player_game_logs.len());
    for row in &batch.player_game_logs {
        let log: PlayerLogRow = from_row(row, "player_game_log")?;

        if !known_players.contains(&log.player) {
            warn!(
                "Game {} log references unknown player {}; dropping",
                log.game, log.player
            );
            continue;
        }
        if !known_team_logs.contains(&(log.game.as_str(), log.curr_team)) {
            warn!(
                "Game {} log for player {} references unknown team log (team {}); dropping",
                log.game, log.player, log.curr_team
            );
            continue;
        }

        let orders = order_cache.get(log.game.as_str()).ok_or_else(|| {
            AppError::data_integrity(format!("game {} has no box score table", log.game))
        })?;
        let Some(&order) = orders.get(&log.player) else {
            warn!(
                "Player {} missing from game {} box score; dropping log row",
                log.player, log.game
            );
            continue;
        };

        logs.push(PlayerGameLog {
            game: log.game,
            player: log.player,
            curr_team: log.curr_team,
            matchup: log.matchup,
            result: parse_result(&log.result, "player_game_log")?,
            order,
            plus_minus: log.plus_minus,
            stats: log.stats,
        });
    }
    Ok(logs)
}
