//! Read boundary
//!
//! Per-entity reshape-and-return operations over the domain store. This is
//! the only surface a presentation layer is permitted to call: it serves
//! display-mode records (0-100 percentages, human-facing field names,
//! derived ages) from persisted storage-mode rows. The percent conversion
//! for stored fractions happens here exactly once. A missing entity is
//! `None`, never an error.

use chrono::NaiveDate;
use serde_json::{Map, Value, json};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::DomainStore;
use crate::assemble::stats::conference_seeds;
use crate::constants::display::GAME_DATE_FORMAT;
use crate::domain::{
    Conference, CountingStats, Game, GameResult, Player, PlayerCareerStats, PlayerGameLog,
    PlayerSeasonStats, SeasonType, Standing, Team, TeamGameLog, TeamSeasonStats, derived_age,
    overtime_periods,
};
use crate::error::AppError;
use crate::normalize::display_percent;

fn stats_from_row(row: &SqliteRow) -> Result<CountingStats, sqlx::Error> {
    Ok(CountingStats {
        minutes: row.try_get("minutes")?,
        points: row.try_get("points")?,
        offense_reb: row.try_get("offense_reb")?,
        defense_reb: row.try_get("defense_reb")?,
        rebounds: row.try_get("rebounds")?,
        assists: row.try_get("assists")?,
        steals: row.try_get("steals")?,
        blocks: row.try_get("blocks")?,
        turnovers: row.try_get("turnovers")?,
        fouls: row.try_get("fouls")?,
        fg_made: row.try_get("fg_made")?,
        fg_attempt: row.try_get("fg_attempt")?,
        fg_percent: row.try_get("fg_percent")?,
        fg3_made: row.try_get("fg3_made")?,
        fg3_attempt: row.try_get("fg3_attempt")?,
        fg3_percent: row.try_get("fg3_percent")?,
        ft_made: row.try_get("ft_made")?,
        ft_attempt: row.try_get("ft_attempt")?,
        ft_percent: row.try_get("ft_percent")?,
    })
}

fn parse_conference(value: Option<String>) -> Option<Conference> {
    match value.as_deref() {
        Some("East") => Some(Conference::East),
        Some("West") => Some(Conference::West),
        _ => None,
    }
}

fn parse_result(value: &str) -> Result<GameResult, AppError> {
    GameResult::parse(value)
        .ok_or_else(|| AppError::data_integrity(format!("stored game result '{value}' invalid")))
}

fn parse_season_type(value: &str) -> Result<SeasonType, AppError> {
    SeasonType::parse(value)
        .ok_or_else(|| AppError::data_integrity(format!("stored season type '{value}' invalid")))
}

fn team_from_row(row: &SqliteRow) -> Result<Team, AppError> {
    Ok(Team {
        team_id: row.try_get("team_id")?,
        team_abb: row.try_get("team_abb")?,
        team_conf: parse_conference(row.try_get("team_conf")?),
        team_div: row.try_get("team_div")?,
        team_city: row.try_get("team_city")?,
        team_name: row.try_get("team_name")?,
        wins: row.try_get("wins")?,
        losses: row.try_get("losses")?,
        nba_debut: row.try_get("nba_debut")?,
        max_year: row.try_get("max_year")?,
    })
}

fn player_from_row(row: &SqliteRow) -> Result<Player, AppError> {
    Ok(Player {
        player_id: row.try_get("player_id")?,
        team: row.try_get("team")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        birth_date: row.try_get("birth_date")?,
        draft_year: row.try_get("draft_year")?,
        draft_round: row.try_get("draft_round")?,
        draft_number: row.try_get("draft_number")?,
        position: row.try_get("position")?,
        jersey: row.try_get("jersey")?,
        height: row.try_get("height")?,
        weight: row.try_get("weight")?,
        school: row.try_get("school")?,
        country: row.try_get("country")?,
        season_exp: row.try_get("season_exp")?,
    })
}

fn game_from_row(row: &SqliteRow) -> Result<Game, AppError> {
    let inactive: String = row.try_get("inactive_players")?;
    let dnp: String = row.try_get("dnp_players")?;
    Ok(Game {
        game_id: row.try_get("game_id")?,
        season: row.try_get("season")?,
        game_date: row.try_get("game_date")?,
        home_team: row.try_get("home_team")?,
        away_team: row.try_get("away_team")?,
        broadcaster: row.try_get("broadcaster")?,
        inactive_players: serde_json::from_str(&inactive)?,
        dnp_players: serde_json::from_str(&dnp)?,
    })
}

fn team_game_log_from_row(row: &SqliteRow) -> Result<TeamGameLog, AppError> {
    let result: String = row.try_get("result")?;
    Ok(TeamGameLog {
        game: row.try_get("game")?,
        team: row.try_get("team")?,
        matchup: row.try_get("matchup")?,
        result: parse_result(&result)?,
        curr_wins: row.try_get("curr_wins")?,
        curr_losses: row.try_get("curr_losses")?,
        stats: stats_from_row(row)?,
        pts_q1: row.try_get("pts_q1")?,
        pts_q2: row.try_get("pts_q2")?,
        pts_q3: row.try_get("pts_q3")?,
        pts_q4: row.try_get("pts_q4")?,
        pts_ot1: row.try_get("pts_ot1")?,
        pts_ot2: row.try_get("pts_ot2")?,
        pts_ot3: row.try_get("pts_ot3")?,
        pts_ot4: row.try_get("pts_ot4")?,
        pts_ot5: row.try_get("pts_ot5")?,
        pts_ot6: row.try_get("pts_ot6")?,
        pts_ot7: row.try_get("pts_ot7")?,
        pts_ot8: row.try_get("pts_ot8")?,
        pts_ot9: row.try_get("pts_ot9")?,
        pts_ot10: row.try_get("pts_ot10")?,
    })
}

fn player_game_log_from_row(row: &SqliteRow) -> Result<PlayerGameLog, AppError> {
    let result: String = row.try_get("result")?;
    Ok(PlayerGameLog {
        game: row.try_get("game")?,
        player: row.try_get("player")?,
        curr_team: row.try_get("curr_team")?,
        matchup: row.try_get("matchup")?,
        result: parse_result(&result)?,
        order: row.try_get("order")?,
        plus_minus: row.try_get("plus_minus")?,
        stats: stats_from_row(row)?,
    })
}

impl DomainStore {
    pub async fn load_teams(&self, season: &str) -> Result<Vec<Team>, AppError> {
        let rows = sqlx::query("SELECT * FROM teams WHERE season = ? ORDER BY team_id")
            .bind(season)
            .fetch_all(self.pool())
            .await?;
        rows.iter().map(team_from_row).collect()
    }

    pub async fn load_team(&self, season: &str, team_id: i64) -> Result<Option<Team>, AppError> {
        let row = sqlx::query("SELECT * FROM teams WHERE season = ? AND team_id = ?")
            .bind(season)
            .bind(team_id)
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(team_from_row).transpose()
    }

    pub async fn load_players(&self, season: &str) -> Result<Vec<Player>, AppError> {
        let rows = sqlx::query("SELECT * FROM players WHERE season = ? ORDER BY player_id")
            .bind(season)
            .fetch_all(self.pool())
            .await?;
        rows.iter().map(player_from_row).collect()
    }

    pub async fn load_player(
        &self,
        season: &str,
        player_id: i64,
    ) -> Result<Option<Player>, AppError> {
        let row = sqlx::query("SELECT * FROM players WHERE season = ? AND player_id = ?")
            .bind(season)
            .bind(player_id)
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(player_from_row).transpose()
    }

    pub async fn load_games(&self, season: &str) -> Result<Vec<Game>, AppError> {
        let rows = sqlx::query("SELECT * FROM games WHERE season = ? ORDER BY game_id")
            .bind(season)
            .fetch_all(self.pool())
            .await?;
        rows.iter().map(game_from_row).collect()
    }

    pub async fn load_game(&self, season: &str, game_id: &str) -> Result<Option<Game>, AppError> {
        let row = sqlx::query("SELECT * FROM games WHERE season = ? AND game_id = ?")
            .bind(season)
            .bind(game_id)
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(game_from_row).transpose()
    }

    pub async fn load_team_game_logs(&self, season: &str) -> Result<Vec<TeamGameLog>, AppError> {
        let rows = sqlx::query("SELECT * FROM team_game_logs WHERE season = ? ORDER BY pk")
            .bind(season)
            .fetch_all(self.pool())
            .await?;
        rows.iter().map(team_game_log_from_row).collect()
    }

    pub async fn load_player_game_logs(
        &self,
        season: &str,
    ) -> Result<Vec<PlayerGameLog>, AppError> {
        let rows = sqlx::query("SELECT * FROM player_game_logs WHERE season = ? ORDER BY pk")
            .bind(season)
            .fetch_all(self.pool())
            .await?;
        rows.iter().map(player_game_log_from_row).collect()
    }

    pub async fn load_standings(&self, season: &str) -> Result<Vec<Standing>, AppError> {
        let rows = sqlx::query("SELECT * FROM standings WHERE season = ? ORDER BY pk")
            .bind(season)
            .fetch_all(self.pool())
            .await?;
        rows.iter()
            .map(|row| {
                Ok(Standing {
                    team: row.try_get("team")?,
                    wins: row.try_get("wins")?,
                    losses: row.try_get("losses")?,
                    home_record: row.try_get("home_record")?,
                    away_record: row.try_get("away_record")?,
                    win_percent: row.try_get("win_percent")?,
                })
            })
            .collect()
    }

    pub async fn load_team_season_stats(
        &self,
        season: &str,
    ) -> Result<Vec<TeamSeasonStats>, AppError> {
        let rows = sqlx::query("SELECT * FROM team_season_stats WHERE season = ? ORDER BY pk")
            .bind(season)
            .fetch_all(self.pool())
            .await?;
        rows.iter()
            .map(|row| {
                let season_type: String = row.try_get("season_type")?;
                Ok(TeamSeasonStats {
                    team: row.try_get("team")?,
                    season: row.try_get("season")?,
                    season_type: parse_season_type(&season_type)?,
                    wins: row.try_get("wins")?,
                    losses: row.try_get("losses")?,
                    win_percent: row.try_get("win_percent")?,
                    stats: stats_from_row(row)?,
                })
            })
            .collect()
    }

    pub async fn load_player_season_stats(
        &self,
        snapshot: &str,
    ) -> Result<Vec<PlayerSeasonStats>, AppError> {
        let rows = sqlx::query("SELECT * FROM player_season_stats WHERE snapshot = ? ORDER BY pk")
            .bind(snapshot)
            .fetch_all(self.pool())
            .await?;
        rows.iter()
            .map(|row| {
                let season_type: String = row.try_get("season_type")?;
                Ok(PlayerSeasonStats {
                    player: row.try_get("player")?,
                    curr_team: row.try_get("curr_team")?,
                    season: row.try_get("season")?,
                    season_type: parse_season_type(&season_type)?,
                    games_played: row.try_get("games_played")?,
                    games_started: row.try_get("games_started")?,
                    stats: stats_from_row(row)?,
                })
            })
            .collect()
    }

    pub async fn load_player_career_stats(
        &self,
        snapshot: &str,
    ) -> Result<Vec<PlayerCareerStats>, AppError> {
        let rows = sqlx::query("SELECT * FROM player_career_stats WHERE snapshot = ? ORDER BY pk")
            .bind(snapshot)
            .fetch_all(self.pool())
            .await?;
        rows.iter()
            .map(|row| {
                let season_type: String = row.try_get("season_type")?;
                Ok(PlayerCareerStats {
                    player: row.try_get("player")?,
                    season_type: parse_season_type(&season_type)?,
                    games_played: row.try_get("games_played")?,
                    games_started: row.try_get("games_started")?,
                    stats: stats_from_row(row)?,
                })
            })
            .collect()
    }
}

/// Display-mode counting stats: upstream-style keys, percentages converted
/// from stored fractions to the 0-100 scale with one decimal.
fn display_stats(stats: &CountingStats) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("MIN".to_string(), json!(stats.minutes));
    map.insert("FGM".to_string(), json!(stats.fg_made));
    map.insert("FGA".to_string(), json!(stats.fg_attempt));
    map.insert("FG%".to_string(), json!(display_percent(stats.fg_percent)));
    map.insert("FG3M".to_string(), json!(stats.fg3_made));
    map.insert("FG3A".to_string(), json!(stats.fg3_attempt));
    map.insert(
        "FG3%".to_string(),
        json!(display_percent(stats.fg3_percent)),
    );
    map.insert("FTM".to_string(), json!(stats.ft_made));
    map.insert("FTA".to_string(), json!(stats.ft_attempt));
    map.insert("FT%".to_string(), json!(display_percent(stats.ft_percent)));
    map.insert("OREB".to_string(), json!(stats.offense_reb));
    map.insert("DREB".to_string(), json!(stats.defense_reb));
    map.insert("REB".to_string(), json!(stats.rebounds));
    map.insert("AST".to_string(), json!(stats.assists));
    map.insert("STL".to_string(), json!(stats.steals));
    map.insert("BLK".to_string(), json!(stats.blocks));
    map.insert("TOV".to_string(), json!(stats.turnovers));
    map.insert("PF".to_string(), json!(stats.fouls));
    map.insert("PTS".to_string(), json!(stats.points));
    map
}

fn display_game_date(stored: &str) -> String {
    NaiveDate::parse_from_str(stored, "%Y-%m-%d")
        .map(|date| date.format(GAME_DATE_FORMAT).to_string())
        .unwrap_or_else(|_| stored.to_string())
}

impl DomainStore {
    /// Team detail record, or `None` when the snapshot has no such team.
    pub async fn team_detail(
        &self,
        season: &str,
        team_id: i64,
    ) -> Result<Option<Value>, AppError> {
        let Some(team) = self.load_team(season, team_id).await? else {
            return Ok(None);
        };
        Ok(Some(json!({
            "TEAM_ID": team.team_id,
            "TEAM_ABBREVIATION": team.team_abb,
            "TEAM_CONFERENCE": team.team_conf.map(|c| c.to_string()),
            "TEAM_DIVISION": team.team_div,
            "TEAM_CITY": team.team_city,
            "TEAM_NAME": team.team_name,
            "W": team.wins,
            "L": team.losses,
            "MIN_YEAR": team.nba_debut,
            "MAX_YEAR": team.max_year,
        })))
    }

    /// A team's roster with ages derived from birth dates as of `as_of`.
    pub async fn team_roster(
        &self,
        season: &str,
        team_id: i64,
        as_of: NaiveDate,
    ) -> Result<Vec<Value>, AppError> {
        let rows = sqlx::query(
            "SELECT * FROM players WHERE season = ? AND team = ? ORDER BY last_name, first_name",
        )
        .bind(season)
        .bind(team_id)
        .fetch_all(self.pool())
        .await?;

        let mut roster = Vec::with_capacity(rows.len());
        for row in &rows {
            let player = player_from_row(row)?;
            roster.push(json!({
                "PLAYER_ID": player.player_id,
                "PLAYER": player.full_name(),
                "NUM": player.jersey,
                "POSITION": player.position,
                "HEIGHT": player.height,
                "WEIGHT": player.weight,
                "BIRTH_DATE": player.birth_date,
                "AGE": derived_age(&player.birth_date, as_of),
                "EXP": player.season_exp,
                "SCHOOL": player.school,
            }));
        }
        Ok(roster)
    }

    /// Player detail record with the age derived at read time.
    pub async fn player_detail(
        &self,
        season: &str,
        player_id: i64,
        as_of: NaiveDate,
    ) -> Result<Option<Value>, AppError> {
        let Some(player) = self.load_player(season, player_id).await? else {
            return Ok(None);
        };
        Ok(Some(json!({
            "PLAYER_ID": player.player_id,
            "TEAM_ID": player.team,
            "PLAYER": player.full_name(),
            "BIRTH_DATE": player.birth_date,
            "AGE": derived_age(&player.birth_date, as_of),
            "DRAFT_YEAR": player.draft_year,
            "DRAFT_ROUND": player.draft_round,
            "DRAFT_NUMBER": player.draft_number,
            "POSITION": player.position,
            "NUM": player.jersey,
            "HEIGHT": player.height,
            "WEIGHT": player.weight,
            "SCHOOL": player.school,
            "COUNTRY": player.country,
            "EXP": player.season_exp,
        })))
    }

    /// Game detail: summary, both line scores, overtime count, winner.
    pub async fn game_detail(
        &self,
        season: &str,
        game_id: &str,
    ) -> Result<Option<Value>, AppError> {
        let Some(game) = self.load_game(season, game_id).await? else {
            return Ok(None);
        };

        let rows =
            sqlx::query("SELECT * FROM team_game_logs WHERE season = ? AND game = ? ORDER BY pk")
                .bind(season)
                .bind(game_id)
                .fetch_all(self.pool())
                .await?;
        let logs: Vec<TeamGameLog> = rows
            .iter()
            .map(team_game_log_from_row)
            .collect::<Result<_, _>>()?;
        if logs.len() != 2 {
            return Err(AppError::data_integrity(format!(
                "game {game_id} has {} team game logs, expected 2",
                logs.len()
            )));
        }

        let overtime = overtime_periods(&logs[0], &logs[1]);
        let winner = if logs[0].stats.points > logs[1].stats.points {
            logs[0].team
        } else {
            logs[1].team
        };

        let line_scores: Vec<Value> = logs
            .iter()
            .map(|log| {
                json!({
                    "TEAM_ID": log.team,
                    "PTS_QTR1": log.pts_q1,
                    "PTS_QTR2": log.pts_q2,
                    "PTS_QTR3": log.pts_q3,
                    "PTS_QTR4": log.pts_q4,
                    "PTS_OT": log.overtime_points(),
                    "PTS": log.stats.points,
                    "WL": log.result.as_str(),
                    "TEAM_WINS_LOSSES": format!("{}-{}", log.curr_wins, log.curr_losses),
                })
            })
            .collect();

        Ok(Some(json!({
            "GAME_ID": game.game_id,
            "SEASON": game.season,
            "GAME_DATE": display_game_date(&game.game_date),
            "HOME_TEAM_ID": game.home_team,
            "VISITOR_TEAM_ID": game.away_team,
            "BROADCASTER": game.broadcaster,
            "WINNER": winner,
            "OVERTIME": overtime,
            "LINE_SCORE": line_scores,
            "INACTIVE_PLAYERS": game.inactive_players,
            "DNP_PLAYERS": game.dnp_players,
        })))
    }

    /// Conference standings with seeds, sentinel excluded by construction.
    pub async fn standings_display(&self, season: &str) -> Result<Value, AppError> {
        let teams = self.load_teams(season).await?;
        let standings = self.load_standings(season).await?;

        let seeded = |conference: Conference| -> Vec<Value> {
            conference_seeds(&teams, &standings, conference)
                .iter()
                .enumerate()
                .map(|(index, standing)| {
                    json!({
                        "SEED": index + 1,
                        "TEAM_ID": standing.team,
                        "W": standing.wins,
                        "L": standing.losses,
                        "HOME": standing.home_record,
                        "ROAD": standing.away_record,
                        "W_PCT": standing.win_percent,
                    })
                })
                .collect()
        };

        Ok(json!({
            "East": seeded(Conference::East),
            "West": seeded(Conference::West),
        }))
    }

    /// Display-mode season stat rows for one player and season type.
    pub async fn player_season_stats_display(
        &self,
        snapshot: &str,
        player_id: i64,
        season_type: SeasonType,
    ) -> Result<Vec<Value>, AppError> {
        let rows = self.load_player_season_stats(snapshot).await?;
        Ok(rows
            .iter()
            .filter(|row| row.player == player_id && row.season_type == season_type)
            .map(|row| {
                let mut record = display_stats(&row.stats);
                record.insert("SEASON_ID".to_string(), json!(row.season));
                record.insert("TEAM_ID".to_string(), json!(row.curr_team));
                record.insert("GP".to_string(), json!(row.games_played));
                record.insert("GS".to_string(), json!(row.games_started));
                Value::Object(record)
            })
            .collect())
    }

    /// Display-mode career totals for one player and season type.
    pub async fn player_career_stats_display(
        &self,
        snapshot: &str,
        player_id: i64,
        season_type: SeasonType,
    ) -> Result<Vec<Value>, AppError> {
        let rows = self.load_player_career_stats(snapshot).await?;
        Ok(rows
            .iter()
            .filter(|row| row.player == player_id && row.season_type == season_type)
            .map(|row| {
                let mut record = display_stats(&row.stats);
                record.insert("GP".to_string(), json!(row.games_played));
                record.insert("GS".to_string(), json!(row.games_started));
                Value::Object(record)
            })
            .collect())
    }

    /// Display-mode season totals for one team and season type.
    pub async fn team_season_stats_display(
        &self,
        season: &str,
        team_id: i64,
        season_type: SeasonType,
    ) -> Result<Vec<Value>, AppError> {
        let rows = self.load_team_season_stats(season).await?;
        Ok(rows
            .iter()
            .filter(|row| row.team == team_id && row.season_type == season_type)
            .map(|row| {
                let mut record = display_stats(&row.stats);
                record.insert("TEAM_ID".to_string(), json!(row.team));
                record.insert("W".to_string(), json!(row.wins));
                record.insert("L".to_string(), json!(row.losses));
                record.insert("W_PCT".to_string(), json!(row.win_percent));
                Value::Object(record)
            })
            .collect())
    }

    /// Display-mode game log rows for one player, in box-score order per
    /// game and game order across the season.
    pub async fn player_game_logs_display(
        &self,
        season: &str,
        player_id: i64,
    ) -> Result<Vec<Value>, AppError> {
        let rows = sqlx::query(
            "SELECT * FROM player_game_logs WHERE season = ? AND player = ? ORDER BY game",
        )
        .bind(season)
        .bind(player_id)
        .fetch_all(self.pool())
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let log = player_game_log_from_row(row)?;
            let mut record = display_stats(&log.stats);
            record.insert("GAME_ID".to_string(), json!(log.game));
            record.insert("MATCHUP".to_string(), json!(log.matchup));
            record.insert("WL".to_string(), json!(log.result.as_str()));
            record.insert("TEAM_ID".to_string(), json!(log.curr_team));
            record.insert("+/-".to_string(), json!(log.plus_minus));
            records.push(Value::Object(record));
        }
        Ok(records)
    }
}
