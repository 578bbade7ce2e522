use std::collections::HashSet;

use tracing::warn;

use super::{NormalizedBatch, from_row, row_i64};
use crate::constants::SENTINEL_TEAM_ID;
use crate::domain::{Player, Team};
use crate::error::AppError;
use crate::upstream::season_end_year;

/// Builds the Team set from the team list table, appending the sentinel
/// team for players who changed team mid-season.
pub fn assemble_teams(batch: &NormalizedBatch) -> Result<Vec<Team>, AppError> {
    let mut teams = Vec::with_capacity(batch.team_list.len() + 1);
    for row in &batch.team_list {
        let team: Team = from_row(row, "team_list")?;
        teams.push(team);
    }

    let mut sentinel = Team::sentinel();
    if let Some(end_year) = season_end_year(&batch.season) {
        sentinel.max_year = end_year.to_string();
    }
    teams.push(sentinel);
    Ok(teams)
}

/// Builds the Player set from the player list table.
///
/// A player whose owning team is not in the Team set is reassigned to the
/// sentinel team with a warning; roster feeds lag franchise moves and a
/// dangling foreign key would poison the whole snapshot.
pub fn assemble_players(batch: &NormalizedBatch, teams: &[Team]) -> Result<Vec<Player>, AppError> {
    let team_ids: HashSet<i64> = teams.iter().map(|t| t.team_id).collect();

    let mut players = Vec::with_capacity(batch.player_list.len());
    for row in &batch.player_list {
        let mut player: Player = from_row(row, "player_list")?;
        if !team_ids.contains(&player.team) {
            warn!(
                "Player {} references unknown team {}; assigning sentinel team",
                player.player_id, player.team
            );
            player.team = SENTINEL_TEAM_ID;
        }
        players.push(player);
    }
    Ok(players)
}

/// Convenience: the team list row count sanity check used by callers that
/// want to fail before any box score work happens.
pub fn require_teams(batch: &NormalizedBatch) -> Result<(), AppError> {
    if batch.team_list.is_empty() {
        return Err(AppError::data_integrity(
            "snapshot has no teams; refusing to assemble",
        ));
    }
    let mut seen = HashSet::new();
    for row in &batch.team_list {
        if let Some(team_id) = row_i64(row, "team_id")
            && !seen.insert(team_id)
        {
            return Err(AppError::data_integrity(format!(
                "duplicate team {team_id} in team list"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Row;
    use serde_json::json;

    pub(crate) fn team_row(team_id: i64, abb: &str, conf: &str) -> Row {
        let mut row = Row::new();
        row.insert("team_id".to_string(), json!(team_id));
        row.insert("team_abb".to_string(), json!(abb));
        row.insert("team_conf".to_string(), json!(conf));
        row.insert("team_div".to_string(), json!("Atlantic"));
        row.insert("team_city".to_string(), json!("Boston"));
        row.insert("team_name".to_string(), json!("Celtics"));
        row.insert("wins".to_string(), json!(49));
        row.insert("losses".to_string(), json!(33));
        row.insert("nba_debut".to_string(), json!("1946"));
        row.insert("max_year".to_string(), json!("2019"));
        row
    }

    pub(crate) fn player_row(player_id: i64, team: i64) -> Row {
        let mut row = Row::new();
        row.insert("player_id".to_string(), json!(player_id));
        row.insert("team".to_string(), json!(team));
        row.insert("first_name".to_string(), json!("Bo"));
        row.insert("last_name".to_string(), json!("Jones"));
        row.insert("birth_date".to_string(), json!("1993-03-16"));
        row.insert("draft_year".to_string(), json!("2014"));
        row.insert("draft_round".to_string(), json!("1"));
        row.insert("draft_number".to_string(), json!("12"));
        row.insert("position".to_string(), json!("Guard"));
        row.insert("jersey".to_string(), json!(11));
        row.insert("height".to_string(), json!("6-4"));
        row.insert("weight".to_string(), json!(205));
        row.insert("school".to_string(), json!("N/A"));
        row.insert("country".to_string(), json!("USA"));
        row.insert("season_exp".to_string(), json!(5));
        row
    }

    #[test]
    fn test_assemble_teams_appends_sentinel() {
        let mut batch = NormalizedBatch::new("2018-19");
        batch.team_list.push(team_row(3, "BOS", "East"));

        let teams = assemble_teams(&batch).unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].team_id, 3);
        assert_eq!(teams[0].team_conf, Some(crate::domain::Conference::East));
        assert!(teams[1].is_sentinel());
        assert_eq!(teams[1].max_year, "2019");
    }

    #[test]
    fn test_assemble_players_reassigns_unknown_team_to_sentinel() {
        let mut batch = NormalizedBatch::new("2018-19");
        batch.team_list.push(team_row(3, "BOS", "East"));
        batch.player_list.push(player_row(7, 3));
        batch.player_list.push(player_row(8, 99));

        let teams = assemble_teams(&batch).unwrap();
        let players = assemble_players(&batch, &teams).unwrap();

        assert_eq!(players.len(), 2);
        assert_eq!(players[0].team, 3);
        assert_eq!(players[1].team, SENTINEL_TEAM_ID);
    }

    #[test]
    fn test_require_teams_rejects_duplicates() {
        let mut batch = NormalizedBatch::new("2018-19");
        batch.team_list.push(team_row(3, "BOS", "East"));
        batch.team_list.push(team_row(3, "BOS", "East"));

        let err = require_teams(&batch).unwrap_err();
        assert!(matches!(err, AppError::DataIntegrity(_)));
    }

    #[test]
    fn test_require_teams_rejects_empty_batch() {
        let batch = NormalizedBatch::new("2018-19");
        assert!(matches!(
            require_teams(&batch),
            Err(AppError::DataIntegrity(_))
        ));
    }
}
