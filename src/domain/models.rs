use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::SENTINEL_TEAM_ID;

/// Conference a franchise plays in. The sentinel team carries no conference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conference {
    East,
    West,
}

impl fmt::Display for Conference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conference::East => write!(f, "East"),
            Conference::West => write!(f, "West"),
        }
    }
}

/// Regular season or playoffs. Aggregate tables carry one row per
/// (entity, season, season type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeasonType {
    Regular,
    Post,
}

impl SeasonType {
    pub const ALL: [SeasonType; 2] = [SeasonType::Regular, SeasonType::Post];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonType::Regular => "Regular",
            SeasonType::Post => "Post",
        }
    }

    /// Value the upstream provider expects in query strings.
    pub fn as_query_param(&self) -> &'static str {
        match self {
            SeasonType::Regular => "Regular+Season",
            SeasonType::Post => "Playoffs",
        }
    }

    pub fn parse(s: &str) -> Option<SeasonType> {
        match s {
            "Regular" => Some(SeasonType::Regular),
            "Post" => Some(SeasonType::Post),
            _ => None,
        }
    }
}

impl fmt::Display for SeasonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Win/loss outcome of one game from one team's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    W,
    L,
}

impl GameResult {
    pub fn opposite(&self) -> GameResult {
        match self {
            GameResult::W => GameResult::L,
            GameResult::L => GameResult::W,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameResult::W => "W",
            GameResult::L => "L",
        }
    }

    pub fn parse(s: &str) -> Option<GameResult> {
        match s {
            "W" => Some(GameResult::W),
            "L" => Some(GameResult::L),
            _ => None,
        }
    }
}

/// The counting-stat block shared by game logs and aggregate tables.
///
/// Percentage fields hold raw fractions in [0, 1]; conversion to the 0-100
/// display scale happens once, at the display-normalization boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountingStats {
    pub minutes: f64,
    pub points: i64,
    pub offense_reb: i64,
    pub defense_reb: i64,
    pub rebounds: i64,
    pub assists: i64,
    pub steals: i64,
    pub blocks: i64,
    pub turnovers: i64,
    pub fouls: i64,
    pub fg_made: i64,
    pub fg_attempt: i64,
    pub fg_percent: f64,
    pub fg3_made: i64,
    pub fg3_attempt: i64,
    pub fg3_percent: f64,
    pub ft_made: i64,
    pub ft_attempt: i64,
    pub ft_percent: f64,
}

/// One franchise in the season snapshot.
///
/// `team_id = 0` is the synthetic "TOT" team owning players who changed team
/// mid-season; it has no conference and never ranks in standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: i64,
    pub team_abb: String,
    pub team_conf: Option<Conference>,
    pub team_div: String,
    pub team_city: String,
    pub team_name: String,
    pub wins: i64,
    pub losses: i64,
    pub nba_debut: String,
    pub max_year: String,
}

impl Team {
    pub fn is_sentinel(&self) -> bool {
        self.team_id == SENTINEL_TEAM_ID
    }

    /// The synthetic team assigned to players traded mid-season.
    pub fn sentinel() -> Team {
        Team {
            team_id: SENTINEL_TEAM_ID,
            team_abb: "TOT".to_string(),
            team_conf: None,
            team_div: "None".to_string(),
            team_city: "None".to_string(),
            team_name: "None".to_string(),
            wins: 0,
            losses: 0,
            nba_debut: "1946".to_string(),
            max_year: "2019".to_string(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.team_city, self.team_name)
    }
}

/// One rostered player. Age is derived from `birth_date` at read time and
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: i64,
    pub team: i64,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub draft_year: String,
    pub draft_round: String,
    pub draft_number: String,
    pub position: String,
    pub jersey: i64,
    pub height: String,
    pub weight: i64,
    pub school: String,
    pub country: String,
    pub season_exp: i64,
}

impl Player {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Age in whole years on `as_of`, derived from a `YYYY-MM-DD` birth date.
/// Returns `None` when the stored date does not parse.
pub fn derived_age(birth_date: &str, as_of: NaiveDate) -> Option<i64> {
    let born = NaiveDate::parse_from_str(birth_date, "%Y-%m-%d").ok()?;
    // years_since is None for birth dates in the future
    as_of.years_since(born).map(i64::from)
}

/// One played game. `inactive_players` and `dnp_players` only reference
/// player ids present in the snapshot's Player set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub game_id: String,
    pub season: String,
    pub game_date: String,
    pub home_team: i64,
    pub away_team: i64,
    pub broadcaster: Option<String>,
    pub inactive_players: Vec<i64>,
    pub dnp_players: BTreeMap<i64, String>,
}

/// One team's side of one game: counting stats, the quarter-by-quarter line
/// score, and the running win/loss tally after this game. Exactly two rows
/// exist per game, with opposite results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamGameLog {
    pub game: String,
    pub team: i64,
    pub matchup: String,
    pub result: GameResult,
    pub curr_wins: i64,
    pub curr_losses: i64,
    #[serde(flatten)]
    pub stats: CountingStats,
    pub pts_q1: i64,
    pub pts_q2: i64,
    pub pts_q3: i64,
    pub pts_q4: i64,
    pub pts_ot1: i64,
    pub pts_ot2: i64,
    pub pts_ot3: i64,
    pub pts_ot4: i64,
    pub pts_ot5: i64,
    pub pts_ot6: i64,
    pub pts_ot7: i64,
    pub pts_ot8: i64,
    pub pts_ot9: i64,
    pub pts_ot10: i64,
}

impl TeamGameLog {
    pub fn overtime_points(&self) -> [i64; 10] {
        [
            self.pts_ot1,
            self.pts_ot2,
            self.pts_ot3,
            self.pts_ot4,
            self.pts_ot5,
            self.pts_ot6,
            self.pts_ot7,
            self.pts_ot8,
            self.pts_ot9,
            self.pts_ot10,
        ]
    }
}

/// Number of overtime periods a game went to: the highest overtime period
/// with a nonzero score on either side, zero when regulation settled it.
pub fn overtime_periods(a: &TeamGameLog, b: &TeamGameLog) -> usize {
    let a_ot = a.overtime_points();
    let b_ot = b.overtime_points();
    (0..a_ot.len())
        .rev()
        .find(|&i| a_ot[i] != 0 || b_ot[i] != 0)
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// One player's appearance in one game. `order` preserves the player's
/// position within their team's block of the upstream box-score table, so
/// rendered tables match the broadcast ordering (starters before bench).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameLog {
    pub game: String,
    pub player: i64,
    pub curr_team: i64,
    pub matchup: String,
    pub result: GameResult,
    pub order: i64,
    pub plus_minus: i64,
    #[serde(flatten)]
    pub stats: CountingStats,
}

/// Season-end standing for one team. One row per team per snapshot; the
/// conference seed is rank by (win_percent, wins, home_record, away_record),
/// all descending, computed at the read boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub team: i64,
    pub wins: i64,
    pub losses: i64,
    pub home_record: String,
    pub away_record: String,
    pub win_percent: f64,
}

/// Aggregated team totals for one (season, season type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSeasonStats {
    pub team: i64,
    pub season: String,
    pub season_type: SeasonType,
    pub wins: i64,
    pub losses: i64,
    pub win_percent: f64,
    #[serde(flatten)]
    pub stats: CountingStats,
}

/// Aggregated player totals for one (season, season type). `curr_team` is
/// the sentinel for multi-team seasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonStats {
    pub player: i64,
    pub curr_team: i64,
    pub season: String,
    pub season_type: SeasonType,
    pub games_played: i64,
    pub games_started: i64,
    #[serde(flatten)]
    pub stats: CountingStats,
}

/// Aggregated career totals for one (player, season type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerCareerStats {
    pub player: i64,
    pub season_type: SeasonType,
    pub games_played: i64,
    pub games_started: i64,
    #[serde(flatten)]
    pub stats: CountingStats,
}

/// A complete, season-scoped set of assembled entities ready for bulk load.
/// Replaces any prior snapshot for the same season when persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonSnapshot {
    pub season: String,
    pub teams: Vec<Team>,
    pub players: Vec<Player>,
    pub games: Vec<Game>,
    pub team_game_logs: Vec<TeamGameLog>,
    pub player_game_logs: Vec<PlayerGameLog>,
    pub standings: Vec<Standing>,
    pub team_season_stats: Vec<TeamSeasonStats>,
    pub player_season_stats: Vec<PlayerSeasonStats>,
    pub player_career_stats: Vec<PlayerCareerStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with_ot(pts_ot1: i64, pts_ot2: i64) -> TeamGameLog {
        TeamGameLog {
            game: "0021800001".to_string(),
            team: 1,
            matchup: "BOS vs. PHI".to_string(),
            result: GameResult::W,
            curr_wins: 1,
            curr_losses: 0,
            stats: CountingStats::default(),
            pts_q1: 25,
            pts_q2: 25,
            pts_q3: 25,
            pts_q4: 25,
            pts_ot1,
            pts_ot2,
            pts_ot3: 0,
            pts_ot4: 0,
            pts_ot5: 0,
            pts_ot6: 0,
            pts_ot7: 0,
            pts_ot8: 0,
            pts_ot9: 0,
            pts_ot10: 0,
        }
    }

    #[test]
    fn test_overtime_single_period() {
        let home = log_with_ot(5, 0);
        let away = log_with_ot(5, 0);
        assert_eq!(overtime_periods(&home, &away), 1);
    }

    #[test]
    fn test_overtime_none_in_regulation_game() {
        let home = log_with_ot(0, 0);
        let away = log_with_ot(0, 0);
        assert_eq!(overtime_periods(&home, &away), 0);
    }

    #[test]
    fn test_overtime_counts_highest_period_on_either_side() {
        let mut home = log_with_ot(5, 0);
        let away = log_with_ot(3, 7);
        assert_eq!(overtime_periods(&home, &away), 2);

        home.pts_ot10 = 2;
        assert_eq!(overtime_periods(&home, &away), 10);
    }

    #[test]
    fn test_game_result_opposite() {
        assert_eq!(GameResult::W.opposite(), GameResult::L);
        assert_eq!(GameResult::L.opposite(), GameResult::W);
        assert_eq!(GameResult::parse("W"), Some(GameResult::W));
        assert_eq!(GameResult::parse("X"), None);
    }

    #[test]
    fn test_sentinel_team() {
        let tot = Team::sentinel();
        assert!(tot.is_sentinel());
        assert_eq!(tot.team_abb, "TOT");
        assert!(tot.team_conf.is_none());
    }

    #[test]
    fn test_derived_age() {
        let as_of = NaiveDate::from_ymd_opt(2019, 6, 1).unwrap();
        assert_eq!(derived_age("1988-03-14", as_of), Some(31));
        assert_eq!(derived_age("1988-06-02", as_of), Some(30));
        assert_eq!(derived_age("not-a-date", as_of), None);
        assert_eq!(derived_age("2088-01-01", as_of), None);
    }

    #[test]
    fn test_season_type_round_trip() {
        for st in SeasonType::ALL {
            assert_eq!(SeasonType::parse(st.as_str()), Some(st));
        }
        assert_eq!(SeasonType::Regular.as_query_param(), "Regular+Season");
        assert_eq!(SeasonType::Post.as_query_param(), "Playoffs");
    }

    #[test]
    fn test_team_game_log_flattens_stats_in_json() {
        let log = log_with_ot(0, 0);
        let value = serde_json::to_value(&log).unwrap();
        // Counting stats serialize inline with the log's own fields
        assert!(value.get("points").is_some());
        assert!(value.get("fg_percent").is_some());
        assert!(value.get("stats").is_none());
        assert_eq!(value.get("result").unwrap(), "W");
    }
}
