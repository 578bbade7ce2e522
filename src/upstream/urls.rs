//! URL building utilities for upstream endpoints

use crate::domain::SeasonType;

/// Closing calendar year of a season label, e.g. "2018-19" -> 2019.
/// Labels must be of the form `YYYY-YY`; the two-digit suffix shares the
/// start year's century, rolling over at "1999-00".
pub fn season_end_year(season: &str) -> Option<i32> {
    let (start, suffix) = season.split_once('-')?;
    if start.len() != 4 || suffix.len() != 2 {
        return None;
    }
    let start: i32 = start.parse().ok()?;
    let suffix: i32 = suffix.parse().ok()?;
    let mut end = start - start % 100 + suffix;
    if end < start {
        end += 100;
    }
    Some(end)
}

/// Builds the franchise index URL (one row per franchise with active years).
///
/// # Example
/// ```
/// use hoopsnap::upstream::build_team_index_url;
///
/// let url = build_team_index_url("https://stats.example.com/stats");
/// assert_eq!(url, "https://stats.example.com/stats/commonteamyears?LeagueID=00");
/// ```
pub fn build_team_index_url(api_domain: &str) -> String {
    format!("{api_domain}/commonteamyears?LeagueID=00")
}

/// Builds the per-team summary URL.
///
/// # Example
/// ```
/// use hoopsnap::upstream::build_team_info_url;
///
/// let url = build_team_info_url("https://stats.example.com/stats", 1610612737, "2018-19");
/// assert_eq!(
///     url,
///     "https://stats.example.com/stats/teaminfocommon?TeamID=1610612737&Season=2018-19"
/// );
/// ```
pub fn build_team_info_url(api_domain: &str, team_id: i64, season: &str) -> String {
    format!("{api_domain}/teaminfocommon?TeamID={team_id}&Season={season}")
}

/// Builds the season player index URL (ids and roster status only).
pub fn build_player_index_url(api_domain: &str, season: &str) -> String {
    format!("{api_domain}/commonallplayers?Season={season}&IsOnlyCurrentSeason=1")
}

/// Builds the per-player summary URL.
pub fn build_player_info_url(api_domain: &str, player_id: i64) -> String {
    format!("{api_domain}/commonplayerinfo?PlayerID={player_id}")
}

/// Builds the conference standings URL for a season-end snapshot date.
///
/// The scoreboard endpoint serves standings "as of" a date; June 1 of the
/// season's closing year is past the last regular-season game.
pub fn build_standings_url(api_domain: &str, year: i32) -> String {
    format!("{api_domain}/scoreboardv2?GameDate=06%2F01%2F{year}&LeagueID=00&DayOffset=0")
}

/// Builds the per-team game log URL.
pub fn build_team_game_log_url(api_domain: &str, team_id: i64, season: &str) -> String {
    format!("{api_domain}/teamgamelog?TeamID={team_id}&Season={season}")
}

/// Builds the league-wide player game log URL.
pub fn build_player_game_log_url(api_domain: &str, season: &str) -> String {
    format!("{api_domain}/leaguegamelog?Season={season}&PlayerOrTeam=P")
}

/// Builds the box score summary URL (game summary, line score, inactive players).
pub fn build_box_score_summary_url(api_domain: &str, game_id: &str) -> String {
    format!("{api_domain}/boxscoresummaryv2?GameID={game_id}")
}

/// Builds the traditional box score URL (per-player stat lines).
pub fn build_box_score_traditional_url(api_domain: &str, game_id: &str) -> String {
    format!("{api_domain}/boxscoretraditionalv2?GameID={game_id}")
}

/// Builds the per-player career totals URL. One response carries season and
/// career totals for both season types.
pub fn build_player_career_url(api_domain: &str, player_id: i64) -> String {
    format!("{api_domain}/playercareerstats?PlayerID={player_id}&PerMode=Totals")
}

/// Builds the league-wide team season totals URL.
pub fn build_team_season_stats_url(
    api_domain: &str,
    season: &str,
    season_type: SeasonType,
) -> String {
    format!(
        "{api_domain}/leaguedashteamstats?Season={season}&SeasonType={}&PerMode=Totals",
        season_type.as_query_param()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "https://stats.example.com/stats";

    #[test]
    fn test_team_urls() {
        assert_eq!(
            build_team_index_url(DOMAIN),
            "https://stats.example.com/stats/commonteamyears?LeagueID=00"
        );
        assert_eq!(
            build_team_info_url(DOMAIN, 1610612744, "2018-19"),
            "https://stats.example.com/stats/teaminfocommon?TeamID=1610612744&Season=2018-19"
        );
    }

    #[test]
    fn test_player_urls() {
        assert_eq!(
            build_player_index_url(DOMAIN, "2018-19"),
            "https://stats.example.com/stats/commonallplayers?Season=2018-19&IsOnlyCurrentSeason=1"
        );
        assert_eq!(
            build_player_info_url(DOMAIN, 201939),
            "https://stats.example.com/stats/commonplayerinfo?PlayerID=201939"
        );
        assert_eq!(
            build_player_career_url(DOMAIN, 201939),
            "https://stats.example.com/stats/playercareerstats?PlayerID=201939&PerMode=Totals"
        );
    }

    #[test]
    fn test_standings_url_encodes_snapshot_date() {
        assert_eq!(
            build_standings_url(DOMAIN, 2019),
            "https://stats.example.com/stats/scoreboardv2?GameDate=06%2F01%2F2019&LeagueID=00&DayOffset=0"
        );
    }

    #[test]
    fn test_game_urls() {
        assert_eq!(
            build_team_game_log_url(DOMAIN, 1610612744, "2018-19"),
            "https://stats.example.com/stats/teamgamelog?TeamID=1610612744&Season=2018-19"
        );
        assert_eq!(
            build_player_game_log_url(DOMAIN, "2018-19"),
            "https://stats.example.com/stats/leaguegamelog?Season=2018-19&PlayerOrTeam=P"
        );
        assert_eq!(
            build_box_score_summary_url(DOMAIN, "0021800001"),
            "https://stats.example.com/stats/boxscoresummaryv2?GameID=0021800001"
        );
        assert_eq!(
            build_box_score_traditional_url(DOMAIN, "0021800001"),
            "https://stats.example.com/stats/boxscoretraditionalv2?GameID=0021800001"
        );
    }

    #[test]
    fn test_season_end_year() {
        assert_eq!(season_end_year("2018-19"), Some(2019));
        assert_eq!(season_end_year("1999-00"), Some(2000));
        assert_eq!(season_end_year("2018"), None);
        assert_eq!(season_end_year("2018-019"), None);
        assert_eq!(season_end_year("18-19"), None);
    }

    #[test]
    fn test_season_type_query_param() {
        assert_eq!(
            build_team_season_stats_url(DOMAIN, "2018-19", SeasonType::Regular),
            "https://stats.example.com/stats/leaguedashteamstats?Season=2018-19&SeasonType=Regular+Season&PerMode=Totals"
        );
        assert_eq!(
            build_team_season_stats_url(DOMAIN, "2018-19", SeasonType::Post),
            "https://stats.example.com/stats/leaguedashteamstats?Season=2018-19&SeasonType=Playoffs&PerMode=Totals"
        );
    }
}
