use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::models::{RawTable, StatsResponse};
use super::urls::{
    build_box_score_summary_url, build_box_score_traditional_url, build_player_career_url,
    build_player_game_log_url, build_player_index_url, build_player_info_url,
    build_standings_url, build_team_game_log_url, build_team_index_url, build_team_info_url,
    build_team_season_stats_url, season_end_year,
};
use crate::config::Config;
use crate::domain::SeasonType;
use crate::error::AppError;

/// Upstream endpoint families. Pacing is tracked per family: calls to the
/// same family keep a minimum distance, calls to different families do not
/// delay each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointFamily {
    TeamIndex,
    TeamInfo,
    PlayerIndex,
    PlayerInfo,
    Scoreboard,
    TeamGameLog,
    LeagueGameLog,
    BoxScore,
    PlayerCareer,
    LeagueDash,
}

impl EndpointFamily {
    /// League-wide endpoints return larger payloads and get the longer delay.
    fn is_league_wide(&self) -> bool {
        matches!(
            self,
            EndpointFamily::TeamIndex
                | EndpointFamily::PlayerIndex
                | EndpointFamily::Scoreboard
                | EndpointFamily::LeagueGameLog
                | EndpointFamily::LeagueDash
        )
    }
}

/// Client for the upstream statistics provider.
///
/// Enforces a fixed minimum inter-request delay per endpoint family and
/// retries transient failures a bounded number of times with the same
/// pacing delay. This is a flat pacing policy, not adaptive backoff: the
/// provider throttles bursts, not sustained slow traffic.
pub struct StatsClient {
    client: Client,
    api_domain: String,
    per_entity_delay: Duration,
    league_delay: Duration,
    max_retry_attempts: u32,
    last_request: Mutex<HashMap<EndpointFamily, Instant>>,
}

impl StatsClient {
    /// Creates a client from the run configuration.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .pool_max_idle_per_host(crate::constants::HTTP_POOL_MAX_IDLE_PER_HOST)
            .build()?;

        Ok(StatsClient {
            client,
            api_domain: config.api_domain.clone(),
            per_entity_delay: Duration::from_millis(config.per_entity_delay_ms),
            league_delay: Duration::from_millis(config.league_delay_ms),
            max_retry_attempts: config.max_retry_attempts,
            last_request: Mutex::new(HashMap::new()),
        })
    }

    /// Sleeps until the family's minimum inter-request distance has passed.
    async fn pace(&self, family: EndpointFamily) {
        let delay = if family.is_league_wide() {
            self.league_delay
        } else {
            self.per_entity_delay
        };

        // The map lock is held through the sleep so concurrent callers of the
        // same family queue up behind each other instead of bursting.
        let mut last = self.last_request.lock().await;
        if let Some(prev) = last.get(&family) {
            let elapsed = prev.elapsed();
            if elapsed < delay {
                tokio::time::sleep(delay - elapsed).await;
            }
        }
        last.insert(family, Instant::now());
    }

    /// Fetches one upstream document with pacing and bounded retries.
    #[instrument(skip(self))]
    async fn fetch(&self, family: EndpointFamily, url: &str) -> Result<StatsResponse, AppError> {
        let mut attempt = 0u32;
        loop {
            self.pace(family).await;
            match self.fetch_once(url).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt + 1 < self.max_retry_attempts => {
                    attempt += 1;
                    warn!(
                        "Transient error fetching {}: {}. Retrying with fixed pacing (attempt {}/{})",
                        url, e, attempt, self.max_retry_attempts
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<StatsResponse, AppError> {
        debug!("Fetching data from URL: {url}");

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Request failed for URL {}: {}", url, e);
                return if e.is_timeout() {
                    Err(AppError::network_timeout(url))
                } else if e.is_connect() {
                    Err(AppError::network_connection(url, e.to_string()))
                } else {
                    Err(AppError::ApiFetch(e))
                };
            }
        };

        let status = response.status();
        debug!("Response status: {status}");

        if !status.is_success() {
            let status_code = status.as_u16();
            let reason = status.canonical_reason().unwrap_or("Unknown error");

            error!("HTTP {} - {} (URL: {})", status_code, reason, url);

            return Err(match status_code {
                404 => AppError::api_not_found(url),
                429 => AppError::api_rate_limit(reason, url),
                400..=499 => AppError::api_client_error(status_code, reason, url),
                _ => AppError::api_server_error(status_code, reason, url),
            });
        }

        let response_text = response.text().await.map_err(AppError::ApiFetch)?;
        debug!("Response length: {} bytes", response_text.len());

        match serde_json::from_str::<StatsResponse>(&response_text) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                error!("Failed to parse API response: {} (URL: {})", e, url);
                if !response_text.trim_start().starts_with('{') {
                    Err(AppError::api_malformed_json(
                        "Response is not a JSON document",
                        url,
                    ))
                } else {
                    Err(AppError::ApiParse(e))
                }
            }
        }
    }

    /// Takes a named result set out of a fetched document, treating absence
    /// as upstream schema drift for the given table kind.
    fn expect_table(
        mut response: StatsResponse,
        result_set: &str,
        table_kind: &str,
    ) -> Result<RawTable, AppError> {
        response.take_table(result_set).ok_or_else(|| {
            AppError::schema_violation(
                table_kind,
                format!("response is missing the {result_set} result set"),
            )
        })
    }

    /// Fetches the team table: one summary row per active franchise.
    ///
    /// The franchise index supplies the ids; each team's summary row is then
    /// fetched individually and accumulated into a single table.
    pub async fn team_list(&self, season: &str) -> Result<RawTable, AppError> {
        info!("Retrieving team list data");
        let url = build_team_index_url(&self.api_domain);
        let index = Self::expect_table(
            self.fetch(EndpointFamily::TeamIndex, &url).await?,
            "TeamYears",
            "team_list",
        )?;

        let end_year = season_end_year(season)
            .ok_or_else(|| AppError::config_error(format!("Invalid season label: {season}")))?;
        let team_ids = active_franchise_ids(&index, end_year)?;

        let mut table = RawTable::default();
        for team_id in team_ids {
            info!("Retrieving team summary data for {team_id}");
            let url = build_team_info_url(&self.api_domain, team_id, season);
            let summary = Self::expect_table(
                self.fetch(EndpointFamily::TeamInfo, &url).await?,
                "TeamInfoCommon",
                "team_list",
            )?;
            table
                .extend_rows(summary)
                .map_err(|msg| AppError::schema_violation("team_list", msg))?;
        }
        Ok(table)
    }

    /// Fetches the player table: one summary row per player on an active
    /// roster. Players with roster status 0 are skipped without a fetch.
    pub async fn player_list(&self, season: &str) -> Result<RawTable, AppError> {
        info!("Retrieving player list data");
        let url = build_player_index_url(&self.api_domain, season);
        let index = Self::expect_table(
            self.fetch(EndpointFamily::PlayerIndex, &url).await?,
            "CommonAllPlayers",
            "player_list",
        )?;

        let id_col = index.column_index("PERSON_ID").ok_or_else(|| {
            AppError::schema_violation("player_list", "missing required column PERSON_ID")
        })?;
        let status_col = index.column_index("ROSTERSTATUS").ok_or_else(|| {
            AppError::schema_violation("player_list", "missing required column ROSTERSTATUS")
        })?;

        let mut table = RawTable::default();
        for row in &index.rows {
            let roster_status = row.get(status_col).and_then(cell_as_i64).unwrap_or(0);
            if roster_status == 0 {
                continue;
            }
            let player_id = row.get(id_col).and_then(cell_as_i64).ok_or_else(|| {
                AppError::schema_violation("player_list", "PERSON_ID cell is not an integer")
            })?;

            info!("Retrieving player summary data for {player_id}");
            let url = build_player_info_url(&self.api_domain, player_id);
            let summary = Self::expect_table(
                self.fetch(EndpointFamily::PlayerInfo, &url).await?,
                "CommonPlayerInfo",
                "player_list",
            )?;
            table
                .extend_rows(summary)
                .map_err(|msg| AppError::schema_violation("player_list", msg))?;
        }
        Ok(table)
    }

    /// Fetches season-end conference standings, both conferences in one table.
    pub async fn standings(&self, season: &str) -> Result<RawTable, AppError> {
        info!("Retrieving standing data");
        let end_year = season_end_year(season)
            .ok_or_else(|| AppError::config_error(format!("Invalid season label: {season}")))?;
        let url = build_standings_url(&self.api_domain, end_year);
        let mut response = self.fetch(EndpointFamily::Scoreboard, &url).await?;

        let east = response.take_table("EastConfStandingsByDay").ok_or_else(|| {
            AppError::schema_violation(
                "standings",
                "response is missing the EastConfStandingsByDay result set",
            )
        })?;
        let west = response.take_table("WestConfStandingsByDay").ok_or_else(|| {
            AppError::schema_violation(
                "standings",
                "response is missing the WestConfStandingsByDay result set",
            )
        })?;

        let mut table = RawTable::default();
        table
            .extend_rows(east)
            .and_then(|_| table.extend_rows(west))
            .map_err(|msg| AppError::schema_violation("standings", msg))?;
        table.name = "ConfStandingsByDay".to_string();
        Ok(table)
    }

    /// Fetches one team's game log for the season.
    pub async fn team_game_log(&self, team_id: i64, season: &str) -> Result<RawTable, AppError> {
        info!("Retrieving team game log data for {team_id}");
        let url = build_team_game_log_url(&self.api_domain, team_id, season);
        Self::expect_table(
            self.fetch(EndpointFamily::TeamGameLog, &url).await?,
            "TeamGameLog",
            "team_game_log",
        )
    }

    /// Fetches the league-wide player game log for the season.
    pub async fn player_game_log(&self, season: &str) -> Result<RawTable, AppError> {
        info!("Retrieving player game log data");
        let url = build_player_game_log_url(&self.api_domain, season);
        Self::expect_table(
            self.fetch(EndpointFamily::LeagueGameLog, &url).await?,
            "LeagueGameLog",
            "player_game_log",
        )
    }

    /// Fetches one game's summary document (game summary, line score,
    /// inactive players). The caller splits the named result sets.
    pub async fn box_score_summary(&self, game_id: &str) -> Result<StatsResponse, AppError> {
        info!("Retrieving boxscore summary data for {game_id}");
        let url = build_box_score_summary_url(&self.api_domain, game_id);
        self.fetch(EndpointFamily::BoxScore, &url).await
    }

    /// Fetches one game's traditional box score (per-player stat lines in
    /// display order).
    pub async fn box_score_traditional(&self, game_id: &str) -> Result<RawTable, AppError> {
        info!("Retrieving boxscore data for {game_id}");
        let url = build_box_score_traditional_url(&self.api_domain, game_id);
        Self::expect_table(
            self.fetch(EndpointFamily::BoxScore, &url).await?,
            "PlayerStats",
            "box_score_traditional",
        )
    }

    /// Fetches one player's career document: season and career totals for
    /// both season types in one response.
    pub async fn player_career(&self, player_id: i64) -> Result<StatsResponse, AppError> {
        info!("Retrieving player season stats data for {player_id}");
        let url = build_player_career_url(&self.api_domain, player_id);
        self.fetch(EndpointFamily::PlayerCareer, &url).await
    }

    /// Fetches league-wide team season totals for one season type.
    pub async fn team_season_stats(
        &self,
        season: &str,
        season_type: SeasonType,
    ) -> Result<RawTable, AppError> {
        info!("Retrieving team season stats data ({season_type})");
        let url = build_team_season_stats_url(&self.api_domain, season, season_type);
        Self::expect_table(
            self.fetch(EndpointFamily::LeagueDash, &url).await?,
            "LeagueDashTeamStats",
            "season_stats",
        )
    }
}

/// Lenient integer read used on index tables before normalization proper.
fn cell_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Franchise ids still active in the season ending `end_year`.
fn active_franchise_ids(index: &RawTable, end_year: i32) -> Result<Vec<i64>, AppError> {
    let id_col = index.column_index("TEAM_ID").ok_or_else(|| {
        AppError::schema_violation("team_list", "missing required column TEAM_ID")
    })?;
    let max_year_col = index.column_index("MAX_YEAR").ok_or_else(|| {
        AppError::schema_violation("team_list", "missing required column MAX_YEAR")
    })?;

    let mut ids = Vec::new();
    for row in &index.rows {
        let max_year = match row.get(max_year_col) {
            Some(Value::String(s)) => s.trim().parse::<i32>().ok(),
            Some(v) => cell_as_i64(v).map(|y| y as i32),
            None => None,
        };
        if max_year.is_some_and(|y| y >= end_year)
            && let Some(id) = row.get(id_col).and_then(cell_as_i64)
        {
            ids.push(id);
        }
    }
    Ok(ids)
}
