//! Season ingestion pipeline
//!
//! Sequential batch orchestration: fetch every table kind for one season,
//! normalize into partitioned buffers, assemble the snapshot, and persist
//! it (or materialize fixture files). A transport failure that survives the
//! client's bounded retries marks the whole table-kind batch failed, which
//! is fatal to the run: partial snapshots are never committed.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::path::Path;

use tracing::{error, info, instrument};

use crate::assemble::{self, GameTables, NormalizedBatch};
use crate::config::Config;
use crate::domain::{SeasonSnapshot, SeasonType};
use crate::error::AppError;
use crate::normalize::{NormalizeMode, Row, TableKind, normalize};
use crate::snapshot::{PersistedCounts, SnapshotWriter, write_fixture_dir};
use crate::store::DomainStore;
use crate::upstream::{StatsClient, season_end_year};

/// Outcome of one table-kind batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    Ok,
    Failed(String),
}

/// Per-table-kind ingestion report line.
#[derive(Debug, Clone)]
pub struct TableReport {
    pub kind: TableKind,
    pub rows: usize,
    pub status: BatchStatus,
}

impl fmt::Display for TableReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            BatchStatus::Ok => write!(f, "{}: ok ({} rows)", self.kind, self.rows),
            BatchStatus::Failed(message) => write!(f, "{}: failed ({message})", self.kind),
        }
    }
}

/// Overall ingestion run report.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub season: String,
    pub tables: Vec<TableReport>,
    pub persisted: PersistedCounts,
}

/// Escalates an upstream error to a batch failure for the kind being
/// fetched. Schema violations and integrity errors keep their own kind:
/// their recovery policy differs from transport exhaustion.
fn batch_error(kind: TableKind, err: AppError) -> AppError {
    match err {
        e @ (AppError::ApiFetch(_)
        | AppError::ApiParse(_)
        | AppError::ApiNotFound { .. }
        | AppError::ApiServerError { .. }
        | AppError::ApiClientError { .. }
        | AppError::ApiRateLimit { .. }
        | AppError::NetworkTimeout { .. }
        | AppError::NetworkConnection { .. }
        | AppError::ApiMalformedJson { .. }) => {
            AppError::batch_failed(kind.as_str(), e.to_string())
        }
        other => other,
    }
}

fn ids_of(rows: &[Row], key: &str) -> Vec<i64> {
    rows.iter()
        .filter_map(|row| row.get(key).and_then(serde_json::Value::as_i64))
        .collect()
}

/// One season's ingestion run. Holds the explicit configuration and the
/// upstream client; the store handle is passed in per call so repeated runs
/// can use independent handles.
pub struct IngestPipeline {
    config: Config,
    season: String,
    client: StatsClient,
}

impl IngestPipeline {
    pub fn new(config: Config, season: impl Into<String>) -> Result<Self, AppError> {
        let season = season.into();
        if season_end_year(&season).is_none() {
            return Err(AppError::config_error(format!(
                "Invalid season label: {season} (expected e.g. 2018-19)"
            )));
        }
        let client = StatsClient::new(&config)?;
        Ok(IngestPipeline {
            config,
            season,
            client,
        })
    }

    pub fn season(&self) -> &str {
        &self.season
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetches and normalizes every table kind into the season batch.
    #[instrument(skip(self), fields(season = %self.season))]
    pub async fn collect(&self) -> Result<(NormalizedBatch, Vec<TableReport>), AppError> {
        let mut batch = NormalizedBatch::new(self.season.as_str());
        let mut reports = Vec::new();

        let result = self.collect_into(&mut batch, &mut reports).await;
        for report in &reports {
            info!("{report}");
        }
        if let Err(e) = result {
            error!("Ingestion batch for {} aborted: {e}", self.season);
            return Err(e);
        }
        Ok((batch, reports))
    }

    async fn collect_into(
        &self,
        batch: &mut NormalizedBatch,
        reports: &mut Vec<TableReport>,
    ) -> Result<(), AppError> {
        let season = &self.season;

        batch.team_list = self
            .fetch_table(TableKind::TeamList, reports, async {
                let raw = self.client.team_list(season).await?;
                normalize(TableKind::TeamList, &raw, NormalizeMode::Storage)
            })
            .await?;
        let team_ids = ids_of(&batch.team_list, "team_id");

        batch.player_list = self
            .fetch_table(TableKind::PlayerList, reports, async {
                let raw = self.client.player_list(season).await?;
                normalize(TableKind::PlayerList, &raw, NormalizeMode::Storage)
            })
            .await?;
        let player_ids = ids_of(&batch.player_list, "player_id");

        batch.standings = self
            .fetch_table(TableKind::Standings, reports, async {
                let raw = self.client.standings(season).await?;
                normalize(TableKind::Standings, &raw, NormalizeMode::Storage)
            })
            .await?;

        batch.team_game_logs = self
            .fetch_table(TableKind::TeamGameLog, reports, async {
                let mut rows = Vec::new();
                for &team_id in &team_ids {
                    let raw = self.client.team_game_log(team_id, season).await?;
                    rows.extend(normalize(
                        TableKind::TeamGameLog,
                        &raw,
                        NormalizeMode::Storage,
                    )?);
                }
                Ok(rows)
            })
            .await?;

        batch.player_game_logs = self
            .fetch_table(TableKind::PlayerGameLog, reports, async {
                let raw = self.client.player_game_log(season).await?;
                normalize(TableKind::PlayerGameLog, &raw, NormalizeMode::Storage)
            })
            .await?;

        // Game ids come from the accumulated team game logs; every game
        // appears in exactly two logs, the set dedups them.
        let game_ids: BTreeSet<String> = batch
            .team_game_logs
            .iter()
            .filter_map(|row| row.get("game").and_then(serde_json::Value::as_str))
            .map(str::to_string)
            .collect();

        let box_scores = self
            .collect_box_scores(&game_ids, reports)
            .await?;
        batch.box_scores = box_scores;

        let (player_season, player_career) = self
            .collect_player_careers(&player_ids, reports)
            .await?;
        batch.player_season_stats = player_season;
        batch.player_career_stats = player_career;

        batch.team_season_stats = self
            .fetch_table(TableKind::SeasonStats, reports, async {
                let mut rows = Vec::new();
                for season_type in SeasonType::ALL {
                    let raw = self.client.team_season_stats(season, season_type).await?;
                    for row in normalize(TableKind::SeasonStats, &raw, NormalizeMode::Storage)? {
                        rows.push((season_type, row));
                    }
                }
                Ok(rows)
            })
            .await?;

        Ok(())
    }

    async fn fetch_table<T, F>(
        &self,
        kind: TableKind,
        reports: &mut Vec<TableReport>,
        fetch: F,
    ) -> Result<Vec<T>, AppError>
    where
        F: Future<Output = Result<Vec<T>, AppError>>,
    {
        match fetch.await {
            Ok(rows) => {
                reports.push(TableReport {
                    kind,
                    rows: rows.len(),
                    status: BatchStatus::Ok,
                });
                Ok(rows)
            }
            Err(e) => {
                let e = batch_error(kind, e);
                reports.push(TableReport {
                    kind,
                    rows: 0,
                    status: BatchStatus::Failed(e.to_string()),
                });
                Err(e)
            }
        }
    }

    async fn collect_box_scores(
        &self,
        game_ids: &BTreeSet<String>,
        reports: &mut Vec<TableReport>,
    ) -> Result<std::collections::BTreeMap<String, GameTables>, AppError> {
        let mut box_scores = std::collections::BTreeMap::new();
        let mut summary_rows = 0usize;
        let mut player_rows = 0usize;

        let result: Result<(), AppError> = async {
            for game_id in game_ids {
                let mut response = self
                    .client
                    .box_score_summary(game_id)
                    .await
                    .map_err(|e| batch_error(TableKind::BoxScoreSummary, e))?;

                let mut tables = GameTables::default();
                for section in ["GameSummary", "LineScore", "InactivePlayers"] {
                    let raw = response.take_table(section).ok_or_else(|| {
                        AppError::schema_violation(
                            TableKind::BoxScoreSummary.as_str(),
                            format!("game {game_id} response is missing the {section} result set"),
                        )
                    })?;
                    let rows = normalize(TableKind::BoxScoreSummary, &raw, NormalizeMode::Storage)?;
                    summary_rows += rows.len();
                    match section {
                        "GameSummary" => tables.summary = rows,
                        "LineScore" => tables.line_score = rows,
                        _ => tables.inactive = rows,
                    }
                }

                let raw = self
                    .client
                    .box_score_traditional(game_id)
                    .await
                    .map_err(|e| batch_error(TableKind::BoxScoreTraditional, e))?;
                tables.player_stats =
                    normalize(TableKind::BoxScoreTraditional, &raw, NormalizeMode::Storage)?;
                player_rows += tables.player_stats.len();

                box_scores.insert(game_id.clone(), tables);
            }
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                reports.push(TableReport {
                    kind: TableKind::BoxScoreSummary,
                    rows: summary_rows,
                    status: BatchStatus::Ok,
                });
                reports.push(TableReport {
                    kind: TableKind::BoxScoreTraditional,
                    rows: player_rows,
                    status: BatchStatus::Ok,
                });
                Ok(box_scores)
            }
            Err(e) => {
                let kind = match &e {
                    AppError::BatchFailed { table_kind, .. }
                    | AppError::SchemaViolation { table_kind, .. }
                        if table_kind == TableKind::BoxScoreTraditional.as_str() =>
                    {
                        TableKind::BoxScoreTraditional
                    }
                    _ => TableKind::BoxScoreSummary,
                };
                reports.push(TableReport {
                    kind,
                    rows: 0,
                    status: BatchStatus::Failed(e.to_string()),
                });
                Err(e)
            }
        }
    }

    #[allow(clippy::type_complexity)]
    async fn collect_player_careers(
        &self,
        player_ids: &[i64],
        reports: &mut Vec<TableReport>,
    ) -> Result<(Vec<(SeasonType, Row)>, Vec<(SeasonType, Row)>), AppError> {
        let mut season_rows = Vec::new();
        let mut career_rows = Vec::new();

        let result: Result<(), AppError> = async {
            for &player_id in player_ids {
                let mut response = self
                    .client
                    .player_career(player_id)
                    .await
                    .map_err(|e| batch_error(TableKind::SeasonStats, e))?;

                for (section, kind, season_type) in [
                    (
                        "SeasonTotalsRegularSeason",
                        TableKind::SeasonStats,
                        SeasonType::Regular,
                    ),
                    (
                        "SeasonTotalsPostSeason",
                        TableKind::SeasonStats,
                        SeasonType::Post,
                    ),
                    (
                        "CareerTotalsRegularSeason",
                        TableKind::CareerStats,
                        SeasonType::Regular,
                    ),
                    (
                        "CareerTotalsPostSeason",
                        TableKind::CareerStats,
                        SeasonType::Post,
                    ),
                ] {
                    let raw = response.take_table(section).ok_or_else(|| {
                        AppError::schema_violation(
                            kind.as_str(),
                            format!(
                                "player {player_id} response is missing the {section} result set"
                            ),
                        )
                    })?;
                    let rows = normalize(kind, &raw, NormalizeMode::Storage)?;
                    let target = if kind == TableKind::SeasonStats {
                        &mut season_rows
                    } else {
                        &mut career_rows
                    };
                    for row in rows {
                        target.push((season_type, row));
                    }
                }
            }
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                reports.push(TableReport {
                    kind: TableKind::SeasonStats,
                    rows: season_rows.len(),
                    status: BatchStatus::Ok,
                });
                reports.push(TableReport {
                    kind: TableKind::CareerStats,
                    rows: career_rows.len(),
                    status: BatchStatus::Ok,
                });
                Ok((season_rows, career_rows))
            }
            Err(e) => {
                let kind = match &e {
                    AppError::SchemaViolation { table_kind, .. }
                        if table_kind == TableKind::CareerStats.as_str() =>
                    {
                        TableKind::CareerStats
                    }
                    _ => TableKind::SeasonStats,
                };
                reports.push(TableReport {
                    kind,
                    rows: 0,
                    status: BatchStatus::Failed(e.to_string()),
                });
                Err(e)
            }
        }
    }

    /// Collects and assembles the season without persisting.
    pub async fn snapshot(&self) -> Result<(SeasonSnapshot, Vec<TableReport>), AppError> {
        let (batch, reports) = self.collect().await?;
        let snapshot = assemble::assemble(&batch)?;
        Ok((snapshot, reports))
    }

    /// Full run: collect, assemble, persist into `store`.
    pub async fn run(&self, store: &DomainStore) -> Result<IngestReport, AppError> {
        let (snapshot, tables) = self.snapshot().await?;
        let persisted = SnapshotWriter::new(store).write(&snapshot).await?;
        info!(
            "Ingestion run for {} complete: {} rows persisted",
            self.season,
            persisted.total()
        );
        Ok(IngestReport {
            season: self.season.clone(),
            tables,
            persisted,
        })
    }

    /// Collects and assembles, then writes fixture files instead of rows.
    pub async fn run_fixtures(
        &self,
        dir: &Path,
    ) -> Result<(SeasonSnapshot, Vec<TableReport>), AppError> {
        let (snapshot, reports) = self.snapshot().await?;
        write_fixture_dir(&snapshot, dir).await?;
        Ok((snapshot, reports))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_error_wraps_transport_errors() {
        let err = batch_error(
            TableKind::TeamList,
            AppError::network_timeout("https://stats.example.com"),
        );
        match err {
            AppError::BatchFailed { table_kind, .. } => assert_eq!(table_kind, "team_list"),
            other => panic!("expected batch failure, got {other:?}"),
        }
    }

    #[test]
    fn test_batch_error_keeps_schema_violations() {
        let err = batch_error(
            TableKind::Standings,
            AppError::schema_violation("standings", "missing required column W"),
        );
        assert!(matches!(err, AppError::SchemaViolation { .. }));
    }

    #[test]
    fn test_pipeline_rejects_invalid_season_label() {
        let config = Config {
            api_domain: "https://stats.example.com".to_string(),
            ..Config::default()
        };
        let result = IngestPipeline::new(config, "2018");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_ids_of_reads_normalized_rows() {
        let mut row = Row::new();
        row.insert("team_id".to_string(), serde_json::json!(3));
        let rows = vec![row];
        assert_eq!(ids_of(&rows, "team_id"), vec![3]);
        assert!(ids_of(&rows, "player_id").is_empty());
    }
}
