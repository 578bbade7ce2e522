use std::collections::HashSet;

use sqlx::SqliteConnection;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use tracing::{info, instrument};

use crate::domain::{
    CountingStats, Game, Player, PlayerCareerStats, PlayerGameLog, PlayerSeasonStats,
    SeasonSnapshot, Standing, Team, TeamGameLog, TeamSeasonStats,
};
use crate::error::AppError;
use crate::store::{DomainStore, schema};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

const STAT_COLUMNS: &str = "minutes, points, offense_reb, defense_reb, rebounds, assists, \
    steals, blocks, turnovers, fouls, fg_made, fg_attempt, fg_percent, fg3_made, fg3_attempt, \
    fg3_percent, ft_made, ft_attempt, ft_percent";

const STAT_PLACEHOLDERS: &str = "?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?";

fn bind_stats<'q>(query: SqliteQuery<'q>, stats: &CountingStats) -> SqliteQuery<'q> {
    query
        .bind(stats.minutes)
        .bind(stats.points)
        .bind(stats.offense_reb)
        .bind(stats.defense_reb)
        .bind(stats.rebounds)
        .bind(stats.assists)
        .bind(stats.steals)
        .bind(stats.blocks)
        .bind(stats.turnovers)
        .bind(stats.fouls)
        .bind(stats.fg_made)
        .bind(stats.fg_attempt)
        .bind(stats.fg_percent)
        .bind(stats.fg3_made)
        .bind(stats.fg3_attempt)
        .bind(stats.fg3_percent)
        .bind(stats.ft_made)
        .bind(stats.ft_attempt)
        .bind(stats.ft_percent)
}

/// Row counts persisted by one snapshot write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedCounts {
    pub teams: usize,
    pub players: usize,
    pub games: usize,
    pub standings: usize,
    pub team_game_logs: usize,
    pub player_game_logs: usize,
    pub team_season_stats: usize,
    pub player_season_stats: usize,
    pub player_career_stats: usize,
}

impl PersistedCounts {
    pub fn total(&self) -> usize {
        self.teams
            + self.players
            + self.games
            + self.standings
            + self.team_game_logs
            + self.player_game_logs
            + self.team_season_stats
            + self.player_season_stats
            + self.player_career_stats
    }
}

/// Persists assembled snapshots into the domain store.
///
/// The write is delete-then-insert for the snapshot's season inside a
/// single transaction, in strict foreign-key dependency order: teams before
/// players before games before stats and logs. Duplicate primary keys are
/// detected before any row is touched, and a failed write commits nothing.
pub struct SnapshotWriter<'a> {
    store: &'a DomainStore,
}

impl<'a> SnapshotWriter<'a> {
    pub fn new(store: &'a DomainStore) -> Self {
        SnapshotWriter { store }
    }

    #[instrument(skip(self, snapshot), fields(season = %snapshot.season))]
    pub async fn write(&self, snapshot: &SeasonSnapshot) -> Result<PersistedCounts, AppError> {
        check_unique_keys(snapshot)?;

        let season = snapshot.season.as_str();
        let mut tx = self.store.pool().begin().await?;

        // Replace, never merge: delete in reverse dependency order first
        for (table, scope) in schema::DELETE_ORDER {
            let sql = format!("DELETE FROM {table} WHERE {scope} = ?");
            sqlx::query(&sql).bind(season).execute(&mut *tx).await?;
        }

        for team in &snapshot.teams {
            insert_team(&mut tx, season, team).await?;
        }
        for player in &snapshot.players {
            insert_player(&mut tx, season, player).await?;
        }
        for game in &snapshot.games {
            insert_game(&mut tx, season, game).await?;
        }
        for (index, standing) in snapshot.standings.iter().enumerate() {
            insert_standing(&mut tx, season, index as i64 + 1, standing).await?;
        }
        for (index, stats) in snapshot.team_season_stats.iter().enumerate() {
            insert_team_season_stats(&mut tx, index as i64 + 1, stats).await?;
        }
        for (index, stats) in snapshot.player_season_stats.iter().enumerate() {
            insert_player_season_stats(&mut tx, season, index as i64 + 1, stats).await?;
        }
        for (index, stats) in snapshot.player_career_stats.iter().enumerate() {
            insert_player_career_stats(&mut tx, season, index as i64 + 1, stats).await?;
        }
        for (index, log) in snapshot.team_game_logs.iter().enumerate() {
            insert_team_game_log(&mut tx, season, index as i64 + 1, log).await?;
        }
        for (index, log) in snapshot.player_game_logs.iter().enumerate() {
            insert_player_game_log(&mut tx, season, index as i64 + 1, log).await?;
        }

        tx.commit().await?;

        let counts = PersistedCounts {
            teams: snapshot.teams.len(),
            players: snapshot.players.len(),
            games: snapshot.games.len(),
            standings: snapshot.standings.len(),
            team_game_logs: snapshot.team_game_logs.len(),
            player_game_logs: snapshot.player_game_logs.len(),
            team_season_stats: snapshot.team_season_stats.len(),
            player_season_stats: snapshot.player_season_stats.len(),
            player_career_stats: snapshot.player_career_stats.len(),
        };
        info!(
            "Persisted snapshot for {}: {} rows total",
            season,
            counts.total()
        );
        Ok(counts)
    }
}

/// Rejects duplicate primary keys within one snapshot before anything is
/// written. A duplicate is a contradiction in the assembled data, not a
/// conflict to resolve by overwriting.
fn check_unique_keys(snapshot: &SeasonSnapshot) -> Result<(), AppError> {
    fn unique<I, K: std::hash::Hash + Eq>(items: I, what: &str) -> Result<(), AppError>
    where
        I: IntoIterator<Item = K>,
    {
        let mut seen = HashSet::new();
        for key in items {
            if !seen.insert(key) {
                return Err(AppError::data_integrity(format!(
                    "duplicate {what} primary key in snapshot"
                )));
            }
        }
        Ok(())
    }

    unique(snapshot.teams.iter().map(|t| t.team_id), "team")?;
    unique(snapshot.players.iter().map(|p| p.player_id), "player")?;
    unique(snapshot.games.iter().map(|g| g.game_id.as_str()), "game")?;
    unique(snapshot.standings.iter().map(|s| s.team), "standing")?;
    unique(
        snapshot
            .team_game_logs
            .iter()
            .map(|l| (l.game.as_str(), l.team)),
        "team game log",
    )?;
    unique(
        snapshot
            .player_game_logs
            .iter()
            .map(|l| (l.game.as_str(), l.player)),
        "player game log",
    )?;
    unique(
        snapshot
            .team_season_stats
            .iter()
            .map(|s| (s.team, s.season_type)),
        "team season stats",
    )?;
    unique(
        snapshot
            .player_season_stats
            .iter()
            .map(|s| (s.player, s.season.as_str(), s.season_type, s.curr_team)),
        "player season stats",
    )?;
    unique(
        snapshot
            .player_career_stats
            .iter()
            .map(|s| (s.player, s.season_type)),
        "player career stats",
    )?;
    Ok(())
}

async fn insert_team(
    conn: &mut SqliteConnection,
    season: &str,
    team: &Team,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO teams (season, team_id, team_abb, team_conf, team_div, team_city, \
         team_name, wins, losses, nba_debut, max_year) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(season)
    .bind(team.team_id)
    .bind(&team.team_abb)
    .bind(team.team_conf.map(|c| c.to_string()))
    .bind(&team.team_div)
    .bind(&team.team_city)
    .bind(&team.team_name)
    .bind(team.wins)
    .bind(team.losses)
    .bind(&team.nba_debut)
    .bind(&team.max_year)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_player(
    conn: &mut SqliteConnection,
    season: &str,
    player: &Player,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO players (season, player_id, team, first_name, last_name, birth_date, \
         draft_year, draft_round, draft_number, position, jersey, height, weight, school, \
         country, season_exp) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(season)
    .bind(player.player_id)
    .bind(player.team)
    .bind(&player.first_name)
    .bind(&player.last_name)
    .bind(&player.birth_date)
    .bind(&player.draft_year)
    .bind(&player.draft_round)
    .bind(&player.draft_number)
    .bind(&player.position)
    .bind(player.jersey)
    .bind(&player.height)
    .bind(player.weight)
    .bind(&player.school)
    .bind(&player.country)
    .bind(player.season_exp)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_game(
    conn: &mut SqliteConnection,
    season: &str,
    game: &Game,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO games (season, game_id, game_date, home_team, away_team, broadcaster, \
         inactive_players, dnp_players) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(season)
    .bind(&game.game_id)
    .bind(&game.game_date)
    .bind(game.home_team)
    .bind(game.away_team)
    .bind(game.broadcaster.as_deref())
    .bind(serde_json::to_string(&game.inactive_players)?)
    .bind(serde_json::to_string(&game.dnp_players)?)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_standing(
    conn: &mut SqliteConnection,
    season: &str,
    pk: i64,
    standing: &Standing,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO standings (season, pk, team, wins, losses, home_record, away_record, \
         win_percent) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(season)
    .bind(pk)
    .bind(standing.team)
    .bind(standing.wins)
    .bind(standing.losses)
    .bind(&standing.home_record)
    .bind(&standing.away_record)
    .bind(standing.win_percent)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_team_game_log(
    conn: &mut SqliteConnection,
    season: &str,
    pk: i64,
    log: &TeamGameLog,
) -> Result<(), AppError> {
    let sql = format!(
        "INSERT INTO team_game_logs (season, pk, game, team, matchup, result, curr_wins, \
         curr_losses, {STAT_COLUMNS}, pts_q1, pts_q2, pts_q3, pts_q4, pts_ot1, pts_ot2, \
         pts_ot3, pts_ot4, pts_ot5, pts_ot6, pts_ot7, pts_ot8, pts_ot9, pts_ot10) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, {STAT_PLACEHOLDERS}, \
         ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    );
    let query = sqlx::query(&sql)
        .bind(season)
        .bind(pk)
        .bind(&log.game)
        .bind(log.team)
        .bind(&log.matchup)
        .bind(log.result.as_str())
        .bind(log.curr_wins)
        .bind(log.curr_losses);
    bind_stats(query, &log.stats)
        .bind(log.pts_q1)
        .bind(log.pts_q2)
        .bind(log.pts_q3)
        .bind(log.pts_q4)
        .bind(log.pts_ot1)
        .bind(log.pts_ot2)
        .bind(log.pts_ot3)
        .bind(log.pts_ot4)
        .bind(log.pts_ot5)
        .bind(log.pts_ot6)
        .bind(log.pts_ot7)
        .bind(log.pts_ot8)
        .bind(log.pts_ot9)
        .bind(log.pts_ot10)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn insert_player_game_log(
    conn: &mut SqliteConnection,
    season: &str,
    pk: i64,
    log: &PlayerGameLog,
) -> Result<(), AppError> {
    let sql = format!(
        "INSERT INTO player_game_logs (season, pk, game, player, curr_team, matchup, result, \
         \"order\", plus_minus, {STAT_COLUMNS}) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, {STAT_PLACEHOLDERS})"
    );
    let query = sqlx::query(&sql)
        .bind(season)
        .bind(pk)
        .bind(&log.game)
        .bind(log.player)
        .bind(log.curr_team)
        .bind(&log.matchup)
        .bind(log.result.as_str())
        .bind(log.order)
        .bind(log.plus_minus);
    bind_stats(query, &log.stats).execute(&mut *conn).await?;
    Ok(())
}

async fn insert_team_season_stats(
    conn: &mut SqliteConnection,
    pk: i64,
    stats: &TeamSeasonStats,
) -> Result<(), AppError> {
    let sql = format!(
        "INSERT INTO team_season_stats (season, pk, team, season_type, wins, losses, \
         win_percent, {STAT_COLUMNS}) \
         VALUES (?, ?, ?, ?, ?, ?, ?, {STAT_PLACEHOLDERS})"
    );
    let query = sqlx::query(&sql)
        .bind(&stats.season)
        .bind(pk)
        .bind(stats.team)
        .bind(stats.season_type.as_str())
        .bind(stats.wins)
        .bind(stats.losses)
        .bind(stats.win_percent);
    bind_stats(query, &stats.stats).execute(&mut *conn).await?;
    Ok(())
}

async fn insert_player_season_stats(
    conn: &mut SqliteConnection,
    snapshot: &str,
    pk: i64,
    stats: &PlayerSeasonStats,
) -> Result<(), AppError> {
    let sql = format!(
        "INSERT INTO player_season_stats (snapshot, pk, player, curr_team, season, \
         season_type, games_played, games_started, {STAT_COLUMNS}) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, {STAT_PLACEHOLDERS})"
    );
    let query = sqlx::query(&sql)
        .bind(snapshot)
        .bind(pk)
        .bind(stats.player)
        .bind(stats.curr_team)
        .bind(&stats.season)
        .bind(stats.season_type.as_str())
        .bind(stats.games_played)
        .bind(stats.games_started);
    bind_stats(query, &stats.stats).execute(&mut *conn).await?;
    Ok(())
}

async fn insert_player_career_stats(
    conn: &mut SqliteConnection,
    snapshot: &str,
    pk: i64,
    stats: &PlayerCareerStats,
) -> Result<(), AppError> {
    let sql = format!(
        "INSERT INTO player_career_stats (snapshot, pk, player, season_type, games_played, \
         games_started, {STAT_COLUMNS}) \
         VALUES (?, ?, ?, ?, ?, ?, {STAT_PLACEHOLDERS})"
    );
    let query = sqlx::query(&sql)
        .bind(snapshot)
        .bind(pk)
        .bind(stats.player)
        .bind(stats.season_type.as_str())
        .bind(stats.games_played)
        .bind(stats.games_started);
    bind_stats(query, &stats.stats).execute(&mut *conn).await?;
    Ok(())
}
