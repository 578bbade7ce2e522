//! Snapshot writer and read boundary tests against an in-memory store.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::json;

use hoopsnap::domain::{
    Conference, CountingStats, Game, GameResult, Player, PlayerCareerStats, PlayerGameLog,
    PlayerSeasonStats, SeasonSnapshot, SeasonType, Standing, Team, TeamGameLog, TeamSeasonStats,
};
use hoopsnap::error::AppError;
use hoopsnap::snapshot::{SnapshotWriter, load_fixture_dir, write_fixture_dir};
use hoopsnap::store::DomainStore;

const SEASON: &str = "2018-19";

fn team(team_id: i64, abb: &str, conference: Conference, wins: i64) -> Team {
    Team {
        team_id,
        team_abb: abb.to_string(),
        team_conf: Some(conference),
        team_div: "Atlantic".to_string(),
        team_city: "City".to_string(),
        team_name: "Name".to_string(),
        wins,
        losses: 82 - wins,
        nba_debut: "1946".to_string(),
        max_year: "2019".to_string(),
    }
}

fn player(player_id: i64, team: i64, birth_date: &str) -> Player {
    Player {
        player_id,
        team,
        first_name: "First".to_string(),
        last_name: "Last".to_string(),
        birth_date: birth_date.to_string(),
        draft_year: "2014".to_string(),
        draft_round: "1".to_string(),
        draft_number: "12".to_string(),
        position: "Guard".to_string(),
        jersey: 11,
        height: "6-4".to_string(),
        weight: 205,
        school: "N/A".to_string(),
        country: "USA".to_string(),
        season_exp: 5,
    }
}

fn stats(points: i64, fg_percent: f64) -> CountingStats {
    CountingStats {
        minutes: 240.0,
        points,
        offense_reb: 10,
        defense_reb: 30,
        rebounds: 40,
        assists: 25,
        steals: 8,
        blocks: 5,
        turnovers: 12,
        fouls: 20,
        fg_made: 40,
        fg_attempt: 90,
        fg_percent,
        fg3_made: 10,
        fg3_attempt: 30,
        fg3_percent: 0.333,
        ft_made: 15,
        ft_attempt: 20,
        ft_percent: 0.75,
    }
}

fn team_game_log(game: &str, team: i64, result: GameResult, points: i64, ot1: i64) -> TeamGameLog {
    TeamGameLog {
        game: game.to_string(),
        team,
        matchup: "A vs. B".to_string(),
        result,
        curr_wins: 1,
        curr_losses: 0,
        stats: stats(points, 0.47),
        pts_q1: 25,
        pts_q2: 25,
        pts_q3: 25,
        pts_q4: points - 75 - ot1,
        pts_ot1: ot1,
        pts_ot2: 0,
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

fn sample_snapshot() -> SeasonSnapshot {
    let game_id = "0021800050";
    let mut dnp = BTreeMap::new();
    dnp.insert(8, "DND - Rest".to_string());

    SeasonSnapshot {
        season: SEASON.to_string(),
        teams: vec![
            team(1, "AAA", Conference::East, 49),
            team(2, "BBB", Conference::West, 57),
            Team::sentinel(),
        ],
        players: vec![
            player(7, 1, "1993-03-16"),
            player(8, 1, "1988-03-14"),
            player(9, 2, "1998-03-03"),
        ],
        games: vec![Game {
            game_id: game_id.to_string(),
            season: SEASON.to_string(),
            game_date: "2018-10-16".to_string(),
            home_team: 2,
            away_team: 1,
            broadcaster: Some("TNT".to_string()),
            inactive_players: vec![7],
            dnp_players: dnp,
        }],
        team_game_logs: vec![
            team_game_log(game_id, 2, GameResult::W, 110, 10),
            team_game_log(game_id, 1, GameResult::L, 105, 5),
        ],
        player_game_logs: vec![
            PlayerGameLog {
                game: game_id.to_string(),
                player: 9,
                curr_team: 2,
                matchup: "A vs. B".to_string(),
                result: GameResult::W,
                order: 0,
                plus_minus: 5,
                stats: stats(45, 0.529),
            },
            PlayerGameLog {
                game: game_id.to_string(),
                player: 7,
                curr_team: 1,
                matchup: "B @ A".to_string(),
                result: GameResult::L,
                order: 0,
                plus_minus: -5,
                stats: stats(30, 0.4285),
            },
        ],
        standings: vec![
            Standing {
                team: 1,
                wins: 49,
                losses: 33,
                home_record: "28-13".to_string(),
                away_record: "21-20".to_string(),
                win_percent: 0.598,
            },
            Standing {
                team: 2,
                wins: 57,
                losses: 25,
                home_record: "30-11".to_string(),
                away_record: "27-14".to_string(),
                win_percent: 0.695,
            },
        ],
        team_season_stats: vec![TeamSeasonStats {
            team: 1,
            season: SEASON.to_string(),
            season_type: SeasonType::Regular,
            wins: 49,
            losses: 33,
            win_percent: 0.598,
            stats: stats(9216, 0.465),
        }],
        player_season_stats: vec![PlayerSeasonStats {
            player: 7,
            curr_team: 1,
            season: SEASON.to_string(),
            season_type: SeasonType::Regular,
            games_played: 69,
            games_started: 69,
            stats: stats(1881, 0.472),
        }],
        player_career_stats: vec![PlayerCareerStats {
            player: 7,
            season_type: SeasonType::Regular,
            games_played: 694,
            games_started: 679,
            stats: stats(16419, 0.477),
        }],
    }
}

#[tokio::test]
async fn test_write_then_load_round_trips_entities() {
    let store = DomainStore::connect(":memory:").await.unwrap();
    let snapshot = sample_snapshot();

    let counts = SnapshotWriter::new(&store).write(&snapshot).await.unwrap();
    assert_eq!(counts.teams, 3);
    assert_eq!(counts.total(), 3 + 3 + 1 + 2 + 2 + 2 + 1 + 1 + 1);

    assert_eq!(store.load_teams(SEASON).await.unwrap().len(), 3);
    assert_eq!(store.load_players(SEASON).await.unwrap(), snapshot.players);
    assert_eq!(store.load_games(SEASON).await.unwrap(), snapshot.games);
    assert_eq!(
        store.load_team_game_logs(SEASON).await.unwrap(),
        snapshot.team_game_logs
    );
    assert_eq!(
        store.load_player_game_logs(SEASON).await.unwrap(),
        snapshot.player_game_logs
    );
    assert_eq!(
        store.load_standings(SEASON).await.unwrap(),
        snapshot.standings
    );
    assert_eq!(
        store.load_player_season_stats(SEASON).await.unwrap(),
        snapshot.player_season_stats
    );
    assert_eq!(
        store.load_player_career_stats(SEASON).await.unwrap(),
        snapshot.player_career_stats
    );
}

#[tokio::test]
async fn test_writing_twice_yields_identical_row_set() {
    let store = DomainStore::connect(":memory:").await.unwrap();
    let snapshot = sample_snapshot();
    let writer = SnapshotWriter::new(&store);

    let first = writer.write(&snapshot).await.unwrap();
    let teams_first = store.load_teams(SEASON).await.unwrap();
    let logs_first = store.load_team_game_logs(SEASON).await.unwrap();

    let second = writer.write(&snapshot).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(teams_first, store.load_teams(SEASON).await.unwrap());
    assert_eq!(logs_first, store.load_team_game_logs(SEASON).await.unwrap());
}

#[tokio::test]
async fn test_other_seasons_survive_a_rewrite() {
    let store = DomainStore::connect(":memory:").await.unwrap();
    let writer = SnapshotWriter::new(&store);

    let snapshot = sample_snapshot();
    writer.write(&snapshot).await.unwrap();

    let mut other = sample_snapshot();
    other.season = "2017-18".to_string();
    for game in &mut other.games {
        game.season = other.season.clone();
    }
    for row in &mut other.team_season_stats {
        row.season = other.season.clone();
    }
    for row in &mut other.player_season_stats {
        row.season = other.season.clone();
    }
    writer.write(&other).await.unwrap();

    // Rewriting one season leaves the other untouched
    writer.write(&snapshot).await.unwrap();
    assert_eq!(store.count_rows("teams", "2017-18").await.unwrap(), 3);
    assert_eq!(store.count_rows("teams", SEASON).await.unwrap(), 3);
}

#[tokio::test]
async fn test_duplicate_primary_key_aborts_without_partial_commit() {
    let store = DomainStore::connect(":memory:").await.unwrap();
    let writer = SnapshotWriter::new(&store);

    let snapshot = sample_snapshot();
    writer.write(&snapshot).await.unwrap();
    let players_before = store.load_players(SEASON).await.unwrap();

    let mut corrupted = sample_snapshot();
    corrupted.players.push(player(7, 1, "1993-03-16"));

    let err = writer.write(&corrupted).await.unwrap_err();
    assert!(matches!(err, AppError::DataIntegrity(_)));

    // The previously persisted snapshot is untouched
    assert_eq!(players_before, store.load_players(SEASON).await.unwrap());
}

#[tokio::test]
async fn test_fixture_dir_bulk_loads_into_store() {
    let snapshot = sample_snapshot();
    let dir = tempfile::tempdir().unwrap();
    write_fixture_dir(&snapshot, dir.path()).await.unwrap();

    let loaded = load_fixture_dir(dir.path(), SEASON).await.unwrap();
    let store = DomainStore::connect(":memory:").await.unwrap();
    let counts = SnapshotWriter::new(&store).write(&loaded).await.unwrap();

    assert_eq!(counts.total(), 16);
    assert_eq!(store.load_games(SEASON).await.unwrap(), snapshot.games);
}

#[tokio::test]
async fn test_reader_derives_ages_at_read_time() {
    let store = DomainStore::connect(":memory:").await.unwrap();
    SnapshotWriter::new(&store)
        .write(&sample_snapshot())
        .await
        .unwrap();

    let as_of = NaiveDate::from_ymd_opt(2019, 6, 1).unwrap();
    let detail = store.player_detail(SEASON, 8, as_of).await.unwrap().unwrap();
    assert_eq!(detail["AGE"], json!(31));
    assert_eq!(detail["BIRTH_DATE"], json!("1988-03-14"));

    // A later read date yields a larger age from the same stored row
    let later = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
    let detail = store.player_detail(SEASON, 8, later).await.unwrap().unwrap();
    assert_eq!(detail["AGE"], json!(33));

    let roster = store.team_roster(SEASON, 1, as_of).await.unwrap();
    assert_eq!(roster.len(), 2);
    assert!(roster.iter().all(|p| p["AGE"].as_i64().is_some()));
}

#[tokio::test]
async fn test_reader_display_percentages_converted_once() {
    let store = DomainStore::connect(":memory:").await.unwrap();
    SnapshotWriter::new(&store)
        .write(&sample_snapshot())
        .await
        .unwrap();

    let rows = store
        .player_season_stats_display(SEASON, 7, SeasonType::Regular)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["FG%"], json!(47.2));
    assert_eq!(rows[0]["FG3%"], json!(33.3));
    assert_eq!(rows[0]["FT%"], json!(75.0));
    // The stored row keeps the raw fraction
    let stored = store.load_player_season_stats(SEASON).await.unwrap();
    assert_eq!(stored[0].stats.fg_percent, 0.472);

    let career = store
        .player_career_stats_display(SEASON, 7, SeasonType::Regular)
        .await
        .unwrap();
    assert_eq!(career[0]["FG%"], json!(47.7));
    assert_eq!(career[0]["GP"], json!(694));

    let team_rows = store
        .team_season_stats_display(SEASON, 1, SeasonType::Regular)
        .await
        .unwrap();
    assert_eq!(team_rows[0]["FG%"], json!(46.5));
    assert_eq!(team_rows[0]["W_PCT"], json!(0.598));
}

#[tokio::test]
async fn test_reader_game_detail_and_game_logs() {
    let store = DomainStore::connect(":memory:").await.unwrap();
    SnapshotWriter::new(&store)
        .write(&sample_snapshot())
        .await
        .unwrap();

    let detail = store
        .game_detail(SEASON, "0021800050")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail["WINNER"], json!(2));
    assert_eq!(detail["OVERTIME"], json!(1));
    assert_eq!(detail["BROADCASTER"], json!("TNT"));
    assert_eq!(detail["INACTIVE_PLAYERS"], json!([7]));
    assert_eq!(detail["DNP_PLAYERS"]["8"], json!("DND - Rest"));

    let logs = store.player_game_logs_display(SEASON, 9).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["+/-"], json!(5));
    assert_eq!(logs[0]["WL"], json!("W"));
    assert_eq!(logs[0]["PTS"], json!(45));

    // Unknown entities read as not found, never as errors
    assert!(store.game_detail(SEASON, "0029999999").await.unwrap().is_none());
    assert!(store
        .player_detail(SEASON, 424242, NaiveDate::from_ymd_opt(2019, 6, 1).unwrap())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_standings_display_excludes_sentinel_and_seeds() {
    let store = DomainStore::connect(":memory:").await.unwrap();
    SnapshotWriter::new(&store)
        .write(&sample_snapshot())
        .await
        .unwrap();

    let standings = store.standings_display(SEASON).await.unwrap();
    let east = standings["East"].as_array().unwrap();
    let west = standings["West"].as_array().unwrap();

    assert_eq!(east.len(), 1);
    assert_eq!(west.len(), 1);
    assert_eq!(east[0]["TEAM_ID"], json!(1));
    assert_eq!(west[0]["SEED"], json!(1));
    // The sentinel team never appears on either side
    for side in [east, west] {
        assert!(side.iter().all(|row| row["TEAM_ID"] != json!(0)));
    }
}
