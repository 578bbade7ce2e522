use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::info;

use crate::domain::SeasonSnapshot;
use crate::error::AppError;

/// One bulk-load record: entity kind, primary key, and field mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureRecord {
    pub model: String,
    pub pk: Value,
    pub fields: Map<String, Value>,
}

fn to_fields<T: Serialize>(entity: &T, drop_key: Option<&str>) -> Map<String, Value> {
    let mut fields = match serde_json::to_value(entity) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    if let Some(key) = drop_key {
        fields.remove(key);
    }
    fields
}

fn natural_records<T: Serialize>(
    model: &str,
    entities: &[T],
    pk_of: impl Fn(&T) -> Value,
    pk_key: &str,
) -> Vec<FixtureRecord> {
    entities
        .iter()
        .map(|entity| FixtureRecord {
            model: model.to_string(),
            pk: pk_of(entity),
            fields: to_fields(entity, Some(pk_key)),
        })
        .collect()
}

fn indexed_records<T: Serialize>(model: &str, entities: &[T]) -> Vec<FixtureRecord> {
    entities
        .iter()
        .enumerate()
        .map(|(index, entity)| FixtureRecord {
            model: model.to_string(),
            pk: json!(index as i64 + 1),
            fields: to_fields(entity, None),
        })
        .collect()
}

/// Serializes a snapshot into fixture records, one list per entity kind in
/// foreign-key dependency order. Entities with upstream-assigned ids keep
/// them as primary keys; log and aggregate rows get their assembly-order
/// index, which is deterministic for a given normalized batch.
pub fn fixtures(snapshot: &SeasonSnapshot) -> Vec<(&'static str, Vec<FixtureRecord>)> {
    vec![
        (
            "team",
            natural_records("team", &snapshot.teams, |t| json!(t.team_id), "team_id"),
        ),
        (
            "player",
            natural_records(
                "player",
                &snapshot.players,
                |p| json!(p.player_id),
                "player_id",
            ),
        ),
        (
            "game",
            natural_records("game", &snapshot.games, |g| json!(g.game_id), "game_id"),
        ),
        ("standing", indexed_records("standing", &snapshot.standings)),
        (
            "team_game_log",
            indexed_records("team_game_log", &snapshot.team_game_logs),
        ),
        (
            "player_game_log",
            indexed_records("player_game_log", &snapshot.player_game_logs),
        ),
        (
            "team_season_stats",
            indexed_records("team_season_stats", &snapshot.team_season_stats),
        ),
        (
            "player_season_stats",
            indexed_records("player_season_stats", &snapshot.player_season_stats),
        ),
        (
            "player_career_stats",
            indexed_records("player_career_stats", &snapshot.player_career_stats),
        ),
    ]
}

/// Writes one fixture file per entity kind into `dir`.
pub async fn write_fixture_dir(snapshot: &SeasonSnapshot, dir: &Path) -> Result<(), AppError> {
    tokio::fs::create_dir_all(dir).await?;
    for (kind, records) in fixtures(snapshot) {
        let path = dir.join(format!("{kind}.json"));
        let content = serde_json::to_string(&records)?;
        tokio::fs::write(&path, content).await?;
        info!("Wrote {} {} fixture records to {}", records.len(), kind, path.display());
    }
    Ok(())
}

fn entity_from_record<T: serde::de::DeserializeOwned>(
    mut record: FixtureRecord,
    pk_key: Option<&str>,
) -> Result<T, AppError> {
    if let Some(key) = pk_key {
        record.fields.insert(key.to_string(), record.pk);
    }
    serde_json::from_value(Value::Object(record.fields)).map_err(AppError::ApiParse)
}

async fn read_records(dir: &Path, kind: &str) -> Result<Vec<FixtureRecord>, AppError> {
    let path = dir.join(format!("{kind}.json"));
    let content = tokio::fs::read_to_string(&path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Reads a fixture directory back into a season snapshot for bulk load.
pub async fn load_fixture_dir(dir: &Path, season: &str) -> Result<SeasonSnapshot, AppError> {
    let mut snapshot = SeasonSnapshot {
        season: season.to_string(),
        ..Default::default()
    };

    for record in read_records(dir, "team").await? {
        snapshot.teams.push(entity_from_record(record, Some("team_id"))?);
    }
    for record in read_records(dir, "player").await? {
        snapshot
            .players
            .push(entity_from_record(record, Some("player_id"))?);
    }
    for record in read_records(dir, "game").await? {
        snapshot.games.push(entity_from_record(record, Some("game_id"))?);
    }
    for record in read_records(dir, "standing").await? {
        snapshot.standings.push(entity_from_record(record, None)?);
    }
    for record in read_records(dir, "team_game_log").await? {
        snapshot
            .team_game_logs
            .push(entity_from_record(record, None)?);
    }
    for record in read_records(dir, "player_game_log").await? {
        snapshot
            .player_game_logs
            .push(entity_from_record(record, None)?);
    }
    for record in read_records(dir, "team_season_stats").await? {
        snapshot
            .team_season_stats
            .push(entity_from_record(record, None)?);
    }
    for record in read_records(dir, "player_season_stats").await? {
        snapshot
            .player_season_stats
            .push(entity_from_record(record, None)?);
    }
    for record in read_records(dir, "player_career_stats").await? {
        snapshot
            .player_career_stats
            .push(entity_from_record(record, None)?);
    }

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Standing, Team};

    fn snapshot_with_team_and_standing() -> SeasonSnapshot {
        let mut snapshot = SeasonSnapshot {
            season: "2018-19".to_string(),
            ..Default::default()
        };
        snapshot.teams.push(Team {
            team_id: 3,
            team_abb: "BOS".to_string(),
            team_conf: Some(crate::domain::Conference::East),
            team_div: "Atlantic".to_string(),
            team_city: "Boston".to_string(),
            team_name: "Celtics".to_string(),
            wins: 49,
            losses: 33,
            nba_debut: "1946".to_string(),
            max_year: "2019".to_string(),
        });
        snapshot.teams.push(Team::sentinel());
        snapshot.standings.push(Standing {
            team: 3,
            wins: 49,
            losses: 33,
            home_record: "28-13".to_string(),
            away_record: "21-20".to_string(),
            win_percent: 0.598,
        });
        snapshot
    }

    #[test]
    fn test_fixture_records_have_model_pk_fields() {
        let snapshot = snapshot_with_team_and_standing();
        let all = fixtures(&snapshot);

        let (_, teams) = all.iter().find(|(kind, _)| *kind == "team").unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].model, "team");
        assert_eq!(teams[0].pk, json!(3));
        // pk never duplicated into the field mapping
        assert!(!teams[0].fields.contains_key("team_id"));
        assert_eq!(teams[0].fields["team_abb"], json!("BOS"));

        let (_, standings) = all.iter().find(|(kind, _)| *kind == "standing").unwrap();
        assert_eq!(standings[0].pk, json!(1));
        assert_eq!(standings[0].fields["team"], json!(3));
    }

    #[test]
    fn test_fixture_kind_order_is_topological() {
        let snapshot = snapshot_with_team_and_standing();
        let kinds: Vec<&str> = fixtures(&snapshot).iter().map(|(kind, _)| *kind).collect();
        let team_pos = kinds.iter().position(|k| *k == "team").unwrap();
        let player_pos = kinds.iter().position(|k| *k == "player").unwrap();
        let game_pos = kinds.iter().position(|k| *k == "game").unwrap();
        let tgl_pos = kinds.iter().position(|k| *k == "team_game_log").unwrap();
        let pgl_pos = kinds.iter().position(|k| *k == "player_game_log").unwrap();

        assert!(team_pos < player_pos);
        assert!(player_pos < game_pos);
        assert!(game_pos < tgl_pos);
        assert!(tgl_pos < pgl_pos);
    }

    #[tokio::test]
    async fn test_fixture_dir_round_trip() {
        let snapshot = snapshot_with_team_and_standing();
        let dir = tempfile::tempdir().unwrap();

        // Round-trip needs every kind's file, including the empty ones
        write_fixture_dir(&snapshot, dir.path()).await.unwrap();
        let loaded = load_fixture_dir(dir.path(), "2018-19").await.unwrap();

        assert_eq!(loaded.season, "2018-19");
        assert_eq!(loaded.teams.len(), 2);
        assert_eq!(loaded.teams[0].team_id, 3);
        assert_eq!(loaded.teams[0].team_abb, "BOS");
        assert!(loaded.teams[1].is_sentinel());
        assert_eq!(loaded.standings.len(), 1);
        assert_eq!(loaded.standings[0].win_percent, 0.598);
        assert!(loaded.games.is_empty());
    }
}
