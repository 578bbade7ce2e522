use serde_json::{Map, Value, json};

use super::kind::{NormalizeMode, TableKind};
use crate::constants::display::{UNKNOWN_SCHOOL, ZERO_MINUTES};
use crate::error::AppError;
use crate::upstream::RawTable;

/// One normalized record: internal (or display) field names to coerced values.
pub type Row = Map<String, Value>;

/// Converts a stored fraction to the 0-100 display scale with one decimal.
/// This conversion happens exactly once, at the display boundary.
pub fn display_percent(fraction: f64) -> f64 {
    (fraction * 1000.0).round() / 10.0
}

/// Per-column coercion applied while projecting a raw table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coerce {
    /// Strict integer; a null cell is a schema violation. Used for ids.
    Int,
    /// Lenient integer; null or blank becomes 0 (jersey numbers, counters).
    IntOrZero,
    /// Float; null becomes 0.0 so downstream arithmetic stays total-safe.
    Float,
    /// Fraction in storage mode, 0-100 one-decimal scale in display mode.
    Percent,
    /// Strict text; numbers are stringified, null is a schema violation.
    Text,
    /// Text with null coerced to the empty string.
    TextOrEmpty,
    /// Text with null/blank coerced to "N/A".
    TextOrNa,
    /// Calendar date prefix of an upstream timestamp (first 10 chars).
    DateText,
    /// Playing time as "MM:SS" text; null becomes "00:00".
    MinutesText,
}

impl Coerce {
    fn apply(&self, cell: &Value, mode: NormalizeMode) -> Result<Value, String> {
        match self {
            Coerce::Int => match cell_as_i64(cell) {
                Some(n) => Ok(json!(n)),
                None => Err("cell is not an integer".to_string()),
            },
            Coerce::IntOrZero => {
                if is_null_cell(cell) {
                    Ok(json!(0))
                } else {
                    cell_as_i64(cell)
                        .map(|n| json!(n))
                        .ok_or_else(|| "cell is not an integer".to_string())
                }
            }
            Coerce::Float => Ok(json!(cell_as_f64(cell).unwrap_or(0.0))),
            Coerce::Percent => {
                let fraction = cell_as_f64(cell).unwrap_or(0.0);
                match mode {
                    NormalizeMode::Storage => Ok(json!(fraction)),
                    NormalizeMode::Display => Ok(json!(display_percent(fraction))),
                }
            }
            Coerce::Text => match cell {
                Value::String(s) => Ok(json!(s)),
                Value::Number(n) => Ok(json!(n.to_string())),
                _ => Err("cell is not text".to_string()),
            },
            Coerce::TextOrEmpty => match cell {
                Value::Null => Ok(json!("")),
                Value::String(s) => Ok(json!(s)),
                Value::Number(n) => Ok(json!(n.to_string())),
                _ => Err("cell is not text".to_string()),
            },
            Coerce::TextOrNa => match cell {
                Value::Null => Ok(json!(UNKNOWN_SCHOOL)),
                Value::String(s) if s.trim().is_empty() => Ok(json!(UNKNOWN_SCHOOL)),
                Value::String(s) => Ok(json!(s)),
                _ => Err("cell is not text".to_string()),
            },
            Coerce::DateText => match cell {
                Value::String(s) => s
                    .get(..10)
                    .map(|date| json!(date))
                    .ok_or_else(|| "cell is not a date string".to_string()),
                _ => Err("cell is not a date string".to_string()),
            },
            Coerce::MinutesText => match cell {
                Value::Null => Ok(json!(ZERO_MINUTES)),
                Value::String(s) if s.is_empty() => Ok(json!(ZERO_MINUTES)),
                Value::String(s) => Ok(json!(s)),
                Value::Number(n) => Ok(json!(n.to_string())),
                _ => Err("cell is not playing time".to_string()),
            },
        }
    }

    /// Value written when a did-not-play row is zero-filled.
    fn zero_value(&self) -> Value {
        match self {
            Coerce::Int | Coerce::IntOrZero => json!(0),
            Coerce::Float | Coerce::Percent => json!(0.0),
            Coerce::MinutesText => json!(ZERO_MINUTES),
            Coerce::TextOrNa => json!(UNKNOWN_SCHOOL),
            Coerce::Text | Coerce::TextOrEmpty | Coerce::DateText => json!(""),
        }
    }
}

fn is_null_cell(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn cell_as_i64(cell: &Value) -> Option<i64> {
    match cell {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn cell_as_f64(cell: &Value) -> Option<f64> {
    match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// One retained column: upstream header, internal and display names, coercion.
#[derive(Debug, Clone)]
struct ColumnRule {
    source: &'static str,
    storage: &'static str,
    display: &'static str,
    coerce: Coerce,
    identity: bool,
}

impl ColumnRule {
    fn name(&self, mode: NormalizeMode) -> &'static str {
        match mode {
            NormalizeMode::Storage => self.storage,
            NormalizeMode::Display => self.display,
        }
    }
}

fn col(source: &'static str, storage: &'static str, coerce: Coerce) -> ColumnRule {
    ColumnRule {
        source,
        storage,
        display: source,
        coerce,
        identity: false,
    }
}

fn id_col(source: &'static str, storage: &'static str, coerce: Coerce) -> ColumnRule {
    ColumnRule {
        identity: true,
        ..col(source, storage, coerce)
    }
}

fn pct_col(source: &'static str, storage: &'static str, display: &'static str) -> ColumnRule {
    ColumnRule {
        display,
        ..col(source, storage, Coerce::Percent)
    }
}

/// Projection rule for one table kind (and, where the upstream response
/// carries several named result sets, one section of it).
struct Projection {
    zero_fill_on_null_minutes: bool,
    columns: Vec<ColumnRule>,
}

/// The shared counting-stat column block of game logs and aggregate tables.
fn counting_stat_columns() -> Vec<ColumnRule> {
    vec![
        col("FGM", "fg_made", Coerce::IntOrZero),
        col("FGA", "fg_attempt", Coerce::IntOrZero),
        pct_col("FG_PCT", "fg_percent", "FG%"),
        col("FG3M", "fg3_made", Coerce::IntOrZero),
        col("FG3A", "fg3_attempt", Coerce::IntOrZero),
        pct_col("FG3_PCT", "fg3_percent", "FG3%"),
        col("FTM", "ft_made", Coerce::IntOrZero),
        col("FTA", "ft_attempt", Coerce::IntOrZero),
        pct_col("FT_PCT", "ft_percent", "FT%"),
        col("OREB", "offense_reb", Coerce::IntOrZero),
        col("DREB", "defense_reb", Coerce::IntOrZero),
        col("REB", "rebounds", Coerce::IntOrZero),
        col("AST", "assists", Coerce::IntOrZero),
        col("STL", "steals", Coerce::IntOrZero),
        col("BLK", "blocks", Coerce::IntOrZero),
        col("TOV", "turnovers", Coerce::IntOrZero),
        col("PF", "fouls", Coerce::IntOrZero),
        col("PTS", "points", Coerce::IntOrZero),
    ]
}

fn team_list_projection() -> Projection {
    Projection {
        zero_fill_on_null_minutes: false,
        columns: vec![
            id_col("TEAM_ID", "team_id", Coerce::Int),
            col("TEAM_ABBREVIATION", "team_abb", Coerce::Text),
            col("TEAM_CONFERENCE", "team_conf", Coerce::Text),
            col("TEAM_DIVISION", "team_div", Coerce::Text),
            col("TEAM_CITY", "team_city", Coerce::Text),
            col("TEAM_NAME", "team_name", Coerce::Text),
            col("W", "wins", Coerce::IntOrZero),
            col("L", "losses", Coerce::IntOrZero),
            col("MIN_YEAR", "nba_debut", Coerce::Text),
            col("MAX_YEAR", "max_year", Coerce::Text),
        ],
    }
}

fn player_list_projection() -> Projection {
    Projection {
        zero_fill_on_null_minutes: false,
        columns: vec![
            id_col("PERSON_ID", "player_id", Coerce::Int),
            id_col("TEAM_ID", "team", Coerce::Int),
            col("FIRST_NAME", "first_name", Coerce::Text),
            col("LAST_NAME", "last_name", Coerce::Text),
            col("BIRTHDATE", "birth_date", Coerce::DateText),
            col("DRAFT_YEAR", "draft_year", Coerce::TextOrEmpty),
            col("DRAFT_ROUND", "draft_round", Coerce::TextOrEmpty),
            col("DRAFT_NUMBER", "draft_number", Coerce::TextOrEmpty),
            col("POSITION", "position", Coerce::TextOrEmpty),
            col("JERSEY", "jersey", Coerce::IntOrZero),
            col("HEIGHT", "height", Coerce::TextOrEmpty),
            col("WEIGHT", "weight", Coerce::IntOrZero),
            col("SCHOOL", "school", Coerce::TextOrNa),
            col("COUNTRY", "country", Coerce::TextOrEmpty),
            col("SEASON_EXP", "season_exp", Coerce::IntOrZero),
        ],
    }
}

fn standings_projection() -> Projection {
    Projection {
        zero_fill_on_null_minutes: false,
        columns: vec![
            id_col("TEAM_ID", "team", Coerce::Int),
            col("CONFERENCE", "conference", Coerce::Text),
            col("W", "wins", Coerce::IntOrZero),
            col("L", "losses", Coerce::IntOrZero),
            col("HOME_RECORD", "home_record", Coerce::Text),
            col("ROAD_RECORD", "away_record", Coerce::Text),
            col("W_PCT", "win_percent", Coerce::Float),
        ],
    }
}

fn game_summary_projection() -> Projection {
    Projection {
        zero_fill_on_null_minutes: false,
        columns: vec![
            id_col("GAME_ID", "game_id", Coerce::Text),
            col("GAME_DATE_EST", "game_date", Coerce::DateText),
            col("HOME_TEAM_ID", "home_team", Coerce::Int),
            col("VISITOR_TEAM_ID", "away_team", Coerce::Int),
            col(
                "NATL_TV_BROADCASTER_ABBREVIATION",
                "broadcaster",
                Coerce::TextOrEmpty,
            ),
        ],
    }
}

fn line_score_projection() -> Projection {
    Projection {
        zero_fill_on_null_minutes: false,
        columns: vec![
            id_col("GAME_ID", "game", Coerce::Text),
            id_col("TEAM_ID", "team", Coerce::Int),
            col("PTS_QTR1", "pts_q1", Coerce::IntOrZero),
            col("PTS_QTR2", "pts_q2", Coerce::IntOrZero),
            col("PTS_QTR3", "pts_q3", Coerce::IntOrZero),
            col("PTS_QTR4", "pts_q4", Coerce::IntOrZero),
            col("PTS_OT1", "pts_ot1", Coerce::IntOrZero),
            col("PTS_OT2", "pts_ot2", Coerce::IntOrZero),
            col("PTS_OT3", "pts_ot3", Coerce::IntOrZero),
            col("PTS_OT4", "pts_ot4", Coerce::IntOrZero),
            col("PTS_OT5", "pts_ot5", Coerce::IntOrZero),
            col("PTS_OT6", "pts_ot6", Coerce::IntOrZero),
            col("PTS_OT7", "pts_ot7", Coerce::IntOrZero),
            col("PTS_OT8", "pts_ot8", Coerce::IntOrZero),
            col("PTS_OT9", "pts_ot9", Coerce::IntOrZero),
            col("PTS_OT10", "pts_ot10", Coerce::IntOrZero),
            col("PTS", "points", Coerce::IntOrZero),
        ],
    }
}

fn inactive_players_projection() -> Projection {
    Projection {
        zero_fill_on_null_minutes: false,
        columns: vec![
            id_col("PLAYER_ID", "player_id", Coerce::Int),
            id_col("TEAM_ID", "team", Coerce::Int),
        ],
    }
}

fn box_score_traditional_projection() -> Projection {
    let mut columns = vec![
        id_col("GAME_ID", "game", Coerce::Text),
        id_col("TEAM_ID", "team", Coerce::Int),
        id_col("PLAYER_ID", "player_id", Coerce::Int),
        id_col("PLAYER_NAME", "player_name", Coerce::Text),
        id_col("START_POSITION", "start_position", Coerce::TextOrEmpty),
        id_col("COMMENT", "comment", Coerce::TextOrEmpty),
        col("MIN", "minutes", Coerce::MinutesText),
    ];
    columns.extend(counting_stat_columns());
    columns.push(ColumnRule {
        display: "+/-",
        ..col("PLUS_MINUS", "plus_minus", Coerce::IntOrZero)
    });
    Projection {
        zero_fill_on_null_minutes: true,
        columns,
    }
}

fn team_game_log_projection() -> Projection {
    // This endpoint family capitalizes its id headers differently from every
    // other table; the quirk is upstream's, not ours.
    let mut columns = vec![
        id_col("Game_ID", "game", Coerce::Text),
        id_col("Team_ID", "team", Coerce::Int),
        id_col("MATCHUP", "matchup", Coerce::Text),
        id_col("WL", "result", Coerce::Text),
        col("W", "curr_wins", Coerce::IntOrZero),
        col("L", "curr_losses", Coerce::IntOrZero),
        col("MIN", "minutes", Coerce::Float),
    ];
    columns.extend(counting_stat_columns());
    Projection {
        zero_fill_on_null_minutes: false,
        columns,
    }
}

fn player_game_log_projection() -> Projection {
    let mut columns = vec![
        id_col("GAME_ID", "game", Coerce::Text),
        id_col("PLAYER_ID", "player", Coerce::Int),
        id_col("TEAM_ID", "curr_team", Coerce::Int),
        id_col("MATCHUP", "matchup", Coerce::Text),
        id_col("WL", "result", Coerce::Text),
        col("MIN", "minutes", Coerce::Float),
    ];
    columns.extend(counting_stat_columns());
    columns.push(ColumnRule {
        display: "+/-",
        ..col("PLUS_MINUS", "plus_minus", Coerce::IntOrZero)
    });
    Projection {
        zero_fill_on_null_minutes: true,
        columns,
    }
}

fn player_season_stats_projection() -> Projection {
    let mut columns = vec![
        id_col("PLAYER_ID", "player", Coerce::Int),
        id_col("TEAM_ID", "curr_team", Coerce::Int),
        col("SEASON_ID", "season", Coerce::Text),
        col("GP", "games_played", Coerce::IntOrZero),
        col("GS", "games_started", Coerce::IntOrZero),
        col("MIN", "minutes", Coerce::Float),
    ];
    columns.extend(counting_stat_columns());
    Projection {
        zero_fill_on_null_minutes: false,
        columns,
    }
}

fn team_season_stats_projection() -> Projection {
    let mut columns = vec![
        id_col("TEAM_ID", "team", Coerce::Int),
        col("W", "wins", Coerce::IntOrZero),
        col("L", "losses", Coerce::IntOrZero),
        col("W_PCT", "win_percent", Coerce::Float),
        col("MIN", "minutes", Coerce::Float),
    ];
    columns.extend(counting_stat_columns());
    Projection {
        zero_fill_on_null_minutes: false,
        columns,
    }
}

fn career_stats_projection() -> Projection {
    let mut columns = vec![
        id_col("PLAYER_ID", "player", Coerce::Int),
        col("GP", "games_played", Coerce::IntOrZero),
        col("GS", "games_started", Coerce::IntOrZero),
        col("MIN", "minutes", Coerce::Float),
    ];
    columns.extend(counting_stat_columns());
    Projection {
        zero_fill_on_null_minutes: false,
        columns,
    }
}

/// Looks up the projection rule for a kind, keyed additionally by the
/// upstream result-set name where one kind spans several sections.
fn projection_for(kind: TableKind, section: &str) -> Result<Projection, AppError> {
    match kind {
        TableKind::TeamList => Ok(team_list_projection()),
        TableKind::PlayerList => Ok(player_list_projection()),
        TableKind::Standings => Ok(standings_projection()),
        TableKind::BoxScoreSummary => match section {
            "GameSummary" => Ok(game_summary_projection()),
            "LineScore" => Ok(line_score_projection()),
            "InactivePlayers" => Ok(inactive_players_projection()),
            other => Err(AppError::schema_violation(
                kind.as_str(),
                format!("unknown result set {other}"),
            )),
        },
        TableKind::BoxScoreTraditional => Ok(box_score_traditional_projection()),
        TableKind::TeamGameLog => Ok(team_game_log_projection()),
        TableKind::PlayerGameLog => Ok(player_game_log_projection()),
        TableKind::SeasonStats => match section {
            "SeasonTotalsRegularSeason" | "SeasonTotalsPostSeason" => {
                Ok(player_season_stats_projection())
            }
            "LeagueDashTeamStats" => Ok(team_season_stats_projection()),
            other => Err(AppError::schema_violation(
                kind.as_str(),
                format!("unknown result set {other}"),
            )),
        },
        TableKind::CareerStats => match section {
            "CareerTotalsRegularSeason" | "CareerTotalsPostSeason" => Ok(career_stats_projection()),
            other => Err(AppError::schema_violation(
                kind.as_str(),
                format!("unknown result set {other}"),
            )),
        },
    }
}

/// Projects one raw table through its kind's rule.
///
/// Column presence is validated before any row is touched: a missing
/// required column aborts the batch for this kind rather than silently
/// omitting the field. Did-not-play rows (null minutes) in box-score and
/// player-game-log tables normalize to all-zero counting stats with
/// identity fields preserved.
pub fn normalize(
    kind: TableKind,
    raw: &RawTable,
    mode: NormalizeMode,
) -> Result<Vec<Row>, AppError> {
    let projection = projection_for(kind, &raw.name)?;

    let mut indices = Vec::with_capacity(projection.columns.len());
    for rule in &projection.columns {
        let idx = raw.column_index(rule.source).ok_or_else(|| {
            AppError::schema_violation(
                kind.as_str(),
                format!("missing required column {}", rule.source),
            )
        })?;
        indices.push(idx);
    }

    let minutes_index = raw.column_index("MIN");

    let mut rows = Vec::with_capacity(raw.rows.len());
    for (row_idx, raw_row) in raw.rows.iter().enumerate() {
        let zero_fill = projection.zero_fill_on_null_minutes
            && minutes_index
                .and_then(|i| raw_row.get(i))
                .is_none_or(is_null_cell);

        let mut row = Row::new();
        for (rule, &idx) in projection.columns.iter().zip(&indices) {
            let cell = raw_row.get(idx).unwrap_or(&Value::Null);
            let value = if zero_fill && !rule.identity {
                rule.coerce.zero_value()
            } else {
                rule.coerce.apply(cell, mode).map_err(|msg| {
                    AppError::schema_violation(
                        kind.as_str(),
                        format!("column {} row {row_idx}: {msg}", rule.source),
                    )
                })?
            };
            row.insert(rule.name(mode).to_string(), value);
        }
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_stats_table(rows: Vec<Vec<Value>>) -> RawTable {
        RawTable {
            name: "PlayerStats".to_string(),
            headers: [
                "GAME_ID",
                "TEAM_ID",
                "TEAM_ABBREVIATION",
                "PLAYER_ID",
                "PLAYER_NAME",
                "START_POSITION",
                "COMMENT",
                "MIN",
                "FGM",
                "FGA",
                "FG_PCT",
                "FG3M",
                "FG3A",
                "FG3_PCT",
                "FTM",
                "FTA",
                "FT_PCT",
                "OREB",
                "DREB",
                "REB",
                "AST",
                "STL",
                "BLK",
                "TOV",
                "PF",
                "PTS",
                "PLUS_MINUS",
            ]
            .iter()
            .map(|h| h.to_string())
            .collect(),
            rows,
        }
    }

    fn played_row() -> Vec<Value> {
        vec![
            json!("0021800001"),
            json!(3),
            json!("BOS"),
            json!(12),
            json!("Al Smith"),
            json!("F"),
            json!(""),
            json!("34:12"),
            json!(9),
            json!(17),
            json!(0.529),
            json!(2),
            json!(5),
            json!(0.4),
            json!(5),
            json!(6),
            json!(0.833),
            json!(1),
            json!(7),
            json!(8),
            json!(4),
            json!(1),
            json!(0),
            json!(2),
            json!(3),
            json!(25),
            json!(7),
        ]
    }

    fn dnp_row() -> Vec<Value> {
        vec![
            json!("0021800001"),
            json!(3),
            json!("BOS"),
            json!(7),
            json!("Bo Jones"),
            json!(""),
            json!("DND - Rest"),
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
        ]
    }

    #[test]
    fn test_dnp_row_zero_fills_counting_stats() {
        let table = player_stats_table(vec![dnp_row()]);
        let rows =
            normalize(TableKind::BoxScoreTraditional, &table, NormalizeMode::Storage).unwrap();

        let row = &rows[0];
        assert_eq!(row["player_id"], json!(7));
        assert_eq!(row["team"], json!(3));
        assert_eq!(row["comment"], json!("DND - Rest"));
        assert_eq!(row["minutes"], json!("00:00"));
        assert_eq!(row["points"], json!(0));
        assert_eq!(row["rebounds"], json!(0));
        assert_eq!(row["fg_percent"], json!(0.0));
        assert_eq!(row["plus_minus"], json!(0));
    }

    #[test]
    fn test_played_row_keeps_values_and_prunes_columns() {
        let table = player_stats_table(vec![played_row()]);
        let rows =
            normalize(TableKind::BoxScoreTraditional, &table, NormalizeMode::Storage).unwrap();

        let row = &rows[0];
        assert_eq!(row["minutes"], json!("34:12"));
        assert_eq!(row["points"], json!(25));
        assert_eq!(row["fg_percent"], json!(0.529));
        // TEAM_ABBREVIATION is not on the allow-list
        assert!(!row.contains_key("TEAM_ABBREVIATION"));
        assert!(!row.contains_key("team_abbreviation"));
    }

    #[test]
    fn test_display_mode_renames_and_scales() {
        let table = player_stats_table(vec![played_row()]);
        let rows =
            normalize(TableKind::BoxScoreTraditional, &table, NormalizeMode::Display).unwrap();

        let row = &rows[0];
        assert_eq!(row["FG%"], json!(52.9));
        assert_eq!(row["FG3%"], json!(40.0));
        assert_eq!(row["FT%"], json!(83.3));
        assert_eq!(row["+/-"], json!(7));
        assert_eq!(row["PTS"], json!(25));
        // Display mode keeps upstream names for everything else
        assert!(!row.contains_key("fg_percent"));
        assert!(!row.contains_key("plus_minus"));
    }

    #[test]
    fn test_storage_mode_never_renames_to_display_names() {
        let table = player_stats_table(vec![played_row()]);
        let rows =
            normalize(TableKind::BoxScoreTraditional, &table, NormalizeMode::Storage).unwrap();

        let row = &rows[0];
        assert!(!row.contains_key("+/-"));
        assert!(!row.contains_key("FG%"));
        assert_eq!(row["plus_minus"], json!(7));
    }

    #[test]
    fn test_display_percent_bounds_and_rounding() {
        for fraction in [0.0, 0.001, 0.25, 0.4285, 0.529, 0.8333, 1.0] {
            let shown = display_percent(fraction);
            assert!((0.0..=100.0).contains(&shown), "{shown} out of range");
            assert_eq!(shown, (fraction * 1000.0).round() / 10.0);
        }
        assert_eq!(display_percent(0.529), 52.9);
        assert_eq!(display_percent(0.8333), 83.3);
    }

    #[test]
    fn test_missing_required_column_is_schema_violation() {
        let mut table = player_stats_table(vec![played_row()]);
        let idx = table.column_index("PTS").unwrap();
        table.headers.remove(idx);
        for row in &mut table.rows {
            row.remove(idx);
        }

        let err = normalize(TableKind::BoxScoreTraditional, &table, NormalizeMode::Storage)
            .unwrap_err();
        match err {
            AppError::SchemaViolation { table_kind, message } => {
                assert_eq!(table_kind, "box_score_traditional");
                assert!(message.contains("PTS"));
            }
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_box_score_section_is_schema_violation() {
        let table = RawTable {
            name: "OtherStats".to_string(),
            headers: vec!["X".to_string()],
            rows: vec![],
        };
        let err =
            normalize(TableKind::BoxScoreSummary, &table, NormalizeMode::Storage).unwrap_err();
        assert!(matches!(err, AppError::SchemaViolation { .. }));
    }

    #[test]
    fn test_player_list_blank_jersey_and_school() {
        let table = RawTable {
            name: "CommonPlayerInfo".to_string(),
            headers: [
                "PERSON_ID",
                "TEAM_ID",
                "FIRST_NAME",
                "LAST_NAME",
                "BIRTHDATE",
                "DRAFT_YEAR",
                "DRAFT_ROUND",
                "DRAFT_NUMBER",
                "POSITION",
                "JERSEY",
                "HEIGHT",
                "WEIGHT",
                "SCHOOL",
                "COUNTRY",
                "SEASON_EXP",
            ]
            .iter()
            .map(|h| h.to_string())
            .collect(),
            rows: vec![vec![
                json!(7),
                json!(3),
                json!("Bo"),
                json!("Jones"),
                json!("1993-03-16T00:00:00"),
                json!("2014"),
                json!("1"),
                json!("12"),
                json!("Guard"),
                json!(""),
                json!("6-4"),
                json!(205),
                json!(" "),
                json!("USA"),
                json!(5),
            ]],
        };

        let rows = normalize(TableKind::PlayerList, &table, NormalizeMode::Storage).unwrap();
        let row = &rows[0];
        assert_eq!(row["jersey"], json!(0));
        assert_eq!(row["school"], json!("N/A"));
        assert_eq!(row["birth_date"], json!("1993-03-16"));
    }

    #[test]
    fn test_line_score_keeps_all_overtime_columns() {
        let mut headers = vec![
            "GAME_ID".to_string(),
            "TEAM_ID".to_string(),
            "PTS_QTR1".to_string(),
            "PTS_QTR2".to_string(),
            "PTS_QTR3".to_string(),
            "PTS_QTR4".to_string(),
        ];
        for i in 1..=10 {
            headers.push(format!("PTS_OT{i}"));
        }
        headers.push("PTS".to_string());

        let mut row = vec![json!("0021800001"), json!(3)];
        row.extend([json!(30), json!(25), json!(20), json!(25)]);
        row.push(json!(5));
        for _ in 2..=10 {
            row.push(json!(0));
        }
        row.push(json!(105));

        let table = RawTable {
            name: "LineScore".to_string(),
            headers,
            rows: vec![row],
        };

        let rows = normalize(TableKind::BoxScoreSummary, &table, NormalizeMode::Storage).unwrap();
        let row = &rows[0];
        assert_eq!(row["pts_ot1"], json!(5));
        assert_eq!(row["pts_ot10"], json!(0));
        assert_eq!(row["points"], json!(105));
    }

    #[test]
    fn test_null_identity_id_is_schema_violation() {
        let table = RawTable {
            name: "InactivePlayers".to_string(),
            headers: vec!["PLAYER_ID".to_string(), "TEAM_ID".to_string()],
            rows: vec![vec![Value::Null, json!(3)]],
        };
        let err =
            normalize(TableKind::BoxScoreSummary, &table, NormalizeMode::Storage).unwrap_err();
        assert!(matches!(err, AppError::SchemaViolation { .. }));
    }

    #[test]
    fn test_team_game_log_uses_upstream_header_quirk() {
        let mut headers = vec![
            "Team_ID".to_string(),
            "Game_ID".to_string(),
            "GAME_DATE".to_string(),
            "MATCHUP".to_string(),
            "WL".to_string(),
            "W".to_string(),
            "L".to_string(),
            "W_PCT".to_string(),
            "MIN".to_string(),
        ];
        for h in [
            "FGM", "FGA", "FG_PCT", "FG3M", "FG3A", "FG3_PCT", "FTM", "FTA", "FT_PCT", "OREB",
            "DREB", "REB", "AST", "STL", "BLK", "TOV", "PF", "PTS",
        ] {
            headers.push(h.to_string());
        }

        let mut row = vec![
            json!(3),
            json!("0021800001"),
            json!("OCT 16, 2018"),
            json!("BOS vs. PHI"),
            json!("W"),
            json!(1),
            json!(0),
            json!(1.0),
            json!(240),
        ];
        row.extend([
            json!(42),
            json!(97),
            json!(0.433),
            json!(11),
            json!(37),
            json!(0.297),
            json!(10),
            json!(14),
            json!(0.714),
            json!(12),
            json!(43),
            json!(55),
            json!(21),
            json!(7),
            json!(5),
            json!(14),
            json!(21),
            json!(105),
        ]);

        let table = RawTable {
            name: "TeamGameLog".to_string(),
            headers,
            rows: vec![row],
        };

        let rows = normalize(TableKind::TeamGameLog, &table, NormalizeMode::Storage).unwrap();
        let row = &rows[0];
        assert_eq!(row["team"], json!(3));
        assert_eq!(row["game"], json!("0021800001"));
        assert_eq!(row["result"], json!("W"));
        assert_eq!(row["curr_wins"], json!(1));
        assert_eq!(row["points"], json!(105));
    }
}
