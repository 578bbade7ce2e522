//! Snapshot database schema
//!
//! Every table is scoped by the snapshot season so re-ingesting one season
//! replaces only that season's rows. Primary keys combine the scope with
//! the upstream-assigned identifier; log and aggregate tables additionally
//! carry the deterministic `pk` assigned at assembly order.

/// Shared counting-stat column block.
const COUNTING_STAT_COLUMNS: &str = "
    minutes REAL NOT NULL,
    points INTEGER NOT NULL,
    offense_reb INTEGER NOT NULL,
    defense_reb INTEGER NOT NULL,
    rebounds INTEGER NOT NULL,
    assists INTEGER NOT NULL,
    steals INTEGER NOT NULL,
    blocks INTEGER NOT NULL,
    turnovers INTEGER NOT NULL,
    fouls INTEGER NOT NULL,
    fg_made INTEGER NOT NULL,
    fg_attempt INTEGER NOT NULL,
    fg_percent REAL NOT NULL,
    fg3_made INTEGER NOT NULL,
    fg3_attempt INTEGER NOT NULL,
    fg3_percent REAL NOT NULL,
    ft_made INTEGER NOT NULL,
    ft_attempt INTEGER NOT NULL,
    ft_percent REAL NOT NULL";

/// DDL statements in dependency order.
pub fn create_table_statements() -> Vec<String> {
    vec![
        "CREATE TABLE IF NOT EXISTS teams (
            season TEXT NOT NULL,
            team_id INTEGER NOT NULL,
            team_abb TEXT NOT NULL,
            team_conf TEXT,
            team_div TEXT NOT NULL,
            team_city TEXT NOT NULL,
            team_name TEXT NOT NULL,
            wins INTEGER NOT NULL,
            losses INTEGER NOT NULL,
            nba_debut TEXT NOT NULL,
            max_year TEXT NOT NULL,
            PRIMARY KEY (season, team_id)
        )"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS players (
            season TEXT NOT NULL,
            player_id INTEGER NOT NULL,
            team INTEGER NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            birth_date TEXT NOT NULL,
            draft_year TEXT NOT NULL,
            draft_round TEXT NOT NULL,
            draft_number TEXT NOT NULL,
            position TEXT NOT NULL,
            jersey INTEGER NOT NULL,
            height TEXT NOT NULL,
            weight INTEGER NOT NULL,
            school TEXT NOT NULL,
            country TEXT NOT NULL,
            season_exp INTEGER NOT NULL,
            PRIMARY KEY (season, player_id),
            FOREIGN KEY (season, team) REFERENCES teams (season, team_id)
        )"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS games (
            season TEXT NOT NULL,
            game_id TEXT NOT NULL,
            game_date TEXT NOT NULL,
            home_team INTEGER NOT NULL,
            away_team INTEGER NOT NULL,
            broadcaster TEXT,
            inactive_players TEXT NOT NULL,
            dnp_players TEXT NOT NULL,
            PRIMARY KEY (season, game_id),
            FOREIGN KEY (season, home_team) REFERENCES teams (season, team_id),
            FOREIGN KEY (season, away_team) REFERENCES teams (season, team_id),
            CHECK (home_team <> away_team)
        )"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS standings (
            season TEXT NOT NULL,
            pk INTEGER NOT NULL,
            team INTEGER NOT NULL,
            wins INTEGER NOT NULL,
            losses INTEGER NOT NULL,
            home_record TEXT NOT NULL,
            away_record TEXT NOT NULL,
            win_percent REAL NOT NULL,
            PRIMARY KEY (season, team),
            FOREIGN KEY (season, team) REFERENCES teams (season, team_id)
        )"
        .to_string(),
        format!(
            "CREATE TABLE IF NOT EXISTS team_game_logs (
            season TEXT NOT NULL,
            pk INTEGER NOT NULL,
            game TEXT NOT NULL,
            team INTEGER NOT NULL,
            matchup TEXT NOT NULL,
            result TEXT NOT NULL,
            curr_wins INTEGER NOT NULL,
            curr_losses INTEGER NOT NULL,{COUNTING_STAT_COLUMNS},
            pts_q1 INTEGER NOT NULL,
            pts_q2 INTEGER NOT NULL,
            pts_q3 INTEGER NOT NULL,
            pts_q4 INTEGER NOT NULL,
            pts_ot1 INTEGER NOT NULL,
            pts_ot2 INTEGER NOT NULL,
            pts_ot3 INTEGER NOT NULL,
            pts_ot4 INTEGER NOT NULL,
            pts_ot5 INTEGER NOT NULL,
            pts_ot6 INTEGER NOT NULL,
            pts_ot7 INTEGER NOT NULL,
            pts_ot8 INTEGER NOT NULL,
            pts_ot9 INTEGER NOT NULL,
            pts_ot10 INTEGER NOT NULL,
            PRIMARY KEY (season, game, team),
            FOREIGN KEY (season, game) REFERENCES games (season, game_id),
            FOREIGN KEY (season, team) REFERENCES teams (season, team_id)
        )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS player_game_logs (
            season TEXT NOT NULL,
            pk INTEGER NOT NULL,
            game TEXT NOT NULL,
            player INTEGER NOT NULL,
            curr_team INTEGER NOT NULL,
            matchup TEXT NOT NULL,
            result TEXT NOT NULL,
            \"order\" INTEGER NOT NULL,
            plus_minus INTEGER NOT NULL,{COUNTING_STAT_COLUMNS},
            PRIMARY KEY (season, game, player),
            FOREIGN KEY (season, player) REFERENCES players (season, player_id),
            FOREIGN KEY (season, game, curr_team)
                REFERENCES team_game_logs (season, game, team)
        )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS team_season_stats (
            season TEXT NOT NULL,
            pk INTEGER NOT NULL,
            team INTEGER NOT NULL,
            season_type TEXT NOT NULL,
            wins INTEGER NOT NULL,
            losses INTEGER NOT NULL,
            win_percent REAL NOT NULL,{COUNTING_STAT_COLUMNS},
            PRIMARY KEY (season, season_type, team),
            FOREIGN KEY (season, team) REFERENCES teams (season, team_id)
        )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS player_season_stats (
            snapshot TEXT NOT NULL,
            pk INTEGER NOT NULL,
            player INTEGER NOT NULL,
            curr_team INTEGER NOT NULL,
            season TEXT NOT NULL,
            season_type TEXT NOT NULL,
            games_played INTEGER NOT NULL,
            games_started INTEGER NOT NULL,{COUNTING_STAT_COLUMNS},
            PRIMARY KEY (snapshot, player, season, season_type, curr_team),
            FOREIGN KEY (snapshot, player) REFERENCES players (season, player_id)
        )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS player_career_stats (
            snapshot TEXT NOT NULL,
            pk INTEGER NOT NULL,
            player INTEGER NOT NULL,
            season_type TEXT NOT NULL,
            games_played INTEGER NOT NULL,
            games_started INTEGER NOT NULL,{COUNTING_STAT_COLUMNS},
            PRIMARY KEY (snapshot, player, season_type),
            FOREIGN KEY (snapshot, player) REFERENCES players (season, player_id)
        )"
        ),
    ]
}

/// Tables in reverse dependency order, paired with their scope column.
/// Deleting in this order never trips a foreign key.
pub const DELETE_ORDER: [(&str, &str); 9] = [
    ("player_career_stats", "snapshot"),
    ("player_season_stats", "snapshot"),
    ("team_season_stats", "season"),
    ("player_game_logs", "season"),
    ("team_game_logs", "season"),
    ("standings", "season"),
    ("games", "season"),
    ("players", "season"),
    ("teams", "season"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_has_a_delete_entry() {
        let ddl = create_table_statements();
        assert_eq!(ddl.len(), DELETE_ORDER.len());
        for (table, _) in DELETE_ORDER {
            assert!(
                ddl.iter().any(|stmt| stmt.contains(table)),
                "no DDL for {table}"
            );
        }
    }

    #[test]
    fn test_delete_order_is_reverse_of_create_order() {
        let ddl = create_table_statements();
        let create_positions: Vec<usize> = DELETE_ORDER
            .iter()
            .map(|(table, _)| {
                ddl.iter()
                    .position(|stmt| {
                        stmt.trim_start()
                            .starts_with(&format!("CREATE TABLE IF NOT EXISTS {table} ("))
                    })
                    .expect("table has DDL")
            })
            .collect();
        let mut sorted = create_positions.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(create_positions, sorted);
    }
}
