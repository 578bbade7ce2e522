use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// The fixed, enumerated set of upstream table categories.
///
/// Each kind selects one projection rule; there is no fallback path for a
/// table the pipeline does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableKind {
    TeamList,
    PlayerList,
    Standings,
    BoxScoreSummary,
    BoxScoreTraditional,
    TeamGameLog,
    PlayerGameLog,
    SeasonStats,
    CareerStats,
}

impl TableKind {
    pub const ALL: [TableKind; 9] = [
        TableKind::TeamList,
        TableKind::PlayerList,
        TableKind::Standings,
        TableKind::BoxScoreSummary,
        TableKind::BoxScoreTraditional,
        TableKind::TeamGameLog,
        TableKind::PlayerGameLog,
        TableKind::SeasonStats,
        TableKind::CareerStats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::TeamList => "team_list",
            TableKind::PlayerList => "player_list",
            TableKind::Standings => "standings",
            TableKind::BoxScoreSummary => "box_score_summary",
            TableKind::BoxScoreTraditional => "box_score_traditional",
            TableKind::TeamGameLog => "team_game_log",
            TableKind::PlayerGameLog => "player_game_log",
            TableKind::SeasonStats => "season_stats",
            TableKind::CareerStats => "career_stats",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TableKind {
    type Err = AppError;

    /// An unrecognized kind name is a configuration error, not a data error:
    /// retrying cannot make an unknown projection rule appear.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AppError::config_error(format!("Unknown table kind: {s}")))
    }
}

/// Normalization mode selecting field names and percentage scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeMode {
    /// Internal field names, percentages as raw fractions in [0, 1].
    Storage,
    /// Human-facing field names (`+/-`, `FG%`, ...), percentages on the
    /// 0-100 scale with one decimal.
    Display,
}
