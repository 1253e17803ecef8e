use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::*;

/// Named board presets plus a user-defined configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Custom(GameConfig),
}

impl Difficulty {
    pub const EASY: GameConfig = GameConfig::new_unchecked((10, 10), 10);
    pub const MEDIUM: GameConfig = GameConfig::new_unchecked((30, 20), 60);
    pub const HARD: GameConfig = GameConfig::new_unchecked((30, 30), 100);

    pub const fn config(self) -> GameConfig {
        match self {
            Self::Easy => Self::EASY,
            Self::Medium => Self::MEDIUM,
            Self::Hard => Self::HARD,
            Self::Custom(config) => config,
        }
    }

    pub const fn identifier(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Custom(_) => "custom",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for Difficulty {
    type Err = GameError;

    /// `custom` starts out with the medium dimensions until the caller supplies its own.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            "custom" => Ok(Self::Custom(Self::MEDIUM)),
            other => Err(GameError::UnknownDifficulty(other.into())),
        }
    }
}

/// Facts about a won game, handed to whatever keeps the high scores.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub columns: Coord,
    pub rows: Coord,
    pub mines: CellCount,
    pub elapsed: Duration,
}
