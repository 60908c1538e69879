use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::*;

/// Named difficulty tier, shared by both game modes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

/// Onet tier: board size and countdown.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OnetLevel {
    pub name: &'static str,
    pub board: BoardConfig,
    pub time_limit_secs: u32,
}

/// Memory tier: deck layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemoryLevel {
    pub name: &'static str,
    pub rows: Coord,
    pub cols: Coord,
    pub pairs: CellCount,
}

impl MemoryLevel {
    pub const fn card_count(&self) -> CellCount {
        self.pairs * 2
    }
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub const fn onet(self) -> OnetLevel {
        match self {
            Self::Easy => OnetLevel {
                name: "Easy",
                board: BoardConfig::new_unchecked(6, 10),
                time_limit_secs: 300,
            },
            Self::Medium => OnetLevel {
                name: "Medium",
                board: BoardConfig::new_unchecked(8, 12),
                time_limit_secs: 420,
            },
            Self::Hard => OnetLevel {
                name: "Hard",
                board: BoardConfig::new_unchecked(10, 14),
                time_limit_secs: 600,
            },
        }
    }

    pub const fn memory(self) -> MemoryLevel {
        match self {
            Self::Easy => MemoryLevel {
                name: "Easy",
                rows: 2,
                cols: 4,
                pairs: 4,
            },
            Self::Medium => MemoryLevel {
                name: "Medium",
                rows: 6,
                cols: 6,
                pairs: 18,
            },
            Self::Hard => MemoryLevel {
                name: "Hard",
                rows: 8,
                cols: 10,
                pairs: 40,
            },
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or(UnknownDifficulty)
    }
}

#[derive(thiserror::Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("Unknown difficulty, expected easy, medium or hard")]
pub struct UnknownDifficulty;
