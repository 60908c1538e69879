#![no_std]

extern crate alloc;

use serde::{Deserialize, Serialize};

pub use analysis::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use grid::*;
pub use memory::*;
pub use shuffle::*;
pub use types::*;

mod analysis;
mod config;
mod engine;
mod error;
mod generator;
mod grid;
mod memory;
mod shuffle;
mod types;

/// Playable dimensions of an Onet board, border ring excluded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub rows: Coord,
    pub cols: Coord,
}

impl BoardConfig {
    pub const fn new_unchecked(rows: Coord, cols: Coord) -> Self {
        Self { rows, cols }
    }

    pub fn new(rows: Coord, cols: Coord) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(GameError::EmptyBoard);
        }
        // leave room for the border ring on both sides
        if rows > Coord::MAX - 2 || cols > Coord::MAX - 2 {
            return Err(GameError::InvalidCoords);
        }
        if mult(rows, cols) % 2 != 0 {
            return Err(GameError::OddTileCount);
        }
        Ok(Self::new_unchecked(rows, cols))
    }

    pub const fn total_tiles(&self) -> CellCount {
        mult(self.rows, self.cols)
    }

    pub const fn pair_count(&self) -> CellCount {
        self.total_tiles() / 2
    }

    /// Grid size including the border ring, `(width, height)`.
    pub const fn padded_size(&self) -> Pos {
        (self.cols + 2, self.rows + 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_config_rejects_odd_tile_count() {
        assert_eq!(BoardConfig::new(3, 3), Err(GameError::OddTileCount));
        assert_eq!(BoardConfig::new(0, 4), Err(GameError::EmptyBoard));
        assert_eq!(BoardConfig::new(254, 2), Err(GameError::InvalidCoords));
    }

    #[test]
    fn board_config_counts_pairs() {
        let config = BoardConfig::new(10, 14).unwrap();

        assert_eq!(config.total_tiles(), 140);
        assert_eq!(config.pair_count(), 70);
        assert_eq!(config.padded_size(), (16, 12));
    }
}
