use alloc::vec::Vec;
use core::ops::{Index, IndexMut};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Number of distinct tile kinds in the palette, larger boards reuse them cyclically.
pub const KIND_COUNT: Kind = 12;

/// Kind assigned to the `pair_index`-th pair of a freshly generated board.
pub const fn palette_kind(pair_index: CellCount) -> Kind {
    (pair_index % KIND_COUNT as CellCount) as Kind + 1
}

/// Onet board: playable interior surrounded by one ring of always-empty cells.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cells: Array2<Kind>,
}

impl Grid {
    /// Empty grid with room for `rows × cols` tiles plus the border ring.
    pub fn empty(config: BoardConfig) -> Self {
        let size = config.padded_size();
        Self {
            cells: Array2::from_elem(size.to_nd_index(), EMPTY),
        }
    }

    /// Builds a grid from rows of kinds, `rows[y][x]`, border included.
    pub fn from_rows(rows: &[&[Kind]]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.len());
        if width == 0 || height == 0 {
            return Err(GameError::EmptyBoard);
        }
        if width > Coord::MAX as usize || height > Coord::MAX as usize {
            return Err(GameError::InvalidCoords);
        }

        let mut cells = Array2::from_elem([width, height], EMPTY);
        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(GameError::InvalidCoords);
            }
            for (x, &kind) in row.iter().enumerate() {
                cells[[x, y]] = kind;
            }
        }
        Ok(Self { cells })
    }

    /// Size including the border ring, `(width, height)`.
    pub fn size(&self) -> Pos {
        let dim = self.cells.dim();
        (dim.0 as Coord, dim.1 as Coord)
    }

    pub fn contains(&self, pos: Pos) -> bool {
        let size = self.size();
        pos.0 < size.0 && pos.1 < size.1
    }

    pub fn validate_pos(&self, pos: Pos) -> Result<Pos> {
        if self.contains(pos) {
            Ok(pos)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn kind_at(&self, pos: Pos) -> Option<Kind> {
        self.contains(pos).then(|| self[pos])
    }

    pub fn is_empty_at(&self, pos: Pos) -> bool {
        self.kind_at(pos) == Some(EMPTY)
    }

    /// True once every tile has been removed.
    pub fn is_cleared(&self) -> bool {
        self.cells.iter().all(|&kind| kind == EMPTY)
    }

    pub fn tile_count(&self) -> CellCount {
        self.cells.iter().filter(|&&kind| kind != EMPTY).count() as CellCount
    }

    /// Positions of all non-empty cells in row-major order.
    pub fn tiles(&self) -> Vec<Pos> {
        let (width, height) = self.size();
        let mut tiles = Vec::with_capacity(self.tile_count().into());
        for y in 0..height {
            for x in 0..width {
                if self[(x, y)] != EMPTY {
                    tiles.push((x, y));
                }
            }
        }
        tiles
    }

    /// Clears both cells of a matched pair.
    pub fn remove_pair(&mut self, a: Pos, b: Pos) {
        self[a] = EMPTY;
        self[b] = EMPTY;
    }

    /// Rows of kinds, `rows[y][x]`, handy for rendering and debugging.
    pub fn to_rows(&self) -> Vec<Vec<Kind>> {
        let (width, height) = self.size();
        (0..height)
            .map(|y| (0..width).map(|x| self[(x, y)]).collect())
            .collect()
    }
}

impl Index<Pos> for Grid {
    type Output = Kind;

    fn index(&self, pos: Pos) -> &Self::Output {
        &self.cells[pos.to_nd_index()]
    }
}

impl IndexMut<Pos> for Grid {
    fn index_mut(&mut self, pos: Pos) -> &mut Self::Output {
        &mut self.cells[pos.to_nd_index()]
    }
}
