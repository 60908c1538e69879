use serde::{Deserialize, Serialize};

/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u8;

/// Count type used for tile and pair counts.
pub type CellCount = u16;

/// Two-dimensional position `(x, y)`, x being the column and y the row.
pub type Pos = (Coord, Coord);

/// Tile kind stored in a grid cell, `EMPTY` means walkable.
pub type Kind = u8;

pub const EMPTY: Kind = 0;

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Pos {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Cardinal heading of a single step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub const fn delta(self) -> (i8, i8) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Heading of the step from `from` to `to`, if they are 4-adjacent.
    pub fn between(from: Pos, to: Pos) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|&dir| step(from, dir, (Coord::MAX, Coord::MAX)) == Some(to))
    }
}

/// Moves `pos` one cell towards `dir`, returning a value only when it remains in bounds.
pub fn step(pos: Pos, dir: Direction, bounds: Pos) -> Option<Pos> {
    let (x, y) = pos;
    let (dx, dy) = dir.delta();
    let (max_x, max_y) = bounds;

    let next_x = x.checked_add_signed(dx)?;
    if next_x >= max_x {
        return None;
    }

    let next_y = y.checked_add_signed(dy)?;
    if next_y >= max_y {
        return None;
    }

    Some((next_x, next_y))
}

pub const fn is_adjacent(a: Pos, b: Pos) -> bool {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1) == 1
}
