use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use super::find_path;
use crate::*;

/// A connectable same-kind pair and the path linking it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub a: Pos,
    pub b: Pos,
    pub path: Path,
}

/// Same-kind tile pairs in row-major order of their first cell.
fn candidate_pairs(grid: &Grid) -> impl Iterator<Item = (Pos, Pos)> + '_ {
    let tiles = grid.tiles();
    (0..tiles.len()).flat_map(move |i| {
        let a = tiles[i];
        let kind = grid[a];
        tiles[i + 1..]
            .iter()
            .filter(move |&&b| grid[b] == kind)
            .map(move |&b| (a, b))
            .collect::<Vec<_>>()
    })
}

/// First connectable pair found, usable as a hint.
pub fn find_move(grid: &Grid) -> Option<Move> {
    candidate_pairs(grid).find_map(|(a, b)| find_path(grid, a, b).map(|path| Move { a, b, path }))
}

/// Whether the board is solvable right now, i.e. at least one pair can be removed.
pub fn has_any_move(grid: &Grid) -> bool {
    find_move(grid).is_some()
}

/// Every connectable pair on the board.
pub fn all_moves(grid: &Grid) -> Vec<Move> {
    candidate_pairs(grid)
        .filter_map(|(a, b)| find_path(grid, a, b).map(|path| Move { a, b, path }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_board_has_no_moves() {
        let grid = Grid::from_rows(&[&[0, 0, 0], &[0, 0, 0]]).unwrap();

        assert!(!has_any_move(&grid));
        assert!(all_moves(&grid).is_empty());
    }

    #[test]
    fn hint_points_at_a_removable_pair() {
        let grid = Grid::from_rows(&[
            &[0, 0, 0, 0, 0],
            &[0, 1, 2, 1, 0],
            &[0, 2, 3, 3, 0],
            &[0, 0, 0, 0, 0],
        ])
        .unwrap();

        let hint = find_move(&grid).unwrap();

        assert_eq!((hint.a, hint.b), ((1, 1), (3, 1)));
        assert_eq!(hint.path.turns(), 2);
        assert_eq!(all_moves(&grid).len(), 2);
    }

    #[test]
    fn crossed_pairs_leave_no_move() {
        // each pair sits on a diagonal and needs three turns to go around the other
        let grid = Grid::from_rows(&[
            &[0, 0, 0, 0],
            &[0, 1, 2, 0],
            &[0, 2, 1, 0],
            &[0, 0, 0, 0],
        ])
        .unwrap();

        assert!(!has_any_move(&grid));
        assert_eq!(find_move(&grid), None);
    }
}
