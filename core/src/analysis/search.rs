use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::ops::Deref;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Maximum number of heading changes allowed along a connecting path.
pub const MAX_TURNS: u8 = 2;

/// Cells from start to end inclusive, each step moving to a 4-adjacent cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    cells: SmallVec<[Pos; 16]>,
}

impl Path {
    pub fn start(&self) -> Pos {
        self.cells[0]
    }

    pub fn end(&self) -> Pos {
        self.cells[self.cells.len() - 1]
    }

    /// Number of heading changes along the path.
    pub fn turns(&self) -> usize {
        let mut headings = self
            .cells
            .windows(2)
            .filter_map(|step| Direction::between(step[0], step[1]));
        let Some(mut heading) = headings.next() else {
            return 0;
        };
        let mut turns = 0;
        for next in headings {
            if next != heading {
                turns += 1;
                heading = next;
            }
        }
        turns
    }

    /// Corner cells where the path changes heading, endpoints included.
    ///
    /// Renderers draw the connection as straight segments between these.
    pub fn corners(&self) -> SmallVec<[Pos; 4]> {
        let mut corners = SmallVec::new();
        corners.push(self.start());
        for window in self.cells.windows(3) {
            if Direction::between(window[0], window[1]) != Direction::between(window[1], window[2])
            {
                corners.push(window[1]);
            }
        }
        corners.push(self.end());
        corners
    }
}

impl Deref for Path {
    type Target = [Pos];

    fn deref(&self) -> &Self::Target {
        &self.cells
    }
}

/// Node of the breadth-first search.
///
/// States are keyed on the full triple rather than the position alone: a cell
/// first reached with more turns spent must stay explorable when it is later
/// reached with turns to spare.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct SearchState {
    pos: Pos,
    heading: Option<Direction>,
    turns: u8,
}

/// Finds a path from `start` to `end` crossing only empty cells, with at most [`MAX_TURNS`] turns.
///
/// Both endpoints may hold tiles. The returned path is the shortest among those within the turn
/// budget, ties broken by exploration order.
pub fn find_path(grid: &Grid, start: Pos, end: Pos) -> Option<Path> {
    if start == end || !grid.contains(start) || !grid.contains(end) {
        return None;
    }

    let bounds = grid.size();
    let origin = SearchState {
        pos: start,
        heading: None,
        turns: 0,
    };

    // (state, parent index into `nodes`)
    let mut nodes: Vec<(SearchState, Option<usize>)> = Vec::from([(origin, None)]);
    let mut seen = HashSet::new();
    seen.insert(origin);
    let mut queue = VecDeque::from([0usize]);

    while let Some(index) = queue.pop_front() {
        let (state, _) = nodes[index];
        if state.pos == end {
            return Some(reconstruct(&nodes, index));
        }

        for dir in Direction::ALL {
            let Some(next) = step(state.pos, dir, bounds) else {
                continue;
            };
            if next != end && grid[next] != EMPTY {
                continue;
            }

            let turns = match state.heading {
                Some(heading) if heading != dir => state.turns + 1,
                _ => state.turns,
            };
            if turns > MAX_TURNS {
                continue;
            }

            let next_state = SearchState {
                pos: next,
                heading: Some(dir),
                turns,
            };
            if !seen.insert(next_state) {
                continue;
            }

            nodes.push((next_state, Some(index)));
            queue.push_back(nodes.len() - 1);
        }
    }

    None
}

fn reconstruct(nodes: &[(SearchState, Option<usize>)], mut index: usize) -> Path {
    let mut cells = SmallVec::new();
    loop {
        let (state, parent) = nodes[index];
        cells.push(state.pos);
        match parent {
            Some(parent) => index = parent,
            None => break,
        }
    }
    cells.reverse();
    Path { cells }
}

/// Whether `a` and `b` hold the same tile kind and can be linked by a valid path.
pub fn can_connect(grid: &Grid, a: Pos, b: Pos) -> bool {
    match (grid.kind_at(a), grid.kind_at(b)) {
        (Some(kind_a), Some(kind_b)) if kind_a != EMPTY && kind_a == kind_b => {
            find_path(grid, a, b).is_some()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid(grid: &Grid, path: &Path, start: Pos, end: Pos) {
        assert_eq!(path.start(), start);
        assert_eq!(path.end(), end);
        for window in path.windows(2) {
            assert!(is_adjacent(window[0], window[1]), "{path:?}");
        }
        for &pos in &path[1..path.len() - 1] {
            assert_eq!(grid[pos], EMPTY, "{path:?}");
        }
        assert!(path.turns() <= MAX_TURNS as usize, "{path:?}");
    }

    #[test]
    fn adjacent_tiles_connect_straight() {
        let grid = Grid::from_rows(&[
            &[0, 0, 0, 0],
            &[0, 5, 5, 0],
            &[0, 1, 2, 0],
            &[0, 0, 0, 0],
        ])
        .unwrap();

        let path = find_path(&grid, (1, 1), (2, 1)).unwrap();

        assert_eq!(&path[..], &[(1, 1), (2, 1)]);
        assert_eq!(path.turns(), 0);
    }

    #[test]
    fn diagonal_neighbours_need_one_turn() {
        let grid = Grid::from_rows(&[
            &[0, 0, 0, 0],
            &[0, 5, 0, 0],
            &[0, 1, 5, 0],
            &[0, 0, 0, 0],
        ])
        .unwrap();

        let path = find_path(&grid, (1, 1), (2, 2)).unwrap();

        assert_valid(&grid, &path, (1, 1), (2, 2));
        assert_eq!(path.len(), 3);
        assert_eq!(path.turns(), 1);
        assert_eq!(path.corners().as_slice(), &[(1, 1), (2, 1), (2, 2)]);
    }

    #[test]
    fn walled_in_tile_cannot_connect() {
        let grid = Grid::from_rows(&[
            &[0, 0, 0, 0, 0],
            &[0, 1, 2, 1, 0],
            &[0, 2, 3, 2, 0],
            &[0, 1, 2, 3, 0],
            &[0, 0, 0, 0, 0],
        ])
        .unwrap();

        assert_eq!(find_path(&grid, (2, 2), (3, 3)), None);
        assert!(!can_connect(&grid, (2, 2), (3, 3)));
    }

    #[test]
    fn border_ring_allows_u_shaped_paths() {
        let grid = Grid::from_rows(&[
            &[0, 0, 0, 0, 0],
            &[0, 4, 6, 4, 0],
            &[0, 7, 8, 9, 0],
            &[0, 0, 0, 0, 0],
        ])
        .unwrap();

        let path = find_path(&grid, (1, 1), (3, 1)).unwrap();

        assert_valid(&grid, &path, (1, 1), (3, 1));
        assert_eq!(path.turns(), 2);
        assert_eq!(path.corners().as_slice(), &[(1, 1), (1, 0), (3, 0), (3, 1)]);
    }

    #[test]
    fn three_segment_detour_is_rejected() {
        // the only corridor from (1, 1) to (4, 1) runs down, right, up, right
        let grid = Grid::from_rows(&[
            &[9, 9, 9, 9, 9, 9],
            &[9, 4, 9, 0, 4, 9],
            &[9, 0, 9, 0, 9, 9],
            &[9, 0, 0, 0, 9, 9],
            &[9, 9, 9, 9, 9, 9],
        ])
        .unwrap();

        assert_eq!(find_path(&grid, (1, 1), (4, 1)), None);
    }

    #[test]
    fn same_cell_reached_with_other_heading_stays_explorable() {
        // (2, 2) is first reached heading right, which cannot finish within the turn budget;
        // the later arrival heading down is the one that reaches the target.
        let grid = Grid::from_rows(&[
            &[9, 9, 9, 9, 9, 9],
            &[9, 3, 0, 9, 9, 9],
            &[9, 0, 0, 9, 9, 9],
            &[9, 9, 0, 9, 9, 9],
            &[9, 9, 0, 0, 3, 9],
            &[9, 9, 9, 9, 9, 9],
        ])
        .unwrap();

        let path = find_path(&grid, (1, 1), (4, 4)).unwrap();

        assert_valid(&grid, &path, (1, 1), (4, 4));
        assert_eq!(
            path.corners().as_slice(),
            &[(1, 1), (2, 1), (2, 4), (4, 4)]
        );
    }

    #[test]
    fn rejects_identical_and_out_of_bounds_endpoints() {
        let grid = Grid::from_rows(&[&[0, 0, 0], &[0, 1, 0], &[0, 0, 0]]).unwrap();

        assert_eq!(find_path(&grid, (1, 1), (1, 1)), None);
        assert_eq!(find_path(&grid, (1, 1), (7, 1)), None);
        assert!(!can_connect(&grid, (0, 0), (1, 0)));
    }

    #[test]
    fn can_connect_requires_matching_kinds() {
        let grid = Grid::from_rows(&[&[0, 0, 0, 0], &[0, 1, 2, 0], &[0, 0, 0, 0]]).unwrap();

        assert!(find_path(&grid, (1, 1), (2, 1)).is_some());
        assert!(!can_connect(&grid, (1, 1), (2, 1)));
    }
}
