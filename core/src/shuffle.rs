use alloc::vec::Vec;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::*;

/// Reshuffles attempted before falling back to [`repair`].
pub const MAX_SHUFFLE_ATTEMPTS: u32 = 100;

/// How a reshuffle ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShuffleReport {
    /// A random shuffle produced a board with at least one move.
    Solvable { attempts: u32 },
    /// Random shuffles ran out, two tiles were swapped to create a move.
    Repaired { attempts: u32 },
    /// No arrangement of the remaining tiles can have a move.
    Stuck { attempts: u32 },
}

impl ShuffleReport {
    pub const fn attempts(self) -> u32 {
        match self {
            Self::Solvable { attempts } | Self::Repaired { attempts } | Self::Stuck { attempts } => {
                attempts
            }
        }
    }

    pub const fn is_solvable(self) -> bool {
        !matches!(self, Self::Stuck { .. })
    }
}

/// Permutes tile kinds over the occupied cells, empty cells stay empty.
pub fn shuffle_tiles<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) {
    let tiles = grid.tiles();
    let mut kinds: Vec<Kind> = tiles.iter().map(|&pos| grid[pos]).collect();
    kinds.shuffle(rng);
    for (pos, kind) in tiles.into_iter().zip(kinds) {
        grid[pos] = kind;
    }
}

/// Shuffles until the board has a move, repairing it if `max_attempts` shuffles are not enough.
pub fn reshuffle_until_solvable<R: Rng + ?Sized>(
    grid: &mut Grid,
    rng: &mut R,
    max_attempts: u32,
) -> ShuffleReport {
    if grid.is_cleared() {
        return ShuffleReport::Solvable { attempts: 0 };
    }

    let mut attempts = 0;
    while attempts < max_attempts.max(1) {
        shuffle_tiles(grid, rng);
        attempts += 1;
        if has_any_move(grid) {
            log::debug!("Board solvable after {attempts} shuffle(s)");
            return ShuffleReport::Solvable { attempts };
        }
    }

    if repair(grid) {
        log::warn!("No solvable shuffle in {attempts} attempts, repaired board by swapping tiles");
        ShuffleReport::Repaired { attempts }
    } else {
        log::warn!("No arrangement of {} tiles can be solved", grid.tile_count());
        ShuffleReport::Stuck { attempts }
    }
}

/// Makes one pair removable by swapping kinds, keeping the multiset of kinds intact.
///
/// Looks for two occupied cells linked by a valid path regardless of their kinds, then moves
/// the partner of the first cell's kind into the second cell. Returns `false` when no two
/// occupied cells can be linked at all.
pub fn repair(grid: &mut Grid) -> bool {
    let tiles = grid.tiles();
    let Some((a, b)) = linked_cells(grid, &tiles) else {
        return false;
    };

    let kind = grid[a];
    if grid[b] == kind {
        return true;
    }
    let Some(&partner) = tiles.iter().find(|&&pos| pos != a && grid[pos] == kind) else {
        return false;
    };
    let displaced = grid[b];
    grid[b] = kind;
    grid[partner] = displaced;
    true
}

fn linked_cells(grid: &Grid, tiles: &[Pos]) -> Option<(Pos, Pos)> {
    tiles.iter().enumerate().find_map(|(i, &a)| {
        tiles[i + 1..]
            .iter()
            .find(|&&b| find_path(grid, a, b).is_some())
            .map(|&b| (a, b))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn sorted_kinds(grid: &Grid) -> Vec<Kind> {
        let mut kinds: Vec<Kind> = grid.tiles().into_iter().map(|pos| grid[pos]).collect();
        kinds.sort_unstable();
        kinds
    }

    #[test]
    fn shuffle_preserves_multiset_and_holes() {
        let mut grid = Grid::from_rows(&[
            &[0, 0, 0, 0, 0, 0],
            &[0, 1, 0, 2, 3, 0],
            &[0, 3, 4, 0, 1, 0],
            &[0, 2, 4, 5, 5, 0],
            &[0, 0, 0, 0, 0, 0],
        ])
        .unwrap();
        let before_tiles = grid.tiles();
        let before_kinds = sorted_kinds(&grid);
        let mut rng = SmallRng::seed_from_u64(11);

        for _ in 0..10 {
            shuffle_tiles(&mut grid, &mut rng);
            assert_eq!(grid.tiles(), before_tiles);
            assert_eq!(sorted_kinds(&grid), before_kinds);
        }
    }

    #[test]
    fn reshuffle_finds_a_move() {
        let mut grid = Grid::from_rows(&[
            &[0, 0, 0, 0],
            &[0, 1, 2, 0],
            &[0, 2, 1, 0],
            &[0, 0, 0, 0],
        ])
        .unwrap();
        let mut rng = SmallRng::seed_from_u64(5);

        let report = reshuffle_until_solvable(&mut grid, &mut rng, MAX_SHUFFLE_ATTEMPTS);

        assert!(report.is_solvable());
        assert!(has_any_move(&grid));
        assert_eq!(sorted_kinds(&grid), [1, 1, 2, 2]);
    }

    #[test]
    fn repair_takes_over_when_attempts_run_out() {
        // with zero budget the single forced shuffle may fail, repair must still succeed
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..20 {
            let mut grid = Grid::from_rows(&[
                &[0, 0, 0, 0],
                &[0, 1, 2, 0],
                &[0, 2, 1, 0],
                &[0, 0, 0, 0],
            ])
            .unwrap();

            let report = reshuffle_until_solvable(&mut grid, &mut rng, 0);

            assert_eq!(report.attempts(), 1);
            assert!(report.is_solvable());
            assert!(has_any_move(&grid));
        }
    }

    #[test]
    fn repair_swaps_partner_next_to_linked_cell() {
        let mut grid = Grid::from_rows(&[
            &[0, 0, 0, 0],
            &[0, 1, 2, 0],
            &[0, 2, 1, 0],
            &[0, 0, 0, 0],
        ])
        .unwrap();

        assert!(repair(&mut grid));

        assert_eq!(grid[(1, 1)], grid[(2, 1)]);
        assert!(has_any_move(&grid));
        assert_eq!(sorted_kinds(&grid), [1, 1, 2, 2]);
    }

    #[test]
    fn cleared_board_needs_no_shuffle() {
        let mut grid = Grid::from_rows(&[&[0, 0], &[0, 0]]).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);

        assert_eq!(
            reshuffle_until_solvable(&mut grid, &mut rng, MAX_SHUFFLE_ATTEMPTS),
            ShuffleReport::Solvable { attempts: 0 }
        );
    }
}
