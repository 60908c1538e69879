use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

/// Points awarded for each removed pair.
pub const POINTS_PER_MATCH: u32 = 10;

/// How long a rejected tile keeps its invalid marker.
pub const INVALID_MARK_MS: u32 = 300;

/// Removal animation plus shuffle animation before an automatic reshuffle lands.
pub const AUTO_RESHUFFLE_MS: u32 = 900;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    #[default]
    Playing,
    Paused,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Deferred {
    ClearInvalid(Pos),
    AutoReshuffle,
}

/// Work the caller must run later through [`OnetEngine::settle`].
///
/// Carries the engine generation it was issued in; a restart in between turns it into a no-op.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Continuation {
    generation: u64,
    action: Deferred,
}

impl Continuation {
    pub const fn action(&self) -> Deferred {
        self.action
    }

    pub const fn delay_ms(&self) -> u32 {
        match self.action {
            Deferred::ClearInvalid(_) => INVALID_MARK_MS,
            Deferred::AutoReshuffle => AUTO_RESHUFFLE_MS,
        }
    }
}

/// What happens after a pair is removed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FollowUp {
    Continue,
    Won,
    Reshuffle(Continuation),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    NoChange,
    Selected(Pos),
    Deselected,
    Rejected {
        at: Pos,
        clear: Continuation,
    },
    Matched {
        a: Pos,
        b: Pos,
        path: Path,
        follow_up: FollowUp,
    },
}

impl SelectOutcome {
    pub const fn has_update(&self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Running(u32),
    TimeUp,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SettleOutcome {
    Stale,
    ClearedInvalid,
    Reshuffled(ShuffleReport),
}

/// Single-player Onet session: selection, scoring, countdown, and board upkeep.
#[derive(Clone, Debug)]
pub struct OnetEngine {
    level: OnetLevel,
    grid: Grid,
    selected: Option<Pos>,
    invalid: Option<Pos>,
    score: u32,
    matches: u32,
    time_remaining: u32,
    status: GameStatus,
    busy: bool,
    generation: u64,
    rng: SmallRng,
}

impl OnetEngine {
    /// Starts a game on a fresh, solvable board for `difficulty`.
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        let level = difficulty.onet();
        let mut engine = Self::with_grid(Grid::empty(level.board), level.time_limit_secs, seed);
        engine.level = level;
        engine.restart(None);
        engine
    }

    /// Starts a game on a prepared board, border ring included.
    pub fn with_grid(grid: Grid, time_limit_secs: u32, seed: u64) -> Self {
        let (width, height) = grid.size();
        let level = OnetLevel {
            name: "Custom",
            board: BoardConfig::new_unchecked(
                height.saturating_sub(2).max(1),
                width.saturating_sub(2).max(1),
            ),
            time_limit_secs,
        };
        Self {
            level,
            grid,
            selected: None,
            invalid: None,
            score: 0,
            matches: 0,
            time_remaining: time_limit_secs,
            status: GameStatus::Playing,
            busy: false,
            generation: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn level(&self) -> OnetLevel {
        self.level
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn selected(&self) -> Option<Pos> {
        self.selected
    }

    pub fn invalid(&self) -> Option<Pos> {
        self.invalid
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn matches(&self) -> u32 {
        self.matches
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// An automatic reshuffle is pending, input is held until it settles.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn hint(&self) -> Option<Move> {
        if self.status == GameStatus::Playing && !self.busy {
            find_move(&self.grid)
        } else {
            None
        }
    }

    /// Throws the current game away and deals a new solvable board.
    ///
    /// A new difficulty only takes effect here.
    pub fn restart(&mut self, difficulty: Option<Difficulty>) {
        if let Some(difficulty) = difficulty {
            self.level = difficulty.onet();
        }
        self.generation += 1;

        let mut grid = RandomBoardGenerator::new(self.rng.random()).generate(self.level.board);
        if !has_any_move(&grid) {
            let report = reshuffle_until_solvable(&mut grid, &mut self.rng, MAX_SHUFFLE_ATTEMPTS);
            log::debug!("Fresh board had no move, reshuffled: {report:?}");
        }

        self.grid = grid;
        self.selected = None;
        self.invalid = None;
        self.score = 0;
        self.matches = 0;
        self.time_remaining = self.level.time_limit_secs;
        self.status = GameStatus::Playing;
        self.busy = false;
    }

    pub fn select(&mut self, pos: Pos) -> Result<SelectOutcome> {
        use SelectOutcome::*;

        let pos = self.grid.validate_pos(pos)?;
        self.check_ready()?;

        if self.grid[pos] == EMPTY {
            return Ok(NoChange);
        }

        let Some(first) = self.selected.take() else {
            self.selected = Some(pos);
            return Ok(Selected(pos));
        };
        if first == pos {
            return Ok(Deselected);
        }

        let path = if self.grid[first] == self.grid[pos] {
            find_path(&self.grid, first, pos)
        } else {
            None
        };

        Ok(match path {
            Some(path) => {
                let follow_up = self.remove_pair(first, pos);
                Matched {
                    a: first,
                    b: pos,
                    path,
                    follow_up,
                }
            }
            None => {
                log::debug!("Rejected pair {first:?} - {pos:?}");
                self.invalid = Some(pos);
                Rejected {
                    at: pos,
                    clear: self.defer(Deferred::ClearInvalid(pos)),
                }
            }
        })
    }

    /// Player-requested shuffle of the remaining tiles.
    pub fn shuffle(&mut self) -> Result<ShuffleReport> {
        self.check_ready()?;
        self.selected = None;
        Ok(reshuffle_until_solvable(
            &mut self.grid,
            &mut self.rng,
            MAX_SHUFFLE_ATTEMPTS,
        ))
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != GameStatus::Playing {
            return TickOutcome::Idle;
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            self.status = GameStatus::Lost;
            self.selected = None;
            TickOutcome::TimeUp
        } else {
            TickOutcome::Running(self.time_remaining)
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.status == GameStatus::Playing {
            self.status = GameStatus::Paused;
            true
        } else {
            false
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.status == GameStatus::Paused {
            self.status = GameStatus::Playing;
            true
        } else {
            false
        }
    }

    /// Runs deferred work, unless the game it was issued for has been replaced.
    pub fn settle(&mut self, continuation: Continuation) -> SettleOutcome {
        if continuation.generation != self.generation {
            return SettleOutcome::Stale;
        }

        match continuation.action {
            Deferred::ClearInvalid(pos) if self.invalid == Some(pos) => {
                self.invalid = None;
                SettleOutcome::ClearedInvalid
            }
            Deferred::ClearInvalid(_) => SettleOutcome::Stale,
            Deferred::AutoReshuffle if self.busy => {
                self.busy = false;
                if self.status.is_finished() {
                    return SettleOutcome::Stale;
                }
                self.selected = None;
                SettleOutcome::Reshuffled(reshuffle_until_solvable(
                    &mut self.grid,
                    &mut self.rng,
                    MAX_SHUFFLE_ATTEMPTS,
                ))
            }
            Deferred::AutoReshuffle => SettleOutcome::Stale,
        }
    }

    fn remove_pair(&mut self, a: Pos, b: Pos) -> FollowUp {
        self.grid.remove_pair(a, b);
        self.matches += 1;
        self.score += POINTS_PER_MATCH;

        if self.grid.is_cleared() {
            self.status = GameStatus::Won;
            FollowUp::Won
        } else if !has_any_move(&self.grid) {
            log::debug!("No moves left after {} matches, reshuffle queued", self.matches);
            self.busy = true;
            FollowUp::Reshuffle(self.defer(Deferred::AutoReshuffle))
        } else {
            FollowUp::Continue
        }
    }

    fn defer(&self, action: Deferred) -> Continuation {
        Continuation {
            generation: self.generation,
            action,
        }
    }

    fn check_ready(&self) -> Result<()> {
        if self.status != GameStatus::Playing {
            Err(GameError::NotPlaying)
        } else if self.busy {
            Err(GameError::Busy)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(rows: &[&[Kind]]) -> OnetEngine {
        OnetEngine::with_grid(Grid::from_rows(rows).unwrap(), 60, 9)
    }

    #[test]
    fn single_pair_board_is_won_on_match() {
        let mut engine = engine(&[&[0, 0, 0, 0], &[0, 1, 1, 0], &[0, 0, 0, 0]]);

        assert_eq!(engine.select((1, 1)).unwrap(), SelectOutcome::Selected((1, 1)));
        let outcome = engine.select((2, 1)).unwrap();

        let SelectOutcome::Matched { follow_up, .. } = outcome else {
            panic!("expected a match, got {outcome:?}");
        };
        assert_eq!(follow_up, FollowUp::Won);
        assert_eq!(engine.status(), GameStatus::Won);
        assert_eq!(engine.score(), POINTS_PER_MATCH);
        assert_eq!(engine.matches(), 1);
        assert_eq!(engine.select((1, 1)), Err(GameError::NotPlaying));
    }

    #[test]
    fn clicking_selection_again_deselects() {
        let mut engine = engine(&[&[0, 0, 0, 0], &[0, 1, 1, 0], &[0, 0, 0, 0]]);

        engine.select((1, 1)).unwrap();

        assert_eq!(engine.select((1, 1)).unwrap(), SelectOutcome::Deselected);
        assert_eq!(engine.selected(), None);
        assert_eq!(engine.select((0, 0)).unwrap(), SelectOutcome::NoChange);
        assert_eq!(engine.select((9, 9)), Err(GameError::InvalidCoords));
    }

    #[test]
    fn mismatched_kinds_flag_invalid_until_settled() {
        let mut engine = engine(&[
            &[0, 0, 0, 0],
            &[0, 1, 2, 0],
            &[0, 2, 1, 0],
            &[0, 0, 0, 0],
        ]);

        engine.select((1, 1)).unwrap();
        let SelectOutcome::Rejected { at, clear } = engine.select((2, 1)).unwrap() else {
            panic!("expected rejection");
        };

        assert_eq!(at, (2, 1));
        assert_eq!(engine.selected(), None);
        assert_eq!(engine.invalid(), Some((2, 1)));
        assert_eq!(clear.delay_ms(), INVALID_MARK_MS);
        assert_eq!(engine.settle(clear), SettleOutcome::ClearedInvalid);
        assert_eq!(engine.invalid(), None);
    }

    #[test]
    fn same_kind_without_path_is_rejected() {
        let mut engine = engine(&[
            &[0, 0, 0, 0],
            &[0, 1, 2, 0],
            &[0, 2, 1, 0],
            &[0, 0, 0, 0],
        ]);

        engine.select((1, 1)).unwrap();
        let outcome = engine.select((2, 2)).unwrap();

        assert!(matches!(outcome, SelectOutcome::Rejected { at: (2, 2), .. }));
        assert_eq!(engine.grid().tile_count(), 4);
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn dead_end_after_match_queues_reshuffle() {
        let mut engine = engine(&[
            &[0, 0, 0, 0, 0, 0],
            &[0, 1, 2, 0, 3, 0],
            &[0, 2, 1, 0, 3, 0],
            &[0, 0, 0, 0, 0, 0],
        ]);

        engine.select((4, 1)).unwrap();
        let SelectOutcome::Matched { follow_up, .. } = engine.select((4, 2)).unwrap() else {
            panic!("expected a match");
        };
        let FollowUp::Reshuffle(continuation) = follow_up else {
            panic!("expected a reshuffle, got {follow_up:?}");
        };

        assert!(engine.is_busy());
        assert_eq!(engine.select((1, 1)), Err(GameError::Busy));
        assert_eq!(engine.shuffle(), Err(GameError::Busy));

        let SettleOutcome::Reshuffled(report) = engine.settle(continuation) else {
            panic!("expected the reshuffle to run");
        };
        assert!(report.is_solvable());
        assert!(!engine.is_busy());
        assert!(engine.hint().is_some());
    }

    #[test]
    fn restart_invalidates_pending_continuations() {
        let mut engine = engine(&[
            &[0, 0, 0, 0, 0, 0],
            &[0, 1, 2, 0, 3, 0],
            &[0, 2, 1, 0, 3, 0],
            &[0, 0, 0, 0, 0, 0],
        ]);
        engine.select((4, 1)).unwrap();
        let SelectOutcome::Matched {
            follow_up: FollowUp::Reshuffle(continuation),
            ..
        } = engine.select((4, 2)).unwrap()
        else {
            panic!("expected a queued reshuffle");
        };

        engine.restart(Some(Difficulty::Easy));

        assert_eq!(engine.settle(continuation), SettleOutcome::Stale);
        assert!(!engine.is_busy());
    }

    #[test]
    fn restart_deals_fresh_solvable_board() {
        let mut engine = OnetEngine::new(Difficulty::Medium, 4);
        engine.tick();
        let first = engine.hint().unwrap();
        engine.select(first.a).unwrap();
        engine.select(first.b).unwrap();
        assert!(engine.score() > 0);

        for difficulty in Difficulty::ALL {
            engine.restart(Some(difficulty));

            let board = difficulty.onet().board;
            assert_eq!(engine.status(), GameStatus::Playing);
            assert_eq!(engine.score(), 0);
            assert_eq!(engine.matches(), 0);
            assert_eq!(engine.time_remaining(), difficulty.onet().time_limit_secs);
            assert_eq!(engine.grid().tile_count(), board.total_tiles());
            assert!(has_any_move(engine.grid()));
        }
    }

    #[test]
    fn countdown_loses_game_and_respects_pause() {
        let grid = Grid::from_rows(&[&[0, 0, 0, 0], &[0, 1, 1, 0], &[0, 0, 0, 0]]).unwrap();
        let mut engine = OnetEngine::with_grid(grid, 2, 0);

        assert_eq!(engine.tick(), TickOutcome::Running(1));
        assert!(engine.pause());
        assert_eq!(engine.tick(), TickOutcome::Idle);
        assert_eq!(engine.select((1, 1)), Err(GameError::NotPlaying));
        assert!(engine.resume());
        assert_eq!(engine.tick(), TickOutcome::TimeUp);
        assert_eq!(engine.status(), GameStatus::Lost);
        assert_eq!(engine.tick(), TickOutcome::Idle);
        assert!(!engine.resume());
    }

    #[test]
    fn hinted_moves_clear_a_whole_board() {
        let mut engine = OnetEngine::new(Difficulty::Easy, 21);
        let total_pairs = u32::from(engine.level().board.pair_count());

        while engine.status() == GameStatus::Playing {
            let hint = engine.hint().expect("solvable board must offer a hint");
            engine.select(hint.a).unwrap();
            let SelectOutcome::Matched { follow_up, .. } = engine.select(hint.b).unwrap() else {
                panic!("hinted pair must match");
            };
            if let FollowUp::Reshuffle(continuation) = follow_up {
                assert!(matches!(
                    engine.settle(continuation),
                    SettleOutcome::Reshuffled(_)
                ));
            }
        }

        assert_eq!(engine.status(), GameStatus::Won);
        assert_eq!(engine.matches(), total_pairs);
        assert_eq!(engine.score(), total_pairs * POINTS_PER_MATCH);
    }
}
