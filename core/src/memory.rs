use alloc::vec::Vec;

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

/// How long a mismatched pair stays face up.
pub const FLIP_BACK_MS: u32 = 800;

/// Stable identifier of a card, unique within its deck and unlikely to repeat across decks.
pub type CardId = u64;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub value: CellCount,
    pub index: CellCount,
    pub is_flipped: bool,
    pub is_matched: bool,
}

impl Card {
    pub const fn is_face_down(&self) -> bool {
        !self.is_flipped && !self.is_matched
    }
}

/// Builds `pairs` pairs of values `0..pairs`, shuffled over stable board indices.
pub fn generate_deck<R: Rng + ?Sized>(pairs: CellCount, rng: &mut R) -> Vec<Card> {
    let mut values: Vec<CellCount> = (0..pairs).flat_map(|value| [value, value]).collect();
    values.shuffle(rng);

    let salt = u64::from(rng.random::<u32>()) << 32;
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| Card {
            id: salt | index as CardId,
            value,
            index: index as CellCount,
            is_flipped: false,
            is_matched: false,
        })
        .collect()
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryStatus {
    #[default]
    Idle,
    Playing,
    Won,
}

/// Pending flip-back of a mismatched pair, to be passed to [`MemoryEngine::settle`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FlipBack {
    generation: u64,
    pub first: CellCount,
    pub second: CellCount,
}

impl FlipBack {
    pub const fn delay_ms(&self) -> u32 {
        FLIP_BACK_MS
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlipOutcome {
    NoChange,
    FirstFlipped(CellCount),
    Matched {
        first: CellCount,
        second: CellCount,
        won: bool,
    },
    Mismatched(FlipBack),
}

/// Single-player Memory session.
#[derive(Clone, Debug)]
pub struct MemoryEngine {
    difficulty: Difficulty,
    cards: Vec<Card>,
    first: Option<CellCount>,
    pending: Option<FlipBack>,
    moves: u32,
    status: MemoryStatus,
    generation: u64,
    rng: SmallRng,
}

impl MemoryEngine {
    /// Engine sitting at the level menu with no cards dealt.
    pub fn new(seed: u64) -> Self {
        Self {
            difficulty: Difficulty::default(),
            cards: Vec::new(),
            first: None,
            pending: None,
            moves: 0,
            status: MemoryStatus::Idle,
            generation: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Starts a game from a prepared deck.
    pub fn with_deck(cards: Vec<Card>, seed: u64) -> Self {
        Self {
            cards,
            status: MemoryStatus::Playing,
            ..Self::new(seed)
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn status(&self) -> MemoryStatus {
        self.status
    }

    /// A mismatched pair is face up and flips are blocked.
    pub fn is_checking(&self) -> bool {
        self.pending.is_some()
    }

    /// Deals a new deck for `difficulty`.
    pub fn start(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.restart();
    }

    /// Deals a new deck for the current difficulty.
    pub fn restart(&mut self) {
        self.cards = generate_deck(self.difficulty.memory().pairs, &mut self.rng);
        self.reset(MemoryStatus::Playing);
    }

    /// Back to the level menu.
    pub fn go_to_menu(&mut self) {
        self.cards.clear();
        self.reset(MemoryStatus::Idle);
    }

    pub fn flip(&mut self, index: CellCount) -> Result<FlipOutcome> {
        if self.status != MemoryStatus::Playing {
            return Err(GameError::NotPlaying);
        }
        let card = self
            .cards
            .get(usize::from(index))
            .ok_or(GameError::InvalidCoords)?;
        if self.pending.is_some() || !card.is_face_down() {
            return Ok(FlipOutcome::NoChange);
        }

        self.cards[usize::from(index)].is_flipped = true;
        let Some(first) = self.first.take() else {
            self.first = Some(index);
            return Ok(FlipOutcome::FirstFlipped(index));
        };

        self.moves += 1;
        if self.cards[usize::from(first)].value == self.cards[usize::from(index)].value {
            for i in [first, index] {
                self.cards[usize::from(i)].is_matched = true;
            }
            let won = self.cards.iter().all(|card| card.is_matched);
            if won {
                self.status = MemoryStatus::Won;
            }
            Ok(FlipOutcome::Matched {
                first,
                second: index,
                won,
            })
        } else {
            let flip_back = FlipBack {
                generation: self.generation,
                first,
                second: index,
            };
            self.pending = Some(flip_back);
            Ok(FlipOutcome::Mismatched(flip_back))
        }
    }

    /// Turns a mismatched pair face down again; returns `false` if the game moved on meanwhile.
    pub fn settle(&mut self, flip_back: FlipBack) -> bool {
        if self.pending != Some(flip_back) || flip_back.generation != self.generation {
            return false;
        }
        for i in [flip_back.first, flip_back.second] {
            self.cards[usize::from(i)].is_flipped = false;
        }
        self.pending = None;
        true
    }

    fn reset(&mut self, status: MemoryStatus) {
        self.generation += 1;
        self.first = None;
        self.pending = None;
        self.moves = 0;
        self.status = status;
    }
}
