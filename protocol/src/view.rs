use serde::{Deserialize, Serialize};
use tilepair_core::{Card, CellCount, Coord, Difficulty};

use crate::*;

/// How a finished game ended, as seen by a client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum GameEnd {
    /// The last pair was matched.
    Won {
        winner_id: PlayerId,
        winner_name: String,
    },
    /// The opponent left mid-game.
    Forfeit {
        disconnected_id: PlayerId,
        winner_id: PlayerId,
    },
}

impl GameEnd {
    pub fn winner_id(&self) -> PlayerId {
        match self {
            Self::Won { winner_id, .. } | Self::Forfeit { winner_id, .. } => *winner_id,
        }
    }
}

/// A client's copy of its room, kept up to date from [`ServerMsg`] broadcasts.
///
/// The server stays authoritative; this only mirrors what it announced and answers whether a
/// flip is worth sending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomView {
    me: PlayerId,
    room_id: Option<String>,
    level: Difficulty,
    cols: Coord,
    players: Vec<Player>,
    cards: Vec<Card>,
    current_turn: PlayerId,
    total_pairs: CellCount,
    matched_pairs: CellCount,
    checking: bool,
    end: Option<GameEnd>,
}

impl RoomView {
    /// View for player `me` before any game has started.
    pub fn new(me: PlayerId) -> Self {
        Self {
            me,
            room_id: None,
            level: Difficulty::default(),
            cols: 0,
            players: Vec::new(),
            cards: Vec::new(),
            current_turn: 0,
            total_pairs: 0,
            matched_pairs: 0,
            checking: false,
            end: None,
        }
    }

    pub fn me(&self) -> PlayerId {
        self.me
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn level(&self) -> Difficulty {
        self.level
    }

    pub fn cols(&self) -> Coord {
        self.cols
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn current_turn(&self) -> PlayerId {
        self.current_turn
    }

    pub fn matched_pairs(&self) -> CellCount {
        self.matched_pairs
    }

    pub fn total_pairs(&self) -> CellCount {
        self.total_pairs
    }

    pub fn score_of(&self, player: PlayerId) -> Option<u32> {
        self.players.iter().find(|p| p.id == player).map(|p| p.score)
    }

    pub fn end(&self) -> Option<&GameEnd> {
        self.end.as_ref()
    }

    pub fn is_started(&self) -> bool {
        self.room_id.is_some()
    }

    pub fn is_over(&self) -> bool {
        self.end.is_some()
    }

    pub fn is_my_turn(&self) -> bool {
        self.is_started() && !self.is_over() && self.current_turn == self.me
    }

    /// Whether the server would accept a flip of `index` from this player right now.
    pub fn can_flip(&self, index: CellCount) -> bool {
        self.is_my_turn()
            && !self.checking
            && self
                .cards
                .get(usize::from(index))
                .is_some_and(Card::is_face_down)
    }

    /// Face-down cards, in board order.
    pub fn face_down(&self) -> impl Iterator<Item = CellCount> + '_ {
        self.cards
            .iter()
            .filter(|card| card.is_face_down())
            .map(|card| card.index)
    }

    /// Folds one broadcast into the view; returns `false` if it referenced cards the view does
    /// not have and was ignored.
    pub fn apply(&mut self, msg: &ServerMsg) -> bool {
        match msg {
            ServerMsg::GameStart(snapshot) => {
                self.room_id = Some(snapshot.room_id.clone());
                self.level = snapshot.level;
                self.cols = snapshot.cols;
                self.players = snapshot.players.clone();
                self.cards = snapshot.cards.clone();
                self.current_turn = snapshot.current_turn;
                self.total_pairs = snapshot.total_pairs;
                self.matched_pairs = (self.cards.iter().filter(|card| card.is_matched).count() / 2)
                    as CellCount;
                self.checking = false;
                self.end = None;
            }
            ServerMsg::CardFlipped {
                card_index,
                is_first,
                ..
            } => {
                let Some(card) = self.cards.get_mut(usize::from(*card_index)) else {
                    return false;
                };
                card.is_flipped = true;
                self.checking = !is_first;
            }
            ServerMsg::MatchResult {
                matched,
                card_indices,
                player_id,
                score,
            } => {
                if card_indices
                    .iter()
                    .any(|&i| usize::from(i) >= self.cards.len())
                {
                    return false;
                }
                for &i in card_indices {
                    let card = &mut self.cards[usize::from(i)];
                    card.is_matched = *matched;
                    card.is_flipped = *matched;
                }
                if *matched {
                    self.matched_pairs += 1;
                    if let Some(player) = self.players.iter_mut().find(|p| p.id == *player_id) {
                        player.score = score.unwrap_or(player.score + 1);
                    }
                }
                self.checking = false;
            }
            ServerMsg::TurnChange { current_turn } => self.current_turn = *current_turn,
            ServerMsg::GameOver {
                winner_id,
                winner_name,
            } => {
                self.end = Some(GameEnd::Won {
                    winner_id: *winner_id,
                    winner_name: winner_name.clone(),
                });
            }
            ServerMsg::PlayerDisconnected {
                disconnected_id,
                winner_id,
            } => {
                self.checking = false;
                self.end = Some(GameEnd::Forfeit {
                    disconnected_id: *disconnected_id,
                    winner_id: *winner_id,
                });
            }
        }
        true
    }
}
