use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;
use tilepair_core::{Card, CellCount, Difficulty, generate_deck};
use tilepair_protocol::{Player, PlayerId, RoomSnapshot, ServerMsg};

use crate::{Result, RoomError};

pub const MAX_PLAYERS: usize = 2;

/// Events produced by a single room transition, in broadcast order.
pub type Events = SmallVec<[ServerMsg; 2]>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Host alone, no deck dealt yet.
    Waiting,
    Active,
    Over,
}

/// Request to decide a face-up pair once the reveal delay has passed.
///
/// Names the room by code so the room is looked up again when it fires. Room codes are reused
/// once a room is discarded, so the ticket also carries the epoch of the room that issued it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolveTicket {
    pub room_id: String,
    epoch: u64,
    generation: u64,
}

/// Why a flip request was dropped.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum FlipRejection {
    #[error("game is not running")]
    NotActive,
    #[error("previous pair is still being resolved")]
    Resolving,
    #[error("not this player's turn")]
    NotYourTurn,
    #[error("no card at that index")]
    NoSuchCard,
    #[error("card is already face up")]
    FaceUp,
}

/// Accepted flip: the broadcast event and, for the second card, the pending resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flipped {
    pub event: ServerMsg,
    pub resolve: Option<ResolveTicket>,
}

/// Two-player Memory room; the server holds the only authoritative copy.
#[derive(Clone, Debug)]
pub struct Room {
    id: String,
    level: Difficulty,
    players: SmallVec<[Player; MAX_PLAYERS]>,
    cards: Vec<Card>,
    current_turn: PlayerId,
    matched_pairs: CellCount,
    total_pairs: CellCount,
    first: Option<CellCount>,
    second: Option<CellCount>,
    phase: Phase,
    winner: Option<PlayerId>,
    /// Unique per room within a registry, never reused for a later room with the same code.
    epoch: u64,
    generation: u64,
}

impl Room {
    pub fn new(id: String, level: Difficulty, host: PlayerId, epoch: u64) -> Self {
        let mut players = SmallVec::new();
        players.push(Player {
            id: host,
            name: "Player 1".into(),
            score: 0,
        });
        Self {
            id,
            level,
            players,
            cards: Vec::new(),
            current_turn: host,
            matched_pairs: 0,
            total_pairs: level.memory().pairs,
            first: None,
            second: None,
            phase: Phase::Waiting,
            winner: None,
            epoch,
            generation: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn level(&self) -> Difficulty {
        self.level
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_ids(&self) -> SmallVec<[PlayerId; MAX_PLAYERS]> {
        self.players.iter().map(|player| player.id).collect()
    }

    pub fn host(&self) -> Option<PlayerId> {
        self.players.first().map(|player| player.id)
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

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// A second card is face up and no flips are accepted until it is resolved.
    pub fn is_resolving(&self) -> bool {
        self.second.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.id.clone(),
            level: self.level,
            cols: self.level.memory().cols,
            players: self.players.to_vec(),
            cards: self.cards.clone(),
            current_turn: self.current_turn,
            total_pairs: self.total_pairs,
        }
    }

    /// Seats a second player and deals the game.
    pub fn join<R: Rng + ?Sized>(&mut self, player: PlayerId, rng: &mut R) -> Result<RoomSnapshot> {
        if self.players.len() >= MAX_PLAYERS {
            return Err(RoomError::Full);
        }
        if self.players.iter().any(|p| p.id == player) {
            return Err(RoomError::AlreadyInRoom);
        }
        self.players.push(Player {
            id: player,
            name: format!("Player {}", self.players.len() + 1),
            score: 0,
        });
        Ok(self.deal(rng))
    }

    /// New deck and zeroed scores; only the host may restart, and only with an opponent seated.
    pub fn restart<R: Rng + ?Sized>(&mut self, player: PlayerId, rng: &mut R) -> Result<RoomSnapshot> {
        if self.host() != Some(player) {
            return Err(RoomError::NotHost);
        }
        if self.players.len() < MAX_PLAYERS {
            return Err(RoomError::WaitingForOpponent);
        }
        Ok(self.deal(rng))
    }

    pub fn flip(&mut self, player: PlayerId, index: CellCount) -> std::result::Result<Flipped, FlipRejection> {
        if self.phase != Phase::Active {
            return Err(FlipRejection::NotActive);
        }
        if self.is_resolving() {
            return Err(FlipRejection::Resolving);
        }
        if self.current_turn != player {
            return Err(FlipRejection::NotYourTurn);
        }
        let card = self
            .cards
            .get_mut(usize::from(index))
            .ok_or(FlipRejection::NoSuchCard)?;
        if card.is_flipped || card.is_matched {
            return Err(FlipRejection::FaceUp);
        }
        card.is_flipped = true;

        let is_first = self.first.is_none();
        let resolve = if is_first {
            self.first = Some(index);
            None
        } else {
            // blocks further flips before anyone hears about this one
            self.second = Some(index);
            Some(ResolveTicket {
                room_id: self.id.clone(),
                epoch: self.epoch,
                generation: self.generation,
            })
        };

        Ok(Flipped {
            event: ServerMsg::CardFlipped {
                card_index: index,
                player_id: player,
                is_first,
            },
            resolve,
        })
    }

    /// Decides the face-up pair; returns no events if the ticket no longer applies.
    pub fn resolve(&mut self, ticket: &ResolveTicket) -> Events {
        let mut events = Events::new();
        let issued_here = ticket.room_id == self.id
            && ticket.epoch == self.epoch
            && ticket.generation == self.generation;
        if !issued_here || self.phase != Phase::Active {
            return events;
        }
        let (Some(first), Some(second)) = (self.first.take(), self.second.take()) else {
            return events;
        };

        let actor = self.current_turn;
        let card_indices = [first, second];
        let (a, b) = (usize::from(first), usize::from(second));

        if self.cards[a].value == self.cards[b].value {
            for i in [a, b] {
                self.cards[i].is_matched = true;
            }
            self.matched_pairs += 1;
            let Some(scorer) = self.players.iter_mut().find(|p| p.id == actor) else {
                return events;
            };
            scorer.score += 1;
            let (score, winner_name) = (scorer.score, scorer.name.clone());

            events.push(ServerMsg::MatchResult {
                matched: true,
                card_indices,
                player_id: actor,
                score: Some(score),
            });
            if self.matched_pairs >= self.total_pairs {
                self.phase = Phase::Over;
                self.winner = Some(actor);
                log::info!("Room {} won by player {actor}", self.id);
                events.push(ServerMsg::GameOver {
                    winner_id: actor,
                    winner_name,
                });
            }
        } else {
            for i in [a, b] {
                self.cards[i].is_flipped = false;
            }
            if let Some(other) = self.players.iter().find(|p| p.id != actor) {
                self.current_turn = other.id;
            }
            events.push(ServerMsg::MatchResult {
                matched: false,
                card_indices,
                player_id: actor,
                score: None,
            });
            events.push(ServerMsg::TurnChange {
                current_turn: self.current_turn,
            });
        }
        events
    }

    /// Removes `player`; an opponent left behind in a running game wins by forfeit.
    pub fn leave(&mut self, player: PlayerId) -> Option<ServerMsg> {
        let index = self.players.iter().position(|p| p.id == player)?;
        self.players.remove(index);
        self.generation += 1;
        self.first = None;
        self.second = None;

        let remaining = self.players.first()?.id;
        if self.phase == Phase::Over {
            return None;
        }
        self.phase = Phase::Over;
        self.winner = Some(remaining);
        self.current_turn = remaining;
        Some(ServerMsg::PlayerDisconnected {
            disconnected_id: player,
            winner_id: remaining,
        })
    }

    fn deal<R: Rng + ?Sized>(&mut self, rng: &mut R) -> RoomSnapshot {
        self.cards = generate_deck(self.total_pairs, rng);
        self.reset();
        self.snapshot()
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.matched_pairs = 0;
        self.first = None;
        self.second = None;
        self.winner = None;
        self.phase = Phase::Active;
        if let Some(host) = self.host() {
            self.current_turn = host;
        }
        for player in &mut self.players {
            player.score = 0;
        }
    }

    #[cfg(test)]
    pub(crate) fn with_deck(id: &str, host: PlayerId, guest: PlayerId, values: &[CellCount]) -> Self {
        let mut room = Self::new(id.into(), Difficulty::Easy, host, 0);
        room.players.push(Player {
            id: guest,
            name: "Player 2".into(),
            score: 0,
        });
        room.total_pairs = (values.len() / 2) as CellCount;
        room.cards = values
            .iter()
            .enumerate()
            .map(|(index, &value)| Card {
                id: index as u64,
                value,
                index: index as CellCount,
                is_flipped: false,
                is_matched: false,
            })
            .collect();
        room.reset();
        room
    }
}
