use hashbrown::HashMap;
use rand::prelude::*;
use smallvec::SmallVec;
use tilepair_core::{CellCount, Difficulty};
use tilepair_protocol::{
    PlayerId, ROOM_ID_ALPHABET, ROOM_ID_LEN, ServerMsg, normalize_room_id, room_id_from_indices,
};

use crate::*;

/// A message and the players it goes to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub recipients: SmallVec<[PlayerId; MAX_PLAYERS]>,
    pub msg: ServerMsg,
}

/// Room a player just entered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Joined {
    pub room_id: String,
    pub level: Difficulty,
    /// `GameStart` for everyone in the room, present once the second player is seated.
    pub start: Option<Envelope>,
}

/// Every live room, addressed by code, plus which room each player sits in.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    seats: HashMap<PlayerId, String>,
    rng: SmallRng,
    room_id_attempts: u32,
    next_epoch: u64,
}

impl RoomRegistry {
    pub fn new(config: &ServerConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        log::debug!("Room registry seed: {seed}");
        Self {
            rooms: HashMap::new(),
            seats: HashMap::new(),
            rng: SmallRng::seed_from_u64(seed),
            room_id_attempts: config.room_id_attempts,
            next_epoch: 0,
        }
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn room_of(&self, player: PlayerId) -> Option<&Room> {
        self.seats.get(&player).and_then(|id| self.rooms.get(id))
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn create_room(&mut self, player: PlayerId, level: Difficulty) -> Result<Joined> {
        if self.seats.contains_key(&player) {
            return Err(RoomError::AlreadyInRoom);
        }
        let room_id = self.unused_room_id()?;
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        log::info!("Room {room_id} created by player {player}, level {level}");

        self.rooms
            .insert(room_id.clone(), Room::new(room_id.clone(), level, player, epoch));
        self.seats.insert(player, room_id.clone());
        Ok(Joined {
            room_id,
            level,
            start: None,
        })
    }

    pub fn join_room(&mut self, player: PlayerId, room_id: &str) -> Result<Joined> {
        let room_id = normalize_room_id(room_id).ok_or(RoomError::InvalidRoomId)?;
        if self.seats.contains_key(&player) {
            return Err(RoomError::AlreadyInRoom);
        }
        let room = self.rooms.get_mut(&room_id).ok_or(RoomError::NotFound)?;

        let snapshot = room.join(player, &mut self.rng)?;
        log::info!("Player {player} joined room {room_id}");
        let start = Envelope {
            recipients: room.player_ids(),
            msg: ServerMsg::GameStart(snapshot),
        };
        let level = room.level();
        self.seats.insert(player, room_id.clone());
        Ok(Joined {
            room_id,
            level,
            start: Some(start),
        })
    }

    pub fn restart(&mut self, player: PlayerId) -> Result<Envelope> {
        let room_id = self.seats.get(&player).ok_or(RoomError::NotInRoom)?;
        let room = self.rooms.get_mut(room_id).ok_or(RoomError::NotFound)?;
        let snapshot = room.restart(player, &mut self.rng)?;
        log::info!("Room {} restarted", room.id());
        Ok(Envelope {
            recipients: room.player_ids(),
            msg: ServerMsg::GameStart(snapshot),
        })
    }

    /// Takes `player` out of their room, discarding the room once nobody is left.
    pub fn leave(&mut self, player: PlayerId) -> Option<Envelope> {
        let room_id = self.seats.remove(&player)?;
        let room = self.rooms.get_mut(&room_id)?;
        let event = room.leave(player);
        log::info!("Player {player} left room {room_id}");

        if room.is_empty() {
            self.rooms.remove(&room_id);
            log::info!("Room {room_id} discarded");
            return None;
        }
        event.map(|msg| Envelope {
            recipients: room.player_ids(),
            msg,
        })
    }

    /// Applies a flip request; rejected requests are dropped without an answer.
    pub fn flip(&mut self, player: PlayerId, index: CellCount) -> Option<(Envelope, Option<ResolveTicket>)> {
        let room = self.seated_room_mut(player).ok()?;
        match room.flip(player, index) {
            Ok(flipped) => Some((
                Envelope {
                    recipients: room.player_ids(),
                    msg: flipped.event,
                },
                flipped.resolve,
            )),
            Err(reason) => {
                log::debug!("Dropped flip of card {index} by player {player} in room {}: {reason}", room.id());
                None
            }
        }
    }

    /// Resolves a pending pair, looking the room up again by code.
    pub fn resolve(&mut self, ticket: &ResolveTicket) -> SmallVec<[Envelope; 2]> {
        let Some(room) = self.rooms.get_mut(&ticket.room_id) else {
            log::debug!("Resolution for vanished room {}", ticket.room_id);
            return SmallVec::new();
        };
        let recipients = room.player_ids();
        room.resolve(ticket)
            .into_iter()
            .map(|msg| Envelope {
                recipients: recipients.clone(),
                msg,
            })
            .collect()
    }

    fn seated_room_mut(&mut self, player: PlayerId) -> Result<&mut Room> {
        let room_id = self.seats.get(&player).ok_or(RoomError::NotInRoom)?;
        self.rooms.get_mut(room_id).ok_or(RoomError::NotFound)
    }

    fn unused_room_id(&mut self) -> Result<String> {
        for _ in 0..self.room_id_attempts {
            let mut indices = [0u8; ROOM_ID_LEN];
            for index in &mut indices {
                *index = self.rng.random_range(0..ROOM_ID_ALPHABET.len() as u8);
            }
            let room_id = room_id_from_indices(indices);
            if !self.rooms.contains_key(&room_id) {
                return Ok(room_id);
            }
        }
        log::warn!("No free room code after {} attempts", self.room_id_attempts);
        Err(RoomError::NoRoomIdsLeft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilepair_protocol::is_valid_room_id;

    fn registry() -> RoomRegistry {
        RoomRegistry::new(&ServerConfig {
            seed: Some(42),
            ..ServerConfig::default()
        })
    }

    #[test]
    fn create_and_join_starts_game_for_both() {
        let mut registry = registry();

        let created = registry.create_room(1, Difficulty::Easy).unwrap();
        assert!(is_valid_room_id(&created.room_id));
        assert_eq!(created.start, None);

        let joined = registry
            .join_room(2, &created.room_id.to_lowercase())
            .unwrap();
        let start = joined.start.unwrap();

        assert_eq!(joined.room_id, created.room_id);
        assert_eq!(start.recipients.as_slice(), &[1, 2]);
        let ServerMsg::GameStart(snapshot) = start.msg else {
            panic!("expected game start");
        };
        assert_eq!(snapshot.current_turn, 1);
        assert_eq!(snapshot.cards.len(), 8);
        assert_eq!(registry.room_of(2).map(Room::phase), Some(Phase::Active));
    }

    #[test]
    fn join_errors_are_reported() {
        let mut registry = registry();
        let room_id = registry.create_room(1, Difficulty::Easy).unwrap().room_id;
        registry.join_room(2, &room_id).unwrap();

        assert_eq!(registry.join_room(3, "??"), Err(RoomError::InvalidRoomId));
        assert_eq!(registry.join_room(3, &room_id), Err(RoomError::Full));
        assert_eq!(registry.join_room(1, &room_id), Err(RoomError::AlreadyInRoom));
        assert_eq!(registry.create_room(2, Difficulty::Hard), Err(RoomError::AlreadyInRoom));
        let missing = if room_id == "ZZZZ" { "YYYY" } else { "ZZZZ" };
        assert_eq!(registry.join_room(3, missing), Err(RoomError::NotFound));
        assert_eq!(registry.restart(3), Err(RoomError::NotInRoom));
        assert_eq!(registry.restart(2), Err(RoomError::NotHost));
    }

    #[test]
    fn room_codes_run_out_when_attempts_do() {
        let mut registry = RoomRegistry::new(&ServerConfig {
            seed: Some(1),
            room_id_attempts: 0,
            ..ServerConfig::default()
        });

        assert_eq!(registry.create_room(1, Difficulty::Easy), Err(RoomError::NoRoomIdsLeft));
        assert!(registry.is_empty());
    }

    #[test]
    fn leaving_forfeits_then_discards_room() {
        let mut registry = registry();
        let room_id = registry.create_room(1, Difficulty::Easy).unwrap().room_id;
        registry.join_room(2, &room_id).unwrap();

        let forfeit = registry.leave(2).unwrap();
        assert_eq!(forfeit.recipients.as_slice(), &[1]);
        assert_eq!(
            forfeit.msg,
            ServerMsg::PlayerDisconnected {
                disconnected_id: 2,
                winner_id: 1
            }
        );
        assert_eq!(registry.len(), 1);

        assert_eq!(registry.leave(1), None);
        assert!(registry.room(&room_id).is_none());
        assert_eq!(registry.leave(1), None);
    }

    #[test]
    fn resolution_for_discarded_room_is_a_no_op() {
        let mut registry = registry();
        let room_id = registry.create_room(1, Difficulty::Easy).unwrap().room_id;
        registry.join_room(2, &room_id).unwrap();
        registry.flip(1, 0).unwrap();
        let (_, ticket) = registry.flip(1, 1).unwrap();
        let ticket = ticket.unwrap();

        registry.leave(1);
        registry.leave(2);

        assert!(registry.resolve(&ticket).is_empty());
    }

    #[test]
    fn flips_out_of_turn_are_dropped() {
        let mut registry = registry();
        let room_id = registry.create_room(1, Difficulty::Easy).unwrap().room_id;

        assert_eq!(registry.flip(1, 0), None);
        registry.join_room(2, &room_id).unwrap();
        assert_eq!(registry.flip(2, 0), None);
        assert_eq!(registry.flip(3, 0), None);

        let (envelope, ticket) = registry.flip(1, 0).unwrap();
        assert_eq!(envelope.recipients.as_slice(), &[1, 2]);
        assert_eq!(ticket, None);
    }
}
