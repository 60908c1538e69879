use std::time::Duration;

use futures_channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use futures_util::{FutureExt, StreamExt};
use hashbrown::HashMap;
use tilepair_protocol::{ClientMsg, PlayerId, Reply, ServerMsg};

use crate::*;

/// Runs resolution tickets after a delay; the owner feeds them back through [`Hub::fire`].
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, ticket: ResolveTicket);
}

/// Queues tickets until the caller decides time has passed.
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    queue: Vec<(Duration, ResolveTicket)>,
}

impl ManualScheduler {
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Removes every queued ticket in scheduling order.
    pub fn take(&mut self) -> Vec<(Duration, ResolveTicket)> {
        std::mem::take(&mut self.queue)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration, ticket: ResolveTicket) {
        self.queue.push((delay, ticket));
    }
}

/// Routes client requests into the registry and room events out to each player's channel.
pub struct Hub<S> {
    registry: RoomRegistry,
    outbound: HashMap<PlayerId, UnboundedSender<ServerMsg>>,
    scheduler: S,
    resolve_delay: Duration,
    next_player: PlayerId,
}

impl<S: Scheduler> Hub<S> {
    pub fn new(config: &ServerConfig, scheduler: S) -> Self {
        Self {
            registry: RoomRegistry::new(config),
            outbound: HashMap::new(),
            scheduler,
            resolve_delay: config.resolve_delay(),
            next_player: 1,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Registers a new connection and hands back its id and event stream.
    pub fn connect(&mut self) -> (PlayerId, UnboundedReceiver<ServerMsg>) {
        let player = self.next_player;
        self.next_player += 1;
        let (tx, rx) = unbounded();
        self.outbound.insert(player, tx);
        log::debug!("Player {player} connected");
        (player, rx)
    }

    /// Drops the connection, leaving any room the player was in.
    pub fn disconnect(&mut self, player: PlayerId) {
        self.outbound.remove(&player);
        if let Some(envelope) = self.registry.leave(player) {
            self.deliver(envelope);
        }
        log::debug!("Player {player} disconnected");
    }

    /// Handles one client message; requests get a [`Reply`], fire-and-forget messages do not.
    pub fn handle(&mut self, player: PlayerId, msg: ClientMsg) -> Option<Reply> {
        let reply = match msg {
            ClientMsg::CreateRoom { level } => self
                .registry
                .create_room(player, level)
                .map(|joined| self.joined(player, joined)),
            ClientMsg::JoinRoom { room_id } => self
                .registry
                .join_room(player, &room_id)
                .map(|joined| self.joined(player, joined)),
            ClientMsg::RestartRoom => self.registry.restart(player).map(|envelope| {
                self.deliver(envelope);
                Reply::Restarted
            }),
            ClientMsg::LeaveRoom => {
                if let Some(envelope) = self.registry.leave(player) {
                    self.deliver(envelope);
                }
                return None;
            }
            ClientMsg::FlipCard { card_index } => {
                if let Some((envelope, ticket)) = self.registry.flip(player, card_index) {
                    self.deliver(envelope);
                    if let Some(ticket) = ticket {
                        self.scheduler.schedule(self.resolve_delay, ticket);
                    }
                }
                return None;
            }
        };

        Some(reply.unwrap_or_else(|err| {
            log::debug!("Request from player {player} failed: {err}");
            Reply::Error {
                reason: err.to_string(),
            }
        }))
    }

    /// Runs a resolution whose delay has elapsed.
    pub fn fire(&mut self, ticket: &ResolveTicket) {
        for envelope in self.registry.resolve(ticket) {
            self.deliver(envelope);
        }
    }

    fn joined(&mut self, player: PlayerId, joined: Joined) -> Reply {
        if let Some(start) = joined.start {
            self.deliver(start);
        }
        Reply::RoomJoined {
            room_id: joined.room_id,
            player_id: player,
            level: joined.level,
        }
    }

    fn deliver(&mut self, envelope: Envelope) {
        for player in envelope.recipients {
            let Some(tx) = self.outbound.get(&player) else {
                continue;
            };
            if tx.unbounded_send(envelope.msg.clone()).is_err() {
                log::debug!("Player {player} stopped listening, dropping channel");
                self.outbound.remove(&player);
            }
        }
    }
}

impl Hub<ManualScheduler> {
    /// Fires every queued resolution regardless of its delay.
    pub fn fire_all(&mut self) -> usize {
        let tickets = self.scheduler.take();
        for (_, ticket) in &tickets {
            self.fire(ticket);
        }
        tickets.len()
    }
}

/// Collects the events already waiting on a player's stream.
pub fn drain(rx: &mut UnboundedReceiver<ServerMsg>) -> Vec<ServerMsg> {
    let mut msgs = Vec::new();
    while let Some(Some(msg)) = rx.next().now_or_never() {
        msgs.push(msg);
    }
    msgs
}
