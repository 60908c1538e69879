use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use rand::prelude::*;
use tilepair_core::*;
use tilepair_protocol::{ClientMsg, GameEnd, PlayerId, Reply, RoomView, ServerMsg, decode, encode};
use tilepair_server::{Hub, ManualScheduler, ServerConfig, drain};

#[derive(Parser, Debug)]
#[command(version, about = "Headless bots for the tile matching games", long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Clear an Onet board by following hints
    Onet {
        #[arg(short, long, default_value_t = Difficulty::Easy)]
        difficulty: Difficulty,
    },
    /// Play single-player Memory with a bot that remembers every card it saw
    Memory {
        #[arg(short, long, default_value_t = Difficulty::Easy)]
        difficulty: Difficulty,
    },
    /// Two bots playing a multiplayer room through the hub
    Room {
        #[arg(short, long, default_value_t = Difficulty::Easy)]
        difficulty: Difficulty,

        /// Server config in TOML
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    log::debug!("seed: {seed}");

    match args.mode {
        Mode::Onet { difficulty } => play_onet(difficulty, seed),
        Mode::Memory { difficulty } => play_memory(difficulty, seed),
        Mode::Room { difficulty, config } => {
            let mut config = match config {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?
                    .parse()?,
                None => ServerConfig::default(),
            };
            config.seed.get_or_insert(seed);
            play_room(difficulty, &config, seed)
        }
    }
}

fn play_onet(difficulty: Difficulty, seed: u64) -> anyhow::Result<()> {
    let mut engine = OnetEngine::new(difficulty, seed);
    let mut reshuffles = 0;

    while engine.status() == GameStatus::Playing {
        let Some(hint) = engine.hint() else {
            bail!("no move offered on a playing board");
        };
        engine.select(hint.a)?;
        let outcome = engine.select(hint.b)?;
        if let SelectOutcome::Matched { path, follow_up, .. } = outcome {
            log::debug!("{:?} - {:?} via {:?}", hint.a, hint.b, path.corners());
            if let FollowUp::Reshuffle(continuation) = follow_up {
                reshuffles += 1;
                log::info!("Dead end, reshuffling: {:?}", engine.settle(continuation));
            }
        }
        engine.tick();
    }

    println!(
        "onet {difficulty}: {:?}, score {}, {} pairs, {reshuffles} reshuffles, {}s left",
        engine.status(),
        engine.score(),
        engine.matches(),
        engine.time_remaining()
    );
    Ok(())
}

fn play_memory(difficulty: Difficulty, seed: u64) -> anyhow::Result<()> {
    let mut engine = MemoryEngine::new(seed);
    engine.start(difficulty);
    let mut rng = SmallRng::seed_from_u64(seed ^ 0x6d65_6d6f);
    let mut seen: Vec<Option<CellCount>> = vec![None; engine.cards().len()];

    while engine.status() == MemoryStatus::Playing {
        let first =
            pick(engine.cards(), &seen, None, &mut rng).context("no face-down card left")?;
        engine.flip(first)?;
        seen[usize::from(first)] = Some(engine.cards()[usize::from(first)].value);

        let second =
            pick(engine.cards(), &seen, Some(first), &mut rng).context("no partner card left")?;
        let outcome = engine.flip(second)?;
        seen[usize::from(second)] = Some(engine.cards()[usize::from(second)].value);
        if let FlipOutcome::Mismatched(flip_back) = outcome {
            engine.settle(flip_back);
        }
    }

    println!("memory {difficulty}: won in {} moves", engine.moves());
    Ok(())
}

/// Partner of `first` if one was seen already, otherwise a random unseen card.
fn pick(
    cards: &[Card],
    seen: &[Option<CellCount>],
    first: Option<CellCount>,
    rng: &mut SmallRng,
) -> Option<CellCount> {
    let face_down = || cards.iter().filter(|card| card.is_face_down()).map(|card| card.index);
    let remembered = |value: CellCount| {
        face_down().find(|&i| Some(i) != first && seen[usize::from(i)] == Some(value))
    };

    match first {
        Some(first) => remembered(cards[usize::from(first)].value),
        None => face_down().find(|&i| {
            seen[usize::from(i)].is_some_and(|value| {
                face_down().any(|j| j != i && seen[usize::from(j)] == Some(value))
            })
        }),
    }
    .or_else(|| {
        let unseen: Vec<CellCount> = face_down()
            .filter(|&i| seen[usize::from(i)].is_none())
            .collect();
        unseen.choose(rng).copied()
    })
    .or_else(|| face_down().find(|&i| Some(i) != first))
}

/// Remote player that only knows what the server told it.
struct Bot {
    id: PlayerId,
    rx: futures_channel::mpsc::UnboundedReceiver<ServerMsg>,
    view: RoomView,
}

impl Bot {
    fn absorb(&mut self) -> anyhow::Result<()> {
        for msg in drain(&mut self.rx) {
            // go through the wire format like a remote client would
            let msg = decode::<ServerMsg>(&encode(&msg)?)?;
            if !self.view.apply(&msg) {
                bail!("player {} got an event for unknown cards: {msg:?}", self.id);
            }
        }
        Ok(())
    }
}

fn play_room(difficulty: Difficulty, config: &ServerConfig, seed: u64) -> anyhow::Result<()> {
    let mut hub = Hub::new(config, ManualScheduler::default());
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut bots = Vec::new();
    for _ in 0..2 {
        let (id, rx) = hub.connect();
        bots.push(Bot {
            id,
            rx,
            view: RoomView::new(id),
        });
    }

    let reply = hub.handle(bots[0].id, ClientMsg::CreateRoom { level: difficulty });
    let Some(Reply::RoomJoined { room_id, .. }) = reply else {
        bail!("room not created: {reply:?}");
    };
    let reply = hub.handle(bots[1].id, ClientMsg::JoinRoom { room_id: room_id.clone() });
    if !matches!(reply, Some(Reply::RoomJoined { .. })) {
        bail!("could not join {room_id}: {reply:?}");
    }
    log::info!("Room {room_id} started");

    let mut turns = 0;
    loop {
        for bot in &mut bots {
            bot.absorb()?;
        }
        if bots.iter().any(|bot| bot.view.is_over()) {
            break;
        }
        turns += 1;

        let current = bots
            .iter()
            .find(|bot| bot.view.is_my_turn())
            .context("nobody holds the turn")?;
        let face_down: Vec<CellCount> = current
            .view
            .face_down()
            .filter(|&i| current.view.can_flip(i))
            .collect();
        let picks: Vec<CellCount> = face_down.choose_multiple(&mut rng, 2).copied().collect();
        let player = current.id;
        for card_index in picks {
            hub.handle(player, ClientMsg::FlipCard { card_index });
        }
        hub.fire_all();
    }

    let view = &bots[0].view;
    match view.end() {
        Some(GameEnd::Won { winner_name, .. }) => log::info!("{winner_name} wins"),
        Some(GameEnd::Forfeit { winner_id, .. }) => {
            log::info!("Opponent left, player {winner_id} wins")
        }
        None => {}
    }
    for player in view.players() {
        println!("{}: {} pairs", player.name, player.score);
    }
    println!("room {room_id} over after {turns} turns");
    for bot in &bots {
        hub.handle(bot.id, ClientMsg::LeaveRoom);
    }
    Ok(())
}
