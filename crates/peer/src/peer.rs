use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use mazewar::{
    Canvas, Guid, LossyTransport, Maze, NetworkEndpoint, NetworkStats, PeerEvent, Phase,
    StateError, Transport, WorldState,
};

use crate::config::HostConfig;

const AUTOPILOT_PERIOD: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    AboutFace,
    Fire,
}

/// One player's process: the multicast socket, the registry and whatever
/// drives the local rat.
pub struct MazePeer {
    endpoint: NetworkEndpoint,
    world: WorldState,
    local: Guid,
    autopilot: Option<Autopilot>,
    running: Arc<AtomicBool>,
    started: Instant,
}

impl MazePeer {
    pub fn new(config: &HostConfig) -> Result<Self> {
        let mut endpoint = NetworkEndpoint::bind(("0.0.0.0", config.port))
            .with_context(|| format!("binding UDP port {}", config.port))?;
        endpoint
            .join_multicast(config.group, config.ttl)
            .with_context(|| format!("joining multicast group {}", config.group))?;

        let sender = endpoint.group_sender(config.group)?;
        let transport: Box<dyn Transport> = match &config.packet_loss {
            Some(sim) => Box::new(LossyTransport::new(sender, sim.clone())),
            None => Box::new(sender),
        };

        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let maze = Maze::bordered(config.maze_width, config.maze_height);
        let spawn = maze
            .random_open_cell(&mut rng, |_| false)
            .context("maze has no open cell to spawn in")?;
        let facing = maze.facing_open(spawn);

        let now = Instant::now();
        let world_rng = ChaCha8Rng::seed_from_u64(rng.next_u64());
        let mut world = WorldState::with_rng(maze, transport, config.peer, now, world_rng);
        let local = world.add_rat(spawn, facing, config.name.clone(), now);
        world.set_local(local)?;

        let autopilot = config.autopilot.then(|| Autopilot::new(rng));

        Ok(Self {
            running: endpoint.running(),
            endpoint,
            world,
            local,
            autopilot,
            started: now,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.endpoint.local_addr()
    }

    pub fn local_guid(&self) -> Guid {
        self.local
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn stats(&self) -> NetworkStats {
        self.endpoint.stats()
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn drain_events(&mut self) -> Vec<PeerEvent> {
        self.world.drain_events()
    }

    pub fn run(&mut self) {
        while self.running.load(Ordering::SeqCst) {
            self.tick_once();
            for event in self.world.drain_events() {
                log_event(&event);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        self.shutdown();
    }

    pub fn tick_once(&mut self) {
        let now = Instant::now();

        match self.endpoint.receive() {
            Ok(datagrams) => {
                for (data, from) in datagrams {
                    if let Err(e) = self.world.receive_pkt(&data, now) {
                        log::debug!("bad datagram from {}: {}", from, e);
                    }
                }
            }
            Err(e) => log::warn!("receive failed: {}", e),
        }

        self.world.tick(now);

        if self.world.phase() == Phase::Active {
            if let Some(command) = self.autopilot.as_mut().and_then(|a| a.next(now)) {
                if let Err(e) = self.command(command) {
                    log::trace!("autopilot {:?} rejected: {}", command, e);
                }
            }
        }
    }

    pub fn command(&mut self, command: Command) -> Result<(), StateError> {
        let now = Instant::now();
        match command {
            Command::Forward => self.world.forward(now),
            Command::Backward => self.world.backward(now),
            Command::TurnLeft => self.world.turn_left(now),
            Command::TurnRight => self.world.turn_right(now),
            Command::AboutFace => self.world.about_face(now),
            Command::Fire => self.world.fire(now),
        }
    }

    pub fn render(&mut self, canvas: &mut dyn Canvas) {
        self.world.render_wipe(canvas);
        self.world.render_draw(canvas);
    }

    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.world.shutdown();
    }
}

/// Wanders forward, turning at walls and firing now and then.
struct Autopilot {
    rng: ChaCha8Rng,
    last_move: Option<Instant>,
}

impl Autopilot {
    fn new(rng: ChaCha8Rng) -> Self {
        Self {
            rng,
            last_move: None,
        }
    }

    fn next(&mut self, now: Instant) -> Option<Command> {
        if let Some(last) = self.last_move {
            if now.duration_since(last) < AUTOPILOT_PERIOD {
                return None;
            }
        }
        self.last_move = Some(now);

        let command = match self.rng.gen_range(0..10) {
            0 => Command::TurnLeft,
            1 => Command::TurnRight,
            2 | 3 => Command::Fire,
            _ => Command::Forward,
        };
        Some(command)
    }
}

pub fn describe_event(event: &PeerEvent) -> String {
    match event {
        PeerEvent::PhaseChanged { phase } => format!("Phase is now {:?}", phase),
        PeerEvent::RatJoined { guid, index } => format!("Rat {} joined (slot {})", guid, index),
        PeerEvent::RatLeft {
            guid,
            index,
            reason,
        } => format!("Rat {} {} (slot {})", guid, reason.as_str(), index),
        PeerEvent::Renamed { guid, name } => format!("Rat {} is now {}", guid, name),
        PeerEvent::Tagged { shooter } => format!("Tagged by {}", shooter),
        PeerEvent::TagConfirmed { victim } => format!("Hit {}", victim),
    }
}

fn log_event(event: &PeerEvent) {
    log::info!("{}", describe_event(event));
}
