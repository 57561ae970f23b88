use std::time::{Duration, Instant};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::entity::Rat;
use crate::event::{EventQueue, LeaveReason, PeerEvent, Phase};
use crate::map::{Direction, Maze, Position};
use crate::net::{Guid, Packet, PacketError, PacketType, RatState, Transport};
use crate::render::{Canvas, Glyph};
use crate::simulation::Clock;

use super::config::PeerConfig;
use super::error::StateError;
use super::index::IndexPool;

const PLACEHOLDER_NAME: &str = "unknown";

/// Every rat this peer knows about, the phase machine, and the dispatch of
/// inbound packets. The host calls [`WorldState::tick`] once per loop pass
/// and [`WorldState::receive_pkt`] for every datagram.
pub struct WorldState {
    phase: Phase,
    phase_elapsed: Duration,
    clock: Clock,
    maze: Maze,
    rats: Vec<Rat>,
    local: Option<Guid>,
    transport: Box<dyn Transport>,
    indices: IndexPool,
    rng: ChaCha8Rng,
    config: PeerConfig,
    events: EventQueue,
    vacated: Vec<Position>,
}

impl WorldState {
    pub fn new(maze: Maze, transport: Box<dyn Transport>, config: PeerConfig, now: Instant) -> Self {
        Self::with_rng(maze, transport, config, now, ChaCha8Rng::from_entropy())
    }

    pub fn with_rng(
        maze: Maze,
        transport: Box<dyn Transport>,
        config: PeerConfig,
        now: Instant,
        rng: ChaCha8Rng,
    ) -> Self {
        Self {
            phase: Phase::Discovery,
            phase_elapsed: Duration::ZERO,
            clock: Clock::new(now),
            maze,
            rats: Vec::new(),
            local: None,
            transport,
            indices: IndexPool::new(),
            rng,
            config,
            events: EventQueue::default(),
            vacated: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn local_guid(&self) -> Option<Guid> {
        self.local
    }

    pub fn local_rat(&self) -> Option<&Rat> {
        self.local.and_then(|guid| self.rat(guid))
    }

    /// Linear scan; a LAN game rarely has more than a handful of rats.
    pub fn rat(&self, guid: Guid) -> Option<&Rat> {
        self.rats.iter().find(|rat| rat.guid() == guid)
    }

    /// Rats in the order they joined.
    pub fn rats(&self) -> &[Rat] {
        &self.rats
    }

    pub fn rat_count(&self) -> usize {
        self.rats.len()
    }

    pub fn score_of(&self, guid: Guid) -> Option<i32> {
        self.rat(guid).map(Rat::score)
    }

    pub fn name_of(&self, guid: Guid) -> Option<&str> {
        self.rat(guid).map(Rat::name)
    }

    pub fn drain_events(&mut self) -> Vec<PeerEvent> {
        self.events.drain().collect()
    }

    /// Creates a rat under a fresh random guid.
    pub fn add_rat(
        &mut self,
        position: Position,
        direction: Direction,
        name: impl Into<String>,
        now: Instant,
    ) -> Guid {
        let mut guid = Guid::random(&mut self.rng);
        while self.rat(guid).is_some() {
            guid = Guid::random(&mut self.rng);
        }
        self.insert_rat(guid, position, direction, name.into(), now);
        guid
    }

    /// Designates the rat this peer drives and announces it right away, so
    /// peers learn about us while still discovering.
    pub fn set_local(&mut self, guid: Guid) -> Result<(), StateError> {
        let slot = self.slot(guid).ok_or(StateError::RatNotFound(guid))?;

        for rat in &mut self.rats {
            rat.set_local(false);
        }

        let rat = &mut self.rats[slot];
        rat.set_local(true);
        rat.broadcast_state(&mut *self.transport);
        rat.broadcast_name(&mut *self.transport);
        self.local = Some(guid);

        log::info!("local rat is {} ({})", guid, rat.name());
        Ok(())
    }

    pub fn tick(&mut self, now: Instant) {
        let delta = self.clock.delta(now);
        self.phase_elapsed += delta;
        for rat in &mut self.rats {
            rat.advance_liveness(delta);
        }

        match self.phase {
            Phase::Discovery => {
                if self.phase_elapsed >= self.config.discovery_duration {
                    self.phase = Phase::Active;
                    self.phase_elapsed = Duration::ZERO;
                    log::info!("discovery over, {} rats known", self.rats.len());
                    self.events.push(PeerEvent::PhaseChanged {
                        phase: Phase::Active,
                    });
                }
            }
            Phase::Active => {
                for rat in &mut self.rats {
                    rat.update(&self.maze, now, &mut *self.transport);
                }
                self.detect_tag();
            }
        }

        self.evict_expired();
    }

    pub fn set_rat_position(
        &mut self,
        guid: Guid,
        position: Position,
        now: Instant,
    ) -> Result<(), StateError> {
        self.require_active()?;
        let slot = self.slot(guid).ok_or(StateError::RatNotFound(guid))?;

        if self.maze.is_wall(position) {
            return Err(StateError::Wall(position));
        }
        if self
            .rats
            .iter()
            .any(|rat| rat.guid() != guid && rat.occupies(position))
        {
            return Err(StateError::CellOccupied(position));
        }

        self.rats[slot].set_position(position, now, &mut *self.transport);
        Ok(())
    }

    pub fn set_rat_direction(
        &mut self,
        guid: Guid,
        direction: Direction,
        now: Instant,
    ) -> Result<(), StateError> {
        self.require_active()?;
        let slot = self.slot(guid).ok_or(StateError::RatNotFound(guid))?;
        self.rats[slot].set_direction(direction, now, &mut *self.transport);
        Ok(())
    }

    pub fn fire_missile(&mut self, guid: Guid, now: Instant) -> Result<(), StateError> {
        self.require_active()?;
        let slot = self.slot(guid).ok_or(StateError::RatNotFound(guid))?;
        self.rats[slot].fire_missile(&self.maze, now, &mut *self.transport)
    }

    pub fn forward(&mut self, now: Instant) -> Result<(), StateError> {
        let rat = self.local_rat().ok_or(StateError::NoLocalRat)?;
        let (guid, target) = (rat.guid(), rat.position().step(rat.direction()));
        self.set_rat_position(guid, target, now)
    }

    pub fn backward(&mut self, now: Instant) -> Result<(), StateError> {
        let rat = self.local_rat().ok_or(StateError::NoLocalRat)?;
        let (guid, target) = (
            rat.guid(),
            rat.position().step(rat.direction().about_face()),
        );
        self.set_rat_position(guid, target, now)
    }

    pub fn turn_left(&mut self, now: Instant) -> Result<(), StateError> {
        self.turn(Direction::left, now)
    }

    pub fn turn_right(&mut self, now: Instant) -> Result<(), StateError> {
        self.turn(Direction::right, now)
    }

    pub fn about_face(&mut self, now: Instant) -> Result<(), StateError> {
        self.turn(Direction::about_face, now)
    }

    pub fn fire(&mut self, now: Instant) -> Result<(), StateError> {
        let guid = self.local.ok_or(StateError::NoLocalRat)?;
        self.fire_missile(guid, now)
    }

    /// Applies one inbound datagram. Our own looped-back packets are
    /// ignored. Undecodable datagrams are returned as errors after logging;
    /// a protocol violation additionally trips a debug assertion.
    pub fn receive_pkt(&mut self, data: &[u8], now: Instant) -> Result<(), PacketError> {
        let packet = match Packet::decode(data) {
            Ok(packet) => packet,
            Err(e) if e.is_protocol_violation() => {
                log::warn!("dropping packet: {}", e);
                debug_assert!(false, "protocol violation: {}", e);
                return Err(e);
            }
            Err(e) => {
                log::debug!("dropping packet: {}", e);
                return Err(e);
            }
        };

        let sender = packet.header.guid;
        if Some(sender) == self.local {
            return Ok(());
        }
        log::debug!("recv {}", packet);

        if let Some(slot) = self.slot(sender) {
            self.rats[slot].touch();
        }

        match packet.payload {
            PacketType::State(state) => self.apply_state(sender, &state, now),
            PacketType::Nickname { name } => self.rename(sender, name),
            PacketType::Tagged { shooter } => {
                if Some(shooter) == self.local {
                    self.credit_tag(sender, packet.header.seqno);
                }
            }
            PacketType::Ack { guid, seqno } => {
                if let Some(slot) = self.slot(guid) {
                    self.rats[slot].process_ack(seqno);
                }
            }
            PacketType::Leaving { guid } => {
                if Some(guid) == self.local {
                    log::warn!("peer {} reported our rat {} as leaving", sender, guid);
                    debug_assert!(false, "LEAVING names the local rat {}", guid);
                    return Ok(());
                }
                if self.remove_rat(guid, LeaveReason::Graceful).is_err() {
                    log::debug!("LEAVING for unknown rat {}", guid);
                }
            }
        }

        Ok(())
    }

    /// Drops a rat from the registry. The local rat announces its departure
    /// on the way out.
    pub fn remove_rat(&mut self, guid: Guid, reason: LeaveReason) -> Result<(), StateError> {
        let slot = self.slot(guid).ok_or(StateError::RatNotFound(guid))?;
        let mut rat = self.rats.remove(slot);

        self.vacated.extend(rat.take_vacated());
        self.vacated.push(rat.wipe_position());
        self.vacated.push(rat.position());
        if let Some(missile) = rat.missile() {
            self.vacated.push(missile.wipe_position());
            self.vacated.push(missile.position());
        }

        if self.local == Some(guid) {
            self.local = None;
        }

        let index = rat.destroy(&mut *self.transport);
        self.indices.release(index);

        log::info!("rat {} {} (slot {})", guid, reason.as_str(), index);
        self.events.push(PeerEvent::RatLeft {
            guid,
            index,
            reason,
        });
        Ok(())
    }

    /// Erases every cell that changed since the last draw.
    pub fn render_wipe(&mut self, canvas: &mut dyn Canvas) {
        for pos in self.vacated.drain(..) {
            canvas.erase(pos);
        }

        for rat in &mut self.rats {
            for pos in rat.take_vacated() {
                canvas.erase(pos);
            }
            if rat.wipe_position() != rat.position() {
                canvas.erase(rat.wipe_position());
            }
            if let Some(missile) = rat.missile() {
                if missile.wipe_position() != missile.position() {
                    canvas.erase(missile.wipe_position());
                }
            }
        }
    }

    pub fn render_draw(&mut self, canvas: &mut dyn Canvas) {
        for rat in &mut self.rats {
            if let Some(missile) = rat.missile() {
                canvas.draw(missile.position(), Glyph::Missile);
            }
            canvas.draw(rat.position(), Glyph::Rat(rat.direction()));
            canvas.score(rat.index(), rat.name(), rat.score());
            rat.settle();
        }
    }

    /// Tears everything down, local rat first so peers hear LEAVING.
    pub fn shutdown(&mut self) {
        if let Some(guid) = self.local {
            let _ = self.remove_rat(guid, LeaveReason::Shutdown);
        }

        let remaining: Vec<Guid> = self.rats.iter().map(Rat::guid).collect();
        for guid in remaining {
            let _ = self.remove_rat(guid, LeaveReason::Shutdown);
        }
    }

    fn slot(&self, guid: Guid) -> Option<usize> {
        self.rats.iter().position(|rat| rat.guid() == guid)
    }

    fn require_active(&self) -> Result<(), StateError> {
        match self.phase {
            Phase::Active => Ok(()),
            Phase::Discovery => Err(StateError::Discovery),
        }
    }

    fn turn(&mut self, turn: fn(Direction) -> Direction, now: Instant) -> Result<(), StateError> {
        let rat = self.local_rat().ok_or(StateError::NoLocalRat)?;
        let (guid, direction) = (rat.guid(), turn(rat.direction()));
        self.set_rat_direction(guid, direction, now)
    }

    fn insert_rat(
        &mut self,
        guid: Guid,
        position: Position,
        direction: Direction,
        name: String,
        now: Instant,
    ) -> usize {
        let index = self.indices.allocate();
        let crt = self.rng.next_u64();
        let rat = Rat::new(guid, index, position, direction, name, crt, self.config, now);

        log::info!("rat {} joined at {} (slot {})", guid, position, index);
        self.rats.push(rat);
        self.events.push(PeerEvent::RatJoined { guid, index });
        index
    }

    fn apply_state(&mut self, sender: Guid, state: &RatState, now: Instant) {
        match self.slot(sender) {
            Some(slot) => self.rats[slot].apply_state(state, now),
            None => {
                self.insert_rat(
                    sender,
                    state.position,
                    state.direction,
                    PLACEHOLDER_NAME.to_string(),
                    now,
                );
                if let Some(rat) = self.rats.last_mut() {
                    rat.apply_state(state, now);
                }
            }
        }
    }

    fn rename(&mut self, guid: Guid, name: String) {
        let Some(slot) = self.slot(guid) else {
            return;
        };

        let rat = &mut self.rats[slot];
        if rat.name() != name {
            rat.set_name(name.clone());
            self.events.push(PeerEvent::Renamed { guid, name });
        }
    }

    fn credit_tag(&mut self, taggee: Guid, seqno: u64) {
        let Some(slot) = self.local.and_then(|guid| self.slot(guid)) else {
            return;
        };

        if self.rats[slot].process_tag(taggee, seqno, &mut *self.transport) {
            self.events.push(PeerEvent::TagConfirmed { victim: taggee });
        }
    }

    /// Only the local rat can be tagged here; peers judge hits on their own
    /// rats from the missiles we report.
    fn detect_tag(&mut self) {
        let Some(slot) = self.local.and_then(|guid| self.slot(guid)) else {
            return;
        };
        let victim = self.rats[slot].position();

        let shooter = self.rats.iter().find(|rat| {
            !rat.is_local() && rat.missile().is_some_and(|missile| missile.occupies(victim))
        });
        let Some(shooter) = shooter.map(Rat::guid) else {
            return;
        };

        let rats = &self.rats;
        let respawn = self.maze.random_open_cell(&mut self.rng, |pos| {
            rats.iter().any(|rat| {
                rat.occupies(pos) || rat.missile().is_some_and(|missile| missile.occupies(pos))
            })
        });
        let Some(respawn) = respawn else {
            log::warn!("no free cell to respawn after tag from {}", shooter);
            return;
        };
        let facing = self.maze.facing_open(respawn);

        match self.rats[slot].tagged_by(shooter, respawn, facing, &mut *self.transport) {
            Ok(_) => self.events.push(PeerEvent::Tagged { shooter }),
            Err(e) => log::warn!("could not apply tag from {}: {}", shooter, e),
        }
    }

    fn evict_expired(&mut self) {
        let expired: Vec<Guid> = self
            .rats
            .iter()
            .filter(|rat| rat.is_expired())
            .map(Rat::guid)
            .collect();

        for guid in expired {
            let _ = self.remove_rat(guid, LeaveReason::Timeout);
        }
    }
}
