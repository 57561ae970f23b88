use std::time::{Duration, Instant};

use crate::map::{Direction, Maze, Position};
use crate::net::{
    AckTracker, Guid, PACKET_SIZE, Packet, PacketHeader, PacketType, RatState, ReceiveTracker,
    Transport,
};
use crate::simulation::{Clock, Countdown};
use crate::state::{PeerConfig, StateError};

use super::missile::Missile;

/// One player in the maze. Only the local rat drives timers and sends
/// packets on its own; remote rats mirror what their owners report.
#[derive(Debug)]
pub struct Rat {
    guid: Guid,
    index: usize,
    name: String,
    position: Position,
    direction: Direction,
    wipe: Position,
    score: i32,
    missile: Option<Missile>,
    is_local: bool,
    seqno: u64,
    crt: u64,
    config: PeerConfig,
    clock: Clock,
    state_timer: Countdown,
    name_timer: Countdown,
    liveness: Countdown,
    outbound_tags: AckTracker,
    credited_tags: ReceiveTracker,
    vacated: Vec<Position>,
}

impl Rat {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        guid: Guid,
        index: usize,
        position: Position,
        direction: Direction,
        name: impl Into<String>,
        crt: u64,
        config: PeerConfig,
        now: Instant,
    ) -> Self {
        Self {
            guid,
            index,
            name: name.into(),
            position,
            direction,
            wipe: position,
            score: 0,
            missile: None,
            is_local: false,
            seqno: 0,
            crt,
            config,
            clock: Clock::new(now),
            state_timer: Countdown::new(config.state_broadcast_period),
            name_timer: Countdown::new(config.name_broadcast_period),
            liveness: Countdown::new(config.liveness_timeout),
            outbound_tags: AckTracker::new(config.tag_retransmit_interval),
            credited_tags: ReceiveTracker::new(),
            vacated: Vec::new(),
        }
    }

    pub fn guid(&self) -> Guid {
        self.guid
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn wipe_position(&self) -> Position {
        self.wipe
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn missile(&self) -> Option<&Missile> {
        self.missile.as_ref()
    }

    pub fn is_local(&self) -> bool {
        self.is_local
    }

    pub(crate) fn set_local(&mut self, is_local: bool) {
        self.is_local = is_local;
    }

    pub fn unacked_tags(&self) -> usize {
        self.outbound_tags.unacked_count()
    }

    pub fn credited_tags(&self) -> usize {
        self.credited_tags.len()
    }

    pub fn occupies(&self, pos: Position) -> bool {
        self.position == pos
    }

    pub fn state(&self) -> RatState {
        RatState {
            position: self.position,
            direction: self.direction,
            missile: self.missile.as_ref().map(Missile::posdir),
            score: self.score,
            crt: self.crt,
        }
    }

    pub fn set_position(&mut self, position: Position, now: Instant, tx: &mut dyn Transport) {
        self.move_to(position);
        if self.is_local {
            self.catch_up(now, tx);
            self.broadcast_state(tx);
        }
    }

    pub fn set_direction(&mut self, direction: Direction, now: Instant, tx: &mut dyn Transport) {
        self.direction = direction;
        if self.is_local {
            self.catch_up(now, tx);
            self.broadcast_state(tx);
        }
    }

    pub fn fire_missile(
        &mut self,
        maze: &Maze,
        now: Instant,
        tx: &mut dyn Transport,
    ) -> Result<(), StateError> {
        if self.missile.is_some() {
            return Err(StateError::MissileInFlight);
        }

        let ahead = self.position.step(self.direction);
        if maze.is_wall(ahead) {
            return Err(StateError::FireBlocked);
        }

        self.missile = Some(Missile::new(
            ahead,
            self.direction,
            self.config.missile_advance_interval,
            now,
        ));
        self.score -= self.config.fire_cost;
        log::debug!("rat {} fired from {} toward {:?}", self.guid, ahead, self.direction);

        if self.is_local {
            self.catch_up(now, tx);
            self.broadcast_state(tx);
        }
        Ok(())
    }

    /// Drives the missile, the broadcast timers and tag retransmission.
    /// Every missile step is broadcast so peers see each cell it crosses.
    /// Remote rats only keep their clock current.
    pub fn update(&mut self, maze: &Maze, now: Instant, tx: &mut dyn Transport) {
        self.catch_up(now, tx);
        if !self.is_local {
            return;
        }

        let (moved, impact) = match &mut self.missile {
            Some(missile) => {
                let moved = missile.update(now);
                (moved, maze.is_wall(missile.position()).then(|| missile.position()))
            }
            None => (false, None),
        };
        if let Some(cell) = impact {
            log::debug!("missile of rat {} hit the wall at {}", self.guid, cell);
            self.drop_missile();
        }

        if moved || impact.is_some() || self.state_timer.lapsed() {
            self.broadcast_state(tx);
        }

        if self.name_timer.lapsed() {
            self.broadcast_name(tx);
        }
    }

    /// The local rat was hit by `tagger`'s missile: pay the penalty, respawn
    /// at `position`, and tell the shooter until it acknowledges.
    pub fn tagged_by(
        &mut self,
        tagger: Guid,
        position: Position,
        direction: Direction,
        tx: &mut dyn Transport,
    ) -> Result<u64, StateError> {
        if !self.is_local {
            return Err(StateError::NotLocal(self.guid));
        }

        self.score -= self.config.tag_penalty;
        self.move_to(position);
        self.direction = direction;
        self.broadcast_state(tx);

        let (seqno, data) = self.send(tx, PacketType::Tagged { shooter: tagger });
        self.outbound_tags.track_packet(seqno, tagger, data);
        log::info!("tagged by {}, respawned at {}", tagger, position);
        Ok(seqno)
    }

    /// `taggee` reports our missile hit it. Credits the bonus once per
    /// TAGGED packet and acknowledges every copy. Returns whether the bonus
    /// was awarded.
    pub fn process_tag(&mut self, taggee: Guid, seqno: u64, tx: &mut dyn Transport) -> bool {
        let fresh = self.credited_tags.record_received(taggee, seqno);

        if fresh {
            self.score += self.config.tag_bonus;
            // Assumes the missile in flight is the one that scored.
            self.drop_missile();
            self.broadcast_state(tx);
            log::info!("tagged {} (seqno {})", taggee, seqno);
        } else {
            log::debug!("duplicate TAGGED from {} seqno {}", taggee, seqno);
        }

        self.send(tx, PacketType::Ack { guid: taggee, seqno });
        fresh
    }

    pub fn process_ack(&mut self, seqno: u64) -> bool {
        let matched = self.outbound_tags.process_ack(seqno);
        if !matched {
            log::debug!("ignoring stale ACK for seqno {} on rat {}", seqno, self.guid);
        }
        matched
    }

    /// Mirrors a peer's STATE report. Last writer wins.
    pub fn apply_state(&mut self, state: &RatState, now: Instant) {
        self.move_to(state.position);
        self.direction = state.direction;
        self.score = state.score;
        self.crt = state.crt;

        match (state.missile, &mut self.missile) {
            (None, _) => self.drop_missile(),
            (Some((pos, dir)), Some(missile)) => missile.set_posdir(pos, dir),
            (Some((pos, dir)), None) => {
                self.missile = Some(Missile::new(pos, dir, self.config.missile_advance_interval, now));
            }
        }
    }

    pub fn broadcast_state(&mut self, tx: &mut dyn Transport) {
        let state = self.state();
        self.send(tx, PacketType::State(state));
        self.state_timer.reset();
    }

    pub fn broadcast_name(&mut self, tx: &mut dyn Transport) {
        let name = self.name.clone();
        self.send(tx, PacketType::Nickname { name });
        self.name_timer.reset();
    }

    pub fn touch(&mut self) {
        self.liveness.reset();
    }

    pub fn advance_liveness(&mut self, delta: Duration) {
        self.liveness.advance(delta);
    }

    pub fn is_expired(&self) -> bool {
        !self.is_local && self.liveness.lapsed()
    }

    /// Cells this rat's entities have left since the last call, for erasing.
    pub(crate) fn take_vacated(&mut self) -> Vec<Position> {
        std::mem::take(&mut self.vacated)
    }

    /// Marks the current cells as drawn.
    pub(crate) fn settle(&mut self) {
        self.wipe = self.position;
        if let Some(missile) = &mut self.missile {
            missile.settle();
        }
    }

    /// Tears the rat down, announcing the departure if it is ours, and hands
    /// back its display index.
    pub fn destroy(mut self, tx: &mut dyn Transport) -> usize {
        if self.is_local {
            let guid = self.guid;
            self.send(tx, PacketType::Leaving { guid });
        }

        self.outbound_tags.clear();
        self.credited_tags.clear();
        self.index
    }

    /// Brings the broadcast and retransmit timers up to `now`, resending
    /// any tag whose retransmit interval lapsed.
    fn catch_up(&mut self, now: Instant, tx: &mut dyn Transport) {
        let delta = self.clock.delta(now);
        self.state_timer.advance(delta);
        self.name_timer.advance(delta);

        for data in self.outbound_tags.due(delta) {
            log::debug!("retransmitting TAGGED from rat {}", self.guid);
            transmit(tx, &data);
        }
    }

    fn move_to(&mut self, position: Position) {
        if position != self.position {
            self.wipe = self.position;
            self.position = position;
        }
    }

    fn drop_missile(&mut self) {
        if let Some(missile) = self.missile.take() {
            self.vacated.push(missile.position());
            if missile.wipe_position() != missile.position() {
                self.vacated.push(missile.wipe_position());
            }
        }
    }

    fn send(&mut self, tx: &mut dyn Transport, payload: PacketType) -> (u64, [u8; PACKET_SIZE]) {
        let seqno = self.seqno;
        self.seqno += 1;

        let packet = Packet::new(PacketHeader::new(self.guid, seqno), payload);
        log::debug!("send {}", packet);

        let data = packet.encode();
        transmit(tx, &data);
        (seqno, data)
    }
}

fn transmit(tx: &mut dyn Transport, data: &[u8]) {
    if let Err(e) = tx.send(data) {
        log::warn!("multicast send failed: {}", e);
    }
}
