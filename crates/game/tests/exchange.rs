use std::time::{Duration, Instant};

use mazewar::{
    Direction, Guid, LeaveReason, Maze, Packet, PacketHeader, PacketType, PeerConfig, PeerEvent,
    Phase, Position, RatState, RecordingTransport, WorldState,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

struct Peer {
    world: WorldState,
    tx: RecordingTransport,
    guid: Guid,
}

impl Peer {
    fn new(name: &str, pos: Position, dir: Direction, seed: u64, now: Instant) -> Self {
        let tx = RecordingTransport::new();
        let mut world = WorldState::with_rng(
            Maze::open(8, 8),
            Box::new(tx.clone()),
            PeerConfig::default(),
            now,
            ChaCha8Rng::seed_from_u64(seed),
        );
        let guid = world.add_rat(pos, dir, name, now);
        world.set_local(guid).unwrap();
        Self { world, tx, guid }
    }

    /// Delivers everything this peer has sent to `other`.
    fn relay_to(&self, other: &mut Peer, now: Instant) {
        for data in self.tx.take() {
            other.world.receive_pkt(&data, now).unwrap();
        }
    }
}

#[test]
fn tag_round_trip_between_two_registries() {
    let start = Instant::now();
    let mut alice = Peer::new("alice", Position::new(1, 1), Direction::North, 1, start);
    let mut bob = Peer::new("bob", Position::new(3, 1), Direction::South, 2, start);

    alice.relay_to(&mut bob, start);
    bob.relay_to(&mut alice, start);
    assert_eq!(alice.world.name_of(bob.guid), Some("bob"));
    assert_eq!(bob.world.name_of(alice.guid), Some("alice"));

    let t = start + Duration::from_secs(5);
    alice.world.tick(t);
    bob.world.tick(t);

    bob.world.fire_missile(bob.guid, t).unwrap();
    bob.relay_to(&mut alice, t);
    let mirrored = alice.world.rat(bob.guid).unwrap().missile().unwrap();
    assert_eq!(mirrored.position(), Position::new(2, 1));

    // Bob's missile steps onto alice and the step is broadcast.
    let t = t + Duration::from_millis(500);
    bob.world.tick(t);
    bob.relay_to(&mut alice, t);
    alice.world.drain_events();
    alice.world.tick(t);

    assert_eq!(
        alice.world.drain_events(),
        vec![PeerEvent::Tagged { shooter: bob.guid }]
    );
    assert_eq!(alice.world.score_of(alice.guid), Some(-5));
    assert_eq!(alice.world.local_rat().unwrap().unacked_tags(), 1);

    alice.relay_to(&mut bob, t);
    assert_eq!(bob.world.score_of(bob.guid), Some(-1 + 11));
    assert!(bob.world.local_rat().unwrap().missile().is_none());
    assert!(
        bob.world
            .drain_events()
            .contains(&PeerEvent::TagConfirmed { victim: alice.guid })
    );

    bob.relay_to(&mut alice, t);
    assert_eq!(alice.world.local_rat().unwrap().unacked_tags(), 0);
    assert_eq!(alice.world.score_of(bob.guid), Some(10));
    assert!(alice.world.rat(bob.guid).unwrap().missile().is_none());
}

#[test]
fn missile_is_seen_on_every_cell_it_crosses() {
    let start = Instant::now();
    let mut alice = Peer::new("alice", Position::new(1, 1), Direction::North, 7, start);
    let mut bob = Peer::new("bob", Position::new(5, 1), Direction::South, 8, start);
    alice.relay_to(&mut bob, start);
    bob.relay_to(&mut alice, start);

    let step = Duration::from_millis(50);
    let mut t = start + Duration::from_secs(5);
    for _ in 0..2 {
        alice.world.tick(t);
        bob.world.tick(t);
        alice.relay_to(&mut bob, t);
        bob.relay_to(&mut alice, t);
        t += step;
    }
    alice.world.drain_events();

    bob.world.fire_missile(bob.guid, t).unwrap();
    bob.relay_to(&mut alice, t);

    let mut seen = Vec::new();
    let mut events = Vec::new();
    let end = t + Duration::from_secs(4);
    while t < end {
        t += step;
        bob.world.tick(t);
        bob.relay_to(&mut alice, t);
        if let Some(missile) = alice.world.rat(bob.guid).and_then(|rat| rat.missile()) {
            if seen.last() != Some(&missile.position()) {
                seen.push(missile.position());
            }
        }
        alice.world.tick(t);
        events.extend(alice.world.drain_events());
        alice.relay_to(&mut bob, t);
    }

    assert_eq!(
        seen,
        vec![
            Position::new(4, 1),
            Position::new(3, 1),
            Position::new(2, 1),
            Position::new(1, 1),
        ]
    );
    assert!(events.contains(&PeerEvent::Tagged { shooter: bob.guid }));
    assert_eq!(bob.world.score_of(bob.guid), Some(-1 + 11));
}

#[test]
fn lost_ack_means_tag_is_resent_and_never_double_credited() {
    let start = Instant::now();
    let interval = PeerConfig::default().tag_retransmit_interval;
    let mut alice = Peer::new("alice", Position::new(1, 1), Direction::North, 3, start);
    let mut bob = Peer::new("bob", Position::new(3, 1), Direction::South, 4, start);
    alice.relay_to(&mut bob, start);
    bob.relay_to(&mut alice, start);

    let t = start + Duration::from_secs(5);
    alice.world.tick(t);
    bob.world.tick(t);
    bob.world.fire_missile(bob.guid, t).unwrap();

    let t = t + interval;
    bob.world.tick(t);
    bob.relay_to(&mut alice, t);
    alice.world.tick(t);
    assert_eq!(alice.world.local_rat().unwrap().unacked_tags(), 1);

    // Every ACK bob sends is lost.
    let mut t = t;
    for _ in 0..3 {
        alice.relay_to(&mut bob, t);
        bob.tx.take();
        t += interval;
        alice.world.tick(t);
    }
    alice.relay_to(&mut bob, t);

    assert_eq!(bob.world.score_of(bob.guid), Some(-1 + 11));
    assert_eq!(bob.world.local_rat().unwrap().credited_tags(), 1);

    let replies = bob.tx.take();
    let acks = replies
        .iter()
        .filter_map(|data| Packet::decode(data).ok())
        .filter(|p| matches!(p.payload, PacketType::Ack { guid, .. } if guid == alice.guid))
        .count();
    assert_eq!(acks, 1);

    for data in replies {
        alice.world.receive_pkt(&data, t).unwrap();
    }
    t += interval;
    alice.tx.take();
    alice.world.tick(t);
    assert_eq!(alice.world.local_rat().unwrap().unacked_tags(), 0);
    assert!(
        alice
            .tx
            .take_packets()
            .iter()
            .all(|p| !matches!(p.payload, PacketType::Tagged { .. }))
    );
}

#[test]
fn silent_peer_is_evicted_and_its_slot_reused() {
    let start = Instant::now();
    let mut alice = Peer::new("alice", Position::new(1, 1), Direction::North, 5, start);
    let bob = Peer::new("bob", Position::new(3, 1), Direction::South, 6, start);
    bob.relay_to(&mut alice, start);
    assert_eq!(alice.world.rat(bob.guid).unwrap().index(), 1);
    alice.world.drain_events();

    alice.world.tick(start + Duration::from_secs(10));
    assert!(alice.world.rat(bob.guid).is_none());
    assert_eq!(
        alice.world.drain_events(),
        vec![
            PeerEvent::PhaseChanged {
                phase: Phase::Active
            },
            PeerEvent::RatLeft {
                guid: bob.guid,
                index: 1,
                reason: LeaveReason::Timeout
            }
        ]
    );

    let carol = Guid(0xca501);
    let state = Packet::new(
        PacketHeader::new(carol, 0),
        PacketType::State(RatState {
            position: Position::new(5, 5),
            direction: Direction::East,
            missile: None,
            score: 3,
            crt: 0,
        }),
    );
    alice
        .world
        .receive_pkt(&state.encode(), start + Duration::from_secs(11))
        .unwrap();

    assert_eq!(alice.world.rat(carol).unwrap().index(), 1);
    assert_eq!(alice.world.score_of(carol), Some(3));
    assert_eq!(alice.world.rat_count(), 2);
}
