use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use mazewar::{Direction, Maze, NetworkEndpoint, PeerConfig, PeerEvent, Position, WorldState};

static PORT_COUNTER: AtomicU16 = AtomicU16::new(41000);

fn next_port() -> u16 {
    PORT_COUNTER.fetch_add(10, Ordering::SeqCst)
}

/// Feeds everything that arrives within `timeout_ms` into `world`.
fn pump(endpoint: &mut NetworkEndpoint, world: &mut WorldState, timeout_ms: u64) -> usize {
    let start = Instant::now();
    let mut delivered = 0;
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        for (data, _) in endpoint.receive().unwrap() {
            world.receive_pkt(&data, Instant::now()).unwrap();
            delivered += 1;
        }
        if delivered > 0 {
            return delivered;
        }
        thread::sleep(Duration::from_millis(1));
    }
    delivered
}

#[test]
fn two_peers_discover_each_other_over_udp() {
    let port = next_port();
    let a_addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
    let b_addr: SocketAddr = format!("127.0.0.1:{}", port + 1).parse().unwrap();

    let mut a_endpoint = NetworkEndpoint::bind(a_addr).unwrap();
    let mut b_endpoint = NetworkEndpoint::bind(b_addr).unwrap();

    let now = Instant::now();
    let mut a = WorldState::new(
        Maze::open(8, 8),
        Box::new(a_endpoint.sender_to(b_addr).unwrap()),
        PeerConfig::default(),
        now,
    );
    let mut b = WorldState::new(
        Maze::open(8, 8),
        Box::new(b_endpoint.sender_to(a_addr).unwrap()),
        PeerConfig::default(),
        now,
    );

    let alice = a.add_rat(Position::new(1, 1), Direction::North, "alice", now);
    a.set_local(alice).unwrap();
    let bob = b.add_rat(Position::new(6, 6), Direction::West, "bob", now);
    b.set_local(bob).unwrap();

    // STATE and NICKNAME may arrive in separate receive passes.
    while b.name_of(alice) != Some("alice") {
        assert!(pump(&mut b_endpoint, &mut b, 500) > 0, "no packet from alice");
    }
    while a.name_of(bob) != Some("bob") {
        assert!(pump(&mut a_endpoint, &mut a, 500) > 0, "no packet from bob");
    }

    assert_eq!(b.rat(alice).unwrap().position(), Position::new(1, 1));
    assert_eq!(a.rat(bob).unwrap().direction(), Direction::West);
    assert!(!b.rat(alice).unwrap().is_local());
    assert!(a_endpoint.stats().packets_received >= 2);

    a.shutdown();
    b.drain_events();
    while b.rat(alice).is_some() {
        assert!(pump(&mut b_endpoint, &mut b, 500) > 0, "no LEAVING from alice");
    }
    assert!(b.drain_events().iter().any(|e| matches!(
        e,
        PeerEvent::RatLeft { guid, .. } if *guid == alice
    )));
}

#[test]
fn short_datagrams_are_skipped() {
    let port = next_port();
    let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
    let mut endpoint = NetworkEndpoint::bind(addr).unwrap();

    let noise = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    noise.send_to(b"hello", addr).unwrap();
    thread::sleep(Duration::from_millis(20));

    assert!(endpoint.receive().unwrap().is_empty());
    assert_eq!(endpoint.stats().packets_received, 0);
}
