use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use crate::simulation::Countdown;

use super::protocol::{Guid, PACKET_SIZE};

/// A TAGGED packet waiting for the shooter's ACK. The encoded bytes are kept
/// so every retransmission carries the original seqno.
#[derive(Debug, Clone)]
pub struct PendingTag {
    pub seqno: u64,
    pub shooter: Guid,
    pub packet: [u8; PACKET_SIZE],
    retransmit: Countdown,
}

/// Outbound tags awaiting acknowledgement.
#[derive(Debug)]
pub struct AckTracker {
    pending: VecDeque<PendingTag>,
    retransmit_interval: Duration,
}

impl AckTracker {
    pub fn new(retransmit_interval: Duration) -> Self {
        Self {
            pending: VecDeque::new(),
            retransmit_interval,
        }
    }

    pub fn track_packet(&mut self, seqno: u64, shooter: Guid, packet: [u8; PACKET_SIZE]) {
        self.pending.push_back(PendingTag {
            seqno,
            shooter,
            packet,
            retransmit: Countdown::new(self.retransmit_interval),
        });
    }

    /// Drops the entry for `seqno`. Returns false for a duplicate or late
    /// ACK that matches nothing.
    pub fn process_ack(&mut self, seqno: u64) -> bool {
        match self.pending.iter().position(|p| p.seqno == seqno) {
            Some(idx) => {
                self.pending.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Advances every retransmit timer and returns the packets whose timer
    /// lapsed, rearming them.
    pub fn due(&mut self, delta: Duration) -> Vec<[u8; PACKET_SIZE]> {
        self.pending
            .iter_mut()
            .filter_map(|p| p.retransmit.poll(delta).then_some(p.packet))
            .collect()
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingTag> {
        self.pending.iter()
    }

    pub fn unacked_count(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Tags this rat has already been credited for, keyed by the taggee and
/// the seqno of its TAGGED packet.
#[derive(Debug, Default)]
pub struct ReceiveTracker {
    acked: HashSet<(Guid, u64)>,
}

impl ReceiveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if this tag was seen before.
    pub fn record_received(&mut self, taggee: Guid, seqno: u64) -> bool {
        self.acked.insert((taggee, seqno))
    }

    pub fn len(&self) -> usize {
        self.acked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acked.is_empty()
    }

    pub fn clear(&mut self) {
        self.acked.clear();
    }
}
