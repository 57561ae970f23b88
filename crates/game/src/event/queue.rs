use std::collections::VecDeque;

use super::types::PeerEvent;

#[derive(Debug)]
pub struct EventQueue {
    pending: VecDeque<PeerEvent>,
    max_pending: usize,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventQueue {
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(max_pending),
            max_pending,
        }
    }

    /// Queues an event, discarding the oldest one when the host has not
    /// drained in a while.
    pub fn push(&mut self, event: PeerEvent) {
        if self.pending.len() >= self.max_pending {
            self.pending.pop_front();
        }
        self.pending.push_back(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = PeerEvent> + '_ {
        self.pending.drain(..)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
