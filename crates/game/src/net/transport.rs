use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use super::protocol::Packet;

/// Outbound half of the multicast channel. Delivery is best effort.
pub trait Transport {
    fn send(&mut self, data: &[u8]) -> io::Result<usize>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).send(data)
    }
}

/// Keeps every datagram handed to it. Clones share the same log, so a
/// caller can hand one clone to a registry and read the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sent.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.borrow().is_empty()
    }

    pub fn take(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.sent.borrow_mut())
    }

    /// Drains the log, decoding each datagram. Undecodable entries are
    /// skipped.
    pub fn take_packets(&self) -> Vec<Packet> {
        self.take()
            .iter()
            .filter_map(|data| Packet::decode(data).ok())
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        self.sent.borrow_mut().push(data.to_vec());
        Ok(data.len())
    }
}
