use std::io;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::stats::{NetworkStats, PacketLossSimulation};
use super::transport::Transport;

/// Wraps a transport and randomly discards outbound datagrams, for
/// exercising tag retransmission on a healthy network.
#[derive(Debug)]
pub struct LossyTransport<T> {
    inner: T,
    sim: PacketLossSimulation,
    rng: ChaCha8Rng,
    stats: NetworkStats,
}

impl<T: Transport> LossyTransport<T> {
    pub fn new(inner: T, sim: PacketLossSimulation) -> Self {
        Self::with_rng(inner, sim, ChaCha8Rng::from_entropy())
    }

    pub fn with_rng(inner: T, sim: PacketLossSimulation, rng: ChaCha8Rng) -> Self {
        Self {
            inner,
            sim,
            rng,
            stats: NetworkStats::default(),
        }
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }
}

impl<T: Transport> Transport for LossyTransport<T> {
    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.sim.should_drop(&mut self.rng) {
            self.stats.packets_dropped += 1;
            log::trace!("simulated loss of {} byte datagram", data.len());
            return Ok(data.len());
        }

        let bytes = self.inner.send(data)?;
        self.stats.packets_sent += 1;
        self.stats.bytes_sent += bytes as u64;
        Ok(bytes)
    }
}
