use rand::Rng;

#[derive(Debug, Clone, Default)]
pub struct PacketLossSimulation {
    pub enabled: bool,
    /// Chance of dropping each outbound datagram, 0 to 100.
    pub loss_percent: f32,
}

impl PacketLossSimulation {
    pub fn new(loss_percent: f32) -> Self {
        Self {
            enabled: true,
            loss_percent: loss_percent.clamp(0.0, 100.0),
        }
    }

    pub fn should_drop<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        if !self.enabled || self.loss_percent <= 0.0 {
            return false;
        }
        rng.gen_range(0.0..100.0) < self.loss_percent
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub packets_dropped: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn disabled_never_drops() {
        let sim = PacketLossSimulation::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!((0..100).all(|_| !sim.should_drop(&mut rng)));
    }

    #[test]
    fn full_loss_always_drops() {
        let sim = PacketLossSimulation::new(250.0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(sim.loss_percent, 100.0);
        assert!((0..100).all(|_| sim.should_drop(&mut rng)));
    }
}
