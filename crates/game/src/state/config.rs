use std::time::Duration;

/// Timing and scoring knobs shared by the registry and its rats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerConfig {
    pub discovery_duration: Duration,
    pub liveness_timeout: Duration,

    pub missile_advance_interval: Duration,
    pub state_broadcast_period: Duration,
    pub name_broadcast_period: Duration,
    pub tag_retransmit_interval: Duration,

    pub fire_cost: i32,
    pub tag_penalty: i32,
    pub tag_bonus: i32,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            discovery_duration: Duration::from_secs(5),
            liveness_timeout: Duration::from_secs(10),

            missile_advance_interval: Duration::from_millis(500),
            state_broadcast_period: Duration::from_secs(1),
            name_broadcast_period: Duration::from_secs(5),
            tag_retransmit_interval: Duration::from_millis(500),

            fire_cost: 1,
            tag_penalty: 5,
            tag_bonus: 11,
        }
    }
}
