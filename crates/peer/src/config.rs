use std::net::Ipv4Addr;

use mazewar::{PacketLossSimulation, PeerConfig};

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub group: Ipv4Addr,
    pub port: u16,
    pub ttl: u32,
    pub name: String,
    pub maze_width: u16,
    pub maze_height: u16,
    pub seed: Option<u64>,
    pub autopilot: bool,
    pub packet_loss: Option<PacketLossSimulation>,
    pub peer: PeerConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            group: Ipv4Addr::new(224, 1, 1, 1),
            port: 5001,
            ttl: 1,
            name: String::from("rat"),
            maze_width: 24,
            maze_height: 32,
            seed: None,
            autopilot: false,
            packet_loss: None,
            peer: PeerConfig::default(),
        }
    }
}
