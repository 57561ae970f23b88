pub mod entity;
pub mod event;
pub mod map;
pub mod net;
pub mod render;
pub mod simulation;
pub mod state;

pub use entity::{Missile, Rat};
pub use event::{EventQueue, LeaveReason, PeerEvent, Phase};
pub use map::{Direction, Maze, Position};
pub use net::{
    Guid, LossyTransport, NetworkEndpoint, NetworkStats, Packet, PacketError, PacketHeader,
    PacketLossSimulation, PacketType, RatState, RecordingTransport, Transport, UdpSender,
};
pub use render::{Canvas, Glyph};
pub use simulation::{Clock, Countdown};
pub use state::{PeerConfig, StateError, WorldState};
