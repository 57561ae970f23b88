mod endpoint;
mod posdir;
mod protocol;
mod simulator;
mod stats;
mod tracking;
mod transport;

pub use endpoint::{NetworkEndpoint, UdpSender};
pub use posdir::{NO_MISSILE, pack_missile, pack_posdir, unpack_missile, unpack_posdir};
pub use protocol::{
    DESCRIPTOR_ACK, DESCRIPTOR_LEAVING, DESCRIPTOR_NICKNAME, DESCRIPTOR_STATE, DESCRIPTOR_TAGGED,
    Guid, HEADER_SIZE, NICKNAME_SIZE, PACKET_SIZE, PROTOCOL_VERSION, Packet, PacketError,
    PacketHeader, PacketType, RatState,
};
pub use simulator::LossyTransport;
pub use stats::{NetworkStats, PacketLossSimulation};
pub use tracking::{AckTracker, PendingTag, ReceiveTracker};
pub use transport::{RecordingTransport, Transport};
