use std::fmt;

use rand::RngCore;

use crate::map::{Direction, Position};

use super::posdir::{pack_missile, pack_posdir, unpack_missile, unpack_posdir};

pub const PROTOCOL_VERSION: u32 = 1;
pub const PACKET_SIZE: usize = 64;
pub const HEADER_SIZE: usize = 20;
pub const NICKNAME_SIZE: usize = 32;

pub const DESCRIPTOR_STATE: u8 = 0;
pub const DESCRIPTOR_NICKNAME: u8 = 1;
pub const DESCRIPTOR_TAGGED: u8 = 2;
pub const DESCRIPTOR_ACK: u8 = 3;
pub const DESCRIPTOR_LEAVING: u8 = 4;

const GUID_OFFSET: usize = 4;
const SEQNO_OFFSET: usize = 12;

/// 64-bit peer identity carried in every packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Guid(pub u64);

impl Guid {
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        Self(rng.next_u64())
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub guid: Guid,
    pub seqno: u64,
}

impl PacketHeader {
    pub fn new(guid: Guid, seqno: u64) -> Self {
        Self { guid, seqno }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatState {
    pub position: Position,
    pub direction: Direction,
    pub missile: Option<(Position, Direction)>,
    pub score: i32,
    /// Collision-resolution token. Carried on the wire, unused by the core.
    pub crt: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketType {
    State(RatState),
    Nickname { name: String },
    Tagged { shooter: Guid },
    Ack { guid: Guid, seqno: u64 },
    Leaving { guid: Guid },
}

impl PacketType {
    pub fn descriptor(&self) -> u8 {
        match self {
            Self::State(_) => DESCRIPTOR_STATE,
            Self::Nickname { .. } => DESCRIPTOR_NICKNAME,
            Self::Tagged { .. } => DESCRIPTOR_TAGGED,
            Self::Ack { .. } => DESCRIPTOR_ACK,
            Self::Leaving { .. } => DESCRIPTOR_LEAVING,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::State(_) => "STATE",
            Self::Nickname { .. } => "NICKNAME",
            Self::Tagged { .. } => "TAGGED",
            Self::Ack { .. } => "ACK",
            Self::Leaving { .. } => "LEAVING",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: PacketType,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    #[error("packet is {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },
    #[error("unknown packet descriptor {0:#04x}")]
    UnknownDescriptor(u8),
}

impl PacketError {
    /// A well-sized datagram that no conforming peer could have produced.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::UnknownDescriptor(_))
    }
}

impl Packet {
    pub fn new(header: PacketHeader, payload: PacketType) -> Self {
        Self { header, payload }
    }

    /// Lays the packet out in network byte order, zero padded to
    /// [`PACKET_SIZE`].
    pub fn encode(&self) -> [u8; PACKET_SIZE] {
        let mut buf = [0u8; PACKET_SIZE];
        buf[0] = self.payload.descriptor();
        put_u64(&mut buf, GUID_OFFSET, self.header.guid.0);
        put_u64(&mut buf, SEQNO_OFFSET, self.header.seqno);

        let body = HEADER_SIZE;
        match &self.payload {
            PacketType::State(state) => {
                put_u32(&mut buf, body, pack_posdir(state.position, state.direction));
                put_u32(&mut buf, body + 4, pack_missile(state.missile));
                put_u32(&mut buf, body + 8, state.score as u32);
                put_u64(&mut buf, body + 12, state.crt);
            }
            PacketType::Nickname { name } => {
                let bytes = truncate_name(name);
                buf[body..body + bytes.len()].copy_from_slice(bytes);
            }
            PacketType::Tagged { shooter } => {
                put_u64(&mut buf, body, shooter.0);
            }
            PacketType::Ack { guid, seqno } => {
                put_u64(&mut buf, body, guid.0);
                put_u64(&mut buf, body + 8, *seqno);
            }
            PacketType::Leaving { guid } => {
                put_u64(&mut buf, body, guid.0);
            }
        }

        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() != PACKET_SIZE {
            return Err(PacketError::Length {
                expected: PACKET_SIZE,
                actual: data.len(),
            });
        }

        let header = PacketHeader {
            guid: Guid(get_u64(data, GUID_OFFSET)),
            seqno: get_u64(data, SEQNO_OFFSET),
        };

        let body = HEADER_SIZE;
        let payload = match data[0] {
            DESCRIPTOR_STATE => {
                let (position, direction) = unpack_posdir(get_u32(data, body));
                PacketType::State(RatState {
                    position,
                    direction,
                    missile: unpack_missile(get_u32(data, body + 4)),
                    score: get_u32(data, body + 8) as i32,
                    crt: get_u64(data, body + 12),
                })
            }
            DESCRIPTOR_NICKNAME => {
                let raw = &data[body..body + NICKNAME_SIZE];
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                PacketType::Nickname {
                    name: String::from_utf8_lossy(&raw[..end]).into_owned(),
                }
            }
            DESCRIPTOR_TAGGED => PacketType::Tagged {
                shooter: Guid(get_u64(data, body)),
            },
            DESCRIPTOR_ACK => PacketType::Ack {
                guid: Guid(get_u64(data, body)),
                seqno: get_u64(data, body + 8),
            },
            DESCRIPTOR_LEAVING => PacketType::Leaving {
                guid: Guid(get_u64(data, body)),
            },
            other => return Err(PacketError::UnknownDescriptor(other)),
        };

        Ok(Self { header, payload })
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} guid={} seqno={}",
            self.payload.kind(),
            self.header.guid,
            self.header.seqno
        )?;
        match &self.payload {
            PacketType::State(state) => {
                write!(f, " rat={} {:?}", state.position, state.direction)?;
                match state.missile {
                    Some((pos, dir)) => write!(f, " missile={} {:?}", pos, dir)?,
                    None => write!(f, " missile=none")?,
                }
                write!(f, " score={} crt={:#x}", state.score, state.crt)
            }
            PacketType::Nickname { name } => write!(f, " name={:?}", name),
            PacketType::Tagged { shooter } => write!(f, " shooter={}", shooter),
            PacketType::Ack { guid, seqno } => write!(f, " ack_guid={} ack_seqno={}", guid, seqno),
            PacketType::Leaving { guid } => write!(f, " leaving={}", guid),
        }
    }
}

/// Longest prefix of `name` that fits the nickname field with its NUL,
/// cut on a character boundary.
fn truncate_name(name: &str) -> &[u8] {
    let mut end = name.len().min(NICKNAME_SIZE - 1);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name.as_bytes()[..end]
}

fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_be_bytes());
}

fn put_u64(buf: &mut [u8], at: usize, value: u64) {
    buf[at..at + 8].copy_from_slice(&value.to_be_bytes());
}

fn get_u32(buf: &[u8], at: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[at..at + 4]);
    u32::from_be_bytes(bytes)
}

fn get_u64(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> PacketHeader {
        PacketHeader::new(Guid(0x0102_0304_0506_0708), 42)
    }

    #[test]
    fn header_is_network_order() {
        let packet = Packet::new(header(), PacketType::Leaving { guid: Guid(9) });
        let buf = packet.encode();

        assert_eq!(buf.len(), PACKET_SIZE);
        assert_eq!(buf[0], DESCRIPTOR_LEAVING);
        assert_eq!(&buf[1..4], &[0, 0, 0]);
        assert_eq!(&buf[4..12], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&buf[12..20], &[0, 0, 0, 0, 0, 0, 0, 42]);
        assert_eq!(buf[27], 9);
        assert!(buf[28..].iter().all(|&b| b == 0));
    }

    #[test]
    fn state_packet_decodes() {
        let state = RatState {
            position: Position::new(7, 3),
            direction: Direction::West,
            missile: None,
            score: -4,
            crt: 0xdead_beef,
        };
        let packet = Packet::new(header(), PacketType::State(state));
        let decoded = Packet::decode(&packet.encode()).unwrap();

        assert_eq!(decoded, packet);
    }

    #[test]
    fn nickname_is_truncated_and_nul_terminated() {
        let long = "x".repeat(40);
        let packet = Packet::new(header(), PacketType::Nickname { name: long });
        let buf = packet.encode();
        assert_eq!(buf[HEADER_SIZE + NICKNAME_SIZE - 1], 0);

        match Packet::decode(&buf).unwrap().payload {
            PacketType::Nickname { name } => assert_eq!(name.len(), NICKNAME_SIZE - 1),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn multibyte_name_cut_on_char_boundary() {
        let name = "é".repeat(20);
        assert_eq!(truncate_name(&name).len(), 30);
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            Packet::decode(&[0u8; 20]),
            Err(PacketError::Length {
                expected: PACKET_SIZE,
                actual: 20
            })
        );
    }

    #[test]
    fn rejects_unknown_descriptor() {
        let mut buf = [0u8; PACKET_SIZE];
        buf[0] = 9;
        let err = Packet::decode(&buf).unwrap_err();
        assert_eq!(err, PacketError::UnknownDescriptor(9));
        assert!(err.is_protocol_violation());
    }

    #[test]
    fn ack_carries_guid_and_seqno() {
        let packet = Packet::new(
            header(),
            PacketType::Ack {
                guid: Guid(77),
                seqno: 5,
            },
        );
        let decoded = Packet::decode(&packet.encode()).unwrap();
        assert_eq!(decoded.to_string(), "ACK guid=0102030405060708 seqno=42 ack_guid=000000000000004d ack_seqno=5");
    }
}
