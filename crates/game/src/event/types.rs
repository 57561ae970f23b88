use crate::net::Guid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discovery,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReason {
    Graceful,
    Timeout,
    Shutdown,
}

impl LeaveReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveReason::Graceful => "left",
            LeaveReason::Timeout => "timed out",
            LeaveReason::Shutdown => "shut down",
        }
    }
}

/// Something the host may want to surface to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    PhaseChanged {
        phase: Phase,
    },
    RatJoined {
        guid: Guid,
        index: usize,
    },
    RatLeft {
        guid: Guid,
        index: usize,
        reason: LeaveReason,
    },
    Renamed {
        guid: Guid,
        name: String,
    },
    /// Our rat was hit by `shooter`.
    Tagged {
        shooter: Guid,
    },
    /// A peer confirmed our missile hit it.
    TagConfirmed {
        victim: Guid,
    },
}
