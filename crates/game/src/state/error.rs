use crate::map::Position;
use crate::net::Guid;

/// Requests the registry or a rat turned down. None of these are fatal;
/// the host decides whether the player hears about them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("no rat with guid {0}")]
    RatNotFound(Guid),
    #[error("rat {0} is not the local rat")]
    NotLocal(Guid),
    #[error("no local rat has been designated")]
    NoLocalRat,
    #[error("gameplay is disabled while peers are being discovered")]
    Discovery,
    #[error("cell {0} is occupied by another rat")]
    CellOccupied(Position),
    #[error("cell {0} is a wall")]
    Wall(Position),
    #[error("a missile is already in flight")]
    MissileInFlight,
    #[error("cannot fire into the wall ahead")]
    FireBlocked,
}
