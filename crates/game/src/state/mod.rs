mod config;
mod error;
mod index;
mod world;

pub use config::PeerConfig;
pub use error::StateError;
pub use index::IndexPool;
pub use world::WorldState;
