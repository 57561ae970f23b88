mod missile;
mod rat;

pub use missile::Missile;
pub use rat::Rat;
