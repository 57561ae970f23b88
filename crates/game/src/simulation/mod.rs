mod timer;

pub use timer::{Clock, Countdown};
