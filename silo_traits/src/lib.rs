pub mod clock;

pub use clock::{Clock, MonotonicClock};
