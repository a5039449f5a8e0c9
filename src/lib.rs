//! Day/night light schedule: wraparound clock arithmetic, a phase state machine that
//! ramps brightness and color temperature around wake-up time and bedtime, and the
//! glue to drive hue lights from it.

pub mod error;
pub mod config;
pub mod control;
pub mod constants;
pub mod util;
