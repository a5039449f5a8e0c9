//! Day phases and the output curves that belong to them.
//!
//! Transition and output are pure functions of the previous phase, the current clock
//! time and the schedule. [`Scheduler`](crate::control::scheduler::Scheduler) owns the
//! actual phase and calls these on every tick.

use std::fmt;

use crate::config::{Curve, ScheduleConfig};
use crate::util::clock::{self, ClockTime};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    serde::Serialize, // to axum::Json
    utoipa::ToSchema  // to display in swagger-ui
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    WakeUpInProgress,
    WakedUp,
    SleepInProgress,
    Slept,
    /// forced by `/wake-up`, lasts until the next bed window
    WakedUpEarly,
    /// forced by `/sleep`, lasts until the next wake window
    SleptEarly,
}

impl Phase {
    /// seed for the first evaluation after startup
    pub const INITIAL: Self = Self::WakedUp;

    pub const fn is_forced(self) -> bool {
        matches!(self, Self::WakedUpEarly | Self::SleptEarly)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::WakeUpInProgress => "waking up",
            Self::WakedUp => "awake",
            Self::SleepInProgress => "falling asleep",
            Self::Slept => "asleep",
            Self::WakedUpEarly => "awake early",
            Self::SleptEarly => "asleep early",
        };
        f.write_str(name)
    }
}

/// what the lights should show
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub struct LightOutput {
    /// from 0 (off) to 1 (full)
    #[schema(minimum = 0, maximum = 1)]
    pub brightness: f64,
    /// from 0 (warmest) to 1 (coolest)
    #[schema(minimum = 0, maximum = 1)]
    pub coolness: f64,
}

pub fn next_phase(current: Phase, now: ClockTime, config: &ScheduleConfig) -> Phase {
    let bed_window = config.bed_window();
    let wake_window = config.wake_window();

    match current {
        // forced phases fold back into the cycle once the next window is reached
        Phase::WakedUpEarly => {
            if bed_window.contains(now) { Phase::SleepInProgress } else { Phase::WakedUpEarly }
        }
        Phase::SleptEarly => {
            if wake_window.contains(now) { Phase::WakeUpInProgress } else { Phase::SleptEarly }
        }
        // order matters where two intervals share a boundary
        _ => {
            if bed_window.contains(now) {
                Phase::SleepInProgress
            } else if clock::within(bed_window.end, wake_window.start, now) {
                Phase::Slept
            } else if wake_window.contains(now) {
                Phase::WakeUpInProgress
            } else if clock::within(wake_window.end, bed_window.start, now) {
                Phase::WakedUp
            } else {
                tracing::warn!("{now} is not covered by any phase interval, staying {current}");
                current
            }
        }
    }
}

pub fn brightness(phase: Phase, now: ClockTime, config: &ScheduleConfig) -> f64 {
    level(phase, now, config, config.brightness)
}

/// same shape as `brightness()`, but with its own floor and ramp
pub fn coolness(phase: Phase, now: ClockTime, config: &ScheduleConfig) -> f64 {
    level(phase, now, config, config.coolness)
}

pub fn output(phase: Phase, now: ClockTime, config: &ScheduleConfig) -> LightOutput {
    LightOutput {
        brightness: brightness(phase, now, config),
        coolness: coolness(phase, now, config),
    }
}

/// f64 types for easier calculations
#[allow(clippy::cast_precision_loss)]
fn level(phase: Phase, now: ClockTime, config: &ScheduleConfig, curve: Curve) -> f64 {
    let ramp = |window_start: ClockTime| {
        now.elapsed_since(window_start) as f64 / curve.ramp as f64
    };

    let value = match phase {
        Phase::WakedUp | Phase::WakedUpEarly => 1.0,
        Phase::Slept | Phase::SleptEarly => curve.floor,
        Phase::SleepInProgress => 1.0 - ramp(config.bed_window().start),
        Phase::WakeUpInProgress => ramp(config.wake_window().start),
    };
    value.clamp(curve.floor, 1.0)
}
