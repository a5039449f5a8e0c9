use chrono::{Offset, TimeZone, Utc};

use crate::config::{ScheduleConfig, Timezone};
use crate::control::phase::{self, LightOutput, Phase};
use crate::control::scene;
use crate::error::SchedulingError;
use crate::util::clock::{self, ClockTime, SECOND};

/// unix time in milliseconds
pub trait TimeSource: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// time of day in the configured timezone
pub struct ClockSource<T: TimeSource = SystemTimeSource> {
    time_source: T,
    timezone: Timezone,
}

impl<T: TimeSource> ClockSource<T> {
    pub const fn new(time_source: T, timezone: Timezone) -> Self {
        Self { time_source, timezone }
    }

    pub fn now(&self) -> ClockTime {
        let system_now_ms = self.time_source.now_millis();
        clock::current_clock_time(self.offset_millis(system_now_ms), system_now_ms)
    }

    /// named timezones are resolved for the given instant
    fn offset_millis(&self, system_now_ms: i64) -> i64 {
        match self.timezone {
            Timezone::Offset(offset) => offset,
            Timezone::Named(tz) => Utc.timestamp_millis_opt(system_now_ms)
                .single()
                .map_or(0, |now| {
                    i64::from(tz.offset_from_utc_datetime(&now.naive_utc()).fix().local_minus_utc()) * SECOND
                }),
        }
    }
}

/// owns the current phase. not shared, see `control::fn_queue` for how overrides get in.
#[derive(Debug)]
pub struct Scheduler {
    config: ScheduleConfig,
    phase: Phase,
}

impl Scheduler {
    /// evaluates the initial phase for `now`, seeded with `Phase::INITIAL`
    pub fn new(config: ScheduleConfig, now: ClockTime) -> Self {
        let phase = phase::next_phase(Phase::INITIAL, now, &config);
        tracing::info!("bed window {}, wake window {}", config.bed_window(), config.wake_window());
        tracing::info!("starting {phase} at {now}");
        Self { config, phase }
    }

    pub const fn phase(&self) -> Phase { self.phase }
    pub const fn config(&self) -> &ScheduleConfig { &self.config }

    /// advance the phase, then compute output for the new phase
    pub fn tick(&mut self, now: ClockTime) -> Result<LightOutput, SchedulingError> {
        let next = phase::next_phase(self.phase, now, &self.config);
        if next != self.phase {
            tracing::info!("{} -> {next} at {now}", self.phase);
            self.phase = next;
        }

        match &self.config.scenes {
            Some(scenes) => scene::blend(scenes, now),
            None => Ok(phase::output(self.phase, now, &self.config)),
        }
    }

    /// stays awake until the next bed window
    pub fn force_wake_up(&mut self) {
        tracing::info!("forcing wake up, was {}", self.phase);
        self.phase = Phase::WakedUpEarly;
    }

    /// stays asleep until the next wake window
    pub fn force_sleep(&mut self) {
        tracing::info!("forcing sleep, was {}", self.phase);
        self.phase = Phase::SleptEarly;
    }
}
