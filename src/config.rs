//! Configuration file loading and validation.
//!
//! The file is read once at startup by `main`. Everything below the scheduler only ever
//! sees the validated [`Config`], never the raw file or the environment.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use itertools::Itertools;
use serde::Deserialize;

use crate::constants;
use crate::control::scene::Scene;
use crate::error::ConfigError;
use crate::util::clock::{self, ClockTime, Interval, DAY};

#[derive(Debug, Clone)]
pub struct Config {
    pub schedule: ScheduleConfig,
    pub bridge: BridgeConfig,
    pub server: ServerConfig,
    pub tick_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub host: String,
    pub username: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
}

/// how transition windows are placed around their anchor time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    /// `[anchor - window, anchor + window]`
    #[default]
    Symmetric,
    /// `[anchor - window, anchor]`
    Leading,
}

/// ramp from `floor` to 1 (or back) over `ramp` milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curve {
    pub floor: f64,
    pub ramp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timezone {
    /// milliseconds added to UTC
    Offset(i64),
    /// offset is looked up on every tick so daylight saving time applies
    Named(chrono_tz::Tz),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleConfig {
    pub wake_up_time: ClockTime,
    pub bedtime: ClockTime,
    /// milliseconds
    pub window: i64,
    pub window_mode: WindowMode,
    pub brightness: Curve,
    pub coolness: Curve,
    pub timezone: Timezone,
    /// sorted by time. output is averaged from these instead of following phases.
    pub scenes: Option<Vec<Scene>>,
}

impl ScheduleConfig {
    /// symmetric window, ramps as long as the window, coolness mirrors brightness, UTC
    pub fn new(wake_up_time: ClockTime, bedtime: ClockTime, window: Duration) -> Self {
        let window = clock::duration_millis(window);
        let curve = Curve { floor: constants::schedule::MIN_BRIGHTNESS, ramp: window };
        Self {
            wake_up_time,
            bedtime,
            window,
            window_mode: WindowMode::default(),
            brightness: curve,
            coolness: curve,
            timezone: Timezone::Offset(0),
            scenes: None,
        }
    }

    /// sets the floor of both curves
    #[must_use]
    pub fn with_min_brightness(mut self, min_brightness: f64) -> Self {
        self.brightness.floor = min_brightness;
        self.coolness.floor = min_brightness;
        self
    }

    #[must_use]
    pub fn with_window_mode(mut self, window_mode: WindowMode) -> Self {
        self.window_mode = window_mode;
        self
    }

    /// sorts scenes by time
    #[must_use]
    pub fn with_scenes(mut self, scenes: Vec<Scene>) -> Self {
        self.scenes = Some(scenes.into_iter().sorted_by_key(|scene| scene.time).collect());
        self
    }

    pub fn bed_window(&self) -> Interval {
        self.window_around(self.bedtime)
    }

    pub fn wake_window(&self) -> Interval {
        self.window_around(self.wake_up_time)
    }

    fn window_around(&self, anchor: ClockTime) -> Interval {
        let end = match self.window_mode {
            WindowMode::Symmetric => anchor.add_wrapping(self.window),
            WindowMode::Leading => anchor,
        };
        Interval::new(anchor.sub_wrapping(self.window), end)
    }

    /// everything the scheduler relies on: windows that tile the day without overlapping,
    /// floors within `[0, 1]`, positive ramps and at least two distinct scenes if any.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window <= 0 || self.window >= DAY {
            return Err(ConfigError::invalid("schedule.transition_window_ms", "has to be > 0 and less than a day"));
        }
        if self.wake_up_time == self.bedtime {
            return Err(ConfigError::invalid("schedule.bedtime", "has to differ from wake_up_time"));
        }

        // both windows plus the gaps between them have to fit in a day
        let window_width = match self.window_mode {
            WindowMode::Symmetric => 2 * self.window,
            WindowMode::Leading => self.window,
        };
        let night = Interval::new(self.bedtime, self.wake_up_time).length();
        let day = Interval::new(self.wake_up_time, self.bedtime).length();
        if night < window_width || day < window_width {
            return Err(ConfigError::invalid(
                "schedule.transition_window_ms",
                format!(
                    "transition windows overlap: {} wide windows do not fit between bedtime {} and wake_up_time {}",
                    format_minutes(window_width), self.bedtime, self.wake_up_time
                ),
            ));
        }

        for (field, curve) in [("schedule.min_brightness", self.brightness), ("schedule.min_coolness", self.coolness)] {
            if !(0.0..=1.0).contains(&curve.floor) {
                return Err(ConfigError::invalid(field, format!("has to be from 0 to 1, was {}", curve.floor)));
            }
            if curve.ramp <= 0 || curve.ramp > DAY {
                return Err(ConfigError::invalid(field, "ramp duration has to be > 0 and at most a day"));
            }
        }

        if let Timezone::Offset(offset) = self.timezone {
            if offset.unsigned_abs() >= DAY.unsigned_abs() {
                return Err(ConfigError::invalid("schedule.timezone_offset_ms", "has to be less than a day"));
            }
        }

        if let Some(scenes) = &self.scenes {
            validate_scenes(scenes)?;
        }
        Ok(())
    }
}

fn validate_scenes(scenes: &[Scene]) -> Result<(), ConfigError> {
    if scenes.len() < 2 {
        return Err(ConfigError::invalid("schedule.scenes", format!("needs at least 2 scenes, got {}", scenes.len())));
    }
    for scene in scenes {
        if !(0.0..=1.0).contains(&scene.brightness) || !(0.0..=1.0).contains(&scene.coolness) {
            return Err(ConfigError::invalid(
                "schedule.scenes",
                format!("brightness and cool of scene at {} have to be from 0 to 1", scene.time),
            ));
        }
    }
    if let Some(duplicate) = scenes.iter().map(|scene| scene.time).duplicates().next() {
        return Err(ConfigError::invalid("schedule.scenes", format!("more than one scene at {duplicate}")));
    }
    Ok(())
}

fn format_minutes(millis: i64) -> String {
    format!("{} min", millis / clock::MINUTE)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub tick_interval_ms: Option<u64>,
    #[serde(default)]
    pub server: RawServer,
    pub bridge: Option<RawBridge>,
    pub schedule: Option<RawSchedule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawServer {
    pub address: Option<IpAddr>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawBridge {
    pub host: Option<String>,
    pub username: Option<String>,
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSchedule {
    pub wake_up_time: Option<ClockTime>,
    pub bedtime: Option<ClockTime>,
    pub transition_window_ms: Option<u64>,
    #[serde(default)]
    pub window_mode: WindowMode,
    pub ramp_duration_ms: Option<u64>,
    pub min_brightness: Option<f64>,
    pub min_coolness: Option<f64>,
    pub coolness_ramp_duration_ms: Option<u64>,
    pub timezone_offset_ms: Option<i64>,
    pub timezone: Option<String>,
    pub scenes: Option<Vec<Scene>>,
}

impl TryFrom<RawSchedule> for ScheduleConfig {
    type Error = ConfigError;

    fn try_from(raw: RawSchedule) -> Result<Self, Self::Error> {
        let wake_up_time = raw.wake_up_time
            .ok_or_else(|| ConfigError::invalid("schedule.wake_up_time", "is missing"))?;
        let bedtime = raw.bedtime
            .ok_or_else(|| ConfigError::invalid("schedule.bedtime", "is missing"))?;

        let window = raw.transition_window_ms
            .map_or(constants::schedule::TRANSITION_WINDOW, Duration::from_millis);
        let mut config = Self::new(wake_up_time, bedtime, window)
            .with_window_mode(raw.window_mode);

        let ramp = raw.ramp_duration_ms.map_or(config.window, millis_i64);
        config.brightness = Curve {
            floor: raw.min_brightness.unwrap_or(constants::schedule::MIN_BRIGHTNESS),
            ramp,
        };
        // coolness mirrors brightness unless configured
        config.coolness = Curve {
            floor: raw.min_coolness.unwrap_or(config.brightness.floor),
            ramp: raw.coolness_ramp_duration_ms.map_or(ramp, millis_i64),
        };

        config.timezone = match (raw.timezone, raw.timezone_offset_ms) {
            (Some(_), Some(_)) => return Err(ConfigError::invalid(
                "schedule.timezone",
                "set either timezone or timezone_offset_ms, not both",
            )),
            (Some(name), None) => Timezone::Named(name.parse::<chrono_tz::Tz>()
                .map_err(|_| ConfigError::invalid("schedule.timezone", format!("unknown timezone {name:?}")))?),
            (None, offset) => Timezone::Offset(offset.unwrap_or(0)),
        };

        if let Some(scenes) = raw.scenes {
            config = config.with_scenes(scenes);
        }

        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<RawConfig> for Config {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let schedule = raw.schedule
            .ok_or_else(|| ConfigError::invalid("schedule", "is missing"))?
            .try_into()?;

        let raw_bridge = raw.bridge
            .ok_or_else(|| ConfigError::invalid("bridge", "is missing"))?;
        let bridge = BridgeConfig {
            host: raw_bridge.host
                .filter(|host| !host.trim().is_empty())
                .ok_or_else(|| ConfigError::invalid("bridge.host", "is missing"))?,
            username: raw_bridge.username
                .filter(|username| !username.trim().is_empty())
                .ok_or_else(|| ConfigError::invalid("bridge.username", "is missing"))?,
            request_timeout: raw_bridge.request_timeout_ms
                .map_or(constants::hue::REQUEST_TIMEOUT, Duration::from_millis),
        };

        let server = ServerConfig {
            address: raw.server.address.unwrap_or(constants::net::ADDRESS),
            port: raw.server.port.unwrap_or(constants::net::PORT),
        };

        let tick_interval = raw.tick_interval_ms
            .map_or(constants::schedule::TICK_INTERVAL, Duration::from_millis);
        if tick_interval.is_zero() {
            return Err(ConfigError::invalid("tick_interval_ms", "has to be > 0"));
        }

        Ok(Self { schedule, bridge, server, tick_interval })
    }
}

fn millis_i64(millis: u64) -> i64 {
    clock::duration_millis(Duration::from_millis(millis))
}

/// `$LAMP_SCHEDULE_CONFIG` if set, the platform config directory otherwise
pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = std::env::var_os(constants::CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    let mut path = dirs_next::config_dir().ok_or(ConfigError::NoConfigDir)?;
    path.push(constants::CONFIG_FILE_NAME);
    Ok(path)
}

pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
    let yaml_config = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_owned(), source })?;
    let raw: RawConfig = serde_yaml::from_str(&yaml_config)
        .map_err(|source| ConfigError::Parse { path: path.to_owned(), source })?;
    raw.try_into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
tick_interval_ms: 60000
server:
  port: 8080
bridge:
  host: 192.168.0.10
  username: abcdef
schedule:
  wake_up_time: "07:00"
  bedtime: 79200000
  transition_window_ms: 1800000
  min_brightness: 0.1
  timezone: Asia/Tokyo
"#;

    fn parse(yaml: &str) -> Result<Config, ConfigError> {
        serde_yaml::from_str::<RawConfig>(yaml).unwrap().try_into()
    }

    fn schedule(yaml: &str) -> Result<ScheduleConfig, ConfigError> {
        serde_yaml::from_str::<RawSchedule>(yaml).unwrap().try_into()
    }

    fn field_of(error: ConfigError) -> &'static str {
        match error {
            ConfigError::Invalid { field, .. } => field,
            other => panic!("expected invalid field, got {other:?}"),
        }
    }

    #[test]
    fn parses_full_config() {
        let config = parse(FULL).unwrap();
        assert_eq!(config.tick_interval, Duration::from_secs(60));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.address, constants::net::ADDRESS);
        assert_eq!(config.bridge.host, "192.168.0.10");
        assert_eq!(config.bridge.request_timeout, constants::hue::REQUEST_TIMEOUT);
        assert_eq!(config.schedule.wake_up_time, ClockTime::from_hms(7, 0, 0));
        assert_eq!(config.schedule.bedtime, ClockTime::from_hms(22, 0, 0));
        assert_eq!(config.schedule.timezone, Timezone::Named(chrono_tz::Asia::Tokyo));
        assert_eq!(config.schedule.brightness, Curve { floor: 0.1, ramp: 30 * clock::MINUTE });
        assert_eq!(config.schedule.coolness, config.schedule.brightness);
    }

    #[test]
    fn missing_boundary_is_reported() {
        let error = schedule("bedtime: \"22:00\"").unwrap_err();
        assert_eq!(field_of(error), "schedule.wake_up_time");
    }

    #[test]
    fn non_numeric_boundary_fails_to_parse() {
        assert!(serde_yaml::from_str::<RawSchedule>("wake_up_time: early\nbedtime: \"22:00\"").is_err());
    }

    #[test]
    fn rejects_min_brightness_out_of_range() {
        let error = schedule("wake_up_time: \"07:00\"\nbedtime: \"22:00\"\nmin_brightness: 1.5").unwrap_err();
        assert_eq!(field_of(error), "schedule.min_brightness");
    }

    #[test]
    fn rejects_overlapping_windows() {
        // 1h apart, symmetric 45min windows need 1h30
        let error = schedule("wake_up_time: \"07:00\"\nbedtime: \"06:00\"\ntransition_window_ms: 2700000").unwrap_err();
        assert_eq!(field_of(error), "schedule.transition_window_ms");
        // the same fits as leading windows
        assert!(schedule(
            "wake_up_time: \"07:00\"\nbedtime: \"06:00\"\ntransition_window_ms: 2700000\nwindow_mode: leading"
        ).is_ok());
    }

    #[test]
    fn rejects_single_scene() {
        let error = schedule(
            "wake_up_time: \"07:00\"\nbedtime: \"22:00\"\nscenes:\n  - { time: \"06:00\", brightness: 0.2, cool: 0.2 }"
        ).unwrap_err();
        assert_eq!(field_of(error), "schedule.scenes");
    }

    #[test]
    fn rejects_duplicate_scene_times() {
        let error = schedule(
            "wake_up_time: \"07:00\"\nbedtime: \"22:00\"\nscenes:\n  \
             - { time: \"06:00\", brightness: 0.2, cool: 0.2 }\n  \
             - { time: \"06:00\", brightness: 1.0, cool: 0.8 }"
        ).unwrap_err();
        assert_eq!(field_of(error), "schedule.scenes");
    }

    #[test]
    fn sorts_scenes_by_time() {
        let config = schedule(
            "wake_up_time: \"07:00\"\nbedtime: \"22:00\"\nscenes:\n  \
             - { time: \"18:00\", brightness: 1.0, cool: 0.8 }\n  \
             - { time: \"06:00\", brightness: 0.2, cool: 0.2 }"
        ).unwrap();
        let times = config.scenes.unwrap().iter().map(|scene| scene.time).collect_vec();
        assert_eq!(times, vec![ClockTime::from_hms(6, 0, 0), ClockTime::from_hms(18, 0, 0)]);
    }

    #[test]
    fn rejects_both_timezone_settings() {
        let error = schedule(
            "wake_up_time: \"07:00\"\nbedtime: \"22:00\"\ntimezone: Europe/Berlin\ntimezone_offset_ms: 3600000"
        ).unwrap_err();
        assert_eq!(field_of(error), "schedule.timezone");
        let error = schedule("wake_up_time: \"07:00\"\nbedtime: \"22:00\"\ntimezone: Mars/Olympus").unwrap_err();
        assert_eq!(field_of(error), "schedule.timezone");
    }

    #[test]
    fn decoupled_coolness_curve() {
        let config = schedule(
            "wake_up_time: \"07:00\"\nbedtime: \"22:00\"\nramp_duration_ms: 3600000\n\
             min_coolness: 0.0\ncoolness_ramp_duration_ms: 600000"
        ).unwrap();
        assert_eq!(config.brightness.ramp, clock::HOUR);
        assert_eq!(config.coolness, Curve { floor: 0.0, ramp: 10 * clock::MINUTE });
    }

    #[test]
    fn bridge_is_required() {
        let error = parse("schedule:\n  wake_up_time: \"07:00\"\n  bedtime: \"22:00\"").unwrap_err();
        assert_eq!(field_of(error), "bridge");
    }

    #[test]
    fn windows_follow_mode() {
        let hm = |hour, minute| ClockTime::from_hms(hour, minute, 0);
        let config = ScheduleConfig::new(hm(7, 0), hm(22, 0), Duration::from_secs(30 * 60));
        assert_eq!(config.bed_window(), Interval::new(hm(21, 30), hm(22, 30)));
        assert_eq!(config.wake_window(), Interval::new(hm(6, 30), hm(7, 30)));

        let config = config.with_window_mode(WindowMode::Leading);
        assert_eq!(config.bed_window(), Interval::new(hm(21, 30), hm(22, 0)));
        assert_eq!(config.wake_window(), Interval::new(hm(6, 30), hm(7, 0)));
    }

    #[test]
    fn rejects_window_longer_than_a_day() {
        let error = schedule(
            "wake_up_time: \"07:00\"\nbedtime: \"22:00\"\ntransition_window_ms: 4611686018427387904"
        ).unwrap_err();
        assert_eq!(field_of(error), "schedule.transition_window_ms");

        let error = schedule(
            "wake_up_time: \"07:00\"\nbedtime: \"22:00\"\nwindow_mode: leading\ntransition_window_ms: 18446744073709551615"
        ).unwrap_err();
        assert_eq!(field_of(error), "schedule.transition_window_ms");
    }

    #[test]
    fn rejects_ramp_longer_than_a_day() {
        let error = schedule(
            "wake_up_time: \"07:00\"\nbedtime: \"22:00\"\nramp_duration_ms: 9223372036854775807"
        ).unwrap_err();
        assert_eq!(field_of(error), "schedule.min_brightness");
    }

    #[test]
    fn rejects_extreme_timezone_offset() {
        for offset in [i64::MIN, i64::MAX, DAY, -DAY] {
            let error = schedule(&format!(
                "wake_up_time: \"07:00\"\nbedtime: \"22:00\"\ntimezone_offset_ms: {offset}"
            )).unwrap_err();
            assert_eq!(field_of(error), "schedule.timezone_offset_ms");
        }
        assert!(schedule(&format!(
            "wake_up_time: \"07:00\"\nbedtime: \"22:00\"\ntimezone_offset_ms: {}", DAY - 1
        )).is_ok());
    }
}
