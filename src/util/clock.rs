use std::{fmt, str::FromStr, time::Duration};

pub const SECOND: i64 = 1000;
pub const MINUTE: i64 = 60 * SECOND;
pub const HOUR: i64 = 60 * MINUTE;
pub const DAY: i64 = 24 * HOUR;

/// milliseconds since local midnight. always in `[0, DAY)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ClockTime(i64);

impl ClockTime {
    /// wraps any millisecond value onto the clock, see `normalize()`
    pub const fn new(millis: i64) -> Self {
        Self(normalize(millis))
    }

    /// panics if at least one value is out of range
    pub fn from_hms(hour: u8, minute: u8, second: u8) -> Self {
        assert!(hour <= 23, "hour has to be <= 23, was {hour:?}");
        assert!(minute <= 59, "minute has to be <= 59, was {minute:?}");
        assert!(second <= 59, "second has to be <= 59, was {second:?}");
        Self(i64::from(hour) * HOUR + i64::from(minute) * MINUTE + i64::from(second) * SECOND)
    }

    pub const fn as_millis(self) -> i64 { self.0 }

    pub const fn hour(self) -> i64 { self.0 / HOUR }
    pub const fn minute(self) -> i64 { self.0 % HOUR / MINUTE }
    pub const fn second(self) -> i64 { self.0 % MINUTE / SECOND }

    /// can shift both forwards and backwards in time
    pub const fn add_wrapping(self, delta: i64) -> Self {
        add_wrapping(self, delta)
    }

    pub const fn sub_wrapping(self, delta: i64) -> Self {
        sub_wrapping(self, delta)
    }

    /// forward distance on the clock from `start` to `self`, in `[0, DAY)`.
    /// `00:15` is 45 minutes after `23:30`.
    pub const fn elapsed_since(self, start: Self) -> i64 {
        normalize(self.0 - start.0)
    }
}

/// floored modulo: `-00:30` becomes `23:30`, `24:30` becomes `00:30`
pub const fn normalize(millis: i64) -> i64 {
    millis.rem_euclid(DAY)
}

// 12:00 + 00:30 => 12:30
// 23:30 + 01:00 => 00:30
pub const fn add_wrapping(t: ClockTime, delta: i64) -> ClockTime {
    ClockTime::new(t.0 + delta)
}

// 12:00 - 00:30 => 11:30
// 00:30 - 01:00 => 23:30
pub const fn sub_wrapping(t: ClockTime, delta: i64) -> ClockTime {
    ClockTime::new(t.0 - delta)
}

/// both ends are inclusive. wraps across midnight if `start > end`.
pub fn within(start: ClockTime, end: ClockTime, t: ClockTime) -> bool {
    if start > end {
        // 23:30 ~ 00:30
        start <= t || t <= end
    } else {
        // 22:30 ~ 23:30
        start <= t && t <= end
    }
}

/// apply timezone offset to a unix timestamp and reduce it to the time of day
pub const fn current_clock_time(timezone_offset_ms: i64, system_now_ms: i64) -> ClockTime {
    ClockTime::new(system_now_ms + timezone_offset_ms)
}

/// saturates at `i64::MAX` milliseconds, which is more than enough for any window
pub fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// closed window on the clock, may wrap across midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl Interval {
    pub const fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: ClockTime) -> bool {
        within(self.start, self.end, t)
    }

    /// length in milliseconds, following the wrap if there is one
    pub const fn length(&self) -> i64 {
        self.end.elapsed_since(self.start)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour(), self.minute(), self.second())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time of day {input:?}, expected HH:MM or HH:MM:SS")]
pub struct ParseClockTimeError {
    input: String,
}

/// accepts `HH:MM` and `HH:MM:SS`
impl FromStr for ClockTime {
    type Err = ParseClockTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseClockTimeError { input: s.to_owned() };

        let fields: Vec<u8> = s.trim()
            .split(':')
            .map(|field| field.parse::<u8>())
            .collect::<Result<_, _>>()
            .map_err(|_| error())?;

        let (hour, minute, second) = match fields[..] {
            [hour, minute] => (hour, minute, 0),
            [hour, minute, second] => (hour, minute, second),
            _ => return Err(error()),
        };
        if hour > 23 || minute > 59 || second > 59 {
            return Err(error());
        }
        Ok(Self::from_hms(hour, minute, second))
    }
}

/// either milliseconds since midnight or a `HH:MM[:SS]` string
impl<'de> serde::Deserialize<'de> for ClockTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Millis(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Millis(millis) => Ok(Self::new(millis)),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

impl serde::Serialize for ClockTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(hour: u8, minute: u8) -> ClockTime {
        ClockTime::from_hms(hour, minute, 0)
    }

    #[test]
    fn normalize_wraps_negative_values_up() {
        assert_eq!(normalize(-30 * MINUTE), DAY - 30 * MINUTE);
        assert_eq!(normalize(-DAY / 2), DAY / 2);
        assert_eq!(normalize(-DAY), 0);
        assert_eq!(normalize(-3 * DAY - 1), DAY - 1);
    }

    #[test]
    fn normalize_wraps_multiple_days_down() {
        assert_eq!(normalize(2 * DAY + 100), 100);
        assert_eq!(normalize(DAY), 0);
        assert_eq!(normalize(DAY - 1), DAY - 1);
    }

    #[test]
    fn add_and_sub_wrap_across_midnight() {
        assert_eq!(add_wrapping(hm(12, 0), 30 * MINUTE), hm(12, 30));
        assert_eq!(add_wrapping(hm(23, 30), HOUR), hm(0, 30));
        assert_eq!(sub_wrapping(hm(12, 0), 30 * MINUTE), hm(11, 30));
        assert_eq!(sub_wrapping(hm(0, 30), HOUR), hm(23, 30));
    }

    #[test]
    fn within_includes_both_ends() {
        assert!(within(hm(22, 30), hm(23, 30), hm(22, 30)));
        assert!(within(hm(22, 30), hm(23, 30), hm(23, 30)));
        assert!(within(hm(23, 30), hm(0, 30), hm(23, 30)));
        assert!(within(hm(23, 30), hm(0, 30), hm(0, 30)));
        assert!(!within(hm(22, 30), hm(23, 30), hm(23, 31)));
    }

    #[test]
    fn within_wrapping_interval() {
        assert!(within(hm(23, 30), hm(0, 30), hm(23, 45)));
        assert!(within(hm(23, 30), hm(0, 30), hm(0, 0)));
        assert!(!within(hm(23, 30), hm(0, 30), hm(12, 0)));
    }

    #[test]
    fn elapsed_since_follows_the_clock_forward() {
        assert_eq!(hm(0, 15).elapsed_since(hm(23, 30)), 45 * MINUTE);
        assert_eq!(hm(21, 45).elapsed_since(hm(21, 30)), 15 * MINUTE);
        assert_eq!(hm(7, 0).elapsed_since(hm(7, 0)), 0);
    }

    #[test]
    fn current_clock_time_applies_offset() {
        // 2024-01-01T23:00:00Z
        let now = 1_704_150_000_000;
        assert_eq!(current_clock_time(0, now), hm(23, 0));
        assert_eq!(current_clock_time(9 * HOUR, now), hm(8, 0));
        assert_eq!(current_clock_time(-5 * HOUR, now), hm(18, 0));
    }

    #[test]
    fn interval_length_follows_wrap() {
        assert_eq!(Interval::new(hm(23, 30), hm(0, 30)).length(), HOUR);
        assert_eq!(Interval::new(hm(6, 30), hm(7, 30)).length(), HOUR);
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("07:00".parse::<ClockTime>(), Ok(hm(7, 0)));
        assert_eq!("23:59:59".parse::<ClockTime>(), Ok(ClockTime::from_hms(23, 59, 59)));
        assert!("24:00".parse::<ClockTime>().is_err());
        assert!("7".parse::<ClockTime>().is_err());
        assert!("07:60".parse::<ClockTime>().is_err());
        assert!("seven".parse::<ClockTime>().is_err());
        assert_eq!(hm(7, 5).to_string(), "07:05:00");
    }

    #[test]
    fn deserialize_accepts_millis_and_text() {
        let from_text: ClockTime = serde_yaml::from_str("\"07:00\"").unwrap();
        let from_millis: ClockTime = serde_yaml::from_str("25200000").unwrap();
        assert_eq!(from_text, hm(7, 0));
        assert_eq!(from_millis, hm(7, 0));
        assert!(serde_yaml::from_str::<ClockTime>("\"late\"").is_err());
    }
}
