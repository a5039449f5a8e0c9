/// file name inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "lamp-schedule.yaml";
/// overrides the config file location if set
pub const CONFIG_PATH_ENV: &str = "LAMP_SCHEDULE_CONFIG";

pub mod schedule {
    use std::time::Duration;
    /// half-width of a symmetric transition window, full width of a leading one
    pub const TRANSITION_WINDOW: Duration = Duration::from_secs(30 * 60);
    /// how often output is recomputed and written to the lights
    pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
    pub const MIN_BRIGHTNESS: f64 = 0.05;
}

pub mod hue {
    use std::time::Duration;
    /// https://developers.meethue.com/develop/get-started-2/core-concepts/#controlling-light
    pub mod brightness {
        pub const MIN: f64 = 1.0;
        pub const MAX: f64 = 254.0;
    }
    /// color temperature in mireds. larger is warmer.
    pub mod color_temperature {
        pub const COOLEST: f64 = 153.0;
        pub const WARMEST: f64 = 500.0;
    }
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
}

pub mod net {
    use std::net::{IpAddr, Ipv4Addr};
    pub const ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0));
    pub const PORT: u16 = 9999;
}
