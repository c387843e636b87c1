use crate::controller::{ControllerSettings, DEFAULT_NOTIFICATION_TITLE, DEFAULT_POLL_INTERVAL};
use std::{env, time::Duration};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_NOTIFY_COMMAND: &str = "notify-send";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Desktop,
    Log,
    Off,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend_url: Option<String>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub notifier: NotifierKind,
    pub notify_command: String,
    pub notification_title: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backend_url: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            notifier: NotifierKind::Desktop,
            notify_command: DEFAULT_NOTIFY_COMMAND.to_string(),
            notification_title: DEFAULT_NOTIFICATION_TITLE.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from a key lookup; unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = parse_or(get("PORT"), "PORT", defaults.port);
        let poll_interval = parse_or(
            get("TRACKER_POLL_INTERVAL_SECS"),
            "TRACKER_POLL_INTERVAL_SECS",
            defaults.poll_interval.as_secs(),
        );
        let request_timeout = parse_or(
            get("TRACKER_REQUEST_TIMEOUT_SECS"),
            "TRACKER_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        );

        let notifier = match get("TRACKER_NOTIFIER").as_deref() {
            None | Some("desktop") => NotifierKind::Desktop,
            Some("log") => NotifierKind::Log,
            Some("off") | Some("none") => NotifierKind::Off,
            Some(other) => {
                warn!(value = other, "unknown TRACKER_NOTIFIER, using desktop");
                NotifierKind::Desktop
            }
        };

        Self {
            port,
            backend_url: get("TRACKER_BACKEND_URL"),
            poll_interval: Duration::from_secs(poll_interval.max(1)),
            request_timeout: Duration::from_secs(request_timeout.max(1)),
            notifier,
            notify_command: get("TRACKER_NOTIFY_COMMAND").unwrap_or(defaults.notify_command),
            notification_title: get("TRACKER_NOTIFY_TITLE").unwrap_or(defaults.notification_title),
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            poll_interval: self.poll_interval,
            notification_title: self.notification_title.clone(),
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "invalid value, using default");
            default
        }),
        None => default,
    }
}
