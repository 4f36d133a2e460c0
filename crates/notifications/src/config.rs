//! Queue configuration.

use std::time::Duration;

use tracing::warn;

/// Attempts and pacing for an `EmailQueue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Attempts per job when `add` is not given an explicit limit.
    pub default_max_attempts: u32,
    /// Extra wait after an attempt that failed and left the job pending.
    pub retry_delay: Duration,
    /// Wait between consecutive attempts within a sweep (send throttle).
    pub send_interval: Duration,
    /// Keep delivered jobs as `sent` until `cleanup()` instead of dropping
    /// them right away.
    pub retain_sent: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            default_max_attempts: 3,
            retry_delay: Duration::from_secs(5),
            send_interval: Duration::from_secs(1),
            retain_sent: false,
        }
    }
}

impl QueueConfig {
    pub fn with_default_max_attempts(mut self, attempts: u32) -> Self {
        self.default_max_attempts = attempts;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_send_interval(mut self, interval: Duration) -> Self {
        self.send_interval = interval;
        self
    }

    pub fn with_retain_sent(mut self, retain: bool) -> Self {
        self.retain_sent = retain;
        self
    }

    /// Load from `EMAIL_QUEUE_*` environment variables.
    ///
    /// Missing or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let default_max_attempts = parse_or(
            &lookup,
            "EMAIL_QUEUE_MAX_ATTEMPTS",
            defaults.default_max_attempts,
        );
        let retry_delay = Duration::from_millis(parse_or(
            &lookup,
            "EMAIL_QUEUE_RETRY_DELAY_MS",
            defaults.retry_delay.as_millis() as u64,
        ));
        let send_interval = Duration::from_millis(parse_or(
            &lookup,
            "EMAIL_QUEUE_SEND_INTERVAL_MS",
            defaults.send_interval.as_millis() as u64,
        ));
        let retain_sent = parse_or(&lookup, "EMAIL_QUEUE_RETAIN_SENT", defaults.retain_sent);

        Self {
            default_max_attempts,
            retry_delay,
            send_interval,
            retain_sent,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(key, value = %raw, "ignoring unparsable queue setting");
                default
            }
        },
    }
}
