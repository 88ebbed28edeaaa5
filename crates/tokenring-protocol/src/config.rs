//! Ring configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tokenring_topology::RingSize;
use tracing::warn;

use crate::codec::RECORD_LEN;

/// How a participant learns that a token is waiting on its inbound channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DeliveryMode {
    /// Block on the inbound channel read.
    Polling,
    /// Sleep until the predecessor rings this participant's doorbell, then
    /// read. Shutdown waits for each successor to exit first.
    #[default]
    Signal,
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Polling => write!(f, "polling"),
            Self::Signal => write!(f, "signal"),
        }
    }
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polling" | "poll" => Ok(Self::Polling),
            "signal" => Ok(Self::Signal),
            other => Err(format!("unknown delivery mode: {other}")),
        }
    }
}

/// Configuration for a ring.
#[derive(Debug, Clone)]
pub struct RingConfig {
    /// Number of participants.
    pub size: RingSize,

    /// Wake-up mechanism.
    pub mode: DeliveryMode,

    /// Pause before every forward, so the circulation can be followed on a
    /// console. Not needed for correctness.
    pub hop_delay: Duration,

    /// Bytes buffered per channel. Must hold at least one record.
    pub channel_capacity: usize,

    /// Ask for a new message whenever the empty token returns to the origin.
    pub reinject: bool,
}

impl RingConfig {
    pub const DEFAULT_HOP_DELAY: Duration = Duration::from_secs(2);
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 4 * RECORD_LEN;

    pub fn new(size: RingSize) -> Self {
        Self {
            size,
            mode: DeliveryMode::default(),
            hop_delay: Self::DEFAULT_HOP_DELAY,
            channel_capacity: Self::DEFAULT_CHANNEL_CAPACITY,
            reinject: false,
        }
    }

    /// Create a config from environment variables, falling back to defaults.
    ///
    /// - `TOKENRING_MODE`: `polling` or `signal`
    /// - `TOKENRING_HOP_DELAY_MS`: pause before each forward
    /// - `TOKENRING_CHANNEL_CAPACITY`: bytes per channel
    /// - `TOKENRING_REINJECT`: `1`/`true` to prompt again after each lap
    pub fn from_env(size: RingSize) -> Self {
        let mut config = Self::new(size);

        if let Some(mode) = env_parsed::<DeliveryMode>("TOKENRING_MODE") {
            config.mode = mode;
        }
        if let Some(ms) = env_parsed::<u64>("TOKENRING_HOP_DELAY_MS") {
            config.hop_delay = Duration::from_millis(ms);
        }
        if let Some(capacity) = env_parsed::<usize>("TOKENRING_CHANNEL_CAPACITY") {
            config.channel_capacity = capacity;
        }
        if let Ok(value) = std::env::var("TOKENRING_REINJECT") {
            config.reinject = matches!(value.trim(), "1" | "true" | "yes" | "on");
        }

        config
    }

    #[must_use]
    pub fn with_mode(mut self, mode: DeliveryMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_hop_delay(mut self, delay: Duration) -> Self {
        self.hop_delay = delay;
        self
    }

    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_reinject(mut self, reinject: bool) -> Self {
        self.reinject = reinject;
        self
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self::new(RingSize::DEFAULT)
    }
}

fn env_parsed<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}
