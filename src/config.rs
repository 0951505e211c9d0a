use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_INSTRUMENT_TIMEOUT_MS: u32 = 10000;
pub const DEFAULT_LOCK_TIMEOUT_MS: u32 = 10000;
pub const DEFAULT_DEVICE_NAME: &str = "inst0";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Settings handed to the transport when the link is opened and to the
/// busy-wait completion loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Per-operation instrument timeout, also the busy-wait deadline.
    pub instrument_timeout_ms: u32,
    pub lock_timeout_ms: u32,
    /// VXI-11 logical device, nearly always `inst0`.
    pub device_name: String,
    pub poll_interval_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            instrument_timeout_ms: DEFAULT_INSTRUMENT_TIMEOUT_MS,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            device_name: DEFAULT_DEVICE_NAME.to_owned(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl LinkConfig {
    pub fn with_instrument_timeout_ms(mut self, ms: u32) -> Self {
        self.instrument_timeout_ms = ms;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn instrument_timeout(&self) -> Duration { Duration::from_millis(self.instrument_timeout_ms as u64) }
    pub fn poll_interval(&self) -> Duration    { Duration::from_millis(self.poll_interval_ms) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: LinkConfig = serde_json::from_str(r#"{ "instrument_timeout_ms": 250 }"#).unwrap();
        assert_eq!(cfg.instrument_timeout_ms, 250);
        assert_eq!(cfg.lock_timeout_ms, DEFAULT_LOCK_TIMEOUT_MS);
        assert_eq!(cfg.device_name, "inst0");
        assert_eq!(cfg.instrument_timeout(), Duration::from_millis(250));
    }
}
