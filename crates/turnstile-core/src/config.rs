//! Configuration types for Turnstile

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::VersionTag;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Confirmations required before a transaction is reported `confirmed`.
    /// One block is sufficient for most uses; callers needing stronger
    /// finality guarantees raise this.
    #[serde(default = "default_required_confirmations")]
    pub required_confirmations: u64,

    /// Receipt poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Confirmation wait budget in milliseconds. `None` waits indefinitely.
    #[serde(default)]
    pub confirmation_timeout_ms: Option<u64>,

    /// Version probe order for contracts that predate the version
    /// accessor. `None` probes newest to oldest; only "first full match
    /// wins" is relied upon.
    #[serde(default)]
    pub probe_order: Option<Vec<VersionTag>>,

    /// Capacity of the lifecycle event channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_required_confirmations() -> u64 {
    1
}

fn default_poll_interval_ms() -> u64 {
    4_000
}

fn default_event_buffer() -> usize {
    64
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            required_confirmations: default_required_confirmations(),
            poll_interval_ms: default_poll_interval_ms(),
            confirmation_timeout_ms: None,
            probe_order: None,
            event_buffer: default_event_buffer(),
        }
    }
}

impl ClientConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirmation_timeout(&self) -> Option<Duration> {
        self.confirmation_timeout_ms.map(Duration::from_millis)
    }
}
