//! Configuration types for LinkShield

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Supervision configuration for a protected link
///
/// The defaults follow the HDCP bring-up behavior of Intel display
/// drivers: a bounded burst of enable/verify attempts with a short
/// settling delay between them, a quick re-verification cadence once the
/// link is authenticated, and a slower full-retry cadence while it is not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum enable/verify attempts per authentication run
    pub retry_budget: u32,
    /// Delay between attempts within a run, letting the receiver settle
    /// on the video signal before authentication is retried
    pub settling_delay: Duration,
    /// Worker cadence while the link is authenticated (re-verification)
    pub verification_interval: Duration,
    /// Worker cadence while the link is not authenticated (full retry)
    pub retry_interval: Duration,
    /// Delay before a monitored start performs its first attempt
    pub monitor_start_delay: Duration,
    /// How long a synchronous start waits for the first outcome
    pub authentication_timeout: Duration,
    /// Whether monitored (asynchronous) starts are allowed on this platform
    pub monitoring_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retry_budget: 20,
            settling_delay: Duration::from_millis(50),
            verification_interval: Duration::from_millis(500),
            retry_interval: Duration::from_secs(2),
            monitor_start_delay: Duration::from_millis(100),
            authentication_timeout: Duration::from_secs(5),
            monitoring_enabled: true,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set the retry budget
    pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    /// Builder pattern: set the settling delay
    pub fn with_settling_delay(mut self, settling_delay: Duration) -> Self {
        self.settling_delay = settling_delay;
        self
    }

    /// Builder pattern: set the verification interval
    pub fn with_verification_interval(mut self, verification_interval: Duration) -> Self {
        self.verification_interval = verification_interval;
        self
    }

    /// Builder pattern: set the retry interval
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Builder pattern: set the monitor start delay
    pub fn with_monitor_start_delay(mut self, monitor_start_delay: Duration) -> Self {
        self.monitor_start_delay = monitor_start_delay;
        self
    }

    /// Builder pattern: set the synchronous authentication timeout
    pub fn with_authentication_timeout(mut self, authentication_timeout: Duration) -> Self {
        self.authentication_timeout = authentication_timeout;
        self
    }

    /// Builder pattern: allow or forbid monitored starts
    pub fn with_monitoring_enabled(mut self, monitoring_enabled: bool) -> Self {
        self.monitoring_enabled = monitoring_enabled;
        self
    }

    /// Worker sleep for the next cycle given the current link state
    pub fn action_delay(&self, authenticated: bool) -> Duration {
        if authenticated {
            self.verification_interval
        } else {
            self.retry_interval
        }
    }
}
