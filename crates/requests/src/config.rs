//! Request ledger configuration.

use std::sync::Arc;
use std::time::Duration;
use teleport_core::{clamped_secs, ConfigSource};

/// How long a pending request lives before expiring, in seconds.
pub const TIMEOUT_KEY: &str = "request.timeout";
/// Minimum interval between a requester's requests, in seconds.
pub const COOLDOWN_KEY: &str = "request.cooldown";

const TIMEOUT_DEFAULT: i64 = 20;
const TIMEOUT_MIN: i64 = 5;
const TIMEOUT_MAX: i64 = 180;

const COOLDOWN_DEFAULT: i64 = 60;
const COOLDOWN_MIN: i64 = 0;
const COOLDOWN_MAX: i64 = 900;

/// Typed, clamped view over the live config for the request ledger.
///
/// Values are read from the backing source on every call so reconfiguration
/// applies to the next request without a restart.
#[derive(Clone)]
pub struct RequestSettings {
    source: Arc<dyn ConfigSource>,
}

impl RequestSettings {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self { source }
    }

    /// Pending-request lifetime, clamped to `[5, 180]` seconds.
    pub fn timeout(&self) -> Duration {
        clamped_secs(&*self.source, TIMEOUT_KEY, TIMEOUT_DEFAULT, TIMEOUT_MIN, TIMEOUT_MAX)
    }

    /// Requester cooldown, clamped to `[0, 900]` seconds.
    pub fn cooldown(&self) -> Duration {
        clamped_secs(
            &*self.source,
            COOLDOWN_KEY,
            COOLDOWN_DEFAULT,
            COOLDOWN_MIN,
            COOLDOWN_MAX,
        )
    }
}
