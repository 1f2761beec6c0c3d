//! Location memory configuration.

use std::sync::Arc;
use std::time::Duration;
use teleport_core::{clamped_secs, flag, ConfigSource};

/// Whether the return command is available at all.
pub const ENABLED_KEY: &str = "return.enabled";
/// How long a return point is kept, in seconds. Zero disables remembering.
pub const AVAILABLE_FOR_KEY: &str = "return.available_for";

const AVAILABLE_FOR_DEFAULT: i64 = 60;
const AVAILABLE_FOR_MIN: i64 = 0;
const AVAILABLE_FOR_MAX: i64 = 900;

/// Typed, clamped view over the live config for location memory.
#[derive(Clone)]
pub struct RecallSettings {
    source: Arc<dyn ConfigSource>,
}

impl RecallSettings {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self { source }
    }

    /// Whether returning to a remembered position is enabled.
    pub fn enabled(&self) -> bool {
        flag(&*self.source, ENABLED_KEY, true)
    }

    /// Retention window, clamped to `[0, 900]` seconds. Zero means
    /// "do not remember".
    pub fn available_for(&self) -> Duration {
        clamped_secs(
            &*self.source,
            AVAILABLE_FOR_KEY,
            AVAILABLE_FOR_DEFAULT,
            AVAILABLE_FOR_MIN,
            AVAILABLE_FOR_MAX,
        )
    }
}
