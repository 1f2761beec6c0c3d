//! Orchestrator configuration.
//!
//! Two profiles share one schema: post-acceptance transfers read the
//! `transfer.*` keys, return trips read either the same keys or their
//! `return.*` twins depending on `return.use_transfer_values`.

use std::sync::Arc;
use std::time::Duration;
use teleport_core::{clamped_float, clamped_secs, flag, ConfigSource};

pub const DELAY_KEY: &str = "transfer.delay";
pub const FREEZE_KEY: &str = "transfer.freeze";
pub const MUST_STAND_STILL_KEY: &str = "transfer.must_stand_still";
pub const MOVEMENT_LEEWAY_KEY: &str = "transfer.movement_leeway";

pub const RETURN_DELAY_KEY: &str = "return.delay";
pub const RETURN_FREEZE_KEY: &str = "return.freeze";
pub const RETURN_MUST_STAND_STILL_KEY: &str = "return.must_stand_still";
pub const RETURN_MOVEMENT_LEEWAY_KEY: &str = "return.movement_leeway";
/// When set (the default), return trips reuse the `transfer.*` values.
pub const USE_TRANSFER_VALUES_KEY: &str = "return.use_transfer_values";

/// Whether a move may land in a different world than the mover stands in.
pub const CROSS_WORLD_KEY: &str = "world.cross_teleportation";

const DELAY_DEFAULT: i64 = 1;
const DELAY_MIN: i64 = 0;
const DELAY_MAX: i64 = 60;

const LEEWAY_DEFAULT: f64 = 1.0;
const LEEWAY_MIN: f64 = 0.8;
const LEEWAY_MAX: f64 = 128.0;

/// Which flavor of delay window a pending transfer runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsProfile {
    /// Post-acceptance transfer between two actors.
    Transfer,
    /// Return trip to a remembered position.
    Return,
}

/// Typed, clamped view over the live config for the orchestrator.
#[derive(Clone)]
pub struct TransferSettings {
    source: Arc<dyn ConfigSource>,
}

impl TransferSettings {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self { source }
    }

    /// Return trips fold into the transfer profile when configured to share
    /// its values.
    fn effective(&self, profile: SettingsProfile) -> SettingsProfile {
        match profile {
            SettingsProfile::Return if flag(&*self.source, USE_TRANSFER_VALUES_KEY, true) => {
                SettingsProfile::Transfer
            }
            other => other,
        }
    }

    /// Delay between acceptance (or return start) and the move, clamped to
    /// `[0, 60]` seconds.
    pub fn delay(&self, profile: SettingsProfile) -> Duration {
        let key = match self.effective(profile) {
            SettingsProfile::Transfer => DELAY_KEY,
            SettingsProfile::Return => RETURN_DELAY_KEY,
        };
        clamped_secs(&*self.source, key, DELAY_DEFAULT, DELAY_MIN, DELAY_MAX)
    }

    /// Whether the mover is movement-impaired for the delay window.
    pub fn freeze(&self, profile: SettingsProfile) -> bool {
        let key = match self.effective(profile) {
            SettingsProfile::Transfer => FREEZE_KEY,
            SettingsProfile::Return => RETURN_FREEZE_KEY,
        };
        flag(&*self.source, key, true)
    }

    /// Whether the mover must hold position during the delay.
    pub fn must_stand_still(&self, profile: SettingsProfile) -> bool {
        let key = match self.effective(profile) {
            SettingsProfile::Transfer => MUST_STAND_STILL_KEY,
            SettingsProfile::Return => RETURN_MUST_STAND_STILL_KEY,
        };
        flag(&*self.source, key, true)
    }

    /// How far the mover may drift from the anchor before the move is
    /// abandoned, clamped to `[0.8, 128.0]`.
    pub fn movement_leeway(&self, profile: SettingsProfile) -> f64 {
        let key = match self.effective(profile) {
            SettingsProfile::Transfer => MOVEMENT_LEEWAY_KEY,
            SettingsProfile::Return => RETURN_MOVEMENT_LEEWAY_KEY,
        };
        clamped_float(&*self.source, key, LEEWAY_DEFAULT, LEEWAY_MIN, LEEWAY_MAX)
    }

    /// Whether moves may cross worlds.
    pub fn cross_world_allowed(&self) -> bool {
        flag(&*self.source, CROSS_WORLD_KEY, true)
    }
}
