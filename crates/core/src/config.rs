//! Live configuration surface.
//!
//! The core does not parse or persist configuration; it reads values through
//! an injected [`ConfigSource`] on every use, so a reloaded config takes
//! effect without restarting anything. Numeric values are clamped into
//! documented bounds at read time, not at write time - an out-of-range value
//! in the backing store is tolerated, never propagated.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::trace;

/// A value held by a configuration backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// String-keyed configuration backend.
///
/// Implementations wrap whatever the embedder uses (a YAML file watcher, a
/// remote store, a fixed map). Missing keys fall back to the caller's
/// default, so a partial config is always valid.
pub trait ConfigSource: Send + Sync {
    fn get_int(&self, key: &str) -> Option<i64>;
    fn get_float(&self, key: &str) -> Option<f64>;
    fn get_bool(&self, key: &str) -> Option<bool>;
}

/// Read an integer number of seconds, clamped into `[min, max]`, as a
/// [`Duration`].
pub fn clamped_secs(
    source: &dyn ConfigSource,
    key: &str,
    default: i64,
    min: i64,
    max: i64,
) -> Duration {
    debug_assert!(min <= max, "clamped_secs: min must not exceed max");
    let raw = source.get_int(key).unwrap_or(default);
    let clamped = raw.clamp(min, max);
    if clamped != raw {
        trace!(key, raw, clamped, "Clamped out-of-range config value");
    }
    Duration::from_secs(clamped.max(0) as u64)
}

/// Read a float, clamped into `[min, max]`.
pub fn clamped_float(
    source: &dyn ConfigSource,
    key: &str,
    default: f64,
    min: f64,
    max: f64,
) -> f64 {
    debug_assert!(min <= max, "clamped_float: min must not exceed max");
    let raw = source.get_float(key).unwrap_or(default);
    let clamped = raw.clamp(min, max);
    if clamped != raw {
        trace!(key, raw, clamped, "Clamped out-of-range config value");
    }
    clamped
}

/// Read a boolean toggle.
pub fn flag(source: &dyn ConfigSource, key: &str, default: bool) -> bool {
    source.get_bool(key).unwrap_or(default)
}

/// Map-backed [`ConfigSource`] for tests, simulation, and simple embedders.
///
/// Values can be changed through a shared handle while the machine is
/// running, which is exactly how live reconfiguration behaves in production.
#[derive(Debug, Default)]
pub struct StaticConfig {
    values: Mutex<HashMap<String, ConfigValue>>,
}

impl StaticConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace a value.
    pub fn set(&self, key: &str, value: ConfigValue) {
        self.values
            .lock()
            .expect("config mutex poisoned")
            .insert(key.to_string(), value);
    }

    /// Remove a value, restoring the caller-side default for that key.
    pub fn unset(&self, key: &str) {
        self.values
            .lock()
            .expect("config mutex poisoned")
            .remove(key);
    }

    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.values
            .lock()
            .expect("config mutex poisoned")
            .get(key)
            .copied()
    }
}

impl ConfigSource for StaticConfig {
    fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(ConfigValue::Int(v)) => Some(v),
            _ => None,
        }
    }

    fn get_float(&self, key: &str) -> Option<f64> {
        match self.get(key) {
            Some(ConfigValue::Float(v)) => Some(v),
            Some(ConfigValue::Int(v)) => Some(v as f64),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(ConfigValue::Bool(v)) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = StaticConfig::new();
        assert_eq!(
            clamped_secs(&config, "request.timeout", 20, 5, 180),
            Duration::from_secs(20)
        );
        assert!(flag(&config, "transfer.freeze", true));
    }

    #[test]
    fn out_of_range_values_are_clamped_at_read_time() {
        let config = StaticConfig::new();
        config.set("request.timeout", ConfigValue::Int(9999));
        assert_eq!(
            clamped_secs(&config, "request.timeout", 20, 5, 180),
            Duration::from_secs(180)
        );

        config.set("request.timeout", ConfigValue::Int(1));
        assert_eq!(
            clamped_secs(&config, "request.timeout", 20, 5, 180),
            Duration::from_secs(5)
        );

        config.set("transfer.movement_leeway", ConfigValue::Float(0.1));
        assert_eq!(
            clamped_float(&config, "transfer.movement_leeway", 1.0, 0.8, 128.0),
            0.8
        );
    }

    #[test]
    fn live_updates_are_visible_on_next_read() {
        let config = StaticConfig::new();
        config.set("request.cooldown", ConfigValue::Int(60));
        assert_eq!(
            clamped_secs(&config, "request.cooldown", 60, 0, 900),
            Duration::from_secs(60)
        );

        config.set("request.cooldown", ConfigValue::Int(120));
        assert_eq!(
            clamped_secs(&config, "request.cooldown", 60, 0, 900),
            Duration::from_secs(120)
        );
    }
}
