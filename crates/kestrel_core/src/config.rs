//! Hot-updatable numeric tuning, grouped by consumer (`capital.*`,
//! `antimev.*`, `router.*`).
//!
//! This module holds the pure half: the enumerated key set and the
//! fail-closed resolution discipline. The mutable, subscriber-notified
//! half (the daemon that holds the live snapshot behind a watch
//! channel) lives in the infra crate.

use std::collections::BTreeMap;
use std::fmt;

/// Recognized tuning keys. Unknown keys are rejected, never absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigKey {
    AntimevJitterMaxMs,
    AntimevEpochMs,
    AntimevDecoyPct,
    CapitalKill,
    CapitalAccountCap,
    CapitalStrategyCap,
    CapitalDailyLossCap,
    RouterBaseMs,
    RouterFactor,
    RouterMaxMs,
    RouterJitterPct,
}

pub const ALL_KEYS: &[ConfigKey] = &[
    ConfigKey::AntimevJitterMaxMs,
    ConfigKey::AntimevEpochMs,
    ConfigKey::AntimevDecoyPct,
    ConfigKey::CapitalKill,
    ConfigKey::CapitalAccountCap,
    ConfigKey::CapitalStrategyCap,
    ConfigKey::CapitalDailyLossCap,
    ConfigKey::RouterBaseMs,
    ConfigKey::RouterFactor,
    ConfigKey::RouterMaxMs,
    ConfigKey::RouterJitterPct,
];

pub const EXPECTED_KEY_COUNT: usize = 11;

impl ConfigKey {
    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::AntimevJitterMaxMs => "antimev.jitterMaxMs",
            ConfigKey::AntimevEpochMs => "antimev.epochMs",
            ConfigKey::AntimevDecoyPct => "antimev.decoyPct",
            ConfigKey::CapitalKill => "capital.kill",
            ConfigKey::CapitalAccountCap => "capital.accountCap",
            ConfigKey::CapitalStrategyCap => "capital.strategyCap",
            ConfigKey::CapitalDailyLossCap => "capital.dailyLossCap",
            ConfigKey::RouterBaseMs => "router.baseMs",
            ConfigKey::RouterFactor => "router.factor",
            ConfigKey::RouterMaxMs => "router.maxMs",
            ConfigKey::RouterJitterPct => "router.jitterPct",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ALL_KEYS.iter().copied().find(|k| k.name() == name)
    }

    /// Appendix-style hardcoded default, used when no override is given.
    pub fn default_value(self) -> f64 {
        match self {
            ConfigKey::AntimevJitterMaxMs => 250.0,
            ConfigKey::AntimevEpochMs => 2_000.0,
            ConfigKey::AntimevDecoyPct => 0.0,
            ConfigKey::CapitalKill => 0.0,
            ConfigKey::CapitalAccountCap => 250_000.0,
            ConfigKey::CapitalStrategyCap => 100_000.0,
            ConfigKey::CapitalDailyLossCap => 50_000.0,
            ConfigKey::RouterBaseMs => 200.0,
            ConfigKey::RouterFactor => 2.0,
            ConfigKey::RouterMaxMs => 8_000.0,
            ConfigKey::RouterJitterPct => 20.0,
        }
    }
}

/// A key's override failed fail-closed validation (non-finite or negative).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissingConfigError {
    pub key: ConfigKey,
    pub reason: &'static str,
}

impl fmt::Display for MissingConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config key {}: {}", self.key.name(), self.reason)
    }
}

impl std::error::Error for MissingConfigError {}

/// Resolve one key: explicit override wins if finite and non-negative,
/// otherwise the hardcoded default applies.
pub fn resolve_config_value(
    key: ConfigKey,
    override_value: Option<f64>,
) -> Result<f64, MissingConfigError> {
    match override_value {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Some(_) => Err(MissingConfigError {
            key,
            reason: "override must be finite and non-negative",
        }),
        None => Ok(key.default_value()),
    }
}

/// Rejecting a raw override map: either an unknown key, or a known key
/// with an invalid value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    UnknownKey(String),
    Invalid(MissingConfigError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownKey(k) => write!(f, "unrecognized config key: {k}"),
            ConfigError::Invalid(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A fully-resolved snapshot of every tuning key, ready for O(1) lookup
/// by consumers. Immutable; replaced wholesale on update.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSnapshot {
    values: BTreeMap<ConfigKey, f64>,
}

impl ConfigSnapshot {
    /// All keys at their hardcoded defaults.
    pub fn defaults() -> Self {
        let values = ALL_KEYS.iter().map(|k| (*k, k.default_value())).collect();
        Self { values }
    }

    /// Build a snapshot from a raw `name -> value` override map, applied
    /// on top of defaults. Rejects any name not in `ALL_KEYS`.
    pub fn from_overrides(raw: &BTreeMap<String, f64>) -> Result<Self, ConfigError> {
        let mut values: BTreeMap<ConfigKey, f64> =
            ALL_KEYS.iter().map(|k| (*k, k.default_value())).collect();
        for (name, value) in raw {
            let key = ConfigKey::from_name(name)
                .ok_or_else(|| ConfigError::UnknownKey(name.clone()))?;
            let resolved =
                resolve_config_value(key, Some(*value)).map_err(ConfigError::Invalid)?;
            values.insert(key, resolved);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: ConfigKey) -> f64 {
        self.values[&key]
    }

    pub fn antimev_jitter_max_ms(&self) -> f64 {
        self.get(ConfigKey::AntimevJitterMaxMs)
    }
    pub fn antimev_epoch_ms(&self) -> f64 {
        self.get(ConfigKey::AntimevEpochMs)
    }
    pub fn antimev_decoy_pct(&self) -> f64 {
        self.get(ConfigKey::AntimevDecoyPct)
    }
    pub fn capital_kill(&self) -> bool {
        self.get(ConfigKey::CapitalKill) != 0.0
    }
    pub fn capital_account_cap(&self) -> f64 {
        self.get(ConfigKey::CapitalAccountCap)
    }
    pub fn capital_strategy_cap(&self) -> f64 {
        self.get(ConfigKey::CapitalStrategyCap)
    }
    pub fn capital_daily_loss_cap(&self) -> f64 {
        self.get(ConfigKey::CapitalDailyLossCap)
    }
    pub fn router_base_ms(&self) -> f64 {
        self.get(ConfigKey::RouterBaseMs)
    }
    pub fn router_factor(&self) -> f64 {
        self.get(ConfigKey::RouterFactor)
    }
    pub fn router_max_ms(&self) -> f64 {
        self.get(ConfigKey::RouterMaxMs)
    }
    pub fn router_jitter_pct(&self) -> f64 {
        self.get(ConfigKey::RouterJitterPct).clamp(0.0, 100.0)
    }
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self::defaults()
    }
}
