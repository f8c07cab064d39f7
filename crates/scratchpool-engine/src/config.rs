//! Pool configuration, parameter parsing and error types.
//!
//! [`PoolConfig`] is the input to [`ArenaRegistry::new`](crate::ArenaRegistry::new).
//! It can be built directly, from a key/value parameter source with
//! [`from_params`](PoolConfig::from_params), or from `SCRATCHPOOL_*`
//! environment variables with [`from_env`](PoolConfig::from_env).

use std::error::Error;
use std::fmt;

use scratchpool_arena::{ArenaConfig, ArenaError};

use crate::poison::FillTarget;

// ── Parameter keys ─────────────────────────────────────────────────

/// Enables poison fill of new floating-point arrays.
pub const KEY_INIT_SNAN: &str = "scratchpool.init_snan";
/// Number of arenas (worker ordinals) to create.
pub const KEY_WORKER_COUNT: &str = "scratchpool.worker_count";
/// Bytes each arena allocates, zeroes and frees during `init`.
pub const KEY_WARMUP_BYTES: &str = "scratchpool.warmup_bytes";
/// Minimum chunk size requested from the system allocator.
pub const KEY_MIN_CHUNK_BYTES: &str = "scratchpool.min_chunk_bytes";
/// Where poison fill runs: `host` or `device`.
pub const KEY_FILL_TARGET: &str = "scratchpool.fill_target";

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while building or validating a [`PoolConfig`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A parameter value could not be parsed.
    InvalidValue {
        /// The parameter key.
        key: String,
        /// The rejected value.
        value: String,
        /// What was expected instead.
        expected: &'static str,
    },
    /// `worker_count` was explicitly set to zero.
    ZeroWorkers,
    /// `worker_count` exceeds [`PoolConfig::MAX_WORKERS`].
    TooManyWorkers {
        /// The configured count.
        configured: usize,
    },
    /// The per-arena configuration is invalid.
    Arena(ArenaError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue {
                key,
                value,
                expected,
            } => write!(f, "{key}: expected {expected}, got {value:?}"),
            Self::ZeroWorkers => write!(f, "worker_count must be at least 1"),
            Self::TooManyWorkers { configured } => write!(
                f,
                "worker_count {configured} exceeds maximum of {}",
                PoolConfig::MAX_WORKERS
            ),
            Self::Arena(e) => write!(f, "arena: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for ConfigError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

// ── PoolConfig ─────────────────────────────────────────────────────

/// Complete configuration for an [`ArenaRegistry`](crate::ArenaRegistry).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Poison every new floating-point array with a signaling NaN.
    /// Default: `false`.
    pub init_snan: bool,
    /// Number of arenas. `None` = the thread-index facility's
    /// `max_workers()` at `init` time.
    pub worker_count: Option<usize>,
    /// Bytes allocated, zeroed and freed on every arena during `init`.
    /// Default: 8 MiB (one million `f64`). Zero disables the warm-up.
    pub warmup_bytes: usize,
    /// Where poison fill runs when the dispatcher is an accelerator.
    /// Default: [`FillTarget::Host`].
    pub fill_target: FillTarget,
    /// Per-arena alignment and growth parameters.
    pub arena: ArenaConfig,
}

impl PoolConfig {
    /// Default warm-up size: one million `f64` elements.
    pub const DEFAULT_WARMUP_BYTES: usize = 1024 * 1024 * std::mem::size_of::<f64>();

    /// Upper bound on `worker_count`.
    pub const MAX_WORKERS: usize = 4096;

    /// Check all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.worker_count {
            Some(0) => return Err(ConfigError::ZeroWorkers),
            Some(n) if n > Self::MAX_WORKERS => {
                return Err(ConfigError::TooManyWorkers { configured: n })
            }
            _ => {}
        }
        self.arena.validate()?;
        Ok(())
    }

    /// Build a config from a key/value parameter source.
    ///
    /// Keys that `lookup` does not know keep their defaults. The result is
    /// validated before it is returned.
    pub fn from_params<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = lookup(KEY_INIT_SNAN) {
            config.init_snan = parse_bool(KEY_INIT_SNAN, &v)?;
        }
        if let Some(v) = lookup(KEY_WORKER_COUNT) {
            config.worker_count = Some(parse_usize(KEY_WORKER_COUNT, &v)?);
        }
        if let Some(v) = lookup(KEY_WARMUP_BYTES) {
            config.warmup_bytes = parse_usize(KEY_WARMUP_BYTES, &v)?;
        }
        if let Some(v) = lookup(KEY_MIN_CHUNK_BYTES) {
            config.arena.min_chunk_bytes = parse_usize(KEY_MIN_CHUNK_BYTES, &v)?;
        }
        if let Some(v) = lookup(KEY_FILL_TARGET) {
            config.fill_target = match v.trim().to_ascii_lowercase().as_str() {
                "host" => FillTarget::Host,
                "device" => FillTarget::Device,
                _ => return Err(invalid(KEY_FILL_TARGET, &v, "`host` or `device`")),
            };
        }
        config.validate()?;
        Ok(config)
    }

    /// Build a config from environment variables.
    ///
    /// Each key maps to an upper-case variable with dots replaced by
    /// underscores: `scratchpool.init_snan` → `SCRATCHPOOL_INIT_SNAN`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_params(|key| std::env::var(env_var_name(key)).ok())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            init_snan: false,
            worker_count: None,
            warmup_bytes: Self::DEFAULT_WARMUP_BYTES,
            fill_target: FillTarget::Host,
            arena: ArenaConfig::default(),
        }
    }
}

/// Environment variable name for a parameter key.
pub fn env_var_name(key: &str) -> String {
    key.replace('.', "_").to_ascii_uppercase()
}

fn invalid(key: &str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(invalid(key, value, "a boolean")),
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .replace('_', "")
        .parse()
        .map_err(|_| invalid(key, value, "a non-negative integer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn params(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_is_valid_and_poison_off() {
        let config = PoolConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.init_snan);
        assert_eq!(config.warmup_bytes, 8 * 1024 * 1024);
    }

    #[test]
    fn empty_source_gives_defaults() {
        let config = PoolConfig::from_params(|_| None).unwrap();
        assert_eq!(config, PoolConfig::default());
    }

    #[test]
    fn parses_every_key() {
        let config = PoolConfig::from_params(params(&[
            (KEY_INIT_SNAN, "on"),
            (KEY_WORKER_COUNT, "6"),
            (KEY_WARMUP_BYTES, "65_536"),
            (KEY_MIN_CHUNK_BYTES, "4096"),
            (KEY_FILL_TARGET, "Device"),
        ]))
        .unwrap();
        assert!(config.init_snan);
        assert_eq!(config.worker_count, Some(6));
        assert_eq!(config.warmup_bytes, 65_536);
        assert_eq!(config.arena.min_chunk_bytes, 4096);
        assert_eq!(config.fill_target, FillTarget::Device);
    }

    #[test]
    fn bool_spellings() {
        for (v, expected) in [("1", true), ("TRUE", true), ("yes", true), ("0", false), ("off", false)] {
            let config = PoolConfig::from_params(params(&[(KEY_INIT_SNAN, v)])).unwrap();
            assert_eq!(config.init_snan, expected, "{v}");
        }
    }

    #[test]
    fn bad_bool_is_rejected() {
        match PoolConfig::from_params(params(&[(KEY_INIT_SNAN, "maybe")])) {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, KEY_INIT_SNAN),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn bad_fill_target_is_rejected() {
        assert!(PoolConfig::from_params(params(&[(KEY_FILL_TARGET, "gpu0")])).is_err());
    }

    #[test]
    fn zero_workers_rejected() {
        let result = PoolConfig::from_params(params(&[(KEY_WORKER_COUNT, "0")]));
        assert_eq!(result, Err(ConfigError::ZeroWorkers));
    }

    #[test]
    fn too_many_workers_rejected() {
        let config = PoolConfig {
            worker_count: Some(PoolConfig::MAX_WORKERS + 1),
            ..PoolConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooManyWorkers { .. })
        ));
    }

    #[test]
    fn arena_error_is_wrapped_with_source() {
        let result = PoolConfig::from_params(params(&[(KEY_MIN_CHUNK_BYTES, "1")]));
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Arena(_)));
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("arena:"));
    }

    #[test]
    fn env_var_names() {
        assert_eq!(env_var_name(KEY_INIT_SNAN), "SCRATCHPOOL_INIT_SNAN");
        assert_eq!(env_var_name(KEY_FILL_TARGET), "SCRATCHPOOL_FILL_TARGET");
    }
}
