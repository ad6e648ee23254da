//! Configuration loader for password hashing cost profiles. Values come from
//! `PASSWORD_HASH_*` environment variables or from a JSON file; anything unset
//! falls back to the library defaults and anything unparsable is rejected here
//! so the hashing code only ever sees positive integers.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::crypto::passwords::HashParameters;

pub const PASSWORD_HASH_TIMES: &str = "PASSWORD_HASH_TIMES";
pub const PASSWORD_HASH_MEMORY: &str = "PASSWORD_HASH_MEMORY";
pub const PASSWORD_HASH_THREADS: &str = "PASSWORD_HASH_THREADS";
pub const PASSWORD_HASH_KEY_LENGTH: &str = "PASSWORD_HASH_KEY_LENGTH";
pub const PASSWORD_HASH_SALT_LENGTH: &str = "PASSWORD_HASH_SALT_LENGTH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file unreadable: {0}")]
    Io(String),
    #[error("config parse failed: {0}")]
    Parse(String),
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl HashParameters {
    /// Reads the cost profile from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the cost profile through `lookup`, which returns the raw value for
    /// a variable name or `None` when it is unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = HashParameters::default();
        let params = HashParameters {
            iterations: read_var(&lookup, PASSWORD_HASH_TIMES, defaults.iterations)?,
            memory_kib: read_var(&lookup, PASSWORD_HASH_MEMORY, defaults.memory_kib)?,
            parallelism: read_var(&lookup, PASSWORD_HASH_THREADS, defaults.parallelism)?,
            key_length: read_var(&lookup, PASSWORD_HASH_KEY_LENGTH, defaults.key_length)?,
            salt_length: read_var(&lookup, PASSWORD_HASH_SALT_LENGTH, defaults.salt_length)?,
        };
        debug!(?params, "loaded password hash parameters");
        Ok(params)
    }
}

fn read_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: PositiveInt,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => {
            let value: T = raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.clone(),
                reason: format!("{e}"),
            })?;
            ensure_positive(key, value)
        }
    }
}

trait PositiveInt: std::str::FromStr<Err = std::num::ParseIntError> + Copy + Default + PartialEq + ToString {}

impl PositiveInt for u8 {}
impl PositiveInt for u32 {}

fn ensure_positive<T: PositiveInt>(key: &str, value: T) -> Result<T, ConfigError> {
    if value == T::default() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

/// `passwordHash` section of the JSON config file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawPasswordHashConfig {
    pub times: Option<u32>,
    pub memory: Option<u32>,
    pub threads: Option<u8>,
    pub key_length: Option<u32>,
    pub salt_length: Option<u32>,
}

impl RawPasswordHashConfig {
    fn resolve(&self) -> Result<HashParameters, ConfigError> {
        let defaults = HashParameters::default();
        Ok(HashParameters {
            iterations: ensure_positive("passwordHash.times", self.times.unwrap_or(defaults.iterations))?,
            memory_kib: ensure_positive("passwordHash.memory", self.memory.unwrap_or(defaults.memory_kib))?,
            parallelism: ensure_positive("passwordHash.threads", self.threads.unwrap_or(defaults.parallelism))?,
            key_length: ensure_positive(
                "passwordHash.keyLength",
                self.key_length.unwrap_or(defaults.key_length),
            )?,
            salt_length: ensure_positive(
                "passwordHash.saltLength",
                self.salt_length.unwrap_or(defaults.salt_length),
            )?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfig {
    #[serde(default)]
    pub password_hash: RawPasswordHashConfig,
    pub log_level: Option<String>,
}

#[derive(Debug)]
pub struct RuntimeConfig {
    pub password_hash: HashParameters,
    pub log_level: Option<String>,
}

/// Loads the JSON configuration file and resolves defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<RuntimeConfig, ConfigError> {
    let raw_json = fs::read_to_string(&path).map_err(|e| ConfigError::Io(format!("{e}")))?;
    let raw_config: RawConfig =
        serde_json::from_str(&raw_json).map_err(|e| ConfigError::Parse(format!("{e}")))?;

    let password_hash = raw_config.password_hash.resolve()?;
    debug!(path = %path.as_ref().display(), ?password_hash, "loaded config file");

    Ok(RuntimeConfig {
        password_hash,
        log_level: raw_config.log_level,
    })
}
