//! Password hashing helpers built around Argon2id.
//! Hashes are stored as a self-describing `$`-delimited string so the salt and
//! cost parameters travel with the derived key and verification never depends
//! on the caller's current configuration.

use std::fmt;
use std::str::FromStr;

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::Serialize;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, warn};
use zeroize::{Zeroize, Zeroizing};

/// Algorithm identifier written into the first field of every encoded hash.
pub const ALGORITHM: &str = "argon2id";

/// Argon2 internal revision (0x13). This is the algorithm's version, not ours.
pub const ARGON2_VERSION: u32 = 0x13;

pub const DEFAULT_ITERATIONS: u32 = 1;
pub const DEFAULT_MEMORY_KIB: u32 = 64 * 1024;
pub const DEFAULT_PARALLELISM: u8 = 4;
pub const DEFAULT_KEY_LENGTH: u32 = 32;
pub const DEFAULT_SALT_LENGTH: u32 = 16;

const FIELD_COUNT: usize = 6;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("random source failed: {0}")]
    RandomSource(#[source] rand::Error),
    #[error("invalid encoded hash format")]
    InvalidHashFormat,
    #[error("invalid encoded hash algorithm")]
    InvalidHashAlgorithm,
    #[error("malformed version field: {0}")]
    MalformedVersion(String),
    #[error("unsupported argon2 version {0}; expected {expected}", expected = ARGON2_VERSION)]
    InvalidHashVersion(u32),
    #[error("malformed parameter field: {0}")]
    MalformedParameterField(String),
    #[error("base64 decoding failed: {0}")]
    MalformedEncoding(#[from] base64::DecodeError),
    #[error("argon2 derivation failed: {0}")]
    Derivation(#[from] argon2::Error),
}

/// Cost profile for a single hashing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HashParameters {
    /// Number of passes over memory.
    pub iterations: u32,
    /// Working set in KiB.
    pub memory_kib: u32,
    /// Lanes; Argon2 requires at least `8 * parallelism` KiB of memory.
    pub parallelism: u8,
    /// Derived key length in bytes.
    pub key_length: u32,
    /// Random salt length in bytes.
    pub salt_length: u32,
}

impl Default for HashParameters {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            memory_kib: DEFAULT_MEMORY_KIB,
            parallelism: DEFAULT_PARALLELISM,
            key_length: DEFAULT_KEY_LENGTH,
            salt_length: DEFAULT_SALT_LENGTH,
        }
    }
}

/// Parsed form of `$argon2id$v=19$m=<kib>,t=<iterations>,p=<lanes>$<salt>$<hash>`.
///
/// Parsing checks structure only; it never runs the key derivation. Salt and
/// hash bytes are wiped when the value is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedHash {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u8,
    pub salt: Vec<u8>,
    pub hash: Vec<u8>,
}

impl EncodedHash {
    /// Re-derives a key from `password` with the embedded salt and cost
    /// parameters and compares it to the stored hash in constant time.
    pub fn verify(&self, password: &str) -> Result<bool, PasswordError> {
        debug!(
            memory_kib = self.memory_kib,
            iterations = self.iterations,
            parallelism = self.parallelism,
            key_length = self.hash.len(),
            "verifying password against encoded hash"
        );
        let candidate = derive_key(
            password.as_bytes(),
            &self.salt,
            self.iterations,
            self.memory_kib,
            self.parallelism,
            self.hash.len(),
        )?;
        Ok(bool::from(candidate.as_slice().ct_eq(self.hash.as_slice())))
    }
}

impl fmt::Display for EncodedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${ALGORITHM}$v={ARGON2_VERSION}$m={},t={},p={}${}${}",
            self.memory_kib,
            self.iterations,
            self.parallelism,
            STANDARD_NO_PAD.encode(&self.salt),
            STANDARD_NO_PAD.encode(&self.hash),
        )
    }
}

impl FromStr for EncodedHash {
    type Err = PasswordError;

    fn from_str(encoded: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = encoded.split('$').collect();
        if parts.len() != FIELD_COUNT {
            return Err(PasswordError::InvalidHashFormat);
        }
        if parts[1] != ALGORITHM {
            return Err(PasswordError::InvalidHashAlgorithm);
        }
        if parts[2..].iter().any(|part| part.is_empty()) {
            return Err(PasswordError::InvalidHashFormat);
        }

        let version = parse_version(parts[2])?;
        if version != ARGON2_VERSION {
            return Err(PasswordError::InvalidHashVersion(version));
        }

        let (memory_kib, iterations, parallelism) = parse_cost(parts[3])?;
        let salt = STANDARD_NO_PAD.decode(parts[4])?;
        let hash = STANDARD_NO_PAD.decode(parts[5])?;

        Ok(Self {
            memory_kib,
            iterations,
            parallelism,
            salt,
            hash,
        })
    }
}

impl Drop for EncodedHash {
    fn drop(&mut self) {
        self.salt.zeroize();
        self.hash.zeroize();
    }
}

fn parse_version(field: &str) -> Result<u32, PasswordError> {
    field
        .strip_prefix("v=")
        .ok_or_else(|| PasswordError::MalformedVersion(format!("expected v=<int>, got {field:?}")))?
        .parse()
        .map_err(|e| PasswordError::MalformedVersion(format!("{e}")))
}

fn parse_cost(field: &str) -> Result<(u32, u32, u8), PasswordError> {
    let mut segments = field.split(',');
    let memory_kib = parse_cost_segment(segments.next(), "m")?;
    let iterations = parse_cost_segment(segments.next(), "t")?;
    let parallelism = parse_cost_segment(segments.next(), "p")?;
    if segments.next().is_some() {
        return Err(PasswordError::MalformedParameterField(format!(
            "unexpected trailing segment in {field:?}"
        )));
    }
    Ok((memory_kib, iterations, parallelism))
}

fn parse_cost_segment<T>(segment: Option<&str>, key: &str) -> Result<T, PasswordError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let segment = segment.ok_or_else(|| {
        PasswordError::MalformedParameterField(format!("missing {key}=<int> segment"))
    })?;
    let value = segment
        .strip_prefix(key)
        .and_then(|rest| rest.strip_prefix('='))
        .ok_or_else(|| {
            PasswordError::MalformedParameterField(format!("expected {key}=<int>, got {segment:?}"))
        })?;
    value
        .parse()
        .map_err(|e| PasswordError::MalformedParameterField(format!("{key}: {e}")))
}

fn derive_key(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    memory_kib: u32,
    parallelism: u8,
    key_length: usize,
) -> Result<Zeroizing<Vec<u8>>, PasswordError> {
    let params = Params::new(
        memory_kib,
        iterations,
        u32::from(parallelism),
        Some(key_length),
    )?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = Zeroizing::new(vec![0u8; key_length]);
    argon2.hash_password_into(password, salt, &mut output)?;
    Ok(output)
}

/// Hashes and verifies passwords, drawing salts from `R`.
///
/// The random source is a constructor argument so that tests can substitute a
/// failing or deterministic generator; production code uses [`OsRng`].
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher<R = OsRng> {
    rng: R,
}

impl PasswordHasher<OsRng> {
    pub fn new() -> Self {
        Self { rng: OsRng }
    }
}

impl<R: RngCore + CryptoRng> PasswordHasher<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Hashes `password` with a fresh salt and returns the encoded string.
    pub fn hash(&mut self, password: &str, params: &HashParameters) -> Result<String, PasswordError> {
        debug!(
            memory_kib = params.memory_kib,
            iterations = params.iterations,
            parallelism = params.parallelism,
            key_length = params.key_length,
            salt_length = params.salt_length,
            "hashing password"
        );

        let mut salt = vec![0u8; params.salt_length as usize];
        self.rng.try_fill_bytes(&mut salt).map_err(|e| {
            warn!(error = %e, "random source failed while generating salt");
            PasswordError::RandomSource(e)
        })?;

        let key = derive_key(
            password.as_bytes(),
            &salt,
            params.iterations,
            params.memory_kib,
            params.parallelism,
            params.key_length as usize,
        )?;

        let encoded = EncodedHash {
            memory_kib: params.memory_kib,
            iterations: params.iterations,
            parallelism: params.parallelism,
            salt,
            hash: key.to_vec(),
        };
        Ok(encoded.to_string())
    }

    /// Checks `password` against a previously produced encoded hash.
    ///
    /// A wrong password is `Ok(false)`. Structural defects in `encoded` are
    /// reported before any key derivation runs.
    pub fn compare(&self, password: &str, encoded: &str) -> Result<bool, PasswordError> {
        let parsed: EncodedHash = encoded.parse().map_err(|e| {
            warn!(error = %e, "rejected encoded password hash");
            e
        })?;
        parsed.verify(password)
    }
}

/// Hashes a password with Argon2id using the operating system's random source.
pub fn hash_password(password: &str, params: &HashParameters) -> Result<String, PasswordError> {
    PasswordHasher::new().hash(password, params)
}

/// Verifies a plaintext password against an encoded Argon2id hash.
/// Returns `Ok(true)` when the password matches and `Ok(false)` when it does not.
pub fn compare_password(password: &str, encoded: &str) -> Result<bool, PasswordError> {
    PasswordHasher::new().compare(password, encoded)
}
