//! Random string generation for tokens, temporary passwords, and identifiers.
//! Every byte comes from a cryptographically secure generator; the generator is
//! injectable so entropy failures can be exercised in tests.

use base64::{engine::general_purpose::URL_SAFE, Engine};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use thiserror::Error;
use tracing::warn;

/// Character set used by [`random_printable`].
pub const PRINTABLE: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()-_=+[]{}|;:,.<>?/`~";

#[derive(Debug, Error)]
pub enum RandomError {
    #[error("random source failed: {0}")]
    Source(#[from] rand::Error),
}

/// Returns `length` characters drawn from the URL-safe base64 alphabet
/// (`A-Z`, `a-z`, `0-9`, `-`, `_`).
pub fn random_alphanumeric(length: usize) -> Result<String, RandomError> {
    random_alphanumeric_with_rng(&mut OsRng, length)
}

pub fn random_alphanumeric_with_rng<R>(rng: &mut R, length: usize) -> Result<String, RandomError>
where
    R: RngCore + CryptoRng,
{
    let mut bytes = vec![0u8; length];
    fill(rng, &mut bytes)?;
    let mut encoded = URL_SAFE.encode(&bytes);
    encoded.truncate(length);
    Ok(encoded)
}

/// Returns `length` characters drawn uniformly from [`PRINTABLE`].
pub fn random_printable(length: usize) -> Result<String, RandomError> {
    random_printable_with_rng(&mut OsRng, length)
}

pub fn random_printable_with_rng<R>(rng: &mut R, length: usize) -> Result<String, RandomError>
where
    R: RngCore + CryptoRng,
{
    let charset = PRINTABLE.as_bytes();
    // Bytes at or above this bound would bias the modulo toward the first characters.
    let bound = 256 - (256 % charset.len());

    let mut result = String::with_capacity(length);
    let mut buffer = vec![0u8; length.max(1)];
    while result.len() < length {
        fill(rng, &mut buffer)?;
        for &byte in &buffer {
            if result.len() == length {
                break;
            }
            if usize::from(byte) < bound {
                result.push(char::from(charset[usize::from(byte) % charset.len()]));
            }
        }
    }
    Ok(result)
}

fn fill<R: RngCore>(rng: &mut R, dest: &mut [u8]) -> Result<(), RandomError> {
    rng.try_fill_bytes(dest).map_err(|e| {
        warn!(error = %e, "random source failed while generating string");
        RandomError::Source(e)
    })
}
