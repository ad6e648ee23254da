//! Small utility crate centred on Argon2id password hashing.
//! Hashes are self-describing strings, cost parameters come from the
//! environment or a JSON file, and all randomness is drawn from an injectable
//! cryptographically secure source.

pub mod config;
pub mod crypto;
pub mod logging;

pub use crypto::passwords::{compare_password, hash_password, HashParameters, PasswordError};
