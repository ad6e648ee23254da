//! Cryptography module exposing password hashing and random string helpers.
//! Both submodules draw randomness from the same secure generator type so the
//! entropy story stays in one place.

pub mod passwords;
pub mod random;
