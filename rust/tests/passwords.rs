use std::thread;

use utils_rs::config::{
    PASSWORD_HASH_KEY_LENGTH, PASSWORD_HASH_MEMORY, PASSWORD_HASH_SALT_LENGTH, PASSWORD_HASH_THREADS,
    PASSWORD_HASH_TIMES,
};
use utils_rs::crypto::passwords::{EncodedHash, PasswordHasher};
use utils_rs::{compare_password, hash_password, HashParameters, PasswordError};

fn cheap_params() -> HashParameters {
    HashParameters {
        iterations: 1,
        memory_kib: 256,
        parallelism: 2,
        key_length: 32,
        salt_length: 16,
    }
}

#[test]
fn configured_profile_round_trips() {
    let params = HashParameters::from_lookup(|key| {
        let value = match key {
            k if k == PASSWORD_HASH_TIMES => Some("2"),
            k if k == PASSWORD_HASH_MEMORY => Some("32768"),
            k if k == PASSWORD_HASH_THREADS => Some("6"),
            k if k == PASSWORD_HASH_KEY_LENGTH => Some("64"),
            k if k == PASSWORD_HASH_SALT_LENGTH => Some("32"),
            _ => None,
        };
        value.map(str::to_string)
    })
    .expect("profile should load");

    let hash = hash_password("test password", &params).expect("hashing should succeed");
    assert!(hash.starts_with("$argon2id$v=19$m=32768,t=2,p=6$"));

    let parsed: EncodedHash = hash.parse().expect("own output should parse");
    assert_eq!(parsed.hash.len(), 64);
    assert_eq!(parsed.salt.len(), 32);

    assert!(compare_password("test password", &hash).unwrap());
    assert!(!compare_password("not password", &hash).unwrap());
}

#[test]
fn hasher_instance_verifies_free_function_output() {
    let hash = hash_password("rotate me", &cheap_params()).unwrap();

    let mut hasher = PasswordHasher::new();
    assert!(hasher.compare("rotate me", &hash).unwrap());

    let rehashed = hasher.hash("rotate me", &HashParameters { iterations: 2, ..cheap_params() }).unwrap();
    assert!(rehashed.contains("$m=256,t=2,p=2$"));
    assert!(compare_password("rotate me", &rehashed).unwrap());
}

#[test]
fn hashes_concurrently() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            thread::spawn(move || {
                let password = format!("password-{i}");
                let hash = hash_password(&password, &cheap_params()).unwrap();
                (password, hash)
            })
        })
        .collect();

    let results: Vec<(String, String)> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (password, hash) in &results {
        assert!(compare_password(password, hash).unwrap());
    }
    assert!(!compare_password(&results[0].0, &results[1].1).unwrap());
}

#[test]
fn tampered_hash_does_not_match() {
    let hash = hash_password("correct horse", &cheap_params()).unwrap();
    let mut parsed: EncodedHash = hash.parse().unwrap();
    parsed.hash[0] ^= 0x01;
    assert!(!compare_password("correct horse", &parsed.to_string()).unwrap());
}

#[test]
fn structural_errors_are_distinguishable() {
    let cases = [
        ("$$", "format"),
        ("$bcrypt$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaGhhc2g", "algorithm"),
        ("$argon2id$v=16$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaGhhc2g", "version"),
        ("$argon2id$v=19$m=8;t=1;p=1$c2FsdHNhbHQ$aGFzaGhhc2g", "params"),
        ("$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$!!!", "encoding"),
    ];
    for (encoded, expected) in cases {
        let err = compare_password("password", encoded).unwrap_err();
        let kind = match err {
            PasswordError::InvalidHashFormat => "format",
            PasswordError::InvalidHashAlgorithm => "algorithm",
            PasswordError::InvalidHashVersion(_) => "version",
            PasswordError::MalformedParameterField(_) => "params",
            PasswordError::MalformedEncoding(_) => "encoding",
            other => panic!("unexpected error for {encoded}: {other}"),
        };
        assert_eq!(kind, expected, "wrong error kind for {encoded}");
    }
}
