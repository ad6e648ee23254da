//! Minimal CLI over the password hashing helpers. Commands are kept small so
//! operators can see exactly which parameters a hash was produced with.

use std::env;
use std::process::ExitCode;

use serde_json::json;
use tracing::error;
use utils_rs::config::load_config;
use utils_rs::crypto::passwords::{compare_password, hash_password, HashParameters};
use utils_rs::crypto::random::{random_alphanumeric, random_printable};
use utils_rs::logging;

fn print_usage() -> ExitCode {
    eprintln!("Commands:\n  hash-password <plaintext>\n  verify-password <plaintext> <encoded-hash>\n  show-params [config.json]\n  random-string <alnum|printable> <length>");
    ExitCode::from(2)
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if let Err(err) = logging::init(None) {
        eprintln!("logging setup failed: {err}");
    }
    if args.len() < 2 {
        return print_usage();
    }

    match args[1].as_str() {
        "hash-password" => {
            if args.len() != 3 {
                return print_usage();
            }
            let params = match HashParameters::from_env() {
                Ok(p) => p,
                Err(err) => {
                    error!(%err, "invalid password hash configuration");
                    return ExitCode::FAILURE;
                }
            };
            match hash_password(&args[2], &params) {
                Ok(hash) => println!("{hash}"),
                Err(err) => {
                    error!(%err, "hashing failed");
                    return ExitCode::FAILURE;
                }
            }
        }
        "verify-password" => {
            if args.len() != 4 {
                return print_usage();
            }
            match compare_password(&args[2], &args[3]) {
                Ok(true) => println!("match"),
                Ok(false) => {
                    println!("no-match");
                    return ExitCode::FAILURE;
                }
                Err(err) => {
                    error!(%err, "encoded hash rejected");
                    return ExitCode::FAILURE;
                }
            }
        }
        "show-params" => {
            let loaded = match args.len() {
                2 => HashParameters::from_env().map(|p| (p, None)),
                3 => load_config(&args[2]).map(|cfg| (cfg.password_hash, cfg.log_level)),
                _ => return print_usage(),
            };
            match loaded {
                Ok((params, log_level)) => {
                    let printable = json!({
                        "passwordHash": params,
                        "logLevel": log_level,
                    });
                    match serde_json::to_string_pretty(&printable) {
                        Ok(text) => println!("{text}"),
                        Err(err) => {
                            error!(%err, "could not render parameters");
                            return ExitCode::FAILURE;
                        }
                    }
                }
                Err(err) => {
                    error!(%err, "config load failed");
                    return ExitCode::FAILURE;
                }
            }
        }
        "random-string" => {
            if args.len() != 4 {
                return print_usage();
            }
            let length: usize = match args[3].parse() {
                Ok(n) => n,
                Err(err) => {
                    error!(%err, "length must be a non-negative integer");
                    return print_usage();
                }
            };
            let generated = match args[2].as_str() {
                "alnum" => random_alphanumeric(length),
                "printable" => random_printable(length),
                _ => return print_usage(),
            };
            match generated {
                Ok(value) => println!("{value}"),
                Err(err) => {
                    error!(%err, "random generation failed");
                    return ExitCode::FAILURE;
                }
            }
        }
        _ => return print_usage(),
    }
    ExitCode::SUCCESS
}
