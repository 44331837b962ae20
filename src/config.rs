// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup. Anything
//! invalid (missing credential, wrong-length envelope key) aborts the process
//! before the first allocation can be attempted.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `KEY_SERVICE_API_KEY` | API credential for the Key/Notification Services | Required |
//! | `KEY_SERVICE_BASE_URL` | Base URL of the remote service | `https://api.tatum.io` |
//! | `WEBHOOK_URL` | Callback URL for address-event subscriptions | Required |
//! | `WALLET_ENC_KEY` | 32-byte envelope key (64 hex chars or base64) | Required |
//! | `DATA_DIR` | Directory holding the embedded database | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;

use base64ct::{Base64, Encoding};
use url::Url;

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the Key Service API credential.
pub const KEY_SERVICE_API_KEY_ENV: &str = "KEY_SERVICE_API_KEY";

/// Environment variable name for the Key Service base URL.
pub const KEY_SERVICE_BASE_URL_ENV: &str = "KEY_SERVICE_BASE_URL";

/// Environment variable name for the webhook callback URL.
pub const WEBHOOK_URL_ENV: &str = "WEBHOOK_URL";

/// Environment variable name for the envelope encryption key.
pub const WALLET_ENC_KEY_ENV: &str = "WALLET_ENC_KEY";

const DEFAULT_BASE_URL: &str = "https://api.tatum.io";
const DEFAULT_DATA_DIR: &str = "/data";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingVar(&'static str),

    #[error("WALLET_ENC_KEY is not valid hex or base64: {0}")]
    KeyEncoding(String),

    #[error("WALLET_ENC_KEY must decode to 32 bytes (got {got}); use 32-byte base64 or 64 hex chars")]
    KeyLength { got: usize },

    #[error("invalid PORT value: {0}")]
    InvalidPort(String),

    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl { name: &'static str, reason: String },
}

/// Application configuration resolved from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// API credential sent as `x-api-key` to the Key/Notification Services.
    pub api_key: String,
    /// Base URL of the remote Key/Notification Services.
    pub base_url: String,
    /// Callback URL registered with address-event subscriptions.
    pub webhook_url: String,
    /// 256-bit symmetric key protecting generated secrets at rest.
    pub envelope_key: [u8; 32],
    /// Directory holding the embedded database file.
    pub data_dir: PathBuf,
    /// Server bind address.
    pub host: String,
    /// Server bind port.
    pub port: u16,
}

impl AppConfig {
    /// Load and validate configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_required(KEY_SERVICE_API_KEY_ENV)?;
        let base_url = env_or_default(KEY_SERVICE_BASE_URL_ENV, DEFAULT_BASE_URL);
        require_url(KEY_SERVICE_BASE_URL_ENV, &base_url)?;
        let webhook_url = env_required(WEBHOOK_URL_ENV)?;
        require_url(WEBHOOK_URL_ENV, &webhook_url)?;
        let envelope_key = parse_envelope_key(&env_required(WALLET_ENC_KEY_ENV)?)?;
        let data_dir = PathBuf::from(env_or_default(DATA_DIR_ENV, DEFAULT_DATA_DIR));
        let host = env_or_default("HOST", "0.0.0.0");
        let port_raw = env_or_default("PORT", "8080");
        let port: u16 = port_raw
            .parse()
            .map_err(|_| ConfigError::InvalidPort(port_raw))?;

        Ok(Self {
            api_key,
            base_url,
            webhook_url,
            envelope_key,
            data_dir,
            host,
            port,
        })
    }
}

/// Parse the envelope key from its environment encoding.
///
/// Accepts a hexadecimal string of at least 64 characters (the first 64 are
/// used) or a base64 string; the decoded key must be exactly 32 bytes.
pub fn parse_envelope_key(raw: &str) -> Result<[u8; 32], ConfigError> {
    let raw = raw.trim();
    let is_hex = raw.len() >= 64 && raw.chars().all(|c| c.is_ascii_hexdigit());

    let bytes = if is_hex {
        hex::decode(&raw[..64]).map_err(|e| ConfigError::KeyEncoding(e.to_string()))?
    } else {
        Base64::decode_vec(raw).map_err(|e| ConfigError::KeyEncoding(e.to_string()))?
    };

    let got = bytes.len();
    <[u8; 32]>::try_from(bytes).map_err(|_| ConfigError::KeyLength { got })
}

/// Reject values the HTTP clients could not use as a base or callback URL.
fn require_url(name: &'static str, raw: &str) -> Result<(), ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        name,
        reason: e.to_string(),
    })?;
    Ok(())
}

fn env_required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}
