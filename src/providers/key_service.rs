// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key Service client: remote wallet generation, address derivation and
//! balance lookup.
//!
//! The remote API is versioned per addressing scheme under `/v3/{scheme}`.
//! Different schemes answer wallet generation differently: HD chains return
//! an extended public key plus a secret, flat-key chains return an address
//! directly. [`GeneratedWallet`] carries whichever fields were present and
//! callers decide what they require.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum KeyServiceError {
    #[error("key service configuration invalid: {0}")]
    Config(String),

    #[error("key service request failed: {0}")]
    Request(String),

    #[error("key service returned {status} for {path}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },

    #[error("key service response was invalid: {0}")]
    InvalidResponse(String),
}

/// Key material returned by wallet generation, fields as the scheme provides.
#[derive(Debug, Clone, Default)]
pub struct GeneratedWallet {
    /// Extended public key for HD derivation, if the scheme is HD.
    pub extended_public_key: Option<String>,
    /// Wallet secret (mnemonic or private key), if the scheme returns one.
    pub secret: Option<String>,
    /// Flat address, if the scheme returns one directly.
    pub address: Option<String>,
}

/// Remote key-management operations used by the allocation flow.
pub trait KeyService {
    /// Generate a fresh wallet for the addressing scheme.
    fn generate_wallet(
        &self,
        scheme: &str,
    ) -> impl Future<Output = Result<GeneratedWallet, KeyServiceError>> + Send;

    /// Derive the address at `index` from an extended public key.
    fn derive_address(
        &self,
        scheme: &str,
        extended_public_key: &str,
        index: u32,
    ) -> impl Future<Output = Result<String, KeyServiceError>> + Send;

    /// Best-effort balance lookup, returned as the remote's own string form.
    fn get_balance(
        &self,
        scheme: &str,
        address: &str,
    ) -> impl Future<Output = Result<String, KeyServiceError>> + Send;
}

/// HTTP implementation of [`KeyService`] authenticated via `x-api-key`.
#[derive(Debug, Clone)]
pub struct HttpKeyService {
    base_url: String,
    api_key: String,
    http: Client,
}

impl HttpKeyService {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, KeyServiceError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| KeyServiceError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            http,
        })
    }

    async fn get_json(&self, path: &str) -> Result<Value, KeyServiceError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url.trim_end_matches('/'), path))
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| KeyServiceError::Request(format!("GET {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(KeyServiceError::Status {
                status,
                path: path.to_string(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| KeyServiceError::InvalidResponse(format!("GET {path} invalid JSON: {e}")))
    }
}

impl KeyService for HttpKeyService {
    async fn generate_wallet(&self, scheme: &str) -> Result<GeneratedWallet, KeyServiceError> {
        let path = format!("/v3/{scheme}/wallet");
        let response = self.get_json(&path).await?;
        let wallet = parse_generated_wallet(&response);

        if wallet.extended_public_key.is_none() && wallet.address.is_none() {
            return Err(KeyServiceError::InvalidResponse(format!(
                "wallet for scheme {scheme} has neither extended public key nor address"
            )));
        }

        debug!(
            scheme,
            has_xpub = wallet.extended_public_key.is_some(),
            has_address = wallet.address.is_some(),
            "generated wallet"
        );
        Ok(wallet)
    }

    async fn derive_address(
        &self,
        scheme: &str,
        extended_public_key: &str,
        index: u32,
    ) -> Result<String, KeyServiceError> {
        let path = format!("/v3/{scheme}/address/{extended_public_key}/{index}");
        let response = self.get_json(&path).await?;

        response
            .get("address")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                KeyServiceError::InvalidResponse(format!(
                    "derivation for scheme {scheme} index {index} returned no address"
                ))
            })
    }

    async fn get_balance(&self, scheme: &str, address: &str) -> Result<String, KeyServiceError> {
        let path = format!("/v3/{scheme}/account/balance/{address}");
        let response = self.get_json(&path).await?;

        // Account-model chains answer `{"balance": ...}`; UTXO chains answer
        // with incoming/outgoing totals. Pass through whatever came back.
        Ok(response
            .get("balance")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| response.to_string()))
    }
}

/// Pull the known key-material fields out of a wallet response.
///
/// `secret` may arrive as a mnemonic, a bare secret or a private key
/// depending on the scheme.
fn parse_generated_wallet(response: &Value) -> GeneratedWallet {
    let field = |name: &str| {
        response
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };

    GeneratedWallet {
        extended_public_key: field("xpub"),
        secret: field("mnemonic").or_else(|| field("secret")).or_else(|| field("privateKey")),
        address: field("address"),
    }
}
