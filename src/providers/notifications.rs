// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Notification Gate: optional address-event subscriptions after allocation.
//!
//! Subscriptions only exist for chains the remote Notification Service
//! supports. The gate skips silently (no error, no HTTP call) when a network
//! has no chain id or one outside the allow-list; a failing remote call for
//! an allow-listed chain is a real error.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Network type query parameter for subscription creation.
const NET_TYPE: &str = "mainnet";

/// Chain identifiers the Notification Service accepts for ADDRESS_EVENT.
const SUPPORTED_CHAINS: &[&str] = &[
    "algorand-mainnet",
    "bch-mainnet",
    "bitcoin-mainnet",
    "dogecoin-mainnet",
    "ethereum-mainnet",
    "litecoin-mainnet",
    "ripple-mainnet",
    "solana-mainnet",
    "stellar-mainnet",
    "tron-mainnet",
];

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification service configuration invalid: {0}")]
    Config(String),

    #[error("notification service request failed: {0}")]
    Request(String),

    #[error("notification service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("notification service response was invalid: {0}")]
    InvalidResponse(String),
}

/// Post-allocation subscription seam.
pub trait NotificationGate {
    /// Subscribe the address for deposit events if the chain is supported.
    ///
    /// Returns `Ok(None)` without any remote call when `chain_id` is absent
    /// or not allow-listed; `Ok(Some(subscription_id))` on success.
    fn maybe_subscribe(
        &self,
        chain_id: Option<&str>,
        address: &str,
    ) -> impl Future<Output = Result<Option<String>, NotificationError>> + Send;
}

/// HTTP implementation of [`NotificationGate`] authenticated via `x-api-key`.
#[derive(Debug, Clone)]
pub struct HttpNotificationGate {
    base_url: String,
    api_key: String,
    webhook_url: String,
    http: Client,
}

impl HttpNotificationGate {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        webhook_url: impl Into<String>,
    ) -> Result<Self, NotificationError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| NotificationError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            webhook_url: webhook_url.into(),
            http,
        })
    }

    async fn create_subscription(
        &self,
        chain_id: &str,
        address: &str,
    ) -> Result<String, NotificationError> {
        let payload = subscription_payload(chain_id, address, &self.webhook_url);
        let path = format!("/v4/subscription?type={NET_TYPE}");

        let response = self
            .http
            .post(format!("{}{}", self.base_url.trim_end_matches('/'), path))
            .header("x-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Request(format!("POST {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Status { status, body });
        }

        let body: Value = response.json().await.map_err(|e| {
            NotificationError::InvalidResponse(format!("subscription response invalid JSON: {e}"))
        })?;

        extract_subscription_id(&body).ok_or_else(|| {
            NotificationError::InvalidResponse(
                "subscription response carried no id".to_string(),
            )
        })
    }
}

impl NotificationGate for HttpNotificationGate {
    async fn maybe_subscribe(
        &self,
        chain_id: Option<&str>,
        address: &str,
    ) -> Result<Option<String>, NotificationError> {
        let Some(chain_id) = chain_id else {
            debug!(address, "no notification chain id, skipping subscription");
            return Ok(None);
        };
        if !is_supported_chain(chain_id) {
            debug!(
                chain_id,
                address, "chain not supported by notification service, skipping subscription"
            );
            return Ok(None);
        }

        let subscription_id = self.create_subscription(chain_id, address).await?;
        info!(chain_id, address, subscription_id, "address event subscription created");
        Ok(Some(subscription_id))
    }
}

fn is_supported_chain(chain_id: &str) -> bool {
    SUPPORTED_CHAINS.contains(&chain_id)
}

fn subscription_payload(chain_id: &str, address: &str, webhook_url: &str) -> Value {
    json!({
        "type": "ADDRESS_EVENT",
        "attr": {
            "address": address,
            "chain": chain_id,
            "url": webhook_url
        }
    })
}

/// The subscription id arrives either nested under `data` or at top level.
fn extract_subscription_id(response: &Value) -> Option<String> {
    response
        .pointer("/data/id")
        .and_then(Value::as_str)
        .or_else(|| response.get("id").and_then(Value::as_str))
        .map(str::to_string)
}
