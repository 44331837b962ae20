// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deposit allocation and balance endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::DepositTarget;
use crate::state::AppState;
use crate::storage::NetworkRepository;

/// Allocation result returned to the caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct DepositResponse {
    #[serde(flatten)]
    pub target: DepositTarget,
    /// Notification subscription handle, when the chain is supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
}

/// Balance lookup result.
#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub address: String,
    /// Balance in the remote service's own string form.
    pub balance: String,
}

/// Allocate a deposit target on the network.
///
/// Each call yields the next target under the network's strategy and, for
/// supported chains, registers the address for deposit notifications.
#[utoipa::path(
    post,
    path = "/v1/networks/{code}/deposits",
    tag = "Deposits",
    params(
        ("code" = String, Path, description = "Network code, e.g. bitcoin")
    ),
    responses(
        (status = 200, description = "Deposit target allocated", body = DepositResponse),
        (status = 404, description = "Unknown network code"),
        (status = 422, description = "Network is inactive or misconfigured"),
        (status = 502, description = "Remote key or notification service failed")
    )
)]
pub async fn allocate_deposit(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<DepositResponse>, ApiError> {
    let network = NetworkRepository::new(&state.db).get(&code)?;
    let outcome = state.engine.allocate_with_subscription(&network).await?;

    Ok(Json(DepositResponse {
        target: outcome.target,
        subscription_id: outcome.subscription_id,
    }))
}

/// Look up the balance of an address on the network.
#[utoipa::path(
    get,
    path = "/v1/networks/{code}/addresses/{address}/balance",
    tag = "Deposits",
    params(
        ("code" = String, Path, description = "Network code, e.g. bitcoin"),
        ("address" = String, Path, description = "Address to query")
    ),
    responses(
        (status = 200, description = "Balance for the address", body = BalanceResponse),
        (status = 404, description = "Unknown network code"),
        (status = 502, description = "Remote key service failed")
    )
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Path((code, address)): Path<(String, String)>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let network = NetworkRepository::new(&state.db).get(&code)?;
    let balance = state.engine.balance(&network, &address).await?;

    Ok(Json(BalanceResponse { address, balance }))
}
