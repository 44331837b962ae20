// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Network catalog endpoints.

use axum::extract::{Path, State};
use axum::Json;

use crate::error::ApiError;
use crate::models::{MasterWalletView, NetworkConfig};
use crate::state::AppState;
use crate::storage::{NetworkRepository, WalletRepository};

/// List all networks in the catalog.
#[utoipa::path(
    get,
    path = "/v1/networks",
    tag = "Networks",
    responses(
        (status = 200, description = "All catalog networks", body = Vec<NetworkConfig>)
    )
)]
pub async fn list_networks(
    State(state): State<AppState>,
) -> Result<Json<Vec<NetworkConfig>>, ApiError> {
    let networks = NetworkRepository::new(&state.db).list()?;
    Ok(Json(networks))
}

/// Fetch a single network by code.
#[utoipa::path(
    get,
    path = "/v1/networks/{code}",
    tag = "Networks",
    params(
        ("code" = String, Path, description = "Network code, e.g. bitcoin")
    ),
    responses(
        (status = 200, description = "Network configuration", body = NetworkConfig),
        (status = 404, description = "Unknown network code")
    )
)]
pub async fn get_network(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<NetworkConfig>, ApiError> {
    let network = NetworkRepository::new(&state.db).get(&code)?;
    Ok(Json(network))
}

/// Fetch the network's master wallet state.
///
/// The encrypted secret is redacted to a presence flag.
#[utoipa::path(
    get,
    path = "/v1/networks/{code}/wallet",
    tag = "Networks",
    params(
        ("code" = String, Path, description = "Network code, e.g. bitcoin")
    ),
    responses(
        (status = 200, description = "Master wallet state", body = MasterWalletView),
        (status = 404, description = "No wallet row for this network yet")
    )
)]
pub async fn get_master_wallet(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<MasterWalletView>, ApiError> {
    let record = WalletRepository::new(&state.db).get(&code)?;
    Ok(Json(record.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::test_state;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn lists_seeded_catalog() {
        let (_dir, state) = test_state();
        let networks = list_networks(State(state)).await.unwrap();
        assert!(networks.0.len() >= 10);
        assert!(networks.0.iter().any(|n| n.code == "bitcoin"));
    }

    #[tokio::test]
    async fn unknown_network_is_not_found() {
        let (_dir, state) = test_state();
        let error = get_network(State(state), Path("atlantis".into()))
            .await
            .unwrap_err();
        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wallet_view_is_not_found_before_first_allocation() {
        let (_dir, state) = test_state();
        let error = get_master_wallet(State(state), Path("bitcoin".into()))
            .await
            .unwrap_err();
        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wallet_view_redacts_secret_material() {
        let (_dir, state) = test_state();
        let wallets = WalletRepository::new(&state.db);
        wallets.ensure("bitcoin").unwrap();
        wallets
            .fill_missing(
                "bitcoin",
                &crate::models::MasterWalletPatch {
                    extended_public_key: Some("xpub-btc".into()),
                    encrypted_secret: Some("n.t.c".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let view = get_master_wallet(State(state), Path("bitcoin".into()))
            .await
            .unwrap();
        assert_eq!(view.0.extended_public_key.as_deref(), Some("xpub-btc"));
        assert!(view.0.has_encrypted_secret);
    }
}
