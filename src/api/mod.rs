// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface: allocation, catalog, balance and health endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{DepositTarget, MasterWalletView, NetworkConfig, Strategy},
    state::AppState,
};

pub mod deposits;
pub mod health;
pub mod networks;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/networks", get(networks::list_networks))
        .route("/networks/{code}", get(networks::get_network))
        .route("/networks/{code}/wallet", get(networks::get_master_wallet))
        .route("/networks/{code}/deposits", post(deposits::allocate_deposit))
        .route(
            "/networks/{code}/addresses/{address}/balance",
            get(deposits::get_balance),
        )
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        networks::list_networks,
        networks::get_network,
        networks::get_master_wallet,
        deposits::allocate_deposit,
        deposits::get_balance,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            NetworkConfig,
            Strategy,
            MasterWalletView,
            DepositTarget,
            deposits::DepositResponse,
            deposits::BalanceResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Networks", description = "Network catalog and master wallet state"),
        (name = "Deposits", description = "Deposit target allocation and balances"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
