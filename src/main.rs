// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use deposit_gateway::allocation::AllocationEngine;
use deposit_gateway::api::router;
use deposit_gateway::config::AppConfig;
use deposit_gateway::providers::{HttpKeyService, HttpNotificationGate};
use deposit_gateway::secrets::SecretEnvelope;
use deposit_gateway::state::AppState;
use deposit_gateway::storage::{NetworkRepository, WalletDb};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.pretty().init(),
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("configuration error: {error}");
            std::process::exit(1);
        }
    };

    std::fs::create_dir_all(&config.data_dir).expect("failed to create data directory");
    let db = Arc::new(
        WalletDb::open(&config.data_dir.join("deposit.redb")).expect("failed to open wallet database"),
    );

    let seeded = NetworkRepository::new(&db)
        .seed_defaults()
        .expect("failed to seed network catalog");
    info!(seeded, "network catalog ready");

    let keys = HttpKeyService::new(config.base_url.clone(), config.api_key.clone())
        .expect("failed to build key service client");
    let gate = HttpNotificationGate::new(
        config.base_url.clone(),
        config.api_key.clone(),
        config.webhook_url.clone(),
    )
    .expect("failed to build notification client");
    let envelope = SecretEnvelope::new(config.envelope_key);

    let engine = AllocationEngine::new(db.clone(), keys, gate, envelope);
    let state = AppState::new(db, engine);
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind server address");
    info!(%addr, "deposit gateway listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install shutdown signal handler");
    info!("shutdown signal received, draining connections");
}
