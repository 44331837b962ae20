// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state for API handlers.

use std::sync::Arc;

use crate::allocation::AllocationEngine;
use crate::providers::{HttpKeyService, HttpNotificationGate};
use crate::storage::WalletDb;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<WalletDb>,
    pub engine: Arc<AllocationEngine<HttpKeyService, HttpNotificationGate>>,
}

impl AppState {
    pub fn new(
        db: Arc<WalletDb>,
        engine: AllocationEngine<HttpKeyService, HttpNotificationGate>,
    ) -> Self {
        Self {
            db,
            engine: Arc::new(engine),
        }
    }
}
