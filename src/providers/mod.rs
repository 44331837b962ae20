// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Clients for the remote Key Service and Notification Service.

pub mod key_service;
pub mod notifications;

pub use key_service::{GeneratedWallet, HttpKeyService, KeyService, KeyServiceError};
pub use notifications::{HttpNotificationGate, NotificationError, NotificationGate};
