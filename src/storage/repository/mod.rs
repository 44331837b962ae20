// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the embedded database.
//!
//! Each repository covers one table and owns the invariants of its rows:
//! the network catalog is read-mostly, the wallet table is append-and-fill
//! with forward-only counters.

pub mod networks;
pub mod wallets;

pub use networks::NetworkRepository;
pub use wallets::{CounterKind, WalletRepository};
