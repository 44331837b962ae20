// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Persistent Storage Module
//!
//! Embedded redb database holding the network catalog and per-network master
//! wallet rows.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   deposit.redb        # single-file ACID database
//!     networks          # network code -> NetworkConfig (JSON)
//!     master_wallets    # network code -> MasterWalletRecord (JSON)
//! ```
//!
//! ## Important Notes
//!
//! - redb admits exactly one write transaction at a time; repositories rely
//!   on this for atomic read-modify-write (counter allocation, fill-missing).
//! - Rows are stored as JSON bytes; decode failures surface as
//!   [`WalletDbError::Corrupted`], never as a silent default.

pub mod db;
pub mod repository;

pub use db::{WalletDb, WalletDbError, WalletDbResult};
pub use repository::{NetworkRepository, WalletRepository};
