// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded wallet database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `networks`: network code → serialized NetworkConfig (JSON bytes)
//! - `master_wallets`: network code → serialized MasterWalletRecord
//!
//! redb admits a single write transaction at a time, so every
//! read-modify-write performed inside one write transaction is atomic with
//! respect to all other writers, across threads and processes sharing the
//! database file.

use std::path::Path;

use redb::{Database, ReadableDatabase, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Catalog table: network code → NetworkConfig JSON.
pub(super) const NETWORKS: TableDefinition<&str, &[u8]> = TableDefinition::new("networks");

/// Wallet table: network code → MasterWalletRecord JSON.
pub(super) const MASTER_WALLETS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("master_wallets");

#[derive(Debug, thiserror::Error)]
pub enum WalletDbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("network not found: {0}")]
    NetworkNotFound(String),

    #[error("master wallet not found for network: {0}")]
    WalletNotFound(String),

    /// A stored row failed to decode. Indicates data corruption or an
    /// out-of-band schema change, never a caller mistake.
    #[error("corrupted row: {0}")]
    Corrupted(String),

    /// Counter allocation anomaly, distinct from a missing row.
    #[error("counter allocation failed: {0}")]
    Counter(String),
}

pub type WalletDbResult<T> = Result<T, WalletDbError>;

/// Embedded ACID database holding the network catalog and master wallets.
pub struct WalletDb {
    db: Database,
}

impl WalletDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> WalletDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(NETWORKS)?;
            let _ = write_txn.open_table(MASTER_WALLETS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Cheap end-to-end readability probe for the readiness endpoint.
    pub fn health_check(&self) -> WalletDbResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(NETWORKS)?;
        let _ = read_txn.open_table(MASTER_WALLETS)?;
        Ok(())
    }

    pub(super) fn inner(&self) -> &Database {
        &self.db
    }
}

/// Serialize a row for storage.
pub(super) fn encode_row<T: Serialize>(row: &T) -> WalletDbResult<Vec<u8>> {
    serde_json::to_vec(row).map_err(|e| WalletDbError::Corrupted(e.to_string()))
}

/// Deserialize a stored row, surfacing decode failures as corruption.
pub(super) fn decode_row<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> WalletDbResult<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| WalletDbError::Corrupted(format!("row {key}: {e}")))
}
