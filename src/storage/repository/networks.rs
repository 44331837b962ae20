// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository for the supported-network catalog.
//!
//! The catalog is read-mostly: rows are seeded at startup and changed only
//! administratively. The allocation path never writes here.

use redb::{ReadableDatabase, ReadableTable};

use super::super::db::{decode_row, encode_row, WalletDb, WalletDbError, WalletDbResult, NETWORKS};
use crate::models::{NetworkConfig, Strategy};

/// Typed access to the `networks` table.
pub struct NetworkRepository<'a> {
    db: &'a WalletDb,
}

impl<'a> NetworkRepository<'a> {
    /// Create repository.
    pub fn new(db: &'a WalletDb) -> Self {
        Self { db }
    }

    /// Load a network by code, or `None` if the catalog has no such row.
    pub fn find(&self, code: &str) -> WalletDbResult<Option<NetworkConfig>> {
        let read_txn = self.db.inner().begin_read()?;
        let table = read_txn.open_table(NETWORKS)?;
        match table.get(code)? {
            Some(guard) => Ok(Some(decode_row(code, guard.value())?)),
            None => Ok(None),
        }
    }

    /// Load a network by code, failing if absent.
    pub fn get(&self, code: &str) -> WalletDbResult<NetworkConfig> {
        self.find(code)?
            .ok_or_else(|| WalletDbError::NetworkNotFound(code.to_string()))
    }

    /// List the whole catalog, ordered by network code.
    pub fn list(&self) -> WalletDbResult<Vec<NetworkConfig>> {
        let read_txn = self.db.inner().begin_read()?;
        let table = read_txn.open_table(NETWORKS)?;

        let mut networks = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            networks.push(decode_row(key.value(), value.value())?);
        }
        Ok(networks)
    }

    /// Insert or replace a catalog row.
    pub fn upsert(&self, network: &NetworkConfig) -> WalletDbResult<()> {
        let bytes = encode_row(network)?;
        let write_txn = self.db.inner().begin_write()?;
        {
            let mut table = write_txn.open_table(NETWORKS)?;
            table.insert(network.code.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Seed the built-in catalog, inserting only codes not already present.
    ///
    /// Existing rows are left untouched so administrative edits survive
    /// restarts. Returns the number of rows inserted.
    pub fn seed_defaults(&self) -> WalletDbResult<usize> {
        let mut inserted = 0;
        let write_txn = self.db.inner().begin_write()?;
        {
            let mut table = write_txn.open_table(NETWORKS)?;
            for network in default_catalog() {
                if table.get(network.code.as_str())?.is_none() {
                    let bytes = encode_row(&network)?;
                    table.insert(network.code.as_str(), bytes.as_slice())?;
                    inserted += 1;
                }
            }
        }
        write_txn.commit()?;
        Ok(inserted)
    }
}

/// Built-in mainnet catalog.
///
/// UTXO and account HD chains use per-deposit derivation; memo-based ledgers
/// share one address with a per-deposit tag; chains without usable extended
/// keys get a flat address or a throwaway wallet per deposit.
pub fn default_catalog() -> Vec<NetworkConfig> {
    fn network(
        code: &str,
        name: &str,
        addressing_scheme: &str,
        notification_chain_id: Option<&str>,
        requires_memo: bool,
        strategy: Strategy,
    ) -> NetworkConfig {
        NetworkConfig {
            code: code.to_string(),
            name: name.to_string(),
            addressing_scheme: addressing_scheme.to_string(),
            notification_chain_id: notification_chain_id.map(str::to_string),
            requires_memo,
            strategy,
            is_active: true,
        }
    }

    vec![
        network(
            "bitcoin",
            "Bitcoin (Mainnet)",
            "bitcoin",
            Some("bitcoin-mainnet"),
            false,
            Strategy::HdXpub,
        ),
        network(
            "ethereum",
            "Ethereum (Mainnet)",
            "ethereum",
            Some("ethereum-mainnet"),
            false,
            Strategy::HdXpub,
        ),
        network(
            "litecoin",
            "Litecoin (Mainnet)",
            "litecoin",
            Some("litecoin-mainnet"),
            false,
            Strategy::HdXpub,
        ),
        network(
            "dogecoin",
            "Dogecoin (Mainnet)",
            "dogecoin",
            Some("dogecoin-mainnet"),
            false,
            Strategy::HdXpub,
        ),
        network(
            "bitcoin-cash",
            "Bitcoin Cash (Mainnet)",
            "bcash",
            Some("bch-mainnet"),
            false,
            Strategy::HdXpub,
        ),
        network(
            "zcash",
            "Zcash (Mainnet)",
            "zcash",
            None,
            false,
            Strategy::HdXpub,
        ),
        network(
            "ripple",
            "XRP Ledger (Mainnet)",
            "xrp",
            Some("ripple-mainnet"),
            true,
            Strategy::SharedAddrWithTag,
        ),
        network(
            "stellar",
            "Stellar (Mainnet)",
            "stellar",
            Some("stellar-mainnet"),
            true,
            Strategy::SharedAddrWithTag,
        ),
        network(
            "solana",
            "Solana (Mainnet)",
            "solana",
            Some("solana-mainnet"),
            false,
            Strategy::WalletPerDeposit,
        ),
        network(
            "tron",
            "TRON (Mainnet)",
            "tron",
            Some("tron-mainnet"),
            false,
            Strategy::WalletPerDeposit,
        ),
        network(
            "algorand",
            "Algorand (Mainnet)",
            "algorand",
            Some("algorand-mainnet"),
            false,
            Strategy::WalletSingleAddr,
        ),
        network(
            "tezos",
            "Tezos (Mainnet)",
            "tezos",
            None,
            false,
            Strategy::WalletSingleAddr,
        ),
    ]
}
