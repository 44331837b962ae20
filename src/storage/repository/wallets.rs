// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository for per-network master wallet rows.
//!
//! Three invariants live here:
//!
//! - one row per network code, created idempotently;
//! - key-material fields fill only when empty, never overwrite;
//! - counters advance by exactly one per allocation, atomically.
//!
//! Every mutation runs inside a single redb write transaction. redb permits
//! one writer at a time, so concurrent callers serialize at the store and
//! each sees a consistent snapshot for its read-modify-write.

use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable};

use super::super::db::{
    decode_row, encode_row, WalletDb, WalletDbError, WalletDbResult, MASTER_WALLETS,
};
use crate::models::{MasterWalletPatch, MasterWalletRecord};

/// Which forward-only counter to advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    /// HD derivation index, first value handed out is 0.
    DerivationIndex,
    /// Deposit tag/memo, first value handed out is 1.
    DepositTag,
}

impl CounterKind {
    fn as_str(self) -> &'static str {
        match self {
            CounterKind::DerivationIndex => "derivation_index",
            CounterKind::DepositTag => "deposit_tag",
        }
    }
}

/// Typed access to the `master_wallets` table.
pub struct WalletRepository<'a> {
    db: &'a WalletDb,
}

impl<'a> WalletRepository<'a> {
    /// Create repository.
    pub fn new(db: &'a WalletDb) -> Self {
        Self { db }
    }

    /// Load a wallet row, or `None` if the network has no row yet.
    pub fn find(&self, network_code: &str) -> WalletDbResult<Option<MasterWalletRecord>> {
        let read_txn = self.db.inner().begin_read()?;
        let table = read_txn.open_table(MASTER_WALLETS)?;
        match table.get(network_code)? {
            Some(guard) => Ok(Some(decode_row(network_code, guard.value())?)),
            None => Ok(None),
        }
    }

    /// Load a wallet row, failing if absent.
    pub fn get(&self, network_code: &str) -> WalletDbResult<MasterWalletRecord> {
        self.find(network_code)?
            .ok_or_else(|| WalletDbError::WalletNotFound(network_code.to_string()))
    }

    /// List all wallet rows, ordered by network code.
    pub fn list(&self) -> WalletDbResult<Vec<MasterWalletRecord>> {
        let read_txn = self.db.inner().begin_read()?;
        let table = read_txn.open_table(MASTER_WALLETS)?;

        let mut records = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            records.push(decode_row(key.value(), value.value())?);
        }
        Ok(records)
    }

    /// Create an empty row for the network if none exists, returning the
    /// row that is in the table afterwards.
    ///
    /// Safe under concurrent first-callers: the check and the insert happen
    /// in one write transaction, so a racing creator either finds the row
    /// already there and returns it, or inserts exactly once. Losers read
    /// back the winner's row, never an error.
    pub fn ensure(&self, network_code: &str) -> WalletDbResult<MasterWalletRecord> {
        let write_txn = self.db.inner().begin_write()?;
        let record = {
            let mut table = write_txn.open_table(MASTER_WALLETS)?;
            let existing = match table.get(network_code)? {
                Some(guard) => Some(decode_row(network_code, guard.value())?),
                None => None,
            };
            match existing {
                Some(record) => record,
                None => {
                    let fresh = MasterWalletRecord::empty(network_code);
                    let bytes = encode_row(&fresh)?;
                    table.insert(network_code, bytes.as_slice())?;
                    fresh
                }
            }
        };
        write_txn.commit()?;
        Ok(record)
    }

    /// Apply a fill-only-empty-fields patch to the row, returning the row
    /// as persisted.
    ///
    /// Snapshot, merge and write happen in one write transaction, so a
    /// field populated by a concurrent writer is visible to the merge and
    /// is never clobbered.
    pub fn fill_missing(
        &self,
        network_code: &str,
        patch: &MasterWalletPatch,
    ) -> WalletDbResult<MasterWalletRecord> {
        let write_txn = self.db.inner().begin_write()?;
        let record = {
            let mut table = write_txn.open_table(MASTER_WALLETS)?;
            let mut record: MasterWalletRecord = match table.get(network_code)? {
                Some(guard) => decode_row(network_code, guard.value())?,
                None => return Err(WalletDbError::WalletNotFound(network_code.to_string())),
            };

            if record.merge_missing(patch) {
                let bytes = encode_row(&record)?;
                table.insert(network_code, bytes.as_slice())?;
            }
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    /// Atomically advance a counter, returning the value *before* the
    /// increment.
    ///
    /// The read, increment and write share one write transaction, so N
    /// concurrent callers receive N distinct contiguous values. Fails with
    /// [`WalletDbError::WalletNotFound`] if the row is absent and with
    /// [`WalletDbError::Counter`] if the counter cannot advance (exhausted
    /// range), leaving the row unchanged.
    pub fn allocate_counter(&self, network_code: &str, kind: CounterKind) -> WalletDbResult<u64> {
        let write_txn = self.db.inner().begin_write()?;
        let previous = {
            let mut table = write_txn.open_table(MASTER_WALLETS)?;
            let mut record: MasterWalletRecord = match table.get(network_code)? {
                Some(guard) => decode_row(network_code, guard.value())?,
                None => return Err(WalletDbError::WalletNotFound(network_code.to_string())),
            };

            let previous = match kind {
                CounterKind::DerivationIndex => {
                    let current = record.next_derivation_index;
                    record.next_derivation_index = current
                        .checked_add(1)
                        .ok_or_else(|| counter_exhausted(kind, network_code))?;
                    u64::from(current)
                }
                CounterKind::DepositTag => {
                    let current = record.next_deposit_tag;
                    record.next_deposit_tag = current
                        .checked_add(1)
                        .ok_or_else(|| counter_exhausted(kind, network_code))?;
                    current
                }
            };

            record.updated_at = Utc::now();
            let bytes = encode_row(&record)?;
            table.insert(network_code, bytes.as_slice())?;
            previous
        };
        write_txn.commit()?;
        Ok(previous)
    }
}

fn counter_exhausted(kind: CounterKind, network_code: &str) -> WalletDbError {
    WalletDbError::Counter(format!(
        "{} exhausted for network {network_code}",
        kind.as_str()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn test_db() -> (tempfile::TempDir, WalletDb) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = WalletDb::open(&dir.path().join("deposit.redb")).expect("open db");
        (dir, db)
    }

    #[test]
    fn ensure_creates_then_returns_existing() {
        let (_dir, db) = test_db();
        let repo = WalletRepository::new(&db);

        let first = repo.ensure("bitcoin").unwrap();
        assert_eq!(first.next_derivation_index, 0);
        assert_eq!(first.next_deposit_tag, 1);

        repo.fill_missing(
            "bitcoin",
            &MasterWalletPatch {
                extended_public_key: Some("xpub-abc".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let second = repo.ensure("bitcoin").unwrap();
        assert_eq!(second.extended_public_key.as_deref(), Some("xpub-abc"));
    }

    #[test]
    fn get_fails_for_missing_row() {
        let (_dir, db) = test_db();
        let repo = WalletRepository::new(&db);
        assert!(matches!(
            repo.get("stellar"),
            Err(WalletDbError::WalletNotFound(code)) if code == "stellar"
        ));
    }

    #[test]
    fn allocate_returns_previous_value_and_advances() {
        let (_dir, db) = test_db();
        let repo = WalletRepository::new(&db);
        repo.ensure("bitcoin").unwrap();

        assert_eq!(
            repo.allocate_counter("bitcoin", CounterKind::DerivationIndex)
                .unwrap(),
            0
        );
        assert_eq!(
            repo.allocate_counter("bitcoin", CounterKind::DerivationIndex)
                .unwrap(),
            1
        );

        assert_eq!(
            repo.allocate_counter("bitcoin", CounterKind::DepositTag)
                .unwrap(),
            1
        );
        assert_eq!(
            repo.allocate_counter("bitcoin", CounterKind::DepositTag)
                .unwrap(),
            2
        );

        // The two counters never interact.
        assert_eq!(
            repo.allocate_counter("bitcoin", CounterKind::DerivationIndex)
                .unwrap(),
            2
        );
    }

    #[test]
    fn allocate_fails_for_missing_row() {
        let (_dir, db) = test_db();
        let repo = WalletRepository::new(&db);
        assert!(matches!(
            repo.allocate_counter("ripple", CounterKind::DepositTag),
            Err(WalletDbError::WalletNotFound(_))
        ));
    }

    #[test]
    fn counters_are_per_network() {
        let (_dir, db) = test_db();
        let repo = WalletRepository::new(&db);
        repo.ensure("ripple").unwrap();
        repo.ensure("stellar").unwrap();

        for _ in 0..3 {
            repo.allocate_counter("ripple", CounterKind::DepositTag)
                .unwrap();
        }
        assert_eq!(
            repo.allocate_counter("stellar", CounterKind::DepositTag)
                .unwrap(),
            1
        );
    }

    #[test]
    fn concurrent_allocations_are_contiguous() {
        let (_dir, db) = test_db();
        let db = Arc::new(db);
        WalletRepository::new(&db).ensure("bitcoin").unwrap();

        const THREADS: usize = 8;
        const PER_THREAD: usize = 10;

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let db = Arc::clone(&db);
                std::thread::spawn(move || {
                    let repo = WalletRepository::new(&db);
                    (0..PER_THREAD)
                        .map(|_| {
                            repo.allocate_counter("bitcoin", CounterKind::DerivationIndex)
                                .unwrap()
                        })
                        .collect::<Vec<u64>>()
                })
            })
            .collect();

        let mut seen = BTreeSet::new();
        for handle in handles {
            for value in handle.join().unwrap() {
                assert!(seen.insert(value), "duplicate index {value}");
            }
        }

        let expected: BTreeSet<u64> = (0..(THREADS * PER_THREAD) as u64).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn counters_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deposit.redb");

        {
            let db = WalletDb::open(&path).unwrap();
            let repo = WalletRepository::new(&db);
            repo.ensure("bitcoin").unwrap();
            assert_eq!(
                repo.allocate_counter("bitcoin", CounterKind::DerivationIndex)
                    .unwrap(),
                0
            );
        }

        let db = WalletDb::open(&path).unwrap();
        let repo = WalletRepository::new(&db);
        assert_eq!(
            repo.allocate_counter("bitcoin", CounterKind::DerivationIndex)
                .unwrap(),
            1
        );
    }

    #[test]
    fn exhausted_counter_fails_without_moving() {
        let (_dir, db) = test_db();
        let repo = WalletRepository::new(&db);
        let mut record = repo.ensure("bitcoin").unwrap();
        record.next_derivation_index = u32::MAX;

        // Write the saturated row back directly.
        let bytes = encode_row(&record).unwrap();
        let write_txn = db.inner().begin_write().unwrap();
        {
            let mut table = write_txn.open_table(MASTER_WALLETS).unwrap();
            table.insert("bitcoin", bytes.as_slice()).unwrap();
        }
        write_txn.commit().unwrap();

        assert!(matches!(
            repo.allocate_counter("bitcoin", CounterKind::DerivationIndex),
            Err(WalletDbError::Counter(_))
        ));
        assert_eq!(repo.get("bitcoin").unwrap().next_derivation_index, u32::MAX);
    }

    #[test]
    fn fill_missing_never_clobbers() {
        let (_dir, db) = test_db();
        let repo = WalletRepository::new(&db);
        repo.ensure("ethereum").unwrap();

        let winner = repo
            .fill_missing(
                "ethereum",
                &MasterWalletPatch {
                    extended_public_key: Some("xpub-winner".into()),
                    encrypted_secret: Some("envelope-winner".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(winner.extended_public_key.as_deref(), Some("xpub-winner"));

        // A racer that lost gets the winner's material back.
        let loser = repo
            .fill_missing(
                "ethereum",
                &MasterWalletPatch {
                    extended_public_key: Some("xpub-loser".into()),
                    encrypted_secret: Some("envelope-loser".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(loser.extended_public_key.as_deref(), Some("xpub-winner"));
        assert_eq!(loser.encrypted_secret.as_deref(), Some("envelope-winner"));
    }

    #[test]
    fn fill_missing_requires_existing_row() {
        let (_dir, db) = test_db();
        let repo = WalletRepository::new(&db);
        assert!(matches!(
            repo.fill_missing("tron", &MasterWalletPatch::default()),
            Err(WalletDbError::WalletNotFound(_))
        ));
    }

    #[test]
    fn concurrent_ensure_resolves_to_single_row() {
        let (_dir, db) = test_db();
        let db = Arc::new(db);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = Arc::clone(&db);
                std::thread::spawn(move || WalletRepository::new(&db).ensure("solana").unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let records = WalletRepository::new(&db).list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].network_code, "solana");
    }
}
