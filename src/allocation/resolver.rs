// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Master Wallet Resolver: get-or-create key material per network.
//!
//! Resolution is idempotent and non-clobbering. A populated record is
//! returned as-is; an empty one triggers a single remote generation whose
//! results are persisted only into fields that are still empty. Two
//! concurrent first-callers both end up with the same key material, the
//! loser reading back what the winner wrote.

use tracing::info;

use super::AllocationError;
use crate::models::{MasterWalletPatch, NetworkConfig};
use crate::providers::key_service::{KeyService, KeyServiceError};
use crate::secrets::SecretEnvelope;
use crate::storage::db::{WalletDb, WalletDbError};
use crate::storage::repository::WalletRepository;

/// Resolves per-network master wallet material, generating it on first use.
pub struct MasterWalletResolver<'a, K> {
    db: &'a WalletDb,
    keys: &'a K,
    envelope: &'a SecretEnvelope,
}

impl<'a, K: KeyService + Sync> MasterWalletResolver<'a, K> {
    pub fn new(db: &'a WalletDb, keys: &'a K, envelope: &'a SecretEnvelope) -> Self {
        Self { db, keys, envelope }
    }

    /// Return the network's extended public key, generating and persisting a
    /// fresh HD master on first use.
    ///
    /// The wallet secret never touches the store in the clear: it is sealed
    /// by the envelope before the row is written.
    pub async fn resolve_hd_master(&self, network: &NetworkConfig) -> Result<String, AllocationError> {
        let wallets = WalletRepository::new(self.db);
        let record = wallets.ensure(&network.code)?;

        if let (Some(xpub), Some(_)) = (&record.extended_public_key, &record.encrypted_secret) {
            return Ok(xpub.clone());
        }

        let generated = self.keys.generate_wallet(&network.addressing_scheme).await?;
        let xpub = generated.extended_public_key.ok_or_else(|| {
            KeyServiceError::InvalidResponse(format!(
                "scheme {} returned no extended public key",
                network.addressing_scheme
            ))
        })?;
        let secret = generated.secret.ok_or_else(|| {
            KeyServiceError::InvalidResponse(format!(
                "scheme {} returned no wallet secret",
                network.addressing_scheme
            ))
        })?;
        let encrypted_secret = self.envelope.encrypt(&secret)?;

        let persisted = wallets.fill_missing(
            &network.code,
            &MasterWalletPatch {
                extended_public_key: Some(xpub),
                encrypted_secret: Some(encrypted_secret),
                ..Default::default()
            },
        )?;

        info!(network = %network.code, "HD master wallet material resolved");
        persisted.extended_public_key.ok_or_else(|| {
            WalletDbError::Corrupted(format!(
                "row {}: extended public key missing after fill",
                network.code
            ))
            .into()
        })
    }

    /// Return the network's flat deposit address, resolving it on first use.
    ///
    /// Schemes that answer generation with a direct address use it as-is;
    /// HD-style schemes get an address derived at index 0 from the fresh
    /// extended key, and that key is retained under the same non-clobber
    /// rule.
    pub async fn resolve_single_address(
        &self,
        network: &NetworkConfig,
    ) -> Result<String, AllocationError> {
        let wallets = WalletRepository::new(self.db);
        let record = wallets.ensure(&network.code)?;

        if let Some(address) = &record.single_address {
            return Ok(address.clone());
        }

        let generated = self.keys.generate_wallet(&network.addressing_scheme).await?;
        let mut patch = MasterWalletPatch::default();

        let address = match (generated.address, generated.extended_public_key) {
            (Some(address), _) => address,
            (None, Some(xpub)) => {
                let address = self
                    .keys
                    .derive_address(&network.addressing_scheme, &xpub, 0)
                    .await?;
                patch.extended_public_key = Some(xpub);
                address
            }
            (None, None) => {
                return Err(KeyServiceError::InvalidResponse(format!(
                    "scheme {} returned neither address nor extended public key",
                    network.addressing_scheme
                ))
                .into())
            }
        };

        patch.single_address = Some(address);
        if let Some(secret) = generated.secret {
            patch.encrypted_secret = Some(self.envelope.encrypt(&secret)?);
        }

        let persisted = wallets.fill_missing(&network.code, &patch)?;

        info!(network = %network.code, "single deposit address resolved");
        persisted.single_address.ok_or_else(|| {
            WalletDbError::Corrupted(format!(
                "row {}: single address missing after fill",
                network.code
            ))
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::tests::{test_network, FakeKeyService};
    use crate::models::Strategy;
    use crate::storage::WalletDb;

    fn test_db() -> (tempfile::TempDir, WalletDb) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = WalletDb::open(&dir.path().join("deposit.redb")).expect("open db");
        (dir, db)
    }

    #[tokio::test]
    async fn hd_master_generates_once_and_seals_secret() {
        let (_dir, db) = test_db();
        let keys = FakeKeyService::hd("xpub-btc", "twelve word mnemonic");
        let envelope = SecretEnvelope::new([9u8; 32]);
        let resolver = MasterWalletResolver::new(&db, &keys, &envelope);
        let network = test_network("bitcoin", Strategy::HdXpub);

        let first = resolver.resolve_hd_master(&network).await.unwrap();
        let second = resolver.resolve_hd_master(&network).await.unwrap();
        assert_eq!(first, "xpub-btc");
        assert_eq!(second, "xpub-btc");
        assert_eq!(keys.generate_calls(), 1);

        let record = WalletRepository::new(&db).get("bitcoin").unwrap();
        let sealed = record.encrypted_secret.expect("secret persisted");
        assert_ne!(sealed, "twelve word mnemonic");
        assert_eq!(envelope.decrypt(&sealed).unwrap(), "twelve word mnemonic");
    }

    #[tokio::test]
    async fn hd_master_requires_xpub_and_secret() {
        let (_dir, db) = test_db();
        let keys = FakeKeyService::flat("rAddr123");
        let envelope = SecretEnvelope::new([9u8; 32]);
        let resolver = MasterWalletResolver::new(&db, &keys, &envelope);
        let network = test_network("ripple", Strategy::HdXpub);

        let result = resolver.resolve_hd_master(&network).await;
        assert!(matches!(result, Err(AllocationError::KeyService(_))));
    }

    #[tokio::test]
    async fn single_address_uses_direct_address_when_present() {
        let (_dir, db) = test_db();
        let keys = FakeKeyService::flat("rAddr123");
        let envelope = SecretEnvelope::new([9u8; 32]);
        let resolver = MasterWalletResolver::new(&db, &keys, &envelope);
        let network = test_network("ripple", Strategy::WalletSingleAddr);

        let first = resolver.resolve_single_address(&network).await.unwrap();
        let second = resolver.resolve_single_address(&network).await.unwrap();
        assert_eq!(first, "rAddr123");
        assert_eq!(second, "rAddr123");
        assert_eq!(keys.generate_calls(), 1);
    }

    #[tokio::test]
    async fn single_address_derives_at_zero_for_hd_schemes() {
        let (_dir, db) = test_db();
        let keys = FakeKeyService::hd("xpub-algo", "secret words");
        let envelope = SecretEnvelope::new([9u8; 32]);
        let resolver = MasterWalletResolver::new(&db, &keys, &envelope);
        let network = test_network("algorand", Strategy::WalletSingleAddr);

        let address = resolver.resolve_single_address(&network).await.unwrap();
        assert_eq!(address, "xpub-algo/0");
        assert_eq!(keys.derive_calls(), 1);

        // The fresh extended key is retained alongside the address.
        let record = WalletRepository::new(&db).get("algorand").unwrap();
        assert_eq!(record.extended_public_key.as_deref(), Some("xpub-algo"));
        assert_eq!(record.single_address.as_deref(), Some("xpub-algo/0"));
        assert!(record.encrypted_secret.is_some());
    }

    #[tokio::test]
    async fn populated_record_short_circuits_remote_calls() {
        let (_dir, db) = test_db();
        let keys = FakeKeyService::hd("xpub-eth", "secret");
        let envelope = SecretEnvelope::new([9u8; 32]);
        let network = test_network("ethereum", Strategy::HdXpub);

        {
            let resolver = MasterWalletResolver::new(&db, &keys, &envelope);
            resolver.resolve_hd_master(&network).await.unwrap();
        }

        let fresh_keys = FakeKeyService::hd("xpub-other", "other secret");
        let resolver = MasterWalletResolver::new(&db, &fresh_keys, &envelope);
        let xpub = resolver.resolve_hd_master(&network).await.unwrap();
        assert_eq!(xpub, "xpub-eth");
        assert_eq!(fresh_keys.generate_calls(), 0);
    }
}
