// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Allocation Engine: turns a network's configured strategy into a deposit
//! target.
//!
//! Dispatch is an exhaustive match over the closed [`Strategy`] set, so a
//! new strategy variant forces every dispatch site to be revisited at
//! compile time. The four strategies share two building blocks, the
//! [`MasterWalletResolver`] and the wallet repository's counter allocator,
//! but never each other's counters.

pub mod resolver;

use std::sync::Arc;

use tracing::info;

use crate::models::{DepositTarget, NetworkConfig, Strategy};
use crate::providers::key_service::{KeyService, KeyServiceError};
use crate::providers::notifications::{NotificationError, NotificationGate};
use crate::secrets::{EnvelopeError, SecretEnvelope};
use crate::storage::db::{WalletDb, WalletDbError};
use crate::storage::repository::{CounterKind, WalletRepository};

use resolver::MasterWalletResolver;

#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    /// Catalog row cannot be used: no addressing scheme configured.
    #[error("network {0} has no addressing scheme configured")]
    MissingScheme(String),

    /// The network exists but refuses new allocations.
    #[error("network {0} is not accepting new deposits")]
    NetworkInactive(String),

    #[error(transparent)]
    Store(#[from] WalletDbError),

    #[error(transparent)]
    KeyService(#[from] KeyServiceError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error(transparent)]
    Encryption(#[from] EnvelopeError),
}

/// Result of one allocation, including the optional subscription handle.
#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    pub target: DepositTarget,
    pub subscription_id: Option<String>,
}

/// Strategy dispatcher over the shared store, Key Service and Notification
/// Gate.
pub struct AllocationEngine<K, N> {
    db: Arc<WalletDb>,
    keys: K,
    gate: N,
    envelope: SecretEnvelope,
}

impl<K: KeyService + Sync, N: NotificationGate + Sync> AllocationEngine<K, N> {
    pub fn new(db: Arc<WalletDb>, keys: K, gate: N, envelope: SecretEnvelope) -> Self {
        Self {
            db,
            keys,
            gate,
            envelope,
        }
    }

    fn resolver(&self) -> MasterWalletResolver<'_, K> {
        MasterWalletResolver::new(&self.db, &self.keys, &self.envelope)
    }

    fn wallets(&self) -> WalletRepository<'_> {
        WalletRepository::new(&self.db)
    }

    /// Produce a deposit target for the network.
    pub async fn allocate(&self, network: &NetworkConfig) -> Result<DepositTarget, AllocationError> {
        if !network.is_active {
            return Err(AllocationError::NetworkInactive(network.code.clone()));
        }
        if network.addressing_scheme.trim().is_empty() {
            return Err(AllocationError::MissingScheme(network.code.clone()));
        }

        let target = match network.strategy {
            Strategy::HdXpub => self.allocate_hd_xpub(network).await?,
            Strategy::WalletSingleAddr => self.allocate_single_address(network).await?,
            Strategy::WalletPerDeposit => self.allocate_per_deposit(network).await?,
            Strategy::SharedAddrWithTag => self.allocate_shared_with_tag(network).await?,
        };

        info!(
            network = %network.code,
            strategy = ?network.strategy,
            address = %target.address,
            derivation_index = ?target.derivation_index,
            address_extra = ?target.address_extra,
            "deposit target allocated"
        );
        Ok(target)
    }

    /// Allocate and register the address with the Notification Gate.
    ///
    /// A failing subscription attempt for an allow-listed chain fails the
    /// whole call; skipped chains yield `subscription_id: None`.
    pub async fn allocate_with_subscription(
        &self,
        network: &NetworkConfig,
    ) -> Result<AllocationOutcome, AllocationError> {
        let target = self.allocate(network).await?;
        let subscription_id = self
            .gate
            .maybe_subscribe(network.notification_chain_id.as_deref(), &target.address)
            .await?;

        Ok(AllocationOutcome {
            target,
            subscription_id,
        })
    }

    /// Best-effort balance lookup for an address on the network.
    pub async fn balance(
        &self,
        network: &NetworkConfig,
        address: &str,
    ) -> Result<String, AllocationError> {
        Ok(self
            .keys
            .get_balance(&network.addressing_scheme, address)
            .await?)
    }

    /// Next address in the network's HD sequence.
    ///
    /// The index is claimed before the remote derivation call, so a failed
    /// derivation burns its index. Gaps in the sequence are harmless;
    /// handing the same index to two deposits is not.
    async fn allocate_hd_xpub(
        &self,
        network: &NetworkConfig,
    ) -> Result<DepositTarget, AllocationError> {
        let xpub = self.resolver().resolve_hd_master(network).await?;

        let index = self
            .wallets()
            .allocate_counter(&network.code, CounterKind::DerivationIndex)?;
        let index = index as u32; // counter is u32-backed

        let address = self
            .keys
            .derive_address(&network.addressing_scheme, &xpub, index)
            .await?;

        Ok(DepositTarget {
            address,
            address_extra: None,
            derivation_index: Some(index),
            strategy: network.strategy,
        })
    }

    /// The network's one flat address, identical on every call.
    async fn allocate_single_address(
        &self,
        network: &NetworkConfig,
    ) -> Result<DepositTarget, AllocationError> {
        let address = self.resolver().resolve_single_address(network).await?;

        Ok(DepositTarget {
            address,
            address_extra: None,
            derivation_index: None,
            strategy: network.strategy,
        })
    }

    /// A brand-new wallet per deposit.
    ///
    /// Nothing is persisted here, including the generated secret: deposits
    /// to these addresses are swept by an external holder of its own key
    /// escrow, so this service keeps no custody over them.
    async fn allocate_per_deposit(
        &self,
        network: &NetworkConfig,
    ) -> Result<DepositTarget, AllocationError> {
        let generated = self.keys.generate_wallet(&network.addressing_scheme).await?;

        let address = match (generated.address, generated.extended_public_key) {
            (Some(address), _) => address,
            (None, Some(xpub)) => {
                self.keys
                    .derive_address(&network.addressing_scheme, &xpub, 0)
                    .await?
            }
            (None, None) => {
                return Err(KeyServiceError::InvalidResponse(format!(
                    "scheme {} returned neither address nor extended public key",
                    network.addressing_scheme
                ))
                .into())
            }
        };

        Ok(DepositTarget {
            address,
            address_extra: None,
            derivation_index: None,
            strategy: network.strategy,
        })
    }

    /// Shared address plus a unique per-deposit tag.
    ///
    /// The tag is allocated only after the address resolved, so a failed
    /// resolution never consumes tags.
    async fn allocate_shared_with_tag(
        &self,
        network: &NetworkConfig,
    ) -> Result<DepositTarget, AllocationError> {
        let address = self.resolver().resolve_single_address(network).await?;

        let tag = self
            .wallets()
            .allocate_counter(&network.code, CounterKind::DepositTag)?;

        Ok(DepositTarget {
            address,
            address_extra: Some(tag.to_string()),
            derivation_index: None,
            strategy: network.strategy,
        })
    }
}
