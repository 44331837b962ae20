// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Domain types shared across storage, allocation and API layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Address-issuance strategy for a network.
///
/// This set is closed: every dispatch site matches exhaustively, so adding a
/// variant is a compile-checked change everywhere it is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    /// One master extended key per network; each deposit gets the next
    /// derivation index.
    HdXpub,
    /// One flat address per network, identical on every call.
    WalletSingleAddr,
    /// A brand-new wallet per deposit; nothing persisted by this service.
    WalletPerDeposit,
    /// One shared address per network, disambiguated by a per-deposit tag.
    SharedAddrWithTag,
}

/// Catalog entry for a supported network.
///
/// Read-only to the allocation core; rows are seeded at startup and managed
/// administratively.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NetworkConfig {
    /// Unique network code, e.g. `bitcoin`.
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// Identifier selecting which generation/derivation routine the Key
    /// Service uses for this network. Must be non-empty for allocation.
    pub addressing_scheme: String,
    /// Chain identifier understood by the Notification Service, if any.
    /// A distinct namespace from `addressing_scheme`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_chain_id: Option<String>,
    /// Whether deposits on this network carry a tag/memo.
    pub requires_memo: bool,
    /// Address-issuance strategy.
    pub strategy: Strategy,
    /// Whether allocations are currently allowed.
    pub is_active: bool,
}

/// Persistent master wallet record, one row per network.
///
/// Key-material fields are filled incrementally and never overwritten once
/// non-empty. Counters only ever move forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterWalletRecord {
    /// Owning network code (unique key).
    pub network_code: String,
    /// Extended public key for HD derivation, once generated.
    pub extended_public_key: Option<String>,
    /// Flat deposit address, once resolved.
    pub single_address: Option<String>,
    /// Envelope-encrypted wallet secret, once generated.
    pub encrypted_secret: Option<String>,
    /// Next HD derivation index to hand out.
    pub next_derivation_index: u32,
    /// Next deposit tag to hand out.
    pub next_deposit_tag: u64,
    /// Whether this wallet accepts new allocations.
    pub is_active: bool,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last modified.
    pub updated_at: DateTime<Utc>,
}

impl MasterWalletRecord {
    /// A fresh, empty record with counters at their starting points.
    pub fn empty(network_code: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            network_code: network_code.into(),
            extended_public_key: None,
            single_address: None,
            encrypted_secret: None,
            next_derivation_index: 0,
            next_deposit_tag: 1,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a patch, filling only fields that are currently empty.
    ///
    /// Existing key material always wins: a concurrent writer that lost the
    /// race reads back what the winner wrote instead of replacing it.
    /// Returns `true` if any field was filled.
    pub fn merge_missing(&mut self, patch: &MasterWalletPatch) -> bool {
        let mut changed = false;

        if self.extended_public_key.is_none() {
            if let Some(xpub) = &patch.extended_public_key {
                self.extended_public_key = Some(xpub.clone());
                changed = true;
            }
        }
        if self.single_address.is_none() {
            if let Some(address) = &patch.single_address {
                self.single_address = Some(address.clone());
                changed = true;
            }
        }
        if self.encrypted_secret.is_none() {
            if let Some(secret) = &patch.encrypted_secret {
                self.encrypted_secret = Some(secret.clone());
                changed = true;
            }
        }

        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

/// Fill-only-empty-fields patch for a [`MasterWalletRecord`].
#[derive(Debug, Clone, Default)]
pub struct MasterWalletPatch {
    pub extended_public_key: Option<String>,
    pub single_address: Option<String>,
    pub encrypted_secret: Option<String>,
}

/// Deposit target produced by the allocation engine.
///
/// Ephemeral: returned to the caller, never persisted here. Associating it
/// with a ledger entry is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DepositTarget {
    /// The address funds should be sent to.
    pub address: String,
    /// Tag/memo disambiguating deposits on a shared address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_extra: Option<String>,
    /// HD derivation index backing the address, where applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derivation_index: Option<u32>,
    /// The strategy that produced this target.
    pub strategy: Strategy,
}

/// Master wallet view returned to API clients.
///
/// The encrypted secret is never exposed, only its presence.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MasterWalletView {
    pub network_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_address: Option<String>,
    pub has_encrypted_secret: bool,
    pub next_derivation_index: u32,
    pub next_deposit_tag: u64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MasterWalletRecord> for MasterWalletView {
    fn from(record: MasterWalletRecord) -> Self {
        Self {
            network_code: record.network_code,
            extended_public_key: record.extended_public_key,
            single_address: record.single_address,
            has_encrypted_secret: record.encrypted_secret.is_some(),
            next_derivation_index: record.next_derivation_index,
            next_deposit_tag: record.next_deposit_tag,
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
