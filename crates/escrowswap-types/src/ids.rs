//! Identifiers used throughout EscrowSwap.
//!
//! Accounts are UUIDs (UUIDv7 for fresh ones, SHA-256-derived for system
//! custody accounts). Assets are opaque symbols. Offers carry a per-engine
//! monotonic counter. Pools are keyed by their canonical asset pair.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{EscrowSwapError, Result};

/// Amount in an asset's base units.
pub type Amount = u128;

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Opaque account identity on the ledger.
///
/// [`AccountId::ZERO`] is the zero identity. It can never be a trade
/// counterparty and doubles as the burn sink for locked pool shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    /// The zero identity.
    pub const ZERO: Self = Self(Uuid::nil());

    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Deterministic system account for a domain tag. Same tag, same
    /// account, on every node.
    #[must_use]
    pub fn derived(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"escrowswap:account:v1:");
        hasher.update(domain);
        let hash = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);
        Self(Uuid::from_bytes(bytes))
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AssetId
// ---------------------------------------------------------------------------

/// Opaque asset identifier (e.g. "USDC", "WETH").
///
/// Ordered lexicographically; the empty symbol is the null sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// The null asset.
    #[must_use]
    pub fn null() -> Self {
        Self(String::new())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetId {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// OfferId
// ---------------------------------------------------------------------------

/// Monotonically increasing offer identifier, unique per escrow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OfferId(pub u64);

impl OfferId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offer:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// PairKey / PoolId
// ---------------------------------------------------------------------------

/// Canonical unordered asset pair: `asset_a < asset_b` always holds, so
/// `(X, Y)` and `(Y, X)` resolve to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PairKey {
    asset_a: AssetId,
    asset_b: AssetId,
}

impl PairKey {
    /// Canonicalize two assets into a pair key.
    ///
    /// # Errors
    /// - `IdenticalAddresses` if both assets are the same
    /// - `ZeroAddress` if either asset is the null sentinel
    pub fn new(x: &AssetId, y: &AssetId) -> Result<Self> {
        if x == y {
            return Err(EscrowSwapError::IdenticalAddresses(x.clone()));
        }
        let (asset_a, asset_b) = if x < y { (x, y) } else { (y, x) };
        // The null asset sorts first, so checking `asset_a` is enough.
        if asset_a.is_null() {
            return Err(EscrowSwapError::ZeroAddress);
        }
        Ok(Self {
            asset_a: asset_a.clone(),
            asset_b: asset_b.clone(),
        })
    }

    #[must_use]
    pub fn asset_a(&self) -> &AssetId {
        &self.asset_a
    }

    #[must_use]
    pub fn asset_b(&self) -> &AssetId {
        &self.asset_b
    }

    #[must_use]
    pub fn contains(&self, asset: &AssetId) -> bool {
        &self.asset_a == asset || &self.asset_b == asset
    }

    /// The other side of the pair, if `asset` is part of it.
    #[must_use]
    pub fn other(&self, asset: &AssetId) -> Option<&AssetId> {
        if &self.asset_a == asset {
            Some(&self.asset_b)
        } else if &self.asset_b == asset {
            Some(&self.asset_a)
        } else {
            None
        }
    }

    /// Deterministic pool identifier for this pair.
    #[must_use]
    pub fn pool_id(&self) -> PoolId {
        let mut hasher = Sha256::new();
        hasher.update(b"escrowswap:pool:v1:");
        hasher.update(self.asset_a.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.asset_b.as_str().as_bytes());
        PoolId(hasher.finalize().into())
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.asset_a, self.asset_b)
    }
}

/// Identifier of a liquidity pool: SHA-256 of its canonical pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PoolId(pub [u8; 32]);

impl PoolId {
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Custody account that holds the reserves of one pool instance.
    ///
    /// Two pools for the same pair on one ledger never share custody as long
    /// as their `instance` ids differ.
    #[must_use]
    pub fn custody_account(&self, instance: AccountId) -> AccountId {
        let mut domain = Vec::with_capacity(48);
        domain.extend_from_slice(&self.0);
        domain.extend_from_slice(instance.0.as_bytes());
        AccountId::derived(&domain)
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
