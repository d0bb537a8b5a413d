//! Error types for EscrowSwap.
//!
//! All errors use the `ES_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by [`ErrorKind`]:
//! - 1xx: Validation (bad inputs)
//! - 2xx: Authorization (wrong caller)
//! - 3xx: State (offer not active, pair exists, ...)
//! - 4xx: Rate limiting
//! - 5xx: Liquidity / balance
//! - 9xx: Invariant violations and internal errors (fatal)

use thiserror::Error;

use crate::{AccountId, Amount, AssetId, OfferId, OfferStatus, PairKey};

/// Coarse classification of an [`EscrowSwapError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Authorization,
    State,
    RateLimit,
    Liquidity,
    Invariant,
}

/// Central error enum for all EscrowSwap operations.
#[derive(Debug, Error)]
pub enum EscrowSwapError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// A required amount was zero.
    #[error("ES_ERR_100: {field} must be greater than zero")]
    ZeroAmount { field: &'static str },

    /// An account or asset was the zero / null sentinel.
    #[error("ES_ERR_101: Zero address")]
    ZeroAddress,

    /// Buyer and seller of an offer are the same account.
    #[error("ES_ERR_102: Buyer and seller are the same account: {0}")]
    BuyerIsSeller(AccountId),

    /// Both sides of a pair are the same asset.
    #[error("ES_ERR_103: Identical assets: {0}")]
    IdenticalAddresses(AssetId),

    /// The asset is not listed on the ledger or not part of the pool.
    #[error("ES_ERR_104: Invalid asset: {0}")]
    InvalidAsset(AssetId),

    /// The offer time-to-live is not strictly positive.
    #[error("ES_ERR_105: Invalid expiry: {reason}")]
    InvalidExpiry { reason: String },

    /// A quoting path is too short.
    #[error("ES_ERR_106: Invalid path: {reason}")]
    InvalidPath { reason: String },

    // =================================================================
    // Authorization Errors (2xx)
    // =================================================================
    /// Only the designated buyer may accept an offer.
    #[error("ES_ERR_200: {caller} is not the designated buyer of {offer_id}")]
    NotDesignatedBuyer { offer_id: OfferId, caller: AccountId },

    /// Only the seller may cancel an offer.
    #[error("ES_ERR_201: {caller} is not the seller of {offer_id}")]
    NotSeller { offer_id: OfferId, caller: AccountId },

    // =================================================================
    // State Errors (3xx)
    // =================================================================
    /// No offer with this id.
    #[error("ES_ERR_300: Offer not found: {0}")]
    OfferNotFound(OfferId),

    /// The offer already reached a terminal state.
    #[error("ES_ERR_301: {offer_id} is {status}, not ACTIVE")]
    OfferNotActive {
        offer_id: OfferId,
        status: OfferStatus,
    },

    /// The offer is past its deadline and can no longer be accepted.
    #[error("ES_ERR_302: Offer expired: {0}")]
    OfferExpired(OfferId),

    /// The offer has no deadline or the deadline has not passed.
    #[error("ES_ERR_303: Offer not yet expired: {0}")]
    NotYetExpired(OfferId),

    /// A pool already exists for this pair.
    #[error("ES_ERR_304: Pair already exists: {0}")]
    PairExists(PairKey),

    /// No pool exists for this pair.
    #[error("ES_ERR_305: Pool not found: {0}")]
    PoolNotFound(PairKey),

    // =================================================================
    // Rate Limit Errors (4xx)
    // =================================================================
    /// The account created an offer too recently.
    #[error("ES_ERR_400: Cooldown active: retry in {remaining_secs}s")]
    CooldownActive { remaining_secs: i64 },

    /// The account used up its offers for the current window.
    #[error("ES_ERR_401: Offer limit reached: {limit} per window")]
    DailyLimitReached { limit: u32 },

    // =================================================================
    // Liquidity Errors (5xx)
    // =================================================================
    /// Not enough balance to perform a transfer.
    #[error("ES_ERR_500: Insufficient balance of {asset}: need {needed}, have {available}")]
    InsufficientBalance {
        asset: AssetId,
        needed: Amount,
        available: Amount,
    },

    /// The first deposit does not clear the locked minimum liquidity.
    #[error("ES_ERR_501: Insufficient initial liquidity")]
    InsufficientInitialLiquidity,

    /// A deposit would mint zero shares.
    #[error("ES_ERR_502: Insufficient liquidity minted")]
    InsufficientLiquidityMinted,

    /// A withdrawal would return zero of one asset.
    #[error("ES_ERR_503: Insufficient liquidity burned")]
    InsufficientLiquidityBurned,

    /// A swap was requested with zero input.
    #[error("ES_ERR_504: Insufficient input amount")]
    InsufficientInputAmount,

    /// A swap output is zero or below the caller's minimum.
    #[error("ES_ERR_505: Insufficient output amount: got {amount_out}, minimum {minimum}")]
    InsufficientOutputAmount { amount_out: Amount, minimum: Amount },

    /// A pool reserve is empty.
    #[error("ES_ERR_506: Insufficient liquidity")]
    InsufficientLiquidity,

    /// The ratio-preserving amount of asset A is below the caller's minimum.
    #[error("ES_ERR_507: Insufficient A amount: optimal {optimal}, minimum {minimum}")]
    InsufficientAAmount { optimal: Amount, minimum: Amount },

    /// The ratio-preserving amount of asset B is below the caller's minimum.
    #[error("ES_ERR_508: Insufficient B amount: optimal {optimal}, minimum {minimum}")]
    InsufficientBAmount { optimal: Amount, minimum: Amount },

    /// The account holds fewer pool shares than requested.
    #[error("ES_ERR_509: Insufficient shares: need {needed}, have {available}")]
    InsufficientShares { needed: Amount, available: Amount },

    // =================================================================
    // Invariant / Internal Errors (9xx)
    // =================================================================
    /// Checked integer arithmetic overflowed.
    #[error("ES_ERR_900: Arithmetic overflow: {0}")]
    ArithmeticOverflow(&'static str),

    /// A core invariant no longer holds. Indicates a bug; the operation
    /// was aborted.
    #[error("ES_ERR_901: Invariant violation: {reason}")]
    InvariantViolation { reason: String },

    /// Unrecoverable internal error (e.g. a poisoned lock).
    #[error("ES_ERR_902: Internal error: {0}")]
    Internal(String),

    /// Configuration error (invalid file, missing fields, etc.).
    #[error("ES_ERR_903: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("ES_ERR_904: Serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("ES_ERR_905: I/O error: {0}")]
    Io(String),
}

impl EscrowSwapError {
    /// Which error group this belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroAmount { .. }
            | Self::ZeroAddress
            | Self::BuyerIsSeller(_)
            | Self::IdenticalAddresses(_)
            | Self::InvalidAsset(_)
            | Self::InvalidExpiry { .. }
            | Self::InvalidPath { .. } => ErrorKind::Validation,
            Self::NotDesignatedBuyer { .. } | Self::NotSeller { .. } => ErrorKind::Authorization,
            Self::OfferNotFound(_)
            | Self::OfferNotActive { .. }
            | Self::OfferExpired(_)
            | Self::NotYetExpired(_)
            | Self::PairExists(_)
            | Self::PoolNotFound(_) => ErrorKind::State,
            Self::CooldownActive { .. } | Self::DailyLimitReached { .. } => ErrorKind::RateLimit,
            Self::InsufficientBalance { .. }
            | Self::InsufficientInitialLiquidity
            | Self::InsufficientLiquidityMinted
            | Self::InsufficientLiquidityBurned
            | Self::InsufficientInputAmount
            | Self::InsufficientOutputAmount { .. }
            | Self::InsufficientLiquidity
            | Self::InsufficientAAmount { .. }
            | Self::InsufficientBAmount { .. }
            | Self::InsufficientShares { .. } => ErrorKind::Liquidity,
            Self::ArithmeticOverflow(_)
            | Self::InvariantViolation { .. }
            | Self::Internal(_)
            | Self::Configuration(_)
            | Self::Serialization(_)
            | Self::Io(_) => ErrorKind::Invariant,
        }
    }

    /// Fatal errors indicate a bug or broken host, not a bad request.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ArithmeticOverflow(_) | Self::InvariantViolation { .. } | Self::Internal(_)
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, EscrowSwapError>;

impl From<std::io::Error> for EscrowSwapError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EscrowSwapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
