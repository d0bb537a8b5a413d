//! Integer constant-product math.
//!
//! All functions use checked `u128` arithmetic and truncating division, in
//! the order written below. Overflow surfaces as `ArithmeticOverflow`; it is
//! never wrapped or saturated.

use escrowswap_types::constants::{MINIMUM_LIQUIDITY, SWAP_FEE_DENOMINATOR, SWAP_FEE_NUMERATOR};
use escrowswap_types::{Amount, EscrowSwapError, Result};

fn mul(a: Amount, b: Amount, what: &'static str) -> Result<Amount> {
    a.checked_mul(b)
        .ok_or(EscrowSwapError::ArithmeticOverflow(what))
}

fn add(a: Amount, b: Amount, what: &'static str) -> Result<Amount> {
    a.checked_add(b)
        .ok_or(EscrowSwapError::ArithmeticOverflow(what))
}

/// Integer square root (floor) via Newton's method.
#[must_use]
pub fn isqrt(n: u128) -> u128 {
    if n == 0 {
        return 0;
    }
    let mut x = n;
    let mut y = x.div_ceil(2);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

/// Equivalent amount of the other asset at the current reserve ratio:
/// `amount_a · reserve_b / reserve_a`.
///
/// # Errors
/// `ZeroAmount` for a zero amount, `InsufficientLiquidity` for an empty
/// reserve.
pub fn quote(amount_a: Amount, reserve_a: Amount, reserve_b: Amount) -> Result<Amount> {
    if amount_a == 0 {
        return Err(EscrowSwapError::ZeroAmount { field: "amount" });
    }
    if reserve_a == 0 || reserve_b == 0 {
        return Err(EscrowSwapError::InsufficientLiquidity);
    }
    Ok(mul(amount_a, reserve_b, "quote")? / reserve_a)
}

/// Output of an exact-in swap after the 0.3% fee:
///
/// ```text
/// in_with_fee = amount_in · 997
/// amount_out  = in_with_fee · reserve_out / (reserve_in · 1000 + in_with_fee)
/// ```
///
/// # Errors
/// `InsufficientInputAmount` for zero input, `InsufficientLiquidity` if
/// either reserve is empty.
pub fn get_amount_out(amount_in: Amount, reserve_in: Amount, reserve_out: Amount) -> Result<Amount> {
    if amount_in == 0 {
        return Err(EscrowSwapError::InsufficientInputAmount);
    }
    if reserve_in == 0 || reserve_out == 0 {
        return Err(EscrowSwapError::InsufficientLiquidity);
    }
    let in_with_fee = mul(amount_in, SWAP_FEE_NUMERATOR, "swap input")?;
    let numerator = mul(in_with_fee, reserve_out, "swap numerator")?;
    let denominator = add(
        mul(reserve_in, SWAP_FEE_DENOMINATOR, "swap denominator")?,
        in_with_fee,
        "swap denominator",
    )?;
    Ok(numerator / denominator)
}

/// Input needed to receive exactly `amount_out`, rounded up by one unit:
///
/// ```text
/// amount_in = reserve_in · amount_out · 1000 / ((reserve_out − amount_out) · 997) + 1
/// ```
///
/// # Errors
/// `InsufficientOutputAmount` for a zero output, `InsufficientLiquidity` if
/// either reserve is empty or `amount_out` would drain `reserve_out`.
pub fn get_amount_in(amount_out: Amount, reserve_in: Amount, reserve_out: Amount) -> Result<Amount> {
    if amount_out == 0 {
        return Err(EscrowSwapError::InsufficientOutputAmount {
            amount_out: 0,
            minimum: 1,
        });
    }
    if reserve_in == 0 || reserve_out == 0 || amount_out >= reserve_out {
        return Err(EscrowSwapError::InsufficientLiquidity);
    }
    let numerator = mul(
        mul(reserve_in, amount_out, "exact-out numerator")?,
        SWAP_FEE_DENOMINATOR,
        "exact-out numerator",
    )?;
    let denominator = mul(
        reserve_out - amount_out,
        SWAP_FEE_NUMERATOR,
        "exact-out denominator",
    )?;
    add(numerator / denominator, 1, "exact-out input")
}

/// Shares minted by the first deposit into an empty pool, after locking
/// `MINIMUM_LIQUIDITY`.
///
/// # Errors
/// `InsufficientInitialLiquidity` if `isqrt(a · b) ≤ MINIMUM_LIQUIDITY`.
pub fn initial_shares(amount_a: Amount, amount_b: Amount) -> Result<Amount> {
    let root = isqrt(mul(amount_a, amount_b, "initial liquidity")?);
    if root <= MINIMUM_LIQUIDITY {
        return Err(EscrowSwapError::InsufficientInitialLiquidity);
    }
    Ok(root - MINIMUM_LIQUIDITY)
}

/// Shares minted by a deposit into a non-empty pool:
/// `min(a · T / reserve_a, b · T / reserve_b)`.
pub fn proportional_shares(
    amount_a: Amount,
    amount_b: Amount,
    reserve_a: Amount,
    reserve_b: Amount,
    total_shares: Amount,
) -> Result<Amount> {
    if reserve_a == 0 || reserve_b == 0 {
        return Err(EscrowSwapError::InsufficientLiquidity);
    }
    let by_a = mul(amount_a, total_shares, "shares")? / reserve_a;
    let by_b = mul(amount_b, total_shares, "shares")? / reserve_b;
    Ok(by_a.min(by_b))
}

/// Pro-rata slice of a reserve for `shares` out of `total_shares` (floor).
pub fn pro_rata(shares: Amount, reserve: Amount, total_shares: Amount) -> Result<Amount> {
    if total_shares == 0 {
        return Err(EscrowSwapError::InsufficientLiquidity);
    }
    Ok(mul(shares, reserve, "withdrawal")? / total_shares)
}

/// `reserve_a · reserve_b`.
pub fn product(reserve_a: Amount, reserve_b: Amount) -> Result<Amount> {
    mul(reserve_a, reserve_b, "reserve product")
}
