//! Fixed-point reward arithmetic.
//!
//! Products are formed in 256 bits before dividing, so a window of any size
//! a token can express settles without overflow. The accumulator itself is
//! a `u128` kept modulo 2^128: it only ever matters through the difference
//! between two readings, taken with wrapping subtraction in [`accrued`].

use primitive_types::U256;

use crate::ContractError;

/// Fixed-point scaling factor for the reward-per-stake accumulator.
///
/// Every accumulator value is multiplied by this constant so the per-stake
/// division keeps 18 decimal places without floating point.
pub const SCALE: u128 = 1_000_000_000_000_000_000;

// ── Core reward arithmetic ──────────────────────────────────────────────────

/// Advance the reward-per-stake accumulator by `elapsed` seconds.
///
/// ```text
/// Δrps = reward_rate × elapsed × SCALE / total_staked
/// new_rps = stored + Δrps
/// ```
///
/// With nothing staked nobody is eligible to earn, so `stored` is returned
/// unchanged. The multiplication happens before the division, in 256 bits.
///
/// # Arguments
/// * `stored`       – current accumulator (scaled by `SCALE`)
/// * `reward_rate`  – reward units emitted per second across all stakers
/// * `elapsed`      – seconds since the last settlement
/// * `total_staked` – sum of all active stakes
pub fn reward_per_stake(
    stored: u128,
    reward_rate: u128,
    elapsed: u64,
    total_staked: u128,
) -> Result<u128, ContractError> {
    if total_staked == 0 || elapsed == 0 {
        return Ok(stored);
    }

    let delta = U256::from(reward_rate)
        .checked_mul(U256::from(elapsed))
        .and_then(|v| v.checked_mul(U256::from(SCALE)))
        .ok_or(ContractError::ArithmeticOverflow)?
        / U256::from(total_staked);

    Ok(stored.wrapping_add(delta.low_u128()))
}

/// Reward owed to a participant after settling against `current_rps`.
///
/// ```text
/// owed' = owed + staked × (current_rps − checkpoint) / SCALE
/// ```
///
/// Only the accumulation since the participant's last checkpoint is
/// credited, so earlier settlements are never counted twice. The difference
/// wraps, so a reading taken after the accumulator rolls over still yields
/// the true distance from `checkpoint`.
pub fn accrued(
    staked: u128,
    current_rps: u128,
    checkpoint: u128,
    owed: u128,
) -> Result<u128, ContractError> {
    let since = current_rps.wrapping_sub(checkpoint);
    let fresh = U256::from(staked)
        .checked_mul(U256::from(since))
        .ok_or(ContractError::ArithmeticOverflow)?
        / U256::from(SCALE);

    owed.checked_add(narrow(fresh)?)
        .ok_or(ContractError::ArithmeticOverflow)
}

fn narrow(value: U256) -> Result<u128, ContractError> {
    if value > U256::from(u128::MAX) {
        return Err(ContractError::ArithmeticOverflow);
    }
    Ok(value.low_u128())
}

/// Per-second emission for a newly funded window.
///
/// `carried` is the undistributed remainder of a still-running window
/// (`reward_rate × remaining`); it is folded into the new window so nothing
/// is lost or paid twice. Integer division rounds down.
pub fn window_rate(amount: u128, carried: u128, duration: u64) -> Result<u128, ContractError> {
    if duration == 0 {
        return Err(ContractError::InvalidDuration);
    }
    let pot = amount
        .checked_add(carried)
        .ok_or(ContractError::ArithmeticOverflow)?;
    Ok(pot / u128::from(duration))
}
