use common::math;
use soroban_sdk::Env;

/// Divisor for the protocol tax minted to the treasury on every accrual:
/// one tenth of the pool's share, on top of (not out of) the amount that
/// feeds the accumulator.
pub const TREASURY_TAX_DIVISOR: i128 = 10;

/// Outcome of accruing a pool from its last synced height to the current one.
pub struct Accrual {
    /// Reward units attributed to the pool's stakers for the elapsed heights.
    pub pool_share: i128,
    /// Protocol tax minted to the treasury alongside `pool_share`.
    pub treasury_cut: i128,
    /// WAD-scaled increment to the pool's accumulated reward per share.
    pub per_share_delta: i128,
}

// ── Core accrual engine ─────────────────────────────────────────────────────

/// Computes what one pool earns over `elapsed` heights.
///
/// ```text
/// raw        = emission_rate × elapsed
/// scaled     = raw × multiplier_bps / BPS
/// pool_share = scaled × weight / total_weight
/// Δacc       = pool_share × WAD / supply
/// ```
///
/// Every division truncates toward zero. When the pool has no staked supply,
/// no weight, or the protocol has no total weight, the result is all zeros:
/// emission for that period is foregone, not carried forward.
pub fn accrue(
    env: &Env,
    emission_rate: i128,
    elapsed: u32,
    weight: u32,
    total_weight: u32,
    multiplier_bps: u32,
    supply: i128,
) -> Accrual {
    if supply <= 0 || weight == 0 || total_weight == 0 || emission_rate <= 0 {
        return Accrual {
            pool_share: 0,
            treasury_cut: 0,
            per_share_delta: 0,
        };
    }

    let raw = emission_rate.saturating_mul(elapsed as i128);
    let scaled = math::bps_scale(env, raw, multiplier_bps);
    let pool_share = math::mul_div(env, scaled, weight as i128, total_weight as i128);

    Accrual {
        pool_share,
        treasury_cut: pool_share / TREASURY_TAX_DIVISOR,
        per_share_delta: math::wad_div(env, pool_share, supply),
    }
}

/// Rewards owed to one position since its last settlement, unscaled by any
/// personal multiplier.
///
/// The offset is the position's `staked × acc` baseline taken at the last
/// settlement, so the subtraction isolates exactly the accumulation that
/// happened since then. Non-negative whenever `acc_per_share` has not
/// decreased, which the engine guarantees.
pub fn pending(env: &Env, staked: i128, acc_per_share: i128, reward_offset: i128) -> i128 {
    math::wad_mul(env, staked, acc_per_share).saturating_sub(reward_offset)
}

/// The baseline recorded after a settlement: `staked × acc / WAD`, truncating.
pub fn offset_for(env: &Env, staked: i128, acc_per_share: i128) -> i128 {
    math::wad_mul(env, staked, acc_per_share)
}

// ── Unit tests ──────────────────────────────────────────────────────────────
// Pure-math tests; no contract deployment required.
