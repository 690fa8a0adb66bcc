use common::math;
use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

// ── Reserved pool identities ─────────────────────────────────────────────────

/// Pool 0 stakes the protocol's own reward asset; its weight is derived by
/// [`rebalance`] and never set directly.
pub const STAKING_POOL_ID: u32 = 0;
/// Pool 1 stakes the wrapped-native asset and is bootstrapped exactly once.
pub const NATIVE_POOL_ID: u32 = 1;

/// Member pool weights are bounded to 16 bits. The derived staking-pool
/// weight is a scaled sum over all members and may exceed this bound, so
/// weights are stored as `u32`.
pub const MAX_POOL_WEIGHT: u32 = u16::MAX as u32;

// ── Storage key constants ────────────────────────────────────────────────────

const POOL: Symbol = symbol_short!("POOL");
const POOL_CTR: Symbol = symbol_short!("POOL_CTR");
const POOL_OF: Symbol = symbol_short!("POOL_OF");
const POSITION: Symbol = symbol_short!("POS");

const TTL_THRESHOLD: u32 = 5184000;
const TTL_EXTEND_TO: u32 = 10368000;

// ── Types ────────────────────────────────────────────────────────────────────

/// One reward-earning bucket tracking a single stakeable asset.
///
/// `acc_reward_per_share` and `last_sync_height` are monotonically
/// non-decreasing for the lifetime of the pool.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pool {
    /// Token contract whose balance this pool tracks.
    pub asset: Address,
    /// This pool's share of total reward emission.
    pub weight: u32,
    /// Per-pool emission scaling factor in basis points.
    pub multiplier_bps: u32,
    /// WAD-scaled cumulative reward per staked unit.
    pub acc_reward_per_share: i128,
    /// Ledger height at which accrual was last applied.
    pub last_sync_height: u32,
}

/// A depositor's stake in one pool. Created lazily on first deposit and never
/// deleted; a full exit zeroes both fields but the record persists.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Position {
    /// Principal currently deposited.
    pub staked: i128,
    /// `staked × acc_reward_per_share / WAD` as of the last settlement.
    /// A baseline for deriving pending rewards, not a balance.
    pub reward_offset: i128,
}

/// The staking pool's recomputed state after a weight change elsewhere.
pub struct RebalanceOutcome {
    pub staking_pool: Pool,
    pub total_weight: u32,
}

// ── Storage helpers ──────────────────────────────────────────────────────────

fn pool_key(pool_id: u32) -> (Symbol, u32) {
    (POOL, pool_id)
}

fn asset_key(asset: &Address) -> (Symbol, Address) {
    (POOL_OF, asset.clone())
}

fn position_key(pool_id: u32, account: &Address) -> (Symbol, u32, Address) {
    (POSITION, pool_id, account.clone())
}

/// Number of pools ever created. Pool indices are permanent identities in
/// `0..pool_count`.
pub fn pool_count(env: &Env) -> u32 {
    env.storage().instance().get(&POOL_CTR).unwrap_or(0)
}

pub fn get(env: &Env, pool_id: u32) -> Option<Pool> {
    let key = pool_key(pool_id);
    let pool: Option<Pool> = env.storage().persistent().get(&key);
    if pool.is_some() {
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    pool
}

pub fn store(env: &Env, pool_id: u32, pool: &Pool) {
    let key = pool_key(pool_id);
    env.storage().persistent().set(&key, pool);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

/// Appends a new pool record, indexes its asset, and returns the permanent
/// pool id. Pools are never removed.
pub fn append(env: &Env, pool: &Pool) -> u32 {
    let pool_id = pool_count(env);
    store(env, pool_id, pool);
    env.storage()
        .persistent()
        .set(&asset_key(&pool.asset), &pool_id);
    env.storage()
        .instance()
        .set(&POOL_CTR, &pool_id.saturating_add(1));
    pool_id
}

/// Whether `asset` is tracked by any pool. Tracked assets can never be
/// recovered via the stray-balance escape hatch, and no two pools may share
/// an asset.
pub fn is_tracked_asset(env: &Env, asset: &Address) -> bool {
    env.storage().persistent().has(&asset_key(asset))
}

pub fn position(env: &Env, pool_id: u32, account: &Address) -> Position {
    let key = position_key(pool_id, account);
    let pos: Option<Position> = env.storage().persistent().get(&key);
    match pos {
        Some(p) => {
            env.storage()
                .persistent()
                .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
            p
        }
        None => Position {
            staked: 0,
            reward_offset: 0,
        },
    }
}

pub fn store_position(env: &Env, pool_id: u32, account: &Address, pos: &Position) {
    let key = position_key(pool_id, account);
    env.storage().persistent().set(&key, pos);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

// ── Dynamic allocation rebalancer ────────────────────────────────────────────

/// Recomputes the staking pool's derived weight:
///
/// ```text
/// weight[0] = floor(sum(weight[1..]) × factor_bps / BPS)
/// ```
///
/// This is the only place pool 0's weight is ever written, which keeps the
/// derived-weight invariant in one function instead of scattered across
/// every mutation site. Callers must have synced all pools at the old
/// weights first, and are responsible for persisting the returned total
/// weight and publishing the pool-updated notification.
///
/// Returns `None` until the staking pool exists.
pub fn rebalance(env: &Env, factor_bps: u32) -> Option<RebalanceOutcome> {
    let mut staking_pool = get(env, STAKING_POOL_ID)?;

    let mut member_weight: u64 = 0;
    for pool_id in 1..pool_count(env) {
        if let Some(pool) = get(env, pool_id) {
            member_weight += pool.weight as u64;
        }
    }

    let derived = member_weight * factor_bps as u64 / math::BPS as u64;
    staking_pool.weight = u32::try_from(derived).unwrap_or(u32::MAX);
    store(env, STAKING_POOL_ID, &staking_pool);

    let total = member_weight + staking_pool.weight as u64;
    Some(RebalanceOutcome {
        staking_pool,
        total_weight: u32::try_from(total).unwrap_or(u32::MAX),
    })
}
