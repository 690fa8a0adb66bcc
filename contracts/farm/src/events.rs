#![allow(deprecated)] // events().publish migration tracked separately

use soroban_sdk::{symbol_short, Address, Env};

// ── Event payloads ──────────────────────────────────────────────────────────

/// Fired once when the farm is bootstrapped.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InitializedEvent {
    pub registry: Address,
    pub reward_token: Address,
    pub treasury: Address,
    pub emission_rate: i128,
    pub allocation_factor_bps: u32,
    pub height: u32,
}

/// Fired when a pool is appended to the registry.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolAddedEvent {
    pub pool_id: u32,
    pub asset: Address,
    pub weight: u32,
    pub multiplier_bps: u32,
    pub height: u32,
}

/// Fired when a pool's weight or multiplier changes, including the derived
/// staking-pool weight written by the rebalancer.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolUpdatedEvent {
    pub pool_id: u32,
    pub weight: u32,
    pub multiplier_bps: u32,
    pub height: u32,
}

/// Fired when a user deposits principal into a pool.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepositedEvent {
    pub pool_id: u32,
    pub account: Address,
    pub amount: i128,
    pub height: u32,
}

/// Fired when a user withdraws principal from a pool.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawnEvent {
    pub pool_id: u32,
    pub account: Address,
    pub amount: i128,
    pub height: u32,
}

/// Fired when pending rewards are issued to a user.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HarvestedEvent {
    pub pool_id: u32,
    pub account: Address,
    pub amount: i128,
    pub height: u32,
}

/// Fired on the settlement-bypassing escape hatch.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EmergencyWithdrawnEvent {
    pub pool_id: u32,
    pub account: Address,
    pub amount: i128,
    pub height: u32,
}

/// Fired when the emission rate changes.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EmissionRateSetEvent {
    pub rate: i128,
    pub height: u32,
}

/// Fired when the staking-pool allocation factor changes.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllocationFactorSetEvent {
    pub factor_bps: u32,
    pub height: u32,
}

/// Fired when the treasury address changes.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreasurySetEvent {
    pub treasury: Address,
    pub height: u32,
}

/// Fired when the personal-multiplier provider is set.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MultiplierProviderSetEvent {
    pub provider: Address,
    pub height: u32,
}

/// Fired when the personal-multiplier provider is cleared, restoring the
/// default 1.0 ratio for every account.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MultiplierProviderClearedEvent {
    pub height: u32,
}

/// Fired when a stray (untracked) asset balance is recovered.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssetRecoveredEvent {
    pub token: Address,
    pub to: Address,
    pub amount: i128,
    pub height: u32,
}

// ── Publishers ──────────────────────────────────────────────────────────────

pub fn publish_initialized(
    env: &Env,
    registry: Address,
    reward_token: Address,
    treasury: Address,
    emission_rate: i128,
    allocation_factor_bps: u32,
) {
    env.events().publish(
        (symbol_short!("INIT"),),
        InitializedEvent {
            registry,
            reward_token,
            treasury,
            emission_rate,
            allocation_factor_bps,
            height: env.ledger().sequence(),
        },
    );
}

pub fn publish_pool_added(env: &Env, pool_id: u32, asset: Address, weight: u32, multiplier_bps: u32) {
    env.events().publish(
        (symbol_short!("POOL_ADD"), pool_id),
        PoolAddedEvent {
            pool_id,
            asset,
            weight,
            multiplier_bps,
            height: env.ledger().sequence(),
        },
    );
}

pub fn publish_pool_updated(env: &Env, pool_id: u32, weight: u32, multiplier_bps: u32) {
    env.events().publish(
        (symbol_short!("POOL_UPD"), pool_id),
        PoolUpdatedEvent {
            pool_id,
            weight,
            multiplier_bps,
            height: env.ledger().sequence(),
        },
    );
}

pub fn publish_deposited(env: &Env, pool_id: u32, account: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("DEPOSIT"), pool_id, account.clone()),
        DepositedEvent {
            pool_id,
            account,
            amount,
            height: env.ledger().sequence(),
        },
    );
}

pub fn publish_withdrawn(env: &Env, pool_id: u32, account: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("WITHDRAW"), pool_id, account.clone()),
        WithdrawnEvent {
            pool_id,
            account,
            amount,
            height: env.ledger().sequence(),
        },
    );
}

pub fn publish_harvested(env: &Env, pool_id: u32, account: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("HARVEST"), pool_id, account.clone()),
        HarvestedEvent {
            pool_id,
            account,
            amount,
            height: env.ledger().sequence(),
        },
    );
}

pub fn publish_emergency_withdrawn(env: &Env, pool_id: u32, account: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("EMERG_WD"), pool_id, account.clone()),
        EmergencyWithdrawnEvent {
            pool_id,
            account,
            amount,
            height: env.ledger().sequence(),
        },
    );
}

pub fn publish_emission_rate_set(env: &Env, rate: i128) {
    env.events().publish(
        (symbol_short!("EMIT_SET"),),
        EmissionRateSetEvent {
            rate,
            height: env.ledger().sequence(),
        },
    );
}

pub fn publish_allocation_factor_set(env: &Env, factor_bps: u32) {
    env.events().publish(
        (symbol_short!("ALLOC_SET"),),
        AllocationFactorSetEvent {
            factor_bps,
            height: env.ledger().sequence(),
        },
    );
}

pub fn publish_treasury_set(env: &Env, treasury: Address) {
    env.events().publish(
        (symbol_short!("TREAS_SET"),),
        TreasurySetEvent {
            treasury,
            height: env.ledger().sequence(),
        },
    );
}

pub fn publish_multiplier_provider_set(env: &Env, provider: Option<Address>) {
    match provider {
        Some(provider) => env.events().publish(
            (symbol_short!("MULT_SET"),),
            MultiplierProviderSetEvent {
                provider,
                height: env.ledger().sequence(),
            },
        ),
        None => env.events().publish(
            (symbol_short!("MULT_CLR"),),
            MultiplierProviderClearedEvent {
                height: env.ledger().sequence(),
            },
        ),
    }
}

pub fn publish_asset_recovered(env: &Env, token: Address, to: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("RECOVERED"), token.clone()),
        AssetRecoveredEvent {
            token,
            to,
            amount,
            height: env.ledger().sequence(),
        },
    );
}
