#![no_std]

pub mod accrual;
pub mod events;
pub mod interfaces;
pub mod pool;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

use common::{guard, math};
use soroban_sdk::{
    contract, contractimpl, contracttype, symbol_short, token, Address, Env, Symbol, Vec,
};

use interfaces::{MultiplierProviderClient, NativeWrapperClient, RoleRegistryClient};
use pool::{Pool, Position};

pub use pool::{MAX_POOL_WEIGHT, NATIVE_POOL_ID, STAKING_POOL_ID};

// ── Storage key constants ────────────────────────────────────────────────────

const INITIALIZED: Symbol = symbol_short!("INIT");
const REGISTRY: Symbol = symbol_short!("REGISTRY");
const REWARD_TOKEN: Symbol = symbol_short!("RWD_TOK");
const TREASURY: Symbol = symbol_short!("TREASURY");
const EMISSION_RATE: Symbol = symbol_short!("EMIT_RATE");
const ALLOC_FACTOR: Symbol = symbol_short!("ALLOC_BPS");
const TOTAL_WEIGHT: Symbol = symbol_short!("TOT_WT");
const MULT_PROVIDER: Symbol = symbol_short!("MULT_PROV");
const WRAPPER: Symbol = symbol_short!("WRAPPER");
const WRAPPED_TOKEN: Symbol = symbol_short!("WRAP_TOK");

// ── Contract errors ──────────────────────────────────────────────────────────

#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContractError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    InvalidParams = 4,
    ZeroAmount = 5,
    InsufficientBalance = 6,
    PoolNotFound = 7,
    ReentrantCall = 8,
}

// ── Public-facing view types ─────────────────────────────────────────────────

/// Protocol-level snapshot returned by `protocol_summary`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProtocolSummary {
    pub pool_count: u32,
    pub total_weight: u32,
    pub emission_rate: i128,
    pub allocation_factor_bps: u32,
}

/// One pool's full state plus its live staked supply.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolView {
    pub pool_id: u32,
    pub asset: Address,
    pub weight: u32,
    pub multiplier_bps: u32,
    pub supply: i128,
    pub acc_reward_per_share: i128,
    pub last_sync_height: u32,
}

/// One account's stake in one pool, with its projected pending reward.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PositionView {
    pub pool_id: u32,
    pub staked: i128,
    pub pending_reward: i128,
}

/// Cross-pool summary for one account, restricted to pools with nonzero
/// stake.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountSummary {
    pub total_staked: i128,
    pub total_pending: i128,
    pub multiplier: i128,
    pub positions: Vec<PositionView>,
}

// ── Re-entrancy wrapper ──────────────────────────────────────────────────────

/// Runs one principal-changing transition under the re-entrancy guard. The
/// token and collaborator calls inside `f` are the only points where
/// untrusted code regains control, so the guard brackets the whole closure.
fn with_guard<T>(
    env: &Env,
    f: impl FnOnce(&Env) -> Result<T, ContractError>,
) -> Result<T, ContractError> {
    if !guard::enter(env) {
        return Err(ContractError::ReentrantCall);
    }
    let out = f(env);
    guard::exit(env);
    out
}

// ── Contract ─────────────────────────────────────────────────────────────────

#[contract]
pub struct FarmContract;

#[contractimpl]
impl FarmContract {
    // ── Initialisation ──────────────────────────────────────────────────────

    /// Bootstrap the farm and create the staking pool (pool 0) over the
    /// reward asset itself.
    ///
    /// * `registry`      – role-registry contract answering `is_admin`.
    /// * `reward_token`  – asset contract the farm issues rewards in; the
    ///   farm must hold its admin role for issuance to succeed.
    /// * `treasury`      – recipient of the protocol tax on every accrual.
    /// * `emission_rate` – reward units emitted per ledger height across all
    ///   pools.
    /// * `allocation_factor_bps` – pool 0's derived weight as a fraction of
    ///   all other pools' combined weight, at most `BPS`.
    ///
    /// The staking pool starts with weight 0; it grows as member pools are
    /// added and the rebalancer runs. Emission before a pool has both weight
    /// and supply is foregone, not carried forward.
    pub fn initialize(
        env: Env,
        caller: Address,
        registry: Address,
        reward_token: Address,
        treasury: Address,
        emission_rate: i128,
        allocation_factor_bps: u32,
    ) -> Result<(), ContractError> {
        if env.storage().instance().has(&INITIALIZED) {
            return Err(ContractError::AlreadyInitialized);
        }
        caller.require_auth();
        if !RoleRegistryClient::new(&env, &registry).is_admin(&caller) {
            return Err(ContractError::Unauthorized);
        }
        if emission_rate < 0 || allocation_factor_bps > math::BPS as u32 {
            return Err(ContractError::InvalidParams);
        }

        env.storage().instance().set(&INITIALIZED, &true);
        env.storage().instance().set(&REGISTRY, &registry);
        env.storage().instance().set(&REWARD_TOKEN, &reward_token);
        env.storage().instance().set(&TREASURY, &treasury);
        env.storage().instance().set(&EMISSION_RATE, &emission_rate);
        env.storage()
            .instance()
            .set(&ALLOC_FACTOR, &allocation_factor_bps);
        env.storage().instance().set(&TOTAL_WEIGHT, &0u32);

        pool::append(
            &env,
            &Pool {
                asset: reward_token.clone(),
                weight: 0,
                multiplier_bps: math::BPS as u32,
                acc_reward_per_share: 0,
                last_sync_height: env.ledger().sequence(),
            },
        );

        events::publish_initialized(
            &env,
            registry,
            reward_token,
            treasury,
            emission_rate,
            allocation_factor_bps,
        );

        Ok(())
    }

    /// One-time setup of the reserved wrapped-native pool (pool 1).
    ///
    /// Must run before any member pool is added: the pool registry is
    /// append-only, so index 1 can only be claimed while exactly the staking
    /// pool exists. Fails with `InvalidParams` on any other cardinality.
    pub fn bootstrap_native_pool(
        env: Env,
        caller: Address,
        wrapper: Address,
        wrapped_token: Address,
        weight: u32,
        multiplier_bps: u32,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_admin(&env, &caller)?;
        Self::validate_pool_params(weight, multiplier_bps)?;

        if pool::pool_count(&env) != pool::NATIVE_POOL_ID {
            return Err(ContractError::InvalidParams);
        }
        if pool::is_tracked_asset(&env, &wrapped_token) {
            return Err(ContractError::InvalidParams);
        }

        env.storage().instance().set(&WRAPPER, &wrapper);
        env.storage().instance().set(&WRAPPED_TOKEN, &wrapped_token);

        let pool_id = pool::append(
            &env,
            &Pool {
                asset: wrapped_token.clone(),
                weight,
                multiplier_bps,
                acc_reward_per_share: 0,
                last_sync_height: env.ledger().sequence(),
            },
        );
        Self::rebalance_staking_pool(&env)?;

        events::publish_pool_added(&env, pool_id, wrapped_token, weight, multiplier_bps);

        Ok(())
    }

    // ── Pool administration ─────────────────────────────────────────────────

    /// Append a new member pool for `asset`.
    ///
    /// All pools are synced at the old weights first, so past emission is
    /// settled before the new pool dilutes the split. No two pools may track
    /// the same asset: a pool's supply is the farm's balance of that asset.
    pub fn add_pool(
        env: Env,
        caller: Address,
        asset: Address,
        weight: u32,
        multiplier_bps: u32,
    ) -> Result<u32, ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_admin(&env, &caller)?;
        Self::validate_pool_params(weight, multiplier_bps)?;

        // Index 1 stays reserved for the native pool.
        if pool::pool_count(&env) <= pool::NATIVE_POOL_ID {
            return Err(ContractError::InvalidParams);
        }
        if pool::is_tracked_asset(&env, &asset) {
            return Err(ContractError::InvalidParams);
        }

        Self::sync_all_pools(&env)?;

        let pool_id = pool::append(
            &env,
            &Pool {
                asset: asset.clone(),
                weight,
                multiplier_bps,
                acc_reward_per_share: 0,
                last_sync_height: env.ledger().sequence(),
            },
        );
        Self::rebalance_staking_pool(&env)?;

        events::publish_pool_added(&env, pool_id, asset, weight, multiplier_bps);

        Ok(pool_id)
    }

    /// Update a member pool's emission weight.
    ///
    /// Pool 0's weight is derived by the rebalancer and cannot be set
    /// directly.
    pub fn set_pool_weight(
        env: Env,
        caller: Address,
        pool_id: u32,
        weight: u32,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        if pool_id == pool::STAKING_POOL_ID {
            return Err(ContractError::InvalidParams);
        }
        let mut record = pool::get(&env, pool_id).ok_or(ContractError::PoolNotFound)?;
        Self::validate_pool_params(weight, record.multiplier_bps)?;

        // Settle every pool at the old weights before the split changes.
        Self::sync_all_pools(&env)?;

        record = pool::get(&env, pool_id).ok_or(ContractError::PoolNotFound)?;
        record.weight = weight;
        pool::store(&env, pool_id, &record);
        Self::rebalance_staking_pool(&env)?;

        events::publish_pool_updated(&env, pool_id, weight, record.multiplier_bps);

        Ok(())
    }

    /// Update a pool's emission multiplier (basis points).
    ///
    /// Only the target pool needs syncing: the multiplier does not affect
    /// the cross-pool weight split, so elapsed emission is settled at the
    /// old multiplier and future emission uses the new one.
    pub fn set_pool_multiplier(
        env: Env,
        caller: Address,
        pool_id: u32,
        multiplier_bps: u32,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        if multiplier_bps == 0 {
            return Err(ContractError::InvalidParams);
        }
        let mut record = pool::get(&env, pool_id).ok_or(ContractError::PoolNotFound)?;
        Self::sync_pool_record(&env, &mut record)?;
        record.multiplier_bps = multiplier_bps;
        pool::store(&env, pool_id, &record);

        events::publish_pool_updated(&env, pool_id, record.weight, multiplier_bps);

        Ok(())
    }

    // ── Protocol parameter administration ───────────────────────────────────

    /// Update the per-height emission rate.
    ///
    /// Every pool is flushed at the old rate first, so no staker gains or
    /// loses retroactively.
    pub fn set_emission_rate(
        env: Env,
        caller: Address,
        rate: i128,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        if rate < 0 {
            return Err(ContractError::InvalidParams);
        }

        Self::sync_all_pools(&env)?;
        env.storage().instance().set(&EMISSION_RATE, &rate);

        events::publish_emission_rate_set(&env, rate);

        Ok(())
    }

    /// Update the staking-pool allocation factor (basis points, at most
    /// `BPS`), then rederive pool 0's weight.
    pub fn set_allocation_factor(
        env: Env,
        caller: Address,
        factor_bps: u32,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        if factor_bps > math::BPS as u32 {
            return Err(ContractError::InvalidParams);
        }

        Self::sync_all_pools(&env)?;
        env.storage().instance().set(&ALLOC_FACTOR, &factor_bps);
        Self::rebalance_staking_pool(&env)?;

        events::publish_allocation_factor_set(&env, factor_bps);

        Ok(())
    }

    /// Update the protocol-tax recipient.
    pub fn set_treasury(env: Env, caller: Address, treasury: Address) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        env.storage().instance().set(&TREASURY, &treasury);

        events::publish_treasury_set(&env, treasury);

        Ok(())
    }

    /// Set or clear the personal-multiplier provider. `None` restores the
    /// default ratio of 1.0 for every account.
    pub fn set_multiplier_provider(
        env: Env,
        caller: Address,
        provider: Option<Address>,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        match &provider {
            Some(p) => env.storage().instance().set(&MULT_PROVIDER, p),
            None => env.storage().instance().remove(&MULT_PROVIDER),
        }

        events::publish_multiplier_provider_set(&env, provider);

        Ok(())
    }

    /// Transfer out a stray token balance that does not belong to any pool.
    ///
    /// Assets tracked by a pool can never be recovered; recorded stakes must
    /// stay backed by the held balance.
    pub fn recover_asset(
        env: Env,
        caller: Address,
        asset: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        if amount <= 0 {
            return Err(ContractError::ZeroAmount);
        }
        if pool::is_tracked_asset(&env, &asset) {
            return Err(ContractError::InvalidParams);
        }

        token::Client::new(&env, &asset).transfer(
            &env.current_contract_address(),
            &to,
            &amount,
        );

        events::publish_asset_recovered(&env, asset, to, amount);

        Ok(())
    }

    // ── Accrual ─────────────────────────────────────────────────────────────

    /// Bring one pool's accumulator up to the current height. Permissionless
    /// and idempotent per height: a second call at the same height is a
    /// no-op.
    pub fn sync_pool(env: Env, pool_id: u32) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        let mut record = pool::get(&env, pool_id).ok_or(ContractError::PoolNotFound)?;
        Self::sync_pool_record(&env, &mut record)?;
        pool::store(&env, pool_id, &record);
        Ok(())
    }

    /// Sync every pool. O(pools), never O(stakers).
    pub fn sync_all(env: Env) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        Self::sync_all_pools(&env)
    }

    // ── Staking ─────────────────────────────────────────────────────────────

    /// Deposit `amount` of a member pool's asset. `amount` may be zero for a
    /// harvest-only call. The reserved pools reject this entry point; use
    /// `enter_staking` / `deposit_native` instead.
    pub fn deposit(
        env: Env,
        from: Address,
        pool_id: u32,
        amount: i128,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        from.require_auth();
        Self::require_member_pool(pool_id)?;
        if amount < 0 {
            return Err(ContractError::InvalidParams);
        }
        with_guard(&env, |env| Self::apply_deposit(env, pool_id, &from, amount))
    }

    /// Withdraw `amount` of a member pool's asset. Pending rewards settle
    /// first; withdrawing more than the recorded stake fails with
    /// `InsufficientBalance` and changes nothing.
    pub fn withdraw(
        env: Env,
        from: Address,
        pool_id: u32,
        amount: i128,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        from.require_auth();
        Self::require_member_pool(pool_id)?;
        if amount < 0 {
            return Err(ContractError::InvalidParams);
        }
        with_guard(&env, |env| Self::apply_withdraw(env, pool_id, &from, amount))
    }

    /// Stake the reward asset itself into pool 0.
    pub fn enter_staking(env: Env, from: Address, amount: i128) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        from.require_auth();
        if amount <= 0 {
            return Err(ContractError::ZeroAmount);
        }
        with_guard(&env, |env| {
            Self::apply_deposit(env, pool::STAKING_POOL_ID, &from, amount)
        })
    }

    /// Unstake the reward asset from pool 0.
    pub fn leave_staking(env: Env, from: Address, amount: i128) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        from.require_auth();
        if amount <= 0 {
            return Err(ContractError::ZeroAmount);
        }
        with_guard(&env, |env| {
            Self::apply_withdraw(env, pool::STAKING_POOL_ID, &from, amount)
        })
    }

    /// Deposit native value into the reserved native pool. The wrapper
    /// converts the caller's native balance into the wrapped token, which
    /// then flows through the ordinary deposit transition.
    pub fn deposit_native(env: Env, from: Address, amount: i128) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        from.require_auth();
        if amount <= 0 {
            return Err(ContractError::ZeroAmount);
        }
        let wrapper: Address = env
            .storage()
            .instance()
            .get(&WRAPPER)
            .ok_or(ContractError::PoolNotFound)?;
        with_guard(&env, |env| {
            NativeWrapperClient::new(env, &wrapper).wrap(&from, &amount);
            Self::apply_deposit(env, pool::NATIVE_POOL_ID, &from, amount)
        })
    }

    /// Withdraw from the reserved native pool and unwrap back to native
    /// value. If the unwrap or the native transfer is refused, the whole
    /// operation reverts.
    pub fn withdraw_native(env: Env, from: Address, amount: i128) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        from.require_auth();
        if amount <= 0 {
            return Err(ContractError::ZeroAmount);
        }
        let wrapper: Address = env
            .storage()
            .instance()
            .get(&WRAPPER)
            .ok_or(ContractError::PoolNotFound)?;
        with_guard(&env, |env| {
            Self::apply_withdraw(env, pool::NATIVE_POOL_ID, &from, amount)?;
            NativeWrapperClient::new(env, &wrapper).unwrap(&from, &amount);
            Ok(())
        })
    }

    /// Settle and issue pending rewards for one pool without moving
    /// principal. Works for every pool, including the reserved ones.
    pub fn harvest(env: Env, from: Address, pool_id: u32) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        from.require_auth();
        with_guard(&env, |env| Self::apply_deposit(env, pool_id, &from, 0))
    }

    /// Harvest every pool where the caller has stake.
    pub fn harvest_all(env: Env, from: Address) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        from.require_auth();
        with_guard(&env, |env| {
            for pool_id in 0..pool::pool_count(env) {
                if pool::position(env, pool_id, &from).staked > 0 {
                    Self::apply_deposit(env, pool_id, &from, 0)?;
                }
            }
            Ok(())
        })
    }

    /// Last-resort exit: return the full staked principal, forfeit all
    /// pending rewards.
    ///
    /// Deliberately skips the sync, settlement, issuance, and multiplier
    /// steps so it stays usable even when those collaborators are failing.
    /// For the native pool this returns the wrapped representation; the
    /// wrapper itself may be the failing component.
    pub fn emergency_withdraw(env: Env, from: Address, pool_id: u32) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        from.require_auth();
        with_guard(&env, |env| {
            let record = pool::get(env, pool_id).ok_or(ContractError::PoolNotFound)?;
            let mut position = pool::position(env, pool_id, &from);
            let amount = position.staked;
            position.staked = 0;
            position.reward_offset = 0;
            pool::store_position(env, pool_id, &from, &position);

            if amount > 0 {
                token::Client::new(env, &record.asset).transfer(
                    &env.current_contract_address(),
                    &from,
                    &amount,
                );
            }

            events::publish_emergency_withdrawn(env, pool_id, from.clone(), amount);

            Ok(())
        })
    }

    // ── View functions ──────────────────────────────────────────────────────

    /// Rewards the account could harvest from `pool_id` right now, scaled by
    /// its personal multiplier. A pure projection: computes what the
    /// accumulator would become if synced at this height without mutating
    /// anything.
    pub fn pending_reward(
        env: Env,
        pool_id: u32,
        account: Address,
    ) -> Result<i128, ContractError> {
        let record = pool::get(&env, pool_id).ok_or(ContractError::PoolNotFound)?;
        let position = pool::position(&env, pool_id, &account);
        if position.staked <= 0 {
            return Ok(0);
        }
        let multiplier = Self::personal_multiplier(&env, &account);
        Ok(Self::projected_pending(&env, &record, &position, multiplier))
    }

    /// Full state of one pool, including its live staked supply.
    pub fn get_pool(env: Env, pool_id: u32) -> Result<PoolView, ContractError> {
        let record = pool::get(&env, pool_id).ok_or(ContractError::PoolNotFound)?;
        Ok(Self::pool_view(&env, pool_id, &record))
    }

    /// Raw position record for (pool, account). Zeroed if never touched.
    pub fn get_position(
        env: Env,
        pool_id: u32,
        account: Address,
    ) -> Result<Position, ContractError> {
        if pool::get(&env, pool_id).is_none() {
            return Err(ContractError::PoolNotFound);
        }
        Ok(pool::position(&env, pool_id, &account))
    }

    /// Protocol-level snapshot.
    pub fn protocol_summary(env: Env) -> Result<ProtocolSummary, ContractError> {
        Self::require_initialized(&env)?;
        Ok(ProtocolSummary {
            pool_count: pool::pool_count(&env),
            total_weight: Self::total_weight(&env),
            emission_rate: Self::emission_rate(&env),
            allocation_factor_bps: Self::allocation_factor(&env),
        })
    }

    /// Every pool with its live supply and accumulator state.
    pub fn list_pools(env: Env) -> Vec<PoolView> {
        let mut out = Vec::new(&env);
        for pool_id in 0..pool::pool_count(&env) {
            if let Some(record) = pool::get(&env, pool_id) {
                out.push_back(Self::pool_view(&env, pool_id, &record));
            }
        }
        out
    }

    /// Cross-pool summary for one account: totals plus a listing restricted
    /// to pools with nonzero stake.
    pub fn account_summary(env: Env, account: Address) -> AccountSummary {
        let multiplier = Self::personal_multiplier(&env, &account);
        let mut positions = Vec::new(&env);
        let mut total_staked: i128 = 0;
        let mut total_pending: i128 = 0;

        for pool_id in 0..pool::pool_count(&env) {
            let position = pool::position(&env, pool_id, &account);
            if position.staked <= 0 {
                continue;
            }
            let record = match pool::get(&env, pool_id) {
                Some(r) => r,
                None => continue,
            };
            let pending = Self::projected_pending(&env, &record, &position, multiplier);
            total_staked = total_staked.saturating_add(position.staked);
            total_pending = total_pending.saturating_add(pending);
            positions.push_back(PositionView {
                pool_id,
                staked: position.staked,
                pending_reward: pending,
            });
        }

        AccountSummary {
            total_staked,
            total_pending,
            multiplier,
            positions,
        }
    }

    pub fn get_pool_count(env: Env) -> u32 {
        pool::pool_count(&env)
    }

    pub fn get_total_weight(env: Env) -> u32 {
        Self::total_weight(&env)
    }

    pub fn get_emission_rate(env: Env) -> i128 {
        Self::emission_rate(&env)
    }

    pub fn get_allocation_factor(env: Env) -> u32 {
        Self::allocation_factor(&env)
    }

    pub fn get_treasury(env: Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&TREASURY)
            .ok_or(ContractError::NotInitialized)
    }

    pub fn get_registry(env: Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&REGISTRY)
            .ok_or(ContractError::NotInitialized)
    }

    pub fn get_multiplier_provider(env: Env) -> Option<Address> {
        env.storage().instance().get(&MULT_PROVIDER)
    }

    pub fn is_initialized(env: Env) -> bool {
        env.storage().instance().has(&INITIALIZED)
    }

    // ── Internal helpers ────────────────────────────────────────────────────

    /// Guard: revert if the contract is not yet initialized.
    fn require_initialized(env: &Env) -> Result<(), ContractError> {
        if !env.storage().instance().has(&INITIALIZED) {
            return Err(ContractError::NotInitialized);
        }
        Ok(())
    }

    /// Guard: revert unless the registry recognizes `caller` as an admin.
    fn require_admin(env: &Env, caller: &Address) -> Result<(), ContractError> {
        let registry: Address = env
            .storage()
            .instance()
            .get(&REGISTRY)
            .ok_or(ContractError::NotInitialized)?;
        if !RoleRegistryClient::new(env, &registry).is_admin(caller) {
            return Err(ContractError::Unauthorized);
        }
        Ok(())
    }

    /// Guard: the generic entry points cover member pools only; the two
    /// reserved identities route through their asset-specific entry points.
    fn require_member_pool(pool_id: u32) -> Result<(), ContractError> {
        if pool_id == pool::STAKING_POOL_ID || pool_id == pool::NATIVE_POOL_ID {
            return Err(ContractError::InvalidParams);
        }
        Ok(())
    }

    fn validate_pool_params(weight: u32, multiplier_bps: u32) -> Result<(), ContractError> {
        if weight == 0 || weight > pool::MAX_POOL_WEIGHT || multiplier_bps == 0 {
            return Err(ContractError::InvalidParams);
        }
        Ok(())
    }

    fn emission_rate(env: &Env) -> i128 {
        env.storage().instance().get(&EMISSION_RATE).unwrap_or(0)
    }

    fn total_weight(env: &Env) -> u32 {
        env.storage().instance().get(&TOTAL_WEIGHT).unwrap_or(0)
    }

    fn allocation_factor(env: &Env) -> u32 {
        env.storage().instance().get(&ALLOC_FACTOR).unwrap_or(0)
    }

    /// The pool's staked supply is the asset balance the farm holds. Assets
    /// are unique per pool, so no two pools ever read the same balance.
    fn pool_supply(env: &Env, record: &Pool) -> i128 {
        token::Client::new(env, &record.asset).balance(&env.current_contract_address())
    }

    /// The account's WAD-scaled harvest ratio: 1.0 when no provider is
    /// configured or the provider reports no active multiplier.
    fn personal_multiplier(env: &Env, account: &Address) -> i128 {
        let provider: Option<Address> = env.storage().instance().get(&MULT_PROVIDER);
        match provider {
            Some(p) => {
                let ratio = MultiplierProviderClient::new(env, &p).get_multiplier(account);
                if ratio <= 0 {
                    math::WAD
                } else {
                    ratio
                }
            }
            None => math::WAD,
        }
    }

    /// Mint reward units. Requires the farm to be the reward token's admin;
    /// the token ledger enforces that precondition, not the farm.
    fn issue_reward(env: &Env, to: &Address, amount: i128) -> Result<(), ContractError> {
        let reward_token: Address = env
            .storage()
            .instance()
            .get(&REWARD_TOKEN)
            .ok_or(ContractError::NotInitialized)?;
        token::StellarAssetClient::new(env, &reward_token).mint(to, &amount);
        Ok(())
    }

    /// Accrue one pool in place up to the current height, minting the
    /// treasury tax for the elapsed emission. The caller persists the
    /// record. Idempotent per height.
    fn sync_pool_record(env: &Env, record: &mut Pool) -> Result<(), ContractError> {
        let height = env.ledger().sequence();
        if height <= record.last_sync_height {
            return Ok(());
        }
        let elapsed = height - record.last_sync_height;
        let supply = Self::pool_supply(env, record);
        let accrued = accrual::accrue(
            env,
            Self::emission_rate(env),
            elapsed,
            record.weight,
            Self::total_weight(env),
            record.multiplier_bps,
            supply,
        );
        if accrued.treasury_cut > 0 {
            let treasury: Address = env
                .storage()
                .instance()
                .get(&TREASURY)
                .ok_or(ContractError::NotInitialized)?;
            Self::issue_reward(env, &treasury, accrued.treasury_cut)?;
        }
        record.acc_reward_per_share = record
            .acc_reward_per_share
            .saturating_add(accrued.per_share_delta);
        record.last_sync_height = height;
        Ok(())
    }

    fn sync_all_pools(env: &Env) -> Result<(), ContractError> {
        for pool_id in 0..pool::pool_count(env) {
            if let Some(mut record) = pool::get(env, pool_id) {
                Self::sync_pool_record(env, &mut record)?;
                pool::store(env, pool_id, &record);
            }
        }
        Ok(())
    }

    /// What the accumulator would be if the pool were synced right now.
    /// Read-only counterpart of `sync_pool_record`.
    fn projected_acc_per_share(env: &Env, record: &Pool) -> i128 {
        let height = env.ledger().sequence();
        if height <= record.last_sync_height {
            return record.acc_reward_per_share;
        }
        let accrued = accrual::accrue(
            env,
            Self::emission_rate(env),
            height - record.last_sync_height,
            record.weight,
            Self::total_weight(env),
            record.multiplier_bps,
            Self::pool_supply(env, record),
        );
        record
            .acc_reward_per_share
            .saturating_add(accrued.per_share_delta)
    }

    /// Build the public view of a pool: its stored record plus its live
    /// staked supply.
    fn pool_view(env: &Env, pool_id: u32, record: &Pool) -> PoolView {
        PoolView {
            pool_id,
            asset: record.asset.clone(),
            weight: record.weight,
            multiplier_bps: record.multiplier_bps,
            supply: Self::pool_supply(env, record),
            acc_reward_per_share: record.acc_reward_per_share,
            last_sync_height: record.last_sync_height,
        }
    }

    fn projected_pending(
        env: &Env,
        record: &Pool,
        position: &Position,
        multiplier: i128,
    ) -> i128 {
        let acc = Self::projected_acc_per_share(env, record);
        let raw = accrual::pending(env, position.staked, acc, position.reward_offset);
        math::wad_mul(env, raw, multiplier)
    }

    /// Settle the position's pending rewards against the synced pool:
    /// issue the multiplier-scaled amount and notify. The caller recomputes
    /// the offset afterwards.
    fn settle_pending(
        env: &Env,
        pool_id: u32,
        record: &Pool,
        account: &Address,
        position: &Position,
    ) -> Result<(), ContractError> {
        if position.staked <= 0 {
            return Ok(());
        }
        let raw = accrual::pending(
            env,
            position.staked,
            record.acc_reward_per_share,
            position.reward_offset,
        );
        if raw <= 0 {
            return Ok(());
        }
        let payout = math::wad_mul(env, raw, Self::personal_multiplier(env, account));
        if payout <= 0 {
            return Ok(());
        }
        Self::issue_reward(env, account, payout)?;
        events::publish_harvested(env, pool_id, account.clone(), payout);
        Ok(())
    }

    /// The shared settle-then-mutate transition behind every deposit-shaped
    /// call site. Pending is settled against the *pre-increase* stake so new
    /// principal never earns retroactively; the offset is recomputed last.
    fn apply_deposit(
        env: &Env,
        pool_id: u32,
        from: &Address,
        amount: i128,
    ) -> Result<(), ContractError> {
        let mut record = pool::get(env, pool_id).ok_or(ContractError::PoolNotFound)?;
        Self::sync_pool_record(env, &mut record)?;

        let mut position = pool::position(env, pool_id, from);
        Self::settle_pending(env, pool_id, &record, from, &position)?;

        if amount > 0 {
            token::Client::new(env, &record.asset).transfer(
                from,
                &env.current_contract_address(),
                &amount,
            );
            position.staked = position.staked.saturating_add(amount);
            events::publish_deposited(env, pool_id, from.clone(), amount);
        }

        position.reward_offset =
            accrual::offset_for(env, position.staked, record.acc_reward_per_share);
        pool::store(env, pool_id, &record);
        pool::store_position(env, pool_id, from, &position);

        Ok(())
    }

    /// Withdraw-shaped counterpart of `apply_deposit`. The balance check
    /// runs before anything mutates, so an over-withdraw leaves no trace.
    fn apply_withdraw(
        env: &Env,
        pool_id: u32,
        from: &Address,
        amount: i128,
    ) -> Result<(), ContractError> {
        let mut record = pool::get(env, pool_id).ok_or(ContractError::PoolNotFound)?;
        let mut position = pool::position(env, pool_id, from);
        if amount > position.staked {
            return Err(ContractError::InsufficientBalance);
        }

        Self::sync_pool_record(env, &mut record)?;
        Self::settle_pending(env, pool_id, &record, from, &position)?;

        if amount > 0 {
            position.staked -= amount;
            token::Client::new(env, &record.asset).transfer(
                &env.current_contract_address(),
                from,
                &amount,
            );
            events::publish_withdrawn(env, pool_id, from.clone(), amount);
        }

        position.reward_offset =
            accrual::offset_for(env, position.staked, record.acc_reward_per_share);
        pool::store(env, pool_id, &record);
        pool::store_position(env, pool_id, from, &position);

        Ok(())
    }

    /// Rederive pool 0's weight and the protocol total after a structural
    /// change to the member pools or the allocation factor. Pools must
    /// already be synced at the old weights.
    fn rebalance_staking_pool(env: &Env) -> Result<(), ContractError> {
        let outcome = pool::rebalance(env, Self::allocation_factor(env))
            .ok_or(ContractError::NotInitialized)?;
        env.storage()
            .instance()
            .set(&TOTAL_WEIGHT, &outcome.total_weight);
        events::publish_pool_updated(
            env,
            pool::STAKING_POOL_ID,
            outcome.staking_pool.weight,
            outcome.staking_pool.multiplier_bps,
        );
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────



#[cfg(test)]
mod test_pools;
