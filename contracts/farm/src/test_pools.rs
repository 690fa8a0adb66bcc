extern crate std;

use soroban_sdk::testutils::{Address as _, Ledger as _};
use soroban_sdk::{contract, contractimpl, symbol_short, Address, Env, Symbol};

use common::math::WAD;

use crate::testutils::{add_member_pool, balance, mint, setup, setup_bare};
use crate::{ContractError, FarmContractClient};

fn at_height(env: &Env, height: u32) {
    env.ledger().set_sequence_number(height);
}

// ── Rebalancer invariant ─────────────────────────────────────────────────────

/// `pool[0].weight == floor(sum(weight[1..]) × factor / BPS)` after every
/// structural change.
fn assert_rebalanced(farm: &FarmContractClient, factor_bps: u64) {
    let mut member_weight: u64 = 0;
    for pool_id in 1..farm.get_pool_count() {
        member_weight += farm.get_pool(&pool_id).weight as u64;
    }
    let derived = member_weight * factor_bps / 10_000;
    assert_eq!(farm.get_pool(&0).weight as u64, derived);
    assert_eq!(farm.get_total_weight() as u64, member_weight + derived);
}

#[test]
fn test_rebalancer_after_each_pool_added() {
    let rig = setup(10, 2_500);

    // Native pool only: 100 × 25% = 25.
    assert_eq!(rig.farm.get_pool(&0).weight, 25);
    assert_eq!(rig.farm.get_total_weight(), 125);

    add_member_pool(&rig, 300, 10_000);
    assert_rebalanced(&rig.farm, 2_500);
    assert_eq!(rig.farm.get_pool(&0).weight, 100);

    // 477 total member weight floors: 477 × 2500 / 10000 = 119.
    add_member_pool(&rig, 77, 10_000);
    assert_rebalanced(&rig.farm, 2_500);
    assert_eq!(rig.farm.get_pool(&0).weight, 119);
    assert_eq!(rig.farm.get_total_weight(), 596);
}

#[test]
fn test_rebalancer_after_weight_update() {
    let rig = setup(10, 2_500);
    let (pool_id, _asset) = add_member_pool(&rig, 100, 10_000);

    rig.farm.set_pool_weight(&rig.admin, &pool_id, &200);
    assert_rebalanced(&rig.farm, 2_500);
    assert_eq!(rig.farm.get_pool(&pool_id).weight, 200);
    assert_eq!(rig.farm.get_pool(&0).weight, 75);
    assert_eq!(rig.farm.get_total_weight(), 375);
}

#[test]
fn test_rebalancer_at_full_factor() {
    // factor = BPS: the staking pool mirrors the members' combined weight.
    let rig = setup(10, 10_000);
    assert_eq!(rig.farm.get_pool(&0).weight, 100);
    assert_eq!(rig.farm.get_total_weight(), 200);
}

#[test]
fn test_allocation_factor_change_rebalances() {
    let rig = setup(10, 2_500);
    add_member_pool(&rig, 100, 10_000);
    assert_eq!(rig.farm.get_pool(&0).weight, 50);

    rig.farm.set_allocation_factor(&rig.admin, &5_000);
    assert_rebalanced(&rig.farm, 5_000);
    assert_eq!(rig.farm.get_pool(&0).weight, 100);
    assert_eq!(rig.farm.get_total_weight(), 300);
}

#[test]
fn test_set_allocation_factor_rejects_above_bps() {
    let rig = setup(10, 2_500);

    let result = rig.farm.try_set_allocation_factor(&rig.admin, &10_001);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::InvalidParams),
        _ => unreachable!("Expected InvalidParams error"),
    }
}

// ── Pool administration ──────────────────────────────────────────────────────

#[test]
fn test_set_pool_weight_rejects_staking_pool() {
    let rig = setup(10, 2_500);

    // Pool 0's weight is derived, never set directly.
    let result = rig.farm.try_set_pool_weight(&rig.admin, &0, &500);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::InvalidParams),
        _ => unreachable!("Expected InvalidParams error"),
    }
}

#[test]
fn test_set_pool_weight_missing_pool() {
    let rig = setup(10, 2_500);

    let result = rig.farm.try_set_pool_weight(&rig.admin, &42, &500);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::PoolNotFound),
        _ => unreachable!("Expected PoolNotFound error"),
    }
}

#[test]
fn test_pool_weight_bounds() {
    let rig = setup(10, 2_500);
    let (pool_id, _asset) = add_member_pool(&rig, 100, 10_000);

    for bad in [0u32, 65_536] {
        let result = rig.farm.try_set_pool_weight(&rig.admin, &pool_id, &bad);
        match result {
            Err(Ok(e)) => assert_eq!(e, ContractError::InvalidParams),
            _ => unreachable!("Expected InvalidParams error"),
        }
    }

    // The 16-bit ceiling itself is fine.
    rig.farm.set_pool_weight(&rig.admin, &pool_id, &65_535);
    assert_eq!(rig.farm.get_pool(&pool_id).weight, 65_535);
}

#[test]
fn test_zero_multiplier_rejected() {
    let rig = setup(10, 2_500);
    let (pool_id, _asset) = add_member_pool(&rig, 100, 10_000);

    let result = rig.farm.try_set_pool_multiplier(&rig.admin, &pool_id, &0);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::InvalidParams),
        _ => unreachable!("Expected InvalidParams error"),
    }
}

#[test]
fn test_add_pool_rejects_duplicate_asset() {
    let rig = setup(10, 2_500);
    let (_pool_id, asset) = add_member_pool(&rig, 100, 10_000);

    let result = rig.farm.try_add_pool(&rig.admin, &asset, &50, &10_000);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::InvalidParams),
        _ => unreachable!("Expected InvalidParams error"),
    }

    // The reward asset is already tracked by pool 0.
    let result = rig
        .farm
        .try_add_pool(&rig.admin, &rig.reward_token, &50, &10_000);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::InvalidParams),
        _ => unreachable!("Expected InvalidParams error"),
    }
}

#[test]
fn test_add_pool_requires_native_bootstrap() {
    let rig = setup_bare(10, 2_500);
    let asset = Address::generate(&rig.env);

    // Index 1 is reserved until the native pool claims it.
    let result = rig.farm.try_add_pool(&rig.admin, &asset, &100, &10_000);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::InvalidParams),
        _ => unreachable!("Expected InvalidParams error"),
    }

    rig.farm
        .bootstrap_native_pool(&rig.admin, &rig.wrapper, &rig.wrapped_token, &100, &10_000);
    assert_eq!(rig.farm.add_pool(&rig.admin, &asset, &100, &10_000), 2);
}

#[test]
fn test_bootstrap_native_pool_is_one_time() {
    let rig = setup(10, 2_500);

    let result = rig.farm.try_bootstrap_native_pool(
        &rig.admin,
        &rig.wrapper,
        &rig.wrapped_token,
        &100,
        &10_000,
    );
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::InvalidParams),
        _ => unreachable!("Expected InvalidParams error"),
    }
}

#[test]
fn test_pool_admin_ops_reject_non_admin() {
    let rig = setup(10, 2_500);
    let (pool_id, _asset) = add_member_pool(&rig, 100, 10_000);
    let intruder = Address::generate(&rig.env);

    let result = rig.farm.try_set_pool_weight(&intruder, &pool_id, &500);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::Unauthorized),
        _ => unreachable!("Expected Unauthorized error"),
    }

    let asset = Address::generate(&rig.env);
    let result = rig.farm.try_add_pool(&intruder, &asset, &100, &10_000);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::Unauthorized),
        _ => unreachable!("Expected Unauthorized error"),
    }
}

#[test]
fn test_pool_multiplier_change_applies_prospectively() {
    let rig = setup(10, 2_500);
    at_height(&rig.env, 100);
    let (pool_id, asset) = add_member_pool(&rig, 100, 10_000);

    let staker = Address::generate(&rig.env);
    mint(&rig.env, &asset, &staker, 10_000);
    rig.farm.deposit(&staker, &pool_id, &1_000);

    // 10 heights at 1x: pool share 40.
    at_height(&rig.env, 110);
    rig.farm.set_pool_multiplier(&rig.admin, &pool_id, &20_000);

    // 10 heights at 2x: pool share 80 on top.
    at_height(&rig.env, 120);
    assert_eq!(rig.farm.pending_reward(&pool_id, &staker), 120);
}

#[test]
fn test_weight_change_settles_elapsed_emission_first() {
    let rig = setup(10, 2_500);
    at_height(&rig.env, 100);
    let (pool_id, asset) = add_member_pool(&rig, 100, 10_000);

    let staker = Address::generate(&rig.env);
    mint(&rig.env, &asset, &staker, 10_000);
    rig.farm.deposit(&staker, &pool_id, &1_000);

    // First window at weight 100/250 → 40.
    at_height(&rig.env, 110);
    rig.farm.set_pool_weight(&rig.admin, &pool_id, &300);

    // Second window at weight 300 of total 500 (members 400, staking 100):
    // 100 × 300 / 500 = 60.
    at_height(&rig.env, 120);
    assert_eq!(rig.farm.pending_reward(&pool_id, &staker), 100);
}

// ── Treasury & recovery ──────────────────────────────────────────────────────

#[test]
fn test_set_treasury_redirects_tax() {
    let rig = setup(10, 2_500);
    at_height(&rig.env, 100);
    let (pool_id, asset) = add_member_pool(&rig, 100, 10_000);

    let staker = Address::generate(&rig.env);
    mint(&rig.env, &asset, &staker, 10_000);
    rig.farm.deposit(&staker, &pool_id, &1_000);

    let vault = Address::generate(&rig.env);
    rig.farm.set_treasury(&rig.admin, &vault);
    assert_eq!(rig.farm.get_treasury(), vault);

    at_height(&rig.env, 110);
    rig.farm.sync_pool(&pool_id);
    assert_eq!(balance(&rig.env, &rig.reward_token, &vault), 4);
    assert_eq!(balance(&rig.env, &rig.reward_token, &rig.treasury), 0);
}

#[test]
fn test_recover_stray_asset() {
    let rig = setup(10, 2_500);
    let stray = rig
        .env
        .register_stellar_asset_contract_v2(Address::generate(&rig.env))
        .address();
    mint(&rig.env, &stray, &rig.farm_id, 5_000);

    let rescue = Address::generate(&rig.env);
    rig.farm.recover_asset(&rig.admin, &stray, &rescue, &5_000);
    assert_eq!(balance(&rig.env, &stray, &rescue), 5_000);
}

#[test]
fn test_recover_rejects_tracked_asset() {
    let rig = setup(10, 2_500);
    let (_pool_id, asset) = add_member_pool(&rig, 100, 10_000);
    let rescue = Address::generate(&rig.env);

    for tracked in [asset, rig.wrapped_token.clone(), rig.reward_token.clone()] {
        let result = rig.farm.try_recover_asset(&rig.admin, &tracked, &rescue, &1);
        match result {
            Err(Ok(e)) => assert_eq!(e, ContractError::InvalidParams),
            _ => unreachable!("Expected InvalidParams error"),
        }
    }
}

#[test]
fn test_recover_rejects_zero_amount() {
    let rig = setup(10, 2_500);
    let stray = Address::generate(&rig.env);
    let rescue = Address::generate(&rig.env);

    let result = rig.farm.try_recover_asset(&rig.admin, &stray, &rescue, &0);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::ZeroAmount),
        _ => unreachable!("Expected ZeroAmount error"),
    }
}

// ── Views ────────────────────────────────────────────────────────────────────

#[test]
fn test_protocol_summary() {
    let rig = setup(10, 2_500);
    add_member_pool(&rig, 100, 10_000);

    let summary = rig.farm.protocol_summary();
    assert_eq!(summary.pool_count, 3);
    assert_eq!(summary.total_weight, 250);
    assert_eq!(summary.emission_rate, 10);
    assert_eq!(summary.allocation_factor_bps, 2_500);
}

#[test]
fn test_list_pools() {
    let rig = setup(10, 2_500);
    let (pool_id, asset) = add_member_pool(&rig, 100, 10_000);

    let pools = rig.farm.list_pools();
    assert_eq!(pools.len(), 3);

    let staking = pools.get(0).unwrap();
    assert_eq!(staking.asset, rig.reward_token);
    assert_eq!(staking.weight, 50);

    let native = pools.get(1).unwrap();
    assert_eq!(native.asset, rig.wrapped_token);

    let member = pools.get(pool_id).unwrap();
    assert_eq!(member.asset, asset);
    assert_eq!(member.supply, 0);
    assert_eq!(member.multiplier_bps, 10_000);
}

#[test]
fn test_account_summary_lists_only_staked_pools() {
    let rig = setup(10, 2_500);
    at_height(&rig.env, 100);
    let (pool_a, asset_a) = add_member_pool(&rig, 100, 10_000);
    let (_pool_b, _asset_b) = add_member_pool(&rig, 100, 10_000);

    let staker = Address::generate(&rig.env);
    mint(&rig.env, &asset_a, &staker, 10_000);
    rig.farm.deposit(&staker, &pool_a, &1_000);

    at_height(&rig.env, 110);
    let summary = rig.farm.account_summary(&staker);
    assert_eq!(summary.total_staked, 1_000);
    assert_eq!(summary.multiplier, WAD);
    assert_eq!(summary.positions.len(), 1);

    let position = summary.positions.get(0).unwrap();
    assert_eq!(position.pool_id, pool_a);
    assert_eq!(position.staked, 1_000);
    assert_eq!(position.pending_reward, summary.total_pending);
    assert_eq!(
        position.pending_reward,
        rig.farm.pending_reward(&pool_a, &staker)
    );
}

// ── Re-entrancy ──────────────────────────────────────────────────────────────

const TARGET: Symbol = symbol_short!("TARGET");
const TARGET_ID: Symbol = symbol_short!("TARGET_ID");
const REENTERED: Symbol = symbol_short!("REENTERED");

/// Token double whose `transfer` re-invokes the farm, recording whether the
/// nested call was let through.
#[contract]
pub struct ReenteringToken;

#[contractimpl]
impl ReenteringToken {
    pub fn init(env: Env, farm: Address, pool_id: u32) {
        env.storage().instance().set(&TARGET, &farm);
        env.storage().instance().set(&TARGET_ID, &pool_id);
    }

    pub fn transfer(env: Env, from: Address, _to: Address, _amount: i128) {
        let farm: Address = env.storage().instance().get(&TARGET).unwrap();
        let pool_id: u32 = env.storage().instance().get(&TARGET_ID).unwrap();
        let nested = FarmContractClient::new(&env, &farm).try_deposit(&from, &pool_id, &0);
        env.storage().instance().set(&REENTERED, &nested.is_ok());
    }

    pub fn balance(_env: Env, _id: Address) -> i128 {
        0
    }

    pub fn reentry_allowed(env: Env) -> bool {
        env.storage().instance().get(&REENTERED).unwrap_or(false)
    }
}

#[test]
fn test_reentrant_deposit_is_rejected() {
    let rig = setup(10, 2_500);
    let hostile = rig.env.register(ReenteringToken, ());

    let pool_id = rig.farm.add_pool(&rig.admin, &hostile, &100, &10_000);
    ReenteringTokenClient::new(&rig.env, &hostile).init(&rig.farm_id, &pool_id);

    let staker = Address::generate(&rig.env);
    rig.farm.deposit(&staker, &pool_id, &5);

    // The outer deposit completed; the nested one was turned away.
    assert_eq!(rig.farm.get_position(&pool_id, &staker).staked, 5);
    assert!(!ReenteringTokenClient::new(&rig.env, &hostile).reentry_allowed());
}
