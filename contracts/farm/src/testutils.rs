//! Test doubles for the farm's external collaborators and a reusable test
//! rig. Compiled only for tests and consumers of the `testutils` feature
//! (the property suite and the fuzz targets).

use soroban_sdk::{
    contract, contractimpl, symbol_short, testutils::Address as _, token, token::StellarAssetClient,
    Address, Env, Symbol,
};

use crate::interfaces::{MultiplierProvider, NativeWrapper, RoleRegistry};
use crate::{FarmContract, FarmContractClient};

// ── Mock role registry ──────────────────────────────────────────────────────

const ADMIN: Symbol = symbol_short!("ADMIN");

/// Registry double: one configurable admin account that doubles as the only
/// recognized issuer.
#[contract]
pub struct MockRegistry;

#[contractimpl]
impl MockRegistry {
    pub fn set_admin(env: Env, admin: Address) {
        env.storage().instance().set(&ADMIN, &admin);
    }
}

#[contractimpl]
impl RoleRegistry for MockRegistry {
    fn is_admin(env: Env, account: Address) -> bool {
        env.storage().instance().get::<_, Address>(&ADMIN) == Some(account)
    }

    fn is_issuer(env: Env, account: Address) -> bool {
        env.storage().instance().get::<_, Address>(&ADMIN) == Some(account)
    }
}

// ── Mock multiplier provider ────────────────────────────────────────────────

const RATIO: Symbol = symbol_short!("RATIO");

/// Multiplier double: per-account WAD ratios, zero (= no active multiplier)
/// for everyone else.
#[contract]
pub struct MockMultiplier;

#[contractimpl]
impl MockMultiplier {
    pub fn set_ratio(env: Env, account: Address, ratio: i128) {
        env.storage().instance().set(&(RATIO, account), &ratio);
    }
}

#[contractimpl]
impl MultiplierProvider for MockMultiplier {
    fn get_multiplier(env: Env, account: Address) -> i128 {
        env.storage().instance().get(&(RATIO, account)).unwrap_or(0)
    }
}

// ── Mock native wrapper ─────────────────────────────────────────────────────

const NATIVE: Symbol = symbol_short!("NATIVE");
const WRAPPED: Symbol = symbol_short!("WRAPPED");

/// Wrapper double backed by two SAC tokens: `wrap` escrows native tokens in
/// the wrapper and mints the wrapped representation; `unwrap` burns and
/// releases. The wrapper must be the wrapped token's admin.
#[contract]
pub struct MockWrapper;

#[contractimpl]
impl MockWrapper {
    pub fn init(env: Env, native: Address, wrapped: Address) {
        env.storage().instance().set(&NATIVE, &native);
        env.storage().instance().set(&WRAPPED, &wrapped);
    }
}

#[contractimpl]
impl NativeWrapper for MockWrapper {
    fn wrap(env: Env, from: Address, amount: i128) {
        let native: Address = env.storage().instance().get(&NATIVE).unwrap();
        let wrapped: Address = env.storage().instance().get(&WRAPPED).unwrap();
        token::Client::new(&env, &native).transfer(
            &from,
            &env.current_contract_address(),
            &amount,
        );
        StellarAssetClient::new(&env, &wrapped).mint(&from, &amount);
    }

    fn unwrap(env: Env, from: Address, amount: i128) {
        let native: Address = env.storage().instance().get(&NATIVE).unwrap();
        let wrapped: Address = env.storage().instance().get(&WRAPPED).unwrap();
        token::Client::new(&env, &wrapped).burn(&from, &amount);
        token::Client::new(&env, &native).transfer(
            &env.current_contract_address(),
            &from,
            &amount,
        );
    }
}

// ── Test rig ────────────────────────────────────────────────────────────────

/// A fully provisioned farm: registry + reward SAC (farm holds the issuer
/// role) + native/wrapped SAC pair behind a mock wrapper.
pub struct Rig {
    pub env: Env,
    pub farm: FarmContractClient<'static>,
    pub farm_id: Address,
    pub admin: Address,
    pub treasury: Address,
    pub registry: Address,
    pub reward_token: Address,
    pub native_token: Address,
    pub wrapped_token: Address,
    pub wrapper: Address,
}

/// Provision everything but do not create the native pool, leaving the
/// registry at cardinality 1 for bootstrap-ordering tests.
pub fn setup_bare(emission_rate: i128, factor_bps: u32) -> Rig {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let treasury = Address::generate(&env);

    let registry = env.register(MockRegistry, ());
    MockRegistryClient::new(&env, &registry).set_admin(&admin);

    let reward_token = env
        .register_stellar_asset_contract_v2(Address::generate(&env))
        .address();
    let native_token = env
        .register_stellar_asset_contract_v2(Address::generate(&env))
        .address();
    let wrapped_token = env
        .register_stellar_asset_contract_v2(Address::generate(&env))
        .address();

    let wrapper = env.register(MockWrapper, ());
    MockWrapperClient::new(&env, &wrapper).init(&native_token, &wrapped_token);
    StellarAssetClient::new(&env, &wrapped_token).set_admin(&wrapper);

    let farm_id = env.register(FarmContract, ());
    let farm = FarmContractClient::new(&env, &farm_id);

    // Hand the issuer role on the reward token to the farm.
    StellarAssetClient::new(&env, &reward_token).set_admin(&farm_id);

    farm.initialize(
        &admin,
        &registry,
        &reward_token,
        &treasury,
        &emission_rate,
        &factor_bps,
    );

    Rig {
        env,
        farm,
        farm_id,
        admin,
        treasury,
        registry,
        reward_token,
        native_token,
        wrapped_token,
        wrapper,
    }
}

/// Standard rig: native pool bootstrapped at weight 100, 1x multiplier.
pub fn setup(emission_rate: i128, factor_bps: u32) -> Rig {
    let rig = setup_bare(emission_rate, factor_bps);
    rig.farm
        .bootstrap_native_pool(&rig.admin, &rig.wrapper, &rig.wrapped_token, &100, &10_000);
    rig
}

/// Register a fresh SAC and append a member pool for it.
pub fn add_member_pool(rig: &Rig, weight: u32, multiplier_bps: u32) -> (u32, Address) {
    let asset = rig
        .env
        .register_stellar_asset_contract_v2(Address::generate(&rig.env))
        .address();
    let pool_id = rig
        .farm
        .add_pool(&rig.admin, &asset, &weight, &multiplier_bps);
    (pool_id, asset)
}

/// Mint `amount` of any SAC to `to`.
pub fn mint(env: &Env, token: &Address, to: &Address, amount: i128) {
    StellarAssetClient::new(env, token).mint(to, &amount);
}

/// Balance shorthand.
pub fn balance(env: &Env, token: &Address, of: &Address) -> i128 {
    token::Client::new(env, token).balance(of)
}
