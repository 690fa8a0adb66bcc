//! Cross-contract collaborator interfaces.
//!
//! The engine consumes each collaborator through a generated client and
//! never depends on a concrete implementation. Pool assets move through the
//! standard `soroban_sdk::token::Client`, and reward issuance goes through
//! `token::StellarAssetClient::mint`; the farm must hold the token's admin
//! role for minting to succeed, which the token ledger enforces, not the
//! farm.

use soroban_sdk::{contractclient, Address, Env};

/// Role-based authorization registry consulted for administrative calls.
///
/// `is_issuer` belongs to the same registry surface but is consumed by the
/// reward-token ledger when the farm mints; the farm itself only queries
/// `is_admin`.
#[contractclient(name = "RoleRegistryClient")]
pub trait RoleRegistry {
    fn is_admin(env: Env, account: Address) -> bool;

    fn is_issuer(env: Env, account: Address) -> bool;
}

/// Optional per-account harvest multiplier source.
///
/// Returns a WAD-scaled ratio. A ratio of zero means the account holds no
/// active multiplier; the engine substitutes 1.0 for that case and for an
/// unset provider reference, so call sites never branch on configuration.
#[contractclient(name = "MultiplierProviderClient")]
pub trait MultiplierProvider {
    fn get_multiplier(env: Env, account: Address) -> i128;
}

/// Adapter between native value and the fungible representation staked in
/// the reserved native pool.
///
/// `wrap` converts `amount` of `from`'s native balance into wrapped tokens
/// credited to `from`; `unwrap` is the inverse. Both fail the enclosing
/// transition if the underlying transfer is refused.
#[contractclient(name = "NativeWrapperClient")]
pub trait NativeWrapper {
    fn wrap(env: Env, from: Address, amount: i128);

    fn unwrap(env: Env, from: Address, amount: i128);
}
