use soroban_sdk::{contracterror, panic_with_error, Env, I256};

/// Fixed-point scaling factor (WAD, 10^18).
///
/// All reward-per-share values are multiplied by this constant before storage
/// to preserve sub-unit precision without floating-point arithmetic. Products
/// of two in-range `i128` values are formed in 256-bit space, so no precision
/// is lost before the final truncating division.
pub const WAD: i128 = 1_000_000_000_000_000_000;

/// Basis-point denominator (1 bps = 1/10_000).
pub const BPS: i128 = 10_000;

// ── Errors ──────────────────────────────────────────────────────────────────

/// Arithmetic failures abort the whole transaction; a share computation out
/// of range leaves no partial state worth keeping.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum MathError {
    Overflow = 1,
    DivisionByZero = 2,
}

// ── Fixed-point primitives ──────────────────────────────────────────────────

/// Computes `a * b / denom` with a 256-bit intermediate product.
///
/// The division truncates toward zero. The result must fit back into `i128`;
/// if it does not, the transaction aborts with [`MathError::Overflow`].
pub fn mul_div(env: &Env, a: i128, b: i128, denom: i128) -> i128 {
    if denom == 0 {
        panic_with_error!(env, MathError::DivisionByZero);
    }
    let product = I256::from_i128(env, a).mul(&I256::from_i128(env, b));
    match product.div(&I256::from_i128(env, denom)).to_i128() {
        Some(v) => v,
        None => panic_with_error!(env, MathError::Overflow),
    }
}

/// `a * b / WAD`, truncating.
pub fn wad_mul(env: &Env, a: i128, b: i128) -> i128 {
    mul_div(env, a, b, WAD)
}

/// `a * WAD / b`, truncating.
pub fn wad_div(env: &Env, a: i128, b: i128) -> i128 {
    mul_div(env, a, WAD, b)
}

/// Scales `a` by a basis-point factor: `a * bps / 10_000`, truncating.
pub fn bps_scale(env: &Env, a: i128, bps: u32) -> i128 {
    mul_div(env, a, bps as i128, BPS)
}

// ── Unit tests ──────────────────────────────────────────────────────────────
