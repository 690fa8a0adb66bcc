use soroban_sdk::{symbol_short, Env, Symbol};

// ── Storage key ──────────────────────────────────────────────────────────────

const IN_FLIGHT: Symbol = symbol_short!("REENTER");

// ── Re-entrancy guard ────────────────────────────────────────────────────────

/// Marks the start of a guarded transition.
///
/// Returns `false` when a transition is already in flight, i.e. an external
/// callee (token contract, collaborator) has re-invoked a guarded entry point
/// before the first invocation completed. Callers map `false` to their own
/// error code, matching the bool-returning helper convention used elsewhere
/// in this suite.
///
/// The flag lives in temporary storage: it never outlives the ledger entry
/// it was written in, and a reverted transaction discards it along with
/// every other write.
pub fn enter(env: &Env) -> bool {
    let store = env.storage().temporary();
    if store.get::<_, bool>(&IN_FLIGHT).unwrap_or(false) {
        return false;
    }
    store.set(&IN_FLIGHT, &true);
    true
}

/// Clears the in-flight flag at the end of a guarded transition.
pub fn exit(env: &Env) {
    env.storage().temporary().remove(&IN_FLIGHT);
}

// ── Unit tests ──────────────────────────────────────────────────────────────
