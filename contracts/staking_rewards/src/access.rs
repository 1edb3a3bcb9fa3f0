use soroban_sdk::{symbol_short, Address, Env, Symbol};

use crate::ContractError;

const OWNER: Symbol = symbol_short!("OWNER");
const PENDING_OWNER: Symbol = symbol_short!("PEND_OWN");

pub fn set_owner(env: &Env, owner: &Address) {
    env.storage().instance().set(&OWNER, owner);
}

pub fn owner(env: &Env) -> Result<Address, ContractError> {
    env.storage()
        .instance()
        .get(&OWNER)
        .ok_or(ContractError::NotInitialized)
}

/// Guard: revert if `caller` is not the stored owner.
///
/// The caller must already have been authenticated via `require_auth()`.
pub fn require_owner(env: &Env, caller: &Address) -> Result<(), ContractError> {
    if *caller != owner(env)? {
        return Err(ContractError::Unauthorized);
    }
    Ok(())
}

pub fn pending_owner(env: &Env) -> Option<Address> {
    env.storage().instance().get(&PENDING_OWNER)
}

// ── Two-step transfer ────────────────────────────────────────────────────────

/// Record `new_owner` as the proposed successor, replacing any earlier
/// proposal.
pub fn propose(env: &Env, caller: &Address, new_owner: &Address) -> Result<(), ContractError> {
    require_owner(env, caller)?;
    env.storage().instance().set(&PENDING_OWNER, new_owner);
    Ok(())
}

/// Complete the transfer. Returns the previous owner.
pub fn accept(env: &Env, new_owner: &Address) -> Result<Address, ContractError> {
    let pending = pending_owner(env).ok_or(ContractError::NoPendingOwner)?;
    if *new_owner != pending {
        return Err(ContractError::Unauthorized);
    }

    let previous = owner(env)?;
    set_owner(env, new_owner);
    env.storage().instance().remove(&PENDING_OWNER);
    Ok(previous)
}

/// Drop the pending proposal. Returns the address that was proposed.
pub fn cancel(env: &Env, caller: &Address) -> Result<Address, ContractError> {
    require_owner(env, caller)?;
    let pending = pending_owner(env).ok_or(ContractError::NoPendingOwner)?;
    env.storage().instance().remove(&PENDING_OWNER);
    Ok(pending)
}
