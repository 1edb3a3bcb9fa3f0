use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

use crate::pool::{Participant, Pool};
use crate::ContractError;

// ── Storage key constants ────────────────────────────────────────────────────

const INITIALIZED: Symbol = symbol_short!("INIT");
const CONFIG: Symbol = symbol_short!("CONFIG");
const POOL: Symbol = symbol_short!("POOL");

// Per-participant persistent storage uses tuple keys: (prefix, account)
const PARTICIPANT: Symbol = symbol_short!("PART");

const TTL_THRESHOLD: u32 = 5184000;
const TTL_EXTEND_TO: u32 = 10368000;

/// Token pair fixed at initialisation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Token participants deposit.
    pub stake_token: Address,
    /// Token the pool pays out as reward.
    pub reward_token: Address,
}

fn participant_key(account: &Address) -> (Symbol, Address) {
    (PARTICIPANT, account.clone())
}

fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&INITIALIZED)
}

pub fn require_initialized(env: &Env) -> Result<(), ContractError> {
    if !is_initialized(env) {
        return Err(ContractError::NotInitialized);
    }
    extend_instance_ttl(env);
    Ok(())
}

pub fn mark_initialized(env: &Env) {
    env.storage().instance().set(&INITIALIZED, &true);
    extend_instance_ttl(env);
}

// ── Config ───────────────────────────────────────────────────────────────────

pub fn set_config(env: &Env, config: &Config) {
    env.storage().instance().set(&CONFIG, config);
}

pub fn config(env: &Env) -> Result<Config, ContractError> {
    env.storage()
        .instance()
        .get(&CONFIG)
        .ok_or(ContractError::NotInitialized)
}

// ── Pool ─────────────────────────────────────────────────────────────────────

/// Load the pool singleton; an absent entry reads as the zero pool.
pub fn pool(env: &Env) -> Pool {
    env.storage().instance().get(&POOL).unwrap_or_default()
}

pub fn set_pool(env: &Env, pool: &Pool) {
    env.storage().instance().set(&POOL, pool);
}

// ── Participants ─────────────────────────────────────────────────────────────

/// Load a participant record; accounts that never staked read as all-zero.
pub fn participant(env: &Env, account: &Address) -> Participant {
    let key = participant_key(account);
    let record: Option<Participant> = env.storage().persistent().get(&key);
    match record {
        Some(p) => {
            env.storage()
                .persistent()
                .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
            p
        }
        None => Participant::default(),
    }
}

/// Persist a participant record.
///
/// A record with no stake and nothing owed is removed instead: its
/// checkpoint is overwritten by the next settlement anyway, so it reads the
/// same as an account that never staked.
pub fn set_participant(env: &Env, account: &Address, participant: &Participant) {
    let key = participant_key(account);
    if participant.staked == 0 && participant.owed == 0 {
        env.storage().persistent().remove(&key);
        return;
    }
    env.storage().persistent().set(&key, participant);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}
