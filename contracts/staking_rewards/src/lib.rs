#![no_std]

pub mod access;
pub mod custody;
pub mod events;
pub mod math;
pub mod pool;
pub mod storage;

use soroban_sdk::{contract, contractimpl, contracttype, log, Address, Env};

use custody::Custody;
pub use pool::{Exit, Participant, Pool};
pub use storage::Config;

// ── Contract errors ──────────────────────────────────────────────────────────

#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContractError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    InvalidAmount = 4,
    InsufficientStake = 5,
    TransferFailed = 6,
    WindowActive = 7,
    ZeroRate = 8,
    InsufficientFunding = 9,
    InvalidDuration = 10,
    TokensIdentical = 11,
    ArithmeticOverflow = 12,
    NoPendingOwner = 13,
}

// ── Public-facing types (re-exported for test consumers) ─────────────────────

/// Snapshot of a participant's position returned by `get_staker_info`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakerInfo {
    pub staked: u128,
    pub earned: u128,
}

// ── Contract ─────────────────────────────────────────────────────────────────

#[contract]
pub struct StakingRewardsContract;

#[contractimpl]
impl StakingRewardsContract {
    // ── Initialisation ──────────────────────────────────────────────────────

    /// Bootstrap the contract.
    ///
    /// * `stake_token`  – SAC address of the token participants stake.
    /// * `reward_token` – SAC address of the token paid out as reward.
    /// * `duration`     – length in seconds of the first funded window;
    ///   `0` leaves it unset until `set_window_duration`.
    pub fn initialize(
        env: Env,
        owner: Address,
        stake_token: Address,
        reward_token: Address,
        duration: u64,
    ) -> Result<(), ContractError> {
        if storage::is_initialized(&env) {
            return Err(ContractError::AlreadyInitialized);
        }
        if stake_token == reward_token {
            return Err(ContractError::TokensIdentical);
        }

        access::set_owner(&env, &owner);
        storage::set_config(
            &env,
            &Config {
                stake_token: stake_token.clone(),
                reward_token: reward_token.clone(),
            },
        );
        storage::set_pool(&env, &Pool::new(duration));
        storage::mark_initialized(&env);

        events::publish_initialized(&env, owner, stake_token, reward_token, duration);

        Ok(())
    }

    // ── Staking ─────────────────────────────────────────────────────────────

    /// Deposit `amount` stake tokens.
    ///
    /// The accumulator is settled first so the new deposit never earns
    /// retroactively.
    pub fn stake(env: Env, staker: Address, amount: i128) -> Result<(), ContractError> {
        storage::require_initialized(&env)?;
        staker.require_auth();

        let amount = positive_amount(amount)?;
        let now = env.ledger().timestamp();

        let mut pool = storage::pool(&env);
        let mut participant = storage::participant(&env, &staker);
        pool.stake(&mut participant, amount, now)?;

        let config = storage::config(&env)?;
        Custody::new(&env, &config.stake_token).transfer_in(&staker, amount)?;

        // Storage is only written once the tokens have arrived.
        storage::set_pool(&env, &pool);
        storage::set_participant(&env, &staker, &participant);

        events::publish_staked(&env, staker, amount, pool.total_staked);

        Ok(())
    }

    /// Return `amount` staked tokens to `staker`.
    pub fn withdraw(env: Env, staker: Address, amount: i128) -> Result<(), ContractError> {
        storage::require_initialized(&env)?;
        staker.require_auth();

        let amount = positive_amount(amount)?;
        let now = env.ledger().timestamp();

        let mut pool = storage::pool(&env);
        let mut participant = storage::participant(&env, &staker);
        pool.withdraw(&mut participant, amount, now)?;

        let config = storage::config(&env)?;
        Custody::new(&env, &config.stake_token).transfer_out(&staker, amount)?;

        storage::set_pool(&env, &pool);
        storage::set_participant(&env, &staker, &participant);

        events::publish_withdrawn(&env, staker, amount, pool.total_staked);

        Ok(())
    }

    // ── Rewards ─────────────────────────────────────────────────────────────

    /// Pay out everything `staker` has earned so far.
    ///
    /// Settles even when nothing is owed, in which case `0` is returned.
    pub fn claim_rewards(env: Env, staker: Address) -> Result<u128, ContractError> {
        storage::require_initialized(&env)?;
        staker.require_auth();

        let now = env.ledger().timestamp();

        let mut pool = storage::pool(&env);
        let mut participant = storage::participant(&env, &staker);
        let reward = pool.claim(&mut participant, now)?;

        if reward > 0 {
            let config = storage::config(&env)?;
            Custody::new(&env, &config.reward_token).transfer_out(&staker, reward)?;
        }

        storage::set_pool(&env, &pool);
        storage::set_participant(&env, &staker, &participant);

        if reward > 0 {
            events::publish_reward_claimed(&env, staker, reward);
        }

        Ok(reward)
    }

    /// Withdraw the whole stake and claim all rewards in one call.
    pub fn exit(env: Env, staker: Address) -> Result<Exit, ContractError> {
        storage::require_initialized(&env)?;
        staker.require_auth();

        let now = env.ledger().timestamp();

        let mut pool = storage::pool(&env);
        let mut participant = storage::participant(&env, &staker);
        let out = pool.exit(&mut participant, now)?;

        let config = storage::config(&env)?;
        Custody::new(&env, &config.stake_token).transfer_out(&staker, out.withdrawn)?;
        if out.reward > 0 {
            Custody::new(&env, &config.reward_token).transfer_out(&staker, out.reward)?;
        }

        storage::set_pool(&env, &pool);
        storage::set_participant(&env, &staker, &participant);

        events::publish_withdrawn(&env, staker.clone(), out.withdrawn, pool.total_staked);
        if out.reward > 0 {
            events::publish_reward_claimed(&env, staker, out.reward);
        }

        Ok(out)
    }

    // ── Admin functions ──────────────────────────────────────────────────────

    /// Set the length of the next reward window.
    ///
    /// Rejected with `WindowActive` while a funded window is still running.
    pub fn set_window_duration(
        env: Env,
        caller: Address,
        duration: u64,
    ) -> Result<(), ContractError> {
        storage::require_initialized(&env)?;
        caller.require_auth();
        access::require_owner(&env, &caller)?;

        let mut pool = storage::pool(&env);
        pool.set_duration(duration, env.ledger().timestamp())?;
        storage::set_pool(&env, &pool);

        events::publish_window_duration_set(&env, duration);

        Ok(())
    }

    /// Start (or extend) a reward window worth `amount` reward tokens.
    ///
    /// The reward tokens must already have been transferred to this
    /// contract: the new rate is rejected with `InsufficientFunding` if
    /// `rate × duration` exceeds the reward balance held less the reward
    /// stakers have earned but not yet claimed.
    pub fn notify_reward_amount(
        env: Env,
        caller: Address,
        amount: i128,
    ) -> Result<(), ContractError> {
        storage::require_initialized(&env)?;
        caller.require_auth();
        access::require_owner(&env, &caller)?;

        let amount = u128::try_from(amount).map_err(|_| ContractError::InvalidAmount)?;
        let now = env.ledger().timestamp();

        let config = storage::config(&env)?;
        let held = Custody::new(&env, &config.reward_token).balance_held();

        let mut pool = storage::pool(&env);
        pool.notify_reward_amount(amount, held, now)
            .inspect_err(|_| log!(&env, "reward funding rejected", amount, held))?;
        storage::set_pool(&env, &pool);

        events::publish_reward_added(&env, amount, pool.reward_rate, pool.window_end);

        Ok(())
    }

    // ── View functions ───────────────────────────────────────────────────────

    /// `min(now, window_end)`: the last instant rewards are emitted for.
    pub fn last_time_reward_applicable(env: Env) -> u64 {
        storage::pool(&env).last_time_reward_applicable(env.ledger().timestamp())
    }

    /// Accumulator value as of now, scaled by `math::SCALE`.
    pub fn reward_per_stake(env: Env) -> Result<u128, ContractError> {
        storage::pool(&env).reward_per_stake_at(env.ledger().timestamp())
    }

    /// Real-time claimable reward for `staker`, without mutating state.
    pub fn earned(env: Env, staker: Address) -> Result<u128, ContractError> {
        let participant = storage::participant(&env, &staker);
        storage::pool(&env).earned(&participant, env.ledger().timestamp())
    }

    /// Combined position for `staker`.
    pub fn get_staker_info(env: Env, staker: Address) -> Result<StakerInfo, ContractError> {
        let participant = storage::participant(&env, &staker);
        let earned = storage::pool(&env).earned(&participant, env.ledger().timestamp())?;
        Ok(StakerInfo {
            staked: participant.staked,
            earned,
        })
    }

    /// Total reward emitted over one full window at the current rate.
    pub fn get_reward_for_duration(env: Env) -> Result<u128, ContractError> {
        storage::pool(&env).reward_for_duration()
    }

    pub fn get_staked(env: Env, staker: Address) -> u128 {
        storage::participant(&env, &staker).staked
    }

    pub fn get_total_staked(env: Env) -> u128 {
        storage::pool(&env).total_staked
    }

    pub fn get_reward_rate(env: Env) -> u128 {
        storage::pool(&env).reward_rate
    }

    pub fn get_window_end(env: Env) -> u64 {
        storage::pool(&env).window_end
    }

    pub fn get_window_duration(env: Env) -> u64 {
        storage::pool(&env).duration
    }

    /// Raw pool record as last committed (not settled to now).
    pub fn get_pool(env: Env) -> Pool {
        storage::pool(&env)
    }

    /// Raw participant record as last committed (not settled to now).
    pub fn get_participant(env: Env, staker: Address) -> Participant {
        storage::participant(&env, &staker)
    }

    pub fn get_config(env: Env) -> Result<Config, ContractError> {
        storage::config(&env)
    }

    pub fn is_initialized(env: Env) -> bool {
        storage::is_initialized(&env)
    }

    pub fn get_owner(env: Env) -> Result<Address, ContractError> {
        access::owner(&env)
    }

    pub fn get_pending_owner(env: Env) -> Option<Address> {
        access::pending_owner(&env)
    }

    // ── Ownership transfer (two-step) ───────────────────────────────────────

    /// Propose a new owner. Only the current owner can call this; the
    /// proposed owner completes the transfer with `accept_owner`.
    pub fn propose_owner(
        env: Env,
        current_owner: Address,
        new_owner: Address,
    ) -> Result<(), ContractError> {
        storage::require_initialized(&env)?;
        current_owner.require_auth();
        access::propose(&env, &current_owner, &new_owner)?;

        events::publish_owner_transfer_proposed(&env, current_owner, new_owner);

        Ok(())
    }

    /// Accept the pending ownership transfer. Only the proposed owner can
    /// call this.
    pub fn accept_owner(env: Env, new_owner: Address) -> Result<(), ContractError> {
        storage::require_initialized(&env)?;
        new_owner.require_auth();
        let old_owner = access::accept(&env, &new_owner)?;

        events::publish_owner_transfer_accepted(&env, old_owner, new_owner);

        Ok(())
    }

    /// Cancel a pending ownership transfer. Only the current owner can call
    /// this.
    pub fn cancel_owner_transfer(env: Env, current_owner: Address) -> Result<(), ContractError> {
        storage::require_initialized(&env)?;
        current_owner.require_auth();
        let pending = access::cancel(&env, &current_owner)?;

        events::publish_owner_transfer_cancelled(&env, current_owner, pending);

        Ok(())
    }
}

/// Convert a token-side amount into the engine's unsigned domain,
/// rejecting zero and negative values.
fn positive_amount(amount: i128) -> Result<u128, ContractError> {
    if amount <= 0 {
        return Err(ContractError::InvalidAmount);
    }
    u128::try_from(amount).map_err(|_| ContractError::InvalidAmount)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
