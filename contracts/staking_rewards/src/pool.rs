//! The reward accrual engine.
//!
//! [`Pool`] holds the pool-wide accumulator and [`Participant`] holds one
//! account's position. Every state transition lives here as a method that
//! takes the current timestamp explicitly and never touches contract
//! storage, so the contract layer only has to load, call, and commit.
//!
//! Transitions are all-or-nothing: they run against copies of the pool and
//! participant and write the copies back only once every check has passed.

use soroban_sdk::contracttype;

use crate::{math, ContractError};

/// Pool-wide accounting state.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Pool {
    /// Sum of every participant's `staked`.
    pub total_staked: u128,
    /// Reward units emitted per second while the window is active.
    pub reward_rate: u128,
    /// Window length used by the next funding call, in seconds.
    pub duration: u64,
    /// Emission stops at this timestamp.
    pub window_end: u64,
    /// `min(window_end, now)` as of the last settlement.
    pub last_settled_at: u64,
    /// Reward earned per unit of stake since genesis, scaled by [`math::SCALE`].
    pub reward_per_stake: u128,
    /// Reward emitted to stakers and not yet paid out. Rounding dust stays
    /// in it, so it never reads lower than what participants are owed.
    pub unclaimed: u128,
}

/// A single account's position in the pool.
///
/// The all-zero value is indistinguishable from an account that never
/// staked, which is what lazy creation relies on.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Participant {
    pub staked: u128,
    /// Accumulator value at this participant's last settlement.
    pub checkpoint: u128,
    /// Reward banked but not yet claimed.
    pub owed: u128,
}

/// Outcome of a full exit: principal returned and reward paid.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Exit {
    pub withdrawn: u128,
    pub reward: u128,
}

impl Pool {
    pub fn new(duration: u64) -> Self {
        Pool {
            duration,
            ..Pool::default()
        }
    }

    /// `true` while a funded window is still emitting.
    pub fn is_active(&self, now: u64) -> bool {
        now < self.window_end
    }

    pub fn last_time_reward_applicable(&self, now: u64) -> u64 {
        now.min(self.window_end)
    }

    /// Accumulator value as it would be after settling at `now`.
    pub fn reward_per_stake_at(&self, now: u64) -> Result<u128, ContractError> {
        let elapsed = self
            .last_time_reward_applicable(now)
            .saturating_sub(self.last_settled_at);
        math::reward_per_stake(
            self.reward_per_stake,
            self.reward_rate,
            elapsed,
            self.total_staked,
        )
    }

    /// Reward `participant` could claim at `now`, without mutating anything.
    pub fn earned(&self, participant: &Participant, now: u64) -> Result<u128, ContractError> {
        let rps = self.reward_per_stake_at(now)?;
        math::accrued(
            participant.staked,
            rps,
            participant.checkpoint,
            participant.owed,
        )
    }

    /// `reward_rate × duration` for the configured window length.
    pub fn reward_for_duration(&self) -> Result<u128, ContractError> {
        self.reward_rate
            .checked_mul(u128::from(self.duration))
            .ok_or(ContractError::ArithmeticOverflow)
    }

    // ── Settlement ──────────────────────────────────────────────────────────

    /// Bring the accumulator up to `now` and, if given, bank everything the
    /// participant earned since their last checkpoint.
    ///
    /// Nothing is mutated when the arithmetic overflows.
    pub fn settle(
        &mut self,
        now: u64,
        participant: Option<&mut Participant>,
    ) -> Result<(), ContractError> {
        let applicable = self.last_time_reward_applicable(now);
        let elapsed = applicable.saturating_sub(self.last_settled_at);
        let rps = math::reward_per_stake(
            self.reward_per_stake,
            self.reward_rate,
            elapsed,
            self.total_staked,
        )?;
        let emitted = if self.total_staked > 0 {
            self.reward_rate.saturating_mul(u128::from(elapsed))
        } else {
            0
        };

        if let Some(p) = participant {
            p.owed = math::accrued(p.staked, rps, p.checkpoint, p.owed)?;
            p.checkpoint = rps;
        }

        self.reward_per_stake = rps;
        self.unclaimed = self.unclaimed.saturating_add(emitted);
        self.last_settled_at = applicable.max(self.last_settled_at);
        Ok(())
    }

    // ── Participant operations ──────────────────────────────────────────────

    pub fn stake(
        &mut self,
        participant: &mut Participant,
        amount: u128,
        now: u64,
    ) -> Result<(), ContractError> {
        if amount == 0 {
            return Err(ContractError::InvalidAmount);
        }

        let mut pool = self.clone();
        let mut next = participant.clone();
        pool.settle(now, Some(&mut next))?;

        next.staked = next
            .staked
            .checked_add(amount)
            .ok_or(ContractError::ArithmeticOverflow)?;
        pool.total_staked = pool
            .total_staked
            .checked_add(amount)
            .ok_or(ContractError::ArithmeticOverflow)?;

        *self = pool;
        *participant = next;
        Ok(())
    }

    pub fn withdraw(
        &mut self,
        participant: &mut Participant,
        amount: u128,
        now: u64,
    ) -> Result<(), ContractError> {
        if amount == 0 {
            return Err(ContractError::InvalidAmount);
        }
        if amount > participant.staked {
            return Err(ContractError::InsufficientStake);
        }

        let mut pool = self.clone();
        let mut next = participant.clone();
        pool.settle(now, Some(&mut next))?;

        next.staked -= amount;
        pool.total_staked = pool
            .total_staked
            .checked_sub(amount)
            .ok_or(ContractError::ArithmeticOverflow)?;

        *self = pool;
        *participant = next;
        Ok(())
    }

    /// Settle and hand back the participant's whole owed balance, zeroing it.
    ///
    /// Returns `0` (and still settles) when nothing is owed.
    pub fn claim(&mut self, participant: &mut Participant, now: u64) -> Result<u128, ContractError> {
        let mut pool = self.clone();
        let mut next = participant.clone();
        pool.settle(now, Some(&mut next))?;

        let reward = next.owed;
        next.owed = 0;
        pool.unclaimed = pool.unclaimed.saturating_sub(reward);

        *self = pool;
        *participant = next;
        Ok(reward)
    }

    /// Withdraw the full stake and claim in a single settlement.
    pub fn exit(&mut self, participant: &mut Participant, now: u64) -> Result<Exit, ContractError> {
        let mut pool = self.clone();
        let mut next = participant.clone();

        let withdrawn = next.staked;
        pool.withdraw(&mut next, withdrawn, now)?;
        let reward = pool.claim(&mut next, now)?;

        *self = pool;
        *participant = next;
        Ok(Exit { withdrawn, reward })
    }

    // ── Administrative operations ───────────────────────────────────────────

    /// Set the window length for the next funding call.
    ///
    /// Rejected while a window is running.
    pub fn set_duration(&mut self, duration: u64, now: u64) -> Result<(), ContractError> {
        if self.window_end > now {
            return Err(ContractError::WindowActive);
        }
        if duration == 0 {
            return Err(ContractError::InvalidDuration);
        }
        self.duration = duration;
        Ok(())
    }

    /// Fund a new window with `amount`, rolling any undistributed remainder
    /// of a running window into the new rate.
    ///
    /// `held` is the reward balance actually in custody. Reward already
    /// emitted but not yet claimed is spoken for, so the new window may only
    /// promise what is left of `held` after it.
    pub fn notify_reward_amount(
        &mut self,
        amount: u128,
        held: u128,
        now: u64,
    ) -> Result<(), ContractError> {
        let mut pool = self.clone();
        pool.settle(now, None)?;

        let carried = if pool.is_active(now) {
            pool.reward_rate
                .checked_mul(u128::from(pool.window_end - now))
                .ok_or(ContractError::ArithmeticOverflow)?
        } else {
            0
        };

        let rate = math::window_rate(amount, carried, pool.duration)?;
        if rate == 0 {
            return Err(ContractError::ZeroRate);
        }

        let promised = rate
            .checked_mul(u128::from(pool.duration))
            .ok_or(ContractError::ArithmeticOverflow)?;
        if promised > held.saturating_sub(pool.unclaimed) {
            return Err(ContractError::InsufficientFunding);
        }

        pool.reward_rate = rate;
        pool.last_settled_at = now;
        pool.window_end = now
            .checked_add(pool.duration)
            .ok_or(ContractError::ArithmeticOverflow)?;

        *self = pool;
        Ok(())
    }
}
