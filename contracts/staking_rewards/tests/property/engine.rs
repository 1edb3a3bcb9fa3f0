#![allow(clippy::unwrap_used, clippy::expect_used, clippy::arithmetic_side_effects)]
//! Property tests for the accrual engine, driven without a Soroban host.
//!
//! A random sequence of stake / withdraw / claim / fund / advance operations
//! is applied to a `Pool` and a handful of `Participant`s. After every step:
//! - `total_staked` equals the sum of all participant stakes
//! - the accumulator never decreases
//! - rewards paid plus rewards still claimable never exceed what was funded
//! - rewards still claimable plus the rest of the running window fit in
//!   custody, even when a window is opened without a fresh deposit
//! - a failed operation leaves the pool and participant untouched

use proptest::prelude::*;
use staking_rewards::{ContractError, Participant, Pool};

const PARTICIPANTS: usize = 4;

#[derive(Clone, Debug)]
enum Op {
    Stake { who: usize, amount: u128 },
    Withdraw { who: usize, amount: u128 },
    Claim { who: usize },
    Fund { amount: u128 },
    Notify { amount: u128 },
    Advance { secs: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..PARTICIPANTS, 1u128..10_000).prop_map(|(who, amount)| Op::Stake { who, amount }),
        (0..PARTICIPANTS, 1u128..12_000).prop_map(|(who, amount)| Op::Withdraw { who, amount }),
        (0..PARTICIPANTS).prop_map(|who| Op::Claim { who }),
        (0u128..5_000_000).prop_map(|amount| Op::Fund { amount }),
        (0u128..5_000_000).prop_map(|amount| Op::Notify { amount }),
        (0u64..700).prop_map(|secs| Op::Advance { secs }),
    ]
}

/// Engine plus the bookkeeping a custodian would see.
struct Model {
    pool: Pool,
    people: Vec<Participant>,
    now: u64,
    held: u128,
    funded: u128,
    paid: u128,
}

impl Model {
    fn new(duration: u64) -> Self {
        Model {
            pool: Pool::new(duration),
            people: vec![Participant::default(); PARTICIPANTS],
            now: 0,
            held: 0,
            funded: 0,
            paid: 0,
        }
    }

    fn apply(&mut self, op: &Op) -> Result<(), ContractError> {
        match *op {
            Op::Stake { who, amount } => {
                self.pool.stake(&mut self.people[who], amount, self.now)
            }
            Op::Withdraw { who, amount } => {
                self.pool.withdraw(&mut self.people[who], amount, self.now)
            }
            Op::Claim { who } => {
                let reward = self.pool.claim(&mut self.people[who], self.now)?;
                assert!(reward <= self.held, "claim exceeds custody");
                self.held -= reward;
                self.paid += reward;
                Ok(())
            }
            Op::Fund { amount } => {
                // Tokens land in custody before the window is opened.
                self.held += amount;
                self.funded += amount;
                self.pool.notify_reward_amount(amount, self.held, self.now)
            }
            Op::Notify { amount } => {
                // Announced without depositing anything.
                self.pool.notify_reward_amount(amount, self.held, self.now)
            }
            Op::Advance { secs } => {
                self.now += secs;
                Ok(())
            }
        }
    }

    fn outstanding(&self) -> u128 {
        self.people
            .iter()
            .map(|p| self.pool.earned(p, self.now).unwrap())
            .sum()
    }

    /// Emission still to come from the running window.
    fn remaining(&self) -> u128 {
        self.pool.reward_rate * u128::from(self.pool.window_end.saturating_sub(self.now))
    }
}

proptest! {
    #[test]
    fn prop_engine_invariants_hold(
        duration in 1u64..2_000,
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let mut model = Model::new(duration);
        let mut last_rps = 0u128;

        for op in &ops {
            let pool_before = model.pool.clone();
            let people_before = model.people.clone();

            if model.apply(op).is_err() {
                prop_assert_eq!(&model.pool, &pool_before);
                prop_assert_eq!(&model.people, &people_before);
            }

            let staked: u128 = model.people.iter().map(|p| p.staked).sum();
            prop_assert_eq!(staked, model.pool.total_staked);

            let rps = model.pool.reward_per_stake_at(model.now).unwrap();
            prop_assert!(rps >= last_rps, "accumulator went backwards");
            prop_assert!(model.pool.reward_per_stake >= pool_before.reward_per_stake);
            last_rps = rps;

            prop_assert!(
                model.paid + model.outstanding() <= model.funded,
                "paid {} + outstanding {} > funded {}",
                model.paid,
                model.outstanding(),
                model.funded
            );
            prop_assert!(
                model.outstanding() + model.remaining() <= model.held,
                "outstanding {} + remaining {} > held {}",
                model.outstanding(),
                model.remaining(),
                model.held
            );
        }
    }

    /// Settling twice at the same instant changes nothing the second time.
    #[test]
    fn prop_settlement_is_idempotent(
        amount in 1u128..1_000_000,
        stake in 1u128..1_000_000,
        duration in 1u64..10_000,
        at in 0u64..20_000,
    ) {
        let mut pool = Pool::new(duration);
        pool.notify_reward_amount(amount.max(u128::from(duration)), u128::MAX, 0).unwrap();

        let mut p = Participant::default();
        pool.stake(&mut p, stake, 0).unwrap();

        pool.settle(at, Some(&mut p)).unwrap();
        let (pool_once, p_once) = (pool.clone(), p.clone());
        pool.settle(at, Some(&mut p)).unwrap();

        prop_assert_eq!(pool, pool_once);
        prop_assert_eq!(p, p_once);
    }

    /// Two participants staking the same amount at the same boundary and
    /// leaving at the same later boundary earn the same, whichever goes first.
    #[test]
    fn prop_equal_joiners_earn_equally(
        amount in 1u128..100_000,
        background in 0u128..100_000,
        join_at in 0u64..1_000,
        stay in 1u64..1_000,
        funding in 1_000u128..10_000_000,
        a_first in any::<bool>(),
    ) {
        let mut pool = Pool::new(1_000);
        pool.notify_reward_amount(funding, funding, 0).unwrap();

        let mut other = Participant::default();
        if background > 0 {
            pool.stake(&mut other, background, 0).unwrap();
        }

        let mut a = Participant::default();
        let mut b = Participant::default();
        let leave_at = join_at + stay;

        if a_first {
            pool.stake(&mut a, amount, join_at).unwrap();
            pool.stake(&mut b, amount, join_at).unwrap();
            pool.withdraw(&mut a, amount, leave_at).unwrap();
            pool.withdraw(&mut b, amount, leave_at).unwrap();
        } else {
            pool.stake(&mut b, amount, join_at).unwrap();
            pool.stake(&mut a, amount, join_at).unwrap();
            pool.withdraw(&mut b, amount, leave_at).unwrap();
            pool.withdraw(&mut a, amount, leave_at).unwrap();
        }

        prop_assert_eq!(a.owed, b.owed);
    }

    /// A sole staker never receives more than `rate × time in pool`.
    #[test]
    fn prop_sole_staker_bounded_by_emission(
        funding in 1_000u128..10_000_000,
        duration in 1u64..1_000,
        join_at in 0u64..2_000,
        claim_at in 0u64..4_000,
        stake in 1u128..1_000_000,
    ) {
        let mut pool = Pool::new(duration);
        pool.notify_reward_amount(funding, funding, 0).unwrap();
        let rate = pool.reward_rate;

        let mut p = Participant::default();
        pool.stake(&mut p, stake, join_at).unwrap();

        let claim_at = claim_at.max(join_at);
        let reward = pool.claim(&mut p, claim_at).unwrap();

        let start = join_at.min(duration);
        let end = claim_at.min(duration);
        let time_in_pool = u128::from(end - start);
        prop_assert!(reward <= rate * time_in_pool);
        // Rounding only ever loses less than one unit per settlement.
        prop_assert!(rate * time_in_pool - reward <= 1);
    }
}
