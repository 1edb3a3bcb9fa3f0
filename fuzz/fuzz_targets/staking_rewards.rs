#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    token::{Client as TokenClient, StellarAssetClient},
    Address, Env,
};
use staking_rewards::{StakingRewardsContract, StakingRewardsContractClient};

#[derive(Arbitrary, Debug)]
pub enum FuzzAction {
    Stake { amount: u32 },
    Withdraw { amount: u32 },
    ClaimRewards,
    Exit,
    Fund { amount: u32 },
    Notify { amount: u32 },
    SetDuration { duration: u16 },
    Advance { secs: u16 },
}

fuzz_target!(|input: (u16, Vec<FuzzAction>)| {
    let (duration, actions) = input;

    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(0);

    let stake_token = env
        .register_stellar_asset_contract_v2(Address::generate(&env))
        .address();
    let reward_token = env
        .register_stellar_asset_contract_v2(Address::generate(&env))
        .address();

    let contract_id = env.register(StakingRewardsContract, ());
    let client = StakingRewardsContractClient::new(&env, &contract_id);

    let owner = Address::generate(&env);
    client.initialize(&owner, &stake_token, &reward_token, &u64::from(duration));

    let mut users = vec![];
    for _ in 0..4 {
        let user = Address::generate(&env);
        StellarAssetClient::new(&env, &stake_token).mint(&user, &(u32::MAX as i128));
        users.push(user);
    }

    let stake = TokenClient::new(&env, &stake_token);
    let reward = TokenClient::new(&env, &reward_token);
    let mut now = 0u64;

    // Any panic here is a bug: every failure path must come back as a
    // ContractError, and the custody balance must always match the books.
    for (i, action) in actions.into_iter().enumerate() {
        let caller = &users[i % users.len()];
        match action {
            FuzzAction::Stake { amount } => {
                let _ = client.try_stake(caller, &(amount as i128));
            }
            FuzzAction::Withdraw { amount } => {
                let _ = client.try_withdraw(caller, &(amount as i128));
            }
            FuzzAction::ClaimRewards => {
                let _ = client.try_claim_rewards(caller);
            }
            FuzzAction::Exit => {
                let _ = client.try_exit(caller);
            }
            FuzzAction::Fund { amount } => {
                StellarAssetClient::new(&env, &reward_token).mint(&contract_id, &(amount as i128));
                let _ = client.try_notify_reward_amount(&owner, &(amount as i128));
            }
            FuzzAction::Notify { amount } => {
                let _ = client.try_notify_reward_amount(&owner, &(amount as i128));
            }
            FuzzAction::SetDuration { duration } => {
                let _ = client.try_set_window_duration(&owner, &u64::from(duration));
            }
            FuzzAction::Advance { secs } => {
                now += u64::from(secs);
                env.ledger().set_timestamp(now);
            }
        }

        let total = client.get_total_staked();
        let sum: u128 = users.iter().map(|u| client.get_staked(u)).sum();
        assert_eq!(sum, total);
        assert_eq!(stake.balance(&contract_id), total as i128);

        let owed: u128 = users.iter().map(|u| client.earned(u)).sum();
        let remaining = client.get_reward_rate()
            * u128::from(client.get_window_end().saturating_sub(now));
        assert!(owed + remaining <= reward.balance(&contract_id) as u128);
    }
});
