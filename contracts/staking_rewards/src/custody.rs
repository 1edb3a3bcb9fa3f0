use soroban_sdk::{log, token, Address, Env};

use crate::ContractError;

/// Moves one token in and out of this contract's custody.
///
/// Transfers use the token's `try_transfer`, so a rejected transfer comes
/// back as [`ContractError::TransferFailed`] instead of aborting the
/// invocation.
pub struct Custody<'a> {
    env: &'a Env,
    token: token::Client<'a>,
}

impl<'a> Custody<'a> {
    pub fn new(env: &'a Env, token: &Address) -> Self {
        Custody {
            env,
            token: token::Client::new(env, token),
        }
    }

    /// Pull `amount` from `from` into custody.
    pub fn transfer_in(&self, from: &Address, amount: u128) -> Result<(), ContractError> {
        let here = self.env.current_contract_address();
        self.transfer(from, &here, amount)
    }

    /// Pay `amount` out of custody to `to`.
    pub fn transfer_out(&self, to: &Address, amount: u128) -> Result<(), ContractError> {
        let here = self.env.current_contract_address();
        self.transfer(&here, to, amount)
    }

    /// Balance of this token currently held by the contract.
    pub fn balance_held(&self) -> u128 {
        let balance = self.token.balance(&self.env.current_contract_address());
        u128::try_from(balance).unwrap_or(0)
    }

    fn transfer(&self, from: &Address, to: &Address, amount: u128) -> Result<(), ContractError> {
        let amount = i128::try_from(amount).map_err(|_| ContractError::ArithmeticOverflow)?;
        match self.token.try_transfer(from, to, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => {
                log!(self.env, "token transfer rejected", amount);
                Err(ContractError::TransferFailed)
            }
        }
    }
}
