//! # NEP-141 Token Deposits and Withdrawals
//!
//! Deposits use the standard `ft_transfer_call` flow: the token contract
//! moves the tokens to the vault first and then calls `ft_on_transfer`.
//! The predecessor of that call is the token contract itself, so it
//! identifies the asset and cannot be spoofed by the depositor. Returning
//! the full amount as unused makes the token refund the sender. That is
//! how a deposit is rejected without leaving any ledger change behind.
//!
//! The one exception is a deposit whose storage growth the sender's storage
//! deposit does not cover. That error is only known after the ledger was
//! written, so the call panics instead; the token contract treats the failed
//! call as fully unused and refunds the sender all the same.

use near_contract_standards::fungible_token::receiver::FungibleTokenReceiver;
use near_sdk::serde::Deserialize;
use near_sdk::{
    assert_one_yocto, env, json_types::U128, near, AccountId, FunctionError, Promise,
    PromiseOrValue,
};

use crate::error::VaultError;
use crate::{Contract, ContractExt};

/// Optional `msg` payload of `ft_transfer_call`.
#[derive(Deserialize, Default)]
#[serde(crate = "near_sdk::serde")]
#[serde(deny_unknown_fields)]
pub struct DepositMessage {
    pub memo: Option<String>,
}

fn parse_deposit_message(msg: &str) -> Result<DepositMessage, VaultError> {
    if msg.trim().is_empty() {
        return Ok(DepositMessage::default());
    }
    serde_json::from_str(msg).map_err(|err| VaultError::InvalidMessage(err.to_string()))
}

#[near]
impl Contract {
    /// Withdraws `amount` of `token_id` to the caller.
    ///
    /// Passing the wrap contract as `token_id` withdraws from the `Wrapped`
    /// balance as wNEAR.
    ///
    /// Requires exactly 1 yoctoNEAR attached, which is forwarded to `ft_transfer`.
    ///
    /// # Panics
    ///
    /// - If `amount` is zero or exceeds the caller's balance
    #[payable]
    pub fn withdraw_token(&mut self, token_id: AccountId, amount: U128) -> Promise {
        assert_one_yocto();
        let asset = self.asset_for_token(token_id);
        self.internal_withdraw(env::predecessor_account_id(), asset, amount.0)
            .unwrap_or_else(|err| err.panic())
    }
}

#[near]
impl FungibleTokenReceiver for Contract {
    /// Credits `amount` of the calling token to `sender_id`.
    ///
    /// `msg` may be empty or `{"memo": "..."}`. Any error refunds the whole
    /// amount. Unregistered senders are refunded without any write.
    fn ft_on_transfer(
        &mut self,
        sender_id: AccountId,
        amount: U128,
        msg: String,
    ) -> PromiseOrValue<U128> {
        let token_id = env::predecessor_account_id();
        let asset = self.asset_for_token(token_id.clone());

        let result = parse_deposit_message(&msg).and_then(|message| {
            self.internal_deposit(&sender_id, &asset, amount.0, message.memo.as_deref())
        });

        match result {
            Ok(_) => PromiseOrValue::Value(U128(0)),
            Err(err @ VaultError::InsufficientStorage { .. }) => err.panic(),
            Err(err) => {
                env::log_str(&format!(
                    "rejected_deposit token={} sender={} reason={}",
                    token_id, sender_id, err
                ));
                PromiseOrValue::Value(amount)
            }
        }
    }
}
