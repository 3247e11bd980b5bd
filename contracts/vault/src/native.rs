//! # Native NEAR Deposits and Withdrawals

use near_sdk::{assert_one_yocto, env, json_types::U128, near, FunctionError, Promise};

use crate::ledger::Asset;
use crate::{Contract, ContractExt};

#[near]
impl Contract {
    /// Credits the attached NEAR to the caller's `Native` balance.
    ///
    /// # Returns
    ///
    /// The caller's new `Native` balance.
    ///
    /// # Panics
    ///
    /// - If nothing is attached
    /// - If the balance would overflow
    #[payable]
    pub fn deposit_near(&mut self) -> U128 {
        let account_id = env::predecessor_account_id();
        let amount = env::attached_deposit().as_yoctonear();

        self.internal_deposit(&account_id, &Asset::Native, amount, None)
            .map(U128)
            .unwrap_or_else(|err| err.panic())
    }

    /// Withdraws `amount` yoctoNEAR from the caller's `Native` balance.
    ///
    /// The balance is debited before the transfer is issued. If the transfer
    /// fails, `resolve_withdraw` credits it back.
    ///
    /// Requires exactly 1 yoctoNEAR attached.
    ///
    /// # Panics
    ///
    /// - If `amount` is zero or exceeds the caller's balance
    #[payable]
    pub fn withdraw_near(&mut self, amount: U128) -> Promise {
        assert_one_yocto();
        self.internal_withdraw(env::predecessor_account_id(), Asset::Native, amount.0)
            .unwrap_or_else(|err| err.panic())
    }
}
