//! # NEAR ⇄ wNEAR Conversion
//!
//! Converts between a depositor's `Native` and `Wrapped` balances through
//! the wrap contract configured at `init`. The source balance is debited
//! before the call. `resolve_conversion` then credits the target, or credits
//! the source back if the wrap contract rejected the call.

use near_sdk::{assert_one_yocto, env, json_types::U128, near, FunctionError, Promise};

use crate::internal::Conversion;
use crate::{Contract, ContractExt};

#[near]
impl Contract {
    /// Wraps `amount` of the caller's `Native` balance into `Wrapped`.
    ///
    /// The NEAR is attached to `near_deposit` on the wrap contract.
    ///
    /// # Panics
    ///
    /// - If `amount` is zero or exceeds the caller's `Native` balance
    /// - If the caller's `Wrapped` balance could not absorb `amount`
    pub fn wrap_near(&mut self, amount: U128) -> Promise {
        self.internal_convert(env::predecessor_account_id(), Conversion::Wrap, amount.0)
            .unwrap_or_else(|err| err.panic())
    }

    /// Unwraps `amount` of the caller's `Wrapped` balance back into `Native`.
    ///
    /// Requires exactly 1 yoctoNEAR attached, which is forwarded to `near_withdraw`.
    ///
    /// # Panics
    ///
    /// - If `amount` is zero or exceeds the caller's `Wrapped` balance
    /// - If the caller's `Native` balance could not absorb `amount`
    #[payable]
    pub fn unwrap_near(&mut self, amount: U128) -> Promise {
        assert_one_yocto();
        self.internal_convert(env::predecessor_account_id(), Conversion::Unwrap, amount.0)
            .unwrap_or_else(|err| err.panic())
    }
}
