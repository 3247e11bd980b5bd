//! # Storage Management (NEP-145)
//!
//! Every depositor pays for the state the vault keeps on its behalf.
//! Registration covers the fixed per-account records. A deposit that creates
//! a new token entry in the account's record (or a new per-asset total) grows
//! storage further; those bytes are measured with `env::storage_usage()` and
//! charged against the account's storage deposit. A deposit whose growth is
//! not covered fails and its writes are reverted.
//!
//! Charged bytes stay charged for as long as the account is registered, even
//! after the token balance is withdrawn, because drained entries persist.

use near_contract_standards::storage_management::{
    StorageBalance, StorageBalanceBounds, StorageManagement,
};
use near_sdk::{
    assert_one_yocto, env, near, require, AccountId, FunctionError, NearToken, Promise,
};

use crate::error::VaultError;
use crate::{Contract, ContractExt};

/// Storage registration of one account.
#[near(serializers = [borsh])]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StorageAccount {
    /// NEAR deposited for storage, in yoctoNEAR.
    pub deposit: u128,
    /// Bytes charged beyond the fixed registration cost.
    pub bytes_used: u64,
}

fn storage_cost(bytes: u64) -> u128 {
    u128::from(bytes) * env::storage_byte_cost().as_yoctonear()
}

fn refund(receiver_id: AccountId, amount: u128) {
    if amount > 0 {
        Promise::new(receiver_id).transfer(NearToken::from_yoctonear(amount));
    }
}

impl Contract {
    /// Measures the bytes one registration occupies by registering a
    /// maximum-length account id and removing it again.
    pub(crate) fn measure_account_storage_usage(&mut self) {
        let initial = self.flushed_storage_usage();
        let tmp_account_id: AccountId = "a"
            .repeat(64)
            .parse()
            .unwrap_or_else(|_| env::panic_str("invalid measurement account"));

        self.storage_accounts
            .insert(tmp_account_id.clone(), StorageAccount::default());
        self.ledger.register(&tmp_account_id);
        self.account_storage_usage = self.flushed_storage_usage() - initial;

        self.storage_accounts.remove(&tmp_account_id);
        self.ledger.unregister(&tmp_account_id);
        self.flush();
    }

    /// Writes all cached collection entries through to storage.
    pub(crate) fn flush(&mut self) {
        self.storage_accounts.flush();
        self.ledger.flush();
    }

    /// Storage usage after flushing, so later writes can be measured against it.
    pub(crate) fn flushed_storage_usage(&mut self) -> u64 {
        self.flush();
        env::storage_usage()
    }

    /// Minimum storage deposit of a registration, in yoctoNEAR.
    pub(crate) fn min_storage_balance(&self) -> u128 {
        storage_cost(self.account_storage_usage)
    }

    pub(crate) fn internal_register(&mut self, account_id: &AccountId, deposit: u128) {
        self.storage_accounts.insert(
            account_id.clone(),
            StorageAccount {
                deposit,
                bytes_used: 0,
            },
        );
        self.ledger.register(account_id);
    }

    pub(crate) fn require_registered(&self, account_id: &AccountId) -> Result<(), VaultError> {
        if self.storage_accounts.contains_key(account_id) {
            Ok(())
        } else {
            Err(VaultError::NotRegistered(account_id.clone()))
        }
    }

    /// Charges `account_id` for the bytes written since `initial_usage`.
    ///
    /// On error the caller must panic so the measured writes are reverted.
    pub(crate) fn internal_charge_storage(
        &mut self,
        account_id: &AccountId,
        initial_usage: u64,
    ) -> Result<(), VaultError> {
        let grown = self.flushed_storage_usage().saturating_sub(initial_usage);
        if grown == 0 {
            return Ok(());
        }

        let registration_bytes = self.account_storage_usage;
        let account = self
            .storage_accounts
            .get_mut(account_id)
            .ok_or_else(|| VaultError::NotRegistered(account_id.clone()))?;
        account.bytes_used += grown;

        let required = storage_cost(registration_bytes + account.bytes_used);
        if account.deposit < required {
            return Err(VaultError::InsufficientStorage {
                required,
                deposited: account.deposit,
            });
        }
        Ok(())
    }

    fn internal_storage_balance_of(&self, account_id: &AccountId) -> Option<StorageBalance> {
        self.storage_accounts.get(account_id).map(|account| {
            let locked = storage_cost(self.account_storage_usage + account.bytes_used);
            StorageBalance {
                total: NearToken::from_yoctonear(account.deposit),
                available: NearToken::from_yoctonear(account.deposit.saturating_sub(locked)),
            }
        })
    }

    fn storage_balance_or_panic(&self, account_id: &AccountId) -> StorageBalance {
        self.internal_storage_balance_of(account_id)
            .unwrap_or_else(|| VaultError::NotRegistered(account_id.clone()).panic())
    }
}

#[near]
impl StorageManagement for Contract {
    /// Registers `account_id` (default: the caller) or tops up its deposit.
    ///
    /// A new registration needs at least `storage_balance_bounds().min`. With
    /// `registration_only` only the minimum is kept and the rest is refunded;
    /// an already registered account gets the whole deposit back.
    #[payable]
    fn storage_deposit(
        &mut self,
        account_id: Option<AccountId>,
        registration_only: Option<bool>,
    ) -> StorageBalance {
        let amount = env::attached_deposit().as_yoctonear();
        let account_id = account_id.unwrap_or_else(env::predecessor_account_id);
        let registration_only = registration_only.unwrap_or(false);

        if self.storage_accounts.contains_key(&account_id) {
            if registration_only {
                refund(env::predecessor_account_id(), amount);
            } else if let Some(account) = self.storage_accounts.get_mut(&account_id) {
                account.deposit += amount;
            }
        } else {
            let min = self.min_storage_balance();
            require!(
                amount >= min,
                "The attached deposit is less than the minimum storage balance"
            );

            let deposit = if registration_only { min } else { amount };
            self.internal_register(&account_id, deposit);
            refund(env::predecessor_account_id(), amount - deposit);
        }

        self.storage_balance_or_panic(&account_id)
    }

    /// Withdraws `amount` (default: everything available) of the caller's
    /// unlocked storage deposit. Requires exactly 1 yoctoNEAR attached.
    #[payable]
    fn storage_withdraw(&mut self, amount: Option<NearToken>) -> StorageBalance {
        assert_one_yocto();
        let account_id = env::predecessor_account_id();
        let available = self.storage_balance_or_panic(&account_id).available;
        let amount = amount.unwrap_or(available);
        require!(
            amount <= available,
            "The amount is greater than the available storage balance"
        );

        if let Some(account) = self.storage_accounts.get_mut(&account_id) {
            account.deposit -= amount.as_yoctonear();
        }
        refund(account_id.clone(), amount.as_yoctonear());

        self.storage_balance_or_panic(&account_id)
    }

    /// Removes the caller's registration and refunds its deposit minus the
    /// bytes charged for token entries.
    ///
    /// Returns `false` if the caller was not registered. Accounts holding any
    /// balance cannot unregister, with or without `force`.
    #[payable]
    fn storage_unregister(&mut self, force: Option<bool>) -> bool {
        assert_one_yocto();
        let account_id = env::predecessor_account_id();
        let Some(account) = self.storage_accounts.get(&account_id).cloned() else {
            return false;
        };

        if !self.ledger.balances_of(&account_id).is_empty() {
            env::panic_str(if force.unwrap_or(false) {
                "Force unregistration would burn custodied balances"
            } else {
                "Can't unregister the account with positive balances"
            });
        }

        self.storage_accounts.remove(&account_id);
        self.ledger.unregister(&account_id);
        refund(
            account_id.clone(),
            account.deposit.saturating_sub(storage_cost(account.bytes_used)),
        );
        env::log_str(&format!("storage_unregister account={}", account_id));

        true
    }

    fn storage_balance_bounds(&self) -> StorageBalanceBounds {
        StorageBalanceBounds {
            min: NearToken::from_yoctonear(self.min_storage_balance()),
            max: None,
        }
    }

    fn storage_balance_of(&self, account_id: AccountId) -> Option<StorageBalance> {
        self.internal_storage_balance_of(&account_id)
    }
}
