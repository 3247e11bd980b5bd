//! # Ledger
//!
//! Per-depositor balances for every asset the vault custodies, plus a
//! running total per asset.
//!
//! The totals are what the conservation invariant is checked against: for
//! each asset, the vault's holdings on the external contract (or its own
//! NEAR balance, for `Native`) must be at least `total_of(asset)`.
//!
//! All mutations are all-or-nothing. `credit` and `debit` compute the new
//! balance and the new total before writing either of them, so a failed
//! call leaves storage untouched.

use std::collections::BTreeMap;
use std::fmt;

use near_sdk::store::{IterableMap, LookupMap};
use near_sdk::{env, near, AccountId, IntoStorageKey};

use crate::error::VaultError;

/// Asset class a balance is denominated in.
#[near(serializers = [json, borsh])]
#[serde(rename_all = "snake_case")]
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Asset {
    /// NEAR held directly by the vault.
    Native,
    /// wNEAR held by the vault on the configured wrap contract.
    Wrapped,
    /// Any other NEP-141 token, keyed by its contract account.
    Token(AccountId),
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => write!(f, "native"),
            Asset::Wrapped => write!(f, "wrapped"),
            Asset::Token(token_id) => write!(f, "token:{}", token_id),
        }
    }
}

/// Every balance one account holds. Entries that drop to zero stay in place.
#[near(serializers = [borsh])]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccountBalances {
    pub native: u128,
    pub wrapped: u128,
    pub tokens: BTreeMap<AccountId, u128>,
}

impl AccountBalances {
    pub fn get(&self, asset: &Asset) -> u128 {
        match asset {
            Asset::Native => self.native,
            Asset::Wrapped => self.wrapped,
            Asset::Token(token_id) => self.tokens.get(token_id).copied().unwrap_or(0),
        }
    }

    /// True when every balance, including drained token entries, is zero.
    pub fn is_empty(&self) -> bool {
        self.native == 0 && self.wrapped == 0 && self.tokens.values().all(|b| *b == 0)
    }

    fn set(&mut self, asset: &Asset, amount: u128) {
        match asset {
            Asset::Native => self.native = amount,
            Asset::Wrapped => self.wrapped = amount,
            Asset::Token(token_id) => {
                self.tokens.insert(token_id.clone(), amount);
            }
        }
    }
}

#[near(serializers = [borsh])]
pub struct Ledger {
    accounts: LookupMap<AccountId, AccountBalances>,
    totals: IterableMap<Asset, u128>,
}

impl Ledger {
    pub fn new<S: IntoStorageKey>(accounts_prefix: S, totals_prefix: S) -> Self {
        Self {
            accounts: LookupMap::new(accounts_prefix),
            totals: IterableMap::new(totals_prefix),
        }
    }

    /// Creates an empty record for `account_id` if it has none.
    pub fn register(&mut self, account_id: &AccountId) {
        if !self.accounts.contains_key(account_id) {
            self.accounts.insert(account_id.clone(), AccountBalances::default());
        }
    }

    /// Removes the record of `account_id`, returning its last balances.
    pub fn unregister(&mut self, account_id: &AccountId) -> Option<AccountBalances> {
        self.accounts.remove(account_id)
    }

    /// Starts tracking `asset` with a zero total, if it is not tracked yet.
    pub fn track(&mut self, asset: Asset) {
        if !self.totals.contains_key(&asset) {
            self.totals.insert(asset, 0);
        }
    }

    /// Writes cached entries through to storage.
    pub fn flush(&mut self) {
        self.accounts.flush();
        self.totals.flush();
    }

    /// Balance of `account_id` in `asset`, zero if never credited.
    pub fn balance_of(&self, account_id: &AccountId, asset: &Asset) -> u128 {
        self.accounts
            .get(account_id)
            .map_or(0, |balances| balances.get(asset))
    }

    /// Snapshot of all balances of `account_id`.
    pub fn balances_of(&self, account_id: &AccountId) -> AccountBalances {
        self.accounts.get(account_id).cloned().unwrap_or_default()
    }

    /// Sum of all depositors' balances in `asset`.
    pub fn total_of(&self, asset: &Asset) -> u128 {
        self.totals.get(asset).copied().unwrap_or(0)
    }

    /// Iterates the per-asset totals of every asset ever credited.
    pub fn totals(&self) -> impl Iterator<Item = (&Asset, &u128)> {
        self.totals.iter()
    }

    pub fn totals_len(&self) -> u32 {
        self.totals.len()
    }

    /// Checks that crediting `amount` would not overflow, without writing.
    pub fn ensure_creditable(
        &self,
        account_id: &AccountId,
        asset: &Asset,
        amount: u128,
    ) -> Result<(), VaultError> {
        self.balance_of(account_id, asset)
            .checked_add(amount)
            .and_then(|_| self.total_of(asset).checked_add(amount))
            .map(|_| ())
            .ok_or_else(|| VaultError::Overflow {
                asset: asset.clone(),
            })
    }

    /// Adds `amount` to the balance and the asset total. Returns the new balance.
    pub fn credit(
        &mut self,
        account_id: &AccountId,
        asset: &Asset,
        amount: u128,
    ) -> Result<u128, VaultError> {
        let overflow = || VaultError::Overflow {
            asset: asset.clone(),
        };

        let mut balances = self.balances_of(account_id);
        let balance = balances.get(asset).checked_add(amount).ok_or_else(overflow)?;
        let total = self.total_of(asset).checked_add(amount).ok_or_else(overflow)?;

        balances.set(asset, balance);
        self.accounts.insert(account_id.clone(), balances);
        self.totals.insert(asset.clone(), total);

        Ok(balance)
    }

    /// Subtracts `amount` from the balance and the asset total. Returns the new balance.
    ///
    /// Fails without touching storage if `amount` exceeds the current balance.
    pub fn debit(
        &mut self,
        account_id: &AccountId,
        asset: &Asset,
        amount: u128,
    ) -> Result<u128, VaultError> {
        let mut balances = self.balances_of(account_id);
        let available = balances.get(asset);
        if amount > available {
            return Err(VaultError::InsufficientBalance {
                asset: asset.clone(),
                available,
                requested: amount,
            });
        }

        let balance = available - amount;
        // A total is the sum of balances, so it can never be below one of them.
        let total = self
            .total_of(asset)
            .checked_sub(amount)
            .unwrap_or_else(|| env::panic_str("asset total underflow"));

        balances.set(asset, balance);
        self.accounts.insert(account_id.clone(), balances);
        self.totals.insert(asset.clone(), total);

        Ok(balance)
    }
}
