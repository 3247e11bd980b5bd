//! # View Methods
//!
//! Public, read-only queries. No authorization is required to read any
//! depositor's balances.

use near_sdk::serde::{Deserialize, Serialize};
use near_sdk::{json_types::U128, near, AccountId};
use schemars::JsonSchema;

use crate::ledger::Asset;
use crate::{Contract, ContractExt};

/// Balance of one NEP-141 token held for an account.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct TokenBalanceView {
    pub token_id: String,
    pub balance: String,
}

impl From<(&AccountId, &u128)> for TokenBalanceView {
    fn from((token_id, balance): (&AccountId, &u128)) -> Self {
        TokenBalanceView {
            token_id: token_id.to_string(),
            balance: balance.to_string(),
        }
    }
}

/// Every balance of one account.
#[near(serializers = [json])]
#[derive(Clone, Debug, PartialEq)]
pub struct BalancesView {
    pub native: U128,
    pub wrapped: U128,
    pub tokens: Vec<TokenBalanceView>,
}

/// Sum of all depositors' balances of one asset.
#[near(serializers = [json])]
#[derive(Clone, Debug, PartialEq)]
pub struct AssetTotalView {
    pub asset: Asset,
    pub total: U128,
}

impl Contract {
    /// Resolves `Token(wrap_token)` to `Wrapped`; other assets pass through.
    fn normalize(&self, asset: Asset) -> Asset {
        match asset {
            Asset::Token(token_id) => self.asset_for_token(token_id),
            other => other,
        }
    }
}

#[near]
impl Contract {
    /// Returns the wNEAR contract configured at `init`.
    pub fn get_wrap_token(&self) -> AccountId {
        self.wrap_token.clone()
    }

    /// Returns the balance of `account_id` in `asset`.
    pub fn balance_of(&self, account_id: AccountId, asset: Asset) -> U128 {
        U128(self.ledger.balance_of(&account_id, &self.normalize(asset)))
    }

    pub fn native_balance_of(&self, account_id: AccountId) -> U128 {
        U128(self.ledger.balance_of(&account_id, &Asset::Native))
    }

    pub fn wrapped_balance_of(&self, account_id: AccountId) -> U128 {
        U128(self.ledger.balance_of(&account_id, &Asset::Wrapped))
    }

    /// Returns the balance of `account_id` in `token_id`. For the wrap
    /// contract this is the `Wrapped` balance.
    pub fn token_balance_of(&self, account_id: AccountId, token_id: AccountId) -> U128 {
        U128(
            self.ledger
                .balance_of(&account_id, &self.asset_for_token(token_id)),
        )
    }

    /// Returns all balances of `account_id`, including drained token entries.
    pub fn get_balances(&self, account_id: AccountId) -> BalancesView {
        let balances = self.ledger.balances_of(&account_id);
        BalancesView {
            native: U128(balances.native),
            wrapped: U128(balances.wrapped),
            tokens: balances.tokens.iter().map(TokenBalanceView::from).collect(),
        }
    }

    /// Returns the sum of all depositors' balances in `asset`.
    pub fn total_of(&self, asset: Asset) -> U128 {
        U128(self.ledger.total_of(&self.normalize(asset)))
    }

    /// Returns per-asset totals, with optional pagination.
    ///
    /// # Arguments
    ///
    /// * `from_index` - Starting index for pagination (default: 0)
    /// * `limit` - Maximum number of entries to return (default: all)
    pub fn get_totals(&self, from_index: Option<u32>, limit: Option<u32>) -> Vec<AssetTotalView> {
        let from = from_index.unwrap_or(0) as usize;
        let limit = limit.unwrap_or(self.ledger.totals_len()) as usize;

        self.ledger
            .totals()
            .skip(from)
            .take(limit)
            .map(|(asset, total)| AssetTotalView {
                asset: asset.clone(),
                total: U128(*total),
            })
            .collect()
    }
}
