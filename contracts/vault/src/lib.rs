//! # Multi-Asset Vault Contract
//!
//! A NEAR smart contract that custodies three kinds of assets on behalf of
//! its depositors:
//!
//! - **NEAR**: attached to `deposit_near`, paid out by `withdraw_near`
//! - **wNEAR**: produced by `wrap_near` and consumed by `unwrap_near`
//!   through the canonical wrap contract fixed at `init`. It can also be
//!   deposited and withdrawn directly like any NEP-141 token.
//! - **NEP-141 tokens**: deposited with `ft_transfer_call`, withdrawn with
//!   `withdraw_token`. Any token contract can be deposited without prior
//!   whitelisting.
//!
//! Every operation acts on the caller's own balances only. Depositors
//! register with the vault through NEP-145 `storage_deposit` first, and pay
//! for the storage their balances occupy.
//!
//! ## Architecture
//!
//! - [`ledger`]: per-depositor balances and per-asset totals
//! - [`internal`]: CEI execution of deposits, withdrawals and conversions,
//!   plus the resolve callbacks that finalize or roll them back
//! - [`native`], [`token`], [`wrap`]: public entry points per asset family
//! - [`storage`]: NEP-145 registration and per-account storage charging
//! - [`views`]: read-only queries
//! - [`events`]: NEP-297 event logs

use near_sdk::{
    borsh::{self, BorshDeserialize, BorshSerialize},
    near,
    store::LookupMap,
    AccountId, BorshStorageKey, PanicOnDefault,
};

mod error;
pub mod events;
mod internal;
pub mod ledger;
mod native;
mod storage;
mod token;
mod views;
mod wrap;

#[cfg(test)]
pub mod test_utils;

pub use error::VaultError;
pub use internal::Conversion;
pub use ledger::{AccountBalances, Asset, Ledger};
pub use storage::StorageAccount;
pub use views::{AssetTotalView, BalancesView, TokenBalanceView};

/// Storage keys for NEAR SDK collections.
#[derive(BorshSerialize, BorshDeserialize, BorshStorageKey)]
pub enum StorageKey {
    /// Storage prefix for per-account balances.
    Balances,
    /// Storage prefix for per-asset totals.
    Totals,
    /// Storage prefix for NEP-145 registrations.
    StorageAccounts,
}

/// Main contract state.
#[near(contract_state)]
#[derive(PanicOnDefault)]
pub struct Contract {
    /// Account ID of the canonical wNEAR contract. Fixed for the vault's lifetime.
    pub wrap_token: AccountId,
    /// Balances of every depositor.
    pub ledger: Ledger,
    /// Storage deposits of registered depositors.
    pub storage_accounts: LookupMap<AccountId, StorageAccount>,
    /// Bytes occupied by one registration, measured at `init`.
    pub account_storage_usage: u64,
}

#[near]
impl Contract {
    /// Initializes the vault.
    ///
    /// # Arguments
    ///
    /// * `wrap_token` - Account ID of the wNEAR contract used by `wrap_near` / `unwrap_near`
    ///
    /// The vault account must be registered for storage on `wrap_token`
    /// (and on every token it pays out) before those calls can succeed.
    #[init]
    #[private]
    pub fn init(wrap_token: AccountId) -> Self {
        let mut this = Self {
            wrap_token,
            ledger: Ledger::new(StorageKey::Balances, StorageKey::Totals),
            storage_accounts: LookupMap::new(StorageKey::StorageAccounts),
            account_storage_usage: 0,
        };
        // Native and wNEAR totals exist from the start, so crediting them
        // never grows storage.
        this.ledger.track(Asset::Native);
        this.ledger.track(Asset::Wrapped);
        this.measure_account_storage_usage();
        this
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
