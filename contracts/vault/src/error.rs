//! # Vault Errors
//!
//! Internal operations return `Result<_, VaultError>`. Public methods panic
//! with the error's display string through [`FunctionError::panic`], which
//! reverts all state touched by the receipt and refunds any attached deposit.

use near_sdk::{AccountId, FunctionError};
use thiserror::Error;

use crate::ledger::Asset;

#[derive(Debug, Clone, PartialEq, Eq, Error, FunctionError)]
pub enum VaultError {
    /// A debit asked for more than the stored balance.
    #[error("Insufficient {asset} balance: available {available}, requested {requested}")]
    InsufficientBalance {
        asset: Asset,
        available: u128,
        requested: u128,
    },

    /// An outgoing transfer or conversion did not succeed and was rolled back.
    #[error("Transfer of {amount} {asset} failed")]
    TransferFailed { asset: Asset, amount: u128 },

    /// A credit would exceed `u128::MAX` for a balance or an asset total.
    #[error("{asset} balance overflow")]
    Overflow { asset: Asset },

    #[error("Amount must be positive")]
    ZeroAmount,

    /// The `msg` of an `ft_on_transfer` call could not be parsed.
    #[error("Invalid ft_on_transfer message: {0}")]
    InvalidMessage(String),

    /// The account has no storage registration with the vault.
    #[error("Account {0} is not registered")]
    NotRegistered(AccountId),

    /// The account's storage deposit does not cover the state it occupies.
    #[error("Storage deposit too low: required {required}, deposited {deposited}")]
    InsufficientStorage { required: u128, deposited: u128 },
}

/// Rejects zero-amount operations.
pub(crate) fn require_positive(amount: u128) -> Result<(), VaultError> {
    if amount == 0 {
        return Err(VaultError::ZeroAmount);
    }
    Ok(())
}
