//! # Internal Vault Operations
//!
//! Shared building blocks of the public entry points: crediting deposits,
//! executing withdrawals and conversions with the CEI
//! (Checks-Effects-Interactions) pattern, and the resolve callbacks that
//! finalize or roll back those cross-contract calls.
//!
//! Between a cross-contract call and its callback any other transaction may
//! run against the vault, including one from the same depositor. Every
//! outgoing path therefore debits the ledger before the promise is created.
//! The callback re-credits exactly the debited amount if the call failed.

use near_contract_standards::fungible_token::core::ext_ft_core;
use near_sdk::{
    env, ext_contract, json_types::U128, near, AccountId, Gas, NearToken, Promise, PromiseResult,
};

use crate::error::{require_positive, VaultError};
use crate::events::{VaultConvert, VaultDeposit, VaultRollback, VaultWithdraw};
use crate::ledger::Asset;
use crate::{Contract, ContractExt};

/// Gas allocation for `ft_transfer` on a token contract.
pub const GAS_FOR_FT_TRANSFER: Gas = Gas::from_tgas(30);

/// Gas allocation for `near_deposit` on the wrap contract.
pub const GAS_FOR_NEAR_DEPOSIT: Gas = Gas::from_tgas(10);

/// Gas allocation for `near_withdraw` on the wrap contract.
pub const GAS_FOR_NEAR_WITHDRAW: Gas = Gas::from_tgas(10);

/// Gas allocation for `resolve_withdraw` / `resolve_conversion`.
pub const GAS_FOR_RESOLVE: Gas = Gas::from_tgas(10);

/// Deposit required by `ft_transfer` and `near_withdraw`.
pub const ONE_YOCTO: NearToken = NearToken::from_yoctonear(1);

/// Direction of a NEAR ⇄ wNEAR conversion.
#[near(serializers = [json, borsh])]
#[serde(rename_all = "snake_case")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Conversion {
    Wrap,
    Unwrap,
}

impl Conversion {
    /// Asset debited before the conversion call.
    pub fn source(self) -> Asset {
        match self {
            Conversion::Wrap => Asset::Native,
            Conversion::Unwrap => Asset::Wrapped,
        }
    }

    /// Asset credited once the conversion is confirmed.
    pub fn target(self) -> Asset {
        match self {
            Conversion::Wrap => Asset::Wrapped,
            Conversion::Unwrap => Asset::Native,
        }
    }
}

// ============================================================================
// External Contract Interfaces
// ============================================================================

/// The canonical wNEAR contract.
#[allow(dead_code)]
#[ext_contract(ext_wrap)]
pub trait WrappedNear {
    fn near_deposit(&mut self);
    fn near_withdraw(&mut self, amount: U128) -> Promise;
}

/// Callback interface for transfer and conversion resolution.
#[allow(dead_code)]
#[ext_contract(ext_self)]
pub trait VaultResolver {
    fn resolve_withdraw(&mut self, account_id: AccountId, asset: Asset, amount: U128) -> U128;
    fn resolve_conversion(
        &mut self,
        account_id: AccountId,
        conversion: Conversion,
        amount: U128,
    ) -> U128;
}

/// Interprets the outcome of an outgoing call.
///
/// A call only counts as successful if it did not fail and did not return
/// the JSON literal `false`, which some non-standard tokens use to signal
/// a rejected transfer.
pub(crate) fn is_success(result: PromiseResult) -> bool {
    match result {
        PromiseResult::Successful(value) => {
            !matches!(serde_json::from_slice::<bool>(&value), Ok(false))
        }
        _ => false,
    }
}

// ============================================================================
// Contract Implementation
// ============================================================================

impl Contract {
    /// Maps a token contract to the ledger column that tracks it.
    ///
    /// wNEAR always lands in `Wrapped`, so the vault's wNEAR holdings back a
    /// single column whether they came from `wrap_near` or from a direct
    /// `ft_transfer_call`.
    pub fn asset_for_token(&self, token_id: AccountId) -> Asset {
        if token_id == self.wrap_token {
            Asset::Wrapped
        } else {
            Asset::Token(token_id)
        }
    }

    /// Credits an inbound transfer that the caller has already confirmed.
    ///
    /// Only registered accounts can be credited. Storage grown by the credit
    /// is charged to the account; an `InsufficientStorage` error is returned
    /// after the ledger was written, so the caller must panic on it.
    pub fn internal_deposit(
        &mut self,
        account_id: &AccountId,
        asset: &Asset,
        amount: u128,
        memo: Option<&str>,
    ) -> Result<u128, VaultError> {
        require_positive(amount)?;
        self.require_registered(account_id)?;

        let initial_storage = self.flushed_storage_usage();
        let balance = self.ledger.credit(account_id, asset, amount)?;
        self.internal_charge_storage(account_id, initial_storage)?;

        VaultDeposit {
            account_id,
            asset,
            amount: U128(amount),
            memo,
        }
        .emit();

        Ok(balance)
    }

    /// Executes a withdrawal following the CEI pattern.
    ///
    /// 1. **Checks**: positive amount, sufficient balance
    /// 2. **Effects**: debit the ledger
    /// 3. **Interactions**: native transfer or `ft_transfer`, then `resolve_withdraw`
    ///
    /// Token transfers forward one yoctoNEAR, which the public entry point
    /// collects from the caller.
    pub fn internal_withdraw(
        &mut self,
        account_id: AccountId,
        asset: Asset,
        amount: u128,
    ) -> Result<Promise, VaultError> {
        // Checks + Effects
        require_positive(amount)?;
        self.ledger.debit(&account_id, &asset, amount)?;

        // Interactions
        let transfer = match &asset {
            Asset::Native => {
                Promise::new(account_id.clone()).transfer(NearToken::from_yoctonear(amount))
            }
            Asset::Wrapped => self.ft_transfer_promise(self.wrap_token.clone(), &account_id, amount),
            Asset::Token(token_id) => {
                self.ft_transfer_promise(token_id.clone(), &account_id, amount)
            }
        };

        Ok(transfer.then(
            ext_self::ext(env::current_account_id())
                .with_static_gas(GAS_FOR_RESOLVE)
                .resolve_withdraw(account_id, asset, U128(amount)),
        ))
    }

    /// Executes a NEAR ⇄ wNEAR conversion following the CEI pattern.
    ///
    /// The target column is checked for overflow before the source is
    /// debited, so every ledger error surfaces before the external call.
    pub fn internal_convert(
        &mut self,
        account_id: AccountId,
        conversion: Conversion,
        amount: u128,
    ) -> Result<Promise, VaultError> {
        // Checks
        require_positive(amount)?;
        self.ledger
            .ensure_creditable(&account_id, &conversion.target(), amount)?;

        // Effects
        self.ledger
            .debit(&account_id, &conversion.source(), amount)?;

        // Interactions
        let wrap = ext_wrap::ext(self.wrap_token.clone());
        let call = match conversion {
            Conversion::Wrap => wrap
                .with_attached_deposit(NearToken::from_yoctonear(amount))
                .with_static_gas(GAS_FOR_NEAR_DEPOSIT)
                .near_deposit(),
            Conversion::Unwrap => wrap
                .with_attached_deposit(ONE_YOCTO)
                .with_static_gas(GAS_FOR_NEAR_WITHDRAW)
                .near_withdraw(U128(amount)),
        };

        Ok(call.then(
            ext_self::ext(env::current_account_id())
                .with_static_gas(GAS_FOR_RESOLVE)
                .resolve_conversion(account_id, conversion, U128(amount)),
        ))
    }

    fn ft_transfer_promise(
        &self,
        token_id: AccountId,
        receiver_id: &AccountId,
        amount: u128,
    ) -> Promise {
        ext_ft_core::ext(token_id)
            .with_attached_deposit(ONE_YOCTO)
            .with_static_gas(GAS_FOR_FT_TRANSFER)
            .ft_transfer(receiver_id.clone(), U128(amount), None)
    }

    /// Re-credits a debit whose external call failed.
    fn internal_restore(&mut self, account_id: &AccountId, asset: &Asset, amount: u128) {
        // The amount was debited from this very balance, so it fits.
        self.ledger
            .credit(account_id, asset, amount)
            .unwrap_or_else(|err| env::panic_str(&err.to_string()));

        let reason = VaultError::TransferFailed {
            asset: asset.clone(),
            amount,
        }
        .to_string();

        VaultRollback {
            account_id,
            asset,
            amount: U128(amount),
            reason: &reason,
        }
        .emit();
    }
}

// ============================================================================
// Resolve Callbacks
// ============================================================================

#[near]
impl Contract {
    /// Finalizes a withdrawal.
    ///
    /// Returns the amount delivered, or `0` if the transfer failed and the
    /// debit was rolled back.
    #[private]
    pub fn resolve_withdraw(&mut self, account_id: AccountId, asset: Asset, amount: U128) -> U128 {
        if is_success(env::promise_result(0)) {
            VaultWithdraw {
                account_id: &account_id,
                asset: &asset,
                amount,
            }
            .emit();
            return amount;
        }

        self.internal_restore(&account_id, &asset, amount.0);
        U128(0)
    }

    /// Finalizes a conversion by crediting its target asset, or restores the
    /// source asset if the wrap contract call failed.
    ///
    /// Returns the amount converted, or `0` on rollback.
    #[private]
    pub fn resolve_conversion(
        &mut self,
        account_id: AccountId,
        conversion: Conversion,
        amount: U128,
    ) -> U128 {
        if is_success(env::promise_result(0)) {
            // The target was checked before the call, but other deposits may
            // have filled it since. The vault then keeps the converted funds
            // and hands the source back.
            if self
                .ledger
                .credit(&account_id, &conversion.target(), amount.0)
                .is_err()
            {
                self.internal_restore(&account_id, &conversion.source(), amount.0);
                return U128(0);
            }

            let event = VaultConvert {
                account_id: &account_id,
                amount,
            };
            match conversion {
                Conversion::Wrap => event.emit_wrap(),
                Conversion::Unwrap => event.emit_unwrap(),
            }
            return amount;
        }

        self.internal_restore(&account_id, &conversion.source(), amount.0);
        U128(0)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
