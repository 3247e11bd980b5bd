//! # Vault Events
//!
//! NEP-297 event logs for ledger movements. Events are emitted as JSON logs
//! prefixed with `EVENT_JSON:`.
//!
//! ## Event Types
//!
//! - `deposit`: an asset was received and credited
//! - `withdraw`: an asset left the vault after a confirmed transfer
//! - `wrap` / `unwrap`: a confirmed NEAR ⇄ wNEAR conversion
//! - `rollback`: an outgoing transfer or conversion failed and the debit was restored
//!
//! ## Format
//!
//! ```json
//! {
//!   "standard": "multi_asset_vault",
//!   "version": "1.0.0",
//!   "event": "deposit",
//!   "data": [{ "account_id": "alice.near", "asset": "native", "amount": "1000" }]
//! }
//! ```

use near_sdk::json_types::U128;
use near_sdk::serde::Serialize;
use near_sdk::{env, AccountIdRef};

use crate::ledger::Asset;

pub const EVENT_STANDARD: &str = "multi_asset_vault";
pub const EVENT_VERSION: &str = "1.0.0";

// ============================================================================
// Event Wrapper
// ============================================================================

#[derive(Serialize, Debug)]
#[serde(crate = "near_sdk::serde")]
#[must_use = "don't forget to `.emit()` this event"]
struct VaultEventLog<'a> {
    standard: &'static str,
    version: &'static str,
    #[serde(flatten)]
    event_kind: VaultEventKind<'a>,
}

impl VaultEventLog<'_> {
    fn to_json_event_string(&self) -> String {
        let json = serde_json::to_string(self)
            .ok()
            .unwrap_or_else(|| env::abort());
        format!("EVENT_JSON:{}", json)
    }

    fn emit(self) {
        env::log_str(&self.to_json_event_string());
    }
}

#[derive(Serialize, Debug)]
#[serde(crate = "near_sdk::serde")]
#[serde(tag = "event", content = "data")]
#[serde(rename_all = "snake_case")]
enum VaultEventKind<'a> {
    Deposit(&'a [VaultDeposit<'a>]),
    Withdraw(&'a [VaultWithdraw<'a>]),
    Wrap(&'a [VaultConvert<'a>]),
    Unwrap(&'a [VaultConvert<'a>]),
    Rollback(&'a [VaultRollback<'a>]),
}

fn emit(event_kind: VaultEventKind<'_>) {
    VaultEventLog {
        standard: EVENT_STANDARD,
        version: EVENT_VERSION,
        event_kind,
    }
    .emit()
}

// ============================================================================
// Deposit
// ============================================================================

/// An asset was received and credited to `account_id`.
#[must_use]
#[derive(Serialize, Debug, Clone)]
#[serde(crate = "near_sdk::serde")]
pub struct VaultDeposit<'a> {
    pub account_id: &'a AccountIdRef,
    pub asset: &'a Asset,
    pub amount: U128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<&'a str>,
}

impl VaultDeposit<'_> {
    pub fn emit(self) {
        emit(VaultEventKind::Deposit(&[self]))
    }
}

// ============================================================================
// Withdraw
// ============================================================================

/// An asset transfer out of the vault was confirmed.
#[must_use]
#[derive(Serialize, Debug, Clone)]
#[serde(crate = "near_sdk::serde")]
pub struct VaultWithdraw<'a> {
    pub account_id: &'a AccountIdRef,
    pub asset: &'a Asset,
    pub amount: U128,
}

impl VaultWithdraw<'_> {
    pub fn emit(self) {
        emit(VaultEventKind::Withdraw(&[self]))
    }
}

// ============================================================================
// Wrap / Unwrap
// ============================================================================

/// A conversion between `Native` and `Wrapped` was confirmed.
#[must_use]
#[derive(Serialize, Debug, Clone)]
#[serde(crate = "near_sdk::serde")]
pub struct VaultConvert<'a> {
    pub account_id: &'a AccountIdRef,
    pub amount: U128,
}

impl VaultConvert<'_> {
    pub fn emit_wrap(self) {
        emit(VaultEventKind::Wrap(&[self]))
    }

    pub fn emit_unwrap(self) {
        emit(VaultEventKind::Unwrap(&[self]))
    }
}

// ============================================================================
// Rollback
// ============================================================================

/// An outgoing call failed and `amount` of `asset` was credited back.
#[must_use]
#[derive(Serialize, Debug, Clone)]
#[serde(crate = "near_sdk::serde")]
pub struct VaultRollback<'a> {
    pub account_id: &'a AccountIdRef,
    pub asset: &'a Asset,
    pub amount: U128,
    pub reason: &'a str,
}

impl VaultRollback<'_> {
    pub fn emit(self) {
        emit(VaultEventKind::Rollback(&[self]))
    }
}
