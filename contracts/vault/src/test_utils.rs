//! # Test Utilities
//!
//! Provides helper functions and builders for unit testing the contract.
//! These utilities simplify test setup by handling NEAR SDK context
//! initialization, storage registration and seeding ledger state.
//!
//! ## Modules
//!
//! - [`helpers`]: Low-level context setup, well-known accounts, log parsing
//! - [`builders`]: Builder pattern for flexible contract configuration

/// Helper functions for test context and callback simulation.
#[cfg(test)]
pub mod helpers {
    use near_sdk::test_utils::VMContextBuilder;
    use near_sdk::{testing_env, AccountId, NearToken, PromiseResult};

    /// Account the vault is deployed on.
    pub const VAULT: &str = "vault.test";

    /// Account of the wNEAR contract the vault is initialized with.
    pub const WRAP: &str = "wrap.test";

    /// 1 NEAR in yoctoNEAR.
    pub const ONE_NEAR: u128 = 10u128.pow(24);

    /// Storage deposit above the minimum given to accounts registered by
    /// default. Covers dozens of token entries.
    pub const STORAGE_MARGIN: u128 = ONE_NEAR / 10;

    pub fn alice() -> AccountId {
        "alice.test".parse().unwrap()
    }

    pub fn bob() -> AccountId {
        "bob.test".parse().unwrap()
    }

    /// Initializes the NEAR VM context for testing.
    ///
    /// Sets up the predecessor account and attached deposit for the
    /// subsequent contract calls. Storage from earlier contexts is kept.
    ///
    /// # Example
    ///
    /// ```ignore
    /// init_ctx("alice.test", 1); // Alice calls with 1 yoctoNEAR
    /// contract.withdraw_near(U128(100));
    /// ```
    pub fn init_ctx(predecessor: &str, deposit_yocto: u128) {
        let mut builder = VMContextBuilder::new();
        builder
            .current_account_id(VAULT.parse().unwrap())
            .predecessor_account_id(predecessor.parse().unwrap())
            .attached_deposit(NearToken::from_yoctonear(deposit_yocto));
        testing_env!(builder.build());
    }

    /// Sets up the context of a resolve callback: the vault calling itself
    /// with `result` as the outcome of the preceding promise.
    pub fn callback_ctx(result: PromiseResult) {
        let mut builder = VMContextBuilder::new();
        builder
            .current_account_id(VAULT.parse().unwrap())
            .predecessor_account_id(VAULT.parse().unwrap());
        testing_env!(
            builder.build(),
            near_sdk::test_vm_config(),
            near_sdk::RuntimeFeesConfig::test(),
            Default::default(),
            vec![result],
        );
    }

    /// Extracts the `event` names of all NEP-297 logs, in order.
    pub fn event_names(logs: &[String]) -> Vec<String> {
        logs.iter()
            .filter_map(|log| log.strip_prefix("EVENT_JSON:"))
            .map(|json| {
                let value: serde_json::Value = serde_json::from_str(json).unwrap();
                value["event"].as_str().unwrap().to_string()
            })
            .collect()
    }
}

/// Builder pattern for flexible contract configuration in tests.
#[cfg(test)]
pub mod builders {
    use crate::test_utils::helpers::{alice, bob, init_ctx, STORAGE_MARGIN, WRAP};
    use crate::{Asset, Contract};
    use near_sdk::AccountId;

    /// Builder for creating test `Contract` instances with pre-seeded balances.
    ///
    /// alice, bob and every account with a seeded balance are registered for
    /// storage with [`STORAGE_MARGIN`] above the minimum, unless registered
    /// explicitly with [`ContractBuilder::register`].
    ///
    /// # Example
    ///
    /// ```ignore
    /// let contract = ContractBuilder::new()
    ///     .native(&alice(), 1_000)
    ///     .token(&alice(), "usdc.test", 50)
    ///     .predecessor("alice.test")
    ///     .attached(1)
    ///     .build();
    /// ```
    pub struct ContractBuilder {
        wrap_token: String,
        registrations: Vec<(AccountId, u128)>,
        balances: Vec<(AccountId, Asset, u128)>,
        predecessor: String,
        attached: u128,
    }

    impl ContractBuilder {
        /// Creates a builder for a vault wrapping through [`WRAP`], called by alice.
        pub fn new() -> Self {
            Self {
                wrap_token: WRAP.to_string(),
                registrations: Vec::new(),
                balances: Vec::new(),
                predecessor: "alice.test".to_string(),
                attached: 0,
            }
        }

        /// Registers `account_id` with `margin` yoctoNEAR above the minimum
        /// storage balance.
        pub fn register(mut self, account_id: &AccountId, margin: u128) -> Self {
            self.registrations.push((account_id.clone(), margin));
            self
        }

        /// Seeds a `Native` balance.
        pub fn native(self, account_id: &AccountId, amount: u128) -> Self {
            self.balance(account_id, Asset::Native, amount)
        }

        /// Seeds a `Wrapped` balance.
        pub fn wrapped(self, account_id: &AccountId, amount: u128) -> Self {
            self.balance(account_id, Asset::Wrapped, amount)
        }

        /// Seeds a `Token` balance.
        pub fn token(self, account_id: &AccountId, token_id: &str, amount: u128) -> Self {
            self.balance(account_id, Asset::Token(token_id.parse().unwrap()), amount)
        }

        fn balance(mut self, account_id: &AccountId, asset: Asset, amount: u128) -> Self {
            self.balances.push((account_id.clone(), asset, amount));
            self
        }

        /// Sets the predecessor (caller) account for subsequent calls.
        pub fn predecessor(mut self, id: &str) -> Self {
            self.predecessor = id.to_string();
            self
        }

        /// Sets the attached deposit in yoctoNEAR.
        pub fn attached(mut self, yocto: u128) -> Self {
            self.attached = yocto;
            self
        }

        /// Builds and returns the configured `Contract` instance.
        pub fn build(self) -> Contract {
            init_ctx(&self.predecessor, self.attached);
            let mut contract = Contract::init(self.wrap_token.parse().unwrap());

            let defaults = [alice(), bob()]
                .into_iter()
                .chain(self.balances.iter().map(|(account_id, _, _)| account_id.clone()))
                .map(|account_id| (account_id, STORAGE_MARGIN));
            for (account_id, margin) in self.registrations.iter().cloned().chain(defaults) {
                if contract.require_registered(&account_id).is_err() {
                    let deposit = contract.min_storage_balance() + margin;
                    contract.internal_register(&account_id, deposit);
                }
            }

            for (account_id, asset, amount) in &self.balances {
                contract.ledger.credit(account_id, asset, *amount).unwrap();
            }
            contract
        }
    }
}
