// Test builder pattern for integration tests
// This builder deploys the vault with its mock tokens and drives depositors through it

use near_api::near_primitives::views::FinalExecutionStatus;
use near_api::AccountId;
use near_api::{Contract, Data, NearToken, NetworkConfig};
use near_sandbox::Sandbox;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

use super::*;

pub struct TestScenarioBuilder {
    // Keeps the sandbox process alive for the scenario.
    _sandbox: Sandbox,
    network_config: NetworkConfig,
    genesis_account_id: AccountId,
    genesis_signer: Arc<Signer>,
    deployment: Option<VaultDeployment>,
    accounts: Vec<(AccountId, Arc<Signer>, String)>, // (account_id, signer, name)
}

impl TestScenarioBuilder {
    pub async fn new() -> TestResult<Self> {
        let sandbox = Sandbox::start_sandbox().await?;
        let network_config = create_network_config(&sandbox);
        let (genesis_account_id, genesis_signer) = setup_genesis_account().await;

        Ok(Self {
            _sandbox: sandbox,
            network_config,
            genesis_account_id,
            genesis_signer,
            deployment: None,
            accounts: Vec::new(),
        })
    }

    pub async fn deploy_vault(mut self) -> TestResult<Self> {
        let deployment = deploy_vault_contract(
            &self.network_config,
            &self.genesis_account_id,
            &self.genesis_signer,
        )
        .await?;
        self.deployment = Some(deployment);
        Ok(self)
    }

    /// Creates a user account and registers it with the vault.
    pub async fn create_account(self, name: &str) -> TestResult<Self> {
        let builder = self.create_unregistered_account(name).await?;
        let (account_id, signer, _) = builder.get_account(name)?;
        register_with_vault(builder.network_config(), builder.vault_id(), account_id, signer)
            .await?;
        Ok(builder)
    }

    /// Creates a user account without a vault storage registration.
    pub async fn create_unregistered_account(mut self, name: &str) -> TestResult<Self> {
        let (account_id, signer) = create_user_account(
            &self.network_config,
            &self.genesis_account_id,
            &self.genesis_signer,
            name,
        )
        .await?;

        self.accounts.push((account_id, signer, name.to_string()));
        Ok(self)
    }

    /// Registers every created account on the mock token and the mock wNEAR
    /// so they can receive withdrawals.
    pub async fn register_accounts(self) -> TestResult<Self> {
        let token_ids = [self.ft_id().clone(), self.wnear_id().clone()];
        for (account_id, _signer, _) in &self.accounts {
            for token_id in &token_ids {
                register_storage(
                    &self.network_config,
                    &self.genesis_account_id,
                    &self.genesis_signer,
                    token_id,
                    account_id,
                )
                .await?;
            }
        }
        Ok(self)
    }

    pub fn get_account(&self, name: &str) -> TestResult<&(AccountId, Arc<Signer>, String)> {
        self.accounts
            .iter()
            .find(|(_, _, n)| n == name)
            .ok_or_else(|| format!("Account {} not found", name).into())
    }

    fn deployment(&self) -> &VaultDeployment {
        self.deployment.as_ref().unwrap()
    }

    pub fn vault_contract(&self) -> Contract {
        Contract(self.vault_id().clone())
    }

    pub fn vault_id(&self) -> &AccountId {
        &self.deployment().vault_id
    }

    pub fn ft_id(&self) -> &AccountId {
        &self.deployment().ft_id
    }

    pub fn wnear_id(&self) -> &AccountId {
        &self.deployment().wnear_id
    }

    pub fn network_config(&self) -> &NetworkConfig {
        &self.network_config
    }

    pub fn genesis_account_id(&self) -> &AccountId {
        &self.genesis_account_id
    }

    pub fn genesis_signer(&self) -> &Arc<Signer> {
        &self.genesis_signer
    }
}

// Helper functions for common operations

/// Calls a vault method as `name` and returns the final execution status.
async fn call_vault(
    builder: &TestScenarioBuilder,
    name: &str,
    method: &str,
    args: Value,
    deposit: NearToken,
) -> TestResult<FinalExecutionStatus> {
    let (account_id, signer, _) = builder.get_account(name)?;

    let outcome = builder
        .vault_contract()
        .call_function(method, args)?
        .transaction()
        .deposit(deposit)
        .with_signer(account_id.clone(), signer.clone())
        .send_to(builder.network_config())
        .await?;

    // Let the resolve callback land.
    sleep(Duration::from_millis(1200)).await;

    Ok(outcome.status)
}

pub async fn deposit_near(
    builder: &TestScenarioBuilder,
    name: &str,
    amount: NearToken,
) -> TestResult<FinalExecutionStatus> {
    call_vault(builder, name, "deposit_near", json!({}), amount).await
}

pub async fn withdraw_near(
    builder: &TestScenarioBuilder,
    name: &str,
    amount: u128,
) -> TestResult<FinalExecutionStatus> {
    call_vault(
        builder,
        name,
        "withdraw_near",
        json!({ "amount": amount.to_string() }),
        NearToken::from_yoctonear(1),
    )
    .await
}

pub async fn wrap_near(
    builder: &TestScenarioBuilder,
    name: &str,
    amount: u128,
) -> TestResult<FinalExecutionStatus> {
    call_vault(
        builder,
        name,
        "wrap_near",
        json!({ "amount": amount.to_string() }),
        NearToken::from_yoctonear(0),
    )
    .await
}

pub async fn unwrap_near(
    builder: &TestScenarioBuilder,
    name: &str,
    amount: u128,
) -> TestResult<FinalExecutionStatus> {
    call_vault(
        builder,
        name,
        "unwrap_near",
        json!({ "amount": amount.to_string() }),
        NearToken::from_yoctonear(1),
    )
    .await
}

pub async fn withdraw_token(
    builder: &TestScenarioBuilder,
    name: &str,
    token_id: &AccountId,
    amount: u128,
) -> TestResult<FinalExecutionStatus> {
    call_vault(
        builder,
        name,
        "withdraw_token",
        json!({ "token_id": token_id, "amount": amount.to_string() }),
        NearToken::from_yoctonear(1),
    )
    .await
}

/// Mints `amount` mock tokens to `name` and deposits them into the vault
/// with `ft_transfer_call`.
pub async fn mint_and_deposit_token(
    builder: &TestScenarioBuilder,
    name: &str,
    amount: u128,
    msg: &str,
) -> TestResult<()> {
    let (account_id, signer, _) = builder.get_account(name)?;
    let ft_contract = Contract(builder.ft_id().clone());
    let network_config = builder.network_config();

    ft_contract
        .call_function("mint", json!({
            "account_id": account_id,
            "amount": amount.to_string()
        }))?
        .transaction()
        .with_signer(builder.genesis_account_id().clone(), builder.genesis_signer().clone())
        .send_to(network_config)
        .await?;

    ft_contract
        .call_function("ft_transfer_call", json!({
            "receiver_id": builder.vault_id(),
            "amount": amount.to_string(),
            "msg": msg
        }))?
        .transaction()
        .deposit(NearToken::from_yoctonear(1))
        .with_signer(account_id.clone(), signer.clone())
        .send_to(network_config)
        .await?;

    sleep(Duration::from_millis(1200)).await;

    Ok(())
}

/// Reads the vault balance of `name` in `asset` (JSON form of the asset).
pub async fn get_vault_balance(
    builder: &TestScenarioBuilder,
    name: &str,
    asset: Value,
) -> TestResult<u128> {
    let (account_id, _, _) = builder.get_account(name)?;

    let balance: Data<String> = builder
        .vault_contract()
        .call_function("balance_of", json!({ "account_id": account_id, "asset": asset }))?
        .read_only()
        .fetch_from(builder.network_config())
        .await?;

    Ok(balance.data.parse::<u128>()?)
}

pub async fn get_vault_total(builder: &TestScenarioBuilder, asset: Value) -> TestResult<u128> {
    let total: Data<String> = builder
        .vault_contract()
        .call_function("total_of", json!({ "asset": asset }))?
        .read_only()
        .fetch_from(builder.network_config())
        .await?;

    Ok(total.data.parse::<u128>()?)
}

/// Reads the NEP-141 balance of `account_id` on `token_id`.
pub async fn get_ft_balance(
    builder: &TestScenarioBuilder,
    token_id: &AccountId,
    account_id: &AccountId,
) -> TestResult<u128> {
    let balance: Data<String> = Contract(token_id.clone())
        .call_function("ft_balance_of", json!({ "account_id": account_id }))?
        .read_only()
        .fetch_from(builder.network_config())
        .await?;

    Ok(balance.data.parse::<u128>()?)
}
