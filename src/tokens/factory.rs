// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token factory façade.

use std::sync::Arc;

use serde_json::Value;

use crate::blockchain::{
    bcs_arg, AccountAddress, AccountLocks, ChainClient, ChainError, ClientPool, EntryFunction,
    SigningIdentity, SubmissionResult, SubmitOptions, TxPipeline,
};

use super::outcome::*;
use super::{FactoryConfig, TokenError, TokenType};

const COIN_BALANCE_VIEW: &str = "0x1::coin::balance";

/// Token type the creator is registered for before `create_token`.
const DEFAULT_TOKEN_TYPE: &str = "0";

/// Token operations against the configured factory.
pub struct TokenFactory {
    config: FactoryConfig,
    pool: ClientPool,
    locks: AccountLocks,
}

impl TokenFactory {
    pub fn new(config: FactoryConfig, pool: ClientPool) -> Self {
        Self {
            config,
            pool,
            locks: AccountLocks::new(),
        }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// The configured deployer identity.
    pub fn deployer(&self) -> Result<Arc<SigningIdentity>, TokenError> {
        self.config
            .deployer
            .clone()
            .ok_or(TokenError::DeployerKeyMissing)
    }

    pub fn token_identifier(&self, token_type: &TokenType) -> String {
        self.config.token_identifier(token_type)
    }

    /// Initialize the factory module.
    pub async fn initialize(&self, admin: &SigningIdentity) -> Result<SubmissionResult, TokenError> {
        let call = EntryFunction::new(
            self.config.factory_address,
            &self.config.factory_module,
            "initialize",
            vec![],
            vec![],
        );
        self.submit(admin, call).await
    }

    /// Create a token owned by `owner`.
    ///
    /// The creator is first registered for the default token type. That step
    /// is best effort: it usually fails because the creator is already
    /// registered, and its failure never blocks the creation itself.
    pub async fn create(
        &self,
        creator: &SigningIdentity,
        owner: AccountAddress,
        name: &str,
        symbol: &str,
        token_type: &TokenType,
    ) -> Result<CreateOutcome, TokenError> {
        let default_type = TokenType::parse(DEFAULT_TOKEN_TYPE)?;
        let pre_registration = match self.register(creator, &default_type).await {
            Ok(result) => PreRegistration::Completed {
                tx_hash: result.tx_hash,
            },
            Err(e) => {
                tracing::warn!(
                    creator = %creator.address(),
                    error = %e,
                    "Pre-registration failed, continuing with token creation"
                );
                PreRegistration::Skipped {
                    reason: e.to_string(),
                }
            }
        };

        let call = EntryFunction::new(
            self.config.factory_address,
            &self.config.factory_module,
            "create_token",
            vec![],
            vec![
                bcs_arg(&owner)?,
                bcs_arg(name)?,
                bcs_arg(symbol)?,
                bcs_arg(&self.config.initial_supply)?,
            ],
        );
        let result = self.submit(creator, call).await.inspect_err(|e| {
            tracing::error!(creator = %creator.address(), %name, %symbol, error = %e, "Token creation failed");
        })?;

        let token_details = TokenDetails {
            module_address: self.config.factory_address.to_hex(),
            module_name: self.config.token_module.clone(),
            token_type: token_type.to_string(),
            token_identifier: self.token_identifier(token_type),
            owner: owner.to_hex(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            initial_supply: self.config.initial_supply,
        };
        tracing::info!(
            tx_hash = %result.tx_hash,
            token_identifier = %token_details.token_identifier,
            "Token created"
        );

        Ok(CreateOutcome {
            tx_hash: result.tx_hash.clone(),
            result,
            token_details,
            pre_registration,
        })
    }

    /// Register `identity` to hold `token_type`.
    pub async fn register(
        &self,
        identity: &SigningIdentity,
        token_type: &TokenType,
    ) -> Result<SubmissionResult, TokenError> {
        let call = EntryFunction::new(
            self.config.factory_address,
            &self.config.token_module,
            "register",
            vec![self.config.token_type_tag(token_type)],
            vec![],
        );
        self.submit(identity, call).await
    }

    /// Transfer `amount` of `token_type` from `sender` to `recipient`.
    pub async fn transfer(
        &self,
        sender: &SigningIdentity,
        token_type: &TokenType,
        recipient: AccountAddress,
        amount: u64,
    ) -> Result<SubmissionResult, TokenError> {
        let call = EntryFunction::new(
            self.config.factory_address,
            &self.config.token_module,
            "transfer",
            vec![self.config.token_type_tag(token_type)],
            vec![bcs_arg(&recipient)?, bcs_arg(&amount)?],
        );
        self.submit(sender, call).await
    }

    /// Register `user` for `token_type`, then send them the claim amount
    /// from the deployer.
    ///
    /// # Errors
    /// Only `DeployerKeyMissing` is returned as an error. Step failures are
    /// reported through the outcome.
    pub async fn claim(
        &self,
        user: &SigningIdentity,
        token_type: &TokenType,
    ) -> Result<CompositeOutcome<ClaimReceipt>, TokenError> {
        let deployer = self.deployer()?;
        let recipient = user.address();

        let register = match self.register(user, token_type).await {
            Ok(result) => result,
            Err(cause) => {
                tracing::warn!(%recipient, %token_type, error = %cause, "Claim failed at registration");
                return Ok(CompositeOutcome::Failed {
                    failed_step: Step::Register,
                    cause,
                });
            }
        };

        let amount = self.config.claim_amount;
        match self.transfer(&deployer, token_type, recipient, amount).await {
            Ok(transfer) => {
                tracing::info!(%recipient, %token_type, amount, "Tokens claimed");
                Ok(CompositeOutcome::Completed(ClaimReceipt {
                    token_type: token_type.to_string(),
                    amount,
                    recipient,
                    register,
                    transfer,
                }))
            }
            Err(cause) => {
                tracing::error!(
                    %recipient,
                    %token_type,
                    register_tx = %register.tx_hash,
                    error = %cause,
                    "Claim registered the user but the transfer failed"
                );
                Ok(CompositeOutcome::PartiallyCompleted {
                    completed_steps: vec![CompletedStep {
                        step: Step::Register,
                        tx_hash: register.tx_hash,
                    }],
                    failed_step: Step::Transfer,
                    cause,
                })
            }
        }
    }

    /// Balance of `owner` in `token_type`.
    pub async fn get_balance(
        &self,
        token_type: &TokenType,
        owner: AccountAddress,
    ) -> Result<BalanceReport, TokenError> {
        let client = self.client()?;
        let identifier = self.token_identifier(token_type);
        let values = client
            .view(
                COIN_BALANCE_VIEW,
                std::slice::from_ref(&identifier),
                &[Value::String(owner.to_hex())],
            )
            .await?;

        let raw = values
            .first()
            .ok_or_else(|| ChainError::Decode("balance view returned no value".into()))
            .and_then(parse_balance)?;
        Ok(BalanceReport::new(raw, identifier, owner))
    }

    fn client(&self) -> Result<Arc<dyn ChainClient>, ChainError> {
        self.pool.acquire(&self.config.rpc_url)
    }

    async fn submit(
        &self,
        identity: &SigningIdentity,
        call: EntryFunction,
    ) -> Result<SubmissionResult, TokenError> {
        let client = self.client()?;
        let result = TxPipeline::new(&*client, &self.locks, &self.config.tx)
            .submit(identity, call, SubmitOptions::default())
            .await?;
        Ok(result)
    }
}

/// Balances arrive as decimal strings (u64 values can exceed JSON numbers),
/// but plain numbers are accepted too.
fn parse_balance(value: &Value) -> Result<u128, ChainError> {
    match value {
        Value::String(s) => s
            .parse()
            .map_err(|_| ChainError::Decode(format!("balance `{s}` is not an integer"))),
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| ChainError::Decode(format!("balance {n} is not an unsigned integer"))),
        other => Err(ChainError::Decode(format!("unexpected balance value {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::{FakeChain, FakeFailure};
    use crate::blockchain::{SubmissionStatus, TxSettings};
    use std::time::Duration;

    const FACTORY: &str = "0x335faef3a35932c83b5a2f7cff5edee7a9ff38bcb5c1ad6dc176e43ebd9af471";

    fn config(deployer: Option<SigningIdentity>) -> FactoryConfig {
        FactoryConfig {
            rpc_url: "http://fake-node".into(),
            factory_address: FACTORY.parse().unwrap(),
            factory_module: "token_factory_gamma_testing_eight".into(),
            token_module: "custom_token_testing_twelve".into(),
            initial_supply: 1_000_000,
            claim_amount: 1_000,
            tx: TxSettings {
                confirmation_timeout: Duration::from_millis(50),
                poll_interval: Duration::from_millis(5),
                ..TxSettings::default()
            },
            deployer: deployer.map(Arc::new),
        }
    }

    fn identity(seed: u8) -> SigningIdentity {
        SigningIdentity::from_bytes(&[seed; 32])
    }

    /// Factory backed by a fake node on which `accounts` exist.
    fn setup(accounts: &[&SigningIdentity]) -> (Arc<FakeChain>, TokenFactory) {
        let chain = FakeChain::new();
        for account in accounts {
            chain.add_account(account.address(), 0);
        }
        let deployer = identity(1);
        chain.add_account(deployer.address(), 0);
        let factory = TokenFactory::new(config(Some(deployer)), chain.pool());
        (chain, factory)
    }

    fn tt(raw: &str) -> TokenType {
        TokenType::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn create_reports_token_identifier() {
        let creator = identity(2);
        let (chain, factory) = setup(&[&creator]);

        let outcome = factory
            .create(&creator, creator.address(), "Gold", "GLD", &tt("5"))
            .await
            .unwrap();

        assert_eq!(
            outcome.token_details.token_identifier,
            format!("{FACTORY}::custom_token_testing_twelve::Token5")
        );
        assert_eq!(outcome.token_details.initial_supply, 1_000_000);
        assert!(matches!(
            outcome.pre_registration,
            PreRegistration::Completed { .. }
        ));
        assert_eq!(chain.submitted_functions(), vec!["register", "create_token"]);
    }

    #[tokio::test]
    async fn create_survives_failed_pre_registration() {
        let creator = identity(2);
        let (chain, factory) = setup(&[&creator]);
        chain.fail_function("register", FakeFailure::Abort("ECOIN_STORE_ALREADY_PUBLISHED".into()));

        let outcome = factory
            .create(&creator, identity(3).address(), "Gold", "GLD", &tt("1"))
            .await
            .unwrap();

        match outcome.pre_registration {
            PreRegistration::Skipped { reason } => {
                assert!(reason.contains("ECOIN_STORE_ALREADY_PUBLISHED"))
            }
            other => panic!("unexpected pre-registration: {other:?}"),
        }
        assert_eq!(outcome.result.status, SubmissionStatus::Success);
        assert_eq!(outcome.token_details.owner, identity(3).address().to_hex());
    }

    #[tokio::test]
    async fn create_fails_when_create_token_fails() {
        let creator = identity(2);
        let (chain, factory) = setup(&[&creator]);
        chain.fail_function("create_token", FakeFailure::Reject("bad args".into()));

        let err = factory
            .create(&creator, creator.address(), "Gold", "GLD", &tt("1"))
            .await
            .unwrap_err();

        assert!(err.chain().is_some_and(ChainError::is_submission_error));
    }

    #[tokio::test]
    async fn register_twice_surfaces_node_answer() {
        let user = identity(2);
        let (_chain, factory) = setup(&[&user]);

        let first = factory.register(&user, &tt("3")).await.unwrap();
        assert_eq!(first.status, SubmissionStatus::Success);

        let err = factory.register(&user, &tt("3")).await.unwrap_err();
        match err {
            TokenError::Chain(ChainError::Aborted { vm_status, .. }) => {
                assert_eq!(vm_status, "ECOIN_STORE_ALREADY_PUBLISHED")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_amount_transfer_is_submitted() {
        let sender = identity(2);
        let (chain, factory) = setup(&[&sender]);

        let result = factory
            .transfer(&sender, &tt("1"), identity(3).address(), 0)
            .await
            .unwrap();

        assert_eq!(result.status, SubmissionStatus::Success);
        let submitted = chain.submitted();
        assert_eq!(submitted.len(), 1);
        let call = submitted[0].raw_txn.payload.entry_function();
        assert_eq!(call.function, "transfer");
        assert_eq!(call.args[1], bcs_arg(&0u64).unwrap());
    }

    #[tokio::test]
    async fn concurrent_transfers_use_distinct_sequence_numbers() {
        let sender = identity(2);
        let (chain, factory) = setup(&[&sender]);
        let token_type = tt("1");

        let (a, b) = tokio::join!(
            factory.transfer(&sender, &token_type, identity(3).address(), 10),
            factory.transfer(&sender, &token_type, identity(4).address(), 20),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.sequence_number, b.sequence_number);
        assert_ne!(a.tx_hash, b.tx_hash);
        assert_eq!(chain.sequence_of(sender.address()), Some(2));
    }

    #[tokio::test]
    async fn sequence_conflict_is_a_submission_error() {
        let sender = identity(2);
        let (chain, factory) = setup(&[&sender]);
        chain.fail_function("transfer", FakeFailure::SequenceConflict);

        let err = factory
            .transfer(&sender, &tt("1"), identity(3).address(), 5)
            .await
            .unwrap_err();

        assert!(err.chain().is_some_and(ChainError::is_submission_error));
        assert!(chain.submitted().is_empty());
    }

    #[tokio::test]
    async fn claim_registers_then_transfers() {
        let user = identity(2);
        let (chain, factory) = setup(&[&user]);

        let outcome = factory.claim(&user, &tt("1")).await.unwrap();
        let receipt = outcome.completed().expect("claim completes");

        assert_eq!(receipt.amount, 1_000);
        assert_eq!(receipt.recipient, user.address());
        assert_ne!(receipt.register.tx_hash, receipt.transfer.tx_hash);
        assert_eq!(chain.submitted_functions(), vec!["register", "transfer"]);
        assert_eq!(chain.submitted()[1].raw_txn.sender, identity(1).address());
    }

    #[tokio::test]
    async fn claim_reports_partial_completion() {
        let user = identity(2);
        let (chain, factory) = setup(&[&user]);
        chain.fail_function("transfer", FakeFailure::Abort("EINSUFFICIENT_BALANCE".into()));

        let outcome = factory.claim(&user, &tt("1")).await.unwrap();

        match outcome {
            CompositeOutcome::PartiallyCompleted {
                completed_steps,
                failed_step,
                ..
            } => {
                assert_eq!(failed_step, Step::Transfer);
                assert_eq!(completed_steps.len(), 1);
                assert_eq!(completed_steps[0].step, Step::Register);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn claim_fails_when_registration_fails() {
        let user = identity(2);
        let (chain, factory) = setup(&[&user]);
        chain.fail_function("register", FakeFailure::SimulationReject("EALREADY".into()));

        let outcome = factory.claim(&user, &tt("1")).await.unwrap();

        assert!(matches!(
            outcome,
            CompositeOutcome::Failed {
                failed_step: Step::Register,
                ..
            }
        ));
        assert!(chain.submitted().is_empty());
    }

    #[tokio::test]
    async fn claim_without_deployer_touches_nothing() {
        let user = identity(2);
        let chain = FakeChain::new();
        chain.add_account(user.address(), 0);
        let factory = TokenFactory::new(config(None), chain.pool());

        let err = factory.claim(&user, &tt("1")).await.unwrap_err();

        assert!(matches!(err, TokenError::DeployerKeyMissing));
        assert_eq!(chain.call_count(), 0);
    }

    #[tokio::test]
    async fn initialize_calls_factory_module() {
        let admin = identity(2);
        let (chain, factory) = setup(&[&admin]);

        factory.initialize(&admin).await.unwrap();

        let submitted = chain.submitted();
        let call = submitted[0].raw_txn.payload.entry_function();
        assert_eq!(call.module.name, "token_factory_gamma_testing_eight");
        assert_eq!(call.function, "initialize");
    }

    #[tokio::test]
    async fn balance_beyond_safe_integer_is_exact() {
        let owner = identity(2).address();
        let (chain, factory) = setup(&[]);
        let token_type = tt("7");
        chain.set_balance(&factory.token_identifier(&token_type), owner, (1u128 << 53) + 1);

        let report = factory.get_balance(&token_type, owner).await.unwrap();

        assert_eq!(report.balance, "9007199254740993");
        assert_eq!(report.balance_number, None);
        assert!(report.exceeds_safe_integer);
        assert_eq!(report.address, owner.to_hex());
    }

    #[tokio::test]
    async fn unknown_owner_has_zero_balance() {
        let (_chain, factory) = setup(&[]);
        let report = factory
            .get_balance(&tt("1"), identity(9).address())
            .await
            .unwrap();
        assert_eq!(report.balance, "0");
        assert_eq!(report.balance_number, Some(0));
    }

    #[test]
    fn parse_balance_accepts_strings_and_numbers() {
        assert_eq!(parse_balance(&Value::from("42")).unwrap(), 42);
        assert_eq!(parse_balance(&Value::from(42u64)).unwrap(), 42);
        assert!(parse_balance(&Value::from(-1)).is_err());
        assert!(parse_balance(&Value::Null).is_err());
    }
}
