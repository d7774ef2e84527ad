// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction building and submission.
//!
//! Every submission follows the same pipeline:
//!
//! 1. lock the sender account
//! 2. fetch its sequence number from the node
//! 3. build the raw transaction
//! 4. simulate (optional)
//! 5. sign and submit
//! 6. poll until the node reports a terminal status (optional)
//!
//! Nothing is retried. A confirmation timeout is ambiguous: the transaction
//! may still be committed after the caller has given up on it.

use std::time::Duration;

use tokio::time::Instant;

use super::client::{ChainClient, ChainError};
use super::locks::AccountLocks;
use super::signing::SigningIdentity;
use super::types::*;

/// Gas and timing parameters applied to every transaction.
#[derive(Debug, Clone)]
pub struct TxSettings {
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    /// How long a transaction stays valid after it is built
    pub expiration: Duration,
    /// How long to wait for a terminal status after submission
    pub confirmation_timeout: Duration,
    /// Delay between status polls
    pub poll_interval: Duration,
}

impl Default for TxSettings {
    fn default() -> Self {
        Self {
            max_gas_amount: 1_000_000,
            gas_unit_price: 100,
            expiration: Duration::from_secs(600),
            confirmation_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Per-submission switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOptions {
    pub wait_for_confirmation: bool,
    pub simulate_first: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            wait_for_confirmation: true,
            simulate_first: true,
        }
    }
}

/// Builds raw transactions with the configured gas and expiry.
pub struct TxBuilder<'a> {
    settings: &'a TxSettings,
}

impl<'a> TxBuilder<'a> {
    pub fn new(settings: &'a TxSettings) -> Self {
        Self { settings }
    }

    /// Build a raw entry function transaction for `sender` at `sequence_number`.
    pub fn build_raw_transaction(
        &self,
        sender: AccountAddress,
        sequence_number: u64,
        chain_id: u8,
        call: EntryFunction,
    ) -> RawTransaction {
        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
        RawTransaction {
            sender,
            sequence_number,
            payload: TransactionPayload::EntryFunction(call),
            max_gas_amount: self.settings.max_gas_amount,
            gas_unit_price: self.settings.gas_unit_price,
            expiration_timestamp_secs: now.saturating_add(self.settings.expiration.as_secs()),
            chain_id,
        }
    }
}

/// Runs the submission pipeline against one chain client.
pub struct TxPipeline<'a> {
    client: &'a dyn ChainClient,
    locks: &'a AccountLocks,
    settings: &'a TxSettings,
}

impl<'a> TxPipeline<'a> {
    pub fn new(client: &'a dyn ChainClient, locks: &'a AccountLocks, settings: &'a TxSettings) -> Self {
        Self {
            client,
            locks,
            settings,
        }
    }

    /// Sign and submit `call` from `identity`.
    pub async fn submit(
        &self,
        identity: &SigningIdentity,
        call: EntryFunction,
        options: SubmitOptions,
    ) -> Result<SubmissionResult, ChainError> {
        let sender = identity.address();
        let function = call.qualified_name();

        let _guard = self.locks.lock(sender).await;

        let sequence_number = self.client.sequence_number(sender).await?;
        let chain_id = self.client.chain_id().await?;
        let raw_txn = TxBuilder::new(self.settings).build_raw_transaction(
            sender,
            sequence_number,
            chain_id,
            call,
        );

        tracing::info!(
            %sender,
            %function,
            sequence_number,
            "Submitting transaction"
        );

        let simulation = if options.simulate_first {
            let dry_run = SignedTransaction::for_simulation(raw_txn.clone(), identity.public_key());
            match self.client.simulate(&dry_run).await {
                Ok(output) => Some(output),
                Err(e) => {
                    tracing::warn!(%sender, %function, error = %e, "Simulation rejected transaction");
                    return Err(e);
                }
            }
        } else {
            None
        };

        let signed = identity.sign_transaction(raw_txn)?;
        let tx_hash = self.client.submit(&signed).await.map_err(|e| {
            tracing::warn!(%sender, %function, error = %e, "Submission failed");
            e
        })?;

        if !options.wait_for_confirmation {
            tracing::info!(%sender, %function, %tx_hash, "Transaction submitted");
            return Ok(SubmissionResult {
                tx_hash,
                status: SubmissionStatus::Pending,
                sequence_number,
                vm_status: None,
                simulation,
                transaction: None,
            });
        }

        let record = self.wait_for_transaction(&tx_hash).await?;
        match record.status {
            ChainTxStatus::Success => {
                tracing::info!(%sender, %function, %tx_hash, "Transaction confirmed");
                Ok(SubmissionResult {
                    tx_hash,
                    status: SubmissionStatus::Success,
                    sequence_number,
                    vm_status: record.vm_status,
                    simulation,
                    transaction: Some(record.raw),
                })
            }
            status => {
                let vm_status = record
                    .vm_status
                    .unwrap_or_else(|| format!("{status:?}"));
                tracing::warn!(%sender, %function, %tx_hash, %vm_status, "Transaction failed on chain");
                Err(ChainError::Aborted {
                    hash: tx_hash,
                    vm_status,
                })
            }
        }
    }

    /// Poll the node until `hash` reaches a terminal status or the
    /// confirmation timeout expires.
    pub async fn wait_for_transaction(&self, hash: &str) -> Result<TransactionRecord, ChainError> {
        let deadline = Instant::now() + self.settings.confirmation_timeout;

        loop {
            match self.client.transaction(hash).await {
                Ok(Some(record)) if record.status.is_terminal() => return Ok(record),
                Ok(_) => {}
                // Lookups are reads; keep polling until the deadline.
                Err(ChainError::Transport(e)) => {
                    tracing::debug!(%hash, error = %e, "Transaction lookup failed");
                }
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Err(ChainError::ConfirmationTimeout(hash.to_string()));
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}
