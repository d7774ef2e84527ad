// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory chain node for tests.
//!
//! Tracks account sequence numbers, enforces them on submission, remembers
//! token registrations and serves coin balances to view calls. Failures can
//! be injected per entry function name.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::client::{ChainClient, ChainError};
use super::pool::{ClientPool, Connector};
use super::types::*;

pub const FAKE_CHAIN_ID: u8 = 4;

/// Failure to inject for an entry function.
#[derive(Debug, Clone)]
pub enum FakeFailure {
    /// Simulation reports this VM status.
    SimulationReject(String),
    /// Submission is refused with HTTP 400 and this body.
    Reject(String),
    /// Transaction executes and aborts with this VM status.
    Abort(String),
    /// Submission is refused as a stale sequence number.
    SequenceConflict,
    /// Transaction stays pending forever.
    NeverConfirm,
}

#[derive(Default)]
struct FakeState {
    accounts: HashMap<AccountAddress, u64>,
    failures: HashMap<String, FakeFailure>,
    submitted: Vec<SignedTransaction>,
    records: HashMap<String, Value>,
    registrations: HashSet<(AccountAddress, String)>,
    balances: HashMap<(String, AccountAddress), u128>,
}

#[derive(Default)]
pub struct FakeChain {
    state: Mutex<FakeState>,
    calls: AtomicUsize,
}

impl FakeChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Pool whose every endpoint resolves to this node.
    pub fn pool(self: &Arc<Self>) -> ClientPool {
        let chain = Arc::clone(self);
        let connector: Connector =
            Arc::new(move |_url: &str| Ok(Arc::clone(&chain) as Arc<dyn ChainClient>));
        ClientPool::new(4, connector)
    }

    pub fn add_account(&self, address: AccountAddress, sequence_number: u64) {
        self.state().accounts.insert(address, sequence_number);
    }

    pub fn fail_function(&self, function: &str, failure: FakeFailure) {
        self.state().failures.insert(function.to_string(), failure);
    }

    pub fn set_balance(&self, type_tag: &str, owner: AccountAddress, amount: u128) {
        self.state()
            .balances
            .insert((type_tag.to_string(), owner), amount);
    }

    pub fn submitted(&self) -> Vec<SignedTransaction> {
        self.state().submitted.clone()
    }

    pub fn submitted_functions(&self) -> Vec<String> {
        self.state()
            .submitted
            .iter()
            .map(|txn| txn.function().to_string())
            .collect()
    }

    pub fn sequence_of(&self, address: AccountAddress) -> Option<u64> {
        self.state().accounts.get(&address).copied()
    }

    /// Total number of trait calls received.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake chain state poisoned")
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn first_type_arg(txn: &SignedTransaction) -> String {
    txn.raw_txn
        .payload
        .entry_function()
        .ty_args
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn account(&self, address: AccountAddress) -> Result<Option<AccountInfo>, ChainError> {
        self.record_call();
        // Give concurrent callers a chance to interleave.
        tokio::task::yield_now().await;
        Ok(self.state().accounts.get(&address).map(|seq| AccountInfo {
            sequence_number: *seq,
            authentication_key: Some(address.to_hex()),
        }))
    }

    async fn chain_id(&self) -> Result<u8, ChainError> {
        self.record_call();
        Ok(FAKE_CHAIN_ID)
    }

    async fn simulate(&self, txn: &SignedTransaction) -> Result<Value, ChainError> {
        self.record_call();
        match self.state().failures.get(txn.function()) {
            Some(FakeFailure::SimulationReject(status)) => {
                Err(ChainError::SimulationRejected(status.clone()))
            }
            _ => Ok(json!({ "output": { "Move": { "vm_status": "Executed successfully" } } })),
        }
    }

    async fn submit(&self, txn: &SignedTransaction) -> Result<String, ChainError> {
        self.record_call();
        let mut state = self.state();
        let function = txn.function().to_string();
        let failure = state.failures.get(&function).cloned();

        match &failure {
            Some(FakeFailure::Reject(body)) => {
                return Err(ChainError::Rejected {
                    status: 400,
                    body: body.clone(),
                });
            }
            Some(FakeFailure::SequenceConflict) => {
                return Err(ChainError::Rejected {
                    status: 400,
                    body: "SEQUENCE_NUMBER_TOO_OLD".into(),
                });
            }
            _ => {}
        }

        let sender = txn.raw_txn.sender;
        let expected = state
            .accounts
            .get(&sender)
            .copied()
            .ok_or(ChainError::AccountNotFound(sender))?;
        if txn.raw_txn.sequence_number != expected {
            return Err(ChainError::Rejected {
                status: 400,
                body: format!(
                    "SEQUENCE_NUMBER_TOO_OLD: expected {expected}, got {}",
                    txn.raw_txn.sequence_number
                ),
            });
        }

        let hash = txn.committed_hash()?;
        let (status, vm_status) = match failure {
            Some(FakeFailure::Abort(vm_status)) => ("Fail", vm_status),
            Some(FakeFailure::NeverConfirm) => ("Pending", String::new()),
            _ if function == "register" => {
                let key = (sender, first_type_arg(txn));
                if state.registrations.insert(key) {
                    ("Success", "Executed successfully".to_string())
                } else {
                    ("Fail", "ECOIN_STORE_ALREADY_PUBLISHED".to_string())
                }
            }
            _ => ("Success", "Executed successfully".to_string()),
        };

        state.accounts.insert(sender, expected + 1);
        state.submitted.push(txn.clone());
        state.records.insert(
            hash.clone(),
            json!({
                "hash": hash,
                "status": status,
                "output": { "Move": { "vm_status": vm_status } }
            }),
        );
        Ok(hash)
    }

    async fn transaction(&self, hash: &str) -> Result<Option<TransactionRecord>, ChainError> {
        self.record_call();
        Ok(self
            .state()
            .records
            .get(hash)
            .cloned()
            .map(|raw| TransactionRecord::from_json(hash, raw)))
    }

    async fn view(
        &self,
        function: &str,
        type_args: &[String],
        args: &[Value],
    ) -> Result<Vec<Value>, ChainError> {
        self.record_call();
        if function != "0x1::coin::balance" {
            return Err(ChainError::Rejected {
                status: 400,
                body: format!("unknown view function {function}"),
            });
        }
        let tag = type_args.first().cloned().unwrap_or_default();
        let owner = args
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| ChainError::Decode("missing owner argument".into()))?
            .parse::<AccountAddress>()?;
        let balance = self
            .state()
            .balances
            .get(&(tag, owner))
            .copied()
            .unwrap_or(0);
        Ok(vec![Value::String(balance.to_string())])
    }
}
