// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Results of token factory operations.
//!
//! Multi-step operations never roll back earlier steps. Their results say
//! exactly which steps landed on chain so callers can react.

use serde::Serialize;
use utoipa::ToSchema;

use crate::blockchain::{AccountAddress, SubmissionResult};

use super::TokenError;

/// Largest integer a JSON consumer using IEEE-754 doubles can hold exactly.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// One step of a multi-step operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    Register,
    Transfer,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::Register => "register",
            Step::Transfer => "transfer",
        };
        f.write_str(name)
    }
}

/// A step that was committed on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletedStep {
    pub step: Step,
    pub tx_hash: String,
}

/// Result of a multi-step operation.
#[derive(Debug)]
pub enum CompositeOutcome<T> {
    /// Every step succeeded.
    Completed(T),
    /// Some steps landed before a later one failed. They are not rolled back.
    PartiallyCompleted {
        completed_steps: Vec<CompletedStep>,
        failed_step: Step,
        cause: TokenError,
    },
    /// The first step failed; nothing landed.
    Failed { failed_step: Step, cause: TokenError },
}

impl<T> CompositeOutcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            CompositeOutcome::Completed(value) => Some(value),
            _ => None,
        }
    }
}

/// Identity of a created token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenDetails {
    /// Factory module address
    pub module_address: String,
    /// Module holding the token types
    pub module_name: String,
    /// Token type discriminator
    pub token_type: String,
    /// Fully qualified type tag, `<address>::<module>::Token<N>`
    pub token_identifier: String,
    /// Initial owner
    pub owner: String,
    pub name: String,
    pub symbol: String,
    pub initial_supply: u64,
}

/// Best-effort registration of the creator before `create_token`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PreRegistration {
    Completed {
        #[serde(rename = "txHash")]
        tx_hash: String,
    },
    /// The registration failed; usually the creator was already registered.
    Skipped { reason: String },
}

/// Result of `create`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOutcome {
    pub tx_hash: String,
    pub result: SubmissionResult,
    pub token_details: TokenDetails,
    pub pre_registration: PreRegistration,
}

/// Both transactions of a successful claim.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimReceipt {
    pub token_type: String,
    pub amount: u64,
    pub recipient: AccountAddress,
    pub register: SubmissionResult,
    pub transfer: SubmissionResult,
}

/// Token balance with its JSON precision boundary made explicit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    /// Exact balance as a decimal string
    pub balance: String,
    /// Balance as a JSON number; `null` when it exceeds 2^53 - 1
    pub balance_number: Option<u64>,
    /// Whether the balance is beyond the exactly representable range
    pub exceeds_safe_integer: bool,
    pub token_identifier: String,
    pub address: String,
}

impl BalanceReport {
    pub fn new(raw: u128, token_identifier: String, address: AccountAddress) -> Self {
        let balance_number = u64::try_from(raw)
            .ok()
            .filter(|value| *value <= MAX_SAFE_INTEGER);
        Self {
            balance: raw.to_string(),
            balance_number,
            exceeds_safe_integer: balance_number.is_none(),
            token_identifier,
            address: address.to_hex(),
        }
    }
}
