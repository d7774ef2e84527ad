// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. Field names are camelCase
//! on the wire.
//!
//! Request fields are all optional at the serde level so that a missing
//! field produces a `validation_error` naming it, instead of a generic JSON
//! rejection. Handlers collect required fields with [`RequiredFields`]
//! before touching the chain.
//!
//! ## Model Categories
//!
//! - **Inputs**: token types and amounts accepted as strings or numbers
//! - **Requests**: one body per mutating route
//! - **Responses**: create, register and claim results

use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::blockchain::SubmissionResult;
use crate::error::ApiError;
use crate::tokens::{
    ClaimReceipt, CreateOutcome, PreRegistration, TokenDetails, TokenError, TokenType,
};

// =============================================================================
// Inputs
// =============================================================================

/// Token type discriminator, as a JSON string or number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TokenTypeInput {
    Number(u64),
    Text(String),
}

impl TokenTypeInput {
    pub fn parse(&self) -> Result<TokenType, TokenError> {
        match self {
            TokenTypeInput::Number(n) => TokenType::parse(&n.to_string()),
            TokenTypeInput::Text(s) => TokenType::parse(s),
        }
    }
}

/// Token amount, as a JSON number or a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum AmountInput {
    Number(u64),
    Text(String),
}

impl AmountInput {
    pub fn parse(&self) -> Result<u64, ApiError> {
        match self {
            AmountInput::Number(n) => Ok(*n),
            AmountInput::Text(s) => s.trim().parse().map_err(|_| {
                ApiError::bad_request(format!(
                    "amount must be a non-negative integer below 2^64, got `{s}`"
                ))
            }),
        }
    }
}

/// Whether a supplied value counts as present.
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Presence for TokenTypeInput {
    fn is_present(&self) -> bool {
        match self {
            TokenTypeInput::Number(_) => true,
            TokenTypeInput::Text(s) => s.is_present(),
        }
    }
}

impl Presence for AmountInput {
    fn is_present(&self) -> bool {
        match self {
            AmountInput::Number(_) => true,
            AmountInput::Text(s) => s.is_present(),
        }
    }
}

/// Collects the names of missing required fields.
///
/// ```rust,ignore
/// let mut required = RequiredFields::default();
/// let (Some(key), Some(tt)) = (
///     required.take("privateKey", body.private_key),
///     required.take("tokenType", body.token_type),
/// ) else {
///     return Err(required.error());
/// };
/// ```
#[derive(Debug, Default)]
pub struct RequiredFields {
    missing: Vec<&'static str>,
}

impl RequiredFields {
    pub fn take<T: Presence>(&mut self, name: &'static str, value: Option<T>) -> Option<T> {
        let value = value.filter(Presence::is_present);
        if value.is_none() {
            self.missing.push(name);
        }
        value
    }

    pub fn missing(&self) -> &[&'static str] {
        &self.missing
    }

    pub fn error(&self) -> ApiError {
        ApiError::bad_request(format!(
            "Missing required fields: {}",
            self.missing.join(", ")
        ))
        .with_context("missingFields", json!(self.missing))
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /init`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitRequest {
    /// Hex Ed25519 private key of the factory admin
    pub private_key: Option<String>,
}

/// Body of `POST /tokens/create`.
///
/// With `tokenOwnerPrivateKey`, that account creates the token and owns it.
/// With only `tokenOwner`, the deployer creates the token on its behalf.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenRequest {
    #[serde(alias = "privateKey")]
    pub token_owner_private_key: Option<String>,
    /// Owner address; defaults to the creator
    pub token_owner: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    #[serde(alias = "tokenNumber")]
    #[schema(value_type = Option<String>, example = "5")]
    pub token_type: Option<TokenTypeInput>,
}

/// Body of `POST /tokens/transfer`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[serde(alias = "fromPrivateKey")]
    pub private_key: Option<String>,
    #[serde(alias = "tokenNumber")]
    #[schema(value_type = Option<String>, example = "5")]
    pub token_type: Option<TokenTypeInput>,
    /// Recipient address
    #[serde(alias = "toAddress")]
    pub recipient: Option<String>,
    #[schema(value_type = Option<String>, example = "100")]
    pub amount: Option<AmountInput>,
}

/// Body of `POST /tokens/register`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub private_key: Option<String>,
    #[serde(alias = "tokenNumber")]
    #[schema(value_type = Option<String>, example = "5")]
    pub token_type: Option<TokenTypeInput>,
}

/// Body of `POST /tokens/register/{tokenType}`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterKeyRequest {
    pub private_key: Option<String>,
}

/// Body of `POST /tokens/claim`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub user_private_key: Option<String>,
    #[serde(alias = "tokenNumber")]
    #[schema(value_type = Option<String>, example = "5")]
    pub token_type: Option<TokenTypeInput>,
}

// =============================================================================
// Responses
// =============================================================================

/// Result of `POST /tokens/create`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenResponse {
    pub tx_hash: String,
    pub result: SubmissionResult,
    pub token_details: TokenDetails,
    pub pre_registration: PreRegistration,
}

impl From<CreateOutcome> for CreateTokenResponse {
    fn from(outcome: CreateOutcome) -> Self {
        Self {
            tx_hash: outcome.tx_hash,
            result: outcome.result,
            token_details: outcome.token_details,
            pre_registration: outcome.pre_registration,
        }
    }
}

/// Result of `GET /tokens/register/{tokenType}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeployerRegisterResponse {
    pub result: bool,
    pub tx_hash: String,
}

/// Hashes of both claim transactions.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClaimTransactions {
    pub register: String,
    pub transfer: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimDetails {
    pub token_type: String,
    pub amount: u64,
    pub recipient: String,
    pub transactions: ClaimTransactions,
}

/// Result of a completed `POST /tokens/claim`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClaimResponse {
    pub success: bool,
    pub message: String,
    pub details: ClaimDetails,
}

impl From<ClaimReceipt> for ClaimResponse {
    fn from(receipt: ClaimReceipt) -> Self {
        Self {
            success: true,
            message: format!(
                "Claimed {} tokens of type {}",
                receipt.amount, receipt.token_type
            ),
            details: ClaimDetails {
                token_type: receipt.token_type,
                amount: receipt.amount,
                recipient: receipt.recipient.to_hex(),
                transactions: ClaimTransactions {
                    register: receipt.register.tx_hash,
                    transfer: receipt.transfer.tx_hash,
                },
            },
        }
    }
}
