// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token routes.
//!
//! Every handler validates its input fully before any chain call: required
//! fields, token type, addresses and keys, in that order.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::api::extract::ApiJson;
use crate::blockchain::{AccountAddress, SigningIdentity, SubmissionResult};
use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;
use crate::tokens::{BalanceReport, CompositeOutcome, TokenType};

fn parse_token_type(state: &AppState, input: &TokenTypeInput) -> Result<TokenType, ApiError> {
    input.parse().map_err(|e| state.api_error(&e))
}

fn parse_address(state: &AppState, raw: &str) -> Result<AccountAddress, ApiError> {
    raw.parse().map_err(|e| state.chain_error(e))
}

/// Create a new token type.
#[utoipa::path(
    post,
    path = "/tokens/create",
    tag = "Tokens",
    request_body = CreateTokenRequest,
    responses(
        (status = 200, description = "Token created", body = CreateTokenResponse),
        (status = 400, description = "Missing field, malformed key or address"),
        (status = 403, description = "Request keys are disabled"),
        (status = 500, description = "Submission failed")
    )
)]
pub async fn create_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateTokenRequest>,
) -> Result<Json<CreateTokenResponse>, ApiError> {
    let mut required = RequiredFields::default();
    let (Some(name), Some(symbol), Some(token_type)) = (
        required.take("name", body.name),
        required.take("symbol", body.symbol),
        required.take("tokenType", body.token_type),
    ) else {
        return Err(required.error());
    };
    let owner_key = body.token_owner_private_key.filter(Presence::is_present);
    let owner_address = body.token_owner.filter(Presence::is_present);
    if owner_key.is_none() && owner_address.is_none() {
        return Err(ApiError::bad_request(
            "Missing required fields: tokenOwnerPrivateKey or tokenOwner",
        )
        .with_context("missingFields", json!(["tokenOwnerPrivateKey", "tokenOwner"])));
    }

    let token_type = parse_token_type(&state, &token_type)?;
    let owner = owner_address
        .as_deref()
        .map(|raw| parse_address(&state, raw))
        .transpose()?;

    let creator: Arc<SigningIdentity> = match owner_key {
        Some(key) => Arc::new(state.identity_from_request(&key)?),
        None => state.deployer()?,
    };
    let owner = owner.unwrap_or_else(|| creator.address());

    let outcome = state
        .tokens
        .create(&creator, owner, name.trim(), symbol.trim(), &token_type)
        .await
        .map_err(|e| state.api_error(&e))?;
    Ok(Json(outcome.into()))
}

/// Balance of an address in a token type.
#[utoipa::path(
    get,
    path = "/tokens/balance/{tokenType}/{address}",
    tag = "Tokens",
    params(
        ("tokenType" = String, Path, description = "Token type discriminator"),
        ("address" = String, Path, description = "Owner address")
    ),
    responses(
        (status = 200, description = "Balance", body = BalanceReport),
        (status = 400, description = "Invalid token type or address"),
        (status = 500, description = "Node request failed")
    )
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Path((token_type, address)): Path<(String, String)>,
) -> Result<Json<BalanceReport>, ApiError> {
    let token_type = parse_token_type(&state, &TokenTypeInput::Text(token_type))?;
    let owner = parse_address(&state, &address)?;

    let report = state
        .tokens
        .get_balance(&token_type, owner)
        .await
        .map_err(|e| state.api_error(&e))?;
    Ok(Json(report))
}

/// Transfer tokens to a recipient.
#[utoipa::path(
    post,
    path = "/tokens/transfer",
    tag = "Tokens",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer confirmed", body = SubmissionResult),
        (status = 400, description = "Missing field, malformed key, address or amount"),
        (status = 403, description = "Request keys are disabled"),
        (status = 500, description = "Submission failed")
    )
)]
pub async fn transfer(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TransferRequest>,
) -> Result<Json<SubmissionResult>, ApiError> {
    let mut required = RequiredFields::default();
    let (Some(private_key), Some(token_type), Some(recipient), Some(amount)) = (
        required.take("privateKey", body.private_key),
        required.take("tokenType", body.token_type),
        required.take("recipient", body.recipient),
        required.take("amount", body.amount),
    ) else {
        return Err(required.error());
    };

    let token_type = parse_token_type(&state, &token_type)?;
    let recipient = parse_address(&state, &recipient)?;
    let amount = amount.parse()?;
    let sender = state.identity_from_request(&private_key)?;

    let result = state
        .tokens
        .transfer(&sender, &token_type, recipient, amount)
        .await
        .map_err(|e| state.api_error(&e))?;
    Ok(Json(result))
}

/// Register the key's account for a token type.
#[utoipa::path(
    post,
    path = "/tokens/register",
    tag = "Tokens",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registration confirmed", body = SubmissionResult),
        (status = 400, description = "Missing field or malformed key"),
        (status = 403, description = "Request keys are disabled"),
        (status = 500, description = "Submission failed, e.g. already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<Json<SubmissionResult>, ApiError> {
    let mut required = RequiredFields::default();
    let (Some(private_key), Some(token_type)) = (
        required.take("privateKey", body.private_key),
        required.take("tokenType", body.token_type),
    ) else {
        return Err(required.error());
    };

    register_with(&state, &private_key, &token_type).await
}

/// Register the key's account for the token type in the path.
#[utoipa::path(
    post,
    path = "/tokens/register/{tokenType}",
    tag = "Tokens",
    params(("tokenType" = String, Path, description = "Token type discriminator")),
    request_body = RegisterKeyRequest,
    responses(
        (status = 200, description = "Registration confirmed", body = SubmissionResult),
        (status = 400, description = "Missing field or malformed key"),
        (status = 403, description = "Request keys are disabled"),
        (status = 500, description = "Submission failed, e.g. already registered")
    )
)]
pub async fn register_with_key(
    State(state): State<AppState>,
    Path(token_type): Path<String>,
    ApiJson(body): ApiJson<RegisterKeyRequest>,
) -> Result<Json<SubmissionResult>, ApiError> {
    let mut required = RequiredFields::default();
    let Some(private_key) = required.take("privateKey", body.private_key) else {
        return Err(required.error());
    };

    register_with(&state, &private_key, &TokenTypeInput::Text(token_type)).await
}

async fn register_with(
    state: &AppState,
    private_key: &str,
    token_type: &TokenTypeInput,
) -> Result<Json<SubmissionResult>, ApiError> {
    let token_type = parse_token_type(state, token_type)?;
    let identity = state.identity_from_request(private_key)?;

    let result = state
        .tokens
        .register(&identity, &token_type)
        .await
        .map_err(|e| state.api_error(&e))?;
    Ok(Json(result))
}

/// Register the deployer account for a token type.
#[utoipa::path(
    get,
    path = "/tokens/register/{tokenType}",
    tag = "Tokens",
    params(("tokenType" = String, Path, description = "Token type discriminator")),
    responses(
        (status = 200, description = "Registration confirmed", body = DeployerRegisterResponse),
        (status = 500, description = "No deployer key or submission failed")
    )
)]
pub async fn register_deployer(
    State(state): State<AppState>,
    Path(token_type): Path<String>,
) -> Result<Json<DeployerRegisterResponse>, ApiError> {
    let token_type = parse_token_type(&state, &TokenTypeInput::Text(token_type))?;
    let deployer = state.deployer()?;

    let result = state
        .tokens
        .register(&deployer, &token_type)
        .await
        .map_err(|e| state.api_error(&e))?;
    Ok(Json(DeployerRegisterResponse {
        result: true,
        tx_hash: result.tx_hash,
    }))
}

/// Register the user and send them the claim amount from the deployer.
///
/// A failure after registration succeeded is reported with
/// `completedSteps`; the registration is not rolled back.
#[utoipa::path(
    post,
    path = "/tokens/claim",
    tag = "Tokens",
    request_body = ClaimRequest,
    responses(
        (status = 200, description = "Tokens claimed", body = ClaimResponse),
        (status = 400, description = "Missing field or malformed key"),
        (status = 403, description = "Request keys are disabled"),
        (status = 500, description = "A step failed; see failedStep and completedSteps")
    )
)]
pub async fn claim(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let mut required = RequiredFields::default();
    let (Some(private_key), Some(token_type)) = (
        required.take("userPrivateKey", body.user_private_key),
        required.take("tokenType", body.token_type),
    ) else {
        return Err(required.error());
    };

    let token_type = parse_token_type(&state, &token_type)?;
    let user = state.identity_from_request(&private_key)?;

    let outcome = state
        .tokens
        .claim(&user, &token_type)
        .await
        .map_err(|e| state.api_error(&e))?;

    match outcome {
        CompositeOutcome::Completed(receipt) => Ok(Json(receipt.into())),
        CompositeOutcome::Failed { failed_step, cause } => Err(state
            .api_error(&cause)
            .with_context("success", Value::Bool(false))
            .with_context("failedStep", json!(failed_step))
            .with_context("completedSteps", json!([]))),
        CompositeOutcome::PartiallyCompleted {
            completed_steps,
            failed_step,
            cause,
        } => {
            let mut error = state.api_error(&cause);
            error.error_code = "partial_failure";
            error.message = format!("Claim failed at {failed_step} after earlier steps completed: {cause}");
            Err(error
                .with_context("success", Value::Bool(false))
                .with_context("failedStep", json!(failed_step))
                .with_context("completedSteps", json!(completed_steps)))
        }
    }
}
