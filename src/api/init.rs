// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::api::extract::ApiJson;
use crate::blockchain::SubmissionResult;
use crate::error::ApiError;
use crate::models::{InitRequest, RequiredFields};
use crate::state::AppState;

/// Initialize the token factory module.
#[utoipa::path(
    post,
    path = "/init",
    tag = "Factory",
    request_body = InitRequest,
    responses(
        (status = 200, description = "Factory initialized", body = SubmissionResult),
        (status = 400, description = "Missing or malformed private key"),
        (status = 403, description = "Request keys are disabled"),
        (status = 500, description = "Submission failed")
    )
)]
pub async fn initialize(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<InitRequest>,
) -> Result<Json<SubmissionResult>, ApiError> {
    let mut required = RequiredFields::default();
    let Some(private_key) = required.take("privateKey", body.private_key) else {
        return Err(required.error());
    };
    let admin = state.identity_from_request(&private_key)?;

    tracing::info!(admin = %admin.address(), "Initializing token factory");
    let result = state
        .tokens
        .initialize(&admin)
        .await
        .map_err(|e| state.api_error(&e))?;
    Ok(Json(result))
}
