// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::blockchain::ChainError;
use crate::tokens::TokenError;

/// HTTP error rendered as `{"error", "error_code", ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error_code: &'static str,
    /// Debug rendering of the underlying error, outside production only
    pub details: Option<String>,
    /// Extra top-level fields merged into the body
    pub context: Map<String, Value>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(flatten)]
    context: Map<String, Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error_code,
            details: None,
            context: Map::new(),
        }
    }

    /// Missing or invalid request field.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn forbidden(error_code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, error_code, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_context(mut self, key: &str, value: Value) -> Self {
        self.context.insert(key.to_string(), value);
        self
    }

    /// Map a façade error. `expose_details` attaches the error's debug
    /// rendering.
    pub fn from_token_error(err: &TokenError, expose_details: bool) -> Self {
        let error = match err {
            TokenError::InvalidTokenType(_) => Self::bad_request(err.to_string()),
            TokenError::DeployerKeyMissing => Self::internal(err.to_string()),
            TokenError::Chain(chain) => Self::from_chain_error(chain),
        };
        if expose_details {
            error.with_details(format!("{err:?}"))
        } else {
            error
        }
    }

    fn from_chain_error(err: &ChainError) -> Self {
        let message = err.to_string();
        match err {
            ChainError::MalformedKey(_) => {
                Self::new(StatusCode::BAD_REQUEST, "malformed_key", message)
            }
            ChainError::InvalidAddress(_) => Self::bad_request(message),
            ChainError::AccountNotFound(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "account_not_found", message)
            }
            e if e.is_submission_error() => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "submission_failed", message)
            }
            _ => Self::internal(message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_json", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.error_code,
            details: self.details,
            context: self.context,
        });
        (self.status, body).into_response()
    }
}
