// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Instant;

use crate::blockchain::{ChainError, SigningIdentity};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::tokens::{TokenError, TokenFactory};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenFactory>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, tokens: TokenFactory) -> Self {
        Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            started_at: Instant::now(),
        }
    }

    /// Signing identity from a key supplied in a request body.
    ///
    /// Refused with 403 when request keys are disabled.
    pub fn identity_from_request(&self, private_key: &str) -> Result<SigningIdentity, ApiError> {
        if !self.config.allow_request_keys {
            return Err(ApiError::forbidden(
                "request_keys_disabled",
                "Private keys in requests are disabled on this server",
            ));
        }
        SigningIdentity::from_hex(private_key).map_err(|e| self.chain_error(e))
    }

    /// The configured deployer identity.
    pub fn deployer(&self) -> Result<Arc<SigningIdentity>, ApiError> {
        self.tokens.deployer().map_err(|e| self.api_error(&e))
    }

    /// Map a façade error, with details outside production.
    pub fn api_error(&self, err: &TokenError) -> ApiError {
        ApiError::from_token_error(err, !self.config.is_production())
    }

    pub fn chain_error(&self, err: ChainError) -> ApiError {
        self.api_error(&TokenError::Chain(err))
    }
}
