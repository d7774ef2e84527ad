// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token factory operations.
//!
//! `TokenFactory` turns token-level requests (create, register, transfer,
//! claim, balance) into entry function calls on the factory modules and runs
//! them through the submission pipeline.

pub mod factory;
pub mod outcome;

use std::sync::Arc;

use crate::blockchain::{AccountAddress, ChainError, SigningIdentity, StructTag, TxSettings, TypeTag};

pub use factory::TokenFactory;
pub use outcome::*;

/// Errors from token factory operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("Invalid token type `{0}`: only letters, digits and underscores are allowed")]
    InvalidTokenType(String),

    #[error("No deployer key is configured")]
    DeployerKeyMissing,
}

impl TokenError {
    /// The underlying chain error, if any.
    pub fn chain(&self) -> Option<&ChainError> {
        match self {
            TokenError::Chain(e) => Some(e),
            _ => None,
        }
    }
}

/// Token type discriminator. Type `5` is the Move struct `Token5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenType(String);

impl TokenType {
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        let raw = raw.trim();
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(TokenError::InvalidTokenType(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the Move struct backing this token type.
    pub fn struct_name(&self) -> String {
        format!("Token{}", self.0)
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the factory lives and how its transactions are built.
#[derive(Clone)]
pub struct FactoryConfig {
    pub rpc_url: String,
    pub factory_address: AccountAddress,
    /// Module exposing `initialize` and `create_token`
    pub factory_module: String,
    /// Module exposing `register`, `transfer` and the `Token<N>` types
    pub token_module: String,
    pub initial_supply: u64,
    /// Amount sent by `claim`
    pub claim_amount: u64,
    pub tx: TxSettings,
    /// Identity funding claims and registering through `GET /tokens/register`
    pub deployer: Option<Arc<SigningIdentity>>,
}

impl FactoryConfig {
    /// Move type tag of `token_type`.
    pub fn token_type_tag(&self, token_type: &TokenType) -> TypeTag {
        TypeTag::struct_tag(StructTag {
            address: self.factory_address,
            module: self.token_module.clone(),
            name: token_type.struct_name(),
            type_args: vec![],
        })
    }

    /// `<factory>::<token module>::Token<N>`
    pub fn token_identifier(&self, token_type: &TokenType) -> String {
        self.token_type_tag(token_type).to_string()
    }
}

impl std::fmt::Debug for FactoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryConfig")
            .field("rpc_url", &self.rpc_url)
            .field("factory_address", &self.factory_address)
            .field("factory_module", &self.factory_module)
            .field("token_module", &self.token_module)
            .field("initial_supply", &self.initial_supply)
            .field("claim_amount", &self.claim_amount)
            .field("deployer", &self.deployer.as_ref().map(|d| d.address()))
            .finish()
    }
}
