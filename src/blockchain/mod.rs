// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Move chain integration.
//!
//! This module provides:
//! - Account keys and transaction signing (`signing`)
//! - BCS/JSON transaction types (`types`)
//! - The node RPC client and its pool (`client`, `pool`)
//! - The per-account submission pipeline (`transactions`, `locks`)

pub mod client;
pub mod locks;
pub mod pool;
pub mod signing;
#[cfg(test)]
pub mod testing;
pub mod transactions;
pub mod types;

pub use client::{ChainClient, ChainError, RpcClient, RpcSettings};
pub use locks::AccountLocks;
pub use pool::ClientPool;
pub use signing::SigningIdentity;
pub use transactions::{SubmitOptions, TxBuilder, TxPipeline, TxSettings};
pub use types::*;
