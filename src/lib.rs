// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token Factory Gateway - REST front end for a Move token factory
//!
//! This crate builds, signs and submits token factory transactions against a
//! Supra-compatible RPC node and exposes them over HTTP.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - Move chain integration (keys, BCS, RPC, submission)
//! - `tokens` - Token factory operations and their outcomes
//! - `config` - Environment configuration

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;
pub mod tokens;
