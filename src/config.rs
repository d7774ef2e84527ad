// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, their defaults, and the
//! `AppConfig` loaded from them once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind IP, v4 or v6 | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `APP_ENV` | Deployment environment | `development` |
//! | `API_PREFIX` | Path prefix for token routes | empty |
//! | `SUPRA_RPC_URL` | Chain RPC endpoint | `https://rpc-testnet.supra.com` |
//! | `FACTORY_ADDRESS` | Account holding the factory modules | testnet factory |
//! | `FACTORY_MODULE` | Module with `initialize` / `create_token` | `token_factory_gamma_testing_eight` |
//! | `TOKEN_MODULE` | Module with `register` / `transfer` | `custom_token_testing_twelve` |
//! | `DEPLOYER_PRIVATE_KEY` | Hex Ed25519 key funding claims | Optional |
//! | `INITIAL_SUPPLY` | Supply minted by `create_token` | `1000000` |
//! | `CLAIM_AMOUNT` | Amount sent by a claim | `1000` |
//! | `MAX_GAS_AMOUNT` | Gas limit per transaction | `1000000` |
//! | `GAS_UNIT_PRICE` | Gas unit price | `100` |
//! | `TX_EXPIRATION_SECS` | Transaction validity window | `600` |
//! | `TX_CONFIRMATION_TIMEOUT_SECS` | How long to wait for confirmation | `60` |
//! | `TX_POLL_INTERVAL_MS` | Delay between confirmation polls | `500` |
//! | `RPC_TIMEOUT_SECS` | Timeout of a single RPC request | `30` |
//! | `CHAIN_ID` | Chain id; fetched from the node when unset | Optional |
//! | `ALLOW_REQUEST_KEYS` | Accept private keys in request bodies | `false` in production, else `true` |
//! | `INITIALIZE_ON_STARTUP` | Initialize the factory before serving | `false` |
//! | `TLS_CERT_PATH` | PEM certificate chain; enables HTTPS | Optional |
//! | `TLS_KEY_PATH` | PEM private key; required with the certificate | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::{AccountAddress, RpcSettings, SigningIdentity, TxSettings};
use crate::tokens::FactoryConfig;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const APP_ENV_ENV: &str = "APP_ENV";
pub const API_PREFIX_ENV: &str = "API_PREFIX";
pub const RPC_URL_ENV: &str = "SUPRA_RPC_URL";
pub const FACTORY_ADDRESS_ENV: &str = "FACTORY_ADDRESS";
pub const FACTORY_MODULE_ENV: &str = "FACTORY_MODULE";
pub const TOKEN_MODULE_ENV: &str = "TOKEN_MODULE";

/// Hex-encoded Ed25519 private key of the deployer account.
///
/// Never logged. Without it, claims, deployer registration and startup
/// initialization are unavailable.
pub const DEPLOYER_PRIVATE_KEY_ENV: &str = "DEPLOYER_PRIVATE_KEY";

pub const INITIAL_SUPPLY_ENV: &str = "INITIAL_SUPPLY";
pub const CLAIM_AMOUNT_ENV: &str = "CLAIM_AMOUNT";
pub const MAX_GAS_AMOUNT_ENV: &str = "MAX_GAS_AMOUNT";
pub const GAS_UNIT_PRICE_ENV: &str = "GAS_UNIT_PRICE";
pub const TX_EXPIRATION_SECS_ENV: &str = "TX_EXPIRATION_SECS";
pub const TX_CONFIRMATION_TIMEOUT_SECS_ENV: &str = "TX_CONFIRMATION_TIMEOUT_SECS";
pub const TX_POLL_INTERVAL_MS_ENV: &str = "TX_POLL_INTERVAL_MS";
pub const RPC_TIMEOUT_SECS_ENV: &str = "RPC_TIMEOUT_SECS";
pub const CHAIN_ID_ENV: &str = "CHAIN_ID";

/// Whether request bodies may carry private keys.
///
/// Keys sent over the network are exposed to every hop that terminates the
/// connection. Disabled by default in production.
pub const ALLOW_REQUEST_KEYS_ENV: &str = "ALLOW_REQUEST_KEYS";

pub const INITIALIZE_ON_STARTUP_ENV: &str = "INITIALIZE_ON_STARTUP";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_APP_ENV: &str = "development";
pub const DEFAULT_RPC_URL: &str = "https://rpc-testnet.supra.com";
pub const DEFAULT_FACTORY_ADDRESS: &str =
    "0x335faef3a35932c83b5a2f7cff5edee7a9ff38bcb5c1ad6dc176e43ebd9af471";
pub const DEFAULT_FACTORY_MODULE: &str = "token_factory_gamma_testing_eight";
pub const DEFAULT_TOKEN_MODULE: &str = "custom_token_testing_twelve";
pub const DEFAULT_INITIAL_SUPPLY: u64 = 1_000_000;
pub const DEFAULT_CLAIM_AMOUNT: u64 = 1_000;
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

/// Number of RPC endpoints whose clients are kept alive.
pub const CLIENT_POOL_CAPACITY: usize = 8;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("expected `json` or `pretty`, got `{other}`")),
        }
    }
}

/// Certificate and key for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Configuration errors. Any of these aborts startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    IncompleteTls,
}

/// Application configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub app_env: String,
    /// Normalized to `""` or `/segment[/segment...]`
    pub api_prefix: String,
    pub rpc_url: String,
    pub factory_address: AccountAddress,
    pub factory_module: String,
    pub token_module: String,
    pub deployer: Option<Arc<SigningIdentity>>,
    pub initial_supply: u64,
    pub claim_amount: u64,
    pub tx: TxSettings,
    pub rpc_timeout: Duration,
    pub chain_id: Option<u8>,
    pub allow_request_keys: bool,
    pub initialize_on_startup: bool,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let host = env.string(HOST_ENV, DEFAULT_HOST);
        let port: u16 = env.parse(PORT_ENV)?.unwrap_or(DEFAULT_PORT);
        let ip: IpAddr = host.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                var: HOST_ENV,
                value: host.clone(),
                reason: e.to_string(),
            }
        })?;
        let bind_addr = SocketAddr::new(ip, port);

        let app_env = env.string(APP_ENV_ENV, DEFAULT_APP_ENV);
        let production = app_env.eq_ignore_ascii_case("production");

        let factory_address = env
            .string(FACTORY_ADDRESS_ENV, DEFAULT_FACTORY_ADDRESS)
            .parse::<AccountAddress>()
            .map_err(|e| ConfigError::Invalid {
                var: FACTORY_ADDRESS_ENV,
                value: env.string(FACTORY_ADDRESS_ENV, DEFAULT_FACTORY_ADDRESS),
                reason: e.to_string(),
            })?;

        let deployer = match env.get(DEPLOYER_PRIVATE_KEY_ENV) {
            Some(raw) => Some(Arc::new(SigningIdentity::from_hex(&raw).map_err(|e| {
                ConfigError::Invalid {
                    var: DEPLOYER_PRIVATE_KEY_ENV,
                    value: "<redacted>".into(),
                    reason: e.to_string(),
                }
            })?)),
            None => None,
        };

        let defaults = TxSettings::default();
        let tx = TxSettings {
            max_gas_amount: env.parse(MAX_GAS_AMOUNT_ENV)?.unwrap_or(defaults.max_gas_amount),
            gas_unit_price: env.parse(GAS_UNIT_PRICE_ENV)?.unwrap_or(defaults.gas_unit_price),
            expiration: env
                .parse(TX_EXPIRATION_SECS_ENV)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.expiration),
            confirmation_timeout: env
                .parse(TX_CONFIRMATION_TIMEOUT_SECS_ENV)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.confirmation_timeout),
            poll_interval: env
                .parse(TX_POLL_INTERVAL_MS_ENV)?
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
        };

        let tls = match (env.get(TLS_CERT_PATH_ENV), env.get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        let log_format = match env.get(LOG_FORMAT_ENV) {
            Some(raw) => raw.parse::<LogFormat>().map_err(|reason| ConfigError::Invalid {
                var: LOG_FORMAT_ENV,
                value: raw.clone(),
                reason,
            })?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            bind_addr,
            api_prefix: normalize_prefix(&env.string(API_PREFIX_ENV, "")),
            app_env,
            rpc_url: env.string(RPC_URL_ENV, DEFAULT_RPC_URL),
            factory_address,
            factory_module: env.string(FACTORY_MODULE_ENV, DEFAULT_FACTORY_MODULE),
            token_module: env.string(TOKEN_MODULE_ENV, DEFAULT_TOKEN_MODULE),
            deployer,
            initial_supply: env.parse(INITIAL_SUPPLY_ENV)?.unwrap_or(DEFAULT_INITIAL_SUPPLY),
            claim_amount: env.parse(CLAIM_AMOUNT_ENV)?.unwrap_or(DEFAULT_CLAIM_AMOUNT),
            tx,
            rpc_timeout: Duration::from_secs(
                env.parse(RPC_TIMEOUT_SECS_ENV)?
                    .unwrap_or(DEFAULT_RPC_TIMEOUT_SECS),
            ),
            chain_id: env.parse(CHAIN_ID_ENV)?,
            allow_request_keys: env.flag(ALLOW_REQUEST_KEYS_ENV)?.unwrap_or(!production),
            initialize_on_startup: env.flag(INITIALIZE_ON_STARTUP_ENV)?.unwrap_or(false),
            tls,
            log_format,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn factory_config(&self) -> FactoryConfig {
        FactoryConfig {
            rpc_url: self.rpc_url.clone(),
            factory_address: self.factory_address,
            factory_module: self.factory_module.clone(),
            token_module: self.token_module.clone(),
            initial_supply: self.initial_supply,
            claim_amount: self.claim_amount,
            tx: self.tx.clone(),
            deployer: self.deployer.clone(),
        }
    }

    pub fn rpc_settings(&self) -> RpcSettings {
        RpcSettings {
            timeout: self.rpc_timeout,
            chain_id: self.chain_id,
        }
    }
}

/// Typed access to a variable lookup.
struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(name)
            .map(|raw| {
                raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                    var: name,
                    value: raw.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    fn flag(&self, name: &'static str) -> Result<Option<bool>, ConfigError> {
        self.get(name)
            .map(|raw| match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::Invalid {
                    var: name,
                    value: raw.clone(),
                    reason: "expected true or false".into(),
                }),
            })
            .transpose()
    }
}

/// `"api/v1/"` → `"/api/v1"`, `"/"` → `""`.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.app_env, "development");
        assert_eq!(config.api_prefix, "");
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.factory_address.to_hex(), DEFAULT_FACTORY_ADDRESS);
        assert_eq!(config.token_module, "custom_token_testing_twelve");
        assert_eq!(config.initial_supply, 1_000_000);
        assert_eq!(config.claim_amount, 1_000);
        assert_eq!(config.tx.max_gas_amount, 1_000_000);
        assert_eq!(config.tx.gas_unit_price, 100);
        assert_eq!(config.rpc_timeout, Duration::from_secs(30));
        assert!(config.deployer.is_none());
        assert!(config.chain_id.is_none());
        assert!(config.allow_request_keys);
        assert!(!config.initialize_on_startup);
        assert!(config.tls.is_none());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn production_disables_request_keys_by_default() {
        let config = load(&[("APP_ENV", "production")]).unwrap();
        assert!(config.is_production());
        assert!(!config.allow_request_keys);

        let config = load(&[("APP_ENV", "production"), ("ALLOW_REQUEST_KEYS", "true")]).unwrap();
        assert!(config.allow_request_keys);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "3000"),
            ("API_PREFIX", "api/v1/"),
            ("CLAIM_AMOUNT", "25"),
            ("TX_POLL_INTERVAL_MS", "50"),
            ("CHAIN_ID", "6"),
            ("LOG_FORMAT", "JSON"),
            ("DEPLOYER_PRIVATE_KEY", &"11".repeat(32)),
        ])
        .unwrap();

        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.api_prefix, "/api/v1");
        assert_eq!(config.claim_amount, 25);
        assert_eq!(config.tx.poll_interval, Duration::from_millis(50));
        assert_eq!(config.rpc_settings().chain_id, Some(6));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.factory_config().deployer.map(|d| d.address()),
            Some(SigningIdentity::from_bytes(&[0x11; 32]).address())
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            load(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));
        assert!(matches!(
            load(&[("ALLOW_REQUEST_KEYS", "maybe")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            load(&[("FACTORY_ADDRESS", "0xzz")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            load(&[("TLS_CERT_PATH", "/tmp/cert.pem")]),
            Err(ConfigError::IncompleteTls)
        ));
    }

    #[test]
    fn ipv6_hosts_bind() {
        let config = load(&[("HOST", "::"), ("PORT", "9000")]).unwrap();
        assert_eq!(config.bind_addr, "[::]:9000".parse().unwrap());

        let config = load(&[("HOST", "::1")]).unwrap();
        assert_eq!(config.bind_addr, "[::1]:8080".parse().unwrap());

        assert!(matches!(
            load(&[("HOST", "localhost:80")]),
            Err(ConfigError::Invalid { var: "HOST", .. })
        ));
    }

    #[test]
    fn malformed_deployer_key_is_redacted() {
        let err = load(&[("DEPLOYER_PRIVATE_KEY", "abcd")]).unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("DEPLOYER_PRIVATE_KEY"));
        assert!(!rendered.contains("abcd"));
    }

    #[test]
    fn prefix_normalization() {
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix("  "), "");
        assert_eq!(normalize_prefix("/api"), "/api");
        assert_eq!(normalize_prefix("api/v1/"), "/api/v1");
    }
}
