// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use axum_server::{tls_rustls::RustlsConfig, Handle};

use token_factory_gateway::{
    api::router,
    blockchain::ClientPool,
    config::{AppConfig, CLIENT_POOL_CAPACITY},
    logging,
    state::AppState,
    tokens::TokenFactory,
};

/// How long in-flight requests get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(config.log_format) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install rustls crypto provider")?;

    if config.allow_request_keys {
        tracing::warn!(
            "Private keys are accepted in request bodies; set ALLOW_REQUEST_KEYS=false to disable"
        );
        if config.tls.is_none() {
            tracing::warn!("Serving plain HTTP; request keys travel unencrypted");
        }
    }
    if config.deployer.is_none() {
        tracing::warn!("DEPLOYER_PRIVATE_KEY is not set; claims and deployer registration are unavailable");
    }

    let pool = ClientPool::http(CLIENT_POOL_CAPACITY, config.rpc_settings());
    let tokens = TokenFactory::new(config.factory_config(), pool);

    if config.initialize_on_startup {
        let admin = tokens.deployer()?;
        tracing::info!(admin = %admin.address(), "Initializing token factory");
        let result = tokens.initialize(&admin).await?;
        tracing::info!(tx_hash = %result.tx_hash, "Token factory initialized");
    }

    let addr = config.bind_addr;
    let tls = config.tls.clone();
    tracing::info!(
        env = %config.app_env,
        rpc_url = %config.rpc_url,
        factory = %config.factory_address,
        "Configuration loaded"
    );

    let app = router(AppState::new(config, tokens));

    let handle = Handle::<SocketAddr>::new();
    tokio::spawn(shutdown_on_signal(handle.clone()));

    match tls {
        Some(paths) => {
            let tls_config = RustlsConfig::from_pem_file(&paths.cert, &paths.key).await?;
            tracing::info!(%addr, "Token factory gateway listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!(%addr, "Token factory gateway listening on http (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_on_signal(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_handle_serves_socket_addrs() {
        let handle = Handle::<SocketAddr>::new();
        handle.graceful_shutdown(Some(Duration::ZERO));
        assert_eq!(handle.connection_count(), 0);
    }
}
