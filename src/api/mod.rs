// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    blockchain::{SubmissionResult, SubmissionStatus},
    models::{
        ClaimDetails, ClaimRequest, ClaimResponse, ClaimTransactions, CreateTokenRequest,
        CreateTokenResponse, DeployerRegisterResponse, InitRequest, RegisterKeyRequest,
        RegisterRequest, TransferRequest,
    },
    state::AppState,
    tokens::{BalanceReport, CompletedStep, PreRegistration, Step, TokenDetails},
};

pub mod extract;
pub mod health;
pub mod init;
pub mod tokens;

pub fn router(state: AppState) -> Router {
    let token_routes = Router::new()
        .route("/init", post(init::initialize))
        .route("/tokens/create", post(tokens::create_token))
        .route(
            "/tokens/balance/{token_type}/{address}",
            get(tokens::get_balance),
        )
        .route("/tokens/transfer", post(tokens::transfer))
        .route("/tokens/register", post(tokens::register))
        .route(
            "/tokens/register/{token_type}",
            get(tokens::register_deployer).post(tokens::register_with_key),
        )
        .route("/tokens/claim", post(tokens::claim));

    let prefix = state.config.api_prefix.clone();
    let tls = state.config.tls.is_some();
    let token_routes = if prefix.is_empty() {
        token_routes
    } else {
        Router::new().nest(&prefix, token_routes)
    };

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/healthcheck", get(health::health))
        .merge(token_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("no-referrer"),
                )),
        )
        .layer(CorsLayer::permissive());

    // HSTS only means something when this process terminates TLS.
    if tls {
        app.layer(SetResponseHeaderLayer::overriding(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ))
    } else {
        app
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        init::initialize,
        tokens::create_token,
        tokens::get_balance,
        tokens::transfer,
        tokens::register,
        tokens::register_with_key,
        tokens::register_deployer,
        tokens::claim
    ),
    components(
        schemas(
            health::HealthResponse,
            InitRequest,
            CreateTokenRequest,
            TransferRequest,
            RegisterRequest,
            RegisterKeyRequest,
            ClaimRequest,
            CreateTokenResponse,
            DeployerRegisterResponse,
            ClaimResponse,
            ClaimDetails,
            ClaimTransactions,
            SubmissionResult,
            SubmissionStatus,
            TokenDetails,
            PreRegistration,
            BalanceReport,
            CompletedStep,
            Step
        )
    ),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Factory", description = "Factory administration"),
        (name = "Tokens", description = "Token creation, registration, transfers and claims")
    )
)]
struct ApiDoc;
