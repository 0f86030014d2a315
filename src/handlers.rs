// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact admission service.
//!
//! Submissions are admitted by the pipeline and handed to the configured
//! sink. Rejections never expose backend details.

use crate::config::Config;
use crate::delivery::ContactSink;
use crate::identity::ClientIdentity;
use crate::metrics::AdmissionMetrics;
use crate::pipeline::{AdmissionPipeline, Rejection};
use crate::submission::RawSubmission;
use crate::validator::FieldViolation;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Shared application state.
pub struct AppState {
    pub pipeline: AdmissionPipeline,
    pub sink: Arc<dyn ContactSink>,
    pub metrics: Arc<AdmissionMetrics>,
    pub config: Config,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldViolation>,
}

impl ErrorResponse {
    fn new(error: &'static str) -> Self {
        Self {
            error,
            retry_after: None,
            details: Vec::new(),
        }
    }
}

/// Successful submission response.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub rate_limiting: bool,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Rejection::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                Json(ErrorResponse {
                    retry_after: Some(retry_after_secs),
                    ..ErrorResponse::new("Too many requests. Please try again later.")
                }),
            )
                .into_response(),
            Rejection::RateLimitUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new(
                    "Service temporarily unavailable. Please try again later.",
                )),
            )
                .into_response(),
            Rejection::Invalid(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    details: errors.violations().to_vec(),
                    ..ErrorResponse::new("Validation failed")
                }),
            )
                .into_response(),
        }
    }
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/contact", post(submit_contact));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    let mut app = app.layer(TraceLayer::new_for_http());

    if !state.config.allowed_origins.is_empty() {
        let mut origins = Vec::with_capacity(state.config.allowed_origins.len());
        for origin in &state.config.allowed_origins {
            match HeaderValue::from_str(origin) {
                Ok(value) => origins.push(value),
                Err(err) => warn!(origin = %origin, error = %err, "Ignoring unusable CORS origin"),
            }
        }
        app = app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        );
    }

    app.with_state(state)
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "contact-admission",
        version: env!("CARGO_PKG_VERSION"),
        rate_limiting: state.pipeline.rate_limiting().is_enabled(),
    })
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Admit a contact form submission and hand it off for delivery.
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    identity: ClientIdentity,
    body: Result<Json<RawSubmission>, JsonRejection>,
) -> Response {
    let raw = match body {
        Ok(Json(raw)) => raw,
        Err(rejection) => {
            warn!(client = %identity, error = %rejection, "Malformed submission body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Invalid request body")),
            )
                .into_response();
        }
    };

    let admitted = match state.pipeline.admit(&identity, &raw).await {
        Ok(admitted) => admitted,
        Err(rejection) => return rejection.into_response(),
    };

    if let Err(err) = state.sink.deliver(&admitted.payload).await {
        error!(client = %identity, error = %err, "Delivery failed");
        return (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::new(
                "Failed to send message. Please try again later.",
            )),
        )
            .into_response();
    }

    let mut response = (
        StatusCode::OK,
        Json(SubmitResponse {
            success: true,
            message: "Message sent successfully",
        }),
    )
        .into_response();
    if let Some(remaining) = admitted.remaining {
        response
            .headers_mut()
            .insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
    }
    response
}
