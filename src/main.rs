// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Form Admission Service
//!
//! Accepts contact form submissions on `POST /contact` after rate
//! limiting, markup stripping and validation.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (a `.env` file is
//! honoured):
//!
//! - `AWS_REGION`, `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`: required
//! - `EMAIL_FROM`, `EMAIL_TO`: required; `EMAIL_FROM_NAME` optional
//! - `RECAPTCHA_SECRET_KEY`: required
//! - `UPSTASH_REDIS_REST_URL`, `UPSTASH_REDIS_REST_TOKEN`: optional; without
//!   both, rate limiting is disabled
//! - `RATE_LIMIT_BACKEND=memory`: in-process counters instead
//! - `RATE_LIMIT_MAX` (5), `RATE_LIMIT_WINDOW_SECS` (3600),
//!   `RATE_LIMIT_FAILURE_MODE` (open)
//! - `BIND_ADDR` (0.0.0.0:8080), `ALLOWED_ORIGINS`, `METRICS_ENABLED`,
//!   `METRICS_PATH`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_admission::{
    config::Config,
    delivery::LogSink,
    handlers::{router, AppState},
    limiter::RateLimiting,
    metrics::AdmissionMetrics,
    pipeline::AdmissionPipeline,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        rate_limit_max = config.rate_limit.max_requests,
        rate_limit_window_secs = config.rate_limit.window_secs,
        failure_mode = ?config.rate_limit.failure_mode,
        metrics = config.metrics.enabled,
        "Starting contact admission service"
    );

    let rate_limiting =
        RateLimiting::from_config(&config.rate_limit, config.rate_limit_backend.as_ref())?;
    if !rate_limiting.is_enabled() {
        warn!("No rate limit backend configured, rate limiting disabled");
    }

    let metrics = Arc::new(AdmissionMetrics::new()?);
    let state = Arc::new(AppState {
        pipeline: AdmissionPipeline::new(rate_limiting).with_metrics(metrics.clone()),
        sink: Arc::new(LogSink::new(&config.mail)),
        metrics,
        config: config.clone(),
    });

    // Spawn cleanup task
    if state.pipeline.rate_limiting().is_enabled() {
        let cleanup_state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                cleanup_state.pipeline.rate_limiting().cleanup().await;
            }
        });
    }

    let app = router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Contact admission service stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
