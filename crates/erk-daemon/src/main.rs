//! erk-daemon entry point.
//!
//! Thin: loads config, sets up tracing, spawns the reconciliation driver,
//! wires middleware, and serves HTTP until Ctrl-C. Route handlers live in
//! `routes.rs`; shared state types live in `state.rs`.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use erk_config::{EngineConfig, LoadedConfig, UnusedKeyPolicy};
use erk_daemon::{addr::resolve_bind_addr, routes, spawn_driver, state, DriverConfig};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if missing.
    let _ = dotenvy::from_filename(".env.local");

    let loaded = load_config_from_env()?;
    let engine = match &loaded {
        Some(l) => EngineConfig::from_config_json(&l.config_json)?,
        None => EngineConfig::default(),
    };

    init_tracing(engine.log_filter.as_deref());

    if let Some(l) = &loaded {
        info!(config_hash = %l.config_hash, "config loaded");
        let report = erk_config::report_unused_keys(&l.config_json, UnusedKeyPolicy::Warn)?;
        for key in &report.unused_leaf_pointers {
            warn!(key = %key, "unused config key");
        }
    }

    // The error source pushes the first real snapshot over HTTP.
    let driver = spawn_driver(Vec::new(), DriverConfig::from(&engine));
    let shared = Arc::new(state::AppState::new(driver.clone()));

    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(1));
    state::spawn_view_publisher(shared.bus.clone(), driver.subscribe());

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let env_addr = std::env::var("ERK_DAEMON_ADDR").ok();
    let addr = resolve_bind_addr(env_addr.as_deref(), &engine)?;
    info!("erk-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    driver.shutdown().await;
    info!("erk-daemon stopped");
    Ok(())
}

fn init_tracing(config_filter: Option<&str>) {
    let fallback = config_filter.unwrap_or("info").to_string();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .init();
}

/// `ERK_CONFIG` is a comma-separated list of YAML paths in merge order.
fn load_config_from_env() -> anyhow::Result<Option<LoadedConfig>> {
    let Ok(raw) = std::env::var("ERK_CONFIG") else {
        return Ok(None);
    };
    let paths: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if paths.is_empty() {
        return Ok(None);
    }
    let loaded = erk_config::load_layered_yaml(&paths).context("ERK_CONFIG load failed")?;
    Ok(Some(loaded))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("ctrl_c handler failed: {e}");
        // Without a signal handler, serve until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
