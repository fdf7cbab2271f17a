//! Listen address resolution.
//!
//! `ERK_DAEMON_ADDR` wins over `daemon.addr`; with neither set the daemon
//! binds 127.0.0.1:8898. A value that is set but does not parse is a config
//! error, never a silent fallback.

use std::net::SocketAddr;

use anyhow::Context;
use erk_config::EngineConfig;

pub const DEFAULT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 8898);

/// `env_addr` is the raw `ERK_DAEMON_ADDR` value, if set.
pub fn resolve_bind_addr(
    env_addr: Option<&str>,
    engine: &EngineConfig,
) -> anyhow::Result<SocketAddr> {
    if let Some(s) = env_addr {
        return s
            .trim()
            .parse()
            .with_context(|| format!("CONFIG_INVALID ERK_DAEMON_ADDR is not a socket address: {s}"));
    }
    match &engine.daemon_addr {
        Some(s) => s
            .parse()
            .with_context(|| format!("CONFIG_INVALID daemon.addr is not a socket address: {s}")),
        None => Ok(SocketAddr::from(DEFAULT_ADDR)),
    }
}
