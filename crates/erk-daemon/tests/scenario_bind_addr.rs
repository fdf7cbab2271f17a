//! Scenario: Listen address resolution
//!
//! # Invariants under test
//!
//! 1. `ERK_DAEMON_ADDR` wins over `daemon.addr`.
//! 2. An `ERK_DAEMON_ADDR` that does not parse fails with CONFIG_INVALID
//!    instead of falling back to another address.
//! 3. `daemon.addr` is used when the env var is unset, and fails the same
//!    way when it does not parse.
//! 4. With neither set the daemon binds 127.0.0.1:8898.

use std::net::SocketAddr;

use erk_config::EngineConfig;
use erk_daemon::addr::{resolve_bind_addr, DEFAULT_ADDR};

fn with_config_addr(addr: &str) -> EngineConfig {
    EngineConfig {
        daemon_addr: Some(addr.to_string()),
        ..EngineConfig::default()
    }
}

// ---------------------------------------------------------------------------
// 1–2. Env override
// ---------------------------------------------------------------------------

#[test]
fn env_addr_overrides_config_addr() {
    let addr = resolve_bind_addr(Some("0.0.0.0:9000"), &with_config_addr("127.0.0.1:7000"))
        .expect("valid env addr");
    assert_eq!(addr, "0.0.0.0:9000".parse::<SocketAddr>().expect("literal"));
}

#[test]
fn invalid_env_addr_is_config_invalid() {
    let err = resolve_bind_addr(Some("not-an-addr"), &with_config_addr("127.0.0.1:7000"))
        .expect_err("unparseable env addr must not fall back");
    let msg = format!("{err:#}");
    assert!(msg.contains("CONFIG_INVALID"), "got: {msg}");
    assert!(msg.contains("ERK_DAEMON_ADDR"), "got: {msg}");
}

#[test]
fn empty_env_addr_is_config_invalid() {
    assert!(resolve_bind_addr(Some(""), &EngineConfig::default()).is_err());
}

// ---------------------------------------------------------------------------
// 3. Config addr
// ---------------------------------------------------------------------------

#[test]
fn config_addr_used_without_env() {
    let addr = resolve_bind_addr(None, &with_config_addr("127.0.0.1:7000")).expect("valid");
    assert_eq!(addr.port(), 7000);
}

#[test]
fn invalid_config_addr_is_config_invalid() {
    let err = resolve_bind_addr(None, &with_config_addr("localhost")).expect_err("no port");
    let msg = format!("{err:#}");
    assert!(msg.contains("CONFIG_INVALID"), "got: {msg}");
    assert!(msg.contains("daemon.addr"), "got: {msg}");
}

// ---------------------------------------------------------------------------
// 4. Default
// ---------------------------------------------------------------------------

#[test]
fn default_addr_is_loopback_8898() {
    let addr = resolve_bind_addr(None, &EngineConfig::default()).expect("default");
    assert_eq!(addr, SocketAddr::from(DEFAULT_ADDR));
    assert_eq!(addr.to_string(), "127.0.0.1:8898");
}
