use anyhow::Result;
use erk_config::{report_unused_keys, EngineConfig, UnusedKeyPolicy};

use super::path_refs;

pub fn config_hash(paths: &[String]) -> Result<()> {
    let loaded = erk_config::load_layered_yaml(&path_refs(paths))?;
    println!("config_hash={}", loaded.config_hash);
    println!("{}", loaded.canonical_json);
    Ok(())
}

/// Typed validation first, then the unused-key guard.
pub fn config_check(paths: &[String], strict: bool) -> Result<()> {
    let loaded = erk_config::load_layered_yaml(&path_refs(paths))?;
    let engine = EngineConfig::from_config_json(&loaded.config_json)?;

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, policy)?;

    println!("config_hash={}", loaded.config_hash);
    println!("redisplay_period_secs={}", engine.redisplay_period_secs);
    if let Some(addr) = &engine.daemon_addr {
        println!("daemon_addr={}", addr);
    }
    for key in &report.unused_leaf_pointers {
        println!("unused_key={}", key);
    }
    println!("ok={}", report.is_clean());
    Ok(())
}
