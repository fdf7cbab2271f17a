//! Scenario: Layered config hash stability
//!
//! # Invariants under test
//!
//! 1. Reordering keys inside a YAML document does not change the hash.
//! 2. A later layer overrides an earlier one; nested maps merge.
//! 3. Changing a consumed value changes the hash.
//! 4. An empty overlay is a no-op.

use erk_config::load_layered_yaml_from_strings;

const BASE: &str = r#"
engine:
  redisplay_period_secs: 60
daemon:
  addr: "127.0.0.1:8898"
"#;

#[test]
fn key_order_does_not_change_hash() {
    let reordered = r#"
daemon:
  addr: "127.0.0.1:8898"
engine:
  redisplay_period_secs: 60
"#;

    let a = load_layered_yaml_from_strings(&[BASE]).expect("base loads");
    let b = load_layered_yaml_from_strings(&[reordered]).expect("reordered loads");

    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
    assert_eq!(a.config_hash.len(), 64, "sha256 hex digest");
}

#[test]
fn later_layer_overrides_and_nested_maps_merge() {
    let overlay = r#"
engine:
  redisplay_period_secs: 5
log:
  filter: "debug"
"#;

    let loaded = load_layered_yaml_from_strings(&[BASE, overlay]).expect("layers load");
    let cfg = &loaded.config_json;

    assert_eq!(cfg["engine"]["redisplay_period_secs"], 5);
    assert_eq!(cfg["daemon"]["addr"], "127.0.0.1:8898");
    assert_eq!(cfg["log"]["filter"], "debug");
}

#[test]
fn changed_value_changes_hash() {
    let overlay = "engine:\n  redisplay_period_secs: 61\n";

    let a = load_layered_yaml_from_strings(&[BASE]).expect("base loads");
    let b = load_layered_yaml_from_strings(&[BASE, overlay]).expect("overlay loads");

    assert_ne!(a.config_hash, b.config_hash);
}

#[test]
fn empty_overlay_is_a_no_op() {
    let a = load_layered_yaml_from_strings(&[BASE]).expect("base loads");
    let b = load_layered_yaml_from_strings(&[BASE, ""]).expect("empty overlay loads");

    assert_eq!(a.config_hash, b.config_hash);
}
