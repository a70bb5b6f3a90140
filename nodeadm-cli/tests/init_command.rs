//! Integration tests for the `init` command.
//!
//! These tests verify the cache lifecycle:
//! - First run creates the cache
//! - Unchanged spec reuses the cache without touching the metadata service
//! - Changed spec re-enriches and rewrites the cache
//! - Invalid configuration and settings never write the cache

mod common;

use common::{file_source, valid_config, TestEnv};
use predicates::prelude::*;
use std::fs;

#[test]
fn test_init_creates_cache() {
    let env = TestEnv::new();
    let path = env.write_file("config.yaml", valid_config("demo"));

    assert!(!env.cache_path.exists());

    env.command()
        .args(["init", "--skip-enrichment", "-c"])
        .arg(file_source(&path))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Configuration for cluster demo created",
        ));

    let cached: serde_json::Value =
        serde_json::from_slice(&fs::read(&env.cache_path).unwrap()).unwrap();
    assert_eq!(cached["apiVersion"], "node.eks.aws/__internal");
    assert_eq!(cached["spec"]["cluster"]["name"], "demo");
}

#[test]
fn test_init_second_run_is_unchanged() {
    let env = TestEnv::new();
    let path = env.write_file("config.yaml", valid_config("demo"));

    env.command()
        .args(["init", "--skip-enrichment", "-c"])
        .arg(file_source(&path))
        .assert()
        .success();
    let first = fs::read(&env.cache_path).unwrap();

    // No --skip-enrichment: a cache hit must not reach the metadata service
    env.command()
        .args(["init", "-c"])
        .arg(file_source(&path))
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged"));

    assert_eq!(fs::read(&env.cache_path).unwrap(), first);
}

#[test]
fn test_init_spec_change_updates_cache() {
    let env = TestEnv::new();
    let path = env.write_file("config.yaml", valid_config("before"));

    env.command()
        .args(["init", "--skip-enrichment", "-c"])
        .arg(file_source(&path))
        .assert()
        .success();

    fs::write(&path, valid_config("after")).unwrap();

    env.command()
        .args(["init", "--skip-enrichment", "-c"])
        .arg(file_source(&path))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Configuration for cluster after updated",
        ));

    let cached: serde_json::Value =
        serde_json::from_slice(&fs::read(&env.cache_path).unwrap()).unwrap();
    assert_eq!(cached["spec"]["cluster"]["name"], "after");
}

#[test]
fn test_init_custom_cache_path() {
    let env = TestEnv::new();
    let path = env.write_file("config.yaml", valid_config("demo"));
    let cache = env.path().join("elsewhere").join("node.json");

    env.command()
        .args(["init", "--skip-enrichment", "--config-cache"])
        .arg(&cache)
        .arg("-c")
        .arg(file_source(&path))
        .assert()
        .success();

    assert!(cache.exists());
    assert!(!env.cache_path.exists());
}

#[test]
fn test_init_invalid_config_not_cached() {
    let env = TestEnv::new();
    let doc = valid_config("demo").replace("    cidr: 10.100.0.0/16\n", "");
    let path = env.write_file("config.yaml", doc);

    env.command()
        .args(["init", "--skip-enrichment", "-c"])
        .arg(file_source(&path))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cluster.cidr"));

    assert!(!env.cache_path.exists());
}

#[test]
fn test_init_unreachable_metadata_service() {
    let env = TestEnv::new();
    let path = env.write_file("config.yaml", valid_config("demo"));

    env.command()
        .args(["init", "-c"])
        .arg(file_source(&path))
        .assert()
        .code(3);

    assert!(!env.cache_path.exists());
}

#[test]
fn test_init_invalid_settings() {
    let env = TestEnv::new();
    let path = env.write_file("config.yaml", valid_config("demo"));

    env.command()
        .env("NODEADM_IMDS_MAX_ATTEMPTS", "zero")
        .args(["init", "--skip-enrichment", "-c"])
        .arg(file_source(&path))
        .assert()
        .code(7)
        .stderr(predicate::str::contains("NODEADM_IMDS_MAX_ATTEMPTS"));
}
