//! Integration tests for provider chains over real files and user data.

mod common;

use std::fs;

use common::{chain, cluster, document, file_source, multipart};
use nodeadm::provider::{ChainOutcome, FakeUserData};
use nodeadm::Error;
use tempfile::TempDir;

#[test]
fn test_directory_drop_ins_merge_in_lexical_order() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("10-base.yaml"), cluster("base")).unwrap();
    fs::write(
        dir.path().join("20-flags.YML"),
        document("  kubelet:\n    flags: [--v=2]\n"),
    )
    .unwrap();
    fs::write(
        dir.path().join("30-more.json"),
        r#"{"apiVersion":"node.eks.aws/v1alpha1","kind":"NodeConfig","spec":{"kubelet":{"flags":["--v=4"]}}}"#,
    )
    .unwrap();
    fs::write(dir.path().join("40-ignored.txt"), "not: considered").unwrap();

    let config = chain(&[file_source(dir.path())], FakeUserData::missing())
        .provide()
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(config.spec.cluster.name, "base");
    assert_eq!(config.spec.kubelet.flags, vec!["--v=2", "--v=4"]);
}

#[test]
fn test_user_data_then_file_override() {
    let dir = TempDir::new().unwrap();
    let overlay = dir.path().join("overlay.yaml");
    fs::write(&overlay, document("  cluster:\n    name: overridden\n")).unwrap();

    let user_data = FakeUserData::new(cluster("from-user-data"));
    let config = chain(
        &["imds://user-data".to_string(), file_source(&overlay)],
        user_data,
    )
    .provide()
    .unwrap()
    .into_result()
    .unwrap();

    assert_eq!(config.spec.cluster.name, "overridden");
    assert_eq!(config.spec.cluster.cidr, "10.100.0.0/16");
}

#[test]
fn test_multipart_user_data_merges_matching_parts() {
    let user_data = FakeUserData::new(multipart(&[
        cluster("multi"),
        document("  kubelet:\n    labels:\n      role: worker\n"),
    ]));

    let config = chain(&["imds://user-data".to_string()], user_data)
        .provide()
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(config.spec.cluster.name, "multi");
    assert_eq!(
        config.spec.kubelet.labels.get("role").map(String::as_str),
        Some("worker")
    );
}

#[test]
fn test_shell_only_user_data_falls_through() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, cluster("fallback")).unwrap();

    let user_data = FakeUserData::new("#!/bin/bash\necho hello\n");
    let config = chain(&["imds://user-data".to_string(), file_source(&path)], user_data)
        .provide()
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(config.spec.cluster.name, "fallback");
}

#[test]
fn test_nothing_anywhere() {
    let dir = TempDir::new().unwrap();
    let outcome = chain(
        &["imds://user-data".to_string(), file_source(dir.path())],
        FakeUserData::missing(),
    )
    .provide()
    .unwrap();

    assert_eq!(outcome, ChainOutcome::NoConfigInChain);
}

#[test]
fn test_bad_drop_in_names_file_and_provider() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("10-base.yaml"), cluster("base")).unwrap();
    fs::write(dir.path().join("20-broken.yaml"), "{ broken").unwrap();

    let err = chain(
        &["imds://user-data".to_string(), file_source(dir.path())],
        FakeUserData::missing(),
    )
    .provide()
    .unwrap_err();

    match err {
        Error::Provider { index, source } => {
            assert_eq!(index, 1);
            match *source {
                Error::DirectoryEntry { filename, .. } => assert_eq!(filename, "20-broken.yaml"),
                other => panic!("expected DirectoryEntry, got {other:?}"),
            }
        }
        other => panic!("expected Provider, got {other:?}"),
    }
}

#[test]
fn test_missing_named_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = chain(
        &[file_source(&dir.path().join("absent.yaml"))],
        FakeUserData::missing(),
    )
    .provide()
    .unwrap_err();

    assert!(err.to_string().contains("absent.yaml"), "{err}");
}

#[test]
fn test_percent_encoded_file_source() {
    let dir = TempDir::new().unwrap();
    let spaced = dir.path().join("my dir");
    fs::create_dir(&spaced).unwrap();
    fs::write(spaced.join("config.yaml"), cluster("spaced")).unwrap();

    let source = file_source(&spaced.join("config.yaml")).replace(' ', "%20");
    assert!(source.contains("my%20dir"));

    let config = chain(&[source], FakeUserData::missing())
        .provide()
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(config.spec.cluster.name, "spaced");
}
