//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing, including:
//! - Test environment setup with temporary directories
//! - Command builders with an isolated cache and metadata endpoint
//! - Config document fixtures

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An endpoint nothing listens on, so stray metadata lookups fail fast.
pub const DEAD_IMDS_ENDPOINT: &str = "http://127.0.0.1:9";

/// Test environment with an isolated config cache.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
    /// Where `init` caches the resolved configuration
    pub cache_path: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    ///
    /// The cache path is not created; `init` creates it.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        let cache_path = temp_path.join("cache").join("config.json");

        Self {
            temp_dir,
            temp_path,
            cache_path,
        }
    }

    /// Get a command builder with the agent environment isolated.
    ///
    /// Inherited `NODEADM_*` variables are cleared, the cache points into
    /// the temp dir and the metadata service points at a dead endpoint.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("nodeadm").expect("Failed to find nodeadm binary");
        cmd.env_remove("NODEADM_CONFIG_SOURCES")
            .env_remove("NODEADM_IMDS_TIMEOUT_SECONDS")
            .env("NODEADM_CONFIG_CACHE", &self.cache_path)
            .env("AWS_EC2_METADATA_SERVICE_ENDPOINT", DEAD_IMDS_ENDPOINT)
            .env("NODEADM_IMDS_MAX_ATTEMPTS", "1");
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Create a subdirectory in the test environment.
    pub fn create_dir(&self, name: &str) -> PathBuf {
        let path = self.temp_path.join(name);
        std::fs::create_dir_all(&path).expect("Failed to create test directory");
        path
    }

    /// Write a file under the temp dir and return its path.
    pub fn write_file(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.temp_path.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, contents).expect("Failed to write test file");
        path
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// A `file://` source URI for a local path.
#[allow(dead_code)]
pub fn file_source(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// A complete v1alpha1 document for the named cluster.
#[allow(dead_code)]
pub fn valid_config(cluster: &str) -> String {
    format!(
        "apiVersion: node.eks.aws/v1alpha1
kind: NodeConfig
spec:
  cluster:
    name: {cluster}
    apiServerEndpoint: https://example.com
    certificateAuthority: Y2VydGlmaWNhdGVBdXRob3JpdHk=
    cidr: 10.100.0.0/16
"
    )
}

/// A v1alpha1 document that only sets kubelet flags.
#[allow(dead_code)]
pub fn flags_config(flags: &[&str]) -> String {
    let mut doc = String::from(
        "apiVersion: node.eks.aws/v1alpha1
kind: NodeConfig
spec:
  kubelet:
    flags:
",
    );
    for flag in flags {
        doc.push_str(&format!("      - \"{flag}\"\n"));
    }
    doc
}
