//! On-disk cache of the resolved, enriched configuration.
//!
//! The cache holds the internal encoding, status included, so a later boot
//! with an unchanged spec can skip enrichment.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::api::types::NodeConfig;
use crate::codec::{Codec, Format, Version};
use crate::error::{Error, Result};

/// A cache file.
#[derive(Debug, Clone)]
pub struct ConfigCache {
    path: PathBuf,
    codec: Codec,
}

impl ConfigCache {
    /// A cache at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, codec: Codec) -> Self {
        Self {
            path: path.into(),
            codec,
        }
    }

    /// Location of the cache file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the cached configuration. A missing file is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn load(&self) -> Result<Option<NodeConfig>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no cached config at {}", self.path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(Error::FileRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        self.codec
            .decode_as(&data, Version::Internal)
            .map(Some)
    }

    /// Writes the configuration, creating parent directories as needed.
    ///
    /// The file is written beside its final location and renamed into place,
    /// so readers never see a partial cache.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or any filesystem step fails.
    pub fn save(&self, config: &NodeConfig) -> Result<()> {
        let data = self.codec.encode(config, Version::Internal, Format::Json)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, data)?;
        fs::rename(&staging, &self.path)?;
        debug!("cached config at {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> NodeConfig {
        let mut config = NodeConfig::default();
        config.spec.cluster.name = "cached".into();
        config.spec.cluster.certificate_authority = b"ca".to_vec();
        config.spec.kubelet.flags = vec!["--v=2".into()];
        config.status.instance.id = "i-0123".into();
        config.status.defaults.sandbox_image = "localhost/kubernetes/pause".into();
        config
    }

    #[test]
    fn test_missing_cache_is_none() {
        let dir = TempDir::new().unwrap();
        let cache = ConfigCache::new(dir.path().join("config.json"), Codec::default());
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_keeps_status() {
        let dir = TempDir::new().unwrap();
        let cache = ConfigCache::new(dir.path().join("nested/dir/config.json"), Codec::default());
        cache.save(&sample()).unwrap();

        let loaded = cache.load().unwrap().unwrap();
        assert_eq!(loaded, sample());
        assert!(!dir.path().join("nested/dir/config.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_cache_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let cache = ConfigCache::new(&path, Codec::default());
        assert!(cache.load().is_err());
    }

    #[test]
    fn test_external_document_is_not_a_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "apiVersion: node.eks.aws/v1alpha1\nkind: NodeConfig\n").unwrap();
        let err = ConfigCache::new(&path, Codec::default()).load().unwrap_err();
        assert!(matches!(err, Error::KindMismatch { .. }));
    }
}
