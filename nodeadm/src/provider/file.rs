//! File and directory providers.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::api::types::NodeConfig;
use crate::codec::Codec;
use crate::config::merger::ConfigMerger;
use crate::error::{Error, Result};
use crate::provider::{decode_documents, ConfigProvider, ProviderOutcome};
use crate::transport::TransportDecoder;

const CONFIG_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Reads a node configuration file. If the path is a directory, reads it as
/// a drop-in directory instead.
///
/// A named file must contain a configuration; a missing or empty one is an
/// error.
pub struct FileProvider {
    path: PathBuf,
    decoder: TransportDecoder,
    codec: Codec,
}

impl FileProvider {
    /// Creates a provider for a path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, decoder: TransportDecoder, codec: Codec) -> Self {
        Self {
            path: path.into(),
            decoder,
            codec,
        }
    }
}

impl ConfigProvider for FileProvider {
    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }

    fn provide(&self) -> Result<ProviderOutcome> {
        let metadata = fs::metadata(&self.path).map_err(|source| Error::FileRead {
            path: self.path.clone(),
            source,
        })?;
        if metadata.is_dir() {
            return DirectoryProvider::new(&self.path, self.decoder.clone(), self.codec.clone())
                .provide();
        }
        let config = read_config_file(&self.path, &self.decoder, &self.codec)?;
        Ok(ProviderOutcome::Found(Box::new(config)))
    }
}

/// Reads every `.yaml`, `.yml` and `.json` file in a directory, in lexical
/// filename order, and merges them. Later files win.
pub struct DirectoryProvider {
    path: PathBuf,
    decoder: TransportDecoder,
    codec: Codec,
}

impl DirectoryProvider {
    /// Creates a provider for a directory.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, decoder: TransportDecoder, codec: Codec) -> Self {
        Self {
            path: path.into(),
            decoder,
            codec,
        }
    }

    /// Config filenames in merge order.
    fn entries(&self) -> Result<Vec<String>> {
        let read_dir = fs::read_dir(&self.path).map_err(|source| Error::FileRead {
            path: self.path.clone(),
            source,
        })?;
        let mut names = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && has_config_extension(&path) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl ConfigProvider for DirectoryProvider {
    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }

    fn provide(&self) -> Result<ProviderOutcome> {
        let names = self.entries()?;
        if names.is_empty() {
            info!("no config files in {}", self.path.display());
            return Ok(ProviderOutcome::Absent);
        }

        let mut merged: Option<NodeConfig> = None;
        for name in names {
            debug!("reading config file {name}");
            let config = read_config_file(&self.path.join(&name), &self.decoder, &self.codec)
                .map_err(|e| Error::DirectoryEntry {
                    filename: name.clone(),
                    source: Box::new(e),
                })?;
            merged = Some(match merged {
                Some(acc) => ConfigMerger::merge(&acc, &config)?,
                None => config,
            });
        }
        Ok(merged.map_or(ProviderOutcome::Absent, |c| ProviderOutcome::Found(Box::new(c))))
    }
}

fn has_config_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            CONFIG_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn read_config_file(path: &Path, decoder: &TransportDecoder, codec: &Codec) -> Result<NodeConfig> {
    let raw = fs::read(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let documents = decoder.decode(&raw)?;
    decode_documents(codec, &documents)?.ok_or_else(|| Error::NoConfigInFile {
        path: path.to_path_buf(),
    })
}
