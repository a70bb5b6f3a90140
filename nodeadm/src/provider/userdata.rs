//! Instance user data provider.

use std::sync::Arc;

use log::{debug, info};

use crate::cancel::Cancellation;
use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::provider::{decode_documents, ConfigProvider, ProviderOutcome};
use crate::transport::TransportDecoder;

/// Fetches raw user data bytes.
pub trait UserDataSource: Send + Sync {
    /// Returns the raw user data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MetadataNotFound`] if the instance has no user data.
    fn user_data(&self, cancel: &Cancellation) -> Result<Vec<u8>>;
}

/// Canned user data, for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct FakeUserData {
    data: Option<Vec<u8>>,
}

impl FakeUserData {
    /// User data with the given bytes.
    #[must_use]
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Some(data.into()),
        }
    }

    /// An instance launched without user data.
    #[must_use]
    pub fn missing() -> Self {
        Self { data: None }
    }
}

impl UserDataSource for FakeUserData {
    fn user_data(&self, cancel: &Cancellation) -> Result<Vec<u8>> {
        cancel.check()?;
        self.data.clone().ok_or_else(|| Error::MetadataNotFound {
            path: "user-data".to_string(),
        })
    }
}

/// Reads node configuration from instance user data.
///
/// User data is shared with other tools, so anything that is not a node
/// configuration is treated as absent rather than as an error. Corrupt
/// transport encoding is still an error.
pub struct UserDataProvider {
    source: Arc<dyn UserDataSource>,
    decoder: TransportDecoder,
    codec: Codec,
    cancel: Cancellation,
}

impl UserDataProvider {
    /// Creates a provider over a user data source.
    #[must_use]
    pub fn new(
        source: Arc<dyn UserDataSource>,
        decoder: TransportDecoder,
        codec: Codec,
        cancel: Cancellation,
    ) -> Self {
        Self {
            source,
            decoder,
            codec,
            cancel,
        }
    }
}

impl ConfigProvider for UserDataProvider {
    fn describe(&self) -> String {
        "imds://user-data".to_string()
    }

    fn provide(&self) -> Result<ProviderOutcome> {
        let raw = match self.source.user_data(&self.cancel) {
            Ok(raw) => raw,
            Err(err) if err.is_not_found() => {
                info!("instance has no user data");
                return Ok(ProviderOutcome::Absent);
            }
            Err(err) => return Err(err),
        };

        let documents = self.decoder.decode(&raw)?;
        match decode_documents(&self.codec, &documents) {
            Ok(Some(config)) => {
                debug!("decoded node configuration from {} user data part(s)", documents.len());
                Ok(ProviderOutcome::Found(Box::new(config)))
            }
            Ok(None) => {
                info!("user data has no node configuration parts");
                Ok(ProviderOutcome::Absent)
            }
            Err(err) if err.is_decode_failure() => {
                info!("user data is not a node configuration: {err}");
                Ok(ProviderOutcome::Absent)
            }
            Err(err) => Err(err),
        }
    }
}
