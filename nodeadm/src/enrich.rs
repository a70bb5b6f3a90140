//! Enrichment: filling in derived status.
//!
//! Runs only when the declared spec changed since it was cached.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info};

use crate::api::features::{is_feature_enabled, INSTANCE_ID_NODE_NAME};
use crate::api::types::{InstanceDetails, NodeConfig};
use crate::cancel::Cancellation;
use crate::error::Result;
use crate::imds::InstanceMetadata;

/// Pause image used for pod sandboxes.
pub const SANDBOX_IMAGE: &str = "localhost/kubernetes/pause";

/// Fills in `status` on a resolved configuration.
pub trait Enricher {
    /// Enriches the configuration in place.
    ///
    /// # Errors
    ///
    /// Returns an error if a required fact cannot be obtained.
    fn enrich(&self, config: &mut NodeConfig) -> Result<()>;
}

/// Leaves the configuration as it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnricher;

impl Enricher for NoopEnricher {
    fn enrich(&self, _config: &mut NodeConfig) -> Result<()> {
        Ok(())
    }
}

/// Enriches from the instance metadata service.
pub struct ImdsEnricher {
    metadata: Arc<dyn InstanceMetadata>,
    cancel: Cancellation,
}

impl ImdsEnricher {
    /// An enricher over a metadata source.
    #[must_use]
    pub fn new(metadata: Arc<dyn InstanceMetadata>, cancel: Cancellation) -> Self {
        Self { metadata, cancel }
    }

    fn instance_details(&self, gates: &BTreeMap<String, bool>) -> Result<InstanceDetails> {
        let identity = self.metadata.instance_identity(&self.cancel)?;
        let mac = self.metadata.property("mac", &self.cancel)?;
        // The node is named after the instance ID, so the DNS name is not needed
        let private_dns_name = if is_feature_enabled(INSTANCE_ID_NODE_NAME, gates) {
            debug!("{INSTANCE_ID_NODE_NAME} enabled, skipping private DNS name lookup");
            String::new()
        } else {
            self.metadata.property("local-hostname", &self.cancel)?
        };
        Ok(InstanceDetails {
            id: identity.instance_id,
            region: identity.region,
            instance_type: identity.instance_type,
            availability_zone: identity.availability_zone,
            mac,
            private_dns_name,
        })
    }
}

impl Enricher for ImdsEnricher {
    fn enrich(&self, config: &mut NodeConfig) -> Result<()> {
        config.status.instance = self.instance_details(&config.spec.feature_gates)?;
        info!(
            "instance details populated: id={} region={} type={}",
            config.status.instance.id,
            config.status.instance.region,
            config.status.instance.instance_type
        );
        config.status.defaults.sandbox_image = SANDBOX_IMAGE.to_string();
        Ok(())
    }
}
