//! Common test utilities for integration tests.

use std::path::Path;
use std::sync::Arc;

use nodeadm::provider::{FakeUserData, ProviderChain, ProviderContext};

/// A v1alpha1 document with the given spec body, indented two spaces.
pub fn document(spec: &str) -> String {
    format!("apiVersion: node.eks.aws/v1alpha1\nkind: NodeConfig\nspec:\n{spec}")
}

/// A complete, valid cluster section.
pub fn cluster(name: &str) -> String {
    document(&format!(
        "  cluster:\n    name: {name}\n    apiServerEndpoint: https://example.com\n    certificateAuthority: Y2E=\n    cidr: 10.100.0.0/16\n"
    ))
}

/// A `file://` URI for a path.
pub fn file_source(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Builds a chain whose user data comes from a fake.
#[allow(dead_code)]
pub fn chain(sources: &[String], user_data: FakeUserData) -> ProviderChain {
    let context = ProviderContext::new(Arc::new(user_data));
    ProviderChain::from_sources(sources, &context).unwrap()
}

/// Wraps node configuration documents in a MIME multipart envelope,
/// preceded by a shell script part.
#[allow(dead_code)]
pub fn multipart(documents: &[String]) -> String {
    let mut mail = String::from(
        "MIME-Version: 1.0\nContent-Type: multipart/mixed; boundary=\"BOUNDARY\"\n\n--BOUNDARY\nContent-Type: text/x-shellscript; charset=\"us-ascii\"\n\n#!/bin/bash\necho bootstrapping\n\n",
    );
    for doc in documents {
        mail.push_str("--BOUNDARY\nContent-Type: application/node.eks.aws\n\n");
        mail.push_str(doc);
        mail.push('\n');
    }
    mail.push_str("--BOUNDARY--\n");
    mail
}
