//! Instance metadata service client.
//!
//! Uses the session-token protocol: a `PUT` for a token, then `GET`s that
//! carry it. Every request is retried with [`Backoff`] on connection
//! failures, timeouts and server errors. A 404 surfaces as
//! [`Error::MetadataNotFound`] and is never retried.

mod retry;

use std::time::Duration;

use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;

pub use retry::Backoff;

use crate::cancel::Cancellation;
use crate::config::settings::ImdsSettings;
use crate::error::{Error, Result};
use crate::provider::UserDataSource;

const TOKEN_PATH: &str = "api/token";
const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";
const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";
const TOKEN_TTL_SECONDS: u32 = 21_600;

const USER_DATA_PATH: &str = "user-data";
const IDENTITY_DOCUMENT_PATH: &str = "dynamic/instance-identity/document";

/// The instance identity document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceIdentityDocument {
    /// Instance ID.
    pub instance_id: String,
    /// Region.
    pub region: String,
    /// Instance type.
    pub instance_type: String,
    /// Availability zone.
    pub availability_zone: String,
    /// Owning account.
    pub account_id: String,
    /// AMI the instance was launched from.
    pub image_id: String,
    /// Primary private IP address.
    pub private_ip: String,
}

/// Read access to instance metadata.
pub trait InstanceMetadata: Send + Sync {
    /// Fetches `meta-data/<name>` as text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MetadataNotFound`] if the property does not exist.
    fn property(&self, name: &str, cancel: &Cancellation) -> Result<String>;

    /// Fetches the instance identity document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be fetched or parsed.
    fn instance_identity(&self, cancel: &Cancellation) -> Result<InstanceIdentityDocument>;
}

/// Blocking metadata service client.
#[derive(Debug, Clone)]
pub struct ImdsClient {
    http: Client,
    endpoint: String,
    backoff: Backoff,
    request_timeout: Duration,
}

impl ImdsClient {
    /// Creates a client. No request is made until first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &ImdsSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .no_proxy()
            .build()?;
        Ok(Self {
            http,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            backoff: Backoff {
                max_attempts: settings.max_attempts,
                initial: settings.initial_backoff,
                max: settings.max_backoff,
            },
            request_timeout: settings.request_timeout,
        })
    }

    /// Fetches `latest/<path>`, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MetadataNotFound`] on 404, [`Error::Cancelled`] when
    /// cancelled, or the last transport error once retries run out.
    pub fn get(&self, path: &str, cancel: &Cancellation) -> Result<Vec<u8>> {
        debug!("fetching metadata {path}");
        self.backoff
            .retry(cancel, || self.get_once(path, cancel), is_transient)
    }

    fn get_once(&self, path: &str, cancel: &Cancellation) -> Result<Vec<u8>> {
        let token = self.token(cancel)?;
        let response = self
            .http
            .get(format!("{}/latest/{path}", self.endpoint))
            .header(TOKEN_HEADER, token)
            .timeout(self.timeout(cancel)?)
            .send()?;
        read_body(path, response)
    }

    fn token(&self, cancel: &Cancellation) -> Result<String> {
        let response = self
            .http
            .put(format!("{}/latest/{TOKEN_PATH}", self.endpoint))
            .header(TOKEN_TTL_HEADER, TOKEN_TTL_SECONDS.to_string())
            .timeout(self.timeout(cancel)?)
            .send()?;
        let body = read_body(TOKEN_PATH, response)?;
        Ok(String::from_utf8_lossy(&body).trim().to_string())
    }

    fn timeout(&self, cancel: &Cancellation) -> Result<Duration> {
        match cancel.remaining() {
            Some(left) if left.is_zero() => Err(Error::Cancelled),
            Some(left) => Ok(left.min(self.request_timeout)),
            None => Ok(self.request_timeout),
        }
    }
}

impl UserDataSource for ImdsClient {
    fn user_data(&self, cancel: &Cancellation) -> Result<Vec<u8>> {
        self.get(USER_DATA_PATH, cancel)
    }
}

impl InstanceMetadata for ImdsClient {
    fn property(&self, name: &str, cancel: &Cancellation) -> Result<String> {
        let body = self.get(&format!("meta-data/{name}"), cancel)?;
        Ok(String::from_utf8_lossy(&body).trim().to_string())
    }

    fn instance_identity(&self, cancel: &Cancellation) -> Result<InstanceIdentityDocument> {
        let body = self.get(IDENTITY_DOCUMENT_PATH, cancel)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn read_body(path: &str, response: Response) -> Result<Vec<u8>> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(Error::MetadataNotFound {
            path: path.to_string(),
        });
    }
    if !status.is_success() {
        return Err(Error::Metadata {
            path: path.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.bytes()?.to_vec())
}

fn is_transient(err: &Error) -> bool {
    match err {
        Error::Http(e) => e.is_connect() || e.is_timeout() || e.is_request() || e.is_body(),
        Error::Metadata { status, .. } => {
            *status >= 500 || *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
        }
        _ => false,
    }
}
