//! # Transport
//!
//! The single point where bytes leave the process. The client composes a
//! [`TransportRequest`] and gets back the raw status, headers and body; all
//! decoding happens on the client side of this seam.

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use reqwest::Method;

use crate::error::{ClientError, ClientResult};

/// Response headers keyed by lowercase name; repeated headers keep every value
pub type HeaderValues = BTreeMap<String, Vec<String>>;

/// A fully composed request ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

/// What came back over the wire, before any decoding
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderValues,
    pub body: Bytes,
}

impl TransportResponse {
    /// First value of a header, looked up case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// Sends one request and blocks until the whole response is read
pub trait Transport: Send {
    fn send(&self, request: &TransportRequest) -> ClientResult<TransportResponse>;
}

/// Blocking transport backed by reqwest
pub struct ReqwestTransport {
    client: Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Build the transport. `insecure` turns off certificate and hostname
    /// verification. Requests wait for the server however long it takes.
    pub fn new(insecure: bool) -> ClientResult<Self> {
        Self::with_timeout(insecure, None)
    }

    /// Build the transport with a total per-request time limit
    pub fn with_timeout(insecure: bool, timeout: Option<Duration>) -> ClientResult<Self> {
        tracing::debug!(
            "Creating reqwest transport (insecure: {}, timeout: {:?})",
            insecure,
            timeout
        );
        // reqwest's blocking client cuts requests off at 30s unless told otherwise
        let client = Client::builder()
            .danger_accept_invalid_certs(insecure)
            .redirect(Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &TransportRequest) -> ClientResult<TransportResponse> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| ClientError::Transport(format!("invalid method {}: {e}", request.method)))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(|e| {
            tracing::debug!("Request to {} failed: {}", request.url, e);
            ClientError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let mut headers = HeaderValues::new();
        for (name, value) in response.headers() {
            headers
                .entry(name.as_str().to_ascii_lowercase())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }
        let body = response
            .bytes()
            .map_err(|e| ClientError::Transport(format!("failed to read response body: {e}")))?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
