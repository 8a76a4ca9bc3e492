//! HTTP transport for XML-RPC calls.
//!
//! Each call builds its own [`Transport`], so concurrent calls never share
//! connection state and always see the current timeout and User-Agent.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use tracing::{trace, warn};

use crate::error::TransportError;

/// Maximum number of redirects followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

/// A one-shot HTTP POST sender.
pub struct Transport {
    client: Client,
    timeout: Duration,
}

impl Transport {
    /// Creates a transport. A timeout of zero seconds means no timeout.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, TransportError> {
        let timeout = Duration::from_secs(timeout_secs);

        let mut builder = Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::limited(MAX_REDIRECTS));
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(TransportError::Build)?;
        Ok(Self { client, timeout })
    }

    /// POSTs `payload` as `text/xml` and returns the response body.
    pub async fn send(&self, endpoint: &str, payload: Vec<u8>) -> Result<Bytes, TransportError> {
        trace!(url = %endpoint, len = payload.len(), "Sending request");

        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "text/xml")
            .body(payload)
            .send()
            .await
            .map_err(|e| self.classify(e, TransportError::Network))?;

        let status = response.status();
        trace!(status = %status, "Received response");

        if !status.is_success() {
            warn!(status = %status, url = %endpoint, "Unexpected response status");
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| self.classify(e, TransportError::Body))
    }

    fn classify(
        &self,
        err: reqwest::Error,
        otherwise: fn(reqwest::Error) -> TransportError,
    ) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            otherwise(err)
        }
    }
}
