//! JSON-over-HTTP adapters for peers and the ordering service.
//!
//! | Call | Request |
//! |------|---------|
//! | proposal | `POST {endpoint}/proposals` |
//! | broadcast | `POST {endpoint}/broadcast` |
//! | commit feed | `GET {endpoint}/commits?after={block}` |

use crate::domain::{
    duration_millis, CommitBatch, OrderingAck, ProposalResponse, SignedProposal,
    TransactionEnvelope, TransportError,
};
use crate::ports::{CommitEventSource, OrderingClient, PeerClient};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

fn build_client(timeout: Duration) -> Result<Client, TransportError> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .build()
        .map_err(|e| TransportError::Protocol(format!("cannot build HTTP client: {e}")))
}

fn map_error(error: reqwest::Error, url: &str, timeout: Duration) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(duration_millis(timeout))
    } else if error.is_connect() {
        TransportError::Unreachable(format!("cannot connect to {url}"))
    } else {
        TransportError::Protocol(error.to_string())
    }
}

async fn send_json<R: DeserializeOwned>(
    request: RequestBuilder,
    url: &str,
    timeout: Duration,
) -> Result<R, TransportError> {
    let response = request
        .send()
        .await
        .map_err(|e| map_error(e, url, timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Protocol(format!("{url} answered HTTP {status}")));
    }

    response
        .json()
        .await
        .map_err(|e| TransportError::Protocol(format!("invalid response from {url}: {e}")))
}

fn join(endpoint: &str, path: &str) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), path)
}

/// Peer reached over HTTP.
pub struct HttpPeerClient {
    name: String,
    endpoint: String,
    timeout: Duration,
    poll_timeout: Duration,
    client: Client,
}

impl HttpPeerClient {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            name: name.into(),
            endpoint: endpoint.into(),
            timeout,
            poll_timeout: timeout,
            client: build_client(timeout)?,
        })
    }

    /// How long a commit long-poll may stay open. Defaults to the
    /// proposal timeout.
    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process_proposal(
        &self,
        proposal: &SignedProposal,
    ) -> Result<ProposalResponse, TransportError> {
        let url = join(&self.endpoint, "proposals");
        let mut response: ProposalResponse =
            send_json(self.client.post(&url).json(proposal), &url, self.timeout).await?;
        if response.peer.is_empty() {
            response.peer = self.name.clone();
        }
        Ok(response)
    }
}

#[async_trait]
impl CommitEventSource for HttpPeerClient {
    async fn poll_commits(&self, after: Option<u64>) -> Result<CommitBatch, TransportError> {
        let url = join(&self.endpoint, "commits");
        let mut request = self.client.get(&url).timeout(self.poll_timeout);
        if let Some(block) = after {
            request = request.query(&[("after", block)]);
        }
        send_json(request, &url, self.poll_timeout).await
    }
}

/// Ordering service reached over HTTP.
pub struct HttpOrderingClient {
    endpoint: String,
    timeout: Duration,
    client: Client,
}

impl HttpOrderingClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            endpoint: endpoint.into(),
            timeout,
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl OrderingClient for HttpOrderingClient {
    async fn broadcast(&self, envelope: &TransactionEnvelope) -> Result<OrderingAck, TransportError> {
        let url = join(&self.endpoint, "broadcast");
        send_json(self.client.post(&url).json(envelope), &url, self.timeout).await
    }
}
