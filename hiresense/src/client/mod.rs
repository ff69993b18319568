//! HTTP client for the HireSense functions.
//!
//! One [`Client`] serves all three endpoints:
//! - streaming chat replies ([`Client::stream_chat`] and friends)
//! - resume analysis ([`Client::analyze_resume`])
//! - notification emails ([`Client::send_notification`])

mod analysis;
mod chat;
mod notification;

pub use chat::consume_stream;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::config::{ClientConfig, Endpoints};
use crate::error::{Error, Result, ServiceError, StatusWording};

/// HireSense API client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) endpoints: Arc<Endpoints>,
    pub(crate) http: reqwest::Client,
}

impl Client {
    /// Create a new client, validating the configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let endpoints = config.endpoints()?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            endpoints: Arc::new(endpoints),
            http,
        })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolved endpoint URLs.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// JSON POST with bearer auth.
    pub(crate) fn post(&self, url: &Url) -> RequestBuilder {
        self.http
            .post(url.clone())
            .bearer_auth(&self.config.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
    }

    /// JSON POST bounded by the single-shot timeout.
    pub(crate) fn post_with_timeout(&self, url: &Url) -> RequestBuilder {
        let request = self.post(url);
        match self.config.timeout_secs {
            Some(secs) => request.timeout(Duration::from_secs(secs)),
            None => request,
        }
    }

    /// Send a request, giving up as soon as `cancel` fires.
    pub(crate) async fn send(
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ServiceError::Cancelled.into()),
            response = request.send() => Ok(response?),
        }
    }

    /// Turn a non-success response into its [`ServiceError`].
    pub(crate) async fn check_status(
        response: Response,
        wording: &StatusWording,
    ) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %body, "request failed");
        Err(ServiceError::from_status(status.as_u16(), &body, wording).into())
    }

    /// Send a single-shot request and decode its JSON response.
    pub(crate) async fn call_json<T: DeserializeOwned>(
        request: RequestBuilder,
        wording: &StatusWording,
    ) -> Result<T> {
        let response = Self::send(request, &CancellationToken::new()).await?;
        let response = Self::check_status(response, wording).await?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            ServiceError::protocol(format!("unexpected response: {e}, body: {text}")).into()
        })
    }
}

/// Returns `true` if a successful status rules out a body to stream.
///
/// A `200` with `Content-Length: 0` has a body, just an empty one; it reads
/// as an empty reply like any other stream that ends without deltas.
pub(crate) fn has_no_body(response: &Response) -> bool {
    matches!(
        response.status(),
        StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT
    )
}
