//! Executes `HttpRequest` values over the network.
//!
//! # Design
//! One `reqwest::Client` (and its connection pool) is shared by every
//! operation; the transport holds no per-request state. Each call races the
//! round trip against the operation budget and the caller's cancellation.
//! Whichever side loses is dropped, which aborts an in-flight request.

use std::time::Duration;

use tracing::{debug, instrument, Span};

use crate::context::Context;
use crate::error::{AccountError, ConfigError};
use crate::http::{HttpRequest, HttpResponse};

#[derive(Debug, Clone)]
pub(crate) struct Transport {
    client: reqwest::Client,
    timeout: Duration,
}

impl Transport {
    pub(crate) fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;
        Ok(Self { client, timeout })
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends `request` and reads the whole response body, within
    /// `min(ctx deadline, timeout)`.
    #[instrument(
        name = "http_request",
        skip_all,
        fields(
            http.method = ?request.method,
            http.url = %request.url,
            http.status_code = tracing::field::Empty,
        )
    )]
    pub(crate) async fn execute(
        &self,
        ctx: &Context,
        request: HttpRequest,
    ) -> Result<HttpResponse, AccountError> {
        if ctx.is_cancelled() {
            return Err(AccountError::Cancelled);
        }
        let budget = ctx.budget(self.timeout);

        let response = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(AccountError::Cancelled),
            outcome = tokio::time::timeout(budget, self.round_trip(request, budget)) => {
                outcome.map_err(|_| AccountError::DeadlineExceeded(budget))??
            }
        };

        Span::current().record("http.status_code", response.status);
        debug!(status = response.status, bytes = response.body.len(), "response received");
        Ok(response)
    }

    async fn round_trip(
        &self,
        request: HttpRequest,
        budget: Duration,
    ) -> Result<HttpResponse, AccountError> {
        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .timeout(budget);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        // Surface builder errors (bad URL, bad header) before anything is sent.
        let request = builder.build().map_err(AccountError::Transport)?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| transport_error(e, budget))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(|e| transport_error(e, budget))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn transport_error(error: reqwest::Error, budget: Duration) -> AccountError {
    if error.is_timeout() {
        AccountError::DeadlineExceeded(budget)
    } else {
        AccountError::Transport(error)
    }
}
