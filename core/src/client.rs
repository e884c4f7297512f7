//! HTTP client for the Accounts REST resource.
//!
//! # Design
//! `AccountClient` holds the resource URL, computed once at construction, and
//! a shared `Transport`. It carries no mutable state, so one instance can serve
//! any number of concurrent callers. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that
//! classifies an `HttpResponse`; the async `create`, `fetch` and `delete`
//! methods glue the two together around a single round trip. Nothing is
//! retried.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::{AccountError, ConfigError, Operation};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{AccountData, Envelope};

const ACCOUNT_RESOURCE: &str = "organisation/accounts";

/// The three operations of the Accounts API, as an object-safe seam.
#[async_trait]
pub trait Accounts: Send + Sync {
    async fn create(&self, ctx: &Context, account: &AccountData) -> Result<AccountData, AccountError>;
    async fn fetch(&self, ctx: &Context, account_id: &str) -> Result<AccountData, AccountError>;
    async fn delete(&self, ctx: &Context, account_id: &str, version: &str) -> Result<(), AccountError>;
}

/// Client for `<base_url>/<version>/organisation/accounts`.
#[derive(Debug, Clone)]
pub struct AccountClient {
    resource_url: Url,
    transport: Transport,
}

impl AccountClient {
    /// Builds a client for the service at `base_url`.
    ///
    /// Fails when `base_url` is not an absolute `http`/`https` URL, when
    /// `version` is empty, or when `timeout` is zero. Callers treat this as a
    /// programmer error. The failure is logged before it is returned.
    pub fn new(base_url: &str, version: &str, timeout: Duration) -> Result<Self, ConfigError> {
        Self::build(base_url, version, timeout)
            .inspect_err(|e| error!(base_url, version, "error initializing accounts client: {e}"))
    }

    fn build(base_url: &str, version: &str, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        let resource_url = resource_url(base_url, version)?;
        let transport = Transport::new(timeout)?;
        Ok(Self {
            resource_url,
            transport,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        Self::new(&config.base_url, &config.version, config.timeout)
    }

    pub fn resource_url(&self) -> &str {
        self.resource_url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.transport.timeout()
    }

    pub fn build_create(&self, account: &AccountData) -> Result<HttpRequest, AccountError> {
        let body = serde_json::to_string(&Envelope { data: account })
            .map_err(AccountError::Serialization)?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.resource_url.to_string(),
            headers: vec![
                ("accept".to_string(), "application/json".to_string()),
                ("content-type".to_string(), "application/json".to_string()),
            ],
            body: Some(body),
        })
    }

    pub fn build_fetch(&self, account_id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.account_url(account_id).to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_delete(&self, account_id: &str, version: &str) -> HttpRequest {
        let mut url = self.account_url(account_id);
        url.query_pairs_mut().append_pair("version", version);
        HttpRequest {
            method: HttpMethod::Delete,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_create(&self, account_id: &str, response: HttpResponse) -> Result<AccountData, AccountError> {
        match response.status {
            201 => decode(&response),
            409 => Err(AccountError::Duplicate {
                id: account_id.to_string(),
            }),
            _ => Err(unexpected(account_id, Operation::Create, response)),
        }
    }

    pub fn parse_fetch(&self, account_id: &str, response: HttpResponse) -> Result<AccountData, AccountError> {
        match response.status {
            200 => decode(&response),
            404 => Err(AccountError::NotFound {
                id: account_id.to_string(),
            }),
            _ => Err(unexpected(account_id, Operation::Fetch, response)),
        }
    }

    pub fn parse_delete(&self, account_id: &str, response: HttpResponse) -> Result<(), AccountError> {
        match response.status {
            204 => Ok(()),
            404 => Err(AccountError::NotFound {
                id: account_id.to_string(),
            }),
            _ => Err(unexpected(account_id, Operation::Delete, response)),
        }
    }

    /// Creates `account` and returns the server's representation of it.
    #[instrument(name = "account_create", skip_all, fields(account.id = %account.id))]
    pub async fn create(&self, ctx: &Context, account: &AccountData) -> Result<AccountData, AccountError> {
        let request = self.build_create(account);
        self.round_trip(ctx, Operation::Create, &account.id, request, |response| {
            self.parse_create(&account.id, response)
        })
        .await
    }

    /// An empty `account_id` is reported as not found without a request.
    #[instrument(name = "account_fetch", skip_all, fields(account.id = %account_id))]
    pub async fn fetch(&self, ctx: &Context, account_id: &str) -> Result<AccountData, AccountError> {
        let request = require_id(account_id).map(|()| self.build_fetch(account_id));
        self.round_trip(ctx, Operation::Fetch, account_id, request, |response| {
            self.parse_fetch(account_id, response)
        })
        .await
    }

    /// Deletes the account if `version` matches the server's current one. An
    /// empty `account_id` is reported as not found without a request.
    #[instrument(name = "account_delete", skip_all, fields(account.id = %account_id))]
    pub async fn delete(&self, ctx: &Context, account_id: &str, version: &str) -> Result<(), AccountError> {
        let request = require_id(account_id).map(|()| self.build_delete(account_id, version));
        self.round_trip(ctx, Operation::Delete, account_id, request, |response| {
            self.parse_delete(account_id, response)
        })
        .await
    }

    /// Executes one request, classifies the response and logs the outcome.
    async fn round_trip<T>(
        &self,
        ctx: &Context,
        operation: Operation,
        account_id: &str,
        request: Result<HttpRequest, AccountError>,
        parse: impl FnOnce(HttpResponse) -> Result<T, AccountError>,
    ) -> Result<T, AccountError> {
        let outcome = match request {
            Ok(request) => self.transport.execute(ctx, request).await.and_then(parse),
            Err(e) => Err(e),
        };
        log_outcome(operation, account_id, &outcome);
        outcome
    }

    fn account_url(&self, account_id: &str) -> Url {
        let mut url = self.resource_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(account_id);
        }
        url
    }
}

#[async_trait]
impl Accounts for AccountClient {
    async fn create(&self, ctx: &Context, account: &AccountData) -> Result<AccountData, AccountError> {
        AccountClient::create(self, ctx, account).await
    }

    async fn fetch(&self, ctx: &Context, account_id: &str) -> Result<AccountData, AccountError> {
        AccountClient::fetch(self, ctx, account_id).await
    }

    async fn delete(&self, ctx: &Context, account_id: &str, version: &str) -> Result<(), AccountError> {
        AccountClient::delete(self, ctx, account_id, version).await
    }
}

/// `<base>/<version>/organisation/accounts` with single-slash separators,
/// keeping any path prefix of `base` and dropping its query and fragment.
fn resource_url(base_url: &str, version: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(base_url).map_err(|source| ConfigError::InvalidBaseUrl {
        url: base_url.to_string(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
    }
    let version_segments: Vec<&str> = version.split('/').filter(|s| !s.is_empty()).collect();
    if version_segments.is_empty() {
        return Err(ConfigError::EmptyVersion);
    }

    if url.cannot_be_a_base() {
        return Err(ConfigError::NotABase(base_url.to_string()));
    }

    url.set_query(None);
    url.set_fragment(None);
    let path = format!(
        "{}/{}/{ACCOUNT_RESOURCE}",
        url.path().trim_end_matches('/'),
        version_segments.join("/"),
    );
    url.set_path(&path);
    Ok(url)
}

// An empty id would address the collection itself.
fn require_id(account_id: &str) -> Result<(), AccountError> {
    if account_id.is_empty() {
        return Err(AccountError::NotFound {
            id: account_id.to_string(),
        });
    }
    Ok(())
}

fn decode(response: &HttpResponse) -> Result<AccountData, AccountError> {
    serde_json::from_str::<Envelope<AccountData>>(&response.body)
        .map(|envelope| envelope.data)
        .map_err(|e| {
            warn!(
                content_type = response.header("content-type").unwrap_or("<none>"),
                status = response.status,
                "response body is not an account envelope"
            );
            AccountError::Deserialization(e)
        })
}

fn unexpected(account_id: &str, operation: Operation, response: HttpResponse) -> AccountError {
    AccountError::UnexpectedStatus {
        id: account_id.to_string(),
        operation,
        status: response.status,
        body: response.body,
    }
}

fn log_outcome<T>(operation: Operation, account_id: &str, outcome: &Result<T, AccountError>) {
    match outcome {
        Ok(_) => info!(%operation, "account {account_id} {}", operation.past_tense()),
        Err(e) => error!(%operation, "{e}"),
    }
}
