//! Client library for the Accounts REST service.
//!
//! # Overview
//! `AccountClient` creates, fetches and deletes accounts under
//! `<base_url>/<version>/organisation/accounts`, wrapping every body in the
//! `{"data": ...}` envelope and mapping status codes to `AccountError`.
//!
//! # Design
//! - The resource URL is resolved once, at construction. An invalid base URL
//!   is reported as `ConfigError` instead of aborting the process.
//! - Each operation is split into `build_*` (produces an `HttpRequest`) and
//!   `parse_*` (classifies an `HttpResponse`), so status handling is testable
//!   without a server. The async operations join the two around one round
//!   trip.
//! - Every operation takes a `Context` and runs for at most
//!   `min(context deadline, client timeout)`; cancelling the context aborts the
//!   request in flight. Nothing is retried.
//! - Outcomes are logged through `tracing`; installing a subscriber is left to
//!   the application.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
mod transport;
pub mod types;

pub use client::{AccountClient, Accounts};
pub use config::ClientConfig;
pub use context::{CancelHandle, Context};
pub use error::{AccountError, ConfigError, Operation};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use types::{AccountData, Envelope};
