//! mp-scout core library
//!
//! Authenticated, rate-limited client for a session-cookie-protected
//! platform web API: account and article discovery, mini-program search,
//! and heuristic extraction of embedded cross-references from article
//! markup.
//!
//! # Architecture
//!
//! - [`config`] - validation rules as configuration data
//! - [`auth`] - credential parsing, validation, and token discovery
//! - [`transport`] - throttled HTTP transport with error classification
//! - [`api`] - typed wire client, endpoint table, pagination
//! - [`extract`] - pure link extraction over fetched documents
//! - [`search`] - the two user-facing discovery workflows
//! - [`export`] - CSV export of discovery results
//!
//! All network calls within one workflow are sequential by design: the
//! remote service's abuse detection makes concurrent bursts
//! counterproductive, so the only suspension point is the transport's
//! throttling wait.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod auth;
pub mod config;
pub mod export;
pub mod extract;
pub mod search;
pub mod transport;

// Re-export commonly used types
pub use api::{
    AccountRecord, AccountType, ArticleRecord, MiniProgramRecord, MpClient, Page,
};
pub use auth::{AuthError, AuthManager, AuthOutcome, CredentialSet, CredentialSource};
pub use config::ValidationRule;
pub use extract::extract_links;
pub use search::{CancelFlag, ProgressObserver, Scout, ScoutError};
pub use transport::{ThrottledTransport, TransportError};
