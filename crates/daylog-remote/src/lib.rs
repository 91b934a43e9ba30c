//! # daylog-remote
//!
//! Blocking HTTP adapters implementing the `daylog-core` traits:
//!
//! - [`TodoistClient`]: `TaskSource` over the Todoist REST and sync APIs
//! - [`SheetsClient`]: `Spreadsheet` over the Google Sheets v4 API
//! - [`ServiceAccountAuth`]: access tokens from a service-account key file
//!
//! Clients are built once per run from a [`daylog_core::Config`] and keep a
//! single `ureq` agent, so connections and access tokens are reused across
//! days. None of them retry on their own; the reconciler wraps every call in
//! its retry policy.
//!
//! ## Example
//!
//! ```rust,ignore
//! use daylog_remote::{SheetsClient, TodoistClient};
//!
//! let todoist = TodoistClient::from_config(&config);
//! let sheets = SheetsClient::from_config(&config)?;
//! ```

pub mod auth;
pub mod http;
pub mod sheets;
pub mod todoist;

pub use auth::{ServiceAccountAuth, ServiceAccountKey, StaticToken, TokenProvider};
pub use sheets::SheetsClient;
pub use todoist::TodoistClient;
