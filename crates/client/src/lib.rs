//! `stockdesk-client`
//!
//! **Responsibility:** the billing counter's side of the system.
//!
//! This crate provides:
//! - A typed client for the inventory/billing backend (`Backend`, `HttpBackend`)
//! - A billing session that serializes scan sources into one reconciler
//! - Checkout with mandatory resync against the backend
//! - Cached auth session and role-based routing
//! - Stock requests, inventory reporting and display helpers
//!
//! The backend remains the authority on stock, users and bills.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod remote;
pub mod reporting;
pub mod requests;
pub mod session;
pub mod types;

pub use auth::{AuthSession, Role, RouteDecision, SessionStore};
pub use backend::Backend;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpBackend;
pub use remote::RemoteScan;
pub use reporting::Currency;
pub use session::{BillingSession, ScanRecord, SessionHandle};
