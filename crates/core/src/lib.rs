//! `stockdesk-core`: domain building blocks shared by every crate.
//!
//! This crate contains **pure domain** primitives shared by the billing
//! counter and the backend client (no IO, no async).

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{BillId, ProductId, SessionId, StockRequestId, UserId};
pub use money::Money;
pub use value_object::ValueObject;
