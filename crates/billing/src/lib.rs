//! Billing counter domain (scan-to-cart reconciliation).
//!
//! Pure, synchronous state transitions: no IO, no locking. The reconciler
//! owns a local stock snapshot and the open cart; callers feed it scan events
//! one at a time and resync it from the backend after every checkout.

pub mod cart;
pub mod clock;
pub mod dedupe;
pub mod error;
pub mod event;
pub mod product;
pub mod reconciler;
pub mod scan;

pub use cart::{CartLine, CartMutation, CartSnapshot};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dedupe::DedupeGuard;
pub use error::ScanError;
pub use event::BillingEvent;
pub use product::ProductSnapshot;
pub use reconciler::{DEFAULT_COOLDOWN, ResyncReport, ScanReconciler, Shortfall};
pub use scan::{ScanEvent, ScanSource};
