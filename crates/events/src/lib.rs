//! Billing-side events and the pub/sub plumbing that carries them to
//! subscribers (counter display, scanner feedback, audit log).

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
