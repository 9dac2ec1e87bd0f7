//! Prelude module - commonly used types for convenient import.
//!
//! Use `use eventus::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use eventus::prelude::*;
//!
//! struct Ping;
//!
//! let bus = Bus::new();
//! let id = bus.subscribe(|_: &mut Ping| true);
//! let owned: OwnedSubscription = bus.scoped::<Ping>(id);
//! assert_eq!(bus.publish(Ping), Status::Ok);
//! drop(owned);
//! ```

// Bus
pub use crate::{Bus, BusConfig};

// Subscribers
pub use crate::{EventHandler, EventKey, OwnedSubscription, SubscriberId};

// Status
pub use crate::{BusError, Status};

// Logging
pub use crate::{LogLevel, LogRecord, LogSink, TracingSink};
