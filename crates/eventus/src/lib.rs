//! Eventus - in-process typed publish/subscribe event bus.
//!
//! This crate provides:
//! - A subscriber registry keyed by event type, kept in priority order
//! - Synchronous, short-circuiting dispatch on the caller's thread
//! - Threaded and async dispatch on a fixed-size worker pool
//! - Garbage collection of empty event buckets
//! - [`OwnedSubscription`], a scope guard that unsubscribes on drop
//!
//! # Architecture
//!
//! Any `'static` type is an event type. Subscribers register a callback
//! `Fn(&mut E) -> bool` for one event type; returning `false` stops delivery
//! to lower-priority subscribers. There are three ways to publish:
//!
//! 1. **[`Bus::publish`]**: subscribers run in priority order on the calling
//!    thread and see each other's changes to the event.
//!
//! 2. **[`Bus::publish_threaded`]**: the same synchronous publish, run as one
//!    task on the worker pool.
//!
//! 3. **[`Bus::publish_async`]**: one pool task per subscriber, with no
//!    ordering between them.
//!
//! All failures are lookup misses reported as a [`Status`]; nothing panics on
//! a miss.
//!
//! # Example
//!
//! ```rust
//! use eventus::{Bus, Status};
//!
//! struct UserAction {
//!     name: String,
//! }
//!
//! let bus = Bus::new();
//!
//! bus.subscribe_with_priority(
//!     |e: &mut UserAction| {
//!         e.name.push_str(" (validated)");
//!         true
//!     },
//!     10,
//! );
//! bus.subscribe(|e: &mut UserAction| {
//!     assert!(e.name.ends_with("(validated)"));
//!     true
//! });
//!
//! assert_eq!(bus.publish(UserAction { name: "clicked".into() }), Status::Ok);
//! ```
//!
//! # Features
//!
//! - `thread-safe` (default): guard the registry with a reentrant lock.
//! - `threading` (default, implies `thread-safe`): the worker pool and the
//!   threaded/async publish variants.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod ops;
pub mod prelude;

mod bus;
mod config;
mod key;
mod log;
mod multi;
mod owned;
#[cfg(feature = "threading")]
mod pool;
mod registry;
mod status;
mod subscriber;
mod sync;

pub use bus::Bus;
pub use config::{
    BusConfig, ConfigError, ConfigResult, ENV_DEBUG_LOG, ENV_GC, ENV_WORKERS,
};
pub use key::EventKey;
pub use log::{LogLevel, LogRecord, LogSink, TracingSink};
#[cfg(feature = "threading")]
pub use multi::SendEventSet;
pub use multi::{EventSet, EventTypes};
pub use owned::OwnedSubscription;
pub use status::{BusError, BusResult, Status, status_string};
pub use subscriber::{EventHandler, SubscriberId};
pub use sync::ThreadBound;
