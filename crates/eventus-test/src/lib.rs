//! Eventus Test - Shared test utilities for the eventus bus.
//!
//! This crate provides fixture events, recording mocks, and harness helpers
//! used by the integration tests of the `eventus` crate.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! eventus-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! use eventus::Bus;
//! use eventus_test::{Recorder, UserAction};
//!
//! #[test]
//! fn test_order() {
//!     let bus = Bus::new();
//!     let recorder = Recorder::new();
//!     bus.subscribe(recorder.tag::<UserAction>("first"));
//!     bus.publish(UserAction::new("clicked"));
//!     assert_eq!(recorder.take(), vec!["first"]);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
