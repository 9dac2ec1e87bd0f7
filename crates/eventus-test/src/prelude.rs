//! Prelude module - commonly used test utilities.
//!
//! Use `use eventus_test::prelude::*;` to import the helpers most tests need.

pub use crate::fixtures::{Counter, ModifiableEvent, Notice, UserAction};
pub use crate::harness::{eventually, setup_test_logging, test_config_file, wait_until};
pub use crate::mocks::{CapturingSink, Recorder};
