//! Scorekeeper test support utilities
//!
//! Logging initialization and builders shared by the integration tests.

pub mod fixtures;
pub mod logging;
