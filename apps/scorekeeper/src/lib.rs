//! Rook scorekeeping engine: round resolution, undo / redo, win probability
//! and statistics over a persisted game history.

pub mod clock;
pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod errors;
pub mod store;
pub mod telemetry;

#[cfg(test)]
pub mod test_bootstrap;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{PenaltyType, Settings};
pub use controller::Scorekeeper;
pub use error::AppError;
pub use errors::DomainError;
pub use store::{JsonFileStore, LoadOutcome, MemoryStore, Persistence};

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
