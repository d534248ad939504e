//! Error handling for the scorekeeping engine.

pub mod domain;

pub use domain::DomainError;
