//! Domain-level error type used across the engine, the store and the CLI.
//!
//! This error type is I/O-agnostic. Fallible store and controller operations
//! return `Result<T, crate::error::AppError>` and convert from `DomainError`
//! using the provided `From<DomainError> for AppError` implementation.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Validation failures raised while entering or resolving a round.
///
/// Every variant is non-fatal: the attempted transition is rejected and the
/// game state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationKind {
    InvalidBid,
    InvalidPoints,
    MissingBid,
    MissingBiddingTeam,
    GameOver,
    NothingToUndo,
    NothingToRedo,
    NoPendingZeroPoints,
    InvalidStartingTotals,
    NoRoundsPlayed,
    InvalidTeams,
    Other(String),
}

/// Domain-level not found entities
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    CompletedGame,
    FrozenGame,
    Team,
    Other(String),
}

/// Central domain error type
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Input/user validation or scoring rule violation
    Validation(ValidationKind, String),
    /// Missing archived record or team
    NotFound(NotFoundKind, String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(_, d) => write!(f, "{d}"),
            DomainError::NotFound(kind, d) => write!(f, "not found {kind:?}: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation(kind, detail.into())
    }
    pub fn validation_other(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::Validation(ValidationKind::Other(detail.clone()), detail)
    }
    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }

    /// The validation kind, if this is a validation failure.
    pub fn validation_kind(&self) -> Option<&ValidationKind> {
        match self {
            DomainError::Validation(kind, _) => Some(kind),
            DomainError::NotFound(..) => None,
        }
    }

    /// Message suitable for showing to the person keeping score.
    pub fn user_message(&self) -> String {
        match self {
            DomainError::Validation(_, d) => d.clone(),
            DomainError::NotFound(..) => self.to_string(),
        }
    }
}
