use std::path::PathBuf;

use thiserror::Error;

use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {detail}")]
    Validation {
        kind: ValidationKind,
        detail: String,
    },
    #[error("Not found: {detail}")]
    NotFound { kind: NotFoundKind, detail: String },
    #[error("Storage error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Corrupt data in {what}: {detail}")]
    CorruptData { what: &'static str, detail: String },
    #[error("Internal error: {detail}")]
    Internal { detail: String },
}

impl AppError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { kind, .. } => match kind {
                ValidationKind::InvalidBid => "INVALID_BID",
                ValidationKind::InvalidPoints => "INVALID_POINTS",
                ValidationKind::MissingBid => "MISSING_BID",
                ValidationKind::MissingBiddingTeam => "MISSING_BIDDING_TEAM",
                ValidationKind::GameOver => "GAME_OVER",
                ValidationKind::NothingToUndo => "NOTHING_TO_UNDO",
                ValidationKind::NothingToRedo => "NOTHING_TO_REDO",
                ValidationKind::NoPendingZeroPoints => "NO_PENDING_ZERO_POINTS",
                ValidationKind::InvalidStartingTotals => "INVALID_STARTING_TOTALS",
                ValidationKind::NoRoundsPlayed => "NO_ROUNDS_PLAYED",
                ValidationKind::InvalidTeams => "INVALID_TEAMS",
                _ => "VALIDATION_ERROR",
            },
            AppError::NotFound { kind, .. } => match kind {
                NotFoundKind::CompletedGame => "COMPLETED_GAME_NOT_FOUND",
                NotFoundKind::FrozenGame => "FROZEN_GAME_NOT_FOUND",
                NotFoundKind::Team => "TEAM_NOT_FOUND",
                _ => "NOT_FOUND",
            },
            AppError::Io { .. } => "IO_ERROR",
            AppError::Serde(_) => "SERDE_ERROR",
            AppError::CorruptData { .. } => "CORRUPT_DATA",
            AppError::Internal { .. } => "INTERNAL",
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt(what: &'static str, detail: impl Into<String>) -> Self {
        Self::CorruptData {
            what,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(kind, detail) => AppError::Validation { kind, detail },
            DomainError::NotFound(kind, detail) => AppError::NotFound { kind, detail },
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(source: std::io::Error) -> Self {
        AppError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
