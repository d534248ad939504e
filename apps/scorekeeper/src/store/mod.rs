//! Persistence collaborator contracts.
//!
//! The engine never performs I/O itself; the controller hands finished
//! states and archives to a [`Persistence`] implementation.

pub mod json_file;
pub mod memory;

use serde::Serialize;
use tracing::info;

use crate::config::Settings;
use crate::domain::archive::{CompletedGame, FrozenGame};
use crate::domain::state::GameState;
use crate::domain::team_registry::TeamRegistry;
use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind};

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Result of reading the stored active game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Empty,
    Loaded(GameState),
    /// The stored record was unreadable and has been removed.
    Discarded { reason: String },
}

pub trait Persistence {
    fn load_active(&mut self) -> Result<LoadOutcome, AppError>;
    fn save_active(&mut self, state: &GameState) -> Result<(), AppError>;
    fn clear_active(&mut self) -> Result<(), AppError>;

    fn list_completed(&self) -> Result<Vec<CompletedGame>, AppError>;
    fn replace_completed(&mut self, games: Vec<CompletedGame>) -> Result<(), AppError>;

    fn list_frozen(&self) -> Result<Vec<FrozenGame>, AppError>;
    fn replace_frozen(&mut self, games: Vec<FrozenGame>) -> Result<(), AppError>;

    fn load_teams(&mut self) -> Result<TeamRegistry, AppError>;
    fn save_teams(&mut self, teams: &TeamRegistry) -> Result<(), AppError>;

    fn load_settings(&self) -> Result<Settings, AppError>;
    fn save_settings(&mut self, settings: &Settings) -> Result<(), AppError>;

    fn append_completed(&mut self, game: CompletedGame) -> Result<(), AppError> {
        let mut games = self.list_completed()?;
        games.push(game);
        self.replace_completed(games)
    }

    fn remove_completed(&mut self, index: usize) -> Result<CompletedGame, AppError> {
        let mut games = self.list_completed()?;
        if index >= games.len() {
            return Err(DomainError::not_found(
                NotFoundKind::CompletedGame,
                format!("No saved game at position {index}."),
            )
            .into());
        }
        let removed = games.remove(index);
        self.replace_completed(games)?;
        Ok(removed)
    }

    /// Newest frozen game first.
    fn prepend_frozen(&mut self, game: FrozenGame) -> Result<(), AppError> {
        let mut games = self.list_frozen()?;
        games.insert(0, game);
        self.replace_frozen(games)
    }

    fn remove_frozen(&mut self, index: usize) -> Result<FrozenGame, AppError> {
        let mut games = self.list_frozen()?;
        if index >= games.len() {
            return Err(DomainError::not_found(
                NotFoundKind::FrozenGame,
                format!("No frozen game at position {index}."),
            )
            .into());
        }
        let removed = games.remove(index);
        self.replace_frozen(games)?;
        Ok(removed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub completed_games: usize,
    pub frozen_games: usize,
    pub teams: usize,
}

/// Rewrite every stored collection in its current canonical form.
///
/// Records are resolved on read, so a read followed by a write is the whole
/// migration.
pub fn migrate<S: Persistence + ?Sized>(store: &mut S) -> Result<MigrationReport, AppError> {
    let completed = store.list_completed()?;
    let frozen = store.list_frozen()?;
    let teams = store.load_teams()?;
    let report = MigrationReport {
        completed_games: completed.len(),
        frozen_games: frozen.len(),
        teams: teams.len(),
    };
    store.replace_completed(completed)?;
    store.replace_frozen(frozen)?;
    store.save_teams(&teams)?;
    info!(
        completed = report.completed_games,
        frozen = report.frozen_games,
        teams = report.teams,
        "Stored records migrated"
    );
    Ok(report)
}
