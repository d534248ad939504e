//! In-process store for tests and embedding.

use serde_json::Value;
use tracing::warn;

use super::{LoadOutcome, Persistence};
use crate::config::Settings;
use crate::domain::archive::{CompletedGame, FrozenGame};
use crate::domain::state::GameState;
use crate::domain::team_registry::TeamRegistry;
use crate::error::AppError;

/// Keeps the active game as raw JSON so that load behaves like a real store,
/// including the discard path for corrupt records.
#[derive(Debug, Default)]
pub struct MemoryStore {
    active: Option<Value>,
    completed: Vec<CompletedGame>,
    frozen: Vec<FrozenGame>,
    teams: Value,
    settings: Settings,
    /// When set, every write fails.
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the raw active record, e.g. with a legacy or broken payload.
    pub fn with_raw_active(mut self, raw: Value) -> Self {
        self.active = Some(raw);
        self
    }

    /// Seed the raw team collection in any historic layout.
    pub fn with_raw_teams(mut self, raw: Value) -> Self {
        self.teams = raw;
        self
    }

    pub fn with_completed(mut self, games: Vec<CompletedGame>) -> Self {
        self.completed = games;
        self
    }

    pub fn raw_active(&self) -> Option<&Value> {
        self.active.as_ref()
    }

    pub fn raw_teams(&self) -> &Value {
        &self.teams
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes {
            return Err(AppError::internal("memory store is read-only"));
        }
        Ok(())
    }
}

impl Persistence for MemoryStore {
    fn load_active(&mut self) -> Result<LoadOutcome, AppError> {
        let Some(raw) = self.active.clone() else {
            return Ok(LoadOutcome::Empty);
        };
        match GameState::from_json(raw) {
            Ok(state) => Ok(LoadOutcome::Loaded(state)),
            Err(err) => {
                warn!(error = %err, "Discarding unreadable active game");
                self.active = None;
                Ok(LoadOutcome::Discarded {
                    reason: err.to_string(),
                })
            }
        }
    }

    fn save_active(&mut self, state: &GameState) -> Result<(), AppError> {
        self.check_writable()?;
        self.active = Some(serde_json::to_value(state)?);
        Ok(())
    }

    fn clear_active(&mut self) -> Result<(), AppError> {
        self.check_writable()?;
        self.active = None;
        Ok(())
    }

    fn list_completed(&self) -> Result<Vec<CompletedGame>, AppError> {
        Ok(self.completed.clone())
    }

    fn replace_completed(&mut self, games: Vec<CompletedGame>) -> Result<(), AppError> {
        self.check_writable()?;
        self.completed = games;
        Ok(())
    }

    fn list_frozen(&self) -> Result<Vec<FrozenGame>, AppError> {
        Ok(self.frozen.clone())
    }

    fn replace_frozen(&mut self, games: Vec<FrozenGame>) -> Result<(), AppError> {
        self.check_writable()?;
        self.frozen = games;
        Ok(())
    }

    fn load_teams(&mut self) -> Result<TeamRegistry, AppError> {
        let (registry, changed) = TeamRegistry::from_storage(&self.teams);
        if changed && !self.fail_writes {
            self.teams = registry.to_storage();
        }
        Ok(registry)
    }

    fn save_teams(&mut self, teams: &TeamRegistry) -> Result<(), AppError> {
        self.check_writable()?;
        self.teams = teams.to_storage();
        Ok(())
    }

    fn load_settings(&self) -> Result<Settings, AppError> {
        Ok(self.settings.clone())
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<(), AppError> {
        self.check_writable()?;
        self.settings = settings.clone();
        Ok(())
    }
}
