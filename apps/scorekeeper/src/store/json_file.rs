//! One JSON document per key inside a data directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{LoadOutcome, Persistence};
use crate::config::Settings;
use crate::domain::archive::{CompletedGame, FrozenGame};
use crate::domain::state::GameState;
use crate::domain::team_registry::TeamRegistry;
use crate::error::AppError;

pub const ACTIVE_FILE: &str = "active_game.json";
pub const COMPLETED_FILE: &str = "completed_games.json";
pub const FROZEN_FILE: &str = "frozen_games.json";
pub const TEAMS_FILE: &str = "teams.json";
pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a data directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| AppError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Raw bytes of `file`, or `None` when it does not exist.
    fn read(&self, file: &str) -> Result<Option<Vec<u8>>, AppError> {
        let path = self.path(file);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::io(path, e)),
        }
    }

    /// Write through a sibling temp file so readers never see half a document.
    fn write<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<(), AppError> {
        let path = self.path(file);
        let tmp = self.path(&format!("{file}.tmp"));
        let bytes = serde_json::to_vec_pretty(value)?;
        fs::write(&tmp, bytes).map_err(|e| AppError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| AppError::io(&path, e))
    }

    fn remove(&self, file: &str) -> Result<(), AppError> {
        let path = self.path(file);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::io(path, e)),
        }
    }

    fn read_collection<T: DeserializeOwned>(
        &self,
        file: &str,
        what: &'static str,
    ) -> Result<Vec<T>, AppError> {
        match self.read(file)? {
            None => Ok(Vec::new()),
            Some(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| AppError::corrupt(what, e.to_string()))
            }
        }
    }
}

impl Persistence for JsonFileStore {
    fn load_active(&mut self) -> Result<LoadOutcome, AppError> {
        let Some(bytes) = self.read(ACTIVE_FILE)? else {
            return Ok(LoadOutcome::Empty);
        };
        let parsed = serde_json::from_slice::<Value>(&bytes).and_then(GameState::from_json);
        match parsed {
            Ok(state) => Ok(LoadOutcome::Loaded(state)),
            Err(err) => {
                warn!(error = %err, path = %self.path(ACTIVE_FILE).display(), "Discarding unreadable active game");
                self.remove(ACTIVE_FILE)?;
                Ok(LoadOutcome::Discarded {
                    reason: err.to_string(),
                })
            }
        }
    }

    fn save_active(&mut self, state: &GameState) -> Result<(), AppError> {
        self.write(ACTIVE_FILE, state)
    }

    fn clear_active(&mut self) -> Result<(), AppError> {
        self.remove(ACTIVE_FILE)
    }

    fn list_completed(&self) -> Result<Vec<CompletedGame>, AppError> {
        self.read_collection(COMPLETED_FILE, "completed games")
    }

    fn replace_completed(&mut self, games: Vec<CompletedGame>) -> Result<(), AppError> {
        self.write(COMPLETED_FILE, &games)
    }

    fn list_frozen(&self) -> Result<Vec<FrozenGame>, AppError> {
        self.read_collection(FROZEN_FILE, "frozen games")
    }

    fn replace_frozen(&mut self, games: Vec<FrozenGame>) -> Result<(), AppError> {
        self.write(FROZEN_FILE, &games)
    }

    fn load_teams(&mut self) -> Result<TeamRegistry, AppError> {
        let raw = match self.read(TEAMS_FILE)? {
            None => Value::Null,
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| AppError::corrupt("teams", e.to_string()))?,
        };
        let (registry, changed) = TeamRegistry::from_storage(&raw);
        if changed {
            info!(teams = registry.len(), "Rewriting team storage in current format");
            self.write(TEAMS_FILE, &registry.to_storage())?;
        }
        Ok(registry)
    }

    fn save_teams(&mut self, teams: &TeamRegistry) -> Result<(), AppError> {
        self.write(TEAMS_FILE, &teams.to_storage())
    }

    fn load_settings(&self) -> Result<Settings, AppError> {
        let Some(bytes) = self.read(SETTINGS_FILE)? else {
            return Ok(Settings::default());
        };
        match serde_json::from_slice(&bytes) {
            Ok(settings) => Ok(settings),
            Err(err) => {
                warn!(error = %err, "Unreadable settings, using defaults");
                Ok(Settings::default())
            }
        }
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<(), AppError> {
        self.write(SETTINGS_FILE, settings)
    }
}
