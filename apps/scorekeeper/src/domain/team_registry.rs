//! Versioned team collection with win/loss counters.
//!
//! The counters are derived data: [`TeamRegistry::recalculate`] rebuilds them
//! from the completed-game corpus at any time.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::archive::CompletedGame;
use super::state::{GameState, Side};
use super::team_identity::{
    canonicalize_players, derive_team_display, ensure_players_value, parse_legacy_team_name,
    PlayerPair, ResolvedTeam, TeamKey,
};

pub const TEAM_STORAGE_VERSION: u64 = 2;
pub const STORAGE_VERSION_FIELD: &str = "__storageVersion";

const UNNAMED_TEAM: &str = "Unnamed Team";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamEntry {
    pub players: PlayerPair,
    pub display_name: String,
    pub wins: u32,
    pub losses: u32,
    pub games_played: u32,
}

impl TeamEntry {
    fn reset_counters(&mut self) {
        self.wins = 0;
        self.losses = 0;
        self.games_played = 0;
    }
}

/// A game result to add (`direction = 1`) or retract (`-1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamResultDelta {
    pub us: ResolvedTeam,
    pub dem: ResolvedTeam,
    pub winner: Option<Side>,
    pub direction: i32,
}

impl TeamResultDelta {
    /// Result of the active game as it stands.
    pub fn for_state(state: &GameState, winner: Option<Side>, direction: i32) -> Self {
        Self {
            us: state.team(Side::Us),
            dem: state.team(Side::Dem),
            winner,
            direction,
        }
    }

    pub fn for_completed(game: &CompletedGame, direction: i32) -> Self {
        Self {
            us: game.team(Side::Us),
            dem: game.team(Side::Dem),
            winner: game.winner,
            direction,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamRegistry {
    teams: BTreeMap<TeamKey, TeamEntry>,
}

fn counter(value: Option<&Value>) -> u32 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.min(u32::MAX as f64) as u32)
        .unwrap_or(0)
}

fn bump(value: u32, direction: i32) -> u32 {
    if direction >= 0 {
        value.saturating_add(direction.unsigned_abs())
    } else {
        value.saturating_sub(direction.unsigned_abs())
    }
}

impl TeamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read any historic storage layout. The flag reports whether the
    /// stored form differs from the current one and should be rewritten.
    pub fn from_storage(raw: &Value) -> (Self, bool) {
        let Some(obj) = raw.as_object() else {
            return (Self::new(), !raw.is_null());
        };
        let version = obj.get(STORAGE_VERSION_FIELD).and_then(Value::as_u64);
        let entries: Vec<(&String, &Value)> = obj
            .iter()
            .filter(|(k, _)| k.as_str() != STORAGE_VERSION_FIELD)
            .collect();
        if entries.is_empty() {
            return (Self::new(), version != Some(TEAM_STORAGE_VERSION));
        }

        let already_current = entries
            .iter()
            .all(|(_, v)| v.get("players").is_some_and(Value::is_array));
        let mut registry = Self::new();

        if version == Some(TEAM_STORAGE_VERSION) && already_current {
            for (key, value) in entries {
                let Some(key) = TeamKey::parse(key) else {
                    continue;
                };
                let players = ensure_players_value(value.get("players").unwrap_or(&Value::Null));
                let stored_name = value.get("displayName").and_then(Value::as_str).unwrap_or("");
                registry.teams.insert(
                    key,
                    TeamEntry {
                        display_name: derive_team_display(&players, stored_name),
                        players,
                        wins: counter(value.get("wins")),
                        losses: counter(value.get("losses")),
                        games_played: counter(value.get("gamesPlayed")),
                    },
                );
            }
            return (registry, false);
        }

        for (legacy_name, payload) in entries {
            let players = match payload.get("players").filter(|p| p.is_array()) {
                Some(players) => canonicalize_players(&ensure_players_value(players)),
                _ => canonicalize_players(&parse_legacy_team_name(legacy_name)),
            };
            let Some(key) = TeamKey::from_players(&players) else {
                continue;
            };
            let display_name = derive_team_display(&players, legacy_name);
            let entry = registry.teams.entry(key).or_insert_with(|| TeamEntry {
                players: players.clone(),
                display_name: display_name.clone(),
                ..TeamEntry::default()
            });
            entry.wins = entry.wins.saturating_add(counter(payload.get("wins")));
            entry.losses = entry.losses.saturating_add(counter(payload.get("losses")));
            entry.games_played = entry
                .games_played
                .saturating_add(counter(payload.get("gamesPlayed")));
            if entry.display_name.is_empty() {
                entry.display_name = display_name;
            }
        }
        (registry, true)
    }

    /// Current storage form, tagged with [`TEAM_STORAGE_VERSION`].
    pub fn to_storage(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(STORAGE_VERSION_FIELD.to_string(), Value::from(TEAM_STORAGE_VERSION));
        for (key, entry) in &self.teams {
            let players = canonicalize_players(&entry.players);
            let stored = TeamEntry {
                display_name: derive_team_display(&players, &entry.display_name),
                players,
                ..entry.clone()
            };
            if let Ok(value) = serde_json::to_value(stored) {
                obj.insert(key.to_string(), value);
            }
        }
        Value::Object(obj)
    }

    pub fn get(&self, key: &TeamKey) -> Option<&TeamEntry> {
        self.teams.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TeamKey, &TeamEntry)> {
        self.teams.iter()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Register a team if new. Returns its key, or `None` for no players.
    pub fn ensure_entry(&mut self, players: &PlayerPair, fallback_display: &str) -> Option<TeamKey> {
        let players = canonicalize_players(players);
        let key = TeamKey::from_players(&players)?;
        let fallback = if fallback_display.is_empty() {
            UNNAMED_TEAM
        } else {
            fallback_display
        };
        let entry = self.teams.entry(key.clone()).or_insert_with(|| TeamEntry {
            players: players.clone(),
            display_name: derive_team_display(&players, fallback),
            ..TeamEntry::default()
        });
        if entry.display_name.is_empty() {
            entry.display_name = derive_team_display(&players, fallback);
        }
        Some(key)
    }

    /// Add or retract one game result; counters never drop below zero.
    /// Returns `false` when either side has no players or is unknown.
    pub fn apply_result_delta(&mut self, delta: &TeamResultDelta) -> bool {
        if delta.direction == 0 {
            return false;
        }
        let (Some(us_key), Some(dem_key)) = (delta.us.key.clone(), delta.dem.key.clone()) else {
            return false;
        };
        if delta.direction > 0 {
            self.ensure_entry(&delta.us.players, &delta.us.display);
            self.ensure_entry(&delta.dem.players, &delta.dem.display);
        }
        if !self.teams.contains_key(&us_key) || !self.teams.contains_key(&dem_key) {
            return false;
        }

        for (key, team) in [(&us_key, &delta.us), (&dem_key, &delta.dem)] {
            if let Some(entry) = self.teams.get_mut(key) {
                entry.players = canonicalize_players(&entry.players);
                if entry.display_name.is_empty() {
                    entry.display_name = team.display.clone();
                }
                entry.games_played = bump(entry.games_played, delta.direction);
            }
        }
        let outcome = match delta.winner {
            Some(Side::Us) => Some((&us_key, &dem_key)),
            Some(Side::Dem) => Some((&dem_key, &us_key)),
            None => None,
        };
        if let Some((winner_key, loser_key)) = outcome {
            if let Some(entry) = self.teams.get_mut(winner_key) {
                entry.wins = bump(entry.wins, delta.direction);
            }
            if let Some(entry) = self.teams.get_mut(loser_key) {
                entry.losses = bump(entry.losses, delta.direction);
            }
        }
        true
    }

    /// Zero every counter and replay the completed corpus, plus the active
    /// game when it has finished.
    pub fn recalculate(&mut self, completed: &[CompletedGame], active: Option<&GameState>) {
        for entry in self.teams.values_mut() {
            entry.reset_counters();
        }
        for game in completed {
            self.apply_result_delta(&TeamResultDelta::for_completed(game, 1));
        }
        if let Some(state) = active.filter(|s| s.game_over && s.has_rounds()) {
            self.apply_result_delta(&TeamResultDelta::for_state(state, state.winner, 1));
        }
    }

    pub fn remove(&mut self, key: &TeamKey) -> Option<TeamEntry> {
        self.teams.remove(key)
    }

    /// Key of the entry whose display name equals `display_name`.
    pub fn find_by_display(&self, display_name: &str) -> Option<TeamKey> {
        self.teams
            .iter()
            .find(|(_, entry)| derive_team_display(&entry.players, &entry.display_name) == display_name)
            .map(|(key, _)| key.clone())
    }
}
