//! Team identity: canonical keys and display names for player pairs.
//!
//! A team is the unordered pair of its two players. Every stored record,
//! whether it carries a player array or only a legacy free-text name like
//! "Ann & Bob", resolves to the same [`TeamKey`] for the same two people.

use std::cmp::Ordering;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Joins the two lower-cased names inside a team key.
pub const TEAM_KEY_SEPARATOR: &str = "||";

/// Fixed two-slot player array; an empty string marks a missing player.
pub type PlayerPair = [String; 2];

/// Collapse internal whitespace runs and trim both ends.
pub fn sanitize_player_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Coerce a slice of names into a sanitized two-slot array. Never fails.
pub fn ensure_players_array<S: AsRef<str>>(input: &[S]) -> PlayerPair {
    let first = input.first().map(|s| s.as_ref()).unwrap_or("");
    let second = input.get(1).map(|s| s.as_ref()).unwrap_or("");
    [sanitize_player_name(first), sanitize_player_name(second)]
}

/// Coerce an arbitrary stored JSON value into a sanitized two-slot array.
///
/// Non-arrays yield two empty slots; non-string entries become empty.
pub fn ensure_players_value(input: &Value) -> PlayerPair {
    let slot = |idx: usize| -> String {
        input
            .as_array()
            .and_then(|arr| arr.get(idx))
            .and_then(Value::as_str)
            .map(sanitize_player_name)
            .unwrap_or_default()
    };
    [slot(0), slot(1)]
}

fn case_insensitive(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Sort the non-empty names case-insensitively; a lone name lands in slot 0.
pub fn canonicalize_players<S: AsRef<str>>(players: &[S]) -> PlayerPair {
    let arr = ensure_players_array(players);
    let mut non_empty: Vec<String> = arr.iter().filter(|n| !n.is_empty()).cloned().collect();
    if non_empty.is_empty() {
        return arr;
    }
    non_empty.sort_by(|a, b| case_insensitive(a, b));
    let mut iter = non_empty.into_iter();
    [
        iter.next().unwrap_or_default(),
        iter.next().unwrap_or_default(),
    ]
}

/// Order-independent key: lower-cased non-empty names, sorted, joined by
/// [`TEAM_KEY_SEPARATOR`]. Two empty names yield the empty string, which
/// callers treat as "no team".
pub fn build_team_key<S: AsRef<str>>(players: &[S]) -> String {
    let mut cleaned: Vec<String> = ensure_players_array(players)
        .iter()
        .filter(|n| !n.is_empty())
        .map(|n| n.to_lowercase())
        .collect();
    cleaned.sort();
    cleaned.join(TEAM_KEY_SEPARATOR)
}

/// Non-empty names joined by " & ".
pub fn format_team_display<S: AsRef<str>>(players: &[S]) -> String {
    ensure_players_array(players)
        .iter()
        .filter(|n| !n.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" & ")
}

/// Display name for a pair, or `fallback` when no player is known.
pub fn derive_team_display<S: AsRef<str>>(players: &[S], fallback: &str) -> String {
    let display = format_team_display(players);
    if display.is_empty() {
        fallback.to_string()
    } else {
        display
    }
}

/// Same two people, regardless of order or case of entry.
pub fn players_equal<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> bool {
    canonicalize_players(a) == canonicalize_players(b)
}

struct LegacySeparators;

impl LegacySeparators {
    /// Separators in priority order: `&`, `and`, `+`, `/`, `,`.
    fn all() -> &'static [Regex] {
        static SEPARATORS: Lazy<Vec<Regex>> = Lazy::new(|| {
            [
                r"\s*&\s*",
                r"(?i)\s+and\s+",
                r"\s*\+\s*",
                r"\s*/\s*",
                r"\s*,\s*",
            ]
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
        });
        &SEPARATORS
    }
}

/// Split a legacy free-text team name into two players.
///
/// The first separator that yields at least two non-empty parts wins. With no
/// usable separator the whole text becomes the first player.
pub fn parse_legacy_team_name(team_name: &str) -> PlayerPair {
    let raw = sanitize_player_name(team_name);
    if raw.is_empty() {
        return [String::new(), String::new()];
    }
    for sep in LegacySeparators::all() {
        if !sep.is_match(&raw) {
            continue;
        }
        let parts: Vec<String> = sep
            .split(&raw)
            .map(sanitize_player_name)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() >= 2 {
            return [parts[0].clone(), parts[1].clone()];
        }
    }
    [raw, String::new()]
}

/// Canonical team key. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamKey(String);

impl TeamKey {
    pub fn from_players<S: AsRef<str>>(players: &[S]) -> Option<Self> {
        let key = build_team_key(players);
        if key.is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    /// Wrap an already-built key string; empty strings are not keys.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a stored record describes one side of a game.
///
/// Resolved exactly once, when the record is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamSource {
    /// Record carries an explicit player array, plus an optional stored label.
    Players { players: PlayerPair, label: Option<String> },
    /// Record only has a free-text name such as "Ann and Bob".
    Legacy(String),
    /// Nothing usable was stored.
    Unknown,
}

impl TeamSource {
    /// Classify the raw fields of a stored record.
    pub fn from_stored(players: Option<&Value>, label: Option<&str>) -> Self {
        let label = label.map(str::trim).filter(|l| !l.is_empty());
        match (players, label) {
            (Some(value), label) if value.is_array() => TeamSource::Players {
                players: ensure_players_value(value),
                label: label.map(str::to_string),
            },
            (_, Some(name)) => TeamSource::Legacy(name.to_string()),
            _ => TeamSource::Unknown,
        }
    }

    pub fn resolve(&self, fallback: &str) -> ResolvedTeam {
        let (players, label) = match self {
            TeamSource::Players { players, label } => {
                (canonicalize_players(players), label.as_deref())
            }
            TeamSource::Legacy(name) => {
                (canonicalize_players(&parse_legacy_team_name(name)), Some(name.as_str()))
            }
            TeamSource::Unknown => ([String::new(), String::new()], None),
        };
        let display = derive_team_display(&players, label.unwrap_or(fallback));
        let display = if display.is_empty() {
            fallback.to_string()
        } else {
            display
        };
        let key = TeamKey::from_players(&players);
        ResolvedTeam {
            players,
            display,
            key,
        }
    }
}

/// Canonical view of one side: players, display name, and key if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTeam {
    pub players: PlayerPair,
    pub display: String,
    pub key: Option<TeamKey>,
}

impl ResolvedTeam {
    pub fn from_players<S: AsRef<str>>(players: &[S], label: &str, fallback: &str) -> Self {
        let label = if label.trim().is_empty() {
            None
        } else {
            Some(label.to_string())
        };
        TeamSource::Players {
            players: ensure_players_array(players),
            label,
        }
        .resolve(fallback)
    }
}
