//! Completed and frozen game snapshots.
//!
//! Both record kinds are read from storage through a `Stored*` shape that
//! accepts every historic layout (legacy free-text team names, missing
//! fields, stringly numbers) and resolves team identity exactly once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::macros::format_description;
use time::OffsetDateTime;

use super::serde_lenient as lenient;
use super::state::{GameState, Round, Side, Totals, VictoryMethod};
use super::team_identity::{PlayerPair, ResolvedTeam, TeamKey, TeamSource};
use super::timing::{epoch_millis, safe_time_accumulation, MAX_GAME_TIME_MS};
use crate::errors::domain::{DomainError, ValidationKind};

/// Per-team line of a completed game's summary, keyed by display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    #[serde(default, deserialize_with = "lenient::int")]
    pub total_points: i32,
    #[serde(default, deserialize_with = "lenient::int")]
    pub wins: i32,
}

/// A finished (or abandoned-and-saved) game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredCompletedGame")]
pub struct CompletedGame {
    pub us_team_name: String,
    pub dem_team_name: String,
    pub us_players: PlayerPair,
    pub dem_players: PlayerPair,
    pub us_team_key: Option<TeamKey>,
    pub dem_team_key: Option<TeamKey>,
    pub rounds: Vec<Round>,
    pub final_score: Totals,
    pub starting_totals: Totals,
    pub winner: Option<Side>,
    pub victory_method: Option<VictoryMethod>,
    #[serde(serialize_with = "time::serde::rfc3339::option::serialize")]
    pub timestamp: Option<OffsetDateTime>,
    pub duration_ms: i64,
    pub player_stats: BTreeMap<String, TeamSummary>,
}

impl CompletedGame {
    /// Snapshot the active game for the completed collection.
    pub fn from_state(state: &GameState, now: OffsetDateTime) -> Result<Self, DomainError> {
        if !state.has_rounds() {
            return Err(DomainError::validation(
                ValidationKind::NoRoundsPlayed,
                "No rounds played yet.",
            ));
        }
        let us = state.team(Side::Us);
        let dem = state.team(Side::Dem);
        let final_score = state.current_totals();
        let duration_ms =
            safe_time_accumulation(state.accumulated_time, state.start_time, epoch_millis(now));

        let mut player_stats = BTreeMap::new();
        for (side, team) in [(Side::Us, &us), (Side::Dem, &dem)] {
            player_stats.insert(
                team.display.clone(),
                TeamSummary {
                    total_points: final_score.get(side),
                    wins: i32::from(state.winner == Some(side)),
                },
            );
        }

        Ok(Self {
            us_team_name: us.display,
            dem_team_name: dem.display,
            us_players: us.players,
            dem_players: dem.players,
            us_team_key: us.key,
            dem_team_key: dem.key,
            rounds: state.rounds.clone(),
            final_score,
            starting_totals: state.starting_totals,
            winner: state.winner,
            victory_method: state.victory_method,
            timestamp: Some(now),
            duration_ms,
            player_stats,
        })
    }

    pub fn team(&self, side: Side) -> ResolvedTeam {
        match side {
            Side::Us => ResolvedTeam {
                players: self.us_players.clone(),
                display: self.us_team_name.clone(),
                key: self.us_team_key.clone(),
            },
            Side::Dem => ResolvedTeam {
                players: self.dem_players.clone(),
                display: self.dem_team_name.clone(),
                key: self.dem_team_key.clone(),
            },
        }
    }

    /// Either side matches by team key or by display name.
    pub fn involves_team(&self, key: &str, display_name: &str) -> bool {
        involves(
            [&self.us_team_key, &self.dem_team_key],
            [&self.us_team_name, &self.dem_team_name],
            key,
            display_name,
        )
    }
}

/// A paused game waiting to be resumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredFrozenGame")]
pub struct FrozenGame {
    pub name: String,
    pub us_name: String,
    pub dem_name: String,
    pub us_players: PlayerPair,
    pub dem_players: PlayerPair,
    pub us_team_key: Option<TeamKey>,
    pub dem_team_key: Option<TeamKey>,
    pub final_score: Totals,
    /// e.g. "120 (Ann & Bob)", or "N/A".
    pub last_bid: String,
    pub rounds: Vec<Round>,
    pub starting_totals: Totals,
    #[serde(serialize_with = "time::serde::rfc3339::option::serialize")]
    pub timestamp: Option<OffsetDateTime>,
    pub accumulated_time: i64,
    pub bidding_team: Option<Side>,
    pub bid_amount: Option<i32>,
    pub enter_bidder_points: bool,
    pub last_bid_amount: Option<i32>,
    pub last_bid_team: Option<Side>,
}

impl FrozenGame {
    /// Snapshot an unfinished game for the freezer.
    pub fn from_state(state: &GameState, now: OffsetDateTime) -> Result<Self, DomainError> {
        if state.game_over {
            return Err(DomainError::validation(
                ValidationKind::GameOver,
                "Finished games cannot be frozen.",
            ));
        }
        if !state.has_rounds() {
            return Err(DomainError::validation(
                ValidationKind::NoRoundsPlayed,
                "No active game to freeze.",
            ));
        }
        let us = state.team(Side::Us);
        let dem = state.team(Side::Dem);
        let last_bid = match state.rounds.last() {
            Some(round) if round.bid_amount != 0 => {
                let bidder = match round.bidding_team {
                    Some(Side::Us) => us.display.as_str(),
                    _ => dem.display.as_str(),
                };
                format!("{} ({})", round.bid_amount, bidder)
            }
            _ => "N/A".to_string(),
        };
        let clock = now
            .format(format_description!("[hour]:[minute]:[second]"))
            .unwrap_or_default();

        Ok(Self {
            name: format!("FROZEN-{clock}"),
            us_name: us.display,
            dem_name: dem.display,
            us_players: us.players,
            dem_players: dem.players,
            us_team_key: us.key,
            dem_team_key: dem.key,
            final_score: state.current_totals(),
            last_bid,
            rounds: state.rounds.clone(),
            starting_totals: state.starting_totals,
            timestamp: Some(now),
            accumulated_time: safe_time_accumulation(
                state.accumulated_time,
                state.start_time,
                epoch_millis(now),
            ),
            bidding_team: state.bidding_team,
            bid_amount: state.bid_amount,
            enter_bidder_points: state.enter_bidder_points,
            last_bid_amount: state.last_bid_amount,
            last_bid_team: state.last_bid_team,
        })
    }

    /// Rebuild an active game from this snapshot; the timer restarts at `now`.
    pub fn resume(&self, now: OffsetDateTime) -> GameState {
        GameState {
            rounds: self.rounds.clone(),
            starting_totals: self.starting_totals,
            bidding_team: self.bidding_team,
            bid_amount: self.bid_amount,
            enter_bidder_points: self.enter_bidder_points,
            last_bid_amount: self.last_bid_amount,
            last_bid_team: self.last_bid_team,
            us_players: self.us_players.clone(),
            dem_players: self.dem_players.clone(),
            us_team_name: self.us_name.clone(),
            dem_team_name: self.dem_name.clone(),
            accumulated_time: self.accumulated_time.clamp(0, MAX_GAME_TIME_MS),
            start_time: Some(epoch_millis(now)),
            ..GameState::default()
        }
    }

    pub fn team(&self, side: Side) -> ResolvedTeam {
        match side {
            Side::Us => ResolvedTeam {
                players: self.us_players.clone(),
                display: self.us_name.clone(),
                key: self.us_team_key.clone(),
            },
            Side::Dem => ResolvedTeam {
                players: self.dem_players.clone(),
                display: self.dem_name.clone(),
                key: self.dem_team_key.clone(),
            },
        }
    }

    pub fn involves_team(&self, key: &str, display_name: &str) -> bool {
        involves(
            [&self.us_team_key, &self.dem_team_key],
            [&self.us_name, &self.dem_name],
            key,
            display_name,
        )
    }
}

fn involves(
    keys: [&Option<TeamKey>; 2],
    names: [&String; 2],
    key: &str,
    display_name: &str,
) -> bool {
    let by_key = !key.is_empty() && keys.iter().any(|k| k.as_ref().is_some_and(|k| k.as_str() == key));
    let by_name = !display_name.is_empty() && names.iter().any(|n| n.as_str() == display_name);
    by_key || by_name
}

/// Pick the first stored players field that is present.
fn first_present(candidates: [&Option<Value>; 2]) -> Option<&Value> {
    candidates
        .into_iter()
        .filter_map(Option::as_ref)
        .find(|v| !v.is_null())
}

/// First non-empty stored name.
fn first_name<'a>(candidates: [&'a str; 2]) -> Option<&'a str> {
    candidates.into_iter().find(|n| !n.trim().is_empty())
}

fn resolve_side(players: [&Option<Value>; 2], names: [&str; 2], side: Side) -> ResolvedTeam {
    TeamSource::from_stored(first_present(players), first_name(names)).resolve(side.default_label())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCompletedGame {
    #[serde(default)]
    us_players: Option<Value>,
    #[serde(default)]
    us_team_players: Option<Value>,
    #[serde(default)]
    dem_players: Option<Value>,
    #[serde(default)]
    dem_team_players: Option<Value>,
    #[serde(default, deserialize_with = "lenient::text")]
    us_team_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    us_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    dem_team_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    dem_name: String,
    #[serde(default, deserialize_with = "lenient::list")]
    rounds: Vec<Round>,
    #[serde(default, deserialize_with = "lenient::opt_lenient")]
    final_score: Option<Totals>,
    #[serde(default, deserialize_with = "lenient::totals")]
    starting_totals: Totals,
    #[serde(default, deserialize_with = "lenient::opt_side")]
    winner: Option<Side>,
    #[serde(default, deserialize_with = "lenient::opt_lenient")]
    victory_method: Option<VictoryMethod>,
    #[serde(default, deserialize_with = "lenient::opt_timestamp")]
    timestamp: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "lenient::long")]
    duration_ms: i64,
    #[serde(default, deserialize_with = "lenient::opt_lenient")]
    player_stats: Option<BTreeMap<String, TeamSummary>>,
}

impl From<StoredCompletedGame> for CompletedGame {
    fn from(raw: StoredCompletedGame) -> Self {
        let us = resolve_side(
            [&raw.us_players, &raw.us_team_players],
            [&raw.us_team_name, &raw.us_name],
            Side::Us,
        );
        let dem = resolve_side(
            [&raw.dem_players, &raw.dem_team_players],
            [&raw.dem_team_name, &raw.dem_name],
            Side::Dem,
        );
        let final_score = raw.final_score.unwrap_or_else(|| {
            raw.rounds
                .iter()
                .fold(raw.starting_totals, |acc, r| acc.plus(r.deltas()))
        });
        Self {
            us_team_name: us.display,
            dem_team_name: dem.display,
            us_players: us.players,
            dem_players: dem.players,
            us_team_key: us.key,
            dem_team_key: dem.key,
            rounds: raw.rounds,
            final_score,
            starting_totals: raw.starting_totals,
            winner: raw.winner,
            victory_method: raw.victory_method,
            timestamp: raw.timestamp,
            duration_ms: raw.duration_ms.max(0),
            player_stats: raw.player_stats.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredFrozenGame {
    #[serde(default, deserialize_with = "lenient::text")]
    name: String,
    #[serde(default)]
    us_players: Option<Value>,
    #[serde(default)]
    us_team_players: Option<Value>,
    #[serde(default)]
    dem_players: Option<Value>,
    #[serde(default)]
    dem_team_players: Option<Value>,
    #[serde(default, deserialize_with = "lenient::text")]
    us_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    us_team_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    dem_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    dem_team_name: String,
    #[serde(default, deserialize_with = "lenient::opt_lenient")]
    final_score: Option<Totals>,
    #[serde(default, deserialize_with = "lenient::text")]
    last_bid: String,
    #[serde(default, deserialize_with = "lenient::list")]
    rounds: Vec<Round>,
    #[serde(default, deserialize_with = "lenient::totals")]
    starting_totals: Totals,
    #[serde(default, deserialize_with = "lenient::opt_timestamp")]
    timestamp: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "lenient::long")]
    accumulated_time: i64,
    #[serde(default, deserialize_with = "lenient::opt_side")]
    bidding_team: Option<Side>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    bid_amount: Option<i32>,
    #[serde(default, deserialize_with = "lenient::flag")]
    enter_bidder_points: bool,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    last_bid_amount: Option<i32>,
    #[serde(default, deserialize_with = "lenient::opt_side")]
    last_bid_team: Option<Side>,
}

impl From<StoredFrozenGame> for FrozenGame {
    fn from(raw: StoredFrozenGame) -> Self {
        let us = resolve_side(
            [&raw.us_players, &raw.us_team_players],
            [&raw.us_name, &raw.us_team_name],
            Side::Us,
        );
        let dem = resolve_side(
            [&raw.dem_players, &raw.dem_team_players],
            [&raw.dem_name, &raw.dem_team_name],
            Side::Dem,
        );
        let final_score = raw.final_score.unwrap_or_else(|| {
            raw.rounds
                .iter()
                .fold(raw.starting_totals, |acc, r| acc.plus(r.deltas()))
        });
        let last_bid = if raw.last_bid.is_empty() {
            "N/A".to_string()
        } else {
            raw.last_bid
        };
        Self {
            name: raw.name,
            us_name: us.display,
            dem_name: dem.display,
            us_players: us.players,
            dem_players: dem.players,
            us_team_key: us.key,
            dem_team_key: dem.key,
            final_score,
            last_bid,
            rounds: raw.rounds,
            starting_totals: raw.starting_totals,
            timestamp: raw.timestamp,
            accumulated_time: raw.accumulated_time.max(0),
            bidding_team: raw.bidding_team,
            bid_amount: raw.bid_amount,
            enter_bidder_points: raw.enter_bidder_points,
            last_bid_amount: raw.last_bid_amount,
            last_bid_team: raw.last_bid_team,
        }
    }
}
