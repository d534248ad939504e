//! Game state and round records.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::serde_lenient as lenient;
use super::team_identity::{
    derive_team_display, ensure_players_array, format_team_display, parse_legacy_team_name,
    PlayerPair, ResolvedTeam, TeamSource,
};
use crate::config::PenaltyType;

/// One of the two partnerships at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Us,
    Dem,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Us, Side::Dem];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Us => "us",
            Side::Dem => "dem",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "us" => Some(Side::Us),
            "dem" => Some(Side::Dem),
            _ => None,
        }
    }

    pub fn opponent(&self) -> Side {
        match self {
            Side::Us => Side::Dem,
            Side::Dem => Side::Us,
        }
    }

    /// Fallback display name used when a side has no players.
    pub fn default_label(&self) -> &'static str {
        match self {
            Side::Us => "Us",
            Side::Dem => "Dem",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score pair, one value per side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    #[serde(default, deserialize_with = "lenient::int")]
    pub us: i32,
    #[serde(default, deserialize_with = "lenient::int")]
    pub dem: i32,
}

impl Totals {
    pub const fn new(us: i32, dem: i32) -> Self {
        Self { us, dem }
    }

    pub fn get(&self, side: Side) -> i32 {
        match side {
            Side::Us => self.us,
            Side::Dem => self.dem,
        }
    }

    pub fn set(&mut self, side: Side, value: i32) {
        match side {
            Side::Us => self.us = value,
            Side::Dem => self.dem = value,
        }
    }

    /// Saturating so corrupt stored values can never overflow.
    pub fn plus(&self, delta: Totals) -> Totals {
        Totals::new(
            self.us.saturating_add(delta.us),
            self.dem.saturating_add(delta.dem),
        )
    }

    /// Differential from the point of view of `us`.
    pub fn diff(&self) -> i32 {
        self.us.saturating_sub(self.dem)
    }

    pub fn leader(&self) -> Option<Side> {
        match self.us.cmp(&self.dem) {
            std::cmp::Ordering::Greater => Some(Side::Us),
            std::cmp::Ordering::Less => Some(Side::Dem),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Tag attached to penalty rounds and to the pending penalty flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PenaltyKind {
    /// Table talk.
    #[default]
    Cheat,
}

/// One completed bidding cycle. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    #[serde(default, deserialize_with = "lenient::opt_side")]
    pub bidding_team: Option<Side>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub bid_amount: i32,
    #[serde(default, deserialize_with = "lenient::int")]
    pub us_points: i32,
    #[serde(default, deserialize_with = "lenient::int")]
    pub dem_points: i32,
    /// Cumulative score immediately after this round.
    #[serde(default, deserialize_with = "lenient::totals")]
    pub running_totals: Totals,
    #[serde(default, deserialize_with = "lenient::text")]
    pub us_team_name_on_round: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub dem_team_name_on_round: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_lenient"
    )]
    pub penalty: Option<PenaltyKind>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_lenient"
    )]
    pub penalty_type: Option<PenaltyType>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_int"
    )]
    pub penalty_amount: Option<i32>,
}

impl Round {
    pub fn points(&self, side: Side) -> i32 {
        match side {
            Side::Us => self.us_points,
            Side::Dem => self.dem_points,
        }
    }

    pub fn deltas(&self) -> Totals {
        Totals::new(self.us_points, self.dem_points)
    }

    /// Points the bidding side earned this round.
    pub fn bidder_points(&self) -> Option<i32> {
        self.bidding_team.map(|side| self.points(side))
    }

    /// The bidding side finished below zero for the round.
    pub fn bidder_was_set(&self) -> bool {
        self.bidder_points().is_some_and(|p| p < 0)
    }

    pub fn is_penalty(&self) -> bool {
        self.penalty.is_some()
    }
}

/// How a finished game was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VictoryMethod {
    #[serde(rename = "1000 Point Spread")]
    PointSpread,
    #[serde(rename = "Set Other Team")]
    SetOtherTeam,
    #[serde(rename = "Won on Bid")]
    WonOnBid,
    /// Label carried by penalty rounds that did not match another rule.
    #[serde(rename = "Penalty: Lost Bid")]
    PenaltyLostBid,
    /// Redo only: a side is past 500 and the bidder was not set.
    #[serde(rename = "Reached 500+")]
    Reached500,
    /// Redo only: both sides level past 500.
    #[serde(rename = "Tie at 500+")]
    TieAt500,
}

impl VictoryMethod {
    pub fn label(&self) -> &'static str {
        match self {
            VictoryMethod::PointSpread => "1000 Point Spread",
            VictoryMethod::SetOtherTeam => "Set Other Team",
            VictoryMethod::WonOnBid => "Won on Bid",
            VictoryMethod::PenaltyLostBid => "Penalty: Lost Bid",
            VictoryMethod::Reached500 => "Reached 500+",
            VictoryMethod::TieAt500 => "Tie at 500+",
        }
    }
}

impl fmt::Display for VictoryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Table-talk flag that overrides the next resolved round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPenalty {
    #[serde(rename = "type", default)]
    pub kind: PenaltyKind,
    pub team: Side,
}

/// Entry remembered for a side while it is deselected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedInput {
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub bid_amount: Option<i32>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub enter_bidder_points: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedInputs {
    #[serde(default, deserialize_with = "lenient::opt_lenient")]
    pub us: Option<SavedInput>,
    #[serde(default, deserialize_with = "lenient::opt_lenient")]
    pub dem: Option<SavedInput>,
}

impl SavedInputs {
    pub fn get(&self, side: Side) -> Option<&SavedInput> {
        match side {
            Side::Us => self.us.as_ref(),
            Side::Dem => self.dem.as_ref(),
        }
    }

    pub fn set(&mut self, side: Side, input: Option<SavedInput>) {
        match side {
            Side::Us => self.us = input,
            Side::Dem => self.dem = input,
        }
    }
}

/// A zero-points submission waiting for the 180 / 360 choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingZeroPoints {
    pub bidding_team: Side,
    pub bid_amount: i32,
    /// The zero was typed for the bidding side.
    pub entered_for_bidder: bool,
}

/// Where the round entry currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPhase {
    NoBidSelected,
    TeamSelected,
    BidChosen,
    /// Resolution suspended until the zero-points choice arrives.
    PointsPending,
}

/// The single active game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    #[serde(default, deserialize_with = "lenient::list")]
    pub rounds: Vec<Round>,
    /// Stack: the last element is the first to be redone.
    #[serde(default, deserialize_with = "lenient::list")]
    pub undone_rounds: Vec<Round>,
    #[serde(default, deserialize_with = "lenient::totals")]
    pub starting_totals: Totals,

    #[serde(default, deserialize_with = "lenient::opt_side")]
    pub bidding_team: Option<Side>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub bid_amount: Option<i32>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub enter_bidder_points: bool,
    #[serde(default)]
    pub saved_score_input_states: SavedInputs,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub last_bid_amount: Option<i32>,
    #[serde(default, deserialize_with = "lenient::opt_side")]
    pub last_bid_team: Option<Side>,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub game_over: bool,
    #[serde(default, deserialize_with = "lenient::opt_side")]
    pub winner: Option<Side>,
    #[serde(default, deserialize_with = "lenient::opt_lenient")]
    pub victory_method: Option<VictoryMethod>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub us_team_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub dem_team_name: String,
    #[serde(default, deserialize_with = "lenient::players")]
    pub us_players: PlayerPair,
    #[serde(default, deserialize_with = "lenient::players")]
    pub dem_players: PlayerPair,

    /// Epoch millis when the running timer was (re)started.
    #[serde(default, deserialize_with = "lenient::opt_long")]
    pub start_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient::long")]
    pub accumulated_time: i64,
    #[serde(default, deserialize_with = "lenient::opt_long")]
    pub timer_last_saved_at: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_lenient")]
    pub pending_penalty: Option<PendingPenalty>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_lenient"
    )]
    pub pending_zero_points: Option<PendingZeroPoints>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh game for two named partnerships.
    pub fn with_players(us: PlayerPair, dem: PlayerPair) -> Self {
        let mut state = Self::default();
        state.set_players(Side::Us, us);
        state.set_players(Side::Dem, dem);
        state
    }

    /// Decode a persisted record, resolving legacy free-text team names
    /// into player pairs.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        if !value.is_object() {
            return Err(serde::de::Error::custom("game state must be an object"));
        }
        let us = stored_team(&value, "usPlayers", "usTeamName");
        let dem = stored_team(&value, "demPlayers", "demTeamName");
        let mut state: GameState = serde_json::from_value(value)?;
        state.apply_team_source(Side::Us, &us);
        state.apply_team_source(Side::Dem, &dem);
        Ok(state)
    }

    fn apply_team_source(&mut self, side: Side, source: &TeamSource) {
        let (players, name) = match source {
            TeamSource::Players { players, label } => {
                let name = label
                    .clone()
                    .unwrap_or_else(|| format_team_display(players));
                (players.clone(), name)
            }
            TeamSource::Legacy(name) => {
                let players = parse_legacy_team_name(name);
                let display = derive_team_display(&players, name);
                (players, display)
            }
            TeamSource::Unknown => return,
        };
        match side {
            Side::Us => {
                self.us_players = players;
                self.us_team_name = name;
            }
            Side::Dem => {
                self.dem_players = players;
                self.dem_team_name = name;
            }
        }
    }

    pub fn players(&self, side: Side) -> &PlayerPair {
        match side {
            Side::Us => &self.us_players,
            Side::Dem => &self.dem_players,
        }
    }

    /// Replace a side's players and refresh its display name.
    pub fn set_players(&mut self, side: Side, players: PlayerPair) {
        let team = ResolvedTeam::from_players(&players, "", side.default_label());
        match side {
            Side::Us => {
                self.us_players = ensure_players_array(&players);
                self.us_team_name = team.display;
            }
            Side::Dem => {
                self.dem_players = ensure_players_array(&players);
                self.dem_team_name = team.display;
            }
        }
    }

    /// Stored display name, or "Us" / "Dem".
    pub fn team_name(&self, side: Side) -> &str {
        let name = match side {
            Side::Us => self.us_team_name.as_str(),
            Side::Dem => self.dem_team_name.as_str(),
        };
        if name.is_empty() {
            side.default_label()
        } else {
            name
        }
    }

    /// Canonical identity for one side of the active game.
    pub fn team(&self, side: Side) -> ResolvedTeam {
        ResolvedTeam::from_players(self.players(side), self.team_name(side), side.default_label())
    }

    pub fn base_totals(&self) -> Totals {
        self.starting_totals
    }

    /// Running totals after the last round, or the starting totals.
    pub fn last_running_totals(&self) -> Totals {
        self.rounds
            .last()
            .map(|r| r.running_totals)
            .unwrap_or(self.starting_totals)
    }

    /// Starting totals plus every recorded delta.
    pub fn current_totals(&self) -> Totals {
        self.rounds
            .iter()
            .fold(self.starting_totals, |acc, r| acc.plus(r.deltas()))
    }

    pub fn has_rounds(&self) -> bool {
        !self.rounds.is_empty()
    }

    pub fn entry_phase(&self) -> EntryPhase {
        if self.pending_zero_points.is_some() {
            return EntryPhase::PointsPending;
        }
        match (self.bidding_team, self.bid_amount) {
            (None, _) => EntryPhase::NoBidSelected,
            (Some(_), None) => EntryPhase::TeamSelected,
            (Some(_), Some(_)) => EntryPhase::BidChosen,
        }
    }

    /// Drop the in-progress entry for the next round.
    pub fn clear_entry(&mut self) {
        self.bidding_team = None;
        self.bid_amount = None;
        self.enter_bidder_points = false;
        self.pending_zero_points = None;
    }
}

fn stored_team(value: &Value, players_key: &str, name_key: &str) -> TeamSource {
    TeamSource::from_stored(
        value.get(players_key).filter(|v| !v.is_null()),
        value.get(name_key).and_then(Value::as_str),
    )
}
