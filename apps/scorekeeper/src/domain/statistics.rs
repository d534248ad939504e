//! Team and player statistics over the completed-game corpus.
//!
//! Aggregates are always rebuilt from scratch; nothing here is incremental.

use std::collections::HashMap;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;

use super::archive::{CompletedGame, FrozenGame};
use super::rules::SWEEP_POINTS;
use super::state::{GameState, Round, Side};
use super::team_identity::{sanitize_player_name, PlayerPair, ResolvedTeam, TeamKey};
use super::team_registry::TeamRegistry;
use crate::errors::domain::{DomainError, NotFoundKind};

/// Set opponents a team must have outscored in one game to count as sandbagging.
pub const SANDBAG_THRESHOLD: usize = 2;
/// Points that count as a strong hand against a failing bidder.
pub const SANDBAG_POINTS: i32 = 80;

/// Counters shared by team and player records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub total_bid_amount: i64,
    pub bids_made: u32,
    pub bids_succeeded: u32,
    pub hands_played: u32,
    pub hands_won: u32,
    pub sandbag_games: u32,
    #[serde(rename = "count360")]
    pub perfect_360s: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub last_played: OffsetDateTime,
    pub total_time_ms: i64,
}

impl Default for Tally {
    fn default() -> Self {
        Self {
            games_played: 0,
            wins: 0,
            losses: 0,
            total_bid_amount: 0,
            bids_made: 0,
            bids_succeeded: 0,
            hands_played: 0,
            hands_won: 0,
            sandbag_games: 0,
            perfect_360s: 0,
            last_played: OffsetDateTime::UNIX_EPOCH,
            total_time_ms: 0,
        }
    }
}

impl Tally {
    /// Win percentage to one decimal; 0 before any game.
    pub fn win_percent(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        ((self.wins as f64 / self.games_played as f64) * 1000.0).round() / 10.0
    }

    pub fn average_bid(&self) -> Option<i64> {
        (self.bids_made > 0).then(|| (self.total_bid_amount as f64 / self.bids_made as f64).round() as i64)
    }

    pub fn bid_success_percent(&self) -> Option<f64> {
        (self.bids_made > 0)
            .then(|| ((self.bids_succeeded as f64 / self.bids_made as f64) * 1000.0).round() / 10.0)
    }

    /// More than half of the games played were sandbagged.
    pub fn is_sandbagger(&self) -> bool {
        self.games_played > 0 && self.sandbag_games as f64 / self.games_played as f64 > 0.5
    }

    fn seen_at(&mut self, at: OffsetDateTime) {
        if at > self.last_played {
            self.last_played = at;
        }
    }

    fn record_game(&mut self, game: &GameView<'_>, side: Side) {
        self.games_played += 1;
        self.total_time_ms = self.total_time_ms.saturating_add(game.duration_ms);
        match game.winner {
            Some(winner) if winner == side => self.wins += 1,
            Some(_) => self.losses += 1,
            None => {}
        }
        for round in game.rounds {
            self.record_round(round, side);
        }
        if game.sandbagged[side_index(side)] {
            self.sandbag_games += 1;
        }
    }

    fn record_round(&mut self, round: &Round, side: Side) {
        let own = round.points(side);
        let other = round.points(side.opponent());
        self.hands_played += 1;
        if own > other {
            self.hands_won += 1;
        }
        if own == SWEEP_POINTS {
            self.perfect_360s += 1;
        }
        if round.bidding_team == Some(side) {
            self.bids_made += 1;
            self.total_bid_amount += round.bid_amount as i64;
            if own >= round.bid_amount {
                self.bids_succeeded += 1;
            }
        }
    }
}

/// Derived figures shown next to the raw counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Derived {
    pub win_percent: f64,
    pub avg_bid: Option<i64>,
    pub bid_success_pct: Option<f64>,
    pub sandbagger: bool,
}

impl From<&Tally> for Derived {
    fn from(t: &Tally) -> Self {
        Self {
            win_percent: t.win_percent(),
            avg_bid: t.average_bid(),
            bid_success_pct: t.bid_success_percent(),
            sandbagger: t.is_sandbagger(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub key: TeamKey,
    pub name: String,
    pub players: PlayerPair,
    #[serde(flatten)]
    pub tally: Tally,
    #[serde(flatten)]
    pub derived: Derived,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    /// Lower-cased sanitized name.
    pub key: String,
    pub name: String,
    #[serde(flatten)]
    pub tally: Tally,
    #[serde(flatten)]
    pub derived: Derived,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsReport {
    pub total_games: usize,
    pub overall_average_bid: Option<i64>,
    pub total_time_played_ms: i64,
    /// Most recently played first.
    pub teams: Vec<TeamStats>,
    pub players: Vec<PlayerStats>,
}

fn side_index(side: Side) -> usize {
    match side {
        Side::Us => 0,
        Side::Dem => 1,
    }
}

/// Whether `side` outscored a set opposing bidder at least
/// [`SANDBAG_THRESHOLD`] times in `game`.
pub fn is_sandbag_game(game: &CompletedGame, side: Side) -> bool {
    sandbag_opportunities(&game.rounds, side) >= SANDBAG_THRESHOLD
}

fn sandbag_opportunities(rounds: &[Round], side: Side) -> usize {
    let opponent = side.opponent();
    rounds
        .iter()
        .filter(|r| r.bidding_team == Some(opponent) && r.points(opponent) < 0)
        .filter(|r| {
            let own = r.points(side);
            own >= SANDBAG_POINTS || own >= r.bid_amount
        })
        .count()
}

struct GameView<'a> {
    rounds: &'a [Round],
    winner: Option<Side>,
    duration_ms: i64,
    sandbagged: [bool; 2],
}

#[derive(Default)]
struct Aggregator {
    teams: Vec<TeamStats>,
    team_index: HashMap<TeamKey, usize>,
    players: Vec<PlayerStats>,
    player_index: HashMap<String, usize>,
}

impl Aggregator {
    fn team(&mut self, team: &ResolvedTeam, at: OffsetDateTime) -> Option<&mut TeamStats> {
        let key = team.key.clone()?;
        let idx = match self.team_index.get(&key) {
            Some(idx) => *idx,
            None => {
                self.teams.push(TeamStats {
                    key: key.clone(),
                    name: team.display.clone(),
                    players: team.players.clone(),
                    tally: Tally::default(),
                    derived: Derived::from(&Tally::default()),
                });
                self.team_index.insert(key, self.teams.len() - 1);
                self.teams.len() - 1
            }
        };
        let record = &mut self.teams[idx];
        record.tally.seen_at(at);
        Some(record)
    }

    fn player(&mut self, name: &str, at: OffsetDateTime) -> Option<&mut PlayerStats> {
        let clean = sanitize_player_name(name);
        if clean.is_empty() {
            return None;
        }
        let key = clean.to_lowercase();
        let idx = match self.player_index.get(&key) {
            Some(idx) => *idx,
            None => {
                self.players.push(PlayerStats {
                    key: key.clone(),
                    name: clean,
                    tally: Tally::default(),
                    derived: Derived::from(&Tally::default()),
                });
                self.player_index.insert(key, self.players.len() - 1);
                self.players.len() - 1
            }
        };
        let record = &mut self.players[idx];
        record.tally.seen_at(at);
        Some(record)
    }
}

/// Build the full report from the completed games. Undated games count as
/// played at `now`.
pub fn aggregate(corpus: &[CompletedGame], now: OffsetDateTime) -> StatisticsReport {
    let mut agg = Aggregator::default();
    let mut total_games = 0;
    let mut total_time = 0i64;
    let mut bid_sum = 0i64;
    let mut bid_count = 0i64;

    for game in corpus.iter().filter(|g| !g.rounds.is_empty()) {
        total_games += 1;
        let duration_ms = game.duration_ms.max(0);
        total_time = total_time.saturating_add(duration_ms);
        let at = game.timestamp.unwrap_or(now);
        let view = GameView {
            rounds: &game.rounds,
            winner: game.winner,
            duration_ms,
            sandbagged: [
                is_sandbag_game(game, Side::Us),
                is_sandbag_game(game, Side::Dem),
            ],
        };
        for round in game.rounds.iter().filter(|r| r.bid_amount != 0) {
            bid_sum += round.bid_amount as i64;
            bid_count += 1;
        }

        for side in Side::ALL {
            let team = game.team(side);
            if let Some(record) = agg.team(&team, at) {
                record.tally.record_game(&view, side);
            }
            for name in team.players.iter().filter(|n| !n.is_empty()) {
                if let Some(record) = agg.player(name, at) {
                    record.tally.record_game(&view, side);
                }
            }
        }
    }

    let Aggregator {
        mut teams,
        mut players,
        ..
    } = agg;
    for team in &mut teams {
        team.derived = Derived::from(&team.tally);
    }
    for player in &mut players {
        player.derived = Derived::from(&player.tally);
    }
    teams.sort_by(|a, b| b.tally.last_played.cmp(&a.tally.last_played));
    players.sort_by(|a, b| b.tally.last_played.cmp(&a.tally.last_played));

    StatisticsReport {
        total_games,
        overall_average_bid: (bid_count > 0).then(|| (bid_sum as f64 / bid_count as f64).round() as i64),
        total_time_played_ms: total_time,
        teams,
        players,
    }
}

/// What a team deletion removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDeletion {
    pub removed_key: Option<TeamKey>,
    pub removed_completed: usize,
    pub removed_frozen: usize,
}

/// Remove a team and every saved or frozen game it played in, then rebuild
/// the registry counters from what is left.
///
/// The team is found by key, falling back to its display name. Games match
/// by either.
pub fn delete_team(
    registry: &mut TeamRegistry,
    completed: &mut Vec<CompletedGame>,
    frozen: &mut Vec<FrozenGame>,
    active: Option<&GameState>,
    team_key: Option<&str>,
    display_name: &str,
) -> Result<TeamDeletion, DomainError> {
    let requested = team_key.and_then(TeamKey::parse);
    let registered = requested
        .clone()
        .filter(|k| registry.get(k).is_some())
        .or_else(|| (!display_name.is_empty()).then(|| registry.find_by_display(display_name)).flatten());
    let match_key = registered.clone().or(requested);
    if match_key.is_none() && display_name.is_empty() {
        return Err(DomainError::not_found(
            NotFoundKind::Team,
            "Team not found.",
        ));
    }
    let key_str = match_key.as_ref().map(TeamKey::as_str).unwrap_or("");

    if let Some(key) = &registered {
        registry.remove(key);
    }
    let before_completed = completed.len();
    completed.retain(|g| !g.involves_team(key_str, display_name));
    let before_frozen = frozen.len();
    frozen.retain(|g| !g.involves_team(key_str, display_name));
    registry.recalculate(completed, active);

    let deletion = TeamDeletion {
        removed_key: registered,
        removed_completed: before_completed - completed.len(),
        removed_frozen: before_frozen - frozen.len(),
    };
    info!(
        key = key_str,
        display_name,
        completed = deletion.removed_completed,
        frozen = deletion.removed_frozen,
        "Team deleted"
    );
    Ok(deletion)
}
