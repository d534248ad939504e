//! Round entry and resolution.
//!
//! Every transition validates its inputs before touching the state, so a
//! rejected call leaves the game exactly as it was.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::rules::{validate_bid, validate_points, validate_starting_total, HAND_POINTS, SWEEP_POINTS};
use super::scoring::{distribute, penalty_deltas, HandEntry};
use super::state::{
    EntryPhase, GameState, PenaltyKind, PendingPenalty, PendingZeroPoints, Round, SavedInput,
    Side, Totals, VictoryMethod,
};
use super::team_identity::{ensure_players_array, ResolvedTeam, TeamKey};
use super::team_registry::TeamResultDelta;
use super::termination::{check_resolved_round, Termination};
use super::timing;
use crate::config::{PenaltyType, Settings};
use crate::errors::domain::{DomainError, ValidationKind};

/// Outcome of a recorded round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResolved {
    pub round: Round,
    pub termination: Termination,
    /// Registry change owed when the round finished the game with a winner.
    pub team_delta: Option<TeamResultDelta>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Resolved(RoundResolved),
    /// A zero was entered; resolution waits for [`resolve_zero_points`].
    NeedsZeroPointsChoice(PendingZeroPoints),
}

/// What a zero-points entry actually meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZeroPointsChoice {
    OneEighty,
    ThreeSixty,
}

impl ZeroPointsChoice {
    pub fn points(self) -> i32 {
        match self {
            ZeroPointsChoice::OneEighty => HAND_POINTS,
            ZeroPointsChoice::ThreeSixty => SWEEP_POINTS,
        }
    }
}

/// Both partnerships after a successful [`assign_teams`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamAssignment {
    pub us: ResolvedTeam,
    pub dem: ResolvedTeam,
}

fn ensure_in_progress(state: &GameState) -> Result<(), DomainError> {
    if state.game_over {
        return Err(DomainError::validation(
            ValidationKind::GameOver,
            "Game is over. Undo the last round or start a new game.",
        ));
    }
    Ok(())
}

fn require_entry(state: &GameState) -> Result<(Side, i32), DomainError> {
    let bidder = state.bidding_team.ok_or_else(|| {
        DomainError::validation(ValidationKind::MissingBiddingTeam, "Please select bid amount.")
    })?;
    let bid = state
        .bid_amount
        .filter(|b| *b != 0)
        .ok_or_else(|| DomainError::validation(ValidationKind::MissingBid, "Please select bid amount."))?;
    validate_bid(bid)?;
    Ok((bidder, bid))
}

/// Toggle the bidding side.
///
/// Deselecting remembers that side's entry; selecting restores it and
/// forgets the opposite side's remembered entry.
pub fn select_team(state: &mut GameState, side: Side) -> Result<EntryPhase, DomainError> {
    ensure_in_progress(state)?;
    if state.bidding_team == Some(side) {
        state.saved_score_input_states.set(
            side,
            Some(SavedInput {
                bid_amount: state.bid_amount,
                enter_bidder_points: state.enter_bidder_points,
            }),
        );
        state.clear_entry();
        return Ok(state.entry_phase());
    }

    state
        .saved_score_input_states
        .set(side.opponent(), None);
    state.clear_entry();
    state.bidding_team = Some(side);
    if let Some(saved) = state.saved_score_input_states.get(side).cloned() {
        state.bid_amount = saved.bid_amount;
        state.enter_bidder_points = saved.enter_bidder_points;
    }
    Ok(state.entry_phase())
}

pub fn choose_bid(state: &mut GameState, bid: i32) -> Result<(), DomainError> {
    ensure_in_progress(state)?;
    let bidder = state.bidding_team.ok_or_else(|| {
        DomainError::validation(ValidationKind::MissingBiddingTeam, "Select the bidding team first.")
    })?;
    validate_bid(bid)?;
    state.bid_amount = Some(bid);
    state.last_bid_amount = Some(bid);
    state.last_bid_team = Some(bidder);
    state.pending_zero_points = None;
    Ok(())
}

/// Whether the points about to be entered belong to the bidding side.
pub fn set_points_owner(state: &mut GameState, for_bidder: bool) -> Result<(), DomainError> {
    ensure_in_progress(state)?;
    state.enter_bidder_points = for_bidder;
    Ok(())
}

/// Score the hand with `points` entered for the side chosen by
/// [`set_points_owner`]. A zero is parked until the 180 / 360 choice.
pub fn submit_points(
    state: &mut GameState,
    points: i32,
    settings: &Settings,
    now: i64,
) -> Result<Submission, DomainError> {
    ensure_in_progress(state)?;
    let (bidder, bid) = require_entry(state)?;
    let points = validate_points(points)?;

    if points == 0 {
        let pending = PendingZeroPoints {
            bidding_team: bidder,
            bid_amount: bid,
            entered_for_bidder: state.enter_bidder_points,
        };
        state.pending_zero_points = Some(pending);
        debug!(side = %bidder, bid, "Zero points entered, awaiting choice");
        return Ok(Submission::NeedsZeroPointsChoice(pending));
    }

    let entry = HandEntry {
        bidder,
        bid,
        points,
        entered_for_bidder: state.enter_bidder_points,
    };
    Ok(Submission::Resolved(resolve_hand(state, entry, settings, now)))
}

/// Resume a parked zero-points entry with the chosen value.
pub fn resolve_zero_points(
    state: &mut GameState,
    choice: ZeroPointsChoice,
    settings: &Settings,
    now: i64,
) -> Result<RoundResolved, DomainError> {
    ensure_in_progress(state)?;
    let pending = state.pending_zero_points.ok_or_else(|| {
        DomainError::validation(
            ValidationKind::NoPendingZeroPoints,
            "No zero-points entry is waiting for a choice.",
        )
    })?;
    // The substitute value always describes the bidding side's hand.
    let entry = HandEntry {
        bidder: pending.bidding_team,
        bid: pending.bid_amount,
        points: choice.points(),
        entered_for_bidder: true,
    };
    state.enter_bidder_points = true;
    Ok(resolve_hand(state, entry, settings, now))
}

/// Drop a parked zero-points entry. Returns whether one was waiting.
pub fn cancel_zero_points(state: &mut GameState) -> bool {
    state.pending_zero_points.take().is_some()
}

/// Flag `side` for table talk; the next scored hand sets that side.
pub fn flag_penalty(state: &mut GameState, side: Side) -> Result<(), DomainError> {
    ensure_in_progress(state)?;
    state.pending_penalty = Some(PendingPenalty {
        kind: PenaltyKind::Cheat,
        team: side,
    });
    Ok(())
}

pub fn clear_penalty(state: &mut GameState) -> bool {
    state.pending_penalty.take().is_some()
}

/// Record a table-talk penalty round against `flagged` instead of scoring
/// the hand. Needs a bidding side and bid to be selected.
pub fn apply_table_talk_penalty(
    state: &mut GameState,
    flagged: Side,
    settings: &Settings,
    now: i64,
) -> Result<RoundResolved, DomainError> {
    ensure_in_progress(state)?;
    let (bidder, bid) = require_entry(state)?;
    let amount = settings.penalty_amount(bid);
    let earned = penalty_deltas(flagged, amount);
    let resolved = record_round(
        state,
        RoundDraft {
            bidder,
            bid,
            earned,
            penalty: Some((settings.table_talk_penalty_type, amount)),
        },
        settings,
        now,
    );
    info!(
        flagged = %flagged,
        amount,
        penalty_type = settings.table_talk_penalty_type.as_str(),
        "Table-talk penalty applied"
    );
    Ok(resolved)
}

fn resolve_hand(state: &mut GameState, entry: HandEntry, settings: &Settings, now: i64) -> RoundResolved {
    let earned = distribute(entry, state.pending_penalty.as_ref());
    timing::start_if_first_round(state, now);
    record_round(
        state,
        RoundDraft {
            bidder: entry.bidder,
            bid: entry.bid,
            earned,
            penalty: None,
        },
        settings,
        now,
    )
}

struct RoundDraft {
    bidder: Side,
    bid: i32,
    earned: Totals,
    penalty: Option<(PenaltyType, i32)>,
}

fn record_round(state: &mut GameState, draft: RoundDraft, settings: &Settings, now: i64) -> RoundResolved {
    let running_totals = state.last_running_totals().plus(draft.earned);
    let round = Round {
        bidding_team: Some(draft.bidder),
        bid_amount: draft.bid,
        us_points: draft.earned.us,
        dem_points: draft.earned.dem,
        running_totals,
        us_team_name_on_round: state.team_name(Side::Us).to_string(),
        dem_team_name_on_round: state.team_name(Side::Dem).to_string(),
        penalty: draft.penalty.map(|_| PenaltyKind::Cheat),
        penalty_type: draft.penalty.map(|(kind, _)| kind),
        penalty_amount: draft.penalty.map(|(_, amount)| amount),
    };
    let termination = check_resolved_round(&round, settings.must_win_by_bid);

    state.rounds.push(round.clone());
    state.undone_rounds.clear();
    state.clear_entry();
    state.pending_penalty = None;

    let mut team_delta = None;
    match termination {
        Termination::Finished { winner, method } => {
            state.game_over = true;
            state.winner = winner;
            state.victory_method = Some(method);
            timing::stop(state, now);
            if winner.is_some() {
                team_delta = Some(TeamResultDelta::for_state(state, winner, 1));
            }
            info!(
                winner = winner.map(|w| w.as_str()),
                method = method.label(),
                us = running_totals.us,
                dem = running_totals.dem,
                "Game finished"
            );
        }
        Termination::Continue => {
            state.game_over = false;
            state.winner = None;
            state.victory_method = round.is_penalty().then_some(VictoryMethod::PenaltyLostBid);
        }
    }
    debug!(
        side = %draft.bidder,
        bid = draft.bid,
        us_points = round.us_points,
        dem_points = round.dem_points,
        round_no = state.rounds.len(),
        "Round resolved"
    );

    RoundResolved {
        round,
        termination,
        team_delta,
    }
}

/// Continue a game scored on paper: fresh state seeded with the given totals.
pub fn start_from_totals<A: AsRef<str>, B: AsRef<str>>(
    state: &mut GameState,
    us: f64,
    dem: f64,
    us_players: &[A],
    dem_players: &[B],
) -> Result<(), DomainError> {
    let us = validate_starting_total(us)?;
    let dem = validate_starting_total(dem)?;
    let mut fresh = GameState::with_players(
        ensure_players_array(us_players),
        ensure_players_array(dem_players),
    );
    fresh.starting_totals = Totals::new(us, dem);
    *state = fresh;
    info!(us, dem, "Game started from carried-over totals");
    Ok(())
}

fn check_side_players(side: Side, players: &[String; 2]) -> Result<(), DomainError> {
    let label = side.default_label();
    if players[0].is_empty() || players[1].is_empty() {
        return Err(DomainError::validation(
            ValidationKind::InvalidTeams,
            format!("Please enter both player names for Team '{label}'."),
        ));
    }
    if players[0].to_lowercase() == players[1].to_lowercase() {
        return Err(DomainError::validation(
            ValidationKind::InvalidTeams,
            format!("Team '{label}' needs two different players."),
        ));
    }
    Ok(())
}

/// Name both partnerships of the active game.
pub fn assign_teams<A: AsRef<str>, B: AsRef<str>>(
    state: &mut GameState,
    us_players: &[A],
    dem_players: &[B],
) -> Result<TeamAssignment, DomainError> {
    let us = ensure_players_array(us_players);
    let dem = ensure_players_array(dem_players);
    check_side_players(Side::Us, &us)?;
    check_side_players(Side::Dem, &dem)?;
    if TeamKey::from_players(&us) == TeamKey::from_players(&dem) {
        return Err(DomainError::validation(
            ValidationKind::InvalidTeams,
            "Both teams cannot have the same two players.",
        ));
    }
    state.set_players(Side::Us, us);
    state.set_players(Side::Dem, dem);
    Ok(TeamAssignment {
        us: state.team(Side::Us),
        dem: state.team(Side::Dem),
    })
}

/// Throw the active game away.
pub fn new_game(state: &mut GameState) {
    *state = GameState::new();
}
