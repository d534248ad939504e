//! Undo / redo of recorded rounds.

use tracing::info;

use super::state::{GameState, Round};
use super::team_registry::TeamResultDelta;
use super::termination::{check_redone_round, Termination};
use super::timing;
use crate::config::Settings;
use crate::errors::domain::{DomainError, ValidationKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerStep {
    /// The round that moved between the two stacks.
    pub round: Round,
    pub termination: Termination,
    pub team_delta: Option<TeamResultDelta>,
}

/// Move the last round onto the undo stack.
///
/// Game-over is always cleared; a recorded win is retracted from the team
/// registry through the returned delta.
pub fn undo(state: &mut GameState) -> Result<LedgerStep, DomainError> {
    let Some(round) = state.rounds.pop() else {
        return Err(DomainError::validation(
            ValidationKind::NothingToUndo,
            "There are no rounds to undo.",
        ));
    };
    let team_delta = match (state.game_over, state.winner) {
        (true, Some(winner)) => Some(TeamResultDelta::for_state(state, Some(winner), -1)),
        _ => None,
    };

    state.undone_rounds.push(round.clone());
    state.last_bid_amount = state.rounds.last().map(|r| r.bid_amount);
    state.last_bid_team = state.rounds.last().and_then(|r| r.bidding_team);
    state.game_over = false;
    state.winner = None;
    state.victory_method = None;
    if state.rounds.is_empty() {
        timing::reset(state);
    }
    info!(
        remaining = state.rounds.len(),
        undone = state.undone_rounds.len(),
        retracted_win = team_delta.is_some(),
        "Round undone"
    );

    Ok(LedgerStep {
        round,
        termination: Termination::Continue,
        team_delta,
    })
}

/// Restore the most recently undone round and re-derive game-over from its
/// stored running totals under the current settings.
///
/// A finished game must be undone before anything is redone on top of it.
pub fn redo(state: &mut GameState, settings: &Settings) -> Result<LedgerStep, DomainError> {
    if state.game_over {
        return Err(DomainError::validation(
            ValidationKind::GameOver,
            "Game is over. Undo the last round before redoing.",
        ));
    }
    let Some(round) = state.undone_rounds.pop() else {
        return Err(DomainError::validation(
            ValidationKind::NothingToRedo,
            "There are no rounds to redo.",
        ));
    };
    let termination = check_redone_round(&round, settings.must_win_by_bid);

    state.rounds.push(round.clone());
    state.last_bid_amount = Some(round.bid_amount);
    state.last_bid_team = round.bidding_team;
    state.game_over = termination.is_over();
    state.winner = termination.winner();
    state.victory_method = termination.method();

    let team_delta = state
        .winner
        .filter(|_| state.game_over)
        .map(|winner| TeamResultDelta::for_state(state, Some(winner), 1));
    info!(
        rounds = state.rounds.len(),
        game_over = state.game_over,
        winner = state.winner.map(|w| w.as_str()),
        "Round redone"
    );

    Ok(LedgerStep {
        round,
        termination,
        team_delta,
    })
}
