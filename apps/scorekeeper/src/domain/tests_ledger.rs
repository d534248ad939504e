use crate::config::Settings;
use crate::domain::ledger::{redo, undo};
use crate::domain::state::{Side, Totals, VictoryMethod};
use crate::domain::termination::Termination;
use crate::domain::test_fixtures::{play, two_teams, with_totals};
use crate::errors::domain::ValidationKind;

#[test]
fn empty_stacks_reject() {
    let settings = Settings::default();
    let mut state = two_teams();
    let err = undo(&mut state).unwrap_err();
    assert_eq!(err.validation_kind(), Some(&ValidationKind::NothingToUndo));
    assert_eq!(err.user_message(), "There are no rounds to undo.");

    let err = redo(&mut state, &settings).unwrap_err();
    assert_eq!(err.validation_kind(), Some(&ValidationKind::NothingToRedo));
    assert_eq!(state, two_teams());
}

#[test]
fn undo_moves_the_last_round() {
    let settings = Settings::default();
    let mut state = two_teams();
    play(&mut state, Side::Us, 120, 150, true, &settings);
    play(&mut state, Side::Dem, 100, 40, false, &settings);

    let step = undo(&mut state).unwrap();
    assert_eq!(step.round.bidding_team, Some(Side::Dem));
    assert_eq!(step.termination, Termination::Continue);
    assert!(step.team_delta.is_none());
    assert_eq!(state.rounds.len(), 1);
    assert_eq!(state.undone_rounds.len(), 1);
    assert_eq!(state.last_bid_amount, Some(120));
    assert_eq!(state.last_bid_team, Some(Side::Us));
    // clock keeps running while rounds remain
    assert!(state.start_time.is_some());
}

#[test]
fn undoing_every_round_resets_the_clock() {
    let settings = Settings::default();
    let mut state = two_teams();
    play(&mut state, Side::Us, 120, 150, true, &settings);
    state.accumulated_time = 5_000;

    undo(&mut state).unwrap();
    assert!(state.rounds.is_empty());
    assert_eq!(state.start_time, None);
    assert_eq!(state.accumulated_time, 0);
    assert_eq!(state.last_bid_amount, None);
    assert_eq!(state.last_running_totals(), Totals::default());
}

#[test]
fn undoing_a_win_retracts_it() {
    let settings = Settings::default();
    let mut state = with_totals(480, 300);
    play(&mut state, Side::Us, 100, 120, true, &settings);
    assert!(state.game_over);

    let step = undo(&mut state).unwrap();
    let delta = step.team_delta.unwrap();
    assert_eq!(delta.direction, -1);
    assert_eq!(delta.winner, Some(Side::Us));
    assert!(!state.game_over);
    assert_eq!(state.winner, None);
    assert_eq!(state.victory_method, None);
}

#[test]
fn redo_reapplies_a_win() {
    let settings = Settings::default();
    let mut state = with_totals(480, 300);
    let played = play(&mut state, Side::Us, 100, 120, true, &settings);
    undo(&mut state).unwrap();

    let step = redo(&mut state, &settings).unwrap();
    assert_eq!(step.round, played.round);
    assert!(state.game_over);
    assert_eq!(state.winner, Some(Side::Us));
    assert_eq!(state.victory_method, Some(VictoryMethod::WonOnBid));
    assert_eq!(step.team_delta.unwrap().direction, 1);
    assert!(state.undone_rounds.is_empty());
    assert_eq!(state.last_bid_amount, Some(100));
}

#[test]
fn redo_ends_a_game_the_entry_rules_kept_open() {
    let settings = Settings::default();
    let mut state = with_totals(240, 450);
    let played = play(&mut state, Side::Us, 100, 120, true, &settings);
    assert_eq!(played.round.running_totals, Totals::new(360, 510));
    assert!(!state.game_over);

    undo(&mut state).unwrap();
    let step = redo(&mut state, &settings).unwrap();
    assert!(state.game_over);
    assert_eq!(state.winner, Some(Side::Dem));
    assert_eq!(state.victory_method, Some(VictoryMethod::Reached500));
    assert_eq!(step.team_delta.unwrap().winner, Some(Side::Dem));
}

#[test]
fn redo_follows_current_settings() {
    let mut state = with_totals(240, 450);
    play(&mut state, Side::Us, 100, 120, true, &Settings::default());
    undo(&mut state).unwrap();

    let strict = Settings {
        must_win_by_bid: true,
        ..Settings::default()
    };
    let step = redo(&mut state, &strict).unwrap();
    assert_eq!(step.termination, Termination::Continue);
    assert!(!state.game_over);
    assert!(step.team_delta.is_none());
}

#[test]
fn redo_stack_is_lifo() {
    let settings = Settings::default();
    let mut state = two_teams();
    play(&mut state, Side::Us, 120, 150, true, &settings);
    play(&mut state, Side::Dem, 100, 40, false, &settings);
    play(&mut state, Side::Us, 80, 90, true, &settings);
    let original = state.rounds.clone();

    undo(&mut state).unwrap();
    undo(&mut state).unwrap();
    assert_eq!(state.rounds.len(), 1);
    assert_eq!(redo(&mut state, &settings).unwrap().round, original[1]);
    assert_eq!(redo(&mut state, &settings).unwrap().round, original[2]);
    assert_eq!(state.rounds, original);
}

#[test]
fn redo_is_refused_once_a_redo_has_ended_the_game() {
    let settings = Settings::default();
    let mut state = with_totals(240, 450);
    play(&mut state, Side::Us, 100, 120, true, &settings);
    play(&mut state, Side::Us, 100, 120, true, &settings);
    assert_eq!(state.last_running_totals(), Totals::new(480, 570));
    assert!(!state.game_over);

    undo(&mut state).unwrap();
    undo(&mut state).unwrap();
    let step = redo(&mut state, &settings).unwrap();
    assert_eq!(step.team_delta.unwrap().direction, 1);
    assert!(state.game_over);

    let before = state.clone();
    let err = redo(&mut state, &settings).unwrap_err();
    assert_eq!(err.validation_kind(), Some(&ValidationKind::GameOver));
    assert_eq!(state, before);
    assert_eq!(state.undone_rounds.len(), 1);

    // undoing the finished game reopens the redo stack
    let step = undo(&mut state).unwrap();
    assert_eq!(step.team_delta.unwrap().direction, -1);
    assert!(redo(&mut state, &settings).is_ok());
}
