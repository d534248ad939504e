use crate::config::{PenaltyType, Settings};
use crate::domain::resolution::{
    apply_table_talk_penalty, assign_teams, cancel_zero_points, choose_bid, clear_penalty,
    flag_penalty, new_game, resolve_zero_points, select_team, set_points_owner, start_from_totals,
    submit_points, Submission, ZeroPointsChoice,
};
use crate::domain::state::{EntryPhase, GameState, Side, Totals, VictoryMethod};
use crate::domain::termination::Termination;
use crate::domain::test_fixtures::{play, two_teams, with_totals, T0};
use crate::errors::domain::{DomainError, ValidationKind};

fn kind_of(err: DomainError) -> ValidationKind {
    match err {
        DomainError::Validation(kind, _) => kind,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn first_round_from_zero() {
    let settings = Settings::default();
    let mut state = two_teams();
    let resolved = play(&mut state, Side::Us, 120, 150, true, &settings);

    assert_eq!(resolved.round.deltas(), Totals::new(150, 30));
    assert_eq!(resolved.round.running_totals, Totals::new(150, 30));
    assert_eq!(resolved.termination, Termination::Continue);
    assert!(resolved.team_delta.is_none());
    assert!(!state.game_over);
    assert_eq!(state.rounds.len(), 1);
    assert_eq!(state.entry_phase(), EntryPhase::NoBidSelected);
    assert_eq!(state.start_time, Some(T0));
    assert_eq!(state.last_bid_amount, Some(120));
    assert_eq!(state.last_bid_team, Some(Side::Us));
    assert_eq!(resolved.round.us_team_name_on_round, "Ann & Bob");
}

#[test]
fn won_on_bid_from_480() {
    let settings = Settings::default();
    let mut state = with_totals(480, 300);
    let resolved = play(&mut state, Side::Us, 100, 120, true, &settings);

    assert_eq!(resolved.round.us_points, 120);
    assert_eq!(resolved.round.running_totals.us, 600);
    assert!(state.game_over);
    assert_eq!(state.winner, Some(Side::Us));
    assert_eq!(state.victory_method, Some(VictoryMethod::WonOnBid));

    let delta = resolved.team_delta.unwrap();
    assert_eq!(delta.direction, 1);
    assert_eq!(delta.winner, Some(Side::Us));
    assert_eq!(delta.us.display, "Ann & Bob");
    assert_eq!(delta.dem.display, "Cy & Dee");
}

#[test]
fn set_other_team_when_defenders_pass_500() {
    let settings = Settings::default();
    let mut state = with_totals(460, 200);
    // dem bids 150 and only takes 120 of the hand: us gets 60
    let resolved = play(&mut state, Side::Dem, 150, 60, false, &settings);

    assert_eq!(resolved.round.dem_points, -150);
    assert_eq!(resolved.round.running_totals, Totals::new(520, 50));
    assert!(state.game_over);
    assert_eq!(state.winner, Some(Side::Us));
    assert_eq!(state.victory_method, Some(VictoryMethod::SetOtherTeam));
}

#[test]
fn game_end_stops_the_timer() {
    let settings = Settings::default();
    let mut state = with_totals(400, 0);
    play(&mut state, Side::Us, 50, 90, true, &settings);
    assert!(state.start_time.is_some());
    play(&mut state, Side::Us, 50, 90, true, &settings);
    assert!(state.game_over);
    assert_eq!(state.start_time, None);
    assert_eq!(state.accumulated_time, 60_000);
}

#[test]
fn entry_survives_deselect_and_reselect() {
    let mut state = two_teams();
    select_team(&mut state, Side::Dem).unwrap();
    choose_bid(&mut state, 135).unwrap();
    set_points_owner(&mut state, true).unwrap();

    let phase = select_team(&mut state, Side::Dem).unwrap();
    assert_eq!(phase, EntryPhase::NoBidSelected);
    assert_eq!(state.bid_amount, None);

    let phase = select_team(&mut state, Side::Dem).unwrap();
    assert_eq!(phase, EntryPhase::BidChosen);
    assert_eq!(state.bid_amount, Some(135));
    assert!(state.enter_bidder_points);
}

#[test]
fn switching_sides_forgets_the_other_entry() {
    let mut state = two_teams();
    select_team(&mut state, Side::Us).unwrap();
    choose_bid(&mut state, 100).unwrap();
    select_team(&mut state, Side::Us).unwrap();
    assert!(state.saved_score_input_states.us.is_some());

    let phase = select_team(&mut state, Side::Dem).unwrap();
    assert_eq!(phase, EntryPhase::TeamSelected);
    assert!(state.saved_score_input_states.us.is_none());

    select_team(&mut state, Side::Us).unwrap();
    assert_eq!(state.bid_amount, None);
}

#[test]
fn submit_without_selection_is_rejected_untouched() {
    let settings = Settings::default();
    let mut state = two_teams();
    let before = state.clone();

    let err = submit_points(&mut state, 100, &settings, T0).unwrap_err();
    assert_eq!(kind_of(err.clone()), ValidationKind::MissingBiddingTeam);
    assert_eq!(err.to_string(), "Please select bid amount.");
    assert_eq!(state, before);

    select_team(&mut state, Side::Us).unwrap();
    let before = state.clone();
    let err = submit_points(&mut state, 100, &settings, T0).unwrap_err();
    assert_eq!(kind_of(err), ValidationKind::MissingBid);
    assert_eq!(state, before);
}

#[test]
fn invalid_inputs_never_mutate() {
    let settings = Settings::default();
    let mut state = two_teams();
    select_team(&mut state, Side::Us).unwrap();

    let before = state.clone();
    assert_eq!(kind_of(choose_bid(&mut state, 185).unwrap_err()), ValidationKind::InvalidBid);
    assert_eq!(kind_of(choose_bid(&mut state, 0).unwrap_err()), ValidationKind::InvalidBid);
    assert_eq!(state, before);

    choose_bid(&mut state, 100).unwrap();
    let before = state.clone();
    for points in [-5, 185, 12, 365] {
        let err = submit_points(&mut state, points, &settings, T0).unwrap_err();
        assert_eq!(kind_of(err), ValidationKind::InvalidPoints);
    }
    assert_eq!(state, before);
}

#[test]
fn finished_game_rejects_entry() {
    let settings = Settings::default();
    let mut state = with_totals(480, 300);
    play(&mut state, Side::Us, 100, 120, true, &settings);
    assert!(state.game_over);

    let err = select_team(&mut state, Side::Dem).unwrap_err();
    assert_eq!(kind_of(err), ValidationKind::GameOver);
}

#[test]
fn zero_for_defenders_then_180_goes_to_bidder() {
    let settings = Settings::default();
    let mut state = two_teams();
    select_team(&mut state, Side::Us).unwrap();
    choose_bid(&mut state, 150).unwrap();
    set_points_owner(&mut state, false).unwrap();

    let submission = submit_points(&mut state, 0, &settings, T0).unwrap();
    let Submission::NeedsZeroPointsChoice(pending) = submission else {
        panic!("expected a zero-points choice");
    };
    assert!(!pending.entered_for_bidder);
    assert_eq!(state.entry_phase(), EntryPhase::PointsPending);
    assert!(state.rounds.is_empty());

    let resolved = resolve_zero_points(&mut state, ZeroPointsChoice::OneEighty, &settings, T0).unwrap();
    assert_eq!(resolved.round.deltas(), Totals::new(180, 0));
    assert_eq!(state.pending_zero_points, None);
}

#[test]
fn zero_then_360_is_a_bidder_sweep() {
    let settings = Settings::default();
    let mut state = two_teams();
    select_team(&mut state, Side::Dem).unwrap();
    choose_bid(&mut state, 360).unwrap();
    submit_points(&mut state, 0, &settings, T0).unwrap();

    let resolved = resolve_zero_points(&mut state, ZeroPointsChoice::ThreeSixty, &settings, T0).unwrap();
    assert_eq!(resolved.round.deltas(), Totals::new(0, 360));
}

#[test]
fn zero_choice_can_be_cancelled() {
    let settings = Settings::default();
    let mut state = two_teams();
    select_team(&mut state, Side::Us).unwrap();
    choose_bid(&mut state, 100).unwrap();
    submit_points(&mut state, 0, &settings, T0).unwrap();

    assert!(cancel_zero_points(&mut state));
    assert!(!cancel_zero_points(&mut state));
    assert_eq!(state.entry_phase(), EntryPhase::BidChosen);

    let err = resolve_zero_points(&mut state, ZeroPointsChoice::OneEighty, &settings, T0).unwrap_err();
    assert_eq!(kind_of(err), ValidationKind::NoPendingZeroPoints);
}

#[test]
fn pending_flag_applies_to_next_hand_then_clears() {
    let settings = Settings::default();
    let mut state = two_teams();
    flag_penalty(&mut state, Side::Us).unwrap();
    let resolved = play(&mut state, Side::Us, 100, 150, true, &settings);
    assert_eq!(resolved.round.deltas(), Totals::new(-100, 30));
    assert_eq!(state.pending_penalty, None);

    flag_penalty(&mut state, Side::Dem).unwrap();
    assert!(clear_penalty(&mut state));
    let resolved = play(&mut state, Side::Us, 100, 150, true, &settings);
    assert_eq!(resolved.round.deltas(), Totals::new(150, 30));
}

#[test]
fn table_talk_costs_fixed_points() {
    let settings = Settings::default();
    let mut state = two_teams();
    select_team(&mut state, Side::Us).unwrap();
    choose_bid(&mut state, 120).unwrap();

    let resolved = apply_table_talk_penalty(&mut state, Side::Dem, &settings, T0).unwrap();
    assert_eq!(resolved.round.deltas(), Totals::new(0, -180));
    assert!(resolved.round.is_penalty());
    assert_eq!(resolved.round.penalty_type, Some(PenaltyType::SetPoints));
    assert_eq!(resolved.round.penalty_amount, Some(180));
    assert!(!state.game_over);
    assert_eq!(state.victory_method, Some(VictoryMethod::PenaltyLostBid));
    // penalties do not start the clock
    assert_eq!(state.start_time, None);
    assert_eq!(state.entry_phase(), EntryPhase::NoBidSelected);
}

#[test]
fn table_talk_can_cost_the_bid() {
    let settings = Settings {
        table_talk_penalty_type: PenaltyType::LoseBid,
        ..Settings::default()
    };
    let mut state = with_totals(100, 500);
    select_team(&mut state, Side::Us).unwrap();
    choose_bid(&mut state, 140).unwrap();

    let resolved = apply_table_talk_penalty(&mut state, Side::Us, &settings, T0).unwrap();
    assert_eq!(resolved.round.deltas(), Totals::new(-140, 0));
    // the flagged bidder is now set with the defenders on 500
    assert!(state.game_over);
    assert_eq!(state.winner, Some(Side::Dem));
    assert_eq!(state.victory_method, Some(VictoryMethod::SetOtherTeam));
    assert!(resolved.team_delta.is_some());
}

#[test]
fn table_talk_needs_a_bid() {
    let settings = Settings::default();
    let mut state = two_teams();
    select_team(&mut state, Side::Us).unwrap();
    let before = state.clone();
    let err = apply_table_talk_penalty(&mut state, Side::Us, &settings, T0).unwrap_err();
    assert_eq!(kind_of(err), ValidationKind::MissingBid);
    assert_eq!(state, before);
}

#[test]
fn resolving_clears_the_redo_stack() {
    let settings = Settings::default();
    let mut state = two_teams();
    play(&mut state, Side::Us, 100, 120, true, &settings);
    crate::domain::ledger::undo(&mut state).unwrap();
    assert_eq!(state.undone_rounds.len(), 1);
    play(&mut state, Side::Dem, 100, 120, true, &settings);
    assert!(state.undone_rounds.is_empty());
}

#[test]
fn paper_game_resumes_from_totals() {
    let settings = Settings::default();
    let mut state = two_teams();
    play(&mut state, Side::Us, 100, 120, true, &settings);

    start_from_totals(&mut state, 245.0, -35.0, &["Eve", "Fay"], &["Gus", ""]).unwrap();
    assert!(state.rounds.is_empty());
    assert_eq!(state.starting_totals, Totals::new(245, -35));
    assert_eq!(state.start_time, None);
    assert_eq!(state.us_team_name, "Eve & Fay");
    assert_eq!(state.dem_team_name, "Gus");
    assert_eq!(state.last_running_totals(), Totals::new(245, -35));
}

#[test]
fn paper_game_totals_are_validated() {
    let mut state = two_teams();
    let before = state.clone();
    let cases = [
        (f64::NAN, 0.0, "Scores must be numbers."),
        (1005.0, 0.0, "Scores should stay between -1000 and 1000."),
        (0.0, 12.0, "Scores must be in increments of 5."),
    ];
    for (us, dem, message) in cases {
        let err = start_from_totals(&mut state, us, dem, &["A", "B"], &["C", "D"]).unwrap_err();
        assert_eq!(err.to_string(), message);
        assert_eq!(kind_of(err), ValidationKind::InvalidStartingTotals);
    }
    assert_eq!(state, before);
}

#[test]
fn team_assignment_rules() {
    let mut state = GameState::new();
    let err = assign_teams(&mut state, &["Ann", " "], &["Cy", "Dee"]).unwrap_err();
    assert_eq!(err.to_string(), "Please enter both player names for Team 'Us'.");
    let err = assign_teams(&mut state, &["Ann", "Bob"], &["Cy", "cy"]).unwrap_err();
    assert_eq!(err.to_string(), "Team 'Dem' needs two different players.");
    let err = assign_teams(&mut state, &["Ann", "Bob"], &["bob", "ANN"]).unwrap_err();
    assert_eq!(err.to_string(), "Both teams cannot have the same two players.");
    assert_eq!(kind_of(err), ValidationKind::InvalidTeams);
    assert_eq!(state, GameState::new());

    let assignment = assign_teams(&mut state, &["Bob", "Ann"], &["Dee", "Cy"]).unwrap();
    assert_eq!(assignment.us.key.unwrap().as_str(), "ann||bob");
    assert_eq!(assignment.dem.display, "Cy & Dee");
    assert_eq!(state.us_players, ["Bob", "Ann"]);
}

#[test]
fn new_game_resets_everything() {
    let settings = Settings::default();
    let mut state = two_teams();
    play(&mut state, Side::Us, 100, 120, true, &settings);
    new_game(&mut state);
    assert_eq!(state, GameState::new());
}
