use crate::domain::state::{Side, VictoryMethod};
use crate::domain::termination::{check_redone_round, check_resolved_round, Termination};
use crate::domain::test_fixtures::round;

fn won(winner: Side, method: VictoryMethod) -> Termination {
    Termination::Finished {
        winner: Some(winner),
        method,
    }
}

#[test]
fn ordinary_round_continues() {
    let r = round(Side::Us, 120, 150, 30, (150, 30));
    assert_eq!(check_resolved_round(&r, false), Termination::Continue);
    assert_eq!(check_resolved_round(&r, true), Termination::Continue);
}

#[test]
fn spread_wins_before_anything_else() {
    // dem was set but us leads by 1000
    let r = round(Side::Dem, 150, 30, -150, (900, -100));
    assert_eq!(
        check_resolved_round(&r, false),
        won(Side::Us, VictoryMethod::PointSpread)
    );
    let r = round(Side::Us, 100, 120, 60, (-300, 700));
    assert_eq!(
        check_resolved_round(&r, true),
        won(Side::Dem, VictoryMethod::PointSpread)
    );
}

#[test]
fn set_bidder_loses_when_defenders_pass_500() {
    let r = round(Side::Dem, 150, 60, -150, (520, 200));
    assert_eq!(
        check_resolved_round(&r, false),
        won(Side::Us, VictoryMethod::SetOtherTeam)
    );
}

#[test]
fn must_win_by_bid_still_ends_on_set() {
    let r = round(Side::Dem, 150, 60, -150, (520, 200));
    assert_eq!(
        check_resolved_round(&r, true),
        won(Side::Us, VictoryMethod::SetOtherTeam)
    );
}

#[test]
fn bidder_wins_on_bid_past_500() {
    let r = round(Side::Us, 100, 120, 60, (600, 360));
    assert_eq!(
        check_resolved_round(&r, false),
        won(Side::Us, VictoryMethod::WonOnBid)
    );
}

#[test]
fn defenders_past_500_without_a_set_continue() {
    let r = round(Side::Us, 100, 120, 60, (300, 510));
    assert_eq!(check_resolved_round(&r, false), Termination::Continue);
}

#[test]
fn bidder_past_500_but_set_does_not_win() {
    // starting totals carried the bidder past 500 even after the set
    let r = round(Side::Us, 100, -100, 80, (650, 200));
    assert_eq!(check_resolved_round(&r, false), Termination::Continue);
}

#[test]
fn redo_matches_primary_rules_where_they_overlap() {
    let spread = round(Side::Dem, 150, 30, -150, (900, -100));
    assert_eq!(
        check_redone_round(&spread, false),
        won(Side::Us, VictoryMethod::PointSpread)
    );
    let set = round(Side::Dem, 150, 60, -150, (520, 200));
    assert_eq!(
        check_redone_round(&set, false),
        won(Side::Us, VictoryMethod::SetOtherTeam)
    );
    let ordinary = round(Side::Us, 120, 150, 30, (150, 30));
    assert_eq!(check_redone_round(&ordinary, false), Termination::Continue);
}

#[test]
fn redo_ends_any_game_past_500() {
    // the primary rules would keep playing here
    let r = round(Side::Us, 100, 120, 60, (300, 510));
    assert_eq!(check_resolved_round(&r, false), Termination::Continue);
    assert_eq!(
        check_redone_round(&r, false),
        won(Side::Dem, VictoryMethod::Reached500)
    );
}

#[test]
fn redo_level_past_500_is_a_tie() {
    let r = round(Side::Us, 100, 120, 60, (540, 540));
    let t = check_redone_round(&r, false);
    assert_eq!(
        t,
        Termination::Finished {
            winner: None,
            method: VictoryMethod::TieAt500,
        }
    );
    assert!(t.is_over());
    assert_eq!(t.winner(), None);
}

#[test]
fn redo_with_must_win_by_bid_needs_the_bid() {
    let made = round(Side::Us, 100, 120, 60, (600, 360));
    assert_eq!(
        check_redone_round(&made, true),
        won(Side::Us, VictoryMethod::WonOnBid)
    );
    let defenders_over = round(Side::Us, 100, 120, 60, (300, 510));
    assert_eq!(check_redone_round(&defenders_over, true), Termination::Continue);
}
