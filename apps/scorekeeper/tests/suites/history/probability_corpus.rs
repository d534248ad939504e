use scorekeeper::clock::FixedClock;
use scorekeeper::domain::probability::{Confidence, WinProbability};
use scorekeeper::domain::state::Side;
use scorekeeper::store::{MemoryStore, Persistence};
use scorekeeper::Scorekeeper;
use scorekeeper_test_support::fixtures::{quick_win, test_now};
use time::Duration;

use crate::common::play_hand;

const ANN_BOB: [&str; 2] = ["Ann", "Bob"];
const CY_DEE: [&str; 2] = ["Cy", "Dee"];

fn keeper_with(history: usize) -> Scorekeeper<MemoryStore, FixedClock> {
    let now = test_now();
    let games = (0..history)
        .map(|_| quick_win(ANN_BOB, CY_DEE, Side::Us, now))
        .collect();
    let mut keeper =
        Scorekeeper::with_clock(MemoryStore::new().with_completed(games), FixedClock::new(now)).unwrap();
    keeper.assign_teams(&ANN_BOB, &CY_DEE).unwrap();
    keeper
}

#[test]
fn fresh_game_is_even_whatever_the_history() {
    assert_eq!(keeper_with(0).win_probability().unwrap(), WinProbability::EVEN);
    assert_eq!(keeper_with(6).win_probability().unwrap(), WinProbability::EVEN);
}

#[test]
fn matching_history_pulls_the_estimate_towards_it() {
    let mut model_only = keeper_with(0);
    play_hand(&mut model_only, Side::Us, 150, 170);
    let baseline = model_only.win_probability().unwrap();

    let mut informed = keeper_with(6);
    play_hand(&mut informed, Side::Us, 150, 170);
    let estimate = informed.win_probability().unwrap();

    assert!(estimate.us > baseline.us, "{estimate:?} vs {baseline:?}");
    assert!((estimate.us + estimate.dem - 100.0).abs() < 1e-9);

    let breakdown = informed.probability_breakdown().unwrap();
    assert_eq!(breakdown.bucket, 160);
    assert_eq!(breakdown.bucket_range, "160-179");
    assert_eq!(breakdown.games_analyzed, 6);
    assert_eq!(breakdown.recent_games, 6);
    assert_eq!(breakdown.older_games, 0);
    assert!((breakdown.observations - 6.0).abs() < 1e-9);
    assert_eq!(breakdown.confidence, Confidence::LowMedium);
    assert!(breakdown.empirical_weight > 0.0 && breakdown.empirical_weight < 1.0);
}

#[test]
fn old_games_count_as_older_and_weigh_less() {
    let mut keeper = keeper_with(2);
    let old = quick_win(ANN_BOB, CY_DEE, Side::Dem, test_now() - Duration::days(60));
    keeper.store_mut().append_completed(old).unwrap();
    play_hand(&mut keeper, Side::Us, 150, 170);

    let breakdown = keeper.probability_breakdown().unwrap();
    assert_eq!(breakdown.games_analyzed, 3);
    assert_eq!(breakdown.recent_games, 2);
    assert_eq!(breakdown.older_games, 1);
    // two full-weight wins for us, nothing for dem in this bucket
    assert!((breakdown.observations - 2.0).abs() < 1e-9);
}
