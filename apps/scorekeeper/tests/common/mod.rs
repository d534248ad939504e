#![allow(dead_code)]

use scorekeeper::clock::Clock;
use scorekeeper::domain::resolution::Submission;
use scorekeeper::domain::state::Side;
use scorekeeper::store::Persistence;
use scorekeeper::Scorekeeper;

// Logging is auto-installed for every test binary
#[ctor::ctor]
fn init_logging() {
    scorekeeper_test_support::logging::init();
}

/// Select, bid and submit `points` for the bidding side.
pub fn play_hand<S: Persistence, C: Clock>(
    keeper: &mut Scorekeeper<S, C>,
    bidder: Side,
    bid: i32,
    points: i32,
) -> Submission {
    keeper.select_team(bidder).unwrap();
    keeper.choose_bid(bid).unwrap();
    keeper.set_points_owner(true).unwrap();
    keeper.submit_points(points).unwrap()
}
