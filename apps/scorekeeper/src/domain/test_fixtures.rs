//! Builders shared by the domain unit tests.

use time::macros::datetime;
use time::OffsetDateTime;

use crate::config::Settings;
use crate::domain::archive::CompletedGame;
use crate::domain::resolution::{choose_bid, select_team, set_points_owner, submit_points, RoundResolved, Submission};
use crate::domain::state::{GameState, Round, Side, Totals};

pub const T0: i64 = 1_700_000_000_000;

pub fn now() -> OffsetDateTime {
    datetime!(2025-06-01 12:00 UTC)
}

pub fn round(bidder: Side, bid: i32, us: i32, dem: i32, totals: (i32, i32)) -> Round {
    Round {
        bidding_team: Some(bidder),
        bid_amount: bid,
        us_points: us,
        dem_points: dem,
        running_totals: Totals::new(totals.0, totals.1),
        us_team_name_on_round: "Ann & Bob".to_string(),
        dem_team_name_on_round: "Cy & Dee".to_string(),
        penalty: None,
        penalty_type: None,
        penalty_amount: None,
    }
}

/// Ann & Bob (us) against Cy & Dee (dem).
pub fn two_teams() -> GameState {
    GameState::with_players(
        ["Ann".to_string(), "Bob".to_string()],
        ["Cy".to_string(), "Dee".to_string()],
    )
}

pub fn with_totals(us: i32, dem: i32) -> GameState {
    let mut state = two_teams();
    state.starting_totals = Totals::new(us, dem);
    state
}

/// Select, bid, choose the points owner and submit a non-zero hand.
pub fn play(
    state: &mut GameState,
    bidder: Side,
    bid: i32,
    points: i32,
    for_bidder: bool,
    settings: &Settings,
) -> RoundResolved {
    select_team(state, bidder).unwrap();
    choose_bid(state, bid).unwrap();
    set_points_owner(state, for_bidder).unwrap();
    match submit_points(state, points, settings, T0 + state.rounds.len() as i64 * 60_000).unwrap() {
        Submission::Resolved(resolved) => resolved,
        Submission::NeedsZeroPointsChoice(_) => panic!("zero points need a choice"),
    }
}

/// Completed game between the given pairs with explicit rounds.
pub fn completed(
    us: [&str; 2],
    dem: [&str; 2],
    rounds: Vec<Round>,
    winner: Option<Side>,
    at: OffsetDateTime,
) -> CompletedGame {
    let mut state = GameState::with_players(
        [us[0].to_string(), us[1].to_string()],
        [dem[0].to_string(), dem[1].to_string()],
    );
    state.rounds = rounds;
    state.game_over = winner.is_some();
    state.winner = winner;
    CompletedGame::from_state(&state, at).unwrap()
}

/// One-round game that ends with `us` on 600 and `dem` on 100 (or reversed).
pub fn quick_game(us: [&str; 2], dem: [&str; 2], winner: Side, at: OffsetDateTime) -> CompletedGame {
    let (totals, points) = match winner {
        Side::Us => ((600, 100), (120, 60)),
        Side::Dem => ((100, 600), (60, 120)),
    };
    completed(
        us,
        dem,
        vec![round(winner, 100, points.0, points.1, totals)],
        Some(winner),
        at,
    )
}
