//! Builders for rounds, archived games and on-disk stores.

use scorekeeper::domain::archive::CompletedGame;
use scorekeeper::domain::state::{GameState, Round, Side, Totals};
use scorekeeper::store::JsonFileStore;
use tempfile::TempDir;
use time::macros::datetime;
use time::OffsetDateTime;

/// Fixed instant used as "now" by the integration tests.
pub fn test_now() -> OffsetDateTime {
    datetime!(2025-06-01 12:00 UTC)
}

/// Round with explicit points; running totals are filled in by [`game`].
pub fn round(bidder: Side, bid: i32, us_points: i32, dem_points: i32) -> Round {
    Round {
        bidding_team: Some(bidder),
        bid_amount: bid,
        us_points,
        dem_points,
        running_totals: Totals::default(),
        us_team_name_on_round: String::new(),
        dem_team_name_on_round: String::new(),
        penalty: None,
        penalty_type: None,
        penalty_amount: None,
    }
}

fn pair(names: [&str; 2]) -> [String; 2] {
    [names[0].to_string(), names[1].to_string()]
}

/// Finished game state with chained running totals and team-name snapshots.
pub fn game(us: [&str; 2], dem: [&str; 2], rounds: Vec<Round>, winner: Option<Side>) -> GameState {
    let mut state = GameState::with_players(pair(us), pair(dem));
    let us_name = state.team_name(Side::Us).to_string();
    let dem_name = state.team_name(Side::Dem).to_string();
    let mut totals = state.starting_totals;
    for mut round in rounds {
        totals = totals.plus(round.deltas());
        round.running_totals = totals;
        round.us_team_name_on_round = us_name.clone();
        round.dem_team_name_on_round = dem_name.clone();
        state.rounds.push(round);
    }
    state.game_over = winner.is_some();
    state.winner = winner;
    state
}

/// Archived game played at `at`.
///
/// Panics when `rounds` is empty.
pub fn completed(
    us: [&str; 2],
    dem: [&str; 2],
    rounds: Vec<Round>,
    winner: Option<Side>,
    at: OffsetDateTime,
) -> CompletedGame {
    CompletedGame::from_state(&game(us, dem, rounds, winner), at)
        .unwrap_or_else(|err| panic!("fixture game must have rounds: {err}"))
}

/// A quick two-round win for `winner`.
pub fn quick_win(us: [&str; 2], dem: [&str; 2], winner: Side, at: OffsetDateTime) -> CompletedGame {
    let (a, b) = match winner {
        Side::Us => (170, 10),
        Side::Dem => (10, 170),
    };
    completed(
        us,
        dem,
        vec![round(winner, 150, a, b), round(winner, 150, a, b)],
        Some(winner),
        at,
    )
}

/// JSON store in a fresh temporary directory; keep the guard alive.
pub fn temp_store() -> (TempDir, JsonFileStore) {
    let dir = tempfile::tempdir().unwrap_or_else(|err| panic!("tempdir: {err}"));
    let store = JsonFileStore::open(dir.path().join("rook"))
        .unwrap_or_else(|err| panic!("open store: {err}"));
    (dir, store)
}
