use serde_json::json;
use time::macros::datetime;

use crate::config::Settings;
use crate::domain::archive::{CompletedGame, FrozenGame};
use crate::domain::state::{GameState, Side, Totals, VictoryMethod};
use crate::domain::test_fixtures::{now, play, two_teams, with_totals};
use crate::domain::timing::epoch_millis;
use crate::errors::domain::ValidationKind;

fn finished_game() -> GameState {
    let settings = Settings::default();
    let mut state = with_totals(480, 300);
    play(&mut state, Side::Us, 100, 120, true, &settings);
    state.start_time = None;
    state.accumulated_time = 42_000;
    state
}

#[test]
fn completed_snapshot_of_a_finished_game() {
    let state = finished_game();
    let game = CompletedGame::from_state(&state, now()).unwrap();

    assert_eq!(game.us_team_name, "Ann & Bob");
    assert_eq!(game.us_team_key.as_ref().unwrap().as_str(), "ann||bob");
    assert_eq!(game.dem_team_key.as_ref().unwrap().as_str(), "cy||dee");
    assert_eq!(game.final_score, Totals::new(600, 360));
    assert_eq!(game.starting_totals, Totals::new(480, 300));
    assert_eq!(game.winner, Some(Side::Us));
    assert_eq!(game.victory_method, Some(VictoryMethod::WonOnBid));
    assert_eq!(game.duration_ms, 42_000);
    assert_eq!(game.timestamp, Some(now()));
    assert_eq!(game.player_stats["Ann & Bob"].total_points, 600);
    assert_eq!(game.player_stats["Ann & Bob"].wins, 1);
    assert_eq!(game.player_stats["Cy & Dee"].wins, 0);
}

#[test]
fn completed_needs_rounds() {
    let err = CompletedGame::from_state(&two_teams(), now()).unwrap_err();
    assert_eq!(err.validation_kind(), Some(&ValidationKind::NoRoundsPlayed));
}

#[test]
fn completed_survives_storage() {
    let game = CompletedGame::from_state(&finished_game(), now()).unwrap();
    let stored = serde_json::to_value(&game).unwrap();
    assert_eq!(stored["victoryMethod"], json!("Won on Bid"));
    assert_eq!(stored["timestamp"], json!("2025-06-01T12:00:00Z"));
    let back: CompletedGame = serde_json::from_value(stored).unwrap();
    assert_eq!(back, game);
}

#[test]
fn legacy_completed_record_resolves_teams() {
    let raw = json!({
        "usTeamName": "bob and Ann",
        "demName": "Cy / Dee",
        "rounds": [{
            "biddingTeam": "us",
            "bidAmount": "120",
            "usPoints": 150,
            "demPoints": "30",
            "runningTotals": {"us": 150, "dem": 30}
        }],
        "winner": "us",
        "timestamp": "2024-03-02T18:30:00Z",
        "durationMs": -7
    });
    let game: CompletedGame = serde_json::from_value(raw).unwrap();
    assert_eq!(game.us_players, ["Ann", "bob"]);
    assert_eq!(game.us_team_key.as_ref().unwrap().as_str(), "ann||bob");
    assert_eq!(game.dem_team_name, "Cy & Dee");
    assert_eq!(game.rounds[0].bid_amount, 120);
    // missing final score falls back to the round deltas
    assert_eq!(game.final_score, Totals::new(150, 30));
    assert_eq!(game.duration_ms, 0);
    assert_eq!(game.timestamp, Some(datetime!(2024-03-02 18:30 UTC)));
}

#[test]
fn nameless_record_uses_side_labels() {
    let game: CompletedGame = serde_json::from_value(json!({"timestamp": "yesterday"})).unwrap();
    assert_eq!(game.us_team_name, "Us");
    assert_eq!(game.dem_team_name, "Dem");
    assert_eq!(game.us_team_key, None);
    assert_eq!(game.timestamp, None);
    assert!(game.rounds.is_empty());
}

#[test]
fn team_membership_by_key_or_name() {
    let game = CompletedGame::from_state(&finished_game(), now()).unwrap();
    assert!(game.involves_team("cy||dee", ""));
    assert!(game.involves_team("", "Ann & Bob"));
    assert!(!game.involves_team("eve||fay", "Eve & Fay"));
    assert!(!game.involves_team("", ""));
}

#[test]
fn freezing_an_unfinished_game() {
    let settings = Settings::default();
    let mut state = two_teams();
    play(&mut state, Side::Us, 100, 120, true, &settings);
    state.start_time = None;
    state.accumulated_time = 9_000;

    let frozen = FrozenGame::from_state(&state, now()).unwrap();
    assert_eq!(frozen.name, "FROZEN-12:00:00");
    assert_eq!(frozen.last_bid, "100 (Ann & Bob)");
    assert_eq!(frozen.final_score, Totals::new(120, 60));
    assert_eq!(frozen.accumulated_time, 9_000);
    assert!(frozen.involves_team("ann||bob", ""));
}

#[test]
fn finished_or_empty_games_cannot_freeze() {
    let err = FrozenGame::from_state(&finished_game(), now()).unwrap_err();
    assert_eq!(err.validation_kind(), Some(&ValidationKind::GameOver));
    let err = FrozenGame::from_state(&two_teams(), now()).unwrap_err();
    assert_eq!(err.validation_kind(), Some(&ValidationKind::NoRoundsPlayed));
}

#[test]
fn resuming_restarts_the_clock() {
    let settings = Settings::default();
    let mut state = two_teams();
    play(&mut state, Side::Dem, 120, 150, true, &settings);
    state.start_time = None;
    state.accumulated_time = 3_000;
    crate::domain::resolution::select_team(&mut state, Side::Us).unwrap();
    crate::domain::resolution::choose_bid(&mut state, 95).unwrap();

    let frozen = FrozenGame::from_state(&state, now()).unwrap();
    let later = datetime!(2025-06-02 08:00 UTC);
    let resumed = frozen.resume(later);

    assert_eq!(resumed.rounds, state.rounds);
    assert_eq!(resumed.us_players, ["Ann", "Bob"]);
    assert_eq!(resumed.dem_team_name, "Cy & Dee");
    assert_eq!(resumed.bidding_team, Some(Side::Us));
    assert_eq!(resumed.bid_amount, Some(95));
    assert_eq!(resumed.accumulated_time, 3_000);
    assert_eq!(resumed.start_time, Some(epoch_millis(later)));
    assert!(!resumed.game_over);
    assert_eq!(resumed.current_totals(), Totals::new(30, 150));
}

#[test]
fn legacy_frozen_record() {
    let raw = json!({
        "name": "FROZEN-09:15:00",
        "usTeamName": "Ann & Bob",
        "demTeamName": "Cy and Dee",
        "startingTotals": {"us": "100", "dem": 20},
        "rounds": [],
        "lastBid": ""
    });
    let frozen: FrozenGame = serde_json::from_value(raw).unwrap();
    assert_eq!(frozen.dem_players, ["Cy", "Dee"]);
    assert_eq!(frozen.final_score, Totals::new(100, 20));
    assert_eq!(frozen.last_bid, "N/A");
    assert_eq!(frozen.bidding_team, None);
}
