use scorekeeper::clock::FixedClock;
use scorekeeper::domain::archive::FrozenGame;
use scorekeeper::domain::state::Side;
use scorekeeper::domain::team_identity::TeamKey;
use scorekeeper::domain::team_registry::TeamRegistry;
use scorekeeper::store::{JsonFileStore, Persistence};
use scorekeeper::Scorekeeper;
use scorekeeper_test_support::fixtures::{game, quick_win, round, temp_store, test_now};
use tempfile::TempDir;

const ANN_BOB: [&str; 2] = ["Ann", "Bob"];
const CY_DEE: [&str; 2] = ["Cy", "Dee"];
const EVE_FAY: [&str; 2] = ["Eve", "Fay"];

/// Three saved games and one frozen game between three teams.
fn league() -> (TempDir, Scorekeeper<JsonFileStore, FixedClock>) {
    let (guard, mut store) = temp_store();
    let now = test_now();
    store
        .replace_completed(vec![
            quick_win(ANN_BOB, CY_DEE, Side::Us, now),
            quick_win(ANN_BOB, EVE_FAY, Side::Dem, now),
            quick_win(CY_DEE, EVE_FAY, Side::Us, now),
        ])
        .unwrap();
    let paused = game(CY_DEE, EVE_FAY, vec![round(Side::Us, 120, 150, 30)], None);
    store
        .prepend_frozen(FrozenGame::from_state(&paused, now).unwrap())
        .unwrap();
    let mut keeper = Scorekeeper::with_clock(store, FixedClock::new(now)).unwrap();
    keeper.rebuild_teams().unwrap();
    (guard, keeper)
}

fn key(raw: &str) -> TeamKey {
    TeamKey::parse(raw).unwrap()
}

#[test]
fn rebuild_counts_every_saved_game() {
    let (_guard, mut keeper) = league();
    let teams = keeper.teams().unwrap();
    assert_eq!(teams.len(), 3);
    for k in ["ann||bob", "cy||dee", "eve||fay"] {
        let entry = teams.get(&key(k)).unwrap();
        assert_eq!((entry.games_played, entry.wins, entry.losses), (2, 1, 1), "{k}");
    }
}

#[test]
fn deleting_a_team_cascades_to_its_games() {
    let (_guard, mut keeper) = league();
    let deletion = keeper.delete_team(Some("cy||dee"), "Cy & Dee").unwrap();
    assert_eq!(deletion.removed_key, Some(key("cy||dee")));
    assert_eq!(deletion.removed_completed, 2);
    assert_eq!(deletion.removed_frozen, 1);

    let remaining = keeper.completed_games().unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(keeper.frozen_games().unwrap().is_empty());

    let teams = keeper.teams().unwrap();
    assert!(teams.get(&key("cy||dee")).is_none());
    let ann_bob = teams.get(&key("ann||bob")).unwrap();
    assert_eq!((ann_bob.games_played, ann_bob.wins, ann_bob.losses), (1, 0, 1));

    let report = keeper.statistics().unwrap();
    assert_eq!(report.total_games, 1);
    assert!(report.teams.iter().all(|t| t.name != "Cy & Dee"));
    assert!(report.players.iter().all(|p| p.key != "cy" && p.key != "dee"));
}

#[test]
fn rebuild_after_deletion_matches_a_fresh_count() {
    let (_guard, mut keeper) = league();
    keeper.delete_team(Some("cy||dee"), "").unwrap();
    let after_delete = keeper.teams().unwrap();

    let mut fresh = TeamRegistry::new();
    fresh.recalculate(&keeper.completed_games().unwrap(), None);
    assert_eq!(after_delete, fresh);

    let rebuilt = keeper.rebuild_teams().unwrap();
    assert_eq!(rebuilt, after_delete);
}

#[test]
fn teams_can_be_deleted_by_display_name() {
    let (_guard, mut keeper) = league();
    let deletion = keeper.delete_team(None, "Eve & Fay").unwrap();
    assert_eq!(deletion.removed_key, Some(key("eve||fay")));
    assert_eq!(deletion.removed_completed, 2);
    assert_eq!(keeper.teams().unwrap().len(), 2);
}

#[test]
fn deletion_needs_a_key_or_a_name() {
    let (_guard, mut keeper) = league();
    let err = keeper.delete_team(None, "").unwrap_err();
    assert_eq!(err.code(), "TEAM_NOT_FOUND");
    assert_eq!(keeper.completed_games().unwrap().len(), 3);
}

#[test]
fn deleting_a_saved_game_updates_team_counters() {
    let (_guard, mut keeper) = league();
    keeper.delete_completed(0).unwrap();
    let teams = keeper.teams().unwrap();
    let ann_bob = teams.get(&key("ann||bob")).unwrap();
    assert_eq!((ann_bob.games_played, ann_bob.wins), (1, 0));
    assert_eq!(
        keeper.delete_completed(5).unwrap_err().code(),
        "COMPLETED_GAME_NOT_FOUND"
    );
}
