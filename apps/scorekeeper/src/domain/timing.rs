//! Game clock bookkeeping.
//!
//! `start_time` marks when the timer was last (re)started and
//! `accumulated_time` holds everything banked before that. Elapsed time is
//! always derived from `now - start_time` with per-round and per-game caps,
//! so repeated save/load cycles never count the same interval twice.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::state::GameState;

pub const MAX_GAME_TIME_MS: i64 = 10 * 60 * 60 * 1000;
pub const MAX_ROUND_TIME_MS: i64 = 2 * 60 * 60 * 1000;

pub const ROUND_WARNING_MS: i64 = 90 * 60 * 1000;
pub const GAME_WARNING_MS: i64 = 8 * 60 * 60 * 1000;

/// Milliseconds since the Unix epoch.
pub fn epoch_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Bank the time since `start_time`, capped per round and per game.
pub fn safe_time_accumulation(accumulated: i64, start_time: Option<i64>, now: i64) -> i64 {
    let Some(start) = start_time else {
        return accumulated;
    };
    let elapsed = now.saturating_sub(start).max(0);
    let capped = elapsed.min(MAX_ROUND_TIME_MS);
    accumulated.saturating_add(capped).min(MAX_GAME_TIME_MS)
}

/// Uncapped live reading, for display only.
pub fn current_game_time(state: &GameState, now: i64) -> i64 {
    match state.start_time {
        Some(start) => state.accumulated_time + now.saturating_sub(start).max(0),
        None => state.accumulated_time,
    }
}

/// Start the clock when the first round of a fresh game is recorded.
pub fn start_if_first_round(state: &mut GameState, now: i64) {
    if state.rounds.is_empty() && state.start_time.is_none() {
        state.start_time = Some(now);
    }
}

/// Stop the clock at game end, banking the final stretch.
pub fn stop(state: &mut GameState, now: i64) {
    if state.start_time.is_some() {
        state.accumulated_time =
            safe_time_accumulation(state.accumulated_time, state.start_time, now);
        state.start_time = None;
    }
}

pub fn reset(state: &mut GameState) {
    state.start_time = None;
    state.accumulated_time = 0;
    state.timer_last_saved_at = None;
}

/// Copy of `state` suitable for persisting at `now`.
///
/// A running timer is banked and re-based to `now` in the copy. The live
/// state only records when it was last saved.
pub fn persistable_snapshot(state: &mut GameState, now: i64) -> GameState {
    let mut snapshot = state.clone();
    match state.start_time {
        Some(_) => {
            snapshot.accumulated_time =
                safe_time_accumulation(state.accumulated_time, state.start_time, now);
            snapshot.start_time = Some(now);
        }
        None => {
            snapshot.accumulated_time = state.accumulated_time.clamp(0, MAX_GAME_TIME_MS);
        }
    }
    snapshot.timer_last_saved_at = Some(now);
    state.timer_last_saved_at = Some(now);
    snapshot
}

/// Fix up timing fields of a freshly loaded state.
///
/// A snapshot written by [`persistable_snapshot`] already banked its time, so
/// only the cap is applied. Records without `timer_last_saved_at` predate
/// that and still owe the stretch since `start_time`.
pub fn restore_after_load(state: &mut GameState, now: i64) {
    let accumulated = state.accumulated_time.max(0);
    let timer_was_running = state.start_time.is_some() && !state.game_over && state.has_rounds();
    if timer_was_running {
        state.accumulated_time = if state.timer_last_saved_at.is_none() {
            safe_time_accumulation(accumulated, state.start_time, now)
        } else {
            accumulated.min(MAX_GAME_TIME_MS)
        };
        state.start_time = Some(now);
    } else {
        state.accumulated_time = accumulated.min(MAX_GAME_TIME_MS);
        state.start_time = None;
    }
    state.timer_last_saved_at = Some(now);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningLevel {
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWarning {
    pub level: WarningLevel,
    pub message: String,
}

/// Long-running round or game warning, if any.
pub fn time_warning(state: &GameState, now: i64) -> Option<TimeWarning> {
    let start = state.start_time?;
    if state.game_over {
        return None;
    }
    let game_time = current_game_time(state, now);
    let round_time = now.saturating_sub(start);
    if round_time <= ROUND_WARNING_MS && game_time <= GAME_WARNING_MS {
        return None;
    }
    let warning = if round_time as f64 > MAX_ROUND_TIME_MS as f64 * 0.9 {
        TimeWarning {
            level: WarningLevel::Danger,
            message: "Round time is very high! Consider starting a new game.".to_string(),
        }
    } else if game_time as f64 > MAX_GAME_TIME_MS as f64 * 0.9 {
        TimeWarning {
            level: WarningLevel::Danger,
            message: "Game time is very high! Consider starting a new game.".to_string(),
        }
    } else if round_time > ROUND_WARNING_MS {
        TimeWarning {
            level: WarningLevel::Warning,
            message: format!("Round has been active for {}", format_duration(round_time)),
        }
    } else {
        TimeWarning {
            level: WarningLevel::Warning,
            message: format!("Game has been active for {}", format_duration(game_time)),
        }
    };
    Some(warning)
}

/// `H:MM:SS` past an hour, otherwise `M:SS`.
pub fn format_duration(ms: i64) -> String {
    if ms <= 0 {
        return "0:00".to_string();
    }
    let secs = ms / 1000;
    let mins = secs / 60;
    let hrs = mins / 60;
    let s = secs % 60;
    let m = mins % 60;
    if hrs > 0 {
        format!("{hrs}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
