//! Single owner of the active game.
//!
//! [`Scorekeeper`] routes every mutation through the domain transition
//! functions, then hands a timing-safe snapshot to the store. Saving the
//! active game and updating the team registry are fire-and-forget: a failed
//! write is logged and play continues.

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::domain::archive::{CompletedGame, FrozenGame};
use crate::domain::ledger::{self, LedgerStep};
use crate::domain::probability::{ProbabilityBreakdown, ProbabilityEstimator, WinProbability};
use crate::domain::resolution::{
    self, RoundResolved, Submission, TeamAssignment, ZeroPointsChoice,
};
use crate::domain::state::{EntryPhase, GameState, Side};
use crate::domain::statistics::{self, StatisticsReport, TeamDeletion};
use crate::domain::team_registry::{TeamRegistry, TeamResultDelta};
use crate::domain::timing::{self, TimeWarning};
use crate::error::AppError;
use crate::store::{LoadOutcome, Persistence};

pub struct Scorekeeper<S, C = SystemClock> {
    state: GameState,
    settings: Settings,
    store: S,
    clock: C,
    estimator: ProbabilityEstimator,
}

impl<S: Persistence> Scorekeeper<S, SystemClock> {
    pub fn open(store: S) -> Result<Self, AppError> {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: Persistence, C: Clock> Scorekeeper<S, C> {
    /// Load settings and the active game from `store`.
    ///
    /// An unreadable active game has already been removed by the store; the
    /// controller starts over with a fresh game.
    pub fn with_clock(mut store: S, clock: C) -> Result<Self, AppError> {
        let settings = store.load_settings()?;
        let now = clock.now_millis();
        let state = match store.load_active()? {
            LoadOutcome::Empty => GameState::new(),
            LoadOutcome::Loaded(mut state) => {
                timing::restore_after_load(&mut state, now);
                debug!(rounds = state.rounds.len(), "Active game restored");
                state
            }
            LoadOutcome::Discarded { reason } => {
                warn!(%reason, "Stored active game was unreadable; starting a new game");
                GameState::new()
            }
        };
        Ok(Self {
            state,
            settings,
            store,
            clock,
            estimator: ProbabilityEstimator::new(),
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Normalize and save new settings. Penalty points are brought into range
    /// the same way stored settings are.
    pub fn update_settings(&mut self, settings: Settings) -> Result<(), AppError> {
        let settings = settings.normalized();
        self.store.save_settings(&settings)?;
        info!(
            must_win_by_bid = settings.must_win_by_bid,
            penalty_type = settings.table_talk_penalty_type.as_str(),
            penalty_points = settings.table_talk_penalty_points,
            "Settings updated"
        );
        self.settings = settings;
        Ok(())
    }

    /// Apply `ROOK_*` overrides for this session only; nothing is saved.
    pub fn apply_env_overrides(&mut self) {
        self.settings = self.settings.clone().with_env_overrides();
    }

    // Round entry

    pub fn select_team(&mut self, side: Side) -> Result<EntryPhase, AppError> {
        let phase = resolution::select_team(&mut self.state, side)?;
        self.persist();
        Ok(phase)
    }

    pub fn choose_bid(&mut self, bid: i32) -> Result<(), AppError> {
        resolution::choose_bid(&mut self.state, bid)?;
        self.persist();
        Ok(())
    }

    pub fn set_points_owner(&mut self, for_bidder: bool) -> Result<(), AppError> {
        resolution::set_points_owner(&mut self.state, for_bidder)?;
        self.persist();
        Ok(())
    }

    pub fn submit_points(&mut self, points: i32) -> Result<Submission, AppError> {
        let now = self.clock.now_millis();
        let submission = resolution::submit_points(&mut self.state, points, &self.settings, now)?;
        if let Submission::Resolved(resolved) = &submission {
            self.apply_team_delta(resolved.team_delta.as_ref());
        }
        self.persist();
        Ok(submission)
    }

    pub fn resolve_zero_points(&mut self, choice: ZeroPointsChoice) -> Result<RoundResolved, AppError> {
        let now = self.clock.now_millis();
        let resolved = resolution::resolve_zero_points(&mut self.state, choice, &self.settings, now)?;
        self.apply_team_delta(resolved.team_delta.as_ref());
        self.persist();
        Ok(resolved)
    }

    pub fn cancel_zero_points(&mut self) -> bool {
        let cancelled = resolution::cancel_zero_points(&mut self.state);
        if cancelled {
            self.persist();
        }
        cancelled
    }

    pub fn flag_penalty(&mut self, side: Side) -> Result<(), AppError> {
        resolution::flag_penalty(&mut self.state, side)?;
        self.persist();
        Ok(())
    }

    pub fn clear_penalty(&mut self) -> bool {
        let cleared = resolution::clear_penalty(&mut self.state);
        if cleared {
            self.persist();
        }
        cleared
    }

    pub fn apply_table_talk_penalty(&mut self, flagged: Side) -> Result<RoundResolved, AppError> {
        let now = self.clock.now_millis();
        let resolved =
            resolution::apply_table_talk_penalty(&mut self.state, flagged, &self.settings, now)?;
        self.apply_team_delta(resolved.team_delta.as_ref());
        self.persist();
        Ok(resolved)
    }

    // Ledger

    pub fn undo(&mut self) -> Result<LedgerStep, AppError> {
        let step = ledger::undo(&mut self.state)?;
        self.apply_team_delta(step.team_delta.as_ref());
        self.persist();
        Ok(step)
    }

    pub fn redo(&mut self) -> Result<LedgerStep, AppError> {
        let step = ledger::redo(&mut self.state, &self.settings)?;
        self.apply_team_delta(step.team_delta.as_ref());
        self.persist();
        Ok(step)
    }

    // Game lifecycle

    /// Name both partnerships and register them with the team registry.
    pub fn assign_teams<A: AsRef<str>, B: AsRef<str>>(
        &mut self,
        us_players: &[A],
        dem_players: &[B],
    ) -> Result<TeamAssignment, AppError> {
        let assignment = resolution::assign_teams(&mut self.state, us_players, dem_players)?;
        self.update_registry(|registry| {
            registry.ensure_entry(&assignment.us.players, &assignment.us.display);
            registry.ensure_entry(&assignment.dem.players, &assignment.dem.display);
        });
        self.persist();
        Ok(assignment)
    }

    pub fn start_from_totals<A: AsRef<str>, B: AsRef<str>>(
        &mut self,
        us: f64,
        dem: f64,
        us_players: &[A],
        dem_players: &[B],
    ) -> Result<(), AppError> {
        resolution::start_from_totals(&mut self.state, us, dem, us_players, dem_players)?;
        self.persist();
        Ok(())
    }

    /// Drop the active game, in memory and in the store.
    pub fn new_game(&mut self) -> Result<(), AppError> {
        resolution::new_game(&mut self.state);
        self.store.clear_active()?;
        info!("New game started");
        Ok(())
    }

    /// Archive the active game. A finished game is then cleared so the next
    /// one starts fresh; an unfinished one keeps going.
    pub fn save_completed(&mut self) -> Result<CompletedGame, AppError> {
        let game = CompletedGame::from_state(&self.state, self.clock.now())?;
        self.store.append_completed(game.clone())?;
        info!(
            us = game.final_score.us,
            dem = game.final_score.dem,
            winner = game.winner.map(|w| w.as_str()),
            "Game saved"
        );
        if self.state.game_over {
            self.new_game()?;
        }
        Ok(game)
    }

    /// Park the active game in the freezer and start a fresh one.
    pub fn freeze(&mut self) -> Result<FrozenGame, AppError> {
        let frozen = FrozenGame::from_state(&self.state, self.clock.now())?;
        self.store.prepend_frozen(frozen.clone())?;
        info!(name = %frozen.name, rounds = frozen.rounds.len(), "Game frozen");
        self.new_game()?;
        Ok(frozen)
    }

    /// Take the frozen game at `index` out of the freezer and make it active.
    pub fn resume_frozen(&mut self, index: usize) -> Result<(), AppError> {
        let frozen = self.store.remove_frozen(index)?;
        self.state = frozen.resume(self.clock.now());
        info!(name = %frozen.name, rounds = self.state.rounds.len(), "Frozen game resumed");
        self.persist();
        Ok(())
    }

    pub fn completed_games(&self) -> Result<Vec<CompletedGame>, AppError> {
        self.store.list_completed()
    }

    pub fn frozen_games(&self) -> Result<Vec<FrozenGame>, AppError> {
        self.store.list_frozen()
    }

    /// Delete a saved game and rebuild team counters without it.
    pub fn delete_completed(&mut self, index: usize) -> Result<CompletedGame, AppError> {
        let removed = self.store.remove_completed(index)?;
        self.rebuild_teams()?;
        Ok(removed)
    }

    pub fn delete_frozen(&mut self, index: usize) -> Result<FrozenGame, AppError> {
        self.store.remove_frozen(index)
    }

    // Derived views

    pub fn win_probability(&mut self) -> Result<WinProbability, AppError> {
        let corpus = self.store.list_completed()?;
        Ok(self.estimator.estimate(&self.state, &corpus, self.clock.now()))
    }

    pub fn probability_breakdown(&mut self) -> Result<ProbabilityBreakdown, AppError> {
        let corpus = self.store.list_completed()?;
        Ok(self.estimator.breakdown(&self.state, &corpus, self.clock.now()))
    }

    pub fn statistics(&self) -> Result<StatisticsReport, AppError> {
        let corpus = self.store.list_completed()?;
        Ok(statistics::aggregate(&corpus, self.clock.now()))
    }

    pub fn teams(&mut self) -> Result<TeamRegistry, AppError> {
        self.store.load_teams()
    }

    /// Remove a team with every saved and frozen game it played.
    pub fn delete_team(
        &mut self,
        team_key: Option<&str>,
        display_name: &str,
    ) -> Result<TeamDeletion, AppError> {
        let mut registry = self.store.load_teams()?;
        let mut completed = self.store.list_completed()?;
        let mut frozen = self.store.list_frozen()?;
        let deletion = statistics::delete_team(
            &mut registry,
            &mut completed,
            &mut frozen,
            Some(&self.state),
            team_key,
            display_name,
        )?;
        self.store.replace_completed(completed)?;
        self.store.replace_frozen(frozen)?;
        self.store.save_teams(&registry)?;
        self.estimator.invalidate();
        Ok(deletion)
    }

    /// Recount every registry entry from the completed games plus the
    /// active game when it is over.
    pub fn rebuild_teams(&mut self) -> Result<TeamRegistry, AppError> {
        let mut registry = self.store.load_teams()?;
        let completed = self.store.list_completed()?;
        registry.recalculate(&completed, Some(&self.state));
        self.store.save_teams(&registry)?;
        info!(teams = registry.len(), games = completed.len(), "Team records rebuilt");
        Ok(registry)
    }

    pub fn game_time_ms(&self) -> i64 {
        timing::current_game_time(&self.state, self.clock.now_millis())
    }

    pub fn time_warning(&self) -> Option<TimeWarning> {
        timing::time_warning(&self.state, self.clock.now_millis())
    }

    fn persist(&mut self) {
        let snapshot = timing::persistable_snapshot(&mut self.state, self.clock.now_millis());
        if let Err(err) = self.store.save_active(&snapshot) {
            warn!(error = %err, code = err.code(), "Failed to save active game");
        }
    }

    fn apply_team_delta(&mut self, delta: Option<&TeamResultDelta>) {
        let Some(delta) = delta else {
            return;
        };
        self.update_registry(|registry| {
            if !registry.apply_result_delta(delta) {
                debug!(direction = delta.direction, "Team result not recorded");
            }
        });
    }

    fn update_registry(&mut self, change: impl FnOnce(&mut TeamRegistry)) {
        let result = self.store.load_teams().and_then(|mut registry| {
            change(&mut registry);
            self.store.save_teams(&registry)
        });
        if let Err(err) = result {
            warn!(error = %err, code = err.code(), "Failed to update team records");
        }
    }
}
