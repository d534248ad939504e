//! Domain layer: pure scorekeeping logic, no I/O.

pub mod archive;
pub mod ledger;
pub mod probability;
pub mod resolution;
pub mod rules;
pub mod scoring;
mod serde_lenient;
pub mod state;
pub mod statistics;
pub mod team_identity;
pub mod team_registry;
pub mod termination;
pub mod timing;

#[cfg(test)]
mod test_fixtures;
#[cfg(test)]
mod test_prelude;
#[cfg(test)]
mod tests_archive;
#[cfg(test)]
mod tests_ledger;
#[cfg(test)]
mod tests_resolution;
#[cfg(test)]
mod tests_termination;

// Re-exports for ergonomics
pub use archive::{CompletedGame, FrozenGame};
pub use ledger::{redo, undo, LedgerStep};
pub use probability::{ProbabilityBreakdown, ProbabilityEstimator, WinProbability};
pub use resolution::{RoundResolved, Submission, TeamAssignment, ZeroPointsChoice};
pub use state::{EntryPhase, GameState, Round, Side, Totals, VictoryMethod};
pub use statistics::{aggregate, delete_team, StatisticsReport, TeamDeletion};
pub use team_identity::{build_team_key, canonicalize_players, PlayerPair, ResolvedTeam, TeamKey};
pub use team_registry::{TeamRegistry, TeamResultDelta};
pub use termination::Termination;
