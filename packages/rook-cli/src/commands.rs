//! Subcommands and their execution against a [`Scorekeeper`].

use std::io::Write;

use clap::{Subcommand, ValueEnum};
use scorekeeper::clock::Clock;
use scorekeeper::config::settings::normalize_penalty_points;
use scorekeeper::config::PenaltyType;
use scorekeeper::domain::probability::WinProbability;
use scorekeeper::domain::resolution::{Submission, ZeroPointsChoice};
use scorekeeper::domain::rules;
use scorekeeper::domain::state::{Side, Totals};
use scorekeeper::domain::timing::{format_duration, TimeWarning};
use scorekeeper::errors::domain::DomainError;
use scorekeeper::store::{self, Persistence};
use scorekeeper::{AppError, Scorekeeper};
use serde::Serialize;
use tracing::info;

use crate::output::Output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SideArg {
    Us,
    Dem,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Us => Side::Us,
            SideArg::Dem => Side::Dem,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ZeroAs {
    #[value(name = "180")]
    OneEighty,
    #[value(name = "360")]
    ThreeSixty,
}

impl From<ZeroAs> for ZeroPointsChoice {
    fn from(choice: ZeroAs) -> Self {
        match choice {
            ZeroAs::OneEighty => ZeroPointsChoice::OneEighty,
            ZeroAs::ThreeSixty => ZeroPointsChoice::ThreeSixty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PenaltyArg {
    SetPoints,
    LoseBid,
}

impl From<PenaltyArg> for PenaltyType {
    fn from(kind: PenaltyArg) -> Self {
        match kind {
            PenaltyArg::SetPoints => PenaltyType::SetPoints,
            PenaltyArg::LoseBid => PenaltyType::LoseBid,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Current game: teams, totals, clock and win probability
    Show,
    /// Score one hand
    Play {
        #[arg(long, value_enum)]
        bidder: SideArg,
        #[arg(long, value_parser = rules::parse_bid)]
        bid: i32,
        #[arg(long, value_parser = rules::parse_points)]
        points: i32,
        /// Points were counted by the defending side
        #[arg(long)]
        defenders: bool,
        /// Meaning of a zero entry
        #[arg(long, value_enum)]
        zero_as: Option<ZeroAs>,
    },
    /// Record a table-talk penalty instead of scoring the hand
    Penalty {
        /// Side that talked
        #[arg(long, value_enum)]
        team: SideArg,
        #[arg(long, value_enum)]
        bidder: SideArg,
        #[arg(long, value_parser = rules::parse_bid)]
        bid: i32,
    },
    Undo,
    Redo,
    /// Name both partnerships
    AssignTeams {
        #[arg(long, num_args = 2, required = true)]
        us: Vec<String>,
        #[arg(long, num_args = 2, required = true)]
        dem: Vec<String>,
    },
    /// Continue a game scored on paper
    StartFrom {
        #[arg(long, allow_negative_numbers = true)]
        us_score: f64,
        #[arg(long, allow_negative_numbers = true)]
        dem_score: f64,
        #[arg(long, num_args = 0..=2)]
        us: Vec<String>,
        #[arg(long, num_args = 0..=2)]
        dem: Vec<String>,
    },
    /// Discard the active game
    NewGame,
    /// Move the active game to the saved history
    Save,
    /// Park the active game for later
    Freeze,
    /// Resume a frozen game by position
    Resume { index: usize },
    /// Saved games
    History,
    /// Frozen games
    Frozen,
    /// Remove a saved game by position
    DeleteGame { index: usize },
    /// Win probability of the current game
    Probability,
    /// Every value behind the win probability
    Breakdown,
    /// Team and player statistics
    Stats,
    /// Stored team records
    Teams,
    /// Recount team records from saved games
    RebuildTeams,
    /// Delete a team with all of its saved and frozen games
    DeleteTeam {
        #[arg(long)]
        key: Option<String>,
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Rewrite stored records in the current format
    Migrate,
    /// Show or change game rules
    Settings {
        #[arg(long)]
        must_win_by_bid: Option<bool>,
        #[arg(long, value_enum)]
        penalty_type: Option<PenaltyArg>,
        #[arg(long)]
        penalty_points: Option<i32>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GameSummary {
    us_team: String,
    dem_team: String,
    rounds: usize,
    totals: Totals,
    game_over: bool,
    winner: Option<Side>,
    victory_method: Option<&'static str>,
    game_time: String,
    probability: WinProbability,
    time_warning: Option<TimeWarning>,
    undoable: usize,
    redoable: usize,
}

fn summary<S: Persistence, C: Clock>(keeper: &mut Scorekeeper<S, C>) -> Result<GameSummary, AppError> {
    let probability = keeper.win_probability()?;
    let state = keeper.state();
    Ok(GameSummary {
        us_team: state.team_name(Side::Us).to_string(),
        dem_team: state.team_name(Side::Dem).to_string(),
        rounds: state.rounds.len(),
        totals: state.current_totals(),
        game_over: state.game_over,
        winner: state.winner,
        victory_method: state.victory_method.map(|m| m.label()),
        game_time: format_duration(keeper.game_time_ms()),
        probability,
        time_warning: keeper.time_warning(),
        undoable: state.rounds.len(),
        redoable: state.undone_rounds.len(),
    })
}

/// Select `bidder` (unless already selected) and record the bid.
fn enter_bid<S: Persistence, C: Clock>(
    keeper: &mut Scorekeeper<S, C>,
    bidder: Side,
    bid: i32,
) -> Result<(), AppError> {
    if keeper.state().bidding_team != Some(bidder) {
        keeper.select_team(bidder)?;
    }
    keeper.choose_bid(bid)
}

pub fn run<S: Persistence, C: Clock, W: Write>(
    keeper: &mut Scorekeeper<S, C>,
    command: Command,
    out: &mut Output<W>,
) -> Result<(), AppError> {
    match command {
        Command::Show => out.emit(&summary(keeper)?),
        Command::Play {
            bidder,
            bid,
            points,
            defenders,
            zero_as,
        } => {
            enter_bid(keeper, bidder.into(), bid)?;
            keeper.set_points_owner(!defenders)?;
            let resolved = match keeper.submit_points(points)? {
                Submission::Resolved(resolved) => resolved,
                Submission::NeedsZeroPointsChoice(_) => match zero_as {
                    Some(choice) => keeper.resolve_zero_points(choice.into())?,
                    None => {
                        return Err(DomainError::validation_other(
                            "Zero points entered; pass --zero-as 180 or --zero-as 360.",
                        )
                        .into())
                    }
                },
            };
            out.emit(&resolved.round)?;
            out.emit(&summary(keeper)?)
        }
        Command::Penalty { team, bidder, bid } => {
            enter_bid(keeper, bidder.into(), bid)?;
            let resolved = keeper.apply_table_talk_penalty(team.into())?;
            out.emit(&resolved.round)?;
            out.emit(&summary(keeper)?)
        }
        Command::Undo => {
            let step = keeper.undo()?;
            out.emit(&step.round)?;
            out.emit(&summary(keeper)?)
        }
        Command::Redo => {
            let step = keeper.redo()?;
            out.emit(&step.round)?;
            out.emit(&summary(keeper)?)
        }
        Command::AssignTeams { us, dem } => {
            keeper.assign_teams(&us, &dem)?;
            out.emit(&summary(keeper)?)
        }
        Command::StartFrom {
            us_score,
            dem_score,
            us,
            dem,
        } => {
            keeper.start_from_totals(us_score, dem_score, &us, &dem)?;
            out.emit(&summary(keeper)?)
        }
        Command::NewGame => {
            keeper.new_game()?;
            out.emit(&summary(keeper)?)
        }
        Command::Save => out.emit(&keeper.save_completed()?),
        Command::Freeze => out.emit(&keeper.freeze()?),
        Command::Resume { index } => {
            keeper.resume_frozen(index)?;
            out.emit(&summary(keeper)?)
        }
        Command::History => out.emit_all(&keeper.completed_games()?),
        Command::Frozen => out.emit_all(&keeper.frozen_games()?),
        Command::DeleteGame { index } => out.emit(&keeper.delete_completed(index)?),
        Command::Probability => out.emit(&keeper.win_probability()?),
        Command::Breakdown => out.emit(&keeper.probability_breakdown()?),
        Command::Stats => out.emit(&keeper.statistics()?),
        Command::Teams => out.emit(&keeper.teams()?.to_storage()),
        Command::RebuildTeams => out.emit(&keeper.rebuild_teams()?.to_storage()),
        Command::DeleteTeam { key, name } => out.emit(&keeper.delete_team(key.as_deref(), &name)?),
        Command::Migrate => {
            let report = store::migrate(keeper.store_mut())?;
            info!(teams = report.teams, "Migration finished");
            out.emit(&report)
        }
        Command::Settings {
            must_win_by_bid,
            penalty_type,
            penalty_points,
        } => {
            if must_win_by_bid.is_some() || penalty_type.is_some() || penalty_points.is_some() {
                let mut settings = keeper.settings().clone();
                if let Some(on) = must_win_by_bid {
                    settings.must_win_by_bid = on;
                }
                if let Some(kind) = penalty_type {
                    settings.table_talk_penalty_type = kind.into();
                }
                if let Some(points) = penalty_points {
                    settings.table_talk_penalty_points = normalize_penalty_points(Some(f64::from(points)));
                }
                keeper.update_settings(settings)?;
            }
            out.emit(keeper.settings())
        }
    }
}
