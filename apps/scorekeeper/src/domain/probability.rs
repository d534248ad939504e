//! Live win-probability estimate.
//!
//! An empirical table of how past games ended from a given round and score
//! band is blended with a fixed logistic model. The blend leans on the table
//! only as far as it has observations for the exact situation.

use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::debug;

use super::archive::CompletedGame;
use super::state::{GameState, Side, Totals};

/// Width of one score band.
pub const BUCKET_WIDTH: i32 = 20;
/// Differentials at or beyond this collapse into the last band.
pub const BUCKET_CAP: i32 = 180;

/// Recency decay: a game loses this factor of weight every half-life.
pub const RECENCY_DECAY: f64 = 0.8;
pub const RECENCY_HALF_LIFE_DAYS: f64 = 14.0;
pub const RECENT_GAME_DAYS: f64 = 30.0;

/// Observation count at which the empirical table gets full weight.
pub const CONFIDENCE_THRESHOLD: f64 = 30.0;

const LOGISTIC_INTERCEPT: f64 = 0.208_458_687_614_183_1;
const LOGISTIC_DIFF: f64 = 0.004_211_07;
const LOGISTIC_ROUND: f64 = -0.095_209_21;
const LOGISTIC_MOMENTUM: f64 = 0.001_494_16;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Signed 20-point band of a score differential; `0` for `-19..=19`.
pub fn bucket_score(diff: i32) -> i32 {
    let abs = diff.unsigned_abs().min(BUCKET_CAP as u32) as i32;
    let band = (abs / BUCKET_WIDTH) * BUCKET_WIDTH;
    if diff < 0 {
        -band
    } else {
        band
    }
}

/// Human range of a band, e.g. `"40-59"` or `"180+"`.
pub fn bucket_range(bucket: i32) -> String {
    let abs = bucket.abs();
    if abs >= BUCKET_CAP {
        format!("{BUCKET_CAP}+")
    } else {
        format!("{}-{}", abs, abs + BUCKET_WIDTH - 1)
    }
}

fn describe_situation(bucket: i32) -> String {
    let abs = bucket.abs();
    let range = bucket_range(bucket);
    if abs == 0 {
        format!("Even games ({range})")
    } else if abs <= 130 {
        format!("Close games ({range})")
    } else {
        format!("Large leads ({range})")
    }
}

/// Calibrated model probability that `us` goes on to win.
pub fn logistic_probability(diff: f64, round_index: f64, momentum: f64) -> f64 {
    let z = LOGISTIC_INTERCEPT
        + LOGISTIC_DIFF * diff
        + LOGISTIC_ROUND * round_index
        + LOGISTIC_MOMENTUM * momentum;
    1.0 / (1.0 + (-z).exp())
}

/// Weight of the empirical estimate given `observations` beyond the prior.
pub fn blend_weight(observations: f64) -> f64 {
    ((observations.max(0.0) + 1.0).ln() / (CONFIDENCE_THRESHOLD + 1.0).ln()).min(1.0)
}

fn age_days(timestamp: Option<OffsetDateTime>, now: OffsetDateTime) -> Option<f64> {
    timestamp.map(|ts| ((now - ts).as_seconds_f64() / SECONDS_PER_DAY).max(0.0))
}

/// Recency weight of a game; undated games count fully.
pub fn recency_weight(timestamp: Option<OffsetDateTime>, now: OffsetDateTime) -> f64 {
    match age_days(timestamp, now) {
        Some(days) => RECENCY_DECAY.powf(days / RECENCY_HALF_LIFE_DAYS),
        None => 1.0,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Weighted final outcomes seen from one `(round, band)` cell, including the
/// 1/1 prior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutcomeCounts {
    pub us: f64,
    pub dem: f64,
}

impl Default for OutcomeCounts {
    fn default() -> Self {
        Self { us: 1.0, dem: 1.0 }
    }
}

impl OutcomeCounts {
    pub fn probability_us(&self) -> f64 {
        self.us / (self.us + self.dem)
    }

    /// Weighted games observed, prior excluded.
    pub fn observations(&self) -> f64 {
        self.us + self.dem - 2.0
    }

    fn add(&mut self, winner: Side, weight: f64) {
        match winner {
            Side::Us => self.us += weight,
            Side::Dem => self.dem += weight,
        }
    }
}

fn eventual_winner(final_score: Totals) -> Side {
    if final_score.us > final_score.dem {
        Side::Us
    } else {
        Side::Dem
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmpiricalTable {
    cells: BTreeMap<(usize, i32), OutcomeCounts>,
    games: usize,
}

impl EmpiricalTable {
    /// Every completed game credits its eventual winner to each
    /// `(round, band)` cell it passed through.
    pub fn build(corpus: &[CompletedGame], now: OffsetDateTime) -> Self {
        let mut table = Self::default();
        for game in corpus.iter().filter(|g| !g.rounds.is_empty()) {
            let winner = eventual_winner(game.final_score);
            let weight = recency_weight(game.timestamp, now);
            for (idx, round) in game.rounds.iter().enumerate() {
                let bucket = bucket_score(round.running_totals.diff());
                table
                    .cells
                    .entry((idx, bucket))
                    .or_default()
                    .add(winner, weight);
            }
            table.games += 1;
        }
        table
    }

    pub fn counts(&self, round_index: usize, bucket: i32) -> OutcomeCounts {
        self.cells
            .get(&(round_index, bucket))
            .copied()
            .unwrap_or_default()
    }

    /// Games that contributed at least one round.
    pub fn games(&self) -> usize {
        self.games
    }

    /// `(observations, us wins)` for `bucket` within one round of
    /// `round_index`, prior excluded.
    pub fn nearby(&self, round_index: usize, bucket: i32) -> (f64, f64) {
        let lo = round_index.saturating_sub(1);
        let hi = round_index + 1;
        self.cells
            .iter()
            .filter(|((idx, b), _)| *b == bucket && (lo..=hi).contains(idx))
            .fold((0.0, 0.0), |(obs, wins), (_, c)| {
                (obs + c.observations(), wins + c.us - 1.0)
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WinProbability {
    pub us: f64,
    pub dem: f64,
}

impl WinProbability {
    pub const EVEN: WinProbability = WinProbability { us: 50.0, dem: 50.0 };

    fn from_us(p: f64) -> Self {
        let us = round1(p * 100.0);
        Self {
            us,
            dem: round1(100.0 - us),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Low-Medium")]
    LowMedium,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "High")]
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl Confidence {
    pub fn from_observations(observations: f64) -> Self {
        if observations >= 50.0 {
            Confidence::VeryHigh
        } else if observations >= 20.0 {
            Confidence::High
        } else if observations >= 10.0 {
            Confidence::Medium
        } else if observations >= 5.0 {
            Confidence::LowMedium
        } else {
            Confidence::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Confidence::Low => "Low",
            Confidence::LowMedium => "Low-Medium",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
            Confidence::VeryHigh => "Very High",
        }
    }
}

/// Every intermediate value behind a [`WinProbability`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbabilityBreakdown {
    pub probability: WinProbability,
    pub rounds_played: usize,
    pub totals: Totals,
    pub score_diff: i32,
    pub momentum: i32,
    pub bucket: i32,
    pub bucket_range: String,
    pub situation: String,
    pub empirical_probability: f64,
    pub model_probability: f64,
    pub observations: f64,
    pub empirical_weight: f64,
    pub model_weight: f64,
    pub confidence: Confidence,
    pub nearby_observations: f64,
    pub nearby_wins: f64,
    /// `None` without nearby observations.
    pub nearby_win_rate: Option<f64>,
    pub games_analyzed: usize,
    pub recent_games: usize,
    pub older_games: usize,
}

/// Inputs of one estimate, derived from the active game.
struct Situation {
    round_index: usize,
    totals: Totals,
    diff: i32,
    momentum: i32,
}

impl Situation {
    fn of(state: &GameState) -> Option<Self> {
        let last = state.rounds.last()?;
        let totals = last.running_totals;
        let diff = totals.diff();
        let prev_diff = state
            .rounds
            .len()
            .checked_sub(2)
            .and_then(|i| state.rounds.get(i))
            .map(|r| r.running_totals.diff())
            .unwrap_or(0);
        Some(Self {
            round_index: state.rounds.len() - 1,
            totals,
            diff,
            momentum: diff.saturating_sub(prev_diff),
        })
    }
}

struct Blend {
    counts: OutcomeCounts,
    model: f64,
    beta: f64,
    p_us: f64,
}

fn blend(table: &EmpiricalTable, s: &Situation) -> Blend {
    let counts = table.counts(s.round_index, bucket_score(s.diff));
    let model = logistic_probability(s.diff as f64, s.round_index as f64, s.momentum as f64);
    let beta = blend_weight(counts.observations());
    Blend {
        counts,
        model,
        beta,
        p_us: beta * counts.probability_us() + (1.0 - beta) * model,
    }
}

/// Estimator holding the empirical table, rebuilt whenever the number of
/// completed games changes. Edits that keep the count are not noticed.
#[derive(Debug, Default)]
pub struct ProbabilityEstimator {
    cached: Option<(usize, EmpiricalTable)>,
}

impl ProbabilityEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&mut self, corpus: &[CompletedGame], now: OffsetDateTime) -> &EmpiricalTable {
        let size = corpus.len();
        if self.cached.as_ref().is_some_and(|(cached, _)| *cached != size) {
            self.cached = None;
        }
        let (_, table) = self.cached.get_or_insert_with(|| {
            debug!(games = size, "Rebuilding win-probability table");
            (size, EmpiricalTable::build(corpus, now))
        });
        table
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub fn estimate(
        &mut self,
        state: &GameState,
        corpus: &[CompletedGame],
        now: OffsetDateTime,
    ) -> WinProbability {
        let Some(situation) = Situation::of(state) else {
            return WinProbability::EVEN;
        };
        let table = self.table(corpus, now);
        WinProbability::from_us(blend(table, &situation).p_us)
    }

    pub fn breakdown(
        &mut self,
        state: &GameState,
        corpus: &[CompletedGame],
        now: OffsetDateTime,
    ) -> ProbabilityBreakdown {
        let recent_games = corpus
            .iter()
            .filter(|g| age_days(g.timestamp, now).is_some_and(|d| d <= RECENT_GAME_DAYS))
            .count();
        let older_games = corpus.len() - recent_games;
        let table = self.table(corpus, now);
        let games_analyzed = table.games();

        let Some(situation) = Situation::of(state) else {
            let totals = state.last_running_totals();
            let bucket = bucket_score(totals.diff());
            return ProbabilityBreakdown {
                probability: WinProbability::EVEN,
                rounds_played: 0,
                totals,
                score_diff: totals.diff(),
                momentum: 0,
                bucket,
                bucket_range: bucket_range(bucket),
                situation: describe_situation(bucket),
                empirical_probability: 0.5,
                model_probability: 0.5,
                observations: 0.0,
                empirical_weight: 0.0,
                model_weight: 1.0,
                confidence: Confidence::Low,
                nearby_observations: 0.0,
                nearby_wins: 0.0,
                nearby_win_rate: None,
                games_analyzed,
                recent_games,
                older_games,
            };
        };

        let bucket = bucket_score(situation.diff);
        let b = blend(table, &situation);
        let (nearby_observations, nearby_wins) = table.nearby(situation.round_index, bucket);
        let observations = b.counts.observations();
        ProbabilityBreakdown {
            probability: WinProbability::from_us(b.p_us),
            rounds_played: situation.round_index + 1,
            totals: situation.totals,
            score_diff: situation.diff,
            momentum: situation.momentum,
            bucket,
            bucket_range: bucket_range(bucket),
            situation: describe_situation(bucket),
            empirical_probability: b.counts.probability_us(),
            model_probability: b.model,
            observations,
            empirical_weight: b.beta,
            model_weight: 1.0 - b.beta,
            confidence: Confidence::from_observations(observations),
            nearby_observations,
            nearby_wins,
            nearby_win_rate: (nearby_observations > 0.0).then(|| nearby_wins / nearby_observations),
            games_analyzed,
            recent_games,
            older_games,
        }
    }
}
