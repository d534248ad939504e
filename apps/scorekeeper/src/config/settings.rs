use std::env;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

pub const DEFAULT_PENALTY_POINTS: i32 = 180;
pub const MIN_PENALTY_POINTS: i32 = 5;
pub const MAX_PENALTY_POINTS: i32 = 500;

pub const ENV_MUST_WIN_BY_BID: &str = "ROOK_MUST_WIN_BY_BID";
pub const ENV_PENALTY_TYPE: &str = "ROOK_TABLE_TALK_PENALTY_TYPE";
pub const ENV_PENALTY_POINTS: &str = "ROOK_TABLE_TALK_PENALTY_POINTS";

/// What a table-talk penalty costs the flagged team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PenaltyType {
    /// A fixed number of points, see [`Settings::table_talk_penalty_points`].
    #[default]
    SetPoints,
    /// The current bid amount.
    LoseBid,
}

impl PenaltyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PenaltyType::SetPoints => "setPoints",
            PenaltyType::LoseBid => "loseBid",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "setPoints" => Some(PenaltyType::SetPoints),
            "loseBid" => Some(PenaltyType::LoseBid),
            _ => None,
        }
    }
}

/// Game rules chosen by the players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// When on, a set bidder does not hand the game to an opponent past 500.
    #[serde(default)]
    pub must_win_by_bid: bool,
    #[serde(default, deserialize_with = "penalty_type_or_default")]
    pub table_talk_penalty_type: PenaltyType,
    #[serde(
        default = "default_penalty_points",
        deserialize_with = "penalty_points_normalized"
    )]
    pub table_talk_penalty_points: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            must_win_by_bid: false,
            table_talk_penalty_type: PenaltyType::SetPoints,
            table_talk_penalty_points: DEFAULT_PENALTY_POINTS,
        }
    }
}

fn default_penalty_points() -> i32 {
    DEFAULT_PENALTY_POINTS
}

fn penalty_type_or_default<'de, D>(deserializer: D) -> Result<PenaltyType, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(PenaltyType::parse)
        .unwrap_or_default())
}

fn penalty_points_normalized<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let raw = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(normalize_penalty_points(raw))
}

/// Missing or non-numeric values fall back to 180; everything else is
/// clamped to `[5, 500]` and rounded to the nearest multiple of 5.
pub fn normalize_penalty_points(raw: Option<f64>) -> i32 {
    let Some(points) = raw.filter(|p| p.is_finite()) else {
        return DEFAULT_PENALTY_POINTS;
    };
    let points = points.trunc() as i64;
    if points == 0 {
        return DEFAULT_PENALTY_POINTS;
    }
    let clamped = points.clamp(MIN_PENALTY_POINTS as i64, MAX_PENALTY_POINTS as i64) as i32;
    ((clamped as f64 / 5.0).round() as i32) * 5
}

impl Settings {
    /// Same settings with penalty points brought into `[5, 500]` on a
    /// multiple of 5.
    pub fn normalized(mut self) -> Self {
        self.table_talk_penalty_points =
            normalize_penalty_points(Some(f64::from(self.table_talk_penalty_points)));
        self
    }

    /// Amount lost by the flagged side for a penalty at the given bid.
    pub fn penalty_amount(&self, bid: i32) -> i32 {
        match self.table_talk_penalty_type {
            PenaltyType::SetPoints => {
                normalize_penalty_points(Some(f64::from(self.table_talk_penalty_points)))
            }
            PenaltyType::LoseBid => bid,
        }
    }

    /// Apply `ROOK_*` environment overrides. Invalid values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(raw) = env::var(ENV_MUST_WIN_BY_BID) {
            match parse_bool(&raw) {
                Some(v) => self.must_win_by_bid = v,
                None => warn!(var = ENV_MUST_WIN_BY_BID, value = %raw, "Ignoring invalid setting override"),
            }
        }
        if let Ok(raw) = env::var(ENV_PENALTY_TYPE) {
            match PenaltyType::parse(&raw) {
                Some(v) => self.table_talk_penalty_type = v,
                None => warn!(var = ENV_PENALTY_TYPE, value = %raw, "Ignoring invalid setting override"),
            }
        }
        if let Ok(raw) = env::var(ENV_PENALTY_POINTS) {
            match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => {
                    self.table_talk_penalty_points = normalize_penalty_points(Some(v))
                }
                _ => warn!(var = ENV_PENALTY_POINTS, value = %raw, "Ignoring invalid setting override"),
            }
        }
        self
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
