use crate::errors::domain::{DomainError, ValidationKind};

/// Card points in one hand, excluding the 360 sweep.
pub const HAND_POINTS: i32 = 180;
/// The sweep: every point plus the Rook bonus.
pub const SWEEP_POINTS: i32 = 360;
pub const BID_STEP: i32 = 5;
pub const MAX_REGULAR_BID: i32 = 180;

pub const WIN_THRESHOLD: i32 = 500;
pub const SPREAD_THRESHOLD: i32 = 1000;

/// Bounds for totals carried over from a paper game.
pub const MAX_STARTING_TOTAL: i32 = 1000;

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn is_step(value: f64) -> bool {
    value.fract() == 0.0 && (value as i64) % BID_STEP as i64 == 0
}

/// Valid bids are the multiples of 5 in `[5, 180]` plus 360.
pub fn validate_bid(bid: i32) -> Result<i32, DomainError> {
    check_bid(bid as f64).map(|_| bid)
}

/// Parse and validate a bid typed by the scorekeeper.
pub fn parse_bid(raw: &str) -> Result<i32, DomainError> {
    let value = parse_number(raw).ok_or_else(|| invalid_bid("Bid must be a number."))?;
    check_bid(value)?;
    Ok(value as i32)
}

fn check_bid(value: f64) -> Result<(), DomainError> {
    if value <= 0.0 {
        return Err(invalid_bid("Bid must be > 0."));
    }
    if !is_step(value) {
        return Err(invalid_bid("Bid must be multiple of 5."));
    }
    if value > SWEEP_POINTS as f64 {
        return Err(invalid_bid("Bid max 360."));
    }
    if value > MAX_REGULAR_BID as f64 && value < SWEEP_POINTS as f64 {
        return Err(invalid_bid("Bids between 180 and 360 are not allowed."));
    }
    Ok(())
}

fn invalid_bid(msg: &str) -> DomainError {
    DomainError::validation(ValidationKind::InvalidBid, msg)
}

/// Valid points are the multiples of 5 in `[0, 180]` plus 360.
pub fn validate_points(points: i32) -> Result<i32, DomainError> {
    check_points(points as f64).map(|_| points)
}

/// Parse and validate an entered points value.
pub fn parse_points(raw: &str) -> Result<i32, DomainError> {
    let value = parse_number(raw).ok_or_else(|| invalid_points("Points must be a number."))?;
    check_points(value)?;
    Ok(value as i32)
}

fn check_points(value: f64) -> Result<(), DomainError> {
    if !is_step(value) {
        return Err(invalid_points("Points must be multiple of 5."));
    }
    if value != SWEEP_POINTS as f64 && !(0.0..=HAND_POINTS as f64).contains(&value) {
        return Err(invalid_points("Points 0-180 or 360."));
    }
    Ok(())
}

fn invalid_points(msg: &str) -> DomainError {
    DomainError::validation(ValidationKind::InvalidPoints, msg)
}

/// Totals entered when resuming a paper game.
pub fn validate_starting_total(value: f64) -> Result<i32, DomainError> {
    if !value.is_finite() {
        return Err(DomainError::validation(
            ValidationKind::InvalidStartingTotals,
            "Scores must be numbers.",
        ));
    }
    if value.abs() > MAX_STARTING_TOTAL as f64 {
        return Err(DomainError::validation(
            ValidationKind::InvalidStartingTotals,
            "Scores should stay between -1000 and 1000.",
        ));
    }
    if value.fract() != 0.0 || (value as i64) % BID_STEP as i64 != 0 {
        return Err(DomainError::validation(
            ValidationKind::InvalidStartingTotals,
            "Scores must be in increments of 5.",
        ));
    }
    Ok(value as i32)
}
