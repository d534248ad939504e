use crate::domain::rules::{HAND_POINTS, SWEEP_POINTS};
use crate::domain::state::{PendingPenalty, Side, Totals};

/// Inputs to a normal (non-penalty) round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandEntry {
    pub bidder: Side,
    pub bid: i32,
    pub points: i32,
    /// `points` belong to the bidding side rather than the defenders.
    pub entered_for_bidder: bool,
}

/// Points earned by each side for a hand. Inputs must already be validated.
///
/// A 360 claimed by the defenders sets the bidder; any other entry splits the
/// 180 hand points. A pending table-talk flag (non-sweep hands only) forces
/// the flagged side to `-bid`, and a bidder below the bid is set.
pub fn distribute(entry: HandEntry, pending: Option<&PendingPenalty>) -> Totals {
    let HandEntry {
        bidder,
        bid,
        points,
        entered_for_bidder,
    } = entry;
    let defender = bidder.opponent();
    let mut earned = Totals::default();

    if points == SWEEP_POINTS {
        if entered_for_bidder {
            earned.set(bidder, SWEEP_POINTS);
            earned.set(defender, 0);
        } else {
            earned.set(bidder, -bid);
            earned.set(defender, SWEEP_POINTS);
        }
        return earned;
    }

    let (owner, other) = if entered_for_bidder {
        (bidder, defender)
    } else {
        (defender, bidder)
    };
    earned.set(owner, points);
    earned.set(other, HAND_POINTS - points);

    if let Some(flag) = pending {
        earned.set(flag.team, -bid);
    }
    if earned.get(bidder) < bid {
        earned.set(bidder, -bid);
    }
    earned
}

/// Table-talk penalty: the flagged side loses `amount`, the other side scores 0.
pub fn penalty_deltas(flagged: Side, amount: i32) -> Totals {
    let mut earned = Totals::default();
    earned.set(flagged, -amount);
    earned
}
