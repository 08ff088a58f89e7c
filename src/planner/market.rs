// Market tracker: live per-position price multipliers from observed sales.

use std::collections::HashMap;

use tracing::debug;

use super::allocation::MarketConditions;
use crate::player::Position;

/// Accumulates (paid, expected) totals per position as lots close, and
/// derives the market multipliers the allocation planner consumes.
#[derive(Debug, Clone, Default)]
pub struct MarketTracker {
    totals: HashMap<Position, PositionTotals>,
}

#[derive(Debug, Clone, Copy, Default)]
struct PositionTotals {
    paid: f64,
    expected: f64,
    sales: u32,
}

impl MarketTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed sale against the player's preseason market price.
    /// Sales of players with no price estimate carry no signal and are
    /// dropped.
    pub fn record_sale(&mut self, position: Position, price: u32, market_price: u32) {
        if market_price == 0 {
            return;
        }
        let totals = self.totals.entry(position).or_default();
        totals.paid += price as f64;
        totals.expected += market_price as f64;
        totals.sales += 1;
        debug!(
            "market sample: {:?} ${price} vs ${market_price} (x{:.2} over {} sales)",
            position,
            totals.paid / totals.expected,
            totals.sales
        );
    }

    /// Observed multiplier for one position: total paid over total expected.
    /// Neutral (1.0) until a sale has been recorded.
    pub fn multiplier(&self, position: Position) -> f64 {
        self.totals
            .get(&position)
            .filter(|t| t.expected > 0.0)
            .map(|t| t.paid / t.expected)
            .unwrap_or(1.0)
    }

    pub fn sales(&self, position: Position) -> u32 {
        self.totals.get(&position).map(|t| t.sales).unwrap_or(0)
    }

    /// Snapshot of every tracked position's multiplier for the planner.
    pub fn conditions(&self) -> MarketConditions {
        MarketConditions {
            multipliers: Position::TRACKED
                .iter()
                .map(|&pos| (pos, self.multiplier(pos)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_until_first_sale() {
        let tracker = MarketTracker::new();
        assert_eq!(tracker.multiplier(Position::RunningBack), 1.0);
        assert_eq!(tracker.sales(Position::RunningBack), 0);
    }

    #[test]
    fn multiplier_tracks_paid_over_expected() {
        let mut tracker = MarketTracker::new();
        tracker.record_sale(Position::RunningBack, 30, 20);
        assert!((tracker.multiplier(Position::RunningBack) - 1.5).abs() < 1e-9);

        // A below-market sale pulls the ratio back down: 40/40
        tracker.record_sale(Position::RunningBack, 10, 20);
        assert!((tracker.multiplier(Position::RunningBack) - 1.0).abs() < 1e-9);
        assert_eq!(tracker.sales(Position::RunningBack), 2);
    }

    #[test]
    fn positions_tracked_independently() {
        let mut tracker = MarketTracker::new();
        tracker.record_sale(Position::WideReceiver, 24, 20);
        assert!((tracker.multiplier(Position::WideReceiver) - 1.2).abs() < 1e-9);
        assert_eq!(tracker.multiplier(Position::RunningBack), 1.0);
    }

    #[test]
    fn unpriced_sales_are_ignored() {
        let mut tracker = MarketTracker::new();
        tracker.record_sale(Position::Kicker, 5, 0);
        assert_eq!(tracker.multiplier(Position::Kicker), 1.0);
        assert_eq!(tracker.sales(Position::Kicker), 0);
    }

    #[test]
    fn conditions_cover_all_tracked_positions() {
        let mut tracker = MarketTracker::new();
        tracker.record_sale(Position::TightEnd, 14, 10);
        let conditions = tracker.conditions();
        assert_eq!(conditions.multipliers.len(), Position::TRACKED.len());
        assert!((conditions.multiplier(Position::TightEnd) - 1.4).abs() < 1e-9);
        assert_eq!(conditions.multiplier(Position::Quarterback), 1.0);
    }
}
