// Budget allocation: strategy tables and the adjustment pipeline.
//
// Each strategy is a static table of target dollars and headcount per
// position (tables are data, so a new strategy is a table addition, not new
// logic). `allocate_budget` is a pure function: it folds market conditions
// and current roster fill into the table and returns a plan.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::player::Position;

/// Normalization reference for the flex adjustment: roughly the average
/// dollar cost of one flex-eligible starter in a $200 league.
const FLEX_REFERENCE_VALUE: f64 = 15.0;

/// A named draft strategy with its own base allocation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    StarsAndScrubs,
    Balanced,
    ZeroRb,
    HeroRb,
    RobustRb,
}

/// Per-position price multipliers observed at the draft: >1 means the
/// position is selling above model value, <1 below.
#[derive(Debug, Clone, Default)]
pub struct MarketConditions {
    pub multipliers: HashMap<Position, f64>,
}

impl MarketConditions {
    pub fn multiplier(&self, position: Position) -> f64 {
        self.multipliers.get(&position).copied().unwrap_or(1.0)
    }
}

/// How many players a team has already drafted at each position.
#[derive(Debug, Clone, Default)]
pub struct RosterFill {
    pub filled: HashMap<Position, u32>,
}

impl RosterFill {
    pub fn filled(&self, position: Position) -> u32 {
        self.filled.get(&position).copied().unwrap_or(0)
    }
}

/// Recommended spend and headcount for one position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionPlan {
    pub position: Position,
    pub target_spend: f64,
    pub target_count: u32,
}

/// The planner's output: remaining spend targets per position plus the two
/// global adjustment factors that were applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub strategy: Strategy,
    pub positions: Vec<PositionPlan>,
    pub flex_adjustment: f64,
    pub market_adjustment: f64,
}

impl AllocationPlan {
    pub fn position(&self, position: Position) -> Option<&PositionPlan> {
        self.positions.iter().find(|p| p.position == position)
    }

    pub fn total_spend(&self) -> f64 {
        self.positions.iter().map(|p| p.target_spend).sum()
    }
}

/// (target dollars, target headcount) per tracked position, scaled for a
/// $200 budget and a 16-slot roster (bench filled at $1 each).
fn base_table(strategy: Strategy) -> [(Position, f64, u32); 6] {
    use Position::*;
    match strategy {
        Strategy::Balanced => [
            (Quarterback, 22.0, 2),
            (RunningBack, 70.0, 5),
            (WideReceiver, 68.0, 5),
            (TightEnd, 28.0, 2),
            (Kicker, 6.0, 1),
            (Defense, 6.0, 1),
        ],
        Strategy::StarsAndScrubs => [
            (Quarterback, 30.0, 2),
            (RunningBack, 88.0, 5),
            (WideReceiver, 60.0, 5),
            (TightEnd, 16.0, 2),
            (Kicker, 3.0, 1),
            (Defense, 3.0, 1),
        ],
        Strategy::ZeroRb => [
            (Quarterback, 28.0, 2),
            (RunningBack, 24.0, 5),
            (WideReceiver, 100.0, 5),
            (TightEnd, 36.0, 2),
            (Kicker, 6.0, 1),
            (Defense, 6.0, 1),
        ],
        Strategy::HeroRb => [
            (Quarterback, 24.0, 2),
            (RunningBack, 60.0, 5),
            (WideReceiver, 80.0, 5),
            (TightEnd, 24.0, 2),
            (Kicker, 6.0, 1),
            (Defense, 6.0, 1),
        ],
        Strategy::RobustRb => [
            (Quarterback, 20.0, 2),
            (RunningBack, 100.0, 5),
            (WideReceiver, 52.0, 5),
            (TightEnd, 16.0, 2),
            (Kicker, 6.0, 1),
            (Defense, 6.0, 1),
        ],
    }
}

/// Compute a spend-by-position plan for the chosen strategy.
///
/// The pipeline, per position:
/// 1. start from the strategy's base table;
/// 2. scale spend by `(2 − marketMultiplier)` so spend steers away from
///    positions trading above model value;
/// 3. scale remaining spend by the unfilled fraction of the position's
///    headcount, and subtract filled players from the headcount;
/// 4. apply the flex adjustment (flex-eligible positions only), the
///    headcount-weighted per-player spend across RB/WR/TE normalized by a
///    fixed reference price;
/// 5. apply the overall market adjustment, the simple average of all
///    tracked multipliers.
pub fn allocate_budget(
    strategy: Strategy,
    market: &MarketConditions,
    fill: &RosterFill,
) -> AllocationPlan {
    let table = base_table(strategy);

    // Flex adjustment: average market-scaled cost per flex-eligible head.
    let (flex_dollars, flex_heads) = table
        .iter()
        .filter(|(pos, _, _)| pos.is_flex_eligible())
        .fold((0.0, 0u32), |(d, h), (pos, spend, count)| {
            (d + spend * market.multiplier(*pos), h + count)
        });
    let flex_adjustment = if flex_heads > 0 {
        (flex_dollars / flex_heads as f64) / FLEX_REFERENCE_VALUE
    } else {
        1.0
    };

    // Overall market adjustment: simple average of tracked multipliers.
    let market_adjustment = table
        .iter()
        .map(|(pos, _, _)| market.multiplier(*pos))
        .sum::<f64>()
        / table.len() as f64;

    let positions = table
        .iter()
        .map(|&(position, base_spend, base_count)| {
            let mult = market.multiplier(position);
            let spend = (base_spend * (2.0 - mult)).max(0.0);

            let filled = fill.filled(position).min(base_count);
            let unfilled_fraction = 1.0 - filled as f64 / base_count as f64;
            let mut spend = spend * unfilled_fraction;
            let target_count = base_count - filled;

            if position.is_flex_eligible() {
                spend *= flex_adjustment;
            }
            spend *= market_adjustment;

            PositionPlan {
                position,
                target_spend: spend,
                target_count,
            }
        })
        .collect();

    AllocationPlan {
        strategy,
        positions,
        flex_adjustment,
        market_adjustment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Position::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn base_tables_budget_two_hundred() {
        for strategy in [
            Strategy::StarsAndScrubs,
            Strategy::Balanced,
            Strategy::ZeroRb,
            Strategy::HeroRb,
            Strategy::RobustRb,
        ] {
            let total: f64 = base_table(strategy).iter().map(|(_, s, _)| s).sum();
            assert!(close(total, 200.0), "{strategy:?} table sums to {total}");
        }
    }

    #[test]
    fn neutral_market_empty_roster() {
        let plan = allocate_budget(
            Strategy::Balanced,
            &MarketConditions::default(),
            &RosterFill::default(),
        );

        assert!(close(plan.market_adjustment, 1.0));
        // (70 + 68 + 28) / 12 heads / $15 reference
        assert!(close(plan.flex_adjustment, 166.0 / 12.0 / 15.0));

        // Non-flex positions keep their base targets untouched
        let qb = plan.position(Quarterback).unwrap();
        assert!(close(qb.target_spend, 22.0));
        assert_eq!(qb.target_count, 2);

        // Flex positions carry the flex adjustment
        let rb = plan.position(RunningBack).unwrap();
        assert!(close(rb.target_spend, 70.0 * plan.flex_adjustment));
        assert_eq!(rb.target_count, 5);
    }

    #[test]
    fn inflated_position_gets_reduced_spend() {
        let market = MarketConditions {
            multipliers: HashMap::from([(RunningBack, 1.3)]),
        };
        let plan = allocate_budget(Strategy::Balanced, &market, &RosterFill::default());
        let neutral = allocate_budget(
            Strategy::Balanced,
            &MarketConditions::default(),
            &RosterFill::default(),
        );

        // Spend steers away from the inflated position...
        let rb = plan.position(RunningBack).unwrap().target_spend;
        let rb_neutral = neutral.position(RunningBack).unwrap().target_spend;
        assert!(rb < rb_neutral, "{rb} should be below {rb_neutral}");

        // ...while the inverse scaling itself is (2 - 1.3) = 0.7 pre-global
        let factor = 2.0 - 1.3_f64;
        assert!(
            close(
                rb,
                70.0 * factor * plan.flex_adjustment * plan.market_adjustment
            ),
            "got {rb}"
        );
    }

    #[test]
    fn undervalued_position_gets_extra_spend() {
        let market = MarketConditions {
            multipliers: HashMap::from([(TightEnd, 0.8)]),
        };
        let plan = allocate_budget(Strategy::Balanced, &market, &RosterFill::default());
        let te = plan.position(TightEnd).unwrap().target_spend;
        assert!(
            close(te, 28.0 * 1.2 * plan.flex_adjustment * plan.market_adjustment),
            "got {te}"
        );
    }

    #[test]
    fn roster_fill_scales_remaining_spend() {
        let fill = RosterFill {
            filled: HashMap::from([(RunningBack, 2)]),
        };
        let plan = allocate_budget(Strategy::Balanced, &MarketConditions::default(), &fill);

        let rb = plan.position(RunningBack).unwrap();
        assert_eq!(rb.target_count, 3);
        // 2 of 5 filled leaves 3/5 of the target spend
        assert!(close(rb.target_spend, 70.0 * 0.6 * plan.flex_adjustment));
    }

    #[test]
    fn fully_filled_position_zeroes_out() {
        let fill = RosterFill {
            filled: HashMap::from([(Quarterback, 2)]),
        };
        let plan = allocate_budget(Strategy::Balanced, &MarketConditions::default(), &fill);
        let qb = plan.position(Quarterback).unwrap();
        assert!(close(qb.target_spend, 0.0));
        assert_eq!(qb.target_count, 0);
    }

    #[test]
    fn overfill_floors_headcount_at_zero() {
        let fill = RosterFill {
            filled: HashMap::from([(Kicker, 3)]),
        };
        let plan = allocate_budget(Strategy::Balanced, &MarketConditions::default(), &fill);
        let k = plan.position(Kicker).unwrap();
        assert_eq!(k.target_count, 0);
        assert!(close(k.target_spend, 0.0));
    }

    #[test]
    fn market_adjustment_is_average_of_multipliers() {
        let market = MarketConditions {
            multipliers: HashMap::from([(RunningBack, 1.2), (WideReceiver, 0.8)]),
        };
        let plan = allocate_budget(Strategy::ZeroRb, &market, &RosterFill::default());
        // Four positions at 1.0, one at 1.2, one at 0.8
        assert!(close(plan.market_adjustment, 1.0));
    }

    #[test]
    fn strategies_shift_spend_as_named() {
        let neutral = MarketConditions::default();
        let empty = RosterFill::default();

        let zero_rb = allocate_budget(Strategy::ZeroRb, &neutral, &empty);
        let robust_rb = allocate_budget(Strategy::RobustRb, &neutral, &empty);
        assert!(
            zero_rb.position(RunningBack).unwrap().target_spend
                < robust_rb.position(RunningBack).unwrap().target_spend
        );
        assert!(
            zero_rb.position(WideReceiver).unwrap().target_spend
                > robust_rb.position(WideReceiver).unwrap().target_spend
        );
    }
}
