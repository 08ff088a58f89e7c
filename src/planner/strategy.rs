// Strategy recommendation: a heuristic classifier over positional edges.

use std::collections::HashMap;

use tracing::debug;

use super::allocation::Strategy;
use crate::player::{Player, Position};

/// Average normalized edge per position across the available pool.
///
/// Edge is `(intrinsic − market) / market`; positive means the market is
/// underpricing the position. `market_prices` overrides a player's listed
/// market price by id (live prices drift from the preseason estimates).
/// Players without an intrinsic value are skipped.
pub fn position_edges(
    pool: &[Player],
    market_prices: &HashMap<String, f64>,
) -> HashMap<Position, f64> {
    let mut sums: HashMap<Position, (f64, u32)> = HashMap::new();

    for player in pool {
        let Some(intrinsic) = player.intrinsic_value else {
            continue;
        };
        let market = market_prices
            .get(&player.id)
            .copied()
            .unwrap_or(player.market_price as f64);
        if market <= 0.0 {
            continue;
        }
        let edge = (intrinsic - market) / market;
        let entry = sums.entry(player.position).or_insert((0.0, 0));
        entry.0 += edge;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(pos, (total, count))| (pos, total / count as f64))
        .collect()
}

/// Pick a strategy from the pool's positional edges.
///
/// Decision table, evaluated in order:
/// - RB cheap and WR rich: fade running backs entirely (`zero_rb`);
/// - RB rich and WR cheap: load up on running backs (`robust_rb`);
/// - an onesided QB or TE market: concentrate spend (`stars_and_scrubs`);
/// - RB and WR edges nearly equal: spread evenly (`balanced`);
/// - otherwise anchor one stud back (`hero_rb`).
///
/// A heuristic, not a guarantee.
pub fn recommend_strategy(pool: &[Player], market_prices: &HashMap<String, f64>) -> Strategy {
    let edges = position_edges(pool, market_prices);
    let edge = |pos: Position| edges.get(&pos).copied().unwrap_or(0.0);

    let rb = edge(Position::RunningBack);
    let wr = edge(Position::WideReceiver);
    let qb = edge(Position::Quarterback);
    let te = edge(Position::TightEnd);
    debug!("positional edges: rb={rb:.2} wr={wr:.2} qb={qb:.2} te={te:.2}");

    if rb < -0.2 && wr > 0.2 {
        Strategy::ZeroRb
    } else if rb > 0.2 && wr < -0.2 {
        Strategy::RobustRb
    } else if qb > 0.35 || te > 0.35 {
        Strategy::StarsAndScrubs
    } else if (rb - wr).abs() < 0.05 {
        Strategy::Balanced
    } else {
        Strategy::HeroRb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, position: Position, market: u32, intrinsic: Option<f64>) -> Player {
        Player {
            id: id.to_string(),
            name: id.to_string(),
            position,
            team: "GB".into(),
            market_price: market,
            intrinsic_value: intrinsic,
        }
    }

    /// A pool whose RB edge averages `rb` and WR edge averages `wr`, with a
    /// $10 market price everywhere.
    fn rb_wr_pool(rb: f64, wr: f64) -> Vec<Player> {
        vec![
            player("rb1", Position::RunningBack, 10, Some(10.0 * (1.0 + rb))),
            player("rb2", Position::RunningBack, 10, Some(10.0 * (1.0 + rb))),
            player("wr1", Position::WideReceiver, 10, Some(10.0 * (1.0 + wr))),
            player("wr2", Position::WideReceiver, 10, Some(10.0 * (1.0 + wr))),
        ]
    }

    #[test]
    fn edges_average_across_position() {
        let pool = vec![
            player("a", Position::RunningBack, 10, Some(15.0)), // +0.5
            player("b", Position::RunningBack, 20, Some(10.0)), // -0.5
            player("c", Position::WideReceiver, 10, Some(12.0)), // +0.2
        ];
        let edges = position_edges(&pool, &HashMap::new());
        assert!((edges[&Position::RunningBack]).abs() < 1e-9);
        assert!((edges[&Position::WideReceiver] - 0.2).abs() < 1e-9);
    }

    #[test]
    fn edges_skip_players_without_valuation() {
        let pool = vec![
            player("a", Position::Kicker, 5, None),
            player("b", Position::Kicker, 5, Some(6.0)),
        ];
        let edges = position_edges(&pool, &HashMap::new());
        assert!((edges[&Position::Kicker] - 0.2).abs() < 1e-9);
    }

    #[test]
    fn live_price_overrides_listed_market() {
        let pool = vec![player("a", Position::TightEnd, 10, Some(12.0))];
        let live = HashMap::from([("a".to_string(), 20.0)]);
        let edges = position_edges(&pool, &live);
        // (12 - 20) / 20
        assert!((edges[&Position::TightEnd] + 0.4).abs() < 1e-9);
    }

    #[test]
    fn cheap_rb_rich_wr_recommends_zero_rb() {
        let pool = rb_wr_pool(-0.3, 0.4);
        assert_eq!(recommend_strategy(&pool, &HashMap::new()), Strategy::ZeroRb);
    }

    #[test]
    fn rich_rb_cheap_wr_recommends_robust_rb() {
        let pool = rb_wr_pool(0.3, -0.3);
        assert_eq!(
            recommend_strategy(&pool, &HashMap::new()),
            Strategy::RobustRb
        );
    }

    #[test]
    fn hot_te_market_recommends_stars_and_scrubs() {
        let mut pool = rb_wr_pool(0.1, 0.1);
        pool.push(player("te1", Position::TightEnd, 10, Some(15.0))); // +0.5
        assert_eq!(
            recommend_strategy(&pool, &HashMap::new()),
            Strategy::StarsAndScrubs
        );
    }

    #[test]
    fn even_edges_recommend_balanced() {
        let pool = rb_wr_pool(0.1, 0.08);
        assert_eq!(
            recommend_strategy(&pool, &HashMap::new()),
            Strategy::Balanced
        );
    }

    #[test]
    fn lopsided_but_mild_edges_recommend_hero_rb() {
        let pool = rb_wr_pool(0.0, 0.15);
        assert_eq!(recommend_strategy(&pool, &HashMap::new()), Strategy::HeroRb);
    }

    #[test]
    fn empty_pool_defaults_to_balanced() {
        // No edges at all: everything reads 0.0, RB and WR are equal
        assert_eq!(recommend_strategy(&[], &HashMap::new()), Strategy::Balanced);
    }
}
