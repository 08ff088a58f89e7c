// Budget allocation planner: advisory spend-by-position recommendations.
// Read-only over ledger snapshots; never gates bid legality.

pub mod allocation;
pub mod market;
pub mod strategy;

pub use allocation::{
    allocate_budget, AllocationPlan, MarketConditions, PositionPlan, RosterFill, Strategy,
};
pub use market::MarketTracker;
pub use strategy::{position_edges, recommend_strategy};
