// Bid guard: stateless predicate logic over ledger state.
//
// Decides whether a proposed bid is legal. Shared between the state
// machine's transition guards and pre-flight UI checks, so both always
// agree on the same arithmetic.

use serde::{Deserialize, Serialize};

use super::ledger::DraftLedger;

/// Budget/roster status for one team, for display and pre-flight checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStatus {
    pub team_id: String,
    pub budget: u32,
    pub spent: u32,
    pub open_slots: u32,
    pub max_bid: u32,
}

/// Whether `team_id` may legally bid `amount` against `current_bid`.
///
/// A bid is legal iff the team has an open slot, the amount strictly
/// exceeds the current bid (no ties), and the amount leaves $1 for every
/// other slot the team still has to fill.
pub fn can_bid(ledger: &DraftLedger, team_id: &str, amount: u32, current_bid: u32) -> bool {
    let Some(team) = ledger.team(team_id) else {
        return false;
    };
    team.open_slots > 0 && amount > current_bid && amount <= team.max_bid()
}

/// Derive the displayable status for one team. `max_bid` comes from the
/// same [`TeamLedger::max_bid`] formula the guard uses.
///
/// [`TeamLedger::max_bid`]: super::ledger::TeamLedger::max_bid
pub fn team_status(ledger: &DraftLedger, team_id: &str) -> Option<TeamStatus> {
    ledger.team(team_id).map(|t| TeamStatus {
        team_id: t.team_id.clone(),
        budget: t.budget,
        spent: t.spent,
        open_slots: t.open_slots,
        max_bid: t.max_bid(),
    })
}
