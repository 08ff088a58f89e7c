// Draft ledger: authoritative record of team budgets, roster slot counts,
// and completed picks. Pure data and mutation rules; no timers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::player::Player;

/// A completed auction purchase. Created only when a nomination ends in a
/// sale; removable only through [`DraftLedger::undo_last_sale`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftPick {
    pub player: Player,
    pub price: u32,
    pub team_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-team budget and slot accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamLedger {
    pub team_id: String,
    pub team_name: String,
    /// Starting budget in dollars.
    pub budget: u32,
    /// Total spent so far.
    pub spent: u32,
    /// Roster slots still to be filled.
    pub open_slots: u32,
}

impl TeamLedger {
    /// Remaining dollars.
    pub fn remaining(&self) -> u32 {
        self.budget.saturating_sub(self.spent)
    }

    /// Maximum legal bid: the team must keep $1 in reserve for every slot
    /// it still has to fill after this one. Zero once the roster is full.
    ///
    /// This is the single source of the max-bid formula; the bid guard and
    /// the display path both go through it.
    pub fn max_bid(&self) -> u32 {
        if self.open_slots == 0 {
            return 0;
        }
        let reserved = self.open_slots - 1;
        self.remaining().saturating_sub(reserved).max(1)
    }
}

/// The authoritative draft ledger for one auction session.
///
/// Teams are stored sorted by `team_id` for deterministic ordering. Picks
/// are kept in a single global append-only sequence so `undo_last_sale`
/// always reverses the most recent commit regardless of which team won.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftLedger {
    pub teams: Vec<TeamLedger>,
    picks: Vec<DraftPick>,
}

impl DraftLedger {
    /// Create a ledger from (team_id, team_name) pairs, a per-team budget,
    /// and a fixed roster size.
    pub fn new(teams: Vec<(String, String)>, budget: u32, roster_slots: u32) -> Self {
        let mut team_ledgers: Vec<TeamLedger> = teams
            .into_iter()
            .map(|(id, name)| TeamLedger {
                team_id: id,
                team_name: name,
                budget,
                spent: 0,
                open_slots: roster_slots,
            })
            .collect();
        team_ledgers.sort_by(|a, b| a.team_id.cmp(&b.team_id));

        DraftLedger {
            teams: team_ledgers,
            picks: Vec::new(),
        }
    }

    /// Look up a team by ID.
    pub fn team(&self, team_id: &str) -> Option<&TeamLedger> {
        self.teams.iter().find(|t| t.team_id == team_id)
    }

    fn team_mut(&mut self, team_id: &str) -> Option<&mut TeamLedger> {
        self.teams.iter_mut().find(|t| t.team_id == team_id)
    }

    /// All completed picks, in commit order.
    pub fn picks(&self) -> &[DraftPick] {
        &self.picks
    }

    /// Picks won by one team, in commit order.
    pub fn team_picks(&self, team_id: &str) -> Vec<&DraftPick> {
        self.picks.iter().filter(|p| p.team_id == team_id).collect()
    }

    /// Whether a player is already rostered anywhere in the league.
    pub fn has_player(&self, player_id: &str) -> bool {
        self.picks.iter().any(|p| p.player.id == player_id)
    }

    /// Commit a completed sale to the ledger.
    ///
    /// Fails closed (returns `false` with no mutation) if the team is
    /// unknown, has no open slots, cannot afford the price under the $1
    /// reserve rule, or the player is already rostered.
    pub fn commit_sale(
        &mut self,
        player: &Player,
        team_id: &str,
        price: u32,
        timestamp: DateTime<Utc>,
    ) -> bool {
        if self.has_player(&player.id) {
            warn!(
                "rejecting sale of {}: already rostered",
                player.id
            );
            return false;
        }

        let Some(team) = self.team_mut(team_id) else {
            warn!("rejecting sale to unknown team {team_id}");
            return false;
        };
        if team.open_slots == 0 || price > team.max_bid() {
            warn!(
                "rejecting sale to {team_id}: price ${price} exceeds max bid ${}",
                team.max_bid()
            );
            return false;
        }

        team.spent += price;
        team.open_slots -= 1;
        info!(
            "sold {} to {} for ${} ({} slots remaining)",
            player.name, team.team_id, price, team.open_slots
        );

        self.picks.push(DraftPick {
            player: player.clone(),
            price,
            team_id: team_id.to_string(),
            timestamp,
        });
        true
    }

    /// Reverse the most recent commit, restoring the winning team's budget
    /// and slot count. Returns the removed pick, or `None` if there is no
    /// pick to undo (a no-op, not an error).
    pub fn undo_last_sale(&mut self) -> Option<DraftPick> {
        let pick = self.picks.pop()?;
        if let Some(team) = self.team_mut(&pick.team_id) {
            team.spent = team.spent.saturating_sub(pick.price);
            team.open_slots += 1;
            info!(
                "undid sale of {} to {} (${} restored)",
                pick.player.name, pick.team_id, pick.price
            );
        }
        Some(pick)
    }

    /// The draft is complete once every team's roster is full.
    pub fn is_draft_complete(&self) -> bool {
        self.teams.iter().all(|t| t.open_slots == 0)
    }

    /// Total dollars spent across the league.
    pub fn total_spent(&self) -> u32 {
        self.teams.iter().map(|t| t.spent).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Position;

    fn test_teams() -> Vec<(String, String)> {
        (1..=4)
            .map(|i| (format!("team_{i}"), format!("Team {i}")))
            .collect()
    }

    fn test_player(id: &str) -> Player {
        Player {
            id: id.to_string(),
            name: format!("Player {id}"),
            position: Position::RunningBack,
            team: "KC".into(),
            market_price: 10,
            intrinsic_value: None,
        }
    }

    fn test_ledger() -> DraftLedger {
        DraftLedger::new(test_teams(), 200, 16)
    }

    #[test]
    fn new_ledger_sorted_and_initialized() {
        let ledger = test_ledger();
        assert_eq!(ledger.teams.len(), 4);
        assert_eq!(ledger.teams[0].team_id, "team_1");
        for team in &ledger.teams {
            assert_eq!(team.budget, 200);
            assert_eq!(team.spent, 0);
            assert_eq!(team.open_slots, 16);
        }
        assert!(ledger.picks().is_empty());
    }

    #[test]
    fn max_bid_full_budget() {
        let ledger = test_ledger();
        // 200 - (16 - 1) reserved = 185
        assert_eq!(ledger.team("team_1").unwrap().max_bid(), 185);
    }

    #[test]
    fn max_bid_last_slot_no_reserve() {
        let team = TeamLedger {
            team_id: "a".into(),
            team_name: "A".into(),
            budget: 50,
            spent: 49,
            open_slots: 1,
        };
        // Last slot: no reservation needed, remaining $1 is bid-able
        assert_eq!(team.max_bid(), 1);
    }

    #[test]
    fn max_bid_zero_when_roster_full() {
        let team = TeamLedger {
            team_id: "a".into(),
            team_name: "A".into(),
            budget: 200,
            spent: 50,
            open_slots: 0,
        };
        assert_eq!(team.max_bid(), 0);
    }

    #[test]
    fn commit_sale_updates_budget_and_slots() {
        let mut ledger = test_ledger();
        assert!(ledger.commit_sale(&test_player("p1"), "team_1", 45, Utc::now()));

        let team = ledger.team("team_1").unwrap();
        assert_eq!(team.spent, 45);
        assert_eq!(team.remaining(), 155);
        assert_eq!(team.open_slots, 15);
        assert_eq!(ledger.picks().len(), 1);
        assert_eq!(ledger.picks()[0].price, 45);
    }

    #[test]
    fn commit_sale_rejects_unknown_team() {
        let mut ledger = test_ledger();
        assert!(!ledger.commit_sale(&test_player("p1"), "nobody", 5, Utc::now()));
        assert!(ledger.picks().is_empty());
    }

    #[test]
    fn commit_sale_rejects_duplicate_player() {
        let mut ledger = test_ledger();
        assert!(ledger.commit_sale(&test_player("p1"), "team_1", 10, Utc::now()));
        // Same player to a different team must fail: global uniqueness
        assert!(!ledger.commit_sale(&test_player("p1"), "team_2", 10, Utc::now()));
        assert_eq!(ledger.picks().len(), 1);
        let team2 = ledger.team("team_2").unwrap();
        assert_eq!(team2.spent, 0);
        assert_eq!(team2.open_slots, 16);
    }

    #[test]
    fn commit_sale_rejects_over_max_bid() {
        let mut ledger = DraftLedger::new(test_teams(), 20, 16);
        // max bid = 20 - 15 = 5
        assert!(!ledger.commit_sale(&test_player("p1"), "team_1", 6, Utc::now()));
        assert!(ledger.commit_sale(&test_player("p1"), "team_1", 5, Utc::now()));
    }

    #[test]
    fn reserve_invariant_holds_after_commits() {
        let mut ledger = DraftLedger::new(test_teams(), 20, 3);
        assert!(ledger.commit_sale(&test_player("p1"), "team_1", 18, Utc::now()));
        let team = ledger.team("team_1").unwrap();
        // $2 left for 2 slots: exactly $1 each
        assert_eq!(team.remaining(), 2);
        assert_eq!(team.open_slots, 2);
        assert_eq!(team.max_bid(), 1);
        // Anything above $1 must now be rejected
        assert!(!ledger.commit_sale(&test_player("p2"), "team_1", 2, Utc::now()));
        assert!(ledger.commit_sale(&test_player("p2"), "team_1", 1, Utc::now()));
        assert!(ledger.commit_sale(&test_player("p3"), "team_1", 1, Utc::now()));
        assert_eq!(ledger.team("team_1").unwrap().open_slots, 0);
    }

    #[test]
    fn undo_last_sale_is_exact_inverse() {
        let mut ledger = test_ledger();
        let before = ledger.clone();
        assert!(ledger.commit_sale(&test_player("p1"), "team_2", 30, Utc::now()));

        let undone = ledger.undo_last_sale().expect("should undo");
        assert_eq!(undone.player.id, "p1");
        assert_eq!(undone.price, 30);

        let team = ledger.team("team_2").unwrap();
        let original = before.team("team_2").unwrap();
        assert_eq!(team.spent, original.spent);
        assert_eq!(team.open_slots, original.open_slots);
        assert_eq!(team.max_bid(), original.max_bid());
        assert_eq!(ledger.picks().len(), 0);
    }

    #[test]
    fn undo_with_empty_history_is_noop() {
        let mut ledger = test_ledger();
        assert!(ledger.undo_last_sale().is_none());
        assert_eq!(ledger.picks().len(), 0);
    }

    #[test]
    fn undo_reverses_most_recent_across_teams() {
        let mut ledger = test_ledger();
        assert!(ledger.commit_sale(&test_player("p1"), "team_1", 10, Utc::now()));
        assert!(ledger.commit_sale(&test_player("p2"), "team_2", 20, Utc::now()));

        let undone = ledger.undo_last_sale().unwrap();
        assert_eq!(undone.team_id, "team_2");
        assert_eq!(ledger.team("team_2").unwrap().spent, 0);
        assert_eq!(ledger.team("team_1").unwrap().spent, 10);
        // Player p2 is available again
        assert!(!ledger.has_player("p2"));
        assert!(ledger.has_player("p1"));
    }

    #[test]
    fn is_draft_complete() {
        let mut ledger = DraftLedger::new(vec![("a".into(), "A".into())], 10, 2);
        assert!(!ledger.is_draft_complete());
        assert!(ledger.commit_sale(&test_player("p1"), "a", 5, Utc::now()));
        assert!(!ledger.is_draft_complete());
        assert!(ledger.commit_sale(&test_player("p2"), "a", 5, Utc::now()));
        assert!(ledger.is_draft_complete());
    }

    #[test]
    fn team_picks_filters_by_team() {
        let mut ledger = test_ledger();
        ledger.commit_sale(&test_player("p1"), "team_1", 10, Utc::now());
        ledger.commit_sale(&test_player("p2"), "team_2", 20, Utc::now());
        ledger.commit_sale(&test_player("p3"), "team_1", 5, Utc::now());

        let picks = ledger.team_picks("team_1");
        assert_eq!(picks.len(), 2);
        assert_eq!(picks[0].player.id, "p1");
        assert_eq!(picks[1].player.id, "p3");
        assert_eq!(ledger.total_spent(), 35);
    }
}
