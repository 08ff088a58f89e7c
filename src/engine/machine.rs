// Auction state machine: phases, transitions, and guarded actions.
//
// The machine owns the auction context (current lot, bid, history) plus the
// ledger and timers. `transition` is the only mutating entry point; illegal
// events fail closed with a `false` return and no state change, so stale or
// duplicate messages (a bid arriving after the phase already advanced, a
// double-clicked pause) are dropped silently instead of corrupting state.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::events::{DraftEvent, EventBus};
use super::guard::{can_bid, team_status, TeamStatus};
use super::ledger::{DraftLedger, DraftPick};
use super::timer::{TimerFired, TimerKind, Timers};
use crate::config::TimerConfig;
use crate::player::Player;

// ---------------------------------------------------------------------------
// Phases and events
// ---------------------------------------------------------------------------

/// The phase of the auction. Exactly one is active per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionPhase {
    Waiting,
    Nominated,
    Bidding,
    GoingOnce,
    GoingTwice,
    Sold,
    Passed,
    Paused,
    Completed,
}

/// What a bid-history entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidKind {
    Nomination,
    Bid,
    Win,
    Pass,
}

/// One entry in the append-only bid history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidEvent {
    pub player_id: String,
    pub team_id: String,
    pub amount: u32,
    pub timestamp: DateTime<Utc>,
    pub kind: BidKind,
}

/// An input to [`AuctionMachine::transition`].
#[derive(Debug, Clone)]
pub enum AuctionEvent {
    NominatePlayer { player: Player, team_id: String },
    OpenBidding,
    PlaceBid { team_id: String, amount: u32 },
    TimerElapsed(TimerKind),
    NextPlayer,
    Pause,
    Resume,
    CompleteAuction,
}

/// Read-only copy of the auction context, carried on every published event
/// so consumers can render state without further queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub current_player: Option<Player>,
    pub current_bid: u32,
    pub current_bidder: Option<String>,
    pub nominating_team: Option<String>,
    pub time_remaining_secs: u64,
    pub bid_history: Vec<BidEvent>,
    pub team_budgets: HashMap<String, u32>,
    pub roster_slots: HashMap<String, u32>,
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

pub struct AuctionMachine {
    phase: AuctionPhase,
    current_player: Option<Player>,
    current_bid: u32,
    current_bidder: Option<String>,
    nominating_team: Option<String>,
    /// Display/telemetry only; the timer subsystem drives advancement.
    time_remaining: Duration,
    bid_history: Vec<BidEvent>,
    ledger: DraftLedger,
    timers: Timers,
    events: EventBus,
    timer_cfg: TimerConfig,
    /// Index into the ledger's team list for round-robin nomination.
    nomination_cursor: usize,
}

impl AuctionMachine {
    pub fn new(
        ledger: DraftLedger,
        timer_cfg: TimerConfig,
        timers: Timers,
        events: EventBus,
    ) -> Self {
        AuctionMachine {
            phase: AuctionPhase::Waiting,
            current_player: None,
            current_bid: 0,
            current_bidder: None,
            nominating_team: None,
            time_remaining: Duration::ZERO,
            bid_history: Vec::new(),
            ledger,
            timers,
            events,
            timer_cfg,
            nomination_cursor: 0,
        }
    }

    pub fn phase(&self) -> AuctionPhase {
        self.phase
    }

    pub fn ledger(&self) -> &DraftLedger {
        &self.ledger
    }

    /// Whether a delivered timer fire still belongs to a live timer.
    pub fn timer_is_current(&self, fired: &TimerFired) -> bool {
        self.timers.is_current(fired)
    }

    /// Pre-flight check: would a bid of `amount` be legal right now?
    pub fn can_bid(&self, team_id: &str, amount: u32) -> bool {
        can_bid(&self.ledger, team_id, amount, self.current_bid)
    }

    pub fn team_status(&self, team_id: &str) -> Option<TeamStatus> {
        team_status(&self.ledger, team_id)
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            current_player: self.current_player.clone(),
            current_bid: self.current_bid,
            current_bidder: self.current_bidder.clone(),
            nominating_team: self.nominating_team.clone(),
            time_remaining_secs: self.time_remaining.as_secs(),
            bid_history: self.bid_history.clone(),
            team_budgets: self
                .ledger
                .teams
                .iter()
                .map(|t| (t.team_id.clone(), t.remaining()))
                .collect(),
            roster_slots: self
                .ledger
                .teams
                .iter()
                .map(|t| (t.team_id.clone(), t.open_slots))
                .collect(),
        }
    }

    /// Bid history, optionally filtered to one player, in append order.
    pub fn bid_history(&self, player_id: Option<&str>) -> Vec<BidEvent> {
        match player_id {
            Some(id) => self
                .bid_history
                .iter()
                .filter(|e| e.player_id == id)
                .cloned()
                .collect(),
            None => self.bid_history.clone(),
        }
    }

    /// Team whose turn it is to nominate: round-robin over the team list,
    /// skipping teams whose rosters are already full.
    pub fn next_nominator(&self) -> Option<String> {
        let n = self.ledger.teams.len();
        (0..n)
            .map(|i| &self.ledger.teams[(self.nomination_cursor + i) % n])
            .find(|t| t.open_slots > 0)
            .map(|t| t.team_id.clone())
    }

    /// Reverse the most recent sale. Only valid between lots (phase
    /// `waiting`); removes the trailing win entry from the bid history so
    /// budgets, slots, and history all return to their pre-sale values.
    pub fn undo_last_pick(&mut self) -> Option<DraftPick> {
        if self.phase != AuctionPhase::Waiting {
            debug!("undo rejected: phase is {:?}", self.phase);
            return None;
        }
        let pick = self.ledger.undo_last_sale()?;
        if let Some(idx) = self
            .bid_history
            .iter()
            .rposition(|e| e.kind == BidKind::Win && e.player_id == pick.player.id)
        {
            self.bid_history.remove(idx);
        }
        Some(pick)
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Apply one event. Returns `true` and publishes a state-change event if
    /// the event is legal for the current phase and its guard passes;
    /// otherwise returns `false` with no mutation.
    pub fn transition(&mut self, event: AuctionEvent) -> bool {
        use AuctionEvent as E;
        use AuctionPhase as P;

        match (self.phase, event) {
            (P::Waiting, E::NominatePlayer { player, team_id }) => {
                self.nominate(player, team_id)
            }
            (P::Nominated, E::OpenBidding) => self.open_bidding(),
            (P::Nominated, E::TimerElapsed(TimerKind::Nomination)) => self.pass_lot(),
            (P::Bidding | P::GoingOnce | P::GoingTwice, E::PlaceBid { team_id, amount }) => {
                self.place_bid(team_id, amount)
            }
            (P::Bidding, E::TimerElapsed(TimerKind::Bidding)) => {
                self.enter_countdown(P::GoingOnce, TimerKind::GoingOnce)
            }
            (P::GoingOnce, E::TimerElapsed(TimerKind::GoingOnce)) => {
                self.enter_countdown(P::GoingTwice, TimerKind::GoingTwice)
            }
            (P::GoingTwice, E::TimerElapsed(TimerKind::GoingTwice)) => self.close_lot(),
            (P::Sold | P::Passed, E::NextPlayer) => self.next_player(),
            (P::Bidding, E::Pause) => self.pause(),
            (P::Paused, E::Resume) => self.resume(),
            (P::Waiting, E::CompleteAuction) => self.complete(),
            (phase, event) => {
                debug!("ignoring {:?} in phase {:?}", event_name(&event), phase);
                false
            }
        }
    }

    fn nominate(&mut self, player: Player, team_id: String) -> bool {
        if self.ledger.has_player(&player.id) {
            warn!("nomination rejected: {} already rostered", player.id);
            return false;
        }
        let Some(pos) = self
            .ledger
            .teams
            .iter()
            .position(|t| t.team_id == team_id)
        else {
            warn!("nomination rejected: unknown team {team_id}");
            return false;
        };

        info!("{} nominates {}", team_id, player.name);
        self.current_bid = 0;
        self.current_bidder = None;
        self.push_history(&player.id, &team_id, 0, BidKind::Nomination);
        self.current_player = Some(player);
        self.nominating_team = Some(team_id);
        self.nomination_cursor = (pos + 1) % self.ledger.teams.len();
        self.start_timer(TimerKind::Nomination, self.timer_cfg.nomination_secs);
        self.set_phase(AuctionPhase::Nominated);
        true
    }

    fn open_bidding(&mut self) -> bool {
        let Some(player) = &self.current_player else {
            return false;
        };
        self.timers.cancel(TimerKind::Nomination);
        // Opening price is the market estimate, floored at $1.
        self.current_bid = player.market_price.max(1);
        self.current_bidder = None;
        self.start_timer(TimerKind::Bidding, self.timer_cfg.bidding_secs);
        self.set_phase(AuctionPhase::Bidding);
        true
    }

    fn place_bid(&mut self, team_id: String, amount: u32) -> bool {
        if !can_bid(&self.ledger, &team_id, amount, self.current_bid) {
            debug!("bid rejected: {team_id} ${amount} over current ${}", self.current_bid);
            return false;
        }
        let Some(player_id) = self.current_player.as_ref().map(|p| p.id.clone()) else {
            return false;
        };

        self.timers.cancel(TimerKind::GoingOnce);
        self.timers.cancel(TimerKind::GoingTwice);
        self.current_bid = amount;
        self.current_bidder = Some(team_id.clone());
        self.push_history(&player_id, &team_id, amount, BidKind::Bid);
        info!("{team_id} bids ${amount}");
        self.start_timer(TimerKind::Bidding, self.timer_cfg.bid_reset_secs);
        self.set_phase(AuctionPhase::Bidding);
        true
    }

    fn enter_countdown(&mut self, phase: AuctionPhase, kind: TimerKind) -> bool {
        let secs = match kind {
            TimerKind::GoingOnce => self.timer_cfg.going_once_secs,
            _ => self.timer_cfg.going_twice_secs,
        };
        self.start_timer(kind, secs);
        self.set_phase(phase);
        true
    }

    /// Final countdown elapsed: sell to the high bidder, or pass the lot if
    /// the opening price drew no bids at all.
    fn close_lot(&mut self) -> bool {
        let Some(player) = self.current_player.clone() else {
            return false;
        };
        let Some(winner) = self.current_bidder.clone() else {
            return self.pass_lot();
        };

        let now = Utc::now();
        if !self.ledger.commit_sale(&player, &winner, self.current_bid, now) {
            // Guards on every bid should make this unreachable.
            warn!("sale commit failed for {} to {winner}", player.id);
            return false;
        }
        self.push_history(&player.id, &winner, self.current_bid, BidKind::Win);
        self.timers.cancel_all();
        self.phase = AuctionPhase::Sold;
        self.events.publish(DraftEvent::PlayerSold {
            player,
            team_id: winner,
            amount: self.current_bid,
            context: self.snapshot(),
        });
        self.publish_state_change();
        true
    }

    fn pass_lot(&mut self) -> bool {
        let Some(player) = self.current_player.clone() else {
            return false;
        };
        let nominator = self.nominating_team.clone().unwrap_or_default();
        info!("{} passed with no bids", player.name);
        self.push_history(&player.id, &nominator, 0, BidKind::Pass);
        self.timers.cancel_all();
        self.phase = AuctionPhase::Passed;
        self.events.publish(DraftEvent::PlayerPassed {
            player,
            context: self.snapshot(),
        });
        self.publish_state_change();
        true
    }

    fn next_player(&mut self) -> bool {
        self.timers.cancel_all();
        self.current_player = None;
        self.current_bid = 0;
        self.current_bidder = None;
        self.nominating_team = None;
        self.time_remaining = Duration::ZERO;
        self.set_phase(AuctionPhase::Waiting);
        true
    }

    fn pause(&mut self) -> bool {
        // Record how much of the bidding window is left for resume.
        self.time_remaining = self
            .timers
            .remaining(TimerKind::Bidding)
            .unwrap_or(Duration::ZERO);
        self.timers.cancel_all();
        info!("auction paused ({:?} remaining)", self.time_remaining);
        self.phase = AuctionPhase::Paused;
        self.events.publish(DraftEvent::AuctionPaused {
            context: self.snapshot(),
        });
        self.publish_state_change();
        true
    }

    fn resume(&mut self) -> bool {
        info!("auction resumed ({:?} on the clock)", self.time_remaining);
        self.timers.start(TimerKind::Bidding, self.time_remaining);
        self.phase = AuctionPhase::Bidding;
        self.events.publish(DraftEvent::AuctionResumed {
            context: self.snapshot(),
        });
        self.publish_state_change();
        true
    }

    fn complete(&mut self) -> bool {
        if !self.ledger.is_draft_complete() {
            debug!("completion rejected: open slots remain");
            return false;
        }
        self.timers.cancel_all();
        info!("auction complete: ${} spent", self.ledger.total_spent());
        self.phase = AuctionPhase::Completed;
        let final_budgets: Vec<TeamStatus> = self
            .ledger
            .teams
            .iter()
            .filter_map(|t| team_status(&self.ledger, &t.team_id))
            .collect();
        self.events.publish(DraftEvent::AuctionCompleted {
            history: self.bid_history.clone(),
            final_budgets,
        });
        self.publish_state_change();
        true
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn start_timer(&mut self, kind: TimerKind, secs: u64) {
        let duration = Duration::from_secs(secs);
        self.time_remaining = duration;
        self.timers.start(kind, duration);
    }

    fn set_phase(&mut self, phase: AuctionPhase) {
        self.phase = phase;
        self.publish_state_change();
    }

    fn publish_state_change(&self) {
        self.events.publish(DraftEvent::StateChange {
            phase: self.phase,
            context: self.snapshot(),
        });
    }

    fn push_history(&mut self, player_id: &str, team_id: &str, amount: u32, kind: BidKind) {
        self.bid_history.push(BidEvent {
            player_id: player_id.to_string(),
            team_id: team_id.to_string(),
            amount,
            timestamp: Utc::now(),
            kind,
        });
    }
}

fn event_name(event: &AuctionEvent) -> &'static str {
    match event {
        AuctionEvent::NominatePlayer { .. } => "NominatePlayer",
        AuctionEvent::OpenBidding => "OpenBidding",
        AuctionEvent::PlaceBid { .. } => "PlaceBid",
        AuctionEvent::TimerElapsed(_) => "TimerElapsed",
        AuctionEvent::NextPlayer => "NextPlayer",
        AuctionEvent::Pause => "Pause",
        AuctionEvent::Resume => "Resume",
        AuctionEvent::CompleteAuction => "CompleteAuction",
    }
}
