// Event channel: broadcast fan-out of auction lifecycle events.
//
// Every accepted transition publishes an event carrying a snapshot of the
// auction context at the moment of the change. Subscribers (the console
// renderer, tests, future sinks) each get an independent receiver; a slow
// subscriber lags and drops from the ring buffer rather than blocking the
// session loop.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use super::guard::TeamStatus;
use super::machine::{AuctionPhase, BidEvent, ContextSnapshot};
use crate::player::Player;

/// A lifecycle event published on the session's broadcast channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DraftEvent {
    /// The machine moved to a new phase.
    StateChange {
        phase: AuctionPhase,
        context: ContextSnapshot,
    },
    /// A lot closed with a winning bid.
    PlayerSold {
        player: Player,
        team_id: String,
        amount: u32,
        context: ContextSnapshot,
    },
    /// A lot closed with no bids.
    PlayerPassed {
        player: Player,
        context: ContextSnapshot,
    },
    AuctionPaused {
        context: ContextSnapshot,
    },
    AuctionResumed {
        context: ContextSnapshot,
    },
    /// Terminal event: full bid history and closing budgets.
    AuctionCompleted {
        history: Vec<BidEvent>,
        final_budgets: Vec<TeamStatus>,
    },
}

/// Broadcast sender for [`DraftEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DraftEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        EventBus { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DraftEvent> {
        self.tx.subscribe()
    }

    /// Publish to all current subscribers. A send error just means nobody
    /// is listening right now, which is fine.
    pub fn publish(&self, event: DraftEvent) {
        if self.tx.send(event).is_err() {
            debug!("no event subscribers; dropping event");
        }
    }
}
