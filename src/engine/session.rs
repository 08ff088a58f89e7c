// Draft session: the serialized executor around the state machine.
//
// The machine itself is single-threaded. The session wraps it in a spawned
// task that drains two channels — external commands and timer fires — one
// message at a time, so a human bid and a timer expiry can never interleave
// mid-transition. Callers talk to the task through a cloneable handle.

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};

use super::events::{DraftEvent, EventBus};
use super::guard::TeamStatus;
use super::ledger::{DraftLedger, DraftPick};
use super::machine::{
    AuctionEvent, AuctionMachine, AuctionPhase, BidEvent, ContextSnapshot,
};
use super::timer::{TimerFired, Timers};
use crate::config::{LeagueConfig, TimerConfig};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("draft session has shut down")]
    Closed,
}

enum EngineCommand {
    Transition {
        event: AuctionEvent,
        respond: oneshot::Sender<bool>,
    },
    CanBid {
        team_id: String,
        amount: u32,
        respond: oneshot::Sender<bool>,
    },
    TeamStatus {
        team_id: String,
        respond: oneshot::Sender<Option<TeamStatus>>,
    },
    Snapshot {
        respond: oneshot::Sender<(AuctionPhase, ContextSnapshot)>,
    },
    BidHistory {
        player_id: Option<String>,
        respond: oneshot::Sender<Vec<BidEvent>>,
    },
    NextNominator {
        respond: oneshot::Sender<Option<String>>,
    },
    UndoLastPick {
        respond: oneshot::Sender<Option<DraftPick>>,
    },
    Shutdown,
}

/// Cloneable handle to a running draft session.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    events: EventBus,
}

impl EngineHandle {
    /// Apply one auction event. `false` means the event was illegal for the
    /// current phase and was ignored.
    pub async fn transition(&self, event: AuctionEvent) -> Result<bool, SessionError> {
        self.request(|respond| EngineCommand::Transition { event, respond })
            .await
    }

    pub async fn can_bid(&self, team_id: &str, amount: u32) -> Result<bool, SessionError> {
        let team_id = team_id.to_string();
        self.request(|respond| EngineCommand::CanBid {
            team_id,
            amount,
            respond,
        })
        .await
    }

    pub async fn team_status(&self, team_id: &str) -> Result<Option<TeamStatus>, SessionError> {
        let team_id = team_id.to_string();
        self.request(|respond| EngineCommand::TeamStatus { team_id, respond })
            .await
    }

    pub async fn snapshot(&self) -> Result<(AuctionPhase, ContextSnapshot), SessionError> {
        self.request(|respond| EngineCommand::Snapshot { respond })
            .await
    }

    pub async fn bid_history(
        &self,
        player_id: Option<&str>,
    ) -> Result<Vec<BidEvent>, SessionError> {
        let player_id = player_id.map(str::to_string);
        self.request(|respond| EngineCommand::BidHistory { player_id, respond })
            .await
    }

    pub async fn next_nominator(&self) -> Result<Option<String>, SessionError> {
        self.request(|respond| EngineCommand::NextNominator { respond })
            .await
    }

    pub async fn undo_last_pick(&self) -> Result<Option<DraftPick>, SessionError> {
        self.request(|respond| EngineCommand::UndoLastPick { respond })
            .await
    }

    /// Stop the session loop. Events already queued are dropped.
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown).await;
    }

    /// Subscribe to the session's lifecycle event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<DraftEvent> {
        self.events.subscribe()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(build(tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}

/// A live auction draft session.
pub struct DraftSession;

impl DraftSession {
    /// Build the ledger, machine, and channels for one draft and spawn the
    /// session loop.
    pub fn start(league: &LeagueConfig, timer_cfg: &TimerConfig) -> EngineHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let (timer_tx, timer_rx) = mpsc::channel(32);
        let events = EventBus::new(256);

        let ledger = DraftLedger::new(
            league.team_list(),
            league.budget,
            league.roster_size() as u32,
        );
        let machine = AuctionMachine::new(
            ledger,
            timer_cfg.clone(),
            Timers::new(timer_tx),
            events.clone(),
        );

        info!(
            "starting draft session: {} teams, ${} budget",
            league.num_teams, league.budget
        );
        tokio::spawn(run(machine, cmd_rx, timer_rx));

        EngineHandle { cmd_tx, events }
    }
}

async fn run(
    mut machine: AuctionMachine,
    mut cmd_rx: mpsc::Receiver<EngineCommand>,
    mut timer_rx: mpsc::Receiver<TimerFired>,
) {
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break };
                if !handle_command(&mut machine, cmd) {
                    break;
                }
            }
            Some(fired) = timer_rx.recv() => {
                handle_timer(&mut machine, fired);
            }
        }
    }
    debug!("draft session loop exiting");
}

/// Returns `false` on shutdown.
fn handle_command(machine: &mut AuctionMachine, cmd: EngineCommand) -> bool {
    match cmd {
        EngineCommand::Transition { event, respond } => {
            let _ = respond.send(machine.transition(event));
        }
        EngineCommand::CanBid {
            team_id,
            amount,
            respond,
        } => {
            let _ = respond.send(machine.can_bid(&team_id, amount));
        }
        EngineCommand::TeamStatus { team_id, respond } => {
            let _ = respond.send(machine.team_status(&team_id));
        }
        EngineCommand::Snapshot { respond } => {
            let _ = respond.send((machine.phase(), machine.snapshot()));
        }
        EngineCommand::BidHistory { player_id, respond } => {
            let _ = respond.send(machine.bid_history(player_id.as_deref()));
        }
        EngineCommand::NextNominator { respond } => {
            let _ = respond.send(machine.next_nominator());
        }
        EngineCommand::UndoLastPick { respond } => {
            let _ = respond.send(machine.undo_last_pick());
        }
        EngineCommand::Shutdown => return false,
    }
    true
}

fn handle_timer(machine: &mut AuctionMachine, fired: TimerFired) {
    // A fire from a timer that was since cancelled or replaced is stale.
    if !machine.timer_is_current(&fired) {
        debug!("dropping stale {:?} timer fire", fired.kind);
        return;
    }
    machine.transition(AuctionEvent::TimerElapsed(fired.kind));
}
