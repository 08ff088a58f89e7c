// Timer subsystem: named, independently cancellable phase timers.
//
// Each timer is a spawned task that sleeps for the phase duration and then
// delivers a `TimerFired` message into the session channel. Starting a
// timer under a name that is already running aborts the previous task, so
// a name never has duplicate callbacks in flight. A generation counter
// guards against the race where an aborted task's message is already
// sitting in the channel: the session drops any fire whose generation no
// longer matches the current entry.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// The named phase timers of the auction protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    Nomination,
    Bidding,
    GoingOnce,
    GoingTwice,
}

/// A timer expiry delivered to the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub kind: TimerKind,
    pub generation: u64,
}

struct TimerEntry {
    handle: JoinHandle<()>,
    generation: u64,
    deadline: Instant,
}

/// Owner of all active phase timers for one auction session.
pub struct Timers {
    tx: mpsc::Sender<TimerFired>,
    entries: HashMap<TimerKind, TimerEntry>,
    generation: u64,
}

impl Timers {
    pub fn new(tx: mpsc::Sender<TimerFired>) -> Self {
        Timers {
            tx,
            entries: HashMap::new(),
            generation: 0,
        }
    }

    /// Start (or restart) the named timer. Any previous timer under the
    /// same name is cancelled first.
    pub fn start(&mut self, kind: TimerKind, duration: Duration) {
        self.cancel(kind);
        self.generation += 1;
        let generation = self.generation;
        let tx = self.tx.clone();

        debug!("starting {:?} timer for {:?} (gen {})", kind, duration, generation);
        let handle = tokio::spawn(async move {
            sleep(duration).await;
            // The receiver may be gone during shutdown; nothing to do then.
            let _ = tx.send(TimerFired { kind, generation }).await;
        });

        self.entries.insert(
            kind,
            TimerEntry {
                handle,
                generation,
                deadline: Instant::now() + duration,
            },
        );
    }

    /// Cancel the named timer if it is running.
    pub fn cancel(&mut self, kind: TimerKind) {
        if let Some(entry) = self.entries.remove(&kind) {
            entry.handle.abort();
            debug!("cancelled {:?} timer (gen {})", kind, entry.generation);
        }
    }

    /// Cancel every active timer.
    pub fn cancel_all(&mut self) {
        for (kind, entry) in self.entries.drain() {
            entry.handle.abort();
            debug!("cancelled {:?} timer (gen {})", kind, entry.generation);
        }
    }

    /// Time left before the named timer fires, if it is running.
    pub fn remaining(&self, kind: TimerKind) -> Option<Duration> {
        self.entries
            .get(&kind)
            .map(|e| e.deadline.saturating_duration_since(Instant::now()))
    }

    /// Whether a delivered fire belongs to the currently registered timer
    /// (stale fires from a replaced timer carry an older generation).
    pub fn is_current(&self, fired: &TimerFired) -> bool {
        self.entries
            .get(&fired.kind)
            .is_some_and(|e| e.generation == fired.generation)
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
