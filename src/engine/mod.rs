// Auction draft engine: ledger, bid guard, timers, state machine,
// event channel, and the serialized session loop.

pub mod events;
pub mod guard;
pub mod ledger;
pub mod machine;
pub mod session;
pub mod timer;
