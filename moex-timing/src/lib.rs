pub mod event;
pub mod ledger;

pub use event::{EventKey, EventKind};
pub use ledger::TimingLedger;
