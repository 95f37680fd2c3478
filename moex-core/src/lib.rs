pub mod block;
pub mod memo;
pub mod task;
pub mod trial;

pub use block::{Block, BlockConfig};
pub use memo::Memo;
pub use task::{Outcome, Task, Technique, TrialError};
pub use trial::{Trial, TrialParams};
