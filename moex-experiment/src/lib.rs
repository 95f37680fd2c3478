pub mod config;
pub mod record;
pub mod scheduler;

pub use config::ExperimentConfig;
pub use record::TrialRecord;
pub use scheduler::{Scheduler, SessionState, TrialListener};
