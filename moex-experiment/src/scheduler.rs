use moex_core::{Block, Outcome, Task, Trial, TrialError, TrialParams};
use moex_timing::{EventKey, EventKind, TimingLedger};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::ExperimentConfig;
use crate::record::TrialRecord;

/// Where the session stands. `BlockDone` is a transient step inside
/// [`Scheduler::end_trial`], not an observable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    BlockActive,
    TaskDone,
}

/// The synchronous seam to the rendering collaborator: it is told what
/// to display, and answers later through [`Scheduler::end_trial`].
pub trait TrialListener: Send {
    fn trial_started(&mut self, trial: &Trial);
    fn block_ended(&mut self, _block_num: i32) {}
    fn task_ended(&mut self) {}
}

/// Session state machine: owns the blocks, the current trial, and the
/// timing ledger. Single-writer: all calls come from one serialized
/// context.
pub struct Scheduler<R: Rng> {
    config: ExperimentConfig,
    rng: R,
    blocks: Vec<Block>,
    state: SessionState,
    active_block: usize,
    active_trial: Option<Trial>,
    trial_errors: u32,
    ledger: TimingLedger,
    listener: Option<Box<dyn TrialListener>>,
}

impl<R: Rng> Scheduler<R> {
    pub fn new(config: ExperimentConfig, mut rng: R) -> Self {
        let blocks = (1..=config.blocks as i32)
            .map(|num| Block::new(num, config.task, config.repetitions, &config.block, &mut rng))
            .collect();
        Self {
            config,
            rng,
            blocks,
            state: SessionState::Idle,
            active_block: 0,
            active_trial: None,
            trial_errors: 0,
            ledger: TimingLedger::new(),
            listener: None,
        }
    }

    pub fn set_listener(&mut self, listener: Box<dyn TrialListener>) {
        self.listener = Some(listener);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn active_trial(&self) -> Option<&Trial> {
        self.active_trial.as_ref()
    }

    pub fn ledger(&self) -> &TimingLedger {
        &self.ledger
    }

    /// Ledger writes for the active trial go through here; the caller
    /// is the single serialized input context.
    pub fn ledger_mut(&mut self) -> &mut TimingLedger {
        &mut self.ledger
    }

    /// Note a non-fatal participant error within the current attempt
    /// (wrong-direction scroll, stray click); counted into the record.
    pub fn log_error(&mut self, error: TrialError) {
        debug!(code = error.code(), "participant error");
        self.trial_errors += 1;
    }

    /// Enter the first block and activate its first trial.
    pub fn start_task(&mut self) {
        self.active_block = 0;
        self.state = SessionState::BlockActive;
        self.activate_trial(1);
    }

    /// Close the active trial with an outcome and advance the session.
    /// A `Hit` moves forward; an `Error` reinserts the trial later in
    /// the same block, so nothing is ever silently lost. Returns the
    /// log row for the finished attempt.
    pub fn end_trial(&mut self, outcome: Outcome) -> Option<TrialRecord> {
        let trial = self.active_trial.take()?;

        self.ledger.log_direct(EventKey::TrialClose);
        let duration = self
            .ledger
            .duration_secs(EventKey::TrialOpen, EventKey::TrialClose);
        info!(trial = trial.id, duration, ?outcome, "trial closed");

        if let Outcome::Error(error) = outcome {
            self.log_error(error);
        }
        let record = self.make_record(&trial, duration);

        match outcome {
            Outcome::Hit => {
                if self.blocks[self.active_block].is_finished(trial.trial_num) {
                    self.end_block();
                } else {
                    self.activate_trial(trial.trial_num + 1);
                }
            }
            Outcome::Error(_) => {
                self.blocks[self.active_block].reinsert_trial(trial.trial_num, &mut self.rng);
                self.activate_trial(trial.trial_num + 1);
            }
        }

        Some(record)
    }

    fn end_block(&mut self) {
        let finished = self.blocks[self.active_block].block_num;
        info!(block = finished, "block finished");
        if self.active_block + 1 == self.blocks.len() {
            info!("task ended");
            self.state = SessionState::TaskDone;
            if let Some(listener) = &mut self.listener {
                listener.task_ended();
            }
        } else {
            if let Some(listener) = &mut self.listener {
                listener.block_ended(finished);
            }
            self.active_block += 1;
            self.activate_trial(1);
        }
    }

    /// Reset the ledger, open the trial, and hand its parameters to
    /// the display collaborator.
    fn activate_trial(&mut self, num: i32) {
        let Some(trial) = self.blocks[self.active_block].trial(num) else {
            warn!(num, "no such trial to activate");
            return;
        };
        self.trial_errors = 0;
        self.ledger.activate(trial.id);
        self.ledger.log_direct(EventKey::TrialOpen);
        if let Some(listener) = &mut self.listener {
            listener.trial_started(&trial);
        }
        self.active_trial = Some(trial);
    }

    fn make_record(&self, trial: &Trial, duration: f64) -> TrialRecord {
        let first_input = match trial.task {
            Task::ZoomIn | Task::ZoomOut => EventKey::First(EventKind::Zoom),
            Task::Pan => EventKey::First(EventKind::Pan),
        };
        let reaction = self.ledger.duration_secs(EventKey::TrialOpen, first_input);

        let mut record = TrialRecord {
            case_num: self.config.case_num,
            participant: self.config.participant.clone(),
            task_id: trial.task.id(),
            technique_id: self.config.technique.id(),
            block_num: trial.block_num,
            trial_num: trial.trial_num,
            retries: trial.retries,
            errors: self.trial_errors,
            duration_sec: duration,
            reaction_sec: reaction,
            start_notch: None,
            target_notch: None,
            tolerance_low: None,
            tolerance_high: None,
            level: None,
            rotation: None,
        };
        match trial.params {
            TrialParams::Zoom {
                start_notch,
                target_notch,
            } => {
                record.start_notch = Some(start_notch);
                record.target_notch = Some(target_notch);
                record.tolerance_low = Some(target_notch - self.config.block.target_tolerance);
                record.tolerance_high = Some(target_notch + self.config.block.target_tolerance);
            }
            TrialParams::Pan { level, rotation } => {
                record.level = Some(level);
                record.rotation = Some(rotation);
            }
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moex_core::BlockConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;
    use std::sync::Mutex;

    fn small_config(blocks: usize, distances: Vec<i32>, repetitions: usize) -> ExperimentConfig {
        ExperimentConfig {
            blocks,
            repetitions,
            block: BlockConfig {
                target_distances: distances,
                ..BlockConfig::default()
            },
            ..ExperimentConfig::default()
        }
    }

    fn scheduler(config: ExperimentConfig) -> Scheduler<StdRng> {
        Scheduler::new(config, StdRng::seed_from_u64(7))
    }

    #[derive(Clone, Default)]
    struct Spy {
        started: Arc<Mutex<Vec<i32>>>,
        ended: Arc<Mutex<bool>>,
    }

    impl TrialListener for Spy {
        fn trial_started(&mut self, trial: &Trial) {
            self.started.lock().unwrap().push(trial.id);
        }
        fn task_ended(&mut self) {
            *self.ended.lock().unwrap() = true;
        }
    }

    #[test]
    fn hits_walk_through_the_block_to_task_done() {
        // One block of two trials.
        let mut sched = scheduler(small_config(1, vec![15], 2));
        let spy = Spy::default();
        sched.set_listener(Box::new(spy.clone()));

        sched.start_task();
        assert_eq!(sched.state(), SessionState::BlockActive);
        assert_eq!(sched.active_trial().unwrap().trial_num, 1);

        let record = sched.end_trial(Outcome::Hit).unwrap();
        assert_eq!(record.trial_num, 1);
        assert_eq!(sched.active_trial().unwrap().trial_num, 2);

        sched.end_trial(Outcome::Hit).unwrap();
        assert_eq!(sched.state(), SessionState::TaskDone);
        assert!(sched.active_trial().is_none());
        assert!(*spy.ended.lock().unwrap());
        assert_eq!(spy.started.lock().unwrap().len(), 2);
    }

    #[test]
    fn error_reinserts_and_the_clone_comes_back() {
        // One block, one trial.
        let mut sched = scheduler(small_config(1, vec![15], 1));
        sched.start_task();
        let first = sched.active_trial().unwrap().clone();

        sched
            .end_trial(Outcome::Error(TrialError::OutsideZoomViewport))
            .unwrap();

        // Not done: the reinserted clone is pending as trial 2.
        assert_eq!(sched.state(), SessionState::BlockActive);
        let clone = sched.active_trial().unwrap();
        assert_eq!(clone.trial_num, 2);
        assert_eq!(clone.params, first.params);
        assert_eq!(clone.retries, 1);

        sched.end_trial(Outcome::Hit).unwrap();
        assert_eq!(sched.state(), SessionState::TaskDone);
    }

    #[test]
    fn blocks_follow_each_other() {
        let mut sched = scheduler(small_config(2, vec![15], 1));
        sched.start_task();

        sched.end_trial(Outcome::Hit).unwrap();
        assert_eq!(sched.state(), SessionState::BlockActive);
        let trial = sched.active_trial().unwrap();
        assert_eq!(trial.block_num, 2);
        assert_eq!(trial.trial_num, 1);

        let record = sched.end_trial(Outcome::Hit).unwrap();
        assert_eq!(record.block_num, 2);
        assert_eq!(sched.state(), SessionState::TaskDone);
    }

    #[test]
    fn activation_resets_the_ledger() {
        let mut sched = scheduler(small_config(1, vec![15], 2));
        sched.start_task();
        let first_id = sched.active_trial().unwrap().id;
        assert_eq!(sched.ledger().active_trial(), Some(first_id));
        assert!(sched.ledger().has_logged(EventKey::TrialOpen));

        sched.ledger_mut().log_paired(EventKind::Zoom);
        sched.end_trial(Outcome::Hit).unwrap();

        // New trial, fresh ledger: only its own open marker.
        assert!(!sched.ledger().has_logged_kind(EventKind::Zoom));
        assert!(sched.ledger().has_logged(EventKey::TrialOpen));
    }

    #[test]
    fn records_carry_the_task_fields() {
        let mut sched = scheduler(small_config(1, vec![15], 1));
        sched.start_task();
        sched.ledger_mut().log_paired(EventKind::Zoom);
        sched.log_error(TrialError::WrongDirection);

        let record = sched.end_trial(Outcome::Hit).unwrap();
        assert_eq!(record.task_id, Task::ZoomIn.id());
        assert_eq!(record.errors, 1);
        assert!(record.duration_sec >= 0.0);
        assert!(record.reaction_sec >= 0.0);
        let target = record.target_notch.unwrap();
        assert_eq!(record.start_notch.unwrap(), target - 15);
        assert_eq!(record.tolerance_low.unwrap(), target - 4);
        assert_eq!(record.tolerance_high.unwrap(), target + 4);
        assert!(record.level.is_none());

        // Nothing active anymore; a second close is a no-op.
        assert!(sched.end_trial(Outcome::Hit).is_none());
    }

    #[test]
    fn pan_records_carry_level_and_rotation() {
        let config = ExperimentConfig {
            task: Task::Pan,
            blocks: 1,
            repetitions: 1,
            ..ExperimentConfig::default()
        };
        let mut sched = scheduler(config);
        sched.start_task();

        let record = sched.end_trial(Outcome::Hit).unwrap();
        assert!(record.level.is_some());
        assert!(record.rotation.unwrap() < 360);
        assert!(record.start_notch.is_none());
        assert!(record.reaction_sec.is_nan());
    }
}
