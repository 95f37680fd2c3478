use std::sync::Arc;

use anyhow::{Context, Result, bail};
use moex_core::{Memo, Outcome, Task, Technique, Trial};
use moex_experiment::{ExperimentConfig, Scheduler, SessionState, TrialListener};
use moex_link::{DeviceEvent, DeviceLink, Moose};
use moex_timing::EventKind;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tracing::{info, trace};

use crate::logger::TrialLogWriter;

/// Stand-in for the rendering collaborator: announces what the UI
/// would display.
struct ConsoleDisplay;

impl TrialListener for ConsoleDisplay {
    fn trial_started(&mut self, trial: &Trial) {
        info!(
            id = trial.id,
            block = trial.block_num,
            num = trial.trial_num,
            params = ?trial.params,
            "trial ready"
        );
    }

    fn block_ended(&mut self, block_num: i32) {
        info!(block = block_num, "break before the next block");
    }

    fn task_ended(&mut self) {
        info!("task finished, thank you");
    }
}

pub struct App {
    config: ExperimentConfig,
    log_path: String,
}

impl App {
    /// Session parameters from the command line:
    /// `moex-app [participant] [zoom-in|zoom-out|pan] [mouse|moose]`.
    pub fn from_args() -> Result<Self> {
        let mut config = ExperimentConfig::default();
        let args: Vec<String> = std::env::args().skip(1).collect();

        if let Some(participant) = args.first() {
            config.participant = participant.clone();
        }
        if let Some(task) = args.get(1) {
            config.task = match task.to_lowercase().as_str() {
                "zoom-in" => Task::ZoomIn,
                "zoom-out" => Task::ZoomOut,
                "pan" => Task::Pan,
                other => bail!("unknown task {other:?}"),
            };
        }
        if let Some(technique) = args.get(2) {
            config.technique = match technique.to_lowercase().as_str() {
                "mouse" => Technique::Mouse,
                "moose" => Technique::Moose,
                other => bail!("unknown technique {other:?}"),
            };
        }

        let log_path = format!(
            "trials-{}-{}.jsonl",
            config.participant,
            config.task.label().to_lowercase()
        );
        Ok(Self { config, log_path })
    }

    pub async fn run(self) -> Result<()> {
        let moose = Arc::new(Moose::new());
        let link = DeviceLink::new(moose.clone());
        // A bind failure is fatal: without the fixed port there is no
        // device communication at all.
        link.start().await.context("starting the device link")?;

        // Dispatcher callbacks run on the link's read task; the
        // scheduler and ledger are single-writer, so device events are
        // funneled into this loop's channel instead of touched there.
        let (tx, mut rx) = mpsc::unbounded_channel();
        moose.add_listener(move |event, memo: &Memo| {
            let _ = tx.send((event, memo.clone()));
        });

        let mut writer = TrialLogWriter::create(&self.log_path)?;
        let mut scheduler = Scheduler::new(self.config, StdRng::from_os_rng());
        scheduler.set_listener(Box::new(ConsoleDisplay));
        scheduler.start_task();

        loop {
            tokio::select! {
                received = rx.recv() => {
                    let Some((event, memo)) = received else { break };
                    match event {
                        DeviceEvent::Scrolled => {
                            trace!(dx = memo.value1_int(), dy = memo.value2_int(), "pan input");
                            scheduler.ledger_mut().log_paired(EventKind::Pan);
                        }
                        DeviceEvent::WheelMoved => {
                            trace!(factor = memo.value1_float(), "zoom input");
                            scheduler.ledger_mut().log_paired(EventKind::Zoom);
                        }
                        DeviceEvent::ZoomStart => {
                            trace!("zoom gesture started");
                        }
                        DeviceEvent::Clicked => {
                            // Hit testing belongs to the rendering layer;
                            // headless, a click confirms the active trial.
                            if let Some(record) = scheduler.end_trial(Outcome::Hit) {
                                writer.write(&record)?;
                            }
                        }
                    }
                    if scheduler.state() == SessionState::TaskDone {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted, closing the session");
                    break;
                }
            }
        }

        link.shutdown();
        Ok(())
    }
}
