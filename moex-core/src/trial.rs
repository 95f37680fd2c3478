use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Task-specific trial parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialParams {
    /// Start and target positions on the notch ruler.
    Zoom { start_notch: i32, target_notch: i32 },
    /// Curve level (1..=3) and its rotation in degrees.
    Pan { level: u8, rotation: u16 },
}

/// One pointing attempt. `Clone` is the value-copy contract: a cloned
/// trial is fully independent of the block's master list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub id: i32,
    pub task: Task,
    pub block_num: i32,
    pub trial_num: i32,
    pub finished: bool,
    pub retries: u32,
    pub params: TrialParams,
}

impl Trial {
    /// A zoom trial; numbering is assigned by the block once the final
    /// order is fixed.
    pub fn zoom(task: Task, start_notch: i32, target_notch: i32) -> Self {
        Self {
            id: 0,
            task,
            block_num: 0,
            trial_num: 0,
            finished: false,
            retries: 0,
            params: TrialParams::Zoom {
                start_notch,
                target_notch,
            },
        }
    }

    /// A pan trial at one of the three curve levels.
    pub fn pan(level: u8, rotation: u16) -> Self {
        Self {
            id: 0,
            task: Task::Pan,
            block_num: 0,
            trial_num: 0,
            finished: false,
            retries: 0,
            params: TrialParams::Pan { level, rotation },
        }
    }
}
