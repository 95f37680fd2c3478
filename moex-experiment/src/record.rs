use serde::Serialize;

/// One flat row per finished trial attempt, appended to the session
/// log and flushed immediately. Task-specific fields are `None` for
/// the other task.
#[derive(Debug, Clone, Serialize)]
pub struct TrialRecord {
    pub case_num: u32,
    pub participant: String,
    pub task_id: u8,
    pub technique_id: u8,
    pub block_num: i32,
    pub trial_num: i32,
    pub retries: u32,
    pub errors: u32,
    /// Trial open to close, in seconds.
    pub duration_sec: f64,
    /// Trial open to the first task-relevant input, in seconds. NaN
    /// when the trial ended without any.
    pub reaction_sec: f64,
    pub start_notch: Option<i32>,
    pub target_notch: Option<i32>,
    pub tolerance_low: Option<i32>,
    pub tolerance_high: Option<i32>,
    pub level: Option<u8>,
    pub rotation: Option<u16>,
}
