use moex_core::{BlockConfig, Task, Technique};

/// One session: one participant, one task, one technique.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    pub case_num: u32,
    pub participant: String,
    pub task: Task,
    pub technique: Technique,
    /// Number of blocks in the session.
    pub blocks: usize,
    /// Repetitions of the design within each block.
    pub repetitions: usize,
    pub block: BlockConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            case_num: 1,
            participant: "P1".to_owned(),
            task: Task::ZoomIn,
            technique: Technique::Moose,
            blocks: 3,
            repetitions: 2,
            block: BlockConfig::default(),
        }
    }
}
