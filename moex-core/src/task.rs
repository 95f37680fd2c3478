use std::fmt;

use serde::{Deserialize, Serialize};

/// Experiment task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    ZoomOut,
    ZoomIn,
    Pan,
}

impl Task {
    pub fn id(self) -> u8 {
        match self {
            Task::ZoomOut => 1,
            Task::ZoomIn => 2,
            Task::Pan => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Task::ZoomOut => "Zoom-Out",
            Task::ZoomIn => "Zoom-In",
            Task::Pan => "Pan",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Input technique under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Technique {
    Mouse,
    Moose,
}

impl Technique {
    pub fn id(self) -> u8 {
        match self {
            Technique::Mouse => 1,
            Technique::Moose => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Technique::Mouse => "Mouse",
            Technique::Moose => "Moose",
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a trial attempt did not count as a hit. These are participant
/// outcomes, not faults: the trial is reinserted and retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialError {
    OutsideZoomViewport,
    InsideZoomViewport,
    OutsidePanViewport,
    InsidePanViewport,
    WrongDirection,
}

impl TrialError {
    pub fn code(self) -> u8 {
        match self {
            TrialError::OutsideZoomViewport => 1,
            TrialError::InsideZoomViewport => 2,
            TrialError::OutsidePanViewport => 3,
            TrialError::InsidePanViewport => 4,
            TrialError::WrongDirection => 5,
        }
    }
}

/// How a trial attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Hit,
    Error(TrialError),
}
