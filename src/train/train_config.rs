use std::path::PathBuf;

use crate::train::termination::TerminationConditions;

/// Where the trained network is written when the run ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTarget {
    pub dir: PathBuf,
    pub reference: String,
}

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `termination`: when to stop; at least one condition must be set
/// - `save`: optional archive target written on termination
/// - `error_log`: optional CSV file receiving every example's MSE
/// - `log_every`: emit a progress event every this many examples
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub termination: TerminationConditions,
    pub save: Option<SaveTarget>,
    pub error_log: Option<PathBuf>,
    pub log_every: usize,
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig` with no save target and no error log.
    pub fn new(termination: TerminationConditions) -> Self {
        TrainConfig {
            termination,
            save: None,
            error_log: None,
            log_every: 10,
        }
    }

    pub fn save_to(mut self, dir: impl Into<PathBuf>, reference: impl Into<String>) -> Self {
        self.save = Some(SaveTarget {
            dir: dir.into(),
            reference: reference.into(),
        });
        self
    }

    pub fn log_errors_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.error_log = Some(path.into());
        self
    }
}
