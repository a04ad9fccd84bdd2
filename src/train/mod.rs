pub mod epoch_stats;
pub mod evaluate;
pub mod loop_fn;
pub mod termination;
pub mod train_config;

pub use epoch_stats::EpochStats;
pub use evaluate::{predict_loop, test_loop, Prediction, TestReport, TestResult};
pub use loop_fn::{train_loop, TrainingReport};
pub use termination::{TerminationConditions, TerminationReason};
pub use train_config::{SaveTarget, TrainConfig};
