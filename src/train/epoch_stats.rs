use serde::{Serialize, Deserialize};

/// Per-epoch training statistics collected by `train_loop`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Examples trained in this epoch.
    pub examples: usize,
    /// Examples skipped because their data was unusable.
    pub skipped: usize,
    /// Mean MSE over the trained examples.
    pub mean_mse: f64,
    /// MSE of the last trained example.
    pub last_mse: f64,
    /// Wall-clock duration of this epoch in milliseconds.
    pub elapsed_ms: u64,
}
