pub mod context;
pub mod labels;
pub mod network;
pub mod persist;
pub mod spec;

pub use context::{TrainingContext, DEFAULT_SEED};
pub use labels::LabelMap;
pub use network::{argmax, Network, NetworkState};
pub use spec::{Hyperparameters, LayerSpec, NetworkSpec};
