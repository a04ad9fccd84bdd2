pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod data;
pub mod train;

// Convenience re-exports
pub use error::{NetworkError, Result};
pub use math::matrix::Matrix;
pub use math::shape::Shape;
pub use activation::activation::ActivationFunction;
pub use layers::{Layer, LayerKind, PoolKind};
pub use network::{LabelMap, Network, NetworkSpec, TrainingContext};
pub use loss::mse::MseLoss;
pub use data::{load_manifest, Example, ExampleSource, ImageDirectory};
pub use train::{predict_loop, test_loop, train_loop, TerminationConditions, TrainConfig};
