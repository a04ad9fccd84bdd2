pub mod convolution;
pub mod dense;
pub mod flatten;
pub mod input;
pub mod kind;
pub mod layer;
pub mod neuron;
pub mod order;
pub mod output;
pub mod pooling;
pub mod routing;

pub use convolution::ConvolutionUnit;
pub use dense::DenseUnit;
pub use kind::{LayerKind, PoolKind};
pub use layer::{Layer, LayerParams};
pub use neuron::{Neuron, NeuronParams};
pub use order::{check_layers, LayerOrderTable};
pub use pooling::PoolUnit;
