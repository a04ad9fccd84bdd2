use crate::activation::ActivationFunction;
use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::network::context::TrainingContext;

use super::convolution::ConvolutionUnit;
use super::dense::DenseUnit;
use super::kind::LayerKind;
use super::pooling::PoolUnit;
use super::routing::{route_upper_error, weighted_upper_error};

/// Kind-specific state of a neuron.
#[derive(Debug, Clone, PartialEq)]
pub enum NeuronParams {
    Input,
    Convolution(ConvolutionUnit),
    Pool(PoolUnit),
    Flatten,
    FullyConnected(DenseUnit),
    Output(DenseUnit),
}

/// One computational unit of a layer. `input`, `output` and `error` cache the
/// last forward and backward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Neuron {
    pub id: usize,
    pub activation: Option<ActivationFunction>,
    pub input: Matrix,
    pub output: Matrix,
    pub error: Matrix,
    pub params: NeuronParams,
}

impl Neuron {
    pub fn new(id: usize, activation: Option<ActivationFunction>, params: NeuronParams) -> Neuron {
        Neuron {
            id,
            activation,
            input: Matrix::default(),
            output: Matrix::default(),
            error: Matrix::default(),
            params,
        }
    }

    pub fn kind(&self) -> LayerKind {
        match &self.params {
            NeuronParams::Input => LayerKind::Input,
            NeuronParams::Convolution(_) => LayerKind::Convolution,
            NeuronParams::Pool(unit) => unit.kind.layer_kind(),
            NeuronParams::Flatten => LayerKind::Flatten,
            NeuronParams::FullyConnected(_) => LayerKind::FullyConnected,
            NeuronParams::Output(_) => LayerKind::Output,
        }
    }

    /// Weights and bias of fully-connected and output neurons.
    pub fn dense(&self) -> Option<&DenseUnit> {
        match &self.params {
            NeuronParams::FullyConnected(unit) | NeuronParams::Output(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn dense_mut(&mut self) -> Option<&mut DenseUnit> {
        match &mut self.params {
            NeuronParams::FullyConnected(unit) | NeuronParams::Output(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn convolution(&self) -> Option<&ConvolutionUnit> {
        match &self.params {
            NeuronParams::Convolution(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn convolution_mut(&mut self) -> Option<&mut ConvolutionUnit> {
        match &mut self.params {
            NeuronParams::Convolution(unit) => Some(unit),
            _ => None,
        }
    }

    /// Stores `input` and computes the neuron's output from it. Output
    /// neurons hold their raw score here; the layer replaces it with the
    /// softmax share once every score is known.
    pub fn set_input(&mut self, input: Matrix) {
        self.output = match &mut self.params {
            NeuronParams::Input | NeuronParams::Flatten => input.clone(),
            NeuronParams::Convolution(unit) => unit.convolve(&input, self.activation),
            NeuronParams::Pool(unit) => unit.pool(&input),
            NeuronParams::FullyConnected(unit) => {
                let net = unit.net(&input);
                Matrix::scalar(self.activation.map_or(net, |a| a.function(net)))
            }
            NeuronParams::Output(unit) => Matrix::scalar(unit.net(&input)),
        };
        self.input = input;
    }

    /// Computes this neuron's error and pending parameter deltas from the
    /// layer directly above. Output neurons use
    /// [`Neuron::calculate_output_deltas`] instead.
    pub fn calculate_deltas(&mut self, upper: &[Neuron], ctx: &TrainingContext) -> Result<()> {
        let kind = self.kind();
        match &mut self.params {
            NeuronParams::Input | NeuronParams::Output(_) => {}
            NeuronParams::Convolution(unit) => {
                let upper_error = route_upper_error(self.id, kind, &self.output, upper)?;
                let upper_error = match self.activation {
                    Some(activation) => upper_error.map(|e| activation.derivative(e)),
                    None => upper_error,
                };
                self.error = unit.calculate_deltas(&self.input, &self.output, &upper_error, ctx);
            }
            NeuronParams::Pool(unit) => {
                let upper_error = route_upper_error(self.id, kind, &self.output, upper)?;
                self.error = unit.scatter_error(&upper_error, &self.input);
            }
            NeuronParams::Flatten => {
                self.error = Matrix::scalar(weighted_upper_error(self.id, kind, upper)?);
            }
            NeuronParams::FullyConnected(unit) => {
                let value = self.output.get(0, 0);
                let derivative = self.activation.map_or(value, |a| a.derivative(value));
                let error = weighted_upper_error(self.id, kind, upper)? * derivative;
                unit.update_deltas(error, &self.input, ctx);
                self.error = Matrix::scalar(error);
            }
        }
        Ok(())
    }

    /// Error and deltas of an output neuron against its one-hot target.
    pub fn calculate_output_deltas(&mut self, expected: f64, ctx: &TrainingContext) {
        if let NeuronParams::Output(unit) = &mut self.params {
            let error = expected - self.output.get(0, 0);
            unit.update_deltas(error, &self.input, ctx);
            self.error = Matrix::scalar(error);
        }
    }

    pub fn apply_deltas(&mut self) {
        match &mut self.params {
            NeuronParams::Convolution(unit) => unit.apply_deltas(),
            NeuronParams::FullyConnected(unit) | NeuronParams::Output(unit) => unit.apply_deltas(),
            NeuronParams::Input | NeuronParams::Pool(_) | NeuronParams::Flatten => {}
        }
    }
}
