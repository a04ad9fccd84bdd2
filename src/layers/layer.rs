use crate::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::math::matrix::Matrix;
use crate::math::shape::{conv_output_size, flatten_output_size, pool_output_size, Shape};
use crate::network::context::TrainingContext;

use super::convolution::ConvolutionUnit;
use super::dense::{join_inputs, DenseUnit};
use super::kind::{LayerKind, PoolKind};
use super::neuron::{Neuron, NeuronParams};
use super::pooling::PoolUnit;
use super::{flatten, input, output};

/// Layer-level hyperparameters for each kind.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerParams {
    Input,
    Convolution { filters: usize, filter_size: usize, stride: usize },
    Pool { kind: PoolKind, pool_size: usize, stride: usize },
    Flatten,
    FullyConnected { units: usize, weights: usize },
    Output { outputs: usize, weights: usize },
}

/// One stage of the network: its shapes, hyperparameters and neurons.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: usize,
    pub activation: Option<ActivationFunction>,
    input_shape: Shape,
    output_shape: Shape,
    pub params: LayerParams,
    pub neurons: Vec<Neuron>,
}

fn count(dim: isize) -> usize {
    dim.max(0) as usize
}

impl Layer {
    /// Reassembles a layer from already-built neurons (used when loading).
    pub fn from_parts(
        id: usize,
        activation: Option<ActivationFunction>,
        input_shape: Shape,
        output_shape: Shape,
        params: LayerParams,
        neurons: Vec<Neuron>,
    ) -> Layer {
        Layer { id, activation, input_shape, output_shape, params, neurons }
    }

    /// One pass-through neuron per channel.
    pub fn input(id: usize, shape: Shape) -> Layer {
        let neurons = (0..count(shape.channels))
            .map(|i| Neuron::new(i, None, NeuronParams::Input))
            .collect();
        Layer::from_parts(id, None, shape, shape, LayerParams::Input, neurons)
    }

    /// One neuron per filter; filters are drawn in neuron order.
    pub fn convolution(
        id: usize,
        input_shape: Shape,
        filters: usize,
        filter_size: usize,
        stride: usize,
        activation: ActivationFunction,
        ctx: &mut TrainingContext,
    ) -> Layer {
        let output_shape = conv_output_size(filters, filter_size, stride, input_shape);
        let neurons = (0..filters)
            .map(|i| {
                let unit = ConvolutionUnit::new(filter_size, stride, ctx);
                Neuron::new(i, Some(activation), NeuronParams::Convolution(unit))
            })
            .collect();
        Layer::from_parts(
            id,
            Some(activation),
            input_shape,
            output_shape,
            LayerParams::Convolution { filters, filter_size, stride },
            neurons,
        )
    }

    /// One neuron per input channel.
    pub fn pool(id: usize, input_shape: Shape, kind: PoolKind, pool_size: usize, stride: usize) -> Layer {
        let output_shape = pool_output_size(pool_size, stride, input_shape);
        let neurons = (0..count(input_shape.channels))
            .map(|i| Neuron::new(i, None, NeuronParams::Pool(PoolUnit::new(kind, pool_size, stride))))
            .collect();
        Layer::from_parts(
            id,
            None,
            input_shape,
            output_shape,
            LayerParams::Pool { kind, pool_size, stride },
            neurons,
        )
    }

    /// One scalar neuron per input cell.
    pub fn flatten(id: usize, input_shape: Shape) -> Layer {
        let output_shape = flatten_output_size(input_shape);
        let neurons = (0..count(output_shape.width))
            .map(|i| Neuron::new(i, None, NeuronParams::Flatten))
            .collect();
        Layer::from_parts(id, None, input_shape, output_shape, LayerParams::Flatten, neurons)
    }

    pub fn fully_connected(
        id: usize,
        input_shape: Shape,
        units: usize,
        activation: ActivationFunction,
        ctx: &mut TrainingContext,
    ) -> Layer {
        let weights = input_shape.total();
        let neurons = (0..units)
            .map(|i| {
                let unit = DenseUnit::new(weights, ctx);
                Neuron::new(i, Some(activation), NeuronParams::FullyConnected(unit))
            })
            .collect();
        Layer::from_parts(
            id,
            Some(activation),
            input_shape,
            Shape::new(1, 1, units as isize),
            LayerParams::FullyConnected { units, weights },
            neurons,
        )
    }

    /// Output neurons carry no activation; the layer applies softmax.
    pub fn output(id: usize, input_shape: Shape, outputs: usize, ctx: &mut TrainingContext) -> Layer {
        let weights = input_shape.total();
        let neurons = (0..outputs)
            .map(|i| Neuron::new(i, None, NeuronParams::Output(DenseUnit::new(weights, ctx))))
            .collect();
        Layer::from_parts(
            id,
            None,
            input_shape,
            Shape::new(1, 1, outputs as isize),
            LayerParams::Output { outputs, weights },
            neurons,
        )
    }

    pub fn kind(&self) -> LayerKind {
        match &self.params {
            LayerParams::Input => LayerKind::Input,
            LayerParams::Convolution { .. } => LayerKind::Convolution,
            LayerParams::Pool { kind, .. } => kind.layer_kind(),
            LayerParams::Flatten => LayerKind::Flatten,
            LayerParams::FullyConnected { .. } => LayerKind::FullyConnected,
            LayerParams::Output { .. } => LayerKind::Output,
        }
    }

    pub fn input_shape(&self) -> Shape {
        self.input_shape
    }

    pub fn output_shape(&self) -> Shape {
        self.output_shape
    }

    /// Feeds one grid per channel into an input layer.
    pub fn set_input(&mut self, grids: Vec<Matrix>) -> Result<()> {
        if self.kind() != LayerKind::Input {
            return Err(NetworkError::InvalidNetwork);
        }
        input::check_input(self.input_shape, &grids)?;
        for (neuron, grid) in self.neurons.iter_mut().zip(grids) {
            neuron.set_input(grid);
        }
        Ok(())
    }

    /// Assembles this layer's input from the outputs of the layer below and
    /// runs every neuron forward.
    pub fn set_input_from(&mut self, lower: &[Neuron]) {
        match &self.params {
            LayerParams::Input => {}
            LayerParams::Convolution { .. } => {
                let summed = match lower.split_first() {
                    Some((first, rest)) => rest
                        .iter()
                        .fold(first.output.clone(), |acc, n| acc + n.output.clone()),
                    None => Matrix::default(),
                };
                for neuron in &mut self.neurons {
                    neuron.set_input(summed.clone());
                }
            }
            LayerParams::Pool { .. } => {
                for (neuron, source) in self.neurons.iter_mut().zip(lower) {
                    neuron.set_input(source.output.clone());
                }
            }
            LayerParams::Flatten => flatten::distribute(&mut self.neurons, lower),
            LayerParams::FullyConnected { .. } => {
                let joined = join_inputs(lower);
                for neuron in &mut self.neurons {
                    neuron.set_input(joined.clone());
                }
            }
            LayerParams::Output { .. } => {
                let joined = join_inputs(lower);
                for neuron in &mut self.neurons {
                    neuron.set_input(joined.clone());
                }
                output::apply_softmax(&mut self.neurons);
            }
        }
    }

    /// Errors and deltas for every neuron, given the layer directly above.
    pub fn calculate_deltas(&mut self, upper: &[Neuron], ctx: &TrainingContext) -> Result<()> {
        for neuron in &mut self.neurons {
            neuron.calculate_deltas(upper, ctx)?;
        }
        Ok(())
    }

    /// Errors and deltas of the output layer against the one-hot `class`.
    pub fn calculate_output_deltas(&mut self, class: usize, ctx: &TrainingContext) -> Result<()> {
        let expected = output::target(class, self.neurons.len())?;
        for (neuron, target) in self.neurons.iter_mut().zip(expected) {
            neuron.calculate_output_deltas(target, ctx);
        }
        Ok(())
    }

    pub fn apply_deltas(&mut self) {
        for neuron in &mut self.neurons {
            neuron.apply_deltas();
        }
    }

    /// Scalar outputs of every neuron, in order. For the output layer these
    /// are the class probabilities.
    pub fn outputs(&self) -> Vec<f64> {
        output::scores(&self.neurons)
    }

    /// Mean squared error of the last forward pass against `class`.
    pub fn mse_for(&self, class: usize) -> Result<f64> {
        output::mean_squared_error(&self.neurons, class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_size_neurons_per_kind() {
        let mut ctx = TrainingContext::default();
        let input = Layer::input(0, Shape::new(3, 8, 8));
        assert_eq!(input.neurons.len(), 3);

        let conv = Layer::convolution(1, input.output_shape(), 4, 3, 1, ActivationFunction::ReLU, &mut ctx);
        assert_eq!(conv.neurons.len(), 4);
        assert_eq!(conv.output_shape(), Shape::new(4, 6, 6));

        let pool = Layer::pool(2, conv.output_shape(), PoolKind::Max, 2, 2);
        assert_eq!(pool.neurons.len(), 4);
        assert_eq!(pool.kind(), LayerKind::MaxPool);

        let flat = Layer::flatten(3, pool.output_shape());
        assert_eq!(flat.neurons.len(), 36);

        let fc = Layer::fully_connected(4, flat.output_shape(), 5, ActivationFunction::Sigmoid, &mut ctx);
        assert_eq!(fc.neurons[0].dense().unwrap().weights.len(), 36);

        let out = Layer::output(5, fc.output_shape(), 3, &mut ctx);
        assert_eq!(out.params, LayerParams::Output { outputs: 3, weights: 5 });
        assert!(out.neurons.iter().all(|n| n.activation.is_none()));
    }

    #[test]
    fn pool_after_multichannel_input_gets_a_neuron_per_channel() {
        let pool = Layer::pool(1, Shape::new(3, 4, 4), PoolKind::Min, 2, 2);
        assert_eq!(pool.neurons.len(), 3);
        assert_eq!(pool.output_shape(), Shape::new(3, 2, 2));
    }

    #[test]
    fn convolution_sums_lower_channels() {
        let mut input = Layer::input(0, Shape::new(2, 2, 2));
        input
            .set_input(vec![Matrix::from_data(vec![vec![1.0; 2]; 2]), Matrix::from_data(vec![vec![2.0; 2]; 2])])
            .unwrap();

        let mut conv = Layer::from_parts(
            1,
            Some(ActivationFunction::Linear),
            input.output_shape(),
            conv_output_size(1, 1, 1, input.output_shape()),
            LayerParams::Convolution { filters: 1, filter_size: 1, stride: 1 },
            vec![Neuron::new(
                0,
                Some(ActivationFunction::Linear),
                NeuronParams::Convolution(ConvolutionUnit::with_parameters(1, 1, Matrix::scalar(1.0), 0.0)),
            )],
        );
        conv.set_input_from(&input.neurons);
        assert_eq!(conv.neurons[0].output.data, vec![vec![3.0; 2]; 2]);
    }

    #[test]
    fn set_input_rejects_non_input_layers_and_bad_grids() {
        let mut flat = Layer::flatten(1, Shape::new(1, 2, 2));
        assert!(matches!(flat.set_input(vec![]), Err(NetworkError::InvalidNetwork)));

        let mut input = Layer::input(0, Shape::new(1, 2, 2));
        assert!(matches!(
            input.set_input(vec![Matrix::zeros(3, 3)]),
            Err(NetworkError::InputMismatch { .. })
        ));
    }
}
