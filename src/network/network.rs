use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::layers::{check_layers, Layer, LayerKind, PoolKind};
use crate::math::matrix::Matrix;
use crate::math::shape::Shape;
use crate::network::context::TrainingContext;
use crate::network::labels::LabelMap;
use crate::network::persist;

/// Construction state. Layers can only be appended while `Constructing`;
/// train/test/predict need `Validated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    Constructing,
    Validated,
}

/// A linear stack of layers plus the context used to build and train it.
#[derive(Debug, Clone)]
pub struct Network {
    context: TrainingContext,
    layers: Vec<Layer>,
    labels: LabelMap,
    state: NetworkState,
}

impl Network {
    pub fn new(context: TrainingContext) -> Network {
        Network {
            context,
            layers: Vec::new(),
            labels: LabelMap::default(),
            state: NetworkState::Constructing,
        }
    }

    pub fn with_labels(mut self, labels: LabelMap) -> Network {
        self.labels = labels;
        self
    }

    pub fn context(&self) -> &TrainingContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut TrainingContext {
        &mut self.context
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn set_labels(&mut self, labels: LabelMap) {
        self.labels = labels;
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Mutable access to existing layers' parameters. The stack itself can
    /// only grow through the `add_*` methods.
    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn state(&self) -> NetworkState {
        self.state
    }

    pub fn is_valid(&self) -> bool {
        self.state == NetworkState::Validated
    }

    /// Number of output classes, or zero before an output layer is added.
    pub fn classes(&self) -> usize {
        match self.layers.last() {
            Some(layer) if layer.kind() == LayerKind::Output => layer.neurons.len(),
            _ => 0,
        }
    }

    fn next_input_shape(&self) -> Shape {
        self.layers.last().map(Layer::output_shape).unwrap_or_default()
    }

    fn push(&mut self, layer: Layer) -> Result<&mut Self> {
        debug!(
            id = layer.id,
            kind = %layer.kind(),
            input = %layer.input_shape(),
            output = %layer.output_shape(),
            neurons = layer.neurons.len(),
            "Added layer"
        );
        self.layers.push(layer);
        Ok(self)
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            NetworkState::Constructing => Ok(()),
            NetworkState::Validated => Err(NetworkError::NetworkSealed),
        }
    }

    pub fn add_input(&mut self, width: usize, height: usize, channels: usize) -> Result<&mut Self> {
        self.ensure_open()?;
        let shape = Shape::new(channels as isize, height as isize, width as isize);
        let layer = Layer::input(self.layers.len(), shape);
        self.push(layer)
    }

    pub fn add_convolution(
        &mut self,
        filters: usize,
        filter_size: usize,
        stride: usize,
        activation: ActivationFunction,
    ) -> Result<&mut Self> {
        self.ensure_open()?;
        let input = self.next_input_shape();
        let layer = Layer::convolution(
            self.layers.len(),
            input,
            filters,
            filter_size,
            stride,
            activation,
            &mut self.context,
        );
        self.push(layer)
    }

    pub fn add_pool(&mut self, kind: PoolKind, pool_size: usize, stride: usize) -> Result<&mut Self> {
        self.ensure_open()?;
        let layer = Layer::pool(self.layers.len(), self.next_input_shape(), kind, pool_size, stride);
        self.push(layer)
    }

    pub fn add_flatten(&mut self) -> Result<&mut Self> {
        self.ensure_open()?;
        let layer = Layer::flatten(self.layers.len(), self.next_input_shape());
        self.push(layer)
    }

    pub fn add_fully_connected(&mut self, units: usize, activation: ActivationFunction) -> Result<&mut Self> {
        self.ensure_open()?;
        let input = self.next_input_shape();
        let layer = Layer::fully_connected(self.layers.len(), input, units, activation, &mut self.context);
        self.push(layer)
    }

    pub fn add_output(&mut self, classes: usize) -> Result<&mut Self> {
        self.ensure_open()?;
        let input = self.next_input_shape();
        let layer = Layer::output(self.layers.len(), input, classes, &mut self.context);
        self.push(layer)
    }

    /// Appends an already-built layer (used when restoring a saved network).
    pub(crate) fn push_layer(&mut self, layer: Layer) -> Result<&mut Self> {
        self.ensure_open()?;
        self.push(layer)
    }

    /// Checks the layer order and every output shape. On success the network
    /// is sealed; validating a sealed network again is a no-op.
    pub fn validate(&mut self) -> Result<()> {
        if self.is_valid() {
            return Ok(());
        }
        check_layers(&self.layers)?;
        self.state = NetworkState::Validated;
        info!(layers = self.layers.len(), classes = self.classes(), "Network validated");
        Ok(())
    }

    fn ensure_valid(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(NetworkError::InvalidNetwork)
        }
    }

    /// Runs one example forward and returns the class probabilities.
    pub fn forward(&mut self, grids: Vec<Matrix>) -> Result<Vec<f64>> {
        self.ensure_valid()?;
        self.layers[0].set_input(grids)?;

        for i in 1..self.layers.len() {
            let (lower, upper) = self.layers.split_at_mut(i);
            upper[0].set_input_from(&lower[i - 1].neurons);
        }

        Ok(self.output_layer().outputs())
    }

    fn output_layer(&self) -> &Layer {
        &self.layers[self.layers.len() - 1]
    }

    /// Error and deltas from the output layer down to the layer above the
    /// input, then applies every pending delta.
    fn backward(&mut self, class: usize) -> Result<()> {
        let last = self.layers.len() - 1;
        self.layers[last].calculate_output_deltas(class, &self.context)?;

        for i in (1..last).rev() {
            let (lower, upper) = self.layers.split_at_mut(i + 1);
            lower[i].calculate_deltas(&upper[0].neurons, &self.context)?;
        }

        for layer in self.layers.iter_mut().rev().filter(|l| l.kind().is_trainable()) {
            layer.apply_deltas();
        }
        Ok(())
    }

    /// One forward and backward pass. Returns the example's MSE before the
    /// update.
    pub fn train_example(&mut self, grids: Vec<Matrix>, class: usize) -> Result<f64> {
        self.forward(grids)?;
        let mse = self.output_layer().mse_for(class)?;
        self.backward(class)?;
        Ok(mse)
    }

    /// Forward pass only; returns the predicted class and the MSE against `class`.
    pub fn test_example(&mut self, grids: Vec<Matrix>, class: usize) -> Result<(usize, f64)> {
        let outputs = self.forward(grids)?;
        let mse = self.output_layer().mse_for(class)?;
        Ok((argmax(&outputs), mse))
    }

    pub fn predict_example(&mut self, grids: Vec<Matrix>) -> Result<usize> {
        let outputs = self.forward(grids)?;
        Ok(argmax(&outputs))
    }

    /// Writes `<dir>/<reference>.zip` and returns its path.
    pub fn save(&self, dir: &Path, reference: &str) -> Result<PathBuf> {
        persist::save_network(self, dir, reference)
    }

    /// Restores an unvalidated network from an archive written by [`Network::save`].
    pub fn load(path: &Path) -> Result<Network> {
        persist::load_network(path)
    }
}

/// Index of the largest value; the first wins on ties.
pub fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &x)| match best {
            Some((_, b)) if x <= b => best,
            _ => Some((i, x)),
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}
