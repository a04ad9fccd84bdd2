use crate::math::matrix::{uniform_draw, Matrix};
use crate::network::context::TrainingContext;

use super::neuron::Neuron;

/// Weights, bias and momentum state shared by fully-connected and output
/// neurons.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseUnit {
    pub weights: Vec<f64>,
    pub bias: f64,
    deltas: Vec<f64>,
    bias_delta: f64,
}

impl DenseUnit {
    /// Draws `inputs` weights in order, then the bias.
    pub fn new(inputs: usize, ctx: &mut TrainingContext) -> DenseUnit {
        let weights = (0..inputs)
            .map(|_| uniform_draw(ctx.max_initial_weight, &mut ctx.rng))
            .collect();
        let bias = uniform_draw(ctx.max_initial_weight, &mut ctx.rng);
        DenseUnit::with_parameters(weights, bias)
    }

    pub fn with_parameters(weights: Vec<f64>, bias: f64) -> DenseUnit {
        DenseUnit {
            deltas: vec![0.0; weights.len()],
            weights,
            bias,
            bias_delta: 0.0,
        }
    }

    pub fn deltas(&self) -> &[f64] {
        &self.deltas
    }

    pub fn bias_delta(&self) -> f64 {
        self.bias_delta
    }

    /// `dot(weights, input) + bias` over a 1×N input row.
    pub fn net(&self, input: &Matrix) -> f64 {
        self.weights.iter().zip(input.values()).map(|(w, x)| w * x).sum::<f64>() + self.bias
    }

    /// `lr · error · input + momentum · prior` for the weights; the bias
    /// delta is scaled by the bias itself.
    pub fn update_deltas(&mut self, error: f64, input: &Matrix, ctx: &TrainingContext) {
        for (delta, x) in self.deltas.iter_mut().zip(input.values()) {
            *delta = ctx.learning_rate * error * x + ctx.momentum * *delta;
        }
        self.bias_delta = ctx.learning_rate * self.bias * error + ctx.momentum * self.bias_delta;
    }

    pub fn apply_deltas(&mut self) {
        self.bias += self.bias_delta;
        for (w, d) in self.weights.iter_mut().zip(self.deltas.iter()) {
            *w += d;
        }
    }
}

/// Concatenates every lower neuron's output into one 1×N row.
pub fn join_inputs(lower: &[Neuron]) -> Matrix {
    Matrix::row(lower.iter().flat_map(|n| n.output.values()).collect())
}
