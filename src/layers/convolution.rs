use crate::activation::ActivationFunction;
use crate::math::matrix::{uniform_draw, Matrix};
use crate::math::shape::window_count;
use crate::network::context::TrainingContext;

/// Parameters and momentum state of one convolution filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvolutionUnit {
    pub filter_size: usize,
    pub stride: usize,
    pub filter: Matrix,
    pub bias: f64,
    filter_delta: Matrix,
    bias_delta: f64,
}

impl ConvolutionUnit {
    /// Draws the filter (row-major) and then the bias from the context stream.
    pub fn new(filter_size: usize, stride: usize, ctx: &mut TrainingContext) -> Self {
        let filter = Matrix::uniform(filter_size, filter_size, ctx.max_initial_weight, &mut ctx.rng);
        let bias = uniform_draw(ctx.max_initial_weight, &mut ctx.rng);
        Self::with_parameters(filter_size, stride, filter, bias)
    }

    pub fn with_parameters(filter_size: usize, stride: usize, filter: Matrix, bias: f64) -> Self {
        ConvolutionUnit {
            filter_size,
            stride,
            filter,
            bias,
            filter_delta: Matrix::zeros(filter_size, filter_size),
            bias_delta: 0.0,
        }
    }

    pub fn filter_delta(&self) -> &Matrix {
        &self.filter_delta
    }

    pub fn bias_delta(&self) -> f64 {
        self.bias_delta
    }

    /// Slides the filter over `input`. Each cell is the filter-weighted window
    /// sum normalised by the filter's own sum, plus the bias.
    pub fn convolve(&self, input: &Matrix, activation: Option<ActivationFunction>) -> Matrix {
        let rows = window_count(self.filter_size, self.stride, input.rows as isize).max(0) as usize;
        let cols = window_count(self.filter_size, self.stride, input.cols as isize).max(0) as usize;
        let filter_sum = self.filter.sum();
        let mut output = Matrix::zeros(rows, cols);

        for oy in 0..rows {
            for ox in 0..cols {
                let window = input.sub_matrix(oy, ox, self.filter_size, self.filter_size, self.stride);
                let value = window.hadamard(&self.filter).sum() / filter_sum + self.bias;
                let value = activation.map_or(value, |a| a.function(value));
                output.set(oy, ox, value);
            }
        }

        output
    }

    /// Computes filter and bias deltas from the (already activation-scaled)
    /// upper error and returns the error to hand to the layer below.
    pub fn calculate_deltas(
        &mut self,
        input: &Matrix,
        output: &Matrix,
        upper_error: &Matrix,
        ctx: &TrainingContext,
    ) -> Matrix {
        let error_over_output = upper_error.divide(output);
        let momentum = self.filter_delta.scale(ctx.momentum);

        let mut delta = Matrix::zeros(self.filter_size, self.filter_size);
        for y in 0..self.filter_size {
            for x in 0..self.filter_size {
                let cell = self.filter.get(y, x);
                let output_over_cell = output.map(|v| v / cell);
                delta.set(y, x, error_over_output.hadamard(&output_over_cell).sum());
            }
        }
        self.filter_delta = delta + momentum;

        self.bias_delta = ctx.learning_rate * (1.0 / upper_error.sum()) + ctx.momentum * self.bias_delta;

        self.input_error(input, output)
    }

    /// Each input cell's share: the output cells inside its receptive
    /// footprint, divided by the input cell's value, summed.
    fn input_error(&self, input: &Matrix, output: &Matrix) -> Matrix {
        let reach = self.filter_size as isize - 1;
        let out_rows = output.rows as isize;
        let out_cols = output.cols as isize;
        let mut error = Matrix::zeros(input.rows, input.cols);

        for y in 0..input.rows {
            for x in 0..input.cols {
                let (top, height) = footprint(y as isize, reach, out_rows);
                let (left, width) = footprint(x as isize, reach, out_cols);
                let cell = input.get(y, x);
                let affected = output.sub_matrix(top, left, height, width, 1);
                error.set(y, x, affected.values().map(|v| v / cell).sum());
            }
        }

        error
    }

    pub fn apply_deltas(&mut self) {
        self.bias += self.bias_delta;
        self.filter = self.filter.clone() + self.filter_delta.clone();
    }
}

/// Start and extent along one axis of the output cells an input position
/// reaches; clamped to the output and never negative.
fn footprint(position: isize, reach: isize, limit: isize) -> (usize, usize) {
    let start = (position - reach).max(0);
    let end = (position + reach).min(limit);
    let extent = (end - start).max(0);
    if extent == 0 {
        return (0, 0);
    }
    (start as usize, extent as usize)
}
