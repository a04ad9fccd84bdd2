use super::kind::PoolKind;
use crate::math::matrix::Matrix;
use crate::math::pool_code::{pool_decode, pool_encode};
use crate::math::shape::window_count;

/// Window configuration of one pooling neuron plus the source location of
/// every cell it selected on the last forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolUnit {
    pub kind: PoolKind,
    pub pool_size: usize,
    pub stride: usize,
    locations: Vec<u64>,
}

impl PoolUnit {
    pub fn new(kind: PoolKind, pool_size: usize, stride: usize) -> Self {
        PoolUnit {
            kind,
            pool_size,
            stride,
            locations: Vec::new(),
        }
    }

    /// Encoded winner locations, one per output cell in row-major order.
    pub fn locations(&self) -> &[u64] {
        &self.locations
    }

    pub fn pool(&mut self, input: &Matrix) -> Matrix {
        let rows = window_count(self.pool_size, self.stride, input.rows as isize).max(0) as usize;
        let cols = window_count(self.pool_size, self.stride, input.cols as isize).max(0) as usize;
        let mut output = Matrix::zeros(rows, cols);
        self.locations.clear();

        for oy in 0..rows {
            for ox in 0..cols {
                let window = input.sub_matrix(oy, ox, self.pool_size, self.pool_size, self.stride);
                let (wy, wx) = match self.kind {
                    PoolKind::Max => window.argmax(),
                    PoolKind::Min => window.argmin(),
                };
                output.set(oy, ox, window.get(wy, wx));

                let source_y = wy + oy * self.stride;
                let source_x = wx + ox * self.stride;
                self.locations.push(pool_encode(source_y, source_x, input.rows, input.cols));
            }
        }

        output
    }

    /// Routes each upper error cell back to the input cell that won its
    /// window. Cells that never won keep a zero error; when two windows share
    /// a winner the later one overwrites.
    pub fn scatter_error(&self, upper_error: &Matrix, input: &Matrix) -> Matrix {
        let mut errors = Matrix::zeros(input.rows, input.cols);

        for (value, &code) in upper_error.values().zip(self.locations.iter()) {
            let (y, x) = pool_decode(code, input.rows);
            errors.set(y, x, value);
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> Matrix {
        Matrix::from_data(vec![
            vec![1.0, 5.0, 2.0, 0.0],
            vec![3.0, 4.0, 8.0, 6.0],
            vec![0.0, 2.0, 1.0, 1.0],
            vec![7.0, 1.0, 3.0, 9.0],
        ])
    }

    #[test]
    fn max_pool_keeps_window_maxima() {
        let mut unit = PoolUnit::new(PoolKind::Max, 2, 2);
        let out = unit.pool(&input());
        assert_eq!(out.data, vec![vec![5.0, 8.0], vec![7.0, 9.0]]);
        assert_eq!(unit.locations().len(), 4);
    }

    #[test]
    fn min_pool_keeps_window_minima() {
        let mut unit = PoolUnit::new(PoolKind::Min, 2, 2);
        let out = unit.pool(&input());
        assert_eq!(out.data, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn error_lands_on_the_winning_cells() {
        let mut unit = PoolUnit::new(PoolKind::Max, 2, 2);
        let input = input();
        unit.pool(&input);

        let upper = Matrix::from_data(vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
        let errors = unit.scatter_error(&upper, &input);

        assert_eq!(errors.get(0, 1), 0.1);
        assert_eq!(errors.get(1, 2), 0.2);
        assert_eq!(errors.get(3, 0), 0.3);
        assert_eq!(errors.get(3, 3), 0.4);
        assert_eq!(errors.values().filter(|v| *v == 0.0).count(), 12);
    }

    #[test]
    fn overlapping_windows_share_a_winner() {
        let mut unit = PoolUnit::new(PoolKind::Max, 2, 1);
        let input = Matrix::from_data(vec![vec![0.0, 9.0, 0.0], vec![0.0, 0.0, 0.0]]);
        let out = unit.pool(&input);
        assert_eq!(out.data, vec![vec![9.0, 9.0]]);

        let errors = unit.scatter_error(&Matrix::from_data(vec![vec![1.0, 2.0]]), &input);
        assert_eq!(errors.get(0, 1), 2.0);
        assert_eq!(errors.sum(), 2.0);
    }
}
