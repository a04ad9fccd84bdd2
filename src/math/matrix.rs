use rand::rngs::StdRng;
use rand::Rng;
use serde::{Serialize, Deserialize};
use std::ops::Add;

/// Dense row-major grid of `f64`. Used for every piece of neuron state: 2-D
/// feature maps, filters, and 1×N vectors for the flat layer kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// Fills a grid with draws from U[-bound, +bound], row by row.
    pub fn uniform(rows: usize, cols: usize, bound: f64, rng: &mut StdRng) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);

        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = uniform_draw(bound, rng);
            }
        }

        res
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map_or(0, |row| row.len()),
            data
        }
    }

    /// A single-row matrix.
    pub fn row(values: Vec<f64>) -> Matrix {
        Matrix::from_data(vec![values])
    }

    /// A 1×1 matrix.
    pub fn scalar(value: f64) -> Matrix {
        Matrix::row(vec![value])
    }

    /// Rebuilds a `rows × cols` grid from row-major values.
    /// Returns `None` if the value count does not match.
    pub fn from_flat(rows: usize, cols: usize, values: &[f64]) -> Option<Matrix> {
        if values.len() != rows * cols {
            return None;
        }
        if cols == 0 {
            return Some(Matrix::zeros(rows, 0));
        }
        Some(Matrix::from_data(values.chunks(cols).map(|c| c.to_vec()).collect()))
    }

    pub fn get(&self, y: usize, x: usize) -> f64 {
        self.data[y][x]
    }

    pub fn set(&mut self, y: usize, x: usize, value: f64) {
        self.data[y][x] = value;
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major iteration over every cell.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().flat_map(|row| row.iter().copied())
    }

    pub fn to_flat(&self) -> Vec<f64> {
        self.values().collect()
    }

    pub fn sum(&self) -> f64 {
        self.values().sum()
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix::from_data(
            self.data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect()
        )
    }

    /// Combines two same-shape grids cell by cell.
    pub fn zip_with<F>(&self, rhs: &Matrix, functor: F) -> Matrix
    where
        F: Fn(f64, f64) -> f64,
    {
        assert_eq!(self.rows, rhs.rows, "Matrices are of incorrect sizes");
        assert_eq!(self.cols, rhs.cols, "Matrices are of incorrect sizes");
        Matrix::from_data(
            self.data.iter().zip(rhs.data.iter())
                .map(|(a, b)| a.iter().zip(b.iter()).map(|(&x, &y)| functor(x, y)).collect())
                .collect()
        )
    }

    /// Element-wise (Hadamard) product.
    pub fn hadamard(&self, rhs: &Matrix) -> Matrix {
        self.zip_with(rhs, |a, b| a * b)
    }

    /// Element-wise quotient.
    pub fn divide(&self, rhs: &Matrix) -> Matrix {
        self.zip_with(rhs, |a, b| a / b)
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    /// Copies a `size_y × size_x` window whose origin is `(start_y * stride, start_x * stride)`.
    pub fn sub_matrix(&self, start_y: usize, start_x: usize, size_y: usize, size_x: usize, stride: usize) -> Matrix {
        let mut res = Matrix::zeros(size_y, size_x);

        for y in 0..size_y {
            for x in 0..size_x {
                res.data[y][x] = self.data[start_y * stride + y][start_x * stride + x];
            }
        }

        res
    }

    /// Position of the largest cell, scanning column by column; the first of
    /// equal values wins.
    pub fn argmax(&self) -> (usize, usize) {
        self.column_major_extreme(|candidate, best| candidate > best)
    }

    /// Position of the smallest cell, scanning column by column; the first of
    /// equal values wins.
    pub fn argmin(&self) -> (usize, usize) {
        self.column_major_extreme(|candidate, best| candidate < best)
    }

    fn column_major_extreme<F>(&self, better: F) -> (usize, usize)
    where
        F: Fn(f64, f64) -> bool,
    {
        let mut best = (0, 0);
        for x in 0..self.cols {
            for y in 0..self.rows {
                if better(self.data[y][x], self.data[best.0][best.1]) {
                    best = (y, x);
                }
            }
        }
        best
    }
}

/// One draw from U[-bound, +bound]; zero when the bound is not positive.
pub fn uniform_draw(bound: f64, rng: &mut StdRng) -> f64 {
    if bound > 0.0 {
        rng.gen_range(-bound..=bound)
    } else {
        0.0
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Add for Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, self.cols);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[i][j] = self.data[i][j] + rhs.data[i][j];
            }
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn grid() -> Matrix {
        Matrix::from_data(vec![
            vec![1.0, 2.0, 3.0, 4.0],
            vec![5.0, 6.0, 7.0, 8.0],
            vec![9.0, 10.0, 11.0, 12.0],
        ])
    }

    #[test]
    fn sub_matrix_offsets_by_stride() {
        let sub = grid().sub_matrix(0, 1, 2, 2, 2);
        assert_eq!(sub.data, vec![vec![3.0, 4.0], vec![7.0, 8.0]]);
    }

    #[test]
    fn sub_matrix_with_unit_stride() {
        let sub = grid().sub_matrix(1, 2, 2, 2, 1);
        assert_eq!(sub.data, vec![vec![7.0, 8.0], vec![11.0, 12.0]]);
    }

    #[test]
    fn argmax_prefers_first_cell_in_column_order() {
        let m = Matrix::from_data(vec![vec![1.0, 9.0], vec![9.0, 0.0]]);
        // (1, 0) is visited before (0, 1) in a column-major scan.
        assert_eq!(m.argmax(), (1, 0));
        assert_eq!(m.argmin(), (1, 1));
    }

    #[test]
    fn flat_round_trip_is_row_major() {
        let m = grid();
        let flat = m.to_flat();
        assert_eq!(flat[4], 5.0);
        assert_eq!(Matrix::from_flat(3, 4, &flat), Some(m));
        assert_eq!(Matrix::from_flat(2, 2, &flat), None);
    }

    #[test]
    fn uniform_stays_within_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        let m = Matrix::uniform(10, 10, 0.5, &mut rng);
        assert!(m.values().all(|v| (-0.5..=0.5).contains(&v)));
        assert!(m.values().any(|v| v < 0.0));
    }

    #[test]
    fn add_and_divide_are_element_wise() {
        let a = Matrix::from_data(vec![vec![2.0, 4.0]]);
        let b = Matrix::from_data(vec![vec![1.0, 2.0]]);
        assert_eq!((a.clone() + b.clone()).data, vec![vec![3.0, 6.0]]);
        assert_eq!(a.divide(&b).data, vec![vec![2.0, 2.0]]);
        assert_eq!(a.hadamard(&b).sum(), 10.0);
    }
}
