//! How error flows from a layer into the layer directly below it.
//!
//! Spatial neurons (convolution and pooling) take a grid shaped like their own
//! output from [`route_upper_error`]. Scalar neurons (flatten and
//! fully-connected) take a weighted sum from [`weighted_upper_error`]. Both
//! dispatch on the kind of the upper layer and fail with
//! [`NetworkError::NoErrorRoute`] where no rule exists.

use crate::error::{NetworkError, Result};
use crate::math::matrix::Matrix;

use super::kind::LayerKind;
use super::neuron::Neuron;

fn upper_kind(upper: &[Neuron]) -> Result<LayerKind> {
    upper.first().map(Neuron::kind).ok_or(NetworkError::InvalidNetwork)
}

/// Error grid for spatial neuron `id` whose last output was `output`.
///
/// - flatten above: the `output.len()` scalar errors starting at
///   `id * output.len()`, laid out row-major.
/// - convolution above: the summed error of every filter, weighted by this
///   neuron's share of the summed input the filters saw.
/// - pooling above: the error of the pooling neuron with the same id.
pub fn route_upper_error(id: usize, own: LayerKind, output: &Matrix, upper: &[Neuron]) -> Result<Matrix> {
    match upper_kind(upper)? {
        LayerKind::Flatten => {
            let count = output.len();
            let start = id * count;
            let block = upper.get(start..start + count).ok_or(NetworkError::InvalidNetwork)?;
            let values: Vec<f64> = block.iter().map(|n| n.error.get(0, 0)).collect();
            Matrix::from_flat(output.rows, output.cols, &values).ok_or(NetworkError::InvalidNetwork)
        }
        LayerKind::Convolution => {
            let summed_error = upper[1..]
                .iter()
                .fold(upper[0].error.clone(), |acc, n| acc + n.error.clone());
            let share = output.divide(&upper[0].input);
            Ok(summed_error.hadamard(&share))
        }
        LayerKind::MaxPool | LayerKind::MinPool => upper
            .get(id)
            .map(|n| n.error.clone())
            .ok_or(NetworkError::InvalidNetwork),
        from => Err(NetworkError::NoErrorRoute { from, to: own }),
    }
}

/// `Σ upper.error · upper.weights[id]` for a scalar neuron below a
/// fully-connected or output layer.
pub fn weighted_upper_error(id: usize, own: LayerKind, upper: &[Neuron]) -> Result<f64> {
    let mut sum = 0.0;
    for neuron in upper {
        let unit = neuron.dense().ok_or(NetworkError::NoErrorRoute {
            from: neuron.kind(),
            to: own,
        })?;
        let weight = unit.weights.get(id).ok_or(NetworkError::InvalidNetwork)?;
        sum += neuron.error.get(0, 0) * weight;
    }
    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::convolution::ConvolutionUnit;
    use crate::layers::dense::DenseUnit;
    use crate::layers::kind::PoolKind;
    use crate::layers::neuron::NeuronParams;
    use crate::layers::pooling::PoolUnit;

    fn scalar_neuron(id: usize, error: f64) -> Neuron {
        let mut n = Neuron::new(id, None, NeuronParams::Flatten);
        n.error = Matrix::scalar(error);
        n
    }

    #[test]
    fn flatten_above_slices_row_major() {
        let upper: Vec<Neuron> = (0..8).map(|i| scalar_neuron(i, i as f64)).collect();
        let output = Matrix::zeros(2, 2);
        let routed = route_upper_error(1, LayerKind::Convolution, &output, &upper).unwrap();
        assert_eq!(routed.data, vec![vec![4.0, 5.0], vec![6.0, 7.0]]);
    }

    #[test]
    fn convolution_above_does_not_touch_upper_errors() {
        let filter = |id| {
            let mut n = Neuron::new(
                id,
                None,
                NeuronParams::Convolution(ConvolutionUnit::with_parameters(1, 1, Matrix::scalar(1.0), 0.0)),
            );
            n.input = Matrix::row(vec![4.0, 8.0]);
            n.error = Matrix::row(vec![1.0, 2.0]);
            n
        };
        let upper = vec![filter(0), filter(1)];
        let output = Matrix::row(vec![2.0, 2.0]);

        let routed = route_upper_error(0, LayerKind::Input, &output, &upper).unwrap();
        assert_eq!(routed.data, vec![vec![1.0, 1.0]]);
        assert_eq!(upper[0].error, Matrix::row(vec![1.0, 2.0]));
    }

    #[test]
    fn pool_above_passes_matching_error() {
        let mut pool = Neuron::new(0, None, NeuronParams::Pool(PoolUnit::new(PoolKind::Max, 2, 2)));
        pool.error = Matrix::row(vec![0.3, 0.7]);
        let other = Neuron::new(1, None, NeuronParams::Pool(PoolUnit::new(PoolKind::Max, 2, 2)));
        let routed = route_upper_error(0, LayerKind::Convolution, &Matrix::zeros(1, 2), &[pool, other]).unwrap();
        assert_eq!(routed.data, vec![vec![0.3, 0.7]]);
    }

    #[test]
    fn dense_above_has_no_spatial_route() {
        let fc = Neuron::new(0, None, NeuronParams::FullyConnected(DenseUnit::with_parameters(vec![1.0], 0.0)));
        let err = route_upper_error(0, LayerKind::Convolution, &Matrix::scalar(1.0), &[fc]).unwrap_err();
        assert!(matches!(
            err,
            NetworkError::NoErrorRoute { from: LayerKind::FullyConnected, to: LayerKind::Convolution }
        ));
    }

    #[test]
    fn weighted_error_sums_over_upper_neurons() {
        let make = |w: Vec<f64>, e: f64| {
            let mut n = Neuron::new(0, None, NeuronParams::Output(DenseUnit::with_parameters(w, 0.0)));
            n.error = Matrix::scalar(e);
            n
        };
        let upper = vec![make(vec![1.0, 2.0], 0.5), make(vec![3.0, -1.0], 2.0)];
        assert_eq!(weighted_upper_error(1, LayerKind::Flatten, &upper).unwrap(), 0.5 * 2.0 - 2.0);
        assert!(weighted_upper_error(1, LayerKind::Flatten, &[scalar_neuron(0, 1.0)]).is_err());
    }
}
