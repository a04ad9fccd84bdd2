use crate::activation::softmax;
use crate::error::{NetworkError, Result};
use crate::loss::MseLoss;
use crate::math::matrix::Matrix;

use super::neuron::Neuron;

/// Replaces each output neuron's raw score with its softmax share.
pub fn apply_softmax(neurons: &mut [Neuron]) {
    let raw: Vec<f64> = neurons.iter().map(|n| n.output.get(0, 0)).collect();
    for (neuron, share) in neurons.iter_mut().zip(softmax(&raw)) {
        neuron.output = Matrix::scalar(share);
    }
}

pub fn scores(neurons: &[Neuron]) -> Vec<f64> {
    neurons.iter().map(|n| n.output.get(0, 0)).collect()
}

/// One-hot target for `class`, rejecting classes the layer cannot represent.
pub fn target(class: usize, classes: usize) -> Result<Vec<f64>> {
    if class >= classes {
        return Err(NetworkError::LabelOutOfRange { class, classes });
    }
    Ok(MseLoss::one_hot(class, classes))
}

/// Squared error against the one-hot target, averaged over classes.
pub fn mean_squared_error(neurons: &[Neuron], class: usize) -> Result<f64> {
    let expected = target(class, neurons.len())?;
    Ok(MseLoss::loss(&scores(neurons), &expected))
}
