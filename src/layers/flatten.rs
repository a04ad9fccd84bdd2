use crate::math::matrix::Matrix;

use super::neuron::Neuron;

/// Hands every lower cell to its own flatten neuron, row-major within a
/// channel and channel after channel.
pub fn distribute(neurons: &mut [Neuron], lower: &[Neuron]) {
    let cells = lower.iter().flat_map(|n| n.output.values());
    for (neuron, value) in neurons.iter_mut().zip(cells) {
        neuron.set_input(Matrix::scalar(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::neuron::NeuronParams;

    #[test]
    fn cells_are_layer_major_then_row_major() {
        let mut lower = vec![
            Neuron::new(0, None, NeuronParams::Input),
            Neuron::new(1, None, NeuronParams::Input),
        ];
        lower[0].set_input(Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]));
        lower[1].set_input(Matrix::from_data(vec![vec![5.0, 6.0], vec![7.0, 8.0]]));

        let mut flat: Vec<Neuron> = (0..8).map(|i| Neuron::new(i, None, NeuronParams::Flatten)).collect();
        distribute(&mut flat, &lower);

        let outputs: Vec<f64> = flat.iter().map(|n| n.output.get(0, 0)).collect();
        assert_eq!(outputs, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }
}
