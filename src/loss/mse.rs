pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((expected - predicted)²). Zero for empty input.
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        if predicted.is_empty() {
            return 0.0;
        }
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| (b - a).powi(2))
            .sum::<f64>() / n
    }

    /// One-hot target vector for `class` out of `classes`.
    pub fn one_hot(class: usize, classes: usize) -> Vec<f64> {
        (0..classes).map(|i| if i == class { 1.0 } else { 0.0 }).collect()
    }
}
