use serde::{Serialize, Deserialize};
use std::f64::consts::E;
use std::fmt;
use std::str::FromStr;

use crate::error::NetworkError;

/// Keeps sigmoid/tanh off their asymptotes so the gradient never fully vanishes.
const SATURATION_NUDGE: f64 = 0.00000001;

/// Leak rate used by `LeakyReLU`.
pub const LEAK_RATE: f64 = 0.01;

/// Element-wise activations selectable for convolution and fully-connected
/// layers. Output layers apply softmax instead (see [`softmax`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationFunction {
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "sigmoid")]
    Sigmoid,
    #[serde(rename = "tanh")]
    Tanh,
    #[serde(rename = "relu")]
    ReLU,
    #[serde(rename = "lrelu")]
    LeakyReLU,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Linear => x,
            ActivationFunction::Sigmoid => sigmoid(x),
            ActivationFunction::Tanh => tanh(x),
            ActivationFunction::ReLU => relu(x, 0.0),
            ActivationFunction::LeakyReLU => relu(x, LEAK_RATE),
        }
    }

    /// The value the backward pass multiplies errors by.
    ///
    /// Linear returns `x` and the ReLU family returns the activation value
    /// itself rather than a 0/1 step; the learning rule depends on both.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Linear => x,
            ActivationFunction::Sigmoid => sigmoid_derivative(x),
            ActivationFunction::Tanh => tanh_derivative(x),
            ActivationFunction::ReLU => relu(x, 0.0),
            ActivationFunction::LeakyReLU => relu(x, LEAK_RATE),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivationFunction::Linear => "linear",
            ActivationFunction::Sigmoid => "sigmoid",
            ActivationFunction::Tanh => "tanh",
            ActivationFunction::ReLU => "relu",
            ActivationFunction::LeakyReLU => "lrelu",
        }
    }
}

impl FromStr for ActivationFunction {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(ActivationFunction::Linear),
            "sigmoid" => Ok(ActivationFunction::Sigmoid),
            "tanh" => Ok(ActivationFunction::Tanh),
            "relu" => Ok(ActivationFunction::ReLU),
            "lrelu" => Ok(ActivationFunction::LeakyReLU),
            other => Err(NetworkError::UnknownActivation(other.to_string())),
        }
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn sigmoid(x: f64) -> f64 {
    let sig = 1.0 / (1.0 + E.powf(-x));

    if sig == 1.0 {
        sig - SATURATION_NUDGE
    } else if sig == 0.0 {
        sig + SATURATION_NUDGE
    } else {
        sig
    }
}

pub fn sigmoid_derivative(x: f64) -> f64 {
    let s = sigmoid(x);
    s * (1.0 - s)
}

/// `2·sigmoid(2x) − 1`, which inherits the sigmoid's saturation nudge.
pub fn tanh(x: f64) -> f64 {
    let t = 2.0 * sigmoid(2.0 * x) - 1.0;

    if t == 1.0 {
        t - SATURATION_NUDGE
    } else if t == -1.0 {
        t + SATURATION_NUDGE
    } else {
        t
    }
}

pub fn tanh_derivative(x: f64) -> f64 {
    1.0 - tanh(x).powi(2)
}

/// ReLU with an optional leak; a zero leak rate gives plain ReLU.
pub fn relu(x: f64, leak_rate: f64) -> f64 {
    if x > 0.0 {
        x
    } else if leak_rate == 0.0 {
        0.0
    } else {
        x * leak_rate
    }
}

/// Exp-normalises a vector. The maximum is subtracted first so large finite
/// inputs do not overflow.
pub fn softmax(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sigmoid_and_tanh_reference_values() {
        assert_abs_diff_eq!(sigmoid(1.23), 0.7738186, epsilon = 1e-6);
        assert_abs_diff_eq!(tanh(1.23), 0.842579, epsilon = 1e-6);
        assert_abs_diff_eq!(sigmoid_derivative(1.23), 0.175023, epsilon = 1e-6);
        assert_abs_diff_eq!(tanh_derivative(1.23), 0.290060, epsilon = 1e-6);
    }

    #[test]
    fn sigmoid_and_tanh_never_saturate() {
        for x in [-1000.0, -50.0, 50.0, 1000.0] {
            let s = sigmoid(x);
            assert!(s > 0.0 && s < 1.0, "sigmoid({x}) = {s}");
            let t = tanh(x);
            assert!(t > -1.0 && t < 1.0, "tanh({x}) = {t}");
        }
    }

    #[test]
    fn relu_family() {
        assert_eq!(relu(1.23, 0.0), 1.23);
        assert_eq!(relu(-1.23, 0.0), 0.0);
        assert_abs_diff_eq!(relu(-1.23, 0.01), -0.0123, epsilon = 1e-12);
    }

    #[test]
    fn relu_derivative_is_the_activation_value() {
        assert_eq!(ActivationFunction::ReLU.derivative(2.5), 2.5);
        assert_eq!(ActivationFunction::ReLU.derivative(-2.5), 0.0);
        assert_abs_diff_eq!(ActivationFunction::LeakyReLU.derivative(-2.0), -0.02, epsilon = 1e-12);
        assert_eq!(ActivationFunction::Linear.derivative(-3.0), -3.0);
    }

    #[test]
    fn parses_names_and_rejects_unknown() {
        assert_eq!("lrelu".parse::<ActivationFunction>().unwrap(), ActivationFunction::LeakyReLU);
        assert_eq!("tanh".parse::<ActivationFunction>().unwrap(), ActivationFunction::Tanh);
        assert!(matches!(
            "swish".parse::<ActivationFunction>(),
            Err(NetworkError::UnknownActivation(name)) if name == "swish"
        ));
    }

    #[test]
    fn softmax_sums_to_one() {
        let inputs = [
            vec![0.0, 0.0, 0.0],
            vec![1.0, -2.0, 3.5, 0.25],
            vec![800.0, 799.0],
            vec![-700.0, -720.0, -690.0],
        ];
        for v in &inputs {
            let out = softmax(v);
            assert_abs_diff_eq!(out.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
            assert!(out.iter().all(|p| p.is_finite() && *p >= 0.0));
        }
        let out = softmax(&[1.0, 2.0]);
        assert!(out[1] > out[0]);
    }
}
