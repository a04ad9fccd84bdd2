use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::activation::ActivationFunction;
use crate::error::Result;
use crate::layers::PoolKind;
use crate::network::context::{TrainingContext, DEFAULT_SEED};
use crate::network::labels::LabelMap;
use crate::network::network::Network;
use crate::train::termination::TerminationConditions;

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// Global training hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub learning_rate: f64,
    pub momentum: f64,
    pub max_initial_weight: f64,
    /// Seed for the initial parameter draws.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Hyperparameters {
            learning_rate: 0.1,
            momentum: 0.0,
            max_initial_weight: 0.1,
            seed: DEFAULT_SEED,
        }
    }
}

/// Describes one layer in a network specification.
///
/// Activation and pool-type names stay strings here so that an unknown name
/// surfaces as a configuration error when the network is built rather than
/// as a parse failure of the whole file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Input { width: usize, height: usize, channels: usize },
    Convolution { filters: usize, filter_size: usize, stride: usize, activation: String },
    Pool { pool_size: usize, stride: usize, pool_type: String },
    Flatten,
    FullyConnected { units: usize, activation: String },
    Output { classes: usize },
}

/// A fully serializable description of a network architecture plus its
/// hyperparameters, label mapping and termination conditions.
///
/// `NetworkSpec` can be saved to / loaded from JSON independently of the
/// trained parameters, so an architecture can be stored before training starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name; the default save reference.
    pub name: String,
    #[serde(default)]
    pub hyperparameters: Hyperparameters,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    /// Label text for each class index.
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub termination: TerminationConditions,
}

impl NetworkSpec {
    /// Builds the described network in the `Constructing` state.
    ///
    /// Names are parsed layer by layer, so an unknown activation or pool type
    /// fails before that layer's shape is computed.
    pub fn build(&self) -> Result<Network> {
        let hp = &self.hyperparameters;
        let context = TrainingContext::with_seed(hp.learning_rate, hp.momentum, hp.max_initial_weight, hp.seed);
        let mut network = Network::new(context).with_labels(LabelMap::new(self.labels.iter().cloned()));

        for layer in &self.layers {
            match layer {
                LayerSpec::Input { width, height, channels } => {
                    network.add_input(*width, *height, *channels)?;
                }
                LayerSpec::Convolution { filters, filter_size, stride, activation } => {
                    let activation: ActivationFunction = activation.parse()?;
                    network.add_convolution(*filters, *filter_size, *stride, activation)?;
                }
                LayerSpec::Pool { pool_size, stride, pool_type } => {
                    let kind: PoolKind = pool_type.parse()?;
                    network.add_pool(kind, *pool_size, *stride)?;
                }
                LayerSpec::Flatten => {
                    network.add_flatten()?;
                }
                LayerSpec::FullyConnected { units, activation } => {
                    let activation: ActivationFunction = activation.parse()?;
                    network.add_fully_connected(*units, activation)?;
                }
                LayerSpec::Output { classes } => {
                    network.add_output(*classes)?;
                }
            }
        }

        Ok(network)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &Path) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkError;

    const SPEC: &str = r#"{
        "name": "scans",
        "hyperparameters": { "learning_rate": 0.05, "momentum": 0.9, "max_initial_weight": 0.2 },
        "layers": [
            { "type": "input", "width": 8, "height": 8, "channels": 1 },
            { "type": "convolution", "filters": 2, "filter_size": 3, "stride": 1, "activation": "relu" },
            { "type": "pool", "pool_size": 2, "stride": 2, "pool_type": "max" },
            { "type": "flatten" },
            { "type": "fully_connected", "units": 6, "activation": "sigmoid" },
            { "type": "output", "classes": 3 }
        ],
        "labels": ["AD", "CN", "MCI"],
        "termination": { "max_epochs": 5 }
    }"#;

    #[test]
    fn parses_and_builds() {
        let spec: NetworkSpec = serde_json::from_str(SPEC).unwrap();
        assert_eq!(spec.hyperparameters.seed, DEFAULT_SEED);
        assert_eq!(spec.termination.max_epochs, Some(5));

        let mut network = spec.build().unwrap();
        assert_eq!(network.layers().len(), 6);
        assert_eq!(network.labels().class_of("MCI"), Some(2));
        network.validate().unwrap();
    }

    #[test]
    fn same_spec_same_parameters() {
        let spec: NetworkSpec = serde_json::from_str(SPEC).unwrap();
        let a = spec.build().unwrap();
        let b = spec.build().unwrap();
        assert_eq!(a.layers(), b.layers());
    }

    #[test]
    fn unknown_pool_type_fails_at_build() {
        let mut spec: NetworkSpec = serde_json::from_str(SPEC).unwrap();
        spec.layers[2] = LayerSpec::Pool { pool_size: 2, stride: 2, pool_type: "avg".into() };
        assert!(matches!(spec.build(), Err(NetworkError::UnknownPoolType(name)) if name == "avg"));
    }

    #[test]
    fn unknown_activation_fails_at_build() {
        let mut spec: NetworkSpec = serde_json::from_str(SPEC).unwrap();
        spec.layers[4] = LayerSpec::FullyConnected { units: 2, activation: "gelu".into() };
        assert!(matches!(spec.build(), Err(NetworkError::UnknownActivation(_))));
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.json");
        let spec: NetworkSpec = serde_json::from_str(SPEC).unwrap();
        spec.save_json(&path).unwrap();
        assert_eq!(NetworkSpec::load_json(&path).unwrap(), spec);
    }
}
