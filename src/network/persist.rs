//! Saving and restoring trained networks.
//!
//! A network is stored as one zip archive holding a tree of JSON documents:
//!
//! ```text
//! <reference>.zip
//! ├── Network.json            hyperparameters, labels, layer count
//! ├── 0/Layer.json            kind, shapes, layer hyperparameters
//! ├── 0/neurons/0.json        kind, activation, filter or weights, bias
//! └── ...
//! ```

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::layers::{ConvolutionUnit, DenseUnit, Layer, LayerKind, LayerParams, Neuron, NeuronParams, PoolKind, PoolUnit};
use crate::math::matrix::Matrix;
use crate::math::shape::Shape;
use crate::network::context::TrainingContext;
use crate::network::labels::LabelMap;
use crate::network::network::Network;

const NETWORK_FILE: &str = "Network.json";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NetworkDocument {
    learning_rate: f64,
    momentum: f64,
    maximum_initial_weight: f64,
    #[serde(default)]
    labels: Vec<String>,
    number_of_layers: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LayerDocument {
    #[serde(rename = "ID")]
    id: usize,
    #[serde(rename = "Type")]
    kind: LayerKind,
    activation: Option<ActivationFunction>,
    input_size: [isize; 3],
    output_size: [isize; 3],
    number_of_neurons: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stride: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    number_of_filters: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pool_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    number_of_weights: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    number_of_outputs: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NeuronDocument {
    #[serde(rename = "ID")]
    id: usize,
    #[serde(rename = "Type")]
    kind: LayerKind,
    activation: Option<ActivationFunction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weights: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bias: Option<f64>,
}

fn layer_path(index: usize) -> String {
    format!("{index}/Layer.json")
}

fn neuron_path(layer: usize, neuron: usize) -> String {
    format!("{layer}/neurons/{neuron}.json")
}

fn missing(field: &str, layer: usize) -> NetworkError {
    NetworkError::Persistence(format!("layer {layer} is missing \"{field}\""))
}

impl LayerDocument {
    fn from_layer(layer: &Layer) -> LayerDocument {
        let mut doc = LayerDocument {
            id: layer.id,
            kind: layer.kind(),
            activation: layer.activation,
            input_size: layer.input_shape().to_array(),
            output_size: layer.output_shape().to_array(),
            number_of_neurons: layer.neurons.len(),
            filter_size: None,
            stride: None,
            number_of_filters: None,
            pool_size: None,
            number_of_weights: None,
            number_of_outputs: None,
        };
        match &layer.params {
            LayerParams::Input | LayerParams::Flatten => {}
            LayerParams::Convolution { filters, filter_size, stride } => {
                doc.number_of_filters = Some(*filters);
                doc.filter_size = Some(*filter_size);
                doc.stride = Some(*stride);
            }
            LayerParams::Pool { pool_size, stride, .. } => {
                doc.pool_size = Some(*pool_size);
                doc.stride = Some(*stride);
            }
            LayerParams::FullyConnected { weights, .. } => {
                doc.number_of_weights = Some(*weights);
            }
            LayerParams::Output { outputs, weights } => {
                doc.number_of_outputs = Some(*outputs);
                doc.number_of_weights = Some(*weights);
            }
        }
        doc
    }

    fn params(&self) -> Result<LayerParams> {
        let id = self.id;
        let params = match self.kind {
            LayerKind::Input => LayerParams::Input,
            LayerKind::Flatten => LayerParams::Flatten,
            LayerKind::Convolution => LayerParams::Convolution {
                filters: self.number_of_filters.ok_or_else(|| missing("NumberOfFilters", id))?,
                filter_size: self.filter_size.ok_or_else(|| missing("FilterSize", id))?,
                stride: self.stride.ok_or_else(|| missing("Stride", id))?,
            },
            LayerKind::MaxPool | LayerKind::MinPool => LayerParams::Pool {
                kind: if self.kind == LayerKind::MaxPool { PoolKind::Max } else { PoolKind::Min },
                pool_size: self.pool_size.ok_or_else(|| missing("PoolSize", id))?,
                stride: self.stride.ok_or_else(|| missing("Stride", id))?,
            },
            LayerKind::FullyConnected => LayerParams::FullyConnected {
                units: self.number_of_neurons,
                weights: self.number_of_weights.ok_or_else(|| missing("NumberOfWeights", id))?,
            },
            LayerKind::Output => LayerParams::Output {
                outputs: self.number_of_outputs.ok_or_else(|| missing("NumberOfOutputs", id))?,
                weights: self.number_of_weights.ok_or_else(|| missing("NumberOfWeights", id))?,
            },
        };
        Ok(params)
    }
}

impl NeuronDocument {
    fn from_neuron(neuron: &Neuron) -> NeuronDocument {
        let mut doc = NeuronDocument {
            id: neuron.id,
            kind: neuron.kind(),
            activation: neuron.activation,
            filter: None,
            weights: None,
            bias: None,
        };
        match &neuron.params {
            NeuronParams::Convolution(unit) => {
                doc.filter = Some(unit.filter.data.clone());
                doc.bias = Some(unit.bias);
            }
            NeuronParams::FullyConnected(unit) | NeuronParams::Output(unit) => {
                doc.weights = Some(unit.weights.clone());
                doc.bias = Some(unit.bias);
            }
            NeuronParams::Input | NeuronParams::Pool(_) | NeuronParams::Flatten => {}
        }
        doc
    }

    /// Rebuilds the neuron with fresh (zero) momentum state.
    fn into_neuron(self, params: &LayerParams, layer: usize) -> Result<Neuron> {
        let bias = || self.bias.ok_or_else(|| missing("Bias", layer));
        let neuron_params = match params {
            LayerParams::Input => NeuronParams::Input,
            LayerParams::Flatten => NeuronParams::Flatten,
            LayerParams::Pool { kind, pool_size, stride } => NeuronParams::Pool(PoolUnit::new(*kind, *pool_size, *stride)),
            LayerParams::Convolution { filter_size, stride, .. } => {
                let filter = Matrix::from_data(self.filter.clone().ok_or_else(|| missing("Filter", layer))?);
                if filter.rows != *filter_size || filter.cols != *filter_size {
                    return Err(NetworkError::Persistence(format!(
                        "filter of neuron {} in layer {layer} is {}x{}, expected {filter_size}x{filter_size}",
                        self.id, filter.rows, filter.cols
                    )));
                }
                NeuronParams::Convolution(ConvolutionUnit::with_parameters(*filter_size, *stride, filter, bias()?))
            }
            LayerParams::FullyConnected { weights, .. } | LayerParams::Output { weights, .. } => {
                let values = self.weights.clone().ok_or_else(|| missing("Weights", layer))?;
                if values.len() != *weights {
                    return Err(NetworkError::Persistence(format!(
                        "neuron {} in layer {layer} has {} weights, expected {weights}",
                        self.id,
                        values.len()
                    )));
                }
                let unit = DenseUnit::with_parameters(values, bias()?);
                if matches!(params, LayerParams::Output { .. }) {
                    NeuronParams::Output(unit)
                } else {
                    NeuronParams::FullyConnected(unit)
                }
            }
        };
        Ok(Neuron::new(self.id, self.activation, neuron_params))
    }
}

fn write_document<W: Write + Seek, T: Serialize>(
    zip: &mut ZipWriter<W>,
    name: String,
    doc: &T,
    options: SimpleFileOptions,
) -> Result<()> {
    zip.start_file(name, options)?;
    serde_json::to_writer_pretty(&mut *zip, doc)?;
    Ok(())
}

fn read_document<R: Read + Seek, T: DeserializeOwned>(archive: &mut ZipArchive<R>, name: &str) -> Result<T> {
    let file = archive.by_name(name)?;
    Ok(serde_json::from_reader(file)?)
}

/// Writes `<dir>/<reference>.zip`, creating `dir` if needed.
pub fn save_network(network: &Network, dir: &Path, reference: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{reference}.zip"));
    let file = File::create(&path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let ctx = network.context();
    let header = NetworkDocument {
        learning_rate: ctx.learning_rate,
        momentum: ctx.momentum,
        maximum_initial_weight: ctx.max_initial_weight,
        labels: network.labels().labels().to_vec(),
        number_of_layers: network.layers().len(),
    };
    write_document(&mut zip, NETWORK_FILE.to_string(), &header, options)?;

    for (index, layer) in network.layers().iter().enumerate() {
        write_document(&mut zip, layer_path(index), &LayerDocument::from_layer(layer), options)?;
        for (j, neuron) in layer.neurons.iter().enumerate() {
            write_document(&mut zip, neuron_path(index, j), &NeuronDocument::from_neuron(neuron), options)?;
        }
    }

    zip.finish()?;
    info!(path = %path.display(), layers = network.layers().len(), "Saved network");
    Ok(path)
}

/// Reads an archive written by [`save_network`]. The restored network is
/// unvalidated and its momentum state is zero.
pub fn load_network(path: &Path) -> Result<Network> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;

    let header: NetworkDocument = read_document(&mut archive, NETWORK_FILE)?;
    let context = TrainingContext::new(header.learning_rate, header.momentum, header.maximum_initial_weight);
    let mut network = Network::new(context).with_labels(LabelMap::new(header.labels));

    for index in 0..header.number_of_layers {
        let doc: LayerDocument = read_document(&mut archive, &layer_path(index))?;
        let params = doc.params()?;

        let mut neurons = Vec::with_capacity(doc.number_of_neurons);
        for j in 0..doc.number_of_neurons {
            let neuron_doc: NeuronDocument = read_document(&mut archive, &neuron_path(index, j))?;
            if neuron_doc.kind != doc.kind {
                return Err(NetworkError::Persistence(format!(
                    "neuron {j} in layer {index} is of type \"{}\" in a \"{}\" layer",
                    neuron_doc.kind, doc.kind
                )));
            }
            neurons.push(neuron_doc.into_neuron(&params, index)?);
        }

        debug!(layer = index, kind = %doc.kind, neurons = neurons.len(), "Restored layer");
        let layer = Layer::from_parts(
            doc.id,
            doc.activation,
            Shape::from_array(doc.input_size),
            Shape::from_array(doc.output_size),
            params,
            neurons,
        );
        network.push_layer(layer)?;
    }

    info!(path = %path.display(), layers = header.number_of_layers, "Loaded network");
    Ok(network)
}
