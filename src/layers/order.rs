use std::collections::HashMap;

use super::kind::LayerKind;
use super::layer::Layer;
use crate::error::{NetworkError, Result};

/// The kinds that may sit directly below and directly above one layer kind.
#[derive(Debug, Clone, Default)]
pub struct LayerOrder {
    antecedents: Vec<LayerKind>,
    consequents: Vec<LayerKind>,
}

impl LayerOrder {
    fn new(antecedents: &[LayerKind], consequents: &[LayerKind]) -> Self {
        LayerOrder {
            antecedents: antecedents.to_vec(),
            consequents: consequents.to_vec(),
        }
    }

    pub fn antecedents_contain(&self, kind: LayerKind) -> bool {
        self.antecedents.contains(&kind)
    }

    pub fn consequents_contain(&self, kind: LayerKind) -> bool {
        self.consequents.contains(&kind)
    }
}

/// Adjacency table for every layer kind.
#[derive(Debug, Clone)]
pub struct LayerOrderTable {
    orders: HashMap<LayerKind, LayerOrder>,
}

impl Default for LayerOrderTable {
    fn default() -> Self {
        use LayerKind::*;

        let spatial = [Input, Convolution, MaxPool, MinPool];
        let spatial_next = [Convolution, MaxPool, MinPool, Flatten];

        let mut orders = HashMap::new();
        orders.insert(Input, LayerOrder::new(&[], &spatial_next));
        orders.insert(Convolution, LayerOrder::new(&spatial, &spatial_next));
        orders.insert(MaxPool, LayerOrder::new(&spatial, &spatial_next));
        orders.insert(MinPool, LayerOrder::new(&spatial, &spatial_next));
        orders.insert(Flatten, LayerOrder::new(&spatial, &[FullyConnected, Output]));
        orders.insert(FullyConnected, LayerOrder::new(&[Flatten, FullyConnected], &[FullyConnected, Output]));
        orders.insert(Output, LayerOrder::new(&[Flatten, FullyConnected], &[]));

        LayerOrderTable { orders }
    }
}

impl LayerOrderTable {
    pub fn order(&self, kind: LayerKind) -> &LayerOrder {
        &self.orders[&kind]
    }

    /// True when `lower` may sit directly below `upper`.
    pub fn allows(&self, lower: LayerKind, upper: LayerKind) -> bool {
        self.order(lower).consequents_contain(upper) && self.order(upper).antecedents_contain(lower)
    }

    /// Checks that the stack starts with an input layer, ends with an output
    /// layer, and that every adjacent pair is allowed.
    pub fn check_sequence(&self, kinds: &[LayerKind]) -> Result<()> {
        match kinds.first() {
            Some(LayerKind::Input) => {}
            _ => {
                return Err(NetworkError::InvalidLayerOrder(
                    "first layer in network must be of type \"input\"".into(),
                ))
            }
        }
        if kinds.last() != Some(&LayerKind::Output) {
            return Err(NetworkError::InvalidLayerOrder(
                "last layer in network must be of type \"output\"".into(),
            ));
        }

        for pair in kinds.windows(2) {
            if !self.allows(pair[0], pair[1]) {
                return Err(NetworkError::InvalidLayerOrder(format!(
                    "layer of type \"{}\" cannot precede layer of type \"{}\"",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(())
    }
}

/// Full validity check over a built stack: ordering first, then every
/// computed output shape must be strictly positive.
pub fn check_layers(layers: &[Layer]) -> Result<()> {
    let kinds: Vec<LayerKind> = layers.iter().map(Layer::kind).collect();
    LayerOrderTable::default().check_sequence(&kinds)?;

    for (index, layer) in layers.iter().enumerate() {
        if !layer.output_shape().is_valid() {
            return Err(NetworkError::InvalidOutputSize {
                layer: index,
                shape: layer.output_shape(),
            });
        }
    }
    Ok(())
}
