use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NetworkError;

/// The closed set of layer (and neuron) kinds.
///
/// Serialised names are the ones used in saved model archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    #[serde(rename = "input")]
    Input,
    #[serde(rename = "conv")]
    Convolution,
    #[serde(rename = "maxPool")]
    MaxPool,
    #[serde(rename = "minPool")]
    MinPool,
    #[serde(rename = "flatten")]
    Flatten,
    #[serde(rename = "fc")]
    FullyConnected,
    #[serde(rename = "output")]
    Output,
}

impl LayerKind {
    pub const ALL: [LayerKind; 7] = [
        LayerKind::Input,
        LayerKind::Convolution,
        LayerKind::MaxPool,
        LayerKind::MinPool,
        LayerKind::Flatten,
        LayerKind::FullyConnected,
        LayerKind::Output,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Input => "input",
            LayerKind::Convolution => "conv",
            LayerKind::MaxPool => "maxPool",
            LayerKind::MinPool => "minPool",
            LayerKind::Flatten => "flatten",
            LayerKind::FullyConnected => "fc",
            LayerKind::Output => "output",
        }
    }

    /// Kinds that carry learnable parameters.
    pub fn is_trainable(&self) -> bool {
        matches!(
            self,
            LayerKind::Convolution | LayerKind::FullyConnected | LayerKind::Output
        )
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which extreme a pooling window keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Max,
    Min,
}

impl PoolKind {
    pub fn layer_kind(&self) -> LayerKind {
        match self {
            PoolKind::Max => LayerKind::MaxPool,
            PoolKind::Min => LayerKind::MinPool,
        }
    }
}

impl FromStr for PoolKind {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" => Ok(PoolKind::Max),
            "min" => Ok(PoolKind::Min),
            other => Err(NetworkError::UnknownPoolType(other.to_string())),
        }
    }
}
