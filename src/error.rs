use thiserror::Error;

use crate::layers::LayerKind;
use crate::math::shape::Shape;

/// Every failure the engine can raise.
///
/// Configuration and persistence errors are fatal: the caller is expected to
/// abort. Data errors only concern a single example, which the training,
/// testing and prediction loops log and skip (see [`NetworkError::is_recoverable`]).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("unknown activation: \"{0}\"")]
    UnknownActivation(String),

    #[error("unknown pool type: \"{0}\"")]
    UnknownPoolType(String),

    #[error("invalid layer order: {0}")]
    InvalidLayerOrder(String),

    #[error("output of layer {layer} is invalid: {shape}")]
    InvalidOutputSize { layer: usize, shape: Shape },

    #[error("no termination condition set: need an epoch limit, an error threshold or a duration limit")]
    MissingTerminationCondition,

    #[error("network has not passed the validity check")]
    InvalidNetwork,

    #[error("network has already been validated; no more layers can be added")]
    NetworkSealed,

    #[error("no backpropagation rule routes error from a {from} layer into a {to} layer")]
    NoErrorRoute { from: LayerKind, to: LayerKind },

    #[error("class {class} is out of range for an output layer with {classes} classes")]
    LabelOutOfRange { class: usize, classes: usize },

    #[error("images with {0} channels are not supported")]
    UnsupportedChannels(usize),

    #[error("an entire epoch passed without a single usable example")]
    NoUsableExamples,

    #[error("example \"{name}\" is unavailable: {reason}")]
    ExampleUnavailable { name: String, reason: String },

    #[error("could not read image for example \"{name}\": {source}")]
    Image {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("input does not match the input layer: expected {expected}, got {actual}")]
    InputMismatch { expected: String, actual: String },

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl NetworkError {
    /// True for errors that only invalidate the current example.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NetworkError::ExampleUnavailable { .. }
                | NetworkError::Image { .. }
                | NetworkError::InputMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, NetworkError>;
