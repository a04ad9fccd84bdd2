pub mod image;
pub mod manifest;

use std::collections::HashMap;

use crate::error::{NetworkError, Result};
use crate::math::matrix::Matrix;

pub use self::image::ImageDirectory;
pub use manifest::{load_manifest, parse_manifest, Example, DEFAULT_SKIP_SUFFIX};

/// Supplies the per-channel grids of a named example.
pub trait ExampleSource {
    fn load(&self, name: &str) -> Result<Vec<Matrix>>;
}

impl ExampleSource for HashMap<String, Vec<Matrix>> {
    fn load(&self, name: &str) -> Result<Vec<Matrix>> {
        self.get(name).cloned().ok_or_else(|| NetworkError::ExampleUnavailable {
            name: name.to_string(),
            reason: "no such example".to_string(),
        })
    }
}
