//! Image loading for the example sources.
//!
//! Images are decoded with the `image` crate (PNG/JPEG/BMP/GIF), optionally
//! resized, and split into one grid per channel with pixel values
//! normalised to [0, 1].

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Pixel};

use crate::data::ExampleSource;
use crate::error::{NetworkError, Result};
use crate::math::matrix::Matrix;

/// Reads `<dir>/<name>.<extension>` for every requested example.
#[derive(Debug, Clone)]
pub struct ImageDirectory {
    dir: PathBuf,
    extension: String,
    channels: usize,
    size: Option<(u32, u32)>,
    raw_pixels: bool,
}

impl ImageDirectory {
    /// A PNG directory decoded into `channels` grids (1 luma, 2 luma+alpha,
    /// 3 RGB, 4 RGBA).
    pub fn new(dir: impl Into<PathBuf>, channels: usize) -> Result<Self> {
        if !(1..=4).contains(&channels) {
            return Err(NetworkError::UnsupportedChannels(channels));
        }
        Ok(ImageDirectory {
            dir: dir.into(),
            extension: "png".to_string(),
            channels,
            size: None,
            raw_pixels: false,
        })
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Resizes every image to `width × height` before splitting channels.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    /// Keeps pixel values in 0..=255 instead of scaling them to [0, 1].
    pub fn with_raw_pixels(mut self) -> Self {
        self.raw_pixels = true;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{}", self.extension))
    }

    fn split_channels(&self, img: &DynamicImage) -> Vec<Matrix> {
        match self.channels {
            1 => self.grids(&img.to_luma8()),
            2 => self.grids(&img.to_luma_alpha8()),
            3 => self.grids(&img.to_rgb8()),
            _ => self.grids(&img.to_rgba8()),
        }
    }

    fn grids<I>(&self, buffer: &I) -> Vec<Matrix>
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        let (width, height) = buffer.dimensions();
        let scale = if self.raw_pixels { 1.0 } else { 1.0 / 255.0 };
        let mut grids = vec![Matrix::zeros(height as usize, width as usize); self.channels];

        for (x, y, pixel) in buffer.pixels() {
            for (c, value) in pixel.channels().iter().take(self.channels).enumerate() {
                grids[c].set(y as usize, x as usize, *value as f64 * scale);
            }
        }

        grids
    }
}

impl ExampleSource for ImageDirectory {
    fn load(&self, name: &str) -> Result<Vec<Matrix>> {
        let path = self.path_of(name);
        let img = image::open(&path).map_err(|source| NetworkError::Image {
            name: name.to_string(),
            source,
        })?;
        let img = match self.size {
            Some((width, height)) => img.resize_exact(width, height, FilterType::Lanczos3),
            None => img,
        };
        Ok(self.split_channels(&img))
    }
}
