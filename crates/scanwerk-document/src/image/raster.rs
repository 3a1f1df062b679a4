// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster buffers: the RGBA8 frames the pipeline consumes and produces, and
// the single-channel float fields the detector works on. Conversions to and
// from the `image` crate live here too.

use image::{DynamicImage, RgbaImage};
use scanwerk_core::error::{Result, ScanwerkError};

/// Row-major RGBA8 raster, origin top-left.
///
/// Invariant: `data.len() == width * height * 4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaRaster {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl RgbaRaster {
    /// Wrap an RGBA8 buffer, checking it matches the dimensions.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ScanwerkError::InvalidInput(format!(
                "raster dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let expected = width
            .checked_mul(height)
            .and_then(|px| px.checked_mul(4))
            .ok_or_else(|| {
                ScanwerkError::InvalidInput(format!("raster {width}x{height} overflows"))
            })?;
        if data.len() != expected {
            return Err(ScanwerkError::InvalidInput(format!(
                "RGBA buffer holds {} bytes, {width}x{height} needs {expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Raster filled with one colour. Zero dimensions are `InvalidInput`.
    pub fn from_pixel(width: usize, height: usize, rgba: [u8; 4]) -> Result<Self> {
        let len = width
            .checked_mul(height)
            .and_then(|px| px.checked_mul(4))
            .ok_or_else(|| {
                ScanwerkError::InvalidInput(format!("raster {width}x{height} overflows"))
            })?;
        Self::new(width, height, rgba.repeat(len / 4))
    }

    /// Convert any decoded image, expanding to RGBA8 if necessary.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        Self::try_from(image.into_rgba8())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let base = (y * self.width + x) * 4;
        [
            self.data[base],
            self.data[base + 1],
            self.data[base + 2],
            self.data[base + 3],
        ]
    }

    pub fn put_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let base = (y * self.width + x) * 4;
        self.data[base..base + 4].copy_from_slice(&rgba);
    }

    /// Drop the alpha channel, producing packed RGB8.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.width * self.height * 3);
        for px in self.data.chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
        }
        rgb
    }
}

impl TryFrom<RgbaImage> for RgbaRaster {
    type Error = ScanwerkError;

    fn try_from(image: RgbaImage) -> Result<Self> {
        let (w, h) = image.dimensions();
        Self::new(w as usize, h as usize, image.into_raw())
    }
}

impl TryFrom<RgbaRaster> for RgbaImage {
    type Error = ScanwerkError;

    fn try_from(raster: RgbaRaster) -> Result<Self> {
        let (w, h) = (raster.width as u32, raster.height as u32);
        RgbaImage::from_raw(w, h, raster.data).ok_or_else(|| {
            ScanwerkError::ImageError(format!("cannot wrap {w}x{h} raster as an RgbaImage"))
        })
    }
}

/// Row-major single-channel float field.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityField {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl IntensityField {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }
}
