// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.
//
// Every numeric constant of the detector is exposed here; the defaults are the
// tuned values the pipeline ships with.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanwerkError};
use crate::types::PaperSize;

/// Which source quantity feeds the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMode {
    /// Perceptual luminance (Rec.601 weights).
    #[default]
    Luminance,
    Red,
    Green,
    Blue,
}

/// How far the frame is downscaled before detection.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    /// Derive the factor from the frame width (see `DetectorConfig::scale_factor`).
    #[default]
    Auto,
    /// Use this factor; values below 1 are treated as 1.
    Fixed(f32),
}

/// Tunables for document detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub channel: ChannelMode,
    pub scale: ScaleMode,
    /// Width the auto scale mode aims for.
    pub auto_target_width: f32,
    /// Auto factors below this are replaced by 1 (no downscaling).
    pub auto_min_factor: f32,
    /// Auto factors are capped here.
    pub auto_max_factor: f32,
    /// Threshold relaxation attempts before giving up.
    pub max_attempts: usize,
    /// First threshold as a fraction of the accumulator maximum.
    pub initial_threshold_ratio: f32,
    /// Gradient magnitude is `(sx² + sy²)^gradient_exponent` (0.5 = hypot).
    pub gradient_exponent: f32,
    /// Angular vote spreading radius in buckets (out of 256).
    pub angle_spread: u8,
    /// Clustering radius as a fraction of the bin and angle ranges.
    pub hough_match_ratio: f32,
    /// Maximum lines handed to the quadrilateral search.
    pub max_lines: usize,
    /// Normalised squared radius of the corner ellipse (0.5 = inscribed).
    pub corner_radius_sq: f32,
    /// Edge scores are multiplied by `length^edge_length_exponent`.
    pub edge_length_exponent: f32,
    /// Exponent applied to the summed right-angle errors (negative).
    pub right_angle_exponent: f32,
    /// Exponent applied to the product of line strengths (positive).
    pub line_strength_exponent: f32,
    /// Half-width in working pixels of the band each winning edge is refitted
    /// in. Zero keeps the raw Hough corners.
    pub refine_band: f32,
    /// Fraction of each edge ignored at both ends while refitting.
    pub refine_trim: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            channel: ChannelMode::Luminance,
            scale: ScaleMode::Auto,
            auto_target_width: 360.0,
            auto_min_factor: 2.0,
            auto_max_factor: 5.0,
            max_attempts: 3,
            initial_threshold_ratio: 0.05,
            gradient_exponent: 0.3,
            angle_spread: 32,
            hough_match_ratio: 1.0 / 40.0,
            max_lines: 20,
            corner_radius_sq: 0.55,
            edge_length_exponent: -0.6,
            right_angle_exponent: -0.3,
            line_strength_exponent: 0.1,
            refine_band: 4.0,
            refine_trim: 0.1,
        }
    }
}

impl DetectorConfig {
    /// Downscale factor for a frame of the given width.
    ///
    /// Auto mode uses `width / auto_target_width`, falling back to 1 below
    /// `auto_min_factor` and capping at `auto_max_factor`.
    pub fn scale_factor(&self, width: usize) -> f32 {
        match self.scale {
            ScaleMode::Fixed(by) => by.max(1.0),
            ScaleMode::Auto => {
                let by = width as f32 / self.auto_target_width;
                if by < self.auto_min_factor {
                    1.0
                } else {
                    by.min(self.auto_max_factor)
                }
            }
        }
    }

    /// Reject settings the detector cannot run with.
    pub fn validate(&self) -> Result<()> {
        let bad = |what: &str| Err(ScanwerkError::InvalidInput(format!("detector config: {what}")));
        if self.max_attempts == 0 {
            return bad("max_attempts must be at least 1");
        }
        if !(self.initial_threshold_ratio > 0.0 && self.initial_threshold_ratio < 1.0) {
            return bad("initial_threshold_ratio must lie in (0, 1)");
        }
        if !(self.gradient_exponent > 0.0) {
            return bad("gradient_exponent must be positive");
        }
        if !(self.hough_match_ratio >= 0.0 && self.hough_match_ratio < 0.5) {
            return bad("hough_match_ratio must lie in [0, 0.5)");
        }
        if self.max_lines < 4 {
            return bad("max_lines must be at least 4");
        }
        if !(self.corner_radius_sq > 0.0) {
            return bad("corner_radius_sq must be positive");
        }
        if !(self.auto_target_width > 0.0) || self.auto_max_factor < 1.0 {
            return bad("auto scaling bounds are invalid");
        }
        if !(self.refine_band >= 0.0 && self.refine_band.is_finite()) {
            return bad("refine_band must be a finite, non-negative width");
        }
        if !(self.refine_trim >= 0.0 && self.refine_trim < 0.5) {
            return bad("refine_trim must lie in [0, 0.5)");
        }
        if let ScaleMode::Fixed(by) = self.scale {
            if !by.is_finite() {
                return bad("fixed scale factor must be finite");
            }
        }
        Ok(())
    }
}

/// Output sizing for rectification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    /// Upper bound for the longer output side, in pixels.
    pub max_output_dimension: u32,
    /// When set, the longer side is scaled to exactly `max_output_dimension`
    /// even if the document is smaller; otherwise it is only clamped.
    pub allow_upscale: bool,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            max_output_dimension: 1224,
            allow_upscale: true,
        }
    }
}

/// How each PDF page is sized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSizing {
    /// Page dimensions equal the image at the given DPI.
    FitImage { dpi: f32 },
    /// Fixed paper size; the image is centred within the margins.
    Paper(PaperSize),
}

/// PDF output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub page_sizing: PageSizing,
    /// Margin in millimetres, used with `PageSizing::Paper`.
    pub margin_mm: f32,
    pub title: String,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            page_sizing: PageSizing::FitImage { dpi: 150.0 },
            margin_mm: 15.0,
            title: "Scanwerk Scan".into(),
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub detector: DetectorConfig,
    pub rectify: RectifyConfig,
    pub pdf: PdfConfig,
}

impl ScanConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.detector.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }
}
