// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document detection: channel reduction, smoothing, Hough voting, line
// extraction with threshold relaxation, quad search, canonicalisation.

use rayon::prelude::*;
use scanwerk_core::error::Result;
use scanwerk_core::{DetectorConfig, Point, Quad};
use serde::Serialize;
use tracing::{debug, instrument, trace};

use super::canonical::canonicalize;
use super::lines::{ThresholdSchedule, extract};
use super::quad::{self, QuadParams};
use super::refine::{RefineParams, refine_quad};
use super::scratch::Scratch;
use super::votes::{HoughGeometry, VoteParams, accumulate};
use crate::image::channel::{reduce_into, scaled_dimensions};
use crate::image::gaussian::{KERNEL_SIDE, gaussian_into};
use crate::image::raster::RgbaRaster;

/// A located document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    /// Canonical corners in source-raster coordinates.
    pub quad: Quad,
    /// Combined edge and line score of the winning candidate.
    pub score: f32,
    /// Zero-based threshold attempt that produced it.
    pub attempt: usize,
    /// Downscale factor the detector worked at.
    pub scale: f32,
}

/// Map working-frame coordinates back to the source raster. Pixel centres
/// line up: working pixel `i` covers source `[i*by, (i+1)*by)`.
fn to_source(quad: Quad, by: f32) -> Quad {
    if by == 1.0 {
        return quad;
    }
    let map = |p: Point| Point::new((p.x + 0.5) * by - 0.5, (p.y + 0.5) * by - 0.5);
    Quad::new(map(quad.a), map(quad.b), map(quad.c), map(quad.d))
}

/// Reusable detector. Owns its scratch arena, so repeated calls on frames of
/// the same size do not allocate for intermediate buffers.
#[derive(Debug)]
pub struct DocumentDetector {
    config: DetectorConfig,
    scratch: Scratch,
}

impl DocumentDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_validated(config))
    }

    /// Skip validation; for configs already checked by the caller.
    pub(crate) fn with_validated(config: DetectorConfig) -> Self {
        Self {
            config,
            scratch: Scratch::new(),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Locate the document, or `None` when no attempt yields a candidate.
    pub fn detect(&mut self, raster: &RgbaRaster) -> Option<Quad> {
        self.detect_scored(raster).map(|d| d.quad)
    }

    /// Like [`detect`](Self::detect), with the score and attempt reported.
    pub fn detect_scored(&mut self, raster: &RgbaRaster) -> Option<Detection> {
        self.rank(raster, 1).into_iter().next()
    }

    /// Every candidate of the successful attempt, best first.
    pub fn candidates(&mut self, raster: &RgbaRaster) -> Vec<Detection> {
        self.rank(raster, usize::MAX)
    }

    /// Run the pipeline and return up to `keep` refined, canonical
    /// candidates of the first attempt that produced any.
    #[instrument(skip_all, fields(width = raster.width(), height = raster.height()))]
    fn rank(&mut self, raster: &RgbaRaster, keep: usize) -> Vec<Detection> {
        let cfg = &self.config;
        let by = cfg.scale_factor(raster.width()).max(1.0);
        let (w, h) = scaled_dimensions(raster.width(), raster.height(), by);
        if w < KERNEL_SIDE || h < KERNEL_SIDE {
            debug!(w, h, "Frame too small for detection");
            return Vec::new();
        }

        let geometry = HoughGeometry::new(w, h);
        let regions = self
            .scratch
            .regions(geometry.pixels(), geometry.accumulator_len());
        reduce_into(raster, cfg.channel, by, regions.full, regions.intensity);
        gaussian_into(regions.intensity, w, h, regions.blurred);
        let votes = accumulate(
            geometry,
            regions.blurred,
            VoteParams {
                gradient_exponent: cfg.gradient_exponent,
                angle_spread: cfg.angle_spread,
            },
            regions.accumulator,
            regions.gradient,
        );
        debug!(
            scale = by,
            w,
            h,
            max_vote = votes.max_vote,
            avg_gradient = votes.avg_gradient,
            "Votes accumulated"
        );
        if votes.max_vote <= 0.0 {
            return Vec::new();
        }

        let params = QuadParams {
            corner_radius_sq: cfg.corner_radius_sq,
            edge_length_exponent: cfg.edge_length_exponent,
            right_angle_exponent: cfg.right_angle_exponent,
            line_strength_exponent: cfg.line_strength_exponent,
        };
        let refine = RefineParams {
            band: cfg.refine_band,
            trim: cfg.refine_trim,
        };
        let mut schedule = ThresholdSchedule::new(
            votes.max_vote,
            cfg.initial_threshold_ratio,
            cfg.max_attempts,
        );
        while let Some(attempt) = schedule.next() {
            let mut lines = extract(&votes, attempt.threshold, cfg.hough_match_ratio);
            if lines.len() > cfg.max_lines {
                lines.truncate(cfg.max_lines);
                schedule.finish();
            }
            trace!(
                attempt = attempt.index,
                threshold = attempt.threshold,
                lines = lines.len(),
                "Lines extracted"
            );
            if lines.len() < 4 {
                continue;
            }

            let candidates = quad::search(&votes, &lines, params);
            if !candidates.is_empty() {
                debug!(
                    attempt = attempt.index,
                    candidates = candidates.len(),
                    best = candidates[0].score,
                    "Document found"
                );
                return candidates
                    .iter()
                    .take(keep)
                    .map(|c| Detection {
                        quad: canonicalize(to_source(refine_quad(&votes, &c.quad, refine), by)),
                        score: c.score,
                        attempt: attempt.index,
                        scale: by,
                    })
                    .collect();
            }
        }
        debug!("No document found");
        Vec::new()
    }
}

/// One-shot detection with default settings and the given attempt budget.
/// A budget of zero attempts finds nothing.
pub fn detect_document(raster: &RgbaRaster, max_attempts: usize) -> Option<Quad> {
    if max_attempts == 0 {
        return None;
    }
    let config = DetectorConfig {
        max_attempts,
        ..DetectorConfig::default()
    };
    DocumentDetector::with_validated(config).detect(raster)
}

/// Detect documents in many frames in parallel, one detector (and scratch
/// arena) per worker thread. Output order follows input order.
#[instrument(skip_all, fields(frames = rasters.len()))]
pub fn detect_batch(rasters: &[RgbaRaster], config: &DetectorConfig) -> Result<Vec<Option<Detection>>> {
    config.validate()?;
    Ok(rasters
        .par_iter()
        .map_init(
            || DocumentDetector::with_validated(config.clone()),
            |detector, raster| detector.detect_scored(raster),
        )
        .collect())
}
