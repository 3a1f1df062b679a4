// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Projective rectification: resample a quadrilateral region of a raster into
// an axis-aligned image.

use rayon::prelude::*;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::{Quad, RectifyConfig};
use tracing::{debug, instrument};

use super::homography::Homography;
use crate::image::raster::RgbaRaster;

/// Quads below this area (px²) are rejected as degenerate.
const MIN_AREA: f32 = 1.0;

/// Output size for `quad`: the mean lengths of opposite sides, with the
/// longer side scaled to `max_output_dimension` (or only clamped to it when
/// upscaling is off). Width pairs with `bc`/`da`, height with `ab`/`cd`.
pub fn output_dimensions(quad: &Quad, config: &RectifyConfig) -> (usize, usize) {
    let height = quad.ab_cd_length() as f64 * 0.5;
    let width = quad.bc_da_length() as f64 * 0.5;
    let long = width.max(height);
    if !(long > 0.0) {
        return (1, 1);
    }
    let max = config.max_output_dimension as f64;
    let target = if config.allow_upscale { max } else { long.min(max) };
    let scale = target / long;
    let side = |len: f64| ((len * scale).round() as usize).max(1);
    (side(width), side(height))
}

/// Bilinear sample at `(x, y)` with neighbours clamped to the raster, or
/// black when the point is more than a pixel outside it.
#[inline]
fn sample(src: &RgbaRaster, x: f64, y: f64) -> [u8; 4] {
    let (w, h) = (src.width() as i64, src.height() as i64);
    let (xf, yf) = (x.floor(), y.floor());
    if !(xf >= -1.0 && xf < w as f64 && yf >= -1.0 && yf < h as f64) {
        return [0, 0, 0, 255];
    }
    let (x0, y0) = (xf as i64, yf as i64);
    let (tx, ty) = (x - xf, y - yf);
    let cx = |v: i64| v.clamp(0, w - 1) as usize;
    let cy = |v: i64| v.clamp(0, h - 1) as usize;
    let (xa, xb, ya, yb) = (cx(x0), cx(x0 + 1), cy(y0), cy(y0 + 1));

    let data = src.as_bytes();
    let stride = src.width() * 4;
    let (tl, tr) = (ya * stride + xa * 4, ya * stride + xb * 4);
    let (bl, br) = (yb * stride + xa * 4, yb * stride + xb * 4);
    let mut out = [0, 0, 0, 255];
    for c in 0..3 {
        let top = data[tl + c] as f64 * (1.0 - tx) + data[tr + c] as f64 * tx;
        let bottom = data[bl + c] as f64 * (1.0 - tx) + data[br + c] as f64 * tx;
        out[c] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Rectify `quad` of `raster` into an upright image.
///
/// Corner `a` lands at the output's bottom-left, `b` top-left, `c` top-right
/// and `d` bottom-right. A counter-clockwise quad is rewound first so the
/// output is never mirrored.
#[instrument(skip(raster), fields(width = raster.width(), height = raster.height()))]
pub fn rectify_with(raster: &RgbaRaster, quad: &Quad, config: &RectifyConfig) -> Result<RgbaRaster> {
    if !quad.is_finite() {
        return Err(ScanwerkError::InvalidInput(format!(
            "quad has non-finite corners: {quad:?}"
        )));
    }
    if config.max_output_dimension == 0 {
        return Err(ScanwerkError::InvalidInput(
            "max_output_dimension must be at least 1".into(),
        ));
    }
    let area = quad.area();
    if area < MIN_AREA {
        return Err(ScanwerkError::DegenerateQuad { area });
    }
    let quad = if quad.signed_area() < 0.0 {
        Quad::new(quad.a, quad.d, quad.c, quad.b)
    } else {
        *quad
    };

    let (out_w, out_h) = output_dimensions(&quad, config);
    let target = Quad::rect(out_w as f32, out_h as f32);
    let projection =
        Homography::from_quads(&target, &quad).ok_or(ScanwerkError::DegenerateQuad { area })?;
    debug!(out_w, out_h, "Rectifying");

    let mut data = vec![0u8; out_w * out_h * 4];
    data.par_chunks_mut(out_w * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let (sx, sy) = projection.apply(x as f64, y as f64);
                px.copy_from_slice(&sample(raster, sx, sy));
            }
        });
    RgbaRaster::new(out_w, out_h, data)
}

/// Rectify with the longer output side scaled to `max_output_dimension`.
pub fn rectify(raster: &RgbaRaster, quad: &Quad, max_output_dimension: u32) -> Result<RgbaRaster> {
    rectify_with(
        raster,
        quad,
        &RectifyConfig {
            max_output_dimension,
            allow_upscale: true,
        },
    )
}
