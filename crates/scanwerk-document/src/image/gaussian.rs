// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// 5x5 Gaussian smoothing ahead of gradient estimation.

use super::raster::IntensityField;

/// Side of the smoothing kernel.
pub const KERNEL_SIDE: usize = 5;

/// Normalised 5x5 Gaussian weights (row-major, sum 1).
#[rustfmt::skip]
const KERNEL: [f32; KERNEL_SIDE * KERNEL_SIDE] = [
    0.01258, 0.02516, 0.03145, 0.02516, 0.01258,
    0.02516, 0.05660, 0.07547, 0.05660, 0.02516,
    0.03145, 0.07547, 0.09434, 0.07547, 0.03145,
    0.02516, 0.05660, 0.07547, 0.05660, 0.02516,
    0.01258, 0.02516, 0.03145, 0.02516, 0.01258,
];

/// Blur `src` (`width x height`) into `dst`.
///
/// Near the border the 5x5 window is shifted inward rather than padded, so it
/// never reads outside the field: the window's top-left corner is clamped to
/// `[0, height - 5] x [0, width - 5]`. Both sides must be at least 5 pixels.
pub fn gaussian_into(src: &[f32], width: usize, height: usize, dst: &mut [f32]) {
    debug_assert!(width >= KERNEL_SIDE && height >= KERNEL_SIDE);
    debug_assert_eq!(src.len(), width * height);
    debug_assert_eq!(dst.len(), width * height);

    let radius = KERNEL_SIDE / 2;
    let max_i = height - KERNEL_SIDE;
    let max_j = width - KERNEL_SIDE;
    for i in 0..height {
        let oi = i.saturating_sub(radius).min(max_i);
        let out_row = &mut dst[i * width..(i + 1) * width];
        for (j, out) in out_row.iter_mut().enumerate() {
            let oj = j.saturating_sub(radius).min(max_j);
            let mut acc = 0.0f32;
            for (mi, weights) in KERNEL.chunks_exact(KERNEL_SIDE).enumerate() {
                let base = (oi + mi) * width + oj;
                let window = &src[base..base + KERNEL_SIDE];
                acc += window
                    .iter()
                    .zip(weights)
                    .map(|(&v, &w)| v * w)
                    .sum::<f32>();
            }
            *out = acc;
        }
    }
}

/// Allocating convenience wrapper around [`gaussian_into`].
pub fn gaussian(field: &IntensityField) -> IntensityField {
    let mut out = IntensityField::new(field.width, field.height);
    gaussian_into(&field.data, field.width, field.height, &mut out.data);
    out
}
