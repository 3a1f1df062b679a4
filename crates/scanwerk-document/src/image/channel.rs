// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Channel reduction: RGBA8 to a single float channel in [0, 1], with optional
// area-averaging downscale.
//
// Point sampling aliases shallow-angle document edges into staircases the line
// detector cannot follow, so every destination pixel integrates the exact
// (fractional) source area it covers.

use scanwerk_core::ChannelMode;

use super::raster::{IntensityField, RgbaRaster};

const LUMA_R: f32 = 0.299 / 255.0;
const LUMA_G: f32 = 0.587 / 255.0;
const LUMA_B: f32 = 0.114 / 255.0;
const CHANNEL_SCALE: f32 = 1.0 / 255.0;

/// Destination size for a downscale by `by`: `floor(width / by) x floor(height / by)`.
pub fn scaled_dimensions(width: usize, height: usize, by: f32) -> (usize, usize) {
    if by <= 1.0 {
        return (width, height);
    }
    let by = by as f64;
    (
        (width as f64 / by).floor() as usize,
        (height as f64 / by).floor() as usize,
    )
}

/// Write the selected channel of every pixel into `dst` (full resolution).
pub fn channel_into(raster: &RgbaRaster, mode: ChannelMode, dst: &mut [f32]) {
    debug_assert_eq!(dst.len(), raster.width() * raster.height());
    let pixels = raster.as_bytes().chunks_exact(4);
    match mode {
        ChannelMode::Luminance => {
            for (out, px) in dst.iter_mut().zip(pixels) {
                *out = px[0] as f32 * LUMA_R + px[1] as f32 * LUMA_G + px[2] as f32 * LUMA_B;
            }
        }
        ChannelMode::Red | ChannelMode::Green | ChannelMode::Blue => {
            let channel = match mode {
                ChannelMode::Red => 0,
                ChannelMode::Green => 1,
                _ => 2,
            };
            for (out, px) in dst.iter_mut().zip(pixels) {
                *out = px[channel] as f32 * CHANNEL_SCALE;
            }
        }
    }
}

/// Source rows (or columns) covered by destination index `index`.
struct Span {
    /// Partially covered leading source index.
    first: usize,
    /// First fully covered source index.
    start: usize,
    /// Partially covered trailing source index (exclusive end of full coverage).
    end: usize,
    /// Coverage of `first`.
    head: f32,
    /// Coverage of `end`.
    tail: f32,
}

impl Span {
    fn new(index: usize, by: f32) -> Self {
        let lo = index as f32 * by;
        let hi = lo + by;
        let first = lo as usize;
        let start = first + 1;
        let end = hi as usize;
        Self {
            first,
            start,
            end,
            head: start as f32 - lo,
            tail: hi - end as f32,
        }
    }
}

/// Area-averaging downscale of `src` (`width x height`) into `dst`.
///
/// Interior destination pixels are exact area averages, summed in `f64`. The
/// outermost ring is copied from its inner neighbour. Requires both
/// destination sides to be at least 3 pixels.
pub fn downscale_into(src: &[f32], width: usize, height: usize, by: f32, dst: &mut [f32]) {
    let (dw, dh) = scaled_dimensions(width, height, by);
    debug_assert!(dw >= 3 && dh >= 3, "downscale target {dw}x{dh} too small");
    debug_assert_eq!(src.len(), width * height);
    debug_assert_eq!(dst.len(), dw * dh);

    let inv_area = 1.0 / (by as f64 * by as f64);
    let (mi, mj) = (dh - 1, dw - 1);
    let cols: Vec<Span> = (0..dw).map(|j| Span::new(j, by)).collect();

    for i in 1..mi {
        let rows = Span::new(i, by);
        let first_row = &src[rows.first * width..(rows.first + 1) * width];
        let last_row = &src[rows.end * width..(rows.end + 1) * width];
        let (r_head, r_tail) = (rows.head as f64, rows.tail as f64);
        for j in 1..mj {
            let c = &cols[j];
            let (c_head, c_tail) = (c.head as f64, c.tail as f64);
            let mut sum = 0.0f64;
            for rsi in rows.start..rows.end {
                let row = &src[rsi * width..(rsi + 1) * width];
                sum += row[c.start..c.end].iter().map(|&v| v as f64).sum::<f64>();
                sum += row[c.first] as f64 * c_head + row[c.end] as f64 * c_tail;
            }
            for rsj in c.start..c.end {
                sum += first_row[rsj] as f64 * r_head + last_row[rsj] as f64 * r_tail;
            }
            sum += first_row[c.first] as f64 * r_head * c_head;
            sum += first_row[c.end] as f64 * r_head * c_tail;
            sum += last_row[c.first] as f64 * r_tail * c_head;
            sum += last_row[c.end] as f64 * r_tail * c_tail;
            dst[i * dw + j] = (sum * inv_area) as f32;
        }
    }

    for i in 1..mi {
        let base = i * dw;
        dst[base] = dst[base + 1];
        dst[base + mj] = dst[base + mj - 1];
    }
    let (top, rest) = dst.split_at_mut(dw);
    top.copy_from_slice(&rest[..dw]);
    let last = mi * dw;
    dst.copy_within(last - dw..last, last);
}

/// Reduce `raster` to one channel, downscaling by `by` when `by > 1`.
///
/// `full` is scratch for the full-resolution channel; it is resized as needed
/// and only touched when downscaling.
pub fn reduce_into(
    raster: &RgbaRaster,
    mode: ChannelMode,
    by: f32,
    full: &mut Vec<f32>,
    dst: &mut [f32],
) {
    if by <= 1.0 {
        channel_into(raster, mode, dst);
        return;
    }
    let (w, h) = (raster.width(), raster.height());
    full.resize(w * h, 0.0);
    channel_into(raster, mode, full);
    downscale_into(full, w, h, by, dst);
}

/// Allocating convenience wrapper around [`reduce_into`].
pub fn reduce(raster: &RgbaRaster, mode: ChannelMode, by: f32) -> IntensityField {
    let (w, h) = scaled_dimensions(raster.width(), raster.height(), by);
    let mut field = IntensityField::new(w, h);
    let mut full = Vec::new();
    reduce_into(raster, mode, by, &mut full, &mut field.data);
    field
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster_from_fn(w: usize, h: usize, f: impl Fn(usize, usize) -> [u8; 4]) -> RgbaRaster {
        let mut r = RgbaRaster::from_pixel(w, h, [0, 0, 0, 255]).unwrap();
        for y in 0..h {
            for x in 0..w {
                r.put_pixel(x, y, f(x, y));
            }
        }
        r
    }

    #[test]
    fn luminance_spans_unit_range() {
        let r = raster_from_fn(2, 1, |x, _| if x == 0 { [0, 0, 0, 255] } else { [255; 4] });
        let field = reduce(&r, ChannelMode::Luminance, 1.0);
        assert!(field.data[0].abs() < 1e-6);
        assert!((field.data[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn single_channel_extraction() {
        let r = RgbaRaster::from_pixel(2, 2, [51, 102, 204, 255]).unwrap();
        let blue = reduce(&r, ChannelMode::Blue, 1.0);
        assert!(blue.data.iter().all(|&v| (v - 0.8).abs() < 1e-6));
        let red = reduce(&r, ChannelMode::Red, 1.0);
        assert!(red.data.iter().all(|&v| (v - 0.2).abs() < 1e-6));
    }

    #[test]
    fn scaled_dimensions_floor() {
        assert_eq!(scaled_dimensions(1000, 1400, 1000.0 / 360.0), (360, 504));
        assert_eq!(scaled_dimensions(100, 50, 3.0), (33, 16));
        assert_eq!(scaled_dimensions(100, 50, 1.0), (100, 50));
    }

    #[test]
    fn uniform_field_stays_uniform() {
        let src = vec![0.4f32; 100 * 80];
        let (dw, dh) = scaled_dimensions(100, 80, 2.5);
        let mut dst = vec![0.0; dw * dh];
        downscale_into(&src, 100, 80, 2.5, &mut dst);
        assert!(dst.iter().all(|&v| (v - 0.4).abs() < 1e-5), "{dst:?}");
    }

    #[test]
    fn area_average_preserves_energy() {
        let (w, h) = (120usize, 90usize);
        let by = 2.5f32;
        let src: Vec<f32> = (0..w * h)
            .map(|p| ((p % w) as f32 + (p / w) as f32) / (w + h) as f32)
            .collect();
        let (dw, dh) = scaled_dimensions(w, h, by);
        let mut dst = vec![0.0; dw * dh];
        downscale_into(&src, w, h, by, &mut dst);

        let src_sum: f64 = src.iter().map(|&v| v as f64).sum();
        let dst_sum: f64 = dst.iter().map(|&v| v as f64).sum::<f64>() * (by * by) as f64;
        let rel = (src_sum - dst_sum).abs() / src_sum;
        assert!(rel < 0.01, "energy drifted by {rel}");
    }

    #[test]
    fn interior_pixel_is_exact_area_average() {
        // Vertical stripe one source column wide at x = 5; a factor-2.5 cell
        // covering [5, 7.5) sees it at full weight.
        let (w, h) = (20usize, 20usize);
        let src: Vec<f32> = (0..w * h).map(|p| if p % w == 5 { 1.0 } else { 0.0 }).collect();
        let (dw, dh) = scaled_dimensions(w, h, 2.5);
        let mut dst = vec![0.0; dw * dh];
        downscale_into(&src, w, h, 2.5, &mut dst);
        // Cell j = 2 spans [5, 7.5): one of 2.5 columns lit.
        assert!((dst[3 * dw + 2] - 0.4).abs() < 1e-5, "{}", dst[3 * dw + 2]);
        // Cell j = 1 spans [2.5, 5): untouched.
        assert!(dst[3 * dw + 1].abs() < 1e-6);
    }

    #[test]
    fn reduce_with_scale_matches_dimensions() {
        let r = raster_from_fn(50, 40, |x, y| [(x * 5) as u8, (y * 6) as u8, 0, 255]);
        let field = reduce(&r, ChannelMode::Luminance, 2.0);
        assert_eq!((field.width, field.height), (25, 20));
        assert_eq!(field.data.len(), 25 * 20);
    }
}
