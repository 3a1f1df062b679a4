// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gradient estimation and Hough voting.
//
// Every interior pixel casts its gradient magnitude into the (distance, angle)
// accumulator, spread over neighbouring angle buckets with a falloff, and the
// unspread magnitude is kept for edge scoring later.

use super::trig::{ANGLE_BUCKETS, BUCKETS_PER_RAD, TrigTable};

/// Accumulator geometry for a `width x height` working frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughGeometry {
    pub width: usize,
    pub height: usize,
    /// Frame diagonal; signed line offsets lie in `[-diag, diag]`.
    pub diag: f32,
    /// Distance bins, each two pixels wide.
    pub num_bins: usize,
}

impl HoughGeometry {
    pub fn new(width: usize, height: usize) -> Self {
        let diag = (width as f32).hypot(height as f32);
        Self {
            width,
            height,
            diag,
            num_bins: diag as usize,
        }
    }

    pub fn pixels(&self) -> usize {
        self.width * self.height
    }

    pub fn accumulator_len(&self) -> usize {
        self.num_bins * ANGLE_BUCKETS
    }

    /// Signed offset of the centre of `bin`.
    pub fn bin_offset(&self, bin: usize) -> f32 {
        2.0 * bin as f32 + 1.0 - self.diag
    }
}

/// Voting output, borrowed from the scratch arena.
#[derive(Debug, Clone, Copy)]
pub struct Votes<'a> {
    pub geometry: HoughGeometry,
    /// `num_bins x 256`, index `bin * 256 + angle`.
    pub accumulator: &'a [f32],
    /// Per-pixel gradient magnitude, zero on the outer ring.
    pub gradient: &'a [f32],
    /// Mean gradient over interior pixels.
    pub avg_gradient: f32,
    /// Largest accumulator cell.
    pub max_vote: f32,
}

impl Votes<'_> {
    #[inline]
    pub fn cell(&self, bin: usize, angle: u8) -> f32 {
        self.accumulator[bin * ANGLE_BUCKETS + angle as usize]
    }

    /// Gradient at `(x, y)`, or `None` outside the frame.
    #[inline]
    pub fn gradient_at(&self, x: i64, y: i64) -> Option<f32> {
        let g = &self.geometry;
        if x < 0 || y < 0 || x >= g.width as i64 || y >= g.height as i64 {
            return None;
        }
        Some(self.gradient[y as usize * g.width + x as usize])
    }
}

/// Squared stencil responses below this are rounding residue, not edges. A
/// one-level step (1/255) blurred by the smoother still responds around 3e-4.
pub const MIN_GRADIENT_SQ: f32 = 1e-6;

/// Voting parameters.
#[derive(Debug, Clone, Copy)]
pub struct VoteParams {
    pub gradient_exponent: f32,
    pub angle_spread: u8,
}

/// Estimate gradients of `field` and fill `accumulator` and `gradient`.
///
/// Both output slices must arrive zeroed. Pixels whose gradient direction is
/// undefined (flat neighbourhoods) record their magnitude but cast no votes.
/// Responses under [`MIN_GRADIENT_SQ`] are recorded as zero, so a uniform
/// frame casts no votes at all.
pub fn accumulate<'a>(
    geometry: HoughGeometry,
    field: &[f32],
    params: VoteParams,
    accumulator: &'a mut [f32],
    gradient: &'a mut [f32],
) -> Votes<'a> {
    let HoughGeometry {
        width: w,
        height: h,
        diag,
        num_bins,
    } = geometry;
    debug_assert_eq!(field.len(), w * h);
    debug_assert_eq!(gradient.len(), w * h);
    debug_assert_eq!(accumulator.len(), geometry.accumulator_len());

    let trig = TrigTable::get();
    let spread = params.angle_spread;
    let weights: Vec<f32> = (0..=spread as u32)
        .map(|off| 1.0 / (off * off + 3) as f32)
        .collect();

    let mut total = 0.0f64;
    let mut max_vote = 0.0f32;

    for i in 1..h.saturating_sub(1) {
        let up = &field[(i - 1) * w..i * w];
        let mid = &field[i * w..(i + 1) * w];
        let down = &field[(i + 1) * w..(i + 2) * w];
        for j in 1..w - 1 {
            let (nw, n, ne) = (up[j - 1], up[j], up[j + 1]);
            let (west, east) = (mid[j - 1], mid[j + 1]);
            let (sw, s, se) = (down[j - 1], down[j], down[j + 1]);

            let sx = 10.0 * (east - west) + 3.0 * (ne + se - nw - sw);
            let sy = 10.0 * (n - s) + 3.0 * (ne + nw - se - sw);
            let energy = sx * sx + sy * sy;
            if energy < MIN_GRADIENT_SQ {
                continue;
            }
            let grad = energy.powf(params.gradient_exponent);
            gradient[i * w + j] = grad;
            total += grad as f64;

            let slope = (sy / sx).atan();
            if slope.is_nan() {
                continue;
            }
            // [-128, 128] then wrapped into 256 buckets.
            let angle = ((slope * BUCKETS_PER_RAD).floor() as i32 + 128) as u8;

            for (off, &weight) in weights.iter().enumerate() {
                let vote = grad * weight;
                let off = off as u8;
                let mut cast = |t: u8| {
                    let rho = trig.cos(t) * i as f32 + trig.sin(t) * j as f32 + diag;
                    let bin = (rho * 0.5) as usize;
                    if bin < num_bins {
                        let cell = &mut accumulator[bin * ANGLE_BUCKETS + t as usize];
                        *cell += vote;
                        max_vote = max_vote.max(*cell);
                    }
                };
                if off == 0 {
                    cast(angle);
                } else {
                    cast(angle.wrapping_add(off));
                    cast(angle.wrapping_sub(off));
                }
            }
        }
    }

    let interior = (w.saturating_sub(2) * h.saturating_sub(2)).max(1);
    Votes {
        geometry,
        accumulator,
        gradient,
        avg_gradient: (total / interior as f64) as f32,
        max_vote,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(field: &[f32], w: usize, h: usize, spread: u8) -> (Vec<f32>, Vec<f32>, f32, f32) {
        let geometry = HoughGeometry::new(w, h);
        let mut acc = vec![0.0; geometry.accumulator_len()];
        let mut grad = vec![0.0; w * h];
        let params = VoteParams {
            gradient_exponent: 0.3,
            angle_spread: spread,
        };
        let votes = accumulate(geometry, field, params, &mut acc, &mut grad);
        let (avg, max) = (votes.avg_gradient, votes.max_vote);
        (acc, grad, avg, max)
    }

    #[test]
    fn geometry_matches_diagonal() {
        let g = HoughGeometry::new(360, 504);
        assert_eq!(g.num_bins, 619);
        assert_eq!(g.accumulator_len(), 619 * 256);
        assert!((g.bin_offset(0) - (1.0 - g.diag)).abs() < 1e-4);
    }

    #[test]
    fn rounding_noise_casts_no_votes() {
        // A uniform field with last-bit jitter, as float downscaling leaves.
        let field: Vec<f32> = (0..30 * 30)
            .map(|p| if (p * 7919) % 13 < 5 { 1.0 } else { 1.0 - 6e-6 })
            .collect();
        let (acc, grad, avg, max) = run(&field, 30, 30, 32);
        assert_eq!(max, 0.0);
        assert_eq!(avg, 0.0);
        assert!(acc.iter().all(|&v| v == 0.0));
        assert!(grad.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn flat_field_casts_no_votes() {
        let field = vec![0.5f32; 20 * 20];
        let (acc, grad, avg, max) = run(&field, 20, 20, 32);
        assert!(acc.iter().all(|&v| v == 0.0));
        assert!(grad.iter().all(|&v| v == 0.0));
        assert_eq!(avg, 0.0);
        assert_eq!(max, 0.0);
    }

    #[test]
    fn horizontal_edge_votes_at_zero_angle() {
        // Rows 0..10 dark, 10..20 bright: a horizontal edge, sx = 0 and the
        // gradient points along -y, so atan(sy/sx) = -π/2, which lands on
        // bucket 0 or wraps to 255 depending on rounding.
        let (w, h) = (30usize, 20usize);
        let field: Vec<f32> = (0..w * h)
            .map(|p| if p / w >= 10 { 1.0 } else { 0.0 })
            .collect();
        let (acc, grad, _, max) = run(&field, w, h, 0);
        assert!(max > 0.0);
        let peak = acc
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| idx)
            .unwrap();
        let angle = peak % ANGLE_BUCKETS;
        assert!(angle == 0 || angle == 255, "peak at bucket {angle}");
        // Outer ring never receives a gradient.
        assert!(grad[..w].iter().all(|&v| v == 0.0));
        assert!(grad[9 * w + 5] > 0.0);
    }

    #[test]
    fn spreading_fills_neighbouring_buckets() {
        let (w, h) = (30usize, 20usize);
        let field: Vec<f32> = (0..w * h)
            .map(|p| if p % w >= 15 { 1.0 } else { 0.0 })
            .collect();
        let (acc, _, _, _) = run(&field, w, h, 4);
        let touched: std::collections::BTreeSet<usize> = acc
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0.0)
            .map(|(idx, _)| idx % ANGLE_BUCKETS)
            .collect();
        // Vertical edge: bucket 128, spread ±4.
        assert_eq!(touched, (124..=132).collect());
    }
}
