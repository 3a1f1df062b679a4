// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sub-bucket edge refinement.
//
// Hough lines are quantised to 2-pixel bins and 0.7° buckets, and staircased
// edges pull the peak onto the nearest axis. Each edge of the winning quad is
// refitted to the gradient ridge around it with a weighted total least
// squares fit, and the corners are re-intersected.

use scanwerk_core::{Point, Quad};

use super::votes::Votes;

const EPS: f64 = 1e-9;

/// Refinement band and end trimming.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefineParams {
    /// Half-width of the band around each edge, in working pixels. Zero
    /// disables refinement.
    pub band: f32,
    /// Fraction of each edge ignored at both ends, away from the corners
    /// where the neighbouring edge's ridge leaks in.
    pub trim: f32,
}

/// Infinite line through `origin` along unit `dir`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FittedLine {
    origin: [f64; 2],
    dir: [f64; 2],
}

impl FittedLine {
    fn crossing(&self, other: &FittedLine) -> Option<[f64; 2]> {
        let [px, py] = self.origin;
        let [dx, dy] = self.dir;
        let [qx, qy] = other.origin;
        let [ex, ey] = other.dir;
        let den = dx * ey - dy * ex;
        if den.abs() < EPS {
            return None;
        }
        let t = ((qx - px) * ey - (qy - py) * ex) / den;
        Some([px + t * dx, py + t * dy])
    }
}

/// Weighted principal axis of the above-average gradient mass near the
/// segment `p0 -> p1`.
fn fit_edge(votes: &Votes<'_>, p0: Point, p1: Point, params: RefineParams) -> Option<FittedLine> {
    let (x0, y0) = (p0.x as f64, p0.y as f64);
    let (dx, dy) = (p1.x as f64 - x0, p1.y as f64 - y0);
    let length = dx.hypot(dy);
    if length < 1.0 {
        return None;
    }
    let dir = [dx / length, dy / length];
    let normal = [-dir[1], dir[0]];
    let band = params.band as f64;
    let (t_min, t_max) = (params.trim as f64 * length, (1.0 - params.trim as f64) * length);

    let g = &votes.geometry;
    let avg = votes.avg_gradient as f64;
    let clamp_x = |v: f64| v.clamp(0.0, (g.width - 1) as f64) as usize;
    let clamp_y = |v: f64| v.clamp(0.0, (g.height - 1) as f64) as usize;
    let (xa, xb) = (clamp_x(x0.min(x0 + dx) - band), clamp_x(x0.max(x0 + dx) + band));
    let (ya, yb) = (clamp_y(y0.min(y0 + dy) - band), clamp_y(y0.max(y0 + dy) + band));

    let mut samples = Vec::new();
    let (mut sum_w, mut mx, mut my) = (0.0f64, 0.0f64, 0.0f64);
    for y in ya..=yb {
        let row = &votes.gradient[y * g.width..(y + 1) * g.width];
        for x in xa..=xb {
            let (rx, ry) = (x as f64 - x0, y as f64 - y0);
            let along = rx * dir[0] + ry * dir[1];
            let across = rx * normal[0] + ry * normal[1];
            if along < t_min || along > t_max || across.abs() > band {
                continue;
            }
            let w = row[x] as f64 - avg;
            if w <= 0.0 {
                continue;
            }
            samples.push((x as f64, y as f64, w));
            sum_w += w;
            mx += w * x as f64;
            my += w * y as f64;
        }
    }
    if sum_w <= EPS {
        return None;
    }
    mx /= sum_w;
    my /= sum_w;

    let (mut cxx, mut cxy, mut cyy) = (0.0f64, 0.0f64, 0.0f64);
    for &(x, y, w) in &samples {
        let (ex, ey) = (x - mx, y - my);
        cxx += w * ex * ex;
        cxy += w * ex * ey;
        cyy += w * ey * ey;
    }
    let trace = cxx + cyy;
    let spread = (cxx - cyy) * (cxx - cyy) + 4.0 * cxy * cxy;
    let lambda = 0.5 * (trace + spread.max(0.0).sqrt());
    let axis = [cxy, lambda - cxx];
    let norm = axis[0].hypot(axis[1]);
    let dir = if norm > EPS {
        [axis[0] / norm, axis[1] / norm]
    } else if cxx >= cyy {
        [1.0, 0.0]
    } else {
        [0.0, 1.0]
    };
    Some(FittedLine {
        origin: [mx, my],
        dir,
    })
}

/// Refit the four edges of `quad` (working-frame coordinates, perimeter
/// order) and re-intersect them. Falls back to the input when an edge has no
/// support or a corner would move further than twice the band.
pub fn refine_quad(votes: &Votes<'_>, quad: &Quad, params: RefineParams) -> Quad {
    if params.band <= 0.0 {
        return *quad;
    }
    let corners = quad.corners();
    let mut edges = [None; 4];
    for (i, edge) in edges.iter_mut().enumerate() {
        *edge = fit_edge(votes, corners[i], corners[(i + 1) % 4], params);
    }
    let max_shift = 2.0 * params.band;
    let mut refined = corners;
    for i in 0..4 {
        let (Some(before), Some(after)) = (edges[(i + 3) % 4], edges[i]) else {
            return *quad;
        };
        let Some([x, y]) = before.crossing(&after) else {
            return *quad;
        };
        let p = Point::new(x as f32, y as f32);
        if !p.is_finite() || p.distance(corners[i]) > max_shift {
            return *quad;
        }
        refined[i] = p;
    }
    Quad::from_corners(refined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::votes::HoughGeometry;

    fn params() -> RefineParams {
        RefineParams {
            band: 4.0,
            trim: 0.1,
        }
    }

    /// Gradient ridge two pixels wide along a tilted rectangle outline.
    fn ridge(w: usize, h: usize, outline: [Point; 4]) -> Vec<f32> {
        let mut grad = vec![0.0f32; w * h];
        for i in 0..4 {
            let (p, q) = (outline[i], outline[(i + 1) % 4]);
            let steps = (p.distance(q) * 4.0) as usize;
            for s in 0..=steps {
                let t = s as f32 / steps as f32;
                let (x, y) = (p.x + (q.x - p.x) * t, p.y + (q.y - p.y) * t);
                // Spread the sample over its two nearest pixels on each axis.
                for (px, wx) in [(x.floor(), 1.0 - x.fract()), (x.floor() + 1.0, x.fract())] {
                    for (py, wy) in [(y.floor(), 1.0 - y.fract()), (y.floor() + 1.0, y.fract())] {
                        let idx = py as usize * w + px as usize;
                        grad[idx] = grad[idx].max(wx * wy);
                    }
                }
            }
        }
        grad
    }

    #[test]
    fn refit_recovers_tilted_edges() {
        let (w, h) = (200usize, 200usize);
        let truth = [
            Point::new(40.0, 160.0),
            Point::new(44.0, 30.0),
            Point::new(160.0, 26.0),
            Point::new(157.0, 163.0),
        ];
        let grad = ridge(w, h, truth);
        let g = HoughGeometry::new(w, h);
        let acc = vec![0.0; g.accumulator_len()];
        let votes = Votes {
            geometry: g,
            accumulator: &acc,
            gradient: &grad,
            avg_gradient: 0.0,
            max_vote: 0.0,
        };
        // Axis-aligned guess, a couple of pixels off everywhere.
        let guess = Quad::new(
            Point::new(42.0, 162.0),
            Point::new(42.0, 28.0),
            Point::new(158.0, 28.0),
            Point::new(158.0, 162.0),
        );
        let refined = refine_quad(&votes, &guess, params());
        for (got, want) in refined.corners().iter().zip(truth) {
            assert!(got.distance(want) < 1.0, "{got:?} vs {want:?}");
        }
    }

    #[test]
    fn unsupported_edges_keep_the_input() {
        let g = HoughGeometry::new(50, 50);
        let acc = vec![0.0; g.accumulator_len()];
        let grad = vec![0.0; 2500];
        let votes = Votes {
            geometry: g,
            accumulator: &acc,
            gradient: &grad,
            avg_gradient: 0.0,
            max_vote: 0.0,
        };
        let q = Quad::rect(30.0, 30.0);
        assert_eq!(refine_quad(&votes, &q, params()), q);
    }

    #[test]
    fn zero_band_disables_refinement() {
        let g = HoughGeometry::new(10, 10);
        let acc = vec![0.0; g.accumulator_len()];
        let grad = vec![1.0; 100];
        let votes = Votes {
            geometry: g,
            accumulator: &acc,
            gradient: &grad,
            avg_gradient: 0.0,
            max_vote: 0.0,
        };
        let q = Quad::rect(5.0, 5.0);
        let off = RefineParams {
            band: 0.0,
            trim: 0.1,
        };
        assert_eq!(refine_quad(&votes, &q, off), q);
    }
}
