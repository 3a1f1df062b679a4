// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quadrilateral search over the ranked line list.
//
// Three lines that meet in exactly two plausible corners fix three sides of a
// document: one of them is the "middle" side, the other two are opposite each
// other. A fourth line completes the quad when it crosses both opposite sides
// in bounds and misses the middle side. Candidates are scored by how well
// their edges follow real gradients and how close their corners are to right
// angles.

use scanwerk_core::{Point, Quad};

use super::lines::Line;
use super::trig::TrigTable;
use super::votes::{HoughGeometry, Votes};

/// Scoring and containment constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadParams {
    /// Normalised squared radius of the corner ellipse.
    pub corner_radius_sq: f32,
    pub edge_length_exponent: f32,
    pub right_angle_exponent: f32,
    pub line_strength_exponent: f32,
}

/// A candidate quad in working-frame coordinates, corners in construction
/// order, with the four lines that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredQuad {
    pub quad: Quad,
    pub lines: [Line; 4],
    pub score: f32,
}

/// Intersection of two Hough lines, `None` when (nearly) parallel.
///
/// Line `(bin, angle)` is `sin·x + cos·y = offset` in image coordinates,
/// matching the voting convention (`cos` pairs with the row index).
pub fn intersection(geometry: &HoughGeometry, l1: &Line, l2: &Line) -> Option<Point> {
    let trig = TrigTable::get();
    let (a, b) = (trig.sin(l1.angle) as f64, trig.cos(l1.angle) as f64);
    let c = geometry.bin_offset(l1.bin) as f64;
    let (d, e) = (trig.sin(l2.angle) as f64, trig.cos(l2.angle) as f64);
    let f = geometry.bin_offset(l2.bin) as f64;

    let det = a * e - b * d;
    if det.abs() < 1e-9 {
        return None;
    }
    let x = (c * e - b * f) / det;
    let y = (a * f - c * d) / det;
    let p = Point::new(x as f32, y as f32);
    p.is_finite().then_some(p)
}

/// Whether `p` lies inside the (slightly enlarged) ellipse inscribed in the
/// frame.
pub fn in_bounds(geometry: &HoughGeometry, radius_sq: f32, p: Option<Point>) -> bool {
    p.is_some_and(|p| {
        let nx = p.x / geometry.width as f32 - 0.5;
        let ny = p.y / geometry.height as f32 - 0.5;
        nx * nx + ny * ny <= radius_sq
    })
}

/// Pairwise intersections of the line list, computed once per attempt.
struct Crossings {
    n: usize,
    points: Vec<Option<Point>>,
    inside: Vec<bool>,
}

impl Crossings {
    fn new(geometry: &HoughGeometry, radius_sq: f32, lines: &[Line]) -> Self {
        let n = lines.len();
        let mut points = vec![None; n * n];
        let mut inside = vec![false; n * n];
        for i in 0..n {
            for j in i + 1..n {
                let p = intersection(geometry, &lines[i], &lines[j]);
                let ok = in_bounds(geometry, radius_sq, p);
                for idx in [i * n + j, j * n + i] {
                    points[idx] = p;
                    inside[idx] = ok;
                }
            }
        }
        Self { n, points, inside }
    }

    #[inline]
    fn inside(&self, i: usize, j: usize) -> bool {
        self.inside[i * self.n + j]
    }

    #[inline]
    fn point(&self, i: usize, j: usize) -> Option<Point> {
        self.points[i * self.n + j]
    }
}

/// Scores candidates against one attempt's votes.
pub struct QuadScorer<'v, 'a> {
    votes: &'v Votes<'a>,
    params: QuadParams,
}

impl<'v, 'a> QuadScorer<'v, 'a> {
    pub fn new(votes: &'v Votes<'a>, params: QuadParams) -> Self {
        Self { votes, params }
    }

    /// Gradient evidence along one edge.
    ///
    /// Walks the Bresenham path from `from` to `to` (end excluded), summing
    /// the gradient minus the frame average. Pixels outside the frame are
    /// skipped. The sum is normalised by `length^edge_length_exponent`; an
    /// edge through flat regions comes out negative.
    pub fn edge_score(&self, from: Point, to: Point) -> f64 {
        let (mut x, mut y) = (from.x.round() as i64, from.y.round() as i64);
        let (x1, y1) = (to.x.round() as i64, to.y.round() as i64);
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        if dx == 0 && dy == 0 {
            return 0.0;
        }
        let step_x = if x < x1 { 1 } else { -1 };
        let step_y = if y < y1 { 1 } else { -1 };
        let avg = self.votes.avg_gradient as f64;

        let mut err = dx + dy;
        let mut sum = 0.0f64;
        while x != x1 || y != y1 {
            if let Some(g) = self.votes.gradient_at(x, y) {
                sum += g as f64 - avg;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += step_x;
            }
            if e2 <= dx {
                err += dx;
                y += step_y;
            }
        }
        let length = (dx - dy) as f64;
        sum * length.powf(self.params.edge_length_exponent as f64)
    }

    /// Squared sum of the four edge scores. A negative sum counts as zero.
    pub fn quad_score(&self, quad: &Quad) -> f64 {
        let [a, b, c, d] = quad.corners();
        let total = (self.edge_score(a, b)
            + self.edge_score(b, c)
            + self.edge_score(c, d)
            + self.edge_score(d, a))
            .max(0.0);
        total * total
    }

    /// Right-angle and strength term for four lines in perimeter order.
    pub fn line_score(&self, lines: &[Line; 4]) -> f64 {
        let mut angle_err = 0.0f64;
        let mut strength = 1.0f64;
        for (i, line) in lines.iter().enumerate() {
            let next = &lines[(i + 1) % 4];
            let off = (line.angle as i32 - next.angle as i32).abs() - 128;
            let err = (off * off + 1) as f64;
            angle_err += err * err;
            strength *= line.strength as f64;
        }
        angle_err.powf(self.params.right_angle_exponent as f64)
            * strength.powf(self.params.line_strength_exponent as f64)
    }

    fn scored(&self, corners: [Option<Point>; 4], lines: [Line; 4]) -> Option<ScoredQuad> {
        let [a, b, c, d] = corners;
        let quad = Quad::new(a?, b?, c?, d?);
        let score = (self.quad_score(&quad) * self.line_score(&lines)) as f32;
        score.is_finite().then_some(ScoredQuad { quad, lines, score })
    }
}

/// Enumerate and score every quad the line list supports, best first.
pub fn search(votes: &Votes<'_>, lines: &[Line], params: QuadParams) -> Vec<ScoredQuad> {
    let geometry = &votes.geometry;
    let crossings = Crossings::new(geometry, params.corner_radius_sq, lines);
    let scorer = QuadScorer::new(votes, params);
    let n = lines.len();
    let mut found = Vec::new();

    for i1 in 0..n {
        for i2 in i1 + 1..n {
            for i3 in i2 + 1..n {
                let i12 = crossings.inside(i1, i2);
                let i13 = crossings.inside(i1, i3);
                let i23 = crossings.inside(i2, i3);
                let p = |i: usize, j: usize| crossings.point(i, j);

                // Pick which line is the middle side, plus the pattern the
                // fourth line has to satisfy against lines 1, 2 and 3.
                let shape = match (i12, i13, i23) {
                    // Line 1 is the middle side; 2 and 3 are opposite.
                    (true, true, false) => Some(Middle::First),
                    // Line 2 is the middle side; 1 and 3 are opposite.
                    (true, false, true) => Some(Middle::Second),
                    // Line 3 is the middle side; 1 and 2 are opposite.
                    (false, true, true) => Some(Middle::Third),
                    _ => None,
                };
                let Some(shape) = shape else { continue };

                // The three lowest indices of a quad always form exactly one
                // such pattern, so the fourth side only needs later lines.
                for i4 in i3 + 1..n {
                    let i14 = crossings.inside(i1, i4);
                    let i24 = crossings.inside(i2, i4);
                    let i34 = crossings.inside(i3, i4);
                    let (l1, l2, l3, l4) = (lines[i1], lines[i2], lines[i3], lines[i4]);

                    let candidate = match shape {
                        Middle::First if !i14 && i24 && i34 => scorer.scored(
                            [p(i1, i2), p(i1, i3), p(i3, i4), p(i2, i4)],
                            [l1, l3, l4, l2],
                        ),
                        Middle::Second if !i24 && i14 && i34 => scorer.scored(
                            [p(i1, i2), p(i2, i3), p(i3, i4), p(i1, i4)],
                            [l2, l3, l4, l1],
                        ),
                        Middle::Third if !i34 && i14 && i24 => scorer.scored(
                            [p(i1, i3), p(i2, i3), p(i2, i4), p(i1, i4)],
                            [l3, l2, l4, l1],
                        ),
                        _ => None,
                    };
                    found.extend(candidate);
                }
            }
        }
    }

    found.sort_by(|a, b| b.score.total_cmp(&a.score));
    found
}

/// Which of three lines touches both others in bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Middle {
    First,
    Second,
    Third,
}
