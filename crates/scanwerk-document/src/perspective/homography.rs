// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Planar homographies between quadrilaterals.
//
// Each quad is expressed as the image of the projective basis
// (1,0,0), (0,1,0), (0,0,1), (1,1,1) under a 3x3 matrix; the map between two
// quads is `to_basis * adj(from_basis)`. The adjugate stands in for the
// inverse since homogeneous scale is irrelevant.

use scanwerk_core::{Point, Quad};

type Mat3 = [f64; 9];
type Vec3 = [f64; 3];

fn adjugate(m: &Mat3) -> Mat3 {
    [
        m[4] * m[8] - m[5] * m[7],
        m[2] * m[7] - m[1] * m[8],
        m[1] * m[5] - m[2] * m[4],
        m[5] * m[6] - m[3] * m[8],
        m[0] * m[8] - m[2] * m[6],
        m[2] * m[3] - m[0] * m[5],
        m[3] * m[7] - m[4] * m[6],
        m[1] * m[6] - m[0] * m[7],
        m[0] * m[4] - m[1] * m[3],
    ]
}

fn determinant(m: &Mat3) -> f64 {
    m[0] * (m[4] * m[8] - m[5] * m[7]) - m[1] * (m[3] * m[8] - m[5] * m[6])
        + m[2] * (m[3] * m[7] - m[4] * m[6])
}

fn mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [0.0; 9];
    for row in 0..3 {
        for col in 0..3 {
            out[row * 3 + col] = (0..3).map(|k| a[row * 3 + k] * b[k * 3 + col]).sum();
        }
    }
    out
}

fn mul_vec(m: &Mat3, v: Vec3) -> Vec3 {
    [
        m[0] * v[0] + m[1] * v[1] + m[2] * v[2],
        m[3] * v[0] + m[4] * v[1] + m[5] * v[2],
        m[6] * v[0] + m[7] * v[1] + m[8] * v[2],
    ]
}

/// Whether `m` is numerically singular relative to its own magnitude.
fn is_singular(m: &Mat3) -> bool {
    let scale = m.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    let det = determinant(m);
    !det.is_finite() || scale == 0.0 || det.abs() <= 1e-12 * scale * scale * scale
}

/// Matrix sending the projective basis onto the corners of `quad`, or `None`
/// when three of the corners are collinear.
pub fn basis_to_points(quad: &Quad) -> Option<Mat3> {
    let [a, b, c, d] = quad.corners().map(|p| [p.x as f64, p.y as f64]);
    let m = [a[0], b[0], c[0], a[1], b[1], c[1], 1.0, 1.0, 1.0];
    let coeffs = mul_vec(&adjugate(&m), [d[0], d[1], 1.0]);
    let basis = mul(
        &m,
        &[
            coeffs[0], 0.0, 0.0, //
            0.0, coeffs[1], 0.0, //
            0.0, 0.0, coeffs[2],
        ],
    );
    (!is_singular(&basis)).then_some(basis)
}

/// A 3x3 projective transform, row-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    m: Mat3,
}

impl Homography {
    /// The transform taking each corner of `from` to the same corner of `to`.
    pub fn from_quads(from: &Quad, to: &Quad) -> Option<Self> {
        let src = basis_to_points(from)?;
        let dst = basis_to_points(to)?;
        let m = mul(&dst, &adjugate(&src));
        (!is_singular(&m)).then_some(Self { m })
    }

    /// Map `(x, y)`; the result is non-finite on the line at infinity.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [px, py, pw] = mul_vec(&self.m, [x, y, 1.0]);
        (px / pw, py / pw)
    }

    pub fn project(&self, p: Point) -> Point {
        let (x, y) = self.apply(p.x as f64, p.y as f64);
        Point::new(x as f32, y as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        let det = determinant(&self.m);
        if is_singular(&self.m) {
            return None;
        }
        Some(Self {
            m: adjugate(&self.m).map(|v| v / det),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skewed() -> Quad {
        Quad::new(
            Point::new(90.0, 1310.0),
            Point::new(100.0, 150.0),
            Point::new(900.0, 140.0),
            Point::new(910.0, 1300.0),
        )
    }

    fn close(p: Point, q: Point) -> bool {
        p.distance(q) < 1e-3
    }

    #[test]
    fn maps_corners_onto_corners() {
        let from = Quad::rect(800.0, 1160.0);
        let to = skewed();
        let h = Homography::from_quads(&from, &to).unwrap();
        for (src, dst) in from.corners().into_iter().zip(to.corners()) {
            assert!(close(h.project(src), dst), "{src:?} -> {:?}", h.project(src));
        }
    }

    #[test]
    fn inverse_round_trips() {
        let h = Homography::from_quads(&Quad::rect(612.0, 792.0), &skewed()).unwrap();
        let inv = h.inverse().unwrap();
        for corner in skewed().corners() {
            let back = h.project(inv.project(corner));
            assert!(close(back, corner), "{corner:?} -> {back:?}");
        }
        for corner in Quad::rect(612.0, 792.0).corners() {
            assert!(close(inv.project(h.project(corner)), corner));
        }
    }

    #[test]
    fn identical_quads_give_identity_up_to_scale() {
        let q = skewed();
        let h = Homography::from_quads(&q, &q).unwrap();
        let p = Point::new(412.5, 733.25);
        assert!(close(h.project(p), p));
    }

    #[test]
    fn collinear_corners_are_rejected() {
        let flat = Quad::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(30.0, 5.0),
        );
        assert!(basis_to_points(&flat).is_none());
        assert!(Homography::from_quads(&Quad::rect(10.0, 10.0), &flat).is_none());
    }

    #[test]
    fn adjugate_is_scaled_inverse() {
        let m = [2.0, 1.0, 0.0, 0.0, 3.0, 1.0, 1.0, 0.0, 1.0];
        let prod = mul(&m, &adjugate(&m));
        let det = determinant(&m);
        for (i, v) in prod.iter().enumerate() {
            let expected = if i % 4 == 0 { det } else { 0.0 };
            assert!((v - expected).abs() < 1e-12);
        }
    }
}
