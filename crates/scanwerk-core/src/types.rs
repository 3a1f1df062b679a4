// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core geometric and page types for Scanwerk.

use serde::{Deserialize, Serialize};

/// Image-space coordinate, origin top-left, `y` pointing down.
///
/// Not restricted to the raster bounds: intersection math may produce points
/// outside `[0, width) x [0, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Four corners of a (possibly perspective-distorted) document.
///
/// Corner order depends on where the quad came from. Quads produced by the
/// quadrilateral search are in intersection order; canonicalised quads start
/// at the document's bottom-left corner and run clockwise on screen:
/// `a` bottom-left, `b` top-left, `c` top-right, `d` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quad {
    pub a: Point,
    pub b: Point,
    pub c: Point,
    pub d: Point,
}

impl Quad {
    pub const fn new(a: Point, b: Point, c: Point, d: Point) -> Self {
        Self { a, b, c, d }
    }

    pub fn from_corners([a, b, c, d]: [Point; 4]) -> Self {
        Self { a, b, c, d }
    }

    pub fn corners(&self) -> [Point; 4] {
        [self.a, self.b, self.c, self.d]
    }

    /// Axis-aligned rectangle with `a` at the bottom-left, in canonical order.
    pub fn rect(width: f32, height: f32) -> Self {
        Self {
            a: Point::new(0.0, height),
            b: Point::new(0.0, 0.0),
            c: Point::new(width, 0.0),
            d: Point::new(width, height),
        }
    }

    /// Shoelace area. Positive when the corners run clockwise on screen
    /// (`y` down), negative when counter-clockwise.
    pub fn signed_area(&self) -> f32 {
        let pts = self.corners();
        let mut twice = 0.0f32;
        for i in 0..4 {
            let p = pts[i];
            let q = pts[(i + 1) % 4];
            twice += p.x * q.y - q.x * p.y;
        }
        twice * 0.5
    }

    pub fn area(&self) -> f32 {
        self.signed_area().abs()
    }

    pub fn is_finite(&self) -> bool {
        self.corners().iter().all(Point::is_finite)
    }

    /// Summed lengths of the `ab` and `cd` edges.
    pub fn ab_cd_length(&self) -> f32 {
        self.a.distance(self.b) + self.c.distance(self.d)
    }

    /// Summed lengths of the `bc` and `da` edges.
    pub fn bc_da_length(&self) -> f32 {
        self.b.distance(self.c) + self.d.distance(self.a)
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Tabloid => (279, 432),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_is_clockwise_with_positive_area() {
        let q = Quad::rect(4.0, 3.0);
        assert!((q.signed_area() - 12.0).abs() < 1e-6);
        assert!((q.area() - 12.0).abs() < 1e-6);
    }

    #[test]
    fn reversed_winding_flips_sign() {
        let q = Quad::rect(4.0, 3.0);
        let reversed = Quad::new(q.a, q.d, q.c, q.b);
        assert!(reversed.signed_area() < 0.0);
        assert!((reversed.area() - 12.0).abs() < 1e-6);
    }

    #[test]
    fn edge_sums() {
        let q = Quad::rect(4.0, 3.0);
        assert!((q.ab_cd_length() - 6.0).abs() < 1e-6);
        assert!((q.bc_da_length() - 8.0).abs() < 1e-6);
    }

    #[test]
    fn non_finite_corner_detected() {
        let mut q = Quad::rect(1.0, 1.0);
        assert!(q.is_finite());
        q.c.x = f32::NAN;
        assert!(!q.is_finite());
    }

    #[test]
    fn quad_serializes_as_named_corners() {
        let q = Quad::rect(1.0, 2.0);
        let json = serde_json::to_string(&q).unwrap();
        assert!(json.contains("\"a\":{\"x\":0.0,\"y\":2.0}"));
    }
}
