// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner canonicalisation.

use scanwerk_core::Quad;

/// Reorder corners so that `a` is bottom-left, `b` top-left, `c` top-right
/// and `d` bottom-right, running clockwise on screen.
///
/// The longer pair of opposite sides is taken as the document's height, so a
/// landscape page comes out in portrait reading order rotated a quarter turn.
/// Idempotent: a canonical quad is returned unchanged.
pub fn canonicalize(quad: Quad) -> Quad {
    let mut q = quad;
    if q.signed_area() < 0.0 {
        q = Quad::new(q.a, q.d, q.c, q.b);
    }
    if q.bc_da_length() > q.ab_cd_length() {
        q = Quad::new(q.b, q.c, q.d, q.a);
    }
    if q.a.x + q.b.x > q.c.x + q.d.x {
        q = Quad::new(q.c, q.d, q.a, q.b);
    }
    q
}
