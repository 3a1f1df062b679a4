// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective correction: quad-to-quad homographies and bilinear resampling.

pub mod homography;
pub mod rectify;

pub use homography::Homography;
pub use rectify::{output_dimensions, rectify, rectify_with};
