// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: raster types, decoding/encoding, channel reduction with
// area-averaging downscale, and Gaussian smoothing.

pub mod channel;
pub mod codec;
pub mod gaussian;
pub mod raster;

pub use channel::{reduce, scaled_dimensions};
pub use gaussian::gaussian;
pub use raster::{IntensityField, RgbaRaster};
