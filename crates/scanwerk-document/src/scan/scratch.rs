// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-detector scratch arena: one float allocation sliced into the regions a
// detection pass needs, reused across calls so preview loops stay free of
// allocator churn.

/// Disjoint views into the arena for one detection pass.
pub struct Regions<'a> {
    /// Reduced (and possibly downscaled) channel.
    pub intensity: &'a mut [f32],
    /// Smoothed channel.
    pub blurred: &'a mut [f32],
    /// Unspread per-pixel gradient magnitude.
    pub gradient: &'a mut [f32],
    /// Hough accumulator, `num_bins x 256`.
    pub accumulator: &'a mut [f32],
    /// Full-resolution channel used only when downscaling.
    pub full: &'a mut Vec<f32>,
}

#[derive(Debug, Default)]
pub struct Scratch {
    buf: Vec<f32>,
    full: Vec<f32>,
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Floats currently reserved by the arena.
    pub fn capacity(&self) -> usize {
        self.buf.capacity() + self.full.capacity()
    }

    /// Zeroed regions for a `pixels`-sized field and an `accumulator`-sized
    /// vote array. The backing buffer only ever grows.
    pub fn regions(&mut self, pixels: usize, accumulator: usize) -> Regions<'_> {
        let total = pixels * 3 + accumulator;
        if self.buf.len() < total {
            self.buf.resize(total, 0.0);
        }
        let used = &mut self.buf[..total];
        used.fill(0.0);
        let (intensity, rest) = used.split_at_mut(pixels);
        let (blurred, rest) = rest.split_at_mut(pixels);
        let (gradient, accumulator) = rest.split_at_mut(pixels);
        Regions {
            intensity,
            blurred,
            gradient,
            accumulator,
            full: &mut self.full,
        }
    }
}
