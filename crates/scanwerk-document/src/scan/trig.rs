// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cosine/sine lookup over the 256 Hough angle buckets covering [0, π).

use std::f64::consts::PI;
use std::sync::OnceLock;

/// Number of angle buckets in the Hough accumulator.
pub const ANGLE_BUCKETS: usize = 256;

/// Buckets per radian.
pub const BUCKETS_PER_RAD: f32 = (ANGLE_BUCKETS as f64 / PI) as f32;

/// Immutable `cos`/`sin` table, built once on first use.
#[derive(Debug)]
pub struct TrigTable {
    cos: [f32; ANGLE_BUCKETS],
    sin: [f32; ANGLE_BUCKETS],
}

static TABLE: OnceLock<TrigTable> = OnceLock::new();

impl TrigTable {
    /// Shared table instance.
    pub fn get() -> &'static TrigTable {
        TABLE.get_or_init(Self::build)
    }

    fn build() -> Self {
        let mut cos = [0.0f32; ANGLE_BUCKETS];
        let mut sin = [0.0f32; ANGLE_BUCKETS];
        for t in 0..ANGLE_BUCKETS {
            let theta = PI * t as f64 / ANGLE_BUCKETS as f64;
            cos[t] = theta.cos() as f32;
            sin[t] = theta.sin() as f32;
        }
        Self { cos, sin }
    }

    #[inline]
    pub fn cos(&self, angle: u8) -> f32 {
        self.cos[angle as usize]
    }

    #[inline]
    pub fn sin(&self, angle: u8) -> f32 {
        self.sin[angle as usize]
    }
}
