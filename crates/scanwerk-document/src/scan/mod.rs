// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document detection: gradient voting into a Hough accumulator, ranked line
// extraction, and a pruned search for the best-scoring quadrilateral.

pub mod canonical;
pub mod detector;
pub mod lines;
pub mod quad;
pub mod refine;
pub mod scratch;
pub mod trig;
pub mod votes;

pub use canonical::canonicalize;
pub use detector::{Detection, DocumentDetector, detect_batch, detect_document};
pub use lines::Line;
