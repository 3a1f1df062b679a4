// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-document: document processing for Scanwerk.
//
// Locates a document in a camera frame (Hough line voting and a scored
// quadrilateral search), rectifies it with a projective warp, and assembles
// the rectified pages into a PDF.

pub mod image;
pub mod pdf;
pub mod perspective;
pub mod pipeline;
pub mod scan;

// Re-export the primary entry points so callers can use `scanwerk_document::detect_document` etc.
pub use image::raster::{IntensityField, RgbaRaster};
pub use pdf::writer::PdfWriter;
pub use perspective::{Homography, rectify, rectify_with};
pub use pipeline::{Capture, ScanPipeline, ScanRequest, ScanResponse};
pub use scan::{Detection, DocumentDetector, canonicalize, detect_batch, detect_document};
