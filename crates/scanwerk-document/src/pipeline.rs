// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request dispatch over the detection and rectification stages, with
// rayon-backed batch processing.

use rayon::prelude::*;
use scanwerk_core::error::Result;
use scanwerk_core::{Quad, RectifyConfig, ScanConfig};
use tracing::{debug, info, instrument};

use crate::image::raster::RgbaRaster;
use crate::pdf::writer::PdfWriter;
use crate::perspective::rectify::rectify_with;
use crate::scan::detector::{Detection, DocumentDetector};

/// One unit of work. Rasters are moved in, not shared.
#[derive(Debug, Clone)]
pub enum ScanRequest {
    /// Locate the document in a frame.
    FindDocument { raster: RgbaRaster },
    /// Rectify a known region of a frame.
    ExtractDocument {
        raster: RgbaRaster,
        region: Quad,
        max_dimension: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanResponse {
    Document(Option<Quad>),
    Extracted(RgbaRaster),
}

/// A captured page: the rectified image and the detection behind it, if any.
#[derive(Debug, Clone)]
pub struct Capture {
    pub page: RgbaRaster,
    /// `None` when no document was found and the full frame was used.
    pub detection: Option<Detection>,
}

/// Detection, rectification and PDF assembly under one configuration.
#[derive(Debug)]
pub struct ScanPipeline {
    config: ScanConfig,
    detector: DocumentDetector,
}

impl ScanPipeline {
    pub fn new(config: ScanConfig) -> Result<Self> {
        let detector = DocumentDetector::new(config.detector.clone())?;
        Ok(Self { config, detector })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Serve a single request.
    pub fn handle(&mut self, request: ScanRequest) -> Result<ScanResponse> {
        serve(&mut self.detector, &self.config.rectify, request)
    }

    /// Serve many requests in parallel, one detector per worker thread.
    /// Results keep the order of `requests`.
    #[instrument(skip_all, fields(requests = requests.len()))]
    pub fn process_batch(&self, requests: Vec<ScanRequest>) -> Vec<Result<ScanResponse>> {
        // Validated in `new` and never mutated since.
        let detector_config = &self.config.detector;
        let rectify = &self.config.rectify;
        requests
            .into_par_iter()
            .map_init(
                || DocumentDetector::with_validated(detector_config.clone()),
                |detector, request| serve(detector, rectify, request),
            )
            .collect()
    }

    /// Detect and rectify a frame, falling back to the whole frame when no
    /// document is found.
    #[instrument(skip_all, fields(width = raster.width(), height = raster.height()))]
    pub fn capture(&mut self, raster: &RgbaRaster) -> Result<Capture> {
        let detection = self.detector.detect_scored(raster);
        capture_with(raster, detection, &self.config.rectify)
    }

    /// [`capture`](Self::capture) over many frames in parallel.
    pub fn capture_batch(&self, rasters: &[RgbaRaster]) -> Result<Vec<Capture>> {
        let detector_config = &self.config.detector;
        let rectify = &self.config.rectify;
        rasters
            .par_iter()
            .map_init(
                || DocumentDetector::with_validated(detector_config.clone()),
                |detector, raster| capture_with(raster, detector.detect_scored(raster), rectify),
            )
            .collect()
    }

    /// Assemble rectified pages into a PDF.
    pub fn to_pdf(&self, pages: &[RgbaRaster]) -> Result<Vec<u8>> {
        PdfWriter::new(self.config.pdf.clone()).create_from_rasters(pages)
    }
}

fn serve(
    detector: &mut DocumentDetector,
    rectify: &RectifyConfig,
    request: ScanRequest,
) -> Result<ScanResponse> {
    match request {
        ScanRequest::FindDocument { raster } => Ok(ScanResponse::Document(detector.detect(&raster))),
        ScanRequest::ExtractDocument {
            raster,
            region,
            max_dimension,
        } => {
            let config = RectifyConfig {
                max_output_dimension: max_dimension,
                ..rectify.clone()
            };
            rectify_with(&raster, &region, &config).map(ScanResponse::Extracted)
        }
    }
}

fn capture_with(
    raster: &RgbaRaster,
    detection: Option<Detection>,
    rectify: &RectifyConfig,
) -> Result<Capture> {
    let quad = match &detection {
        Some(found) => {
            debug!(score = found.score, attempt = found.attempt, "Document detected");
            found.quad
        }
        None => {
            info!("No document detected, using the full frame");
            Quad::rect(raster.width() as f32, raster.height() as f32)
        }
    };
    let page = rectify_with(raster, &quad, rectify)?;
    Ok(Capture { page, detection })
}
