// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: one page per rectified raster, using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::{PageSizing, PdfConfig};
use tracing::{debug, info, instrument, warn};

use crate::image::raster::RgbaRaster;

/// Image resolution assumed when placing pages on fixed paper.
const PAPER_DPI: f32 = 150.0;
const MM_PER_INCH: f32 = 25.4;

/// Assembles scanned pages into a PDF document.
pub struct PdfWriter {
    config: PdfConfig,
}

/// Page size and image placement for one raster.
#[derive(Debug, Clone, Copy)]
struct Placement {
    page_w: Mm,
    page_h: Mm,
    translate_x: f32,
    translate_y: f32,
    scale: f32,
    dpi: f32,
}

impl PdfWriter {
    pub fn new(config: PdfConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PdfConfig {
        &self.config
    }

    fn placement(&self, width: usize, height: usize) -> Result<Placement> {
        match self.config.page_sizing {
            PageSizing::FitImage { dpi } => {
                if !(dpi > 0.0 && dpi.is_finite()) {
                    return Err(ScanwerkError::PdfError(format!("invalid page DPI {dpi}")));
                }
                Ok(Placement {
                    page_w: Mm(width as f32 / dpi * MM_PER_INCH),
                    page_h: Mm(height as f32 / dpi * MM_PER_INCH),
                    translate_x: 0.0,
                    translate_y: 0.0,
                    scale: 1.0,
                    dpi,
                })
            }
            PageSizing::Paper(paper) => {
                let (w_mm, h_mm) = paper.dimensions_mm();
                let (page_w, page_h) = (Mm(w_mm as f32), Mm(h_mm as f32));
                let margin_mm = self.config.margin_mm.max(0.0);
                let usable_w_pt = Mm(page_w.0 - 2.0 * margin_mm).into_pt().0;
                let usable_h_pt = Mm(page_h.0 - 2.0 * margin_mm).into_pt().0;
                if usable_w_pt <= 0.0 || usable_h_pt <= 0.0 {
                    return Err(ScanwerkError::PdfError(format!(
                        "margin of {margin_mm} mm leaves no room on {paper:?}"
                    )));
                }

                let img_w_pt = width as f32 / PAPER_DPI * 72.0;
                let img_h_pt = height as f32 / PAPER_DPI * 72.0;
                // Fit within the margins; never upscale.
                let scale = (usable_w_pt / img_w_pt).min(usable_h_pt / img_h_pt).min(1.0);

                let margin_pt = Mm(margin_mm).into_pt().0;
                Ok(Placement {
                    page_w,
                    page_h,
                    translate_x: margin_pt + (usable_w_pt - img_w_pt * scale) / 2.0,
                    translate_y: margin_pt + (usable_h_pt - img_h_pt * scale) / 2.0,
                    scale,
                    dpi: PAPER_DPI,
                })
            }
        }
    }

    /// Build a PDF with one page per raster, in order. Alpha is discarded.
    #[instrument(skip(self, pages), fields(pages = pages.len()))]
    pub fn create_from_rasters(&self, pages: &[RgbaRaster]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(ScanwerkError::PdfError("no pages to write".into()));
        }
        info!(sizing = ?self.config.page_sizing, title = %self.config.title, "Creating scan PDF");

        let mut doc = PdfDocument::new(&self.config.title);
        let mut pdf_pages = Vec::with_capacity(pages.len());
        for raster in pages {
            let (width, height) = (raster.width(), raster.height());
            let place = self.placement(width, height)?;
            let raw = RawImage {
                pixels: RawImageData::U8(raster.to_rgb_bytes()),
                width,
                height,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);
            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(place.translate_x)),
                    translate_y: Some(Pt(place.translate_y)),
                    scale_x: Some(place.scale),
                    scale_y: Some(place.scale),
                    dpi: Some(place.dpi),
                    rotate: None,
                },
            }];
            debug!(width, height, scale = place.scale, "Page placed");
            pdf_pages.push(PdfPage::new(place.page_w, place.page_h, ops));
        }
        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "PDF serialisation produced warnings");
        }
        Ok(output)
    }

    /// Create the PDF and write it directly to a file.
    pub fn write_to_file(&self, pages: &[RgbaRaster], path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.create_from_rasters(pages)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote scan PDF to {}", path.as_ref().display());
        Ok(())
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new(PdfConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanwerk_core::PaperSize;

    fn page_count(bytes: &[u8]) -> usize {
        lopdf::Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[test]
    fn one_page_per_raster() {
        let pages = vec![
            RgbaRaster::from_pixel(30, 40, [255, 0, 0, 255]).unwrap(),
            RgbaRaster::from_pixel(40, 30, [0, 255, 0, 128]).unwrap(),
            RgbaRaster::from_pixel(10, 10, [0, 0, 255, 255]).unwrap(),
        ];
        let bytes = PdfWriter::default().create_from_rasters(&pages).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(page_count(&bytes), 3);
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = PdfWriter::default().create_from_rasters(&[]).unwrap_err();
        assert!(matches!(err, ScanwerkError::PdfError(_)));
    }

    #[test]
    fn fit_image_page_matches_pixels_at_dpi() {
        let writer = PdfWriter::new(PdfConfig {
            page_sizing: PageSizing::FitImage { dpi: 100.0 },
            ..Default::default()
        });
        let place = writer.placement(200, 300).unwrap();
        assert!((place.page_w.0 - 50.8).abs() < 1e-3);
        assert!((place.page_h.0 - 76.2).abs() < 1e-3);
        assert_eq!(place.scale, 1.0);
    }

    #[test]
    fn paper_placement_centres_and_shrinks() {
        let writer = PdfWriter::new(PdfConfig {
            page_sizing: PageSizing::Paper(PaperSize::A4),
            margin_mm: 15.0,
            ..Default::default()
        });
        // 3000 px tall at 150 dpi is 20 inches: must shrink to fit A4.
        let place = writer.placement(1000, 3000).unwrap();
        assert!(place.scale < 1.0);
        let usable_h = Mm(297.0 - 30.0).into_pt().0;
        let drawn_h = 3000.0 / PAPER_DPI * 72.0 * place.scale;
        assert!((drawn_h - usable_h).abs() < 0.01);
        // Small images are centred at native size.
        let small = writer.placement(150, 150).unwrap();
        assert_eq!(small.scale, 1.0);
        let page_w_pt = Mm(210.0).into_pt().0;
        assert!((small.translate_x * 2.0 + 72.0 - page_w_pt).abs() < 0.01);
    }

    #[test]
    fn oversized_margin_is_rejected() {
        let writer = PdfWriter::new(PdfConfig {
            page_sizing: PageSizing::Paper(PaperSize::A5),
            margin_mm: 80.0,
            ..Default::default()
        });
        let err = writer
            .create_from_rasters(&[RgbaRaster::from_pixel(5, 5, [0; 4]).unwrap()])
            .unwrap_err();
        assert!(matches!(err, ScanwerkError::PdfError(_)));
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        let pages = vec![RgbaRaster::from_pixel(20, 20, [200; 4]).unwrap()];
        PdfWriter::default().write_to_file(&pages, &path).unwrap();
        assert_eq!(page_count(&std::fs::read(&path).unwrap()), 1);
    }
}
