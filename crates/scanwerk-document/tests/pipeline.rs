// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end tests: synthetic camera frames through detection, rectification
// and PDF assembly.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as PixelPoint;

use scanwerk_core::{PageSizing, PaperSize, Point, Quad, ScanConfig};
use scanwerk_document::image::codec;
use scanwerk_document::{
    DocumentDetector, PdfWriter, RgbaRaster, ScanPipeline, canonicalize, detect_document,
    rectify,
};

/// White polygon on black, corners given in drawing order.
fn polygon_frame(width: u32, height: u32, corners: [(i32, i32); 4]) -> RgbaRaster {
    let mut img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
    let poly: Vec<PixelPoint<i32>> = corners.iter().map(|&(x, y)| PixelPoint::new(x, y)).collect();
    draw_polygon_mut(&mut img, &poly, Rgba([255, 255, 255, 255]));
    RgbaRaster::try_from(img).unwrap()
}

fn skewed_page() -> RgbaRaster {
    polygon_frame(1000, 1400, [(100, 150), (900, 140), (910, 1300), (90, 1310)])
}

fn skewed_truth() -> Quad {
    Quad::new(
        Point::new(90.0, 1310.0),
        Point::new(100.0, 150.0),
        Point::new(900.0, 140.0),
        Point::new(910.0, 1300.0),
    )
}

fn assert_corners_near(found: &Quad, expected: &Quad, tol: f32) {
    for (f, e) in found.corners().iter().zip(expected.corners()) {
        assert!(
            f.distance(e) <= tol,
            "corner {f:?} is {} px from {e:?}\nfound {found:?}",
            f.distance(e)
        );
    }
}

#[test]
fn skewed_page_is_located() {
    let quad = detect_document(&skewed_page(), 3).expect("document");
    assert_corners_near(&quad, &skewed_truth(), 5.0);
}

#[test]
fn rectified_page_keeps_its_aspect_ratio() {
    let frame = skewed_page();
    let quad = detect_document(&frame, 3).expect("document");
    let page = rectify(&frame, &quad, 1224).unwrap();

    let truth = skewed_truth();
    let expected_w = 1224.0 * truth.bc_da_length() / truth.ab_cd_length();
    assert_eq!(page.height(), 1224);
    assert!(
        (page.width() as f32 - expected_w).abs() <= 3.0,
        "width {} vs {expected_w}",
        page.width()
    );
    // The page interior is paper white; nothing of the dark background
    // survives away from the border.
    let (cx, cy) = (page.width() / 2, page.height() / 2);
    assert_eq!(page.pixel(cx, cy), [255, 255, 255, 255]);
    assert_eq!(page.pixel(20, 20), [255, 255, 255, 255]);
    assert_eq!(page.pixel(page.width() - 20, page.height() - 20), [255, 255, 255, 255]);
}

#[test]
fn blank_frame_has_no_document() {
    let blank = RgbaRaster::from_pixel(800, 600, [255, 255, 255, 255]).unwrap();
    assert!(detect_document(&blank, 3).is_none());
}

#[test]
fn rotated_rectangle_is_located() {
    let (cx, cy) = (300.0f32, 400.0f32);
    let (hw, hh) = (180.0f32, 260.0f32);
    let (sin, cos) = 10f32.to_radians().sin_cos();
    let rotate = |dx: f32, dy: f32| Point::new(cx + dx * cos - dy * sin, cy + dx * sin + dy * cos);
    let tl = rotate(-hw, -hh);
    let tr = rotate(hw, -hh);
    let br = rotate(hw, hh);
    let bl = rotate(-hw, hh);
    let px = |p: Point| (p.x.round() as i32, p.y.round() as i32);
    let frame = polygon_frame(600, 800, [px(tl), px(tr), px(br), px(bl)]);

    let quad = detect_document(&frame, 3).expect("document");
    assert_corners_near(&quad, &Quad::new(bl, tl, tr, br), 4.0);
    assert_eq!(canonicalize(quad), quad);
}

#[test]
fn decoded_png_matches_in_memory_detection() {
    let frame = skewed_page();
    let bytes = codec::to_png_bytes(&frame).unwrap();
    let decoded = codec::decode(&bytes).unwrap();

    let mut detector = DocumentDetector::new(Default::default()).unwrap();
    assert_eq!(detector.detect(&decoded), detector.detect(&frame));
}

#[test]
fn captured_pages_are_written_as_pdf() {
    let mut config = ScanConfig::default();
    config.rectify.max_output_dimension = 600;
    config.pdf.page_sizing = PageSizing::Paper(PaperSize::A4);
    let mut pipeline = ScanPipeline::new(config).unwrap();

    let frames = [
        skewed_page(),
        polygon_frame(600, 800, [(80, 90), (520, 100), (510, 700), (90, 710)]),
    ];
    let mut pages = Vec::new();
    for frame in &frames {
        let capture = pipeline.capture(frame).unwrap();
        assert!(capture.detection.is_some());
        assert_eq!(capture.page.height(), 600);
        pages.push(capture.page);
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.pdf");
    PdfWriter::new(pipeline.config().pdf.clone())
        .write_to_file(&pages, &path)
        .unwrap();

    let doc = lopdf::Document::load(&path).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}
