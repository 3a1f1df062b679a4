// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decoding and encoding of rasters through the `image` crate. The pipeline
// itself never decodes; these helpers serve the surrounding layers (CLI,
// tests, benches).

use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbaImage};
use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, info, instrument};

use super::raster::RgbaRaster;

/// Load and decode an image file into an RGBA raster.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn open(path: impl AsRef<Path>) -> Result<RgbaRaster> {
    let img = image::open(path.as_ref()).map_err(|err| {
        ScanwerkError::ImageError(format!(
            "failed to open {}: {}",
            path.as_ref().display(),
            err
        ))
    })?;
    info!(width = img.width(), height = img.height(), "Image loaded");
    RgbaRaster::from_dynamic(img)
}

/// Decode encoded bytes (JPEG, PNG, ...) into an RGBA raster.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn decode(data: &[u8]) -> Result<RgbaRaster> {
    let img = image::load_from_memory(data)
        .map_err(|err| ScanwerkError::ImageError(format!("failed to decode image: {}", err)))?;
    debug!(
        width = img.width(),
        height = img.height(),
        "Image decoded from bytes"
    );
    RgbaRaster::from_dynamic(img)
}

/// Encode a raster as PNG bytes.
pub fn to_png_bytes(raster: &RgbaRaster) -> Result<Vec<u8>> {
    let image = DynamicImage::ImageRgba8(RgbaImage::try_from(raster.clone())?);
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| ScanwerkError::ImageError(format!("PNG encoding failed: {}", err)))?;
    Ok(buffer)
}

/// Write a raster to a file; the format follows the file extension.
pub fn save(raster: &RgbaRaster, path: impl AsRef<Path>) -> Result<()> {
    let image = RgbaImage::try_from(raster.clone())?;
    // JPEG has no alpha channel.
    let is_jpeg = matches!(
        ImageFormat::from_path(path.as_ref()),
        Ok(ImageFormat::Jpeg)
    );
    let result = if is_jpeg {
        DynamicImage::ImageRgba8(image).to_rgb8().save(path.as_ref())
    } else {
        image.save(path.as_ref())
    };
    result.map_err(|err| {
        ScanwerkError::ImageError(format!(
            "failed to save image to {}: {}",
            path.as_ref().display(),
            err
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trip() {
        let mut raster = RgbaRaster::from_pixel(4, 3, [12, 34, 56, 255]).unwrap();
        raster.put_pixel(3, 2, [200, 100, 50, 255]);
        let bytes = to_png_bytes(&raster).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, raster);
    }

    #[test]
    fn garbage_bytes_are_image_errors() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ScanwerkError::ImageError(_)));
    }

    #[test]
    fn save_and_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        let raster = RgbaRaster::from_pixel(5, 5, [1, 2, 3, 255]).unwrap();
        save(&raster, &path).unwrap();
        assert_eq!(open(&path).unwrap(), raster);
    }
}
