//! Image utilities for PDF rendering
//!
//! JPEG files are embedded as-is behind a DCTDecode filter after their header
//! is inspected with `jpeg-decoder`. Everything else is decoded with `image`
//! and embedded as 8-bit RGB, with an alpha channel becoming a soft mask.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::DynamicImage;
use jpeg_decoder::PixelFormat;
use log::debug;
use pdf_writer::{Filter, Pdf, Ref};

use crate::error::{ReportError, ReportResult};
use crate::renderer::RefAllocator;

/// Decoded or pass-through image data ready for embedding
#[derive(Debug)]
pub enum ImageData {
    Jpeg {
        data: Vec<u8>,
        width: u32,
        height: u32,
        components: u8,
    },
    Raster(DynamicImage),
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() > 3 && data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF
}

/// Load image from file path
pub fn load_image(path: &Path) -> ReportResult<ImageData> {
    if !path.exists() {
        return Err(ReportError::MissingAsset(format!(
            "Image file not found: {}",
            path.display()
        )));
    }
    let data = fs::read(path).map_err(|e| {
        ReportError::ImageError(format!("Failed to read image file {}: {}", path.display(), e))
    })?;
    load_image_from_bytes(data)
        .map_err(|e| ReportError::ImageError(format!("{}: {}", path.display(), e)))
}

pub fn load_image_from_bytes(data: Vec<u8>) -> ReportResult<ImageData> {
    if is_jpeg(&data) {
        let mut decoder = jpeg_decoder::Decoder::new(Cursor::new(&data));
        decoder
            .read_info()
            .map_err(|e| ReportError::ImageError(format!("Failed to read JPEG header: {}", e)))?;
        let info = decoder
            .info()
            .ok_or_else(|| ReportError::ImageError("JPEG header without frame info".to_string()))?;
        let components = match info.pixel_format {
            PixelFormat::L8 | PixelFormat::L16 => 1,
            PixelFormat::RGB24 => 3,
            PixelFormat::CMYK32 => 4,
        };
        // 16-bit greyscale JPEGs cannot be passed through a DCT filter
        if info.pixel_format != PixelFormat::L16 {
            return Ok(ImageData::Jpeg {
                width: info.width as u32,
                height: info.height as u32,
                components,
                data,
            });
        }
    }

    let img = image::load_from_memory(&data)
        .map_err(|e| ReportError::ImageError(format!("Failed to decode image: {}", e)))?;
    Ok(ImageData::Raster(img))
}

/// Add image to PDF as an Image XObject
pub fn add_image_to_pdf(
    pdf: &mut Pdf,
    image_data: &ImageData,
    image_id: Ref,
    refs: &mut RefAllocator,
) {
    match image_data {
        ImageData::Jpeg { data, width, height, components } => {
            debug!("Embedding JPEG {}x{} ({} bytes) as {:?}", width, height, data.len(), image_id);
            let mut xobject = pdf.image_xobject(image_id, data);
            xobject.filter(Filter::DctDecode);
            xobject.width(*width as i32);
            xobject.height(*height as i32);
            match components {
                1 => xobject.color_space().device_gray(),
                4 => xobject.color_space().device_cmyk(),
                _ => xobject.color_space().device_rgb(),
            };
            xobject.bits_per_component(8);
        }
        ImageData::Raster(image) => {
            let has_alpha = image.color().has_alpha();
            let (rgb, alpha, width, height) = if has_alpha {
                let rgba = image.to_rgba8();
                let (w, h) = rgba.dimensions();
                let mut rgb = Vec::with_capacity((w * h * 3) as usize);
                let mut alpha = Vec::with_capacity((w * h) as usize);
                for chunk in rgba.into_raw().chunks_exact(4) {
                    rgb.extend_from_slice(&chunk[..3]);
                    alpha.push(chunk[3]);
                }
                (rgb, Some(alpha), w, h)
            } else {
                let rgb = image.to_rgb8();
                let (w, h) = rgb.dimensions();
                (rgb.into_raw(), None, w, h)
            };
            debug!("Embedding raster {}x{} (alpha: {}) as {:?}", width, height, has_alpha, image_id);

            let smask_id = alpha.map(|alpha| {
                let smask_id = refs.next();
                let mut smask = pdf.image_xobject(smask_id, &alpha);
                smask.width(width as i32);
                smask.height(height as i32);
                smask.color_space().device_gray();
                smask.bits_per_component(8);
                smask_id
            });

            let mut xobject = pdf.image_xobject(image_id, &rgb);
            xobject.width(width as i32);
            xobject.height(height as i32);
            xobject.color_space().device_rgb();
            xobject.bits_per_component(8);
            if let Some(smask_id) = smask_id {
                xobject.s_mask(smask_id);
            }
        }
    }
}
