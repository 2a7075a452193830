//! Margin editor preview
//!
//! The full image is shown darkened in grayscale, the retained area is
//! pasted back in colour, and each crop edge gets a guide line.

use crate::margins::CropRect;
use crate::record::ImageRecord;
use crate::types::Result;
use image::imageops;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;

pub const CROP_GUIDE_COLOR: Rgba<u8> = Rgba([0, 255, 255, 255]);

/// Decode `record` and draw its crop preview
pub fn render_crop_preview(record: &ImageRecord) -> Result<RgbaImage> {
    let image = record.decode()?;
    Ok(crop_preview(&image, record.crop()))
}

/// Draw the crop preview of an already decoded image
pub fn crop_preview(image: &DynamicImage, crop: CropRect) -> RgbaImage {
    let (width, height) = (image.width(), image.height());

    let mut darkened = image.to_luma8();
    for pixel in darkened.pixels_mut() {
        pixel.0[0] /= 2;
    }
    let mut canvas = DynamicImage::ImageLuma8(darkened).to_rgba8();

    let retained = image
        .crop_imm(crop.left, crop.top, crop.width(), crop.height())
        .to_rgba8();
    imageops::replace(&mut canvas, &retained, crop.left as i64, crop.top as i64);

    let (w, h) = (width as f32, height as f32);
    let vertical = [crop.left as f32, crop.right as f32];
    let horizontal = [crop.top as f32, crop.bottom as f32];
    for x in vertical {
        draw_line_segment_mut(&mut canvas, (x, 0.0), (x, h), CROP_GUIDE_COLOR);
    }
    for y in horizontal {
        draw_line_segment_mut(&mut canvas, (0.0, y), (w, y), CROP_GUIDE_COLOR);
    }

    canvas
}
