//! Source image records

use crate::margins::{CropRect, MarginInput};
use crate::render::scaled_size;
use crate::types::*;
use chrono::{DateTime, Local};
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// One source image: identity, intrinsic size, sort keys and crop.
///
/// Width and height are fixed at creation; a changed file needs a new
/// record.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    name: String,
    source_path: PathBuf,
    width: u32,
    height: u32,
    created_at: DateTime<Local>,
    modified_at: DateTime<Local>,
    crop: CropRect,
}

impl ImageRecord {
    pub fn new(
        name: impl Into<String>,
        source_path: impl Into<PathBuf>,
        width: u32,
        height: u32,
        created_at: DateTime<Local>,
        modified_at: DateTime<Local>,
    ) -> Result<Self> {
        let source_path = source_path.into();
        if width == 0 || height == 0 {
            return Err(StitchError::UnreadableImage {
                path: source_path,
                reason: format!("image has no pixels ({width}x{height})"),
            });
        }
        Ok(Self {
            name: name.into(),
            source_path,
            width,
            height,
            created_at,
            modified_at,
            crop: CropRect::full(width, height),
        })
    }

    /// Read dimensions and timestamps of an image file.
    ///
    /// Only the image header is decoded. Platforms without a birth time use
    /// the modification time as creation time.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let unreadable = |reason: String| StitchError::UnreadableImage {
            path: path.to_owned(),
            reason,
        };

        let metadata = std::fs::metadata(path).map_err(|e| unreadable(e.to_string()))?;
        let (width, height) =
            image::image_dimensions(path).map_err(|e| unreadable(e.to_string()))?;

        let modified_at: DateTime<Local> = metadata
            .modified()
            .map(DateTime::from)
            .unwrap_or_else(|_| Local::now());
        let created_at = metadata
            .created()
            .map(DateTime::from)
            .unwrap_or(modified_at);

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::new(name, path, width, height, created_at, modified_at)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Local> {
        self.modified_at
    }

    pub fn crop(&self) -> CropRect {
        self.crop
    }

    pub fn crop_width(&self) -> u32 {
        self.crop.width()
    }

    pub fn crop_height(&self) -> u32 {
        self.crop.height()
    }

    /// Crop size once export scaling is applied
    pub fn scaled_crop_size(&self, factor: f32) -> (u32, u32) {
        scaled_size(self.crop_width(), self.crop_height(), factor)
    }

    /// Apply raw margin input, clamped to this image
    pub fn set_margins(&mut self, input: MarginInput) -> CropRect {
        self.crop = input.normalize(self.width, self.height);
        self.crop
    }

    /// Decode the whole image
    pub fn decode(&self) -> Result<DynamicImage> {
        image::open(&self.source_path).map_err(|e| StitchError::UnreadableImage {
            path: self.source_path.clone(),
            reason: e.to_string(),
        })
    }

    /// Decode the image and cut out the crop rectangle
    pub fn crop_image(&self) -> Result<DynamicImage> {
        let img = self.decode()?;
        let CropRect { left, top, .. } = self.crop;
        Ok(img.crop_imm(left, top, self.crop_width(), self.crop_height()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(width: u32, height: u32) -> ImageRecord {
        let now = Local::now();
        ImageRecord::new("a.png", "a.png", width, height, now, now).unwrap()
    }

    #[test]
    fn test_new_record_covers_full_image() {
        let rec = record(200, 300);
        assert_eq!(rec.crop(), CropRect::full(200, 300));
        assert_eq!(rec.crop_width(), 200);
        assert_eq!(rec.crop_height(), 300);
        assert_eq!(rec.scaled_crop_size(0.5), (100, 150));
        assert_eq!(rec.scaled_crop_size(0.001), (0, 0));
    }

    #[test]
    fn test_zero_sized_record_is_rejected() {
        let now = Local::now();
        let result = ImageRecord::new("empty.png", "empty.png", 0, 10, now, now);
        assert!(matches!(result, Err(StitchError::UnreadableImage { .. })));
    }

    #[test]
    fn test_set_margins_clamps_to_own_size() {
        let mut rec = record(100, 50);
        let crop = rec.set_margins(MarginInput::new(120, -3, 10, 40));
        assert_eq!(
            crop,
            CropRect {
                left: 10,
                top: 0,
                right: 100,
                bottom: 40
            }
        );
        assert_eq!(rec.crop(), crop);
    }

    #[test]
    fn test_open_missing_file_is_unreadable() {
        let result = ImageRecord::open("definitely/not/here.png");
        assert!(matches!(result, Err(StitchError::UnreadableImage { .. })));
    }
}
