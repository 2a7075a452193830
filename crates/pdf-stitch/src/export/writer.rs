use crate::options::ExportOptions;
use crate::render::Page;
use crate::types::*;
use image::DynamicImage;
use printpdf::{
    ImageCompression, ImageOptimizationOptions, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Pt,
    RawImage, RawImageData, RawImageFormat, XObjectTransform,
};
use std::io::Write;
use std::path::Path;

const MM_PER_INCH: f32 = 25.4;

/// Encodes composed pages into a document
pub trait DocumentWriter: Send + Sync {
    fn encode(&self, pages: &[Page]) -> Result<Vec<u8>>;
}

/// Writes one PDF page per composed page, each sized to its image
#[derive(Debug, Clone)]
pub struct PdfWriter {
    title: String,
    dpi: f32,
    compression_level: u8,
}

impl PdfWriter {
    pub fn new(title: impl Into<String>, options: &ExportOptions) -> Self {
        Self {
            title: title.into(),
            dpi: options.dpi,
            compression_level: options.compression_level,
        }
    }

    fn px_to_mm(&self, px: u32) -> Mm {
        Mm(px as f32 / self.dpi * MM_PER_INCH)
    }

    /// Images are embedded at their composed size and colour; Flate
    /// compressed, or raw at level 0.
    fn save_options(&self) -> PdfSaveOptions {
        let format = if self.compression_level == 0 {
            ImageCompression::None
        } else {
            ImageCompression::Flate
        };
        PdfSaveOptions {
            optimize: self.compression_level > 0,
            image_optimization: Some(ImageOptimizationOptions {
                quality: None,
                max_image_size: None,
                dither_greyscale: Some(false),
                convert_to_greyscale: Some(false),
                auto_optimize: Some(false),
                format: Some(format),
            }),
            ..Default::default()
        }
    }

    fn raw_image(image: &DynamicImage) -> RawImage {
        let (pixels, data_format) = match image {
            DynamicImage::ImageLuma8(gray) => (gray.as_raw().clone(), RawImageFormat::R8),
            other => (other.to_rgb8().into_raw(), RawImageFormat::RGB8),
        };
        RawImage {
            pixels: RawImageData::U8(pixels),
            width: image.width() as usize,
            height: image.height() as usize,
            data_format,
            tag: Vec::new(),
        }
    }
}

impl DocumentWriter for PdfWriter {
    fn encode(&self, pages: &[Page]) -> Result<Vec<u8>> {
        let mut doc = PdfDocument::new(&self.title);

        for page in pages {
            let mut ops = Vec::new();
            // A zero-area page still gets a (zero-sized) page of its own
            if !page.is_empty() {
                let id = doc.add_image(&Self::raw_image(&page.image));
                ops.push(Op::UseXobject {
                    id,
                    transform: XObjectTransform {
                        translate_x: Some(Pt(0.0)),
                        translate_y: Some(Pt(0.0)),
                        scale_x: None,
                        scale_y: None,
                        dpi: Some(self.dpi),
                        rotate: None,
                    },
                });
            }
            doc.pages.push(PdfPage::new(
                self.px_to_mm(page.width()),
                self.px_to_mm(page.height()),
                ops,
            ));
        }

        let mut warnings = Vec::new();
        let bytes = doc.save(&self.save_options(), &mut warnings);
        for warning in &warnings {
            log::debug!("PDF writer: {:?}", warning);
        }
        Ok(bytes)
    }
}

/// Write `bytes` to `path` in one step.
///
/// The data goes to a temporary file next to the target first, so a failed
/// write never leaves a truncated document behind.
pub fn persist_document(bytes: &[u8], path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let write_err = |e: std::io::Error| StitchError::Write(format!("{}: {}", path.display(), e));

    let mut file = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    file.write_all(bytes).map_err(write_err)?;
    file.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
