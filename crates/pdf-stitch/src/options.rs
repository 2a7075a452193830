use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Encoding settings applied when pages are written
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExportOptions {
    /// Convert pages to 8-bit grayscale
    pub grayscale: bool,
    /// Lossless stream compression, 0 (off) to 9
    pub compression_level: u8,
    /// Resolution recorded in the document; pixel sizes are unaffected
    pub dpi: f32,
    /// Uniform rescale applied to every cropped image before paging
    pub scale: f32,
    /// Refuse to export crops with zero width or height
    pub reject_degenerate_crops: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            grayscale: false,
            compression_level: 6,
            dpi: 300.0,
            scale: 1.0,
            reject_degenerate_crops: true,
        }
    }
}

impl ExportOptions {
    pub fn color_mode(&self) -> ColorMode {
        ColorMode::from_grayscale(self.grayscale)
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.compression_level > 9 {
            return Err(StitchError::Config(format!(
                "Compression level must be between 0 and 9, got {}",
                self.compression_level
            )));
        }
        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return Err(StitchError::Config(format!(
                "Resolution must be a positive number of dots per inch, got {}",
                self.dpi
            )));
        }
        if !self.scale.is_finite() || self.scale < 0.0 {
            return Err(StitchError::Config(format!(
                "Scale factor must not be negative, got {}",
                self.scale
            )));
        }
        Ok(())
    }
}

/// Everything a session needs besides the images themselves
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StitchOptions {
    pub layout: PageLayoutConfig,
    pub sort_key: SortKey,
    pub export: ExportOptions,
}

impl StitchOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options: Self = serde_json::from_slice(&bytes)
            .map_err(|e| StitchError::Config(format!("Failed to parse config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| StitchError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        self.export.validate()
    }
}

/// Check that an export target names a PDF file
pub fn validate_output_path(path: &std::path::Path) -> Result<()> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        Ok(())
    } else {
        Err(StitchError::InvalidOutputPath(path.to_owned()))
    }
}
