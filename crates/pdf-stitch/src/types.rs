use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StitchError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Unreadable image {}: {reason}", path.display())]
    UnreadableImage { path: PathBuf, reason: String },
    #[error("Crop of {name} is empty ({width}x{height})")]
    DegenerateCrop {
        name: String,
        width: u32,
        height: u32,
    },
    #[error("An export is already running")]
    ExportInProgress,
    #[error("Export cancelled")]
    Cancelled,
    #[error("Failed to write document: {0}")]
    Write(String),
    #[error("Output path must end in .pdf: {}", .0.display())]
    InvalidOutputPath(PathBuf),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, StitchError>;

/// How images are arranged onto output pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayoutMode {
    /// One image per page
    #[default]
    SinglePage,
    /// Two images per page, first of each pair on the left
    DoublePageLeftToRight,
    /// Two images per page, first of each pair on the right
    DoublePageRightToLeft,
}

impl LayoutMode {
    /// Resolve the mode into `(double_pages, right_to_left)`.
    ///
    /// Every component branches on these two flags rather than on the mode
    /// itself.
    pub fn resolve(self) -> (bool, bool) {
        match self {
            LayoutMode::SinglePage => (false, false),
            LayoutMode::DoublePageLeftToRight => (true, false),
            LayoutMode::DoublePageRightToLeft => (true, true),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LayoutMode::SinglePage => "single page",
            LayoutMode::DoublePageLeftToRight => "double page, left to right",
            LayoutMode::DoublePageRightToLeft => "double page, right to left",
        }
    }
}

/// Session-wide page layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageLayoutConfig {
    pub mode: LayoutMode,
    /// Give the first image its own page in double-page modes
    pub separate_cover: bool,
}

impl PageLayoutConfig {
    pub fn new(mode: LayoutMode, separate_cover: bool) -> Self {
        Self {
            mode,
            separate_cover,
        }
    }
}

/// Key used to order the loaded images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortKey {
    Name,
    #[default]
    CreationTime,
    ModificationTime,
}

/// Pixel format of composed pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Rgb,
    Grayscale,
}

impl ColorMode {
    pub fn from_grayscale(grayscale: bool) -> Self {
        if grayscale {
            ColorMode::Grayscale
        } else {
            ColorMode::Rgb
        }
    }
}

/// Page counts for a layout, computed without decoding any pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchStatistics {
    /// Number of source images
    pub source_images: usize,
    /// Number of pages in the output document
    pub output_pages: usize,
    /// Pages holding two images
    pub spreads: usize,
    /// Pages sized to a single image (single-page mode or separate cover)
    pub single_pages: usize,
    /// Empty halves of double-wide pages
    pub blank_slots: usize,
}
