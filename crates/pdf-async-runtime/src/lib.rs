use std::path::PathBuf;

mod logger;
mod worker;

pub use logger::{AppLogger, LogEntry};
pub use worker::{spawn_worker, worker_task};

// Re-export types from library crates
pub use pdf_stitch::{
    ExportOptions, MarginInput, MarginScope, PageLayoutConfig, SessionEvent, SharedSession,
    SkippedFile, SortKey, StitchStatistics,
};

/// Commands sent from the front end to the worker
#[derive(Debug, Clone)]
pub enum StitchCommand {
    /// Load image files or directories, replacing the session contents
    Load {
        inputs: Vec<PathBuf>,
    },
    Sort {
        key: SortKey,
    },
    SetLayout {
        layout: PageLayoutConfig,
    },
    SetMargins {
        input: MarginInput,
        scope: MarginScope,
    },
    /// Encoding options used by later previews (grayscale, scale)
    SetPreviewOptions {
        options: ExportOptions,
    },
    /// Render one composed output page
    RenderPreview {
        page_index: usize,
    },
    /// Render the margin editor view of one source image
    RenderCropPreview {
        index: usize,
    },
    CalculateStats,
    Export {
        options: ExportOptions,
        output_path: PathBuf,
    },
    CancelExport,
}

/// Updates sent from the worker to the front end
#[derive(Debug, Clone)]
pub enum StitchUpdate {
    Loaded {
        count: usize,
        skipped: Vec<SkippedFile>,
    },
    Sorted {
        key: SortKey,
    },
    Progress {
        operation: String,
        current: usize,
        total: usize,
    },
    PreviewRendered {
        page_index: usize,
        page_count: usize,
        width: usize,
        height: usize,
        rgba_data: Vec<u8>,
    },
    CropPreviewRendered {
        index: usize,
        width: usize,
        height: usize,
        rgba_data: Vec<u8>,
    },
    StatsCalculated {
        stats: StitchStatistics,
    },
    ExportComplete {
        path: PathBuf,
        page_count: usize,
    },
    ExportCancelled,
    /// The session was empty; nothing was written
    ExportSkipped,
    Error {
        message: String,
    },
    SessionChanged {
        event: SessionEvent,
    },
}
