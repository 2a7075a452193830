pub mod composer;
pub mod export;
pub mod layout;
mod margins;
mod options;
mod record;
pub mod render;
pub mod scan;
mod sequence;
pub mod session;
mod stats;
mod types;

pub use composer::{compose_pages, compose_preview_page};
pub use export::{
    CancelToken, DocumentWriter, ExportEvent, ExportHandle, ExportOutcome, PdfWriter, start_export,
};
pub use margins::*;
pub use options::*;
pub use record::ImageRecord;
pub use render::{Page, render_crop_preview};
pub use scan::{LoadReport, SkippedFile, load_inputs};
pub use sequence::{sort_records, sorted};
pub use session::{ExportGuard, Session, SessionEvent, SharedSession, begin_export};
pub use stats::calculate_statistics;
pub use types::*;
