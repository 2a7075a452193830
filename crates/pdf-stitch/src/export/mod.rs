//! Document export
//!
//! [`writer`] turns composed pages into PDF bytes and puts them on disk;
//! [`job`] drives a cancellable export over a shared session.

mod job;
mod writer;

pub use job::{CancelToken, ExportEvent, ExportHandle, ExportOutcome, run_export, start_export};
pub use writer::{DocumentWriter, PdfWriter, persist_document};
