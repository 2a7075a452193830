use super::writer::{DocumentWriter, persist_document};
use crate::composer::{compose_page, prepare_crop};
use crate::layout::assign_slots;
use crate::options::{ExportOptions, validate_output_path};
use crate::session::{ExportGuard, Session, SharedSession, begin_export, read_session};
use crate::types::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Progress reported by a running export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportEvent {
    /// `current` of `total` input images processed
    Progress { current: usize, total: usize },
    Completed { total: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { path: PathBuf, page_count: usize },
    /// Nothing to export; no file was written
    Empty,
}

/// Shared flag asking a running export to stop
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(StitchError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A running export
#[derive(Debug)]
pub struct ExportHandle {
    pub events: mpsc::UnboundedReceiver<ExportEvent>,
    cancel: CancelToken,
    task: JoinHandle<Result<ExportOutcome>>,
}

impl ExportHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Wait for the export to end
    pub async fn wait(self) -> Result<ExportOutcome> {
        self.task.await?
    }
}

/// Start exporting the session to `output` in the background.
///
/// Options and the output path are checked up front. The session stays
/// locked against edits until the job ends, whichever way it ends. Must be
/// called from within a tokio runtime.
pub fn start_export(
    session: &SharedSession,
    options: ExportOptions,
    output: PathBuf,
    writer: Arc<dyn DocumentWriter>,
) -> Result<ExportHandle> {
    options.validate()?;
    validate_output_path(&output)?;
    let guard = begin_export(session)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancelToken::new();
    let token = cancel.clone();

    let task = tokio::task::spawn_blocking(move || {
        let result = run_export(&guard, &options, &output, writer.as_ref(), &token, &tx);
        match &result {
            Ok(ExportOutcome::Written { path, page_count }) => {
                log::info!("Exported {} pages to {}", page_count, path.display())
            }
            Ok(ExportOutcome::Empty) => log::info!("Nothing to export"),
            Err(StitchError::Cancelled) => log::info!("Export cancelled"),
            Err(e) => log::error!("Export failed: {}", e),
        }
        drop(guard);
        result
    });

    Ok(ExportHandle {
        events: rx,
        cancel,
        task,
    })
}

/// Export synchronously while `guard` holds the session.
///
/// Images are decoded one page at a time, reading each record from the
/// session as it is reached. The document is written only when every page
/// was composed and the job was not cancelled.
pub fn run_export(
    guard: &ExportGuard,
    options: &ExportOptions,
    output: &Path,
    writer: &dyn DocumentWriter,
    cancel: &CancelToken,
    events: &mpsc::UnboundedSender<ExportEvent>,
) -> Result<ExportOutcome> {
    let session: &RwLock<Session> = guard.session();
    let (total, layout) = {
        let s = read_session(session);
        if options.reject_degenerate_crops {
            // Scaling can round a thin crop down to nothing
            for record in s.records() {
                let (width, height) = record.scaled_crop_size(options.scale);
                if width == 0 || height == 0 {
                    return Err(StitchError::DegenerateCrop {
                        name: record.name().to_owned(),
                        width,
                        height,
                    });
                }
            }
        }
        (s.len(), s.layout())
    };

    if total == 0 {
        let _ = events.send(ExportEvent::Completed { total });
        return Ok(ExportOutcome::Empty);
    }

    log::info!("Exporting {} images ({})", total, layout.mode.name());
    let color = options.color_mode();
    let mut pages = Vec::new();
    let mut current = 0;

    for slots in assign_slots(total, layout) {
        let mut decoded = Vec::with_capacity(2);
        for source in slots.sources() {
            cancel.check()?;
            let record = read_session(session)
                .record(source)
                .cloned()
                .ok_or_else(|| {
                    StitchError::Config(format!("Image {source} left the session during export"))
                })?;
            decoded.push((source, prepare_crop(&record, options)?));

            current += 1;
            let _ = events.send(ExportEvent::Progress { current, total });
        }
        pages.push(compose_page(slots, &decoded, color));
    }

    cancel.check()?;
    let bytes = writer.encode(&pages)?;
    cancel.check()?;
    persist_document(&bytes, output)?;

    let _ = events.send(ExportEvent::Completed { total });
    Ok(ExportOutcome::Written {
        path: output.to_owned(),
        page_count: pages.len(),
    })
}
