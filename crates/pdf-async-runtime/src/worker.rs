use crate::{StitchCommand, StitchUpdate};
use pdf_stitch::{
    CancelToken, DocumentWriter, ExportEvent, ExportOptions, ExportOutcome, ImageRecord,
    PageLayoutConfig, PdfWriter, Session, SharedSession, StitchError, calculate_statistics,
    compose_preview_page, load_inputs, render_crop_preview, start_export,
};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Worker-side state kept between commands
struct WorkerState {
    session: SharedSession,
    /// Options previews render with; set explicitly or by the last export
    preview_options: ExportOptions,
    export_cancel: Option<CancelToken>,
}

impl WorkerState {
    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records and layout as they are right now
    fn snapshot(&self) -> (Vec<ImageRecord>, PageLayoutConfig) {
        let s = self.read();
        (s.records().to_vec(), s.layout())
    }
}

/// Start a worker on the current runtime.
///
/// Returns the command sender, the update receiver and the worker task.
pub fn spawn_worker(
    session: SharedSession,
) -> (
    mpsc::UnboundedSender<StitchCommand>,
    mpsc::UnboundedReceiver<StitchUpdate>,
    JoinHandle<()>,
) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(worker_task(session, command_rx, update_tx));
    (command_tx, update_rx, task)
}

/// Async worker task that processes stitch commands and sends updates
pub async fn worker_task(
    session: SharedSession,
    mut command_rx: mpsc::UnboundedReceiver<StitchCommand>,
    update_tx: mpsc::UnboundedSender<StitchUpdate>,
) {
    forward_session_events(&session, &update_tx);

    let mut state = WorkerState {
        session,
        preview_options: ExportOptions::default(),
        export_cancel: None,
    };

    while let Some(cmd) = command_rx.recv().await {
        process_command(cmd, &mut state, &mut command_rx, &update_tx).await;
    }
    log::debug!("Command channel closed, worker stopping");
}

fn forward_session_events(session: &SharedSession, update_tx: &mpsc::UnboundedSender<StitchUpdate>) {
    let mut events = session
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .subscribe();
    let update_tx = update_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if update_tx.send(StitchUpdate::SessionChanged { event }).is_err() {
                break;
            }
        }
    });
}

fn send_error(update_tx: &mpsc::UnboundedSender<StitchUpdate>, message: String) {
    log::error!("{}", message);
    let _ = update_tx.send(StitchUpdate::Error { message });
}

async fn process_command(
    cmd: StitchCommand,
    state: &mut WorkerState,
    command_rx: &mut mpsc::UnboundedReceiver<StitchCommand>,
    update_tx: &mpsc::UnboundedSender<StitchUpdate>,
) {
    match cmd {
        StitchCommand::Load { inputs } => handle_load(inputs, state, update_tx).await,
        StitchCommand::Sort { key } => match state.write().sort(key) {
            Ok(()) => {
                let _ = update_tx.send(StitchUpdate::Sorted { key });
            }
            Err(e) => send_error(update_tx, format!("Failed to sort: {e}")),
        },
        StitchCommand::SetLayout { layout } => {
            let stats = {
                let mut s = state.write();
                s.set_layout(layout);
                s.statistics()
            };
            let _ = update_tx.send(StitchUpdate::StatsCalculated { stats });
        }
        StitchCommand::SetMargins { input, scope } => {
            if let Err(e) = state.write().set_margins(input, scope) {
                send_error(update_tx, format!("Failed to apply margins: {e}"));
            }
        }
        StitchCommand::SetPreviewOptions { options } => match options.validate() {
            Ok(()) => state.preview_options = options,
            Err(e) => send_error(update_tx, format!("Invalid preview options: {e}")),
        },
        StitchCommand::RenderPreview { mut page_index } => {
            // Drain any queued preview commands, keeping only the most recent
            while let Ok(next_cmd) = command_rx.try_recv() {
                if let StitchCommand::RenderPreview {
                    page_index: newer,
                } = next_cmd
                {
                    log::debug!("Discarding queued preview render, using newer request");
                    page_index = newer;
                } else {
                    // Can't put it back, so run it before the preview
                    Box::pin(process_command(next_cmd, state, command_rx, update_tx)).await;
                }
            }
            handle_render_preview(page_index, state, update_tx).await;
        }
        StitchCommand::RenderCropPreview { mut index } => {
            while let Ok(next_cmd) = command_rx.try_recv() {
                if let StitchCommand::RenderCropPreview { index: newer } = next_cmd {
                    log::debug!("Discarding queued crop preview, using newer request");
                    index = newer;
                } else {
                    Box::pin(process_command(next_cmd, state, command_rx, update_tx)).await;
                }
            }
            handle_render_crop_preview(index, state, update_tx).await;
        }
        StitchCommand::CalculateStats => {
            let stats = state.read().statistics();
            let _ = update_tx.send(StitchUpdate::StatsCalculated { stats });
        }
        StitchCommand::Export {
            options,
            output_path,
        } => handle_export(options, output_path, state, update_tx),
        StitchCommand::CancelExport => {
            // The session stops exporting as soon as the job ends
            if !state.read().is_exporting() {
                state.export_cancel = None;
            }
            match &state.export_cancel {
                Some(token) => {
                    log::info!("Cancelling export");
                    token.cancel();
                }
                None => log::debug!("No export to cancel"),
            }
        }
    }
}

async fn handle_load(
    inputs: Vec<PathBuf>,
    state: &WorkerState,
    update_tx: &mpsc::UnboundedSender<StitchUpdate>,
) {
    if state.read().is_exporting() {
        send_error(update_tx, StitchError::ExportInProgress.to_string());
        return;
    }

    let report = match load_inputs(&inputs).await {
        Ok(report) => report,
        Err(e) => {
            send_error(update_tx, format!("Failed to load images: {e}"));
            return;
        }
    };

    let count = report.records.len();
    match state.write().replace_records(report.records) {
        Ok(()) => {
            let _ = update_tx.send(StitchUpdate::Loaded {
                count,
                skipped: report.skipped,
            });
        }
        Err(e) => send_error(update_tx, format!("Failed to load images: {e}")),
    }
}

async fn handle_render_preview(
    page_index: usize,
    state: &WorkerState,
    update_tx: &mpsc::UnboundedSender<StitchUpdate>,
) {
    let (records, layout) = state.snapshot();
    let page_count = calculate_statistics(records.len(), layout).output_pages;
    let options = state.preview_options.clone();

    let result = tokio::task::spawn_blocking(move || {
        compose_preview_page(&records, layout, &options, page_index)
    })
    .await;

    match result {
        Ok(Ok(Some(page))) => {
            let rgba = page.image.to_rgba8();
            let _ = update_tx.send(StitchUpdate::PreviewRendered {
                page_index,
                page_count,
                width: rgba.width() as usize,
                height: rgba.height() as usize,
                rgba_data: rgba.into_raw(),
            });
        }
        Ok(Ok(None)) => send_error(
            update_tx,
            format!("Page {} does not exist ({} pages)", page_index + 1, page_count),
        ),
        Ok(Err(e)) => send_error(update_tx, format!("Failed to render preview: {e}")),
        Err(e) => send_error(update_tx, format!("Preview task failed: {e}")),
    }
}

async fn handle_render_crop_preview(
    index: usize,
    state: &WorkerState,
    update_tx: &mpsc::UnboundedSender<StitchUpdate>,
) {
    let Some(record) = state.read().record(index).cloned() else {
        send_error(update_tx, format!("No image at position {index}"));
        return;
    };

    match tokio::task::spawn_blocking(move || render_crop_preview(&record)).await {
        Ok(Ok(rgba)) => {
            let _ = update_tx.send(StitchUpdate::CropPreviewRendered {
                index,
                width: rgba.width() as usize,
                height: rgba.height() as usize,
                rgba_data: rgba.into_raw(),
            });
        }
        Ok(Err(e)) => send_error(update_tx, format!("Failed to render crop preview: {e}")),
        Err(e) => send_error(update_tx, format!("Crop preview task failed: {e}")),
    }
}

fn handle_export(
    options: ExportOptions,
    output_path: PathBuf,
    state: &mut WorkerState,
    update_tx: &mpsc::UnboundedSender<StitchUpdate>,
) {
    let title = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Stitched".to_string());
    let writer: Arc<dyn DocumentWriter> = Arc::new(PdfWriter::new(title, &options));

    let mut handle = match start_export(&state.session, options.clone(), output_path, writer) {
        Ok(handle) => handle,
        Err(e) => {
            send_error(update_tx, format!("Failed to start export: {e}"));
            return;
        }
    };
    state.preview_options = options;
    state.export_cancel = Some(handle.cancel_token());

    let update_tx = update_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = handle.events.recv().await {
            if let ExportEvent::Progress { current, total } = event {
                let _ = update_tx.send(StitchUpdate::Progress {
                    operation: "Exporting".to_string(),
                    current,
                    total,
                });
            }
        }

        let update = match handle.wait().await {
            Ok(ExportOutcome::Written { path, page_count }) => {
                StitchUpdate::ExportComplete { path, page_count }
            }
            Ok(ExportOutcome::Empty) => StitchUpdate::ExportSkipped,
            Err(StitchError::Cancelled) => StitchUpdate::ExportCancelled,
            Err(e) => StitchUpdate::Error {
                message: format!("Export failed: {e}"),
            },
        };
        let _ = update_tx.send(update);
    });
}
