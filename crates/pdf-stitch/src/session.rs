//! The editing session
//!
//! A session owns the one ordered collection of records. Views read it,
//! loading and sorting replace or reorder it, and every change is announced
//! to the subscribed observers.

use crate::margins::{MarginEditor, MarginInput, MarginScope};
use crate::options::StitchOptions;
use crate::record::ImageRecord;
use crate::sequence::sort_records;
use crate::stats::calculate_statistics;
use crate::types::*;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;

/// A session shared between the interactive side and the export worker
pub type SharedSession = Arc<RwLock<Session>>;

/// Change notifications sent to observers
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Loaded { count: usize },
    Sorted { key: SortKey },
    LayoutChanged { layout: PageLayoutConfig },
    MarginsChanged { scope: MarginScope },
    SelectionChanged { index: usize },
    ExportStarted,
    ExportFinished,
}

#[derive(Debug, Default)]
pub struct Session {
    records: Vec<ImageRecord>,
    layout: PageLayoutConfig,
    sort_key: SortKey,
    editor: MarginEditor,
    current: usize,
    exporting: bool,
    observers: Vec<mpsc::UnboundedSender<SessionEvent>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: &StitchOptions) -> Self {
        Self {
            layout: options.layout,
            sort_key: options.sort_key,
            ..Self::default()
        }
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    /// Register an observer; it receives every later event
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.push(tx);
        rx
    }

    fn notify(&mut self, event: SessionEvent) {
        self.observers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.exporting {
            Err(StitchError::ExportInProgress)
        } else {
            Ok(())
        }
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&ImageRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn layout(&self) -> PageLayoutConfig {
        self.layout
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn editor(&self) -> &MarginEditor {
        &self.editor
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// Replace the whole collection with a freshly loaded batch.
    ///
    /// The batch is sorted by the current key and the margin editor limits
    /// follow its largest image.
    pub fn replace_records(&mut self, records: Vec<ImageRecord>) -> Result<()> {
        self.ensure_idle()?;
        self.records = records;
        sort_records(&mut self.records, self.sort_key);

        let max_width = self.records.iter().map(|r| r.width()).max().unwrap_or(0);
        let max_height = self.records.iter().map(|r| r.height()).max().unwrap_or(0);
        self.editor.reset(max_width, max_height);
        self.current = 0;

        log::info!("Session holds {} images", self.records.len());
        self.notify(SessionEvent::Loaded {
            count: self.records.len(),
        });
        Ok(())
    }

    /// Reorder the collection by `key` and remember the key for reloads
    pub fn sort(&mut self, key: SortKey) -> Result<()> {
        self.ensure_idle()?;
        self.sort_key = key;
        sort_records(&mut self.records, key);
        self.current = 0;
        self.notify(SessionEvent::Sorted { key });
        Ok(())
    }

    pub fn set_layout(&mut self, layout: PageLayoutConfig) {
        if layout != self.layout {
            self.layout = layout;
            self.notify(SessionEvent::LayoutChanged { layout });
        }
    }

    pub fn set_apply_to_all(&mut self, apply_to_all: bool) {
        self.editor.set_apply_to_all(apply_to_all);
    }

    /// Apply margin input to the records in `scope`.
    ///
    /// Each record clamps the input to its own size.
    pub fn set_margins(&mut self, input: MarginInput, scope: MarginScope) -> Result<()> {
        self.ensure_idle()?;
        let targets = match scope {
            MarginScope::All => 0..self.records.len(),
            MarginScope::Single(index) if index < self.records.len() => index..index + 1,
            MarginScope::Single(index) => {
                return Err(StitchError::Config(format!(
                    "No image at position {index} (have {})",
                    self.records.len()
                )));
            }
        };

        let input = self.editor.set_input(input);
        for record in &mut self.records[targets] {
            record.set_margins(input);
        }
        self.notify(SessionEvent::MarginsChanged { scope });
        Ok(())
    }

    /// Apply margin input to the current image, or to all of them when the
    /// editor's apply-to-all flag is set
    pub fn edit_margins(&mut self, input: MarginInput) -> Result<()> {
        let scope = self.editor.scope_for(self.current);
        self.set_margins(input, scope)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_record(&self) -> Option<&ImageRecord> {
        self.records.get(self.current)
    }

    /// Move the selection, wrapping around both ends.
    ///
    /// Returns the new index, or `None` when nothing is loaded.
    pub fn select(&mut self, index: isize) -> Option<usize> {
        let count = self.records.len() as isize;
        if count == 0 {
            return None;
        }
        self.current = index.rem_euclid(count) as usize;
        self.notify(SessionEvent::SelectionChanged {
            index: self.current,
        });
        Some(self.current)
    }

    pub fn statistics(&self) -> StitchStatistics {
        calculate_statistics(self.records.len(), self.layout)
    }
}

pub(crate) fn read_session(session: &RwLock<Session>) -> RwLockReadGuard<'_, Session> {
    session.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_session(session: &RwLock<Session>) -> RwLockWriteGuard<'_, Session> {
    session.write().unwrap_or_else(PoisonError::into_inner)
}

/// Marks a session as exporting for as long as it lives.
///
/// While held, loading, sorting and margin edits fail with
/// [`StitchError::ExportInProgress`], and so does a second [`begin_export`].
#[derive(Debug)]
pub struct ExportGuard {
    session: SharedSession,
}

/// Mark `session` as exporting.
///
/// Fails with [`StitchError::ExportInProgress`] when another export holds it.
pub fn begin_export(session: &SharedSession) -> Result<ExportGuard> {
    let mut s = write_session(session);
    s.ensure_idle()?;
    s.exporting = true;
    s.notify(SessionEvent::ExportStarted);
    Ok(ExportGuard {
        session: Arc::clone(session),
    })
}

impl ExportGuard {
    pub fn session(&self) -> &SharedSession {
        &self.session
    }
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        let mut s = write_session(&self.session);
        s.exporting = false;
        s.notify(SessionEvent::ExportFinished);
    }
}
