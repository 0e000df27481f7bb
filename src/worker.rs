//! # Background Structure Validation
//!
//! Structural spreadsheet checks run off the interactive thread so large
//! files do not block the UI. The worker posts progress and a final
//! result/error over a channel and is aborted (via the returned handle) when
//! the selected file changes.
//!
//! Template-driven re-validation is debounced so validators do not re-run on
//! every keystroke.

use crate::excel_parser::{check_rows, load_rows, StructureReport};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default debounce window for template edits
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(400);

/// Messages posted by the validation worker
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationEvent {
    /// Parsing progress, 0–100
    Progress(u8),
    Completed(StructureReport),
    Failed(String),
}

/// Spawn the structural validation of a spreadsheet off the current thread
///
/// Progress and the final report (or error) arrive on `events`. Dropping or
/// aborting the returned handle cancels the run; an aborted worker simply
/// stops posting.
pub fn spawn_structure_validation(
    path: PathBuf,
    events: mpsc::UnboundedSender<ValidationEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let _ = events.send(ValidationEvent::Progress(0));

        let loaded = tokio::task::spawn_blocking(move || load_rows(&path)).await;

        let rows = match loaded {
            Ok(Ok(rows)) => rows,
            Ok(Err(err)) => {
                warn!("Structure validation failed: {:#}", err);
                let _ = events.send(ValidationEvent::Failed(format!("{:#}", err)));
                return;
            }
            Err(join_err) => {
                let _ = events.send(ValidationEvent::Failed(join_err.to_string()));
                return;
            }
        };

        let _ = events.send(ValidationEvent::Progress(50));

        let report = check_rows(&rows);
        info!(
            "Structure validation finished: {} meals, {} issues",
            report.meal_count,
            report.issues.len()
        );

        let _ = events.send(ValidationEvent::Progress(100));
        let _ = events.send(ValidationEvent::Completed(report));
    })
}

/// Coalesces rapid successive triggers into one
///
/// Each call to [`Debouncer::trigger`] bumps a generation counter and waits
/// out the window; only the call that is still the latest generation when
/// the window elapses reports `true`. Earlier calls resolve `false`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    generation: Arc<AtomicU64>,
    window: Duration,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            window,
        }
    }

    /// Wait out the debounce window; `true` when no newer trigger arrived
    pub async fn trigger(&self) -> bool {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.window).await;
        let latest = self.generation.load(Ordering::SeqCst);
        if latest == my_generation {
            true
        } else {
            debug!("Debounced trigger superseded by a newer one");
            false
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}
