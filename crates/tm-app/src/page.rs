//! The matrix page: session, collaborators and the rendered view.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tm_core::{RunNumber, RunRecord};
use tracing::debug;

use crate::completion::{CompletionAggregator, CompletionSummary};
use crate::config::WorkbenchConfig;
use crate::error::{AppError, AppResult};
use crate::matrix::{MatrixRow, MatrixView, render};
use crate::notify::{Notifier, RunNotification, RunPhase};
use crate::session::SessionContext;

/// Bounds of the two Tydex-related calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub row_fetch: Duration,
    pub generation: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            row_fetch: Duration::from_secs(15),
            generation: Duration::from_secs(120),
        }
    }
}

impl From<&WorkbenchConfig> for Timeouts {
    fn from(config: &WorkbenchConfig) -> Self {
        Self {
            row_fetch: config.row_fetch_timeout(),
            generation: config.generation_timeout(),
        }
    }
}

/// One open project matrix.
///
/// Operations take `&self`; the view is only locked between awaits.
pub struct MatrixPage<B> {
    pub(crate) session: SessionContext,
    pub(crate) backend: B,
    pub(crate) timeouts: Timeouts,
    pub(crate) notifier: Notifier,
    pub(crate) completion: CompletionAggregator,
    view: Mutex<MatrixView>,
}

impl<B> MatrixPage<B> {
    /// Render `records` for the session's protocol.
    pub fn new(session: SessionContext, backend: B, records: &[RunRecord]) -> AppResult<Self> {
        let protocol = session.protocol().ok_or(AppError::ConfigurationMissing)?;
        Ok(Self {
            view: Mutex::new(render(records, protocol)),
            session,
            backend,
            timeouts: Timeouts::default(),
            notifier: Notifier::default(),
            completion: CompletionAggregator::default(),
        })
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Replace the whole view with a fresh render of `records`.
    pub fn render(&self, records: &[RunRecord]) {
        let mut view = self.lock_view();
        *view = render(records, view.protocol);
        debug!(rows = view.rows.len(), "Rendered matrix");
    }

    pub fn view(&self) -> MatrixView {
        self.lock_view().clone()
    }

    pub fn row(&self, run: RunNumber) -> Option<MatrixRow> {
        self.lock_view().row(run).cloned()
    }

    /// Completed/total over the rendered rows.
    pub fn completion(&self) -> CompletionSummary {
        self.completion.evaluate(&self.lock_view())
    }

    /// Whether mark-complete has been enabled, without re-counting rows.
    pub fn is_completable(&self) -> bool {
        self.completion.is_completable()
    }

    pub(crate) fn lock_view(&self) -> MutexGuard<'_, MatrixView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to the row of `run`, if rendered.
    pub(crate) fn update_row(&self, run: RunNumber, f: impl FnOnce(&mut MatrixRow)) {
        if let Some(row) = self.lock_view().row_mut(run) {
            f(row);
        }
    }

    pub(crate) fn notify(&self, run: RunNumber, phase: RunPhase, message: Option<String>) {
        let (Some(project), Some(protocol)) = (self.session.project(), self.session.protocol())
        else {
            return;
        };
        self.notifier.publish(RunNotification {
            project: project.to_string(),
            protocol,
            run,
            phase,
            message,
        });
    }
}
