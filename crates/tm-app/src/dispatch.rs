//! Run dispatch.

use tm_core::RunNumber;
use tracing::{error, info, warn};

use crate::backend::{ArtifactLookup, JobExecutor, TydexLookup};
use crate::completion::CompletionSummary;
use crate::error::{AppError, AppResult};
use crate::matrix::{RunControl, RunStatus};
use crate::notify::RunPhase;
use crate::page::MatrixPage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The executor reported success.
    Completed {
        message: String,
        completion: CompletionSummary,
    },
    /// A dispatch of this run is still outstanding; nothing was submitted.
    AlreadyInFlight,
}

impl<B: ArtifactLookup + TydexLookup + JobExecutor> MatrixPage<B> {
    /// Submit `run` to the job executor, at most once at a time.
    pub async fn dispatch(&self, run: RunNumber) -> AppResult<DispatchOutcome> {
        let (project, protocol) = self.session.target()?;

        // Joining the in-flight set happens before anything can suspend.
        let Some(_in_flight) = self.session.begin_dispatch(run) else {
            info!(run = %run, "Dispatch already in flight, ignored");
            return Ok(DispatchOutcome::AlreadyInFlight);
        };

        let previous = {
            let mut view = self.lock_view();
            let row = view.row_mut(run).ok_or(AppError::RunNotRendered(run))?;
            if row.run_control != RunControl::Ready {
                return Err(AppError::RunUnavailable {
                    run,
                    reason: format!("run control is {:?}", row.run_control),
                });
            }
            let previous = row.status;
            row.status = RunStatus::Running;
            row.run_control = RunControl::Running;
            previous
        };
        self.session.mark_dispatched(run);

        self.notify(run, RunPhase::Running, None);
        info!(project, protocol = %protocol, run = %run, "Dispatching run");

        let failure = match self.backend.submit(project, protocol, run).await {
            Ok(outcome) if outcome.success => {
                self.update_row(run, |row| {
                    row.status = RunStatus::Completed;
                    row.run_control = RunControl::Completed;
                });
                if let Err(e) = self.refresh_rows(Some(run), Some(run), false).await {
                    warn!(run = %run, error = %e, "Status refresh after dispatch failed");
                }
                self.notify(run, RunPhase::Completed, Some(outcome.message.clone()));
                let completion = self.completion();
                info!(run = %run, "Run completed");
                return Ok(DispatchOutcome::Completed {
                    message: outcome.message,
                    completion,
                });
            }
            Ok(outcome) => outcome.message,
            Err(e) => e.to_string(),
        };

        error!(run = %run, message = %failure, "Run failed");
        self.update_row(run, |row| {
            row.status = previous;
            row.run_control = RunControl::Ready;
        });
        if let Err(e) = self.refresh_rows(Some(run), Some(run), false).await {
            warn!(run = %run, error = %e, "Status refresh after dispatch failed");
        }
        self.notify(run, RunPhase::Error, Some(failure.clone()));
        // The artifact may exist despite the executor failure.
        self.completion();
        Err(AppError::Dispatch {
            run,
            message: failure,
        })
    }
}
