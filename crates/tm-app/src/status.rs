//! Run status reconciliation.
//!
//! Status is polled: on page load, when the page regains visibility and
//! after a dispatch settles. Rows with a dispatch in flight are left alone.

use tm_core::{Protocol, RunNumber, RunRecord};
use tracing::{debug, warn};

use crate::backend::{ArtifactLookup, TydexLookup};
use crate::error::AppResult;
use crate::matrix::{ArtifactControl, MatrixRow, RunControl, RunStatus};
use crate::page::MatrixPage;

/// Result of looking up the backend for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    NotStarted,
    Completed { tydex: ArtifactControl },
}

impl<B: ArtifactLookup + TydexLookup> MatrixPage<B> {
    /// Reconcile `target`, or every rendered row when `None`.
    ///
    /// Scratch rows never dispatched in this session are assumed not started
    /// and are not queried.
    pub async fn refresh(&self, target: Option<RunNumber>) -> AppResult<()> {
        self.refresh_rows(target, None, false).await
    }

    /// Query the backend for `run` even if this session never dispatched it,
    /// for callers whose dispatch history lives outside the session. Lookup
    /// faults still leave such a row at its prior status.
    pub async fn reconcile(&self, run: RunNumber) -> AppResult<()> {
        self.refresh_rows(Some(run), None, true).await
    }

    /// Page came back to the foreground.
    pub async fn on_visibility_regained(&self) -> AppResult<()> {
        self.refresh(None).await
    }

    /// `owner` is an in-flight run whose dispatch is doing the refresh.
    /// `force` queries scratch rows with no dispatch history.
    pub(crate) async fn refresh_rows(
        &self,
        target: Option<RunNumber>,
        owner: Option<RunNumber>,
        force: bool,
    ) -> AppResult<()> {
        let (project, protocol) = self.session.target()?;
        let runs = match target {
            Some(run) => vec![run],
            None => self.lock_view().runs(),
        };

        for run in runs {
            if self.session.is_in_flight(run) && owner != Some(run) {
                debug!(run = %run, "Dispatch in flight, status left as is");
                continue;
            }
            let Some(record) = self.row(run).map(|r| r.record) else {
                continue;
            };

            let queried = self.session.is_archived()
                || self.session.was_dispatched(run)
                || owner == Some(run)
                || force;
            if !queried {
                self.apply(run, owner, |row, run_controls| {
                    set_not_started(row, run_controls);
                });
                continue;
            }

            match self.lookup(project, protocol, &record).await {
                Ok(found) => self.apply(run, owner, |row, run_controls| match found {
                    Lookup::NotStarted => set_not_started(row, run_controls),
                    Lookup::Completed { tydex } => {
                        row.status = RunStatus::Completed;
                        row.run_control = if run_controls {
                            RunControl::Completed
                        } else {
                            RunControl::Hidden
                        };
                        row.artifact_control = tydex;
                    }
                }),
                Err(e) => {
                    let known = self.session.is_archived() || self.session.was_dispatched(run);
                    warn!(run = %run, error = %e, known, "Artifact lookup failed");
                    if known {
                        self.apply(run, owner, |row, run_controls| {
                            row.status = RunStatus::Error;
                            row.run_control = if run_controls {
                                RunControl::Ready
                            } else {
                                RunControl::Hidden
                            };
                            row.artifact_control = ArtifactControl::Hidden;
                        });
                    }
                }
            }
        }
        Ok(())
    }

    async fn lookup(&self, project: &str, protocol: Protocol, record: &RunRecord) -> AppResult<Lookup> {
        let folder = record.folder_name();
        if !self
            .backend
            .artifact_exists(project, protocol, &folder, record.job())
            .await?
        {
            return Ok(Lookup::NotStarted);
        }

        let tydex_name = record.tydex_name().trim();
        if tydex_name.is_empty() {
            return Ok(Lookup::Completed {
                tydex: ArtifactControl::Hidden,
            });
        }
        let tydex = match self
            .backend
            .tydex_exists(project, protocol, &folder, tydex_name)
            .await
        {
            Ok(true) => ArtifactControl::Open,
            Ok(false) => ArtifactControl::Generate,
            Err(e) => {
                warn!(run = %record.run_number, error = %e, "Tydex lookup failed");
                ArtifactControl::Generate
            }
        };
        Ok(Lookup::Completed { tydex })
    }

    /// Apply a status change unless a dispatch started meanwhile.
    fn apply(&self, run: RunNumber, owner: Option<RunNumber>, f: impl FnOnce(&mut MatrixRow, bool)) {
        if self.session.is_in_flight(run) && owner != Some(run) {
            return;
        }
        let run_controls = self.session.controls().run_controls;
        self.update_row(run, |row| {
            // A generation in progress keeps its control.
            let generating = row.artifact_control == ArtifactControl::Generating;
            f(row, run_controls);
            if generating {
                row.artifact_control = ArtifactControl::Generating;
            }
        });
    }
}

fn set_not_started(row: &mut MatrixRow, run_controls: bool) {
    row.status = RunStatus::NotStarted;
    row.run_control = if run_controls {
        RunControl::Ready
    } else {
        RunControl::Hidden
    };
    row.artifact_control = ArtifactControl::Hidden;
}
