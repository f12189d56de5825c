//! Tydex generation and opening.

use std::path::PathBuf;

use tm_core::{RunNumber, RunRecord};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::activity::{ActivityEvent, ActivityKind, log_activity};
use crate::backend::{ActivityLog, ArtifactGenerator, RowMetadata};
use crate::error::{AppError, AppResult, TydexError, TydexStage};
use crate::matrix::{ArtifactControl, RunStatus};
use crate::page::MatrixPage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TydexOutcome {
    Generated { message: String },
    /// The control already opens the file; nothing was regenerated.
    AlreadyGenerated,
    /// A generation for this row is still running.
    InProgress,
}

impl<B: RowMetadata + ArtifactGenerator + ActivityLog> MatrixPage<B> {
    async fn fetch_row(&self, run: RunNumber) -> Result<RunRecord, TydexError> {
        let key = self
            .session
            .matrix_key()
            .map_err(|e| TydexError::RowFetch(e.to_string()))?;
        match timeout(self.timeouts.row_fetch, self.backend.get_row(&key, run)).await {
            Err(_) => Err(TydexError::Timeout {
                stage: TydexStage::RowFetch,
            }),
            Ok(Err(e)) => Err(TydexError::RowFetch(e.to_string())),
            Ok(Ok(record)) => Ok(record),
        }
    }

    /// Generate the Tydex of a completed run from its template.
    pub async fn generate_tydex(&self, run: RunNumber) -> AppResult<TydexOutcome> {
        let (project, protocol) = self.session.target()?;
        let row = self.row(run).ok_or(AppError::RunNotRendered(run))?;

        if !row.record.has_template() {
            return Err(TydexError::MissingTemplate { run }.into());
        }
        match row.artifact_control {
            ArtifactControl::Open => return Ok(TydexOutcome::AlreadyGenerated),
            ArtifactControl::Generating => return Ok(TydexOutcome::InProgress),
            ArtifactControl::Hidden | ArtifactControl::Generate => {}
        }
        if row.status != RunStatus::Completed {
            return Err(TydexError::NotCompleted { run }.into());
        }

        let record = self.fetch_row(run).await?;
        if !record.has_template() {
            return Err(TydexError::MissingTemplate { run }.into());
        }

        let original = row.artifact_control;
        self.update_row(run, |row| row.artifact_control = ArtifactControl::Generating);

        let result = match timeout(
            self.timeouts.generation,
            self.backend.generate(protocol, project, &record),
        )
        .await
        {
            Err(_) => Err(TydexError::Timeout {
                stage: TydexStage::Generation,
            }),
            Ok(Err(e)) => Err(TydexError::Backend(e.to_string())),
            Ok(Ok(outcome)) if !outcome.success => Err(TydexError::Rejected(outcome.message)),
            Ok(Ok(outcome)) => Ok(outcome.message),
        };

        match result {
            Ok(message) => {
                self.update_row(run, |row| row.artifact_control = ArtifactControl::Open);
                info!(run = %run, tydex = %record.tydex_name(), "Tydex generated");
                let event = ActivityEvent::new(
                    ActivityKind::Tydex,
                    "Generated",
                    format!(
                        "Generated TYDEX file for {} test {}",
                        protocol,
                        record.label(protocol)
                    ),
                )
                .with_meta("project", project)
                .with_meta("protocol", protocol)
                .with_meta("run", run)
                .with_meta("tydex_name", record.tydex_name());
                log_activity(&self.backend, event).await;
                Ok(TydexOutcome::Generated { message })
            }
            Err(e) => {
                warn!(run = %run, error = %e, "Tydex generation failed");
                self.update_row(run, |row| row.artifact_control = original);
                Err(e.into())
            }
        }
    }

    /// Open the generated Tydex of `run`.
    pub async fn open_tydex(&self, run: RunNumber) -> AppResult<PathBuf> {
        let (project, protocol) = self.session.target()?;
        if self.row(run).is_none() {
            return Err(AppError::RunNotRendered(run));
        }
        let record = self.fetch_row(run).await?;
        let tydex_name = record.tydex_name().trim();
        if tydex_name.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Run {run} has no tydex_name"
            )));
        }
        let path = self
            .backend
            .open(project, protocol, &record.folder_name(), tydex_name)
            .await?;
        info!(run = %run, path = %path.display(), "Opened Tydex");
        Ok(path)
    }
}
