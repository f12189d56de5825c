//! Filesystem- and process-backed collaborators.
//!
//! Layout under the workspace root:
//! - `projects/{project}_{protocol}/{folder}/{job}.{ext}`: primary artifact
//! - `projects/{project}_{protocol}/{folder}/{tydex_name}`: Tydex artifact
//! - `store/`: Run Record Stores
//! - `activity.jsonl`: activity log

use std::path::PathBuf;

use tm_core::{Protocol, RunNumber, RunRecord};
use tm_store::{MatrixKey, MatrixStore, path_component};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::activity::ActivityEvent;
use crate::backend::{
    ActivityLog, ArtifactGenerator, ArtifactLookup, JobExecutor, JobOutcome, RowMetadata,
    TydexLookup,
};
use crate::config::{WorkbenchConfig, render_command};
use crate::error::{AppError, AppResult};

pub struct LocalBackend {
    config: WorkbenchConfig,
    store: MatrixStore,
}

impl LocalBackend {
    pub fn new(config: WorkbenchConfig) -> AppResult<Self> {
        let store = MatrixStore::for_workspace(&config.workspace_root)?;
        Ok(Self { config, store })
    }

    pub fn store(&self) -> &MatrixStore {
        &self.store
    }

    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    fn project_dir(&self, project: &str, protocol: Protocol) -> AppResult<PathBuf> {
        Ok(self
            .config
            .project_dir(path_component(project)?, protocol.key()))
    }

    /// Folder and file names come from sheet cells and must stay inside the
    /// project directory.
    fn folder_dir(&self, project: &str, protocol: Protocol, folder: &str) -> AppResult<PathBuf> {
        Ok(self
            .project_dir(project, protocol)?
            .join(path_component(folder)?))
    }

    fn artifact_path(
        &self,
        project: &str,
        protocol: Protocol,
        folder: &str,
        file: &str,
    ) -> AppResult<PathBuf> {
        Ok(self
            .folder_dir(project, protocol, folder)?
            .join(path_component(file)?))
    }

    async fn run_command(&self, argv: Vec<String>) -> AppResult<JobOutcome> {
        let Some((program, args)) = argv.split_first() else {
            return Err(AppError::Config("command template is empty".to_string()));
        };
        debug!(program, ?args, "Spawning command");
        let output = Command::new(program)
            .args(args)
            .current_dir(&self.config.workspace_root)
            .output()
            .await
            .map_err(|e| AppError::Backend {
                message: format!("failed to start {program}: {e}"),
            })?;

        if output.status.success() {
            Ok(JobOutcome::ok(
                String::from_utf8_lossy(&output.stdout).trim().to_string(),
            ))
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("{program} exited with {}", output.status)
            } else {
                stderr
            };
            Ok(JobOutcome::failed(message))
        }
    }

    fn vars<'a>(
        &self,
        project: &'a str,
        protocol: Protocol,
        run: &'a str,
        record: &'a RunRecord,
        folder: &'a str,
        dir: &'a str,
    ) -> [(&'static str, &'a str); 8] {
        [
            ("project", project),
            ("protocol", protocol.key()),
            ("run", run),
            ("folder", folder),
            ("job", record.job()),
            ("template", record.template_tydex()),
            ("tydex", record.tydex_name()),
            ("dir", dir),
        ]
    }
}

impl ArtifactLookup for LocalBackend {
    async fn artifact_exists(
        &self,
        project: &str,
        protocol: Protocol,
        folder: &str,
        job: &str,
    ) -> AppResult<bool> {
        if job.trim().is_empty() {
            return Ok(false);
        }
        let file = format!("{}.{}", job.trim(), self.config.primary_artifact_extension);
        let path = self.artifact_path(project, protocol, folder, &file)?;
        Ok(tokio::fs::try_exists(path).await?)
    }
}

impl TydexLookup for LocalBackend {
    async fn tydex_exists(
        &self,
        project: &str,
        protocol: Protocol,
        folder: &str,
        tydex_name: &str,
    ) -> AppResult<bool> {
        let path = self.artifact_path(project, protocol, folder, tydex_name)?;
        Ok(tokio::fs::try_exists(path).await?)
    }
}

impl RowMetadata for LocalBackend {
    async fn get_row(&self, key: &MatrixKey, run: RunNumber) -> AppResult<RunRecord> {
        self.store
            .load(key)?
            .into_iter()
            .find(|r| r.run_number == run)
            .ok_or_else(|| AppError::Store(format!("Run {run} not found")))
    }
}

impl JobExecutor for LocalBackend {
    async fn submit(
        &self,
        project: &str,
        protocol: Protocol,
        run: RunNumber,
    ) -> AppResult<JobOutcome> {
        if self.config.job_command.is_empty() {
            return Err(AppError::Config("job_command is not configured".to_string()));
        }
        let record = self.store.load_run(project, protocol, run)?;
        let folder = record.folder_name();
        let dir = self.project_dir(project, protocol)?;
        tokio::fs::create_dir_all(self.folder_dir(project, protocol, &folder)?).await?;

        let run_text = run.to_string();
        let dir_text = dir.to_string_lossy();
        let argv = render_command(
            &self.config.job_command,
            &self.vars(project, protocol, &run_text, &record, &folder, &dir_text),
        );
        info!(project, protocol = %protocol, run = %run, "Running job command");
        self.run_command(argv).await
    }
}

impl ArtifactGenerator for LocalBackend {
    async fn generate(
        &self,
        protocol: Protocol,
        project: &str,
        record: &RunRecord,
    ) -> AppResult<JobOutcome> {
        if self.config.tydex_command.is_empty() {
            return Err(AppError::Config("tydex_command is not configured".to_string()));
        }
        let folder = record.folder_name();
        self.folder_dir(project, protocol, &folder)?;
        if !record.tydex_name().trim().is_empty() {
            path_component(record.tydex_name())?;
        }
        let dir = self.project_dir(project, protocol)?;
        let run_text = record.run_number.to_string();
        let dir_text = dir.to_string_lossy();
        let argv = render_command(
            &self.config.tydex_command,
            &self.vars(project, protocol, &run_text, record, &folder, &dir_text),
        );
        self.run_command(argv).await
    }

    async fn open(
        &self,
        project: &str,
        protocol: Protocol,
        folder: &str,
        tydex_name: &str,
    ) -> AppResult<PathBuf> {
        let path = self.artifact_path(project, protocol, folder, tydex_name)?;
        if !tokio::fs::try_exists(&path).await? {
            return Err(AppError::Backend {
                message: format!("Tydex file not found: {}", path.display()),
            });
        }
        if !self.config.open_command.is_empty() {
            let path_text = path.to_string_lossy();
            let argv = render_command(
                &self.config.open_command,
                &[("tydex", tydex_name), ("folder", folder), ("path", &*path_text)],
            );
            let outcome = self.run_command(argv).await?;
            if !outcome.success {
                return Err(AppError::Backend {
                    message: outcome.message,
                });
            }
        }
        Ok(path)
    }
}

impl ActivityLog for LocalBackend {
    async fn record(&self, event: &ActivityEvent) -> AppResult<()> {
        let path = self.config.activity_log_path();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut line = serde_json::to_string(event).map_err(|e| AppError::Backend {
            message: format!("failed to encode activity: {e}"),
        })?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
