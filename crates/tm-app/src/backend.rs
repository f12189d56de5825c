//! Collaborator contracts consumed by the matrix page.
//!
//! Every async collaborator is a separate trait; `Backend` is the bound the
//! page is generic over.

#![allow(async_fn_in_trait)]

use std::path::PathBuf;

use tm_core::{Protocol, RunNumber, RunRecord};
use tm_store::{ArchivedMatrix, MatrixKey, MatrixStore};

use crate::activity::ActivityEvent;
use crate::error::AppResult;

/// `{success, message}` reply of the job executor and the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub success: bool,
    pub message: String,
}

impl JobOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

pub trait ArtifactLookup {
    /// Whether the primary result artifact of `folder`/`job` exists.
    async fn artifact_exists(
        &self,
        project: &str,
        protocol: Protocol,
        folder: &str,
        job: &str,
    ) -> AppResult<bool>;
}

pub trait TydexLookup {
    async fn tydex_exists(
        &self,
        project: &str,
        protocol: Protocol,
        folder: &str,
        tydex_name: &str,
    ) -> AppResult<bool>;
}

pub trait RowMetadata {
    /// Full record of one rendered row from the store `key` names.
    async fn get_row(&self, key: &MatrixKey, run: RunNumber) -> AppResult<RunRecord>;
}

pub trait JobExecutor {
    /// Execute the run's simulation; may take arbitrarily long.
    async fn submit(&self, project: &str, protocol: Protocol, run: RunNumber)
    -> AppResult<JobOutcome>;
}

pub trait ArtifactGenerator {
    async fn generate(
        &self,
        protocol: Protocol,
        project: &str,
        record: &RunRecord,
    ) -> AppResult<JobOutcome>;

    /// Open `{folder}/{tydex_name}` and return its path.
    async fn open(
        &self,
        project: &str,
        protocol: Protocol,
        folder: &str,
        tydex_name: &str,
    ) -> AppResult<PathBuf>;
}

pub trait ActivityLog {
    async fn record(&self, event: &ActivityEvent) -> AppResult<()>;
}

pub trait Backend:
    ArtifactLookup + TydexLookup + RowMetadata + JobExecutor + ArtifactGenerator + ActivityLog
{
}

impl<T> Backend for T where
    T: ArtifactLookup + TydexLookup + RowMetadata + JobExecutor + ArtifactGenerator + ActivityLog
{
}

/// Persistence of Run Record Stores.
pub trait RunStoreBackend {
    fn save_runs(&self, project: &str, protocol: Protocol, records: &[RunRecord])
    -> AppResult<()>;

    fn load_runs(&self, key: &MatrixKey) -> AppResult<Vec<RunRecord>>;

    fn save_inputs(
        &self,
        project: &str,
        protocol: Protocol,
        inputs: &tm_sheet::TireInputs,
    ) -> AppResult<()>;

    fn archive(
        &self,
        project_id: &str,
        project: &str,
        protocol: Protocol,
        records: &[RunRecord],
    ) -> AppResult<ArchivedMatrix>;
}

impl RunStoreBackend for MatrixStore {
    fn save_runs(
        &self,
        project: &str,
        protocol: Protocol,
        records: &[RunRecord],
    ) -> AppResult<()> {
        Ok(MatrixStore::save_runs(self, project, protocol, records)?)
    }

    fn load_runs(&self, key: &MatrixKey) -> AppResult<Vec<RunRecord>> {
        Ok(self.load(key)?)
    }

    fn save_inputs(
        &self,
        project: &str,
        protocol: Protocol,
        inputs: &tm_sheet::TireInputs,
    ) -> AppResult<()> {
        Ok(MatrixStore::save_inputs(self, project, protocol, inputs)?)
    }

    fn archive(
        &self,
        project_id: &str,
        project: &str,
        protocol: Protocol,
        records: &[RunRecord],
    ) -> AppResult<ArchivedMatrix> {
        Ok(MatrixStore::archive(self, project_id, project, protocol, records)?)
    }
}
