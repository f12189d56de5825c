#![allow(dead_code)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tm_app::{
    ActivityEvent, ActivityLog, AppError, AppResult, ArtifactGenerator, ArtifactLookup,
    JobExecutor, JobOutcome, MatrixPage, RowMetadata, SessionContext, TydexLookup,
};
use tm_core::{Field, Protocol, RunNumber, RunRecord};
use tm_store::MatrixKey;
use tokio::sync::Notify;

pub fn rn(n: u32) -> RunNumber {
    RunNumber::new(n).unwrap()
}

pub fn cdtire_record(n: u32, template: &str) -> RunRecord {
    RunRecord::new(rn(n))
        .with_field(Field::TestName, format!("Test {n}"))
        .with_field(Field::InflationPressure, "35")
        .with_field(Field::Job, format!("job_{n}"))
        .with_field(Field::TemplateTydex, template)
        .with_field(Field::TydexName, format!("out_{n}.tdx"))
        .with_tags("P1", format!("L{n}"))
}

pub fn cdtire_records() -> Vec<RunRecord> {
    (1..=3).map(|n| cdtire_record(n, "template.tdx")).collect()
}

/// In-memory collaborators that count every call.
#[derive(Default)]
pub struct FakeBackend {
    records: Vec<RunRecord>,
    artifacts: Mutex<HashSet<String>>,
    tydex: Mutex<HashSet<String>>,
    pub fail_lookups: AtomicBool,
    pub fail_submit: AtomicBool,
    pub reject_generate: AtomicBool,
    submit_gate: Option<Arc<Notify>>,
    row_delay: Option<Duration>,
    generate_delay: Option<Duration>,
    lookup_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    row_calls: AtomicUsize,
    generate_calls: AtomicUsize,
    events: Mutex<Vec<ActivityEvent>>,
}

impl FakeBackend {
    pub fn new(records: Vec<RunRecord>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    /// Hold every submission until the gate is notified.
    pub fn with_submit_gate(mut self, gate: Arc<Notify>) -> Self {
        self.submit_gate = Some(gate);
        self
    }

    pub fn with_row_delay(mut self, delay: Duration) -> Self {
        self.row_delay = Some(delay);
        self
    }

    pub fn with_generate_delay(mut self, delay: Duration) -> Self {
        self.generate_delay = Some(delay);
        self
    }

    /// Mark the primary artifact of `run` as present.
    pub fn complete(&self, run: u32) {
        if let Some(record) = self.records.iter().find(|r| r.run_number == rn(run)) {
            self.artifacts
                .lock()
                .unwrap()
                .insert(format!("{}/{}", record.folder_name(), record.job()));
        }
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn row_calls(&self) -> usize {
        self.row_calls.load(Ordering::SeqCst)
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.lookup_calls() + self.submit_calls() + self.row_calls() + self.generate_calls()
    }

    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ArtifactLookup for FakeBackend {
    async fn artifact_exists(
        &self,
        _project: &str,
        _protocol: Protocol,
        folder: &str,
        job: &str,
    ) -> AppResult<bool> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(AppError::Backend {
                message: "lookup unavailable".to_string(),
            });
        }
        Ok(self
            .artifacts
            .lock()
            .unwrap()
            .contains(&format!("{folder}/{job}")))
    }
}

impl TydexLookup for FakeBackend {
    async fn tydex_exists(
        &self,
        _project: &str,
        _protocol: Protocol,
        folder: &str,
        tydex_name: &str,
    ) -> AppResult<bool> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tydex
            .lock()
            .unwrap()
            .contains(&format!("{folder}/{tydex_name}")))
    }
}

impl RowMetadata for FakeBackend {
    async fn get_row(&self, _key: &MatrixKey, run: RunNumber) -> AppResult<RunRecord> {
        self.row_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.row_delay {
            tokio::time::sleep(delay).await;
        }
        self.records
            .iter()
            .find(|r| r.run_number == run)
            .cloned()
            .ok_or_else(|| AppError::Store(format!("Run {run} not found")))
    }
}

impl JobExecutor for FakeBackend {
    async fn submit(
        &self,
        _project: &str,
        _protocol: Protocol,
        run: RunNumber,
    ) -> AppResult<JobOutcome> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.submit_gate {
            gate.notified().await;
        }
        if self.fail_submit.load(Ordering::SeqCst) {
            return Ok(JobOutcome::failed("solver diverged"));
        }
        self.complete(run.get());
        Ok(JobOutcome::ok(format!("run {run} finished")))
    }
}

impl ArtifactGenerator for FakeBackend {
    async fn generate(
        &self,
        _protocol: Protocol,
        _project: &str,
        record: &RunRecord,
    ) -> AppResult<JobOutcome> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.generate_delay {
            tokio::time::sleep(delay).await;
        }
        if self.reject_generate.load(Ordering::SeqCst) {
            return Ok(JobOutcome::failed("template not readable"));
        }
        self.tydex.lock().unwrap().insert(format!(
            "{}/{}",
            record.folder_name(),
            record.tydex_name()
        ));
        Ok(JobOutcome::ok("generated"))
    }

    async fn open(
        &self,
        _project: &str,
        _protocol: Protocol,
        folder: &str,
        tydex_name: &str,
    ) -> AppResult<PathBuf> {
        Ok(PathBuf::from(folder).join(tydex_name))
    }
}

impl ActivityLog for FakeBackend {
    async fn record(&self, event: &ActivityEvent) -> AppResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub fn scratch_session() -> SessionContext {
    SessionContext::new(Some("Tire A".into()), Some(Protocol::CdTire), None)
}

pub fn archived_session() -> SessionContext {
    SessionContext::new(
        Some("Tire A".into()),
        Some(Protocol::CdTire),
        Some("prj-7".into()),
    )
}

pub fn page(session: SessionContext, backend: FakeBackend) -> MatrixPage<FakeBackend> {
    let records = backend.records.clone();
    MatrixPage::new(session, backend, &records).unwrap()
}
