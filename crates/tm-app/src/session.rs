//! Session context of one matrix page.
//!
//! Created when a project matrix is opened and cleared on navigation away.
//! Holds the project/protocol selection, the archived/scratch mode, the
//! In-flight Run Set and the set of runs dispatched during this session.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tm_core::{Protocol, RunNumber};
use tm_store::MatrixKey;

use crate::error::{AppError, AppResult};
use crate::lifecycle::{LifecycleControls, ProjectStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixMode {
    /// New, unarchived project.
    Scratch,
    /// Saved project viewed by id.
    Archived { project_id: String },
}

#[derive(Debug, Default)]
pub struct SessionContext {
    project: Option<String>,
    protocol: Option<Protocol>,
    project_id: Option<String>,
    status: Mutex<Option<ProjectStatus>>,
    in_flight: Mutex<HashSet<RunNumber>>,
    dispatched: Mutex<HashSet<RunNumber>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Membership of one run in the In-flight Run Set.
///
/// Dropping the guard removes the run, whichever way the dispatch ends.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<RunNumber>>,
    run: RunNumber,
}

impl InFlightGuard<'_> {
    pub fn run(&self) -> RunNumber {
        self.run
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock(self.set).remove(&self.run);
    }
}

impl SessionContext {
    pub fn new(
        project: Option<String>,
        protocol: Option<Protocol>,
        project_id: Option<String>,
    ) -> Self {
        let non_empty = |s: String| {
            let trimmed = s.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        };
        Self {
            project: project.and_then(non_empty),
            protocol,
            project_id: project_id.and_then(non_empty),
            ..Default::default()
        }
    }

    pub fn with_status(self, status: Option<ProjectStatus>) -> Self {
        *lock(&self.status) = status;
        self
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn protocol(&self) -> Option<Protocol> {
        self.protocol
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Archived mode is keyed off the presence of a project id.
    pub fn mode(&self) -> MatrixMode {
        match &self.project_id {
            Some(id) => MatrixMode::Archived {
                project_id: id.clone(),
            },
            None => MatrixMode::Scratch,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.project_id.is_some()
    }

    /// Project name and protocol, or `ConfigurationMissing`.
    pub fn target(&self) -> AppResult<(&str, Protocol)> {
        match (self.project.as_deref(), self.protocol) {
            (Some(project), Some(protocol)) => Ok((project, protocol)),
            _ => Err(AppError::ConfigurationMissing),
        }
    }

    /// The Run Record Store this session reads.
    pub fn matrix_key(&self) -> AppResult<MatrixKey> {
        if let Some(project_id) = &self.project_id {
            return Ok(MatrixKey::Archived {
                project_id: project_id.clone(),
            });
        }
        let (project, protocol) = self.target()?;
        Ok(MatrixKey::Scratch {
            project: project.to_string(),
            protocol,
        })
    }

    pub fn status(&self) -> Option<ProjectStatus> {
        *lock(&self.status)
    }

    pub fn set_status(&self, status: ProjectStatus) {
        *lock(&self.status) = Some(status);
    }

    pub fn controls(&self) -> LifecycleControls {
        LifecycleControls::for_status(self.status(), self.is_archived())
    }

    /// Add `run` to the In-flight Run Set, or `None` if it is already there.
    pub fn begin_dispatch(&self, run: RunNumber) -> Option<InFlightGuard<'_>> {
        if !lock(&self.in_flight).insert(run) {
            return None;
        }
        Some(InFlightGuard {
            set: &self.in_flight,
            run,
        })
    }

    pub fn is_in_flight(&self, run: RunNumber) -> bool {
        lock(&self.in_flight).contains(&run)
    }

    pub fn in_flight_count(&self) -> usize {
        lock(&self.in_flight).len()
    }

    /// Record that a submission for `run` is about to go out.
    pub fn mark_dispatched(&self, run: RunNumber) {
        lock(&self.dispatched).insert(run);
    }

    /// Whether `run` was dispatched at least once in this session.
    pub fn was_dispatched(&self, run: RunNumber) -> bool {
        lock(&self.dispatched).contains(&run)
    }

    /// Forget per-session run state, as on navigation away.
    pub fn clear(&self) {
        lock(&self.in_flight).clear();
        lock(&self.dispatched).clear();
    }
}
