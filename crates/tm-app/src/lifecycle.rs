//! Project lifecycle status and the controls it enables.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::activity::{ActivityEvent, ActivityKind, log_activity};
use crate::backend::ActivityLog;
use crate::error::{AppError, AppResult};
use crate::page::MatrixPage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

/// Which project-level controls are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleControls {
    pub mark_complete: bool,
    pub mark_in_progress: bool,
    pub run_controls: bool,
}

impl LifecycleControls {
    /// `status` is `None` for a project that has never been saved.
    pub fn for_status(status: Option<ProjectStatus>, archived: bool) -> Self {
        let (mark_complete, mark_in_progress) = match status {
            None | Some(ProjectStatus::NotStarted) => (true, true),
            Some(ProjectStatus::InProgress) => (true, false),
            Some(ProjectStatus::Completed) => (false, false),
        };
        Self {
            mark_complete,
            mark_in_progress,
            run_controls: !(archived && status == Some(ProjectStatus::Completed)),
        }
    }
}

impl<B: ActivityLog> MatrixPage<B> {
    /// Mark the archived project complete once every run has completed.
    pub async fn mark_complete(&self) -> AppResult<()> {
        let project_id = self
            .session
            .project_id()
            .ok_or_else(|| AppError::Lifecycle("Project id is required".to_string()))?;
        if !self.session.controls().mark_complete {
            return Err(AppError::Lifecycle("Project is already completed".to_string()));
        }
        if !self.completion().completable {
            return Err(AppError::Lifecycle(
                "All runs must complete before the project can be marked complete".to_string(),
            ));
        }

        self.session.set_status(ProjectStatus::Completed);
        info!(project_id, "Project marked complete");
        let event = ActivityEvent::new(
            ActivityKind::Project,
            "Completed",
            format!(
                "Marked project {} complete",
                self.session.project().unwrap_or(project_id)
            ),
        )
        .with_meta("project_id", project_id);
        log_activity(&self.backend, event).await;
        Ok(())
    }

    /// Reopen a project for further runs.
    pub fn mark_in_progress(&self) -> AppResult<()> {
        if !self.session.controls().mark_in_progress {
            return Err(AppError::Lifecycle(
                "Project cannot be marked in progress from its current status".to_string(),
            ));
        }
        self.session.set_status(ProjectStatus::InProgress);
        Ok(())
    }
}
