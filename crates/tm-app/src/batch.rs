//! Batch plan: every job of a matrix in dependency order.

use std::collections::HashMap;
use std::fmt::Write as _;

use tm_core::{Protocol, RunNumber, RunRecord};

use crate::config::render_command;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub run: RunNumber,
    pub job: String,
    pub old_job: String,
    pub folder: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub project: String,
    pub protocol: Protocol,
    pub entries: Vec<BatchEntry>,
}

impl BatchPlan {
    /// Order runs with a job so that a run restarting from `old_job` comes
    /// after the run producing that job. Otherwise input order is kept.
    pub fn build(project: &str, protocol: Protocol, records: &[RunRecord]) -> AppResult<Self> {
        let pending: Vec<BatchEntry> = records
            .iter()
            .filter(|r| !r.job().trim().is_empty())
            .map(|r| BatchEntry {
                run: r.run_number,
                job: r.job().trim().to_string(),
                old_job: r.field(tm_core::Field::OldJob).trim().to_string(),
                folder: r.folder_name(),
            })
            .collect();

        let producers: HashMap<&str, usize> = pending
            .iter()
            .enumerate()
            .map(|(i, e)| (e.job.as_str(), i))
            .collect();
        let depends_on: Vec<Option<usize>> = pending
            .iter()
            .enumerate()
            .map(|(i, e)| producers.get(e.old_job.as_str()).copied().filter(|&p| p != i))
            .collect();

        let mut placed = vec![false; pending.len()];
        let mut order = Vec::with_capacity(pending.len());
        while order.len() < pending.len() {
            let next = (0..pending.len())
                .find(|&i| !placed[i] && depends_on[i].is_none_or(|d| placed[d]));
            let Some(i) = next else {
                let stuck: Vec<String> = (0..pending.len())
                    .filter(|&i| !placed[i])
                    .map(|i| pending[i].job.clone())
                    .collect();
                return Err(AppError::Batch(format!(
                    "old_job dependencies form a cycle: {}",
                    stuck.join(", ")
                )));
            };
            placed[i] = true;
            order.push(i);
        }

        let entries = order.into_iter().map(|i| pending[i].clone()).collect();
        Ok(Self {
            project: project.to_string(),
            protocol,
            entries,
        })
    }

    pub fn test_count(&self) -> usize {
        self.entries.len()
    }

    /// One commented command line per entry, rendered from `job_command`.
    pub fn render_script(&self, job_command: &[String], project_dir: &str) -> String {
        let mut script = String::new();
        let _ = writeln!(
            script,
            "# {} {} batch: {} tests",
            self.project,
            self.protocol,
            self.test_count()
        );
        for entry in &self.entries {
            let run = entry.run.to_string();
            let argv = render_command(
                job_command,
                &[
                    ("project", self.project.as_str()),
                    ("protocol", self.protocol.key()),
                    ("run", run.as_str()),
                    ("folder", entry.folder.as_str()),
                    ("job", entry.job.as_str()),
                    ("dir", project_dir),
                ],
            );
            let _ = writeln!(script, "# run {}: {}", entry.run, entry.job);
            let _ = writeln!(script, "{}", argv.join(" "));
        }
        script
    }
}
