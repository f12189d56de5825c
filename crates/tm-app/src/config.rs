//! Workbench configuration and input loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tm_sheet::TireInputs;

use crate::error::{AppError, AppResult};

fn default_workspace_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_row_fetch_timeout_s() -> u64 {
    15
}

fn default_generation_timeout_s() -> u64 {
    120
}

fn default_artifact_extension() -> String {
    "odb".to_string()
}

/// Workbench settings, loaded from YAML.
///
/// Command templates are argv lists; each element may contain the
/// placeholders `{project}`, `{protocol}`, `{run}`, `{folder}`, `{job}`,
/// `{template}`, `{tydex}` and `{dir}`. `open_command` also gets `{path}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkbenchConfig {
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,
    #[serde(default = "default_row_fetch_timeout_s")]
    pub row_fetch_timeout_s: u64,
    #[serde(default = "default_generation_timeout_s")]
    pub generation_timeout_s: u64,
    #[serde(default)]
    pub job_command: Vec<String>,
    #[serde(default)]
    pub tydex_command: Vec<String>,
    #[serde(default)]
    pub open_command: Vec<String>,
    #[serde(default = "default_artifact_extension")]
    pub primary_artifact_extension: String,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            workspace_root: default_workspace_root(),
            row_fetch_timeout_s: default_row_fetch_timeout_s(),
            generation_timeout_s: default_generation_timeout_s(),
            job_command: Vec::new(),
            tydex_command: Vec::new(),
            open_command: Vec::new(),
            primary_artifact_extension: default_artifact_extension(),
        }
    }
}

impl WorkbenchConfig {
    pub fn row_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.row_fetch_timeout_s)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_s)
    }

    /// Directory holding the result folders of (project, protocol).
    pub fn project_dir(&self, project: &str, protocol: &str) -> PathBuf {
        self.workspace_root
            .join("projects")
            .join(format!("{project}_{protocol}"))
    }

    pub fn activity_log_path(&self) -> PathBuf {
        self.workspace_root.join("activity.jsonl")
    }
}

/// Substitute `{name}` placeholders in every argv element.
pub fn render_command(template: &[String], vars: &[(&str, &str)]) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |acc, (name, value)| {
                acc.replace(&format!("{{{name}}}"), value)
            })
        })
        .collect()
}

fn read_file(path: &Path) -> AppResult<String> {
    std::fs::read_to_string(path).map_err(|e| AppError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load workbench configuration from a YAML file.
pub fn load_config(path: &Path) -> AppResult<WorkbenchConfig> {
    let content = read_file(path)?;
    let config: WorkbenchConfig = serde_yaml::from_str(&content)
        .map_err(|e| AppError::Config(format!("Failed to parse config YAML: {}", e)))?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &WorkbenchConfig) -> AppResult<()> {
    if config.row_fetch_timeout_s == 0 || config.generation_timeout_s == 0 {
        return Err(AppError::Config("Timeouts must be at least one second".to_string()));
    }
    if config.primary_artifact_extension.trim().is_empty() {
        return Err(AppError::Config(
            "primary_artifact_extension must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Load user-entered tire inputs from a YAML file.
pub fn load_inputs(path: &Path) -> AppResult<TireInputs> {
    let content = read_file(path)?;
    serde_yaml::from_str(&content)
        .map_err(|e| AppError::InvalidInput(format!("Failed to parse inputs YAML: {}", e)))
}
