//! Matrix storage API.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tm_core::{Protocol, RunNumber, RunRecord};
use tracing::{debug, info};

use crate::hash::records_digest;
use crate::types::{ArchivedMatrix, MatrixDocument, MatrixKey};
use crate::{StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct MatrixStore {
    root_dir: PathBuf,
}

/// `name` trimmed, if it is usable as a single path component. Anything that
/// could escape the parent directory is rejected.
pub fn path_component(name: &str) -> StoreResult<&str> {
    let trimmed = name.trim();
    let bad = trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\', '\0']);
    if bad {
        Err(StoreError::InvalidName {
            name: name.to_string(),
        })
    } else {
        Ok(trimmed)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

impl MatrixStore {
    pub fn new(root_dir: PathBuf) -> StoreResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store kept under `{workspace}/store`.
    pub fn for_workspace(workspace_root: &Path) -> StoreResult<Self> {
        Self::new(workspace_root.join("store"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn scratch_path(&self, project: &str, protocol: Protocol) -> StoreResult<PathBuf> {
        Ok(self
            .root_dir
            .join("scratch")
            .join(path_component(project)?)
            .join(format!("{}.json", protocol.key())))
    }

    fn inputs_path(&self, project: &str, protocol: Protocol) -> StoreResult<PathBuf> {
        Ok(self
            .root_dir
            .join("scratch")
            .join(path_component(project)?)
            .join(format!("{}.inputs.json", protocol.key())))
    }

    fn archive_path(&self, project_id: &str) -> StoreResult<PathBuf> {
        Ok(self
            .root_dir
            .join("archive")
            .join(path_component(project_id)?)
            .join("matrix.json"))
    }

    pub fn has_runs(&self, project: &str, protocol: Protocol) -> bool {
        self.scratch_path(project, protocol)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    /// Replace the scratch store of (project, protocol).
    pub fn save_runs(
        &self,
        project: &str,
        protocol: Protocol,
        records: &[RunRecord],
    ) -> StoreResult<()> {
        let path = self.scratch_path(project, protocol)?;
        let document = MatrixDocument {
            project: project.trim().to_string(),
            protocol,
            saved_at: Utc::now(),
            records: records.to_vec(),
        };
        write_json(&path, &document)?;
        info!(project, protocol = %protocol, records = records.len(), "Saved run matrix");
        Ok(())
    }

    pub fn load_runs(&self, project: &str, protocol: Protocol) -> StoreResult<Vec<RunRecord>> {
        let path = self.scratch_path(project, protocol)?;
        if !path.exists() {
            return Err(StoreError::MatrixNotFound {
                project: project.to_string(),
                protocol: protocol.key().to_string(),
            });
        }
        let document: MatrixDocument = read_json(&path)?;
        Ok(document.records)
    }

    /// One record of the scratch store.
    pub fn load_run(
        &self,
        project: &str,
        protocol: Protocol,
        run: RunNumber,
    ) -> StoreResult<RunRecord> {
        self.load_runs(project, protocol)?
            .into_iter()
            .find(|r| r.run_number == run)
            .ok_or(StoreError::RunNotFound {
                protocol: protocol.key().to_string(),
                run: run.get(),
            })
    }

    /// Protocols with a scratch store for `project`.
    pub fn list_protocols(&self, project: &str) -> StoreResult<Vec<Protocol>> {
        let dir = self.root_dir.join("scratch").join(path_component(project)?);
        let mut protocols = Vec::new();
        if !dir.exists() {
            return Ok(protocols);
        }
        for entry in fs::read_dir(&dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if let Some(stem) = name.strip_suffix(".json")
                && let Ok(protocol) = stem.parse::<Protocol>()
            {
                protocols.push(protocol);
            }
        }
        protocols.sort();
        Ok(protocols)
    }

    pub fn delete_runs(&self, project: &str, protocol: Protocol) -> StoreResult<()> {
        let path = self.scratch_path(project, protocol)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Save the user-entered inputs that produced the scratch matrix.
    pub fn save_inputs<T: Serialize>(
        &self,
        project: &str,
        protocol: Protocol,
        inputs: &T,
    ) -> StoreResult<()> {
        write_json(&self.inputs_path(project, protocol)?, inputs)
    }

    pub fn load_inputs<T: DeserializeOwned>(
        &self,
        project: &str,
        protocol: Protocol,
    ) -> StoreResult<Option<T>> {
        let path = self.inputs_path(project, protocol)?;
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    pub fn has_archive(&self, project_id: &str) -> bool {
        self.archive_path(project_id)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    /// Write the immutable snapshot for `project_id`. Fails if one exists.
    pub fn archive(
        &self,
        project_id: &str,
        project: &str,
        protocol: Protocol,
        records: &[RunRecord],
    ) -> StoreResult<ArchivedMatrix> {
        let path = self.archive_path(project_id)?;
        if path.exists() {
            return Err(StoreError::ArchiveExists {
                project_id: project_id.to_string(),
            });
        }

        let snapshot = ArchivedMatrix {
            project_id: project_id.trim().to_string(),
            project: project.trim().to_string(),
            protocol,
            archived_at: Utc::now(),
            digest: records_digest(protocol, records),
            records: records.to_vec(),
        };
        write_json(&path, &snapshot)?;
        info!(project_id, protocol = %protocol, digest = %snapshot.digest, "Archived run matrix");
        Ok(snapshot)
    }

    /// Load and verify an archived snapshot.
    pub fn load_archive(&self, project_id: &str) -> StoreResult<ArchivedMatrix> {
        let path = self.archive_path(project_id)?;
        if !path.exists() {
            return Err(StoreError::ArchiveNotFound {
                project_id: project_id.to_string(),
            });
        }

        let snapshot: ArchivedMatrix = read_json(&path)?;
        if records_digest(snapshot.protocol, &snapshot.records) != snapshot.digest {
            return Err(StoreError::DigestMismatch {
                project_id: project_id.to_string(),
            });
        }
        debug!(project_id, records = snapshot.records.len(), "Loaded archived matrix");
        Ok(snapshot)
    }

    /// Records of whichever store `key` names.
    pub fn load(&self, key: &MatrixKey) -> StoreResult<Vec<RunRecord>> {
        match key {
            MatrixKey::Scratch { project, protocol } => self.load_runs(project, *protocol),
            MatrixKey::Archived { project_id } => {
                self.load_archive(project_id).map(|s| s.records)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_names_that_escape_the_store() {
        for bad in ["", "  ", "..", "a/b", "a\\b"] {
            assert!(matches!(
                path_component(bad),
                Err(StoreError::InvalidName { .. })
            ));
        }
        assert_eq!(path_component(" Tire A ").unwrap(), "Tire A");
    }
}
