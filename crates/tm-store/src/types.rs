//! Persisted store documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tm_core::{Protocol, RunRecord};

/// Scratch store document for one (project, protocol) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixDocument {
    pub project: String,
    pub protocol: Protocol,
    pub saved_at: DateTime<Utc>,
    pub records: Vec<RunRecord>,
}

/// Immutable snapshot of a project's matrix, keyed by project id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedMatrix {
    pub project_id: String,
    pub project: String,
    pub protocol: Protocol,
    pub archived_at: DateTime<Utc>,
    pub digest: String,
    pub records: Vec<RunRecord>,
}

/// Which Run Record Store a matrix is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixKey {
    Scratch { project: String, protocol: Protocol },
    Archived { project_id: String },
}
