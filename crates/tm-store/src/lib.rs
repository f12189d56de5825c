//! tm-store: file-backed Run Record Stores.
//!
//! Scratch stores hold one matrix per (project, protocol) and are replaced on
//! every save. Archived snapshots are written once per project id and carry a
//! content digest.

pub mod hash;
pub mod store;
pub mod types;

pub use hash::records_digest;
pub use store::{MatrixStore, path_component};
pub use types::*;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid store name: {name:?}")]
    InvalidName { name: String },

    #[error("No run matrix saved for {project} / {protocol}")]
    MatrixNotFound { project: String, protocol: String },

    #[error("Run {run} not found in {protocol} matrix")]
    RunNotFound { protocol: String, run: u32 },

    #[error("No archived matrix for project {project_id}")]
    ArchiveNotFound { project_id: String },

    #[error("Project {project_id} is already archived")]
    ArchiveExists { project_id: String },

    #[error("Archived matrix for project {project_id} failed digest check")]
    DigestMismatch { project_id: String },
}
