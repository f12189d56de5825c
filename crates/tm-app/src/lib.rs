//! Service layer of the tire test-matrix workbench.
//!
//! `MatrixPage` drives one open project matrix: rendering, status polling,
//! run dispatch, Tydex generation and completion. Collaborators are traits
//! in `backend`; `LocalBackend` implements them against a workspace
//! directory. `intake`, `BatchPlan` and `export` cover the write path and
//! reporting.

pub mod activity;
pub mod backend;
pub mod batch;
pub mod completion;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod intake;
pub mod lifecycle;
pub mod local_backend;
pub mod matrix;
pub mod notify;
pub mod page;
pub mod session;
pub mod status;
pub mod tydex;

pub use activity::{ActivityEvent, ActivityKind, ActivityStatus, log_activity};
pub use backend::{
    ActivityLog, ArtifactGenerator, ArtifactLookup, Backend, JobExecutor, JobOutcome, RowMetadata,
    RunStoreBackend, TydexLookup,
};
pub use batch::{BatchEntry, BatchPlan};
pub use completion::{CompletionAggregator, CompletionSummary};
pub use config::{WorkbenchConfig, load_config, load_inputs, render_command, validate_config};
pub use dispatch::DispatchOutcome;
pub use error::{AppError, AppResult, TydexError, TydexStage};
pub use export::{export_csv, export_file_name, export_header, test_summary};
pub use intake::{IntakeReport, IntakeTarget, intake};
pub use lifecycle::{LifecycleControls, ProjectStatus};
pub use local_backend::LocalBackend;
pub use matrix::{
    ArtifactControl, MatrixRow, MatrixView, RowAction, RunControl, RunStatus, render,
};
pub use notify::{Notifier, RunNotification, RunPhase};
pub use page::{MatrixPage, Timeouts};
pub use session::{InFlightGuard, MatrixMode, SessionContext};
pub use tydex::TydexOutcome;
