//! Intake: from a protocol workbook to a saved Run Record Store.

use tm_core::Protocol;
use tm_sheet::{Extraction, ParameterMap, SheetSource, TireInputs, extract_workbook};
use tracing::info;

use crate::activity::{ActivityEvent, ActivityKind, log_activity};
use crate::backend::{ActivityLog, RunStoreBackend};
use crate::error::{AppError, AppResult};

/// Where the extracted matrix goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeTarget {
    pub project: String,
    pub protocol: Protocol,
    /// Present for a saved project; the matrix is then archived too.
    pub project_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IntakeReport {
    pub extraction: Extraction,
    pub archive_digest: Option<String>,
}

/// Validate inputs, extract every sheet and persist the result.
///
/// Batch files are not generated here; see `BatchPlan`.
pub async fn intake<S, R, L>(
    source: &S,
    inputs: &TireInputs,
    store: &R,
    log: &L,
    target: &IntakeTarget,
) -> AppResult<IntakeReport>
where
    S: SheetSource,
    R: RunStoreBackend,
    L: ActivityLog,
{
    if target.project.trim().is_empty() {
        return Err(AppError::ConfigurationMissing);
    }
    inputs.validate()?;

    let sheets = source.read_sheets()?;
    let params = ParameterMap::from_inputs(inputs);
    let extraction = extract_workbook(&sheets, target.protocol, &params)?;

    store.save_runs(&target.project, target.protocol, &extraction.records)?;
    store.save_inputs(&target.project, target.protocol, inputs)?;

    let archive_digest = match &target.project_id {
        Some(project_id) => Some(
            store
                .archive(project_id, &target.project, target.protocol, &extraction.records)?
                .digest,
        ),
        None => None,
    };

    info!(
        project = %target.project,
        protocol = %target.protocol,
        records = extraction.records.len(),
        skipped = extraction.skipped.len(),
        archived = archive_digest.is_some(),
        "Intake complete"
    );
    let event = ActivityEvent::new(
        ActivityKind::Intake,
        "Extracted",
        format!(
            "Extracted {} runs for {} ({})",
            extraction.records.len(),
            target.project,
            target.protocol
        ),
    )
    .with_meta("project", &target.project)
    .with_meta("protocol", target.protocol)
    .with_meta("skipped", extraction.skipped.len());
    log_activity(log, event).await;

    Ok(IntakeReport {
        extraction,
        archive_digest,
    })
}
