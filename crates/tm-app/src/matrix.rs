//! Matrix view model.
//!
//! `render` always builds a fresh view from the store, so re-rendering never
//! duplicates rows, and each control exposes at most one action derived
//! from its current state.

use tm_core::{Field, Protocol, RunNumber, RunRecord};

/// Per-row run status. Labels are a projection of this enum only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    NotStarted,
    Running,
    Completed,
    Error,
}

impl RunStatus {
    pub fn label(self) -> &'static str {
        match self {
            RunStatus::NotStarted => "Not started",
            RunStatus::Running => "Running...",
            RunStatus::Completed => "Completed ✓",
            RunStatus::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunControl {
    #[default]
    Hidden,
    /// Enabled "Run" button.
    Ready,
    /// Locked while the dispatch is outstanding.
    Running,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtifactControl {
    #[default]
    Hidden,
    Generate,
    Generating,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Dispatch(RunNumber),
    GenerateTydex(RunNumber),
    OpenTydex(RunNumber),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow {
    pub record: RunRecord,
    pub cells: Vec<String>,
    pub status: RunStatus,
    pub run_control: RunControl,
    pub artifact_control: ArtifactControl,
}

impl MatrixRow {
    fn new(record: RunRecord, columns: &[Field]) -> Self {
        let cells = columns
            .iter()
            .map(|f| record.field(*f).to_string())
            .collect();
        Self {
            record,
            cells,
            status: RunStatus::NotStarted,
            run_control: RunControl::Hidden,
            artifact_control: ArtifactControl::Hidden,
        }
    }

    pub fn run(&self) -> RunNumber {
        self.record.run_number
    }

    /// Handlers bound to this row's controls.
    pub fn actions(&self) -> Vec<RowAction> {
        let run = self.run();
        let mut actions = Vec::new();
        if self.run_control == RunControl::Ready {
            actions.push(RowAction::Dispatch(run));
        }
        match self.artifact_control {
            ArtifactControl::Generate => actions.push(RowAction::GenerateTydex(run)),
            ArtifactControl::Open => actions.push(RowAction::OpenTydex(run)),
            ArtifactControl::Hidden | ArtifactControl::Generating => {}
        }
        actions
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixView {
    pub protocol: Protocol,
    pub columns: Vec<Field>,
    pub rows: Vec<MatrixRow>,
}

impl MatrixView {
    pub fn row(&self, run: RunNumber) -> Option<&MatrixRow> {
        self.rows.iter().find(|r| r.run() == run)
    }

    pub fn row_mut(&mut self, run: RunNumber) -> Option<&mut MatrixRow> {
        self.rows.iter_mut().find(|r| r.run() == run)
    }

    pub fn runs(&self) -> Vec<RunNumber> {
        self.rows.iter().map(MatrixRow::run).collect()
    }

    pub fn header(&self) -> Vec<&'static str> {
        self.columns.iter().map(|f| f.as_str()).collect()
    }

    pub fn count(&self, status: RunStatus) -> usize {
        self.rows.iter().filter(|r| r.status == status).count()
    }
}

/// Build the view of `records`, dropping rows with an empty label.
pub fn render(records: &[RunRecord], protocol: Protocol) -> MatrixView {
    let columns = protocol.display_fields();
    let rows = records
        .iter()
        .filter(|r| !r.label(protocol).trim().is_empty())
        .map(|r| MatrixRow::new(r.clone(), &columns))
        .collect();
    MatrixView {
        protocol,
        columns,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u32, name: &str) -> RunRecord {
        RunRecord::new(RunNumber::new(n).unwrap())
            .with_field(Field::TestName, name)
            .with_field(Field::InflationPressure, "35")
    }

    #[test]
    fn drops_unlabelled_rows_and_starts_hidden() {
        let view = render(
            &[record(1, "Static"), record(2, " "), record(3, "Roll")],
            Protocol::CdTire,
        );
        assert_eq!(view.runs(), vec![RunNumber::new(1).unwrap(), RunNumber::new(3).unwrap()]);
        let row = &view.rows[0];
        assert_eq!(row.cells[0], "Static");
        assert_eq!(row.cells[1], "35");
        assert_eq!(row.cells.len(), 10);
        assert_eq!(row.run_control, RunControl::Hidden);
        assert_eq!(row.artifact_control, ArtifactControl::Hidden);
        assert!(row.actions().is_empty());
    }

    #[test]
    fn rerender_replaces_output() {
        let records = [record(1, "Static"), record(3, "Roll")];
        let first = render(&records, Protocol::CdTire);
        let second = render(&records, Protocol::CdTire);
        assert_eq!(first, second);
        assert_eq!(second.rows.len(), 2);
    }

    #[test]
    fn label_field_depends_on_protocol() {
        let records = [record(1, "Static")];
        assert!(render(&records, Protocol::Mf62).rows.is_empty());
    }

    #[test]
    fn one_action_per_visible_control() {
        let mut view = render(&[record(1, "Static")], Protocol::CdTire);
        let run = RunNumber::new(1).unwrap();
        let row = view.row_mut(run).unwrap();
        row.run_control = RunControl::Ready;
        assert_eq!(row.actions(), vec![RowAction::Dispatch(run)]);

        row.run_control = RunControl::Completed;
        row.artifact_control = ArtifactControl::Open;
        assert_eq!(row.actions(), vec![RowAction::OpenTydex(run)]);

        row.artifact_control = ArtifactControl::Generating;
        assert!(row.actions().is_empty());
    }

    #[test]
    fn labels_project_status() {
        assert_eq!(RunStatus::Completed.label(), "Completed ✓");
        assert_eq!(RunStatus::NotStarted.label(), "Not started");
    }
}
