//! Whole-matrix completion.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::matrix::{MatrixView, RunStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionSummary {
    pub completed: usize,
    pub total: usize,
    pub completable: bool,
}

/// Enables "mark project complete" once every rendered row has completed.
/// Once enabled it stays enabled.
#[derive(Debug, Default)]
pub struct CompletionAggregator {
    completable: AtomicBool,
}

impl CompletionAggregator {
    pub fn evaluate(&self, view: &MatrixView) -> CompletionSummary {
        let completed = view.count(RunStatus::Completed);
        let total = view.rows.len();
        if total > 0 && completed == total && !self.completable.swap(true, Ordering::SeqCst) {
            info!(completed, total, "All runs completed");
        }
        CompletionSummary {
            completed,
            total,
            completable: self.is_completable(),
        }
    }

    pub fn is_completable(&self) -> bool {
        self.completable.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::render;
    use tm_core::{Field, Protocol, RunNumber, RunRecord};

    fn view(n: u32) -> MatrixView {
        let records: Vec<RunRecord> = (1..=n)
            .map(|i| RunRecord::new(RunNumber::new(i).unwrap()).with_field(Field::Tests, "T"))
            .collect();
        render(&records, Protocol::Mf62)
    }

    #[test]
    fn empty_matrix_is_never_completable() {
        let agg = CompletionAggregator::default();
        assert!(!agg.evaluate(&view(0)).completable);
    }

    #[test]
    fn enables_when_all_complete_and_stays_enabled() {
        let agg = CompletionAggregator::default();
        let mut v = view(2);
        v.rows[0].status = RunStatus::Completed;
        let summary = agg.evaluate(&v);
        assert_eq!((summary.completed, summary.total), (1, 2));
        assert!(!summary.completable);

        v.rows[1].status = RunStatus::Completed;
        assert!(agg.evaluate(&v).completable);

        v.rows[1].status = RunStatus::Error;
        assert!(agg.evaluate(&v).completable);
    }
}
