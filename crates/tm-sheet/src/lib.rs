//! tm-sheet: turning protocol spreadsheets into Run Records.
//!
//! The write path is `SheetSource` -> `resolve_columns` -> `normalize_row`,
//! driven per workbook by `extract_workbook`.

pub mod cell;
pub mod extract;
pub mod inputs;
pub mod normalize;
pub mod resolver;
pub mod source;
pub mod substitution;

pub use cell::{Cell, Sheet};
pub use extract::{Extraction, RowSkip, SkippedRow, extract_sheet, extract_workbook, normalize_row};
pub use inputs::TireInputs;
pub use normalize::normalize_header;
pub use resolver::{ColumnMap, HeaderMatch, resolve_columns};
pub use source::{CsvSheetSource, SheetFiles, SheetSource, WorkbookSheetSource};
pub use substitution::ParameterMap;

pub type SheetResult<T> = Result<T, SheetError>;

#[derive(thiserror::Error, Debug)]
pub enum SheetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read sheet {name}: {source}")]
    Csv {
        name: String,
        source: csv::Error,
    },

    #[error("Failed to read workbook {name}: {source}")]
    Workbook {
        name: String,
        source: calamine::Error,
    },

    #[error("No valid data found in workbook")]
    NoValidRows,

    #[error("Please fill all required fields with positive numbers: {}", .fields.join(", "))]
    InvalidInputs { fields: Vec<&'static str> },
}
