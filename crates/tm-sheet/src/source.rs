//! Sheet sources: where raw cell grids come from.

use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use tracing::debug;

use crate::cell::{Cell, Sheet};
use crate::{SheetError, SheetResult};

/// Returns raw cell grids for one or more named sheets.
pub trait SheetSource {
    fn read_sheets(&self) -> SheetResult<Vec<Sheet>>;
}

/// In-memory sheets, mostly for tests and callers that parsed a workbook themselves.
impl SheetSource for Vec<Sheet> {
    fn read_sheets(&self) -> SheetResult<Vec<Sheet>> {
        Ok(self.clone())
    }
}

/// One sheet per CSV file, named after the file stem.
///
/// Cells are kept as text; no numeric guessing is done so tags like `"01"`
/// survive unchanged.
#[derive(Debug, Clone, Default)]
pub struct CsvSheetSource {
    paths: Vec<PathBuf>,
}

impl CsvSheetSource {
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

fn sheet_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_csv_sheet(path: &Path) -> SheetResult<Sheet> {
    let name = sheet_name(path);
    let csv_err = |source| SheetError::Csv {
        name: name.clone(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        rows.push(record.iter().map(Cell::from).collect());
    }

    debug!(sheet = %name, rows = rows.len(), "Read CSV sheet");
    Ok(Sheet::new(name, rows))
}

impl SheetSource for CsvSheetSource {
    fn read_sheets(&self) -> SheetResult<Vec<Sheet>> {
        self.paths.iter().map(|p| read_csv_sheet(p)).collect()
    }
}

/// Every worksheet of one spreadsheet workbook (xlsx, xlsm, xls, ods), in
/// workbook order.
///
/// Numeric cells stay numeric; the resolver and run-number parser read them
/// the way the spreadsheet displays them.
#[derive(Debug, Clone)]
pub struct WorkbookSheetSource {
    path: PathBuf,
}

impl WorkbookSheetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn workbook_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from(s.as_str()),
        Data::Float(v) => Cell::Number(*v),
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

impl SheetSource for WorkbookSheetSource {
    fn read_sheets(&self) -> SheetResult<Vec<Sheet>> {
        let workbook_err = |source| SheetError::Workbook {
            name: sheet_name(&self.path),
            source,
        };
        let mut workbook = open_workbook_auto(&self.path).map_err(workbook_err)?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name).map_err(workbook_err)?;
            // Ranges start at the first used cell; pad back to A1 so row and
            // column indices match the sheet.
            let (top, left) = range.start().unwrap_or((0, 0));
            let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); top as usize];
            for row in range.rows() {
                let mut cells = vec![Cell::Empty; left as usize];
                cells.extend(row.iter().map(workbook_cell));
                rows.push(cells);
            }
            debug!(sheet = %name, rows = rows.len(), "Read workbook sheet");
            sheets.push(Sheet::new(name, rows));
        }
        Ok(sheets)
    }
}

/// File extensions read as spreadsheet workbooks rather than CSV.
const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|w| ext.eq_ignore_ascii_case(w))
        })
}

/// Sheet files picked by extension: workbooks contribute all their
/// worksheets, anything else is read as one CSV sheet.
#[derive(Debug, Clone, Default)]
pub struct SheetFiles {
    paths: Vec<PathBuf>,
}

impl SheetFiles {
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl SheetSource for SheetFiles {
    fn read_sheets(&self) -> SheetResult<Vec<Sheet>> {
        let mut sheets = Vec::new();
        for path in &self.paths {
            if is_workbook(path) {
                sheets.extend(WorkbookSheetSource::new(path).read_sheets()?);
            } else {
                sheets.push(read_csv_sheet(path)?);
            }
        }
        Ok(sheets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_ragged_csv_as_text_cells() {
        let dir = std::env::temp_dir().join(format!("tm_sheet_csv_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("CDTire.csv");
        std::fs::write(&path, "title\nNo of Tests,Test Name,P\n1,\"Static\nload\",01\n").unwrap();

        let sheets = CsvSheetSource::new([&path]).read_sheets().unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "CDTire");
        assert_eq!(sheets[0].rows.len(), 3);
        assert_eq!(sheets[0].rows[0].len(), 1);
        assert_eq!(sheets[0].rows[2][1], Cell::Text("Static\nload".to_string()));
        assert_eq!(sheets[0].rows[2][2], Cell::Text("01".to_string()));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn workbook_extensions_are_case_insensitive() {
        assert!(is_workbook(Path::new("matrix.XLSX")));
        assert!(is_workbook(Path::new("dir/matrix.ods")));
        assert!(!is_workbook(Path::new("matrix.csv")));
        assert!(!is_workbook(Path::new("matrix")));
    }

    #[test]
    fn workbook_cells_keep_numbers() {
        assert_eq!(workbook_cell(&Data::Float(35.0)), Cell::Number(35.0));
        assert_eq!(workbook_cell(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(workbook_cell(&Data::String(String::new())), Cell::Empty);
        assert_eq!(workbook_cell(&Data::Bool(true)), Cell::Text("TRUE".to_string()));
    }

    #[test]
    fn missing_workbook_names_the_file() {
        let source = WorkbookSheetSource::new("/definitely/not/here/CDTire.xlsx");
        match source.read_sheets() {
            Err(SheetError::Workbook { name, .. }) => assert_eq!(name, "CDTire"),
            other => panic!("expected workbook error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_names_the_sheet() {
        let source = CsvSheetSource::new(["/definitely/not/here/MF62.csv"]);
        match source.read_sheets() {
            Err(SheetError::Csv { name, .. }) => assert_eq!(name, "MF62"),
            other => panic!("expected csv error, got {other:?}"),
        }
    }
}
