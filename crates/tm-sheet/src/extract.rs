//! Row normalization and workbook extraction.

use std::collections::HashSet;

use tm_core::{Protocol, RunNumber, RunRecord};
use tracing::{debug, info, warn};

use crate::cell::{Cell, Sheet};
use crate::resolver::{ColumnMap, resolve_columns};
use crate::substitution::ParameterMap;
use crate::{SheetError, SheetResult};

/// Why a data row produced no Run Record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSkip {
    Blank,
    MissingRunNumber { raw: String },
    DuplicateRunNumber(RunNumber),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub sheet: String,
    /// Zero-based row index within the sheet.
    pub row: usize,
    pub reason: RowSkip,
}

/// Records in input order plus every row that was skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub records: Vec<RunRecord>,
    pub skipped: Vec<SkippedRow>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn cell_at(row: &[Cell], column: Option<usize>) -> Option<&Cell> {
    column.and_then(|idx| row.get(idx))
}

fn text_at(row: &[Cell], column: Option<usize>) -> String {
    cell_at(row, column).map(Cell::as_text).unwrap_or_default()
}

fn parse_run_number(cell: Option<&Cell>) -> Option<RunNumber> {
    match cell? {
        Cell::Empty => None,
        Cell::Number(v) => integral_run_number(*v),
        Cell::Text(s) => {
            let s = s.trim();
            s.parse::<RunNumber>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral_run_number))
        }
    }
}

fn integral_run_number(v: f64) -> Option<RunNumber> {
    if v.is_finite() && v.fract() == 0.0 && v >= 1.0 && v <= f64::from(u32::MAX) {
        RunNumber::new(v as u32)
    } else {
        None
    }
}

/// Turn one data row into a Run Record.
///
/// `p` and `l` are copied trimmed and never substituted; every other
/// protocol field goes through `params`. Fields without a column are empty.
pub fn normalize_row(
    row: &[Cell],
    columns: &ColumnMap,
    params: &ParameterMap,
) -> Result<RunRecord, RowSkip> {
    if row.iter().all(Cell::is_blank) {
        return Err(RowSkip::Blank);
    }

    let run_cell = cell_at(row, columns.run_number);
    let run_number = parse_run_number(run_cell).ok_or_else(|| RowSkip::MissingRunNumber {
        raw: run_cell.map(Cell::as_text).unwrap_or_default(),
    })?;

    let mut record = RunRecord::new(run_number).with_tags(
        text_at(row, columns.p).trim(),
        text_at(row, columns.l).trim(),
    );
    for marker in columns.protocol.markers() {
        let raw = text_at(row, columns.column(marker.field));
        record.fields.insert(marker.field, params.substitute(&raw));
    }
    Ok(record)
}

fn extract_into(
    sheet: &Sheet,
    protocol: Protocol,
    params: &ParameterMap,
    seen: &mut HashSet<RunNumber>,
    out: &mut Extraction,
) {
    let columns = resolve_columns(&sheet.rows, protocol);
    let before = out.records.len();

    for (idx, row) in sheet.rows.iter().enumerate().skip(columns.header_row + 1) {
        let reason = match normalize_row(row, &columns, params) {
            Ok(record) if seen.insert(record.run_number) => {
                out.records.push(record);
                continue;
            }
            Ok(record) => {
                warn!(sheet = %sheet.name, row = idx, run = %record.run_number, "Duplicate run number, row skipped");
                RowSkip::DuplicateRunNumber(record.run_number)
            }
            Err(RowSkip::Blank) => RowSkip::Blank,
            Err(reason) => {
                warn!(sheet = %sheet.name, row = idx, ?reason, "Row skipped");
                reason
            }
        };
        out.skipped.push(SkippedRow {
            sheet: sheet.name.clone(),
            row: idx,
            reason,
        });
    }

    debug!(
        sheet = %sheet.name,
        records = out.records.len() - before,
        "Extracted sheet"
    );
}

/// Extract one sheet. Never fails; an empty result is left to the caller.
pub fn extract_sheet(sheet: &Sheet, protocol: Protocol, params: &ParameterMap) -> Extraction {
    let mut out = Extraction::default();
    extract_into(sheet, protocol, params, &mut HashSet::new(), &mut out);
    out
}

/// Extract every sheet in order and concatenate the records.
///
/// A run number already produced by an earlier row or sheet is skipped.
pub fn extract_workbook(
    sheets: &[Sheet],
    protocol: Protocol,
    params: &ParameterMap,
) -> SheetResult<Extraction> {
    let mut seen = HashSet::new();
    let mut out = Extraction::default();
    for sheet in sheets {
        extract_into(sheet, protocol, params, &mut seen, &mut out);
    }

    if out.is_empty() {
        return Err(SheetError::NoValidRows);
    }
    info!(
        protocol = %protocol,
        sheets = sheets.len(),
        records = out.records.len(),
        skipped = out.skipped.len(),
        "Extracted workbook"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::TireInputs;
    use proptest::prelude::*;
    use tm_core::Field;

    fn params() -> ParameterMap {
        ParameterMap::from_inputs(&TireInputs {
            pressure1: Some(35.0),
            load1_kg: Some(450.0),
            inclination_angle: Some(2.5),
            ..Default::default()
        })
    }

    fn mf62_sheet(rows: &[&[&str]]) -> Sheet {
        let header: &[&str] = &[
            "No of Tests",
            "Tests",
            "Inflation Pressure (IPs)",
            "Loads",
            "Inclination Angle",
            "Slip Angle",
            "Slip Ratio",
            "Test Velocity",
            "Job",
            "Old Job",
            "Template Tydex",
            "Tydex Name",
            "P",
            "L",
        ];
        let mut all = vec![header];
        all.extend_from_slice(rows);
        Sheet::from_text("MF62", &all)
    }

    #[test]
    fn substitutes_descriptive_fields_but_not_tags() {
        let sheet = mf62_sheet(&[&[
            "1", "Cornering", "P1", "L1", "-IA", "-5 to 5", "0", "VEL", "job1", "", "t.tdx",
            "out.tdx", "P1", "L1",
        ]]);
        let out = extract_sheet(&sheet, Protocol::Mf62, &params());
        let record = &out.records[0];
        assert_eq!(record.field(Field::Ips), "35");
        assert_eq!(record.field(Field::Loads), "450");
        assert_eq!(record.field(Field::InclinationAngle), "-2.5");
        assert_eq!(record.field(Field::SlipAngle), "-5 to 5");
        assert_eq!(record.field(Field::TestVelocity), "VEL");
        assert_eq!(record.p, "P1");
        assert_eq!(record.l, "L1");
        assert_eq!(record.folder_name(), "P1_L1");
    }

    #[test]
    fn every_protocol_field_is_present_even_if_unresolved() {
        let sheet = Sheet::from_text("s", &[&["No of Tests", "Tests"], &["4", "Static"]]);
        let out = extract_sheet(&sheet, Protocol::Mf62, &params());
        let record = &out.records[0];
        for marker in Protocol::Mf62.markers() {
            assert!(record.fields.contains_key(&marker.field));
        }
        assert_eq!(record.job(), "");
        assert_eq!(record.p, "");
    }

    #[test]
    fn skips_blank_and_non_numeric_rows() {
        let sheet = mf62_sheet(&[
            &["1", "A"],
            &["", " ", ""],
            &["abc", "B"],
            &["0", "C"],
            &["-3", "D"],
            &["2.0", "E"],
            &["2.5", "F"],
        ]);
        let out = extract_sheet(&sheet, Protocol::Mf62, &params());
        let runs: Vec<u32> = out.records.iter().map(|r| r.run_number.get()).collect();
        assert_eq!(runs, vec![1, 2]);
        assert_eq!(out.skipped.len(), 5);
        assert_eq!(out.skipped[0].reason, RowSkip::Blank);
        assert_eq!(
            out.skipped[1].reason,
            RowSkip::MissingRunNumber {
                raw: "abc".to_string()
            }
        );
    }

    #[test]
    fn numeric_run_cells_must_be_integral() {
        let columns = resolve_columns(
            &Sheet::from_text("s", &[&["No of Tests", "Tests"]]).rows,
            Protocol::Mf62,
        );
        let row = vec![Cell::Number(7.0), Cell::from("x")];
        assert_eq!(
            normalize_row(&row, &columns, &params()).unwrap().run_number.get(),
            7
        );
        let row = vec![Cell::Number(7.5), Cell::from("x")];
        assert!(normalize_row(&row, &columns, &params()).is_err());
    }

    #[test]
    fn keeps_sheet_order_and_drops_duplicates_across_sheets() {
        let first = mf62_sheet(&[&["5", "A"], &["2", "B"]]);
        let second = mf62_sheet(&[&["2", "C"], &["9", "D"]]);
        let out = extract_workbook(&[first, second], Protocol::Mf62, &params()).unwrap();
        let runs: Vec<u32> = out.records.iter().map(|r| r.run_number.get()).collect();
        assert_eq!(runs, vec![5, 2, 9]);
        assert_eq!(
            out.skipped[0].reason,
            RowSkip::DuplicateRunNumber(RunNumber::new(2).unwrap())
        );
    }

    #[test]
    fn empty_workbook_is_an_error() {
        let sheet = mf62_sheet(&[&["x", "A"]]);
        assert!(matches!(
            extract_workbook(&[sheet], Protocol::Mf62, &params()),
            Err(SheetError::NoValidRows)
        ));
        assert!(matches!(
            extract_workbook(&[], Protocol::Mf62, &params()),
            Err(SheetError::NoValidRows)
        ));
    }

    const TOKENS: [&str; 12] = [
        "P1", "P2", "L1", "L2", "L3", "L4", "L5", "VEL", "IA", "-IA", "SR", "-SR",
    ];

    fn cell_text() -> impl Strategy<Value = String> {
        prop_oneof![
            proptest::sample::select(TOKENS.to_vec()).prop_map(str::to_string),
            "[ ]{0,2}[A-Za-z0-9.\\-]{0,6}[ \\n]{0,2}",
        ]
    }

    proptest! {
        #[test]
        fn run_numbers_are_positive_and_unique(
            runs in proptest::collection::vec("[0-9]{1,3}|[a-z]{1,3}|-[0-9]", 1..30)
        ) {
            let rows: Vec<Vec<&str>> = runs.iter().map(|r| vec![r.as_str(), "T"]).collect();
            let row_refs: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
            let sheet = mf62_sheet(&row_refs);
            let out = extract_sheet(&sheet, Protocol::Mf62, &params());

            let mut seen = HashSet::new();
            for record in &out.records {
                prop_assert!(record.run_number.get() > 0);
                prop_assert!(seen.insert(record.run_number));
            }
            prop_assert_eq!(out.records.len() + out.skipped.len(), runs.len());
        }

        #[test]
        fn tags_are_never_substituted(p in cell_text(), l in cell_text()) {
            let sheet = mf62_sheet(&[&[
                "1", "T", "", "", "", "", "", "", "", "", "", "", p.as_str(), l.as_str(),
            ]]);
            let out = extract_sheet(&sheet, Protocol::Mf62, &params());
            prop_assert_eq!(&out.records[0].p, p.trim());
            prop_assert_eq!(&out.records[0].l, l.trim());
        }

        #[test]
        fn descriptive_fields_follow_substitution(raw in cell_text()) {
            let map = params();
            let sheet = mf62_sheet(&[&["1", "T", raw.as_str()]]);
            let out = extract_sheet(&sheet, Protocol::Mf62, &map);
            let cleaned = raw.trim().replace("\r\n", " ").replace('\n', " ");
            let expected = map.get(&cleaned).map(str::to_string).unwrap_or(cleaned);
            prop_assert_eq!(out.records[0].field(Field::Ips), expected.as_str());
        }

        #[test]
        fn negation_tokens_are_non_positive(ia in -1.0e6f64..1.0e6) {
            let map = ParameterMap::from_inputs(&TireInputs {
                inclination_angle: Some(ia),
                ..Default::default()
            });
            let value: f64 = map.substitute("-IA").parse().unwrap();
            prop_assert!(value <= 0.0);
            prop_assert!((value + ia.abs()).abs() < 1e-6);
        }
    }
}
