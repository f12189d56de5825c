//! Column resolution: locating the header row and mapping fields to columns.

use std::collections::BTreeMap;

use tm_core::protocol::RUN_NUMBER_MARKER;
use tm_core::{Field, Protocol};
use tracing::{debug, warn};

use crate::cell::Cell;
use crate::normalize::normalize_header;

/// Rows scanned for the `"test"` fallback when no run-number header exists.
const FALLBACK_SCAN_ROWS: usize = 5;

/// How the header row was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMatch {
    /// A cell contains the run-number marker.
    RunNumberMarker,
    /// One of the first rows mentions "test".
    TestFallback,
    /// Nothing matched; row 0 is assumed.
    Defaulted,
}

/// Resolved column layout of one sheet. Absent fields read as empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub protocol: Protocol,
    pub header_row: usize,
    pub header_match: HeaderMatch,
    pub run_number: Option<usize>,
    pub p: Option<usize>,
    pub l: Option<usize>,
    columns: BTreeMap<Field, usize>,
}

impl ColumnMap {
    pub fn column(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// Every field the protocol expects that no header matched.
    pub fn absent_fields(&self) -> Vec<Field> {
        self.protocol
            .markers()
            .into_iter()
            .map(|m| m.field)
            .filter(|f| !self.columns.contains_key(f))
            .collect()
    }
}

fn row_contains(row: &[Cell], needle: &str) -> bool {
    row.iter()
        .any(|cell| normalize_header(&cell.as_text()).contains(needle))
}

fn locate_header(rows: &[Vec<Cell>]) -> (usize, HeaderMatch) {
    if let Some(idx) = rows.iter().position(|row| row_contains(row, RUN_NUMBER_MARKER)) {
        return (idx, HeaderMatch::RunNumberMarker);
    }
    if let Some(idx) = rows
        .iter()
        .take(FALLBACK_SCAN_ROWS)
        .position(|row| row_contains(row, "test"))
    {
        return (idx, HeaderMatch::TestFallback);
    }
    (0, HeaderMatch::Defaulted)
}

/// Index of the last header cell whose trimmed, lower-cased text is exactly `tag`.
fn exact_tag_column(header: &[Cell], tag: &str) -> Option<usize> {
    header
        .iter()
        .rposition(|cell| cell.as_text().trim().to_lowercase() == tag)
}

/// Resolve the column layout of `rows` for `protocol`. Never fails.
pub fn resolve_columns(rows: &[Vec<Cell>], protocol: Protocol) -> ColumnMap {
    let (header_row, header_match) = locate_header(rows);
    if header_match == HeaderMatch::Defaulted {
        warn!(protocol = %protocol, "Header row not found, using row 0");
    }

    let header: &[Cell] = rows.get(header_row).map(Vec::as_slice).unwrap_or(&[]);
    let normalized: Vec<String> = header
        .iter()
        .map(|cell| normalize_header(&cell.as_text()))
        .collect();

    let run_number = normalized.iter().position(|h| h.contains(RUN_NUMBER_MARKER));

    let mut columns = BTreeMap::new();
    for marker in protocol.markers() {
        if let Some(idx) = normalized.iter().position(|h| marker.matches(h)) {
            columns.insert(marker.field, idx);
        }
    }

    // Exact match keeps "Pressure"/"Preload"/"Load" headers out of the tag columns.
    let p = exact_tag_column(header, "p")
        .or_else(|| columns.get(&Field::TydexName).map(|idx| idx + 1));
    let l = exact_tag_column(header, "l").or_else(|| p.map(|idx| idx + 1));

    let map = ColumnMap {
        protocol,
        header_row,
        header_match,
        run_number,
        p,
        l,
        columns,
    };

    let absent = map.absent_fields();
    if !absent.is_empty() {
        debug!(protocol = %protocol, ?absent, "Columns not present in header");
    }
    if map.run_number.is_none() {
        warn!(protocol = %protocol, header_row, "No run-number column found");
    }
    debug!(protocol = %protocol, header_row, p = ?map.p, l = ?map.l, "Resolved column map");

    map
}
