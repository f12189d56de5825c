//! CSV export and test summaries.

use std::io::Write;

use tm_core::{Protocol, RunRecord};

use crate::error::AppResult;

/// Column names of a protocol export, in order.
pub fn export_header(protocol: Protocol) -> Vec<&'static str> {
    let mut header = vec!["number_of_runs"];
    header.extend(protocol.export_fields().into_iter().map(|f| f.as_str()));
    header.extend(["p", "l"]);
    header
}

/// Write `records` as CSV in the protocol's export order.
pub fn export_csv<W: Write>(records: &[RunRecord], protocol: Protocol, writer: W) -> AppResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(export_header(protocol))?;
    for record in records {
        let mut row = vec![record.run_number.to_string()];
        row.extend(
            protocol
                .export_fields()
                .into_iter()
                .map(|f| record.field(f).to_string()),
        );
        row.push(record.p.clone());
        row.push(record.l.clone());
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

/// `{safe_project}_{protocol}_archive.csv`
pub fn export_file_name(project: &str, protocol: Protocol) -> String {
    let safe: String = project
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{}_{}_archive.csv", safe, protocol.key())
}

/// Row count per primary label, in first-seen order. Empty labels are skipped.
pub fn test_summary(records: &[RunRecord], protocol: Protocol) -> Vec<(String, usize)> {
    let mut summary: Vec<(String, usize)> = Vec::new();
    for record in records {
        let label = record.label(protocol).trim();
        if label.is_empty() {
            continue;
        }
        match summary.iter_mut().find(|(name, _)| name == label) {
            Some((_, count)) => *count += 1,
            None => summary.push((label.to_string(), 1)),
        }
    }
    summary
}
