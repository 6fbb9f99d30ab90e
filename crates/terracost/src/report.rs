use std::fmt::Write;

use crate::client::CostRecord;

const HEADERS: [&str; 4] = ["Resource Name", "Resource Type", "Hourly Cost", "Monthly Cost"];
const GAP: usize = 2;

/// Render cost records as an aligned table: header, separator, one row per record.
pub fn render(records: &[CostRecord]) -> String {
    let separator: Vec<String> = HEADERS.iter().map(|h| "-".repeat(h.len())).collect();

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(records.len() + 2);
    rows.push(HEADERS.iter().map(|h| h.to_string()).collect());
    rows.push(separator);
    rows.extend(records.iter().map(|r| {
        vec![
            r.address.clone(),
            r.resource_type.clone(),
            format!("{:.2}", r.hourly_cost),
            format!("{:.2}", r.monthly_cost),
        ]
    }));

    format_table(&rows)
}

/// Left-align every column but the last, padding to the widest cell plus [`GAP`].
fn format_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            rows.iter()
                .map(|r| r.get(i).map_or(0, |s| s.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for row in rows {
        let last = row.len().saturating_sub(1);
        for (i, cell) in row.iter().enumerate() {
            if i < last {
                let _ = write!(out, "{:<width$}", cell, width = widths[i] + GAP);
            } else {
                out.push_str(cell);
            }
        }
        out.push('\n');
    }
    out
}
