//! CSV export
//!
//! Text elements sharing a page and a y position form one row, ordered
//! left to right. Images are skipped.

use crate::dispatcher::{Element, PrintJob};
use crate::Result;
use std::io::Write;

/// Write a print job as CSV
pub fn write_csv(job: &PrintJob, out: &mut dyn Write) -> Result<()> {
    for page in &job.pages {
        let mut rows: Vec<(f64, Vec<(f64, &str)>)> = Vec::new();

        for element in &page.elements {
            let Element::Text(text) = element else {
                continue;
            };
            match rows.iter().position(|(y, _)| (*y - text.y).abs() < 0.01) {
                Some(i) => rows[i].1.push((text.x, text.text.as_str())),
                None => rows.push((text.y, vec![(text.x, text.text.as_str())])),
            }
        }

        rows.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (_, mut cells) in rows {
            cells.sort_by(|a, b| a.0.total_cmp(&b.0));
            let line: Vec<String> = cells.iter().map(|(_, text)| escape(text)).collect();
            writeln!(out, "{}", line.join(","))?;
        }
    }
    Ok(())
}

/// Quote a field if it contains a delimiter, quote or line break
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
