//! Output file naming

use chrono::NaiveDateTime;
use report_export::ExportFormat;

/// Build `<prefix><yyyyMMddhhmmss>.<format>`
///
/// The hour is on the 12-hour clock (`01`-`12`), so two files generated
/// twelve hours apart can share a name.
pub fn file_name(prefix: &str, format: ExportFormat, at: NaiveDateTime) -> String {
    format!(
        "{prefix}{}.{}",
        at.format("%Y%m%d%I%M%S"),
        format.extension()
    )
}

/// Attachment disposition header value for a file name
pub fn content_disposition(file_name: &str) -> String {
    format!("attachment; filename={file_name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            file_name("test", ExportFormat::Pdf, at(9, 5, 7)),
            "test20240309090507.pdf"
        );
        assert_eq!(
            file_name("report", ExportFormat::Docx, at(23, 59, 0)),
            "report20240309115900.docx"
        );
    }

    #[test]
    fn test_twelve_hour_clock() {
        assert_eq!(
            file_name("r", ExportFormat::Csv, at(0, 0, 0)),
            "r20240309120000.csv"
        );
        assert_eq!(
            file_name("r", ExportFormat::Csv, at(12, 0, 0)),
            "r20240309120000.csv"
        );
    }

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            content_disposition("test20240309090507.pdf"),
            "attachment; filename=test20240309090507.pdf"
        );
    }
}
