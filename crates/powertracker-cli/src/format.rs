//! Output formatting for text, table and CSV output.
//!
//! Every value is printed with six decimal places.

use std::path::Path;

use anyhow::{Context, Result};
use powertracker_core::ResultsMatrix;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::settings::style::HorizontalLine;

/// Output mode for the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Per-hour averages only, one per line
    Text,
    /// Box-drawn table of every day plus an averages row (default)
    #[default]
    Table,
    /// Every day plus averages written to a CSV file
    Csv,
}

impl OutputMode {
    /// Parse a mode name; anything unrecognised selects the table.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "csv" => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Format one value with six decimal places.
#[must_use]
pub fn format_value(value: f64) -> String {
    format!("{:.6}", value)
}

/// Averages only, one per line with a trailing comma.
///
/// The comma-terminated list pastes directly into usage-pattern fields of
/// solar modelling tools.
#[must_use]
pub fn format_text(averages: &[f64]) -> String {
    averages
        .iter()
        .map(|v| format!("{},\n", format_value(*v)))
        .collect()
}

/// Box-drawn table: hour headers, one row per day, averages last.
///
/// Rules separate the header and the averages footer from the day rows.
#[must_use]
pub fn format_table(matrix: &ResultsMatrix, averages: &[f64], headers: &[String]) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(String::as_str));
    for row in matrix.rows() {
        builder.push_record(row.iter().map(|v| format_value(*v)));
    }
    builder.push_record(averages.iter().map(|v| format_value(*v)));

    let footer = matrix.len() + 1;
    let style = Style::modern().remove_horizontal().horizontals([
        (1, HorizontalLine::inherit(Style::modern())),
        (footer, HorizontalLine::inherit(Style::modern())),
    ]);

    let mut table = builder.build();
    table.with(style);
    format!("{}\n", table)
}

/// Write headers, day rows and the averages row to `path`.
///
/// An existing file is overwritten.
pub fn write_csv(
    path: &Path,
    headers: &[String],
    matrix: &ResultsMatrix,
    averages: &[f64],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating file {}", path.display()))?;

    writer.write_record(headers).context("writing headers")?;
    for row in matrix.rows() {
        writer
            .write_record(row.iter().map(|v| format_value(*v)))
            .context("writing row")?;
    }
    writer
        .write_record(averages.iter().map(|v| format_value(*v)))
        .context("writing averages")?;
    writer.flush().context("flushing CSV file")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use powertracker_core::{HOURS_PER_DAY, hour_headers};

    fn sample_matrix() -> ResultsMatrix {
        let mut recent = [0.0; HOURS_PER_DAY];
        let mut older = [0.0; HOURS_PER_DAY];
        for h in 0..HOURS_PER_DAY {
            recent[h] = 0.125 * h as f64;
            older[h] = 1.0 / 3.0;
        }
        ResultsMatrix::new(vec![recent, older], 2)
    }

    #[test]
    fn test_output_mode_from_name() {
        assert_eq!(OutputMode::from_name("text"), OutputMode::Text);
        assert_eq!(OutputMode::from_name("CSV"), OutputMode::Csv);
        assert_eq!(OutputMode::from_name("table"), OutputMode::Table);
        assert_eq!(OutputMode::from_name(""), OutputMode::Table);
        assert_eq!(OutputMode::from_name("json"), OutputMode::Table);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.5), "0.500000");
        assert_eq!(format_value(1.0 / 3.0), "0.333333");
        assert_eq!(format_value(12.0), "12.000000");
    }

    #[test]
    fn test_format_text_lines() {
        let output = format_text(&[0.5; HOURS_PER_DAY]);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), HOURS_PER_DAY);
        assert!(lines.iter().all(|l| *l == "0.500000,"));
    }

    #[test]
    fn test_format_table_layout() {
        let matrix = sample_matrix();
        let averages = matrix.averages();
        let output = format_table(&matrix, &averages, &hour_headers());

        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[0].starts_with('┌'));
        assert!(lines[1].contains("23"));
        assert!(output.contains("2.875000"));
        assert!(output.contains("0.333333"));

        // Top, header, rule, two days, rule, averages, bottom.
        assert_eq!(lines.len(), 8);
        assert!(lines[2].starts_with('├'));
        assert!(lines[3].starts_with('│'));
        assert!(lines[4].starts_with('│'));
        assert!(lines[5].starts_with('├'));
        assert!(lines[6].contains(&format_value(averages[23])));
        assert!(lines[7].starts_with('└'));
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(&path, "stale contents that should be replaced\n").unwrap();

        let matrix = sample_matrix();
        let averages = matrix.averages();
        let headers = hour_headers();
        write_csv(&path, &headers, &matrix, &averages).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let read_headers: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        assert_eq!(read_headers, headers);

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), matrix.len() + 1);

        let expected_rows = matrix.rows().iter().chain(std::iter::once(&averages));
        for (record, expected) in records.iter().zip(expected_rows) {
            assert_eq!(record.len(), HOURS_PER_DAY);
            for (field, value) in record.iter().zip(expected) {
                assert_eq!(field.split('.').nth(1).map(str::len), Some(6));
                let parsed: f64 = field.parse().unwrap();
                assert!((parsed - value).abs() < 5e-7);
            }
        }
    }

    #[test]
    fn test_write_csv_reports_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("results.csv");
        let matrix = sample_matrix();
        let err = write_csv(&path, &hour_headers(), &matrix, &matrix.averages()).unwrap_err();
        assert!(err.to_string().contains("creating file"));
    }
}
