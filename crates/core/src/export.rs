//! Export formatting primitives (JSON envelope and RFC 4180 CSV).
//!
//! Entity-specific column layouts live in the API crate; this module only
//! knows about headers, string cells, and quoting.

use std::str::FromStr;

use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Output format for an export request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(CoreError::Validation(format!(
                "Unsupported export format '{other}'. Expected json or csv"
            ))),
        }
    }
}

/// Date range echoed back in JSON exports.
#[derive(Debug, Clone, Serialize)]
pub struct DateRange {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

/// Standard JSON export envelope.
#[derive(Debug, Serialize)]
pub struct ExportEnvelope<'a, T: Serialize> {
    pub export_date: Timestamp,
    pub date_range: DateRange,
    pub total_records: usize,
    pub data: &'a [T],
}

/// Render any serializable slice inside the standard envelope.
pub fn to_json_envelope<T: Serialize>(
    data: &[T],
    range: DateRange,
    now: Timestamp,
) -> Result<String, CoreError> {
    let envelope = ExportEnvelope {
        export_date: now,
        date_range: range,
        total_records: data.len(),
        data,
    };
    serde_json::to_string_pretty(&envelope)
        .map_err(|e| CoreError::Internal(format!("JSON export failed: {e}")))
}

/// Quote a CSV field if it contains a delimiter, quote, or line break.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render a header row plus data rows as CSV with `\n` line endings.
pub fn to_csv(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    push_row(&mut out, headers.iter().copied());
    for row in rows {
        push_row(&mut out, row.iter().map(String::as_str));
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for cell in cells {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&escape_field(cell));
    }
    out.push('\n');
}

/// Timestamp cell: RFC 3339 with microseconds, so values parse back losslessly.
pub fn timestamp_cell(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// JSON cell for structured columns; `{}` when absent.
pub fn json_cell(value: Option<&Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "{}".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal RFC 4180 reader used to check that output parses back.
    fn parse_csv(input: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            match (c, in_quotes) {
                ('"', true) if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                ('"', true) => in_quotes = false,
                ('"', false) if field.is_empty() => in_quotes = true,
                (',', false) => row.push(std::mem::take(&mut field)),
                ('\n', false) => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                (c, _) => field.push(c),
            }
        }
        rows
    }

    #[test]
    fn plain_fields_are_not_quoted() {
        assert_eq!(escape_field("cpu_utilization"), "cpu_utilization");
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn special_fields_are_quoted_and_doubled() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn csv_round_trips_through_a_reader() {
        let rows = vec![
            vec!["1".to_string(), "plain".to_string(), "{}".to_string()],
            vec![
                "2".to_string(),
                "with, comma".to_string(),
                r#"{"k":"v","n":1}"#.to_string(),
            ],
            vec![
                "3".to_string(),
                "quote \" inside\nand newline".to_string(),
                String::new(),
            ],
        ];
        let csv = to_csv(&["ID", "Name", "Metadata"], &rows);

        let parsed = parse_csv(&csv);
        assert_eq!(parsed.len(), rows.len() + 1);
        assert_eq!(parsed[0], vec!["ID", "Name", "Metadata"]);
        assert_eq!(&parsed[1..], rows.as_slice());
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn json_envelope_counts_records() {
        let now = chrono::Utc::now();
        let body = to_json_envelope(
            &[1, 2, 3],
            DateRange {
                from: None,
                to: Some(now),
            },
            now,
        )
        .unwrap();
        let v: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v["total_records"], 3);
        assert_eq!(v["data"], serde_json::json!([1, 2, 3]));
        assert!(v["date_range"]["from"].is_null());
    }

    #[test]
    fn timestamp_cell_parses_back() {
        let now = chrono::Utc::now();
        let cell = timestamp_cell(&now);
        let back: Timestamp = cell.parse().unwrap();
        assert_eq!(back.timestamp_micros(), now.timestamp_micros());
    }
}
