//! Entity column layouts and attachment responses for data export.
//!
//! Quoting and the JSON envelope live in `pulseboard_core::export`; this
//! module decides which columns each entity exports and how the download is
//! labelled.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use pulseboard_core::error::CoreError;
use pulseboard_core::export::{
    json_cell, timestamp_cell, to_csv, to_json_envelope, DateRange, ExportFormat,
};
use pulseboard_core::types::Timestamp;
use pulseboard_db::models::ai_model::AiModel;
use pulseboard_db::models::audit::AuditLog;
use pulseboard_db::models::config_entry::ConfigEntry;
use pulseboard_db::models::metric::Metric;
use serde::Serialize;

/// A row type with a fixed CSV layout.
pub trait CsvRecord {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

impl CsvRecord for Metric {
    const HEADERS: &'static [&'static str] = &["ID", "Type", "Value", "Timestamp", "Metadata"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.metric_type.clone(),
            self.value.to_string(),
            timestamp_cell(&self.timestamp),
            json_cell(self.metadata.as_ref()),
        ]
    }
}

impl CsvRecord for AuditLog {
    const HEADERS: &'static [&'static str] =
        &["ID", "User ID", "Action", "Resource", "Timestamp", "Details"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.user_id.map(|id| id.to_string()).unwrap_or_default(),
            self.action.clone(),
            self.resource.clone(),
            timestamp_cell(&self.timestamp),
            json_cell(self.details.as_ref()),
        ]
    }
}

impl CsvRecord for AiModel {
    const HEADERS: &'static [&'static str] = &[
        "ID",
        "Name",
        "Version",
        "Status",
        "Compliance",
        "Security",
        "Created At",
        "Updated At",
        "Config",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.version.clone(),
            self.status.clone(),
            self.compliance.clone(),
            self.security.clone(),
            timestamp_cell(&self.created_at),
            timestamp_cell(&self.updated_at),
            json_cell(self.config.as_ref()),
        ]
    }
}

impl CsvRecord for ConfigEntry {
    const HEADERS: &'static [&'static str] =
        &["Key", "Value", "Description", "Updated By", "Updated At"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.key.clone(),
            self.value.clone(),
            self.description.clone().unwrap_or_default(),
            self.updated_by.map(|id| id.to_string()).unwrap_or_default(),
            timestamp_cell(&self.updated_at),
        ]
    }
}

/// Render rows in the requested format.
pub fn render<T: Serialize + CsvRecord>(
    rows: &[T],
    format: ExportFormat,
    range: DateRange,
    now: Timestamp,
) -> Result<String, CoreError> {
    match format {
        ExportFormat::Json => to_json_envelope(rows, range, now),
        ExportFormat::Csv => {
            let cells: Vec<Vec<String>> = rows.iter().map(CsvRecord::cells).collect();
            Ok(to_csv(T::HEADERS, &cells))
        }
    }
}

/// `<kind>-<YYYYMMDD-HHMMSS>.<ext>`
pub fn filename(kind: &str, format: ExportFormat, now: Timestamp) -> String {
    format!("{kind}-{}.{}", now.format("%Y%m%d-%H%M%S"), format.extension())
}

/// Wrap a rendered body as a download.
pub fn attachment(body: String, format: ExportFormat, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        body,
    )
        .into_response()
}
