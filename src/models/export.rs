use actix_web::web::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An analyst-triggered export. Each action has its own control and its
/// own in-flight slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportAction {
    /// PDF report over the filtered packets
    FilteredReport,
    /// CSV export of the filtered packets
    FilteredCsv,
    /// Full report built from selected sections
    Report,
}

impl ExportAction {
    /// Label of the triggering control while idle
    pub fn idle_label(&self) -> &'static str {
        match self {
            ExportAction::FilteredReport => "Filtered report",
            ExportAction::FilteredCsv => "Filtered CSV",
            ExportAction::Report => "Generate report",
        }
    }

    /// Label of the triggering control while a request is in flight
    pub fn busy_label(&self) -> &'static str {
        match self {
            ExportAction::FilteredReport => "Generating report...",
            ExportAction::FilteredCsv => "Exporting CSV...",
            ExportAction::Report => "Generating report...",
        }
    }

    /// Path segment of the service endpoint; the capture id follows it
    pub fn endpoint(&self) -> &'static str {
        match self {
            ExportAction::FilteredReport => "generate_filtered_report",
            ExportAction::FilteredCsv => "export_filtered_csv",
            ExportAction::Report => "generate_report",
        }
    }
}

impl fmt::Display for ExportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportAction::FilteredReport => write!(f, "Filtered report generation"),
            ExportAction::FilteredCsv => write!(f, "Filtered CSV export"),
            ExportAction::Report => write!(f, "Report generation"),
        }
    }
}

/// Idle / in-flight state of one export action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportState {
    Idle,
    InFlight,
}

/// What the triggering control looks like right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub enabled: bool,
    pub label: String,
}

/// Response of `POST /generate_filtered_report/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct FilteredReportResponse {
    pub success: bool,
    #[serde(default)]
    pub report_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `POST /export_filtered_csv/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct FilteredCsvResponse {
    pub success: bool,
    #[serde(default)]
    pub csv_url: Option<String>,
    #[serde(default)]
    pub total_packets: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of a completed filtered export
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportOutcome {
    FilteredReport {
        report_url: String,
    },
    FilteredCsv {
        csv_url: String,
        total_packets: Option<u64>,
    },
}

/// A report rendered by the service, handed on to the analyst as received
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Bytes,
}

/// Body of a section-selection report request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub options: Vec<String>,
}
