//! Run report formatting
//!
//! Two output formats:
//! - `text`: one aligned line per day plus a totals line
//! - `json`: machine-readable document with the same information
//!
//! ## Exit Code Semantics
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | The window was processed, whatever the per-day outcomes |
//! | 1 | Fatal error before any day was processed |
//!
//! Failed days are visible in the report but do not change the exit code.

use std::io::{self, Write};

use daylog_core::{DateRange, DayOutcome, DayReport, RunReport};
use serde::Serialize;

/// Output format for the run report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

// ============================================================================
// Text
// ============================================================================

/// Write one line per day followed by totals
pub fn write_text<W: Write>(writer: &mut W, report: &RunReport) -> io::Result<()> {
    for day in &report.days {
        writeln!(
            writer,
            "{}  -{}  {:<14}  {}",
            day.date.format("%Y-%m-%d"),
            day.offset,
            day.outcome.status(),
            day.outcome
        )?;
    }
    writeln!(
        writer,
        "{} days: {} written, {} skipped, {} failed",
        report.days.len(),
        report.written(),
        report.skipped(),
        report.failed()
    )
}

// ============================================================================
// JSON
// ============================================================================

/// JSON representation of a run
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub project_id: String,
    pub days: Vec<JsonDay>,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// JSON representation of one day
#[derive(Debug, Serialize)]
pub struct JsonDay {
    pub offset: u32,
    pub date: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    pub detail: String,
}

impl From<&DayReport> for JsonDay {
    fn from(day: &DayReport) -> Self {
        let mut json = JsonDay {
            offset: day.offset,
            date: day.date.format("%Y-%m-%d").to_string(),
            status: day.outcome.status(),
            cell: None,
            value: None,
            operation: None,
            error_kind: None,
            detail: day.outcome.to_string(),
        };
        match &day.outcome {
            DayOutcome::Written { cell, summary } => {
                json.cell = Some(cell.a1());
                json.value = Some(summary.clone());
            }
            DayOutcome::SkippedAlreadyFilled { cell, existing } => {
                json.cell = Some(cell.a1());
                json.value = Some(existing.clone());
            }
            DayOutcome::SkippedTabMissing { .. } | DayOutcome::SkippedDateNotFound { .. } => {}
            DayOutcome::Failed(failure) => {
                json.operation = Some(failure.operation.as_str());
                json.error_kind = Some(failure.error.kind().as_str());
            }
        }
        json
    }
}

impl From<&RunReport> for JsonReport {
    fn from(report: &RunReport) -> Self {
        JsonReport {
            project_id: report.project_id.clone(),
            days: report.days.iter().map(JsonDay::from).collect(),
            written: report.written(),
            skipped: report.skipped(),
            failed: report.failed(),
        }
    }
}

pub fn write_json<W: Write>(writer: &mut W, report: &RunReport) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &JsonReport::from(report))?;
    writeln!(writer)
}

pub fn write_report<W: Write>(
    writer: &mut W,
    report: &RunReport,
    format: ReportFormat,
) -> io::Result<()> {
    match format {
        ReportFormat::Text => write_text(writer, report),
        ReportFormat::Json => write_json(writer, report),
    }
}

// ============================================================================
// Window preview
// ============================================================================

/// One line per offset: date, UTC bounds and the tab holding the day
pub fn write_window<W: Write>(writer: &mut W, days: &[(u32, DateRange)]) -> io::Result<()> {
    for (offset, range) in days {
        let iso = range.iso_date();
        let tab = daylog_core::calendar::tab_name_for_date(&iso)
            .map_or_else(|e| format!("<{e}>"), |t| t.into_inner());
        writeln!(
            writer,
            "-{offset}  {iso}  {}  {}  {tab}",
            range.since_param(),
            range.until_param()
        )?;
    }
    Ok(())
}
