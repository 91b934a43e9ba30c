//! # daylog-core
//!
//! Core domain model and traits for the daylog reconciliation engine.
//!
//! This crate provides:
//! - Domain types: `DateRange`, `TabName`, `CellAddress`, `TaskRecord`, `DayOutcome`
//! - Core traits: `TaskSource`, `Spreadsheet`
//! - Error types with a closed `ErrorKind` classification
//! - The retry policy shared by every remote call
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use daylog_core::{calendar, CellAddress, DateRange};
//!
//! let today = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
//! let range = DateRange::for_offset(today, 3);
//! assert_eq!(range.iso_date(), "2024-01-05");
//!
//! let tab = calendar::tab_name_for_date(&range.iso_date()).unwrap();
//! let cell = CellAddress::summary(tab, 13);
//! assert_eq!(cell.to_string(), "Jan-24!E13");
//! ```

pub mod calendar;
pub mod config;
pub mod retry;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use calendar::{DateRange, TabName};
pub use config::{Config, PartialConfig};
pub use retry::{retry, retry_with_sleep, Retryable, RetryPolicy};

// ============================================================================
// Type Aliases
// ============================================================================

/// Number of calendar days before the run's current UTC date
pub type DayOffset = u32;

/// Identifier of a project in the task source
pub type ProjectId = String;

/// One spreadsheet row, column A first
pub type SheetRow = Vec<String>;

// ============================================================================
// Window
// ============================================================================

/// Most recent day reconciled by a run (yesterday)
pub const FIRST_OFFSET: DayOffset = 1;

/// Oldest day reconciled by a run
pub const LAST_OFFSET: DayOffset = 7;

/// Column holding each day's task summary
pub const SUMMARY_COLUMN: char = 'E';

/// Offsets of the lookback window, most recent day first
pub fn window_offsets() -> impl Iterator<Item = DayOffset> {
    FIRST_OFFSET..=LAST_OFFSET
}

// ============================================================================
// Task Source Model
// ============================================================================

/// A project as listed by the task source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
}

impl Project {
    pub fn new(id: impl Into<ProjectId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A completed task. Only the title is carried into the sheet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub content: String,
}

impl TaskRecord {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

// ============================================================================
// Spreadsheet Model
// ============================================================================

/// Address of a single cell: `{tab}!{column}{row}`
///
/// `row` follows spreadsheet numbering (1-based), so row N is found at
/// index N-1 of the rows returned by [`Spreadsheet::read_rows`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellAddress {
    pub tab: TabName,
    pub column: char,
    pub row: usize,
}

impl CellAddress {
    pub fn new(tab: TabName, column: char, row: usize) -> Self {
        Self { tab, column, row }
    }

    /// The summary cell of a given row
    pub fn summary(tab: TabName, row: usize) -> Self {
        Self::new(tab, SUMMARY_COLUMN, row)
    }

    /// A1 notation accepted by the spreadsheet API
    pub fn a1(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}{}", self.tab, self.column, self.row)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Read access to the task-tracking service
pub trait TaskSource {
    /// List every project visible to the caller
    fn list_projects(&self) -> Result<Vec<Project>, SyncError>;

    /// Tasks completed inside `range` (inclusive) for one project.
    ///
    /// Implementations return at most one page of results.
    fn completed_tasks(
        &self,
        range: &DateRange,
        project_id: &str,
    ) -> Result<Vec<TaskRecord>, SyncError>;
}

/// Access to the spreadsheet acting as the daily log
pub trait Spreadsheet {
    /// Titles of every tab in the spreadsheet
    fn list_tabs(&self) -> Result<Vec<TabName>, SyncError>;

    /// All rows of a tab, columns A..Z starting at row 1
    fn read_rows(&self, tab: &TabName) -> Result<Vec<SheetRow>, SyncError>;

    /// Current value of a cell, `None` when the cell is blank
    fn read_cell(&self, cell: &CellAddress) -> Result<Option<String>, SyncError>;

    /// Overwrite a cell with a raw (unparsed) value
    fn write_cell(&self, cell: &CellAddress, value: &str) -> Result<(), SyncError>;
}

// ============================================================================
// Outcomes
// ============================================================================

/// Remote or local step of a day's reconciliation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ListProjects,
    ResolveTab,
    ListTabs,
    ReadRows,
    ReadCell,
    FetchTasks,
    WriteCell,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::ListProjects => "list_projects",
            Operation::ResolveTab => "resolve_tab",
            Operation::ListTabs => "list_tabs",
            Operation::ReadRows => "read_rows",
            Operation::ReadCell => "read_cell",
            Operation::FetchTasks => "fetch_tasks",
            Operation::WriteCell => "write_cell",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The step that failed and why
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{operation} failed: {error}")]
pub struct DayFailure {
    pub operation: Operation,
    #[source]
    pub error: SyncError,
}

impl DayFailure {
    pub fn new(operation: Operation, error: SyncError) -> Self {
        Self { operation, error }
    }
}

/// Result of reconciling a single day
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DayOutcome {
    /// The summary was written into an empty cell
    Written { cell: CellAddress, summary: String },
    /// The cell already held a value and was left untouched
    SkippedAlreadyFilled { cell: CellAddress, existing: String },
    /// The month's tab does not exist
    SkippedTabMissing { tab: TabName },
    /// The tab has no row for the date
    SkippedDateNotFound { tab: TabName, date: String },
    /// A step failed after retries
    Failed(DayFailure),
}

impl DayOutcome {
    /// Short machine-friendly status label
    pub fn status(&self) -> &'static str {
        match self {
            DayOutcome::Written { .. } => "written",
            DayOutcome::SkippedAlreadyFilled { .. } => "already_filled",
            DayOutcome::SkippedTabMissing { .. } => "tab_missing",
            DayOutcome::SkippedDateNotFound { .. } => "date_not_found",
            DayOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, DayOutcome::Written { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            DayOutcome::SkippedAlreadyFilled { .. }
                | DayOutcome::SkippedTabMissing { .. }
                | DayOutcome::SkippedDateNotFound { .. }
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DayOutcome::Failed(_))
    }
}

impl fmt::Display for DayOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayOutcome::Written { cell, summary } => write!(f, "wrote {cell}: '{summary}'"),
            DayOutcome::SkippedAlreadyFilled { cell, existing } => {
                write!(f, "cell {cell} already has data: '{existing}'")
            }
            DayOutcome::SkippedTabMissing { tab } => {
                write!(f, "tab '{tab}' not found in the spreadsheet")
            }
            DayOutcome::SkippedDateNotFound { tab, date } => {
                write!(f, "date {date} not found in tab '{tab}'")
            }
            DayOutcome::Failed(failure) => write!(f, "{failure}"),
        }
    }
}

/// Outcome for one offset of the window
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayReport {
    pub offset: DayOffset,
    pub date: NaiveDate,
    pub outcome: DayOutcome,
}

/// Outcomes of a whole run, in window order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub project_id: ProjectId,
    pub days: Vec<DayReport>,
}

impl RunReport {
    pub fn written(&self) -> usize {
        self.days.iter().filter(|d| d.outcome.is_written()).count()
    }

    pub fn skipped(&self) -> usize {
        self.days.iter().filter(|d| d.outcome.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.days.iter().filter(|d| d.outcome.is_failed()).count()
    }

    /// Outcome recorded for a given offset
    pub fn outcome(&self, offset: DayOffset) -> Option<&DayOutcome> {
        self.days
            .iter()
            .find(|d| d.offset == offset)
            .map(|d| &d.outcome)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Classification every failure carries.
///
/// Callers branch on the kind, never on message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network trouble, timeouts, rate limits, 5xx: worth retrying
    Transient,
    /// The thing asked for does not exist
    NotFound,
    /// Deterministic failure: bad configuration, rejected credentials,
    /// malformed data, broken invariants
    Fatal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Transient => "transient",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Fatal => "fatal",
        }
    }
}

/// Reconciliation error
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Project '{0}' not found")]
    ProjectNotFound(String),

    #[error("Tab '{0}' not found")]
    TabNotFound(TabName),

    #[error("Invalid month '{0}': expected 01..12")]
    InvalidMonth(String),

    #[error("Malformed date '{0}': expected YYYY-MM-DD")]
    MalformedDate(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credentials(String),
}

impl SyncError {
    /// Build an HTTP error from a status code and response excerpt
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        SyncError::Http {
            status,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::ProjectNotFound(_) | SyncError::TabNotFound(_) => ErrorKind::NotFound,
            SyncError::Transport(_) => ErrorKind::Transient,
            SyncError::Http { status, .. } => match status {
                404 => ErrorKind::NotFound,
                408 | 429 => ErrorKind::Transient,
                s if *s >= 500 => ErrorKind::Transient,
                _ => ErrorKind::Fatal,
            },
            SyncError::InvalidMonth(_)
            | SyncError::MalformedDate(_)
            | SyncError::InvalidResponse(_)
            | SyncError::Config(_)
            | SyncError::Credentials(_) => ErrorKind::Fatal,
        }
    }
}

impl Retryable for SyncError {
    fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

// ============================================================================
// Tests
// ============================================================================
