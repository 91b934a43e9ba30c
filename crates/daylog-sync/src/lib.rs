//! # daylog-sync
//!
//! Reconciliation engine: walks the lookback window and fills each day's
//! summary cell exactly once.
//!
//! For every offset of the window the [`Reconciler`] goes through
//!
//! ```text
//! range → tab ─┬─ tab missing ──────────────────────────── SkippedTabMissing
//!              └─ rows ─┬─ no row for date ─────────────── SkippedDateNotFound
//!                       └─ cell ─┬─ filled ─────────────── SkippedAlreadyFilled
//!                                └─ empty → tasks → write ─ Written
//! ```
//!
//! A tab that cannot be read because it no longer exists is skipped like a
//! missing one. Any other error on the way becomes `Failed` for that day and
//! the next offset is still processed. Only resolving the project, which
//! happens before the loop, can fail the whole run.
//!
//! ## Example
//!
//! ```rust,ignore
//! use daylog_sync::Reconciler;
//!
//! let reconciler = Reconciler::new(&todoist, &sheets).with_retry_policy(config.retry);
//! let report = reconciler.run(&config.todoist_project_name, chrono::Utc::now().date_naive())?;
//! ```

pub mod locate;
pub mod summary;

use std::collections::HashMap;

use chrono::NaiveDate;
use daylog_core::{
    calendar, retry, window_offsets, CellAddress, DateRange, DayFailure, DayOffset, DayOutcome,
    DayReport, ErrorKind, Operation, ProjectId, RetryPolicy, RunReport, SheetRow, Spreadsheet,
    SyncError, TabName, TaskSource,
};
use tracing::{debug, info, warn};

pub use locate::locate_row;
pub use summary::format_summary;

/// Find the id of the project named exactly `name` (case-sensitive).
///
/// Listing projects is retried under `policy`; a missing name is reported as
/// [`SyncError::ProjectNotFound`] without retrying.
pub fn resolve_project_id<T>(
    source: &T,
    name: &str,
    policy: &RetryPolicy,
) -> Result<ProjectId, SyncError>
where
    T: TaskSource + ?Sized,
{
    let projects = retry(policy, Operation::ListProjects.as_str(), || {
        source.list_projects()
    })?;

    projects
        .into_iter()
        .find(|p| p.name == name)
        .map(|p| p.id)
        .ok_or_else(|| SyncError::ProjectNotFound(name.to_string()))
}

/// Spreadsheet reads shared by all days of one run
#[derive(Debug, Default)]
struct RunCache {
    tabs: Option<Vec<TabName>>,
    rows: HashMap<TabName, Vec<SheetRow>>,
}

impl RunCache {
    fn tabs<F>(&mut self, fetch: F) -> Result<&[TabName], SyncError>
    where
        F: FnOnce() -> Result<Vec<TabName>, SyncError>,
    {
        if self.tabs.is_none() {
            self.tabs = Some(fetch()?);
        }
        Ok(self.tabs.as_deref().unwrap_or_default())
    }

    fn rows<F>(&mut self, tab: &TabName, fetch: F) -> Result<&[SheetRow], SyncError>
    where
        F: FnOnce() -> Result<Vec<SheetRow>, SyncError>,
    {
        if !self.rows.contains_key(tab) {
            let rows = fetch()?;
            self.rows.insert(tab.clone(), rows);
        }
        Ok(self.rows.get(tab).map(Vec::as_slice).unwrap_or_default())
    }
}

/// Drives the lookback window against a task source and a spreadsheet
pub struct Reconciler<'a, T: ?Sized, S: ?Sized> {
    tasks: &'a T,
    sheet: &'a S,
    policy: RetryPolicy,
}

impl<'a, T, S> Reconciler<'a, T, S>
where
    T: TaskSource + ?Sized,
    S: Spreadsheet + ?Sized,
{
    pub fn new(tasks: &'a T, sheet: &'a S) -> Self {
        Self {
            tasks,
            sheet,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve the project, then reconcile every day of the window.
    ///
    /// Fails only when the project cannot be resolved; per-day problems are
    /// recorded in the returned report.
    pub fn run(&self, project_name: &str, today: NaiveDate) -> Result<RunReport, SyncError> {
        let project_id = resolve_project_id(self.tasks, project_name, &self.policy)?;
        info!(project = project_name, %project_id, "resolved project");
        Ok(self.run_window(&project_id, today))
    }

    /// Reconcile offsets 1..=7 before `today`, most recent day first
    pub fn run_window(&self, project_id: &str, today: NaiveDate) -> RunReport {
        let mut cache = RunCache::default();
        let days = window_offsets()
            .map(|offset| self.reconcile_offset(&mut cache, project_id, today, offset))
            .collect();

        RunReport {
            project_id: project_id.to_string(),
            days,
        }
    }

    /// Reconcile a single day outside of a full run
    pub fn reconcile_day(&self, project_id: &str, today: NaiveDate, offset: DayOffset) -> DayReport {
        self.reconcile_offset(&mut RunCache::default(), project_id, today, offset)
    }

    fn reconcile_offset(
        &self,
        cache: &mut RunCache,
        project_id: &str,
        today: NaiveDate,
        offset: DayOffset,
    ) -> DayReport {
        let range = DateRange::for_offset(today, offset);
        info!(offset, date = %range.date(), "checking for tasks completed");

        let outcome = match self.try_reconcile(cache, project_id, &range) {
            Ok(outcome) => {
                info!(offset, status = outcome.status(), "{outcome}");
                outcome
            }
            Err(failure) => {
                warn!(
                    offset,
                    operation = %failure.operation,
                    kind = failure.error.kind().as_str(),
                    error = %failure.error,
                    "day failed"
                );
                DayOutcome::Failed(failure)
            }
        };

        DayReport {
            offset,
            date: range.date(),
            outcome,
        }
    }

    fn try_reconcile(
        &self,
        cache: &mut RunCache,
        project_id: &str,
        range: &DateRange,
    ) -> Result<DayOutcome, DayFailure> {
        let iso_date = range.iso_date();
        let tab = calendar::tab_name_for_date(&iso_date).map_err(at(Operation::ResolveTab))?;

        let tab_exists = cache
            .tabs(|| self.remote(Operation::ListTabs, || self.sheet.list_tabs()))
            .map_err(at(Operation::ListTabs))?
            .contains(&tab);
        if !tab_exists {
            return Ok(DayOutcome::SkippedTabMissing { tab });
        }

        // A listed tab can still vanish before its rows are read
        let rows = match cache.rows(&tab, || {
            self.remote(Operation::ReadRows, || self.sheet.read_rows(&tab))
        }) {
            Ok(rows) => rows,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(%tab, error = %err, "tab disappeared after listing");
                return Ok(DayOutcome::SkippedTabMissing { tab });
            }
            Err(err) => return Err(DayFailure::new(Operation::ReadRows, err)),
        };
        let Some(row) = locate_row(rows, &iso_date) else {
            return Ok(DayOutcome::SkippedDateNotFound {
                tab,
                date: iso_date,
            });
        };

        let cell = CellAddress::summary(tab, row);
        let current = self
            .remote(Operation::ReadCell, || self.sheet.read_cell(&cell))
            .map_err(at(Operation::ReadCell))?;
        if let Some(existing) = current.filter(|v| !v.is_empty()) {
            return Ok(DayOutcome::SkippedAlreadyFilled { cell, existing });
        }

        debug!(%cell, "cell is empty, fetching completed tasks");
        let tasks = self
            .remote(Operation::FetchTasks, || {
                self.tasks.completed_tasks(range, project_id)
            })
            .map_err(at(Operation::FetchTasks))?;
        for task in &tasks {
            debug!(task = %task.content, "completed task");
        }

        let summary = format_summary(&tasks);
        self.remote(Operation::WriteCell, || self.sheet.write_cell(&cell, &summary))
            .map_err(at(Operation::WriteCell))?;

        Ok(DayOutcome::Written { cell, summary })
    }

    fn remote<R, F>(&self, operation: Operation, call: F) -> Result<R, SyncError>
    where
        F: FnMut() -> Result<R, SyncError>,
    {
        retry(&self.policy, operation.as_str(), call)
    }
}

fn at(operation: Operation) -> impl FnOnce(SyncError) -> DayFailure {
    move |error| DayFailure::new(operation, error)
}
