//! In-memory task source and spreadsheet for reconciliation tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Days, NaiveDate};
use daylog_core::{
    CellAddress, DateRange, Project, RetryPolicy, SheetRow, Spreadsheet, SyncError, TabName,
    TaskRecord, TaskSource,
};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn tab(name: &str) -> TabName {
    TabName::from(name)
}

/// No waiting between attempts
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::immediate(3)
}

// ============================================================================
// Task Source
// ============================================================================

#[derive(Default)]
pub struct FakeTasks {
    pub projects: Vec<Project>,
    pub completed: HashMap<NaiveDate, Vec<TaskRecord>>,
    /// Days whose fetch always fails with a transient error
    pub broken_days: HashSet<NaiveDate>,
    /// Error returned by every project listing
    pub projects_error: Option<SyncError>,
    pub list_calls: Cell<u32>,
    pub fetch_calls: RefCell<Vec<(NaiveDate, String)>>,
}

impl FakeTasks {
    pub fn new() -> Self {
        Self {
            projects: vec![Project::new("100", "Inbox"), Project::new("200", "Daily")],
            ..Self::default()
        }
    }

    pub fn with_tasks(mut self, day: NaiveDate, contents: &[&str]) -> Self {
        self.completed
            .insert(day, contents.iter().map(|c| TaskRecord::new(*c)).collect());
        self
    }

    pub fn fetches_for(&self, day: NaiveDate) -> usize {
        self.fetch_calls
            .borrow()
            .iter()
            .filter(|(d, _)| *d == day)
            .count()
    }
}

impl TaskSource for FakeTasks {
    fn list_projects(&self) -> Result<Vec<Project>, SyncError> {
        self.list_calls.set(self.list_calls.get() + 1);
        match &self.projects_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.projects.clone()),
        }
    }

    fn completed_tasks(
        &self,
        range: &DateRange,
        project_id: &str,
    ) -> Result<Vec<TaskRecord>, SyncError> {
        let day = range.date();
        self.fetch_calls
            .borrow_mut()
            .push((day, project_id.to_string()));
        if self.broken_days.contains(&day) {
            return Err(SyncError::Transport(format!("timed out fetching {day}")));
        }
        Ok(self.completed.get(&day).cloned().unwrap_or_default())
    }
}

// ============================================================================
// Spreadsheet
// ============================================================================

/// Tabs of rows; cells are read and written in place
#[derive(Default)]
pub struct FakeSheet {
    pub grid: RefCell<BTreeMap<TabName, Vec<SheetRow>>>,
    /// Transient failures still to be returned by `read_cell`
    pub flaky_reads: Cell<u32>,
    /// Tabs that are listed but whose rows cannot be read
    pub rows_errors: RefCell<HashMap<TabName, SyncError>>,
    pub list_tabs_calls: Cell<u32>,
    pub read_rows_calls: Cell<u32>,
    pub writes: RefCell<Vec<(CellAddress, String)>>,
}

impl FakeSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A month tab with a header row followed by one row per day
    pub fn with_month(self, name: &str, first: NaiveDate, days: u64) -> Self {
        let mut rows = vec![vec!["Date".to_string(), "Mood".into(), "Sleep".into(), "Steps".into(), "Tasks".into()]];
        for i in 0..days {
            let day = first + Days::new(i);
            rows.push(vec![day.format("%Y-%m-%d").to_string()]);
        }
        self.grid.borrow_mut().insert(tab(name), rows);
        self
    }

    /// Remove the row holding `iso_date` from a tab
    pub fn without_row(self, name: &str, iso_date: &str) -> Self {
        if let Some(rows) = self.grid.borrow_mut().get_mut(&tab(name)) {
            rows.retain(|r| r.first().map(String::as_str) != Some(iso_date));
        }
        self
    }

    /// Set column E of the row holding `iso_date`
    pub fn with_summary(self, name: &str, iso_date: &str, value: &str) -> Self {
        if let Some(rows) = self.grid.borrow_mut().get_mut(&tab(name)) {
            if let Some(row) = rows
                .iter_mut()
                .find(|r| r.first().map(String::as_str) == Some(iso_date))
            {
                set(row, 4, value);
            }
        }
        self
    }

    /// Keep `name` in the tab list but fail every read of its rows
    pub fn with_rows_error(self, name: &str, error: SyncError) -> Self {
        self.rows_errors.borrow_mut().insert(tab(name), error);
        self
    }

    /// Column E of the row holding `iso_date`
    pub fn summary(&self, name: &str, iso_date: &str) -> Option<String> {
        self.grid
            .borrow()
            .get(&tab(name))?
            .iter()
            .find(|r| r.first().map(String::as_str) == Some(iso_date))?
            .get(4)
            .filter(|v| !v.is_empty())
            .cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<TabName, Vec<SheetRow>> {
        self.grid.borrow().clone()
    }
}

fn column_index(column: char) -> usize {
    (column as u8 - b'A') as usize
}

fn set(row: &mut SheetRow, index: usize, value: &str) {
    if row.len() <= index {
        row.resize(index + 1, String::new());
    }
    row[index] = value.to_string();
}

impl Spreadsheet for FakeSheet {
    fn list_tabs(&self) -> Result<Vec<TabName>, SyncError> {
        self.list_tabs_calls.set(self.list_tabs_calls.get() + 1);
        Ok(self.grid.borrow().keys().cloned().collect())
    }

    fn read_rows(&self, tab: &TabName) -> Result<Vec<SheetRow>, SyncError> {
        self.read_rows_calls.set(self.read_rows_calls.get() + 1);
        if let Some(err) = self.rows_errors.borrow().get(tab) {
            return Err(err.clone());
        }
        self.grid
            .borrow()
            .get(tab)
            .cloned()
            .ok_or_else(|| SyncError::TabNotFound(tab.clone()))
    }

    fn read_cell(&self, cell: &CellAddress) -> Result<Option<String>, SyncError> {
        if self.flaky_reads.get() > 0 {
            self.flaky_reads.set(self.flaky_reads.get() - 1);
            return Err(SyncError::http(503, "backend unavailable"));
        }
        let grid = self.grid.borrow();
        let value = grid
            .get(&cell.tab)
            .and_then(|rows| rows.get(cell.row - 1))
            .and_then(|row| row.get(column_index(cell.column)))
            .cloned();
        Ok(value)
    }

    fn write_cell(&self, cell: &CellAddress, value: &str) -> Result<(), SyncError> {
        let mut grid = self.grid.borrow_mut();
        let row = grid
            .get_mut(&cell.tab)
            .and_then(|rows| rows.get_mut(cell.row - 1))
            .ok_or_else(|| SyncError::http(400, format!("no such cell {cell}")))?;
        set(row, column_index(cell.column), value);
        self.writes
            .borrow_mut()
            .push((cell.clone(), value.to_string()));
        Ok(())
    }
}
