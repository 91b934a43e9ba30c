//! Day windows and month tabs
//!
//! A reconciled day is identified two ways:
//!
//! - **In the task source** by a UTC range covering the whole calendar day,
//!   from `00:00:00` to `23:59:59.999999` inclusive. Consecutive ranges never
//!   overlap and leave no gap, so every instant belongs to exactly one day.
//! - **In the spreadsheet** by a tab per month named `{Mon}-{YY}`
//!   (`Jan-24`, `Feb-24`, ...) and a row whose column A holds the ISO date.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use daylog_core::calendar::{tab_name, DateRange};
//!
//! let day = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
//! let range = DateRange::for_day(day);
//! assert_eq!(range.since_param(), "2024-12-31T00:00:00Z");
//! assert_eq!(range.until_param(), "2024-12-31T23:59:59.999999Z");
//!
//! assert_eq!(tab_name("24", "12").unwrap().as_str(), "Dec-24");
//! ```

use chrono::{DateTime, Days, NaiveDate, NaiveTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{DayOffset, SyncError};

/// Three-letter month abbreviations, January first
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ============================================================================
// Date Range
// ============================================================================

/// Inclusive UTC bounds of one calendar day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Range covering `date` from midnight to the last representable microsecond
    pub fn for_day(date: NaiveDate) -> Self {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = start + TimeDelta::days(1) - TimeDelta::microseconds(1);
        Self { start, end }
    }

    /// Range for the day `offset` days before `today`
    pub fn for_offset(today: NaiveDate, offset: DayOffset) -> Self {
        Self::for_day(today - Days::new(u64::from(offset)))
    }

    /// Calendar day covered by this range
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// `YYYY-MM-DD`, as stored in column A of the sheet
    pub fn iso_date(&self) -> String {
        self.date().format("%Y-%m-%d").to_string()
    }

    /// Lower bound for the task query, e.g. `2024-01-05T00:00:00Z`
    pub fn since_param(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// Upper bound for the task query, e.g. `2024-01-05T23:59:59.999999Z`
    pub fn until_param(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

// ============================================================================
// Tab Names
// ============================================================================

/// Title of a spreadsheet tab
///
/// Titles listed by the spreadsheet can be anything; the ones produced by
/// [`tab_name`] always follow the `{Mon}-{YY}` form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabName(String);

impl TabName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TabName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TabName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&str> for TabName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl PartialEq<str> for TabName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TabName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Parts of an ISO date used to address the sheet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateParts<'a> {
    /// Year within the century, `"24"` for 2024
    pub short_year: &'a str,
    /// Two-digit month, `"01"` through `"12"`
    pub month: &'a str,
    /// `YYYY-MM-DD`
    pub date: &'a str,
}

/// Split an ISO date or timestamp into the pieces the sheet layout uses.
///
/// Only positions are inspected, so `2024-01-05T00:00:00Z` and `2024-01-05`
/// split the same way.
pub fn split_iso_date(iso: &str) -> Result<DateParts<'_>, SyncError> {
    let malformed = || SyncError::MalformedDate(iso.to_string());

    if iso.get(4..5) != Some("-") || iso.get(7..8) != Some("-") {
        return Err(malformed());
    }
    Ok(DateParts {
        short_year: iso.get(2..4).ok_or_else(malformed)?,
        month: iso.get(5..7).ok_or_else(malformed)?,
        date: iso.get(..10).ok_or_else(malformed)?,
    })
}

/// Tab holding the given month: `tab_name("24", "01")` is `Jan-24`.
///
/// Fails with [`SyncError::InvalidMonth`] when `month` is not `"01"`..`"12"`.
pub fn tab_name(short_year: &str, month: &str) -> Result<TabName, SyncError> {
    let index = match month.as_bytes() {
        [b'0', d @ b'1'..=b'9'] => usize::from(d - b'0'),
        [b'1', d @ b'0'..=b'2'] => 10 + usize::from(d - b'0'),
        _ => return Err(SyncError::InvalidMonth(month.to_string())),
    };
    let abbreviation = MONTH_ABBREVIATIONS[index - 1];
    Ok(TabName(format!("{abbreviation}-{short_year}")))
}

/// Tab holding the month of an ISO date
pub fn tab_name_for_date(iso: &str) -> Result<TabName, SyncError> {
    let parts = split_iso_date(iso)?;
    tab_name(parts.short_year, parts.month)
}
