//! Row lookup by date

use daylog_core::SheetRow;

/// 1-based number of the first row whose column A equals `date`.
///
/// Comparison is exact string equality; rows are scanned top to bottom and
/// the first match wins when a date appears more than once.
pub fn locate_row(rows: &[SheetRow], date: &str) -> Option<usize> {
    rows.iter()
        .position(|row| row.first().is_some_and(|cell| cell == date))
        .map(|index| index + 1)
}
