//! Cell value written for a day

use daylog_core::TaskRecord;

/// Written when no task was completed that day
pub const NO_TASKS: &str = "N/A";

/// Between task titles
pub const SEPARATOR: &str = "; ";

/// `"N/A"` for an empty day, otherwise task titles joined with `"; "`
pub fn format_summary(tasks: &[TaskRecord]) -> String {
    if tasks.is_empty() {
        return NO_TASKS.to_string();
    }
    tasks
        .iter()
        .map(|t| t.content.as_str())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}
