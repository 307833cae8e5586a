use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

/// Append-only ledger row. No update or delete path exists anywhere in
/// the crate; entries are immutable once inserted.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ProgressEntry {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 12)]
    pub project_id: u64,

    #[schema(example = 88, nullable = true)]
    pub todo_id: Option<u64>,

    #[schema(example = "maria@lab.example")]
    pub user_email: String,

    /// Signed delta; may be negative for corrections.
    #[schema(example = 15.0)]
    pub progress_added: f64,

    #[schema(example = 40.0)]
    pub previous_progress: f64,

    #[schema(example = 55.0)]
    pub new_progress: f64,

    #[schema(example = "Completed task: prepare slide deck")]
    pub reason: String,

    #[schema(nullable = true)]
    pub details: Option<String>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Values for a new ledger row, before the store assigns id/created_at.
#[derive(Debug)]
pub struct NewProgressEntry {
    pub project_id: u64,
    pub todo_id: Option<u64>,
    pub user_email: String,
    pub progress_added: f64,
    pub previous_progress: f64,
    pub new_progress: f64,
    pub reason: String,
    pub details: Option<String>,
}

impl NewProgressEntry {
    /// Entry for a completed todo. `new_progress` is derived from the
    /// caller-supplied baseline; out-of-range values are recorded as-is,
    /// the ledger does not clamp.
    pub fn completion(
        project_id: u64,
        todo_id: u64,
        user_email: &str,
        progress_added: f64,
        previous_progress: f64,
        todo_task: &str,
    ) -> Self {
        NewProgressEntry {
            project_id,
            todo_id: Some(todo_id),
            user_email: user_email.to_string(),
            progress_added,
            previous_progress,
            new_progress: previous_progress + progress_added,
            reason: format!("Completed task: {}", todo_task),
            details: None,
        }
    }

    /// Entry for a manual correction; the caller supplies both the reason
    /// and the resulting progress value.
    pub fn manual_adjustment(
        project_id: u64,
        user_email: &str,
        progress_added: f64,
        previous_progress: f64,
        new_progress: f64,
        reason: &str,
        details: Option<String>,
    ) -> Self {
        NewProgressEntry {
            project_id,
            todo_id: None,
            user_email: user_email.to_string(),
            progress_added,
            previous_progress,
            new_progress,
            reason: reason.to_string(),
            details,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressSummary {
    #[schema(example = 12)]
    pub project_id: u64,
    /// Sum of all recorded deltas for the project.
    #[schema(example = 72.5)]
    pub total_progress: f64,
    #[schema(example = 3)]
    pub contributors: u64,
    #[schema(example = 9)]
    pub entry_count: u64,
    /// Most-recent-first, as returned by the store.
    pub entries: Vec<ProgressEntry>,
}

impl ProgressSummary {
    pub fn rollup(project_id: u64, entries: Vec<ProgressEntry>) -> Self {
        let total_progress = entries.iter().map(|e| e.progress_added).sum();
        let contributors = entries
            .iter()
            .map(|e| e.user_email.as_str())
            .collect::<HashSet<_>>()
            .len() as u64;
        let entry_count = entries.len() as u64;

        ProgressSummary {
            project_id,
            total_progress,
            contributors,
            entry_count,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_entry_adds_up() {
        let entry = NewProgressEntry::completion(12, 88, "maria@lab.example", 15.0, 40.0, "slides");
        assert_eq!(entry.new_progress, entry.previous_progress + entry.progress_added);
        assert_eq!(entry.todo_id, Some(88));
        assert_eq!(entry.reason, "Completed task: slides");
    }

    #[test]
    fn completion_accepts_out_of_range_values() {
        // The 0–100 range is a UI expectation, not a ledger invariant.
        let over = NewProgressEntry::completion(1, 2, "a@b", 60.0, 70.0, "t");
        assert_eq!(over.new_progress, 130.0);

        let negative = NewProgressEntry::completion(1, 2, "a@b", -30.0, 10.0, "t");
        assert_eq!(negative.new_progress, -20.0);
    }

    #[test]
    fn manual_adjustment_trusts_the_caller() {
        let entry =
            NewProgressEntry::manual_adjustment(3, "pi@lab.example", -10.0, 50.0, 40.0, "recount", None);
        assert_eq!(entry.new_progress, 40.0);
        assert_eq!(entry.todo_id, None);
        assert_eq!(entry.reason, "recount");
    }

    fn entry(id: u64, email: &str, added: f64) -> ProgressEntry {
        ProgressEntry {
            id,
            project_id: 12,
            todo_id: None,
            user_email: email.to_string(),
            progress_added: added,
            previous_progress: 0.0,
            new_progress: added,
            reason: "r".into(),
            details: None,
            created_at: None,
        }
    }

    #[test]
    fn rollup_totals_and_distinct_contributors() {
        let summary = ProgressSummary::rollup(
            12,
            vec![
                entry(3, "a@lab", 20.0),
                entry(2, "b@lab", 30.0),
                entry(1, "a@lab", 10.0),
            ],
        );
        assert_eq!(summary.total_progress, 60.0);
        assert_eq!(summary.contributors, 2);
        assert_eq!(summary.entry_count, 3);
        // Order is whatever the store returned; rollup must not reorder.
        assert_eq!(summary.entries[0].id, 3);
    }

    #[test]
    fn rollup_of_empty_project() {
        let summary = ProgressSummary::rollup(9, vec![]);
        assert_eq!(summary.total_progress, 0.0);
        assert_eq!(summary.contributors, 0);
        assert_eq!(summary.entry_count, 0);
    }
}
