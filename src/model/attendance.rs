use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Closed status set. Anything else is rejected at deserialization,
/// before a store call is ever made.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, sqlx::Type, Display, EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

/// One row per (team member, date), enforced by a unique key in the store.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "team_member_id": 7,
        "date": "2026-02-03",
        "status": "present",
        "notes": null,
        "marked_by": "admin",
        "created_at": "2026-02-03T08:55:00Z",
        "updated_at": "2026-02-03T08:55:00Z"
    })
)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 7)]
    pub team_member_id: u64,

    #[schema(example = "2026-02-03", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub status: AttendanceStatus,

    #[schema(example = "left early", nullable = true)]
    pub notes: Option<String>,

    #[schema(example = "admin")]
    pub marked_by: String,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Derived per-status tallies over a queried record set; never stored.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct AttendanceStats {
    #[schema(example = 20)]
    pub total_days: u64,
    #[schema(example = 16)]
    pub present_days: u64,
    #[schema(example = 2)]
    pub absent_days: u64,
    #[schema(example = 1)]
    pub late_days: u64,
    #[schema(example = 1)]
    pub excused_days: u64,
    /// present / total * 100, or 0 when there are no records.
    #[schema(example = 80.0)]
    pub attendance_rate: f64,
}

impl AttendanceStats {
    pub fn tally(records: &[AttendanceRecord]) -> Self {
        let mut stats = AttendanceStats::default();

        for record in records {
            stats.total_days += 1;
            match record.status {
                AttendanceStatus::Present => stats.present_days += 1,
                AttendanceStatus::Absent => stats.absent_days += 1,
                AttendanceStatus::Late => stats.late_days += 1,
                AttendanceStatus::Excused => stats.excused_days += 1,
            }
        }

        if stats.total_days > 0 {
            stats.attendance_rate = stats.present_days as f64 / stats.total_days as f64 * 100.0;
        }

        stats
    }
}

/// Members due an auto-absent row: active members minus those already
/// marked for the date. Running the sweep again after inserting these
/// yields an empty target list, which is what makes it idempotent.
pub fn sweep_targets(active_members: &[u64], already_marked: &[u64]) -> Vec<u64> {
    let marked: HashSet<u64> = already_marked.iter().copied().collect();
    active_members
        .iter()
        .copied()
        .filter(|id| !marked.contains(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, member: u64, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id,
            team_member_id: member,
            date: NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
            status,
            notes: None,
            marked_by: "admin".into(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn tally_counts_sum_to_total() {
        use AttendanceStatus::*;
        let records = vec![
            record(1, 1, Present),
            record(2, 2, Present),
            record(3, 3, Absent),
            record(4, 4, Late),
            record(5, 5, Excused),
        ];
        let stats = AttendanceStats::tally(&records);

        assert_eq!(stats.total_days, 5);
        assert_eq!(
            stats.present_days + stats.absent_days + stats.late_days + stats.excused_days,
            stats.total_days
        );
        assert!((stats.attendance_rate - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tally_rate_stays_in_range() {
        use AttendanceStatus::*;
        let all_present: Vec<_> = (0..10).map(|i| record(i, i, Present)).collect();
        let none_present: Vec<_> = (0..10).map(|i| record(i, i, Absent)).collect();

        assert!((AttendanceStats::tally(&all_present).attendance_rate - 100.0).abs() < f64::EPSILON);
        assert_eq!(AttendanceStats::tally(&none_present).attendance_rate, 0.0);
    }

    #[test]
    fn tally_of_nothing_is_zeroed_not_nan() {
        let stats = AttendanceStats::tally(&[]);
        assert_eq!(stats.total_days, 0);
        assert_eq!(stats.attendance_rate, 0.0);
    }

    #[test]
    fn sweep_skips_already_marked_members() {
        let targets = sweep_targets(&[1, 2, 3, 4], &[2, 4]);
        assert_eq!(targets, vec![1, 3]);
    }

    #[test]
    fn sweep_is_idempotent() {
        let active = [1, 2, 3];
        let first = sweep_targets(&active, &[]);
        assert_eq!(first, vec![1, 2, 3]);

        // After the first run every member has a row, so the second run
        // finds nothing to insert.
        let second = sweep_targets(&active, &first);
        assert!(second.is_empty());
    }

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!(AttendanceStatus::Present.to_string(), "present");
        assert_eq!("excused".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Excused);
        assert!("holiday".parse::<AttendanceStatus>().is_err());
    }
}
