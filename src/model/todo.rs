use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 88,
        "task": "Prepare slide deck",
        "description": "Figures for the grant review",
        "percentage": 15.0,
        "project_id": 12,
        "deadline": "2026-03-01",
        "assigned_to": ["maria@lab.example"],
        "status": "pending",
        "created_by": "pi@lab.example",
        "created_at": "2026-02-03T09:00:00Z"
    })
)]
pub struct Todo {
    #[schema(example = 88)]
    pub id: u64,

    #[schema(example = "Prepare slide deck")]
    pub task: String,

    #[schema(example = "Figures for the grant review", nullable = true)]
    pub description: Option<String>,

    /// Share of project completion this task carries when finished.
    #[schema(example = 15.0)]
    pub percentage: f64,

    #[schema(example = 12, nullable = true)]
    pub project_id: Option<u64>,

    #[schema(example = "2026-03-01", value_type = String, format = "date", nullable = true)]
    pub deadline: Option<NaiveDate>,

    /// Assignee email addresses, stored as a JSON array.
    #[schema(value_type = Vec<String>)]
    pub assigned_to: Json<Vec<String>>,

    #[schema(example = "pending")]
    pub status: String,

    #[schema(example = "pi@lab.example")]
    pub created_by: String,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}
