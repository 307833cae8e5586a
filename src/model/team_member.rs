use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "name": "Maria Duarte",
        "email": "maria@lab.example",
        "role_id": 2,
        "status": "active",
        "joined_at": "2025-09-01"
    })
)]
pub struct TeamMember {
    #[schema(example = 7)]
    pub id: u64,

    #[schema(example = "Maria Duarte")]
    pub name: String,

    #[schema(example = "maria@lab.example")]
    pub email: String,

    #[schema(example = 2)]
    pub role_id: u8,

    #[schema(example = "active")]
    pub status: String,

    #[schema(example = "2025-09-01", value_type = String, format = "date")]
    pub joined_at: NaiveDate,
}
