use crate::auth::auth::AuthUser;
use crate::model::progress::{NewProgressEntry, ProgressEntry, ProgressSummary};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RecordCompletion {
    #[schema(example = 12)]
    pub project_id: u64,
    #[schema(example = 88)]
    pub todo_id: u64,
    #[schema(example = "maria@lab.example")]
    pub user_email: String,
    #[schema(example = 15.0)]
    pub progress_added: f64,
    #[schema(example = 40.0)]
    pub previous_progress: f64,
    #[schema(example = "Prepare slide deck")]
    pub todo_task: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RecordAdjustment {
    #[schema(example = 12)]
    pub project_id: u64,
    #[schema(example = "pi@lab.example")]
    pub user_email: String,
    #[schema(example = -10.0)]
    pub progress_added: f64,
    #[schema(example = 55.0)]
    pub previous_progress: f64,
    #[schema(example = 45.0)]
    pub new_progress: f64,
    #[schema(example = "Recount after task split")]
    pub reason: String,
    #[schema(nullable = true)]
    pub details: Option<String>,
}

/// Append one entry. The ledger is insert-only; there is no update or
/// delete statement anywhere for this table.
async fn append_entry(pool: &MySqlPool, entry: &NewProgressEntry) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO progress_breakdown
            (project_id, todo_id, user_email, progress_added, previous_progress, new_progress, reason, details)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.project_id)
    .bind(entry.todo_id)
    .bind(&entry.user_email)
    .bind(entry.progress_added)
    .bind(entry.previous_progress)
    .bind(entry.new_progress)
    .bind(&entry.reason)
    .bind(&entry.details)
    .execute(pool)
    .await?;

    Ok(result.last_insert_id())
}

pub(crate) async fn record_completion_entry(
    pool: &MySqlPool,
    entry: NewProgressEntry,
) -> Result<u64, sqlx::Error> {
    append_entry(pool, &entry).await
}

/* =========================
Record a task completion
========================= */
/// Swagger doc for record_completion endpoint
#[utoipa::path(
    post,
    path = "/api/v1/progress/completion",
    request_body = RecordCompletion,
    responses(
        (status = 200, description = "Entry appended", body = Object, example = json!({
            "message": "Progress recorded",
            "entry_id": 101,
            "new_progress": 55.0
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Progress"
)]
pub async fn record_completion(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<RecordCompletion>,
) -> actix_web::Result<impl Responder> {
    let entry = NewProgressEntry::completion(
        payload.project_id,
        payload.todo_id,
        &payload.user_email,
        payload.progress_added,
        payload.previous_progress,
        &payload.todo_task,
    );
    let new_progress = entry.new_progress;

    let entry_id = append_entry(pool.get_ref(), &entry).await.map_err(|e| {
        tracing::error!(error = %e, project_id = payload.project_id, "Failed to append completion entry");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Progress recorded",
        "entry_id": entry_id,
        "new_progress": new_progress
    })))
}

/* =========================
Record a manual adjustment
========================= */
/// Swagger doc for record_adjustment endpoint
#[utoipa::path(
    post,
    path = "/api/v1/progress/adjustment",
    request_body = RecordAdjustment,
    responses(
        (status = 200, description = "Entry appended", body = Object, example = json!({
            "message": "Adjustment recorded",
            "entry_id": 102
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Progress"
)]
pub async fn record_adjustment(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<RecordAdjustment>,
) -> actix_web::Result<impl Responder> {
    let entry = NewProgressEntry::manual_adjustment(
        payload.project_id,
        &payload.user_email,
        payload.progress_added,
        payload.previous_progress,
        payload.new_progress,
        &payload.reason,
        payload.details.clone(),
    );

    let entry_id = append_entry(pool.get_ref(), &entry).await.map_err(|e| {
        tracing::error!(error = %e, project_id = payload.project_id, "Failed to append adjustment entry");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Adjustment recorded",
        "entry_id": entry_id
    })))
}

/* =========================
Project summary
========================= */
/// Swagger doc for project_summary endpoint
#[utoipa::path(
    get,
    path = "/api/v1/progress/{project_id}/summary",
    params(
        ("project_id" = u64, Path, description = "Project to summarize")
    ),
    responses(
        (status = 200, description = "Rollup of ledger entries", body = ProgressSummary),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Progress"
)]
pub async fn project_summary(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let project_id = path.into_inner();

    let entries = sqlx::query_as::<_, ProgressEntry>(
        r#"
        SELECT * FROM progress_breakdown
        WHERE project_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(project_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, project_id, "Failed to fetch ledger entries");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(ProgressSummary::rollup(project_id, entries)))
}
