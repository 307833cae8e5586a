use crate::api::notifications::{DispatchRequest, dispatch_assignment};
use crate::api::progress::record_completion_entry;
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::mailer::Mailer;
use crate::model::progress::NewProgressEntry;
use crate::model::todo::Todo;
use crate::utils::db_utils::{build_update_sql, execute_update};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use sqlx::types::Json;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

/// Columns a PUT /todos/{id} payload may touch.
const UPDATABLE_COLUMNS: &[&str] = &[
    "task",
    "description",
    "percentage",
    "project_id",
    "deadline",
    "assigned_to",
    "status",
];

#[derive(Deserialize, ToSchema)]
pub struct CreateTodo {
    #[schema(example = "Prepare slide deck")]
    pub task: String,
    #[schema(example = "Figures for the grant review", nullable = true)]
    pub description: Option<String>,
    #[schema(example = 15.0)]
    pub percentage: f64,
    #[schema(example = 12, nullable = true)]
    pub project_id: Option<u64>,
    /// Display name used in the notification email
    #[schema(example = "Grant 2026", nullable = true)]
    pub project_name: Option<String>,
    #[schema(example = "2026-03-01", value_type = String, format = "date", nullable = true)]
    pub deadline: Option<NaiveDate>,
    #[schema(example = json!(["maria@lab.example"]))]
    pub assigned_to: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CompleteTodo {
    /// Project completion percentage before this task, as shown to the user
    #[schema(example = 40.0)]
    pub previous_progress: f64,
    #[schema(example = "maria@lab.example")]
    pub user_email: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct TodoFilter {
    /// Filter by status
    #[schema(example = "pending")]
    pub status: Option<String>,
    /// Filter by project
    #[schema(example = 12)]
    pub project_id: Option<u64>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[schema(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(serde::Serialize, ToSchema)]
pub struct TodoListResponse {
    pub data: Vec<Todo>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 20)]
    pub per_page: u64,
    #[schema(example = 7)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/* =========================
Create todo (+ assignment notifications)
========================= */
/// Swagger doc for create_todo endpoint
#[utoipa::path(
    post,
    path = "/api/v1/todos",
    request_body = CreateTodo,
    responses(
        (status = 200, description = "Todo created; notification counts included", body = Object, example = json!({
            "message": "Todo created",
            "todo_id": 88,
            "notifications": { "success": true, "message": "Notifications dispatched", "sent": 1, "failed": 0 }
        })),
        (status = 400, description = "Empty task"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Todos"
)]
pub async fn create_todo(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    mailer: web::Data<Mailer>,
    config: web::Data<Config>,
    payload: web::Json<CreateTodo>,
) -> actix_web::Result<impl Responder> {
    if payload.task.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "task must not be empty"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO todos (task, description, percentage, project_id, deadline, assigned_to, status, created_by)
        VALUES (?, ?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(payload.task.trim())
    .bind(&payload.description)
    .bind(payload.percentage)
    .bind(payload.project_id)
    .bind(payload.deadline)
    .bind(Json(&payload.assigned_to))
    .bind(&auth.username)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create todo");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let todo_id = result.last_insert_id();

    // Notify assignees; dispatch failure never fails the create.
    let dispatch = dispatch_assignment(
        pool.get_ref(),
        mailer.get_ref(),
        config.get_ref(),
        &DispatchRequest {
            todo_id,
            assigned_to: payload.assigned_to.clone(),
            task_title: payload.task.trim().to_string(),
            task_description: payload.description.clone(),
            project_name: payload.project_name.clone(),
            deadline: payload.deadline,
            assigned_by: auth.username.clone(),
        },
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Todo created",
        "todo_id": todo_id,
        "notifications": dispatch
    })))
}

/* =========================
List todos
========================= */
/// Swagger doc for list_todos endpoint
#[utoipa::path(
    get,
    path = "/api/v1/todos",
    params(TodoFilter),
    responses(
        (status = 200, description = "Paginated todo list", body = TodoListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Todos"
)]
pub async fn list_todos(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TodoFilter>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    if let Some(project_id) = query.project_id {
        where_sql.push_str(" AND project_id = ?");
        args.push(FilterValue::U64(project_id));
    }

    let count_sql = format!("SELECT COUNT(*) FROM todos{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count todos");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT * FROM todos
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Todo>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let todos = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch todos");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(TodoListResponse {
        data: todos,
        page,
        per_page,
        total,
    }))
}

/* =========================
Update todo
========================= */
/// Swagger doc for update_todo endpoint
#[utoipa::path(
    put,
    path = "/api/v1/todos/{todo_id}",
    params(
        ("todo_id" = u64, Path, description = "Todo ID")
    ),
    responses(
        (status = 200, description = "Todo updated successfully"),
        (status = 400, description = "Unknown field or empty payload"),
        (status = 404, description = "Todo not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Todos"
)]
pub async fn update_todo(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let todo_id = path.into_inner();

    let update = build_update_sql("todos", UPDATABLE_COLUMNS, &body, "id", todo_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().body("Todo not found"));
    }

    Ok(HttpResponse::Ok().body("Todo updated successfully"))
}

/* =========================
Complete todo (writes the progress ledger)
========================= */
/// Swagger doc for complete_todo endpoint
#[utoipa::path(
    put,
    path = "/api/v1/todos/{todo_id}/complete",
    params(
        ("todo_id" = u64, Path, description = "Todo ID")
    ),
    request_body = CompleteTodo,
    responses(
        (status = 200, description = "Todo completed", body = Object, example = json!({
            "message": "Todo completed",
            "new_progress": 55.0
        })),
        (status = 400, description = "Todo not found or already completed"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Todos"
)]
pub async fn complete_todo(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<CompleteTodo>,
) -> actix_web::Result<impl Responder> {
    let todo_id = path.into_inner();

    let todo = sqlx::query_as::<_, Todo>("SELECT * FROM todos WHERE id = ?")
        .bind(todo_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, todo_id, "Failed to fetch todo");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(todo) = todo else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Todo not found"
        })));
    };

    let result = sqlx::query(
        r#"
        UPDATE todos
        SET status = 'completed'
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(todo_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, todo_id, "Failed to complete todo");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Todo not found or already completed"
        })));
    }

    // Tasks attached to a project contribute their percentage to the ledger
    let mut new_progress = None;
    if let Some(project_id) = todo.project_id {
        let entry = NewProgressEntry::completion(
            project_id,
            todo_id,
            &payload.user_email,
            todo.percentage,
            payload.previous_progress,
            &todo.task,
        );
        new_progress = Some(entry.new_progress);

        record_completion_entry(pool.get_ref(), entry)
            .await
            .map_err(|e| {
                error!(error = %e, todo_id, project_id, "Failed to record completion in ledger");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Todo completed",
        "new_progress": new_progress
    })))
}

/* =========================
Delete todo
========================= */
/// Swagger doc for delete_todo endpoint
#[utoipa::path(
    delete,
    path = "/api/v1/todos/{todo_id}",
    params(
        ("todo_id" = u64, Path, description = "Todo ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Todo not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Todos"
)]
pub async fn delete_todo(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let todo_id = path.into_inner();

    let result = sqlx::query("DELETE FROM todos WHERE id = ?")
        .bind(todo_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "message": "Todo not found"
                })));
            }

            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }

        Err(e) => {
            error!(error = %e, todo_id, "Failed to delete todo");

            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}
