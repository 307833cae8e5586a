use crate::{
    auth::auth::AuthUser,
    model::team_member::TeamMember,
    utils::db_utils::{build_update_sql, execute_update},
    utils::{member_cache, member_filter},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::ToSchema;

/// Columns a PUT /team/{id} payload may touch.
const UPDATABLE_COLUMNS: &[&str] = &["name", "email", "role_id", "status", "joined_at"];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateTeamMember {
    #[schema(example = "Maria Duarte")]
    pub name: String,
    #[schema(example = "maria@lab.example", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = 2)]
    pub role_id: u8,
    #[schema(example = "2025-09-01", format = "date", value_type = String)]
    pub joined_at: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TeamQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub role_id: Option<u8>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TeamListResponse {
    pub data: Vec<TeamMember>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 9)]
    pub total: i64,
}

/// Create team member
#[utoipa::path(
    post,
    path = "/api/v1/team",
    request_body = CreateTeamMember,
    responses(
        (status = 200, description = "Team member created", body = Object, example = json!({
            "message": "Team member created"
        })),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Team",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_member(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateTeamMember>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let result = sqlx::query(
        r#"
        INSERT INTO team_members (name, email, role_id, status, joined_at)
        VALUES (?, ?, ?, 'active', ?)
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(payload.role_id)
    .bind(payload.joined_at)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            // Keep the dispatcher's identity tiers in sync with the roster
            member_filter::insert(&payload.email);
            member_cache::remember(&payload.email, &payload.name).await;

            Ok(HttpResponse::Ok().json(json!({
                "message": "Team member created"
            })))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code() == Some("23000".into()) {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Email already registered"
                    })));
                }
            }

            error!(error = %e, "Failed to create team member");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            })))
        }
    }
}

// -------------------- Handler --------------------

#[utoipa::path(
    get,
    path = "/api/v1/team",
    params(
        ("page", Query, description = "Page number"),
        ("per_page", Query, description = "Items per page"),
        ("role_id", Query, description = "Filter by role"),
        ("status", Query, description = "Filter by status"),
        ("search", Query, description = "Search by name or email")
    ),
    responses(
        (status = 200, description = "Paginated team member list", body = TeamListResponse)
    ),
    tag = "Team",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_members(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TeamQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<sqlx::types::JsonValue> = Vec::new();

    if let Some(role_id) = query.role_id {
        conditions.push("role_id = ?");
        bindings.push(role_id.into());
    }

    if let Some(status) = &query.status {
        conditions.push("status = ?");
        bindings.push(status.clone().into());
    }

    if let Some(search) = &query.search {
        conditions.push("(name LIKE ? OR email LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(like.clone().into());
        bindings.push(like.into());
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) as total FROM team_members {}", where_clause);
    debug!(sql = %count_sql, bindings = ?bindings, "Counting team members");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count team members");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT * FROM team_members {} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, bindings = ?bindings, page, per_page, offset, "Fetching team members");

    let mut data_query = sqlx::query_as::<_, TeamMember>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let members = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch team members");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(TeamListResponse {
        data: members,
        page,
        per_page,
        total,
    }))
}

/// Get team member by ID
#[utoipa::path(
    get,
    path = "/api/v1/team/{member_id}",
    params(
        ("member_id", Path, description = "Team member ID")
    ),
    responses(
        (status = 200, description = "Team member found", body = TeamMember),
        (status = 404, description = "Team member not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Team",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_member(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let member_id = path.into_inner();

    let member = sqlx::query_as::<_, TeamMember>("SELECT * FROM team_members WHERE id = ?")
        .bind(member_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, member_id, "Failed to fetch team member");
            ErrorInternalServerError("Internal Server Error")
        })?;

    match member {
        Some(m) => Ok(HttpResponse::Ok().json(m)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Team member not found"
        }))),
    }
}

/// Update team member
#[utoipa::path(
    put,
    path = "/api/v1/team/{member_id}",
    params(
        ("member_id", Path, description = "Team member ID")
    ),
    responses(
        (status = 200, description = "Team member updated successfully"),
        (status = 400, description = "Unknown field or empty payload"),
        (status = 404, description = "Team member not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Team",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_member(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let member_id = path.into_inner();

    // Old email is needed to keep the identity cache coherent
    let existing = sqlx::query_as::<_, (String,)>("SELECT email FROM team_members WHERE id = ?")
        .bind(member_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, member_id, "Failed to fetch team member before update");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some((old_email,)) = existing else {
        return Ok(HttpResponse::NotFound().body("Team member not found"));
    };

    let update = build_update_sql("team_members", UPDATABLE_COLUMNS, &body, "id", member_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().body("Team member not found"));
    }

    if let Some(new_email) = body.get("email").and_then(|v| v.as_str()) {
        if new_email != old_email {
            member_filter::insert(new_email);
            member_cache::forget(&old_email).await;
        }
    }

    Ok(HttpResponse::Ok().body("Team member updated successfully"))
}

/// Delete team member
#[utoipa::path(
    delete,
    path = "/api/v1/team/{member_id}",
    params(
        ("member_id", Path, description = "Team member ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Team member not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Team",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_member(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let member_id = path.into_inner();

    let existing = sqlx::query_as::<_, (String,)>("SELECT email FROM team_members WHERE id = ?")
        .bind(member_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, member_id, "Failed to fetch team member before delete");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some((email,)) = existing else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Team member not found"
        })));
    };

    let result = sqlx::query("DELETE FROM team_members WHERE id = ?")
        .bind(member_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "message": "Team member not found"
                })));
            }

            member_filter::remove(&email);
            member_cache::forget(&email).await;

            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }

        Err(e) => {
            error!(error = %e, member_id, "Failed to delete team member");

            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}
