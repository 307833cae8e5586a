use crate::auth::auth::AuthUser;
use crate::model::attendance::{AttendanceRecord, AttendanceStats, AttendanceStatus, sweep_targets};
use crate::model::role::SYSTEM_MARKER;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = 7)]
    pub team_member_id: u64,
    #[schema(example = "2026-02-03", format = "date", value_type = String)]
    pub date: NaiveDate,
    /// One of: present, absent, late, excused
    pub status: AttendanceStatus,
    #[schema(example = "left early", nullable = true)]
    pub notes: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceFilter {
    /// Filter by team member ID
    #[schema(example = 7)]
    pub member_id: Option<u64>,
    /// Start of date range (inclusive)
    #[schema(example = "2026-02-01", value_type = String, format = "date")]
    pub from: Option<NaiveDate>,
    /// End of date range (inclusive)
    #[schema(example = "2026-02-28", value_type = String, format = "date")]
    pub to: Option<NaiveDate>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[schema(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct StatsFilter {
    /// Comma-separated team member IDs; omit for the whole team
    #[schema(example = "1,2,7")]
    pub member_ids: Option<String>,
    #[schema(example = "2026-02-01", value_type = String, format = "date")]
    pub from: Option<NaiveDate>,
    #[schema(example = "2026-02-28", value_type = String, format = "date")]
    pub to: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct SweepRequest {
    /// Date to sweep; defaults to the current date
    #[schema(example = "2026-02-03", value_type = String, format = "date", nullable = true)]
    pub date: Option<NaiveDate>,
}

#[derive(serde::Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 20)]
    pub per_page: u64,
    #[schema(example = 42)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Date(NaiveDate),
}

/* =========================
Mark attendance (upsert)
========================= */
/// Swagger doc for mark_attendance endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = AttendanceRecord),
        (status = 400, description = "Invalid status or date"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<MarkAttendance>,
) -> actix_web::Result<impl Responder> {
    // One row per (member, date): a later mark overwrites, never appends.
    sqlx::query(
        r#"
        INSERT INTO attendance_records (team_member_id, date, status, notes, marked_by)
        VALUES (?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            status = VALUES(status),
            notes = VALUES(notes),
            marked_by = VALUES(marked_by)
        "#,
    )
    .bind(payload.team_member_id)
    .bind(payload.date)
    .bind(payload.status)
    .bind(&payload.notes)
    .bind(&auth.username)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, member_id = payload.team_member_id, "Failed to mark attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let record = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT * FROM attendance_records
        WHERE team_member_id = ? AND date = ?
        "#,
    )
    .bind(payload.team_member_id)
    .bind(payload.date)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch attendance record after upsert");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(record))
}

/* =========================
List attendance records
========================= */
/// Swagger doc for list_attendance endpoint
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Paginated attendance records", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceFilter>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(member_id) = query.member_id {
        where_sql.push_str(" AND team_member_id = ?");
        args.push(FilterValue::U64(member_id));
    }

    if let Some(from) = query.from {
        where_sql.push_str(" AND date >= ?");
        args.push(FilterValue::Date(from));
    }

    if let Some(to) = query.to {
        where_sql.push_str(" AND date <= ?");
        args.push(FilterValue::Date(to));
    }

    let count_sql = format!("SELECT COUNT(*) FROM attendance_records{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count attendance records");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT * FROM attendance_records
        {}
        ORDER BY date DESC, team_member_id ASC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, AttendanceRecord>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let records = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch attendance records");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data: records,
        page,
        per_page,
        total,
    }))
}

/* =========================
Aggregate statistics
========================= */
/// Swagger doc for attendance_stats endpoint
#[utoipa::path(
    get,
    path = "/api/v1/attendance/stats",
    params(StatsFilter),
    responses(
        (status = 200, description = "Tallied attendance statistics", body = AttendanceStats),
        (status = 400, description = "Malformed member_ids list"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_stats(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<StatsFilter>,
) -> actix_web::Result<impl Responder> {
    // Validate the id list before touching the store
    let member_ids: Vec<u64> = match &query.member_ids {
        Some(csv) => csv
            .split(',')
            .map(|s| s.trim().parse::<u64>())
            .collect::<Result<_, _>>()
            .map_err(|_| {
                actix_web::error::ErrorBadRequest("member_ids must be comma-separated integers")
            })?,
        None => Vec::new(),
    };

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if !member_ids.is_empty() {
        let placeholders = vec!["?"; member_ids.len()].join(", ");
        where_sql.push_str(&format!(" AND team_member_id IN ({})", placeholders));
        args.extend(member_ids.into_iter().map(FilterValue::U64));
    }

    if let Some(from) = query.from {
        where_sql.push_str(" AND date >= ?");
        args.push(FilterValue::Date(from));
    }

    if let Some(to) = query.to {
        where_sql.push_str(" AND date <= ?");
        args.push(FilterValue::Date(to));
    }

    let sql = format!("SELECT * FROM attendance_records{}", where_sql);

    let mut data_q = sqlx::query_as::<_, AttendanceRecord>(&sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let records = data_q.fetch_all(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch records for stats");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // No matching rows is a zeroed result, not an error
    Ok(HttpResponse::Ok().json(AttendanceStats::tally(&records)))
}

/* =========================
Daily auto-absent sweep
========================= */

/// Inserts an `absent` row for every active member lacking one on `as_of`.
/// INSERT IGNORE plus the unique (member, date) key make the operation
/// idempotent and guarantee an explicit mark is never overwritten.
/// Returns the number of rows inserted.
pub async fn run_absence_sweep(pool: &MySqlPool, as_of: NaiveDate) -> Result<u64, sqlx::Error> {
    let active: Vec<(u64,)> =
        sqlx::query_as("SELECT id FROM team_members WHERE status = 'active'")
            .fetch_all(pool)
            .await?;

    let marked: Vec<(u64,)> =
        sqlx::query_as("SELECT team_member_id FROM attendance_records WHERE date = ?")
            .bind(as_of)
            .fetch_all(pool)
            .await?;

    let active: Vec<u64> = active.into_iter().map(|(id,)| id).collect();
    let marked: Vec<u64> = marked.into_iter().map(|(id,)| id).collect();

    let targets = sweep_targets(&active, &marked);
    if targets.is_empty() {
        return Ok(0);
    }

    let mut builder: QueryBuilder<MySql> = QueryBuilder::new(
        "INSERT IGNORE INTO attendance_records (team_member_id, date, status, marked_by) ",
    );
    builder.push_values(targets.iter().copied(), |mut b, member_id| {
        b.push_bind(member_id)
            .push_bind(as_of)
            .push_bind(AttendanceStatus::Absent)
            .push_bind(SYSTEM_MARKER);
    });

    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected())
}

/// Swagger doc for sweep endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/sweep",
    request_body = SweepRequest,
    responses(
        (status = 200, description = "Sweep completed", body = Object, example = json!({
            "message": "Sweep completed",
            "inserted": 4
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn sweep(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SweepRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin_or_system()?;

    let as_of = payload.date.unwrap_or_else(|| chrono::Local::now().date_naive());

    let inserted = run_absence_sweep(pool.get_ref(), as_of).await.map_err(|e| {
        tracing::error!(error = %e, date = %as_of, "Absence sweep failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tracing::info!(date = %as_of, inserted, marked_by = %auth.username, "Absence sweep completed");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Sweep completed",
        "inserted": inserted
    })))
}
