use crate::auth::auth::AuthUser;
use crate::model::role::{GateDecision, guard};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct GuardQuery {
    /// Navigation path the client wants to open
    #[schema(example = "/finance")]
    pub path: String,
}

/// Sections the caller's role may navigate to
#[utoipa::path(
    get,
    path = "/api/v1/sections",
    responses(
        (status = 200, description = "Allowed sections for the caller", body = Object, example = json!({
            "role_id": 2,
            "sections": ["/dashboard", "/patients", "/inventory", "/papers", "/attendance", "/todos"]
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Sections"
)]
pub async fn allowed_sections(auth: AuthUser) -> impl Responder {
    let sections: Vec<String> = auth
        .role
        .allowed_sections()
        .iter()
        .map(|s| s.path())
        .collect();

    HttpResponse::Ok().json(serde_json::json!({
        "role_id": auth.role as u8,
        "sections": sections
    }))
}

/// Gate decision for a navigation path
#[utoipa::path(
    get,
    path = "/api/v1/sections/guard",
    params(GuardQuery),
    responses(
        (status = 200, description = "Allow or redirect decision", body = Object, example = json!({
            "decision": "redirect",
            "location": "/dashboard"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Sections"
)]
pub async fn guard_path(auth: AuthUser, query: web::Query<GuardQuery>) -> impl Responder {
    match guard(Some(auth.role), &query.path) {
        GateDecision::Allow => HttpResponse::Ok().json(serde_json::json!({
            "decision": "allow"
        })),
        GateDecision::Redirect(location) => HttpResponse::Ok().json(serde_json::json!({
            "decision": "redirect",
            "location": location
        })),
    }
}
