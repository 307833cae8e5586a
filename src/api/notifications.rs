use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::mailer::{Mailer, NotificationJob, SendEmail};
use crate::utils::{member_cache, member_filter};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DispatchRequest {
    #[schema(example = 88)]
    pub todo_id: u64,
    #[schema(example = json!(["maria@lab.example", "jon@lab.example"]))]
    pub assigned_to: Vec<String>,
    #[schema(example = "Prepare slide deck")]
    pub task_title: String,
    #[schema(example = "Figures for the grant review", nullable = true)]
    pub task_description: Option<String>,
    #[schema(example = "Grant 2026", nullable = true)]
    pub project_name: Option<String>,
    #[schema(example = "2026-03-01", value_type = String, format = "date", nullable = true)]
    pub deadline: Option<NaiveDate>,
    #[schema(example = "pi@lab.example")]
    pub assigned_by: String,
}

/// Outcome counts only; per-recipient failure never fails the pipeline.
#[derive(Debug, Serialize, ToSchema)]
pub struct DispatchResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "Notifications dispatched")]
    pub message: String,
    #[schema(example = 2)]
    pub sent: u64,
    #[schema(example = 0)]
    pub failed: u64,
}

/// Resolve assignee emails to display names through the usual tiers:
/// cuckoo filter fast-negative, then the moka cache, then the database.
/// Unresolvable identities are logged and skipped, never an error.
async fn resolve_recipients(pool: &MySqlPool, emails: &[String]) -> Vec<(String, String)> {
    let mut resolved = Vec::with_capacity(emails.len());

    for email in emails {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            continue;
        }

        if !member_filter::might_exist(&email) {
            tracing::warn!(email = %email, "Assignee is not a known team member, skipping");
            continue;
        }

        if let Some(name) = member_cache::display_name(&email).await {
            resolved.push((email, name));
            continue;
        }

        match sqlx::query_as::<_, (String,)>(
            "SELECT name FROM team_members WHERE email = ? LIMIT 1",
        )
        .bind(&email)
        .fetch_optional(pool)
        .await
        {
            Ok(Some((name,))) => {
                member_cache::remember(&email, &name).await;
                resolved.push((email, name));
            }
            Ok(None) => {
                tracing::warn!(email = %email, "Assignee not found in team_members, skipping");
            }
            Err(e) => {
                tracing::error!(error = %e, email = %email, "Identity lookup failed, skipping");
            }
        }
    }

    resolved
}

fn build_jobs(request: &DispatchRequest, recipients: &[(String, String)]) -> Vec<NotificationJob> {
    recipients
        .iter()
        .map(|(email, name)| NotificationJob {
            recipient_email: email.clone(),
            recipient_name: name.clone(),
            task_title: request.task_title.clone(),
            task_description: request.task_description.clone(),
            project_name: request.project_name.clone(),
            deadline: request.deadline,
            assigned_by: request.assigned_by.clone(),
            todo_id: request.todo_id,
        })
        .collect()
}

/// Fan out sends with a concurrency cap and join on every outcome.
/// Returns (sent, failed).
async fn dispatch_jobs<M: SendEmail + Sync>(
    mailer: &M,
    from: &str,
    app_base_url: &str,
    jobs: &[NotificationJob],
    concurrency: usize,
) -> (u64, u64) {
    let outcomes: Vec<bool> = futures::stream::iter(jobs.iter().map(|job| async move {
        let message = job.render(from, app_base_url);
        match mailer.send(&message).await {
            Ok(provider_id) => {
                tracing::info!(
                    to = %job.recipient_email,
                    todo_id = job.todo_id,
                    provider_id = %provider_id,
                    "Notification sent"
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    to = %job.recipient_email,
                    todo_id = job.todo_id,
                    error = %e,
                    "Notification send failed"
                );
                false
            }
        }
    }))
    .buffer_unordered(concurrency.max(1))
    .collect()
    .await;

    let sent = outcomes.iter().filter(|ok| **ok).count() as u64;
    let failed = outcomes.len() as u64 - sent;
    (sent, failed)
}

/// Full pipeline: resolve, render, send, count. Shared between the
/// trigger endpoint and todo creation.
pub async fn dispatch_assignment(
    pool: &MySqlPool,
    mailer: &Mailer,
    config: &Config,
    request: &DispatchRequest,
) -> DispatchResponse {
    if !mailer.is_enabled() {
        return DispatchResponse {
            success: true,
            message: "Email notifications are disabled".to_string(),
            sent: 0,
            failed: 0,
        };
    }

    let recipients = resolve_recipients(pool, &request.assigned_to).await;
    if recipients.is_empty() {
        return DispatchResponse {
            success: true,
            message: "No resolvable recipients".to_string(),
            sent: 0,
            failed: 0,
        };
    }

    let jobs = build_jobs(request, &recipients);
    let (sent, failed) = dispatch_jobs(
        mailer,
        &config.email_from,
        &config.app_base_url,
        &jobs,
        config.notify_concurrency,
    )
    .await;

    DispatchResponse {
        success: true,
        message: "Notifications dispatched".to_string(),
        sent,
        failed,
    }
}

/* =========================
Assignment notification trigger
========================= */
/// Swagger doc for todo_assignment endpoint
#[utoipa::path(
    post,
    path = "/api/v1/notifications/todo-assignment",
    request_body = DispatchRequest,
    responses(
        (status = 200, description = "Dispatch outcome counts", body = DispatchResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notifications"
)]
pub async fn todo_assignment(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    mailer: web::Data<Mailer>,
    config: web::Data<Config>,
    payload: web::Json<DispatchRequest>,
) -> actix_web::Result<impl Responder> {
    let response =
        dispatch_assignment(pool.get_ref(), mailer.get_ref(), config.get_ref(), &payload).await;
    Ok(HttpResponse::Ok().json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::{EmailMessage, MailError};
    use std::collections::HashSet;

    struct FakeMailer {
        fail_for: HashSet<String>,
    }

    impl FakeMailer {
        fn reliable() -> Self {
            FakeMailer {
                fail_for: HashSet::new(),
            }
        }

        fn failing_for(addresses: &[&str]) -> Self {
            FakeMailer {
                fail_for: addresses.iter().map(|a| a.to_string()).collect(),
            }
        }
    }

    impl SendEmail for FakeMailer {
        async fn send(&self, msg: &EmailMessage) -> Result<String, MailError> {
            if self.fail_for.contains(&msg.to) {
                Err(MailError::Provider {
                    status: 422,
                    body: "rejected".into(),
                })
            } else {
                Ok(format!("msg-{}", msg.to))
            }
        }
    }

    fn request(assignees: &[&str]) -> DispatchRequest {
        DispatchRequest {
            todo_id: 88,
            assigned_to: assignees.iter().map(|a| a.to_string()).collect(),
            task_title: "Prepare slide deck".into(),
            task_description: None,
            project_name: None,
            deadline: None,
            assigned_by: "pi@lab.example".into(),
        }
    }

    fn recipients(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(e, n)| (e.to_string(), n.to_string()))
            .collect()
    }

    #[actix_web::test]
    async fn all_sends_succeeding_counts_everything_as_sent() {
        let req = request(&["a@lab", "b@lab", "c@lab"]);
        let jobs = build_jobs(&req, &recipients(&[("a@lab", "A"), ("b@lab", "B"), ("c@lab", "C")]));

        let (sent, failed) =
            dispatch_jobs(&FakeMailer::reliable(), "lab@x", "https://lab.example", &jobs, 4).await;
        assert_eq!((sent, failed), (3, 0));
    }

    #[actix_web::test]
    async fn partial_failure_is_counted_not_raised() {
        let req = request(&["a@lab", "b@lab", "c@lab"]);
        let jobs = build_jobs(&req, &recipients(&[("a@lab", "A"), ("b@lab", "B"), ("c@lab", "C")]));

        let (sent, failed) = dispatch_jobs(
            &FakeMailer::failing_for(&["b@lab", "c@lab"]),
            "lab@x",
            "https://lab.example",
            &jobs,
            4,
        )
        .await;
        assert_eq!((sent, failed), (1, 2));
    }

    #[actix_web::test]
    async fn concurrency_cap_of_zero_still_makes_progress() {
        let req = request(&["a@lab"]);
        let jobs = build_jobs(&req, &recipients(&[("a@lab", "A")]));

        let (sent, failed) =
            dispatch_jobs(&FakeMailer::reliable(), "lab@x", "https://lab.example", &jobs, 0).await;
        assert_eq!((sent, failed), (1, 0));
    }

    #[test]
    fn jobs_are_built_per_resolved_recipient_only() {
        let req = request(&["a@lab", "ghost@lab"]);
        // ghost@lab did not resolve; only one job results.
        let jobs = build_jobs(&req, &recipients(&[("a@lab", "A")]));
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].recipient_email, "a@lab");
        assert_eq!(jobs[0].recipient_name, "A");
        assert_eq!(jobs[0].todo_id, 88);
    }
}
