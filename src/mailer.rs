use crate::config::Config;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, derive_more::Display)]
pub enum MailError {
    /// Could not reach the provider at all.
    #[display(fmt = "email transport error: {}", _0)]
    Transport(String),
    /// Provider reachable but it rejected the send.
    #[display(fmt = "provider rejected send ({}): {}", status, body)]
    Provider { status: u16, body: String },
    #[display(fmt = "email sending is disabled")]
    Disabled,
}

/// Outbound payload, provider-independent.
#[derive(Debug, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// One pending notification for one resolved recipient. Never persisted;
/// only the outcome counts survive the dispatch.
#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub recipient_email: String,
    pub recipient_name: String,
    pub task_title: String,
    pub task_description: Option<String>,
    pub project_name: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub assigned_by: String,
    pub todo_id: u64,
}

impl NotificationJob {
    pub fn render(&self, from: &str, app_base_url: &str) -> EmailMessage {
        let subject = format!("New task assigned: {}", self.task_title);

        let mut lines = vec![
            format!("Hi {},", self.recipient_name),
            String::new(),
            format!("{} assigned you a new task.", self.assigned_by),
            String::new(),
            format!("Task: {}", self.task_title),
        ];
        if let Some(description) = &self.task_description {
            lines.push(format!("Details: {}", description));
        }
        if let Some(project) = &self.project_name {
            lines.push(format!("Project: {}", project));
        }
        if let Some(deadline) = &self.deadline {
            lines.push(format!("Deadline: {}", deadline));
        }
        lines.push(String::new());
        lines.push(format!("Open it at {}/todos", app_base_url));
        let text = lines.join("\n");

        let html = format!(
            "<p>Hi {},</p><p><strong>{}</strong> assigned you a new task.</p>{}<p><a href=\"{}/todos\">Open your tasks</a></p>",
            self.recipient_name,
            self.assigned_by,
            lines[4..lines.len() - 2]
                .iter()
                .filter(|l| !l.is_empty())
                .map(|l| format!("<p>{}</p>", l))
                .collect::<Vec<_>>()
                .join(""),
            app_base_url,
        );

        EmailMessage {
            from: from.to_string(),
            to: self.recipient_email.clone(),
            subject,
            html,
            text,
        }
    }
}

/// Seam for tests and for future providers; handlers only ever see this.
pub trait SendEmail {
    fn send(
        &self,
        msg: &EmailMessage,
    ) -> impl std::future::Future<Output = Result<String, MailError>> + Send;
}

/// Concrete sender selected from configuration at startup.
#[derive(Clone)]
pub enum Mailer {
    Resend { client: reqwest::Client, api_key: String },
    Disabled,
}

#[derive(Deserialize)]
struct SendReceipt {
    id: String,
}

impl Mailer {
    pub fn from_config(config: &Config) -> Self {
        if !config.email_enabled {
            return Mailer::Disabled;
        }
        match config.email_provider.as_str() {
            "resend" => Mailer::Resend {
                client: reqwest::Client::new(),
                api_key: config.email_api_key.clone(),
            },
            other => {
                tracing::warn!(provider = other, "Unknown email provider, sending disabled");
                Mailer::Disabled
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Mailer::Disabled)
    }
}

impl SendEmail for Mailer {
    async fn send(&self, msg: &EmailMessage) -> Result<String, MailError> {
        match self {
            Mailer::Disabled => Err(MailError::Disabled),
            Mailer::Resend { client, api_key } => {
                let response = client
                    .post(RESEND_ENDPOINT)
                    .bearer_auth(api_key)
                    .json(msg)
                    .send()
                    .await
                    .map_err(|e| MailError::Transport(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(MailError::Provider {
                        status: status.as_u16(),
                        body,
                    });
                }

                let receipt: SendReceipt = response
                    .json()
                    .await
                    .map_err(|e| MailError::Transport(e.to_string()))?;
                Ok(receipt.id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn job() -> NotificationJob {
        NotificationJob {
            recipient_email: "maria@lab.example".into(),
            recipient_name: "Maria".into(),
            task_title: "Prepare slide deck".into(),
            task_description: Some("Figures for the grant review".into()),
            project_name: Some("Grant 2026".into()),
            deadline: NaiveDate::from_ymd_opt(2026, 3, 1),
            assigned_by: "pi@lab.example".into(),
            todo_id: 88,
        }
    }

    #[test]
    fn subject_carries_the_task_title() {
        let msg = job().render("lab@notifications.example", "https://lab.example");
        assert_eq!(msg.subject, "New task assigned: Prepare slide deck");
        assert_eq!(msg.to, "maria@lab.example");
        assert_eq!(msg.from, "lab@notifications.example");
    }

    #[test]
    fn body_includes_task_project_deadline_and_assigner() {
        let msg = job().render("lab@notifications.example", "https://lab.example");
        for needle in [
            "Prepare slide deck",
            "Grant 2026",
            "2026-03-01",
            "pi@lab.example",
            "https://lab.example/todos",
        ] {
            assert!(msg.text.contains(needle), "text body missing {:?}", needle);
            assert!(msg.html.contains(needle), "html body missing {:?}", needle);
        }
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let mut bare = job();
        bare.task_description = None;
        bare.project_name = None;
        bare.deadline = None;

        let msg = bare.render("lab@notifications.example", "https://lab.example");
        assert!(!msg.text.contains("Project:"));
        assert!(!msg.text.contains("Deadline:"));
        assert!(!msg.text.contains("Details:"));
    }
}
