use crate::api::attendance::{
    AttendanceListResponse, MarkAttendance, SweepRequest,
};
use crate::api::notifications::{DispatchRequest, DispatchResponse};
use crate::api::progress::{RecordAdjustment, RecordCompletion};
use crate::api::team::{CreateTeamMember, TeamListResponse};
use crate::api::todos::{CompleteTodo, CreateTodo, TodoListResponse};
use crate::model::attendance::{AttendanceRecord, AttendanceStats, AttendanceStatus};
use crate::model::progress::{ProgressEntry, ProgressSummary};
use crate::model::team_member::TeamMember;
use crate::model::todo::Todo;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lab Management System API",
        version = "1.0.0",
        description = r#"
## Research-Lab Management System

This API powers a **research-lab management** backend covering the daily
operations of a small laboratory team.

### 🔹 Key Features
- **Team Management**
  - Create, update, list, and view lab team members
- **Attendance Tracking**
  - Mark daily attendance, tallied statistics, automatic absence sweep at midnight
- **Progress Ledger**
  - Append-only record of every contribution to project completion
- **Task Management**
  - Todos with assignees, deadlines, and email notifications on assignment
- **Section Gate**
  - Role-based allow-lists for application sections

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Sensitive operations require the **Admin** (or automation **System**) role.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::mark_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::attendance_stats,
        crate::api::attendance::sweep,

        crate::api::progress::record_completion,
        crate::api::progress::record_adjustment,
        crate::api::progress::project_summary,

        crate::api::todos::create_todo,
        crate::api::todos::list_todos,
        crate::api::todos::update_todo,
        crate::api::todos::complete_todo,
        crate::api::todos::delete_todo,

        crate::api::notifications::todo_assignment,

        crate::api::team::create_member,
        crate::api::team::list_members,
        crate::api::team::get_member,
        crate::api::team::update_member,
        crate::api::team::delete_member,

        crate::api::sections::allowed_sections,
        crate::api::sections::guard_path
    ),
    components(
        schemas(
            MarkAttendance,
            SweepRequest,
            AttendanceRecord,
            AttendanceStatus,
            AttendanceStats,
            AttendanceListResponse,
            RecordCompletion,
            RecordAdjustment,
            ProgressEntry,
            ProgressSummary,
            CreateTodo,
            CompleteTodo,
            Todo,
            TodoListResponse,
            DispatchRequest,
            DispatchResponse,
            CreateTeamMember,
            TeamMember,
            TeamListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance marking, statistics and sweep APIs"),
        (name = "Progress", description = "Project progress ledger APIs"),
        (name = "Todos", description = "Task management APIs"),
        (name = "Notifications", description = "Assignment notification dispatch APIs"),
        (name = "Team", description = "Team member management APIs"),
        (name = "Sections", description = "Role-based section gate APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
