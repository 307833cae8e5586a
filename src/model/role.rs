use strum_macros::{Display, EnumString};

/// Marker recorded on attendance rows created by the automated sweep.
pub const SYSTEM_MARKER: &str = "system";

/// Landing page for everyone; also the redirect target of the section gate.
pub const FALLBACK_PATH: &str = "/dashboard";

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Lab = 2,
    Reception = 3,
    Finance = 4,
    System = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Lab),
            3 => Some(Role::Reception),
            4 => Some(Role::Finance),
            5 => Some(Role::System),
            _ => None,
        }
    }

    /// Static allow-list of navigable sections. Every role keeps at least
    /// the dashboard so the fallback redirect always lands somewhere legal.
    pub fn allowed_sections(&self) -> &'static [Section] {
        use Section::*;
        match self {
            Role::Admin => &[
                Dashboard, Patients, Inventory, Finance, Papers, Attendance, Todos, Team,
            ],
            Role::Lab => &[Dashboard, Patients, Inventory, Papers, Attendance, Todos],
            Role::Reception => &[Dashboard, Patients, Attendance, Todos],
            Role::Finance => &[Dashboard, Finance, Inventory, Attendance, Todos],
            Role::System => &[Dashboard, Attendance],
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Section {
    Dashboard,
    Patients,
    Inventory,
    Finance,
    Papers,
    Attendance,
    Todos,
    Team,
}

impl Section {
    pub fn path(&self) -> String {
        format!("/{}", self)
    }

    /// Maps a navigation path to its section by first segment,
    /// so "/patients/42/visits" still resolves to Patients.
    pub fn from_path(path: &str) -> Option<Self> {
        let first = path.trim_start_matches('/').split('/').next().unwrap_or("");
        first.parse().ok()
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum GateDecision {
    Allow,
    Redirect(&'static str),
}

/// Navigation gate. Unknown/absent roles only ever see the landing page;
/// known roles are checked against their allow-list. A request already
/// sitting on the fallback path is allowed through rather than redirected
/// onto itself.
pub fn guard(role: Option<Role>, path: &str) -> GateDecision {
    let section = Section::from_path(path);

    let Some(role) = role else {
        return if section == Some(Section::Dashboard) {
            GateDecision::Allow
        } else {
            GateDecision::Redirect(FALLBACK_PATH)
        };
    };

    match section {
        Some(s) if role.allowed_sections().contains(&s) => GateDecision::Allow,
        _ if section == Section::from_path(FALLBACK_PATH) => GateDecision::Allow,
        _ => GateDecision::Redirect(FALLBACK_PATH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_has_sections() {
        for id in 1..=5u8 {
            let role = Role::from_id(id).unwrap();
            assert!(!role.allowed_sections().is_empty());
            assert!(role.allowed_sections().contains(&Section::Dashboard));
        }
        assert!(Role::from_id(0).is_none());
        assert!(Role::from_id(42).is_none());
    }

    #[test]
    fn lab_cannot_reach_finance_but_admin_can() {
        assert_eq!(
            guard(Some(Role::Lab), "/finance"),
            GateDecision::Redirect(FALLBACK_PATH)
        );
        assert_eq!(guard(Some(Role::Admin), "/finance"), GateDecision::Allow);
    }

    #[test]
    fn missing_role_only_sees_dashboard() {
        assert_eq!(guard(None, "/dashboard"), GateDecision::Allow);
        assert_eq!(guard(None, "/patients"), GateDecision::Redirect(FALLBACK_PATH));
        assert_eq!(
            guard(None, "/finance/reports"),
            GateDecision::Redirect(FALLBACK_PATH)
        );
    }

    #[test]
    fn fallback_path_never_redirects_to_itself() {
        // A request already on the fallback path stays put even when the
        // allow-list check fails, so no redirect loop can form.
        assert_eq!(guard(Some(Role::System), FALLBACK_PATH), GateDecision::Allow);
        assert_eq!(guard(Some(Role::Lab), FALLBACK_PATH), GateDecision::Allow);
    }

    #[test]
    fn unknown_paths_redirect() {
        assert_eq!(
            guard(Some(Role::Admin), "/no-such-section"),
            GateDecision::Redirect(FALLBACK_PATH)
        );
    }

    #[test]
    fn section_resolves_by_first_segment() {
        assert_eq!(Section::from_path("/patients/42/visits"), Some(Section::Patients));
        assert_eq!(Section::from_path("/todos"), Some(Section::Todos));
        assert_eq!(Section::from_path("/"), None);
    }
}
