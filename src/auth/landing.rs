//! Role-Path Resolver: where each role lands in the dashboard.

use super::role::Role;

pub const LOGIN_PATH: &str = "/login";
pub const SUPER_ADMIN_PATH: &str = "/dashboard/super-admin";
pub const ADMIN_PATH: &str = "/dashboard/admin";
pub const USER_PATH: &str = "/dashboard/user";

#[must_use]
pub const fn default_landing_path(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::SuperAdmin) => SUPER_ADMIN_PATH,
        Some(Role::Admin) => ADMIN_PATH,
        Some(Role::User) | None => USER_PATH,
    }
}

/// Redirect target for a dashboard visit, or `None` when `requested` already
/// lies inside the caller's own area. Anonymous visitors go to the login page.
#[must_use]
pub fn dashboard_redirect(role: Option<Role>, requested: &str) -> Option<&'static str> {
    let Some(role) = role else {
        return Some(LOGIN_PATH);
    };
    let home = default_landing_path(Some(role));
    let requested = requested.trim_end_matches('/');
    let inside = requested
        .strip_prefix(home)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
    if inside {
        None
    } else {
        Some(home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landing_paths() {
        assert_eq!(default_landing_path(Some(Role::SuperAdmin)), SUPER_ADMIN_PATH);
        assert_eq!(default_landing_path(Some(Role::Admin)), ADMIN_PATH);
        assert_eq!(default_landing_path(Some(Role::User)), USER_PATH);
        assert_eq!(default_landing_path(None), USER_PATH);
    }

    #[test]
    fn cross_role_visits_redirect_home() {
        assert_eq!(
            dashboard_redirect(Some(Role::User), "/dashboard/admin"),
            Some(USER_PATH)
        );
        assert_eq!(
            dashboard_redirect(Some(Role::Admin), "/dashboard/super-admin/users"),
            Some(ADMIN_PATH)
        );
        assert_eq!(
            dashboard_redirect(Some(Role::SuperAdmin), "/dashboard"),
            Some(SUPER_ADMIN_PATH)
        );
        // Prefix match must stop at a segment boundary.
        assert_eq!(
            dashboard_redirect(Some(Role::User), "/dashboard/user-settings"),
            Some(USER_PATH)
        );
    }

    #[test]
    fn own_area_needs_no_redirect() {
        assert_eq!(dashboard_redirect(Some(Role::User), "/dashboard/user"), None);
        assert_eq!(
            dashboard_redirect(Some(Role::Admin), "/dashboard/admin/questions/"),
            None
        );
    }

    #[test]
    fn anonymous_goes_to_login() {
        assert_eq!(dashboard_redirect(None, "/dashboard/user"), Some(LOGIN_PATH));
    }
}
