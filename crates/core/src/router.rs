//! Role-based route guarding
//!
//! Pure decision logic: callers translate a [`RouteDecision`] into actual
//! navigation. Keeping this free of side effects keeps navigation policy in
//! one testable place.

use crate::types::{Role, Session};

/// The unauthenticated entry point.
pub const LOGIN_PATH: &str = "/login";

/// Outcome of a route-guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    /// Not logged in: go to the login page, remembering where the user was
    /// headed for the post-login redirect.
    RedirectToLogin { from: String },
    /// Logged in with the wrong role: go to that role's own landing page,
    /// never to an error page or back to login.
    RedirectToLanding(Role),
}

/// Gate access to a route.
pub fn check_access(
    session: Option<&Session>,
    required_role: Option<Role>,
    requested_path: &str,
) -> RouteDecision {
    let Some(session) = session else {
        return RouteDecision::RedirectToLogin {
            from: requested_path.to_string(),
        };
    };

    match required_role {
        None => RouteDecision::Allow,
        Some(required) if session.role == required => RouteDecision::Allow,
        Some(_) => RouteDecision::RedirectToLanding(session.role),
    }
}

/// Whether a session-expired signal should navigate to the login page.
/// False when the user is already there, to avoid a redirect loop.
pub fn should_redirect_on_expiry(current_path: &str) -> bool {
    !current_path.contains(LOGIN_PATH)
}
