use crate::{models::Role, session::Session};

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const UNAUTHORIZED_REDIRECT: &str = "/dashboard?error=unauthorized";

#[derive(Debug, Clone)]
pub struct ProtectedRoute {
    pub path: String,
    pub roles: Vec<Role>,
}

impl ProtectedRoute {
    pub fn new(path: impl Into<String>, roles: &[Role]) -> Self {
        Self {
            path: path.into(),
            roles: roles.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(&'static str),
}

/// Page access rules, evaluated per request with no state of its own.
///
/// Protected routes are matched by path prefix and the first match wins, so
/// list specific routes before their parents.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    auth_routes: Vec<String>,
    protected: Vec<ProtectedRoute>,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(
            vec![LOGIN_PATH.to_string(), "/register".to_string()],
            vec![ProtectedRoute::new(
                DASHBOARD_PATH,
                &[Role::Admin, Role::User, Role::Manager],
            )],
        )
    }
}

impl RouteGuard {
    pub fn new(auth_routes: Vec<String>, protected: Vec<ProtectedRoute>) -> Self {
        Self { auth_routes, protected }
    }

    pub fn evaluate(&self, path: &str, session: Option<&Session>) -> Decision {
        // 1. Usuario autenticado en login/register -> dashboard
        if session.is_some() && self.auth_routes.iter().any(|route| matches_route(path, route)) {
            return Decision::Redirect(DASHBOARD_PATH);
        }

        let Some(route) = self.protected.iter().find(|route| matches_route(path, &route.path)) else {
            return Decision::Allow;
        };

        // 2. Sin token -> login
        let Some(session) = session else {
            return Decision::Redirect(LOGIN_PATH);
        };

        // 3. Rol no permitido
        if !route.roles.contains(&session.role) {
            return Decision::Redirect(UNAUTHORIZED_REDIRECT);
        }

        Decision::Allow
    }
}

/// Prefix match on whole path segments: `/dashboard` covers
/// `/dashboard/profile` but not `/dashboards`.
fn matches_route(path: &str, route: &str) -> bool {
    match path.strip_prefix(route) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || route.ends_with('/'),
        None => false,
    }
}
