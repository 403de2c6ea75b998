//! Route access rules keyed off the session's auth state.
//!
//! The rules are pure: given a route and the current state, the decision is
//! always the same. Reacting to state changes is the caller's job, via
//! [`SessionStore::subscribe`](crate::session::SessionStore::subscribe).

use crate::session::{AuthState, SessionStore};

/// Navigable sections of the admin surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Users,
    Orders,
    Referrers,
    Withdrawals,
    FraudDetection,
    Settings,
}

impl Route {
    /// Landing route for an authenticated session.
    pub const DEFAULT: Route = Route::Dashboard;

    pub fn is_protected(self) -> bool {
        !matches!(self, Route::Login)
    }
}

/// What to render for a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Route),
    RedirectToLogin,
    RedirectToDefault,
}

/// Decide access for `route` under `auth`.
pub fn resolve(route: Route, auth: AuthState) -> RouteDecision {
    match (route, auth) {
        // An authenticated operator has no business on the login screen.
        (Route::Login, AuthState::Authenticated) => RouteDecision::RedirectToDefault,
        (Route::Login, AuthState::Unauthenticated) => RouteDecision::Render(route),
        (_, AuthState::Unauthenticated) => RouteDecision::RedirectToLogin,
        (_, AuthState::Authenticated) => RouteDecision::Render(route),
    }
}

/// Convenience over [`resolve`] reading the live session state.
pub fn resolve_with(route: Route, session: &SessionStore) -> RouteDecision {
    resolve(route, session.state())
}
