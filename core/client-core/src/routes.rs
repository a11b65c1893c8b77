//! Route table and navigation intents.
//!
//! The route names and their auth requirements come from the application
//! route table; dashboard panes inherit the dashboard's requirement the way
//! nested route records inherit their parent's metadata.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Route {
    Home,
    Login,
    ProfileSetup,
    Dashboard,
    InterviewPractice,
    InterviewSimulation,
    History,
}

impl Route {
    pub fn requires_auth(self) -> bool {
        !matches!(self, Route::Home | Route::Login)
    }

    pub fn name(self) -> &'static str {
        match self {
            Route::Home => "home",
            Route::Login => "login",
            Route::ProfileSetup => "profileSetup",
            Route::Dashboard => "dashboard",
            Route::InterviewPractice => "interviewPractice",
            Route::InterviewSimulation => "interviewSimulation",
            Route::History => "history",
        }
    }
}

/// One navigation attempt. Constructed per attempt and never persisted.
///
/// `requires_auth` defaults from the route table but stays an explicit
/// field: the guard decides from the intent it is handed, not from a
/// lookup of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteIntent {
    pub target: Route,
    pub requires_auth: bool,
}

impl RouteIntent {
    pub fn to(target: Route) -> Self {
        Self {
            target,
            requires_auth: target.requires_auth(),
        }
    }
}

/// Receives forced redirects that originate outside a navigation attempt
/// (logout, credential expiry). Implemented by the routing layer that owns
/// the actual history stack.
pub trait RouteSink: Send + Sync {
    fn redirect(&self, target: Route);
}
