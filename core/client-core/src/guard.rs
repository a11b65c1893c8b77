//! Navigation gating: decides, before every route transition, whether it
//! proceeds and where it lands instead when it does not.
//!
//! The decision table is evaluated in order; the first matching row wins.
//! Rows that depend on profile completion are only evaluated after the
//! profile has been fetched (or the fetch has failed, in which case the
//! last durably stored flag stands in). Callers serialize invocations: a
//! decision may await that fetch, and its outcome is defined against the
//! store state the fetch completes into.

use std::sync::Arc;

use crate::routes::{Route, RouteIntent};
use crate::user_store::UserStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect {
        target: Route,
        /// The originally requested target, carried only when the redirect
        /// exists to collect a missing credential so the login flow can
        /// return there afterwards.
        remember: Option<Route>,
    },
}

pub struct NavigationGuard {
    users: Arc<UserStore>,
}

impl NavigationGuard {
    pub fn new(users: Arc<UserStore>) -> Self {
        Self { users }
    }

    pub async fn decide(&self, intent: RouteIntent) -> Decision {
        if intent.requires_auth && !self.users.credential_present() {
            tracing::debug!(route = intent.target.name(), "Redirecting to login");
            return Decision::Redirect {
                target: Route::Login,
                remember: Some(intent.target),
            };
        }

        // Completion-dependent rows need a fetched profile when one is not
        // cached yet; a failed fetch leaves the durable flag in charge.
        if self.users.credential_present() && self.users.profile().is_none() {
            self.users.fetch_on_load().await;
        }

        let profile_complete = self.users.profile_complete();

        if intent.requires_auth {
            // A logout can only have happened through the fetch above
            // discovering an expired credential.
            if !self.users.credential_present() {
                return Decision::Redirect {
                    target: Route::Login,
                    remember: Some(intent.target),
                };
            }
            if !profile_complete && intent.target != Route::ProfileSetup {
                tracing::debug!(
                    route = intent.target.name(),
                    "Profile incomplete; redirecting to profile setup"
                );
                return Decision::Redirect {
                    target: Route::ProfileSetup,
                    remember: None,
                };
            }
            if profile_complete && intent.target == Route::ProfileSetup {
                return Decision::Redirect {
                    target: Route::Dashboard,
                    remember: None,
                };
            }
            return Decision::Allow;
        }

        if self.users.credential_present() && profile_complete && intent.target == Route::Login {
            return Decision::Redirect {
                target: Route::Dashboard,
                remember: None,
            };
        }

        Decision::Allow
    }
}
