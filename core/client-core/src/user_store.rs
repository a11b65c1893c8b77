//! The session store: owns the [`Identity`] and every mutation of it.
//!
//! Constructed once per running client and shared by reference; commands
//! take `&self` over an interior lock. The lock is never held across a
//! remote call, and every mutation is applied whole on resumption.

use std::sync::{Arc, Mutex, MutexGuard};

use prepstage_gateway::{
    Credentials, GatewayError, Profile, ProfileDraft, Registration, RemoteGateway,
};

use crate::error::{PrepError, Result};
use crate::identity::Identity;
use crate::routes::{Route, RouteSink};
use crate::storage::KeyValueStore;

/// Durable keys. Cleared together on logout, never independently.
pub const TOKEN_KEY: &str = "auth_token";
pub const PROFILE_FLAG_KEY: &str = "profile_complete";

pub struct UserStore {
    identity: Mutex<Identity>,
    gateway: Arc<dyn RemoteGateway>,
    storage: Arc<dyn KeyValueStore>,
    routes: Arc<dyn RouteSink>,
}

impl UserStore {
    /// Restores identity from durable storage: a stored token means a
    /// credential is present, with the completion flag taken from its last
    /// persisted value and the profile left unknown until fetched.
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        storage: Arc<dyn KeyValueStore>,
        routes: Arc<dyn RouteSink>,
    ) -> Self {
        let identity = match storage.get(TOKEN_KEY) {
            Some(_) => Identity::Authenticated {
                profile: None,
                profile_complete: storage.get(PROFILE_FLAG_KEY).as_deref() == Some("true"),
            },
            None => Identity::Anonymous,
        };
        Self {
            identity: Mutex::new(identity),
            gateway,
            storage,
            routes,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────

    /// Authenticates against the remote service. On success the identity,
    /// token, and completion flag are replaced together; on rejection the
    /// identity is left exactly as it was.
    pub async fn login(&self, credentials: &Credentials) -> Result<Profile> {
        let grant = self
            .gateway
            .authenticate(credentials)
            .await
            .map_err(PrepError::from)?;
        let user = grant.user;
        {
            let mut identity = self.locked();
            *identity = Identity::Authenticated {
                profile: Some(user.clone()),
                profile_complete: user.has_profile,
            };
        }
        self.storage.set(TOKEN_KEY, &grant.token);
        self.persist_profile_flag(user.has_profile);
        tracing::info!(
            username = %user.username,
            profile_complete = user.has_profile,
            "Signed in"
        );
        Ok(user)
    }

    /// Registers a new account. Does not sign the account in; the identity
    /// is untouched either way, and rejections surface verbatim.
    pub async fn register(&self, registration: &Registration) -> Result<()> {
        self.gateway
            .register_account(registration)
            .await
            .map_err(PrepError::from)
    }

    /// Replaces the cached profile and recomputes the completion flag from
    /// the service response. Requires a credential; checked locally before
    /// any remote call.
    pub async fn update_profile(&self, draft: &ProfileDraft) -> Result<Profile> {
        if !self.credential_present() {
            return Err(PrepError::Unauthorized);
        }
        match self.gateway.update_profile(draft).await {
            Ok(profile) => {
                self.apply_profile(&profile);
                tracing::info!(
                    username = %profile.username,
                    profile_complete = profile.has_profile,
                    "Profile updated"
                );
                Ok(profile)
            }
            Err(GatewayError::Unauthorized) => {
                self.force_logout("credential rejected during profile update");
                Err(PrepError::Unauthorized)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Fetches the profile when a credential is present but the profile is
    /// still unknown (fresh process start). Best-effort: a transport
    /// failure leaves the durable completion flag as the source of truth
    /// and the profile unknown, not incomplete.
    pub async fn fetch_on_load(&self) {
        let needs_fetch = {
            let identity = self.locked();
            identity.credential_present() && identity.profile().is_none()
        };
        if !needs_fetch {
            return;
        }
        match self.gateway.get_profile().await {
            Ok(profile) => {
                tracing::info!(
                    username = %profile.username,
                    profile_complete = profile.has_profile,
                    "Profile loaded"
                );
                self.apply_profile(&profile);
            }
            Err(GatewayError::Unauthorized) => {
                self.force_logout("credential rejected while loading profile");
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "Profile fetch failed; completion state left as stored"
                );
            }
        }
    }

    /// Clears the identity and all durable keys together, then signals the
    /// routing layer to show the login route. Cannot fail.
    pub fn logout(&self) {
        {
            let mut identity = self.locked();
            *identity = Identity::Anonymous;
        }
        self.storage.clear();
        tracing::info!("Signed out; durable session state cleared");
        self.routes.redirect(Route::Login);
    }

    /// Logout triggered by the remote service rejecting the credential
    /// (token expiry) rather than by the user.
    pub(crate) fn force_logout(&self, cause: &str) {
        tracing::warn!(cause, "Forcing logout");
        self.logout();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    pub fn identity(&self) -> Identity {
        self.locked().clone()
    }

    pub fn credential_present(&self) -> bool {
        self.locked().credential_present()
    }

    pub fn profile_complete(&self) -> bool {
        self.locked().profile_complete()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.locked().profile().cloned()
    }

    pub fn can_start_interview(&self) -> bool {
        self.locked().can_start_interview()
    }

    pub fn display_name(&self) -> String {
        self.locked().display_name().to_string()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn locked(&self) -> MutexGuard<'_, Identity> {
        self.identity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply_profile(&self, profile: &Profile) {
        {
            let mut identity = self.locked();
            // A logout may have raced the fetch; never resurrect a
            // credential from a profile response.
            if !identity.credential_present() {
                return;
            }
            *identity = Identity::Authenticated {
                profile: Some(profile.clone()),
                profile_complete: profile.has_profile,
            };
        }
        self.persist_profile_flag(profile.has_profile);
    }

    fn persist_profile_flag(&self, complete: bool) {
        self.storage
            .set(PROFILE_FLAG_KEY, if complete { "true" } else { "false" });
    }
}
