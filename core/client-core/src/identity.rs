//! Client-side identity: who is signed in and whether their profile is
//! complete enough to start an interview.

use prepstage_gateway::Profile;
use serde::Serialize;

/// Shown before a profile is known.
const DEFAULT_DISPLAY_NAME: &str = "Candidate";

/// The authenticated-identity state.
///
/// Modeled as a tagged enum so the completion flag only exists while a
/// credential is present: `profile_complete() ⇒ credential_present()` holds
/// by construction rather than by discipline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum Identity {
    Anonymous,
    Authenticated {
        /// Cached profile; absent until fetched or refreshed.
        profile: Option<Profile>,
        /// Server-declared completion flag, or the last durably stored
        /// value when the profile has not been fetched this run.
        profile_complete: bool,
    },
}

impl Identity {
    pub fn credential_present(&self) -> bool {
        matches!(self, Identity::Authenticated { .. })
    }

    pub fn profile_complete(&self) -> bool {
        match self {
            Identity::Anonymous => false,
            Identity::Authenticated {
                profile_complete, ..
            } => *profile_complete,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated { profile, .. } => profile.as_ref(),
        }
    }

    /// Gate for offering interview entry points in the UI: signed in with
    /// a complete profile.
    pub fn can_start_interview(&self) -> bool {
        self.credential_present() && self.profile_complete()
    }

    pub fn display_name(&self) -> &str {
        self.profile()
            .map(|profile| profile.username.as_str())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }
}
