//! Error types for the PrepStage client core.
//!
//! Local precondition violations are detected before any remote call and
//! never mutate state. Remote rejections pass through with the service's
//! detail attached. Transport failures are a distinct, retryable kind so
//! UI retry logic never confuses them with definitive rejections.

use std::fmt;

use prepstage_gateway::GatewayError;

/// Transport-level failure kinds. Local state is guaranteed unchanged
/// when one of these is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailure {
    /// The remote service could not be reached; the command was not sent.
    Unavailable,
    /// The call timed out with the outcome unknown. The command may or may
    /// not have been applied remotely; locally it was not.
    TimedOut,
}

impl fmt::Display for NetworkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkFailure::Unavailable => write!(f, "remote service unreachable"),
            NetworkFailure::TimedOut => write!(f, "remote call timed out; outcome unknown"),
        }
    }
}

/// All errors surfaced by client-core operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrepError {
    // ─────────────────────────────────────────────────────────────────────
    // Remote-surfaced rejections (detail passed through verbatim)
    // ─────────────────────────────────────────────────────────────────────
    #[error("authentication rejected: {detail}")]
    AuthRejected { detail: String },

    #[error("registration rejected: {detail}")]
    RegistrationRejected { detail: String },

    #[error("profile rejected: {detail}")]
    ProfileRejected { detail: String },

    #[error("not authorized; credential missing or expired")]
    Unauthorized,

    // ─────────────────────────────────────────────────────────────────────
    // Local interview-session preconditions
    // ─────────────────────────────────────────────────────────────────────
    #[error("an interview session is already active")]
    SessionConflict,

    #[error("no interview session is active")]
    NoActiveSession,

    #[error("the interview session has ended")]
    SessionTerminated,

    #[error("the interview session is paused; resume before answering")]
    SessionPaused,

    #[error("answer targets question {submitted} but the current question is {current}")]
    StaleQuestion { submitted: u64, current: u64 },

    // ─────────────────────────────────────────────────────────────────────
    // Transport
    // ─────────────────────────────────────────────────────────────────────
    #[error("{0}")]
    Network(NetworkFailure),
}

impl PrepError {
    /// True for failures where resubmitting the same command can succeed.
    ///
    /// Idempotent commands (completion) may be retried directly; for
    /// non-idempotent ones (answer submission) callers should reconcile
    /// with [`InterviewMachine::remote_phase`] first, since a timed-out
    /// call may have been applied remotely.
    ///
    /// [`InterviewMachine::remote_phase`]: crate::InterviewMachine::remote_phase
    pub fn is_retryable(&self) -> bool {
        matches!(self, PrepError::Network(_))
    }
}

impl From<GatewayError> for PrepError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::AuthRejected { detail } => PrepError::AuthRejected { detail },
            GatewayError::RegistrationRejected { detail } => {
                PrepError::RegistrationRejected { detail }
            }
            GatewayError::ProfileRejected { detail } => PrepError::ProfileRejected { detail },
            GatewayError::Unauthorized => PrepError::Unauthorized,
            GatewayError::Unavailable => PrepError::Network(NetworkFailure::Unavailable),
            GatewayError::TimedOut => PrepError::Network(NetworkFailure::TimedOut),
        }
    }
}

/// Convenience type alias for Results using PrepError.
pub type Result<T> = std::result::Result<T, PrepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_failures_are_retryable() {
        assert!(PrepError::Network(NetworkFailure::Unavailable).is_retryable());
        assert!(PrepError::Network(NetworkFailure::TimedOut).is_retryable());
        assert!(!PrepError::Unauthorized.is_retryable());
        assert!(!PrepError::SessionConflict.is_retryable());
        assert!(!PrepError::StaleQuestion {
            submitted: 5,
            current: 7
        }
        .is_retryable());
    }

    #[test]
    fn gateway_rejections_keep_their_detail() {
        let err = PrepError::from(GatewayError::AuthRejected {
            detail: "unknown user".to_string(),
        });
        assert_eq!(
            err,
            PrepError::AuthRejected {
                detail: "unknown user".to_string()
            }
        );
    }

    #[test]
    fn gateway_transport_failures_map_to_network() {
        assert_eq!(
            PrepError::from(GatewayError::TimedOut),
            PrepError::Network(NetworkFailure::TimedOut)
        );
        assert_eq!(
            PrepError::from(GatewayError::Unavailable),
            PrepError::Network(NetworkFailure::Unavailable)
        );
    }
}
