//! Remote service contract for the PrepStage client core.
//!
//! This crate is shared by the client core and the transport layer to
//! prevent schema drift. The remote service remains the authority on
//! validation; clients reuse these types to construct well-formed requests
//! and to interpret typed failures. Bearer-credential attachment is the
//! transport's concern and never appears in this contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CONTRACT_VERSION: u32 = 1;

// ═══════════════════════════════════════════════════════════════════════════════
// Account & Profile
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// The unified user record the service returns from authentication and
/// profile endpoints alike. `has_profile` is the server-declared
/// profile-completion flag that drives client-side gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub graduation_year: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub major_category: Option<String>,
    #[serde(default)]
    pub target_position: Vec<String>,
    pub has_profile: bool,
}

/// Successful authentication: the bearer token the transport will attach
/// to subsequent calls, plus the user it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthGrant {
    pub token: String,
    pub user: Profile,
}

/// Partial profile update; absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileDraft {
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub graduation_year: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub major_category: Option<String>,
    #[serde(default)]
    pub target_position: Option<Vec<String>>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Interview sessions
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewMode {
    Practice,
    Simulation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Junior,
    Medium,
    Senior,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeConfig {
    pub position: String,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub interview_style: Option<String>,
    #[serde(default)]
    pub interviewer_id: Option<u32>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub question_types: Vec<String>,
    #[serde(default)]
    pub special_settings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub company: String,
    pub position: String,
    #[serde(default)]
    pub round: Option<String>,
    #[serde(default)]
    pub interview_style: Option<String>,
    #[serde(default)]
    pub interviewer_id: Option<u32>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub evaluation_focus: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub question_type: Option<String>,
    #[serde(default)]
    pub time_limit_secs: Option<u32>,
}

/// Returned by both start operations; the session always opens on its
/// first question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHandle {
    pub session_id: u64,
    pub first_question: Question,
    #[serde(default)]
    pub total_questions: Option<u32>,
}

/// One answer as submitted to the service. At most one of the body fields
/// is set; a skip submits none of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerSubmission {
    #[serde(default)]
    pub answer_text: Option<String>,
    #[serde(default)]
    pub audio_file_path: Option<String>,
    #[serde(default)]
    pub video_file_path: Option<String>,
    #[serde(default)]
    pub time_spent_secs: Option<u32>,
    #[serde(default)]
    pub used_hint: bool,
}

/// What the service says after an answer or skip is recorded: either the
/// next question, or the signal that the question sequence is exhausted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum AnswerOutcome {
    Next { question: Question },
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    Normal,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hint {
    pub question_id: u64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub session_id: u64,
    pub completion_kind: CompletionKind,
    #[serde(default)]
    pub overall_score: Option<f32>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub detail: Option<Value>,
}

/// The service's view of a session phase, for reconciliation queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemotePhase {
    Pending,
    InProgress,
    Paused,
    Completed,
    Interrupted,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Failures
// ═══════════════════════════════════════════════════════════════════════════════

/// Typed failures a gateway implementation may surface. Rejections carry
/// the service's detail string verbatim; the core does not reinterpret it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("authentication rejected: {detail}")]
    AuthRejected { detail: String },

    #[error("registration rejected: {detail}")]
    RegistrationRejected { detail: String },

    #[error("profile rejected: {detail}")]
    ProfileRejected { detail: String },

    #[error("credential missing, expired, or revoked")]
    Unauthorized,

    #[error("remote service unreachable")]
    Unavailable,

    #[error("remote call timed out; outcome unknown")]
    TimedOut,
}

impl GatewayError {
    /// Transport-level failures, as opposed to definitive rejections.
    /// The caller's local state is guaranteed unchanged for these.
    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::Unavailable | GatewayError::TimedOut)
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Capability trait
// ═══════════════════════════════════════════════════════════════════════════════

/// The remote capability set the client core consumes. Implemented by the
/// HTTP transport in production and by scripted fakes in tests.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> GatewayResult<AuthGrant>;

    async fn register_account(&self, registration: &Registration) -> GatewayResult<()>;

    async fn get_profile(&self) -> GatewayResult<Profile>;

    async fn update_profile(&self, draft: &ProfileDraft) -> GatewayResult<Profile>;

    async fn start_interview(&self, config: &PracticeConfig) -> GatewayResult<SessionHandle>;

    async fn start_simulation(&self, config: &SimulationConfig) -> GatewayResult<SessionHandle>;

    /// Records an answer for the current question and returns the next
    /// question, or `Done` when the sequence is exhausted.
    async fn submit_answer(
        &self,
        question_id: u64,
        answer: &AnswerSubmission,
    ) -> GatewayResult<AnswerOutcome>;

    async fn pause(&self, session_id: u64) -> GatewayResult<()>;

    async fn resume(&self, session_id: u64) -> GatewayResult<()>;

    /// Skips the current question. Same outcome shape as `submit_answer`,
    /// since a skip also advances the question sequence.
    async fn skip(&self, session_id: u64, question_id: u64) -> GatewayResult<AnswerOutcome>;

    async fn get_hint(&self, question_id: u64) -> GatewayResult<Hint>;

    async fn mark_hint_used(&self, question_id: u64) -> GatewayResult<()>;

    /// Must be safe to call twice for the same session: the transport may
    /// redeliver a completion after a dropped acknowledgment.
    async fn complete_interview(
        &self,
        session_id: u64,
        kind: CompletionKind,
    ) -> GatewayResult<Summary>;

    /// Fire-and-forget from the core's perspective: the local exit has
    /// already happened when this is called, and retries belong to the
    /// transport.
    async fn emergency_exit(&self, session_id: u64, reason: &str) -> GatewayResult<()>;

    async fn get_status(&self, session_id: u64) -> GatewayResult<RemotePhase>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_tolerates_minimal_payload() {
        let profile: Profile = serde_json::from_str(
            r#"{"username": "ada", "email": "ada@example.com", "has_profile": false}"#,
        )
        .expect("minimal profile parses");
        assert_eq!(profile.username, "ada");
        assert!(profile.target_position.is_empty());
        assert!(profile.age.is_none());
        assert!(!profile.has_profile);
    }

    #[test]
    fn answer_outcome_is_tagged() {
        let next = AnswerOutcome::Next {
            question: Question {
                id: 7,
                text: "Tell me about a conflict you resolved".to_string(),
                question_type: Some("behavioral".to_string()),
                time_limit_secs: Some(180),
            },
        };
        let json = serde_json::to_value(&next).expect("serialize outcome");
        assert_eq!(json["outcome"], "next");
        assert_eq!(json["question"]["id"], 7);

        let done: AnswerOutcome =
            serde_json::from_str(r#"{"outcome": "done"}"#).expect("done parses");
        assert_eq!(done, AnswerOutcome::Done);
    }

    #[test]
    fn difficulty_serializes_lowercase() {
        let json = serde_json::to_string(&Difficulty::Junior).expect("serialize");
        assert_eq!(json, "\"junior\"");
    }

    #[test]
    fn summary_optional_fields_default() {
        let summary: Summary = serde_json::from_str(
            r#"{"session_id": 42, "completion_kind": "normal"}"#,
        )
        .expect("sparse summary parses");
        assert_eq!(summary.session_id, 42);
        assert_eq!(summary.completion_kind, CompletionKind::Normal);
        assert!(summary.overall_score.is_none());
        assert!(summary.detail.is_none());
    }

    #[test]
    fn transport_failures_are_distinguished() {
        assert!(GatewayError::Unavailable.is_transport());
        assert!(GatewayError::TimedOut.is_transport());
        assert!(!GatewayError::Unauthorized.is_transport());
        assert!(!GatewayError::AuthRejected {
            detail: "bad password".to_string()
        }
        .is_transport());
    }

    #[test]
    fn skip_submission_has_empty_body() {
        let submission = AnswerSubmission::default();
        assert!(submission.answer_text.is_none());
        assert!(submission.audio_file_path.is_none());
        assert!(submission.video_file_path.is_none());
        assert!(!submission.used_hint);
    }
}
