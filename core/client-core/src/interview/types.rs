//! Interview session state: phases, answers, and the session record.

use chrono::{DateTime, Duration, Utc};
use prepstage_gateway::{
    AnswerSubmission, CompletionKind, InterviewMode, Question, SessionHandle, Summary,
};
use serde::Serialize;

use super::timing::Stopwatch;
use super::transition::{step, Command, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Transient: entered and immediately advanced when a session starts.
    Created,
    Answering,
    Paused,
    Completed,
    Aborted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Aborted)
    }

    pub fn is_active(self) -> bool {
        matches!(self, Phase::Answering | Phase::Paused)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Created => "created",
            Phase::Answering => "answering",
            Phase::Paused => "paused",
            Phase::Completed => "completed",
            Phase::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    Normal,
    Emergency,
    Timeout,
}

impl From<CompletionKind> for TerminationReason {
    fn from(kind: CompletionKind) -> Self {
        match kind {
            CompletionKind::Normal => TerminationReason::Normal,
            CompletionKind::Timeout => TerminationReason::Timeout,
        }
    }
}

/// One-of answer content. A skip records `Empty`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum AnswerBody {
    Text(String),
    Audio(String),
    Video(String),
    Empty,
}

/// What the UI hands to `submit_answer`; the sticky hint flag is the
/// machine's to attach, not the caller's.
#[derive(Debug, Clone)]
pub struct AnswerDraft {
    pub body: AnswerBody,
    pub time_spent_secs: Option<u32>,
}

impl AnswerDraft {
    pub fn text(answer: impl Into<String>) -> Self {
        Self {
            body: AnswerBody::Text(answer.into()),
            time_spent_secs: None,
        }
    }

    pub fn with_time_spent(mut self, secs: u32) -> Self {
        self.time_spent_secs = Some(secs);
        self
    }

    pub(crate) fn submission(&self, used_hint: bool) -> AnswerSubmission {
        let mut submission = AnswerSubmission {
            time_spent_secs: self.time_spent_secs,
            used_hint,
            ..AnswerSubmission::default()
        };
        match &self.body {
            AnswerBody::Text(text) => submission.answer_text = Some(text.clone()),
            AnswerBody::Audio(path) => submission.audio_file_path = Some(path.clone()),
            AnswerBody::Video(path) => submission.video_file_path = Some(path.clone()),
            AnswerBody::Empty => {}
        }
        submission
    }
}

/// One recorded answer. Append-only within a session; never mutated after
/// submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionAnswer {
    pub question_id: u64,
    pub body: AnswerBody,
    pub time_spent_secs: Option<u32>,
    pub used_hint: bool,
}

/// What a successful answer or skip advanced to.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerAdvance {
    Next(Question),
    /// The question sequence is exhausted and the session completed. The
    /// summary may still be in flight; a later `complete_interview` call
    /// fetches it idempotently.
    Finished { summary: Option<Summary> },
}

/// One interview attempt. Owned and mutated exclusively by the machine;
/// queries hand out clones.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewSession {
    pub session_id: u64,
    pub mode: InterviewMode,
    pub phase: Phase,
    pub current_question: Question,
    /// Position in the question sequence, starting at 0.
    pub cursor: usize,
    /// Sticky for the current question; resets when the cursor advances.
    pub hint_used_for_current_question: bool,
    pub answers: Vec<QuestionAnswer>,
    /// Set exactly once, at the transition into a terminal phase.
    pub termination: Option<TerminationReason>,
    pub summary: Option<Summary>,
    #[serde(skip)]
    pub(crate) timing: Stopwatch,
}

impl InterviewSession {
    pub(crate) fn begin(handle: SessionHandle, mode: InterviewMode, now: DateTime<Utc>) -> Self {
        // Created is transient; Begin always enters Answering.
        let phase = match step(Phase::Created, Command::Begin) {
            Ok(Step::Enter(next)) => next,
            _ => Phase::Answering,
        };
        Self {
            session_id: handle.session_id,
            mode,
            phase,
            current_question: handle.first_question,
            cursor: 0,
            hint_used_for_current_question: false,
            answers: Vec::new(),
            termination: None,
            summary: None,
            timing: Stopwatch::started_at(now),
        }
    }

    /// Elapsed active time: the clock stops while paused and at terminal
    /// transitions.
    pub fn elapsed(&self) -> Duration {
        self.timing.elapsed_at(Utc::now())
    }
}
