//! Test doubles for exercising the client core without a live service.
//!
//! Exposed through the `test-helpers` feature so integration tests and
//! downstream client test suites share one scripted gateway instead of
//! each hand-rolling their own. Responses are queued per operation and
//! consumed in order; an unscripted call panics with the operation name,
//! which is the failure mode a test wants.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use prepstage_gateway::{
    AnswerOutcome, AnswerSubmission, AuthGrant, CompletionKind, Credentials, GatewayResult, Hint,
    PracticeConfig, Profile, ProfileDraft, Question, Registration, RemoteGateway, RemotePhase,
    SessionHandle, SimulationConfig, Summary,
};
use tokio::sync::Notify;

use crate::routes::{Route, RouteSink};

#[derive(Default)]
struct Script {
    calls: Vec<String>,
    authenticate: VecDeque<GatewayResult<AuthGrant>>,
    register: VecDeque<GatewayResult<()>>,
    get_profile: VecDeque<GatewayResult<Profile>>,
    update_profile: VecDeque<GatewayResult<Profile>>,
    start: VecDeque<GatewayResult<SessionHandle>>,
    start_simulation: VecDeque<GatewayResult<SessionHandle>>,
    answers: VecDeque<GatewayResult<AnswerOutcome>>,
    skips: VecDeque<GatewayResult<AnswerOutcome>>,
    pauses: VecDeque<GatewayResult<()>>,
    resumes: VecDeque<GatewayResult<()>>,
    hints: VecDeque<GatewayResult<Hint>>,
    hint_marks: VecDeque<GatewayResult<()>>,
    completes: VecDeque<GatewayResult<Summary>>,
    exits: VecDeque<GatewayResult<()>>,
    statuses: VecDeque<GatewayResult<RemotePhase>>,
}

/// Scripted [`RemoteGateway`] with call recording and an optional gate
/// that holds answer submissions until released, for in-flight-response
/// tests.
#[derive(Default)]
pub struct FakeGateway {
    script: Mutex<Script>,
    submit_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operation names in call order.
    pub fn calls(&self) -> Vec<String> {
        self.locked().calls.clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.locked().calls.iter().filter(|name| *name == op).count()
    }

    /// Makes subsequent `submit_answer` calls wait until the returned
    /// handle is notified, so a test can interleave other commands while
    /// a submission is in flight.
    pub fn gate_submissions(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self
            .submit_gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(gate.clone());
        gate
    }

    pub fn queue_authenticate(&self, result: GatewayResult<AuthGrant>) {
        self.locked().authenticate.push_back(result);
    }

    pub fn queue_register(&self, result: GatewayResult<()>) {
        self.locked().register.push_back(result);
    }

    pub fn queue_get_profile(&self, result: GatewayResult<Profile>) {
        self.locked().get_profile.push_back(result);
    }

    pub fn queue_update_profile(&self, result: GatewayResult<Profile>) {
        self.locked().update_profile.push_back(result);
    }

    pub fn queue_start(&self, result: GatewayResult<SessionHandle>) {
        self.locked().start.push_back(result);
    }

    pub fn queue_start_simulation(&self, result: GatewayResult<SessionHandle>) {
        self.locked().start_simulation.push_back(result);
    }

    pub fn queue_answer(&self, result: GatewayResult<AnswerOutcome>) {
        self.locked().answers.push_back(result);
    }

    pub fn queue_skip(&self, result: GatewayResult<AnswerOutcome>) {
        self.locked().skips.push_back(result);
    }

    pub fn queue_pause(&self, result: GatewayResult<()>) {
        self.locked().pauses.push_back(result);
    }

    pub fn queue_resume(&self, result: GatewayResult<()>) {
        self.locked().resumes.push_back(result);
    }

    pub fn queue_hint(&self, result: GatewayResult<Hint>) {
        self.locked().hints.push_back(result);
    }

    pub fn queue_mark_hint(&self, result: GatewayResult<()>) {
        self.locked().hint_marks.push_back(result);
    }

    pub fn queue_complete(&self, result: GatewayResult<Summary>) {
        self.locked().completes.push_back(result);
    }

    pub fn queue_exit(&self, result: GatewayResult<()>) {
        self.locked().exits.push_back(result);
    }

    pub fn queue_status(&self, result: GatewayResult<RemotePhase>) {
        self.locked().statuses.push_back(result);
    }

    fn locked(&self) -> MutexGuard<'_, Script> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_and_pop<T>(
        &self,
        op: &str,
        select: impl FnOnce(&mut Script) -> &mut VecDeque<GatewayResult<T>>,
    ) -> GatewayResult<T> {
        let mut script = self.locked();
        script.calls.push(op.to_string());
        match select(&mut script).pop_front() {
            Some(result) => result,
            None => panic!("FakeGateway: no scripted response for {op}"),
        }
    }
}

#[async_trait]
impl RemoteGateway for FakeGateway {
    async fn authenticate(&self, _credentials: &Credentials) -> GatewayResult<AuthGrant> {
        self.record_and_pop("authenticate", |script| &mut script.authenticate)
    }

    async fn register_account(&self, _registration: &Registration) -> GatewayResult<()> {
        self.record_and_pop("register_account", |script| &mut script.register)
    }

    async fn get_profile(&self) -> GatewayResult<Profile> {
        self.record_and_pop("get_profile", |script| &mut script.get_profile)
    }

    async fn update_profile(&self, _draft: &ProfileDraft) -> GatewayResult<Profile> {
        self.record_and_pop("update_profile", |script| &mut script.update_profile)
    }

    async fn start_interview(&self, _config: &PracticeConfig) -> GatewayResult<SessionHandle> {
        self.record_and_pop("start_interview", |script| &mut script.start)
    }

    async fn start_simulation(&self, _config: &SimulationConfig) -> GatewayResult<SessionHandle> {
        self.record_and_pop("start_simulation", |script| &mut script.start_simulation)
    }

    async fn submit_answer(
        &self,
        _question_id: u64,
        _answer: &AnswerSubmission,
    ) -> GatewayResult<AnswerOutcome> {
        let gate = self
            .submit_gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.record_and_pop("submit_answer", |script| &mut script.answers)
    }

    async fn pause(&self, _session_id: u64) -> GatewayResult<()> {
        self.record_and_pop("pause", |script| &mut script.pauses)
    }

    async fn resume(&self, _session_id: u64) -> GatewayResult<()> {
        self.record_and_pop("resume", |script| &mut script.resumes)
    }

    async fn skip(&self, _session_id: u64, _question_id: u64) -> GatewayResult<AnswerOutcome> {
        self.record_and_pop("skip", |script| &mut script.skips)
    }

    async fn get_hint(&self, _question_id: u64) -> GatewayResult<Hint> {
        self.record_and_pop("get_hint", |script| &mut script.hints)
    }

    async fn mark_hint_used(&self, _question_id: u64) -> GatewayResult<()> {
        self.record_and_pop("mark_hint_used", |script| &mut script.hint_marks)
    }

    async fn complete_interview(
        &self,
        _session_id: u64,
        _kind: CompletionKind,
    ) -> GatewayResult<Summary> {
        self.record_and_pop("complete_interview", |script| &mut script.completes)
    }

    async fn emergency_exit(&self, _session_id: u64, _reason: &str) -> GatewayResult<()> {
        self.record_and_pop("emergency_exit", |script| &mut script.exits)
    }

    async fn get_status(&self, _session_id: u64) -> GatewayResult<RemotePhase> {
        self.record_and_pop("get_status", |script| &mut script.statuses)
    }
}

/// Records forced redirects for assertion.
#[derive(Default)]
pub struct RecordingSink {
    redirects: Mutex<Vec<Route>>,
}

impl RecordingSink {
    pub fn redirects(&self) -> Vec<Route> {
        self.redirects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl RouteSink for RecordingSink {
    fn redirect(&self, target: Route) {
        self.redirects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(target);
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Fixture builders
// ─────────────────────────────────────────────────────────────────────────

pub fn profile(username: &str, has_profile: bool) -> Profile {
    Profile {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        age: None,
        graduation_year: None,
        education: None,
        school: None,
        major: None,
        major_category: None,
        target_position: Vec::new(),
        has_profile,
    }
}

pub fn grant(token: &str, user: Profile) -> AuthGrant {
    AuthGrant {
        token: token.to_string(),
        user,
    }
}

pub fn question(id: u64, text: &str) -> Question {
    Question {
        id,
        text: text.to_string(),
        question_type: None,
        time_limit_secs: None,
    }
}

pub fn handle(session_id: u64, first_question: Question) -> SessionHandle {
    SessionHandle {
        session_id,
        first_question,
        total_questions: None,
    }
}

pub fn summary(session_id: u64) -> Summary {
    Summary {
        session_id,
        completion_kind: CompletionKind::Normal,
        overall_score: Some(82.5),
        feedback: None,
        completed_at: None,
        detail: None,
    }
}

pub fn practice_config(position: &str) -> PracticeConfig {
    PracticeConfig {
        position: position.to_string(),
        difficulty: None,
        interview_style: None,
        interviewer_id: None,
        duration_minutes: Some(30),
        question_types: Vec::new(),
        special_settings: Vec::new(),
    }
}

pub fn simulation_config(company: &str, position: &str) -> SimulationConfig {
    SimulationConfig {
        company: company.to_string(),
        position: position.to_string(),
        round: None,
        interview_style: None,
        interviewer_id: None,
        duration_minutes: Some(45),
        evaluation_focus: Vec::new(),
    }
}
