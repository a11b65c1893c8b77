//! The interview session machine: drives one attempt through its lifecycle
//! by proxying commands to the remote service and applying the resulting
//! transition atomically.
//!
//! Commands follow a validate / snapshot / call / revalidate / apply shape.
//! The state lock is never held across a remote call; an epoch counter
//! decides whether an in-flight response is still allowed to land. An
//! emergency exit flips the local phase first and bumps the epoch, so any
//! outstanding response for the session is discarded instead of applied.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use prepstage_gateway::{
    AnswerOutcome, CompletionKind, GatewayError, Hint, InterviewMode, PracticeConfig, Question,
    RemoteGateway, RemotePhase, SessionHandle, SimulationConfig, Summary,
};

use super::transition::{step, Command, IllegalTransition, Step};
use super::types::{
    AnswerAdvance, AnswerBody, AnswerDraft, InterviewSession, Phase, QuestionAnswer,
    TerminationReason,
};
use crate::error::{PrepError, Result};
use crate::user_store::UserStore;

struct MachineState {
    session: Option<InterviewSession>,
    /// Bumped on every applied transition. A snapshot taken before a
    /// remote call must still match for the response to be applied.
    epoch: u64,
}

/// What an answering-phase command captures before its remote call.
struct AnswerSnapshot {
    session_id: u64,
    question_id: u64,
    epoch: u64,
    used_hint: bool,
}

/// What a phase-changing command captures before its remote call.
struct PhaseSnapshot {
    session_id: u64,
    epoch: u64,
    next: Phase,
}

pub struct InterviewMachine {
    state: Mutex<MachineState>,
    gateway: Arc<dyn RemoteGateway>,
    users: Arc<UserStore>,
}

impl InterviewMachine {
    pub fn new(gateway: Arc<dyn RemoteGateway>, users: Arc<UserStore>) -> Self {
        Self {
            state: Mutex::new(MachineState {
                session: None,
                epoch: 0,
            }),
            gateway,
            users,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Starting
    // ─────────────────────────────────────────────────────────────────────

    /// Starts a practice interview. Refused with `SessionConflict` while a
    /// non-terminal session exists; a completed or aborted one is replaced.
    pub async fn start(&self, config: &PracticeConfig) -> Result<Question> {
        self.ensure_no_live_session()?;
        let handle = self
            .gateway
            .start_interview(config)
            .await
            .map_err(|err| self.gateway_failure(err, "start_interview"))?;
        self.install(handle, InterviewMode::Practice)
    }

    /// Starts a simulation interview; same contract as [`start`](Self::start).
    pub async fn start_simulation(&self, config: &SimulationConfig) -> Result<Question> {
        self.ensure_no_live_session()?;
        let handle = self
            .gateway
            .start_simulation(config)
            .await
            .map_err(|err| self.gateway_failure(err, "start_simulation"))?;
        self.install(handle, InterviewMode::Simulation)
    }

    fn ensure_no_live_session(&self) -> Result<()> {
        let state = self.locked();
        match state.session.as_ref() {
            Some(session) if !session.phase.is_terminal() => Err(PrepError::SessionConflict),
            _ => Ok(()),
        }
    }

    fn install(&self, handle: SessionHandle, mode: InterviewMode) -> Result<Question> {
        let mut guard = self.locked();
        // Re-checked after the remote call; a racing start may have won.
        if let Some(existing) = guard.session.as_ref() {
            if !existing.phase.is_terminal() {
                return Err(PrepError::SessionConflict);
            }
        }
        let session = InterviewSession::begin(handle, mode, Utc::now());
        tracing::info!(
            session_id = session.session_id,
            mode = ?mode,
            question_id = session.current_question.id,
            "Interview session started"
        );
        let first = session.current_question.clone();
        guard.session = Some(session);
        guard.epoch += 1;
        Ok(first)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Answering
    // ─────────────────────────────────────────────────────────────────────

    /// Records an answer for the current question and advances the cursor,
    /// or completes the session when the sequence is exhausted. Fails with
    /// `StaleQuestion` when `question_id` is not the current question; the
    /// caller must reconcile rather than retry with a different id.
    pub async fn submit_answer(&self, question_id: u64, draft: AnswerDraft) -> Result<AnswerAdvance> {
        let snap = self.answering_snapshot(Command::SubmitAnswer, Some(question_id))?;
        let submission = draft.submission(snap.used_hint);
        let outcome = self
            .gateway
            .submit_answer(snap.question_id, &submission)
            .await
            .map_err(|err| self.gateway_failure(err, "submit_answer"))?;
        let answer = QuestionAnswer {
            question_id: snap.question_id,
            body: draft.body,
            time_spent_secs: draft.time_spent_secs,
            used_hint: snap.used_hint,
        };
        self.apply_answer_outcome(snap, answer, outcome).await
    }

    /// Skips the current question: an empty-body answer that advances the
    /// cursor without recording hint usage.
    pub async fn skip_question(&self, question_id: u64) -> Result<AnswerAdvance> {
        let snap = self.answering_snapshot(Command::SkipQuestion, Some(question_id))?;
        let outcome = self
            .gateway
            .skip(snap.session_id, snap.question_id)
            .await
            .map_err(|err| self.gateway_failure(err, "skip"))?;
        let answer = QuestionAnswer {
            question_id: snap.question_id,
            body: AnswerBody::Empty,
            time_spent_secs: None,
            used_hint: false,
        };
        self.apply_answer_outcome(snap, answer, outcome).await
    }

    async fn apply_answer_outcome(
        &self,
        snap: AnswerSnapshot,
        answer: QuestionAnswer,
        outcome: AnswerOutcome,
    ) -> Result<AnswerAdvance> {
        let finished_session = {
            let mut guard = self.locked();
            let MachineState { session, epoch } = &mut *guard;
            let session = match session.as_mut() {
                Some(session) if *epoch == snap.epoch && session.session_id == snap.session_id => {
                    session
                }
                _ => {
                    tracing::info!(
                        session_id = snap.session_id,
                        stale_epoch = snap.epoch,
                        "Discarding late answer outcome"
                    );
                    return Err(PrepError::SessionTerminated);
                }
            };

            session.answers.push(answer);
            session.cursor += 1;
            session.hint_used_for_current_question = false;
            match outcome {
                AnswerOutcome::Next { question } => {
                    session.current_question = question.clone();
                    *epoch += 1;
                    tracing::info!(
                        session_id = session.session_id,
                        cursor = session.cursor,
                        question_id = question.id,
                        "Advanced to next question"
                    );
                    return Ok(AnswerAdvance::Next(question));
                }
                AnswerOutcome::Done => {
                    session.phase = Phase::Completed;
                    session.termination = Some(TerminationReason::Normal);
                    session.timing.stop_at(Utc::now());
                    *epoch += 1;
                    tracing::info!(
                        session_id = session.session_id,
                        answers = session.answers.len(),
                        "No more questions; session completed"
                    );
                    session.session_id
                }
            }
        };
        // Summary retrieval is a separate idempotent call; the completion
        // above stands whether or not it succeeds right now.
        let summary = self.fetch_summary(finished_session, CompletionKind::Normal).await;
        Ok(AnswerAdvance::Finished { summary })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Pause / resume
    // ─────────────────────────────────────────────────────────────────────

    /// Suspends the session. A no-op without error when already paused.
    pub async fn pause(&self) -> Result<()> {
        let Some(snap) = self.phase_snapshot(Command::Pause)? else {
            return Ok(());
        };
        self.gateway
            .pause(snap.session_id)
            .await
            .map_err(|err| self.gateway_failure(err, "pause"))?;
        self.apply_phase(snap, "pause")
    }

    /// Resumes a paused session. A no-op without error when already
    /// answering.
    pub async fn resume(&self) -> Result<()> {
        let Some(snap) = self.phase_snapshot(Command::Resume)? else {
            return Ok(());
        };
        self.gateway
            .resume(snap.session_id)
            .await
            .map_err(|err| self.gateway_failure(err, "resume"))?;
        self.apply_phase(snap, "resume")
    }

    // ─────────────────────────────────────────────────────────────────────
    // Hints
    // ─────────────────────────────────────────────────────────────────────

    /// Fetches a hint for the current question and marks hint usage, which
    /// is sticky until the cursor advances. The remote usage mark is
    /// best-effort: the flag also travels with the next answer submission,
    /// so a lost mark cannot lose the fact.
    pub async fn get_hint(&self) -> Result<Hint> {
        let snap = self.answering_snapshot(Command::UseHint, None)?;
        let hint = self
            .gateway
            .get_hint(snap.question_id)
            .await
            .map_err(|err| self.gateway_failure(err, "get_hint"))?;
        if self.mark_hint_locally(&snap) {
            if let Err(err) = self.gateway.mark_hint_used(snap.question_id).await {
                tracing::warn!(
                    question_id = snap.question_id,
                    error = %err,
                    "Hint-used mark failed"
                );
            }
        }
        Ok(hint)
    }

    /// Marks hint usage without fetching hint content (the UI already has
    /// it). Strict remote-then-apply, unlike [`get_hint`](Self::get_hint).
    pub async fn mark_hint_used(&self) -> Result<()> {
        let snap = self.answering_snapshot(Command::UseHint, None)?;
        self.gateway
            .mark_hint_used(snap.question_id)
            .await
            .map_err(|err| self.gateway_failure(err, "mark_hint_used"))?;
        if self.mark_hint_locally(&snap) {
            Ok(())
        } else {
            Err(PrepError::SessionTerminated)
        }
    }

    fn mark_hint_locally(&self, snap: &AnswerSnapshot) -> bool {
        let mut guard = self.locked();
        let MachineState { session, epoch } = &mut *guard;
        match session.as_mut() {
            Some(session) if *epoch == snap.epoch && session.session_id == snap.session_id => {
                session.hint_used_for_current_question = true;
                true
            }
            _ => {
                tracing::info!(
                    session_id = snap.session_id,
                    stale_epoch = snap.epoch,
                    "Discarding late hint mark"
                );
                false
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Termination
    // ─────────────────────────────────────────────────────────────────────

    /// Completes the session. Idempotent: called again on an already
    /// completed session it returns the existing summary instead of
    /// erroring, because the transport may redeliver the call after a
    /// dropped acknowledgment.
    pub async fn complete_interview(&self, kind: CompletionKind) -> Result<Summary> {
        enum Path {
            Cached(Summary),
            Refetch { session_id: u64 },
            Finish(PhaseSnapshot),
        }

        let path = {
            let state = self.locked();
            let session = state.session.as_ref().ok_or(PrepError::NoActiveSession)?;
            match session.phase {
                Phase::Completed => match &session.summary {
                    Some(summary) => Path::Cached(summary.clone()),
                    None => Path::Refetch {
                        session_id: session.session_id,
                    },
                },
                _ => {
                    step(session.phase, Command::Complete).map_err(map_illegal)?;
                    Path::Finish(PhaseSnapshot {
                        session_id: session.session_id,
                        epoch: state.epoch,
                        next: Phase::Completed,
                    })
                }
            }
        };

        match path {
            Path::Cached(summary) => Ok(summary),
            Path::Refetch { session_id } => {
                let summary = self
                    .gateway
                    .complete_interview(session_id, kind)
                    .await
                    .map_err(|err| self.gateway_failure(err, "complete_interview"))?;
                self.store_summary(session_id, &summary);
                Ok(summary)
            }
            Path::Finish(snap) => {
                let summary = self
                    .gateway
                    .complete_interview(snap.session_id, kind)
                    .await
                    .map_err(|err| self.gateway_failure(err, "complete_interview"))?;
                let mut guard = self.locked();
                let MachineState { session, epoch } = &mut *guard;
                let session = match session.as_mut() {
                    Some(session)
                        if *epoch == snap.epoch && session.session_id == snap.session_id =>
                    {
                        session
                    }
                    _ => {
                        tracing::info!(
                            session_id = snap.session_id,
                            stale_epoch = snap.epoch,
                            "Discarding late completion"
                        );
                        return Err(PrepError::SessionTerminated);
                    }
                };
                session.phase = Phase::Completed;
                session.termination = Some(TerminationReason::from(kind));
                session.timing.stop_at(Utc::now());
                session.summary = Some(summary.clone());
                *epoch += 1;
                tracing::info!(
                    session_id = session.session_id,
                    kind = ?kind,
                    "Interview completed"
                );
                Ok(summary)
            }
        }
    }

    /// Legacy alias for [`complete_interview`](Self::complete_interview)
    /// kept for older callers; the remote `/end` and `/complete` routes
    /// collapse to the same transition.
    pub async fn end(&self, interview_id: u64) -> Result<Summary> {
        let held = {
            self.locked()
                .session
                .as_ref()
                .map(|session| session.session_id)
        };
        match held {
            Some(session_id) if session_id == interview_id => {
                self.complete_interview(CompletionKind::Normal).await
            }
            _ => Err(PrepError::NoActiveSession),
        }
    }

    /// Aborts the session locally first, then notifies the service
    /// fire-and-forget: the exit is never blocked by network state, and a
    /// failed notification is the transport's to retry. The epoch bump
    /// cancels any in-flight answer submission for this session.
    pub async fn emergency_exit(&self, reason: &str) -> Result<()> {
        let session_id = {
            let mut guard = self.locked();
            let MachineState { session, epoch } = &mut *guard;
            let session = session.as_mut().ok_or(PrepError::NoActiveSession)?;
            match step(session.phase, Command::EmergencyExit).map_err(map_illegal)? {
                Step::Enter(next) => {
                    session.phase = next;
                    session.termination = Some(TerminationReason::Emergency);
                    session.timing.stop_at(Utc::now());
                    *epoch += 1;
                    tracing::warn!(
                        session_id = session.session_id,
                        reason,
                        "Emergency exit; session aborted locally"
                    );
                }
                // EmergencyExit from an active sub-state always enters
                // Aborted; Stay cannot occur.
                Step::Stay => {}
            }
            session.session_id
        };
        if let Err(err) = self.gateway.emergency_exit(session_id, reason).await {
            self.gateway_failure(err, "emergency_exit");
            tracing::warn!(
                session_id,
                "Emergency exit notification failed; transport will retry"
            );
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    pub fn session(&self) -> Option<InterviewSession> {
        self.locked().session.clone()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.locked().session.as_ref().map(|session| session.phase)
    }

    /// The remote service's view of the session phase. Read-only; used to
    /// reconcile after a timed-out command before deciding to resubmit.
    pub async fn remote_phase(&self) -> Result<RemotePhase> {
        let session_id = {
            self.locked()
                .session
                .as_ref()
                .map(|session| session.session_id)
                .ok_or(PrepError::NoActiveSession)?
        };
        self.gateway
            .get_status(session_id)
            .await
            .map_err(|err| self.gateway_failure(err, "get_status"))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn locked(&self) -> MutexGuard<'_, MachineState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Validates an answering-phase command and captures what its remote
    /// call and apply step need.
    fn answering_snapshot(
        &self,
        command: Command,
        question_id: Option<u64>,
    ) -> Result<AnswerSnapshot> {
        let state = self.locked();
        let session = state.session.as_ref().ok_or(PrepError::NoActiveSession)?;
        step(session.phase, command).map_err(map_illegal)?;
        let current = session.current_question.id;
        if let Some(submitted) = question_id {
            if submitted != current {
                return Err(PrepError::StaleQuestion {
                    submitted,
                    current,
                });
            }
        }
        Ok(AnswerSnapshot {
            session_id: session.session_id,
            question_id: current,
            epoch: state.epoch,
            used_hint: session.hint_used_for_current_question,
        })
    }

    /// Validates a phase-changing command. `None` means the session is
    /// already in the target sub-state and no call or apply is needed.
    fn phase_snapshot(&self, command: Command) -> Result<Option<PhaseSnapshot>> {
        let state = self.locked();
        let session = state.session.as_ref().ok_or(PrepError::NoActiveSession)?;
        match step(session.phase, command).map_err(map_illegal)? {
            Step::Stay => Ok(None),
            Step::Enter(next) => Ok(Some(PhaseSnapshot {
                session_id: session.session_id,
                epoch: state.epoch,
                next,
            })),
        }
    }

    fn apply_phase(&self, snap: PhaseSnapshot, op: &'static str) -> Result<()> {
        let mut guard = self.locked();
        let MachineState { session, epoch } = &mut *guard;
        let session = match session.as_mut() {
            Some(session) if *epoch == snap.epoch && session.session_id == snap.session_id => {
                session
            }
            _ => {
                tracing::info!(
                    session_id = snap.session_id,
                    stale_epoch = snap.epoch,
                    op,
                    "Discarding late phase change"
                );
                return Err(PrepError::SessionTerminated);
            }
        };
        let now = Utc::now();
        match snap.next {
            Phase::Paused => session.timing.pause_at(now),
            Phase::Answering => session.timing.resume_at(now),
            Phase::Created | Phase::Completed | Phase::Aborted => {}
        }
        session.phase = snap.next;
        *epoch += 1;
        tracing::info!(
            session_id = session.session_id,
            phase = snap.next.as_str(),
            op,
            "Phase transition applied"
        );
        Ok(())
    }

    /// Best-effort summary retrieval after a `Done` outcome already
    /// completed the session.
    async fn fetch_summary(&self, session_id: u64, kind: CompletionKind) -> Option<Summary> {
        match self.gateway.complete_interview(session_id, kind).await {
            Ok(summary) => {
                self.store_summary(session_id, &summary);
                Some(summary)
            }
            Err(err) => {
                self.gateway_failure(err, "complete_interview");
                tracing::warn!(
                    session_id,
                    "Summary fetch failed; a later completion call retries it"
                );
                None
            }
        }
    }

    fn store_summary(&self, session_id: u64, summary: &Summary) {
        let mut guard = self.locked();
        if let Some(session) = guard.session.as_mut() {
            if session.session_id == session_id && session.phase == Phase::Completed {
                session.summary = Some(summary.clone());
            }
        }
    }

    /// Maps a gateway failure, logging it and handling the global
    /// credential-expiry side effect: an `Unauthorized` on any
    /// authenticated call forces a logout before surfacing.
    fn gateway_failure(&self, err: GatewayError, op: &'static str) -> PrepError {
        tracing::warn!(op, error = %err, "Remote call failed");
        if matches!(err, GatewayError::Unauthorized) {
            self.users.force_logout("credential rejected by remote service");
        }
        PrepError::from(err)
    }
}

fn map_illegal(err: IllegalTransition) -> PrepError {
    match err {
        IllegalTransition::AlreadyStarted => PrepError::SessionConflict,
        IllegalTransition::Terminated => PrepError::SessionTerminated,
        IllegalTransition::RequiresAnswering => PrepError::SessionPaused,
    }
}
