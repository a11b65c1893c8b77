//! End-to-end lifecycle: cold start, gated navigation, login with an
//! incomplete profile, profile setup, and a practice interview driven
//! through hints, skips, and pause/resume to idempotent completion.

use std::sync::Arc;

use prepstage_core::testing::{
    grant, handle, practice_config, profile, question, summary, FakeGateway, RecordingSink,
};
use prepstage_core::{
    AnswerAdvance, AnswerDraft, Decision, InterviewMachine, MemoryStore, NavigationGuard, Phase,
    PrepError, Route, RouteIntent, TerminationReason, UserStore,
};
use prepstage_gateway::{AnswerOutcome, CompletionKind, Credentials, Hint, ProfileDraft};

struct Client {
    gateway: Arc<FakeGateway>,
    users: Arc<UserStore>,
    guard: NavigationGuard,
    machine: Arc<InterviewMachine>,
}

fn client() -> Client {
    let gateway = Arc::new(FakeGateway::new());
    let storage = Arc::new(MemoryStore::default());
    let sink = Arc::new(RecordingSink::default());
    let users = Arc::new(UserStore::new(gateway.clone(), storage, sink));
    let guard = NavigationGuard::new(users.clone());
    let machine = Arc::new(InterviewMachine::new(gateway.clone(), users.clone()));
    Client {
        gateway,
        users,
        guard,
        machine,
    }
}

#[tokio::test]
async fn full_practice_interview_lifecycle() {
    let client = client();

    // Cold start: anonymous visitors are collected at the login route.
    assert_eq!(
        client.guard.decide(RouteIntent::to(Route::Dashboard)).await,
        Decision::Redirect {
            target: Route::Login,
            remember: Some(Route::Dashboard),
        }
    );

    // Login with an incomplete profile gates the dashboard behind setup.
    client
        .gateway
        .queue_authenticate(Ok(grant("tok-1", profile("ada", false))));
    client
        .users
        .login(&Credentials {
            username: "ada".to_string(),
            password: "pw".to_string(),
        })
        .await
        .expect("login succeeds");
    assert_eq!(
        client.guard.decide(RouteIntent::to(Route::Dashboard)).await,
        Decision::Redirect {
            target: Route::ProfileSetup,
            remember: None,
        }
    );
    assert!(!client.users.can_start_interview());

    // Completing the profile flips the same navigation to Allow.
    client
        .gateway
        .queue_update_profile(Ok(profile("ada", true)));
    client
        .users
        .update_profile(&ProfileDraft {
            education: Some("BSc".to_string()),
            major: Some("CS".to_string()),
            ..ProfileDraft::default()
        })
        .await
        .expect("profile update succeeds");
    assert_eq!(
        client.guard.decide(RouteIntent::to(Route::Dashboard)).await,
        Decision::Allow
    );
    assert_eq!(
        client
            .guard
            .decide(RouteIntent::to(Route::InterviewPractice))
            .await,
        Decision::Allow
    );
    assert!(client.users.can_start_interview());

    // Start a practice interview on its first question.
    client
        .gateway
        .queue_start(Ok(handle(77, question(1, "Introduce yourself"))));
    let first = client
        .machine
        .start(&practice_config("frontend"))
        .await
        .expect("start succeeds");
    assert_eq!(first.id, 1);

    // Question 1: hint, then answer.
    client.gateway.queue_hint(Ok(Hint {
        question_id: 1,
        text: "Lead with your strongest project".to_string(),
    }));
    client.gateway.queue_mark_hint(Ok(()));
    client.machine.get_hint().await.expect("hint succeeds");
    client.gateway.queue_answer(Ok(AnswerOutcome::Next {
        question: question(2, "Describe a production incident"),
    }));
    let advance = client
        .machine
        .submit_answer(1, AnswerDraft::text("I build frontends").with_time_spent(90))
        .await
        .expect("submit succeeds");
    assert_eq!(
        advance,
        AnswerAdvance::Next(question(2, "Describe a production incident"))
    );

    // Question 2: think it over across a pause, then skip it.
    client.gateway.queue_pause(Ok(()));
    client.machine.pause().await.expect("pause succeeds");
    client.machine.pause().await.expect("repeat pause is a no-op");
    client.gateway.queue_resume(Ok(()));
    client.machine.resume().await.expect("resume succeeds");
    client.gateway.queue_skip(Ok(AnswerOutcome::Next {
        question: question(3, "Where do you want to grow?"),
    }));
    client
        .machine
        .skip_question(2)
        .await
        .expect("skip succeeds");

    // Question 3 is the last; answering it completes the session.
    client.gateway.queue_answer(Ok(AnswerOutcome::Done));
    client.gateway.queue_complete(Ok(summary(77)));
    let advance = client
        .machine
        .submit_answer(3, AnswerDraft::text("Toward systems work"))
        .await
        .expect("final submit succeeds");
    match advance {
        AnswerAdvance::Finished { summary } => {
            assert_eq!(summary.expect("summary present").session_id, 77);
        }
        other => panic!("expected Finished, got {other:?}"),
    }

    let session = client.machine.session().expect("session retained");
    assert_eq!(session.phase, Phase::Completed);
    assert_eq!(session.termination, Some(TerminationReason::Normal));
    assert_eq!(session.answers.len(), 3);
    assert!(session.answers[0].used_hint);
    assert!(!session.answers[1].used_hint);

    // A redelivered completion is answered from the cache.
    let again = client
        .machine
        .complete_interview(CompletionKind::Normal)
        .await
        .expect("idempotent completion");
    assert_eq!(again.session_id, 77);
    assert_eq!(client.gateway.call_count("complete_interview"), 1);

    // Mutating the finished session is rejected; starting over is not.
    assert_eq!(
        client
            .machine
            .submit_answer(3, AnswerDraft::text("postscript"))
            .await,
        Err(PrepError::SessionTerminated)
    );
    client
        .gateway
        .queue_start(Ok(handle(78, question(10, "Round two"))));
    client
        .machine
        .start(&practice_config("frontend"))
        .await
        .expect("a terminal session does not block a new start");
}

#[tokio::test]
async fn logout_locks_the_client_down() {
    let client = client();
    client
        .gateway
        .queue_authenticate(Ok(grant("tok-1", profile("ada", true))));
    client
        .users
        .login(&Credentials {
            username: "ada".to_string(),
            password: "pw".to_string(),
        })
        .await
        .expect("login succeeds");
    assert_eq!(
        client.guard.decide(RouteIntent::to(Route::Dashboard)).await,
        Decision::Allow
    );

    client.users.logout();

    assert_eq!(
        client.guard.decide(RouteIntent::to(Route::Dashboard)).await,
        Decision::Redirect {
            target: Route::Login,
            remember: Some(Route::Dashboard),
        }
    );
    assert!(!client.users.can_start_interview());
}
