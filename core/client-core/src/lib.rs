//! # prepstage-core
//!
//! Core library for PrepStage, providing the session, authorization-gating,
//! and interview-lifecycle logic shared by all clients (web shell, desktop
//! shell, test harnesses). Rendering, transport plumbing, and media capture
//! live in the embedding client; this crate owns the state machines.
//!
//! ## Design principles
//!
//! - **No globals**: the store, guard, and machine are constructed once per
//!   running client and passed by reference; nothing is reachable through
//!   ambient lookup.
//! - **Exclusive ownership**: the identity belongs to [`UserStore`], the
//!   session record to [`InterviewMachine`]; all mutation flows through
//!   their operations and queries hand out clones.
//! - **Atomic transitions**: a remote-backed command applies its whole
//!   local transition on success or none of it; a timed-out call leaves
//!   state exactly as before.
//! - **Graceful degradation**: durable-storage write failures are logged,
//!   never surfaced; a failed profile fetch falls back to the last stored
//!   completion flag.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prepstage_core::{FileStore, InterviewMachine, NavigationGuard, UserStore};
//!
//! let storage = Arc::new(FileStore::open_default());
//! let users = Arc::new(UserStore::new(gateway.clone(), storage, router.clone()));
//! let guard = NavigationGuard::new(users.clone());
//! let machine = InterviewMachine::new(gateway, users);
//! ```

pub mod error;
pub mod guard;
pub mod identity;
pub mod interview;
pub mod routes;
pub mod storage;
#[cfg(feature = "test-helpers")]
pub mod testing;
pub mod user_store;

// Re-export commonly used items at crate root
pub use error::{NetworkFailure, PrepError, Result};
pub use guard::{Decision, NavigationGuard};
pub use identity::Identity;
pub use interview::{
    AnswerAdvance, AnswerBody, AnswerDraft, InterviewMachine, InterviewSession, Phase,
    QuestionAnswer, TerminationReason,
};
pub use routes::{Route, RouteIntent, RouteSink};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use user_store::UserStore;
