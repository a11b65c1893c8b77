//! The interview lifecycle transition function.
//!
//! Every phase change goes through [`step`]; command handlers never write
//! the phase directly. `Stay` encodes idempotent no-ops (a repeated pause,
//! a resume while already answering) so callers skip the remote call
//! instead of erroring.

use super::types::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Begin,
    SubmitAnswer,
    SkipQuestion,
    UseHint,
    Pause,
    Resume,
    Complete,
    EmergencyExit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// The command moves the session into a new phase.
    Enter(Phase),
    /// The command is legal and leaves the phase unchanged.
    Stay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IllegalTransition {
    /// Begin issued against a session that already exists.
    AlreadyStarted,
    /// Any mutating command against a completed or aborted session.
    Terminated,
    /// A command that needs the answering sub-state issued elsewhere.
    RequiresAnswering,
}

pub(crate) fn step(phase: Phase, command: Command) -> Result<Step, IllegalTransition> {
    match (phase, command) {
        (Phase::Created, Command::Begin) => Ok(Step::Enter(Phase::Answering)),
        (_, Command::Begin) => Err(IllegalTransition::AlreadyStarted),

        (Phase::Completed | Phase::Aborted, _) => Err(IllegalTransition::Terminated),

        (Phase::Answering, Command::SubmitAnswer | Command::SkipQuestion | Command::UseHint) => {
            Ok(Step::Stay)
        }
        (Phase::Answering, Command::Pause) => Ok(Step::Enter(Phase::Paused)),
        (Phase::Answering, Command::Resume) => Ok(Step::Stay),

        (Phase::Paused, Command::Pause) => Ok(Step::Stay),
        (Phase::Paused, Command::Resume) => Ok(Step::Enter(Phase::Answering)),
        (Phase::Paused, Command::SubmitAnswer | Command::SkipQuestion | Command::UseHint) => {
            Err(IllegalTransition::RequiresAnswering)
        }

        (Phase::Answering | Phase::Paused, Command::Complete) => Ok(Step::Enter(Phase::Completed)),
        (Phase::Answering | Phase::Paused, Command::EmergencyExit) => {
            Ok(Step::Enter(Phase::Aborted))
        }

        // Created is transient and never observable by command handlers.
        (Phase::Created, _) => Err(IllegalTransition::RequiresAnswering),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_enters_answering() {
        assert_eq!(
            step(Phase::Created, Command::Begin),
            Ok(Step::Enter(Phase::Answering))
        );
    }

    #[test]
    fn begin_on_a_live_session_is_a_conflict() {
        for phase in [Phase::Answering, Phase::Paused, Phase::Completed, Phase::Aborted] {
            assert_eq!(
                step(phase, Command::Begin),
                Err(IllegalTransition::AlreadyStarted)
            );
        }
    }

    #[test]
    fn answering_accepts_answer_commands_without_phase_change() {
        for command in [Command::SubmitAnswer, Command::SkipQuestion, Command::UseHint] {
            assert_eq!(step(Phase::Answering, command), Ok(Step::Stay));
        }
    }

    #[test]
    fn pause_and_resume_toggle_between_sub_states() {
        assert_eq!(
            step(Phase::Answering, Command::Pause),
            Ok(Step::Enter(Phase::Paused))
        );
        assert_eq!(
            step(Phase::Paused, Command::Resume),
            Ok(Step::Enter(Phase::Answering))
        );
    }

    #[test]
    fn pause_and_resume_are_idempotent() {
        assert_eq!(step(Phase::Paused, Command::Pause), Ok(Step::Stay));
        assert_eq!(step(Phase::Answering, Command::Resume), Ok(Step::Stay));
    }

    #[test]
    fn paused_sessions_reject_answer_commands() {
        for command in [Command::SubmitAnswer, Command::SkipQuestion, Command::UseHint] {
            assert_eq!(
                step(Phase::Paused, command),
                Err(IllegalTransition::RequiresAnswering)
            );
        }
    }

    #[test]
    fn completion_is_legal_from_both_active_sub_states() {
        assert_eq!(
            step(Phase::Answering, Command::Complete),
            Ok(Step::Enter(Phase::Completed))
        );
        assert_eq!(
            step(Phase::Paused, Command::Complete),
            Ok(Step::Enter(Phase::Completed))
        );
    }

    #[test]
    fn emergency_exit_is_legal_from_both_active_sub_states() {
        assert_eq!(
            step(Phase::Answering, Command::EmergencyExit),
            Ok(Step::Enter(Phase::Aborted))
        );
        assert_eq!(
            step(Phase::Paused, Command::EmergencyExit),
            Ok(Step::Enter(Phase::Aborted))
        );
    }

    #[test]
    fn terminal_phases_reject_every_command() {
        for phase in [Phase::Completed, Phase::Aborted] {
            for command in [
                Command::SubmitAnswer,
                Command::SkipQuestion,
                Command::UseHint,
                Command::Pause,
                Command::Resume,
                Command::Complete,
                Command::EmergencyExit,
            ] {
                assert_eq!(step(phase, command), Err(IllegalTransition::Terminated));
            }
        }
    }
}
