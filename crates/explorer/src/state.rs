//! Agent state and the pure transition function.
//!
//! Field merge policies are part of the contract: `command_log` and
//! `system_errors` accumulate, `candidates`/`objective`/`current_path`
//! are replaced wholesale, and the command log resets whenever the
//! current path changes.

use webscout_core_types::{Candidate, Command, ExplorationPath, SystemError};

/// Where the machine is in its loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Plan,
    SelectPath,
    Propose,
    Execute,
    Done,
}

/// Transient per-run state. Recreated for every run; reset per path
/// section as documented on each event.
#[derive(Clone, Debug, Default)]
pub struct AgentState {
    pub exploration_plan: Vec<ExplorationPath>,
    pub current_path: Option<ExplorationPath>,
    pub command_log: Vec<Command>,
    pub candidates: Vec<Candidate>,
    pub objective: String,
    pub system_errors: Vec<SystemError>,
}

/// Everything that can happen to the agent state. Produced by the
/// side-effecting loop, consumed by [`apply`].
#[derive(Clone, Debug)]
pub enum StateEvent {
    /// The plan was built from the start page.
    PlanCreated { plan: Vec<ExplorationPath> },
    /// A plan entry was picked. Marks it explored *before* any
    /// navigation so selection happens at most once even if navigation
    /// later fails.
    PathSelected { index: usize },
    /// Navigation to the selected entry failed; the path stays marked
    /// explored and is abandoned, not retried.
    PathAbandoned { error: SystemError },
    /// No unexplored entries remain.
    PlanExhausted,
    /// A proposal cycle finished.
    Proposed {
        candidates: Vec<Candidate>,
        errors: Vec<SystemError>,
        objective: String,
    },
    /// Execute was reached with nothing left to act on.
    NoCandidates,
    /// One command was executed (successfully or not - failed
    /// interactions still consume their candidate).
    Executed {
        command: Command,
        errors: Vec<SystemError>,
    },
}

/// Pure transition: fold one event into the state and return the next
/// phase. All mutation of [`AgentState`] goes through here.
pub fn apply(state: &mut AgentState, event: StateEvent, max_command_log: usize) -> Phase {
    match event {
        StateEvent::PlanCreated { plan } => {
            state.exploration_plan = plan;
            Phase::SelectPath
        }
        StateEvent::PathSelected { index } => {
            let path = &mut state.exploration_plan[index];
            path.explored = true;
            state.current_path = Some(path.clone());
            state.command_log.clear();
            state.candidates.clear();
            Phase::Propose
        }
        StateEvent::PathAbandoned { error } => {
            state.current_path = None;
            state.system_errors.push(error);
            Phase::SelectPath
        }
        StateEvent::PlanExhausted => {
            state.current_path = None;
            Phase::Done
        }
        StateEvent::Proposed {
            candidates,
            errors,
            objective,
        } => {
            state.candidates = candidates;
            state.system_errors.extend(errors);
            state.objective = objective;
            Phase::Execute
        }
        StateEvent::NoCandidates => Phase::SelectPath,
        StateEvent::Executed { command, errors } => {
            state.command_log.push(command);
            state.system_errors.extend(errors);
            if !state.candidates.is_empty() {
                state.candidates.remove(0);
            }
            if state.candidates.is_empty() || state.command_log.len() > max_command_log {
                Phase::SelectPath
            } else {
                Phase::Propose
            }
        }
    }
}
