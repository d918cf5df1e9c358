//! Stage state machine for one orchestration run
//!
//! A deterministic finite state machine over the request state:
//! - Safety: every transition is an explicit match arm, no fallthrough
//! - Liveness: every path reaches `Finalize`
//! - Determinism: the next stage is a pure function of stage + state

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{RequestState, TriageDecision};

/// Stages of one orchestration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Classify the incoming message
    Triage,

    /// Retrieve policy context and compose a grounded answer
    Retrieve,

    /// Ask the user for missing information (bounded retries)
    RequestInfo,

    /// Synthesize the final recommendation
    Recommend,

    /// Freeze the state (terminal)
    Finalize,
}

impl Stage {
    /// Check if this is the terminal stage
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Finalize)
    }

    /// Next stage given the current request state
    ///
    /// Transition rules:
    /// - `Triage` -> `Finalize` on error or missing verdict; otherwise
    ///   `Retrieve` (auto-resolve), `RequestInfo` (request info) or
    ///   `Recommend` (open ticket - no retrieval needed, ticket routing
    ///   does not require a grounded answer)
    /// - `Retrieve` -> `Recommend` always; a retrieval failure was recorded
    ///   on the state but the branch still produces a degraded recommendation
    /// - `RequestInfo` -> `Finalize` on error or an exhausted retry budget;
    ///   `Retrieve` while information is still missing and budget remains
    ///   (best-effort retrieval with incomplete input); otherwise `Finalize`
    /// - `Recommend` -> `Finalize` always
    /// - `Finalize` -> `Finalize` (terminal self-loop)
    pub fn next(self, state: &RequestState) -> Stage {
        match self {
            Stage::Triage => {
                if state.error.is_some() {
                    return Stage::Finalize;
                }
                match state.decision() {
                    Some(TriageDecision::AutoResolve) => Stage::Retrieve,
                    Some(TriageDecision::RequestInfo) => Stage::RequestInfo,
                    Some(TriageDecision::OpenTicket) => Stage::Recommend,
                    None => Stage::Finalize,
                }
            }
            Stage::Retrieve => Stage::Recommend,
            Stage::RequestInfo => {
                if state.error.is_some() || state.attempts >= state.max_attempts {
                    Stage::Finalize
                } else if state.needs_more_info {
                    Stage::Retrieve
                } else {
                    Stage::Finalize
                }
            }
            Stage::Recommend => Stage::Finalize,
            Stage::Finalize => Stage::Finalize,
        }
    }

    /// Short name used in the executed-path view
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Triage => "triage",
            Stage::Retrieve => "retrieve",
            Stage::RequestInfo => "request_info",
            Stage::Recommend => "recommend",
            Stage::Finalize => "finalize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
