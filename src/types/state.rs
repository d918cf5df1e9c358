//! Orchestration unit of work
//!
//! One [`RequestState`] is created per incoming message, threaded mutably
//! through every stage of the run, frozen by finalization and discarded
//! after the caller reads the result. It is never shared across runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::Stage;
use crate::types::{RetrievedChunk, TriageDecision, TriageVerdict, Urgency};

/// Default retry budget for information requests
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Mutable state for one orchestration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestState {
    /// Run identity
    pub id: Uuid,

    /// The incoming message, immutable once set
    pub original_message: String,

    /// Triage result, set by the triage stage
    pub verdict: Option<TriageVerdict>,

    /// Grounded answer, set by the retrieval stage
    pub answer: Option<String>,

    /// Chunks consulted for the answer
    pub retrieved: Vec<RetrievedChunk>,

    /// Final recommendation text (never empty once finalized)
    pub recommendation: Option<String>,

    /// Suggested follow-up action
    pub suggested_action: Option<String>,

    /// Number of information requests issued so far
    pub attempts: u32,

    /// Retry budget for information requests
    pub max_attempts: u32,

    /// Whether the user still has to supply information
    pub needs_more_info: bool,

    /// First captured step failure, if any
    pub error: Option<String>,

    /// Set by finalization; the state is immutable afterwards
    pub finalized: bool,

    /// Stages actually entered during the run, in order
    pub executed_path: Vec<Stage>,

    /// Run creation time
    pub created_at: DateTime<Utc>,
}

impl RequestState {
    /// Create a fresh state for one incoming message
    pub fn new(message: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_message: message.into(),
            verdict: None,
            answer: None,
            retrieved: Vec::new(),
            recommendation: None,
            suggested_action: None,
            attempts: 0,
            max_attempts,
            needs_more_info: false,
            error: None,
            finalized: false,
            executed_path: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Decision from the verdict, if triage has run
    pub fn decision(&self) -> Option<TriageDecision> {
        self.verdict.as_ref().map(|v| v.decision())
    }

    /// Urgency from the verdict, if triage has run
    pub fn urgency(&self) -> Option<Urgency> {
        self.verdict.as_ref().map(|v| v.urgency())
    }

    /// Derive the statistics view from this state
    pub fn stats(&self) -> RunStats {
        RunStats {
            decision: self.decision(),
            urgency: self.urgency(),
            attempts: self.attempts,
            documents_consulted: self.retrieved.len(),
            has_error: self.error.is_some(),
            executed_path: self.executed_path.clone(),
        }
    }
}

/// Statistics view over a finalized run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub decision: Option<TriageDecision>,
    pub urgency: Option<Urgency>,
    pub attempts: u32,
    pub documents_consulted: usize,
    pub has_error: bool,
    pub executed_path: Vec<Stage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_empty() {
        let state = RequestState::new("Preciso de ajuda", DEFAULT_MAX_ATTEMPTS);
        assert_eq!(state.original_message, "Preciso de ajuda");
        assert!(state.verdict.is_none());
        assert!(state.answer.is_none());
        assert!(state.retrieved.is_empty());
        assert_eq!(state.attempts, 0);
        assert_eq!(state.max_attempts, 3);
        assert!(!state.needs_more_info);
        assert!(!state.finalized);
        assert!(state.executed_path.is_empty());
    }

    #[test]
    fn test_stats_reflect_state() {
        let mut state = RequestState::new("msg", 3);
        state.attempts = 2;
        state.error = Some("triage failed".to_string());
        state.executed_path = vec![Stage::Triage, Stage::Finalize];

        let stats = state.stats();
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.documents_consulted, 0);
        assert!(stats.has_error);
        assert!(stats.decision.is_none());
        assert_eq!(stats.executed_path, vec![Stage::Triage, Stage::Finalize]);
    }
}
