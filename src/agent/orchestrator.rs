//! Orchestrator - threads one request state through the stage machine
//!
//! Each stage is a step method that mutates the state in place; the next
//! stage is decided by [`Stage::next`]. Capability failures are captured
//! into `state.error` and never raised past a run: every run reaches
//! `Finalize` and returns a best-effort result.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::agent::Stage;
use crate::providers::Classifier;
use crate::rag::{AnswerComposer, GroundedAnswer};
use crate::types::state::DEFAULT_MAX_ATTEMPTS;
use crate::types::{preview, RequestState, RunStats, TriageDecision, TriageVerdict};
use crate::Result;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Retry budget for information requests
    pub max_attempts: u32,

    /// Character budget for the answer prefix embedded in auto-resolve
    /// recommendations (the full answer stays on the state)
    pub answer_preview_chars: usize,

    /// Character budget for the best-effort answer prefix appended to
    /// request-info recommendations
    pub info_preview_chars: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            answer_preview_chars: 200,
            info_preview_chars: 100,
        }
    }
}

/// Workflow orchestrator for support requests
pub struct Orchestrator {
    classifier: Arc<dyn Classifier>,
    composer: Arc<AnswerComposer>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        composer: Arc<AnswerComposer>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            classifier,
            composer,
            config,
        }
    }

    /// Process one message end to end and return the finalized state
    pub async fn process(&self, message: &str) -> RequestState {
        let mut state = RequestState::new(message, self.config.max_attempts);
        let mut stage = Stage::Triage;

        loop {
            state.executed_path.push(stage);
            info!(run = %state.id, stage = %stage, "entering stage");

            match stage {
                Stage::Triage => self.triage_step(&mut state).await,
                Stage::Retrieve => self.retrieve_step(&mut state).await,
                Stage::RequestInfo => self.request_info_step(&mut state),
                Stage::Recommend => self.recommend_step(&mut state),
                Stage::Finalize => {
                    self.finalize_step(&mut state);
                    return state;
                }
            }

            stage = stage.next(&state);
        }
    }

    /// Process with a caller-level timeout over the whole run
    ///
    /// On expiry the partial run is dropped and a finalized state with
    /// `error` set is returned instead of leaving partial state behind.
    /// The recorded path is `Triage -> Finalize`: a run always enters
    /// Triage first, and the stages reached after it are unknown once the
    /// partial run is dropped.
    pub async fn process_with_timeout(&self, message: &str, timeout: Duration) -> RequestState {
        match tokio::time::timeout(timeout, self.process(message)).await {
            Ok(state) => state,
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "orchestration run timed out");
                let mut state = RequestState::new(message, self.config.max_attempts);
                state.error = Some(format!(
                    "orchestration timed out after {}ms",
                    timeout.as_millis()
                ));
                state.executed_path.push(Stage::Triage);
                state.executed_path.push(Stage::Finalize);
                self.finalize_step(&mut state);
                state
            }
        }
    }

    /// Triage without retrieval (direct entry point for the CLI)
    pub async fn classify_only(&self, message: &str) -> Result<TriageVerdict> {
        self.classifier.classify(message).await
    }

    /// Grounded answer without triage (direct entry point for the CLI)
    pub async fn answer_only(&self, question: &str) -> Result<GroundedAnswer> {
        self.composer.answer(question).await
    }

    /// Statistics view over a processed state
    pub fn stats(&self, state: &RequestState) -> RunStats {
        state.stats()
    }

    /// Triage step: classify the message and store the verdict
    pub async fn triage_step(&self, state: &mut RequestState) {
        match self.classifier.classify(&state.original_message).await {
            Ok(verdict) => {
                info!(
                    decision = %verdict.decision(),
                    urgency = %verdict.urgency(),
                    "triage complete"
                );
                state.needs_more_info = verdict.decision() == TriageDecision::RequestInfo;
                state.verdict = Some(verdict);
            }
            Err(e) => {
                warn!(error = %e, "triage step failed");
                state.error = Some(format!("triage failed: {}", e));
            }
        }
    }

    /// Retrieval step: compose a grounded answer from the policy index
    pub async fn retrieve_step(&self, state: &mut RequestState) {
        match self.composer.answer(&state.original_message).await {
            Ok(grounded) => {
                debug!(documents = grounded.retrieved.len(), "retrieval complete");
                state.answer = Some(grounded.answer);
                state.retrieved = grounded.retrieved;
            }
            Err(e) => {
                // Recorded but not fatal: the branch continues to Recommend
                // and produces a degraded recommendation.
                warn!(error = %e, "retrieval step failed");
                state.error = Some(format!("retrieval failed: {}", e));
            }
        }
    }

    /// Information-request step: spend one attempt from the retry budget
    ///
    /// Exhausting the budget escalates to ticket-opening semantics; the
    /// recommendation text states the escalation explicitly.
    pub fn request_info_step(&self, state: &mut RequestState) {
        state.attempts += 1;

        let fields = state
            .verdict
            .as_ref()
            .map(|v| v.missing_fields().to_vec())
            .unwrap_or_default();

        let mut recommendation = if fields.is_empty() {
            "Ask the user for more specific details about the request.".to_string()
        } else {
            format!("Ask the user to provide: {}.", fields.join(", "))
        };
        state.suggested_action = Some("Request more information".to_string());

        if state.attempts >= state.max_attempts {
            recommendation.push_str(" Retry limit reached; escalating to a ticket.");
            state.suggested_action = Some("Open ticket after retry limit".to_string());
            state.needs_more_info = false;
        }

        info!(attempt = state.attempts, budget = state.max_attempts, "information requested");
        state.recommendation = Some(recommendation);
    }

    /// Recommendation step: pure synthesis from the verdict and answer
    pub fn recommend_step(&self, state: &mut RequestState) {
        let Some(verdict) = state.verdict.clone() else {
            // Nothing to synthesize from; finalization supplies the fallback.
            return;
        };

        match verdict.decision() {
            TriageDecision::AutoResolve => {
                state.recommendation = Some(match &state.answer {
                    Some(answer) => format!(
                        "This request can be answered automatically. Policy-grounded answer: {}",
                        preview(answer, self.config.answer_preview_chars)
                    ),
                    None => {
                        "This request can be answered automatically from company policies."
                            .to_string()
                    }
                });
                state.suggested_action = Some("Respond automatically".to_string());
            }
            TriageDecision::RequestInfo => {
                let fields = if verdict.missing_fields().is_empty() {
                    "specific details".to_string()
                } else {
                    verdict.missing_fields().join(", ")
                };
                let mut recommendation =
                    format!("Ask the user to provide more information: {}.", fields);
                if let Some(answer) = &state.answer {
                    recommendation.push(' ');
                    recommendation.push_str(&preview(answer, self.config.info_preview_chars));
                }
                state.recommendation = Some(recommendation);
                state.suggested_action = Some("Request more information".to_string());
            }
            TriageDecision::OpenTicket => {
                state.recommendation = Some(format!(
                    "Open a ticket in the service desk system. Urgency: {}. \
                     Reason: the request requires manual processing.",
                    verdict.urgency()
                ));
                state.suggested_action = Some(verdict.urgency().ticket_action().to_string());
            }
        }

        info!(action = ?state.suggested_action, "recommendation synthesized");
    }

    /// Finalization step: freeze the state (idempotent)
    ///
    /// Guarantees a non-empty recommendation: when every upstream step
    /// failed, the fallback states the request must be escalated manually.
    pub fn finalize_step(&self, state: &mut RequestState) {
        if state.finalized {
            return;
        }

        if state.recommendation.as_deref().map_or(true, str::is_empty) {
            state.recommendation = Some(
                "The request could not be processed automatically and should be \
                 escalated to a human agent."
                    .to_string(),
            );
            if state.suggested_action.is_none() {
                state.suggested_action = Some("Escalate manually".to_string());
            }
        }

        state.finalized = true;
        info!(run = %state.id, has_error = state.error.is_some(), "run finalized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TriageVerdict, Urgency};

    fn bare_orchestrator() -> Orchestrator {
        // Step methods under test here never touch the capabilities.
        use crate::providers::Embedder;
        use crate::rag::{IndexHandle, PolicyIndex};
        use async_trait::async_trait;

        struct NoClassifier;
        #[async_trait]
        impl Classifier for NoClassifier {
            async fn classify(&self, message: &str) -> Result<TriageVerdict> {
                Err(crate::DeskError::classification(message, "unused"))
            }
        }

        struct NoEmbedder;
        #[async_trait]
        impl Embedder for NoEmbedder {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                Err(crate::DeskError::EmbeddingFailure("unused".to_string()))
            }
            fn dimensions(&self) -> usize {
                0
            }
            fn name(&self) -> &str {
                "none"
            }
        }

        struct NoCompletion;
        #[async_trait]
        impl crate::providers::CompletionModel for NoCompletion {
            async fn generate(&self, _s: &str, _c: &str, _q: &str) -> Result<String> {
                Err(crate::DeskError::CompletionFailure("unused".to_string()))
            }
            fn name(&self) -> &str {
                "none"
            }
        }

        let handle = Arc::new(IndexHandle::new(Arc::new(PolicyIndex::empty(0))));
        let composer = Arc::new(AnswerComposer::new(
            Arc::new(NoEmbedder),
            Arc::new(NoCompletion),
            handle,
            3,
        ));
        Orchestrator::new(Arc::new(NoClassifier), composer, OrchestratorConfig::default())
    }

    fn verdict(decision: TriageDecision, fields: Vec<String>) -> TriageVerdict {
        TriageVerdict {
            decisao: decision,
            urgencia: Urgency::Medium,
            campos_faltantes: fields,
        }
    }

    #[test]
    fn test_recommend_auto_resolve_embeds_answer_prefix() {
        let orch = bare_orchestrator();
        let mut state = RequestState::new("msg", 3);
        state.verdict = Some(verdict(TriageDecision::AutoResolve, Vec::new()));
        state.answer = Some("x".repeat(500));

        orch.recommend_step(&mut state);

        let rec = state.recommendation.unwrap();
        assert!(rec.contains("answered automatically"));
        // 200-char prefix plus the ellipsis marker, not the full answer
        assert!(rec.len() < 300);
        assert!(rec.ends_with("..."));
        assert_eq!(state.suggested_action.as_deref(), Some("Respond automatically"));
    }

    #[test]
    fn test_recommend_request_info_lists_fields() {
        let orch = bare_orchestrator();
        let mut state = RequestState::new("msg", 3);
        state.verdict = Some(verdict(
            TriageDecision::RequestInfo,
            vec!["tema".to_string(), "contexto".to_string()],
        ));

        orch.recommend_step(&mut state);

        let rec = state.recommendation.unwrap();
        assert!(rec.contains("tema, contexto"));
        assert_eq!(
            state.suggested_action.as_deref(),
            Some("Request more information")
        );
    }

    #[test]
    fn test_recommend_open_ticket_uses_urgency_label() {
        let orch = bare_orchestrator();
        let mut state = RequestState::new("msg", 3);
        state.verdict = Some(verdict(TriageDecision::OpenTicket, Vec::new()));

        orch.recommend_step(&mut state);

        assert!(state.recommendation.unwrap().contains("Urgency: medium"));
        assert_eq!(state.suggested_action.as_deref(), Some("Open normal ticket"));
    }

    #[test]
    fn test_request_info_increments_and_escalates() {
        let orch = bare_orchestrator();
        let mut state = RequestState::new("msg", 3);
        state.verdict = Some(verdict(TriageDecision::RequestInfo, Vec::new()));
        state.needs_more_info = true;

        orch.request_info_step(&mut state);
        assert_eq!(state.attempts, 1);
        assert!(state.needs_more_info);

        orch.request_info_step(&mut state);
        orch.request_info_step(&mut state);
        assert_eq!(state.attempts, 3);
        assert!(!state.needs_more_info);
        assert!(state.recommendation.unwrap().contains("escalating to a ticket"));
        assert_eq!(
            state.suggested_action.as_deref(),
            Some("Open ticket after retry limit")
        );
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let orch = bare_orchestrator();
        let mut state = RequestState::new("msg", 3);
        state.recommendation = Some("done".to_string());

        orch.finalize_step(&mut state);
        let snapshot = state.clone();

        orch.finalize_step(&mut state);
        assert!(state.finalized);
        assert_eq!(state.recommendation, snapshot.recommendation);
        assert_eq!(state.suggested_action, snapshot.suggested_action);
        assert_eq!(state.attempts, snapshot.attempts);
    }

    #[test]
    fn test_finalize_supplies_fallback_recommendation() {
        let orch = bare_orchestrator();
        let mut state = RequestState::new("msg", 3);
        state.error = Some("triage failed: boom".to_string());

        orch.finalize_step(&mut state);

        assert!(state.finalized);
        let rec = state.recommendation.unwrap();
        assert!(!rec.is_empty());
        assert!(rec.contains("escalated"));
        assert_eq!(state.suggested_action.as_deref(), Some("Escalate manually"));
    }
}
