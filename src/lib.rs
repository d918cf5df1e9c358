//! deskpilot - service-desk triage agent grounded in internal policy documents
//!
//! Incoming support messages are classified into one of three actions
//! (auto-resolve, request more information, open a ticket), auto-resolvable
//! questions are answered from retrieved policy chunks, and every run ends
//! with an actionable recommendation.
//!
//! # Architecture
//!
//! - [`agent`]: the workflow orchestrator (conditional state machine)
//! - [`rag`]: chunking, vector index, retrieval and grounded answer composition
//! - [`triage`]: message classification against the triage prompt
//! - [`providers`]: external capability traits and their Gemini / local adapters
//! - [`corpus`]: policy document ingestion

pub mod errors;
pub mod types;

pub mod providers;
pub mod triage;
pub mod rag;
pub mod agent;
pub mod corpus;

pub mod config;
pub mod cli;

// Re-export commonly used types
pub use errors::{DeskError, Result};
pub use types::{
    DocumentChunk, RequestState, RetrievedChunk, RunStats, TriageDecision, TriageVerdict, Urgency,
};

pub use agent::{Orchestrator, OrchestratorConfig, Stage};
pub use rag::{AnswerComposer, Chunker, GroundedAnswer, IndexHandle, PolicyIndex};
