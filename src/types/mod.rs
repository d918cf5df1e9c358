//! Shared data model for the triage pipeline

pub mod document;
pub mod state;
pub mod triage;

pub use document::{preview, DocumentChunk, RetrievedChunk};
pub use state::{RequestState, RunStats};
pub use triage::{TriageDecision, TriageVerdict, Urgency};
