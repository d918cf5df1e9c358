//! Workflow orchestration: the stage state machine and the orchestrator
//! that threads one request state through it.

pub mod orchestrator;
pub mod state;

pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use state::Stage;
