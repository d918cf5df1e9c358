//! Retrieval-augmented answering: chunking, the policy index and the
//! grounded answer composer.

pub mod chunker;
pub mod composer;
pub mod index;
pub mod prompt;

pub use chunker::Chunker;
pub use composer::{AnswerComposer, ConsultedSource, GroundedAnswer};
pub use index::{IndexHandle, PolicyIndex, ScoredChunk};
pub use prompt::GROUNDING_PROMPT;
