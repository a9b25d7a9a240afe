//! Prompt assembly for ZABAL.
//!
//! Builds the system instructions sent to the generation engine from the
//! persona memory, the selected lens and the caller's optional editing and
//! voice guidance, then holds the result to a character budget by pruning
//! memory.

pub mod assembler;
pub mod budget;
pub mod voice;

pub use assembler::{Assembly, AssemblyRequest, PromptAssembler, compose};
pub use budget::{BudgetOutcome, BudgetStatus, MAX_REMOVALS_PER_CATEGORY, PrunedItem};
pub use voice::VoiceParameters;

/// Prompt construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("Voice parameter '{name}' must be between 1 and 10, got {value}")]
    InvalidVoiceParameter { name: &'static str, value: i64 },
}
