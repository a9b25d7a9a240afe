//! Generation workflow for ZABAL.
//!
//! Ties the pipeline together: prompt assembly with budget enforcement,
//! the generation engine call, editorial validation, and archiving of the
//! result. Also hosts the context updater that keeps persona memory in
//! step with recent writing.

pub mod archive;
pub mod calendar;
pub mod context_update;
pub mod generation;
pub mod prompts;

pub use archive::{ArchiveEntry, ArchiveError, OutputArchive, SaveLocation};
pub use calendar::DayCounter;
pub use context_update::{ContextUpdater, UpdateError, UpdateReport};
pub use generation::{
    GenerationResult, GenerationSettings, GenerationWorkflow, NewsletterRequest, SocialRequest,
};
pub use prompts::PromptTemplates;
pub use zabal_prompt::VoiceParameters;

use zabal_config::ConfigError;
use zabal_core::error::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The generation engine failed; never retried.
    #[error(transparent)]
    Generation(#[from] ProviderError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
