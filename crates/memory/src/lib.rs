//! Persona memory for ZABAL: the document, its file-backed store, and
//! analysis-driven updates.

pub mod model;
pub mod store;
pub mod update;

pub use model::{CurrentState, PersonaMemory, VoiceExample};
pub use store::PersonaMemoryStore;
pub use update::{MAX_VOICE_EXAMPLES, MemoryAnalysis, ProposedExample, apply_analysis, safety_issues};
