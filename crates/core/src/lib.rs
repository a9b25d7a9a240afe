//! # ZABAL Core
//!
//! Domain types, traits, and error definitions for the ZABAL writing
//! pipeline. Every other crate depends inward on this one.
//!
//! The generation engine is the [`Provider`] trait; HTTP implementations
//! live in `zabal-providers`.

pub mod artifact;
pub mod diagnostics;
pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use artifact::{ContentType, GeneratedArtifact};
pub use diagnostics::{Diagnostics, Verbosity};
pub use error::{MemoryError, ProviderError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
