//! File-backed persona memory store.
//!
//! The whole document lives in one pretty-printed JSON file. Every mutation
//! is a full read-modify-write; there is no locking, so two writers racing
//! on the same file can lose an update.

use crate::model::{PersonaMemory, VoiceExample};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zabal_core::diagnostics::{Diagnostics, Verbosity};
use zabal_core::error::MemoryError;

/// Owner of the on-disk persona memory document.
///
/// Values returned by [`load`](Self::load) are snapshots; changes only
/// persist once written back through [`save`](Self::save).
#[derive(Debug, Clone)]
pub struct PersonaMemoryStore {
    path: PathBuf,
    diagnostics: Diagnostics,
}

impl PersonaMemoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            diagnostics: Diagnostics::silent(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty document if none exists yet. Returns `true` if one
    /// was created.
    pub fn ensure_exists(&self) -> Result<bool, MemoryError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&PersonaMemory::default())?;
        debug!(path = %self.path.display(), "Created empty persona memory");
        Ok(true)
    }

    /// Load the document. Never fails: a missing or unreadable document
    /// yields an empty one.
    pub fn load(&self) -> PersonaMemory {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return PersonaMemory::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read persona memory, using empty document");
                return PersonaMemory::default();
            }
        };

        match serde_json::from_str::<PersonaMemory>(&content) {
            Ok(memory) => {
                self.diagnostics.log(
                    "memory",
                    &format!(
                        "loaded {} voice examples, {} don'ts, {} style notes, {} context memories, {} projects",
                        memory.voice_examples.len(),
                        memory.voice_donts.len(),
                        memory.style_notes.len(),
                        memory.context_memories.len(),
                        memory.current_projects.len()
                    ),
                    Verbosity::Verbose,
                );
                memory
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Malformed persona memory, using empty document");
                PersonaMemory::default()
            }
        }
    }

    /// Overwrite the whole document.
    pub fn save(&self, memory: &PersonaMemory) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Storage(format!("Failed to create memory directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(memory)
            .map_err(|e| MemoryError::Encode(e.to_string()))?;

        std::fs::write(&self.path, content)
            .map_err(|e| MemoryError::Storage(format!("Failed to write memory file: {e}")))?;

        Ok(())
    }

    /// Append a voice example stamped with the current time. Always appends.
    pub fn add_voice_example(&self, title: &str, content: &str) -> Result<bool, MemoryError> {
        self.mutate(|m| {
            m.voice_examples.push(VoiceExample::new(title, content));
            true
        })
    }

    pub fn add_style_note(&self, note: &str) -> Result<bool, MemoryError> {
        self.mutate(|m| PersonaMemory::push_unique(&mut m.style_notes, note))
    }

    pub fn add_voice_dont(&self, phrase: &str) -> Result<bool, MemoryError> {
        self.mutate(|m| PersonaMemory::push_unique(&mut m.voice_donts, phrase))
    }

    pub fn add_context_memory(&self, text: &str) -> Result<bool, MemoryError> {
        self.mutate(|m| PersonaMemory::push_unique(&mut m.context_memories, text))
    }

    /// Render the current document onto `base`.
    pub fn render(&self, base: &str) -> String {
        self.load().render(base)
    }

    /// Write a timestamped copy of the current document into `dir`.
    pub fn backup(&self, dir: &Path) -> Result<PathBuf, MemoryError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| MemoryError::Storage(format!("Failed to create backup directory: {e}")))?;

        let name = format!("personality_{}.json", Local::now().format("%Y%m%d_%H%M%S"));
        let backup_path = dir.join(name);
        let content = serde_json::to_string_pretty(&self.load())
            .map_err(|e| MemoryError::Encode(e.to_string()))?;
        std::fs::write(&backup_path, content)
            .map_err(|e| MemoryError::Storage(format!("Failed to write backup: {e}")))?;

        debug!(path = %backup_path.display(), "Backed up persona memory");
        Ok(backup_path)
    }

    fn mutate(&self, f: impl FnOnce(&mut PersonaMemory) -> bool) -> Result<bool, MemoryError> {
        let mut memory = self.load();
        let appended = f(&mut memory);
        self.save(&memory)?;
        Ok(appended)
    }
}
