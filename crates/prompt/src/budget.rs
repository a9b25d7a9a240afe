//! Character-budget enforcement.
//!
//! Over the soft target the prompt is only flagged. Over the hard limit,
//! memory is pruned one item at a time (persisting each removal) and the
//! prompt is re-rendered from the original request, until it fits the
//! target, nothing is left above its floor, or the iteration cap is hit.
//! Text is never truncated.

use crate::assembler::{Assembly, AssemblyRequest, PromptAssembler, compose};
use serde::Serialize;
use tracing::warn;
use zabal_config::PruneCategory;
use zabal_core::diagnostics::Verbosity;
use zabal_memory::PersonaMemory;

/// Per-category removal allowance; the loop runs at most
/// `prune_order.len() * MAX_REMOVALS_PER_CATEGORY` times.
pub const MAX_REMOVALS_PER_CATEGORY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// At or under the target
    WithinTarget,
    /// Over the target but within the hard limit; left unchanged
    OverTarget,
    /// Over the hard limit, pruned back under the target
    Pruned,
    /// Over the hard limit and pruning could not reach the target
    BudgetNotMet,
}

impl BudgetStatus {
    /// Whether the caller should be warned about this prompt's size.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::OverTarget | Self::BudgetNotMet)
    }
}

/// One memory item removed to fit the budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrunedItem {
    pub category: PruneCategory,
    /// Example title or note text
    pub item: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetOutcome {
    pub prompt: String,
    pub status: BudgetStatus,
    pub original_chars: usize,
    pub final_chars: usize,
    pub pruned: Vec<PrunedItem>,
}

impl PromptAssembler {
    /// Hold `assembled` to the configured budget.
    pub fn enforce_budget(&self, request: &AssemblyRequest, assembled: &Assembly) -> BudgetOutcome {
        let budget = &self.budget;
        let original_chars = assembled.char_len();

        let unchanged = |status| BudgetOutcome {
            prompt: assembled.prompt.clone(),
            status,
            original_chars,
            final_chars: original_chars,
            pruned: Vec::new(),
        };

        if original_chars <= budget.target_chars {
            self.diagnostics.log(
                "BUDGET",
                &format!("{original_chars}/{} chars", budget.target_chars),
                Verbosity::Verbose,
            );
            return unchanged(BudgetStatus::WithinTarget);
        }

        if original_chars <= budget.hard_limit {
            warn!(
                chars = original_chars,
                target = budget.target_chars,
                hard_limit = budget.hard_limit,
                "Prompt over target budget"
            );
            return unchanged(BudgetStatus::OverTarget);
        }

        warn!(
            chars = original_chars,
            hard_limit = budget.hard_limit,
            "Prompt over hard limit, pruning memory"
        );

        let mut memory = assembled.memory.clone();
        let mut prompt = assembled.prompt.clone();
        let mut chars = original_chars;
        let mut pruned = Vec::new();
        let max_iterations = budget.prune_order.len() * MAX_REMOVALS_PER_CATEGORY;

        while chars > budget.target_chars && pruned.len() < max_iterations {
            let Some(item) = prune_one(&mut memory, &budget.prune_order) else {
                break;
            };

            if let Err(e) = self.store.save(&memory) {
                warn!(error = %e, category = %item.category, "Failed to persist pruned memory");
            }

            prompt = compose(&memory, request, &assembled.lens);
            chars = prompt.chars().count();
            self.diagnostics.log(
                "PRUNED",
                &format!("{}: {} ({chars} chars)", item.category, item.item),
                Verbosity::Basic,
            );
            pruned.push(item);
        }

        let status = if chars <= budget.target_chars {
            BudgetStatus::Pruned
        } else {
            warn!(
                chars,
                target = budget.target_chars,
                removed = pruned.len(),
                "Prompt budget not met after pruning"
            );
            BudgetStatus::BudgetNotMet
        };

        BudgetOutcome {
            prompt,
            status,
            original_chars,
            final_chars: chars,
            pruned,
        }
    }
}

/// Remove one item from the first category in `order` above its floor.
/// Voice examples lose the oldest; style notes lose the newest.
pub fn prune_one(memory: &mut PersonaMemory, order: &[PruneCategory]) -> Option<PrunedItem> {
    for category in order {
        match category {
            PruneCategory::VoiceExamples if memory.voice_examples.len() > category.floor() => {
                let removed = memory.voice_examples.remove(0);
                return Some(PrunedItem {
                    category: *category,
                    item: removed.title,
                });
            }
            PruneCategory::StyleNotes if memory.style_notes.len() > category.floor() => {
                let removed = memory.style_notes.pop()?;
                return Some(PrunedItem {
                    category: *category,
                    item: removed,
                });
            }
            _ => {}
        }
    }
    None
}
