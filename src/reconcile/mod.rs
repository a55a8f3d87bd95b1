//! Incremental-result reconciliation
//!
//! The service emits revisions of recognized items out of order with
//! respect to their position in the audio. The reconciler merges
//! revisions sharing an id into a single entry and keeps all entries
//! ordered by their start offset, so readers always see a stable,
//! chronological transcript regardless of arrival order.

use serde::{Deserialize, Serialize};

use crate::protocol::ItemUpdate;

/// One entry in the reconciled view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalItem {
    pub id: String,
    /// Position on the audio timeline; pinned at insertion, this is the
    /// ordering key for the whole view.
    pub start_offset_ms: u64,
    pub end_offset_ms: u64,
    /// Latest known content; replaced wholesale on revision
    pub text: String,
    /// Once true the item is immutable
    pub is_final: bool,
}

impl From<ItemUpdate> for IncrementalItem {
    fn from(update: ItemUpdate) -> Self {
        Self {
            id: update.id,
            start_offset_ms: update.start_offset_ms,
            end_offset_ms: update.end_offset_ms,
            text: update.text,
            is_final: update.is_final,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ReconcileError {
    #[error("update for finalized item {id}")]
    FinalizedItem { id: String },
}

/// Ordered, deduplicated view of incremental items.
///
/// Grow-only for the duration of one recording activity; `reset` is the
/// only way to clear it.
#[derive(Debug, Default)]
pub struct Reconciler {
    items: Vec<IncrementalItem>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one inbound revision into the view.
    ///
    /// Unknown ids insert at the position that keeps ascending start
    /// order (stable among equal offsets); known ids are revised in
    /// place. A revision of an already-final item is rejected and the
    /// existing entry left untouched.
    pub fn apply(&mut self, update: ItemUpdate) -> Result<(), ReconcileError> {
        if let Some(existing) = self.items.iter_mut().find(|item| item.id == update.id) {
            if existing.is_final {
                return Err(ReconcileError::FinalizedItem { id: update.id });
            }
            existing.text = update.text;
            existing.end_offset_ms = update.end_offset_ms;
            existing.is_final = update.is_final;
            return Ok(());
        }

        let position = self
            .items
            .iter()
            .position(|item| item.start_offset_ms > update.start_offset_ms)
            .unwrap_or(self.items.len());
        self.items.insert(position, update.into());
        Ok(())
    }

    /// Entries in chronological order
    pub fn items(&self) -> &[IncrementalItem] {
        &self.items
    }

    /// Snapshot clone for readers outside the consumer loop
    pub fn snapshot(&self) -> Vec<IncrementalItem> {
        self.items.clone()
    }

    /// Number of entries marked final so far
    pub fn finalized_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_final).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Clear the view for a new recording activity
    pub fn reset(&mut self) {
        self.items.clear();
    }
}
