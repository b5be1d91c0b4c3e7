//! Active-bot view-state.

use botdash_client::{BotHandle, BotId, ClientError};
use std::collections::HashSet;

/// Latest snapshot of active bots plus the operator's highlighted row.
///
/// The collection is only ever replaced wholesale from a server snapshot;
/// nothing here flips a bot's `running` flag locally.
#[derive(Debug, Clone, Default)]
pub struct BotRegistry {
    bots: Vec<BotHandle>,
    loaded: bool,
    last_error: Option<String>,
    highlighted: usize,
}

impl BotRegistry {
    pub fn bots(&self) -> &[BotHandle] {
        &self.bots
    }

    pub fn get(&self, id: &BotId) -> Option<&BotHandle> {
        self.bots.iter().find(|b| &b.id == id)
    }

    pub fn len(&self) -> usize {
        self.bots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }

    /// True once any snapshot has been applied.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn highlighted_index(&self) -> Option<usize> {
        (!self.bots.is_empty()).then_some(self.highlighted)
    }

    pub fn highlighted(&self) -> Option<&BotHandle> {
        self.bots.get(self.highlighted)
    }

    /// Moves the highlight by `delta` rows, clamped to the table.
    pub fn move_highlight(&mut self, delta: isize) -> bool {
        if self.bots.is_empty() {
            return false;
        }
        let last = self.bots.len() - 1;
        let next = self.highlighted.saturating_add_signed(delta).min(last);
        let changed = next != self.highlighted;
        self.highlighted = next;
        changed
    }

    /// Replaces the collection. Duplicate ids collapse to the first
    /// occurrence. Returns whether anything visible changed.
    pub fn apply_snapshot(&mut self, bots: Vec<BotHandle>) -> bool {
        let mut seen = HashSet::new();
        let bots: Vec<BotHandle> = bots.into_iter().filter(|b| seen.insert(b.id.clone())).collect();

        // Keep the highlight on the same bot when it survives the refresh.
        let kept = self
            .highlighted()
            .and_then(|cur| bots.iter().position(|b| b.id == cur.id));

        let changed = !self.loaded || self.last_error.is_some() || self.bots != bots;
        self.bots = bots;
        self.loaded = true;
        self.last_error = None;

        let next = kept.unwrap_or(self.highlighted).min(self.bots.len().saturating_sub(1));
        let moved = next != self.highlighted;
        self.highlighted = next;
        changed || moved
    }

    /// Records a failed poll. The previous snapshot stays.
    pub fn record_failure(&mut self, err: &ClientError) -> bool {
        let msg = err.to_string();
        if self.last_error.as_deref() == Some(msg.as_str()) {
            return false;
        }
        self.last_error = Some(msg);
        true
    }
}
