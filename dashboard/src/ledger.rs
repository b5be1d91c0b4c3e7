//! Trade history view-state.

use botdash_client::{ClientError, Trade};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct TradeLedger {
    trades: Vec<Trade>,
    loaded: bool,
    last_error: Option<String>,
}

impl TradeLedger {
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// `false` until the first snapshot arrives ("loading" vs "no trades yet").
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn apply_snapshot(&mut self, trades: Vec<Trade>) -> bool {
        let mut seen = HashSet::new();
        let trades: Vec<Trade> = trades.into_iter().filter(|t| seen.insert(t.id)).collect();

        let changed = !self.loaded || self.last_error.is_some() || self.trades != trades;
        self.trades = trades;
        self.loaded = true;
        self.last_error = None;
        changed
    }

    pub fn record_failure(&mut self, err: &ClientError) -> bool {
        let msg = err.to_string();
        if self.last_error.as_deref() == Some(msg.as_str()) {
            return false;
        }
        self.last_error = Some(msg);
        true
    }
}
