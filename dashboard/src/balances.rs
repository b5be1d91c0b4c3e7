use bigdecimal::Zero;
use botdash_client::{Balance, ClientError};

/// Account balances, zero rows dropped.
#[derive(Debug, Clone, Default)]
pub struct Balances {
    rows: Vec<Balance>,
    loaded: bool,
    last_error: Option<String>,
}

impl Balances {
    pub fn rows(&self) -> &[Balance] {
        &self.rows
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn apply_snapshot(&mut self, rows: Vec<Balance>) -> bool {
        let rows: Vec<Balance> = rows
            .into_iter()
            .filter(|b| !(b.free.is_zero() && b.locked.is_zero()))
            .collect();
        let changed = !self.loaded || self.last_error.is_some() || self.rows != rows;
        self.rows = rows;
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
