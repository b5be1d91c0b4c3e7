//! Candle view-state for the selected symbol and interval.

use crate::debug_hooks;
use botdash_client::{Candle, ClientError, Interval};

/// The chart's symbol/interval pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{symbol} {interval}")]
pub struct Selection {
    pub symbol: String,
    pub interval: Interval,
}

impl Selection {
    /// Symbols are trimmed and upper-cased.
    pub fn new(symbol: impl AsRef<str>, interval: Interval) -> Self {
        Self {
            symbol: symbol.as_ref().trim().to_uppercase(),
            interval,
        }
    }

    pub fn with_interval(&self, interval: Interval) -> Self {
        Self {
            symbol: self.symbol.clone(),
            interval,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    /// Selection changed and nothing has arrived for it yet.
    Loading,
    Live,
    /// The service answered with no candles.
    Empty,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct MarketFeed {
    selection: Selection,
    generation: u64,
    candles: Vec<Candle>,
    status: FeedStatus,
}

impl MarketFeed {
    pub fn new(selection: Selection) -> Self {
        Self {
            selection,
            generation: 0,
            candles: Vec::new(),
            status: FeedStatus::Loading,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Switches to `selection`, dropping every candle of the previous one.
    /// Returns the new generation.
    pub fn reset(&mut self, selection: Selection) -> u64 {
        self.generation += 1;
        debug_hooks::log_selection_reset(&self.selection.to_string(), &selection.to_string(), self.generation);
        self.selection = selection;
        self.candles.clear();
        self.status = FeedStatus::Loading;
        self.generation
    }

    /// Replaces the series if `generation` is current. Returns whether the
    /// view changed.
    pub fn apply_candles(&mut self, generation: u64, candles: Vec<Candle>) -> bool {
        if !self.is_current(generation) {
            debug_hooks::log_feed_skip(
                "stale generation",
                format!("got={generation} current={}", self.generation),
            );
            return false;
        }
        let candles = normalize(candles);
        let status = if candles.is_empty() {
            FeedStatus::Empty
        } else {
            FeedStatus::Live
        };
        if self.candles == candles && self.status == status {
            return false;
        }
        self.candles = candles;
        self.status = status;
        true
    }

    /// A failed fetch replaces the series with an explicit empty one.
    pub fn record_failure(&mut self, generation: u64, err: &ClientError) -> bool {
        if !self.is_current(generation) {
            debug_hooks::log_feed_skip("stale generation failure", err.to_string());
            return false;
        }
        let status = FeedStatus::Failed(err.to_string());
        if self.candles.is_empty() && self.status == status {
            return false;
        }
        self.candles.clear();
        self.status = status;
        true
    }
}

/// Sorts by time; of two candles with the same time the later one wins.
fn normalize(mut candles: Vec<Candle>) -> Vec<Candle> {
    if candles.windows(2).all(|w| w[0].time < w[1].time) {
        return candles;
    }
    let received = candles.len();
    candles.sort_by_key(|c| c.time);
    let mut out: Vec<Candle> = Vec::with_capacity(received);
    for c in candles {
        match out.last_mut() {
            Some(last) if last.time == c.time => *last = c,
            _ => out.push(c),
        }
    }
    debug_hooks::log_candles_unordered(received, out.len());
    out
}
