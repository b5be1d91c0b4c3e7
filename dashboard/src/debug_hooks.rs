//! Topic-tagged trace points for the synchronization core.
//!
//! Everything goes through `tracing` under the `botdash::hooks` target, so
//! `RUST_LOG=botdash::hooks=debug` shows the full picture. Poll failures are
//! logged at `warn` but throttled per poller.

use botdash_client::ClientError;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

fn log_line(topic: &str, msg: impl AsRef<str>) {
    tracing::debug!(target: "botdash::hooks", topic, "{}", msg.as_ref());
}

pub fn log_poller_start(name: &str, every: Duration) {
    log_line("poll.start", format!("{name}: every {}s", every.as_secs_f64()));
}

pub fn log_poller_cancel(name: &str) {
    log_line("poll.cancel", name);
}

pub fn log_poll_refresh(name: &str) {
    log_line("poll.refresh", format!("{name}: out-of-band fetch"));
}

pub fn log_poll_discard(name: &str, seq: u64, reason: &str) {
    log_line("poll.discard", format!("{name}: dropped resolution #{seq} ({reason})"));
}

/// First five failures of a poller are logged, then every twentieth.
pub fn log_poll_failure(name: &'static str, err: &ClientError) {
    static COUNTS: OnceLock<Mutex<HashMap<&'static str, u64>>> = OnceLock::new();
    let counts = COUNTS.get_or_init(|| Mutex::new(HashMap::new()));
    let n = match counts.lock() {
        Ok(mut guard) => {
            let n = guard.entry(name).or_insert(0);
            *n += 1;
            *n
        }
        Err(_) => 1,
    };
    if n <= 5 || n % 20 == 0 {
        tracing::warn!(target: "botdash::hooks", topic = "poll.error", "{name}: fetch failed (#{n}): {err}");
    }
}

pub fn log_selection_reset(from: &str, to: &str, generation: u64) {
    log_line(
        "feed.reset",
        format!("selection {from} -> {to}; dropping candles, generation={generation}"),
    );
}

pub fn log_feed_skip(reason: &str, detail: impl AsRef<str>) {
    log_line("feed.skip", format!("{} | {}", reason, detail.as_ref()));
}

pub fn log_candles_unordered(received: usize, kept: usize) {
    log_line(
        "feed.normalize",
        format!("candles not strictly increasing; received={received} kept={kept}"),
    );
}

pub fn log_command(action: &str, outcome: impl AsRef<str>) {
    tracing::info!(target: "botdash::hooks", topic = "command", "{action}: {}", outcome.as_ref());
}
