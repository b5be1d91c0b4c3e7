//! Fixed-cadence fetch loop with last-issued-wins delivery.
//!
//! A poller issues one fetch immediately and then one per interval, measured
//! from initiation: a slow fetch never delays the next one. Every fetch gets a
//! sequence number; a resolution is delivered only if nothing issued after it
//! has been delivered already, so the consumer never sees a snapshot older
//! than one it already applied. After cancellation nothing is delivered.

use crate::debug_hooks;
use botdash_client::ClientError;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Shortest cadence a poller will run at.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Owner side of a running poller. Dropping it cancels the poller.
#[derive(Debug)]
pub struct PollHandle {
    name: &'static str,
    cancel: CancellationToken,
    refresh: mpsc::UnboundedSender<()>,
}

impl PollHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stops scheduling and discards any in-flight resolution. Idempotent.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            debug_hooks::log_poller_cancel(self.name);
        }
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Issues one extra fetch now without moving the cadence. Returns `false`
    /// if the poller is already gone.
    pub fn refresh_now(&self) -> bool {
        !self.cancel.is_cancelled() && self.refresh.send(()).is_ok()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Delivery<S, E> {
    name: &'static str,
    cancel: CancellationToken,
    last_delivered: Mutex<u64>,
    on_success: S,
    on_error: E,
}

impl<S, E> Delivery<S, E> {
    fn deliver<T>(&self, seq: u64, result: Result<T, ClientError>)
    where
        S: Fn(T),
        E: Fn(ClientError),
    {
        // Held across the callback so two resolutions can't interleave.
        let mut last = self.last_delivered.lock().unwrap_or_else(PoisonError::into_inner);
        if self.cancel.is_cancelled() {
            debug_hooks::log_poll_discard(self.name, seq, "cancelled");
            return;
        }
        if seq <= *last {
            debug_hooks::log_poll_discard(self.name, seq, "superseded");
            return;
        }
        *last = seq;
        match result {
            Ok(value) => (self.on_success)(value),
            Err(err) => (self.on_error)(err),
        }
    }
}

/// Starts a poller on the current tokio runtime.
///
/// `fetch` is called once per tick; `on_success` / `on_error` receive the
/// resolutions that survive the sequence check. Intervals below
/// [`MIN_INTERVAL`] are raised to it.
pub fn start<T, F, Fut, S, E>(
    name: &'static str,
    every: Duration,
    fetch: F,
    on_success: S,
    on_error: E,
) -> PollHandle
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    S: Fn(T) + Send + Sync + 'static,
    E: Fn(ClientError) + Send + Sync + 'static,
{
    let every = every.max(MIN_INTERVAL);
    let cancel = CancellationToken::new();
    let (refresh_tx, mut refresh_rx) = mpsc::unbounded_channel::<()>();
    let delivery = Arc::new(Delivery {
        name,
        cancel: cancel.clone(),
        last_delivered: Mutex::new(0),
        on_success,
        on_error,
    });

    debug_hooks::log_poller_start(name, every);

    let token = cancel.clone();
    tokio::spawn(async move {
        let mut ticker = time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut seq: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
                Some(()) = refresh_rx.recv() => debug_hooks::log_poll_refresh(name),
            }

            seq += 1;
            let request = fetch();
            let delivery = Arc::clone(&delivery);
            let token = token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    result = request => delivery.deliver(seq, result),
                    _ = token.cancelled() => debug_hooks::log_poll_discard(name, seq, "cancelled"),
                }
            });
        }
    });

    PollHandle {
        name,
        cancel,
        refresh: refresh_tx,
    }
}
