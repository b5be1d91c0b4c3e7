pub mod commands;
pub mod event;
pub mod reducer;
pub mod render;
pub mod state;

pub use event::*;
pub use state::*;

use crate::debug_hooks;
use crate::exec::{CommandClient, CommandError};
use crate::health::ConnectionStatus;
use crate::market::Selection;
use crate::poller::{self, PollHandle};
use crate::settings::Settings;
use botdash_client::{BotId, ClientError, TradingApi};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct Pollers {
    bots: Option<PollHandle>,
    candles: Option<PollHandle>,
    trades: Option<PollHandle>,
    balances: Option<PollHandle>,
    status: Option<PollHandle>,
}

impl Pollers {
    fn cancel_all(&mut self) {
        for handle in [
            self.bots.take(),
            self.candles.take(),
            self.trades.take(),
            self.balances.take(),
            self.status.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.cancel();
        }
    }
}

/// Owns the view-state, the pollers feeding it and the command client.
///
/// Poller resolutions arrive as [`AppEvent`]s on an internal channel; the
/// owner pumps them through [`Dashboard::next_event`] / [`Dashboard::drain_events`]
/// and [`Dashboard::handle_event`], which is the only writer of [`AppState`].
pub struct Dashboard {
    pub state: AppState,
    api: Arc<dyn TradingApi>,
    commands: CommandClient,
    settings: Settings,
    tx: mpsc::UnboundedSender<AppEvent>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
    pollers: Pollers,
    started: bool,
    dirty: bool,
}

impl Dashboard {
    pub fn new(api: Arc<dyn TradingApi>, settings: Settings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::new(settings.initial_selection(), settings.initial_form()),
            commands: CommandClient::new(Arc::clone(&api)),
            api,
            settings,
            tx,
            rx,
            pollers: Pollers::default(),
            started: false,
            dirty: true,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Starts every poller and the health probe. Must run inside a tokio
    /// runtime. Calling it twice does nothing.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        self.pollers.bots = Some(self.spawn_poller(
            "bots",
            self.settings.bots_poll(),
            |api| async move { api.active_bots().await },
            |bots| FeedEvent::BotsLoaded { bots },
            |error| FeedEvent::BotsFailed { error },
        ));
        self.pollers.candles = Some(self.spawn_candles_poller());
        self.pollers.trades = Some(self.spawn_poller(
            "trades",
            self.settings.trades_poll(),
            |api| async move { api.trades().await },
            |trades| FeedEvent::TradesLoaded { trades },
            |error| FeedEvent::TradesFailed { error },
        ));
        self.pollers.balances = Some(self.spawn_poller(
            "balances",
            self.settings.balances_poll(),
            |api| async move { api.balances().await },
            |balances| FeedEvent::BalancesLoaded { balances },
            |error| FeedEvent::BalancesFailed { error },
        ));

        match self.settings.status_poll() {
            Some(every) => {
                let exchange = self.settings.exchange_name.clone();
                self.pollers.status = Some(self.spawn_poller(
                    "status",
                    every,
                    |api| async move { api.status().await },
                    move |report| FeedEvent::StatusProbed {
                        status: ConnectionStatus::from_probe(&Ok(report), &exchange),
                    },
                    |_| FeedEvent::StatusProbed {
                        status: ConnectionStatus::Error,
                    },
                ));
            }
            None => self.probe_status(),
        }
    }

    /// Cancels every poller. In-flight fetches resolve into nothing.
    pub fn shutdown(&mut self) {
        self.pollers.cancel_all();
        self.started = false;
    }

    /// One-shot health probe.
    pub fn probe_status(&self) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let exchange = self.settings.exchange_name.clone();
        tokio::spawn(async move {
            let result = api.status().await;
            if let Err(err) = &result {
                tracing::warn!("health probe failed: {err}");
            }
            let status = ConnectionStatus::from_probe(&result, &exchange);
            let _ = tx.send(AppEvent::Feed(FeedEvent::StatusProbed { status }));
        });
    }

    /// Switches the chart to `selection`: clears the candles, cancels the
    /// candle poller and starts a new one. Returns `false` if nothing changed.
    pub fn select(&mut self, selection: Selection) -> bool {
        if selection.symbol.is_empty() {
            self.handle_event(AppEvent::Ui(UiEvent::SelectionChanged { selection }));
            return false;
        }
        if &selection == self.state.selection() {
            return false;
        }

        if let Some(old) = self.pollers.candles.take() {
            old.cancel();
        }
        self.handle_event(AppEvent::Ui(UiEvent::SelectionChanged { selection }));
        if self.started {
            self.pollers.candles = Some(self.spawn_candles_poller());
        }
        true
    }

    pub fn select_symbol(&mut self, symbol: &str) -> bool {
        let interval = self.state.selection().interval;
        self.select(Selection::new(symbol, interval))
    }

    pub fn cycle_chart_interval(&mut self) -> bool {
        let current = self.state.selection();
        let next = current.with_interval(current.interval.next());
        self.select(next)
    }

    /// Validates the launch form and sends it. The request runs on its own
    /// task; the outcome comes back as an [`ExecEvent`] and a success
    /// refreshes the bot registry when it is handled.
    ///
    /// Only validation and a launch already in flight are reported here.
    pub fn launch_bot(&mut self) -> Result<(), CommandError> {
        if self.state.launching {
            return Err(CommandError::InFlight);
        }
        let request = match self.commands.prepare_launch(&self.state.form) {
            Ok(request) => request,
            Err(err) => {
                self.handle_event(AppEvent::Exec(ExecEvent::LaunchFailed {
                    reason: err.to_string(),
                }));
                return Err(err);
            }
        };
        self.handle_event(AppEvent::Exec(ExecEvent::LaunchSubmitted));

        let commands = self.commands.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let ev = match commands.launch(&request).await {
                Ok(ack) => ExecEvent::LaunchSucceeded {
                    symbol: request.symbol,
                    bot_id: ack.bot_id,
                },
                Err(err) => ExecEvent::LaunchFailed {
                    reason: err.to_string(),
                },
            };
            let _ = tx.send(AppEvent::Exec(ev));
        });
        Ok(())
    }

    /// Sends a stop for bot `id` on its own task. The registry is never
    /// edited locally: a success refreshes it, a failure leaves the bot
    /// listed as it was.
    pub fn stop_bot(&mut self, id: BotId) -> Result<(), CommandError> {
        if self.state.stopping.is_some() {
            return Err(CommandError::InFlight);
        }
        self.handle_event(AppEvent::Exec(ExecEvent::StopSubmitted { id: id.clone() }));

        let commands = self.commands.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let ev = match commands.stop(&id).await {
                Ok(_) => ExecEvent::StopSucceeded { id },
                Err(err) => ExecEvent::StopFailed {
                    id: Some(id),
                    reason: err.to_string(),
                },
            };
            let _ = tx.send(AppEvent::Exec(ev));
        });
        Ok(())
    }

    pub fn stop_highlighted(&mut self) -> Result<(), CommandError> {
        let Some(id) = self.state.registry.highlighted().map(|b| b.id.clone()) else {
            let err = CommandError::MissingTarget;
            self.handle_event(AppEvent::Exec(ExecEvent::StopFailed {
                id: None,
                reason: err.to_string(),
            }));
            return Err(err);
        };
        self.stop_bot(id)
    }

    /// Out-of-band registry fetch. Returns `false` when not started.
    pub fn refresh_bots(&self) -> bool {
        self.pollers.bots.as_ref().is_some_and(PollHandle::refresh_now)
    }

    pub fn handle_event(&mut self, ev: AppEvent) {
        let invalidates_bots = matches!(
            ev,
            AppEvent::Exec(ExecEvent::LaunchSucceeded { .. } | ExecEvent::StopSucceeded { .. })
        );
        if reducer::reduce(&mut self.state, ev) {
            self.dirty = true;
        }
        if invalidates_bots {
            self.refresh_bots();
        }
    }

    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }

    /// Applies every queued event. Returns how many there were.
    pub fn drain_events(&mut self) -> usize {
        let mut n = 0;
        while let Ok(ev) = self.rx.try_recv() {
            self.handle_event(ev);
            n += 1;
        }
        n
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns the dirty flag and clears it.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn spawn_candles_poller(&self) -> PollHandle {
        let selection = self.state.selection().clone();
        let generation = self.state.feed.generation();
        let for_fetch = selection.clone();
        let for_ok = selection.clone();
        let for_err = selection;

        self.spawn_poller(
            "candles",
            self.settings.candles_poll(),
            move |api| {
                let selection = for_fetch.clone();
                async move { api.klines(&selection.symbol, selection.interval).await }
            },
            move |candles| FeedEvent::CandlesLoaded {
                generation,
                selection: for_ok.clone(),
                candles,
            },
            move |error| FeedEvent::CandlesFailed {
                generation,
                selection: for_err.clone(),
                error,
            },
        )
    }

    fn spawn_poller<T, F, Fut, S, E>(
        &self,
        name: &'static str,
        every: Duration,
        fetch: F,
        on_success: S,
        on_error: E,
    ) -> PollHandle
    where
        T: Send + 'static,
        F: Fn(Arc<dyn TradingApi>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
        S: Fn(T) -> FeedEvent + Send + Sync + 'static,
        E: Fn(ClientError) -> FeedEvent + Send + Sync + 'static,
    {
        let api = Arc::clone(&self.api);
        let ok_tx = self.tx.clone();
        let err_tx = self.tx.clone();
        poller::start(
            name,
            every,
            move || fetch(Arc::clone(&api)),
            move |value| {
                let _ = ok_tx.send(AppEvent::Feed(on_success(value)));
            },
            move |error| {
                debug_hooks::log_poll_failure(name, &error);
                let _ = err_tx.send(AppEvent::Feed(on_error(error)));
            },
        )
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.pollers.cancel_all();
    }
}
