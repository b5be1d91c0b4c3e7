//! In-memory trading service shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use botdash::{Dashboard, Settings};
use botdash_client::{
    Ack, Balance, BotHandle, BotId, Candle, ClientError, Interval, LaunchAck, LaunchRequest, StatusReport,
    Strategy, TradingApi, Trade,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

type Pair = (String, Interval);

#[derive(Default)]
struct Server {
    bots: Vec<BotHandle>,
    bots_error: Option<ClientError>,
    candles: HashMap<Pair, Vec<Candle>>,
    trades: Vec<Trade>,
    balances: Vec<Balance>,
    status: Option<Result<StatusReport, ClientError>>,
    start_error: Option<ClientError>,
    stop_errors: HashMap<BotId, ClientError>,
    kline_gates: HashMap<Pair, watch::Receiver<bool>>,
    start_gate: Option<watch::Receiver<bool>>,
    next_id: u32,
}

#[derive(Default)]
pub struct Calls {
    pub active_bots: AtomicUsize,
    pub start_bot: AtomicUsize,
    pub stop_bot: AtomicUsize,
    pub klines: AtomicUsize,
    pub trades: AtomicUsize,
    pub balances: AtomicUsize,
    pub status: AtomicUsize,
}

/// Scripted stand-in for the trading service. Launch and stop mutate the
/// fake's bot list the way the real service does.
#[derive(Default)]
pub struct FakeApi {
    server: Mutex<Server>,
    pub calls: Calls,
}

/// Keeps held requests pending until released.
pub struct Gate(watch::Sender<bool>);

impl Gate {
    pub fn release(&self) {
        let _ = self.0.send(true);
    }
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with<R>(&self, f: impl FnOnce(&mut Server) -> R) -> R {
        f(&mut self.server.lock().unwrap())
    }

    pub fn set_bots(&self, bots: Vec<BotHandle>) {
        self.with(|s| s.bots = bots);
    }

    pub fn fail_bots(&self, err: Option<ClientError>) {
        self.with(|s| s.bots_error = err);
    }

    pub fn set_candles(&self, symbol: &str, interval: Interval, candles: Vec<Candle>) {
        self.with(|s| s.candles.insert((symbol.to_string(), interval), candles));
    }

    pub fn set_trades(&self, trades: Vec<Trade>) {
        self.with(|s| s.trades = trades);
    }

    pub fn set_balances(&self, balances: Vec<Balance>) {
        self.with(|s| s.balances = balances);
    }

    pub fn set_status(&self, status: Result<StatusReport, ClientError>) {
        self.with(|s| s.status = Some(status));
    }

    pub fn fail_start(&self, err: ClientError) {
        self.with(|s| s.start_error = Some(err));
    }

    pub fn fail_stop(&self, id: &str, err: ClientError) {
        self.with(|s| s.stop_errors.insert(BotId::new(id), err));
    }

    pub fn hold_klines(&self, symbol: &str, interval: Interval) -> Gate {
        let (tx, rx) = watch::channel(false);
        self.with(|s| s.kline_gates.insert((symbol.to_string(), interval), rx));
        Gate(tx)
    }

    pub fn hold_start(&self) -> Gate {
        let (tx, rx) = watch::channel(false);
        self.with(|s| s.start_gate = Some(rx));
        Gate(tx)
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TradingApi for FakeApi {
    async fn active_bots(&self) -> Result<Vec<BotHandle>, ClientError> {
        self.calls.active_bots.fetch_add(1, Ordering::SeqCst);
        self.with(|s| match &s.bots_error {
            Some(err) => Err(err.clone()),
            None => Ok(s.bots.clone()),
        })
    }

    async fn start_bot(&self, request: &LaunchRequest) -> Result<LaunchAck, ClientError> {
        self.calls.start_bot.fetch_add(1, Ordering::SeqCst);
        let gate = self.with(|s| s.start_gate.clone());
        if let Some(mut gate) = gate {
            let _ = gate.wait_for(|open| *open).await;
        }
        self.with(|s| {
            if let Some(err) = &s.start_error {
                return Err(err.clone());
            }
            s.next_id += 1;
            let id = BotId::new(format!("{:08x}-{}", s.next_id, request.symbol.to_lowercase()));
            s.bots.push(BotHandle {
                id: id.clone(),
                symbol: request.symbol.clone(),
                strategy: request.strategy.clone(),
                running: true,
            });
            Ok(LaunchAck {
                bot_id: Some(id),
                message: Some(format!("Bot started for {}", request.symbol)),
            })
        })
    }

    async fn stop_bot(&self, id: &BotId) -> Result<Ack, ClientError> {
        self.calls.stop_bot.fetch_add(1, Ordering::SeqCst);
        self.with(|s| {
            if let Some(err) = s.stop_errors.get(id) {
                return Err(err.clone());
            }
            let before = s.bots.len();
            s.bots.retain(|b| &b.id != id);
            if s.bots.len() == before {
                return Err(ClientError::Http {
                    status: 404,
                    message: "Bot not found".into(),
                });
            }
            Ok(Ack {
                message: Some(format!("Bot {id} stopped")),
            })
        })
    }

    async fn klines(&self, symbol: &str, interval: Interval) -> Result<Vec<Candle>, ClientError> {
        self.calls.klines.fetch_add(1, Ordering::SeqCst);
        let pair = (symbol.to_string(), interval);
        let gate = self.with(|s| s.kline_gates.get(&pair).cloned());
        if let Some(mut gate) = gate {
            let _ = gate.wait_for(|open| *open).await;
        }
        Ok(self.with(|s| s.candles.get(&pair).cloned().unwrap_or_default()))
    }

    async fn trades(&self) -> Result<Vec<Trade>, ClientError> {
        self.calls.trades.fetch_add(1, Ordering::SeqCst);
        Ok(self.with(|s| s.trades.clone()))
    }

    async fn status(&self) -> Result<StatusReport, ClientError> {
        self.calls.status.fetch_add(1, Ordering::SeqCst);
        self.with(|s| {
            s.status.clone().unwrap_or_else(|| {
                Ok(StatusReport {
                    status: Some("running".into()),
                    exchange_connection: Some("ok".into()),
                })
            })
        })
    }

    async fn balances(&self) -> Result<Vec<Balance>, ClientError> {
        self.calls.balances.fetch_add(1, Ordering::SeqCst);
        Ok(self.with(|s| s.balances.clone()))
    }
}

pub fn bot(id: &str, symbol: &str, strategy: Strategy) -> BotHandle {
    BotHandle {
        id: BotId::new(id),
        symbol: symbol.into(),
        strategy,
        running: true,
    }
}

/// `n` one-minute candles starting at `start` with closes `base`, `base + 1`, ...
pub fn candles(start: i64, n: usize, base: f64) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let close = base + i as f64;
            Candle {
                time: start + 60 * i as i64,
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
            }
        })
        .collect()
}

pub fn dashboard(api: &Arc<FakeApi>) -> Dashboard {
    let api: Arc<dyn TradingApi> = api.clone();
    Dashboard::new(api, Settings::default())
}

/// Lets spawned fetches finish, then applies every queued event.
pub async fn settle(dash: &mut Dashboard) -> usize {
    tokio::time::sleep(Duration::from_millis(10)).await;
    dash.drain_events()
}

/// Moves the paused clock forward and applies what arrived.
pub async fn advance(dash: &mut Dashboard, by: Duration) -> usize {
    tokio::time::sleep(by).await;
    settle(dash).await
}
