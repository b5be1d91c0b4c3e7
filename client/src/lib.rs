//! Asynchronous client for the trading bot service.
//!
//! The service exposes a small request/response HTTP API: list, start and stop
//! bots, read candles, trades, balances and a health probe. [`TradingApi`] is
//! the seam the dashboard is written against; [`HttpTradingApi`] is the
//! reqwest-backed implementation.

mod api;
mod error;
mod http;
mod types;

pub use api::{paths, TradingApi};
pub use error::ClientError;
pub use http::{HttpTradingApi, DEFAULT_TIMEOUT};
pub use types::{
    Ack, Balance, BotHandle, BotId, Candle, Interval, LaunchAck, LaunchRequest, Side, StatusReport, Strategy,
    Trade,
};
