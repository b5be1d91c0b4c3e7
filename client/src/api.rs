use crate::error::ClientError;
use crate::types::{Ack, Balance, BotHandle, BotId, Candle, Interval, LaunchAck, LaunchRequest, StatusReport, Trade};
use async_trait::async_trait;

/// Paths of the trading service HTTP API.
pub mod paths {
    pub const ACTIVE_BOTS: &str = "/api/bots/active";
    pub const START_BOT: &str = "/api/bot/start";
    /// Followed by the bot id as one more segment.
    pub const STOP_BOT: &str = "/api/bot/stop";
    pub const KLINES: &str = "/api/klines";
    pub const TRADES: &str = "/api/trades";
    pub const STATUS: &str = "/api/status";
    pub const BALANCE: &str = "/api/balance";
}

/// The trading service as seen by the dashboard.
///
/// Every call is a single request/response; no retries happen at this level.
#[async_trait]
pub trait TradingApi: Send + Sync {
    async fn active_bots(&self) -> Result<Vec<BotHandle>, ClientError>;

    async fn start_bot(&self, request: &LaunchRequest) -> Result<LaunchAck, ClientError>;

    async fn stop_bot(&self, id: &BotId) -> Result<Ack, ClientError>;

    async fn klines(&self, symbol: &str, interval: Interval) -> Result<Vec<Candle>, ClientError>;

    async fn trades(&self) -> Result<Vec<Trade>, ClientError>;

    async fn status(&self) -> Result<StatusReport, ClientError>;

    async fn balances(&self) -> Result<Vec<Balance>, ClientError>;
}
