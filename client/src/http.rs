//! reqwest implementation of [`TradingApi`].

use crate::api::{paths, TradingApi};
use crate::error::ClientError;
use crate::types::{
    Ack, Balance, BotHandle, BotId, Candle, ErrorBody, Interval, LaunchAck, LaunchRequest, StatusReport, Trade,
};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the trading service.
///
/// Every request carries the timeout given at construction, so a hung
/// connection surfaces as [`ClientError::Timeout`] instead of stalling a poll.
#[derive(Debug, Clone)]
pub struct HttpTradingApi {
    client: Client,
    base: Url,
}

impl HttpTradingApi {
    /// Build a client for `base_url` (e.g. `http://localhost:5001`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base = Url::parse(base_url.trim().trim_end_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        Ok(Self { client, base })
    }

    pub fn with_default_timeout(base_url: &str) -> Result<Self, ClientError> {
        Self::new(base_url, DEFAULT_TIMEOUT)
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Joins `path` onto the base url. `tail` is appended as one extra,
    /// percent-encoded segment.
    fn url(&self, path: &str, tail: Option<&str>) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl(self.base.to_string()))?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
            if let Some(tail) = tail {
                segments.push(tail);
            }
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        log::debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let url = response.url().clone();
    let body = response.text().await?;
    interpret(&url, status, &body)
}

/// Maps a finished response onto the call's result. Non-2xx bodies yield
/// their `error` field, or the raw text when there is none.
fn interpret<T: DeserializeOwned>(url: &Url, status: StatusCode, body: &str) -> Result<T, ClientError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| body.trim().to_string());
        log::warn!("{url} -> {status}: {message}");
        return Err(ClientError::Http {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(body).map_err(|e| {
        log::warn!("{url}: undecodable body: {e}");
        ClientError::from(e)
    })
}

#[async_trait]
impl TradingApi for HttpTradingApi {
    async fn active_bots(&self) -> Result<Vec<BotHandle>, ClientError> {
        self.get(self.url(paths::ACTIVE_BOTS, None)?).await
    }

    async fn start_bot(&self, request: &LaunchRequest) -> Result<LaunchAck, ClientError> {
        let url = self.url(paths::START_BOT, None)?;
        log::debug!("POST {url} symbol={} strategy={}", request.symbol, request.strategy);
        let response = self.client.post(url).json(request).send().await?;
        decode(response).await
    }

    async fn stop_bot(&self, id: &BotId) -> Result<Ack, ClientError> {
        let url = self.url(paths::STOP_BOT, Some(id.as_str()))?;
        log::debug!("POST {url}");
        let response = self.client.post(url).send().await?;
        decode(response).await
    }

    async fn klines(&self, symbol: &str, interval: Interval) -> Result<Vec<Candle>, ClientError> {
        let mut url = self.url(paths::KLINES, None)?;
        url.query_pairs_mut()
            .append_pair("symbol", symbol)
            .append_pair("interval", interval.as_str());
        self.get(url).await
    }

    async fn trades(&self) -> Result<Vec<Trade>, ClientError> {
        self.get(self.url(paths::TRADES, None)?).await
    }

    async fn status(&self) -> Result<StatusReport, ClientError> {
        self.get(self.url(paths::STATUS, None)?).await
    }

    async fn balances(&self) -> Result<Vec<Balance>, ClientError> {
        self.get(self.url(paths::BALANCE, None)?).await
    }
}
