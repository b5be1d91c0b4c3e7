use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, EnumString, IntoEnumIterator};

/// Server-assigned bot identifier. Opaque to the client.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display, derive_more::From,
)]
#[serde(transparent)]
pub struct BotId(String);

impl BotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters followed by `...`, the way the bots table shows ids.
    pub fn short(&self) -> String {
        let head: String = self.0.chars().take(8).collect();
        if head.len() < self.0.len() {
            format!("{head}...")
        } else {
            head
        }
    }
}

impl From<&str> for BotId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Strategy a bot runs.
///
/// The service accepts the snake-case names on launch but reports running bots
/// by strategy class name, so both spellings parse. Anything else is kept
/// verbatim rather than failing the whole snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Strategy {
    MaCrossover,
    BollingerBands,
    Other(String),
}

impl Strategy {
    pub fn as_str(&self) -> &str {
        match self {
            Strategy::MaCrossover => "ma_crossover",
            Strategy::BollingerBands => "bollinger_bands",
            Strategy::Other(name) => name,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Strategy::MaCrossover => "Moving Average Crossover",
            Strategy::BollingerBands => "Bollinger Bands",
            Strategy::Other(name) => name,
        }
    }

    /// Next launchable strategy; `Other` wraps back to the first one.
    pub fn next(&self) -> Strategy {
        match self {
            Strategy::MaCrossover => Strategy::BollingerBands,
            Strategy::BollingerBands | Strategy::Other(_) => Strategy::MaCrossover,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s {
            "ma_crossover" | "MovingAverageCrossover" => Strategy::MaCrossover,
            "bollinger_bands" | "BollingerBands" => Strategy::BollingerBands,
            other => Strategy::Other(other.to_string()),
        })
    }
}

impl Serialize for Strategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Strategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.parse() {
            Ok(strategy) => Ok(strategy),
            Err(never) => match never {},
        }
    }
}

/// Candle interval supported by the dashboard.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    strum::Display,
    strum::IntoStaticStr,
)]
pub enum Interval {
    #[default]
    #[serde(rename = "1m")]
    #[strum(serialize = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    #[strum(serialize = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    #[strum(serialize = "15m")]
    FifteenMinutes,
}

impl Interval {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn next(self) -> Interval {
        Interval::iter()
            .cycle()
            .skip_while(|iv| *iv != self)
            .nth(1)
            .unwrap_or_default()
    }
}

/// One active bot as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "strict-serde", serde(deny_unknown_fields))]
pub struct BotHandle {
    #[serde(alias = "bot_id")]
    pub id: BotId,
    pub symbol: String,
    pub strategy: Strategy,
    #[serde(alias = "is_running")]
    pub running: bool,
}

/// One OHLC bar. `time` is the bar open in whole seconds since the epoch (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "strict-serde", serde(deny_unknown_fields))]
pub struct Candle {
    #[serde(deserialize_with = "de_epoch_secs")]
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

// The service divides millisecond open times by 1000, so `time` may arrive as
// a float.
fn de_epoch_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(secs) => Ok(secs),
        Raw::Float(secs) if secs.is_finite() => Ok(secs.trunc() as i64),
        Raw::Float(secs) => Err(de::Error::custom(format!("invalid candle time {secs}"))),
    }
}

// Prices and sizes come back as JSON floats (or strings from the exchange
// passthrough). Floats are read through their shortest round-trip text so
// `0.001` stays `0.001` instead of its binary expansion.
fn de_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigDecimal, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(v) => Ok(BigDecimal::from(v)),
        Raw::Float(v) if v.is_finite() => BigDecimal::from_str(&v.to_string()).map_err(de::Error::custom),
        Raw::Float(v) => Err(de::Error::custom(format!("invalid decimal {v}"))),
        Raw::Text(v) => BigDecimal::from_str(v.trim()).map_err(de::Error::custom),
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, strum::Display,
)]
pub enum Side {
    #[serde(rename = "BUY", alias = "buy")]
    #[strum(serialize = "BUY")]
    Buy,
    #[serde(rename = "SELL", alias = "sell")]
    #[strum(serialize = "SELL")]
    Sell,
}

/// An executed trade from the service's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "strict-serde", serde(deny_unknown_fields))]
pub struct Trade {
    pub id: i64,
    pub timestamp: String,
    pub symbol: String,
    pub side: Side,
    #[serde(deserialize_with = "de_decimal")]
    pub price: BigDecimal,
    #[serde(deserialize_with = "de_decimal")]
    pub quantity: BigDecimal,
    pub strategy: String,
}

impl Trade {
    /// Parses `timestamp`. Offset-less values are taken as UTC.
    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.timestamp.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}

/// Body of `POST /api/bot/start`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchRequest {
    pub symbol: String,
    pub interval: Interval,
    pub strategy: Strategy,
    #[serde(serialize_with = "ser_decimal_as_number")]
    pub quantity: BigDecimal,
}

fn ser_decimal_as_number<S: Serializer>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
    match value.to_f64() {
        Some(v) if v.is_finite() => serializer.serialize_f64(v),
        _ => Err(serde::ser::Error::custom(format!("quantity {value} is not representable"))),
    }
}

/// Launch acknowledgement. The service answers `{message, bot_id}`; a full
/// `BotHandle` body also decodes because `id` is accepted too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LaunchAck {
    #[serde(default, alias = "id")]
    pub bot_id: Option<BotId>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /api/status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "binance_connection")]
    pub exchange_connection: Option<String>,
}

impl StatusReport {
    pub fn exchange_ok(&self) -> bool {
        self.exchange_connection
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("ok"))
    }
}

/// One non-zero asset balance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Balance {
    pub asset: String,
    #[serde(deserialize_with = "de_decimal")]
    pub free: BigDecimal,
    #[serde(deserialize_with = "de_decimal")]
    pub locked: BigDecimal,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
