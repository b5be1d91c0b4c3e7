use bigdecimal::{BigDecimal, Zero};
use botdash_client::{ClientError, Interval, LaunchRequest, Strategy};
use thiserror::Error;

/// The operator's pending launch input. Kept as typed so a bad quantity is
/// only reported when the launch is submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchForm {
    pub symbol: String,
    pub interval: Interval,
    pub strategy: Strategy,
    pub quantity: String,
}

impl Default for LaunchForm {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            interval: Interval::OneMinute,
            strategy: Strategy::MaCrossover,
            quantity: "0.001".to_string(),
        }
    }
}

impl LaunchForm {
    /// Checks the form and builds the request body. Nothing is sent.
    pub fn validate(&self) -> Result<LaunchRequest, ValidationError> {
        let symbol = self.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        if let Strategy::Other(name) = &self.strategy {
            return Err(ValidationError::UnsupportedStrategy(name.clone()));
        }

        let raw = self.quantity.trim();
        let quantity: BigDecimal = raw
            .parse()
            .map_err(|_| ValidationError::InvalidQuantity(raw.to_string()))?;
        if quantity <= BigDecimal::zero() {
            return Err(ValidationError::NonPositiveQuantity);
        }

        Ok(LaunchRequest {
            symbol,
            interval: self.interval,
            strategy: self.strategy.clone(),
            quantity,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("symbol must not be empty")]
    EmptySymbol,
    #[error("quantity {0:?} is not a number")]
    InvalidQuantity(String),
    #[error("quantity must be > 0")]
    NonPositiveQuantity,
    #[error("strategy {0} cannot be launched")]
    UnsupportedStrategy(String),
}

#[derive(Debug, Clone, Error)]
pub enum CommandError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("{action} failed: {source}")]
    Rejected {
        action: &'static str,
        #[source]
        source: ClientError,
    },

    #[error("no bot selected")]
    MissingTarget,

    #[error("a previous command is still pending")]
    InFlight,
}

impl CommandError {
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            CommandError::Rejected { source, .. } => Some(source),
            _ => None,
        }
    }
}
