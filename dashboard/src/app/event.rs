use super::state::InputField;
use crate::health::ConnectionStatus;
use crate::market::Selection;
use botdash_client::{Balance, BotHandle, BotId, Candle, ClientError};

#[derive(Debug, Clone)]
pub enum AppEvent {
    Ui(UiEvent),
    Feed(FeedEvent),
    Exec(ExecEvent),
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    SelectionChanged { selection: Selection },
    HighlightMoved { delta: isize },

    InputStarted { field: InputField },
    InputChar { ch: char },
    InputBackspace,
    InputCancelled,
    /// Enter on a launch form field; the chart symbol goes through
    /// `SelectionChanged` instead.
    InputCommitted,

    LaunchStrategyCycled,
    LaunchIntervalCycled,
}

/// Poller resolutions. Candle events carry the generation they were fetched
/// for.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    BotsLoaded { bots: Vec<BotHandle> },
    BotsFailed { error: ClientError },

    CandlesLoaded {
        generation: u64,
        selection: Selection,
        candles: Vec<Candle>,
    },
    CandlesFailed {
        generation: u64,
        selection: Selection,
        error: ClientError,
    },

    TradesLoaded { trades: Vec<botdash_client::Trade> },
    TradesFailed { error: ClientError },

    BalancesLoaded { balances: Vec<Balance> },
    BalancesFailed { error: ClientError },

    StatusProbed { status: ConnectionStatus },
}

#[derive(Debug, Clone)]
pub enum ExecEvent {
    LaunchSubmitted,
    LaunchSucceeded {
        symbol: String,
        bot_id: Option<BotId>,
    },
    LaunchFailed { reason: String },

    StopSubmitted { id: BotId },
    StopSucceeded { id: BotId },
    StopFailed { id: Option<BotId>, reason: String },
}
