use crate::balances::Balances;
use crate::exec::LaunchForm;
use crate::health::ConnectionStatus;
use crate::ledger::TradeLedger;
use crate::market::{MarketFeed, Selection};
use crate::registry::BotRegistry;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// How many notices are kept.
pub const NOTICE_CAP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub at: DateTime<Utc>,
    pub level: NoticeLevel,
    pub text: String,
}

/// Which text field the key handler is currently typing into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    ChartSymbol,
    LaunchSymbol,
    LaunchQuantity,
}

impl InputField {
    pub fn label(self) -> &'static str {
        match self {
            InputField::ChartSymbol => "Chart symbol",
            InputField::LaunchSymbol => "Launch symbol",
            InputField::LaunchQuantity => "Launch quantity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputState {
    pub field: InputField,
    pub buffer: String,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: BotRegistry,
    pub feed: MarketFeed,
    pub ledger: TradeLedger,
    pub balances: Balances,
    pub connection: ConnectionStatus,

    pub form: LaunchForm,
    pub launching: bool,
    /// Bot whose stop request is in flight.
    pub stopping: Option<botdash_client::BotId>,

    pub input: Option<InputState>,
    pub notices: VecDeque<Notice>,
}

impl AppState {
    pub fn new(selection: Selection, form: LaunchForm) -> Self {
        Self {
            registry: BotRegistry::default(),
            feed: MarketFeed::new(selection),
            ledger: TradeLedger::default(),
            balances: Balances::default(),
            connection: ConnectionStatus::Unknown,
            form,
            launching: false,
            stopping: None,
            input: None,
            notices: VecDeque::new(),
        }
    }

    pub fn selection(&self) -> &Selection {
        self.feed.selection()
    }

    pub fn push_notice(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notices.push_back(Notice {
            at: Utc::now(),
            level,
            text: text.into(),
        });
        while self.notices.len() > NOTICE_CAP {
            self.notices.pop_front();
        }
    }

    pub fn latest_notice(&self) -> Option<&Notice> {
        self.notices.back()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(
            Selection::new("BTCUSDT", botdash_client::Interval::OneMinute),
            LaunchForm::default(),
        )
    }
}
