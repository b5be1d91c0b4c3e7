//! Terminal dashboard for trading bots.
//!
//! Several pollers keep the view-state (active bots, chart candles, trade
//! history, balances, connection status) in step with the trading service,
//! while launch/stop commands go through [`exec::CommandClient`]. The
//! [`app::Dashboard`] coordinator ties them together.

pub mod app;
pub mod balances;
pub mod debug_hooks;
pub mod exec;
pub mod health;
pub mod ledger;
pub mod market;
pub mod poller;
pub mod registry;
pub mod settings;

pub use app::{AppEvent, AppState, Dashboard};
pub use market::{FeedStatus, MarketFeed, Selection};
pub use settings::Settings;
