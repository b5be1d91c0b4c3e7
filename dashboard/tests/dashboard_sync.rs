//! End-to-end behaviour of the dashboard against an in-memory service.

mod common;

use botdash::app::NoticeLevel;
use botdash::exec::{CommandError, ValidationError};
use botdash::health::ConnectionStatus;
use botdash::{Dashboard, FeedStatus, Selection, Settings};
use botdash_client::{BotId, ClientError, Interval, StatusReport, Strategy};
use common::{advance, bot, candles, dashboard, settle, FakeApi};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn start_populates_every_view() {
    let api = FakeApi::new();
    api.set_bots(vec![bot("a1b2c3d4e5", "BTCUSDT", Strategy::MaCrossover)]);
    api.set_candles("BTCUSDT", Interval::OneMinute, candles(1_700_000_000, 5, 100.0));

    let mut dash = dashboard(&api);
    assert!(!dash.state.registry.is_loaded());
    dash.start();
    settle(&mut dash).await;

    assert_eq!(dash.state.registry.len(), 1);
    assert_eq!(dash.state.feed.status(), &FeedStatus::Live);
    assert_eq!(dash.state.feed.candles().len(), 5);
    assert!(dash.state.ledger.is_loaded());
    assert!(dash.state.ledger.trades().is_empty());
    assert!(dash.state.balances.is_loaded());
    assert_eq!(dash.state.connection, ConnectionStatus::Connected);
    assert_eq!(FakeApi::count(&api.calls.status), 1);

    dash.shutdown();
}

#[tokio::test(start_paused = true)]
async fn launch_shows_new_bot_before_next_tick() {
    let api = FakeApi::new();
    let mut dash = dashboard(&api);
    dash.start();
    settle(&mut dash).await;
    assert!(dash.state.registry.is_empty());
    assert_eq!(FakeApi::count(&api.calls.active_bots), 1);

    dash.state.form.symbol = "ethusdt".into();
    dash.state.form.interval = Interval::FiveMinutes;
    dash.state.form.strategy = Strategy::BollingerBands;
    dash.state.form.quantity = "0.01".into();

    dash.launch_bot().unwrap();
    assert!(dash.state.launching);
    settle(&mut dash).await;
    settle(&mut dash).await;

    // Well inside the 5s registry cadence.
    assert_eq!(FakeApi::count(&api.calls.active_bots), 2);
    let bots = dash.state.registry.bots();
    assert_eq!(bots.len(), 1);
    assert_eq!(bots[0].symbol, "ETHUSDT");
    assert_eq!(bots[0].strategy, Strategy::BollingerBands);
    assert!(bots[0].running);

    let notice = dash.state.latest_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Info);
    assert!(notice.text.contains("ETHUSDT"));
    assert!(!dash.state.launching);
}

#[tokio::test(start_paused = true)]
async fn invalid_launch_never_reaches_the_service() {
    let api = FakeApi::new();
    let mut dash = dashboard(&api);
    dash.start();
    settle(&mut dash).await;

    dash.state.form.quantity = "0".into();
    let err = dash.launch_bot().unwrap_err();
    assert!(matches!(err, CommandError::Invalid(ValidationError::NonPositiveQuantity)));
    assert!(!dash.state.launching);

    dash.state.form.quantity = "0.5".into();
    dash.state.form.symbol = "  ".into();
    let err = dash.launch_bot().unwrap_err();
    assert!(matches!(err, CommandError::Invalid(ValidationError::EmptySymbol)));
    settle(&mut dash).await;

    assert_eq!(FakeApi::count(&api.calls.start_bot), 0);
    assert_eq!(dash.state.latest_notice().unwrap().level, NoticeLevel::Error);
    // The form is left as typed.
    assert_eq!(dash.state.form.quantity, "0.5");
}

#[tokio::test(start_paused = true)]
async fn rejected_launch_keeps_form_and_registry() {
    let api = FakeApi::new();
    api.fail_start(ClientError::Http {
        status: 400,
        message: "Missing required parameters".into(),
    });
    let mut dash = dashboard(&api);
    dash.start();
    settle(&mut dash).await;
    let form = dash.state.form.clone();

    dash.launch_bot().unwrap();
    settle(&mut dash).await;

    assert!(!dash.state.launching);
    assert_eq!(FakeApi::count(&api.calls.start_bot), 1);
    assert_eq!(dash.state.form, form);
    assert!(dash.state.registry.is_empty());
    assert_eq!(FakeApi::count(&api.calls.active_bots), 1);
    assert!(dash.state.latest_notice().unwrap().text.contains("Missing required parameters"));
}

#[tokio::test(start_paused = true)]
async fn pending_launch_does_not_hold_up_polling() {
    let api = FakeApi::new();
    let held = api.hold_start();
    let mut dash = dashboard(&api);
    dash.start();
    settle(&mut dash).await;
    assert!(dash.state.registry.is_empty());

    dash.launch_bot().unwrap();
    settle(&mut dash).await;
    assert!(dash.state.launching);
    assert_eq!(FakeApi::count(&api.calls.start_bot), 1);

    // A second launch is refused while the first is pending.
    assert!(matches!(dash.launch_bot(), Err(CommandError::InFlight)));

    // The service lists a bot started elsewhere; the next registry poll
    // still lands while the launch hangs.
    api.set_bots(vec![bot("other-bot", "SOLUSDT", Strategy::MaCrossover)]);
    advance(&mut dash, Duration::from_secs(5)).await;
    assert_eq!(dash.state.registry.len(), 1);
    assert!(dash.state.launching);

    // Outcome first, then the registry refresh it triggers.
    held.release();
    settle(&mut dash).await;
    assert!(!dash.state.launching);
    settle(&mut dash).await;
    assert_eq!(dash.state.registry.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn periodic_health_probe_tracks_each_tick() {
    let api = FakeApi::new();
    let mut settings = Settings::default();
    settings.status_poll_secs = Some(30);
    let mut dash = Dashboard::new(api.clone(), settings);
    dash.start();
    settle(&mut dash).await;
    assert_eq!(FakeApi::count(&api.calls.status), 1);
    assert_eq!(dash.state.connection, ConnectionStatus::Connected);

    api.set_status(Ok(StatusReport {
        status: Some("running".into()),
        exchange_connection: Some("error".into()),
    }));
    advance(&mut dash, Duration::from_secs(30)).await;
    assert_eq!(FakeApi::count(&api.calls.status), 2);
    assert_eq!(dash.state.connection.to_string(), "Binance Error");

    api.set_status(Err(ClientError::Connection("connection refused".into())));
    advance(&mut dash, Duration::from_secs(30)).await;
    assert_eq!(FakeApi::count(&api.calls.status), 3);
    assert_eq!(dash.state.connection, ConnectionStatus::Error);

    dash.shutdown();
    advance(&mut dash, Duration::from_secs(90)).await;
    assert_eq!(FakeApi::count(&api.calls.status), 3);
}

#[tokio::test(start_paused = true)]
async fn stopping_unknown_id_surfaces_404() {
    let api = FakeApi::new();
    api.set_bots(vec![bot("live-bot-1", "BTCUSDT", Strategy::MaCrossover)]);
    let mut dash = dashboard(&api);
    dash.start();
    settle(&mut dash).await;

    dash.stop_bot(BotId::new("does-not-exist")).unwrap();
    settle(&mut dash).await;

    assert_eq!(dash.state.registry.len(), 1);
    let notice = dash.state.latest_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.text.contains("404"));
    assert!(notice.text.contains("Bot not found"));
}

#[tokio::test(start_paused = true)]
async fn failed_stop_leaves_bot_running() {
    let api = FakeApi::new();
    api.set_bots(vec![bot("live-bot-1", "BTCUSDT", Strategy::MaCrossover)]);
    api.fail_stop("live-bot-1", ClientError::Timeout);
    let mut dash = dashboard(&api);
    dash.start();
    settle(&mut dash).await;

    dash.stop_highlighted().unwrap();
    assert_eq!(dash.state.stopping, Some(BotId::new("live-bot-1")));
    settle(&mut dash).await;

    let id = BotId::new("live-bot-1");
    assert!(dash.state.registry.get(&id).unwrap().running);
    assert!(dash.state.stopping.is_none());
    // No invalidation on failure.
    assert_eq!(FakeApi::count(&api.calls.active_bots), 1);
}

#[tokio::test(start_paused = true)]
async fn successful_stop_refreshes_registry() {
    let api = FakeApi::new();
    api.set_bots(vec![
        bot("live-bot-1", "BTCUSDT", Strategy::MaCrossover),
        bot("live-bot-2", "ETHUSDT", Strategy::BollingerBands),
    ]);
    let mut dash = dashboard(&api);
    dash.start();
    settle(&mut dash).await;

    dash.stop_bot(BotId::new("live-bot-1")).unwrap();
    settle(&mut dash).await;
    settle(&mut dash).await;

    assert_eq!(dash.state.registry.len(), 1);
    assert!(dash.state.registry.get(&BotId::new("live-bot-1")).is_none());
}

#[tokio::test(start_paused = true)]
async fn stop_with_nothing_highlighted_is_missing_target() {
    let api = FakeApi::new();
    let mut dash = dashboard(&api);
    dash.start();
    settle(&mut dash).await;

    assert!(matches!(dash.stop_highlighted(), Err(CommandError::MissingTarget)));
    assert_eq!(FakeApi::count(&api.calls.stop_bot), 0);
}

#[tokio::test(start_paused = true)]
async fn selection_change_never_shows_old_pair() {
    let api = FakeApi::new();
    api.set_candles("BTCUSDT", Interval::OneMinute, candles(1_700_000_000, 3, 100.0));
    api.set_candles("ETHUSDT", Interval::FiveMinutes, candles(1_700_000_000, 4, 2_000.0));
    let held = api.hold_klines("BTCUSDT", Interval::OneMinute);

    let mut dash = dashboard(&api);
    dash.start();
    settle(&mut dash).await;
    assert_eq!(dash.state.feed.status(), &FeedStatus::Loading);

    assert!(dash.select(Selection::new("ETHUSDT", Interval::FiveMinutes)));
    settle(&mut dash).await;
    assert_eq!(dash.state.feed.candles().len(), 4);

    // The (BTCUSDT, 1m) request resolves now, after the switch.
    held.release();
    settle(&mut dash).await;

    let feed = &dash.state.feed;
    assert_eq!(feed.selection(), &Selection::new("ETHUSDT", Interval::FiveMinutes));
    assert_eq!(feed.candles().len(), 4);
    assert!(feed.candles().iter().all(|c| c.close >= 2_000.0));
}

#[tokio::test(start_paused = true)]
async fn selection_change_clears_candles_immediately() {
    let api = FakeApi::new();
    api.set_candles("BTCUSDT", Interval::OneMinute, candles(1_700_000_000, 3, 100.0));
    let _held = api.hold_klines("SOLUSDT", Interval::OneMinute);

    let mut dash = dashboard(&api);
    dash.start();
    settle(&mut dash).await;
    assert_eq!(dash.state.feed.candles().len(), 3);

    assert!(dash.select_symbol("solusdt"));
    assert!(dash.state.feed.candles().is_empty());
    settle(&mut dash).await;
    assert!(dash.state.feed.candles().is_empty());
    assert_eq!(dash.state.feed.status(), &FeedStatus::Loading);

    // Same pair again is a no-op.
    assert!(!dash.select(Selection::new("SOLUSDT", Interval::OneMinute)));
}

#[tokio::test(start_paused = true)]
async fn empty_candle_response_drops_stale_series() {
    let api = FakeApi::new();
    api.set_candles("BTCUSDT", Interval::OneMinute, candles(1_700_000_000, 3, 100.0));
    let mut dash = dashboard(&api);
    dash.start();
    settle(&mut dash).await;
    assert_eq!(dash.state.feed.status(), &FeedStatus::Live);

    api.set_candles("BTCUSDT", Interval::OneMinute, Vec::new());
    advance(&mut dash, Duration::from_secs(60)).await;

    assert!(dash.state.feed.candles().is_empty());
    assert_eq!(dash.state.feed.status(), &FeedStatus::Empty);
}

#[tokio::test(start_paused = true)]
async fn failed_registry_poll_keeps_previous_snapshot() {
    let api = FakeApi::new();
    api.set_bots(vec![bot("live-bot-1", "BTCUSDT", Strategy::MaCrossover)]);
    let mut dash = dashboard(&api);
    dash.start();
    settle(&mut dash).await;

    api.fail_bots(Some(ClientError::Connection("connection refused".into())));
    advance(&mut dash, Duration::from_secs(5)).await;
    assert_eq!(dash.state.registry.len(), 1);
    assert!(dash.state.registry.last_error().is_some());

    // The cadence is the retry.
    api.fail_bots(None);
    advance(&mut dash, Duration::from_secs(5)).await;
    assert!(dash.state.registry.last_error().is_none());
    assert_eq!(FakeApi::count(&api.calls.active_bots), 3);
}

#[tokio::test(start_paused = true)]
async fn identical_poll_does_not_redraw() {
    let api = FakeApi::new();
    api.set_bots(vec![bot("live-bot-1", "BTCUSDT", Strategy::MaCrossover)]);
    let mut dash = dashboard(&api);
    dash.start();
    settle(&mut dash).await;
    assert!(dash.take_dirty());

    // Only the registry poller fires at 5s, with the same snapshot.
    advance(&mut dash, Duration::from_secs(5)).await;
    assert_eq!(FakeApi::count(&api.calls.active_bots), 2);
    assert!(!dash.take_dirty());
    assert_eq!(dash.state.registry.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn health_probe_maps_exchange_failure() {
    let api = FakeApi::new();
    api.set_status(Ok(StatusReport {
        status: Some("running".into()),
        exchange_connection: Some("error".into()),
    }));
    let mut dash = dashboard(&api);
    dash.start();
    settle(&mut dash).await;
    assert_eq!(dash.state.connection, ConnectionStatus::ExchangeError("Binance".into()));
    assert_eq!(dash.state.connection.to_string(), "Binance Error");

    // Single-shot: no further probes.
    advance(&mut dash, Duration::from_secs(120)).await;
    assert_eq!(FakeApi::count(&api.calls.status), 1);
}

#[tokio::test(start_paused = true)]
async fn unreachable_service_is_error_status() {
    let api = FakeApi::new();
    api.set_status(Err(ClientError::Timeout));
    let mut dash = dashboard(&api);
    dash.start();
    settle(&mut dash).await;
    assert_eq!(dash.state.connection, ConnectionStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_all_polling() {
    let api = FakeApi::new();
    let mut dash = dashboard(&api);
    dash.start();
    settle(&mut dash).await;
    dash.shutdown();

    let bots = FakeApi::count(&api.calls.active_bots);
    let klines = FakeApi::count(&api.calls.klines);
    advance(&mut dash, Duration::from_secs(120)).await;
    assert_eq!(FakeApi::count(&api.calls.active_bots), bots);
    assert_eq!(FakeApi::count(&api.calls.klines), klines);
    assert!(!dash.refresh_bots());
}
