use super::event::*;
use super::state::*;
use crate::debug_hooks;

/// Applies one event to the state. Returns whether anything visible changed.
pub fn reduce(state: &mut AppState, ev: AppEvent) -> bool {
    match ev {
        AppEvent::Ui(u) => reduce_ui(state, u),
        AppEvent::Feed(f) => reduce_feed(state, f),
        AppEvent::Exec(x) => reduce_exec(state, x),
    }
}

fn reduce_ui(state: &mut AppState, ev: UiEvent) -> bool {
    match ev {
        UiEvent::SelectionChanged { selection } => {
            if selection.symbol.is_empty() {
                state.push_notice(NoticeLevel::Error, "Chart symbol must not be empty.");
                return true;
            }
            if &selection == state.feed.selection() {
                return false;
            }
            state.feed.reset(selection);
            true
        }
        UiEvent::HighlightMoved { delta } => state.registry.move_highlight(delta),

        UiEvent::InputStarted { field } => {
            let buffer = match field {
                InputField::ChartSymbol => state.feed.selection().symbol.clone(),
                InputField::LaunchSymbol => state.form.symbol.clone(),
                InputField::LaunchQuantity => state.form.quantity.clone(),
            };
            state.input = Some(InputState { field, buffer });
            true
        }
        UiEvent::InputChar { ch } => match state.input.as_mut() {
            Some(input) if !ch.is_control() => {
                input.buffer.push(ch);
                true
            }
            _ => false,
        },
        UiEvent::InputBackspace => match state.input.as_mut() {
            Some(input) => input.buffer.pop().is_some(),
            None => false,
        },
        UiEvent::InputCancelled => state.input.take().is_some(),
        UiEvent::InputCommitted => {
            let Some(input) = state.input.take() else {
                return false;
            };
            match input.field {
                InputField::LaunchSymbol => state.form.symbol = input.buffer.trim().to_uppercase(),
                InputField::LaunchQuantity => state.form.quantity = input.buffer.trim().to_string(),
                // Applied by the coordinator as a selection change.
                InputField::ChartSymbol => {}
            }
            true
        }

        UiEvent::LaunchStrategyCycled => {
            state.form.strategy = state.form.strategy.next();
            true
        }
        UiEvent::LaunchIntervalCycled => {
            state.form.interval = state.form.interval.next();
            true
        }
    }
}

fn reduce_feed(state: &mut AppState, ev: FeedEvent) -> bool {
    match ev {
        FeedEvent::BotsLoaded { bots } => state.registry.apply_snapshot(bots),
        FeedEvent::BotsFailed { error } => state.registry.record_failure(&error),

        FeedEvent::CandlesLoaded {
            generation,
            selection,
            candles,
        } => {
            if &selection != state.feed.selection() {
                debug_hooks::log_feed_skip("candles for other selection", selection.to_string());
                return false;
            }
            state.feed.apply_candles(generation, candles)
        }
        FeedEvent::CandlesFailed {
            generation,
            selection,
            error,
        } => {
            if &selection != state.feed.selection() {
                debug_hooks::log_feed_skip("failure for other selection", selection.to_string());
                return false;
            }
            state.feed.record_failure(generation, &error)
        }

        FeedEvent::TradesLoaded { trades } => state.ledger.apply_snapshot(trades),
        FeedEvent::TradesFailed { error } => state.ledger.record_failure(&error),

        FeedEvent::BalancesLoaded { balances } => state.balances.apply_snapshot(balances),
        FeedEvent::BalancesFailed { error } => state.balances.record_failure(&error),

        FeedEvent::StatusProbed { status } => {
            if state.connection == status {
                return false;
            }
            state.connection = status;
            true
        }
    }
}

fn reduce_exec(state: &mut AppState, ev: ExecEvent) -> bool {
    match ev {
        ExecEvent::LaunchSubmitted => {
            state.launching = true;
            true
        }
        ExecEvent::LaunchSucceeded { symbol, bot_id } => {
            state.launching = false;
            let text = match bot_id {
                Some(id) => format!("Bot started for {symbol} ({}).", id.short()),
                None => format!("Bot started for {symbol}."),
            };
            state.push_notice(NoticeLevel::Info, text);
            true
        }
        ExecEvent::LaunchFailed { reason } => {
            // The form keeps its contents so the operator can fix and retry.
            state.launching = false;
            state.push_notice(NoticeLevel::Error, format!("Launch failed: {reason}"));
            true
        }

        ExecEvent::StopSubmitted { id } => {
            state.stopping = Some(id);
            true
        }
        ExecEvent::StopSucceeded { id } => {
            state.stopping = None;
            state.push_notice(NoticeLevel::Info, format!("Stop requested for bot {}.", id.short()));
            true
        }
        ExecEvent::StopFailed { id, reason } => {
            state.stopping = None;
            let text = match id {
                Some(id) => format!("Stop failed for bot {}: {reason}", id.short()),
                None => format!("Stop failed: {reason}"),
            };
            state.push_notice(NoticeLevel::Error, text);
            true
        }
    }
}
