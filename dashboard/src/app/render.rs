use super::state::*;
use crate::health::ConnectionStatus;
use crate::market::FeedStatus;
use bigdecimal::BigDecimal;
use botdash_client::{Candle, Side, Trade};
use chrono::DateTime;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, state: &AppState) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Percentage(45),
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, vertical[0], state);
    render_chart(f, vertical[1], state);

    let tables = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(vertical[2]);
    render_bots(f, tables[0], state);
    render_trades(f, tables[1], state);

    render_launch_form(f, vertical[3], state);
    render_footer(f, vertical[4], state);
}

fn bold(title: String) -> Span<'static> {
    Span::styled(title, Style::default().add_modifier(Modifier::BOLD))
}

fn connection_style(status: &ConnectionStatus) -> Style {
    match status {
        ConnectionStatus::Unknown => Style::default().fg(Color::Gray),
        ConnectionStatus::Connected => Style::default().fg(Color::Green),
        ConnectionStatus::ExchangeError(_) | ConnectionStatus::Error => Style::default().fg(Color::Red),
    }
}

fn render_header(f: &mut Frame, area: Rect, state: &AppState) {
    let line = Line::from(vec![
        bold(" Crypto Trading Bot Dashboard ".to_string()),
        Span::raw("  "),
        Span::styled(state.connection.to_string(), connection_style(&state.connection)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_chart(f: &mut Frame, area: Rect, state: &AppState) {
    let selection = state.feed.selection();
    let title = bold(format!(" {} Chart ({}) ", selection.symbol, selection.interval));
    let block = Block::default().title(title).borders(Borders::ALL);

    let candles = state.feed.candles();
    let Some(bounds) = chart_bounds(candles) else {
        let msg = match state.feed.status() {
            FeedStatus::Loading => "Loading candles...".to_string(),
            FeedStatus::Empty | FeedStatus::Live => "No candle data.".to_string(),
            FeedStatus::Failed(err) => format!("Failed to load candles: {err}"),
        };
        f.render_widget(Paragraph::new(msg).block(block), area);
        return;
    };

    let close: Vec<(f64, f64)> = candles.iter().map(|c| (c.time as f64, c.close)).collect();
    let high: Vec<(f64, f64)> = candles.iter().map(|c| (c.time as f64, c.high)).collect();
    let low: Vec<(f64, f64)> = candles.iter().map(|c| (c.time as f64, c.low)).collect();

    let envelope = Style::default().fg(Color::DarkGray);
    let datasets = vec![
        Dataset::default()
            .name("high")
            .marker(Marker::Dot)
            .graph_type(GraphType::Line)
            .style(envelope)
            .data(&high),
        Dataset::default()
            .name("low")
            .marker(Marker::Dot)
            .graph_type(GraphType::Line)
            .style(envelope)
            .data(&low),
        Dataset::default()
            .name("close")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&close),
    ];

    let (x0, x1, y0, y1) = bounds;
    let x_axis = Axis::default().bounds([x0, x1]).labels(vec![
        Span::raw(clock(x0)),
        Span::raw(clock((x0 + x1) / 2.0)),
        Span::raw(clock(x1)),
    ]);
    let y_axis = Axis::default().bounds([y0, y1]).labels(vec![
        Span::raw(format!("{y0:.2}")),
        Span::raw(format!("{:.2}", (y0 + y1) / 2.0)),
        Span::raw(format!("{y1:.2}")),
    ]);

    let chart = Chart::new(datasets).block(block).x_axis(x_axis).y_axis(y_axis);
    f.render_widget(chart, area);
}

/// `(x_min, x_max, y_min, y_max)` with a little vertical headroom.
fn chart_bounds(candles: &[Candle]) -> Option<(f64, f64, f64, f64)> {
    let first = candles.first()?;
    let last = candles.last()?;
    let x0 = first.time as f64;
    let x1 = (last.time as f64).max(x0 + 1.0);

    let lo = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let hi = candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let pad = ((hi - lo) * 0.02).max(hi.abs() * 1e-4).max(1e-9);
    Some((x0, x1, lo - pad, hi + pad))
}

fn clock(secs: f64) -> String {
    DateTime::from_timestamp(secs as i64, 0)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default()
}

fn render_bots(f: &mut Frame, area: Rect, state: &AppState) {
    let registry = &state.registry;
    let mut lines = Vec::new();

    if !registry.is_loaded() {
        lines.push(Line::from("Loading bots..."));
    } else if registry.is_empty() {
        lines.push(Line::from("No active bots."));
    } else {
        lines.push(Line::from(Span::styled(
            format!("{:<12} {:<10} {:<26} {}", "ID", "SYMBOL", "STRATEGY", "STATUS"),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (i, bot) in registry.bots().iter().enumerate() {
            let stopping = state.stopping.as_ref() == Some(&bot.id);
            let status = if stopping {
                "Stopping..."
            } else if bot.running {
                "Running"
            } else {
                "Stopped"
            };
            let text = format!(
                "{:<12} {:<10} {:<26} {}",
                bot.id.short(),
                bot.symbol,
                bot.strategy.label(),
                status
            );
            let mut style = if bot.running {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            };
            if registry.highlighted_index() == Some(i) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            lines.push(Line::from(Span::styled(text, style)));
        }
    }
    if let Some(err) = registry.last_error() {
        lines.push(Line::from(Span::styled(format!("refresh failed: {err}"), Style::default().fg(Color::Red))));
    }

    let title = bold(format!(" Active Bots ({}) ", registry.len()));
    f.render_widget(
        Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL)),
        area,
    );
}

fn render_trades(f: &mut Frame, area: Rect, state: &AppState) {
    let ledger = &state.ledger;
    let mut lines = Vec::new();

    if !ledger.is_loaded() {
        lines.push(Line::from("Loading trades..."));
    } else if ledger.trades().is_empty() {
        lines.push(Line::from("No trades yet."));
    } else {
        lines.push(Line::from(Span::styled(
            format!(
                "{:<20} {:<9} {:<4} {:>12} {:>10} {}",
                "TIME", "SYMBOL", "SIDE", "PRICE", "QTY", "STRATEGY"
            ),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for trade in ledger.trades() {
            let side_style = match trade.side {
                Side::Buy => Style::default().fg(Color::Green),
                Side::Sell => Style::default().fg(Color::Red),
            };
            lines.push(Line::from(vec![
                Span::raw(format!("{:<20} {:<9} ", trade_time(trade), trade.symbol)),
                Span::styled(format!("{:<4}", trade.side), side_style),
                Span::raw(format!(
                    " {:>12} {:>10} {}",
                    price(&trade.price),
                    trade.quantity.normalized(),
                    trade.strategy
                )),
            ]));
        }
    }
    if let Some(err) = ledger.last_error() {
        lines.push(Line::from(Span::styled(format!("refresh failed: {err}"), Style::default().fg(Color::Red))));
    }

    f.render_widget(
        Paragraph::new(lines).block(Block::default().title(bold(" Trade History ".to_string())).borders(Borders::ALL)),
        area,
    );
}

fn render_launch_form(f: &mut Frame, area: Rect, state: &AppState) {
    let form = &state.form;
    let mut spans = vec![
        Span::raw(format!("symbol {}  ", form.symbol)),
        Span::raw(format!("interval {}  ", form.interval)),
        Span::raw(format!("strategy {}  ", form.strategy.label())),
        Span::raw(format!("qty {}  ", form.quantity)),
    ];
    if state.launching {
        spans.push(Span::styled("Launching...", Style::default().fg(Color::Yellow)));
    } else {
        spans.push(Span::styled("[l] launch", Style::default().fg(Color::Cyan)));
    }

    f.render_widget(
        Paragraph::new(Line::from(spans))
            .block(Block::default().title(bold(" Launch Bot ".to_string())).borders(Borders::ALL)),
        area,
    );
}

fn render_footer(f: &mut Frame, area: Rect, state: &AppState) {
    let balances = if state.balances.rows().is_empty() {
        match state.balances.last_error() {
            Some(err) => format!("Balances: unavailable ({err})"),
            None if state.balances.is_loaded() => "Balances: none".to_string(),
            None => "Balances: loading...".to_string(),
        }
    } else {
        let parts: Vec<String> = state
            .balances
            .rows()
            .iter()
            .map(|b| format!("{} {} ({} locked)", b.asset, b.free.normalized(), b.locked.normalized()))
            .collect();
        format!("Balances: {}", parts.join(" | "))
    };

    let notice = match state.latest_notice() {
        Some(n) => {
            let color = match n.level {
                NoticeLevel::Info => Color::Green,
                NoticeLevel::Error => Color::Red,
            };
            Line::from(Span::styled(
                format!("[{}] {}", n.at.format("%H:%M:%S"), n.text),
                Style::default().fg(color),
            ))
        }
        None => Line::from(""),
    };

    let help = match &state.input {
        Some(input) => Line::from(Span::styled(
            format!("{}: {}_   (Enter apply, Esc cancel)", input.field.label(), input.buffer),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(Span::styled(
            "q quit  r refresh  ↑/↓ select  x stop  i interval  / symbol  e/t/v/u edit launch  l launch",
            Style::default().fg(Color::DarkGray),
        )),
    };

    f.render_widget(Paragraph::new(vec![Line::from(balances), notice, help]), area);
}

/// UTC, `dd/mm/yyyy, HH:MM:SS`; the raw string if it does not parse.
pub fn trade_time(trade: &Trade) -> String {
    trade
        .executed_at()
        .map(|at| at.format("%d/%m/%Y, %H:%M:%S").to_string())
        .unwrap_or_else(|| trade.timestamp.clone())
}

/// Two decimals.
pub fn price(value: &BigDecimal) -> String {
    value.round(2).with_scale(2).to_string()
}
