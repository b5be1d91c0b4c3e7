use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result};
use botdash::app::commands::{self, Action};
use botdash::app::{render, AppEvent, Dashboard, UiEvent};
use botdash::settings::{self, Settings};
use botdash_client::HttpTradingApi;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

enum Input {
    Key(KeyEvent),
    Resize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let settings = Settings::load().context("loading settings")?;
    let log_path = init_tracing().context("setting up the log file")?;
    tracing::info!(
        api = %settings.api_base_url,
        log = %log_path.display(),
        "botdash starting"
    );

    let api = HttpTradingApi::new(&settings.api_base_url, settings.request_timeout())
        .with_context(|| format!("bad api_base_url {:?}", settings.api_base_url))?;

    let mut dash = Dashboard::new(Arc::new(api), settings);
    dash.start();

    let res = run_ui(&mut dash).await;
    dash.shutdown();
    tracing::info!("botdash stopped");
    res
}

/// stdout belongs to the terminal UI, so logs go to a file.
fn init_tracing() -> Result<PathBuf> {
    let path = settings::data_dir()?.join("botdash.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(path)
}

/// crossterm's reader blocks, so it gets its own thread.
fn spawn_input_reader(tx: mpsc::UnboundedSender<Input>) {
    thread::spawn(move || loop {
        let input = match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Input::Key(key),
            Ok(Event::Resize(_, _)) => Input::Resize,
            Ok(_) => continue,
            Err(err) => {
                tracing::error!("terminal input failed: {err}");
                break;
            }
        };
        if tx.send(input).is_err() {
            break;
        }
    });
}

async fn run_ui(dash: &mut Dashboard) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = ui_loop(&mut terminal, dash).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn ui_loop<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, dash: &mut Dashboard) -> Result<()> {
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    spawn_input_reader(input_tx);

    loop {
        if dash.take_dirty() {
            terminal.draw(|f| render::render(f, &dash.state))?;
        }

        tokio::select! {
            Some(ev) = dash.next_event() => {
                dash.handle_event(ev);
                dash.drain_events();
            }
            input = input_rx.recv() => match input {
                Some(Input::Key(key)) => {
                    let Some(action) = commands::map_key(&dash.state, key) else {
                        continue;
                    };
                    if action == Action::Quit {
                        break;
                    }
                    dispatch(dash, action);
                }
                Some(Input::Resize) => dash.mark_dirty(),
                None => break,
            },
        }
    }

    Ok(())
}

/// Applies one key action. Commands are handed off to background tasks, so
/// nothing here waits on the service.
fn dispatch(dash: &mut Dashboard, action: Action) {
    let res = match action {
        Action::Quit => Ok(()),
        Action::RefreshBots => {
            dash.refresh_bots();
            Ok(())
        }
        Action::CycleChartInterval => {
            dash.cycle_chart_interval();
            Ok(())
        }
        Action::SelectSymbol(symbol) => {
            dash.handle_event(AppEvent::Ui(UiEvent::InputCommitted));
            dash.select_symbol(&symbol);
            Ok(())
        }
        Action::Ui(ev) => {
            dash.handle_event(AppEvent::Ui(ev));
            Ok(())
        }
        Action::Launch => dash.launch_bot(),
        Action::StopHighlighted => dash.stop_highlighted(),
    };
    if let Err(err) = res {
        tracing::debug!("command not sent: {err}");
    }
}
