//! Key bindings: terminal key presses to dashboard actions.

use super::event::UiEvent;
use super::state::{AppState, InputField};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key press asks the dashboard to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    RefreshBots,
    StopHighlighted,
    Launch,
    /// Chart interval cycles to the next value.
    CycleChartInterval,
    /// Enter on the chart symbol field.
    SelectSymbol(String),
    /// Pure state edits, handed straight to the reducer.
    Ui(UiEvent),
}

pub fn map_key(state: &AppState, key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    if let Some(input) = &state.input {
        return match key.code {
            KeyCode::Esc => Some(Action::Ui(UiEvent::InputCancelled)),
            KeyCode::Enter if input.field == InputField::ChartSymbol => Some(Action::SelectSymbol(input.buffer.clone())),
            KeyCode::Enter => Some(Action::Ui(UiEvent::InputCommitted)),
            KeyCode::Backspace => Some(Action::Ui(UiEvent::InputBackspace)),
            KeyCode::Char(ch) => Some(Action::Ui(UiEvent::InputChar { ch })),
            _ => None,
        };
    }

    let action = match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('r') => Action::RefreshBots,
        KeyCode::Char('x') => Action::StopHighlighted,
        KeyCode::Char('l') => Action::Launch,
        KeyCode::Char('i') => Action::CycleChartInterval,
        KeyCode::Up => Action::Ui(UiEvent::HighlightMoved { delta: -1 }),
        KeyCode::Down => Action::Ui(UiEvent::HighlightMoved { delta: 1 }),
        KeyCode::Char('/') => Action::Ui(UiEvent::InputStarted {
            field: InputField::ChartSymbol,
        }),
        KeyCode::Char('e') => Action::Ui(UiEvent::InputStarted {
            field: InputField::LaunchSymbol,
        }),
        KeyCode::Char('u') => Action::Ui(UiEvent::InputStarted {
            field: InputField::LaunchQuantity,
        }),
        KeyCode::Char('t') => Action::Ui(UiEvent::LaunchStrategyCycled),
        KeyCode::Char('v') => Action::Ui(UiEvent::LaunchIntervalCycled),
        _ => return None,
    };
    Some(action)
}
