//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Application tabs, one per front-end
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum AppTab {
    #[default]
    Send,
    Notes,
}

impl AppTab {
    pub fn label(&self) -> &'static str {
        match self {
            AppTab::Send => "Send",
            AppTab::Notes => "Notes",
        }
    }
}

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    // Tab navigation
    SwitchTab(AppTab),

    // Input editing
    StartEditing,
    StopEditing,
    NextField,
    CharInput(char),
    Backspace,
    CursorLeft,
    CursorRight,

    // Wallet
    Connect,
    SwitchNetwork,

    // Send tab
    SendTransfer,
    RefreshBalance,

    // Notes tab
    AddNote,
    RefreshNotes,
    NextNote,
    PrevNote,
    CopyNote,

    // Popups
    ToggleHelp,
    CloseHelp,

    // System
    Quit,
}

/// Field of the send form being edited
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SendField {
    #[default]
    Recipient,
    Amount,
}

impl SendField {
    pub fn next(&self) -> SendField {
        match self {
            SendField::Recipient => SendField::Amount,
            SendField::Amount => SendField::Recipient,
        }
    }
}

/// Input mode
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(
    key: KeyEvent,
    active_tab: AppTab,
    active_field: SendField,
    input_mode: InputMode,
    show_help: bool,
) -> Option<UiEvent> {
    use crossterm::event::KeyEventKind;

    if key.kind != KeyEventKind::Press {
        return None;
    }

    // Global Ctrl shortcuts
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char('c') = key.code {
            return Some(UiEvent::Quit);
        }
    }

    // Tab switching: 1 and 2 keys (only in normal mode, not editing)
    if input_mode == InputMode::Normal && !show_help {
        match key.code {
            KeyCode::Char('1') => return Some(UiEvent::SwitchTab(AppTab::Send)),
            KeyCode::Char('2') => return Some(UiEvent::SwitchTab(AppTab::Notes)),
            _ => {}
        }
    }

    if show_help {
        return Some(UiEvent::CloseHelp);
    }

    match active_tab {
        AppTab::Send => handle_send_tab_keys(key, active_field, input_mode),
        AppTab::Notes => handle_notes_tab_keys(key, input_mode),
    }
}

/// Handle keys for the Send tab
fn handle_send_tab_keys(key: KeyEvent, active_field: SendField, input_mode: InputMode) -> Option<UiEvent> {
    match input_mode {
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => Some(UiEvent::Quit),
            KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
            KeyCode::Char('c') => Some(UiEvent::Connect),
            KeyCode::Char('n') => Some(UiEvent::SwitchNetwork),
            KeyCode::Char('b') => Some(UiEvent::RefreshBalance),
            KeyCode::Tab | KeyCode::BackTab => Some(UiEvent::NextField),
            KeyCode::Char('e') | KeyCode::Enter => Some(UiEvent::StartEditing),
            KeyCode::Char('s') => Some(UiEvent::SendTransfer),
            _ => None,
        },
        InputMode::Editing => match key.code {
            KeyCode::Esc => Some(UiEvent::StopEditing),
            KeyCode::Left => Some(UiEvent::CursorLeft),
            KeyCode::Right => Some(UiEvent::CursorRight),
            KeyCode::Backspace => Some(UiEvent::Backspace),
            KeyCode::Tab => Some(UiEvent::NextField),
            KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
            KeyCode::Enter => match active_field {
                SendField::Recipient => Some(UiEvent::NextField),
                SendField::Amount => Some(UiEvent::SendTransfer),
            },
            _ => None,
        },
    }
}

/// Handle keys for the Notes tab
fn handle_notes_tab_keys(key: KeyEvent, input_mode: InputMode) -> Option<UiEvent> {
    match input_mode {
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => Some(UiEvent::Quit),
            KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
            KeyCode::Char('c') => Some(UiEvent::Connect),
            KeyCode::Char('e') | KeyCode::Char('i') => Some(UiEvent::StartEditing),
            KeyCode::Char('a') | KeyCode::Char('s') => Some(UiEvent::AddNote),
            KeyCode::Char('r') => Some(UiEvent::RefreshNotes),
            KeyCode::Char('y') | KeyCode::Enter => Some(UiEvent::CopyNote),
            KeyCode::Up | KeyCode::Char('k') => Some(UiEvent::PrevNote),
            KeyCode::Down | KeyCode::Char('j') => Some(UiEvent::NextNote),
            _ => None,
        },
        InputMode::Editing => match key.code {
            KeyCode::Esc => Some(UiEvent::StopEditing),
            KeyCode::Left => Some(UiEvent::CursorLeft),
            KeyCode::Right => Some(UiEvent::CursorRight),
            KeyCode::Backspace => Some(UiEvent::Backspace),
            KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
            KeyCode::Enter => Some(UiEvent::AddNote),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_tab_switching_only_in_normal_mode() {
        let ev = key_to_ui_event(press(KeyCode::Char('2')), AppTab::Send, SendField::Recipient, InputMode::Normal, false);
        assert_eq!(ev, Some(UiEvent::SwitchTab(AppTab::Notes)));

        let ev = key_to_ui_event(press(KeyCode::Char('2')), AppTab::Send, SendField::Amount, InputMode::Editing, false);
        assert_eq!(ev, Some(UiEvent::CharInput('2')));
    }

    #[test]
    fn test_enter_on_amount_sends() {
        let ev = key_to_ui_event(press(KeyCode::Enter), AppTab::Send, SendField::Amount, InputMode::Editing, false);
        assert_eq!(ev, Some(UiEvent::SendTransfer));
        let ev = key_to_ui_event(press(KeyCode::Enter), AppTab::Send, SendField::Recipient, InputMode::Editing, false);
        assert_eq!(ev, Some(UiEvent::NextField));
    }

    #[test]
    fn test_notes_keys() {
        let ev = key_to_ui_event(press(KeyCode::Enter), AppTab::Notes, SendField::Recipient, InputMode::Editing, false);
        assert_eq!(ev, Some(UiEvent::AddNote));
        let ev = key_to_ui_event(press(KeyCode::Char('y')), AppTab::Notes, SendField::Recipient, InputMode::Normal, false);
        assert_eq!(ev, Some(UiEvent::CopyNote));
    }

    #[test]
    fn test_help_swallows_keys() {
        let ev = key_to_ui_event(press(KeyCode::Char('s')), AppTab::Send, SendField::Recipient, InputMode::Normal, true);
        assert_eq!(ev, Some(UiEvent::CloseHelp));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(
            key_to_ui_event(ctrl_c, AppTab::Send, SendField::Recipient, InputMode::Normal, true),
            Some(UiEvent::Quit)
        );
    }
}
