//! Render state - data structure sent from App layer to UI for rendering

use crate::app::state::{NotesState, SenderState};
use crate::messages::ui_events::{AppTab, InputMode};

/// Complete state needed by the UI to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    // Tab
    pub active_tab: AppTab,

    // UI state
    pub input_mode: InputMode,
    pub cursor_position: usize,

    // Popups
    pub show_help: bool,

    // Per-tab data
    pub sender: SenderState,
    pub notes: NotesState,
}
