//! App state - pure data structure with no I/O logic

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Local};

use crate::constants::COPY_FEEDBACK;
use crate::messages::ui_events::{AppTab, InputMode, SendField};
use crate::messages::RenderState;
use crate::models::{Note, Session};

/// Severity of a transient banner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BannerLevel {
    Info,
    Success,
    Error,
}

/// Transient message shown above a tab's content
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Banner {
    pub level: BannerLevel,
    pub text: String,
}

impl Banner {
    pub fn info(text: impl Into<String>) -> Self {
        Banner { level: BannerLevel::Info, text: text.into() }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Banner { level: BannerLevel::Success, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Banner { level: BannerLevel::Error, text: text.into() }
    }
}

/// Where a tab is in its connect/submit cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    Connecting,
    Connected { network_ok: bool },
    Submitting,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Disconnected => "Disconnected",
            Phase::Connecting => "Connecting",
            Phase::Connected { network_ok: true } => "Connected",
            Phase::Connected { network_ok: false } => "Connected (wrong network)",
            Phase::Submitting => "Submitting",
        }
    }
}

/// Send tab
#[derive(Clone, Debug, Default)]
pub struct SenderState {
    pub epoch: u64,
    pub session: Session,
    pub connecting: bool,
    pub switching_network: bool,
    pub balance: Option<String>,
    pub recipient: String,
    pub amount: String,
    pub field: SendField,
    /// A transfer is outstanding
    pub sending: bool,
    pub banner: Option<Banner>,
}

impl SenderState {
    pub fn new(epoch: u64) -> Self {
        SenderState { epoch, ..Default::default() }
    }

    pub fn phase(&self) -> Phase {
        if self.sending {
            Phase::Submitting
        } else if self.session.is_connected() {
            Phase::Connected { network_ok: self.session.network.is_expected() }
        } else if self.connecting {
            Phase::Connecting
        } else {
            Phase::Disconnected
        }
    }

    /// The "Wrong Network" banner is shown, and sending blocked, while this holds
    pub fn wrong_network(&self) -> bool {
        self.session.is_connected() && !self.session.network.is_expected()
    }
}

/// Notes tab
#[derive(Clone, Debug, Default)]
pub struct NotesState {
    pub epoch: u64,
    pub session: Session,
    pub connecting: bool,
    /// Snapshot of the contract's notes, in contract order
    pub notes: Vec<Note>,
    pub fetching: bool,
    /// Another fetch was asked for while one was outstanding
    pub refetch_queued: bool,
    pub last_synced: Option<DateTime<Local>>,
    pub draft: String,
    /// A note append is outstanding
    pub adding: bool,
    pub selected: usize,
    /// Note index -> moment its "copied" indicator goes away
    pub copied: HashMap<usize, Instant>,
    pub banner: Option<Banner>,
}

impl NotesState {
    pub fn new(epoch: u64) -> Self {
        NotesState { epoch, ..Default::default() }
    }

    pub fn phase(&self) -> Phase {
        if self.adding {
            Phase::Submitting
        } else if self.session.is_connected() {
            Phase::Connected { network_ok: true }
        } else if self.connecting {
            Phase::Connecting
        } else {
            Phase::Disconnected
        }
    }

    pub fn is_copied(&self, index: usize) -> bool {
        self.copied.contains_key(&index)
    }

    /// Mark note `index` copied and return its text, if it exists
    pub fn copy_note(&mut self, index: usize, now: Instant) -> Option<String> {
        let text = self.notes.get(index)?.text.clone();
        self.copied.insert(index, now + COPY_FEEDBACK);
        Some(text)
    }

    /// Clear indicators whose window has passed. Returns true if any changed.
    pub fn expire_copied(&mut self, now: Instant) -> bool {
        let before = self.copied.len();
        self.copied.retain(|_, until| *until > now);
        self.copied.len() != before
    }
}

/// Main application state - pure data, no I/O
#[derive(Default)]
pub struct AppState {
    pub active_tab: AppTab,
    pub input_mode: InputMode,
    pub cursor_position: usize,
    pub show_help: bool,

    pub sender: SenderState,
    pub notes: NotesState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current input field content
    pub fn current_input(&self) -> &str {
        match self.active_tab {
            AppTab::Send => match self.sender.field {
                SendField::Recipient => &self.sender.recipient,
                SendField::Amount => &self.sender.amount,
            },
            AppTab::Notes => &self.notes.draft,
        }
    }

    /// Get mutable reference to current input field
    pub fn current_input_mut(&mut self) -> &mut String {
        match self.active_tab {
            AppTab::Send => match self.sender.field {
                SendField::Recipient => &mut self.sender.recipient,
                SendField::Amount => &mut self.sender.amount,
            },
            AppTab::Notes => &mut self.notes.draft,
        }
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        RenderState {
            active_tab: self.active_tab,
            input_mode: self.input_mode,
            cursor_position: self.cursor_position,
            show_help: self.show_help,
            sender: self.sender.clone(),
            notes: self.notes.clone(),
        }
    }
}
