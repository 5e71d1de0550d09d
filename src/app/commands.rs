//! Command handlers - business logic for processing UI events and chain responses
//!
//! Handlers that need the chain return the command to dispatch instead of
//! performing it, so every gate (connection, network, validation, in-flight)
//! is decided here before anything reaches the provider.

use std::time::Instant;

use chrono::Local;

use crate::app::state::{Banner, NotesState, SenderState};
use crate::app::AppState;
use crate::chain::provider::ProviderEvent;
use crate::messages::ui_events::{AppTab, InputMode};
use crate::messages::{ChainCommand, ChainResponse};
use crate::models::{Network, TransferRequest};

const TRANSFER_FAILED: &str = "Transaction failed. Check the log for details.";
const ADD_NOTE_FAILED: &str = "Failed to add note. Please check your connection and try again.";

impl AppState {
    // ========================
    // Lifecycle
    // ========================

    /// Commands issued when the app starts: subscribe and probe both tabs
    pub fn mount(&self) -> Vec<ChainCommand> {
        vec![
            ChainCommand::Watch { tab: AppTab::Send, epoch: self.sender.epoch },
            ChainCommand::Probe { tab: AppTab::Send, epoch: self.sender.epoch },
            ChainCommand::Watch { tab: AppTab::Notes, epoch: self.notes.epoch },
            ChainCommand::Probe { tab: AppTab::Notes, epoch: self.notes.epoch },
        ]
    }

    /// Throw away everything the tab knows and start over.
    ///
    /// Outstanding requests are not cancelled; their answers carry the old
    /// epoch and are ignored when they arrive.
    pub fn reload(&mut self, tab: AppTab) -> Vec<ChainCommand> {
        tracing::info!(?tab, "Reloading tab");
        if self.active_tab == tab {
            self.input_mode = InputMode::Normal;
            self.cursor_position = 0;
        }
        let epoch = match tab {
            AppTab::Send => {
                self.sender = SenderState::new(self.sender.epoch + 1);
                self.sender.epoch
            }
            AppTab::Notes => {
                self.notes = NotesState::new(self.notes.epoch + 1);
                self.notes.epoch
            }
        };
        vec![
            ChainCommand::Unwatch { tab },
            ChainCommand::Watch { tab, epoch },
            ChainCommand::Probe { tab, epoch },
        ]
    }

    // ========================
    // Navigation
    // ========================

    pub fn switch_tab(&mut self, tab: AppTab) {
        if self.active_tab != tab {
            self.active_tab = tab;
            self.input_mode = InputMode::Normal;
            self.cursor_position = self.current_input().len();
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }

    pub fn next_field(&mut self) {
        if self.active_tab == AppTab::Send {
            self.sender.field = self.sender.field.next();
            self.cursor_position = self.current_input().len();
        }
    }

    pub fn next_note(&mut self) {
        if !self.notes.notes.is_empty() {
            self.notes.selected = (self.notes.selected + 1) % self.notes.notes.len();
        }
    }

    pub fn prev_note(&mut self) {
        if !self.notes.notes.is_empty() {
            self.notes.selected = self.notes.selected
                .checked_sub(1)
                .unwrap_or(self.notes.notes.len() - 1);
        }
    }

    // ========================
    // Input editing
    // ========================

    pub fn start_editing(&mut self) {
        self.input_mode = InputMode::Editing;
        self.cursor_position = self.current_input().len();
    }

    pub fn stop_editing(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn move_cursor_left(&mut self) {
        let input = self.current_input();
        if self.cursor_position > 0 {
            let new_pos = input[..self.cursor_position]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.cursor_position = new_pos;
        }
    }

    pub fn move_cursor_right(&mut self) {
        let input = self.current_input();
        if self.cursor_position < input.len() {
            let new_pos = input[self.cursor_position..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor_position + i)
                .unwrap_or(input.len());
            self.cursor_position = new_pos;
        }
    }

    pub fn enter_char(&mut self, c: char) {
        let cursor_pos = self.cursor_position;
        let input = self.current_input_mut();
        if cursor_pos <= input.len() {
            input.insert(cursor_pos, c);
            self.cursor_position = cursor_pos + c.len_utf8();
        }
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let cursor_pos = self.cursor_position;
            let input = self.current_input_mut();
            let prev_pos = input[..cursor_pos]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            input.remove(prev_pos);
            self.cursor_position = prev_pos;
        }
    }

    // ========================
    // Wallet connection
    // ========================

    pub fn connect(&mut self) -> Option<ChainCommand> {
        let tab = self.active_tab;
        let (connecting, session, banner, epoch) = match tab {
            AppTab::Send => (&mut self.sender.connecting, &self.sender.session, &mut self.sender.banner, self.sender.epoch),
            AppTab::Notes => (&mut self.notes.connecting, &self.notes.session, &mut self.notes.banner, self.notes.epoch),
        };
        if *connecting || session.is_connected() {
            return None;
        }
        *connecting = true;
        *banner = None;
        Some(ChainCommand::Connect { tab, epoch })
    }

    pub fn switch_network(&mut self) -> Option<ChainCommand> {
        if self.active_tab != AppTab::Send || self.sender.switching_network {
            return None;
        }
        if !self.sender.wrong_network() {
            return None;
        }
        self.sender.switching_network = true;
        self.sender.banner = Some(Banner::info("Confirm the network switch in your wallet..."));
        Some(ChainCommand::SwitchNetwork { epoch: self.sender.epoch })
    }

    // ========================
    // Send tab
    // ========================

    /// Validate the form and, if it passes, start the transfer
    pub fn send_transfer(&mut self) -> Option<ChainCommand> {
        if self.sender.sending {
            return None;
        }
        let request = TransferRequest::new(self.sender.recipient.clone(), self.sender.amount.clone());
        match request.validate(&self.sender.session) {
            Ok(transfer) => {
                self.sender.sending = true;
                self.sender.banner = Some(Banner::info("Confirm the transaction in your wallet..."));
                Some(ChainCommand::SendTransfer { epoch: self.sender.epoch, transfer })
            }
            Err(e) => {
                tracing::info!(error = %e, "Transfer rejected before submission");
                self.sender.banner = Some(Banner::error(e.to_string()));
                None
            }
        }
    }

    pub fn refresh_balance(&mut self) -> Option<ChainCommand> {
        let address = self.sender.session.account?;
        Some(ChainCommand::FetchBalance { epoch: self.sender.epoch, address })
    }

    // ========================
    // Notes tab
    // ========================

    pub fn fetch_notes(&mut self) -> Option<ChainCommand> {
        if !self.notes.session.is_connected() {
            return None;
        }
        if self.notes.fetching {
            self.notes.refetch_queued = true;
            return None;
        }
        self.notes.fetching = true;
        Some(ChainCommand::FetchNotes { epoch: self.notes.epoch })
    }

    pub fn add_note(&mut self) -> Option<ChainCommand> {
        if self.notes.adding {
            return None;
        }
        if self.notes.draft.trim().is_empty() {
            self.notes.banner = Some(Banner::error("Note cannot be empty!"));
            return None;
        }
        let Some(from) = self.notes.session.account else {
            self.notes.banner = Some(Banner::error("Connect wallet first!"));
            return None;
        };
        self.notes.adding = true;
        self.notes.banner = None;
        Some(ChainCommand::AddNote {
            epoch: self.notes.epoch,
            from,
            text: self.notes.draft.clone(),
        })
    }

    /// Mark the selected note copied and hand back its text for the clipboard
    pub fn copy_selected_note(&mut self, now: Instant) -> Option<String> {
        self.notes.copy_note(self.notes.selected, now)
    }

    // ========================
    // Chain responses
    // ========================

    /// Apply a chain response, returning any follow-up commands
    pub fn handle_response(&mut self, response: ChainResponse) -> Vec<ChainCommand> {
        let current = match response.tab() {
            AppTab::Send => self.sender.epoch,
            AppTab::Notes => self.notes.epoch,
        };
        if response.epoch() != current {
            tracing::debug!(tab = ?response.tab(), epoch = response.epoch(), current, "Dropping stale response");
            return Vec::new();
        }

        match response {
            ChainResponse::Probed { tab, session, .. } => self.apply_probe(tab, session),

            ChainResponse::Connected { tab, result, .. } => match result {
                Ok(session) => self.apply_session(tab, session),
                Err(e) => {
                    tracing::warn!(?tab, error = %e, "Failed to connect wallet");
                    match tab {
                        AppTab::Send => {
                            self.sender.connecting = false;
                            self.sender.banner = Some(Banner::error(e.to_string()));
                        }
                        AppTab::Notes => {
                            self.notes.connecting = false;
                            self.notes.banner = Some(Banner::error(e.to_string()));
                        }
                    }
                    Vec::new()
                }
            },

            ChainResponse::NetworkSwitched { result, .. } => {
                self.sender.switching_network = false;
                self.sender.banner = match result {
                    // The wallet follows up with chainChanged, which reloads the tab
                    Ok(()) => None,
                    Err(e) => Some(Banner::error(format!("Could not switch to Sepolia: {}", e))),
                };
                Vec::new()
            }

            ChainResponse::Balance { address, balance, .. } => {
                if self.sender.session.account == Some(address) {
                    self.sender.balance = Some(balance);
                }
                Vec::new()
            }

            ChainResponse::TransferFinished { result, .. } => {
                self.sender.sending = false;
                match result {
                    Ok(hash) => {
                        self.sender.recipient.clear();
                        self.sender.amount.clear();
                        if self.active_tab == AppTab::Send {
                            self.cursor_position = 0;
                        }
                        self.sender.banner = Some(Banner::success(format!("Transaction sent successfully! {}", hash)));
                        self.refresh_balance().into_iter().collect()
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Transaction failed");
                        self.sender.banner = Some(Banner::error(TRANSFER_FAILED));
                        Vec::new()
                    }
                }
            }

            ChainResponse::NotesFetched { result, .. } => {
                self.notes.fetching = false;
                match result {
                    Ok(notes) => {
                        self.notes.notes = notes;
                        self.notes.last_synced = Some(Local::now());
                        self.notes.copied.retain(|index, _| *index < self.notes.notes.len());
                        if self.notes.selected >= self.notes.notes.len() {
                            self.notes.selected = self.notes.notes.len().saturating_sub(1);
                        }
                        if self.notes.banner.as_ref().is_some_and(|b| b.text.starts_with("Fetch error")) {
                            self.notes.banner = None;
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Detailed fetch error");
                        self.notes.banner = Some(Banner::error(format!("Fetch error: {}", e)));
                    }
                }
                if std::mem::take(&mut self.notes.refetch_queued) {
                    return self.fetch_notes().into_iter().collect();
                }
                Vec::new()
            }

            ChainResponse::NoteAdded { result, .. } => {
                self.notes.adding = false;
                match result {
                    Ok(hash) => {
                        tracing::info!(%hash, "Note confirmed, refreshing list");
                        self.notes.draft.clear();
                        if self.active_tab == AppTab::Notes {
                            self.cursor_position = 0;
                        }
                        self.notes.banner = None;
                        self.fetch_notes().into_iter().collect()
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Note addition error");
                        self.notes.banner = Some(Banner::error(ADD_NOTE_FAILED));
                        Vec::new()
                    }
                }
            }

            ChainResponse::Event { tab, event, .. } => self.handle_provider_event(tab, event),
        }
    }

    fn handle_provider_event(&mut self, tab: AppTab, event: ProviderEvent) -> Vec<ChainCommand> {
        match event {
            // Contract bindings and balances belong to the old chain
            ProviderEvent::ChainChanged(chain_id) => {
                tracing::info!(?tab, %chain_id, "Chain changed");
                self.reload(tab)
            }
            ProviderEvent::AccountsChanged(accounts) => {
                tracing::info!(?tab, ?accounts, "Accounts changed");
                match tab {
                    AppTab::Send => {
                        let previous = self.sender.session.account;
                        self.sender.session.apply_accounts(&accounts);
                        self.sender.balance = None;
                        if previous.is_none() && self.sender.session.is_connected() {
                            // Chain may have moved while locked
                            return vec![ChainCommand::Probe { tab, epoch: self.sender.epoch }];
                        }
                        self.refresh_balance().into_iter().collect()
                    }
                    AppTab::Notes => {
                        let previous = self.notes.session.account;
                        self.notes.session.apply_accounts(&accounts);
                        if previous.is_none() && self.notes.session.is_connected() {
                            return vec![ChainCommand::Probe { tab, epoch: self.notes.epoch }];
                        }
                        if self.notes.session.account != previous {
                            self.fetch_notes().into_iter().collect()
                        } else {
                            Vec::new()
                        }
                    }
                }
            }
        }
    }

    fn apply_probe(&mut self, tab: AppTab, session: crate::models::Session) -> Vec<ChainCommand> {
        if !session.is_connected() {
            // Network is still worth showing for the status line
            match tab {
                AppTab::Send if !self.sender.session.is_connected() => self.sender.session.network = session.network,
                AppTab::Notes if !self.notes.session.is_connected() => self.notes.session.network = session.network,
                _ => {}
            }
            return Vec::new();
        }
        self.apply_session(tab, session)
    }

    fn apply_session(&mut self, tab: AppTab, session: crate::models::Session) -> Vec<ChainCommand> {
        match tab {
            AppTab::Send => {
                self.sender.connecting = false;
                self.sender.session = session;
                self.sender.banner = None;
                self.refresh_balance().into_iter().collect()
            }
            AppTab::Notes => {
                self.notes.connecting = false;
                self.notes.session = session;
                self.notes.banner = None;
                self.fetch_notes().into_iter().collect()
            }
        }
    }
}
