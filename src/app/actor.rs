//! App actor - message loop processing UI events and chain responses

use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::app::state::AppState;
use crate::clipboard::Clipboard;
use crate::messages::ui_events::InputMode;
use crate::messages::{ChainCommand, ChainResponse, RenderState, UiEvent};

/// How often copied indicators are checked for expiry
const TICK: Duration = Duration::from_millis(250);

/// App actor that processes UI events and chain responses
pub struct AppActor {
    state: AppState,
    chain_tx: mpsc::UnboundedSender<ChainCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
    clipboard: Box<dyn Clipboard>,
}

impl AppActor {
    pub fn new(
        chain_tx: mpsc::UnboundedSender<ChainCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
        clipboard: Box<dyn Clipboard>,
    ) -> Self {
        AppActor {
            state: AppState::new(),
            chain_tx,
            render_tx,
            clipboard,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut chain_rx: mpsc::UnboundedReceiver<ChainResponse>,
    ) {
        // Send initial render state
        let _ = self.render_tx.send(self.state.to_render_state());
        let mount = self.state.mount();
        self.dispatch(mount);

        let mut tick = tokio::time::interval(TICK);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event) {
                        // Quit signal received
                        let _ = self.chain_tx.send(ChainCommand::Shutdown);
                        break;
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(response) = chain_rx.recv() => {
                    let follow_up = self.state.handle_response(response);
                    self.dispatch(follow_up);
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                _ = tick.tick() => {
                    if self.state.notes.expire_copied(Instant::now()) {
                        let _ = self.render_tx.send(self.state.to_render_state());
                    }
                }
                else => break,
            }
        }
    }

    fn dispatch(&self, commands: impl IntoIterator<Item = ChainCommand>) {
        for cmd in commands {
            let _ = self.chain_tx.send(cmd);
        }
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        match event {
            // Tab switching
            UiEvent::SwitchTab(tab) => self.state.switch_tab(tab),

            // Input editing
            UiEvent::StartEditing => self.state.start_editing(),
            UiEvent::StopEditing => self.state.stop_editing(),
            UiEvent::NextField => self.state.next_field(),
            UiEvent::CharInput(c) => self.state.enter_char(c),
            UiEvent::Backspace => self.state.delete_char(),
            UiEvent::CursorLeft => self.state.move_cursor_left(),
            UiEvent::CursorRight => self.state.move_cursor_right(),

            // Wallet
            UiEvent::Connect => {
                let cmd = self.state.connect();
                self.dispatch(cmd);
            }
            UiEvent::SwitchNetwork => {
                let cmd = self.state.switch_network();
                self.dispatch(cmd);
            }

            // Send tab
            UiEvent::SendTransfer => {
                if self.state.input_mode == InputMode::Editing {
                    self.state.stop_editing();
                }
                let cmd = self.state.send_transfer();
                self.dispatch(cmd);
            }
            UiEvent::RefreshBalance => {
                let cmd = self.state.refresh_balance();
                self.dispatch(cmd);
            }

            // Notes tab
            UiEvent::AddNote => {
                if self.state.input_mode == InputMode::Editing {
                    self.state.stop_editing();
                }
                let cmd = self.state.add_note();
                self.dispatch(cmd);
            }
            UiEvent::RefreshNotes => {
                let cmd = self.state.fetch_notes();
                self.dispatch(cmd);
            }
            UiEvent::NextNote => self.state.next_note(),
            UiEvent::PrevNote => self.state.prev_note(),
            UiEvent::CopyNote => {
                if let Some(text) = self.state.copy_selected_note(Instant::now()) {
                    if let Err(e) = self.clipboard.set_text(&text) {
                        tracing::warn!(error = %e, "Copy failed");
                    }
                }
            }

            // Popups
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::testing::MemoryClipboard;
    use crate::messages::ui_events::AppTab;
    use crate::models::Note;

    fn actor() -> (
        AppActor,
        mpsc::UnboundedReceiver<ChainCommand>,
        mpsc::UnboundedReceiver<RenderState>,
        MemoryClipboard,
    ) {
        let (chain_tx, chain_rx) = mpsc::unbounded_channel();
        let (render_tx, render_rx) = mpsc::unbounded_channel();
        let clipboard = MemoryClipboard::default();
        let actor = AppActor::new(chain_tx, render_tx, Box::new(clipboard.clone()));
        (actor, chain_rx, render_rx, clipboard)
    }

    #[test]
    fn test_copy_writes_clipboard() {
        let (mut actor, _chain_rx, _render_rx, clipboard) = actor();
        actor.state.notes.notes = vec![Note::new("first"), Note::new("second")];
        actor.state.switch_tab(AppTab::Notes);
        actor.handle_ui_event(UiEvent::NextNote);
        actor.handle_ui_event(UiEvent::CopyNote);

        assert_eq!(*clipboard.writes.lock().unwrap(), vec!["second".to_string()]);
        assert!(actor.state.notes.is_copied(1));
    }

    #[test]
    fn test_disconnected_send_dispatches_nothing() {
        let (mut actor, mut chain_rx, _render_rx, _clipboard) = actor();
        actor.state.sender.recipient = "0x00000000000000000000000000000000000000b0".into();
        actor.state.sender.amount = "1".into();
        actor.handle_ui_event(UiEvent::SendTransfer);

        assert!(chain_rx.try_recv().is_err());
        assert!(actor.state.sender.banner.is_some());
    }

    #[tokio::test]
    async fn test_run_mounts_and_shuts_down() {
        let (actor, mut chain_rx, mut render_rx, _clipboard) = actor();
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (_resp_tx, resp_rx) = mpsc::unbounded_channel();

        ui_tx.send(UiEvent::Quit).unwrap();
        actor.run(ui_rx, resp_rx).await;

        assert!(render_rx.try_recv().is_ok());
        let mut commands = Vec::new();
        while let Ok(cmd) = chain_rx.try_recv() {
            commands.push(cmd);
        }
        assert!(matches!(commands.first(), Some(ChainCommand::Watch { tab: AppTab::Send, .. })));
        assert!(matches!(commands.last(), Some(ChainCommand::Shutdown)));
    }
}
