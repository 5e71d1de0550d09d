//! Wallet Desk - Actor-based wallet front-end
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - central state machine processing events
//! - Chain Layer (Tokio) - async wallet and contract calls

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use wallet_desk::app::state::{Banner, Phase};
use wallet_desk::app::AppActor;
use wallet_desk::chain::notes::NotesContract;
use wallet_desk::chain::{ChainActor, ChainProvider, HttpWalletProvider, RpcClient, RpcTransport};
use wallet_desk::clipboard::SystemClipboard;
use wallet_desk::config::Config;
use wallet_desk::constants::{APP_NAME, LOG_FILE_NAME, SEPOLIA_NAME};
use wallet_desk::messages::ui_events::{key_to_ui_event, AppTab, InputMode, SendField};
use wallet_desk::messages::{ChainCommand, ChainResponse, RenderState, UiEvent};
use wallet_desk::models::short_address;
use wallet_desk::ui::{centered_rect, network_color, phase_color, place_cursor, render_banner, render_input};

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE_NAME);
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    // Configuration errors are reported before the terminal is taken over
    let config = Config::from_env()?;

    let wallet: Option<Arc<dyn ChainProvider>> = match config.wallet_url.as_deref() {
        Some(url) => {
            tracing::info!(url, "Using wallet endpoint");
            Some(Arc::new(HttpWalletProvider::new(RpcClient::new(url), config.poll_interval)))
        }
        None => {
            tracing::warn!("No wallet endpoint configured");
            None
        }
    };
    let rpc: Arc<dyn RpcTransport> = Arc::new(RpcClient::new(config.rpc_url.as_str()));
    let notes = match config.notes_address {
        Some(address) => Some(Arc::new(NotesContract::new(address, &config.notes_abi)?)),
        None => {
            tracing::warn!("No notes contract configured");
            None
        }
    };

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (chain_cmd_tx, chain_cmd_rx) = mpsc::unbounded_channel::<ChainCommand>();
    let (chain_resp_tx, chain_resp_rx) = mpsc::unbounded_channel::<ChainResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn chain actor
    let chain_actor = ChainActor::new(wallet, rpc, config.rpc_url.clone(), notes, chain_resp_tx);
    let chain_handle = tokio::spawn(chain_actor.run(chain_cmd_rx));

    // Spawn app actor
    let app_actor = AppActor::new(chain_cmd_tx, render_tx, Box::new(SystemClipboard::new()));
    tokio::spawn(app_actor.run(ui_rx, chain_resp_rx));

    // Run UI loop (synchronous with async polling)
    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    // Let the chain actor drop its wallet subscriptions
    let _ = tokio::time::timeout(Duration::from_secs(1), chain_handle).await;

    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        // Draw with current state
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(
                    key,
                    current_state.active_tab,
                    current_state.sender.field,
                    current_state.input_mode,
                    current_state.show_help,
                ) {
                    if matches!(event, UiEvent::Quit) {
                        let _ = ui_tx.send(event);
                        break;
                    }
                    let _ = ui_tx.send(event);
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    // Main layout with tab bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_tab_bar(f, state, main_chunks[0]);

    match state.active_tab {
        AppTab::Send => draw_send_tab(f, state, main_chunks[1]),
        AppTab::Notes => draw_notes_tab(f, state, main_chunks[1]),
    }

    draw_status_bar(f, state, main_chunks[2]);

    if state.show_help {
        draw_help_popup(f, area);
    }
}

fn draw_tab_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let tab_style = |tab: AppTab, color: Color| {
        if state.active_tab == tab {
            Style::default().fg(Color::Black).bg(color).bold()
        } else {
            Style::default().fg(Color::Gray)
        }
    };
    let send_phase = state.sender.phase();
    let notes_phase = state.notes.phase();

    let tabs = vec![
        Span::styled(" 1:Send ", tab_style(AppTab::Send, Color::Cyan)),
        Span::styled(" ●", Style::default().fg(phase_color(send_phase))),
        Span::raw("  "),
        Span::styled(" 2:Notes ", tab_style(AppTab::Notes, Color::Magenta)),
        Span::styled(" ●", Style::default().fg(phase_color(notes_phase))),
        Span::styled(format!("   {} ", APP_NAME), Style::default().fg(Color::DarkGray)),
    ];

    f.render_widget(Paragraph::new(Line::from(tabs)), area);
}

// ----------------------------------------------------------------------------
// Send tab
// ----------------------------------------------------------------------------

fn draw_send_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let sender = &state.sender;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Network warning
            Constraint::Length(6), // Wallet card
            Constraint::Length(3), // Recipient
            Constraint::Length(3), // Amount
            Constraint::Length(2), // Banner
            Constraint::Min(0),
        ])
        .split(area);

    if sender.wrong_network() {
        let warning = Paragraph::new(format!(
            " Wrong Network: please switch to {} (press n) ",
            SEPOLIA_NAME
        ))
        .style(Style::default().fg(Color::White).bg(Color::Red).bold());
        f.render_widget(warning, chunks[0]);
    }

    draw_wallet_card(f, state, chunks[1]);

    let editing = state.input_mode == InputMode::Editing;
    let fields = [
        (SendField::Recipient, sender.recipient.as_str(), " Recipient address ", chunks[2]),
        (SendField::Amount, sender.amount.as_str(), " Amount (ETH) ", chunks[3]),
    ];
    for (field, content, title, rect) in fields {
        let focused = sender.field == field;
        f.render_widget(render_input(content, title, focused, focused && editing), rect);
        if focused && editing {
            place_cursor(f, rect, content, state.cursor_position);
        }
    }

    let banner = if sender.sending {
        Some(Banner::info("Sending..."))
    } else {
        sender.banner.clone()
    };
    f.render_widget(render_banner(banner.as_ref()), chunks[4]);
}

fn draw_wallet_card(f: &mut Frame, state: &RenderState, area: Rect) {
    let sender = &state.sender;
    let phase = sender.phase();

    let lines = match sender.session.account {
        Some(account) => vec![
            Line::from(vec![Span::styled("Address: ", Style::default().bold()), Span::raw(account.to_string())]),
            Line::from(vec![
                Span::styled("Network: ", Style::default().bold()),
                Span::styled(
                    sender.session.network.display_name().to_string(),
                    Style::default().fg(network_color(&sender.session.network)),
                ),
            ]),
            Line::from(vec![
                Span::styled("Balance: ", Style::default().bold()),
                Span::raw(match &sender.balance {
                    Some(balance) => format!("{} ETH", balance),
                    None => "...".to_string(),
                }),
            ]),
        ],
        None if phase == Phase::Connecting => vec![Line::from("Waiting for the wallet...")],
        None => vec![
            Line::from("Wallet not connected."),
            Line::from(Span::styled("Press c to connect.", Style::default().fg(Color::DarkGray))),
        ],
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(phase_color(phase)))
        .title(format!(" Wallet - {} ", phase.label()));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

// ----------------------------------------------------------------------------
// Notes tab
// ----------------------------------------------------------------------------

fn draw_notes_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let notes = &state.notes;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(3), // Draft
            Constraint::Length(2), // Banner
            Constraint::Min(3),    // List
        ])
        .split(area);

    let account = match notes.session.account {
        Some(account) => Span::styled(short_address(&account), Style::default().fg(Color::Green)),
        None => Span::styled("not connected (press c)", Style::default().fg(Color::DarkGray)),
    };
    let synced = notes
        .last_synced
        .map(|t| format!("  synced {}", t.format("%H:%M:%S")))
        .unwrap_or_default();
    let fetching = if notes.fetching { "  [...]" } else { "" };
    let header = Line::from(vec![
        Span::styled(" Account: ", Style::default().bold()),
        account,
        Span::styled(format!("{}{}", synced, fetching), Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(header), chunks[0]);

    let editing = state.input_mode == InputMode::Editing;
    let title = if notes.adding { " Saving... " } else { " New note " };
    f.render_widget(render_input(&notes.draft, title, true, editing), chunks[1]);
    if editing {
        place_cursor(f, chunks[1], &notes.draft, state.cursor_position);
    }

    f.render_widget(render_banner(notes.banner.as_ref()), chunks[2]);

    let items: Vec<ListItem> = notes
        .notes
        .iter()
        .enumerate()
        .map(|(i, note)| {
            let style = if i == notes.selected {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default()
            };
            let mut spans = vec![Span::styled(format!("{:>3}. {}", i + 1, note.text), style)];
            if notes.is_copied(i) {
                spans.push(Span::styled("  ✓ copied", Style::default().fg(Color::Green)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list_title = format!(" Notes ({}) ", notes.notes.len());
    let list = if items.is_empty() {
        List::new(vec![ListItem::new(Span::styled(
            "No notes yet.",
            Style::default().fg(Color::DarkGray),
        ))])
    } else {
        List::new(items)
    };
    f.render_widget(list.block(Block::default().borders(Borders::ALL).title(list_title)), chunks[3]);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let status = if state.input_mode == InputMode::Editing {
        match state.active_tab {
            AppTab::Send => " ESC:stop editing | arrows:move | Tab:next field | Enter:next/send ",
            AppTab::Notes => " ESC:stop editing | arrows:move | Enter:add note ",
        }
    } else {
        match state.active_tab {
            AppTab::Send => " c:connect | n:switch network | e:edit | Tab:field | s:send | b:balance | ?:help | q:quit ",
            AppTab::Notes => " c:connect | e:edit | a:add | r:refresh | ↑↓:select | y:copy | ?:help | q:quit ",
        }
    };

    let bar = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);

    let help_text = r#"
 WALLET DESK - Keyboard Shortcuts

 GENERAL
   1 / 2              Send tab / Notes tab
   c                  Connect wallet
   ?                  Toggle this help
   q / Ctrl+C         Quit

 SEND
   Tab                Switch between recipient and amount
   e / Enter          Edit current field
   s                  Send transaction
   n                  Switch wallet to Sepolia
   b                  Refresh balance

 NOTES
   e / i              Edit draft
   a / s / Enter      Add note (Enter while editing)
   r                  Refresh notes
   ↑ / ↓ (k / j)      Select note
   y / Enter          Copy selected note

 Press any key to close...
"#;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let help = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}
