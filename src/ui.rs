use ratatui::{prelude::*, widgets::*};

use crate::app::state::{Banner, BannerLevel, Phase};
use crate::models::Network;

/// Renders a text input field, highlighted while focused or being edited
pub fn render_input<'a>(content: &'a str, title: &'a str, is_focused: bool, is_editing: bool) -> Paragraph<'a> {
    let style = if is_editing {
        Style::default().fg(Color::Yellow)
    } else if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title);

    Paragraph::new(content).block(block)
}

/// Screen column of a byte offset into `content`
pub fn cursor_column(content: &str, byte_pos: usize) -> u16 {
    let prefix = content.get(..byte_pos).unwrap_or(content);
    u16::try_from(prefix.chars().count()).unwrap_or(u16::MAX)
}

/// Place the terminal cursor inside a bordered single-line input
pub fn place_cursor(f: &mut Frame, area: Rect, content: &str, cursor_position: usize) {
    let max_x = area.x + area.width.saturating_sub(2);
    let column = cursor_column(content, cursor_position);
    let cursor_x = area.x.saturating_add(column).saturating_add(1).min(max_x);
    f.set_cursor_position(Position::new(cursor_x, area.y + 1));
}

/// Renders a banner line, or nothing when there is no banner
pub fn render_banner(banner: Option<&Banner>) -> Paragraph<'_> {
    match banner {
        Some(banner) => Paragraph::new(format!(" {} ", banner.text))
            .style(Style::default().fg(Color::Black).bg(banner_color(banner.level)).bold())
            .wrap(Wrap { trim: true }),
        None => Paragraph::new(""),
    }
}

/// Banner background color
pub fn banner_color(level: BannerLevel) -> Color {
    match level {
        BannerLevel::Info => Color::Cyan,
        BannerLevel::Success => Color::Green,
        BannerLevel::Error => Color::Red,
    }
}

/// Phase color
pub fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Disconnected => Color::DarkGray,
        Phase::Connecting => Color::Yellow,
        Phase::Connected { network_ok: true } => Color::Green,
        Phase::Connected { network_ok: false } => Color::Red,
        Phase::Submitting => Color::Magenta,
    }
}

/// Network color
pub fn network_color(network: &Network) -> Color {
    match network {
        Network::Expected => Color::Green,
        Network::Wrong(_) => Color::Red,
        Network::Unknown => Color::DarkGray,
    }
}

/// Rect of the given percentage size centered in `r`
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
