//! Status bar — bottom line with the current view, backend and keybindings.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use roulette_core::config::ProtocolKind;

use crate::theme::{C_MODE_BUSY, C_MODE_FORM, C_MODE_MODAL, C_MUTED, C_SECONDARY, C_SEPARATOR};
use crate::view::View;

fn keys_for(view: View) -> &'static str {
    match view {
        View::Form => {
            " Enter pick  Tab pane  ↑↓ slot  Ctrl+N add  Ctrl+D remove  F1 info  F2 stats  Ctrl+C quit"
        }
        View::Loading => " picking…  Ctrl+C quit",
        View::Result => {
            " r try again  e edit lists  y copy film  l copy share link  s stats  F1 info  Ctrl+C quit"
        }
        View::Info | View::Stats => " Esc close  click outside to close",
    }
}

pub fn draw_keys_bar(frame: &mut Frame, area: Rect, view: View, protocol: ProtocolKind) {
    let color = match view {
        View::Form | View::Result => C_MODE_FORM,
        View::Loading => C_MODE_BUSY,
        View::Info | View::Stats => C_MODE_MODAL,
    };
    let protocol_label = match protocol {
        ProtocolKind::SingleCall => "single",
        ProtocolKind::MultiStep => "multi",
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", view.label()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("[{}]", protocol_label), Style::default().fg(C_SECONDARY)),
        Span::styled(keys_for(view), Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw a horizontal separator line.
pub fn draw_separator(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(C_SEPARATOR),
    ));
    frame.render_widget(Paragraph::new(line), area);
}
