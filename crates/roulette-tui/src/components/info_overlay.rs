//! InfoOverlay component — what the picker does and the key reference.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_MUTED, C_PANEL_BORDER, C_POPUP_BG, C_PRIMARY, C_SECONDARY},
};

const POPUP_WIDTH_PCT: u16 = 68;
const POPUP_HEIGHT: u16 = 26;

pub struct InfoOverlay;

impl InfoOverlay {
    pub fn popup_area(area: Rect) -> Rect {
        super::centered_rect(POPUP_WIDTH_PCT, POPUP_HEIGHT, area)
    }
}

impl Component for InfoOverlay {
    fn id(&self) -> ComponentId {
        ComponentId::InfoOverlay
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q') => vec![Action::CloseModal],
            // Consume all other keys while the overlay is open
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, _state: &AppState) {
        let popup = Self::popup_area(area);

        let lines: Vec<Line> = vec![
            Line::from(Span::styled(
                " movie roulette",
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                " Paste up to five Letterboxd list URLs. Every film across all of them goes \
                 into one pool and one is drawn at random, so bigger lists get proportionally \
                 more chances.",
                Style::default().fg(C_SECONDARY),
            )),
            Line::from(""),
            section(" form"),
            help_row("enter", "pick a film from the pooled lists"),
            help_row("↑ / ↓", "move between slots"),
            help_row("ctrl+n / ctrl+d", "add / remove a slot"),
            help_row("tab", "switch to history"),
            Line::from(""),
            section(" history"),
            help_row("← / →", "recent lists / past picks"),
            help_row("enter", "toggle list into a slot / copy film link"),
            help_row("x", "clear the active tab"),
            Line::from(""),
            section(" result"),
            help_row("r", "try again with the same lists"),
            help_row("e / esc", "back to the form"),
            help_row("y / l", "copy film link / share link"),
            help_row("s", "pick stats"),
            Line::from(""),
            Line::from(Span::styled(
                " esc or click outside to close",
                Style::default().fg(C_MUTED),
            )),
        ];

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(C_PANEL_BORDER))
                        .style(Style::default().bg(C_POPUP_BG)),
                )
                .wrap(Wrap { trim: false }),
            popup,
        );
    }
}

fn section(title: &str) -> Line<'_> {
    Line::from(Span::styled(
        title,
        Style::default().fg(C_MUTED).add_modifier(Modifier::BOLD),
    ))
}

fn help_row<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!("{:<18}", key),
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        ),
        Span::styled(desc, Style::default().fg(C_SECONDARY)),
    ])
}
