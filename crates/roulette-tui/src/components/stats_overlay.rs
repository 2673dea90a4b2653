//! StatsOverlay component — technical details of the last pick.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use roulette_core::config::ProtocolKind;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    render::{format_pool, rating_text, timing_lines},
    theme::{C_MUTED, C_PANEL_BORDER, C_POPUP_BG, C_PRIMARY, C_SECONDARY},
};

const POPUP_WIDTH_PCT: u16 = 56;
const POPUP_HEIGHT: u16 = 16;

pub struct StatsOverlay;

impl StatsOverlay {
    pub fn popup_area(area: Rect) -> Rect {
        super::centered_rect(POPUP_WIDTH_PCT, POPUP_HEIGHT, area)
    }
}

impl Component for StatsOverlay {
    fn id(&self) -> ComponentId {
        ComponentId::StatsOverlay
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Esc | KeyCode::F(2) | KeyCode::Char('s') | KeyCode::Char('q') => {
                vec![Action::CloseModal]
            }
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let popup = Self::popup_area(area);
        let mut lines = vec![
            Line::from(Span::styled(
                " pick stats",
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];

        match state.last_summary.as_ref() {
            None => lines.push(Line::from(Span::styled(
                " nothing picked yet",
                Style::default().fg(C_MUTED),
            ))),
            Some(last) => {
                lines.push(row("film", last.movie.clone()));
                lines.push(row("slug", last.slug.clone().unwrap_or_else(|| "—".to_string())));
                lines.push(row(
                    "rating",
                    last.rating.map(rating_text).unwrap_or_else(|| "—".to_string()),
                ));
                lines.push(row("pool", format_pool(last.stats.total_pool)));
                lines.push(row("odds", format!("{}%", last.stats.probability)));
                if let Some(timing) = last.stats.timing.as_ref() {
                    for (label, value) in timing_lines(timing) {
                        lines.push(row(label, value));
                    }
                }
            }
        }

        lines.push(Line::from(""));
        let protocol = match state.protocol {
            ProtocolKind::SingleCall => "single call",
            ProtocolKind::MultiStep => "multi-step",
        };
        lines.push(row("backend", format!("{} ({})", state.base_url, protocol)));

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(C_PANEL_BORDER))
                    .style(Style::default().bg(C_POPUP_BG)),
            ),
            popup,
        );
    }
}

fn row(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {:<10}", label), Style::default().fg(C_MUTED)),
        Span::styled(value, Style::default().fg(C_SECONDARY)),
    ])
}
