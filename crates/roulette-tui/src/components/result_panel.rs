//! ResultPanel component — the picked film.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    render::{byline, format_pool, probability_text, rating_text, stars, Star},
    theme::{style_muted, style_secondary, C_ACCENT, C_LOADING, C_MUTED, C_PRIMARY, C_STARS},
    view::View,
    widgets::pane_chrome::pane_chrome,
};

pub struct ResultPanel;

impl Component for ResultPanel {
    fn id(&self) -> ComponentId {
        ComponentId::ResultPanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let Some(result) = state.last_result.as_ref() else {
            return vec![Action::ShowView(View::Form)];
        };
        match key.code {
            KeyCode::Char('r') | KeyCode::Enter => vec![Action::TryAgain],
            KeyCode::Char('e') | KeyCode::Esc | KeyCode::Backspace => {
                vec![Action::ShowView(View::Form)]
            }
            KeyCode::Char('y') => vec![Action::CopyToClipboard(result.movie.url.clone())],
            KeyCode::Char('l') => vec![Action::CopyShareLink],
            KeyCode::Char('s') => vec![Action::OpenModal(View::Stats)],
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome("Tonight's pick", focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let Some(result) = state.last_result.as_ref() else {
            return;
        };
        let movie = &result.movie;

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("  {}", movie.name),
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(format!("  {}", byline(result)), style_secondary())),
        ];

        if let Some(row) = stars(movie.rating) {
            let mut spans = vec![Span::raw("  ")];
            for star in row {
                let style = match star {
                    Star::Empty => Style::default().fg(C_MUTED),
                    _ => Style::default().fg(C_STARS),
                };
                spans.push(Span::styled(star.glyph(), style));
            }
            if let Some(rating) = movie.rating {
                spans.push(Span::styled(format!(" {}", rating_text(rating)), style_secondary()));
            }
            lines.push(Line::from(spans));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("  link    ", style_muted()),
            Span::styled(movie.url.as_str(), Style::default().fg(C_LOADING)),
        ]));
        if let Some(poster) = movie.poster.as_deref() {
            lines.push(Line::from(vec![
                Span::styled("  poster  ", style_muted()),
                Span::styled(poster, style_secondary()),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("  pool    ", style_muted()),
            Span::styled(
                format!("{} films", format_pool(result.stats.total_pool)),
                Style::default().fg(C_PRIMARY),
            ),
        ]));
        lines.push(Line::from(vec![
            Span::styled("  odds    ", style_muted()),
            Span::styled(
                probability_text(&result.stats),
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
            ),
        ]));

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
}
