//! LoadingPanel component — status message and progress while a run is active.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{style_secondary, C_ACCENT, C_ERROR, C_LOADING, C_SUCCESS},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        progress_bar::draw_progress,
    },
};

pub struct LoadingPanel;

impl Component for LoadingPanel {
    fn id(&self) -> ComponentId {
        ComponentId::LoadingPanel
    }

    // The run owns the screen; only global keys apply.
    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let loading = &state.loading;
        let retry_text = format!("RETRY {}/{}", loading.attempt, loading.max_retries);
        let badge = if loading.retrying {
            Some(Badge {
                text: &retry_text,
                color: C_ERROR,
            })
        } else if loading.settling {
            Some(Badge {
                text: "FOUND",
                color: C_SUCCESS,
            })
        } else {
            None
        };
        let block = pane_chrome("Rolling", focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let color = if loading.retrying { C_ACCENT } else { C_LOADING };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                loading.status_text(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )))
            .centered(),
            rows[1],
        );

        let bar_area = Rect {
            x: rows[3].x + 2,
            width: rows[3].width.saturating_sub(4),
            ..rows[3]
        };
        draw_progress(frame, bar_area, loading.progress);

        let lists = state.last_urls.len();
        let detail = format!(
            "{} list{} · {}",
            lists,
            if lists == 1 { "" } else { "s" },
            state.base_url
        );
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(detail, style_secondary()))).centered(),
            rows[4],
        );
    }
}
