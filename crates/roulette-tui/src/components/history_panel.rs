//! HistoryPanel component — recently used lists and past picks.
//!
//! Two tabs share one pane. On the lists tab Enter drops the URL into a free
//! slot (or takes it back out if a slot already holds it); on the picks tab it
//! copies the film link.

use chrono::Utc;
use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    render::relative_time,
    theme::{style_muted, style_secondary, style_selected_focused, C_ACCENT, C_NUMBER_HINT, C_PRIMARY},
    widgets::pane_chrome::pane_chrome,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Lists,
    Picks,
}

pub struct HistoryPanel {
    tab: Tab,
    selected: usize,
}

impl HistoryPanel {
    pub fn new() -> Self {
        Self {
            tab: Tab::Lists,
            selected: 0,
        }
    }

    #[cfg(test)]
    pub fn tab(&self) -> Tab {
        self.tab
    }

    fn row_count(&self, state: &AppState) -> usize {
        match self.tab {
            Tab::Lists => state.recent.len(),
            Tab::Picks => state.history.len(),
        }
    }

    fn switch(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.selected = 0;
        }
    }

    fn activate(&self, state: &AppState) -> Vec<Action> {
        match self.tab {
            Tab::Lists => state
                .recent
                .get(self.selected)
                .map(|url| vec![Action::ToggleUrl(url.clone())])
                .unwrap_or_default(),
            Tab::Picks => state
                .history
                .get(self.selected)
                .map(|entry| vec![Action::CopyToClipboard(entry.result.movie.url.clone())])
                .unwrap_or_default(),
        }
    }
}

impl Default for HistoryPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for HistoryPanel {
    fn id(&self) -> ComponentId {
        ComponentId::HistoryPanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let rows = self.row_count(state);
        match key.code {
            KeyCode::Left => self.switch(Tab::Lists),
            KeyCode::Right => self.switch(Tab::Picks),
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1).min(rows.saturating_sub(1));
            }
            KeyCode::Enter if state.controls_enabled => return self.activate(state),
            KeyCode::Char('x') => {
                return match self.tab {
                    Tab::Lists => vec![Action::ClearRecent],
                    Tab::Picks => vec![Action::ClearHistory],
                };
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action> {
        if !matches!(event.kind, MouseEventKind::Down(MouseButton::Left)) {
            return vec![];
        }
        // Border row, then the tab strip.
        let first_row = area.y + 2;
        if event.row == area.y + 1 {
            let mid = area.x + area.width / 2;
            self.switch(if event.column < mid { Tab::Lists } else { Tab::Picks });
            return vec![];
        }
        if event.row < first_row {
            return vec![];
        }
        let row = (event.row - first_row) as usize;
        if row < self.row_count(state) {
            self.selected = row;
            if state.controls_enabled {
                return self.activate(state);
            }
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if matches!(action, Action::ClearHistory | Action::ClearRecent | Action::RefreshHistory) {
            self.selected = 0;
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome("History", focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height < 2 || inner.width < 10 {
            return;
        }

        let tab_style = |tab: Tab| {
            if self.tab == tab {
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)
            } else {
                style_muted()
            }
        };
        let mut lines = vec![Line::from(vec![
            Span::styled(format!(" Recent lists ({}) ", state.recent.len()), tab_style(Tab::Lists)),
            Span::styled("│", style_muted()),
            Span::styled(format!(" Past picks ({}) ", state.history.len()), tab_style(Tab::Picks)),
        ])];

        let width = inner.width as usize;
        let rows = self.row_count(state);
        self.selected = self.selected.min(rows.saturating_sub(1));
        let visible = inner.height.saturating_sub(1) as usize;
        let offset = self.selected.saturating_sub(visible.saturating_sub(1));

        if rows == 0 {
            let empty = match self.tab {
                Tab::Lists => "  lists you pick from show up here",
                Tab::Picks => "  your picks show up here",
            };
            lines.push(Line::from(Span::styled(empty, style_muted())));
        }

        let now = Utc::now();
        for i in offset..rows.min(offset + visible) {
            let highlighted = focused && i == self.selected;
            let line = match self.tab {
                Tab::Lists => {
                    let url = &state.recent[i];
                    let slot = match state.slot_of(url) {
                        Some(pos) => format!(" [{}] ", pos + 1),
                        None => "  ·  ".to_string(),
                    };
                    let body = super::truncate(url, width.saturating_sub(slot.len()));
                    Line::from(vec![
                        Span::styled(slot, Style::default().fg(C_NUMBER_HINT)),
                        Span::styled(body, Style::default().fg(C_PRIMARY)),
                    ])
                }
                Tab::Picks => {
                    let entry = &state.history[i];
                    let when = relative_time(entry.saved_at, now);
                    let movie = &entry.result.movie;
                    let title = match movie.year.as_deref() {
                        Some(year) => format!(" {} ({})", movie.name, year),
                        None => format!(" {}", movie.name),
                    };
                    let room = width.saturating_sub(when.len() + 3);
                    Line::from(vec![
                        Span::styled(super::truncate(&title, room), Style::default().fg(C_PRIMARY)),
                        Span::styled(format!("  {}", when), style_secondary()),
                    ])
                }
            };
            lines.push(if highlighted {
                line.style(style_selected_focused())
            } else {
                line
            });
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roulette_core::Config;

    #[test]
    fn enter_on_recent_list_toggles_it() {
        let mut state = AppState::new(&Config::default());
        state.recent = vec!["a".to_string(), "b".to_string()];
        let mut panel = HistoryPanel::new();
        panel.handle_key(KeyEvent::from(KeyCode::Down), &state);
        let actions = panel.handle_key(KeyEvent::from(KeyCode::Enter), &state);
        assert!(matches!(actions.as_slice(), [Action::ToggleUrl(url)] if url == "b"));
    }

    #[test]
    fn clear_targets_the_active_tab() {
        let state = AppState::new(&Config::default());
        let mut panel = HistoryPanel::new();
        assert!(matches!(
            panel.handle_key(KeyEvent::from(KeyCode::Char('x')), &state).as_slice(),
            [Action::ClearRecent]
        ));
        panel.handle_key(KeyEvent::from(KeyCode::Right), &state);
        assert_eq!(panel.tab(), Tab::Picks);
        assert!(matches!(
            panel.handle_key(KeyEvent::from(KeyCode::Char('x')), &state).as_slice(),
            [Action::ClearHistory]
        ));
    }
}
