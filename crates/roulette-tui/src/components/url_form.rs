//! UrlForm component — the numbered list URL slots and the pick button.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
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
    fields::FieldManager,
    theme::{style_accent, style_input, style_muted, style_secondary, C_NUMBER_HINT},
    widgets::pane_chrome::{pane_chrome, Badge},
};

pub struct UrlForm {
    selected: usize,
}

impl UrlForm {
    pub fn new() -> Self {
        Self { selected: 0 }
    }

    #[cfg(test)]
    pub fn selected(&self) -> usize {
        self.selected
    }

    fn clamp(&mut self, fields: &FieldManager) {
        self.selected = self.selected.min(fields.len().saturating_sub(1));
    }
}

impl Default for UrlForm {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for UrlForm {
    fn id(&self) -> ComponentId {
        ComponentId::UrlForm
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || !state.controls_enabled {
            return vec![];
        }
        self.clamp(&state.fields);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => vec![Action::Submit],
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                vec![]
            }
            KeyCode::Down => {
                self.selected = (self.selected + 1).min(state.fields.len().saturating_sub(1));
                vec![]
            }
            KeyCode::Char('n') if ctrl => vec![Action::AddSlot],
            KeyCode::Char('d') if ctrl => vec![Action::RemoveSlot(self.selected)],
            _ => vec![Action::EditSlot(self.selected, key)],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action> {
        if !matches!(event.kind, MouseEventKind::Down(MouseButton::Left)) || !state.controls_enabled
        {
            return vec![];
        }
        // Rows inside the border: one per slot, then the add line.
        let inner_top = area.y + 1;
        if event.row < inner_top {
            return vec![];
        }
        let row = (event.row - inner_top) as usize;
        if row < state.fields.len() {
            self.selected = row;
            vec![]
        } else if row == state.fields.len() && !state.fields.is_full() {
            vec![Action::AddSlot]
        } else {
            vec![]
        }
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        match action {
            // Runs before the App applies the add, so `len` is the new index.
            Action::AddSlot if !state.fields.is_full() => self.selected = state.fields.len(),
            Action::RemoveSlot(i) if *i < self.selected => self.selected -= 1,
            Action::FocusPane(ComponentId::UrlForm) => self.clamp(&state.fields),
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        self.clamp(&state.fields);
        let fields = &state.fields;
        let count = format!("{}/{}", fields.len(), fields.capacity());
        let block = pane_chrome(
            "Letterboxd lists",
            focused,
            Some(Badge {
                text: &count,
                color: C_NUMBER_HINT,
            }),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 || inner.width < 8 {
            return;
        }

        let mut lines: Vec<Line> = Vec::with_capacity(fields.len() + 3);
        for i in 0..fields.len() {
            let value = fields.value(i);
            let is_selected = focused && i == self.selected;
            let marker = if is_selected { "▸" } else { " " };
            let number = Span::styled(
                format!("{} {} ", marker, i + 1),
                Style::default()
                    .fg(C_NUMBER_HINT)
                    .add_modifier(Modifier::BOLD),
            );
            let width = inner.width.saturating_sub(5) as usize;
            let body = if value.is_empty() {
                Span::styled(
                    super::truncate(FieldManager::placeholder(i), width),
                    style_muted(),
                )
            } else if is_selected {
                Span::styled(super::truncate(value, width), style_input())
            } else {
                Span::styled(super::truncate(value, width), style_secondary())
            };
            lines.push(Line::from(vec![number, body]));
        }
        if !fields.is_full() {
            lines.push(Line::from(Span::styled(
                "  + add another list (Ctrl+N)",
                style_muted(),
            )));
        }
        lines.push(Line::from(""));
        let button = if state.controls_enabled {
            Span::styled("  [ Enter ] PICK A MOVIE", style_accent())
        } else {
            Span::styled("  picking…", style_muted())
        };
        lines.push(Line::from(button));

        frame.render_widget(Paragraph::new(lines), inner);

        if focused && state.controls_enabled {
            if let Some(input) = fields.input(self.selected) {
                let width = inner.width.saturating_sub(5) as usize;
                let scroll = input.visual_scroll(width);
                let x = inner.x + 4 + (input.visual_cursor().saturating_sub(scroll)) as u16;
                let y = inner.y + self.selected as u16;
                if y < inner.y + inner.height {
                    frame.set_cursor_position((x.min(inner.x + inner.width - 1), y));
                }
            }
        }
    }
}
