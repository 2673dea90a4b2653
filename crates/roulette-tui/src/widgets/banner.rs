//! Error banner and short-lived notices, drawn over whatever view is showing.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::theme::{C_ERROR, C_SUCCESS};
use crate::view::ErrorBanner;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Success,
    Error,
}

struct Notice {
    message: String,
    severity: Severity,
    expires: Instant,
}

/// Clipboard confirmations and similar one-liners.
pub struct NoticeQueue {
    notices: VecDeque<Notice>,
    max_visible: usize,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self {
            notices: VecDeque::new(),
            max_visible: 3,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity, duration: Duration) {
        let msg = message.into();
        self.notices.retain(|n| n.message != msg);
        self.notices.push_back(Notice {
            message: msg,
            severity,
            expires: Instant::now() + duration,
        });
        while self.notices.len() > self.max_visible {
            self.notices.pop_front();
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Success, Duration::from_secs(3));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Error, Duration::from_secs(5));
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.notices.retain(|n| n.expires > now);
    }

    /// Render notices in the bottom-right corner of `area`, newest lowest.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let max_width = (area.width / 2).clamp(20, 60);
        let mut y = area.y + area.height.saturating_sub(2);
        for notice in self.notices.iter().rev() {
            if y <= area.y {
                break;
            }
            let (color, icon) = match notice.severity {
                Severity::Success => (C_SUCCESS, "✓"),
                Severity::Error => (C_ERROR, "✗"),
            };
            let w = (notice.message.chars().count() as u16 + 4).min(max_width);
            let rect = Rect {
                x: area.x + area.width.saturating_sub(w + 1),
                y,
                width: w,
                height: 1,
            };
            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    format!(" {} {} ", icon, notice.message),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ))),
                rect,
            );
            y -= 1;
        }
    }
}

impl Default for NoticeQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Full-width strip across the top of `area`.
pub fn draw_error_banner(frame: &mut Frame, area: Rect, banner: &ErrorBanner) {
    let Some(message) = banner.message() else {
        return;
    };
    if area.height == 0 {
        return;
    }
    let rect = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: 1,
    };
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                " ✗ ",
                Style::default().fg(C_ERROR).add_modifier(Modifier::BOLD),
            ),
            Span::styled(message, Style::default().fg(C_ERROR)),
        ]))
        .style(Style::default().bg(ratatui::style::Color::Rgb(48, 16, 16))),
        rect,
    );
}
