//! View switching and the error banner.
//!
//! Exactly one view is shown at a time. `Info` and `Stats` are modal: they
//! draw over the view beneath and closing them returns there.

use std::time::{Duration, Instant};

use ratatui::layout::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Form,
    Loading,
    Result,
    Info,
    Stats,
}

impl View {
    pub fn is_modal(self) -> bool {
        matches!(self, View::Info | View::Stats)
    }

    pub fn label(self) -> &'static str {
        match self {
            View::Form => "FORM",
            View::Loading => "LOADING",
            View::Result => "RESULT",
            View::Info => "INFO",
            View::Stats => "STATS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewController {
    current: View,
    /// View shown beneath an open modal.
    base: View,
}

impl ViewController {
    pub fn new() -> Self {
        Self {
            current: View::Form,
            base: View::Form,
        }
    }

    pub fn current(&self) -> View {
        self.current
    }

    /// The non-modal view, whether or not a modal is open over it.
    pub fn base(&self) -> View {
        self.base
    }

    pub fn set_view(&mut self, view: View) {
        if view.is_modal() {
            self.open_modal(view);
        } else {
            self.current = view;
            self.base = view;
        }
    }

    pub fn open_modal(&mut self, view: View) {
        if !self.current.is_modal() {
            self.base = self.current;
        }
        self.current = view;
    }

    pub fn close_modal(&mut self) -> bool {
        if self.current.is_modal() {
            self.current = self.base;
            return true;
        }
        false
    }

    /// A click at (col, row). Closes an open modal when it lands outside the
    /// popup content.
    pub fn backdrop_click(&mut self, popup: Rect, col: u16, row: u16) -> bool {
        if !self.current.is_modal() || contains(popup, col, row) {
            return false;
        }
        self.close_modal()
    }
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new()
    }
}

pub fn contains(r: Rect, col: u16, row: u16) -> bool {
    r.width > 0
        && r.height > 0
        && col >= r.x
        && col < r.x + r.width
        && row >= r.y
        && row < r.y + r.height
}

/// Transient error overlay with one pending dismissal at most.
#[derive(Debug, Clone)]
pub struct ErrorBanner {
    message: Option<String>,
    dismiss_at: Option<Instant>,
    duration: Duration,
}

impl ErrorBanner {
    pub fn new(duration: Duration) -> Self {
        Self {
            message: None,
            dismiss_at: None,
            duration,
        }
    }

    /// Show `message`, replacing any pending dismissal.
    pub fn show(&mut self, message: impl Into<String>, now: Instant) {
        self.message = Some(message.into());
        self.dismiss_at = Some(now + self.duration);
    }

    pub fn hide(&mut self) {
        self.message = None;
        self.dismiss_at = None;
    }

    /// Expire the banner once its dismissal time has passed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.dismiss_at {
            Some(at) if now >= at => {
                self.hide();
                true
            }
            _ => false,
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[cfg(test)]
    pub fn is_visible(&self) -> bool {
        self.message.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_view_shows_exactly_one() {
        let mut views = ViewController::new();
        views.set_view(View::Loading);
        assert_eq!(views.current(), View::Loading);
        views.set_view(View::Result);
        assert_eq!(views.current(), View::Result);
        assert_eq!(views.base(), View::Result);
    }

    #[test]
    fn modal_returns_to_view_beneath() {
        let mut views = ViewController::new();
        views.set_view(View::Result);
        views.open_modal(View::Stats);
        assert_eq!(views.current(), View::Stats);
        // Switching modal keeps the original base.
        views.open_modal(View::Info);
        assert!(views.close_modal());
        assert_eq!(views.current(), View::Result);
        assert!(!views.close_modal());
    }

    #[test]
    fn backdrop_click_closes_only_outside_popup() {
        let mut views = ViewController::new();
        views.set_view(View::Info);
        let popup = Rect::new(10, 5, 20, 10);
        assert!(!views.backdrop_click(popup, 15, 8));
        assert_eq!(views.current(), View::Info);
        assert!(views.backdrop_click(popup, 2, 2));
        assert_eq!(views.current(), View::Form);
    }

    #[test]
    fn banner_dismisses_after_duration_and_resets_on_new_error() {
        let start = Instant::now();
        let mut banner = ErrorBanner::new(Duration::from_secs(4));
        banner.show("first", start);
        assert!(!banner.tick(start + Duration::from_secs(3)));
        banner.show("second", start + Duration::from_secs(3));
        // The first deadline no longer applies.
        assert!(!banner.tick(start + Duration::from_secs(5)));
        assert_eq!(banner.message(), Some("second"));
        assert!(banner.tick(start + Duration::from_secs(7)));
        assert!(!banner.is_visible());
    }
}
