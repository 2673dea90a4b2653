//! FieldManager — the bounded, ordered list of URL input slots.
//!
//! Slot labels are derived from position, so every mutation renumbers
//! implicitly. There is always at least one slot.

use ratatui::crossterm::event::{Event, KeyEvent};
use tui_input::{backend::crossterm::EventHandler, Input};

pub const REQUIRED_PLACEHOLDER: &str = "Paste your list URL here…";
pub const OPTIONAL_PLACEHOLDER: &str = "(Optional) Another list URL…";

pub struct FieldManager {
    slots: Vec<Input>,
    capacity: usize,
}

impl FieldManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Input::default()],
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The "add another" affordance is hidden once this is true.
    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    pub fn input(&self, index: usize) -> Option<&Input> {
        self.slots.get(index)
    }

    pub fn value(&self, index: usize) -> &str {
        self.slots.get(index).map(|i| i.value()).unwrap_or("")
    }

    pub fn placeholder(index: usize) -> &'static str {
        if index == 0 {
            REQUIRED_PLACEHOLDER
        } else {
            OPTIONAL_PLACEHOLDER
        }
    }

    /// Append a slot. No-op at capacity.
    pub fn add(&mut self, value: &str) -> bool {
        if self.is_full() {
            return false;
        }
        self.slots.push(Input::new(value.to_string()));
        true
    }

    /// Remove a slot, or clear it when it is the only one.
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.slots.len() {
            return false;
        }
        if self.slots.len() > 1 {
            self.slots.remove(index);
        } else {
            self.slots[0] = Input::default();
        }
        true
    }

    /// Take `url` out if a slot already holds it; otherwise put it in the
    /// first empty slot, a new slot, or (when full) over slot 1.
    pub fn toggle_url(&mut self, url: &str) {
        let url = url.trim();
        if url.is_empty() {
            return;
        }
        if let Some(pos) = self.slots.iter().position(|s| s.value().trim() == url) {
            self.remove(pos);
            return;
        }
        if let Some(empty) = self.slots.iter_mut().find(|s| s.value().trim().is_empty()) {
            *empty = Input::new(url.to_string());
            return;
        }
        if !self.add(url) {
            self.slots[0] = Input::new(url.to_string());
        }
    }

    /// Replace every slot: the first URL in slot 1, the rest appended.
    pub fn seed(&mut self, urls: &[String]) {
        self.slots = vec![Input::default()];
        let mut urls = urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty());
        if let Some(first) = urls.next() {
            self.slots[0] = Input::new(first.to_string());
        }
        for url in urls {
            if !self.add(url) {
                break;
            }
        }
    }

    /// Trimmed, non-empty values in slot order.
    pub fn urls(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|s| s.value().trim())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
            .collect()
    }

    /// Feed a key into one slot's editor. Returns whether the text changed.
    pub fn handle_key(&mut self, index: usize, key: KeyEvent) -> bool {
        match self.slots.get_mut(index) {
            Some(input) => input
                .handle_event(&Event::Key(key))
                .is_some_and(|changed| changed.value),
            None => false,
        }
    }
}
