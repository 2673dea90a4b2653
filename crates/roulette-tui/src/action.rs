//! Action enum — all user-initiated intents and internal events.

use ratatui::crossterm::event::KeyEvent;

use crate::view::View;

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    UrlForm,
    HistoryPanel,
    LoadingPanel,
    ResultPanel,
    InfoOverlay,
    StatsOverlay,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── URL slots ────────────────────────────────────────────────────────────
    AddSlot,
    RemoveSlot(usize),
    EditSlot(usize, KeyEvent),
    /// Recent-list shortcut: fill a free slot with the URL, or take it out.
    ToggleUrl(String),
    /// A slot was added, removed or edited.
    FieldsChanged,

    // ── Orchestration ────────────────────────────────────────────────────────
    Submit,
    TryAgain,

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),
    ShowView(View),
    OpenModal(View),
    CloseModal,

    // ── Store ────────────────────────────────────────────────────────────────
    ClearHistory,
    ClearRecent,
    /// Slots or store changed; reload the history/recent display.
    RefreshHistory,

    // ── Clipboard ────────────────────────────────────────────────────────────
    CopyShareLink,
    CopyToClipboard(String),

    // ── System ───────────────────────────────────────────────────────────────
    DismissBanner,
    Quit,
}
