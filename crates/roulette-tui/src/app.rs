//! App — component-based event loop.
//!
//! Architecture:
//! - `App` owns all components and `AppState` (shared read-only data for components).
//! - Terminal input arrives over an mpsc channel fed by a blocking reader task.
//! - Run events arrive on a second channel from the orchestrator task.
//! - Components return `Vec<Action>`; App dispatches each Action.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use roulette_core::orchestrator::{Orchestrator, RunEvent, RunHandle};
use roulette_core::{share, Config, Store};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::{
        history_panel::HistoryPanel, info_overlay::InfoOverlay, loading_panel::LoadingPanel,
        result_panel::ResultPanel, stats_overlay::StatsOverlay, url_form::UrlForm,
    },
    focus::FocusRing,
    theme::{style_secondary, C_ACCENT, C_BG},
    view::{contains, View},
    widgets::{
        banner::{draw_error_banner, NoticeQueue},
        status_bar,
    },
};

/// Last-drawn rects, for mouse hit-testing.
#[derive(Debug, Default, Clone, Copy)]
struct PaneAreas {
    main: Rect,
    url_form: Rect,
    history: Rect,
}

pub struct App {
    state: AppState,
    config: Config,
    orchestrator: Arc<Orchestrator>,
    store: Arc<dyn Store>,

    run_tx: mpsc::UnboundedSender<RunEvent>,
    run_rx: mpsc::UnboundedReceiver<RunEvent>,
    run_handle: Option<RunHandle>,

    // ── Components ───────────────────────────────────────────────────────────
    url_form: UrlForm,
    history_panel: HistoryPanel,
    loading_panel: LoadingPanel,
    result_panel: ResultPanel,
    info_overlay: InfoOverlay,
    stats_overlay: StatsOverlay,

    focus: FocusRing,
    pane_areas: PaneAreas,
    notices: NoticeQueue,
    /// Submitted once on startup when the slots were seeded from a link.
    auto_start: bool,
    should_quit: bool,
}

impl App {
    pub fn new(
        config: Config,
        orchestrator: Arc<Orchestrator>,
        store: Arc<dyn Store>,
        seed_urls: Vec<String>,
    ) -> Self {
        let mut state = AppState::new(&config);
        state.protocol = orchestrator.protocol();
        state.history = store.history();
        state.recent = store.recent_lists();
        let auto_start = !seed_urls.is_empty();
        if auto_start {
            state.fields.seed(&seed_urls);
        }
        let (run_tx, run_rx) = mpsc::unbounded_channel();

        Self {
            state,
            config,
            orchestrator,
            store,
            run_tx,
            run_rx,
            run_handle: None,
            url_form: UrlForm::new(),
            history_panel: HistoryPanel::new(),
            loading_panel: LoadingPanel,
            result_panel: ResultPanel,
            info_overlay: InfoOverlay,
            stats_overlay: StatsOverlay,
            focus: FocusRing::new(vec![ComponentId::UrlForm, ComponentId::HistoryPanel]),
            pane_areas: PaneAreas::default(),
            notices: NoticeQueue::new(),
            auto_start,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        // ── Background task: keyboard/mouse events ────────────────────────────
        let (event_tx, mut event_rx) = mpsc::channel::<Event>(256);
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(ev).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // Banner expiry and notice fade.
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        self.start_seeded();

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(ev) = event_rx.recv() => {
                    let actions = match ev {
                        Event::Key(key) => self.handle_key(key),
                        Event::Mouse(mouse) => self.handle_mouse(mouse),
                        _ => vec![],
                    };
                    for action in actions {
                        self.dispatch(action);
                    }
                    needs_redraw = true;
                }

                Some(run_event) = self.run_rx.recv() => {
                    self.handle_run_event(run_event);
                    // Drain whatever else is queued before the next frame.
                    while let Ok(next) = self.run_rx.try_recv() {
                        self.handle_run_event(next);
                    }
                    needs_redraw = true;
                }

                _ = ui_tick.tick() => {
                    self.state.tick(Instant::now());
                    self.notices.tick();
                    needs_redraw = true;
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        if let Some(handle) = self.run_handle.take() {
            handle.abort();
        }
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    /// Submit the link-seeded slots once. Later calls do nothing.
    fn start_seeded(&mut self) {
        if std::mem::take(&mut self.auto_start) {
            info!("starting seeded run with {} list(s)", self.state.fields.urls().len());
            self.dispatch(Action::Submit);
        }
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }

        // Global keys — always active regardless of focus/view
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
        {
            return vec![Action::Quit];
        }

        let view = self.state.view();
        match view {
            View::Info => return self.info_overlay.handle_key(key, &self.state),
            View::Stats => return self.stats_overlay.handle_key(key, &self.state),
            View::Loading => return self.loading_panel.handle_key(key, &self.state),
            View::Form | View::Result => {}
        }

        match key.code {
            KeyCode::F(1) => return vec![Action::OpenModal(View::Info)],
            KeyCode::F(2) => return vec![Action::OpenModal(View::Stats)],
            _ => {}
        }

        if view == View::Result {
            return self.result_panel.handle_key(key, &self.state);
        }

        match key.code {
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            KeyCode::Esc => return vec![Action::DismissBanner],
            _ => {}
        }

        match self.focus.current() {
            Some(ComponentId::HistoryPanel) => self.history_panel.handle_key(key, &self.state),
            _ => self.url_form.handle_key(key, &self.state),
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        let (col, row) = (event.column, event.row);
        match self.state.view() {
            View::Info | View::Stats => {
                if !matches!(
                    event.kind,
                    event::MouseEventKind::Down(event::MouseButton::Left)
                ) {
                    return vec![];
                }
                let popup = match self.state.view() {
                    View::Info => InfoOverlay::popup_area(self.pane_areas.main),
                    _ => StatsOverlay::popup_area(self.pane_areas.main),
                };
                if self.state.views.backdrop_click(popup, col, row) {
                    debug!("modal closed by backdrop click");
                }
                vec![]
            }
            View::Form => {
                let areas = self.pane_areas;
                let target = if contains(areas.url_form, col, row) {
                    Some((ComponentId::UrlForm, areas.url_form))
                } else if contains(areas.history, col, row) {
                    Some((ComponentId::HistoryPanel, areas.history))
                } else {
                    None
                };
                let Some((id, area)) = target else {
                    return vec![];
                };
                let mut actions = Vec::new();
                if matches!(event.kind, event::MouseEventKind::Down(_)) && !self.focus.is_focused(id)
                {
                    actions.push(Action::FocusPane(id));
                }
                actions.extend(match id {
                    ComponentId::HistoryPanel => {
                        self.history_panel.handle_mouse(event, area, &self.state)
                    }
                    _ => self.url_form.handle_mouse(event, area, &self.state),
                });
                actions
            }
            View::Loading | View::Result => vec![],
        }
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        // Broadcast action to all components first
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.url_form.on_action(&action, s));
            out.extend(self.history_panel.on_action(&action, s));
            out.extend(self.loading_panel.on_action(&action, s));
            out.extend(self.result_panel.on_action(&action, s));
            out.extend(self.info_overlay.on_action(&action, s));
            out.extend(self.stats_overlay.on_action(&action, s));
            out
        };

        self.apply_action(action);

        // Secondary actions are applied one level deep.
        for a in secondary {
            self.apply_action(a);
        }
    }

    fn apply_action(&mut self, action: Action) {
        match &action {
            Action::EditSlot(..) | Action::FieldsChanged => {}
            _ => debug!("apply_action: {:?}", action),
        }
        match action {
            // ── URL slots ─────────────────────────────────────────────────────
            Action::AddSlot => {
                if !self.state.controls_enabled {
                    return;
                }
                if self.state.fields.add("") {
                    self.dispatch(Action::FieldsChanged);
                } else {
                    self.notices
                        .error(format!("at most {} lists", self.state.fields.capacity()));
                }
            }
            Action::RemoveSlot(index) => {
                if self.state.controls_enabled && self.state.fields.remove(index) {
                    self.dispatch(Action::FieldsChanged);
                }
            }
            Action::EditSlot(index, key) => {
                if self.state.controls_enabled && self.state.fields.handle_key(index, key) {
                    self.dispatch(Action::FieldsChanged);
                }
            }
            Action::ToggleUrl(url) => {
                if self.state.controls_enabled {
                    self.state.fields.toggle_url(&url);
                    self.dispatch(Action::FieldsChanged);
                }
            }
            Action::FieldsChanged => self.state.on_typing(),

            // ── Orchestration ─────────────────────────────────────────────────
            Action::Submit => {
                if self.state.controls_enabled {
                    let urls = self.state.fields.urls();
                    self.start_run(urls);
                }
            }
            Action::TryAgain => {
                if self.state.controls_enabled {
                    let urls = self.state.last_urls.clone();
                    self.start_run(urls);
                }
            }

            // ── Navigation ────────────────────────────────────────────────────
            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPrev => {
                self.focus.prev();
            }
            Action::FocusPane(id) => self.focus.set(id),
            Action::ShowView(view) => {
                if view == View::Form {
                    self.focus.set(ComponentId::UrlForm);
                }
                self.state.views.set_view(view);
            }
            Action::OpenModal(view) => self.state.views.open_modal(view),
            Action::CloseModal => {
                self.state.views.close_modal();
            }

            // ── Store ─────────────────────────────────────────────────────────
            Action::ClearHistory => {
                match self.store.clear_history() {
                    Ok(()) => self.notices.success("history cleared"),
                    Err(e) => {
                        warn!("clear history failed: {:#}", e);
                        self.notices.error("could not clear history");
                    }
                }
                self.reload_store();
            }
            Action::ClearRecent => {
                match self.store.clear_recent() {
                    Ok(()) => self.notices.success("recent lists cleared"),
                    Err(e) => {
                        warn!("clear recent lists failed: {:#}", e);
                        self.notices.error("could not clear recent lists");
                    }
                }
                self.reload_store();
            }
            Action::RefreshHistory => self.reload_store(),

            // ── Clipboard ─────────────────────────────────────────────────────
            Action::CopyShareLink => {
                match share::build_link(&self.config.ui.share_base, &self.state.last_urls) {
                    Ok(link) => self.apply_action(Action::CopyToClipboard(link)),
                    Err(e) => {
                        warn!("share link: {:#}", e);
                        self.notices.error(format!("bad share base: {}", e));
                    }
                }
            }
            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => {
                        let display = if text.chars().count() > 40 {
                            format!("{}…", text.chars().take(40).collect::<String>())
                        } else {
                            text.clone()
                        };
                        self.notices.success(format!("copied: {}", display));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.notices.error(format!("clipboard error: {}", e));
                    }
                }
            }

            // ── System ────────────────────────────────────────────────────────
            Action::DismissBanner => self.state.banner.hide(),
            Action::Quit => self.should_quit = true,
        }
    }

    // ── Runs ──────────────────────────────────────────────────────────────────

    /// Cancel whatever is in flight and start a fresh run.
    fn start_run(&mut self, urls: Vec<String>) {
        if let Some(handle) = self.run_handle.take() {
            if !handle.is_finished() {
                debug!("aborting run {}", handle.run);
            }
            handle.abort();
        }
        let Some(run) = self.state.begin_run(urls.clone(), Instant::now()) else {
            return;
        };
        self.run_handle = Some(self.orchestrator.spawn(run, urls, self.run_tx.clone()));
    }

    fn handle_run_event(&mut self, event: RunEvent) {
        let Some(done) = self.state.apply_run_event(event, Instant::now()) else {
            return;
        };
        self.run_handle = None;
        if let Err(e) = self.store.record_success(&done.result, &done.urls) {
            warn!("could not save pick: {:#}", e);
            self.notices.error("could not save pick to history");
        }
        self.dispatch(Action::RefreshHistory);
    }

    fn reload_store(&mut self) {
        self.state.history = self.store.history();
        self.state.recent = self.store.recent_lists();
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);
        let (header_area, main_area, sep_area, status_area) =
            (outer[0], outer[1], outer[2], outer[3]);
        self.pane_areas.main = main_area;

        self.draw_header(frame, header_area);

        match self.state.views.base() {
            View::Loading => {
                self.pane_areas.url_form = Rect::default();
                self.pane_areas.history = Rect::default();
                self.loading_panel.draw(frame, main_area, true, &self.state);
            }
            View::Result => {
                self.pane_areas.url_form = Rect::default();
                self.pane_areas.history = Rect::default();
                self.result_panel.draw(frame, main_area, true, &self.state);
            }
            _ => self.draw_form(frame, main_area),
        }

        status_bar::draw_separator(frame, sep_area);
        status_bar::draw_keys_bar(frame, status_area, self.state.view(), self.state.protocol);

        // ── Overlays (on top of everything) ──────────────────────────────────
        match self.state.view() {
            View::Info => self.info_overlay.draw(frame, main_area, true, &self.state),
            View::Stats => self.stats_overlay.draw(frame, main_area, true, &self.state),
            _ => {}
        }

        draw_error_banner(frame, main_area, &self.state.banner);
        self.notices.draw(frame, area);
    }

    fn draw_form(&mut self, frame: &mut Frame, area: Rect) {
        // One row per slot, the add line, borders.
        let form_h = (self.state.fields.capacity() as u16 + 3).min(area.height);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(form_h), Constraint::Min(0)])
            .split(area);
        self.pane_areas.url_form = rows[0];
        self.pane_areas.history = rows[1];

        let form_focused = self.focus.is_focused(self.url_form.id());
        let history_focused = self.focus.is_focused(self.history_panel.id());
        self.url_form
            .draw(frame, rows[0], form_focused && !self.state.view().is_modal(), &self.state);
        self.history_panel
            .draw(frame, rows[1], history_focused && !self.state.view().is_modal(), &self.state);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(
                " movie roulette ",
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("· {}", self.state.base_url), style_secondary()),
        ];
        if let Some(last) = self.state.last_summary.as_ref() {
            spans.push(Span::styled(format!("  · last pick: {}", last.movie), style_secondary()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
