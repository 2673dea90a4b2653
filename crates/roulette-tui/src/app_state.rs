//! AppState — shared read-only data passed to all components during render/event.
//!
//! Components read this but never mutate it.
//! The App event-loop is the only thing that writes to AppState.

use std::time::Instant;

use roulette_core::config::{Config, ProtocolKind};
use roulette_core::orchestrator::{RunEvent, RunId, RunOutcome, NO_URLS};
use roulette_core::progress::{PHASE_MESSAGES, RETRYING_MESSAGE};
use roulette_core::protocol::FinalResult;
use roulette_core::store::HistoryEntry;

use crate::fields::FieldManager;
use crate::render::LastResult;
use crate::view::{ErrorBanner, View, ViewController};

/// What the loading panel shows for the active run.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadingSnapshot {
    pub progress: f64,
    pub message: &'static str,
    pub retrying: bool,
    pub attempt: u32,
    pub max_retries: u32,
    pub settling: bool,
}

impl Default for LoadingSnapshot {
    fn default() -> Self {
        Self {
            progress: 0.0,
            message: PHASE_MESSAGES[0],
            retrying: false,
            attempt: 0,
            max_retries: 0,
            settling: false,
        }
    }
}

impl LoadingSnapshot {
    pub fn status_text(&self) -> &'static str {
        if self.retrying {
            RETRYING_MESSAGE
        } else {
            self.message
        }
    }
}

/// A confirmed pick the App must persist.
#[derive(Debug, Clone)]
pub struct Completed {
    pub result: FinalResult,
    pub urls: Vec<String>,
}

pub struct AppState {
    // ── Views ───────────────────────────────────────────────────────────────
    pub views: ViewController,
    pub banner: ErrorBanner,

    // ── Form ────────────────────────────────────────────────────────────────
    pub fields: FieldManager,
    /// False while a run is in flight: submit and slot edits are ignored.
    pub controls_enabled: bool,

    // ── Run ─────────────────────────────────────────────────────────────────
    pub active_run: Option<RunId>,
    next_run: RunId,
    pub loading: LoadingSnapshot,
    /// URLs of the latest submission, reused by "try again".
    pub last_urls: Vec<String>,
    pub last_result: Option<FinalResult>,
    pub last_summary: Option<LastResult>,

    // ── Store snapshot ──────────────────────────────────────────────────────
    pub history: Vec<HistoryEntry>,
    pub recent: Vec<String>,

    // ── Session ─────────────────────────────────────────────────────────────
    pub protocol: ProtocolKind,
    pub base_url: String,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            views: ViewController::new(),
            banner: ErrorBanner::new(config.ui.error_dismiss()),
            fields: FieldManager::new(config.ui.max_slots),
            controls_enabled: true,
            active_run: None,
            next_run: 0,
            loading: LoadingSnapshot::default(),
            last_urls: Vec::new(),
            last_result: None,
            last_summary: None,
            history: Vec::new(),
            recent: Vec::new(),
            protocol: config.api.protocol,
            base_url: config.api.base_url.clone(),
        }
    }

    pub fn view(&self) -> View {
        self.views.current()
    }

    /// Enter the loading state for a new run. Returns `None` (and shows the
    /// banner) when there is nothing to submit.
    pub fn begin_run(&mut self, urls: Vec<String>, now: Instant) -> Option<RunId> {
        if urls.is_empty() {
            self.banner.show(NO_URLS, now);
            return None;
        }
        self.next_run += 1;
        let run = self.next_run;
        self.active_run = Some(run);
        self.last_urls = urls;
        self.controls_enabled = false;
        self.loading = LoadingSnapshot::default();
        self.banner.hide();
        self.views.set_view(View::Loading);
        Some(run)
    }

    /// Fold a run event into the state. Events from any run other than the
    /// active one are dropped. Returns the pick to persist on success.
    pub fn apply_run_event(&mut self, event: RunEvent, now: Instant) -> Option<Completed> {
        if self.active_run != Some(event.run_id()) {
            return None;
        }
        match event {
            RunEvent::Started { .. } => {}
            RunEvent::Progress { percent, .. } => {
                self.loading.progress = self.loading.progress.max(percent);
            }
            RunEvent::Phase { message, .. } => self.loading.message = message,
            RunEvent::Retrying {
                attempt,
                max_retries,
                ..
            } => {
                self.loading.retrying = true;
                self.loading.attempt = attempt;
                self.loading.max_retries = max_retries;
            }
            RunEvent::Resumed { .. } => self.loading.retrying = false,
            RunEvent::Settling { .. } => {
                self.loading.retrying = false;
                self.loading.settling = true;
            }
            RunEvent::Finished { outcome, .. } => {
                self.active_run = None;
                self.controls_enabled = true;
                self.loading.retrying = false;
                match outcome {
                    RunOutcome::Success(result) => {
                        let result = *result;
                        self.last_summary = Some(LastResult::from(&result));
                        self.last_result = Some(result.clone());
                        self.views.set_view(View::Result);
                        return Some(Completed {
                            result,
                            urls: self.last_urls.clone(),
                        });
                    }
                    RunOutcome::Failed(error) => {
                        self.views.set_view(View::Form);
                        self.banner.show(error.display_message(), now);
                    }
                }
            }
        }
        None
    }

    /// Typing in the form hides the error banner.
    pub fn on_typing(&mut self) {
        self.banner.hide();
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.banner.tick(now)
    }

    /// Which slot (0-based) currently holds `url`, if any.
    pub fn slot_of(&self, url: &str) -> Option<usize> {
        self.fields.urls().iter().position(|u| u == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roulette_core::error::{LookupError, CONNECTION_UNSTABLE};
    use roulette_core::protocol::{ListInfo, Movie, Stats};
    use std::time::Duration;

    fn result() -> FinalResult {
        FinalResult {
            movie: Movie {
                name: "Heat".to_string(),
                year: Some("1995".to_string()),
                url: "https://letterboxd.com/film/heat/".to_string(),
                rating: Some(4.5),
                poster: None,
                slug: Some("heat".to_string()),
            },
            list: ListInfo {
                title: "Crime".to_string(),
                url: None,
                extra: Default::default(),
            },
            stats: Stats {
                total_pool: 20,
                probability: "5.00".to_string(),
                timing: None,
            },
        }
    }

    fn urls() -> Vec<String> {
        vec!["https://letterboxd.com/u/list/a/".to_string()]
    }

    #[test]
    fn empty_submission_shows_banner_and_stays_on_form() {
        let mut state = AppState::new(&Config::default());
        assert_eq!(state.begin_run(Vec::new(), Instant::now()), None);
        assert_eq!(state.view(), View::Form);
        assert_eq!(state.banner.message(), Some(NO_URLS));
        assert!(state.controls_enabled);
    }

    #[test]
    fn success_shows_result_and_requests_persistence() {
        let now = Instant::now();
        let mut state = AppState::new(&Config::default());
        let run = state.begin_run(urls(), now).unwrap();
        assert_eq!(state.view(), View::Loading);
        assert!(!state.controls_enabled);

        state.apply_run_event(RunEvent::Progress { run, percent: 40.0 }, now);
        state.apply_run_event(RunEvent::Progress { run, percent: 100.0 }, now);
        state.apply_run_event(RunEvent::Settling { run }, now);
        let done = state.apply_run_event(
            RunEvent::Finished {
                run,
                outcome: RunOutcome::Success(Box::new(result())),
            },
            now,
        );

        let done = done.expect("completed");
        assert_eq!(done.urls, urls());
        assert_eq!(state.view(), View::Result);
        assert!(state.controls_enabled);
        assert_eq!(state.active_run, None);
        assert_eq!(state.last_summary.as_ref().unwrap().movie, "Heat");
    }

    #[test]
    fn exhausted_retries_restore_form_and_banner_expires() {
        let now = Instant::now();
        let mut state = AppState::new(&Config::default());
        let run = state.begin_run(urls(), now).unwrap();
        state.apply_run_event(
            RunEvent::Retrying {
                run,
                attempt: 1,
                max_retries: 2,
            },
            now,
        );
        assert_eq!(state.loading.status_text(), RETRYING_MESSAGE);

        let done = state.apply_run_event(
            RunEvent::Finished {
                run,
                outcome: RunOutcome::Failed(LookupError::transient("Server error: HTTP 502")),
            },
            now,
        );
        assert!(done.is_none());
        assert!(state.controls_enabled);
        assert_eq!(state.view(), View::Form);
        assert_eq!(state.banner.message(), Some(CONNECTION_UNSTABLE));

        assert!(!state.tick(now + Duration::from_secs(3)));
        assert!(state.tick(now + Duration::from_secs(4)));
        assert!(!state.banner.is_visible());
    }

    #[test]
    fn stale_run_events_are_ignored() {
        let now = Instant::now();
        let mut state = AppState::new(&Config::default());
        let first = state.begin_run(urls(), now).unwrap();
        let second = state.begin_run(urls(), now).unwrap();
        assert_ne!(first, second);

        let done = state.apply_run_event(
            RunEvent::Finished {
                run: first,
                outcome: RunOutcome::Success(Box::new(result())),
            },
            now,
        );
        assert!(done.is_none());
        assert_eq!(state.view(), View::Loading);
        assert_eq!(state.active_run, Some(second));
    }

    #[test]
    fn progress_never_moves_backwards() {
        let now = Instant::now();
        let mut state = AppState::new(&Config::default());
        let run = state.begin_run(urls(), now).unwrap();
        state.apply_run_event(RunEvent::Progress { run, percent: 30.0 }, now);
        state.apply_run_event(RunEvent::Progress { run, percent: 10.0 }, now);
        assert_eq!(state.loading.progress, 30.0);
    }

    #[test]
    fn typing_hides_banner() {
        let mut state = AppState::new(&Config::default());
        state.banner.show("No URLs provided", Instant::now());
        state.on_typing();
        assert!(!state.banner.is_visible());
    }
}
