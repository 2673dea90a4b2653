//! Randomize orchestrator — drives one pick from submitted URLs to a
//! `FinalResult` or a classified error.
//!
//! A run owns its two animation timers (progress step and status-message
//! rotation) as local `Interval`s that are polled alongside the network
//! future. Returning from `run`, or aborting the task that runs it, drops
//! them; there is no timer that can outlive its run.
//!
//! Everything the UI needs is reported through `RunSink` as `RunEvent`s tagged
//! with the run id, so a superseded run's late events can be ignored.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::client::Backend;
use crate::config::{AnimationConfig, Config, ProtocolKind, RetryConfig};
use crate::error::LookupError;
use crate::progress::{LoadingAnimation, PhaseMode};
use crate::protocol::{FinalResult, Timing};

pub type RunId = u64;

pub const NO_URLS: &str = "Please paste at least one list URL to continue.";
pub const EMPTY_POOL: &str = "No valid movies found in provided lists";

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Success(Box<FinalResult>),
    Failed(LookupError),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Started { run: RunId, urls: Vec<String> },
    /// Fractional progress while waiting; 100 only after confirmed success.
    Progress { run: RunId, percent: f64 },
    Phase { run: RunId, index: usize, message: &'static str },
    /// A transient failure; pausing before attempt `attempt + 1`.
    Retrying { run: RunId, attempt: u32, max_retries: u32 },
    Resumed { run: RunId },
    /// Result confirmed; the bar holds at 100% before the reveal.
    Settling { run: RunId },
    Finished { run: RunId, outcome: RunOutcome },
}

impl RunEvent {
    pub fn run_id(&self) -> RunId {
        match self {
            RunEvent::Started { run, .. }
            | RunEvent::Progress { run, .. }
            | RunEvent::Phase { run, .. }
            | RunEvent::Retrying { run, .. }
            | RunEvent::Resumed { run }
            | RunEvent::Settling { run }
            | RunEvent::Finished { run, .. } => *run,
        }
    }
}

/// Receives run events. Must not block.
pub trait RunSink: Send + Sync {
    fn emit(&self, event: RunEvent);
}

impl RunSink for mpsc::UnboundedSender<RunEvent> {
    fn emit(&self, event: RunEvent) {
        let _ = self.send(event);
    }
}

/// Handle to a spawned run; aborting it cancels the request sequence and
/// both timers.
#[derive(Debug)]
pub struct RunHandle {
    pub run: RunId,
    abort: AbortHandle,
}

impl RunHandle {
    pub fn abort(&self) {
        self.abort.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

struct Ticks {
    progress: Interval,
    phase: Interval,
}

impl Ticks {
    fn new(config: &AnimationConfig) -> Self {
        let now = Instant::now();
        let mut progress = interval_at(now + config.progress_tick(), config.progress_tick());
        progress.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut phase = interval_at(now + config.phase_tick(), config.phase_tick());
        phase.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { progress, phase }
    }
}

/// Per-run mutable bits threaded through the protocol variants.
struct RunCtx<'a> {
    run: RunId,
    sink: &'a dyn RunSink,
    anim: LoadingAnimation,
    ticks: Ticks,
}

impl RunCtx<'_> {
    fn emit_phase(&self) {
        self.sink.emit(RunEvent::Phase {
            run: self.run,
            index: self.anim.phase(),
            message: self.anim.message(),
        });
    }

    /// Poll `fut` to completion while the animation timers keep firing.
    async fn drive<F, T>(&mut self, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        tokio::pin!(fut);
        let rotating = self.anim.mode() == PhaseMode::Rotating;
        loop {
            tokio::select! {
                biased;
                out = &mut fut => return out,
                _ = self.ticks.progress.tick() => {
                    if let Some(percent) = self.anim.step_progress() {
                        self.sink.emit(RunEvent::Progress { run: self.run, percent });
                    }
                }
                _ = self.ticks.phase.tick(), if rotating => {
                    if self.anim.advance_phase().is_some() {
                        self.emit_phase();
                    }
                }
            }
        }
    }

    /// Honest progress: one message step per finished network phase.
    fn phase_completed(&mut self) {
        if self.anim.mode() == PhaseMode::Honest && self.anim.advance_phase().is_some() {
            self.emit_phase();
        }
    }
}

pub struct Orchestrator {
    backend: Arc<dyn Backend>,
    protocol: ProtocolKind,
    retry: RetryConfig,
    animation: AnimationConfig,
    max_urls: usize,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn Backend>, config: &Config) -> Self {
        Self {
            backend,
            protocol: config.api.protocol,
            retry: config.retry.clone(),
            animation: config.animation.clone(),
            max_urls: config.ui.max_slots.max(1),
        }
    }

    pub fn protocol(&self) -> ProtocolKind {
        self.protocol
    }

    /// Spawn a run on the runtime. The supervisor guarantees a `Finished`
    /// event even if the run task panics; an aborted run reports nothing.
    pub fn spawn(
        self: &Arc<Self>,
        run: RunId,
        urls: Vec<String>,
        tx: mpsc::UnboundedSender<RunEvent>,
    ) -> RunHandle {
        let orchestrator = Arc::clone(self);
        let run_tx = tx.clone();
        let task = tokio::spawn(async move { orchestrator.run(run, urls, &run_tx).await });
        let abort = task.abort_handle();

        tokio::spawn(async move {
            match task.await {
                Ok(_) => {}
                Err(e) if e.is_cancelled() => debug!("run {}: cancelled", run),
                Err(e) => {
                    error!("run {}: task failed: {}", run, e);
                    tx.emit(RunEvent::Finished {
                        run,
                        outcome: RunOutcome::Failed(LookupError::transient(format!(
                            "run task failed: {}",
                            e
                        ))),
                    });
                }
            }
        });

        RunHandle { run, abort }
    }

    /// Run one pick to completion. Always emits exactly one `Finished`.
    pub async fn run(&self, run: RunId, urls: Vec<String>, sink: &dyn RunSink) -> RunOutcome {
        let mut urls: Vec<String> = urls
            .into_iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        if urls.len() > self.max_urls {
            warn!(
                "run {}: {} URLs submitted, keeping the first {}",
                run,
                urls.len(),
                self.max_urls
            );
            urls.truncate(self.max_urls);
        }

        if urls.is_empty() {
            let outcome = RunOutcome::Failed(LookupError::user_facing(NO_URLS));
            sink.emit(RunEvent::Finished {
                run,
                outcome: outcome.clone(),
            });
            return outcome;
        }

        info!("run {}: {} list(s) via {:?}", run, urls.len(), self.protocol);
        sink.emit(RunEvent::Started {
            run,
            urls: urls.clone(),
        });

        let mode = match self.protocol {
            ProtocolKind::SingleCall => PhaseMode::Rotating,
            ProtocolKind::MultiStep => PhaseMode::Honest,
        };
        let mut ctx = RunCtx {
            run,
            sink,
            anim: LoadingAnimation::new(&self.animation, mode),
            ticks: Ticks::new(&self.animation),
        };
        ctx.anim.start();
        ctx.sink.emit(RunEvent::Progress { run, percent: 0.0 });
        ctx.emit_phase();

        let result = match self.protocol {
            ProtocolKind::SingleCall => self.run_single_call(&mut ctx, &urls).await,
            ProtocolKind::MultiStep => self.run_multi_step(&mut ctx, &urls).await,
        };

        let outcome = match result {
            Ok(final_result) => {
                ctx.anim.complete();
                sink.emit(RunEvent::Progress {
                    run,
                    percent: ctx.anim.progress(),
                });
                ctx.emit_phase();
                sink.emit(RunEvent::Settling { run });
                tokio::time::sleep(self.animation.settle()).await;
                ctx.anim.finish();
                info!(
                    "run {}: picked '{}' from a pool of {}",
                    run, final_result.movie.name, final_result.stats.total_pool
                );
                RunOutcome::Success(Box::new(final_result))
            }
            Err(e) => {
                ctx.anim.fail();
                if e.is_transient() {
                    error!("run {}: final attempt failed: {}", run, e.message);
                } else {
                    info!("run {}: {}", run, e.message);
                }
                RunOutcome::Failed(e)
            }
        };

        sink.emit(RunEvent::Finished {
            run,
            outcome: outcome.clone(),
        });
        outcome
    }

    async fn run_single_call(
        &self,
        ctx: &mut RunCtx<'_>,
        urls: &[String],
    ) -> Result<FinalResult, LookupError> {
        let max_retries = self.retry.max_retries;
        let mut attempts = 0u32;
        loop {
            match ctx.drive(self.backend.randomize(urls)).await {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_transient() || attempts >= max_retries => return Err(e),
                Err(e) => {
                    attempts += 1;
                    warn!(
                        "run {}: attempt {} failed, retrying: {}",
                        ctx.run, attempts, e.message
                    );
                    ctx.anim.set_retrying(true);
                    ctx.sink.emit(RunEvent::Retrying {
                        run: ctx.run,
                        attempt: attempts,
                        max_retries,
                    });
                    ctx.drive(tokio::time::sleep(self.retry.delay())).await;
                    ctx.anim.set_retrying(false);
                    ctx.sink.emit(RunEvent::Resumed { run: ctx.run });
                }
            }
        }
    }

    async fn run_multi_step(
        &self,
        ctx: &mut RunCtx<'_>,
        urls: &[String],
    ) -> Result<FinalResult, LookupError> {
        let started = Instant::now();

        let metadata = ctx.drive(self.backend.metadata(urls)).await?;
        let metadata_ms = elapsed_ms(started);
        if metadata.total == 0 {
            return Err(LookupError::user_facing(EMPTY_POOL));
        }
        debug!("run {}: pool of {} across {} list(s)", ctx.run, metadata.total, metadata.lists.len());
        ctx.phase_completed();

        let select_started = Instant::now();
        let selection = ctx
            .drive(self.backend.select(&metadata.lists, metadata.total))
            .await?;
        let select_ms = elapsed_ms(select_started);
        debug!("run {}: drew '{}' from '{}'", ctx.run, selection.meta.slug, selection.list.title);
        ctx.phase_completed();

        let details_started = Instant::now();
        let details = ctx.drive(self.backend.details(&selection.meta.slug)).await?;
        let details_ms = elapsed_ms(details_started);
        ctx.phase_completed();

        let timing = Timing {
            metadata_ms,
            select_ms,
            details_ms,
            total_ms: elapsed_ms(started),
        };
        Ok(FinalResult::assemble(&metadata, selection, details, timing))
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    let elapsed: Duration = since.elapsed();
    elapsed.as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, CONNECTION_UNSTABLE};
    use crate::progress::ROTATING_MESSAGES;
    use crate::protocol::{DetailResult, ListInfo, MetadataResult, Movie, SelectionResult, Stats};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<RunEvent>>,
    }

    impl RunSink for RecordingSink {
        fn emit(&self, event: RunEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl RecordingSink {
        fn events(&self) -> Vec<RunEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    /// Scripted backend: each call pops the next canned response after `latency`.
    #[derive(Default)]
    struct ScriptedBackend {
        legacy: Mutex<VecDeque<Result<FinalResult, LookupError>>>,
        metadata: Mutex<VecDeque<Result<MetadataResult, LookupError>>>,
        select: Mutex<VecDeque<Result<SelectionResult, LookupError>>>,
        details: Mutex<VecDeque<Result<DetailResult, LookupError>>>,
        calls: AtomicUsize,
        latency: Duration,
    }

    fn pop<T>(queue: &Mutex<VecDeque<Result<T, LookupError>>>) -> Result<T, LookupError> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LookupError::transient("script exhausted")))
    }

    #[async_trait::async_trait]
    impl Backend for ScriptedBackend {
        async fn randomize(&self, _urls: &[String]) -> Result<FinalResult, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            pop(&self.legacy)
        }

        async fn metadata(&self, _urls: &[String]) -> Result<MetadataResult, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            pop(&self.metadata)
        }

        async fn select(&self, _lists: &[Value], _total: u64) -> Result<SelectionResult, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            pop(&self.select)
        }

        async fn details(&self, _slug: &str) -> Result<DetailResult, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            pop(&self.details)
        }
    }

    fn sample_result() -> FinalResult {
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

    fn config(protocol: ProtocolKind) -> Config {
        let mut config = Config::default();
        config.api.protocol = protocol;
        config
    }

    fn urls() -> Vec<String> {
        vec!["https://letterboxd.com/u/list/a/".to_string()]
    }

    fn finished(events: &[RunEvent]) -> Vec<&RunOutcome> {
        events
            .iter()
            .filter_map(|e| match e {
                RunEvent::Finished { outcome, .. } => Some(outcome),
                _ => None,
            })
            .collect()
    }

    fn assert_progress_invariants(events: &[RunEvent], success: bool) {
        let mut last = 0.0;
        let mut saw_hundred = false;
        for e in events {
            if let RunEvent::Progress { percent, .. } = e {
                assert!(*percent >= last, "progress decreased: {} < {}", percent, last);
                if *percent >= 100.0 {
                    saw_hundred = true;
                }
                last = *percent;
            }
        }
        assert_eq!(saw_hundred, success);
    }

    #[tokio::test(start_paused = true)]
    async fn single_call_success_first_try() {
        let backend = Arc::new(ScriptedBackend {
            latency: Duration::from_millis(1500),
            ..Default::default()
        });
        backend.legacy.lock().unwrap().push_back(Ok(sample_result()));
        let orch = Orchestrator::new(backend.clone(), &config(ProtocolKind::SingleCall));
        let sink = RecordingSink::default();

        let outcome = orch.run(1, urls(), &sink).await;

        assert!(outcome.is_success());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        let events = sink.events();
        assert_eq!(finished(&events).len(), 1);
        assert_progress_invariants(&events, true);
        // The blind timer rotated the status message while waiting.
        let phases = events
            .iter()
            .filter(|e| matches!(e, RunEvent::Phase { .. }))
            .count();
        assert!(phases >= 3);
        assert!(events.iter().any(|e| matches!(e, RunEvent::Settling { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn user_facing_error_is_never_retried() {
        let backend = Arc::new(ScriptedBackend::default());
        backend
            .legacy
            .lock()
            .unwrap()
            .push_back(Err(LookupError::user_facing("No URLs provided")));
        let orch = Orchestrator::new(backend.clone(), &config(ProtocolKind::SingleCall));
        let sink = RecordingSink::default();

        let outcome = orch.run(1, urls(), &sink).await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        match outcome {
            RunOutcome::Failed(e) => {
                assert_eq!(e.kind, ErrorKind::UserFacing);
                assert_eq!(e.display_message(), "No URLs provided");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        let events = sink.events();
        assert!(!events.iter().any(|e| matches!(e, RunEvent::Retrying { .. })));
        assert_progress_invariants(&events, false);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_retry_then_degrade() {
        let backend = Arc::new(ScriptedBackend::default());
        for _ in 0..3 {
            backend
                .legacy
                .lock()
                .unwrap()
                .push_back(Err(LookupError::transient("Server error: HTTP 502")));
        }
        let orch = Orchestrator::new(backend.clone(), &config(ProtocolKind::SingleCall));
        let sink = RecordingSink::default();

        let outcome = orch.run(7, urls(), &sink).await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
        match &outcome {
            RunOutcome::Failed(e) => assert_eq!(e.display_message(), CONNECTION_UNSTABLE),
            other => panic!("unexpected outcome: {:?}", other),
        }
        let events = sink.events();
        let retries: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                RunEvent::Retrying { attempt, .. } => Some(*attempt),
                _ => None,
            })
            .collect();
        assert_eq!(retries, vec![1, 2]);
        assert!(events.iter().all(|e| e.run_id() == 7));
        assert_eq!(finished(&events).len(), 1);
        assert_progress_invariants(&events, false);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_then_success_recovers() {
        let backend = Arc::new(ScriptedBackend::default());
        {
            let mut q = backend.legacy.lock().unwrap();
            q.push_back(Err(LookupError::transient("Server error: Gateway Timeout")));
            q.push_back(Ok(sample_result()));
        }
        let orch = Orchestrator::new(backend.clone(), &config(ProtocolKind::SingleCall));
        let sink = RecordingSink::default();

        let outcome = orch.run(1, urls(), &sink).await;

        assert!(outcome.is_success());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        let events = sink.events();
        assert!(events.iter().any(|e| matches!(e, RunEvent::Resumed { .. })));
        assert_progress_invariants(&events, true);
    }

    #[tokio::test(start_paused = true)]
    async fn multi_step_assembles_and_advances_per_phase() {
        let backend = Arc::new(ScriptedBackend {
            latency: Duration::from_millis(250),
            ..Default::default()
        });
        backend.metadata.lock().unwrap().push_back(Ok(MetadataResult {
            lists: vec![json!({"title": "Crime", "count": 1_000_000})],
            total: 1_000_000,
        }));
        backend.select.lock().unwrap().push_back(Ok(serde_json::from_value(json!({
            "list": {"title": "Crime"},
            "meta": {"slug": "heat"}
        }))
        .unwrap()));
        backend.details.lock().unwrap().push_back(Ok(serde_json::from_value(json!({
            "movie": {"name": "Heat", "year": 1995, "url": "https://letterboxd.com/film/heat/", "rating": 4.5}
        }))
        .unwrap()));
        let orch = Orchestrator::new(backend.clone(), &config(ProtocolKind::MultiStep));
        let sink = RecordingSink::default();

        let outcome = orch.run(3, urls(), &sink).await;

        let result = match outcome {
            RunOutcome::Success(r) => r,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(result.stats.probability, "0.0001");
        let timing = result.stats.timing.unwrap();
        assert!(timing.metadata_ms >= 250);
        assert!(timing.total_ms >= timing.metadata_ms + timing.select_ms + timing.details_ms);
        assert!(timing.total_ms < 1000);
        assert_eq!(result.movie.slug.as_deref(), Some("heat"));

        let phases: Vec<usize> = sink
            .events()
            .iter()
            .filter_map(|e| match e {
                RunEvent::Phase { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        // Initial message, one per completed phase, and the settle message;
        // never wrapping back to the start.
        assert_eq!(phases.first(), Some(&0));
        assert!(phases.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(phases.last(), Some(&3));
    }

    #[tokio::test(start_paused = true)]
    async fn multi_step_failure_stops_without_retry() {
        let backend = Arc::new(ScriptedBackend::default());
        backend.metadata.lock().unwrap().push_back(Ok(MetadataResult {
            lists: vec![],
            total: 12,
        }));
        backend
            .select
            .lock()
            .unwrap()
            .push_back(Err(LookupError::user_facing("Selection failed")));
        let orch = Orchestrator::new(backend.clone(), &config(ProtocolKind::MultiStep));
        let sink = RecordingSink::default();

        let outcome = orch.run(1, urls(), &sink).await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            outcome,
            RunOutcome::Failed(LookupError::user_facing("Selection failed"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn empty_pool_is_user_facing() {
        let backend = Arc::new(ScriptedBackend::default());
        backend.metadata.lock().unwrap().push_back(Ok(MetadataResult {
            lists: vec![],
            total: 0,
        }));
        let orch = Orchestrator::new(backend.clone(), &config(ProtocolKind::MultiStep));
        let sink = RecordingSink::default();

        let outcome = orch.run(1, urls(), &sink).await;

        assert_eq!(outcome, RunOutcome::Failed(LookupError::user_facing(EMPTY_POOL)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_urls_fail_before_any_request() {
        let backend = Arc::new(ScriptedBackend::default());
        let orch = Orchestrator::new(backend.clone(), &config(ProtocolKind::MultiStep));
        let sink = RecordingSink::default();

        let outcome = orch.run(1, vec!["   ".to_string()], &sink).await;

        assert_eq!(outcome, RunOutcome::Failed(LookupError::user_facing(NO_URLS)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(sink.events().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_run_stops_emitting() {
        let backend = Arc::new(ScriptedBackend {
            latency: Duration::from_secs(60),
            ..Default::default()
        });
        let orch = Arc::new(Orchestrator::new(backend, &config(ProtocolKind::SingleCall)));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = orch.spawn(9, urls(), tx);
        tokio::time::sleep(Duration::from_millis(550)).await;
        handle.abort();
        tokio::time::sleep(Duration::from_millis(10)).await;
        while rx.try_recv().is_ok() {}

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err(), "timers kept firing after abort");
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn phase_messages_never_carry_retry_text() {
        let backend = Arc::new(ScriptedBackend {
            latency: Duration::from_millis(900),
            ..Default::default()
        });
        {
            let mut legacy = backend.legacy.lock().unwrap();
            legacy.push_back(Err(LookupError::transient("Server error: HTTP 502")));
            legacy.push_back(Ok(sample_result()));
        }
        let orch = Orchestrator::new(backend, &config(ProtocolKind::SingleCall));
        let sink = RecordingSink::default();

        let outcome = orch.run(4, urls(), &sink).await;

        assert!(outcome.is_success());
        let events = sink.events();
        assert!(events.iter().any(|e| matches!(e, RunEvent::Retrying { .. })));
        let phases: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                RunEvent::Phase { message, .. } => Some(*message),
                _ => None,
            })
            .collect();
        assert!(phases.len() > 3);
        assert!(phases.iter().all(|m| ROTATING_MESSAGES.contains(m)));
    }

    struct PanickingBackend;

    #[async_trait::async_trait]
    impl Backend for PanickingBackend {
        async fn randomize(&self, _urls: &[String]) -> Result<FinalResult, LookupError> {
            panic!("boom")
        }

        async fn metadata(&self, _urls: &[String]) -> Result<MetadataResult, LookupError> {
            panic!("boom")
        }

        async fn select(&self, _lists: &[Value], _total: u64) -> Result<SelectionResult, LookupError> {
            panic!("boom")
        }

        async fn details(&self, _slug: &str) -> Result<DetailResult, LookupError> {
            panic!("boom")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_run_still_reports_finished_once() {
        for protocol in [ProtocolKind::SingleCall, ProtocolKind::MultiStep] {
            let orch = Arc::new(Orchestrator::new(Arc::new(PanickingBackend), &config(protocol)));
            let (tx, mut rx) = mpsc::unbounded_channel();

            let handle = orch.spawn(11, urls(), tx);
            tokio::time::sleep(Duration::from_secs(1)).await;

            let mut events = Vec::new();
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
            let outcomes = finished(&events);
            assert_eq!(outcomes.len(), 1, "{:?}: {:?}", protocol, events);
            match outcomes[0] {
                RunOutcome::Failed(e) => {
                    assert_eq!(e.kind, ErrorKind::Transient);
                    assert_eq!(e.display_message(), CONNECTION_UNSTABLE);
                }
                other => panic!("unexpected outcome: {:?}", other),
            }
            assert!(events.iter().all(|e| e.run_id() == 11));
            assert!(handle.is_finished());
        }
    }
}
