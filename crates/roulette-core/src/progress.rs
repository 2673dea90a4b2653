//! Loading animation state machine.
//!
//! ```text
//!  Idle ──start──▶ Running(progress, phase) ──complete──▶ Settling ──finish──▶ Done
//!                        │                                   │
//!                        └──────────────fail─────────────────┴──▶ Failed
//! ```
//!
//! Nothing here owns a timer. The orchestrator calls `step_progress` and
//! `advance_phase` from its own ticks, which keeps the machine testable with
//! any tick source.

use crate::config::AnimationConfig;

/// Blind-timer messages, cycled while the single combined call is in flight.
pub const ROTATING_MESSAGES: [&str; 5] = [
    "FETCHING LIST DATA",
    "ANALYZING FILMS",
    "SHUFFLING POOL",
    "CONSULTING FATE",
    "PREPARING PROJECTOR",
];

/// One message per network phase of the multi-step protocol, plus the
/// settle step. Advanced only when a phase actually completes.
pub const PHASE_MESSAGES: [&str; 4] = [
    "FETCHING LIST DATA",
    "SHUFFLING POOL",
    "CONSULTING FATE",
    "PREPARING PROJECTOR",
];

pub const RETRYING_MESSAGE: &str = "RETRYING...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseMode {
    /// Advance on a fixed tick, wrapping around.
    Rotating,
    /// Advance once per completed phase, stopping at the last message.
    Honest,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationState {
    Idle,
    Running { progress: f64, phase: usize },
    /// Confirmed success; the bar sits at 100% for a moment.
    Settling { phase: usize },
    Done,
    Failed { progress: f64, phase: usize },
}

#[derive(Debug, Clone)]
pub struct LoadingAnimation {
    state: AnimationState,
    mode: PhaseMode,
    ceiling: f64,
    rate: f64,
    retrying: bool,
}

impl LoadingAnimation {
    pub fn new(config: &AnimationConfig, mode: PhaseMode) -> Self {
        Self {
            state: AnimationState::Idle,
            mode,
            ceiling: config.ceiling.clamp(1.0, 99.0),
            rate: config.rate.clamp(0.001, 1.0),
            retrying: false,
        }
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn mode(&self) -> PhaseMode {
        self.mode
    }

    fn messages(&self) -> &'static [&'static str] {
        match self.mode {
            PhaseMode::Rotating => &ROTATING_MESSAGES,
            PhaseMode::Honest => &PHASE_MESSAGES,
        }
    }

    /// Reset to the first message at 0%.
    pub fn start(&mut self) {
        self.retrying = false;
        self.state = AnimationState::Running {
            progress: 0.0,
            phase: 0,
        };
    }

    /// One fractional step towards the ceiling. Returns the new value while running.
    pub fn step_progress(&mut self) -> Option<f64> {
        if let AnimationState::Running { progress, .. } = &mut self.state {
            let next = *progress + (self.ceiling - *progress) * self.rate;
            // Float rounding must never carry the value onto the ceiling.
            if next > *progress && next < self.ceiling {
                *progress = next;
            }
            return Some(*progress);
        }
        None
    }

    /// Move to the next status message. Returns the new index while running.
    pub fn advance_phase(&mut self) -> Option<usize> {
        let len = self.messages().len();
        let mode = self.mode;
        if let AnimationState::Running { phase, .. } = &mut self.state {
            *phase = match mode {
                PhaseMode::Rotating => (*phase + 1) % len,
                PhaseMode::Honest => (*phase + 1).min(len - 1),
            };
            return Some(*phase);
        }
        None
    }

    pub fn set_retrying(&mut self, retrying: bool) {
        self.retrying = retrying;
    }

    pub fn is_retrying(&self) -> bool {
        self.retrying
    }

    /// Confirmed success: snap to 100%.
    pub fn complete(&mut self) {
        if let AnimationState::Running { phase, .. } = self.state {
            self.retrying = false;
            let phase = match self.mode {
                PhaseMode::Rotating => phase,
                PhaseMode::Honest => self.messages().len() - 1,
            };
            self.state = AnimationState::Settling { phase };
        }
    }

    /// Settle pause elapsed.
    pub fn finish(&mut self) {
        if let AnimationState::Settling { .. } = self.state {
            self.state = AnimationState::Done;
        }
    }

    pub fn fail(&mut self) {
        self.retrying = false;
        self.state = match self.state {
            AnimationState::Running { progress, phase } => AnimationState::Failed { progress, phase },
            AnimationState::Settling { phase } => AnimationState::Failed {
                progress: self.ceiling,
                phase,
            },
            AnimationState::Idle => AnimationState::Failed {
                progress: 0.0,
                phase: 0,
            },
            other => other,
        };
    }

    pub fn progress(&self) -> f64 {
        match self.state {
            AnimationState::Idle => 0.0,
            AnimationState::Running { progress, .. } => progress,
            AnimationState::Settling { .. } | AnimationState::Done => 100.0,
            AnimationState::Failed { progress, .. } => progress,
        }
    }

    pub fn phase(&self) -> usize {
        match self.state {
            AnimationState::Running { phase, .. }
            | AnimationState::Settling { phase }
            | AnimationState::Failed { phase, .. } => phase,
            AnimationState::Idle => 0,
            AnimationState::Done => self.messages().len() - 1,
        }
    }

    /// The phase message. The retrying state is reported separately so a
    /// resumed run never shows stale retry text.
    pub fn message(&self) -> &'static str {
        let messages = self.messages();
        messages[self.phase().min(messages.len() - 1)]
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            AnimationState::Running { .. } | AnimationState::Settling { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anim(mode: PhaseMode) -> LoadingAnimation {
        LoadingAnimation::new(&AnimationConfig::default(), mode)
    }

    #[test]
    fn progress_is_monotonic_and_stays_below_ceiling() {
        let mut a = anim(PhaseMode::Rotating);
        a.start();
        let mut last = a.progress();
        for _ in 0..10_000 {
            let p = a.step_progress().unwrap();
            assert!(p >= last, "progress went backwards: {} < {}", p, last);
            assert!(p < 90.0);
            last = p;
        }
        assert!(last > 89.0);
    }

    #[test]
    fn only_complete_reaches_one_hundred() {
        let mut a = anim(PhaseMode::Rotating);
        assert_eq!(a.step_progress(), None);
        a.start();
        a.step_progress();
        assert!(a.progress() < 100.0);
        a.complete();
        assert_eq!(a.progress(), 100.0);
        assert!(matches!(a.state(), AnimationState::Settling { .. }));
        // Ticks arriving after completion are ignored.
        assert_eq!(a.step_progress(), None);
        a.finish();
        assert_eq!(a.state(), AnimationState::Done);
        assert!(!a.is_active());
    }

    #[test]
    fn rotating_messages_wrap() {
        let mut a = anim(PhaseMode::Rotating);
        a.start();
        assert_eq!(a.message(), "FETCHING LIST DATA");
        for _ in 0..ROTATING_MESSAGES.len() {
            a.advance_phase();
        }
        assert_eq!(a.phase(), 0);
        a.advance_phase();
        assert_eq!(a.message(), "ANALYZING FILMS");
    }

    #[test]
    fn honest_messages_never_wrap() {
        let mut a = anim(PhaseMode::Honest);
        a.start();
        for _ in 0..10 {
            a.advance_phase();
        }
        assert_eq!(a.message(), "PREPARING PROJECTOR");
        assert_eq!(a.phase(), PHASE_MESSAGES.len() - 1);
    }

    #[test]
    fn failure_keeps_partial_progress() {
        let mut a = anim(PhaseMode::Rotating);
        a.start();
        a.step_progress();
        a.step_progress();
        let before = a.progress();
        a.set_retrying(true);
        assert!(a.is_retrying());
        assert_ne!(a.message(), RETRYING_MESSAGE);
        assert!(ROTATING_MESSAGES.contains(&a.message()));
        a.fail();
        assert!(!a.is_retrying());
        assert_eq!(a.progress(), before);
        assert!(a.progress() < 100.0);
        assert!(matches!(a.state(), AnimationState::Failed { .. }));
    }
}
