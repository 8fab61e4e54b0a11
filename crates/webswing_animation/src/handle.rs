//! Animation handles
//!
//! An [`AnimationHandle`] plays one [`MotionTrack`] against one target over
//! time. Its lifecycle is a small state machine:
//!
//! ```text
//! Idle ──start──> Running <──resume── Paused
//!   │               │ └────pause────────^ │
//!   └──────kill─────┴──────kill───────────┴──> Killed (terminal)
//! ```
//!
//! A killed handle never produces another value.

use slotmap::new_key_type;
use webswing_core::{StateMachine, TargetId};

use crate::easing::Easing;
use crate::keyframe::MotionTrack;
use crate::transform::TransformState;

new_key_type! {
    /// Handle to an animation owned by a timeline
    pub struct HandleId;
}

/// Lifecycle state of a handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleState {
    Idle,
    Running,
    Paused,
    Killed,
}

/// Lifecycle commands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleCommand {
    Start,
    Pause,
    Resume,
    Kill,
}

fn lifecycle() -> StateMachine<HandleState, HandleCommand> {
    use HandleCommand::*;
    use HandleState::*;

    StateMachine::builder(Idle)
        .on(Idle, Start, Running)
        .on(Running, Pause, Paused)
        .on(Paused, Resume, Running)
        .on(Idle, Kill, Killed)
        .on(Running, Kill, Killed)
        .on(Paused, Kill, Killed)
        .build()
}

/// How a handle continues after one pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoopPolicy {
    /// Single pass, then hold the final value
    #[default]
    None,
    /// Restart at progress 0 after every pass
    Repeat,
    /// Alternate forward and backward passes
    Yoyo,
}

/// What a forced kill leaves behind
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OnKill {
    /// Keep whatever was last written
    #[default]
    Hold,
    /// Jump to the track's final state
    Complete,
}

/// Duration, delay and easing override for a handle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    pub duration_ms: f32,
    pub delay_ms: f32,
    /// Replaces every segment easing of the track when set
    pub easing: Option<Easing>,
}

impl Timing {
    pub const DEFAULT_DURATION_MS: f32 = 500.0;

    pub fn new(duration_ms: f32) -> Self {
        Self {
            duration_ms,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay_ms: f32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            duration_ms: Self::DEFAULT_DURATION_MS,
            delay_ms: 0.0,
            easing: None,
        }
    }
}

/// One running or scheduled animation
#[derive(Clone, Debug)]
pub struct AnimationHandle {
    target: TargetId,
    track: MotionTrack,
    timing: Timing,
    loop_policy: LoopPolicy,
    on_kill: OnKill,
    lifecycle: StateMachine<HandleState, HandleCommand>,
    /// Time since start, delay included; loops fold whole cycles out
    elapsed_ms: f32,
    folded_passes: u32,
    completed: bool,
}

impl AnimationHandle {
    pub fn new(target: TargetId, track: MotionTrack, timing: Timing, loop_policy: LoopPolicy) -> Self {
        let track = match timing.easing {
            Some(easing) => track.with_easing(easing),
            None => track,
        };
        let sanitize = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let timing = Timing {
            duration_ms: sanitize(timing.duration_ms),
            delay_ms: sanitize(timing.delay_ms),
            easing: timing.easing,
        };
        Self {
            target,
            track,
            timing,
            loop_policy,
            on_kill: OnKill::default(),
            lifecycle: lifecycle(),
            elapsed_ms: 0.0,
            folded_passes: 0,
            completed: false,
        }
    }

    pub fn with_on_kill(mut self, on_kill: OnKill) -> Self {
        self.on_kill = on_kill;
        self
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn track(&self) -> &MotionTrack {
        &self.track
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn loop_policy(&self) -> LoopPolicy {
        self.loop_policy
    }

    pub fn on_kill(&self) -> OnKill {
        self.on_kill
    }

    pub fn state(&self) -> HandleState {
        self.lifecycle.current_state()
    }

    pub fn is_looping(&self) -> bool {
        self.loop_policy != LoopPolicy::None
    }

    /// A single pass that has reached its end
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn is_killed(&self) -> bool {
        self.lifecycle.is_terminal()
    }

    /// Zero-based pass counter; odd passes of a yoyo run backward
    pub fn pass_index(&self) -> u32 {
        self.position().0
    }

    /// Idle → Running. No-op in any other state.
    pub fn start(&mut self) -> bool {
        let started = self.lifecycle.try_send(HandleCommand::Start).is_some();
        if started {
            self.elapsed_ms = 0.0;
            self.folded_passes = 0;
            self.completed = self.timing.duration_ms <= 0.0 && self.timing.delay_ms <= 0.0;
        }
        started
    }

    pub fn pause(&mut self) -> bool {
        self.lifecycle.try_send(HandleCommand::Pause).is_some()
    }

    pub fn resume(&mut self) -> bool {
        self.lifecycle.try_send(HandleCommand::Resume).is_some()
    }

    /// Kill the handle.
    ///
    /// Idempotent. With [`OnKill::Complete`] the first call returns the
    /// final state the caller should leave on the target.
    pub fn kill(&mut self) -> Option<TransformState> {
        self.lifecycle.try_send(HandleCommand::Kill)?;
        tracing::debug!(target_id = self.target.0, on_kill = ?self.on_kill, "animation handle killed");
        match self.on_kill {
            OnKill::Hold => None,
            OnKill::Complete => Some(self.track.final_state()),
        }
    }

    /// Advance a running handle and return its value
    pub fn tick(&mut self, dt_ms: f32) -> Option<TransformState> {
        if !self.lifecycle.is_in(HandleState::Running) {
            return None;
        }
        if dt_ms.is_finite() && dt_ms > 0.0 {
            self.elapsed_ms += dt_ms;
        }
        let active = self.elapsed_ms - self.timing.delay_ms;
        let duration = self.timing.duration_ms;
        if active >= 0.0 && (duration <= 0.0 || (!self.is_looping() && active >= duration)) {
            self.completed = true;
        }
        self.fold_cycles();
        self.current()
    }

    /// Value of a running or paused handle
    pub fn current(&self) -> Option<TransformState> {
        match self.state() {
            HandleState::Running | HandleState::Paused => Some(self.sample_now()),
            HandleState::Idle | HandleState::Killed => None,
        }
    }

    /// Like [`current`](Self::current), but an idle handle shows its start
    pub fn preview(&self) -> Option<TransformState> {
        match self.state() {
            HandleState::Idle => Some(self.track.initial_state()),
            _ => self.current(),
        }
    }

    fn sample_now(&self) -> TransformState {
        let (pass, local) = self.position();
        if self.loop_policy == LoopPolicy::Yoyo && pass % 2 == 1 {
            self.track.sample_reverse(1.0 - local)
        } else {
            self.track.sample(local)
        }
    }

    /// (pass, local progress within the pass)
    fn position(&self) -> (u32, f32) {
        let active = self.elapsed_ms - self.timing.delay_ms;
        let duration = self.timing.duration_ms;
        if duration <= 0.0 {
            return if active >= 0.0 && self.completed {
                (0, 1.0)
            } else {
                (0, 0.0)
            };
        }
        if active <= 0.0 {
            return (self.folded_passes, 0.0);
        }
        let passes = active / duration;
        match self.loop_policy {
            LoopPolicy::None => (0, passes.min(1.0)),
            LoopPolicy::Repeat | LoopPolicy::Yoyo => {
                let whole = passes.floor();
                let pass = self.folded_passes.saturating_add(whole as u32);
                (pass, passes - whole)
            }
        }
    }

    /// Keep `elapsed_ms` small on long-running loops
    fn fold_cycles(&mut self) {
        let per_cycle = match self.loop_policy {
            LoopPolicy::None => return,
            LoopPolicy::Repeat => 1,
            LoopPolicy::Yoyo => 2,
        };
        let cycle_ms = self.timing.duration_ms * per_cycle as f32;
        let active = self.elapsed_ms - self.timing.delay_ms;
        if cycle_ms <= 0.0 || active < cycle_ms {
            return;
        }
        let cycles = (active / cycle_ms).floor();
        self.elapsed_ms -= cycles * cycle_ms;
        self.folded_passes = self
            .folded_passes
            .saturating_add((cycles as u32).saturating_mul(per_cycle));
    }
}
