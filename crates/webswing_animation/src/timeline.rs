//! Timeline orchestration
//!
//! A [`Timeline`] owns every motion source for one target element and
//! resolves them into at most one transform write per frame:
//!
//! 1. An entrance handle owns the target exclusively until it completes, or
//!    until a moving scrub scroll supersedes it (it is then killed with its
//!    [`OnKill`] policy).
//! 2. Scrub output overwrites the properties its sampler controls. An idle
//!    loop on disjoint properties composes freely; an idle loop that overlaps
//!    is paused while scrolling and resumes once scrolling has been quiet for
//!    `idle_debounce_ms`.
//! 3. [`Timeline::destroy`] kills every handle and drops the subscription
//!    before it returns.
//!
//! Scroll and resize events only update state. Resolution and the write
//! happen in [`Timeline::on_frame`].

use slotmap::SlotMap;
use webswing_core::{TargetId, Viewport};

use crate::error::{MotionError, Result};
use crate::handle::{AnimationHandle, HandleId, HandleState, LoopPolicy, OnKill, Timing};
use crate::keyframe::MotionTrack;
use crate::path::{CurvePath, Oscillator};
use crate::scroll::{AnchorBounds, ScrollInput, ScrollTracker, ScrubLag, ScrubSmoother, TrackerOutput, TriggerRegion};
use crate::transform::{Property, PropertySet, TransformState};

/// Per-timeline tuning
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineConfig {
    /// Quiet time after the last scroll before an overlapping idle resumes
    pub idle_debounce_ms: f32,
    /// Dropped ticks in a row before the timeline parks as faulted
    pub max_consecutive_faults: u32,
    /// Progress step for path heading differences
    pub heading_epsilon: f32,
    /// What a superseded or replaced entrance leaves behind
    pub entrance_on_kill: OnKill,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            idle_debounce_ms: 150.0,
            max_consecutive_faults: 3,
            heading_epsilon: CurvePath::DEFAULT_HEADING_EPSILON,
            entrance_on_kill: OnKill::Complete,
        }
    }
}

/// What a scrub region drives
#[derive(Clone, Debug, PartialEq)]
pub enum MotionSampler {
    /// Position along a curve; rotation too when the path auto-rotates
    Path(CurvePath),
    /// Horizontal sine sweep with optional rotation
    Oscillator(Oscillator),
    /// Any keyframed properties
    Track(MotionTrack),
}

impl MotionSampler {
    pub fn sample(&self, progress: f32) -> TransformState {
        match self {
            MotionSampler::Path(path) => {
                let s = path.sample(progress);
                let state = TransformState::translate(s.x, s.y);
                if path.auto_rotate() {
                    state.with(Property::Rotation, s.heading_degrees)
                } else {
                    state
                }
            }
            MotionSampler::Oscillator(osc) => {
                let s = osc.sample(progress);
                let mut state = TransformState::default().with(Property::X, s.x);
                if let Some(y) = s.y {
                    state.set(Property::Y, y);
                }
                if let Some(rotation) = s.rotation {
                    state.set(Property::Rotation, rotation);
                }
                state
            }
            MotionSampler::Track(track) => track.sample(progress),
        }
    }

    /// Properties every sample writes
    pub fn controls(&self) -> PropertySet {
        match self {
            MotionSampler::Path(path) => {
                let set = PropertySet::EMPTY.with(Property::X).with(Property::Y);
                if path.auto_rotate() {
                    set.with(Property::Rotation)
                } else {
                    set
                }
            }
            MotionSampler::Oscillator(osc) => {
                let mut set = PropertySet::EMPTY.with(Property::X);
                if osc.pinned_y.is_some() {
                    set = set.with(Property::Y);
                }
                if osc.rotation_amplitude.is_some() {
                    set = set.with(Property::Rotation);
                }
                set
            }
            MotionSampler::Track(track) => track.properties(),
        }
    }

    /// Re-resolve pixel geometry. Returns whether anything changed.
    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        match self {
            MotionSampler::Path(path) => path.set_viewport(viewport),
            MotionSampler::Oscillator(_) | MotionSampler::Track(_) => false,
        }
    }

    fn configure(&mut self, config: &TimelineConfig) {
        if let MotionSampler::Path(path) = self {
            path.set_heading_epsilon(config.heading_epsilon);
        }
    }
}

impl From<CurvePath> for MotionSampler {
    fn from(path: CurvePath) -> Self {
        MotionSampler::Path(path)
    }
}

impl From<Oscillator> for MotionSampler {
    fn from(osc: Oscillator) -> Self {
        MotionSampler::Oscillator(osc)
    }
}

impl From<MotionTrack> for MotionSampler {
    fn from(track: MotionTrack) -> Self {
        MotionSampler::Track(track)
    }
}

/// Lifecycle of a timeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimelineState {
    Active,
    /// Parked after repeated faults; never writes again
    Faulted,
    Destroyed,
}

#[derive(Clone, Debug)]
struct EntranceSpec {
    track: MotionTrack,
    timing: Timing,
}

#[derive(Clone, Debug)]
enum Subscription {
    Scrub {
        tracker: ScrollTracker,
        sampler: MotionSampler,
        smoother: Option<ScrubSmoother>,
        /// Latest pure scroll progress
        progress: Option<f32>,
    },
    Threshold {
        tracker: ScrollTracker,
        entrance: EntranceSpec,
    },
}

impl Subscription {
    fn tracker_mut(&mut self) -> &mut ScrollTracker {
        match self {
            Subscription::Scrub { tracker, .. } | Subscription::Threshold { tracker, .. } => tracker,
        }
    }
}

/// What a tracker reading asks the timeline to do
enum ScrollEffect {
    Nothing,
    Scrubbed { moved: bool },
    Enter,
    Leave,
}

/// Motion sources for one target, resolved once per frame
#[derive(Debug)]
pub struct Timeline {
    target: TargetId,
    config: TimelineConfig,
    state: TimelineState,
    viewport: Viewport,
    handles: SlotMap<HandleId, AnimationHandle>,
    entrance: Option<HandleId>,
    idle: Option<HandleId>,
    subscription: Option<Subscription>,
    /// Time since the last moving scrub scroll
    quiet_ms: Option<f32>,
    /// Composed state carried between frames
    resolved: TransformState,
    last_written: Option<TransformState>,
    consecutive_faults: u32,
}

impl Timeline {
    pub fn new(target: TargetId, config: TimelineConfig) -> Self {
        tracing::debug!(target_id = target.0, "timeline created");
        Self {
            target,
            config,
            state: TimelineState::Active,
            viewport: Viewport::default(),
            handles: SlotMap::with_key(),
            entrance: None,
            idle: None,
            subscription: None,
            quiet_ms: None,
            resolved: TransformState::default(),
            last_written: None,
            consecutive_faults: 0,
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        if viewport.is_usable() {
            self.viewport = viewport;
        }
        self
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TimelineState::Active
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn handle(&self, id: HandleId) -> Option<&AnimationHandle> {
        self.handles.get(id)
    }

    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    /// Entrance handle, until it completes or is superseded
    pub fn entrance_id(&self) -> Option<HandleId> {
        self.entrance
    }

    pub fn idle_id(&self) -> Option<HandleId> {
        self.idle
    }

    pub fn has_subscription(&self) -> bool {
        self.subscription.is_some()
    }

    /// Latest scrub progress from the scroll position
    pub fn scroll_progress(&self) -> Option<f32> {
        match &self.subscription {
            Some(Subscription::Scrub { progress, .. }) => *progress,
            _ => None,
        }
    }

    /// Whether a moving scroll happened within the idle debounce window
    pub fn is_scrolling(&self) -> bool {
        self.quiet_ms.is_some_and(|q| q < self.config.idle_debounce_ms)
    }

    /// Composed state as of the last resolved frame
    pub fn resolved(&self) -> &TransformState {
        &self.resolved
    }

    pub fn last_written(&self) -> Option<&TransformState> {
        self.last_written.as_ref()
    }

    fn ensure_live(&self) -> Result<()> {
        match self.state {
            TimelineState::Destroyed => Err(MotionError::TimelineDestroyed),
            TimelineState::Active | TimelineState::Faulted => Ok(()),
        }
    }

    // ========================================================================
    // Composition primitives
    // ========================================================================

    /// Play a one-shot entrance now, replacing any earlier entrance
    pub fn play_entrance(&mut self, track: MotionTrack, timing: Timing) -> Result<HandleId> {
        self.ensure_live()?;
        self.kill_entrance();
        let id = self.insert_entrance(track, timing);
        self.start_entrance(id);
        Ok(id)
    }

    /// Hold an entrance at its first frame until a threshold region fires
    pub fn play_entrance_on_enter(
        &mut self,
        region: TriggerRegion,
        track: MotionTrack,
        timing: Timing,
    ) -> Result<HandleId> {
        self.ensure_live()?;
        if !region.is_threshold() {
            return Err(MotionError::RegionModeMismatch {
                expected: "threshold",
            });
        }
        if self.subscription.is_some() {
            return Err(MotionError::RegionAlreadyBound);
        }
        let mut tracker = ScrollTracker::new(region);
        tracker.reevaluate(self.viewport);

        self.kill_entrance();
        let id = self.insert_entrance(track.clone(), timing);
        self.pause_idle();
        self.subscription = Some(Subscription::Threshold {
            tracker,
            entrance: EntranceSpec { track, timing },
        });
        tracing::debug!(target_id = self.target.0, "entrance armed on threshold");
        Ok(id)
    }

    /// Loop an idle animation, replacing any earlier idle loop.
    ///
    /// The loop starts once no entrance owns the target.
    pub fn loop_idle(&mut self, track: MotionTrack, loop_policy: LoopPolicy, timing: Timing) -> Result<HandleId> {
        self.ensure_live()?;
        if let Some(mut old) = self.idle.take().and_then(|id| self.handles.remove(id)) {
            old.kill();
        }
        let mut handle = AnimationHandle::new(self.target, track, timing, loop_policy);
        if self.entrance.is_none() {
            handle.start();
        }
        let id = self.handles.insert(handle);
        self.idle = Some(id);
        tracing::debug!(target_id = self.target.0, ?loop_policy, "idle loop registered");
        Ok(id)
    }

    /// Drive the target from a scrub region
    pub fn bind_scroll(&mut self, region: TriggerRegion, sampler: impl Into<MotionSampler>) -> Result<()> {
        self.bind_scroll_lagged(region, sampler, None)
    }

    /// Like [`bind_scroll`](Self::bind_scroll), with the applied progress
    /// trailing the scroll position
    pub fn bind_scroll_lagged(
        &mut self,
        region: TriggerRegion,
        sampler: impl Into<MotionSampler>,
        lag: Option<ScrubLag>,
    ) -> Result<()> {
        self.ensure_live()?;
        if !region.is_scrub() {
            return Err(MotionError::RegionModeMismatch { expected: "scrub" });
        }
        if self.subscription.is_some() {
            return Err(MotionError::RegionAlreadyBound);
        }
        let mut sampler = sampler.into();
        sampler.configure(&self.config);
        sampler.set_viewport(self.viewport);
        let mut tracker = ScrollTracker::new(region);
        tracker.reevaluate(self.viewport);
        self.subscription = Some(Subscription::Scrub {
            tracker,
            sampler,
            smoother: lag.map(ScrubSmoother::new),
            progress: None,
        });
        tracing::debug!(target_id = self.target.0, "scroll binding attached");
        Ok(())
    }

    // ========================================================================
    // Event handlers
    // ========================================================================

    pub fn on_scroll(&mut self, input: ScrollInput) {
        if !self.is_active() {
            return;
        }
        let viewport = self.viewport;
        let effect = match &mut self.subscription {
            Some(sub) => {
                let output = sub.tracker_mut().update(input, viewport);
                Self::absorb(sub, output)
            }
            None => ScrollEffect::Nothing,
        };
        self.apply_effect(effect);
    }

    pub fn on_resize(&mut self, viewport: Viewport) {
        if !self.is_active() {
            return;
        }
        if !viewport.is_usable() {
            tracing::warn!(target_id = self.target.0, ?viewport, "ignoring unusable viewport");
            return;
        }
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        let effect = match &mut self.subscription {
            Some(sub) => {
                if let Subscription::Scrub { sampler, .. } = sub {
                    sampler.set_viewport(viewport);
                }
                let output = sub.tracker_mut().reevaluate(viewport);
                Self::absorb(sub, output)
            }
            None => ScrollEffect::Nothing,
        };
        self.apply_effect(effect);
    }

    /// The view layer measured a new box for the region's anchor
    pub fn on_anchor_moved(&mut self, bounds: AnchorBounds) {
        if !self.is_active() {
            return;
        }
        let viewport = self.viewport;
        let effect = match &mut self.subscription {
            Some(sub) => {
                let output = sub.tracker_mut().set_bounds(bounds, viewport);
                Self::absorb(sub, output)
            }
            None => ScrollEffect::Nothing,
        };
        self.apply_effect(effect);
    }

    fn absorb(sub: &mut Subscription, output: TrackerOutput) -> ScrollEffect {
        match (sub, output) {
            (Subscription::Scrub { tracker, progress, .. }, TrackerOutput::Progress(sample)) => {
                *progress = Some(sample.progress);
                ScrollEffect::Scrubbed {
                    moved: tracker.moved(),
                }
            }
            (Subscription::Threshold { .. }, TrackerOutput::Entered(_)) => ScrollEffect::Enter,
            (Subscription::Threshold { .. }, TrackerOutput::Left(_)) => ScrollEffect::Leave,
            _ => ScrollEffect::Nothing,
        }
    }

    fn apply_effect(&mut self, effect: ScrollEffect) {
        match effect {
            ScrollEffect::Nothing | ScrollEffect::Scrubbed { moved: false } => {}
            ScrollEffect::Scrubbed { moved: true } => {
                self.quiet_ms = Some(0.0);
                if self.entrance.is_some() {
                    tracing::debug!(target_id = self.target.0, "entrance superseded by scroll");
                    self.kill_entrance();
                }
            }
            ScrollEffect::Enter => {
                let pending = self
                    .entrance
                    .filter(|id| self.handles.get(*id).is_some_and(|h| h.state() == HandleState::Idle));
                let id = match pending {
                    Some(id) => id,
                    None => match self.threshold_entrance() {
                        Some(spec) => {
                            self.kill_entrance();
                            self.insert_entrance(spec.track, spec.timing)
                        }
                        None => return,
                    },
                };
                self.start_entrance(id);
            }
            ScrollEffect::Leave => {
                if let Some(spec) = self.threshold_entrance() {
                    self.kill_entrance();
                    self.insert_entrance(spec.track, spec.timing);
                    self.pause_idle();
                }
            }
        }
    }

    /// Advance one animation frame and resolve the write for it.
    ///
    /// Returns `None` when nothing changed since the last write, when the
    /// tick was dropped, or when the timeline is no longer active.
    pub fn on_frame(&mut self, dt_ms: f32) -> Option<TransformState> {
        if !self.is_active() {
            return None;
        }
        let dt_ms = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };
        if let Some(quiet) = &mut self.quiet_ms {
            *quiet += dt_ms;
        }

        let mut frame = self.resolved;
        let exclusive = self.resolve_entrance(dt_ms, &mut frame);
        if !exclusive {
            let controls = self.resolve_scrub(dt_ms, &mut frame);
            self.resolve_idle(dt_ms, controls, &mut frame);
        }

        if !frame.is_finite() {
            return self.drop_tick("non-finite transform");
        }
        self.consecutive_faults = 0;
        self.resolved = frame;
        if frame.is_empty() || self.last_written == Some(frame) {
            return None;
        }
        tracing::trace!(target_id = self.target.0, ?frame, "transform write");
        self.last_written = Some(frame);
        Some(frame)
    }

    /// Returns whether the entrance owned the target this frame
    fn resolve_entrance(&mut self, dt_ms: f32, frame: &mut TransformState) -> bool {
        let Some(id) = self.entrance else {
            return false;
        };
        let Some(handle) = self.handles.get_mut(id) else {
            self.entrance = None;
            return false;
        };
        let value = match handle.state() {
            HandleState::Idle => handle.preview(),
            _ => handle.tick(dt_ms).or_else(|| handle.current()),
        };
        if let Some(value) = value {
            frame.merge(&value);
        }
        if handle.is_complete() {
            self.handles.remove(id);
            self.entrance = None;
            tracing::debug!(target_id = self.target.0, "entrance complete");
        }
        true
    }

    /// Returns the properties the scrub sampler controls
    fn resolve_scrub(&mut self, dt_ms: f32, frame: &mut TransformState) -> PropertySet {
        let Some(Subscription::Scrub {
            sampler,
            smoother,
            progress,
            ..
        }) = &mut self.subscription
        else {
            return PropertySet::EMPTY;
        };
        if let Some(target) = *progress {
            let applied = match smoother {
                Some(smoother) => smoother.advance(target, dt_ms),
                None => target,
            };
            frame.merge(&sampler.sample(applied));
        }
        sampler.controls()
    }

    fn resolve_idle(&mut self, dt_ms: f32, controls: PropertySet, frame: &mut TransformState) {
        let scrolling = self.is_scrolling();
        let Some(handle) = self.idle.and_then(|id| self.handles.get_mut(id)) else {
            return;
        };
        if handle.state() == HandleState::Idle {
            handle.start();
        }
        let suspended = scrolling && handle.track().properties().intersects(controls);
        if suspended {
            handle.pause();
        } else {
            handle.resume();
        }
        if let Some(value) = handle.tick(dt_ms).or_else(|| handle.current()) {
            if suspended {
                frame.merge_except(&value, controls);
            } else {
                frame.merge(&value);
            }
        }
    }

    // ========================================================================
    // Teardown and faults
    // ========================================================================

    /// Kill every handle and drop the subscription. Idempotent.
    pub fn destroy(&mut self) {
        if self.state == TimelineState::Destroyed {
            return;
        }
        self.release();
        self.state = TimelineState::Destroyed;
        tracing::debug!(target_id = self.target.0, "timeline destroyed");
    }

    /// Count a dropped tick; park the timeline once faults pile up
    pub(crate) fn record_fault(&mut self, reason: &str) {
        if !self.is_active() {
            return;
        }
        self.consecutive_faults += 1;
        tracing::warn!(
            target_id = self.target.0,
            faults = self.consecutive_faults,
            reason,
            "motion tick dropped"
        );
        if self.consecutive_faults >= self.config.max_consecutive_faults.max(1) {
            self.release();
            self.state = TimelineState::Faulted;
            tracing::warn!(target_id = self.target.0, "timeline parked after repeated faults");
        }
    }

    fn drop_tick(&mut self, reason: &str) -> Option<TransformState> {
        self.record_fault(reason);
        None
    }

    fn release(&mut self) {
        for (_, handle) in self.handles.iter_mut() {
            handle.kill();
        }
        self.handles.clear();
        self.entrance = None;
        self.idle = None;
        self.subscription = None;
        self.quiet_ms = None;
    }

    // ========================================================================
    // Handle bookkeeping
    // ========================================================================

    fn insert_entrance(&mut self, track: MotionTrack, timing: Timing) -> HandleId {
        let handle = AnimationHandle::new(self.target, track, timing, LoopPolicy::None)
            .with_on_kill(self.config.entrance_on_kill);
        let id = self.handles.insert(handle);
        self.entrance = Some(id);
        id
    }

    fn start_entrance(&mut self, id: HandleId) {
        if let Some(handle) = self.handles.get_mut(id) {
            handle.start();
        }
        self.pause_idle();
        tracing::debug!(target_id = self.target.0, "entrance started");
    }

    fn kill_entrance(&mut self) {
        let Some(mut handle) = self.entrance.take().and_then(|id| self.handles.remove(id)) else {
            return;
        };
        if let Some(final_state) = handle.kill() {
            self.resolved.merge(&final_state);
        }
    }

    fn pause_idle(&mut self) {
        if let Some(handle) = self.idle.and_then(|id| self.handles.get_mut(id)) {
            handle.pause();
        }
    }

    fn threshold_entrance(&self) -> Option<EntranceSpec> {
        match &self.subscription {
            Some(Subscription::Threshold { entrance, .. }) => Some(entrance.clone()),
            _ => None,
        }
    }
}

impl Drop for Timeline {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::keyframe::KeyframeTrack;
    use crate::scroll::AnchorRef;
    use pretty_assertions::assert_eq;

    fn timeline() -> Timeline {
        Timeline::new(TargetId(1), TimelineConfig::default()).with_viewport(Viewport::new(1000.0, 800.0))
    }

    fn fade_in() -> MotionTrack {
        MotionTrack::new().with(Property::Opacity, KeyframeTrack::from_to(0.0, 1.0, Easing::Linear))
    }

    fn swing_idle() -> MotionTrack {
        MotionTrack::new().with(Property::Swing, KeyframeTrack::from_to(0.0, 20.0, Easing::Linear))
    }

    fn scrub_region() -> TriggerRegion {
        TriggerRegion::scrub(AnchorRef(1), 0.0, 1000.0)
    }

    fn slide() -> MotionSampler {
        MotionSampler::Track(MotionTrack::new().with(Property::X, KeyframeTrack::from_to(0.0, 100.0, Easing::Linear)))
    }

    #[test]
    fn entrance_runs_then_idle_takes_over() {
        let mut tl = timeline();
        tl.play_entrance(fade_in(), Timing::new(100.0)).unwrap();
        tl.loop_idle(swing_idle(), LoopPolicy::Yoyo, Timing::new(1000.0)).unwrap();

        let first = tl.on_frame(50.0).unwrap();
        assert_eq!(first.opacity, Some(0.5));
        assert_eq!(first.swing, None);

        let done = tl.on_frame(50.0).unwrap();
        assert_eq!(done.opacity, Some(1.0));
        assert!(tl.entrance_id().is_none());

        let idle = tl.on_frame(500.0).unwrap();
        assert_eq!(idle.opacity, Some(1.0));
        assert_eq!(idle.swing, Some(10.0));
    }

    #[test]
    fn writes_only_on_change() {
        let mut tl = timeline();
        tl.play_entrance(fade_in(), Timing::new(100.0)).unwrap();
        assert!(tl.on_frame(100.0).is_some());
        assert_eq!(tl.on_frame(16.0), None);
        assert_eq!(tl.on_frame(16.0), None);
    }

    #[test]
    fn empty_timeline_never_writes() {
        let mut tl = timeline();
        assert_eq!(tl.on_frame(16.0), None);
    }

    #[test]
    fn scrub_overwrites_and_disjoint_idle_composes() {
        let mut tl = timeline();
        tl.bind_scroll(scrub_region(), slide()).unwrap();
        tl.loop_idle(swing_idle(), LoopPolicy::Yoyo, Timing::new(1000.0)).unwrap();

        tl.on_scroll(ScrollInput::new(250.0, 0.0));
        let frame = tl.on_frame(250.0).unwrap();
        assert_eq!(frame.x, Some(25.0));
        assert_eq!(frame.swing, Some(5.0));

        tl.on_scroll(ScrollInput::new(500.0, 16.0));
        let frame = tl.on_frame(250.0).unwrap();
        assert_eq!(frame.x, Some(50.0));
        // disjoint idle keeps running while scrolling
        assert_eq!(frame.swing, Some(10.0));
    }

    #[test]
    fn overlapping_idle_is_suspended_while_scrolling() {
        let mut tl = timeline();
        let idle = MotionTrack::new().with(Property::X, KeyframeTrack::from_to(0.0, 10.0, Easing::Linear));
        tl.bind_scroll(scrub_region(), slide()).unwrap();
        let idle_id = tl.loop_idle(idle, LoopPolicy::Repeat, Timing::new(1000.0)).unwrap();

        tl.on_scroll(ScrollInput::new(0.0, 0.0));
        tl.on_scroll(ScrollInput::new(300.0, 16.0));
        let frame = tl.on_frame(16.0).unwrap();
        let x = frame.x.unwrap();
        assert!((x - 30.0).abs() < 1e-4, "x = {x}");
        assert_eq!(tl.handle(idle_id).unwrap().state(), HandleState::Paused);

        // quiet for longer than the debounce window: idle resumes
        tl.on_frame(100.0);
        let frame = tl.on_frame(100.0).unwrap();
        assert!(!tl.is_scrolling());
        assert_eq!(tl.handle(idle_id).unwrap().state(), HandleState::Running);
        assert!(frame.x.unwrap() < 30.0);
    }

    #[test]
    fn moving_scroll_supersedes_entrance() {
        let mut tl = timeline();
        tl.bind_scroll(scrub_region(), slide()).unwrap();
        tl.play_entrance(fade_in(), Timing::new(1000.0)).unwrap();

        // the mount-time reading does not supersede
        tl.on_scroll(ScrollInput::new(100.0, 0.0));
        let frame = tl.on_frame(100.0).unwrap();
        assert_eq!(frame.opacity, Some(0.1));
        assert_eq!(frame.x, None);

        tl.on_scroll(ScrollInput::new(400.0, 16.0));
        assert!(tl.entrance_id().is_none());
        let frame = tl.on_frame(16.0).unwrap();
        // killed with OnKill::Complete
        assert_eq!(frame.opacity, Some(1.0));
        assert_eq!(frame.x, Some(40.0));
    }

    #[test]
    fn binding_rules() {
        let mut tl = timeline();
        let threshold = TriggerRegion::threshold(AnchorRef(2), 500.0, 0.8);
        assert_eq!(
            tl.bind_scroll(threshold.clone(), slide()),
            Err(MotionError::RegionModeMismatch { expected: "scrub" })
        );
        assert_eq!(
            tl.play_entrance_on_enter(scrub_region(), fade_in(), Timing::default()),
            Err(MotionError::RegionModeMismatch {
                expected: "threshold"
            })
        );
        tl.bind_scroll(scrub_region(), slide()).unwrap();
        assert_eq!(
            tl.bind_scroll(scrub_region(), slide()),
            Err(MotionError::RegionAlreadyBound)
        );
        assert_eq!(
            tl.play_entrance_on_enter(threshold, fade_in(), Timing::default()),
            Err(MotionError::RegionAlreadyBound)
        );
    }

    #[test]
    fn threshold_entrance_holds_first_frame_until_entered() {
        let mut tl = timeline();
        let region = TriggerRegion::threshold(AnchorRef(2), 1000.0, 0.8);
        tl.play_entrance_on_enter(region, fade_in(), Timing::new(100.0)).unwrap();

        tl.on_scroll(ScrollInput::new(0.0, 0.0));
        assert_eq!(tl.on_frame(50.0).unwrap().opacity, Some(0.0));
        assert_eq!(tl.on_frame(50.0), None);

        tl.on_scroll(ScrollInput::new(400.0, 16.0));
        assert_eq!(tl.on_frame(50.0).unwrap().opacity, Some(0.5));
        assert_eq!(tl.on_frame(50.0).unwrap().opacity, Some(1.0));
    }

    #[test]
    fn destroy_is_synchronous_and_final() {
        let mut tl = timeline();
        tl.bind_scroll(scrub_region(), slide()).unwrap();
        tl.loop_idle(swing_idle(), LoopPolicy::Yoyo, Timing::new(1000.0)).unwrap();
        tl.on_scroll(ScrollInput::new(100.0, 0.0));
        assert!(tl.on_frame(16.0).is_some());

        tl.destroy();
        tl.destroy();
        assert_eq!(tl.state(), TimelineState::Destroyed);
        assert_eq!(tl.handle_count(), 0);
        assert!(!tl.has_subscription());

        tl.on_scroll(ScrollInput::new(600.0, 32.0));
        assert_eq!(tl.on_frame(16.0), None);
        assert_eq!(
            tl.play_entrance(fade_in(), Timing::default()),
            Err(MotionError::TimelineDestroyed)
        );
    }

    #[test]
    fn non_finite_output_drops_ticks_then_parks() {
        let mut tl = timeline();
        let bad = MotionTrack::new().with(Property::X, KeyframeTrack::from_to(0.0, f32::NAN, Easing::Linear));
        tl.play_entrance(bad, Timing::new(100.0)).unwrap();

        assert_eq!(tl.on_frame(10.0), None);
        assert_eq!(tl.on_frame(10.0), None);
        assert!(tl.is_active());
        assert_eq!(tl.on_frame(10.0), None);
        assert_eq!(tl.state(), TimelineState::Faulted);
        assert_eq!(tl.handle_count(), 0);
    }

    #[test]
    fn resize_recomputes_path_geometry() {
        use crate::path::{ControlPoint, PathCoord};

        let mut tl = timeline();
        let path = CurvePath::new(
            vec![
                ControlPoint::new(PathCoord::px(0.0), PathCoord::px(0.0)),
                ControlPoint::new(PathCoord::fraction(1.0), PathCoord::px(0.0)),
            ],
            Viewport::default(),
        )
        .unwrap();
        tl.bind_scroll(scrub_region(), path).unwrap();
        tl.on_scroll(ScrollInput::new(1000.0, 0.0));
        assert_eq!(tl.on_frame(16.0).unwrap().x, Some(1000.0));

        tl.on_resize(Viewport::new(500.0, 800.0));
        assert_eq!(tl.on_frame(16.0).unwrap().x, Some(500.0));
    }

    #[test]
    fn scrub_lag_trails_then_settles() {
        let mut tl = timeline();
        tl.bind_scroll_lagged(scrub_region(), slide(), Some(ScrubLag::new(300.0)))
            .unwrap();
        tl.on_scroll(ScrollInput::new(0.0, 0.0));
        assert_eq!(tl.on_frame(16.0).unwrap().x, Some(0.0));

        tl.on_scroll(ScrollInput::new(1000.0, 16.0));
        let trailing = tl.on_frame(16.0).unwrap().x.unwrap();
        assert!(trailing > 0.0 && trailing < 100.0);
        for _ in 0..200 {
            tl.on_frame(16.0);
        }
        assert_eq!(tl.resolved().x, Some(100.0));
    }
}
