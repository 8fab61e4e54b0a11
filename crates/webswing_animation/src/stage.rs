//! Stage: the registry of mounted timelines
//!
//! The stage owns every [`Timeline`] explicitly; there is no ambient global
//! trigger list. Events are dispatched to timelines in mount order, and a
//! panic inside one timeline drops that timeline's tick without touching
//! the others.

use std::panic::{self, AssertUnwindSafe};

use slotmap::{new_key_type, SlotMap};
use webswing_core::{event_types, Event, EventData, TargetId, Viewport};

use crate::error::{MotionError, Result};
use crate::handle::{HandleId, Timing};
use crate::keyframe::MotionTrack;
use crate::scroll::{ScrollInput, TriggerRegion};
use crate::timeline::{Timeline, TimelineConfig};
use crate::transform::TransformState;

new_key_type! {
    /// Handle to a timeline registered on a stage
    pub struct TimelineId;
}

/// Receives resolved transforms; implemented by the view layer
pub trait TransformSink {
    fn apply(&mut self, target: TargetId, state: &TransformState);
}

impl TransformSink for Vec<(TargetId, TransformState)> {
    fn apply(&mut self, target: TargetId, state: &TransformState) {
        self.push((target, *state));
    }
}

/// Registry of mounted timelines
#[derive(Debug)]
pub struct Stage {
    timelines: SlotMap<TimelineId, Timeline>,
    /// Mount order
    order: Vec<TimelineId>,
    viewport: Viewport,
    config: TimelineConfig,
}

impl Stage {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            timelines: SlotMap::with_key(),
            order: Vec::new(),
            viewport,
            config: TimelineConfig::default(),
        }
    }

    /// Config handed to every timeline created from now on
    pub fn with_config(mut self, config: TimelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Mount a timeline for `target`
    pub fn create_timeline(&mut self, target: TargetId) -> TimelineId {
        let timeline = Timeline::new(target, self.config).with_viewport(self.viewport);
        let id = self.timelines.insert(timeline);
        self.order.push(id);
        id
    }

    pub fn get(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.get(id)
    }

    pub fn get_mut(&mut self, id: TimelineId) -> Option<&mut Timeline> {
        self.timelines.get_mut(id)
    }

    /// Timeline ids in mount order
    pub fn ids(&self) -> &[TimelineId] {
        &self.order
    }

    /// First timeline mounted for `target`
    pub fn find(&self, target: TargetId) -> Option<TimelineId> {
        self.order
            .iter()
            .copied()
            .find(|id| self.timelines.get(*id).is_some_and(|t| t.target() == target))
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    /// Destroy and unregister one timeline
    pub fn destroy(&mut self, id: TimelineId) -> bool {
        let Some(mut timeline) = self.timelines.remove(id) else {
            return false;
        };
        timeline.destroy();
        self.order.retain(|other| *other != id);
        true
    }

    /// Destroy every timeline driving `target`
    pub fn destroy_target(&mut self, target: TargetId) -> usize {
        let doomed: Vec<TimelineId> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.timelines.get(*id).is_some_and(|t| t.target() == target))
            .collect();
        for id in &doomed {
            self.destroy(*id);
        }
        doomed.len()
    }

    pub fn kill_all(&mut self) {
        for (_, timeline) in self.timelines.iter_mut() {
            timeline.destroy();
        }
        self.timelines.clear();
        self.order.clear();
        tracing::debug!("stage cleared");
    }

    /// Launch the same entrance on several targets as each enters the
    /// viewport, delaying the n-th by `n × stagger_ms`
    pub fn stagger_on_enter(
        &mut self,
        targets: &[TargetId],
        region: &TriggerRegion,
        track: &MotionTrack,
        timing: Timing,
        stagger_ms: f32,
    ) -> Result<Vec<TimelineId>> {
        if !region.is_threshold() {
            return Err(MotionError::RegionModeMismatch {
                expected: "threshold",
            });
        }
        self.stagger(targets, timing, stagger_ms, |tl, timing| {
            tl.play_entrance_on_enter(region.clone(), track.clone(), timing)
        })
    }

    /// Start the same entrance on several targets right away, delaying the
    /// n-th by `n × stagger_ms`
    pub fn stagger_now(
        &mut self,
        targets: &[TargetId],
        track: &MotionTrack,
        timing: Timing,
        stagger_ms: f32,
    ) -> Result<Vec<TimelineId>> {
        self.stagger(targets, timing, stagger_ms, |tl, timing| {
            tl.play_entrance(track.clone(), timing)
        })
    }

    fn stagger(
        &mut self,
        targets: &[TargetId],
        timing: Timing,
        stagger_ms: f32,
        mut arm: impl FnMut(&mut Timeline, Timing) -> Result<HandleId>,
    ) -> Result<Vec<TimelineId>> {
        let mut created = Vec::with_capacity(targets.len());
        for (i, target) in targets.iter().enumerate() {
            let id = self.create_timeline(*target);
            created.push(id);
            let delay = timing.delay_ms + stagger_ms.max(0.0) * i as f32;
            let armed = self.timelines.get_mut(id).map(|tl| arm(tl, timing.with_delay(delay)));
            if let Some(Err(err)) = armed {
                for id in created {
                    self.destroy(id);
                }
                return Err(err);
            }
        }
        Ok(created)
    }

    /// Route one host event to the timelines it addresses.
    ///
    /// Returns the number of transform writes handed to `sink`.
    pub fn dispatch(&mut self, event: &Event, sink: &mut dyn TransformSink) -> usize {
        match (event.event_type, &event.data) {
            (event_types::SCROLL, EventData::Scroll { scroll_y }) => {
                let input = ScrollInput::new(*scroll_y, event.timestamp_ms);
                self.for_each_addressed(event, "scroll", |tl| tl.on_scroll(input));
                0
            }
            (event_types::RESIZE, EventData::Resize { width, height }) => {
                let viewport = Viewport::new(*width, *height);
                if event.target.is_none() && viewport.is_usable() {
                    self.viewport = viewport;
                }
                self.for_each_addressed(event, "resize", |tl| tl.on_resize(viewport));
                0
            }
            (event_types::FRAME, EventData::Frame { dt_ms }) => {
                let dt_ms = *dt_ms;
                let mut writes = 0;
                for id in &self.order {
                    let Some(timeline) = self.timelines.get_mut(*id) else {
                        continue;
                    };
                    if !event.addresses(timeline.target()) {
                        continue;
                    }
                    if let Some(Some(state)) = guarded(timeline, "frame", |tl| tl.on_frame(dt_ms)) {
                        sink.apply(timeline.target(), &state);
                        writes += 1;
                    }
                }
                writes
            }
            (event_types::UNMOUNT, _) => {
                match event.target {
                    Some(target) => {
                        self.destroy_target(target);
                    }
                    None => self.kill_all(),
                }
                0
            }
            (event_type, data) => {
                tracing::trace!(event_type, ?data, "event ignored by stage");
                0
            }
        }
    }

    fn for_each_addressed(&mut self, event: &Event, what: &'static str, mut f: impl FnMut(&mut Timeline)) {
        for id in &self.order {
            if let Some(timeline) = self.timelines.get_mut(*id) {
                if event.addresses(timeline.target()) {
                    guarded(timeline, what, &mut f);
                }
            }
        }
    }
}

/// Run one timeline callback, turning a panic into a dropped tick
fn guarded<R>(timeline: &mut Timeline, what: &'static str, f: impl FnOnce(&mut Timeline) -> R) -> Option<R> {
    match panic::catch_unwind(AssertUnwindSafe(|| f(timeline))) {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::error!(target_id = timeline.target().0, what, "panic in motion callback, tick dropped");
            timeline.record_fault("panic");
            None
        }
    }
}
