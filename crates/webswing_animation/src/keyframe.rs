//! Keyframe tracks
//!
//! A [`KeyframeTrack`] animates one value through an ordered list of
//! keyframes; a [`MotionTrack`] groups several property tracks that are
//! always sampled at one shared progress so they never skew apart.

use smallvec::SmallVec;

use crate::easing::Easing;
use crate::error::{MotionError, Result};
use crate::transform::{Property, PropertySet, TransformState};

/// A single keyframe in a track
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe {
    /// Progress position (0.0 to 1.0)
    pub progress: f32,
    /// Target value at this keyframe
    pub value: f32,
    /// Easing function to use when transitioning TO this keyframe
    pub easing: Easing,
}

impl Keyframe {
    pub fn new(progress: f32, value: f32, easing: Easing) -> Self {
        Self {
            progress,
            value,
            easing,
        }
    }
}

/// Ordered keyframes for one animatable value
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeTrack {
    keyframes: SmallVec<[Keyframe; 4]>,
}

impl KeyframeTrack {
    /// Build a track, validating the keyframe layout.
    ///
    /// Needs at least two keyframes with finite progress in [0, 1], in
    /// non-decreasing order. Equal neighbours are allowed and make a jump.
    pub fn new(keyframes: impl IntoIterator<Item = Keyframe>) -> Result<Self> {
        let keyframes: SmallVec<[Keyframe; 4]> = keyframes.into_iter().collect();
        if keyframes.len() < 2 {
            return Err(MotionError::InvalidTrack(format!(
                "a track needs at least 2 keyframes, got {}",
                keyframes.len()
            )));
        }
        for (i, kf) in keyframes.iter().enumerate() {
            if !kf.progress.is_finite() || !(0.0..=1.0).contains(&kf.progress) {
                return Err(MotionError::InvalidTrack(format!(
                    "keyframe {i} progress {} is outside [0, 1]",
                    kf.progress
                )));
            }
        }
        if let Some(i) = keyframes
            .windows(2)
            .position(|pair| pair[1].progress < pair[0].progress)
        {
            return Err(MotionError::InvalidTrack(format!(
                "keyframe {} progress {} comes before keyframe {i} progress {}",
                i + 1,
                keyframes[i + 1].progress,
                keyframes[i].progress
            )));
        }
        Ok(Self { keyframes })
    }

    /// Two-keyframe track from `from` to `to`
    pub fn from_to(from: f32, to: f32, easing: Easing) -> Self {
        let mut keyframes = SmallVec::new();
        keyframes.push(Keyframe::new(0.0, from, Easing::Linear));
        keyframes.push(Keyframe::new(1.0, to, easing));
        Self { keyframes }
    }

    /// Track that holds one value for its whole length
    pub fn constant(value: f32) -> Self {
        Self::from_to(value, value, Easing::Linear)
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn first_value(&self) -> f32 {
        self.keyframes[0].value
    }

    pub fn last_value(&self) -> f32 {
        self.keyframes[self.keyframes.len() - 1].value
    }

    /// Replace the easing of every segment
    pub fn with_easing(mut self, easing: Easing) -> Self {
        for kf in self.keyframes.iter_mut().skip(1) {
            kf.easing = easing;
        }
        self
    }

    /// Sample the track at `progress`, clamping outside the keyframe range
    pub fn sample(&self, progress: f32) -> f32 {
        match self.locate(progress) {
            Located::Before => self.first_value(),
            Located::After => self.last_value(),
            Located::Within { start, end, progress } => {
                let span = end.progress - start.progress;
                let t = if span > 0.0 {
                    (progress - start.progress) / span
                } else {
                    0.0
                };
                start.value + (end.value - start.value) * end.easing.apply(t)
            }
        }
    }

    /// Sample the track while travelling from its end toward its start.
    ///
    /// Positions are the same as [`sample`](Self::sample), but each
    /// segment's easing is evaluated in the direction of travel, so a
    /// backward pass through an overshooting curve overshoots past the
    /// lower keyframe instead of replaying the forward curve in reverse.
    pub fn sample_reverse(&self, progress: f32) -> f32 {
        match self.locate(progress) {
            Located::Before => self.first_value(),
            Located::After => self.last_value(),
            Located::Within { start, end, progress } => {
                let span = end.progress - start.progress;
                let t = if span > 0.0 {
                    (end.progress - progress) / span
                } else {
                    0.0
                };
                end.value + (start.value - end.value) * end.easing.apply(t)
            }
        }
    }

    fn locate(&self, progress: f32) -> Located<'_> {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        let first = &self.keyframes[0];
        let last = &self.keyframes[self.keyframes.len() - 1];
        if progress <= first.progress {
            return Located::Before;
        }
        if progress >= last.progress {
            return Located::After;
        }
        self.keyframes
            .windows(2)
            .find(|pair| progress <= pair[1].progress)
            .map(|pair| Located::Within {
                start: &pair[0],
                end: &pair[1],
                progress,
            })
            .unwrap_or(Located::After)
    }
}

enum Located<'a> {
    Before,
    After,
    Within {
        start: &'a Keyframe,
        end: &'a Keyframe,
        progress: f32,
    },
}

// ============================================================================
// Multi-Property Track
// ============================================================================

/// Property tracks sampled together at one progress
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MotionTrack {
    channels: SmallVec<[(Property, KeyframeTrack); 4]>,
}

impl MotionTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add (or replace) the track for a property
    pub fn with(mut self, property: Property, track: KeyframeTrack) -> Self {
        self.insert(property, track);
        self
    }

    pub fn insert(&mut self, property: Property, track: KeyframeTrack) {
        match self.channels.iter_mut().find(|(p, _)| *p == property) {
            Some((_, existing)) => *existing = track,
            None => self.channels.push((property, track)),
        }
    }

    /// Tween every property set in either state.
    ///
    /// A property set on only one side holds that value.
    pub fn from_to(from: &TransformState, to: &TransformState, easing: Easing) -> Self {
        let mut track = MotionTrack::new();
        for property in Property::ALL {
            let values = match (from.get(property), to.get(property)) {
                (Some(a), Some(b)) => (a, b),
                (Some(a), None) => (a, a),
                (None, Some(b)) => (b, b),
                (None, None) => continue,
            };
            track.insert(property, KeyframeTrack::from_to(values.0, values.1, easing));
        }
        track
    }

    /// Replace the easing of every segment of every property
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.channels = self
            .channels
            .into_iter()
            .map(|(p, track)| (p, track.with_easing(easing)))
            .collect();
        self
    }

    /// Move the track driving `from` onto the `to` channel.
    ///
    /// An existing `to` track is replaced; nothing happens when `from` is
    /// not animated.
    pub fn remap(mut self, from: Property, to: Property) -> Self {
        if from == to {
            return self;
        }
        if let Some(i) = self.channels.iter().position(|(p, _)| *p == from) {
            let (_, track) = self.channels.remove(i);
            self.insert(to, track);
        }
        self
    }

    pub fn get(&self, property: Property) -> Option<&KeyframeTrack> {
        self.channels
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, t)| t)
    }

    pub fn properties(&self) -> PropertySet {
        self.channels.iter().map(|(p, _)| *p).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn sample(&self, progress: f32) -> TransformState {
        let mut state = TransformState::default();
        for (p, track) in &self.channels {
            state.set(*p, track.sample(progress));
        }
        state
    }

    pub fn sample_reverse(&self, progress: f32) -> TransformState {
        let mut state = TransformState::default();
        for (p, track) in &self.channels {
            state.set(*p, track.sample_reverse(progress));
        }
        state
    }

    pub fn initial_state(&self) -> TransformState {
        self.sample(0.0)
    }

    pub fn final_state(&self) -> TransformState {
        self.sample(1.0)
    }
}
