//! Motion presets for the site's sections
//!
//! Section entrances, the idle swing of the overlay character, the drifting
//! web particles and the two scroll drives, with the durations and easings
//! the pages use.

use webswing_core::Viewport;

use crate::easing::Easing;
use crate::error::{MotionError, Result};
use crate::handle::{LoopPolicy, Timing};
use crate::keyframe::{Keyframe, KeyframeTrack, MotionTrack};
use crate::path::{ControlPoint, CurvePath, Oscillator, PathCoord};
use crate::transform::{Property, TransformState};

/// A one-shot entrance: what to play and how long
#[derive(Clone, Debug, PartialEq)]
pub struct Entrance {
    pub track: MotionTrack,
    pub timing: Timing,
}

/// A looping idle animation
#[derive(Clone, Debug, PartialEq)]
pub struct IdleLoop {
    pub track: MotionTrack,
    pub loop_policy: LoopPolicy,
    pub timing: Timing,
}

/// One particle's pass inside a shared drift loop
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleLane {
    pub from_y: f32,
    pub to_y: f32,
    /// Offset of the pass from the start of the loop
    pub start_ms: f32,
    pub duration_ms: f32,
}

impl ParticleLane {
    /// `count` lanes spread over a low-discrepancy sequence: heights within
    /// ±200px, passes of 12 to 20 s starting inside the first 3 s
    pub fn spread(count: usize) -> Vec<ParticleLane> {
        const GOLDEN: f32 = 0.618_034;
        let frac = |v: f32| v - v.floor();
        (0..count)
            .map(|i| {
                let seed = i as f32 * GOLDEN;
                ParticleLane {
                    from_y: -200.0 + 400.0 * frac(seed + 0.1),
                    to_y: -200.0 + 400.0 * frac(seed + 0.6),
                    start_ms: 3000.0 * frac(seed + 0.45),
                    duration_ms: 12000.0 + 8000.0 * frac(2.0 * seed + 0.3),
                }
            })
            .collect()
    }

    pub fn end_ms(&self) -> f32 {
        self.start_ms.max(0.0) + self.duration_ms.max(0.0)
    }
}

/// Pre-built motions
pub struct MotionPreset;

impl MotionPreset {
    // ========================================================================
    // Entrances
    // ========================================================================

    /// Rise from below while fading in (hero copy, section headings)
    pub fn rise_in(distance: f32) -> Entrance {
        Entrance {
            track: MotionTrack::from_to(
                &TransformState::default()
                    .with(Property::Y, distance)
                    .with(Property::Opacity, 0.0),
                &TransformState::default()
                    .with(Property::Y, 0.0)
                    .with(Property::Opacity, 1.0),
                Easing::EaseOutQuart,
            ),
            timing: Timing::new(1200.0),
        }
    }

    /// Slide in from the left, growing slightly, with a back-out overshoot
    pub fn pop_in() -> Entrance {
        Entrance {
            track: MotionTrack::from_to(
                &TransformState::translate(-200.0, 60.0)
                    .with(Property::Opacity, 0.0)
                    .with(Property::Scale, 0.9),
                &TransformState::translate(0.0, 0.0)
                    .with(Property::Opacity, 1.0)
                    .with(Property::Scale, 1.0),
                Easing::back_out(),
            ),
            timing: Timing::new(800.0),
        }
    }

    /// Grow from nothing while unwinding a full turn
    pub fn spin_in() -> Entrance {
        Entrance {
            track: MotionTrack::from_to(
                &TransformState::default()
                    .with(Property::Scale, 0.0)
                    .with(Property::Opacity, 0.0)
                    .with(Property::Rotation, -360.0),
                &TransformState::default()
                    .with(Property::Scale, 1.0)
                    .with(Property::Opacity, 1.0)
                    .with(Property::Rotation, 0.0),
                Easing::ElasticOut {
                    amplitude: 1.0,
                    period: 0.3,
                },
            ),
            timing: Timing::new(1200.0),
        }
    }

    /// Turn over around the Y axis while sliding in
    pub fn flip_in() -> Entrance {
        Entrance {
            track: MotionTrack::from_to(
                &TransformState::default()
                    .with(Property::X, -100.0)
                    .with(Property::Opacity, 0.0)
                    .with(Property::RotationY, 180.0),
                &TransformState::default()
                    .with(Property::X, 0.0)
                    .with(Property::Opacity, 1.0)
                    .with(Property::RotationY, 0.0),
                Easing::back_out(),
            ),
            timing: Timing::new(800.0),
        }
    }

    /// Drop in from below with a tilt and an elastic settle
    pub fn drop_in() -> Entrance {
        Entrance {
            track: MotionTrack::from_to(
                &TransformState::default()
                    .with(Property::Y, 150.0)
                    .with(Property::Opacity, 0.0)
                    .with(Property::Rotation, -15.0)
                    .with(Property::Scale, 0.8),
                &TransformState::default()
                    .with(Property::Y, 0.0)
                    .with(Property::Opacity, 1.0)
                    .with(Property::Rotation, 0.0)
                    .with(Property::Scale, 1.0),
                Easing::ElasticOut {
                    amplitude: 1.0,
                    period: 0.5,
                },
            ),
            timing: Timing::new(1500.0),
        }
    }

    // ========================================================================
    // Idle and scroll drives
    // ========================================================================

    /// Swing offset `0 → degrees` and back, forever.
    ///
    /// Written to the swing channel so it composes with a path that
    /// auto-rotates the primary rotation.
    pub fn idle_swing(degrees: f32) -> IdleLoop {
        IdleLoop {
            track: MotionTrack::new().with(
                Property::Swing,
                KeyframeTrack::from_to(0.0, degrees, Easing::EaseInOutSine),
            ),
            loop_policy: LoopPolicy::Yoyo,
            timing: Timing::new(1500.0),
        }
    }

    /// A web particle crossing the viewport once per loop.
    ///
    /// The particle waits at its start until `lane.start_ms`, drifts from
    /// 300px off the left edge to 300px past the right one, then holds until
    /// the loop of `cycle_ms` (at least the lane's own end) restarts.
    pub fn particle_drift(viewport: Viewport, lane: ParticleLane, cycle_ms: f32) -> Result<IdleLoop> {
        let cycle = cycle_ms.max(lane.end_ms());
        if !cycle.is_finite() || cycle <= 0.0 {
            return Err(MotionError::InvalidTrack(format!(
                "particle loop needs a positive length, got {cycle}"
            )));
        }
        let enter = lane.start_ms.max(0.0) / cycle;
        let leave = lane.end_ms() / cycle;
        let track = MotionTrack::new()
            .with(Property::X, held_pass(-300.0, viewport.width + 300.0, enter, leave)?)
            .with(Property::Y, held_pass(lane.from_y, lane.to_y, enter, leave)?)
            .with(Property::Opacity, held_pass(0.3, 0.6, enter, leave)?);
        Ok(IdleLoop {
            track,
            loop_policy: LoopPolicy::Repeat,
            timing: Timing::new(cycle),
        })
    }

    /// Drift loops for `count` particles sharing one loop length
    pub fn particle_field(viewport: Viewport, count: usize) -> Result<Vec<IdleLoop>> {
        let lanes = ParticleLane::spread(count);
        let cycle = lanes.iter().map(ParticleLane::end_ms).fold(0.0, f32::max);
        lanes
            .into_iter()
            .map(|lane| Self::particle_drift(viewport, lane, cycle))
            .collect()
    }

    /// Linear vertical drift as a share of the element height
    pub fn parallax(y_percent: f32) -> MotionTrack {
        MotionTrack::new().with(
            Property::YPercent,
            KeyframeTrack::from_to(0.0, y_percent, Easing::Linear),
        )
    }

    /// Page-wide swing across the viewport, entering and leaving off-screen
    pub fn swing_path(viewport: Viewport) -> Result<CurvePath> {
        let points = vec![
            ControlPoint::new(PathCoord::px(-200.0), PathCoord::px(50.0)),
            ControlPoint::new(PathCoord::fraction(0.25), PathCoord::px(200.0)),
            ControlPoint::new(PathCoord::fraction(0.5), PathCoord::px(50.0)),
            ControlPoint::new(PathCoord::fraction(0.75), PathCoord::px(250.0)),
            ControlPoint::new(PathCoord::offset(1.0, 200.0), PathCoord::px(100.0)),
        ];
        Ok(CurvePath::new(points, viewport)?
            .with_curviness(1.5)
            .with_auto_rotate(true)
            .with_easing(Easing::EaseInOutQuad))
    }

    /// Fast left-right sweep over the hero section, held at `y = 0`
    pub fn hero_oscillator() -> Oscillator {
        Oscillator::new(0.0, 220.0, 4.0)
            .with_rotation(10.0)
            .with_pinned_y(0.0)
    }
}

/// `from` until `enter`, a linear move until `leave`, then `to`
fn held_pass(from: f32, to: f32, enter: f32, leave: f32) -> Result<KeyframeTrack> {
    let mut keyframes = vec![Keyframe::new(0.0, from, Easing::Linear)];
    if enter > 0.0 {
        keyframes.push(Keyframe::new(enter, from, Easing::Linear));
    }
    keyframes.push(Keyframe::new(leave, to, Easing::Linear));
    if leave < 1.0 {
        keyframes.push(Keyframe::new(1.0, to, Easing::Linear));
    }
    KeyframeTrack::new(keyframes)
}
