//! Path samplers
//!
//! Two ways of turning progress into a position:
//!
//! - [`CurvePath`]: a smooth Hermite curve through an ordered list of control
//!   points, with the heading taken from the curve direction
//! - [`Oscillator`]: a closed-form sine sweep along the x axis
//!
//! Both are pure functions of progress once their geometry is resolved.

use webswing_core::{Point, Viewport};

use crate::easing::Easing;
use crate::error::{MotionError, Result};

/// One coordinate of a control point: `px + fraction × viewport extent`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PathCoord {
    pub px: f32,
    pub fraction: f32,
}

impl PathCoord {
    /// Absolute pixel coordinate
    pub const fn px(px: f32) -> Self {
        Self { px, fraction: 0.0 }
    }

    /// Coordinate relative to the viewport extent
    pub const fn fraction(fraction: f32) -> Self {
        Self { px: 0.0, fraction }
    }

    /// Viewport fraction plus a pixel offset
    pub const fn offset(fraction: f32, px: f32) -> Self {
        Self { px, fraction }
    }

    pub fn resolve(&self, extent: f32) -> f32 {
        self.px + self.fraction * extent
    }
}

/// A path vertex
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlPoint {
    pub x: PathCoord,
    pub y: PathCoord,
    /// Tangent scale at this vertex (default 1.0)
    pub weight: Option<f32>,
}

impl ControlPoint {
    pub const fn new(x: PathCoord, y: PathCoord) -> Self {
        Self { x, y, weight: None }
    }

    /// Control point in absolute pixels
    pub const fn px(x: f32, y: f32) -> Self {
        Self::new(PathCoord::px(x), PathCoord::px(y))
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn resolve(&self, viewport: Viewport) -> Point {
        Point::new(
            self.x.resolve(viewport.width),
            self.y.resolve(viewport.height),
        )
    }
}

/// Position and heading at one progress value
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathSample {
    pub x: f32,
    pub y: f32,
    /// Direction of travel, degrees clockwise from +x (screen space, y down)
    pub heading_degrees: f32,
}

/// Smooth curve through ordered control points
#[derive(Clone, Debug, PartialEq)]
pub struct CurvePath {
    points: Vec<ControlPoint>,
    curviness: f32,
    auto_rotate: bool,
    heading_epsilon: f32,
    /// Applied to progress before the curve is evaluated
    easing: Easing,
    viewport: Viewport,
    resolved: Vec<Point>,
    tangents: Vec<Point>,
}

impl CurvePath {
    pub const DEFAULT_CURVINESS: f32 = 1.0;
    pub const DEFAULT_HEADING_EPSILON: f32 = 1e-3;

    /// Build a path, resolving viewport-relative points for `viewport`
    pub fn new(points: Vec<ControlPoint>, viewport: Viewport) -> Result<Self> {
        if points.len() < 2 {
            return Err(MotionError::InvalidTrack(format!(
                "a path needs at least 2 control points, got {}",
                points.len()
            )));
        }
        if let Some(i) = points.iter().position(|p| {
            ![p.x.px, p.x.fraction, p.y.px, p.y.fraction]
                .iter()
                .chain(p.weight.iter())
                .all(|v| v.is_finite())
        }) {
            return Err(MotionError::InvalidTrack(format!(
                "control point {i} has a non-finite component"
            )));
        }
        let mut path = Self {
            points,
            curviness: Self::DEFAULT_CURVINESS,
            auto_rotate: false,
            heading_epsilon: Self::DEFAULT_HEADING_EPSILON,
            easing: Easing::Linear,
            viewport,
            resolved: Vec::new(),
            tangents: Vec::new(),
        };
        path.recompute();
        Ok(path)
    }

    /// Tangent scale for the whole curve; 0 gives straight segments
    pub fn with_curviness(mut self, curviness: f32) -> Self {
        self.curviness = if curviness.is_finite() {
            curviness.max(0.0)
        } else {
            Self::DEFAULT_CURVINESS
        };
        self.recompute();
        self
    }

    /// Write the heading into the rotation property when sampled by a timeline
    pub fn with_auto_rotate(mut self, auto_rotate: bool) -> Self {
        self.auto_rotate = auto_rotate;
        self
    }

    /// Progress distance used for the heading finite difference
    pub fn with_heading_epsilon(mut self, epsilon: f32) -> Self {
        self.set_heading_epsilon(epsilon);
        self
    }

    pub fn set_heading_epsilon(&mut self, epsilon: f32) {
        if epsilon.is_finite() && epsilon > 0.0 {
            self.heading_epsilon = epsilon.min(0.5);
        }
    }

    /// Ease travel along the curve
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    pub fn curviness(&self) -> f32 {
        self.curviness
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn control_points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Control points resolved for the current viewport
    pub fn resolved_points(&self) -> &[Point] {
        &self.resolved
    }

    /// Re-resolve geometry for a new viewport. Returns whether it changed.
    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        if viewport == self.viewport {
            return false;
        }
        self.viewport = viewport;
        self.recompute();
        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            "path geometry recomputed"
        );
        true
    }

    fn recompute(&mut self) {
        let viewport = self.viewport;
        self.resolved = self.points.iter().map(|p| p.resolve(viewport)).collect();
        let last = self.resolved.len() - 1;
        self.tangents = (0..=last)
            .map(|i| {
                let prev = self.resolved[i.saturating_sub(1)];
                let next = self.resolved[(i + 1).min(last)];
                let weight = self.points[i].weight.unwrap_or(1.0);
                next.sub(prev).scale(0.5 * self.curviness * weight)
            })
            .collect();
    }

    /// Position on the curve at a raw (un-eased) parameter
    pub fn position(&self, progress: f32) -> Point {
        let (i, u) = self.segment_at(progress);
        let (p0, p1) = (self.resolved[i], self.resolved[i + 1]);
        let (m0, m1) = (self.tangents[i], self.tangents[i + 1]);

        let u2 = u * u;
        let u3 = u2 * u;
        let h00 = 2.0 * u3 - 3.0 * u2 + 1.0;
        let h10 = u3 - 2.0 * u2 + u;
        let h01 = -2.0 * u3 + 3.0 * u2;
        let h11 = u3 - u2;

        Point::new(
            h00 * p0.x + h10 * m0.x + h01 * p1.x + h11 * m1.x,
            h00 * p0.y + h10 * m0.y + h01 * p1.y + h11 * m1.y,
        )
    }

    /// Sample position and heading at `progress`
    pub fn sample(&self, progress: f32) -> PathSample {
        let progress = clamp_progress(self.easing.apply(progress));
        let here = self.position(progress);
        let delta = if progress >= self.heading_epsilon {
            here.sub(self.position(progress - self.heading_epsilon))
        } else {
            self.position(progress + self.heading_epsilon).sub(here)
        };
        let delta = if delta.x.hypot(delta.y) > 1e-6 {
            delta
        } else {
            let (i, _) = self.segment_at(progress);
            self.resolved[i + 1].sub(self.resolved[i])
        };
        let heading_degrees = if delta.x == 0.0 && delta.y == 0.0 {
            0.0
        } else {
            delta.y.atan2(delta.x).to_degrees()
        };
        PathSample {
            x: here.x,
            y: here.y,
            heading_degrees,
        }
    }

    /// Equal progress share per segment
    fn segment_at(&self, progress: f32) -> (usize, f32) {
        let segments = self.resolved.len() - 1;
        let scaled = clamp_progress(progress) * segments as f32;
        let index = (scaled.floor() as usize).min(segments - 1);
        (index, scaled - index as f32)
    }
}

/// Closed-form horizontal sine sweep
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Oscillator {
    pub base_x: f32,
    pub amplitude: f32,
    /// Full sine cycles over progress 0..1
    pub cycles: f32,
    /// Rotation swing in degrees, in phase with the sweep
    pub rotation_amplitude: Option<f32>,
    /// Vertical offset held for the whole sweep
    pub pinned_y: Option<f32>,
}

/// Output of an [`Oscillator`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OscillatorSample {
    pub x: f32,
    pub y: Option<f32>,
    pub rotation: Option<f32>,
}

impl Oscillator {
    pub fn new(base_x: f32, amplitude: f32, cycles: f32) -> Self {
        Self {
            base_x,
            amplitude,
            cycles,
            rotation_amplitude: None,
            pinned_y: None,
        }
    }

    pub fn with_rotation(mut self, amplitude: f32) -> Self {
        self.rotation_amplitude = Some(amplitude);
        self
    }

    /// Keep the target at a fixed `y` so nothing else moves it vertically
    pub fn with_pinned_y(mut self, y: f32) -> Self {
        self.pinned_y = Some(y);
        self
    }

    /// Progress length of one full cycle
    pub fn period(&self) -> f32 {
        1.0 / self.cycles
    }

    pub fn sample(&self, progress: f32) -> OscillatorSample {
        let wave = (clamp_progress(progress) * self.cycles * std::f32::consts::TAU).sin();
        OscillatorSample {
            x: self.base_x + self.amplitude * wave,
            y: self.pinned_y,
            rotation: self.rotation_amplitude.map(|a| a * wave),
        }
    }
}

fn clamp_progress(progress: f32) -> f32 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}
