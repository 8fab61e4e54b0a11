//! Scroll tracking
//!
//! A [`ScrollTracker`] watches the document scroll position against one
//! [`TriggerRegion`]. In scrub mode it reports progress through the region
//! on every update; in threshold mode it reports a single `Entered` when the
//! region's start crosses a line at a fraction of the viewport height.
//!
//! Regions can be given as raw scroll offsets or as edge pairs in the
//! familiar `"<element edge> <viewport edge>"` form (`"top 80%"`,
//! `"bottom bottom"`), which are re-resolved whenever the viewport changes.

use webswing_core::Viewport;

use crate::error::{MotionError, Result};

/// Opaque reference to a view-layer element boundary
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AnchorRef(pub u64);

/// Document-space box of an anchor element, measured by the view layer
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnchorBounds {
    /// Distance from the document top to the element top, in pixels
    pub top: f32,
    pub height: f32,
}

impl AnchorBounds {
    pub const fn new(top: f32, height: f32) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// One `"<element> <viewport>"` edge pair
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeSpec {
    /// Position on the element as a fraction of its height
    pub element: f32,
    /// Position of the trigger line as a fraction of the viewport height
    pub viewport: f32,
    /// Extra pixel offset of the trigger line
    pub viewport_px: f32,
}

impl EdgeSpec {
    pub const fn new(element: f32, viewport: f32) -> Self {
        Self {
            element,
            viewport,
            viewport_px: 0.0,
        }
    }

    /// Parse `"top 80%"`, `"bottom bottom"`, `"center 100px"` and similar.
    ///
    /// Keywords are `top`, `center` and `bottom`; positions may also be
    /// percentages or pixel values.
    pub fn parse(input: &str) -> Result<EdgeSpec> {
        let invalid = || MotionError::InvalidRegion(format!("cannot parse edge {input:?}"));
        let mut words = input.split_whitespace();
        let (Some(element), Some(viewport), None) = (words.next(), words.next(), words.next())
        else {
            return Err(invalid());
        };
        let element = match parse_position(element).ok_or_else(invalid)? {
            Position::Fraction(f) => f,
            Position::Px(_) => return Err(invalid()),
        };
        let spec = match parse_position(viewport).ok_or_else(invalid)? {
            Position::Fraction(f) => EdgeSpec::new(element, f),
            Position::Px(px) => EdgeSpec {
                element,
                viewport: 0.0,
                viewport_px: px,
            },
        };
        Ok(spec)
    }

    /// Document position of the element edge
    pub fn element_offset(&self, bounds: AnchorBounds) -> f32 {
        bounds.top + self.element * bounds.height
    }

    /// Distance of the trigger line below the viewport top
    pub fn line_offset(&self, viewport: Viewport) -> f32 {
        self.viewport * viewport.height + self.viewport_px
    }

    /// Scroll position at which the element edge meets the trigger line
    pub fn scroll_offset(&self, bounds: AnchorBounds, viewport: Viewport) -> f32 {
        self.element_offset(bounds) - self.line_offset(viewport)
    }
}

enum Position {
    Fraction(f32),
    Px(f32),
}

fn parse_position(word: &str) -> Option<Position> {
    let word = word.to_ascii_lowercase();
    let finite = |v: f32| v.is_finite().then_some(v);
    match word.as_str() {
        "top" => Some(Position::Fraction(0.0)),
        "center" => Some(Position::Fraction(0.5)),
        "bottom" => Some(Position::Fraction(1.0)),
        other => match other.strip_suffix('%') {
            Some(pct) => finite(pct.parse::<f32>().ok()? / 100.0).map(Position::Fraction),
            None => {
                let px = other.strip_suffix("px").unwrap_or(other);
                finite(px.parse::<f32>().ok()?).map(Position::Px)
            }
        },
    }
}

/// Resolved scroll offsets of a scrub region
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollSpan {
    pub start: f32,
    pub end: f32,
}

impl ScrollSpan {
    pub fn resolve(bounds: AnchorBounds, start: EdgeSpec, end: EdgeSpec, viewport: Viewport) -> Self {
        Self {
            start: start.scroll_offset(bounds, viewport),
            end: end.scroll_offset(bounds, viewport),
        }
    }
}

/// Re-arming behaviour of a threshold region
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ThresholdPolicy {
    /// Fire once for the region's lifetime
    #[default]
    Once,
    /// Fire `Left` and re-arm after the line retreats past the start by
    /// `hysteresis_px`
    Rearm { hysteresis_px: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TriggerMode {
    /// Progress follows the scroll position between start and end
    Scrub,
    /// Fire when `scroll_y + viewport_fraction × viewport height` reaches
    /// the start offset
    Threshold {
        viewport_fraction: f32,
        policy: ThresholdPolicy,
    },
}

impl TriggerMode {
    pub fn name(&self) -> &'static str {
        match self {
            TriggerMode::Scrub => "scrub",
            TriggerMode::Threshold { .. } => "threshold",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct RegionLayout {
    bounds: AnchorBounds,
    start: EdgeSpec,
    end: EdgeSpec,
}

/// The scroll span a tracker measures against
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerRegion {
    pub anchor: AnchorRef,
    pub start_offset: f32,
    pub end_offset: f32,
    pub mode: TriggerMode,
    layout: Option<RegionLayout>,
}

impl TriggerRegion {
    /// Scrub region between two absolute scroll offsets
    pub fn scrub(anchor: AnchorRef, start_offset: f32, end_offset: f32) -> Self {
        Self {
            anchor,
            start_offset,
            end_offset,
            mode: TriggerMode::Scrub,
            layout: None,
        }
    }

    /// Threshold region firing once the line at `viewport_fraction` reaches
    /// `start_offset`
    pub fn threshold(anchor: AnchorRef, start_offset: f32, viewport_fraction: f32) -> Self {
        Self {
            anchor,
            start_offset,
            end_offset: start_offset,
            mode: TriggerMode::Threshold {
                viewport_fraction,
                policy: ThresholdPolicy::Once,
            },
            layout: None,
        }
    }

    /// Scrub region between two edge pairs of an anchor element
    pub fn scrub_between(
        anchor: AnchorRef,
        bounds: AnchorBounds,
        start: EdgeSpec,
        end: EdgeSpec,
        viewport: Viewport,
    ) -> Self {
        let span = ScrollSpan::resolve(bounds, start, end, viewport);
        Self {
            anchor,
            start_offset: span.start,
            end_offset: span.end,
            mode: TriggerMode::Scrub,
            layout: Some(RegionLayout { bounds, start, end }),
        }
    }

    /// Threshold region firing when the element edge meets the trigger line
    pub fn threshold_at(anchor: AnchorRef, bounds: AnchorBounds, start: EdgeSpec) -> Self {
        let offset = start.element_offset(bounds) - start.viewport_px;
        Self {
            anchor,
            start_offset: offset,
            end_offset: offset,
            mode: TriggerMode::Threshold {
                viewport_fraction: start.viewport,
                policy: ThresholdPolicy::Once,
            },
            layout: Some(RegionLayout {
                bounds,
                start,
                end: start,
            }),
        }
    }

    /// Set the re-arming policy of a threshold region
    pub fn with_policy(mut self, new_policy: ThresholdPolicy) -> Self {
        if let TriggerMode::Threshold { policy, .. } = &mut self.mode {
            *policy = new_policy;
        }
        self
    }

    pub fn is_scrub(&self) -> bool {
        matches!(self.mode, TriggerMode::Scrub)
    }

    pub fn is_threshold(&self) -> bool {
        matches!(self.mode, TriggerMode::Threshold { .. })
    }

    /// A scrub region with no length
    pub fn is_degenerate(&self) -> bool {
        self.is_scrub() && (self.end_offset - self.start_offset).abs() < f32::EPSILON
    }

    /// A scrub region whose end lies before its start
    pub fn is_inverted(&self) -> bool {
        self.is_scrub() && self.end_offset < self.start_offset
    }

    /// Recompute offsets defined by edge pairs for a new viewport
    pub fn resolve(&mut self, viewport: Viewport) {
        let Some(layout) = self.layout else {
            return;
        };
        match self.mode {
            TriggerMode::Scrub => {
                let span = ScrollSpan::resolve(layout.bounds, layout.start, layout.end, viewport);
                self.start_offset = span.start;
                self.end_offset = span.end;
            }
            TriggerMode::Threshold { .. } => {
                self.start_offset = layout.start.element_offset(layout.bounds) - layout.start.viewport_px;
                self.end_offset = self.start_offset;
            }
        }
    }

    /// Replace the measured anchor box (after a layout change)
    pub fn set_bounds(&mut self, bounds: AnchorBounds, viewport: Viewport) {
        if let Some(layout) = &mut self.layout {
            layout.bounds = bounds;
        }
        self.resolve(viewport);
    }
}

/// Host scroll reading
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollInput {
    pub scroll_y: f32,
    pub timestamp_ms: f64,
}

impl ScrollInput {
    pub fn new(scroll_y: f32, timestamp_ms: f64) -> Self {
        Self {
            scroll_y,
            timestamp_ms,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Progress reading for one update
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollSample {
    /// Progress through the region in [0, 1]
    pub progress: f32,
    /// Pixels per second, positive when scrolling down
    pub velocity: f32,
    pub direction: Direction,
}

/// What a tracker update produced
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrackerOutput {
    /// Nothing to report
    None,
    /// Scrub progress
    Progress(ScrollSample),
    /// Threshold line reached the region start
    Entered(ScrollSample),
    /// Threshold line retreated past the re-arm point
    Left(ScrollSample),
}

/// Tracks scroll position against one region
#[derive(Clone, Debug)]
pub struct ScrollTracker {
    region: TriggerRegion,
    last: Option<ScrollInput>,
    moved: bool,
    velocity: f32,
    direction: Direction,
    progress: f32,
    armed: bool,
    degenerate_logged: bool,
}

impl ScrollTracker {
    pub fn new(region: TriggerRegion) -> Self {
        Self {
            region,
            last: None,
            moved: false,
            velocity: 0.0,
            direction: Direction::Forward,
            progress: 0.0,
            armed: true,
            degenerate_logged: false,
        }
    }

    pub fn region(&self) -> &TriggerRegion {
        &self.region
    }

    pub fn last_input(&self) -> Option<ScrollInput> {
        self.last
    }

    /// Whether the latest update changed the position of an earlier one
    pub fn moved(&self) -> bool {
        self.moved
    }

    /// A threshold region that has not fired since it was (re-)armed
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn sample(&self) -> ScrollSample {
        ScrollSample {
            progress: self.progress,
            velocity: self.velocity,
            direction: self.direction,
        }
    }

    /// Feed a new scroll reading
    pub fn update(&mut self, input: ScrollInput, viewport: Viewport) -> TrackerOutput {
        if !input.scroll_y.is_finite() || !input.timestamp_ms.is_finite() {
            tracing::trace!(?input, "non-finite scroll input ignored");
            return TrackerOutput::None;
        }
        self.moved = false;
        if let Some(prev) = self.last {
            let dy = input.scroll_y - prev.scroll_y;
            let dt_ms = input.timestamp_ms - prev.timestamp_ms;
            if dt_ms > 0.0 {
                self.velocity = (dy as f64 / dt_ms * 1000.0) as f32;
            }
            if dy > 0.0 {
                self.direction = Direction::Forward;
            } else if dy < 0.0 {
                self.direction = Direction::Backward;
            }
            self.moved = dy != 0.0;
        }
        self.last = Some(input);
        self.evaluate(input.scroll_y, viewport)
    }

    /// Re-evaluate the last reading after a resize
    pub fn reevaluate(&mut self, viewport: Viewport) -> TrackerOutput {
        self.region.resolve(viewport);
        self.moved = false;
        match self.last {
            Some(input) => self.evaluate(input.scroll_y, viewport),
            None => TrackerOutput::None,
        }
    }

    /// Replace the anchor box and re-evaluate
    pub fn set_bounds(&mut self, bounds: AnchorBounds, viewport: Viewport) -> TrackerOutput {
        self.region.set_bounds(bounds, viewport);
        self.reevaluate(viewport)
    }

    fn evaluate(&mut self, scroll_y: f32, viewport: Viewport) -> TrackerOutput {
        match self.region.mode {
            TriggerMode::Scrub => {
                self.progress = self.scrub_progress(scroll_y);
                TrackerOutput::Progress(self.sample())
            }
            TriggerMode::Threshold {
                viewport_fraction,
                policy,
            } => {
                let line = scroll_y + viewport_fraction * viewport.height;
                let start = self.region.start_offset;
                if self.armed && line >= start {
                    self.armed = false;
                    self.progress = 1.0;
                    tracing::debug!(anchor = self.region.anchor.0, scroll_y, "threshold entered");
                    return TrackerOutput::Entered(self.sample());
                }
                if let ThresholdPolicy::Rearm { hysteresis_px } = policy {
                    if !self.armed && line < start - hysteresis_px.max(0.0) {
                        self.armed = true;
                        self.progress = 0.0;
                        tracing::debug!(anchor = self.region.anchor.0, scroll_y, "threshold re-armed");
                        return TrackerOutput::Left(self.sample());
                    }
                }
                TrackerOutput::None
            }
        }
    }

    fn scrub_progress(&mut self, scroll_y: f32) -> f32 {
        if self.region.is_degenerate() {
            if !self.degenerate_logged {
                self.degenerate_logged = true;
                tracing::warn!(
                    anchor = self.region.anchor.0,
                    offset = self.region.start_offset,
                    "degenerate scroll region: start equals end, progress pinned to 0"
                );
            }
            return 0.0;
        }
        let span = self.region.end_offset - self.region.start_offset;
        ((scroll_y - self.region.start_offset) / span).clamp(0.0, 1.0)
    }
}

/// Opt-in lag between the scroll position and the applied scrub progress
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrubLag {
    /// Time to cover roughly 95% of a jump
    pub lag_ms: f32,
}

impl ScrubLag {
    pub fn new(lag_ms: f32) -> Self {
        Self { lag_ms }
    }
}

/// Exponential approach of applied progress toward the scroll target
#[derive(Clone, Copy, Debug)]
pub struct ScrubSmoother {
    lag: ScrubLag,
    current: Option<f32>,
}

impl ScrubSmoother {
    const SETTLE: f32 = 1e-4;

    pub fn new(lag: ScrubLag) -> Self {
        Self { lag, current: None }
    }

    pub fn current(&self) -> Option<f32> {
        self.current
    }

    /// Whether the applied progress still trails `target`
    pub fn is_settling(&self, target: f32) -> bool {
        self.current.is_some_and(|c| c != target)
    }

    /// Advance toward `target` by one frame. The first call snaps.
    pub fn advance(&mut self, target: f32, dt_ms: f32) -> f32 {
        let next = match self.current {
            Some(current) if self.lag.lag_ms > 0.0 && dt_ms.is_finite() => {
                let decay = (-3.0 * dt_ms.max(0.0) / self.lag.lag_ms).exp();
                let next = target + (current - target) * decay;
                if (next - target).abs() < Self::SETTLE {
                    target
                } else {
                    next
                }
            }
            _ => target,
        };
        self.current = Some(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VIEWPORT: Viewport = Viewport::new(1280.0, 800.0);

    fn progress(output: TrackerOutput) -> f32 {
        match output {
            TrackerOutput::Progress(s) => s.progress,
            other => panic!("expected progress, got {other:?}"),
        }
    }

    #[test]
    fn scrub_progress_is_proportional_and_clamped() {
        let mut t = ScrollTracker::new(TriggerRegion::scrub(AnchorRef(1), 0.0, 1000.0));
        assert_eq!(progress(t.update(ScrollInput::new(250.0, 0.0), VIEWPORT)), 0.25);
        assert_eq!(progress(t.update(ScrollInput::new(1200.0, 16.0), VIEWPORT)), 1.0);
        assert_eq!(progress(t.update(ScrollInput::new(-40.0, 32.0), VIEWPORT)), 0.0);
    }

    #[test]
    fn velocity_and_direction() {
        let mut t = ScrollTracker::new(TriggerRegion::scrub(AnchorRef(1), 0.0, 1000.0));
        t.update(ScrollInput::new(100.0, 0.0), VIEWPORT);
        assert!(!t.moved());
        t.update(ScrollInput::new(200.0, 100.0), VIEWPORT);
        assert!(t.moved());
        assert_eq!(t.sample().velocity, 1000.0);
        assert_eq!(t.sample().direction, Direction::Forward);

        t.update(ScrollInput::new(150.0, 200.0), VIEWPORT);
        assert_eq!(t.sample().velocity, -500.0);
        assert_eq!(t.sample().direction, Direction::Backward);

        // unchanged position keeps the previous direction
        t.update(ScrollInput::new(150.0, 300.0), VIEWPORT);
        assert!(!t.moved());
        assert_eq!(t.sample().direction, Direction::Backward);
        assert_eq!(t.sample().velocity, 0.0);
    }

    #[test]
    fn degenerate_region_pins_progress() {
        let mut t = ScrollTracker::new(TriggerRegion::scrub(AnchorRef(1), 400.0, 400.0));
        assert!(t.region().is_degenerate());
        assert!(!t.degenerate_logged);

        assert_eq!(progress(t.update(ScrollInput::new(0.0, 0.0), VIEWPORT)), 0.0);
        assert!(t.degenerate_logged);
        for (i, y) in [400.0, 900.0, 120.0, 4000.0].into_iter().enumerate() {
            let at = (i as f64 + 1.0) * 16.0;
            assert_eq!(progress(t.update(ScrollInput::new(y, at), VIEWPORT)), 0.0);
            // the warning is latched after the first frame, not repeated
            assert!(t.degenerate_logged);
        }
    }

    #[test]
    fn inverted_span_is_flagged() {
        // no height: "bottom bottom" resolves one viewport above "top top"
        let region = TriggerRegion::scrub_between(
            AnchorRef(1),
            AnchorBounds::new(500.0, 0.0),
            EdgeSpec::parse("top top").unwrap(),
            EdgeSpec::parse("bottom bottom").unwrap(),
            VIEWPORT,
        );
        assert!(region.is_inverted());
        assert!(!region.is_degenerate());
        assert!(!TriggerRegion::scrub(AnchorRef(1), 0.0, 100.0).is_inverted());
        assert!(!TriggerRegion::threshold(AnchorRef(1), 100.0, 0.8).is_inverted());
    }

    #[test]
    fn threshold_fires_once_despite_jitter() {
        // element top at 1000, line at 80% of an 800px viewport
        let region = TriggerRegion::threshold(AnchorRef(2), 1000.0, 0.8);
        let mut t = ScrollTracker::new(region);
        assert_eq!(t.update(ScrollInput::new(300.0, 0.0), VIEWPORT), TrackerOutput::None);

        let mut entered = 0;
        for (i, y) in [360.0, 340.0, 361.0, 330.0, 500.0, 0.0, 800.0].iter().enumerate() {
            if let TrackerOutput::Entered(_) = t.update(ScrollInput::new(*y, i as f64 * 16.0), VIEWPORT) {
                entered += 1;
            }
        }
        assert_eq!(entered, 1);
        assert!(!t.is_armed());
    }

    #[test]
    fn threshold_rearms_past_hysteresis() {
        let region = TriggerRegion::threshold(AnchorRef(2), 1000.0, 0.8)
            .with_policy(ThresholdPolicy::Rearm { hysteresis_px: 50.0 });
        let mut t = ScrollTracker::new(region);
        let mut step = |y: f32| t.update(ScrollInput::new(y, 0.0), VIEWPORT);

        assert!(matches!(step(360.0), TrackerOutput::Entered(_)));
        // inside the hysteresis band: nothing
        assert_eq!(step(320.0), TrackerOutput::None);
        assert!(matches!(step(300.0), TrackerOutput::Left(_)));
        assert!(matches!(step(400.0), TrackerOutput::Entered(_)));
    }

    #[test]
    fn edge_specs_parse() {
        assert_eq!(EdgeSpec::parse("top 80%").unwrap(), EdgeSpec::new(0.0, 0.8));
        assert_eq!(EdgeSpec::parse("bottom bottom").unwrap(), EdgeSpec::new(1.0, 1.0));
        assert_eq!(EdgeSpec::parse("center top").unwrap(), EdgeSpec::new(0.5, 0.0));
        assert_eq!(
            EdgeSpec::parse("top 120px").unwrap(),
            EdgeSpec {
                element: 0.0,
                viewport: 0.0,
                viewport_px: 120.0
            }
        );
        for bad in ["top", "top 80% extra", "middle top", "10px top", "top abc%"] {
            assert!(
                matches!(EdgeSpec::parse(bad), Err(MotionError::InvalidRegion(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn span_resolves_page_wide_region() {
        // document 3000px tall, "top top" to "bottom bottom"
        let bounds = AnchorBounds::new(0.0, 3000.0);
        let span = ScrollSpan::resolve(
            bounds,
            EdgeSpec::parse("top top").unwrap(),
            EdgeSpec::parse("bottom bottom").unwrap(),
            VIEWPORT,
        );
        assert_eq!(span, ScrollSpan { start: 0.0, end: 2200.0 });
    }

    #[test]
    fn resize_reevaluates_edge_regions() {
        let bounds = AnchorBounds::new(0.0, 3000.0);
        let region = TriggerRegion::scrub_between(
            AnchorRef(1),
            bounds,
            EdgeSpec::new(0.0, 0.0),
            EdgeSpec::new(1.0, 1.0),
            VIEWPORT,
        );
        let mut t = ScrollTracker::new(region);
        assert_eq!(progress(t.update(ScrollInput::new(1100.0, 0.0), VIEWPORT)), 0.5);
        let taller = Viewport::new(1280.0, 800.0 + 600.0);
        assert_eq!(progress(t.reevaluate(taller)), 1100.0 / 1600.0);
        assert_eq!(t.region().end_offset, 1600.0);
    }

    #[test]
    fn threshold_line_moves_with_viewport() {
        let region = TriggerRegion::threshold_at(
            AnchorRef(3),
            AnchorBounds::new(1000.0, 400.0),
            EdgeSpec::parse("top 80%").unwrap(),
        );
        let mut t = ScrollTracker::new(region);
        assert_eq!(t.update(ScrollInput::new(300.0, 0.0), VIEWPORT), TrackerOutput::None);
        // a taller viewport pushes the line down past the element top
        assert!(matches!(
            t.reevaluate(Viewport::new(1280.0, 1000.0)),
            TrackerOutput::Entered(_)
        ));
    }

    #[test]
    fn smoother_approaches_target() {
        let mut s = ScrubSmoother::new(ScrubLag::new(1200.0));
        assert_eq!(s.advance(0.0, 16.0), 0.0);
        let first = s.advance(1.0, 16.0);
        assert!(first > 0.0 && first < 0.1);
        let mut value = first;
        for _ in 0..75 {
            value = s.advance(1.0, 16.0);
        }
        assert!(value > 0.94, "{value}");
        for _ in 0..400 {
            value = s.advance(1.0, 16.0);
        }
        assert_eq!(value, 1.0);
        assert!(!s.is_settling(1.0));
    }
}
