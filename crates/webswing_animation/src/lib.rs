//! Webswing Motion Engine
//!
//! Scroll-synchronized motion for page elements: entrance animations, idle
//! loops and scroll-scrubbed drives, layered with a fixed precedence and
//! resolved into at most one transform write per target per frame.
//!
//! # Features
//!
//! - **Easing**: power, sine, elastic, back and CSS cubic-bezier curves
//! - **Keyframe Tracks**: eased multi-property tracks sampled at one progress
//! - **Paths**: Hermite curves through control points, and sine sweeps
//! - **Handles**: killable, pausable animations with repeat and yoyo loops
//! - **Scroll Triggers**: scrubbed progress and one-shot threshold events
//! - **Timelines**: per-element composition with synchronous teardown
//!
//! # Example
//!
//! ```rust
//! use webswing_animation::{AnchorRef, MotionPreset, Stage, TriggerRegion};
//! use webswing_core::{Event, TargetId, Viewport};
//!
//! let viewport = Viewport::new(1280.0, 800.0);
//! let mut stage = Stage::new(viewport);
//! let id = stage.create_timeline(TargetId(1));
//!
//! let timeline = stage.get_mut(id).unwrap();
//! timeline
//!     .bind_scroll(
//!         TriggerRegion::scrub(AnchorRef(0), 0.0, 2000.0),
//!         MotionPreset::swing_path(viewport).unwrap(),
//!     )
//!     .unwrap();
//! let idle = MotionPreset::idle_swing(20.0);
//! timeline.loop_idle(idle.track, idle.loop_policy, idle.timing).unwrap();
//!
//! let mut writes = Vec::new();
//! stage.dispatch(&Event::scroll(500.0, 0.0), &mut writes);
//! stage.dispatch(&Event::frame(16.0, 16.0), &mut writes);
//! assert_eq!(writes.len(), 1);
//! ```

pub mod easing;
pub mod error;
pub mod handle;
pub mod keyframe;
pub mod path;
pub mod presets;
pub mod scroll;
pub mod stage;
pub mod timeline;
pub mod transform;

pub use easing::{ease, Easing};
pub use error::{MotionError, Result};
pub use handle::{AnimationHandle, HandleId, HandleState, LoopPolicy, OnKill, Timing};
pub use keyframe::{Keyframe, KeyframeTrack, MotionTrack};
pub use path::{ControlPoint, CurvePath, Oscillator, OscillatorSample, PathCoord, PathSample};
pub use presets::{Entrance, IdleLoop, MotionPreset, ParticleLane};
pub use scroll::{
    AnchorBounds, AnchorRef, Direction, EdgeSpec, ScrollInput, ScrollSample, ScrollSpan, ScrollTracker,
    ScrubLag, ScrubSmoother, ThresholdPolicy, TrackerOutput, TriggerMode, TriggerRegion,
};
pub use stage::{Stage, TimelineId, TransformSink};
pub use timeline::{MotionSampler, Timeline, TimelineConfig, TimelineState};
pub use transform::{Property, PropertySet, TransformState};
