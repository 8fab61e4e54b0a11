//! Motion engine error types

use thiserror::Error;

/// Configuration errors raised while setting up tracks, paths and timelines.
///
/// Nothing in this enum is ever produced by a per-frame or per-scroll call;
/// those paths degrade to "no write this tick" instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Easing name that does not map to a known curve
    #[error("unknown easing kind: {0:?}")]
    UnknownEasingKind(String),

    /// Too few control points, or progress values out of order or range
    #[error("invalid track: {0}")]
    InvalidTrack(String),

    /// Edge strings such as `"top 80%"` that cannot be parsed
    #[error("invalid trigger region: {0}")]
    InvalidRegion(String),

    /// A region in the wrong trigger mode for the requested binding
    #[error("trigger region must be in {expected} mode")]
    RegionModeMismatch { expected: &'static str },

    /// The timeline already owns a trigger region subscription
    #[error("timeline already has a trigger region bound")]
    RegionAlreadyBound,

    /// The timeline was destroyed and cannot be configured further
    #[error("timeline has been destroyed")]
    TimelineDestroyed,
}

/// Result type for motion configuration
pub type Result<T> = std::result::Result<T, MotionError>;
