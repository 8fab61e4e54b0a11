//! Event vocabulary
//!
//! The engine never listens to the page itself. A binding translates the
//! host's scroll, resize and animation-frame callbacks into these events and
//! hands them to the stage in arrival order.

/// Event type identifier
pub type EventType = u32;

/// Event types understood by the motion engine
pub mod event_types {
    use super::EventType;

    pub const SCROLL: EventType = 30;
    pub const RESIZE: EventType = 40;
    /// Animation-frame tick
    pub const FRAME: EventType = 45;

    /// Element left the view layer
    pub const UNMOUNT: EventType = 61;
}

/// Opaque reference to a view-layer element the engine writes transforms to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u64);

/// An engine event with associated data
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub event_type: EventType,
    /// Element the event is addressed to; `None` broadcasts to every timeline
    pub target: Option<TargetId>,
    pub data: EventData,
    /// Host timestamp in milliseconds
    pub timestamp_ms: f64,
}

/// Event-specific data
#[derive(Clone, Debug, PartialEq)]
pub enum EventData {
    Scroll {
        /// Absolute document scroll position in pixels
        scroll_y: f32,
    },
    Resize {
        width: f32,
        height: f32,
    },
    Frame {
        /// Milliseconds since the previous frame
        dt_ms: f32,
    },
    None,
}

impl Event {
    pub fn scroll(scroll_y: f32, timestamp_ms: f64) -> Self {
        Self {
            event_type: event_types::SCROLL,
            target: None,
            data: EventData::Scroll { scroll_y },
            timestamp_ms,
        }
    }

    pub fn resize(width: f32, height: f32, timestamp_ms: f64) -> Self {
        Self {
            event_type: event_types::RESIZE,
            target: None,
            data: EventData::Resize { width, height },
            timestamp_ms,
        }
    }

    pub fn frame(dt_ms: f32, timestamp_ms: f64) -> Self {
        Self {
            event_type: event_types::FRAME,
            target: None,
            data: EventData::Frame { dt_ms },
            timestamp_ms,
        }
    }

    pub fn unmount(target: TargetId, timestamp_ms: f64) -> Self {
        Self {
            event_type: event_types::UNMOUNT,
            target: Some(target),
            data: EventData::None,
            timestamp_ms,
        }
    }

    /// Whether this event concerns the given element
    pub fn addresses(&self, target: TargetId) -> bool {
        self.target.map_or(true, |t| t == target)
    }
}
