//! Webswing Core
//!
//! This crate provides the DOM-free primitives the motion engine is built on:
//!
//! - **Geometry**: points, sizes and the viewport the view layer reports
//! - **Events**: the scroll / resize / frame vocabulary a binding feeds in
//! - **State Machines**: small typed transition tables for lifecycle states
//!
//! # Example
//!
//! ```rust
//! use webswing_core::fsm::StateMachine;
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Door { Closed, Open }
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Push { Open, Close }
//!
//! let mut fsm = StateMachine::builder(Door::Closed)
//!     .on(Door::Closed, Push::Open, Door::Open)
//!     .on(Door::Open, Push::Close, Door::Closed)
//!     .build();
//!
//! assert_eq!(fsm.send(Push::Open), Door::Open);
//! assert_eq!(fsm.send(Push::Open), Door::Open); // no transition, state kept
//! ```

pub mod events;
pub mod fsm;
pub mod geometry;

pub use events::{event_types, Event, EventData, EventType, TargetId};
pub use fsm::{StateMachine, StateMachineBuilder, HISTORY_LIMIT};
pub use geometry::{Point, Size, Viewport};
