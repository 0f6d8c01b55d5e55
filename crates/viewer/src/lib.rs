//! The embeddable viewer: wires the gesture adapter, the state store, the
//! camera and orbit models, the render pipeline and the frame scheduler.
//!
//! # Invariants
//! - Input deltas are applied exactly once, in dispatch order.
//! - Static mode redraws once per pump in which camera, controls, content or
//!   the render handle changed. Animated mode redraws once per host frame.
//! - A new surface attachment replaces the previous render handle.

mod config;
mod scheduler;
mod viewer;

pub use config::{ConfigError, ModifierKey, ViewerOptions, ViewerProps};
pub use scheduler::{FrameHost, FrameRequest, FrameScheduler, FrameTime};
pub use viewer::Viewer;
