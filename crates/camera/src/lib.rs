//! Camera model and orbit controls.
//!
//! Both modules are pure: every operation takes the current state by reference
//! and returns a new value. Matrices are always re-derived from position,
//! target and viewport, never patched in place.
//!
//! # Invariants
//! - Viewport width and height are positive.
//! - Camera matrices match the latest position/target/viewport.
//! - Orbit radius and polar angle stay inside their configured bounds.

pub mod orbit;
pub mod perspective;

pub use orbit::{ControlsPatch, ControlsState, OrbitContext, OrbitUpdate};
pub use perspective::{CameraPatch, CameraState, Projection, Viewport};
