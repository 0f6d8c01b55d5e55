//! Shared types for the solidview workspace.
//!
//! Everything here is a plain value: cheap to clone, comparable, and free of
//! any rendering or windowing dependency.

mod solid;
mod types;

pub use solid::Solid;
pub use types::{ButtonState, Rgba, Size, SurfaceId};
