//! Input Gesture Adapter: raw pointer, wheel and key events mapped to viewer
//! store actions.
//!
//! # Invariants
//! - The adapter never touches camera or controls; it only dispatches actions.
//! - Drag, pinch and wheel events only count when they target the bound
//!   surface. Key events are global.
//! - Every listener is released when its [`Subscription`] drops.
//!
//! The windowing library is an adapter-level concern: hosts translate their
//! native events into [`PointerSample`]s (or build [`InputEvent`]s directly)
//! and emit them through an [`EventHub`].

mod adapter;
mod event;
mod hub;
mod recognizer;

pub use adapter::{GestureAdapter, GestureBinding};
pub use event::{DragEvent, InputEvent, Key, PinchEvent, WheelEvent};
pub use hub::{EventHub, Subscription};
pub use recognizer::{GestureRecognizer, PointerSample};
