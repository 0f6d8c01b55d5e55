//! Viewer State Store: the single authoritative viewer state.
//!
//! # Invariants
//! - All mutation goes through [`transition`]; nothing else writes camera or
//!   controls fields.
//! - A missing camera or controls turns camera/controls actions into no-ops.
//! - Derived camera fields are recomputed on every camera or controls action.

mod store;

pub use store::{InputState, RenderHandle, ViewerAction, ViewerState, ViewerStore, transition};
