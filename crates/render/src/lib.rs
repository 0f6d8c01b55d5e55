//! Render Pipeline: turns options and solids into an ordered entity list and
//! issues draw commands for it against an output surface.
//!
//! # Invariants
//! - Entity order is grid, axis, then solids in input order.
//! - Rendering never mutates viewer state; its only side effect is on the
//!   surface.
//! - The pipeline holds surfaces weakly. A surface dropped by its host turns
//!   rendering into a no-op.
//!
//! The concrete rasterizer lives behind [`DrawCommands`]. [`RecordingSurface`]
//! is an in-memory implementation used by headless hosts and tests.

mod entity;
mod options;
mod pipeline;
mod recording;
mod surface;

pub use entity::{AxisEntity, DrawCmd, Entity, GridEntity, MeshEntity, Visuals};
pub use options::{AxisOptions, GridOptions, RenderingOptions, SceneOptions};
pub use pipeline::{
    EntityConverter, RenderContent, RenderFn, SolidConverter, SurfaceOptions, build_entities,
    prepare_render,
};
pub use recording::{DrawCall, RecordedFrame, RecordingSurface};
pub use surface::{DrawCommands, FrameContext, OutputSurface};
