//! wgpu output surface for the solid viewer.
//!
//! Draws the grid and axis as line lists and solids as flat-shaded, lit
//! triangle lists. Each frame is one render pass encoded at `end_frame`.
//!
//! # Invariants
//! - The surface never touches viewer state; it only consumes draw commands.
//! - Opaque geometry is drawn before transparent geometry.
//! - Uploaded meshes are dropped once a frame no longer uses them.

mod error;
mod geometry;
mod gpu;
mod shaders;

pub use error::SurfaceInitError;
pub use gpu::WgpuSurface;
