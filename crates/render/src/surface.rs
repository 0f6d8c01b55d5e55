use crate::entity::{AxisEntity, GridEntity, MeshEntity};
use crate::options::RenderingOptions;
use solidview_camera::CameraState;
use solidview_common::Size;

/// Per-frame data shared by every draw command.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub camera: &'a CameraState,
    pub rendering: &'a RenderingOptions,
}

/// The draw command set. A frame is always `clear`, any number of draws in
/// entity order, then `end_frame`.
pub trait DrawCommands {
    fn clear(&mut self, ctx: &FrameContext<'_>);
    fn draw_grid(&mut self, ctx: &FrameContext<'_>, grid: &GridEntity);
    fn draw_axis(&mut self, ctx: &FrameContext<'_>, axis: &AxisEntity);
    fn draw_mesh(&mut self, ctx: &FrameContext<'_>, mesh: &MeshEntity);
    fn end_frame(&mut self);
}

/// A drawing target owned by the host.
pub trait OutputSurface: DrawCommands {
    /// Current size in pixels as laid out by the host.
    fn pixel_size(&self) -> Size;

    /// Ask the host to resize the surface container. Hosts may apply this
    /// later or not at all; `pixel_size` reports what actually happened.
    fn request_size(&mut self, size: Size);
}
